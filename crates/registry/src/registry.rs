use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::unbounded_channel;
use tokio::sync::oneshot;

use tetris_gameroom::Command;
use tetris_gameroom::ConnId;
use tetris_gameroom::Event;
use tetris_gameroom::Room;
use tetris_gameroom::RoomError;

use crate::handle::RoomHandle;

/// Rejections that never reach a Room at all: the connection has no
/// room mapped, or named a room that doesn't match the one it's
/// actually seated in. Distinct from `RoomError`, which is a rejection
/// a live Room issued about its own state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    UnknownRoom,
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::UnknownRoom => write!(f, "no live room is associated with this connection"),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Indexes every live Room by name and every connection by the room it
/// last joined successfully. This is the only cross-room shared state
/// in the system (§5): both maps sit under their own short-lived lock,
/// and neither lock is ever held while a Room mutates its own state —
/// routing a command is just a channel send.
pub struct Registry {
    rooms: RwLock<HashMap<String, RoomHandle>>,
    members: RwLock<HashMap<ConnId, String>>,
}

impl Registry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            rooms: RwLock::new(HashMap::new()),
            members: RwLock::new(HashMap::new()),
        })
    }

    /// Joins `conn` to `room`, creating the room lazily if no one has
    /// named it yet. `sender` is the connection's own outbound event
    /// channel; the Room seats it only once the join is accepted, so
    /// membership here is recorded only after the Room's own `ack`
    /// confirms success — a rejected join leaves the connection
    /// unmapped, free to try another room.
    pub async fn join(
        self: &Arc<Self>,
        conn: ConnId,
        room: String,
        player_name: String,
        sender: UnboundedSender<Event>,
    ) -> Result<(), RoomError> {
        let handle = self.handle_or_create(room.clone()).await;
        let (ack_tx, ack_rx) = oneshot::channel();
        handle.send(
            conn,
            Command::Join {
                name: player_name,
                sender,
                ack: ack_tx,
            },
        );
        match ack_rx.await {
            Ok(Ok(())) => {
                self.members.write().await.insert(conn, room);
                Ok(())
            }
            Ok(Err(error)) => Err(error),
            Err(_) => {
                log::warn!("[registry] room '{}' mailbox closed before acking a join", room);
                Err(RoomError::BadPhase)
            }
        }
    }

    /// Unmaps `conn` and forwards a `Leave` to whatever room it was in.
    /// A no-op if the connection was never mapped — covers both a
    /// second `leave` and a connection whose join was rejected.
    pub async fn leave(&self, conn: ConnId) {
        let Some(room) = self.members.write().await.remove(&conn) else {
            return;
        };
        if let Some(handle) = self.rooms.read().await.get(&room) {
            handle.send(conn, Command::Leave);
        }
    }

    /// Routes a command naming its target room explicitly (`Start`,
    /// `Restart`, `Ready`). Rejects with `UnknownRoom` if `conn` isn't
    /// currently seated in exactly that room.
    pub async fn dispatch(&self, conn: ConnId, room: &str, command: Command) -> Result<(), RegistryError> {
        let current = self.members.read().await.get(&conn).cloned();
        if current.as_deref() != Some(room) {
            return Err(RegistryError::UnknownRoom);
        }
        self.forward(room, conn, command).await
    }

    /// Routes a command that carries no room name of its own
    /// (`Move`/`Rotate`/`HardDrop`) to whatever room `conn` last joined.
    pub async fn dispatch_to_current_room(&self, conn: ConnId, command: Command) -> Result<(), RegistryError> {
        let Some(room) = self.members.read().await.get(&conn).cloned() else {
            return Err(RegistryError::UnknownRoom);
        };
        self.forward(&room, conn, command).await
    }

    async fn forward(&self, room: &str, conn: ConnId, command: Command) -> Result<(), RegistryError> {
        let handle = self
            .rooms
            .read()
            .await
            .get(room)
            .cloned()
            .ok_or(RegistryError::UnknownRoom)?;
        handle.send(conn, command);
        Ok(())
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    async fn handle_or_create(self: &Arc<Self>, room: String) -> RoomHandle {
        if let Some(handle) = self.rooms.read().await.get(&room) {
            return handle.clone();
        }
        let mut rooms = self.rooms.write().await;
        if let Some(handle) = rooms.get(&room) {
            return handle.clone();
        }
        let (inbound_tx, inbound_rx) = unbounded_channel();
        let (done_tx, done_rx) = oneshot::channel();
        let handle = RoomHandle::new(inbound_tx);
        rooms.insert(room.clone(), handle.clone());
        drop(rooms);

        let engine = Room::new(room.clone());
        tokio::spawn(engine.run(inbound_rx, done_tx));

        let registry = self.clone();
        let name = room.clone();
        tokio::spawn(async move {
            let _ = done_rx.await;
            registry.rooms.write().await.remove(&name);
            log::info!("[registry] room '{}' reclaimed", name);
        });

        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel as event_channel;

    #[tokio::test]
    async fn join_creates_a_room_lazily_and_records_membership() {
        let registry = Registry::new();
        let conn = ConnId::default();
        let (tx, _rx) = event_channel();
        registry.clone().join(conn, "r1".into(), "alice".into(), tx).await.unwrap();
        assert_eq!(registry.room_count().await, 1);
    }

    #[tokio::test]
    async fn duplicate_name_join_surfaces_the_room_error() {
        let registry = Registry::new();
        let (tx1, _rx1) = event_channel();
        registry.clone().join(ConnId::default(), "r1".into(), "alice".into(), tx1).await.unwrap();

        let (tx2, _rx2) = event_channel();
        let err = registry
            .clone()
            .join(ConnId::default(), "r1".into(), "alice".into(), tx2)
            .await
            .unwrap_err();
        assert_eq!(err, RoomError::NameTaken);
    }

    #[tokio::test]
    async fn dispatch_without_a_join_is_unknown_room() {
        let registry = Registry::new();
        let err = registry
            .dispatch_to_current_room(ConnId::default(), Command::Rotate)
            .await
            .unwrap_err();
        assert_eq!(err, RegistryError::UnknownRoom);
    }

    #[tokio::test]
    async fn two_rooms_stay_independent() {
        let registry = Registry::new();
        let (tx1, _rx1) = event_channel();
        let (tx2, _rx2) = event_channel();
        registry.clone().join(ConnId::default(), "r1".into(), "alice".into(), tx1).await.unwrap();
        registry.clone().join(ConnId::default(), "r2".into(), "alice".into(), tx2).await.unwrap();
        assert_eq!(registry.room_count().await, 2);
    }
}
