use std::collections::HashMap;
use tokio::sync::mpsc::UnboundedSender;

use crate::event::Event;
use crate::player::ConnId;

/// Owns the outbound channel for every connection currently seated in a
/// room. Separates "how do I reach this connection" from game logic —
/// Room never touches a socket directly, only this table.
#[derive(Debug, Default)]
pub struct Table {
    senders: HashMap<ConnId, UnboundedSender<Event>>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a connection's outbound sender.
    pub fn sit(&mut self, id: ConnId, sender: UnboundedSender<Event>) {
        self.senders.insert(id, sender);
    }

    /// Unregisters a connection. A no-op if it was never seated.
    pub fn remove(&mut self, id: ConnId) {
        self.senders.remove(&id);
    }

    pub fn seats(&self) -> usize {
        self.senders.len()
    }

    pub fn is_seated(&self, id: ConnId) -> bool {
        self.senders.contains_key(&id)
    }

    /// Sends an event to one connection.
    pub fn unicast(&self, id: ConnId, event: Event) {
        match self.senders.get(&id).map(|inbox| inbox.send(event)) {
            Some(Ok(())) => {}
            Some(Err(e)) => log::warn!("[table] unicast to {} failed: {:?}", id, e),
            None => log::warn!("[table] unicast to {}: no such connection", id),
        }
    }

    /// Sends an event to every seated connection. Logged distinctly for
    /// events scoped to one player (`event.player_id()` is `Some`) versus
    /// room-wide events (joins, host changes, game start/end), so a log
    /// scan can tell at a glance whether a line is per-player chatter or
    /// a roster-level transition.
    pub fn broadcast(&self, event: Event) {
        match event.player_id() {
            Some(id) => log::debug!("[table] broadcast (player {}): {}", id, event),
            None => log::debug!("[table] broadcast: {}", event),
        }
        for (id, inbox) in &self.senders {
            if let Err(e) = inbox.send(event.clone()) {
                log::warn!("[table] broadcast to {} failed: {:?}", id, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn table_starts_empty() {
        let table = Table::new();
        assert_eq!(table.seats(), 0);
    }

    #[test]
    fn sit_and_remove() {
        let mut table = Table::new();
        let id = ConnId::default();
        let (tx, _rx) = unbounded_channel();
        table.sit(id, tx);
        assert!(table.is_seated(id));
        assert_eq!(table.seats(), 1);
        table.remove(id);
        assert!(!table.is_seated(id));
        assert_eq!(table.seats(), 0);
    }

    #[test]
    fn unicast_to_unknown_connection_does_not_panic() {
        let table = Table::new();
        table.unicast(ConnId::default(), Event::PlayerLost { player_id: ConnId::default() });
    }

    #[test]
    fn broadcast_reaches_every_seated_connection() {
        let mut table = Table::new();
        let (tx1, mut rx1) = unbounded_channel();
        let (tx2, mut rx2) = unbounded_channel();
        table.sit(ConnId::default(), tx1);
        table.sit(ConnId::default(), tx2);
        table.broadcast(Event::PlayerLost { player_id: ConnId::default() });
        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }
}
