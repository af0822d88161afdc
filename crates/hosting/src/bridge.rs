use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::unbounded_channel;
use tokio_postgres::Client;

use tetris_gameroom::ClientCommand;
use tetris_gameroom::Command;
use tetris_gameroom::ConnId;
use tetris_gameroom::ErrorCode;
use tetris_gameroom::Event;
use tetris_gameroom::Protocol;
use tetris_gameroom::ServerMessage;
use tetris_registry::Registry;
use tetris_registry::RegistryError;
use tetris_scores::ScoreStore;

/// Bridges one `actix-ws` connection to the Registry/Room command
/// protocol — the concrete Transport adapter of §4.6/§5. Owns the
/// connection's identity and its outbound event channel; everything
/// else (room membership, game state) lives behind the Registry.
///
/// A `tokio::select! { biased; ... }` between the room-side outbound
/// channel and the socket's inbound message stream, so a queued event
/// is always flushed before the next inbound frame is read.
pub async fn bridge(
    registry: Arc<Registry>,
    scores: Option<Arc<Client>>,
    mut session: actix_ws::Session,
    mut stream: actix_ws::MessageStream,
) {
    let conn = ConnId::default();
    let (sender, mut outbound) = unbounded_channel::<Event>();
    log::debug!("[bridge {}] connected", conn);

    'session: loop {
        tokio::select! {
            biased;
            event = outbound.recv() => match event {
                Some(Event::ScoreRecorded { name, score, lines_cleared, duration_secs }) => {
                    record_score(&scores, &name, score, lines_cleared, duration_secs).await;
                }
                Some(event) => {
                    if let Some(message) = Protocol::encode(&event) {
                        if session.text(message.to_json()).await.is_err() {
                            break 'session;
                        }
                    }
                }
                None => break 'session,
            },
            frame = stream.next() => match frame {
                Some(Ok(actix_ws::Message::Text(text))) => {
                    handle_frame(&registry, conn, &text, &sender, &mut session).await;
                }
                Some(Ok(actix_ws::Message::Close(_))) | None => break 'session,
                Some(Err(_)) => break 'session,
                _ => continue 'session,
            },
        }
    }

    registry.leave(conn).await;
    log::debug!("[bridge {}] disconnected", conn);
}

async fn handle_frame(
    registry: &Arc<Registry>,
    conn: ConnId,
    text: &str,
    sender: &UnboundedSender<Event>,
    session: &mut actix_ws::Session,
) {
    let command = match Protocol::decode(text) {
        Ok(command) => command,
        Err(error) => {
            send_direct(session, ErrorCode::UnknownCommand, error.to_string()).await;
            return;
        }
    };

    let outcome: Result<(), (ErrorCode, String)> = match command {
        ClientCommand::Join { room, player_name } => registry
            .clone()
            .join(conn, room, player_name, sender.clone())
            .await
            .map_err(|e| (e.code(), e.to_string())),
        ClientCommand::Start { room } => registry
            .dispatch(conn, &room, Command::Start)
            .await
            .map_err(registry_error),
        ClientCommand::Restart { room } => registry
            .dispatch(conn, &room, Command::Restart)
            .await
            .map_err(registry_error),
        ClientCommand::Ready { room } => registry
            .dispatch(conn, &room, Command::Ready)
            .await
            .map_err(registry_error),
        ClientCommand::Move(direction) => registry
            .dispatch_to_current_room(conn, Command::Move(direction))
            .await
            .map_err(registry_error),
        ClientCommand::Rotate => registry
            .dispatch_to_current_room(conn, Command::Rotate)
            .await
            .map_err(registry_error),
        ClientCommand::HardDrop => registry
            .dispatch_to_current_room(conn, Command::HardDrop)
            .await
            .map_err(registry_error),
    };

    if let Err((code, message)) = outcome {
        send_direct(session, code, message).await;
    }
}

fn registry_error(error: RegistryError) -> (ErrorCode, String) {
    match error {
        RegistryError::UnknownRoom => (ErrorCode::UnknownRoom, error.to_string()),
    }
}

/// Sends an error directly to this connection's socket, bypassing the
/// room's `Table` — used for rejections the connection incurs before
/// (or instead of) being seated anywhere, so there's no room-side
/// sender to unicast through yet.
async fn send_direct(session: &mut actix_ws::Session, code: ErrorCode, message: String) {
    let frame = ServerMessage::Error { code, message }.to_json();
    let _ = session.text(frame).await;
}

/// Persists one player's final tally if a `ScoreStore` is configured.
/// A no-op otherwise — per §1/§6, `ScoreStore` is an optional external
/// collaborator the core never depends on directly.
async fn record_score(scores: &Option<Arc<Client>>, name: &str, score: u64, lines_cleared: u32, duration_secs: i64) {
    let Some(client) = scores else {
        return;
    };
    if let Err(e) = client.save_score(name, score, lines_cleared, duration_secs).await {
        log::error!("[bridge] failed to save score for {}: {}", name, e);
    }
}
