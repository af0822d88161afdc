use tokio::sync::mpsc::UnboundedSender;

use tetris_gameroom::Command;
use tetris_gameroom::ConnId;

/// What the Registry keeps for one live room: just enough to forward a
/// `(ConnId, Command)` into that room's own mailbox. The room owns
/// everything else — its roster, its outbound `Table`, its tick source —
/// none of it is visible here.
#[derive(Clone)]
pub struct RoomHandle {
    inbound: UnboundedSender<(ConnId, Command)>,
}

impl RoomHandle {
    pub fn new(inbound: UnboundedSender<(ConnId, Command)>) -> Self {
        Self { inbound }
    }

    pub fn send(&self, conn: ConnId, command: Command) {
        if self.inbound.send((conn, command)).is_err() {
            log::warn!("[registry] room mailbox closed while routing a command");
        }
    }
}
