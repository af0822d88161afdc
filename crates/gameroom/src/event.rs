use tetris_board::Board;
use tetris_core::LineCount;
use tetris_core::Score;

use crate::message::CurrentPieces;
use crate::message::ErrorCode;
use crate::message::PieceDto;
use crate::message::PlayerInfo;
use crate::player::ConnId;

/// Events produced by a Room's mutating methods. Broadcast to the whole
/// room via `Table::broadcast`, except `Error`, which is always
/// unicast to the connection that caused it, and `Disconnect`, which
/// never leaves the process — `Protocol::encode` returns `None` for it.
#[derive(Clone, Debug)]
pub enum Event {
    PlayerJoined {
        player: PlayerInfo,
        players: Vec<PlayerInfo>,
    },
    PlayerLeft {
        player_id: ConnId,
        players: Vec<PlayerInfo>,
    },
    NewHost {
        host: PlayerInfo,
    },
    GameStarted {
        players: Vec<PlayerInfo>,
        current_pieces: Vec<CurrentPieces>,
    },
    BoardUpdate {
        player_id: ConnId,
        board: Board,
        spectrum: Vec<u32>,
        current_piece: Option<PieceDto>,
    },
    PieceMoved {
        player_id: ConnId,
        board: Board,
        spectrum: Vec<u32>,
    },
    PieceRotated {
        player_id: ConnId,
        board: Board,
        spectrum: Vec<u32>,
    },
    PieceDropped {
        player_id: ConnId,
        board: Board,
        spectrum: Vec<u32>,
        lines_cleared: LineCount,
    },
    PenaltyLinesAdded {
        target_player_id: ConnId,
        penalty_lines: LineCount,
        affected_players: Vec<PlayerInfo>,
    },
    PlayerLost {
        player_id: ConnId,
    },
    GameEnded {
        winner: Option<PlayerInfo>,
        players: Vec<PlayerInfo>,
    },
    Error {
        code: ErrorCode,
        message: String,
    },
    /// Internal-only: a player's connection dropped. Never reaches a
    /// client; the hosting layer watches for it to unregister senders.
    Disconnect(ConnId),
    /// Internal-only: a player's final tally is ready to persist,
    /// emitted alongside `PlayerLost` (demise) and alongside
    /// `GameEnded` for whichever player survived to win. The hosting
    /// layer watches for this to drive the optional `ScoreStore`;
    /// `Protocol::encode` never gives it a wire form.
    ScoreRecorded {
        name: String,
        score: Score,
        lines_cleared: LineCount,
        duration_secs: i64,
    },
}

impl Event {
    pub fn player_id(&self) -> Option<ConnId> {
        match self {
            Event::PlayerLeft { player_id, .. }
            | Event::BoardUpdate { player_id, .. }
            | Event::PieceMoved { player_id, .. }
            | Event::PieceRotated { player_id, .. }
            | Event::PieceDropped { player_id, .. }
            | Event::PlayerLost { player_id } => Some(*player_id),
            Event::Disconnect(id) => Some(*id),
            _ => None,
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Event::PlayerJoined { player, .. } => write!(f, "{} joined", player.name),
            Event::PlayerLeft { player_id, .. } => write!(f, "{} left", player_id),
            Event::NewHost { host } => write!(f, "{} is now host", host.name),
            Event::GameStarted { players, .. } => write!(f, "game started ({} players)", players.len()),
            Event::BoardUpdate { player_id, .. } => write!(f, "{}: board update", player_id),
            Event::PieceMoved { player_id, .. } => write!(f, "{}: moved", player_id),
            Event::PieceRotated { player_id, .. } => write!(f, "{}: rotated", player_id),
            Event::PieceDropped { player_id, lines_cleared, .. } => {
                write!(f, "{}: dropped ({} lines)", player_id, lines_cleared)
            }
            Event::PenaltyLinesAdded { penalty_lines, affected_players, .. } => {
                write!(f, "{} penalty row(s) to {} player(s)", penalty_lines, affected_players.len())
            }
            Event::PlayerLost { player_id } => write!(f, "{}: topped out", player_id),
            Event::GameEnded { winner, .. } => match winner {
                Some(p) => write!(f, "game over, winner: {}", p.name),
                None => write!(f, "game over, no winner"),
            },
            Event::Error { message, .. } => write!(f, "error: {}", message),
            Event::Disconnect(id) => write!(f, "{}: disconnected", id),
            Event::ScoreRecorded { name, score, .. } => write!(f, "{}: final score {}", name, score),
        }
    }
}
