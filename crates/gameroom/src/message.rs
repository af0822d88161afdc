use serde::Serialize;
use tetris_board::Board;
use tetris_board::Kind;
use tetris_board::Piece;
use tetris_core::LineCount;
use tetris_core::Score;

use crate::player::ConnId;
use crate::player::PlayerState;

/// Wire snapshot of a player, sent alongside most room-scoped events.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    pub id: ConnId,
    pub name: String,
    pub room_name: String,
    pub is_host: bool,
    pub is_alive: bool,
    pub is_ready: bool,
    pub score: Score,
    pub lines_cleared: LineCount,
    pub spectrum: Vec<u32>,
}

impl PlayerInfo {
    pub fn of(player: &PlayerState, room_name: &str) -> Self {
        Self {
            id: player.id(),
            name: player.name().to_string(),
            room_name: room_name.to_string(),
            is_host: player.is_host(),
            is_alive: player.is_alive(),
            is_ready: player.is_ready(),
            score: player.score(),
            lines_cleared: player.lines_cleared(),
            spectrum: player.spectrum().to_vec(),
        }
    }
}

/// Wire snapshot of a falling piece.
#[derive(Clone, Debug, Serialize)]
pub struct PieceDto {
    #[serde(rename = "type")]
    pub kind: Kind,
    pub x: i32,
    pub y: i32,
    pub shape: Vec<Vec<bool>>,
}

impl PieceDto {
    pub fn of(piece: &Piece) -> Self {
        Self {
            kind: piece.kind(),
            x: piece.x(),
            y: piece.y(),
            shape: piece.shape().to_vec(),
        }
    }
}

/// A player's current/next piece pair, sent once at game start.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentPieces {
    pub player_id: ConnId,
    pub current_piece: PieceDto,
    pub next_piece: PieceDto,
}

/// Connection-scoped error codes, one per §7 taxonomy entry.
#[derive(Clone, Copy, Debug, Serialize)]
pub enum ErrorCode {
    NameTaken,
    GameInProgress,
    RoomFull,
    NotHost,
    BadPhase,
    UnknownRoom,
    UnknownCommand,
    Internal,
}

/// Every message the server sends to a client. Framed on the wire as
/// `{"event": <tag>, "data": <fields>}` — an adjacently tagged enum
/// matches that shape directly, with variant names and field names
/// both rendered camelCase to match the client vocabulary.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
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
        #[serde(skip_serializing_if = "Option::is_none")]
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
}

impl ServerMessage {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("serialize server message")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_frames_as_event_and_data() {
        let message = ServerMessage::PlayerLost {
            player_id: ConnId::default(),
        };
        let json = message.to_json();
        assert!(json.contains("\"event\":\"playerLost\""));
        assert!(json.contains("\"data\":{\"playerId\""));
    }

    #[test]
    fn error_code_serializes_without_renaming() {
        let message = ServerMessage::Error {
            code: ErrorCode::NameTaken,
            message: "alice is taken".into(),
        };
        let json = message.to_json();
        assert!(json.contains("\"code\":\"NameTaken\""));
    }

    #[test]
    fn player_info_surfaces_the_ready_flag() {
        let mut player = PlayerState::join(ConnId::default(), "alice".into(), true);
        assert!(!PlayerInfo::of(&player, "r1").is_ready);
        player.mark_ready();
        assert!(PlayerInfo::of(&player, "r1").is_ready);
    }

    #[test]
    fn piece_dto_renames_kind_to_type() {
        let dto = PieceDto::of(&Piece::spawn(Kind::T));
        let json = serde_json::to_string(&dto).unwrap();
        assert!(json.starts_with("{\"type\":\"T\""));
    }

    #[test]
    fn board_field_serializes_as_a_bare_matrix() {
        let message = ServerMessage::BoardUpdate {
            player_id: ConnId::default(),
            board: tetris_board::Board::empty(),
            spectrum: vec![0; tetris_core::WIDTH],
            current_piece: None,
        };
        let value: serde_json::Value = serde_json::from_str(&message.to_json()).unwrap();
        let board = &value["data"]["board"];
        assert!(board.is_array(), "board must be a bare array, not {board}");
        assert_eq!(board.as_array().unwrap().len(), tetris_core::HEIGHT);
    }
}
