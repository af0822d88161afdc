use serde::Deserialize;
use serde_json::Value;

use crate::event::Event;
use crate::message::ServerMessage;

/// A lateral movement or soft drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Down,
}

/// The fully-parsed form of an inbound client frame, still carrying the
/// target room name for `Join`/`Start`/`Restart`/`Ready` — the Registry
/// strips it once the room is resolved.
#[derive(Debug, Clone)]
pub enum ClientCommand {
    Join { room: String, player_name: String },
    Start { room: String },
    Restart { room: String },
    Ready { room: String },
    Move(Direction),
    Rotate,
    HardDrop,
}

/// Errors that can occur while parsing a client frame. Distinct from
/// `RoomError`: these never reach room state, they're rejected before
/// a command is even constructed.
#[derive(Debug, Clone)]
pub enum ProtocolError {
    MalformedFrame(String),
    UnknownCommand(String),
    MissingField { event: String, field: &'static str },
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedFrame(s) => write!(f, "malformed frame: {}", s),
            Self::UnknownCommand(s) => write!(f, "unknown command: {}", s),
            Self::MissingField { event, field } => {
                write!(f, "{} frame missing field {}", event, field)
            }
        }
    }
}

impl std::error::Error for ProtocolError {}

#[derive(Debug, Clone, Deserialize)]
struct RawFrame {
    event: String,
    #[serde(default)]
    data: Value,
}

/// Handles wire-frame parsing and Event-to-ServerMessage conversion.
/// Centralizes the protocol layer between internal events and the
/// `{"event": ..., "data": ...}` frames clients actually send/receive.
pub struct Protocol;

impl Protocol {
    /// Parses one inbound text frame. Accepts both wire vocabularies
    /// the client may use for in-game moves: direct `movePiece`/
    /// `rotatePiece`/`hardDrop` events, and the `gameAction` envelope
    /// with a `type` field. An unrecognized event name is rejected with
    /// `UnknownCommand` rather than silently ignored.
    pub fn decode(text: &str) -> Result<ClientCommand, ProtocolError> {
        let frame: RawFrame =
            serde_json::from_str(text).map_err(|e| ProtocolError::MalformedFrame(e.to_string()))?;
        Self::command_from(&frame.event, &frame.data)
    }

    fn command_from(event: &str, data: &Value) -> Result<ClientCommand, ProtocolError> {
        match event {
            "joinGame" => Ok(ClientCommand::Join {
                room: Self::field_str(event, data, "room")?,
                player_name: Self::field_str(event, data, "playerName")?,
            }),
            "startGame" => Ok(ClientCommand::Start {
                room: Self::field_str(event, data, "room")?,
            }),
            "restartGame" => Ok(ClientCommand::Restart {
                room: Self::field_str(event, data, "room")?,
            }),
            "playerReady" => Ok(ClientCommand::Ready {
                room: Self::field_str(event, data, "room")?,
            }),
            "movePiece" => Ok(ClientCommand::Move(Self::field_direction(event, data)?)),
            "rotatePiece" => Ok(ClientCommand::Rotate),
            "hardDrop" => Ok(ClientCommand::HardDrop),
            "gameAction" => Self::game_action(event, data),
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }

    fn game_action(event: &str, data: &Value) -> Result<ClientCommand, ProtocolError> {
        let kind = data
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| ProtocolError::MissingField {
                event: event.to_string(),
                field: "type",
            })?;
        match kind {
            "move" => Ok(ClientCommand::Move(Self::field_direction(event, data)?)),
            "rotate" => Ok(ClientCommand::Rotate),
            "hardDrop" => Ok(ClientCommand::HardDrop),
            other => Err(ProtocolError::UnknownCommand(format!("gameAction:{other}"))),
        }
    }

    fn field_str(event: &str, data: &Value, field: &'static str) -> Result<String, ProtocolError> {
        data.get(field)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ProtocolError::MissingField {
                event: event.to_string(),
                field,
            })
    }

    fn field_direction(event: &str, data: &Value) -> Result<Direction, ProtocolError> {
        let raw = Self::field_str(event, data, "direction")?;
        match raw.as_str() {
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            "down" => Ok(Direction::Down),
            _ => Err(ProtocolError::UnknownCommand(format!("direction:{raw}"))),
        }
    }

    /// Converts an internal Event to a wire ServerMessage. Returns
    /// `None` for events with no client-facing representation.
    pub fn encode(event: &Event) -> Option<ServerMessage> {
        match event.clone() {
            Event::PlayerJoined { player, players } => {
                Some(ServerMessage::PlayerJoined { player, players })
            }
            Event::PlayerLeft { player_id, players } => {
                Some(ServerMessage::PlayerLeft { player_id, players })
            }
            Event::NewHost { host } => Some(ServerMessage::NewHost { host }),
            Event::GameStarted { players, current_pieces } => {
                Some(ServerMessage::GameStarted { players, current_pieces })
            }
            Event::BoardUpdate { player_id, board, spectrum, current_piece } => {
                Some(ServerMessage::BoardUpdate { player_id, board, spectrum, current_piece })
            }
            Event::PieceMoved { player_id, board, spectrum } => {
                Some(ServerMessage::PieceMoved { player_id, board, spectrum })
            }
            Event::PieceRotated { player_id, board, spectrum } => {
                Some(ServerMessage::PieceRotated { player_id, board, spectrum })
            }
            Event::PieceDropped { player_id, board, spectrum, lines_cleared } => {
                Some(ServerMessage::PieceDropped { player_id, board, spectrum, lines_cleared })
            }
            Event::PenaltyLinesAdded { target_player_id, penalty_lines, affected_players } => {
                Some(ServerMessage::PenaltyLinesAdded {
                    target_player_id,
                    penalty_lines,
                    affected_players,
                })
            }
            Event::PlayerLost { player_id } => Some(ServerMessage::PlayerLost { player_id }),
            Event::GameEnded { winner, players } => Some(ServerMessage::GameEnded { winner, players }),
            Event::Error { code, message } => Some(ServerMessage::Error { code, message }),
            Event::Disconnect(_) => None,
            Event::ScoreRecorded { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_join_game() {
        let cmd = Protocol::decode(r#"{"event":"joinGame","data":{"room":"r1","playerName":"alice"}}"#).unwrap();
        assert!(matches!(cmd, ClientCommand::Join { room, player_name } if room == "r1" && player_name == "alice"));
    }

    #[test]
    fn decode_move_piece_direct_vocabulary() {
        let cmd = Protocol::decode(r#"{"event":"movePiece","data":{"direction":"left"}}"#).unwrap();
        assert!(matches!(cmd, ClientCommand::Move(Direction::Left)));
    }

    #[test]
    fn decode_move_via_game_action_vocabulary() {
        let cmd =
            Protocol::decode(r#"{"event":"gameAction","data":{"type":"move","direction":"right"}}"#).unwrap();
        assert!(matches!(cmd, ClientCommand::Move(Direction::Right)));
    }

    #[test]
    fn decode_hard_drop_via_game_action() {
        let cmd = Protocol::decode(r#"{"event":"gameAction","data":{"type":"hardDrop"}}"#).unwrap();
        assert!(matches!(cmd, ClientCommand::HardDrop));
    }

    #[test]
    fn decode_unknown_event_is_rejected() {
        let err = Protocol::decode(r#"{"event":"teleport","data":{}}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownCommand(_)));
    }

    #[test]
    fn decode_missing_field_is_rejected() {
        let err = Protocol::decode(r#"{"event":"joinGame","data":{"room":"r1"}}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::MissingField { .. }));
    }

    #[test]
    fn decode_malformed_json_is_rejected() {
        let err = Protocol::decode("not json").unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedFrame(_)));
    }

    #[test]
    fn encode_disconnect_has_no_wire_form() {
        assert!(Protocol::encode(&Event::Disconnect(Default::default())).is_none());
    }
}
