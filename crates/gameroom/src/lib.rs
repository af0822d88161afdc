//! Authoritative per-room game engine for the Tetris server.
//!
//! This crate owns everything describing one room's state and the wire
//! protocol that drives it, with no knowledge of sockets, HTTP, or
//! persistence.
//!
//! ## Architecture
//!
//! - [`Room`] — the state machine: membership, gravity tick, moves,
//!   penalty distribution, win determination
//! - [`PlayerState`] — one seated player's board/piece/score state
//! - [`Table`] — owns the outbound channel for every seated connection
//! - [`Protocol`] — wire-frame decode/encode between [`Event`] and
//!   [`ServerMessage`]
//! - [`Event`] — internal notifications a Room emits
//! - [`TimerConfig`] — gravity tick cadence
mod event;
mod message;
mod player;
mod protocol;
mod room;
mod table;
mod timer;

pub use event::Event;
pub use message::CurrentPieces;
pub use message::ErrorCode;
pub use message::PieceDto;
pub use message::PlayerInfo;
pub use message::ServerMessage;
pub use player::ConnId;
pub use player::PlayerState;
pub use protocol::ClientCommand;
pub use protocol::Direction;
pub use protocol::Protocol;
pub use protocol::ProtocolError;
pub use room::Command;
pub use room::Phase;
pub use room::Room;
pub use room::RoomError;
pub use table::Table;
pub use timer::TimerConfig;
