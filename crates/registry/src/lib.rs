//! Cross-room indexing: room-by-name and connection-by-id, plus the
//! join/leave/start/restart/move/rotate/hardDrop routing built on top
//! of them — §4.5 of the core spec.
//!
//! This crate owns no game state itself. Every mutation still happens
//! inside a Room's own task; the [`Registry`] only knows how to reach
//! it.
mod handle;
mod registry;

pub use handle::RoomHandle;
pub use registry::Registry;
pub use registry::RegistryError;
