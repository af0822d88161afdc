//! WebSocket Transport adapter — §4.6 of the core spec, concretized
//! over `actix-ws`.
//!
//! This crate is the only place that knows about sockets. It owns no
//! game state: every inbound frame becomes a [`tetris_gameroom::Command`]
//! routed through a [`tetris_registry::Registry`], and every outbound
//! [`tetris_gameroom::Event`] is encoded back to a wire frame.
mod bridge;

pub use bridge::bridge;
