//! Tetris multiplayer server entrypoint.
//!
//! Reads `BIND_ADDR` (default `0.0.0.0:3001`), `CLIENT_ORIGIN` (default
//! `http://localhost:3000`), and `DB_URL` (optional, enables the scores
//! admin query) from the environment.

#[tokio::main]
async fn main() {
    tetris_core::log();
    tetris_core::kys();
    tetris_server::run().await.expect("server exited with an error");
}
