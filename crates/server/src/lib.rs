//! HTTP/WS route table: CORS, health check, the websocket upgrade, and
//! the scores admin query — §6/§6A of the core spec.
//!
//! ## Routes
//!
//! - `GET /health` — liveness, including the scores database if one is
//!   configured
//! - `GET /ws` — the websocket upgrade; every subsequent frame is
//!   handled by [`tetris_hosting::bridge`]
//! - `GET /scores/top` — admin query over the optional `ScoreStore`
pub mod handlers;

use actix_cors::Cors;
use actix_web::App;
use actix_web::HttpServer;
use actix_web::middleware::Logger;
use actix_web::web;

use tetris_registry::Registry;

/// Default listen port, per §6.
const DEFAULT_PORT: u16 = 3001;
/// Default allowed client origin, per §6.
const DEFAULT_CLIENT_ORIGIN: &str = "http://localhost:3000";

#[rustfmt::skip]
pub async fn run() -> std::io::Result<()> {
    let registry = Registry::new();
    let scores = tetris_scores::connect().await;
    let origin = std::env::var("CLIENT_ORIGIN").unwrap_or_else(|_| DEFAULT_CLIENT_ORIGIN.to_string());
    let bind = std::env::var("BIND_ADDR").unwrap_or_else(|_| format!("0.0.0.0:{}", DEFAULT_PORT));

    let registry = web::Data::new(registry);
    let scores = web::Data::new(scores);

    log::info!("starting tetris server on {} (client origin {})", bind, origin);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%r %s %Ts"))
            .wrap(
                Cors::default()
                    .allowed_origin(&origin)
                    .allow_any_method()
                    .allow_any_header(),
            )
            .app_data(registry.clone())
            .app_data(scores.clone())
            .route("/health", web::get().to(handlers::health))
            .route("/ws", web::get().to(handlers::connect))
            .service(
                web::scope("/scores")
                    .route("/top", web::get().to(handlers::top_scores)),
            )
    })
    .bind(bind)?
    .run()
    .await
}
