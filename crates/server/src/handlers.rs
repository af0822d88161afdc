use std::sync::Arc;

use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::Responder;
use actix_web::web;
use serde::Deserialize;
use tetris_registry::Registry;
use tetris_scores::ScoreStore;
use tokio_postgres::Client;

/// `GET /health`. Reports the scores database as part of the check
/// only when one is configured — an unconfigured (score-less) server is
/// still healthy, per §1: `ScoreStore` is optional.
pub async fn health(scores: web::Data<Option<Arc<Client>>>) -> impl Responder {
    match scores.get_ref() {
        Some(client) => match client.execute("SELECT 1", &[]).await {
            Ok(_) => HttpResponse::Ok().body("ok"),
            Err(e) => {
                log::error!("health check failed: {}", e);
                HttpResponse::ServiceUnavailable().body("database unavailable")
            }
        },
        None => HttpResponse::Ok().body("ok"),
    }
}

/// `GET /ws`. Upgrades to a websocket and hands the connection straight
/// to the Transport bridge; the HTTP layer never touches a frame body.
pub async fn connect(
    registry: web::Data<Arc<Registry>>,
    scores: web::Data<Option<Arc<Client>>>,
    body: web::Payload,
    req: HttpRequest,
) -> actix_web::Result<HttpResponse> {
    let (response, session, stream) = actix_ws::handle(&req, body)?;
    let registry = registry.get_ref().clone();
    let scores = scores.get_ref().clone();
    actix_web::rt::spawn(tetris_hosting::bridge(registry, scores, session, stream));
    Ok(response)
}

#[derive(Debug, Deserialize)]
pub struct TopScoresQuery {
    limit: Option<i64>,
}

/// `GET /scores/top?limit=N`. Admin query over the optional ScoreStore;
/// an empty list when no store is configured rather than an error, so
/// clients don't need to special-case a score-less deployment.
pub async fn top_scores(scores: web::Data<Option<Arc<Client>>>, query: web::Query<TopScoresQuery>) -> impl Responder {
    let Some(client) = scores.get_ref() else {
        return HttpResponse::Ok().json(Vec::<serde_json::Value>::new());
    };
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    match client.top_scores(limit).await {
        Ok(records) => HttpResponse::Ok().json(
            records
                .into_iter()
                .map(|r| {
                    serde_json::json!({
                        "name": r.name,
                        "score": r.score,
                        "linesCleared": r.lines_cleared,
                        "durationSecs": r.duration_secs,
                    })
                })
                .collect::<Vec<_>>(),
        ),
        Err(e) => {
            log::error!("top_scores query failed: {}", e);
            HttpResponse::InternalServerError().body("query failed")
        }
    }
}
