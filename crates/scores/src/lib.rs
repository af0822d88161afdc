//! Optional high-score persistence.
//!
//! The authoritative game core (`tetris-gameroom`) never depends on
//! this crate — per §1/§6 of the core spec, `ScoreStore` is an external
//! collaborator the hosting layer drives on its own, through exactly
//! two calls: [`ScoreStore::save_score`] on a player's demise or game
//! end, and [`ScoreStore::top_scores`] for an admin query.
use std::sync::Arc;
use tetris_core::LineCount;
use tetris_core::Score;
use tokio_postgres::Client;

/// `scores` table name, kept as a constant so every query composes it
/// with `const_format::concatcp!` rather than repeating the literal.
pub const SCORES: &str = "scores";

/// One row of the `scores` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRecord {
    pub name: String,
    pub score: Score,
    pub lines_cleared: LineCount,
    pub duration_secs: i64,
}

/// Append-only high-score ledger. Implemented directly on `Arc<Client>`
/// rather than boxed as a trait object: this crate has exactly one
/// backend, so there's nothing to abstract over — the hosting layer
/// just wraps the calls in `if let Some(client) = &state.scores`.
#[allow(async_fn_in_trait)]
pub trait ScoreStore {
    async fn save_score(
        &self,
        name: &str,
        score: Score,
        lines_cleared: LineCount,
        duration_secs: i64,
    ) -> Result<(), tokio_postgres::Error>;

    async fn top_scores(&self, limit: i64) -> Result<Vec<ScoreRecord>, tokio_postgres::Error>;
}

impl ScoreStore for Arc<Client> {
    async fn save_score(
        &self,
        name: &str,
        score: Score,
        lines_cleared: LineCount,
        duration_secs: i64,
    ) -> Result<(), tokio_postgres::Error> {
        self.execute(
            const_format::concatcp!(
                "INSERT INTO ",
                SCORES,
                " (name, score, lines_cleared, duration_secs) VALUES ($1, $2, $3, $4)"
            ),
            &[&name, &(score as i64), &(lines_cleared as i32), &duration_secs],
        )
        .await
        .map(|_| ())
    }

    async fn top_scores(&self, limit: i64) -> Result<Vec<ScoreRecord>, tokio_postgres::Error> {
        self.query(
            const_format::concatcp!(
                "SELECT name, score, lines_cleared, duration_secs FROM ",
                SCORES,
                " ORDER BY score DESC LIMIT $1"
            ),
            &[&limit],
        )
        .await
        .map(|rows| {
            rows.iter()
                .map(|row| ScoreRecord {
                    name: row.get(0),
                    score: row.get::<_, i64>(1) as Score,
                    lines_cleared: row.get::<_, i32>(2) as LineCount,
                    duration_secs: row.get(3),
                })
                .collect()
        })
    }
}

/// Establishes a database connection from `DB_URL`. Returns `None`
/// rather than panicking when the variable is unset, since persistence
/// is optional here — callers run the server with scores disabled in
/// that case.
pub async fn connect() -> Option<Arc<Client>> {
    let url = std::env::var("DB_URL").ok()?;
    log::info!("connecting to scores database");
    let tls = tokio_postgres::tls::NoTls;
    let (client, connection) = tokio_postgres::connect(&url, tls)
        .await
        .inspect_err(|e| log::error!("scores database connection failed: {}", e))
        .ok()?;
    tokio::spawn(connection);
    let client = Arc::new(client);
    if let Err(e) = client
        .execute(
            const_format::concatcp!(
                "CREATE TABLE IF NOT EXISTS ",
                SCORES,
                " (id SERIAL PRIMARY KEY, name TEXT NOT NULL, score BIGINT NOT NULL, ",
                "lines_cleared INTEGER NOT NULL, duration_secs BIGINT NOT NULL, ",
                "created_at TIMESTAMPTZ NOT NULL DEFAULT now())"
            ),
            &[],
        )
        .await
    {
        log::error!("failed to ensure scores table exists: {}", e);
    }
    Some(client)
}
