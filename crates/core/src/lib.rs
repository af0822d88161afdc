//! Core type aliases, identifiers, constants, and the logging/signal
//! bootstrap shared across the tetris workspace.
#![allow(dead_code)]

// ============================================================================
// TYPE ALIASES
// ============================================================================
/// Column index on a board, 0..=9.
pub type Column = usize;
/// Row index on a board, 0 = top, 0..=19.
pub type Row = usize;
/// Number of lines cleared in a single lock-in.
pub type LineCount = u32;
/// Accumulated score.
pub type Score = u64;
/// A player's index into the room's shared piece stream.
pub type Cursor = u64;

// ============================================================================
// TRAITS
// ============================================================================
/// Unique identifier trait for domain entities.
pub trait Unique<T = Self> {
    fn id(&self) -> ID<T>;
}

// ============================================================================
// IDENTITY TYPES
// ============================================================================
use std::cmp::Ordering;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::hash::Hash;
use std::hash::Hasher;
use std::marker::PhantomData;

/// Generic ID wrapper providing compile-time type safety over uuid::Uuid.
pub struct ID<T> {
    inner: uuid::Uuid,
    marker: PhantomData<T>,
}

impl<T> ID<T> {
    pub fn inner(&self) -> uuid::Uuid {
        self.inner
    }
    /// Cast ID<T> to ID<U> while preserving the underlying UUID.
    pub fn cast<U>(self) -> ID<U> {
        ID {
            inner: self.inner,
            marker: PhantomData,
        }
    }
}

impl<T> From<ID<T>> for uuid::Uuid {
    fn from(id: ID<T>) -> Self {
        id.inner()
    }
}
impl<T> From<uuid::Uuid> for ID<T> {
    fn from(inner: uuid::Uuid) -> Self {
        Self {
            inner,
            marker: PhantomData,
        }
    }
}

impl<T> Default for ID<T> {
    fn default() -> Self {
        Self {
            inner: uuid::Uuid::now_v7(),
            marker: PhantomData,
        }
    }
}

impl<T> Copy for ID<T> {}
impl<T> Clone for ID<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Eq for ID<T> {}
impl<T> PartialEq for ID<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T> Ord for ID<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<T> PartialOrd for ID<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Hash for ID<T> {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.inner.hash(state);
    }
}

impl<T> Debug for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ID").field(&self.inner).finish()
    }
}
impl<T> Display for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

impl<T> serde::Serialize for ID<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(&self.inner)
    }
}

// ============================================================================
// BOARD / GAME PARAMETERS
// ============================================================================
/// Board width in columns.
pub const WIDTH: usize = 10;
/// Board height in rows.
pub const HEIGHT: usize = 20;
/// Spawn column for a freshly drawn piece.
pub const SPAWN_X: i32 = 3;
/// Spawn row for a freshly drawn piece.
pub const SPAWN_Y: i32 = 0;
/// Gravity tick interval, milliseconds.
pub const DROP_INTERVAL_MS: u64 = 1000;
/// Score awarded per line cleared, multiplied by the clear count.
pub const SCORE_PER_LINE: Score = 100;
/// Minimum simultaneous line clears that trigger a penalty.
pub const PENALTY_THRESHOLD: LineCount = 2;
/// Column left empty in every injected penalty row.
pub const PENALTY_GAP_COLUMN: Column = 0;
/// Minimum players required for a host to start a room.
pub const MIN_PLAYERS_TO_START: usize = 1;
/// Optional cap on room size; `None` disables the cap.
pub const ROOM_CAPACITY: Option<usize> = Some(4);

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Initialize dual logging (terminal + file) with timestamped log files.
/// Creates `logs/` directory and writes DEBUG level to file, INFO to terminal.
#[cfg(feature = "server")]
pub fn log() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}

/// Register Ctrl+C handler for immediate (non-graceful) termination.
#[cfg(feature = "server")]
pub fn kys() {
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.unwrap();
        println!();
        log::warn!("violent interrupt received, exiting immediately");
        std::process::exit(0);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker;

    #[test]
    fn id_roundtrips_through_uuid() {
        let id = ID::<Marker>::default();
        let uuid: uuid::Uuid = id.into();
        let back: ID<Marker> = ID::from(uuid);
        assert_eq!(id, back);
    }

    #[test]
    fn id_cast_preserves_bits() {
        struct Other;
        let id = ID::<Marker>::default();
        let casted: ID<Other> = id.cast();
        assert_eq!(id.inner(), casted.inner());
    }

    #[test]
    fn board_dimensions_are_fixed() {
        assert_eq!(WIDTH, 10);
        assert_eq!(HEIGHT, 20);
    }
}
