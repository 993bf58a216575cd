//! Voice Hop - a side-scrolling arcade game steered by your voice
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, spawning, collisions, scoring)
//! - `loudness`: Loudness smoothing and background loudness sources
//! - `session`: Countdown/run/game-over controller and published snapshots
//! - `runner`: Background thread driving a session
//! - `tuning`: Data-driven game balance

pub mod error;
pub mod loudness;
pub mod runner;
pub mod session;
pub mod sim;
pub mod tuning;

pub use error::{ConfigError, SessionError, SourceError};
pub use runner::Runner;
pub use session::{Session, Snapshot};
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Physics tick cadence (ms), best effort
    pub const TICK_INTERVAL_MS: u64 = 16;
    /// Countdown length before a run (seconds)
    pub const COUNTDOWN_SECS: u32 = 3;
    /// Loudness reported for silence and failed reads (dB)
    pub const SILENCE_FLOOR_DB: f32 = -80.0;
    /// Seed of the first run when none is given
    pub const DEFAULT_SEED: u64 = 0x5EED_0F_B1AD;
}
