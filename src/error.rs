//! Error types
//!
//! The simulation itself never fails. Errors only come from the edges:
//! acquiring a loudness source, talking to the runner thread, and reading
//! tuning files.

use thiserror::Error;

/// A loudness source could not be acquired or failed while running
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("no audio input device available")]
    DeviceUnavailable,
    #[error("unsupported input stream configuration: {0}")]
    StreamConfig(String),
    #[error("input stream error: {0}")]
    Stream(String),
    #[error("failed to spawn sampling thread")]
    Thread(#[source] std::io::Error),
}

/// A session command could not be carried out
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session did not start because its loudness source is unavailable
    #[error("cannot start session: {0}")]
    Source(#[from] SourceError),
    #[error("session runner has stopped")]
    RunnerStopped,
}

/// Tuning file problems
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read tuning file")]
    Io(#[from] std::io::Error),
    #[error("failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning value for `{field}`")]
    Invalid { field: &'static str },
}
