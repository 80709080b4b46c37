//! Record/replay of generator interactions for offline runs and tests.
//!
//! A cassette is a YAML file holding the sequence of port calls made during
//! one recorded session.

pub mod recorder;
pub mod replayer;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A recorded session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cassette {
    /// Session name.
    pub name: String,
    /// When the session was written.
    pub recorded_at: DateTime<Utc>,
    /// Source revision the session was recorded from.
    pub commit: String,
    /// Calls in the order they happened.
    pub interactions: Vec<Interaction>,
}

/// One call through a port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    /// Position in the session.
    pub seq: u64,
    /// Port name (e.g., `skin_generator`).
    pub port: String,
    /// Method name (e.g., `generate`).
    pub method: String,
    /// Serialized call input.
    pub input: serde_json::Value,
    /// Serialized result, `{"Ok": ..}` or `{"Err": "message"}`.
    pub output: serde_json::Value,
}
