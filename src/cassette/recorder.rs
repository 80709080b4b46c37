//! Collects interactions and writes them as a cassette.

use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;

use super::{Cassette, Interaction};

/// Accumulates interactions in memory until [`CassetteRecorder::finish`].
#[derive(Debug)]
pub struct CassetteRecorder {
    path: PathBuf,
    name: String,
    commit: String,
    interactions: Vec<Interaction>,
}

impl CassetteRecorder {
    /// Create a recorder that will write to `path`.
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>, commit: impl Into<String>) -> Self {
        Self { path: path.into(), name: name.into(), commit: commit.into(), interactions: Vec::new() }
    }

    /// Record a call and its result using the `Ok`/`Err` convention.
    ///
    /// Values that cannot be serialized are logged and skipped; recording
    /// never changes the outcome of the call being recorded.
    pub fn record<I, T, E>(&mut self, port: &str, method: &str, input: &I, result: &Result<T, E>)
    where
        I: Serialize,
        T: Serialize,
        E: std::fmt::Display,
    {
        let input = match serde_json::to_value(input) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("Not recording {port}::{method}: input not serializable: {e}");
                return;
            }
        };
        let output = match result {
            Ok(v) => match serde_json::to_value(v) {
                Ok(inner) => serde_json::json!({ "Ok": inner }),
                Err(e) => {
                    log::warn!("Not recording {port}::{method}: output not serializable: {e}");
                    return;
                }
            },
            Err(e) => serde_json::json!({ "Err": e.to_string() }),
        };
        let seq = self.interactions.len() as u64;
        self.interactions.push(Interaction {
            seq,
            port: port.to_string(),
            method: method.to_string(),
            input,
            output,
        });
    }

    /// Write the cassette YAML file and return its path.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn finish(self) -> Result<PathBuf, std::io::Error> {
        let cassette = Cassette {
            name: self.name,
            recorded_at: Utc::now(),
            commit: self.commit,
            interactions: self.interactions,
        };
        let yaml = serde_yaml::to_string(&cassette).map_err(std::io::Error::other)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, yaml)?;
        Ok(self.path)
    }
}
