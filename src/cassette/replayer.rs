//! Serves recorded interactions back in order.

use std::collections::{HashMap, VecDeque};
use std::path::Path;

use super::{Cassette, Interaction};
use crate::error::SkinError;

/// Replays a cassette, one queue per port/method pair.
#[derive(Debug)]
pub struct CassetteReplayer {
    queues: HashMap<(String, String), VecDeque<Interaction>>,
}

impl CassetteReplayer {
    /// Build a replayer from a loaded cassette.
    #[must_use]
    pub fn new(cassette: Cassette) -> Self {
        let mut queues: HashMap<(String, String), VecDeque<Interaction>> = HashMap::new();
        let mut interactions = cassette.interactions;
        interactions.sort_by_key(|i| i.seq);
        for interaction in interactions {
            queues
                .entry((interaction.port.clone(), interaction.method.clone()))
                .or_default()
                .push_back(interaction);
        }
        Self { queues }
    }

    /// Read and parse a cassette file.
    ///
    /// # Errors
    ///
    /// Returns [`SkinError::Cassette`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, SkinError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SkinError::Cassette(format!("Failed to read cassette {}: {e}", path.display()))
        })?;
        let cassette: Cassette = serde_yaml::from_str(&content).map_err(|e| {
            SkinError::Cassette(format!("Failed to parse cassette {}: {e}", path.display()))
        })?;
        log::debug!("Loaded cassette '{}' ({} interactions)", cassette.name, cassette.interactions.len());
        Ok(Self::new(cassette))
    }

    /// Take the next interaction recorded for `port`/`method`.
    ///
    /// # Errors
    ///
    /// Returns [`SkinError::Cassette`] if nothing (more) was recorded for the pair.
    pub fn next_interaction(&mut self, port: &str, method: &str) -> Result<Interaction, SkinError> {
        let key = (port.to_string(), method.to_string());
        let Some(queue) = self.queues.get_mut(&key) else {
            let mut available: Vec<String> =
                self.queues.keys().map(|(p, m)| format!("{p}::{m}")).collect();
            available.sort();
            return Err(SkinError::Cassette(format!(
                "no interactions recorded for {port}::{method}; available: [{}]",
                available.join(", ")
            )));
        };
        queue.pop_front().ok_or_else(|| {
            SkinError::Cassette(format!("all interactions for {port}::{method} have been consumed"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn interaction(seq: u64, champion: &str) -> Interaction {
        Interaction {
            seq,
            port: "skin_generator".into(),
            method: "generate".into(),
            input: json!({ "prompt": champion }),
            output: json!({ "Ok": { "images": [] } }),
        }
    }

    fn cassette(interactions: Vec<Interaction>) -> Cassette {
        Cassette { name: "test".into(), recorded_at: Utc::now(), commit: "abc".into(), interactions }
    }

    #[test]
    fn replays_in_sequence_order() {
        let mut replayer =
            CassetteReplayer::new(cassette(vec![interaction(1, "Garen"), interaction(0, "Ahri")]));
        assert_eq!(replayer.next_interaction("skin_generator", "generate").unwrap().seq, 0);
        assert_eq!(replayer.next_interaction("skin_generator", "generate").unwrap().seq, 1);
    }

    #[test]
    fn exhausted_queue_is_an_error() {
        let mut replayer = CassetteReplayer::new(cassette(vec![interaction(0, "Ahri")]));
        replayer.next_interaction("skin_generator", "generate").unwrap();
        let err = replayer.next_interaction("skin_generator", "generate").unwrap_err();
        assert!(err.to_string().contains("consumed"));
    }

    #[test]
    fn unknown_port_lists_available_pairs() {
        let mut replayer = CassetteReplayer::new(cassette(vec![interaction(0, "Ahri")]));
        let err = replayer.next_interaction("uploader", "put").unwrap_err();
        assert!(err.to_string().contains("skin_generator::generate"));
    }

    #[test]
    fn load_round_trips_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.cassette.yaml");
        std::fs::write(&path, serde_yaml::to_string(&cassette(vec![interaction(0, "Lux")])).unwrap())
            .unwrap();

        let mut replayer = CassetteReplayer::load(&path).unwrap();
        let i = replayer.next_interaction("skin_generator", "generate").unwrap();
        assert_eq!(i.input["prompt"], "Lux");
    }

    #[test]
    fn load_missing_file_fails() {
        assert!(CassetteReplayer::load(Path::new("/nonexistent/cassette.yaml")).is_err());
    }
}
