//! Service context that bundles the port trait objects.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::adapters::live::gemini::GeminiGenerator;
use crate::adapters::recording::skin_generator::RecordingSkinGenerator;
use crate::adapters::replaying::skin_generator::ReplayingSkinGenerator;
use crate::cassette::recorder::CassetteRecorder;
use crate::cassette::replayer::CassetteReplayer;
use crate::config::Config;
use crate::error::SkinError;
use crate::ports::SkinGenerator;

/// Environment variable naming a cassette to replay.
pub const REPLAY_VAR: &str = "SKINMAKER_REPLAY";
/// Environment variable enabling recording (`1` or `true`).
pub const RECORD_VAR: &str = "SKINMAKER_REC";

/// Bundles the port trait objects.
pub struct ServiceContext {
    /// Skin generator port.
    pub generator: Box<dyn SkinGenerator>,
}

/// Handle to a recording session that must be finished after use.
pub struct RecordingSession {
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingSession {
    /// Finish the recording and write the cassette to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the generator is still alive or the file cannot be written.
    pub fn finish(self) -> Result<PathBuf, SkinError> {
        let recorder = Arc::try_unwrap(self.recorder)
            .map_err(|_| SkinError::Cassette("recording adapter still has references".into()))?
            .into_inner()
            .map_err(|e| SkinError::Cassette(format!("recorder lock poisoned: {e}")))?;
        recorder.finish().map_err(|e| SkinError::Cassette(format!("failed to write cassette: {e}")))
    }
}

impl ServiceContext {
    /// Pick live, recording or replaying mode from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing (live/recording) or the
    /// cassette cannot be loaded (replaying).
    pub fn from_env(config: &Config) -> Result<(Self, Option<RecordingSession>), SkinError> {
        if let Ok(cassette) = std::env::var(REPLAY_VAR) {
            log::debug!("Replaying from: {cassette}");
            return Ok((Self::replaying(Path::new(&cassette))?, None));
        }
        if std::env::var(RECORD_VAR).is_ok_and(|v| v == "true" || v == "1") {
            log::debug!("Recording mode enabled");
            let (ctx, session) = Self::recording(config)?;
            return Ok((ctx, Some(session)));
        }
        Ok((Self::live(config)?, None))
    }

    /// Create a live context.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is not configured.
    pub fn live(config: &Config) -> Result<Self, SkinError> {
        let key = config.gemini_key().ok_or_else(|| SkinError::MissingApiKey {
            provider: "Gemini".into(),
            env_var: "GEMINI_API_KEY".into(),
        })?;
        Ok(Self { generator: Box::new(GeminiGenerator::new(key)) })
    }

    /// Create a recording context that wraps the live adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if the live context cannot be created.
    pub fn recording(config: &Config) -> Result<(Self, RecordingSession), SkinError> {
        let live = Self::live(config)?;

        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%S").to_string();
        let path = PathBuf::from(".skinmaker/cassettes")
            .join(&timestamp)
            .join("skin_generator.cassette.yaml");
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(
            path,
            format!("{timestamp}-skin_generator"),
            commit_hash(),
        )));

        let generator = RecordingSkinGenerator::new(live.generator, Arc::clone(&recorder));
        Ok((Self { generator: Box::new(generator) }, RecordingSession { recorder }))
    }

    /// Create a replaying context from a cassette file.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette cannot be loaded.
    pub fn replaying(path: &Path) -> Result<Self, SkinError> {
        let replayer = CassetteReplayer::load(path)?;
        Ok(Self { generator: Box::new(ReplayingSkinGenerator::new(replayer)) })
    }
}

/// Current git commit hash, or "unknown".
fn commit_hash() -> String {
    std::process::Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map_or_else(|| "unknown".to_string(), |s| s.trim().to_string())
}
