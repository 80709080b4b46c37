//! Configuration file loading with environment variable overrides.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::imaging::StyleParameters;

/// Environment variables checked, in order, for the Gemini API key.
pub const GEMINI_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "NANOBANA_API_KEY"];

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// API key configuration.
    #[serde(default)]
    pub keys: KeysConfig,

    /// Default parameter values used when CLI flags are absent.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Where results are stored and how they are referenced.
    #[serde(default)]
    pub output: OutputConfig,

    /// Color parameters for the local pipeline.
    #[serde(default)]
    pub style: StyleParameters,
}

/// API key configuration.
#[derive(Debug, Default, Deserialize)]
pub struct KeysConfig {
    /// Gemini API key.
    pub gemini: Option<String>,
}

/// Default parameter values from config file.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Default model name or alias.
    pub model: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self { model: "nano-banana".to_string() }
    }
}

/// Result storage settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory generated skins are written into.
    pub upload_dir: PathBuf,
    /// Prefix of the reference URL reported for each skin.
    pub url_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { upload_dir: PathBuf::from("uploads"), url_prefix: "/uploads".to_string() }
    }
}

impl Config {
    /// Load configuration from the given path, or return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
        toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
    }

    /// Get the Gemini API key, preferring environment variables.
    #[must_use]
    pub fn gemini_key(&self) -> Option<String> {
        self.gemini_key_with(|var| std::env::var(var).ok())
    }

    /// Resolve the Gemini key with `lookup` standing in for the environment.
    fn gemini_key_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        GEMINI_KEY_VARS
            .iter()
            .find_map(|var| lookup(var).filter(|v| !v.is_empty()))
            .or_else(|| self.keys.gemini.clone())
    }
}

/// Discover the config file path using the resolution order:
/// 1. Explicit path (from `--config` flag)
/// 2. `SKINMAKER_CONFIG` environment variable
/// 3. `~/.config/skinmaker/config.toml`
#[must_use]
pub fn discover_config_path(explicit: Option<&str>) -> PathBuf {
    if let Some(p) = explicit {
        return PathBuf::from(p);
    }

    if let Ok(p) = std::env::var("SKINMAKER_CONFIG") {
        return PathBuf::from(p);
    }

    default_config_path()
}

/// Default config path: `~/.config/skinmaker/config.toml`.
fn default_config_path() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".config/skinmaker/config.toml")
    } else {
        PathBuf::from("skinmaker.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.keys.gemini.is_none());
        assert_eq!(config.defaults.model, "nano-banana");
        assert_eq!(config.output.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.output.url_prefix, "/uploads");
        assert_eq!(config.style, StyleParameters::default());
    }

    #[test]
    fn load_nonexistent_returns_defaults() {
        let config = Config::load(Path::new("/nonexistent/path/config.toml")).unwrap();
        assert_eq!(config.defaults.model, "nano-banana");
    }

    #[test]
    fn load_valid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[keys]
gemini = "test-gemini-key"

[defaults]
model = "nano-banana-pro"

[output]
upload_dir = "/srv/skins"

[style]
saturation = 1.0
hue = 0
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.keys.gemini.as_deref(), Some("test-gemini-key"));
        assert_eq!(config.defaults.model, "nano-banana-pro");
        assert_eq!(config.output.upload_dir, PathBuf::from("/srv/skins"));
        assert_eq!(config.output.url_prefix, "/uploads");
        assert_eq!(config.style.hue, 0);
        assert!((config.style.brightness - 1.1).abs() < f32::EPSILON);
    }

    #[test]
    fn load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").unwrap();

        assert!(Config::load(&path).is_err());
    }

    fn file_key_config() -> Config {
        Config { keys: KeysConfig { gemini: Some("from-file".into()) }, ..Config::default() }
    }

    #[test]
    fn gemini_key_falls_back_to_file() {
        let config = file_key_config();
        assert_eq!(config.gemini_key_with(|_| None).as_deref(), Some("from-file"));
        // Empty variables count as unset.
        assert_eq!(config.gemini_key_with(|_| Some(String::new())).as_deref(), Some("from-file"));
    }

    #[test]
    fn gemini_key_prefers_environment_in_order() {
        let config = file_key_config();
        let both = |var: &str| Some(format!("env-{var}"));
        assert_eq!(config.gemini_key_with(both).as_deref(), Some("env-GEMINI_API_KEY"));

        let legacy_only =
            |var: &str| (var == "NANOBANA_API_KEY").then(|| "legacy".to_string());
        assert_eq!(config.gemini_key_with(legacy_only).as_deref(), Some("legacy"));
    }

    #[test]
    fn gemini_key_absent_everywhere() {
        assert!(Config::default().gemini_key_with(|_| None).is_none());
    }

    #[test]
    fn discover_explicit_path() {
        let path = discover_config_path(Some("/tmp/my-config.toml"));
        assert_eq!(path, PathBuf::from("/tmp/my-config.toml"));
    }
}
