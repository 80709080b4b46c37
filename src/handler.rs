//! Upload handling: photo + champion in, stored skin reference out.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Config;
use crate::error::SkinError;
use crate::imaging::{run_pipeline_with, ImageSource, StyleParameters};
use crate::model::resolve_model;
use crate::output::{reserve_skin_file, save_png};
use crate::ports::{GenerationRequest, InlineImage, SkinGenerator};
use crate::prompt::skin_prompt;

/// How a skin is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SkinMode {
    /// Generative-image API.
    Ai,
    /// Local normalize/stylize/overlay pipeline.
    Local,
}

/// Settings the handler needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct HandlerConfig {
    /// Directory results are written into.
    pub upload_dir: PathBuf,
    /// Prefix of the reported URL.
    pub url_prefix: String,
    /// Resolved generation model.
    pub model: String,
    /// Color parameters for local mode.
    pub style: StyleParameters,
}

impl HandlerConfig {
    /// Resolve handler settings from the config file and CLI overrides.
    #[must_use]
    pub fn resolve(config: &Config, model: Option<&str>, upload_dir: Option<&Path>) -> Self {
        Self {
            upload_dir: upload_dir.map_or_else(|| config.output.upload_dir.clone(), Path::to_path_buf),
            url_prefix: config.output.url_prefix.trim_end_matches('/').to_string(),
            model: resolve_model(model.unwrap_or(&config.defaults.model)),
            style: config.style,
        }
    }
}

/// One skin request.
#[derive(Debug, Clone)]
pub struct SkinRequest {
    /// Uploaded photo on disk.
    pub photo: PathBuf,
    /// Champion the skin is for.
    pub champion: String,
    /// Generation path.
    pub mode: SkinMode,
}

/// Reference to a stored skin.
#[derive(Debug, Serialize)]
pub struct SkinResponse {
    /// Always `true`.
    pub success: bool,
    /// Human-readable summary.
    pub message: String,
    /// Stored file name.
    pub filename: String,
    /// URL the file is served under.
    pub url: String,
    /// File size in bytes.
    pub size: u64,
    /// Champion name as requested.
    pub champion: String,
    /// Generation path used.
    pub mode: SkinMode,
    /// Whether the decorative frame was applied (local mode only).
    pub framed: bool,
    /// Completion time.
    pub timestamp: DateTime<Utc>,
}

/// Failure body, mirroring [`SkinResponse`].
#[derive(Debug, Serialize)]
pub struct FailureResponse {
    /// Always `false`.
    pub success: bool,
    /// Error message.
    pub error: String,
    /// Failure time.
    pub timestamp: DateTime<Utc>,
}

impl FailureResponse {
    /// Build from any error.
    #[must_use]
    pub fn from_error(err: &SkinError) -> Self {
        Self { success: false, error: err.to_string(), timestamp: Utc::now() }
    }
}

/// Readiness of the API path.
#[derive(Debug, Serialize)]
pub struct HealthReport {
    /// `ok` or `error`.
    pub status: &'static str,
    /// Whether a Gemini key is available.
    pub api_key_configured: bool,
    /// Generation backend description.
    pub mode: &'static str,
    /// Report time.
    pub timestamp: DateTime<Utc>,
}

impl HealthReport {
    /// Check `config` for a usable API key.
    #[must_use]
    pub fn check(config: &Config) -> Self {
        let api_key_configured = config.gemini_key().is_some();
        Self {
            status: if api_key_configured { "ok" } else { "error" },
            api_key_configured,
            mode: "Gemini API only",
            timestamp: Utc::now(),
        }
    }

    /// Whether the report is healthy.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.api_key_configured
    }
}

/// Turns a photo into a stored skin.
pub struct Handler {
    config: HandlerConfig,
    generator: Option<Box<dyn SkinGenerator>>,
}

impl Handler {
    /// Create a handler. `generator` is only needed for [`SkinMode::Ai`].
    #[must_use]
    pub fn new(config: HandlerConfig, generator: Option<Box<dyn SkinGenerator>>) -> Self {
        Self { config, generator }
    }

    /// Produce, store and describe one skin.
    ///
    /// On failure any partially written result file is removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the champion is empty, the generator is missing or
    /// fails, the pipeline fails, or the result cannot be stored.
    pub async fn generate_skin(&self, request: &SkinRequest) -> Result<SkinResponse, SkinError> {
        let champion = request.champion.trim();
        if champion.is_empty() {
            return Err(SkinError::InvalidArgument("champion name is required".into()));
        }

        tokio::fs::create_dir_all(&self.config.upload_dir).await?;
        let (filename, output_path) =
            reserve_skin_file(&self.config.upload_dir, champion, Utc::now().timestamp_millis())?;

        log::info!("Generating {champion} skin ({:?} mode)", request.mode);
        log::debug!("Input: {}", request.photo.display());
        log::debug!("Output: {}", output_path.display());

        let result = match request.mode {
            SkinMode::Ai => self.generate_with_api(&request.photo, champion, &output_path).await,
            SkinMode::Local => self.generate_locally(&request.photo, champion, &output_path).await,
        };
        let framed = match result {
            Ok(framed) => framed,
            Err(e) => {
                remove_reserved(&output_path).await;
                return Err(e);
            }
        };

        let size = tokio::fs::metadata(&output_path).await?.len();
        log::info!("Skin ready: {filename} ({size} bytes)");

        Ok(SkinResponse {
            success: true,
            message: "Skin generated successfully.".into(),
            url: format!("{}/{filename}", self.config.url_prefix),
            filename,
            size,
            champion: champion.to_string(),
            mode: request.mode,
            framed,
            timestamp: Utc::now(),
        })
    }

    async fn generate_with_api(
        &self,
        photo: &Path,
        champion: &str,
        output_path: &Path,
    ) -> Result<bool, SkinError> {
        let generator = self.generator.as_ref().ok_or_else(|| SkinError::MissingApiKey {
            provider: "Gemini".into(),
            env_var: "GEMINI_API_KEY".into(),
        })?;

        let request = GenerationRequest {
            model: self.config.model.clone(),
            prompt: skin_prompt(champion),
            photo: InlineImage::sniffed(tokio::fs::read(photo).await?),
        };
        let response = generator.generate(&request).await?;
        let image = response.images.into_iter().next().ok_or_else(|| SkinError::Api {
            status: 200,
            message: "Model did not return an image".into(),
        })?;

        let target = output_path.to_path_buf();
        tokio::task::spawn_blocking(move || save_png(&image.data, &image.mime_type, &target))
            .await??;
        log::info!("Saved: {}", output_path.display());
        Ok(false)
    }

    /// Runs the pipeline on the blocking pool so codec work stays off the runtime.
    async fn generate_locally(
        &self,
        photo: &Path,
        champion: &str,
        output_path: &Path,
    ) -> Result<bool, SkinError> {
        let source = ImageSource::Path(photo.to_path_buf());
        let target = output_path.to_path_buf();
        let champion = champion.to_string();
        let style = self.config.style;

        let output = tokio::task::spawn_blocking(move || {
            run_pipeline_with(&source, Some(&target), &champion, &style)
        })
        .await??;
        Ok(output.framed)
    }
}

/// Remove the file reserved for a failed request. Only this request's own
/// placeholder or partial result is ever at that path.
async fn remove_reserved(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Failed to remove {}: {e}", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::skin_generator::{GenerateFuture, GenerationResponse};
    use image::{DynamicImage, GenericImageView, ImageFormat};
    use std::io::Cursor;

    struct FixedGenerator(InlineImage);

    impl SkinGenerator for FixedGenerator {
        fn generate(&self, request: &GenerationRequest) -> GenerateFuture<'_> {
            assert!(request.prompt.contains("Ahri"));
            let image = self.0.clone();
            Box::pin(async move { Ok(GenerationResponse { images: vec![image] }) })
        }
    }

    fn jpeg(w: u32, h: u32) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::new_rgb8(w, h).write_to(&mut buf, ImageFormat::Jpeg).unwrap();
        buf.into_inner()
    }

    fn handler(dir: &Path, generator: Option<Box<dyn SkinGenerator>>) -> Handler {
        let config = HandlerConfig {
            upload_dir: dir.join("uploads"),
            url_prefix: "/uploads".into(),
            model: "gemini-2.5-flash-image".into(),
            style: StyleParameters::default(),
        };
        Handler::new(config, generator)
    }

    fn photo(dir: &Path) -> PathBuf {
        let path = dir.join("photo.jpg");
        std::fs::write(&path, jpeg(640, 480)).unwrap();
        path
    }

    #[test]
    fn resolve_prefers_cli_overrides() {
        let config = Config::default();
        let resolved = HandlerConfig::resolve(&config, Some("nano-banana-pro"), Some(Path::new("out")));
        assert_eq!(resolved.model, "gemini-3-pro-image-preview");
        assert_eq!(resolved.upload_dir, PathBuf::from("out"));

        let defaults = HandlerConfig::resolve(&config, None, None);
        assert_eq!(defaults.model, "gemini-2.5-flash-image");
        assert_eq!(defaults.upload_dir, PathBuf::from("uploads"));
    }

    #[tokio::test]
    async fn local_mode_stores_framed_skin() {
        let dir = tempfile::tempdir().unwrap();
        let h = handler(dir.path(), None);
        let request =
            SkinRequest { photo: photo(dir.path()), champion: "Garen".into(), mode: SkinMode::Local };

        let response = h.generate_skin(&request).await.unwrap();
        assert!(response.success);
        assert!(response.framed);
        assert!(response.filename.starts_with("skin_") && response.filename.ends_with("_garen.png"));
        assert_eq!(response.url, format!("/uploads/{}", response.filename));

        let stored = std::fs::read(dir.path().join("uploads").join(&response.filename)).unwrap();
        assert_eq!(stored.len() as u64, response.size);
        assert_eq!(image::load_from_memory(&stored).unwrap().dimensions(), (308, 560));
    }

    #[tokio::test]
    async fn ai_mode_converts_generated_jpeg_to_png() {
        let dir = tempfile::tempdir().unwrap();
        let generated = InlineImage { data: jpeg(32, 32), mime_type: "image/jpeg".into() };
        let h = handler(dir.path(), Some(Box::new(FixedGenerator(generated))));
        let request =
            SkinRequest { photo: photo(dir.path()), champion: "Ahri".into(), mode: SkinMode::Ai };

        let response = h.generate_skin(&request).await.unwrap();
        assert!(!response.framed);
        let stored = std::fs::read(dir.path().join("uploads").join(&response.filename)).unwrap();
        assert_eq!(image::guess_format(&stored).unwrap(), ImageFormat::Png);
    }

    #[tokio::test]
    async fn ai_mode_without_generator_reports_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let h = handler(dir.path(), None);
        let request =
            SkinRequest { photo: photo(dir.path()), champion: "Ahri".into(), mode: SkinMode::Ai };
        assert!(matches!(h.generate_skin(&request).await, Err(SkinError::MissingApiKey { .. })));
    }

    #[tokio::test]
    async fn unusable_generated_image_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let garbage = InlineImage { data: b"not an image".to_vec(), mime_type: "image/png".into() };
        let h = handler(dir.path(), Some(Box::new(FixedGenerator(garbage))));
        let request =
            SkinRequest { photo: photo(dir.path()), champion: "Ahri".into(), mode: SkinMode::Ai };

        assert!(h.generate_skin(&request).await.is_err());
        assert_eq!(std::fs::read_dir(dir.path().join("uploads")).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn unreadable_photo_fails_in_normalize() {
        let dir = tempfile::tempdir().unwrap();
        let h = handler(dir.path(), None);
        let request = SkinRequest {
            photo: dir.path().join("missing.jpg"),
            champion: "Garen".into(),
            mode: SkinMode::Local,
        };
        let err = h.generate_skin(&request).await.unwrap_err();
        assert!(err.to_string().contains("normalize failed"), "{err}");
        assert_eq!(std::fs::read_dir(dir.path().join("uploads")).unwrap().count(), 0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn concurrent_requests_get_their_own_files() {
        let dir = tempfile::tempdir().unwrap();
        let h = handler(dir.path(), None);
        let request =
            SkinRequest { photo: photo(dir.path()), champion: "Garen".into(), mode: SkinMode::Local };

        let ticks = std::sync::atomic::AtomicUsize::new(0);
        let ticker = async {
            for _ in 0..10 {
                ticks.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                tokio::task::yield_now().await;
            }
        };
        let (first, second, ()) =
            tokio::join!(h.generate_skin(&request), h.generate_skin(&request), ticker);
        let (first, second) = (first.unwrap(), second.unwrap());

        assert_eq!(ticks.load(std::sync::atomic::Ordering::Relaxed), 10);
        assert_ne!(first.filename, second.filename);
        for response in [&first, &second] {
            let stored = std::fs::read(dir.path().join("uploads").join(&response.filename)).unwrap();
            assert_eq!(stored.len() as u64, response.size);
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn failed_request_keeps_finished_neighbour() {
        let dir = tempfile::tempdir().unwrap();
        let h = handler(dir.path(), None);
        let good =
            SkinRequest { photo: photo(dir.path()), champion: "Garen".into(), mode: SkinMode::Local };
        let bad = SkinRequest { photo: dir.path().join("missing.jpg"), ..good.clone() };

        let (ok, err) = tokio::join!(h.generate_skin(&good), h.generate_skin(&bad));
        let ok = ok.unwrap();
        assert!(err.is_err());

        let remaining: Vec<_> = std::fs::read_dir(dir.path().join("uploads"))
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(remaining, vec![ok.filename]);
    }

    #[tokio::test]
    async fn blank_champion_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let h = handler(dir.path(), None);
        let request = SkinRequest { photo: photo(dir.path()), champion: "  ".into(), mode: SkinMode::Local };
        assert!(matches!(h.generate_skin(&request).await, Err(SkinError::InvalidArgument(_))));
    }

    #[test]
    fn health_reflects_key() {
        let mut config = Config::default();
        config.keys.gemini = Some("k".into());
        assert!(HealthReport::check(&config).is_ok());
    }

    #[test]
    fn failure_response_carries_message() {
        let body = FailureResponse::from_error(&SkinError::InvalidArgument("x".into()));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Invalid argument: x");
    }
}
