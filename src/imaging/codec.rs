//! Decode/encode boundary of the pipeline.
//!
//! Every stage reads an encoded buffer and hands back an encoded buffer; the
//! output encoding is always PNG.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};

use crate::error::{ProcessingError, Stage};

/// Fixed output canvas: 308×560, cover fit, center anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasGeometry {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
}

/// The single supported canvas.
pub const CANVAS: CanvasGeometry = CanvasGeometry { width: 308, height: 560 };

impl CanvasGeometry {
    /// Scale `img` to cover the canvas and crop the overflow around the center.
    #[must_use]
    pub fn cover(self, img: &DynamicImage) -> DynamicImage {
        img.resize_to_fill(self.width, self.height, FilterType::Lanczos3)
    }

    /// Whether `img` already has the canvas dimensions.
    #[must_use]
    pub fn matches(self, img: &DynamicImage) -> bool {
        img.width() == self.width && img.height() == self.height
    }
}

/// Pipeline input: a file on disk or an in-memory encoded buffer.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Encoded image file.
    Path(PathBuf),
    /// Encoded image bytes.
    Bytes(Vec<u8>),
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

/// Decode a source, sniffing the format from content rather than extension.
pub(crate) fn decode(source: &ImageSource, stage: Stage) -> Result<DynamicImage, ProcessingError> {
    match source {
        ImageSource::Path(path) => ImageReader::open(path)
            .map_err(|e| ProcessingError::io(stage, e))?
            .with_guessed_format()
            .map_err(|e| ProcessingError::io(stage, e))?
            .decode()
            .map_err(|e| ProcessingError::decode(stage, e)),
        ImageSource::Bytes(bytes) => decode_bytes(bytes, stage),
    }
}

pub(crate) fn decode_bytes(bytes: &[u8], stage: Stage) -> Result<DynamicImage, ProcessingError> {
    image::load_from_memory(bytes).map_err(|e| ProcessingError::decode(stage, e))
}

/// Encode as PNG.
pub(crate) fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

/// Write `data` to `path` via a temporary file in the same directory.
///
/// The target is either fully written or untouched; the temporary file is
/// removed on every error path when it is dropped.
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new().prefix(".skinmaker-").suffix(".tmp").tempfile_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
