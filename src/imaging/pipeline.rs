//! Normalize → stylize → overlay.

use std::path::Path;

use super::codec::{decode, encode_png, write_atomic, ImageSource, CANVAS};
use super::overlay::overlay;
use super::style::{stylize, StyleParameters};
use crate::error::{ProcessingError, Stage};

/// Final image of a pipeline run.
#[derive(Debug)]
pub struct PipelineOutput {
    /// Encoded PNG, 308×560.
    pub image: Vec<u8>,
    /// Whether the frame/caption overlay was applied.
    pub framed: bool,
}

/// Decode `input`, cover-fit it to 308×560 around the center and encode as PNG.
///
/// When `output` is given the buffer is also written there.
///
/// # Errors
///
/// Returns a [`ProcessingError`] tagged `normalize` if the input cannot be
/// read or decoded, or the result cannot be encoded or written.
pub fn normalize(input: &ImageSource, output: Option<&Path>) -> Result<Vec<u8>, ProcessingError> {
    let img = decode(input, Stage::Normalize)?;
    log::debug!("normalize: {}x{} -> {}x{}", img.width(), img.height(), CANVAS.width, CANVAS.height);
    let buffer = encode_png(&CANVAS.cover(&img))
        .map_err(|e| ProcessingError::encode(Stage::Normalize, e))?;
    if let Some(path) = output {
        write_atomic(path, &buffer).map_err(|e| ProcessingError::io(Stage::Normalize, e))?;
    }
    Ok(buffer)
}

/// Run the full pipeline with the default style.
///
/// # Errors
///
/// Propagates normalize and stylize failures, and a failed write of
/// `output`. Overlay problems never fail the run.
pub fn run_pipeline(
    input: &ImageSource,
    output: Option<&Path>,
    display_name: &str,
) -> Result<PipelineOutput, ProcessingError> {
    run_pipeline_with(input, output, display_name, &StyleParameters::default())
}

/// Run the full pipeline with explicit style parameters.
///
/// # Errors
///
/// See [`run_pipeline`].
pub fn run_pipeline_with(
    input: &ImageSource,
    output: Option<&Path>,
    display_name: &str,
    params: &StyleParameters,
) -> Result<PipelineOutput, ProcessingError> {
    log::info!("Step 1/3: normalizing image");
    let normalized = normalize(input, None)?;

    log::info!("Step 2/3: applying skin style");
    let styled = stylize(&normalized, params)?;

    log::info!("Step 3/3: framing for {display_name}");
    let outcome = overlay(styled, display_name);
    let framed = !outcome.is_degraded();
    let image = outcome.into_image();

    if let Some(path) = output {
        write_atomic(path, &image).map_err(|e| ProcessingError::io(Stage::Output, e))?;
        log::info!("Saved: {}", path.display());
    }
    Ok(PipelineOutput { image, framed })
}
