//! Local image pipeline: normalize, stylize, overlay.
//!
//! | Stage | Function | Fails outward |
//! |---|---|---|
//! | Cover-fit to 308×560, PNG | [`normalize`] | yes, tagged `normalize` |
//! | Brightness, then saturation/hue | [`stylize`] | yes, tagged `stylize` |
//! | Frame, caption band, name | [`overlay`] | never (degrades) |
//! | All three | [`run_pipeline`] | normalize/stylize only |
//!
//! Everything runs in memory; files are touched only when an input path or
//! output path is supplied.

pub mod codec;
pub mod overlay;
pub mod pipeline;
pub mod style;

pub use codec::{CanvasGeometry, ImageSource, CANVAS};
pub use overlay::{overlay, OverlayError, OverlayOutcome, OverlaySpec, CAPTION};
pub use pipeline::{normalize, run_pipeline, run_pipeline_with, PipelineOutput};
pub use style::{stylize, Adjustment, StyleParameters};
