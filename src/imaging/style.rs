//! Color modulation: brightness, then saturation/hue.

use image::{DynamicImage, Rgba, RgbaImage};
use serde::Deserialize;

use super::codec::{decode_bytes, encode_png, CANVAS};
use crate::error::{ProcessingError, Stage};

/// Color adjustment applied by [`stylize`].
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct StyleParameters {
    /// Channel multiplier.
    pub brightness: f32,
    /// HSL saturation multiplier.
    pub saturation: f32,
    /// Carried alongside the other factors but not applied.
    // TODO: apply contrast once the expected curve (linear around mid-gray or
    // around the image mean) is settled; until then it has no effect.
    pub contrast: f32,
    /// Hue rotation in degrees.
    pub hue: i32,
}

impl Default for StyleParameters {
    fn default() -> Self {
        Self { brightness: 1.1, saturation: 1.3, contrast: 1.2, hue: 20 }
    }
}

/// One color pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Adjustment {
    /// Multiply every channel.
    Brightness(f32),
    /// Scale saturation and rotate hue in a single HSL pass.
    SaturationHue {
        /// Saturation multiplier.
        saturation: f32,
        /// Hue rotation in degrees.
        hue: i32,
    },
}

impl StyleParameters {
    /// The passes [`stylize`] runs, in order.
    ///
    /// Brightness and saturation/hue are separate passes and never merged;
    /// identity factors are skipped.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn plan(&self) -> Vec<Adjustment> {
        let mut passes = Vec::with_capacity(2);
        if self.brightness != 1.0 {
            passes.push(Adjustment::Brightness(self.brightness));
        }
        if self.saturation != 1.0 || self.hue != 0 {
            passes.push(Adjustment::SaturationHue { saturation: self.saturation, hue: self.hue });
        }
        passes
    }
}

/// Apply `params` to an encoded image and re-fit it to the canvas.
///
/// Geometry is idempotent; color is not, so repeated calls compound.
///
/// # Errors
///
/// Returns a [`ProcessingError`] tagged `stylize` if the buffer cannot be
/// decoded or the result cannot be encoded.
pub fn stylize(buffer: &[u8], params: &StyleParameters) -> Result<Vec<u8>, ProcessingError> {
    let mut rgba = decode_bytes(buffer, Stage::Stylize)?.to_rgba8();
    if (params.contrast - 1.0).abs() > f32::EPSILON {
        log::debug!("stylize: contrast {} is not applied", params.contrast);
    }
    for pass in params.plan() {
        log::debug!("stylize: {pass:?}");
        apply(&mut rgba, pass);
    }
    let fitted = CANVAS.cover(&DynamicImage::ImageRgba8(rgba));
    encode_png(&fitted).map_err(|e| ProcessingError::encode(Stage::Stylize, e))
}

fn apply(img: &mut RgbaImage, pass: Adjustment) {
    match pass {
        Adjustment::Brightness(factor) => {
            for px in img.pixels_mut() {
                let [r, g, b, a] = px.0;
                *px = Rgba([scale(r, factor), scale(g, factor), scale(b, factor), a]);
            }
        }
        Adjustment::SaturationHue { saturation, hue } => {
            #[allow(clippy::cast_precision_loss)]
            let shift = hue as f32;
            for px in img.pixels_mut() {
                let [r, g, b, a] = px.0;
                let (h, s, l) = rgb_to_hsl(r, g, b);
                let h = (h + shift).rem_euclid(360.0);
                let s = (s * saturation).clamp(0.0, 1.0);
                let (r, g, b) = hsl_to_rgb(h, s, l);
                *px = Rgba([r, g, b, a]);
            }
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scale(channel: u8, factor: f32) -> u8 {
    (f32::from(channel) * factor).round().clamp(0.0, 255.0) as u8
}

/// RGB to (hue degrees, saturation, lightness), the last two in `[0, 1]`.
fn rgb_to_hsl(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let r = f32::from(r) / 255.0;
    let g = f32::from(g) / 255.0;
    let b = f32::from(b) / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;
    let d = max - min;
    if d <= f32::EPSILON {
        return (0.0, 0.0, l);
    }
    let s = d / (1.0 - (2.0 * l - 1.0).abs());
    let h = if (max - r).abs() <= f32::EPSILON {
        60.0 * ((g - b) / d).rem_euclid(6.0)
    } else if (max - g).abs() <= f32::EPSILON {
        60.0 * ((b - r) / d + 2.0)
    } else {
        60.0 * ((r - g) / d + 4.0)
    };
    (h, s.clamp(0.0, 1.0), l)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (u8, u8, u8) {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h / 60.0;
    let x = c * (1.0 - (hp.rem_euclid(2.0) - 1.0).abs());
    let (r1, g1, b1) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    let to_u8 = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (to_u8(r1), to_u8(g1), to_u8(b1))
}
