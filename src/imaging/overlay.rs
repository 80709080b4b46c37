//! Decorative frame and caption composited over the finished image.
//!
//! The overlay is cosmetic. [`overlay`] never fails outward: when anything
//! goes wrong the input buffer comes back untouched inside
//! [`OverlayOutcome::Degraded`].

use std::sync::{Arc, LazyLock};

use image::{DynamicImage, Rgba, RgbaImage};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{self, fontdb};
use thiserror::Error;

use super::codec::{encode_png, CANVAS};

/// Fixed secondary caption under the display name.
pub const CAPTION: &str = "CUSTOM SKIN";

const GOLD: &str = "#c8aa6e";
const NAME_FILL: &str = "#f0e6d2";
const FONT_FAMILY: &str = "DejaVu Sans";

/// Faces shipped with the crate, so captions render on hosts without fonts.
const BUNDLED_FONTS: [&[u8]; 2] = [
    include_bytes!("../../assets/fonts/DejaVuSans.ttf"),
    include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf"),
];

static FONTS: LazyLock<Arc<fontdb::Database>> = LazyLock::new(|| {
    let mut db = fontdb::Database::new();
    for data in BUNDLED_FONTS {
        db.load_font_data(data.to_vec());
    }
    db.set_sans_serif_family(FONT_FAMILY);
    log::debug!("overlay: loaded {} font faces", db.len());
    Arc::new(db)
});

/// Why the frame was not applied.
#[derive(Debug, Error)]
pub enum OverlayError {
    /// Base image could not be decoded.
    #[error("cannot decode base image: {0}")]
    Decode(#[source] image::ImageError),
    /// Base image is not canvas-sized.
    #[error("base image is {width}x{height}, expected 308x560")]
    Dimensions {
        /// Actual width.
        width: u32,
        /// Actual height.
        height: u32,
    },
    /// No font faces are available, so the captions would be dropped.
    #[error("no font faces available for overlay text")]
    NoFonts,
    /// Overlay markup was rejected.
    #[error("invalid overlay markup: {0}")]
    Svg(#[source] usvg::Error),
    /// Raster canvas could not be allocated.
    #[error("cannot allocate overlay canvas")]
    Canvas,
    /// Composited image could not be encoded.
    #[error("cannot encode framed image: {0}")]
    Encode(#[source] image::ImageError),
}

/// Result of [`overlay`].
#[derive(Debug)]
pub enum OverlayOutcome {
    /// Frame and captions applied.
    Framed(Vec<u8>),
    /// Frame skipped; `image` is the unchanged input.
    Degraded {
        /// The input buffer, as given.
        image: Vec<u8>,
        /// What went wrong.
        reason: OverlayError,
    },
}

impl OverlayOutcome {
    /// Whether the frame was skipped.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// The resulting image bytes, framed or not.
    #[must_use]
    pub fn into_image(self) -> Vec<u8> {
        match self {
            Self::Framed(image) | Self::Degraded { image, .. } => image,
        }
    }
}

/// Frame layout for one display name.
#[derive(Debug, Clone)]
pub struct OverlaySpec {
    name: String,
}

impl OverlaySpec {
    /// Build the overlay for `display_name`.
    ///
    /// Control characters are dropped; markup characters are escaped when
    /// rendered.
    #[must_use]
    pub fn new(display_name: &str) -> Self {
        Self { name: display_name.chars().filter(|c| !c.is_control()).collect() }
    }

    /// SVG markup covering the whole canvas.
    #[must_use]
    pub fn to_svg(&self) -> String {
        let (w, h) = (CANVAS.width, CANVAS.height);
        let (right, bottom) = (w - 2, h - 2);
        let mid = w / 2;
        let name = html_escape::encode_text(&self.name);

        let mut corners = String::new();
        for (x, y, dx, dy) in [
            (2, 2, 15, 15),
            (right, 2, right - 13, 15),
            (2, bottom, 15, bottom - 13),
            (right, bottom, right - 13, bottom - 13),
        ] {
            corners.push_str(&format!(
                r#"<line x1="{x}" y1="{y}" x2="{dx}" y2="{y}" stroke="{GOLD}" stroke-width="2"/><line x1="{x}" y1="{y}" x2="{x}" y2="{dy}" stroke="{GOLD}" stroke-width="2"/>"#
            ));
        }

        format!(
            r#"<svg width="{w}" height="{h}" viewBox="0 0 {w} {h}" xmlns="http://www.w3.org/2000/svg"><rect x="2" y="2" width="{fw}" height="{fh}" fill="none" stroke="{GOLD}" stroke-width="2"/>{corners}<rect x="0" y="480" width="{w}" height="80" fill="rgb(0,0,0)" fill-opacity="0.6"/><text x="{mid}" y="520" font-family="{FONT_FAMILY}" font-size="18" font-weight="bold" fill="{NAME_FILL}" text-anchor="middle">{name}</text><text x="{mid}" y="545" font-family="{FONT_FAMILY}" font-size="12" fill="{GOLD}" text-anchor="middle">{CAPTION}</text></svg>"#,
            fw = w - 4,
            fh = h - 4,
        )
    }

    /// Rasterize to a straight-alpha RGBA layer.
    fn render(&self) -> Result<RgbaImage, OverlayError> {
        self.render_with(&FONTS)
    }

    fn render_with(&self, fonts: &Arc<fontdb::Database>) -> Result<RgbaImage, OverlayError> {
        if fonts.is_empty() {
            return Err(OverlayError::NoFonts);
        }
        let options = usvg::Options { fontdb: Arc::clone(fonts), ..usvg::Options::default() };
        let tree = usvg::Tree::from_str(&self.to_svg(), &options).map_err(OverlayError::Svg)?;
        let mut pixmap = Pixmap::new(CANVAS.width, CANVAS.height).ok_or(OverlayError::Canvas)?;
        resvg::render(&tree, Transform::identity(), &mut pixmap.as_mut());

        let mut layer = RgbaImage::new(CANVAS.width, CANVAS.height);
        for (dst, src) in layer.pixels_mut().zip(pixmap.pixels()) {
            let c = src.demultiply();
            *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
        }
        Ok(layer)
    }
}

/// Composite the frame for `display_name` over a canvas-sized image.
///
/// Never fails: on any error the input is returned unchanged as
/// [`OverlayOutcome::Degraded`] and the reason is logged.
#[must_use]
pub fn overlay(buffer: Vec<u8>, display_name: &str) -> OverlayOutcome {
    match frame(&buffer, display_name) {
        Ok(framed) => OverlayOutcome::Framed(framed),
        Err(reason) => {
            log::warn!("overlay skipped, keeping unframed image: {reason}");
            OverlayOutcome::Degraded { image: buffer, reason }
        }
    }
}

fn frame(buffer: &[u8], display_name: &str) -> Result<Vec<u8>, OverlayError> {
    let base = image::load_from_memory(buffer).map_err(OverlayError::Decode)?;
    if !CANVAS.matches(&base) {
        return Err(OverlayError::Dimensions { width: base.width(), height: base.height() });
    }
    let layer = OverlaySpec::new(display_name).render()?;
    let mut base = base.to_rgba8();
    image::imageops::overlay(&mut base, &layer, 0, 0);
    encode_png(&DynamicImage::ImageRgba8(base)).map_err(OverlayError::Encode)
}
