//! Result file naming and saving.

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};

use image::ImageFormat;

use crate::error::SkinError;
use crate::imaging::codec::{encode_png, write_atomic};

/// Output filename for a skin: `skin_<unix-millis>_<champion>.png`.
#[must_use]
pub fn skin_filename(champion: &str, unix_millis: i64) -> String {
    format!("{}.png", skin_stem(champion, unix_millis))
}

fn skin_stem(champion: &str, unix_millis: i64) -> String {
    format!("skin_{unix_millis}_{}", sanitize_for_filename(champion, 40))
}

/// Attempts at a free name before [`reserve_skin_file`] gives up.
const MAX_RESERVE_ATTEMPTS: u32 = 100;

/// Claim a fresh result file in `dir` and return its name and path.
///
/// The name is [`skin_filename`]; when that is taken (same millisecond and
/// champion) a `_<n>` suffix is added. An empty placeholder is created with
/// `create_new`, so concurrent requests never share a file.
///
/// # Errors
///
/// Returns an error if the placeholder cannot be created or every candidate
/// name is taken.
pub fn reserve_skin_file(
    dir: &Path,
    champion: &str,
    unix_millis: i64,
) -> io::Result<(String, PathBuf)> {
    let stem = skin_stem(champion, unix_millis);
    for attempt in 0..MAX_RESERVE_ATTEMPTS {
        let filename = if attempt == 0 {
            skin_filename(champion, unix_millis)
        } else {
            format!("{stem}_{attempt}.png")
        };
        let path = dir.join(&filename);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => return Ok((filename, path)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e),
        }
    }
    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free result name for {stem} in {}", dir.display()),
    ))
}

/// Sanitize a string for use in a filename.
///
/// Lowercases, keeps alphanumerics (any script), replaces everything else
/// with single hyphens, and trims to `max_len` characters.
#[must_use]
pub fn sanitize_for_filename(input: &str, max_len: usize) -> String {
    let mut result = String::new();
    let mut kept = 0;
    let mut last_was_hyphen = true; // no leading hyphen

    for ch in input.chars() {
        if kept >= max_len {
            break;
        }
        if ch.is_alphanumeric() {
            result.extend(ch.to_lowercase());
            kept += 1;
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            result.push('-');
            kept += 1;
            last_was_hyphen = true;
        }
    }

    while result.ends_with('-') {
        result.pop();
    }

    if result.is_empty() {
        "champion".to_string()
    } else {
        result
    }
}

/// Save image bytes as PNG, converting when the source is another format.
///
/// # Errors
///
/// Returns an error if conversion fails or the file cannot be written.
pub fn save_png(data: &[u8], source_mime: &str, output_path: &Path) -> Result<(), SkinError> {
    if source_mime == "image/png" && image::guess_format(data).ok() == Some(ImageFormat::Png) {
        return write_atomic(output_path, data).map_err(SkinError::Io);
    }

    let img = image::load_from_memory(data)
        .map_err(|e| SkinError::ImageConversion(format!("Failed to decode {source_mime}: {e}")))?;
    let png = encode_png(&img)
        .map_err(|e| SkinError::ImageConversion(format!("Failed to encode PNG: {e}")))?;
    write_atomic(output_path, &png).map_err(SkinError::Io)
}
