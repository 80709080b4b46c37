//! Skin generator port: photo + prompt in, generated artwork out.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::SkinError;

/// An encoded image travelling across the port, with its MIME type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineImage {
    /// Raw image bytes.
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    /// MIME type (e.g., `"image/jpeg"`).
    pub mime_type: String,
}

impl InlineImage {
    /// Wrap `data`, sniffing the MIME type from its content.
    ///
    /// Unrecognised content is labelled `image/jpeg`.
    #[must_use]
    pub fn sniffed(data: Vec<u8>) -> Self {
        let mime_type = image::guess_format(&data)
            .map_or("image/jpeg", |f| f.to_mime_type())
            .to_string();
        Self { data, mime_type }
    }
}

/// A request to restyle a photo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Resolved model identifier (e.g., `"gemini-2.5-flash-image"`).
    pub model: String,
    /// Text prompt sent alongside the photo.
    pub prompt: String,
    /// The user's photo.
    pub photo: InlineImage,
}

/// Images returned by the generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Generated images, in the order the API returned them.
    pub images: Vec<InlineImage>,
}

/// Boxed future type returned by [`SkinGenerator::generate`].
pub type GenerateFuture<'a> =
    Pin<Box<dyn Future<Output = Result<GenerationResponse, SkinError>> + Send + 'a>>;

/// Produces stylized artwork from a photo via an external API.
pub trait SkinGenerator: Send + Sync {
    /// Generate images for the given request.
    fn generate(&self, request: &GenerationRequest) -> GenerateFuture<'_>;
}

/// Serde helper storing `Vec<u8>` as base64 text.
mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_png_and_falls_back_to_jpeg() {
        let png = InlineImage::sniffed(vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]);
        assert_eq!(png.mime_type, "image/png");
        let unknown = InlineImage::sniffed(vec![1, 2, 3]);
        assert_eq!(unknown.mime_type, "image/jpeg");
    }

    #[test]
    fn request_serializes_photo_as_base64() {
        let request = GenerationRequest {
            model: "gemini-2.5-flash-image".into(),
            prompt: "Ahri splash art".into(),
            photo: InlineImage { data: vec![0xFF, 0xD8, 0xFF], mime_type: "image/jpeg".into() },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["photo"]["data"], "/9j/");
        let back: GenerationRequest = serde_json::from_value(json).unwrap();
        assert_eq!(back.photo.data, vec![0xFF, 0xD8, 0xFF]);
    }
}
