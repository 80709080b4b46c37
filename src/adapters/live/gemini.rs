//! Live adapter for the Gemini image API ("nano-banana").

use base64::Engine;
use reqwest::Client;
use serde::Deserialize;

use crate::error::SkinError;
use crate::ports::skin_generator::{
    GenerateFuture, GenerationRequest, GenerationResponse, InlineImage, SkinGenerator,
};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Live Gemini generator that calls the Google AI API.
pub struct GeminiGenerator {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiGenerator {
    /// Create a new Gemini generator with the given API key.
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self { client: Client::new(), api_key, base_url: GEMINI_API_BASE.to_string() }
    }
}

/// Request body for `generateContent`: prompt text followed by the photo.
fn request_body(request: &GenerationRequest) -> serde_json::Value {
    let data = base64::engine::general_purpose::STANDARD.encode(&request.photo.data);
    serde_json::json!({
        "contents": [{
            "parts": [
                {"text": request.prompt},
                {"inlineData": {"mimeType": request.photo.mime_type, "data": data}}
            ]
        }],
        "generationConfig": {
            "responseModalities": ["TEXT", "IMAGE"]
        }
    })
}

/// Pull every inline image out of a `generateContent` response body.
fn parse_images(response_text: &str) -> Result<Vec<InlineImage>, SkinError> {
    let parsed: GeminiResponse = serde_json::from_str(response_text).map_err(|e| {
        SkinError::Api { status: 200, message: format!("Failed to parse response: {e}") }
    })?;

    let mut images = Vec::new();
    for candidate in parsed.candidates {
        let Some(content) = candidate.content else { continue };
        for part in content.parts {
            if let Some(inline) = part.inline_data {
                let data = base64::engine::general_purpose::STANDARD
                    .decode(&inline.data)
                    .map_err(|e| SkinError::Api {
                        status: 200,
                        message: format!("Failed to decode base64: {e}"),
                    })?;
                images.push(InlineImage { data, mime_type: inline.mime_type });
            } else if let Some(text) = part.text {
                let preview: String = text.chars().take(100).collect();
                log::warn!("Model answered with text: {preview}...");
            }
        }
    }

    if images.is_empty() {
        let truncated: String = response_text.chars().take(500).collect();
        return Err(SkinError::Api {
            status: 200,
            message: format!("Model did not return an image (text only). Body: {truncated}"),
        });
    }
    Ok(images)
}

impl SkinGenerator for GeminiGenerator {
    fn generate(&self, request: &GenerationRequest) -> GenerateFuture<'_> {
        let request = request.clone();
        Box::pin(async move {
            let url = format!("{}/{}:generateContent", self.base_url, request.model);
            log::info!("Calling {} for skin generation", request.model);

            let response = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&request_body(&request))
                .send()
                .await?;

            let status = response.status();
            let response_text = response.text().await?;

            if !status.is_success() {
                if status == reqwest::StatusCode::NOT_FOUND {
                    log::warn!(
                        "Model '{}' not found; check the model name and that the key can use it",
                        request.model
                    );
                }
                return Err(SkinError::Api { status: status.as_u16(), message: response_text });
            }

            let images = parse_images(&response_text)?;
            log::info!("Model returned {} image(s)", images.len());
            Ok(GenerationResponse { images })
        })
    }
}

// --- Gemini API response types ---

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    text: Option<String>,
    inline_data: Option<GeminiInlineData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerationRequest {
        GenerationRequest {
            model: "gemini-2.5-flash-image".into(),
            prompt: "Ahri".into(),
            photo: InlineImage { data: vec![1, 2, 3], mime_type: "image/png".into() },
        }
    }

    #[test]
    fn body_sends_prompt_then_photo() {
        let body = request_body(&request());
        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "Ahri");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[1]["inlineData"]["data"], "AQID");
    }

    #[test]
    fn parses_inline_images_and_skips_text() {
        let body = r#"{"candidates":[{"content":{"parts":[
            {"text":"here you go"},
            {"inlineData":{"mimeType":"image/png","data":"AQID"}}
        ]}}]}"#;
        let images = parse_images(body).unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].data, vec![1, 2, 3]);
        assert_eq!(images[0].mime_type, "image/png");
    }

    #[test]
    fn text_only_response_is_an_error() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"I cannot draw that"}]}}]}"#;
        let err = parse_images(body).unwrap_err();
        assert!(err.to_string().contains("did not return an image"));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(parse_images("not json").is_err());
    }

    #[test]
    fn candidate_without_content_is_skipped() {
        let body = r#"{"candidates":[{"finishReason":"SAFETY"}]}"#;
        assert!(parse_images(body).is_err());
    }
}
