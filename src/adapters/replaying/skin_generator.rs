//! Replaying adapter for the `SkinGenerator` port.

use std::sync::Mutex;

use crate::cassette::replayer::CassetteReplayer;
use crate::error::SkinError;
use crate::ports::skin_generator::{
    GenerateFuture, GenerationRequest, GenerationResponse, SkinGenerator,
};

/// Serves recorded generation results.
pub struct ReplayingSkinGenerator {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingSkinGenerator {
    /// Create a generator backed by `replayer`.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }

    fn next_response(&self) -> Result<GenerationResponse, SkinError> {
        let interaction = self
            .replayer
            .lock()
            .map_err(|e| SkinError::Cassette(format!("replayer lock poisoned: {e}")))?
            .next_interaction("skin_generator", "generate")?;
        decode_output(interaction.output)
    }
}

/// Turn a recorded `{"Ok": ..}` / `{"Err": ".."}` value back into a result.
fn decode_output(output: serde_json::Value) -> Result<GenerationResponse, SkinError> {
    if let Some(err) = output.get("Err") {
        let message = err.as_str().unwrap_or("replayed error").to_string();
        return Err(SkinError::Api { status: 0, message });
    }
    let ok = output.get("Ok").cloned().unwrap_or(output);
    serde_json::from_value(ok)
        .map_err(|e| SkinError::Cassette(format!("recorded response is malformed: {e}")))
}

impl SkinGenerator for ReplayingSkinGenerator {
    fn generate(&self, _request: &GenerationRequest) -> GenerateFuture<'_> {
        let result = self.next_response();
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ok_output_decodes_images() {
        let response =
            decode_output(json!({"Ok": {"images": [{"data": "AQID", "mime_type": "image/png"}]}}))
                .unwrap();
        assert_eq!(response.images[0].data, vec![1, 2, 3]);
    }

    #[test]
    fn err_output_replays_as_api_error() {
        let err = decode_output(json!({"Err": "API error (429): quota"})).unwrap_err();
        assert!(err.to_string().contains("quota"));
    }

    #[test]
    fn malformed_output_is_cassette_error() {
        let err = decode_output(json!({"Ok": {"pictures": 3}})).unwrap_err();
        assert!(matches!(err, SkinError::Cassette(_)));
    }
}
