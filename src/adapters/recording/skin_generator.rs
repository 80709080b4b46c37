//! Recording adapter for the `SkinGenerator` port.

use std::sync::{Arc, Mutex};

use crate::cassette::recorder::CassetteRecorder;
use crate::ports::skin_generator::{GenerateFuture, GenerationRequest, SkinGenerator};

/// Records generation calls while delegating to an inner generator.
pub struct RecordingSkinGenerator {
    inner: Box<dyn SkinGenerator>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingSkinGenerator {
    /// Wrap `inner`, appending every call to `recorder`.
    pub fn new(inner: Box<dyn SkinGenerator>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl SkinGenerator for RecordingSkinGenerator {
    fn generate(&self, request: &GenerationRequest) -> GenerateFuture<'_> {
        let request = request.clone();
        Box::pin(async move {
            let result = self.inner.generate(&request).await;
            match self.recorder.lock() {
                Ok(mut recorder) => recorder.record("skin_generator", "generate", &request, &result),
                Err(e) => log::warn!("Recorder lock poisoned, call not recorded: {e}"),
            }
            result
        })
    }
}
