//! Port traits defining external boundaries.
//!
//! The generative-image API is the only external system; its adapters live
//! in `src/adapters/`.

pub mod skin_generator;

pub use skin_generator::{GenerationRequest, InlineImage, SkinGenerator};
