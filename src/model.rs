//! Model name resolution.

/// Short name aliases for the image models.
const ALIASES: &[(&str, &str)] = &[
    ("nano-banana", "gemini-2.5-flash-image"),
    ("nano-banana-pro", "gemini-3-pro-image-preview"),
];

/// Resolve a model name (alias or exact) to the full model identifier.
#[must_use]
pub fn resolve_model(name: &str) -> String {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map_or_else(|| name.to_string(), |(_, full)| (*full).to_string())
}

/// Check that a resolved model is served by the Gemini API.
///
/// # Errors
///
/// Returns an error if the model name doesn't start with `gemini`.
pub fn validate_model(model: &str) -> Result<(), String> {
    if model.starts_with("gemini") {
        Ok(())
    } else {
        Err(format!("Unknown model '{model}'. Expected an alias or a 'gemini-*' model."))
    }
}
