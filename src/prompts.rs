//! Prompts sent to the generative model.
//!
//! Kept in one place so tests can import them directly instead of repeating
//! the literals.

/// Instruction used for an image upload when the client sends no `prompt`
/// field, or an empty one.
pub const DEFAULT_IMAGE_PROMPT: &str = "Describe this image";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_prompt_is_not_blank() {
        assert!(!DEFAULT_IMAGE_PROMPT.trim().is_empty());
    }
}
