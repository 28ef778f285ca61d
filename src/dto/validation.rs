//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that a caption contains something other than whitespace.
///
/// # Examples
///
/// ```ignore
/// validate_caption_text("when the build is green") // Ok
/// validate_caption_text("   ")                     // Err - blank
/// ```
pub fn validate_caption_text(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        let mut err = ValidationError::new("caption_blank");
        err.message = Some("Caption text must not be empty".into());
        return Err(err);
    }

    Ok(())
}
