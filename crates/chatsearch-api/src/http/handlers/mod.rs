//! HTTP request handlers for the REST API.

pub mod chats;
pub mod health;
pub mod search;

use crate::http::error::AppError;

/// Reject blank identifiers and text fields.
///
/// Stricter than the JSON shape alone: `""` deserializes fine but is still a
/// `ValidationError`, so a blank question never reaches the store or the model.
pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

/// First `max` characters of `text`, for log lines.
pub(crate) fn preview(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_on_char_boundary() {
        assert_eq!(preview("short", 50), "short");
        assert_eq!(preview("héllo wörld", 4), "héll...");
    }

    #[test]
    fn blank_fields_are_rejected() {
        assert!(require_non_empty("user_id", "u1").is_ok());
        assert!(matches!(
            require_non_empty("question", "   "),
            Err(AppError::Validation(msg)) if msg == "question must not be empty"
        ));
    }
}
