//! Text preprocessing before embedding generation

use tracing::debug;

use crate::errors::QaError;
use crate::Result;

/// Inputs longer than this (in characters) are cut at a word boundary
pub const MAX_EMBED_CHARS: usize = 2000;

/// Normalize a text for the embedding backend
///
/// Collapses whitespace, replaces control characters and truncates long input.
/// Empty or whitespace-only text is rejected with [`QaError::InvalidInput`].
pub fn preprocess_text_for_embedding(text: &str) -> Result<String> {
    let sanitized = sanitize_text(&normalize_whitespace(text));

    if sanitized.is_empty() {
        return Err(QaError::InvalidInput(
            "text to embed must not be empty".to_string(),
        ));
    }

    let processed = truncate_at_word(&sanitized, MAX_EMBED_CHARS);
    debug!(
        "Preprocessed text: {} -> {} chars",
        text.len(),
        processed.len()
    );
    Ok(processed)
}

/// Collapse all runs of whitespace (including newlines and tabs) into single spaces
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Replace control characters with spaces, keeping everything printable
fn sanitize_text(text: &str) -> String {
    let replaced: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    replaced.trim().to_string()
}

/// Truncate to at most `max_chars` characters, preferring the last word boundary
fn truncate_at_word(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    match cut.rfind(' ') {
        Some(idx) if idx > 0 => cut[..idx].to_string(),
        _ => cut,
    }
}
