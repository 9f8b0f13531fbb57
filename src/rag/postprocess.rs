//! Cleaning and quality-gating of raw generations
//!
//! Small generation models often echo the prompt, emit escaped newlines or
//! drift off topic. Output that fails the gate is replaced by an answer built
//! directly from the retrieved context.
//!
//! The relevance check (the generation must mention the context's first
//! comma-delimited clause) is a heuristic and tuned for English passages of
//! the form `"Topic: a, b, c"`.

/// Markers after which the actual answer starts when the prompt is echoed
const ANSWER_MARKERS: [&str; 2] = ["Answer:", "Context:"];

/// Literal backslash-n sequences some backends leave in the text
const ESCAPED_NEWLINE: &str = "\\n";

/// Strip echoed prompt text and escape artifacts, then trim
pub fn clean(raw: &str) -> String {
    let body = strip_leading_boilerplate(raw);
    body.replace(ESCAPED_NEWLINE, " ")
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Drop everything up to and including the last answer marker.
/// `Answer:` wins over `Context:` when both are present.
fn strip_leading_boilerplate(raw: &str) -> &str {
    for marker in ANSWER_MARKERS {
        if let Some(idx) = raw.rfind(marker) {
            return &raw[idx + marker.len()..];
        }
    }
    raw
}

/// First comma-delimited segment of a context, trimmed
pub fn first_clause(context: &str) -> &str {
    context.split(',').next().unwrap_or_default().trim()
}

/// Deterministic answer built from the context alone
pub fn fallback_answer(context: &str) -> String {
    format!("Here is what I found: {}", context.trim())
}

/// Applies [`clean`] and the quality gate
#[derive(Debug, Clone, Copy)]
pub struct AnswerPostprocessor {
    min_chars: usize,
}

impl AnswerPostprocessor {
    pub const fn new(min_chars: usize) -> Self {
        Self { min_chars }
    }

    /// Whether a cleaned generation is good enough to return as-is
    pub fn is_acceptable(&self, cleaned: &str, context: &str) -> bool {
        if cleaned.is_empty() || cleaned.chars().count() < self.min_chars {
            return false;
        }
        let clause = first_clause(context);
        clause.is_empty() || cleaned.to_lowercase().contains(&clause.to_lowercase())
    }

    /// Clean `raw` and return it, or the context fallback when it fails the gate.
    /// The boolean reports whether the fallback was used.
    pub fn finalize(&self, raw: &str, context: &str) -> (String, bool) {
        let cleaned = clean(raw);
        if self.is_acceptable(&cleaned, context) {
            (cleaned, false)
        } else {
            (fallback_answer(context), true)
        }
    }
}

impl Default for AnswerPostprocessor {
    fn default() -> Self {
        Self::new(5)
    }
}
