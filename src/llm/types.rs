//! Generation request parameters and per-attempt outcomes

use std::collections::BTreeSet;

use serde::Serialize;

use crate::config::GenerationConfig;
use crate::errors::QaError;
use crate::Result;

/// Sampling parameters sent with every generation request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub max_new_tokens: u32,
    /// In (0, 1]
    pub temperature: f32,
    /// In (0, 1]
    pub top_p: f32,
    pub stop_sequences: BTreeSet<String>,
}

impl GenerationParams {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            max_new_tokens: config.max_new_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
            stop_sequences: config.stop.iter().cloned().collect(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_new_tokens == 0 {
            return Err(QaError::InvalidInput(
                "max_new_tokens must be at least 1".to_string(),
            ));
        }
        if !(self.temperature > 0.0 && self.temperature <= 1.0) {
            return Err(QaError::InvalidInput(format!(
                "temperature must be in (0, 1], got {}",
                self.temperature
            )));
        }
        if !(self.top_p > 0.0 && self.top_p <= 1.0) {
            return Err(QaError::InvalidInput(format!(
                "top_p must be in (0, 1], got {}",
                self.top_p
            )));
        }
        Ok(())
    }

    pub(crate) fn to_wire(&self) -> WireParameters<'_> {
        WireParameters {
            max_new_tokens: self.max_new_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
            stop: self.stop_sequences.iter().map(String::as_str).collect(),
        }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::from_config(&GenerationConfig::default())
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct WireParameters<'a> {
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GenerationRequest<'a> {
    pub inputs: &'a str,
    pub parameters: WireParameters<'a>,
}

/// How a single call to the generation backend ended
#[derive(Debug)]
pub enum AttemptOutcome {
    Success(String),
    /// The model is still loading; worth another try after a pause
    Retryable(String),
    Fatal(QaError),
}

/// Record of one attempt, kept only for logging
#[derive(Debug)]
pub struct GenerationAttempt<'a> {
    pub prompt: &'a str,
    pub attempt_number: u32,
    pub outcome: AttemptOutcome,
}

impl GenerationAttempt<'_> {
    /// One-line description for the retry log
    pub fn summary(&self) -> String {
        let outcome = match &self.outcome {
            AttemptOutcome::Success(text) => format!("success ({} chars)", text.chars().count()),
            AttemptOutcome::Retryable(reason) => format!("loading: {reason}"),
            AttemptOutcome::Fatal(err) => format!("failed: {err}"),
        };
        format!(
            "attempt {} for prompt of {} chars: {}",
            self.attempt_number,
            self.prompt.chars().count(),
            outcome
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format_omits_empty_stop() {
        let params = GenerationParams {
            max_new_tokens: 64,
            temperature: 0.5,
            top_p: 0.9,
            stop_sequences: BTreeSet::new(),
        };
        let json = serde_json::to_value(GenerationRequest {
            inputs: "prompt",
            parameters: params.to_wire(),
        })
        .unwrap();

        assert_eq!(json["inputs"], "prompt");
        assert_eq!(json["parameters"]["max_new_tokens"], 64);
        assert!(json["parameters"].get("stop").is_none());
    }

    #[test]
    fn test_wire_format_includes_stop() {
        let params = GenerationParams {
            stop_sequences: ["Question:".to_string()].into_iter().collect(),
            ..GenerationParams::default()
        };
        let json = serde_json::to_value(params.to_wire()).unwrap();
        assert_eq!(json["stop"], serde_json::json!(["Question:"]));
    }

    #[test]
    fn test_attempt_summary() {
        let attempt = GenerationAttempt {
            prompt: "Context: Hostels: Rose, Lily",
            attempt_number: 2,
            outcome: AttemptOutcome::Retryable("Model is currently loading".to_string()),
        };
        assert_eq!(
            attempt.summary(),
            "attempt 2 for prompt of 28 chars: loading: Model is currently loading"
        );
    }

    #[test]
    fn test_validate_ranges() {
        assert!(GenerationParams::default().validate().is_ok());

        let hot = GenerationParams {
            temperature: 1.5,
            ..GenerationParams::default()
        };
        assert!(matches!(hot.validate(), Err(QaError::InvalidInput(_))));

        let no_tokens = GenerationParams {
            max_new_tokens: 0,
            ..GenerationParams::default()
        };
        assert!(no_tokens.validate().is_err());
    }
}
