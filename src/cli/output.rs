//! CLI output formatting utilities

use crate::models::IngestReport;
use crate::rag::QaOutcome;
use crate::AppConfig;

/// Safely truncate a string at character boundary (not byte boundary)
///
/// Returns the string with a "..." suffix if truncated.
#[must_use]
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{truncated}...")
    } else {
        s.to_string()
    }
}

/// Print configuration with secrets masked
pub fn print_config(config: &AppConfig) {
    println!("📋 uniqa Configuration:");
    println!();

    println!("🗄️  Database:");
    println!("  URL: {}", config.masked_database_url());
    println!("  Max connections: {}", config.database.max_connections);
    println!("  Min connections: {}", config.database.min_connections);
    println!("  Connection timeout: {}s", config.database.connection_timeout);
    println!();

    println!("📝 Logging:");
    println!("  Level: {}", config.logging.level);
    println!("  Directory: {}", config.logging.directory);
    println!();

    println!("🧠 Embeddings:");
    println!("  Endpoint: {}", config.embeddings.endpoint);
    println!("  Model: {}", config.embeddings.model);
    println!();

    println!("🤖 Generation:");
    println!("  Endpoint: {}", config.generation.endpoint);
    println!("  Max new tokens: {}", config.generation.max_new_tokens);
    println!("  Temperature: {}", config.generation.temperature);
    println!("  Top-p: {}", config.generation.top_p);
    println!("  Stop sequences: {:?}", config.generation.stop);
    println!(
        "  Retries: {} attempts, {}s apart",
        config.generation.max_attempts, config.generation.backoff_secs
    );
    println!();

    println!("🔍 Retrieval:");
    println!("  Threshold: {:.2}", config.retrieval.threshold);
    println!("  Min answer chars: {}", config.retrieval.min_answer_chars);
    println!();

    println!("🌐 Server:");
    println!("  Bind: {}:{}", config.server.host, config.server.port);
    println!("  CORS: {}", config.server.cors);
    println!("  Request timeout: {}s", config.server.request_timeout_secs);
    println!();

    println!(
        "🔑 API token: {}",
        if config.api_token().is_some() {
            "***set***"
        } else {
            "(not set)"
        }
    );
}

/// Print the outcome of a one-shot question
pub fn print_outcome(outcome: &QaOutcome) {
    match outcome {
        QaOutcome::Answered {
            answer,
            source,
            score,
        } => {
            print_success(answer);
            match score {
                Some(score) => print_info(&format!("source: {source:?}, similarity: {score:.3}")),
                None => print_info(&format!("source: {source:?}")),
            }
        }
        QaOutcome::Rejected { error } | QaOutcome::Failed { error } => {
            print_error(&format!("[{}] {error}", outcome.status_code()));
        }
    }
}

/// Print an ingestion summary
pub fn print_ingest_report(report: &IngestReport) {
    print_success(&format!(
        "Ingested {} of {} entries",
        report.inserted, report.total
    ));
    if report.skipped > 0 {
        print_warning(&format!(
            "{} entries skipped (embedding failed, see logs)",
            report.skipped
        ));
    }
}

pub fn print_info(msg: &str) {
    println!("ℹ️  {msg}");
}

pub fn print_success(msg: &str) {
    println!("✅ {msg}");
}

pub fn print_warning(msg: &str) {
    println!("⚠️  {msg}");
}

pub fn print_error(msg: &str) {
    eprintln!("❌ {msg}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str_multibyte() {
        assert_eq!(truncate_str("héllo wörld", 5), "héllo...");
        assert_eq!(truncate_str("short", 10), "short");
        assert_eq!(truncate_str("🎓🎓🎓", 2), "🎓🎓...");
    }
}
