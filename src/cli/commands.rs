//! CLI command definitions and argument parsing

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

use crate::ingest::DEFAULT_CONCURRENCY;

#[derive(Parser, Debug)]
#[command(name = "uniqa")]
#[command(about = "University question-answering service backed by retrieved contexts")]
#[command(version)]
pub struct Cli {
    /// Enable verbose debug logging (default: info level)
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to a TOML config file (default: config.toml, then config.example.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind to (overrides server.host)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
        /// Enable permissive CORS
        #[arg(long)]
        cors: bool,
    },
    /// Answer a single question and exit
    Ask {
        /// The question to answer
        question: String,
    },
    /// Create the contexts table and enable pgvector
    Init {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Embed and store a JSON dataset of question/context pairs
    Ingest {
        /// Path to a JSON array of {question, context, answer?}
        path: PathBuf,
        /// Number of embedding requests in flight
        #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,
    },
    /// Show current configuration
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::try_parse_from(["uniqa", "serve", "--port", "8080", "--cors"]).unwrap();
        match cli.command {
            Commands::Serve { host, port, cors } => {
                assert!(host.is_none());
                assert_eq!(port, Some(8080));
                assert!(cors);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_ingest_defaults() {
        let cli =
            Cli::try_parse_from(["uniqa", "-v", "ingest", "data/qa.json", "-c", "cfg.toml"])
                .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("cfg.toml")));
        match cli.command {
            Commands::Ingest { path, concurrency } => {
                assert_eq!(path, PathBuf::from("data/qa.json"));
                assert_eq!(concurrency, DEFAULT_CONCURRENCY);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_ask_requires_question() {
        assert!(Cli::try_parse_from(["uniqa", "ask"]).is_err());
    }
}
