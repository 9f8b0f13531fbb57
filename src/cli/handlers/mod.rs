//! CLI command handlers module
//!
//! This module is organized by functional domains:
//! - init: Database schema creation
//! - ingest: Dataset embedding and loading
//! - ask: One-shot questions
//! - serve: API server
//! - info: Configuration display

pub mod ask;
pub mod info;
pub mod ingest;
pub mod init;
pub mod serve;

// Re-export all public handlers
pub use ask::*;
pub use info::*;
pub use ingest::*;
pub use init::*;
pub use serve::*;
