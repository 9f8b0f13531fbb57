//! Database initialization handler

use crate::cli::output::print_info;
use crate::cli::output::print_success;
use crate::cli::output::print_warning;
use crate::database::ContextStore;
use crate::AppConfig;
use crate::Result;

/// Handle database initialization command
pub async fn handle_init_command(config: &AppConfig, force: bool) -> Result<()> {
    if !force {
        print_warning("This will enable pgvector and create the contexts table.");
        print_warning("This operation is safe - it uses CREATE IF NOT EXISTS.");
        println!("\nUse --force to proceed.");
        return Ok(());
    }

    print_info(&format!(
        "🗄️  Initializing context store at {}",
        config.masked_database_url()
    ));

    let result = initialize(&ContextStore::from_config(config)).await;
    if let Err(e) = &result {
        if e.to_string().contains("vector") || e.to_string().contains("extension") {
            print_warning(&format!("Could not enable pgvector extension: {e}"));
            print_warning("Run as a database superuser: CREATE EXTENSION IF NOT EXISTS vector;");
        }
    }
    let count = result?;

    print_success(&format!("Database initialized ({count} contexts stored)"));
    print_info("To load contexts, run:");
    println!("   uniqa ingest <dataset.json>");
    Ok(())
}

/// Create the schema and report how many contexts are already stored.
/// The store is closed whether or not that succeeds.
async fn initialize(store: &ContextStore) -> Result<i64> {
    let result = match store.init_schema().await {
        Ok(()) => store.count().await,
        Err(e) => Err(e),
    };
    store.close().await;
    result
}
