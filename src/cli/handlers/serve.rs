//! API server handler

use crate::cli::output::*;
use crate::AppConfig;
use crate::Result;

pub async fn handle_serve_api(
    config: &AppConfig,
    host: Option<String>,
    port: Option<u16>,
    cors: bool,
) -> Result<()> {
    use crate::api::serve_api;

    // CLI arguments take priority over config
    let mut config = config.clone();
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config.server.cors |= cors;

    println!("🚀 Starting uniqa API Server");
    println!("=============================\n");
    println!("📍 Host: {}", config.server.host);
    println!("🔌 Port: {}", config.server.port);
    println!(
        "🌐 CORS: {}",
        if config.server.cors {
            "Enabled"
        } else {
            "Disabled"
        }
    );
    println!();

    if config.database_url().is_none() {
        print_warning("database.url is not set; /api/ask will fail until it is configured");
    }

    serve_api(&config).await
}
