use anyhow::Result;
use dotenvy::dotenv;
use log::info;

use bellhop::commands::CommandHandler;
use bellhop::config::Config;
use bellhop::http_server::start_http_server;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    env_logger::init();

    info!("🚀 Starting slash command bot...");

    // Load configuration
    let config = Config::from_env()?;
    info!("✅ Configuration loaded");

    // Create command handler with its service clients
    let command_handler = CommandHandler::new(&config);
    info!("✅ Command handler initialized");

    start_http_server(&config, command_handler).await
}
