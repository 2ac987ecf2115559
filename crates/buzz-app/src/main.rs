//! Buzz application binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML (a bad file is fatal)
//! 2. Resolve the completion API key (startup halts without one)
//! 3. Build the chat orchestrator and start the idle-session sweep
//! 4. Start the axum HTTP server

mod cli;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use buzz_api::routes;
use buzz_api::state::AppState;
use buzz_chat::{ChatOrchestrator, CompletionClient, GroqClient};
use buzz_core::config::BuzzConfig;

use cli::CliArgs;

/// How often expired sessions are dropped.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Periodically remove sessions idle past the configured timeout.
async fn session_sweep_loop(chat: Arc<ChatOrchestrator>) {
    let mut interval = tokio::time::interval(SWEEP_INTERVAL);
    loop {
        interval.tick().await;
        let removed = chat.sweep_expired();
        if removed > 0 {
            tracing::debug!(removed, remaining = chat.session_count(), "Expired sessions swept");
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config. A missing file means defaults; any other failure is reported
    // once tracing is up and stops startup.
    let config_file = args.resolve_config_path();
    let loaded = BuzzConfig::load_if_present(&config_file);
    let mut config = match &loaded {
        Ok(Some(found)) => found.clone(),
        _ => BuzzConfig::default(),
    };
    args.apply_overrides(&mut config);

    // Tracing. RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting Buzz v{}", env!("CARGO_PKG_VERSION"));

    match loaded {
        Ok(Some(_)) => {
            tracing::info!(path = %config_file.display(), "Configuration loaded");
        }
        Ok(None) => {
            tracing::info!(path = %config_file.display(), "No configuration file; using defaults");
        }
        Err(e) => {
            tracing::error!(path = %config_file.display(), error = %e, "Cannot load configuration");
            return Err(e.into());
        }
    }

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }

    // Completion client.
    let client = match GroqClient::from_config(&config.completion) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "Cannot start without an API key");
            tracing::error!(
                "Export {}=<key> and start again",
                config.completion.api_key_env
            );
            return Err(buzz_core::BuzzError::from(e).into());
        }
    };
    tracing::info!(
        model = client.model(),
        endpoint = client.endpoint(),
        "Completion client ready"
    );

    let chat = Arc::new(ChatOrchestrator::new(
        Arc::new(client),
        config.chat.clone(),
    ));

    tokio::spawn(session_sweep_loop(Arc::clone(&chat)));

    // === HTTP server ===

    let state = AppState::new(config.clone(), chat);
    routes::start_server(&config, state).await?;

    tracing::info!("Buzz stopped");
    Ok(())
}
