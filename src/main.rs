use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use station_manager::{
    AppState, RoomBoard,
    config::{CliArgs, Config},
    create_router,
    store::{BackgroundSaver, JsonFileStorage},
    suggest::{DisabledSuggester, GeminiSuggester, SuggestionService},
};

// RUST_LOG wins over the configured level
fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG")
            .unwrap_or_else(|_| format!("station_manager={level},tower_http={level}")),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliArgs::parse();
    let config = Config::load(&cli)?;
    init_tracing(&config.log_level);

    let storage = JsonFileStorage::new(&config.data_file);
    tracing::info!("rooms stored in {}", storage.path().display());
    let (saver, writer) = BackgroundSaver::spawn(storage);
    let board = RoomBoard::load(Box::new(saver));

    let suggester: Arc<dyn SuggestionService> = match &config.api_key {
        Some(key) => {
            tracing::info!("task suggestions enabled with model {}", config.model);
            Arc::new(GeminiSuggester::new(key.clone(), config.model.clone(), config.base_url.clone()))
        }
        None => {
            tracing::warn!("no API key configured, task suggestions disabled");
            Arc::new(DisabledSuggester)
        }
    };

    let app = create_router(AppState::new(board, suggester), &config.static_dir);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server running at http://{}", config.bind_addr);
    tracing::info!("Static files: {}", config.static_dir.display());
    tracing::info!("API base:     http://{}/api", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Router (and with it the saver) is gone; wait for the last write
    writer.await?;
    Ok(())
}
