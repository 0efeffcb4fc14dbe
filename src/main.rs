use std::sync::Arc;

use clap::Parser;
use eyre::{Result, WrapErr};
use log::{LevelFilter, info};

use ytsum::config::{self, Config};
use ytsum::server::{self, AppState};
use ytsum::summarize::GeminiClient;
use ytsum::youtube::YoutubeTranscripts;

mod cli;

use cli::Cli;

fn setup_logging(verbose: bool) {
    let crate_level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };

    env_logger::Builder::new()
        .filter_level(LevelFilter::Warn)
        .filter_module("ytsum", crate_level)
        .parse_default_env()
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {e}");
        return;
    }
    info!("Received shutdown signal");
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let api_key = config::api_key()?;

    let client = reqwest::Client::new();
    let transcripts = YoutubeTranscripts::with_base_url(client.clone(), &config.youtube.base_url)
        .include_auto_captions(config.youtube.include_auto_captions);
    let gemini = GeminiClient::with_base_url(client, api_key, &config.gemini.base_url);

    let state = AppState::new(Arc::new(transcripts), Arc::new(gemini))
        .with_options(config.gemini.generation_options())
        .with_precedence(config.input_precedence);

    let host = cli.host.unwrap_or(config.server.host);
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .wrap_err_with(|| format!("failed to bind {addr}"))?;
    info!(
        "Listening on {addr} (model {}, input precedence {:?})",
        config.gemini.model, config.input_precedence
    );

    axum::serve(listener, server::create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
