// Main entry point - Wires configuration, controller and console renderer
use std::sync::Arc;

use anyhow::Context;
use axis_stream::infrastructure::config::load_app_config;
use axis_stream::presentation::console_renderer;
use axis_stream::{ChartController, JsonLineCodec};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_app_config().context("Failed to load config/ingestion.toml")?;
    tracing::debug!("Effective configuration:\n{}", toml::to_string_pretty(&config)?);

    let mut controller = ChartController::new(config.controller_settings(), Arc::new(JsonLineCodec::new()));

    // Replay a recording when one is configured, otherwise wait for socket data
    match config.replay.recording.clone() {
        Some(path) => {
            controller
                .load_manifest(&path)
                .await
                .with_context(|| format!("Failed to load recording {}", path.display()))?;
            controller.play().await?;
        }
        None => {
            let addr = controller.listen().await?;
            tracing::info!("Send newline-delimited JSON samples to {}", addr);
        }
    }

    let renderer = controller
        .subscribe()
        .map(|updates| tokio::spawn(console_renderer::run(updates, config.render_interval())));

    if controller.status().file_playing {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => tracing::info!("Interrupted, stopping replay"),
            report = controller.wait_playback() => {
                if let Some(report) = report {
                    tracing::info!(
                        "Replay finished: {} samples applied, {} lines skipped",
                        report.samples_applied,
                        report.lines_skipped
                    );
                }
            }
        }
    } else {
        tokio::signal::ctrl_c().await?;
        tracing::info!("Interrupted, closing listener");
    }

    if let Some(snapshot) = controller.current_snapshot() {
        tracing::info!("Final frame: {}", console_renderer::summarize(&snapshot));
    }
    controller.stop_and_wait().await;
    if let Some(renderer) = renderer {
        renderer.abort();
    }

    Ok(())
}
