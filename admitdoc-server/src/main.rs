//! admitdoc Backend Server
//!
//! Entry point for the admitdoc-server binary: configuration loading,
//! pipeline startup and HTTP server wiring.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use admitdoc_pipeline::{PipelineConfig, RenderPipeline};
use admitdoc_records::InMemoryRecordStore;
use admitdoc_render::{BrowserRenderer, BrowserRendererConfig};
use admitdoc_server::build_router;
use admitdoc_server::retention::spawn_retention_sweeper;
use admitdoc_server::state::AppState;

mod cli;
mod tracing_setup;

use cli::CliArgs;
use tracing_setup::install_tracing_from_config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    eprintln!("[STARTUP] admitdoc backend starting...");
    let args = CliArgs::parse();

    if args.help_requested {
        CliArgs::print_help();
        return Ok(());
    }

    // Resolve config path: CLI > environment variable
    let config_path = args
        .config_path
        .or_else(|| std::env::var("ADMITDOC_CONFIG_PATH").ok());

    eprintln!("[STARTUP] Loading config from: {:?}", config_path);
    let config = load_config(&config_path)?;
    admitdoc_config::validate_config(&config)
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;
    eprintln!("[STARTUP] Config loaded successfully");

    install_tracing_from_config(&config.logging);

    // Wire the record store, the renderer and the pipeline
    eprintln!("[STARTUP] Starting render pipeline...");
    let records = Arc::new(InMemoryRecordStore::new());
    let renderer = Arc::new(BrowserRenderer::new(
        records.clone(),
        BrowserRendererConfig {
            browser_path: config.renderer.browser_path.clone(),
            extra_args: config.renderer.extra_args.clone(),
            render_timeout: Duration::from_secs(config.renderer.render_timeout_secs),
        },
    ));
    let pipeline = Arc::new(RenderPipeline::start(
        renderer,
        PipelineConfig {
            workers: config.pipeline.workers,
            queue_capacity: config.pipeline.queue_capacity,
            wait_timeout: Duration::from_secs(config.pipeline.wait_timeout_secs),
            poll_interval: Duration::from_millis(config.pipeline.poll_interval_ms),
        },
    ));
    eprintln!(
        "[STARTUP] Render pipeline running with {} worker(s)",
        config.pipeline.workers
    );

    tracing::info!(
        workers = config.pipeline.workers,
        queue_capacity = config.pipeline.queue_capacity,
        wait_timeout_secs = config.pipeline.wait_timeout_secs,
        browser = %config.renderer.browser_path,
        "render pipeline configuration"
    );

    // Retention is the server's policy, not the pipeline's
    let _sweeper = spawn_retention_sweeper(pipeline.clone(), &config.retention);

    let state = AppState::new(
        records,
        pipeline,
        Duration::from_secs(config.pipeline.wait_timeout_secs),
    );
    let app = build_router(Arc::new(state));

    eprintln!(
        "[STARTUP] Binding to {}:{}",
        config.server.host, config.server.port
    );
    let listener = TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    eprintln!(
        "[STARTUP] ✓ Server listening on {}:{}",
        config.server.host, config.server.port
    );
    eprintln!("[STARTUP] ✓ Ready to accept connections!");

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Load configuration from file or defaults.
fn load_config(path: &Option<String>) -> anyhow::Result<admitdoc_config::Config> {
    match path.as_deref() {
        Some(p) => admitdoc_config::load_config(Some(p)).map_err(|e| {
            eprintln!("failed to load configuration: {e}");
            anyhow::anyhow!(e.to_string())
        }),
        None => admitdoc_config::load_config::<&std::path::Path>(None).map_err(|e| {
            eprintln!("failed to load configuration: {e}");
            anyhow::anyhow!(e.to_string())
        }),
    }
}
