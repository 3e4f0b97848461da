use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use photo_ingest::channels::TelegramClient;
use photo_ingest::classify::{Api4AiBrands, Api4AiDetector, Api4AiSafety};
use photo_ingest::config::AppConfig;
use photo_ingest::pipeline::{PhotoProcessor, ProcessorDeps};
use photo_ingest::store::{LibSqlBackend, PhotoStore};
use photo_ingest::web::{AppState, app_routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("Failed to load configuration")?;

    // Guard must outlive the server so buffered log lines are flushed.
    let _log_guard = init_tracing(&config);

    eprintln!("📷 Photo Ingest v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Webhook: http://0.0.0.0:{}/api/telegram/webhook", config.port);
    eprintln!("   Photos:  http://0.0.0.0:{}/api/photos", config.port);
    eprintln!("   Gallery: http://0.0.0.0:{}/\n", config.port);

    // ── Database ─────────────────────────────────────────────────────────
    let store: Arc<dyn PhotoStore> = Arc::new(
        LibSqlBackend::new_local(&config.db_path)
            .await
            .with_context(|| format!("Failed to open database at {}", config.db_path.display()))?,
    );

    // ── Collaborators ────────────────────────────────────────────────────
    let deps = ProcessorDeps {
        messenger: Arc::new(TelegramClient::new(&config.telegram)),
        store: Arc::clone(&store),
        safety: Arc::new(Api4AiSafety::new(config.safety.clone())),
        detector: Arc::new(Api4AiDetector::new(config.detection.clone())),
        brands: Arc::new(Api4AiBrands::new(config.brands.clone())),
    };
    let processor = Arc::new(PhotoProcessor::new(deps));

    // ── HTTP server ──────────────────────────────────────────────────────
    let app = app_routes(AppState { processor, store });
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    tracing::info!(port = config.port, "Photo ingest server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Stdout logging, plus a daily-rolling file when `LOG_DIR` is set.
fn init_tracing(config: &AppConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout = tracing_subscriber::fmt::layer().with_target(false);

    match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "photo-ingest.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file = tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer);
            tracing_subscriber::registry()
                .with(filter)
                .with(stdout)
                .with(file)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(filter).with(stdout).init();
            None
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
