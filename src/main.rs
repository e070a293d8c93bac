//! Application entry point for the `vegwatch` dashboard service.
//!
//! This binary orchestrates the full startup sequence:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Loading the dashboard text mapping (built-in defaults or JSON override)
//! - Preparing the artifact directory
//! - Mounting all routes via the `routes` gateway and serving with Axum
//!
//! # Environment Variables
//! - `IMAGERY_API_URL` (**required**) – base URL of the imagery service
//! - `STATIC_DIR` (optional) – artifact output directory (default: `static`)
//! - `MAX_CLOUD_PCT` (optional) – cloud coverage cutoff (default: 20)
//! - `DASHBOARD_TEXTS_PATH` (optional) – JSON override for page texts
//! - `AXUM_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `AXUM_SPAN_EVENTS` (optional) – span event mode for tracing

use std::{env, io::IsTerminal, net::SocketAddr};

use anyhow::Result;
use dotenvy::dotenv;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use vegwatch::{load_from_env, AppState, ArtifactStore, DashboardTexts, ImageryClient};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    init_tracing();
    dotenv().ok();

    let cfg = load_from_env()?;
    cfg.log_config();

    let texts = DashboardTexts::load(cfg.texts_path.as_deref())?;
    let artifacts = ArtifactStore::new(&cfg.static_dir)?;
    let imagery = ImageryClient::new(&cfg.imagery_api_url);

    let app = vegwatch::router(AppState {
        config: cfg,
        imagery,
        artifacts,
        texts,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], 8080));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ---

/// Initialize the global tracing subscriber for structured logging.
///
/// Configures [`tracing_subscriber`] with:
/// - Log target, file, and line number output enabled
/// - Color output controlled by TTY detection and `FORCE_COLOR`
/// - Span event emission mode via `AXUM_SPAN_EVENTS`
///   (`"full"`, `"enter_exit"`, default: CLOSE only)
/// - Log level via `RUST_LOG`, falling back to `AXUM_LOG_LEVEL`
///
/// Called once at startup, before any logging macros run.
fn init_tracing() {
    // ---
    let span_events = match env::var("AXUM_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    // Use RUST_LOG if available, otherwise fall back to AXUM_LOG_LEVEL
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("AXUM_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "debug",
        };
        EnvFilter::new(format!("{level},hyper=info,reqwest=info"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
