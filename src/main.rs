//! # Recipe Costing Server
//!
//! ## Environment Setup
//! Copy `.env.example` to `.env` and configure:
//! ```bash
//! cp .env.example .env
//! # At minimum set JWT_SECRET; DATABASE_URL and SMTP_* for a real deployment
//! ```
//!
//! ## Running the Server
//! ```bash
//! cargo run
//! ```
//!
//! The server will start on `http://0.0.0.0:3000` by default.
//!
//! ## Health Check
//! ```bash
//! curl http://localhost:3000/ping
//! ```

use cogs_server::{config::Config, server};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Application entry point.
///
/// Loads `.env`, initializes logging (`RUST_LOG`, default `info`), reads the
/// configuration and serves until the process is terminated.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false) // Don't show module targets for cleaner output
                .compact(),
        )
        .init();

    tracing::info!("🏁 Starting recipe costing server...");
    tracing::info!("📦 Package: {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    tracing::info!("🏗️  Build profile: {}", if cfg!(debug_assertions) { "debug" } else { "release" });

    let config = Config::from_env()?;
    server::start(config).await
}
