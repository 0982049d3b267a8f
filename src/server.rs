//! # Server Module
//!
//! HTTP server setup and route configuration for the recipe costing server.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::get,
};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::auth::{AuthMiddleware, TokenService};
use crate::config::Config;
use crate::database::{
    DatabaseConfig, DatabaseConnection, MemoryStore, PgStore, Store, migrations::run_migrations,
};
use crate::mail::{Mailer, SmtpMailer};
use crate::routes::{auth, health::ping, inventory, recipe};

/// Application state shared across all route handlers
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<TokenService>,
    pub store: Arc<dyn Store>,
    pub mailer: Arc<dyn Mailer>,
    pub frontend_url: Arc<str>,
}

/// CORS policy; an empty origin list allows any origin.
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let parsed = origins
            .iter()
            .map(|origin| {
                origin
                    .parse::<HeaderValue>()
                    .with_context(|| format!("Invalid CORS origin {:?}", origin))
            })
            .collect::<Result<Vec<_>>>()?;
        AllowOrigin::list(parsed)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::ORIGIN, header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION]))
}

/// Route table. Everything except `/ping` and `/auth/*` requires a session token.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let protected_routes = Router::new()
        .merge(inventory::create_inventory_routes())
        .merge(recipe::create_recipe_routes())
        .route_layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            AuthMiddleware::validate_token,
        ));

    Router::new()
        .route("/ping", get(ping))
        .merge(auth::create_auth_routes())
        .merge(protected_routes)
        .layer(cors)
        .with_state(state)
}

async fn connect_store(config: &Config) -> Result<Arc<dyn Store>> {
    match &config.database {
        Some(settings) => {
            let db_config = DatabaseConfig::from_url(&settings.url, settings.max_connections)?;
            let db = DatabaseConnection::new(db_config).await?;
            run_migrations(db.pool()).await?;
            Ok(Arc::new(PgStore::new(db.pool().clone())))
        }
        None => {
            tracing::warn!("⚠️ DATABASE_URL is not set, using the in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Starts the HTTP server and serves until the process is terminated.
pub async fn start(config: Config) -> Result<()> {
    let store = connect_store(&config).await?;
    let mailer = SmtpMailer::new(&config.smtp).context("Failed to configure SMTP mailer")?;

    let state = AppState {
        tokens: Arc::new(TokenService::new(&config.jwt_secret, config.token_ttls)),
        store,
        mailer: Arc::new(mailer),
        frontend_url: Arc::from(config.frontend_url.as_str()),
    };

    let app = build_router(state, cors_layer(&config.cors_allow_origins)?);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {} - port may already be in use", addr))?;

    tracing::info!("🚀 Recipe costing server starting...");
    tracing::info!("📡 Listening on http://{}", addr);
    tracing::info!("🏥 Health check available at http://{}/ping", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
