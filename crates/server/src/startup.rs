use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use common::utils::logging::init_logging_from_env;
use configs::{AppConfig, ServerConfig};
use dotenvy::dotenv;
use migration::MigratorTrait;
use service::contacts::{ContactRepository, ContactService, InMemoryContactRepository, SeaOrmContactRepository};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::errors::StartupError;
use crate::routes;
use crate::state::AppState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// `config.toml` (or `CONFIG_PATH`) when present, else environment only.
pub fn load_config() -> anyhow::Result<AppConfig> {
    match configs::load_default() {
        Ok(mut cfg) => {
            cfg.normalize_and_validate()?;
            Ok(cfg)
        }
        Err(e) => {
            warn!(error = %e, "config file not loaded; falling back to environment");
            AppConfig::from_env()
        }
    }
}

fn bind_addr(server: &ServerConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", server.host, server.port).parse()?)
}

/// Pick the contact store from `CONTACTS_STORE` (`postgres` by default, or
/// `memory`). The Postgres store gets its schema applied before use.
pub async fn contact_repository(cfg: &AppConfig) -> Result<Arc<dyn ContactRepository>, StartupError> {
    let store = std::env::var("CONTACTS_STORE").unwrap_or_else(|_| "postgres".to_string());
    match store.as_str() {
        "memory" => {
            warn!("using in-memory contact store; data is lost on exit");
            Ok(Arc::new(InMemoryContactRepository::new()))
        }
        "postgres" => {
            let db = models::db::connect_with_config(&cfg.database).await?;
            migration::Migrator::up(&db, None)
                .await
                .map_err(|e| anyhow::anyhow!("migrate up failed: {e}"))?;
            Ok(Arc::new(SeaOrmContactRepository::new(db)))
        }
        other => Err(StartupError::InvalidConfig(format!(
            "CONTACTS_STORE must be `postgres` or `memory`, got `{other}`"
        ))),
    }
}

/// Router wired to the given service; what `run` serves and tests drive.
pub fn app(contacts: ContactService) -> Router {
    routes::build_router(AppState::new(contacts), build_cors())
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging_from_env();

    let cfg = load_config()?;
    let repo = contact_repository(&cfg).await?;
    let app = app(ContactService::new(repo));

    // Bind and serve
    let addr = bind_addr(&cfg.server)?;
    info!(%addr, "starting contact book server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
