//! # Filamento Back Office
//!
//! Application layer of the Filamento back office: configuration, state
//! and the commands the screens invoke.
//!
//! ## Module Organization
//! ```text
//! filamento_backoffice/
//! ├── lib.rs          ◄─── You are here (startup)
//! ├── config.rs       ◄─── FILAMENTO_* environment configuration
//! ├── error.rs        ◄─── ApiError returned by every command
//! ├── state/
//! │   ├── db.rs       ◄─── Database + snapshot caches + clock
//! │   ├── session.rs  ◄─── SessionManager and its observers
//! │   └── config.rs   ◄─── Currency and quotation defaults
//! └── commands/       ◄─── quotation, product, sale, material, finance,
//!                          dashboard, report, auth
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. init_tracing()          RUST_LOG or "info,filamento=debug,sqlx=warn"│
//! │  2. AppConfig::from_env()   FILAMENTO_* over defaults                   │
//! │  3. App::open(&config)                                                  │
//! │       ├── create the data directory                                     │
//! │       ├── Database::new (WAL, foreign keys, migrations)                 │
//! │       ├── DbState      (caches with the configured TTL)                 │
//! │       ├── SessionManager over LocalAuthProvider                         │
//! │       └── ConfigState                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod state;

use chrono::Duration;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::{AppConfig, ConfigError};
use filamento_db::{Database, DbConfig, DbError, LocalAuthProvider, SystemClock};
use state::{ConfigState, DbState, SessionManager};

/// Everything a screen needs, built once at startup.
#[derive(Debug)]
pub struct App {
    pub db: DbState,
    pub sessions: SessionManager,
    pub config: ConfigState,
}

/// Why the back office could not start.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Could not create data directory: {0}")]
    DataDir(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl App {
    /// Opens the configured database and wires up state.
    pub async fn open(config: &AppConfig) -> Result<Self, StartupError> {
        config.validate()?;

        if config.uses_dev_secret() {
            warn!("FILAMENTO_JWT_SECRET not set, using the development secret");
        }

        if let Some(dir) = config.database_path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }

        let db = Database::new(DbConfig::new(config.database_path.clone())).await?;
        info!(path = %config.database_path.display(), "Database connected and migrations applied");

        let provider = LocalAuthProvider::new(
            db.users(),
            &config.jwt_secret,
            Duration::seconds(config.token_lifetime_secs),
            Arc::new(SystemClock),
        );

        Ok(App {
            db: DbState::new(db, Duration::seconds(config.cache_ttl_secs)),
            sessions: SessionManager::new(Arc::new(provider)),
            config: ConfigState::from(config),
        })
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=filamento=trace` - Show trace for filamento crates only
/// - Default: `info,filamento=debug,sqlx=warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,filamento=debug,sqlx=warn"));

    // Logs go to stderr; stdout carries the report JSON.
    // A second call (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_for(path: &std::path::Path) -> AppConfig {
        let vars: HashMap<&str, String> =
            HashMap::from([("FILAMENTO_DB_PATH", path.display().to_string())]);
        AppConfig::from_lookup(|key| vars.get(key).cloned()).unwrap()
    }

    #[tokio::test]
    async fn test_open_creates_database() {
        let dir = std::env::temp_dir().join(format!("filamento-{}", uuid::Uuid::new_v4()));
        let config = config_for(&dir.join("nested").join("filamento.db"));

        let app = App::open(&config).await.unwrap();
        assert!(app.db.inner().health_check().await);
        assert_eq!(app.config.currency_code, "CLP");
        assert!(app.sessions.current().is_none());

        app.db.inner().close().await;
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_open_rejects_invalid_config() {
        let mut config = config_for(std::path::Path::new("unused.db"));
        config.cache_ttl_secs = 0;

        let err = App::open(&config).await.unwrap_err();
        assert!(matches!(err, StartupError::Config(_)));
    }
}
