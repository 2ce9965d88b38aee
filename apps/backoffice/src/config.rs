//! Back office configuration.
//!
//! Configuration is loaded from `FILAMENTO_*` environment variables with
//! fallback to defaults.
//!
//! | Variable                          | Default                          |
//! |-----------------------------------|----------------------------------|
//! | `FILAMENTO_DB_PATH`               | platform data dir/filamento.db   |
//! | `FILAMENTO_CACHE_TTL_SECS`        | 30                               |
//! | `FILAMENTO_JWT_SECRET`            | development secret               |
//! | `FILAMENTO_TOKEN_LIFETIME_SECS`   | 3600                             |
//! | `FILAMENTO_LOW_STOCK_THRESHOLD`   | 200                              |
//! | `FILAMENTO_CURRENCY_SYMBOL`       | $                                |
//! | `FILAMENTO_CURRENCY_CODE`         | CLP                              |
//! | `FILAMENTO_MACHINE_POWER_WATTS`   | 150                              |
//! | `FILAMENTO_ENERGY_COST_PER_KWH`   | 140                              |
//! | `FILAMENTO_WEAR_COST_PER_HOUR`    | 200                              |
//! | `FILAMENTO_LABOR_COST_PER_HOUR`   | 100                              |
//! | `FILAMENTO_TAX_PERCENT`           | 19                               |
//! | `FILAMENTO_MARGIN_PERCENT`        | 300                              |

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use filamento_core::QuotationDefaults;
use filamento_db::cache::DEFAULT_TTL_SECS;

const DEV_JWT_SECRET: &str = "filamento-dev-secret-change-in-production";

/// Back office configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// How long a fetched snapshot is served without refetching
    pub cache_ttl_secs: i64,

    /// HS256 signing secret for access tokens
    pub jwt_secret: String,

    /// Access token lifetime in seconds
    pub token_lifetime_secs: i64,

    /// Materials at or below this quantity are flagged `low`
    pub low_stock_threshold: f64,

    pub currency_symbol: String,

    pub currency_code: String,

    /// Values a fresh quotation form starts with
    pub quotation_defaults: QuotationDefaults,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = QuotationDefaults::default();

        let config = AppConfig {
            database_path: match lookup("FILAMENTO_DB_PATH") {
                Some(path) => PathBuf::from(path),
                None => default_database_path(),
            },

            cache_ttl_secs: parse_or(&lookup, "FILAMENTO_CACHE_TTL_SECS", DEFAULT_TTL_SECS)?,

            jwt_secret: lookup("FILAMENTO_JWT_SECRET").unwrap_or_else(|| DEV_JWT_SECRET.to_string()),

            token_lifetime_secs: parse_or(&lookup, "FILAMENTO_TOKEN_LIFETIME_SECS", 3600)?,

            low_stock_threshold: parse_or(&lookup, "FILAMENTO_LOW_STOCK_THRESHOLD", 200.0)?,

            currency_symbol: lookup("FILAMENTO_CURRENCY_SYMBOL").unwrap_or_else(|| "$".to_string()),

            currency_code: lookup("FILAMENTO_CURRENCY_CODE").unwrap_or_else(|| "CLP".to_string()),

            quotation_defaults: QuotationDefaults {
                machine_power_watts: parse_or(
                    &lookup,
                    "FILAMENTO_MACHINE_POWER_WATTS",
                    base.machine_power_watts,
                )?,
                energy_cost_per_kwh: parse_or(
                    &lookup,
                    "FILAMENTO_ENERGY_COST_PER_KWH",
                    base.energy_cost_per_kwh,
                )?,
                wear_cost_per_hour: parse_or(
                    &lookup,
                    "FILAMENTO_WEAR_COST_PER_HOUR",
                    base.wear_cost_per_hour,
                )?,
                labor_cost_per_hour: parse_or(
                    &lookup,
                    "FILAMENTO_LABOR_COST_PER_HOUR",
                    base.labor_cost_per_hour,
                )?,
                tax_percent: parse_or(&lookup, "FILAMENTO_TAX_PERCENT", base.tax_percent)?,
                margin_percent: parse_or(&lookup, "FILAMENTO_MARGIN_PERCENT", base.margin_percent)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Rejects values the back office cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_ttl_secs <= 0 {
            return Err(ConfigError::InvalidValue("FILAMENTO_CACHE_TTL_SECS".to_string()));
        }

        if self.token_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue(
                "FILAMENTO_TOKEN_LIFETIME_SECS".to_string(),
            ));
        }

        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("FILAMENTO_JWT_SECRET".to_string()));
        }

        let d = &self.quotation_defaults;
        let rates = [
            ("FILAMENTO_LOW_STOCK_THRESHOLD", self.low_stock_threshold),
            ("FILAMENTO_MACHINE_POWER_WATTS", d.machine_power_watts),
            ("FILAMENTO_ENERGY_COST_PER_KWH", d.energy_cost_per_kwh),
            ("FILAMENTO_WEAR_COST_PER_HOUR", d.wear_cost_per_hour),
            ("FILAMENTO_LABOR_COST_PER_HOUR", d.labor_cost_per_hour),
            ("FILAMENTO_TAX_PERCENT", d.tax_percent),
            ("FILAMENTO_MARGIN_PERCENT", d.margin_percent),
        ];
        for (key, value) in rates {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue(key.to_string()));
            }
        }

        Ok(())
    }

    /// Whether the development signing secret is in use.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

/// Platform data directory, falling back to the working directory.
///
/// - **macOS**: `~/Library/Application Support/cl.filamento.backoffice/filamento.db`
/// - **Windows**: `%APPDATA%\filamento\backoffice\data\filamento.db`
/// - **Linux**: `~/.local/share/backoffice/filamento.db`
pub fn default_database_path() -> PathBuf {
    match ProjectDirs::from("cl", "filamento", "backoffice") {
        Some(dirs) => dirs.data_dir().join("filamento.db"),
        None => PathBuf::from("filamento.db"),
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
