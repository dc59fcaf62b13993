//! Configuration management for the wine lots storefront
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with WINELOTS_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Store selection and failure policy
    pub store: StoreConfig,

    /// Admin authentication configuration
    pub admin: AdminConfig,

    /// Outbound email configuration
    pub mail: MailConfig,

    /// Catalog defaults
    pub catalog: CatalogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

/// What a display read does when the store cannot answer
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReadFailurePolicy {
    /// Log and serve an empty result
    #[default]
    Degrade,
    /// Surface the failure as a server error
    Propagate,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub read_failure: ReadFailurePolicy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AdminConfig {
    /// bcrypt hash of the admin password
    pub password_hash: String,

    /// Secret key for signing admin tokens
    pub token_secret: String,

    /// Token lifetime in seconds
    pub token_ttl_secs: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    /// SMTP relay; mail is only logged when absent
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,

    /// Sender address
    pub from_address: String,

    /// Receives a summary of every submission
    pub operator_address: String,

    /// Display name used in the sender and signatures
    pub club_name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    /// Threshold used when a case is saved without one
    pub default_min_participants: i32,

    /// Bottles per case for the per-bottle price
    pub bottles_per_case: u32,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("WINELOTS_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.url", "postgres://localhost/winelots")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("store.backend", "postgres")?
            .set_default("store.read_failure", "degrade")?
            .set_default("admin.password_hash", "")?
            .set_default("admin.token_ttl_secs", 172_800)?
            .set_default("mail.smtp_port", 587)?
            .set_default("mail.from_address", "noreply@winelots.local")?
            .set_default("mail.operator_address", "operator@winelots.local")?
            .set_default("mail.club_name", "Le Club")?
            .set_default("catalog.default_min_participants", 3)?
            .set_default("catalog.bottles_per_case", 6)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (WINELOTS_ prefix)
            .add_source(
                Environment::with_prefix("WINELOTS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: "postgres://localhost/winelots".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            store: StoreConfig {
                backend: StoreBackend::Memory,
                read_failure: ReadFailurePolicy::Degrade,
            },
            admin: AdminConfig {
                password_hash: String::new(),
                token_secret: "development-secret-key".to_string(),
                token_ttl_secs: 172_800,
            },
            mail: MailConfig {
                smtp_host: None,
                smtp_port: 587,
                smtp_user: None,
                smtp_password: None,
                from_address: "noreply@winelots.local".to_string(),
                operator_address: "operator@winelots.local".to_string(),
                club_name: "Le Club".to_string(),
            },
            catalog: CatalogConfig {
                default_min_participants: shared::DEFAULT_MIN_PARTICIPANTS,
                bottles_per_case: shared::BOTTLES_PER_CASE,
            },
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}
