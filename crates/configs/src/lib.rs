//! # configs
//!
//! Layered settings: compiled-in defaults, then an optional
//! `config/forum.{toml,yaml,json}`, then `FORUM__SECTION__KEY` environment
//! variables (a `.env` file is read first when present).

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

pub const MEMORY_DATABASE: &str = "memory";
const DEV_JWT_SECRET: &str = "dev-only-change-me";

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    /// `"memory"` or a `postgres://` URL.
    pub url: SecretString,
    pub max_connections: u32,
    pub run_migrations: bool,
}

impl DatabaseSettings {
    pub fn is_memory(&self) -> bool {
        self.url.expose_secret() == MEMORY_DATABASE
    }
}

#[derive(Debug, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: SecretString,
    pub token_ttl_secs: i64,
}

impl AuthSettings {
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret.expose_secret() == DEV_JWT_SECRET
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directive, e.g. `info,sqlx=warn`.
    pub filter: String,
    pub json: bool,
}

impl Settings {
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.url", MEMORY_DATABASE)?
            .set_default("database.max_connections", 10)?
            .set_default("database.run_migrations", true)?
            .set_default("auth.jwt_secret", DEV_JWT_SECRET)?
            .set_default("auth.token_ttl_secs", 60 * 60 * 24 * 7)?
            .set_default("logging.filter", "info")?
            .set_default("logging.json", false)
    }

    pub fn load() -> Result<Self, ConfigError> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                tracing::warn!(error = %err, "ignoring unreadable .env file");
            }
        }
        Self::defaults()?
            .add_source(File::with_name("config/forum").required(false))
            .add_source(
                Environment::with_prefix("FORUM")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
