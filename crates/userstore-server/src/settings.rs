//! Service configuration.
//!
//! Loaded from an optional TOML file (`config.toml`, or the path in
//! `USERSTORE_CONFIG`) overlaid with `USERSTORE__`-prefixed environment
//! variables, e.g. `USERSTORE__DATABASE__HOST=db.internal`.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use userstore_db::DbConfig;

/// How the HTTP server accepts connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListenKind {
    Tcp,
    /// Unix socket `app.sock` next to the executable.
    Sock,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    pub kind: ListenKind,
    pub bind_ip: String,
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            kind: ListenKind::Tcp,
            bind_ip: "127.0.0.1".into(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directives; `RUST_LOG` takes precedence when set.
    pub filter: String,
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "userstore=info".into(),
            json: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub listen: ListenConfig,
    pub database: DbConfig,
    pub log: LogConfig,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("USERSTORE_CONFIG").unwrap_or_else(|_| "config".into());
        Self::from_sources(&path, Environment::with_prefix("USERSTORE").separator("__"))
    }

    fn from_sources(path: &str, env: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(env)
            .build()?
            .try_deserialize()
    }
}
