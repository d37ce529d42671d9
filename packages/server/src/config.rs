//! Server configuration from environment variables.

use std::path::PathBuf;

use popbuilder_database::paths::DEFAULT_DB_DIR;

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default template directory.
pub const DEFAULT_TEMPLATE_DIR: &str = "templates";

/// Default static resources directory.
pub const DEFAULT_RESOURCES_DIR: &str = "resources";

/// Settings read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind (`BIND_ADDR`).
    pub bind_addr: String,
    /// Port to bind (`PORT`).
    pub port: u16,
    /// Directory holding the population stores (`POPBUILDER_DB_DIR`).
    pub db_dir: PathBuf,
    /// Directory holding pages and templates (`POPBUILDER_TEMPLATE_DIR`).
    pub template_dir: PathBuf,
    /// Directory served under `/resources` (`POPBUILDER_RESOURCES_DIR`).
    pub resources_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            port: DEFAULT_PORT,
            db_dir: PathBuf::from(DEFAULT_DB_DIR),
            template_dir: PathBuf::from(DEFAULT_TEMPLATE_DIR),
            resources_dir: PathBuf::from(DEFAULT_RESOURCES_DIR),
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, falling back to defaults for
    /// unset variables. An unparseable `PORT` is logged and ignored.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                log::warn!("Ignoring invalid PORT {raw:?}, using {}", defaults.port);
                defaults.port
            }),
            None => defaults.port,
        };

        Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port,
            db_dir: lookup("POPBUILDER_DB_DIR").map_or(defaults.db_dir, PathBuf::from),
            template_dir: lookup("POPBUILDER_TEMPLATE_DIR")
                .map_or(defaults.template_dir, PathBuf::from),
            resources_dir: lookup("POPBUILDER_RESOURCES_DIR")
                .map_or(defaults.resources_dir, PathBuf::from),
        }
    }
}
