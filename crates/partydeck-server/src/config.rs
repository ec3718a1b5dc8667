// Configuration loading and parsing (config/server.toml).

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Environment variable that overrides `server.port`.
pub const PORT_ENV: &str = "PORT";

const CONFIG_FILE: &str = "server.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

/// The assembled server configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".into(),
            port: 3001,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CatalogConfig {
    /// JSON card file to load instead of the embedded deck.
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// How many of a session's most recent cards a session draw avoids.
    pub recent_exclusion_window: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            recent_exclusion_window: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directives; `RUST_LOG` takes precedence.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            filter: "partydeck_server=info,partydeck_core=info,tower_http=info,warn".into(),
        }
    }
}

impl Config {
    /// The address the HTTP listener binds to.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = parse_host(&self.server.host)?;
        Ok(SocketAddr::new(ip, self.server.port))
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/server.toml` relative to `base_dir`.
///
/// This is the lower-level loading primitive: it neither copies defaults nor
/// applies environment overrides.
pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = std::fs::read_to_string(&path).map_err(|_| ConfigError::FileNotFound {
        path: path.clone(),
    })?;
    let config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    validate(&config)?;

    Ok(config)
}

/// Seed `config/server.toml` from `defaults/server.toml` on first start.
///
/// Returns the path written, or `None` when the config file already exists
/// or there is no default to copy. An existing config is never overwritten.
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let target = base_dir.join("config").join(CONFIG_FILE);
    let default = base_dir.join("defaults").join(CONFIG_FILE);

    if target.exists() || !default.is_file() {
        return Ok(None);
    }

    let copy_error = |e: std::io::Error| ConfigError::DefaultsCopyError {
        message: format!("{} -> {}: {e}", default.display(), target.display()),
    };
    std::fs::create_dir_all(base_dir.join("config")).map_err(copy_error)?;
    std::fs::copy(&default, &target).map_err(copy_error)?;

    Ok(Some(target))
}

/// Load config relative to `base_dir`, then apply `port_override` (the value
/// of the `PORT` variable, if set).
///
/// With neither `config/` nor `defaults/` present the built-in defaults are
/// used, so the server also runs from an empty directory.
pub fn load_config_in(base_dir: &Path, port_override: Option<&str>) -> Result<Config, ConfigError> {
    let mut config =
        if !base_dir.join("config").exists() && !base_dir.join("defaults").exists() {
            Config::default()
        } else {
            ensure_config_file(base_dir)?;
            load_config_from(base_dir)?
        };

    if let Some(raw) = port_override {
        config.server.port = parse_port(raw)?;
    }

    validate(&config)?;
    Ok(config)
}

/// Convenience wrapper: loads config relative to the current working
/// directory and honours the `PORT` environment variable.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    let port = std::env::var(PORT_ENV).ok();
    load_config_in(&cwd, port.as_deref())
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn parse_port(raw: &str) -> Result<u16, ConfigError> {
    raw.trim()
        .parse::<u16>()
        .map_err(|_| ConfigError::ValidationError {
            field: PORT_ENV.into(),
            message: format!("must be a port number, got `{raw}`"),
        })
}

fn parse_host(host: &str) -> Result<IpAddr, ConfigError> {
    host.parse::<IpAddr>()
        .map_err(|_| ConfigError::ValidationError {
            field: "server.host".into(),
            message: format!("must be an IP address, got `{host}`"),
        })
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    parse_host(&config.server.host)?;

    if config.server.port == 0 {
        return Err(ConfigError::ValidationError {
            field: "server.port".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.logging.filter.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "logging.filter".into(),
            message: "must not be empty".into(),
        });
    }

    if let Some(path) = &config.catalog.path {
        if path.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: "catalog.path".into(),
                message: "must not be empty when set".into(),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
