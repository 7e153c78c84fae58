//! Configuration loading and resolution
//!
//! Every setting resolves in this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Command line and environment are handled by each binary's `clap` definition;
//! this module owns the TOML layer and the compiled defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::balancer::BalancerConfig;
use crate::{Error, Result};

/// Environment variable naming the TOML config file
pub const CONFIG_ENV_VAR: &str = "RECIPE_CONFIG";

/// Default remote engine request timeout
pub const DEFAULT_ENGINE_TIMEOUT_SECS: u64 = 5;

/// Contents of the TOML config file
///
/// All sections are optional; a missing file behaves like an empty one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub balancer: BalancerConfig,
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Allowed browser origin for CORS; unset disables the CORS layer
    pub cors_origin: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

/// Where the recipe manager runs the calculator and balancer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineMode {
    /// In-process engine
    #[default]
    Local,
    /// HTTP calls to a recipe-engine service
    Remote,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub mode: EngineMode,
    pub calculator_url: Option<String>,
    pub balancer_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: EngineMode::Local,
            calculator_url: None,
            balancer_url: None,
            timeout_secs: DEFAULT_ENGINE_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl TomlConfig {
    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Check values that would otherwise fail at request time
    pub fn validate(&self) -> Result<()> {
        self.balancer.validate()?;

        if self.engine.mode == EngineMode::Remote {
            if self.engine.calculator_url.is_none() {
                return Err(Error::Config(
                    "engine.mode = \"remote\" requires engine.calculator_url".to_string(),
                ));
            }
            if self.engine.balancer_url.is_none() {
                return Err(Error::Config(
                    "engine.mode = \"remote\" requires engine.balancer_url".to_string(),
                ));
            }
        }
        if self.engine.timeout_secs == 0 {
            return Err(Error::Config(
                "engine.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Locate the TOML config file
///
/// Priority: command-line path, then `RECIPE_CONFIG`, then
/// `<config_dir>/<module>/config.toml`. Returns `None` when no candidate exists
/// on disk; an explicit path is returned even if missing so the caller can warn.
pub fn resolve_config_path(cli_arg: Option<&Path>, module: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    dirs::config_dir()
        .map(|d| d.join(module).join("config.toml"))
        .filter(|p| p.exists())
}

/// Load the TOML config, falling back to defaults when the file is missing
///
/// A missing file is not an error; a file that exists but does not parse is.
pub fn load_config(path: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = path else {
        info!("No config file found, using compiled defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!("Config file not found: {} (using defaults)", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config = TomlConfig::from_toml_str(&content)?;
    config.validate()?;
    info!("Loaded config from {}", path.display());
    Ok(config)
}

/// OS-dependent default database location
pub fn default_database_path(module: &str) -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(module))
        .unwrap_or_else(|| PathBuf::from("./recipe_data"))
        .join("recipes.db")
}

/// Pick the highest-priority value that is set
pub fn resolve<T>(cli_or_env: Option<T>, toml: Option<T>, default: T) -> T {
    cli_or_env.or(toml).unwrap_or(default)
}
