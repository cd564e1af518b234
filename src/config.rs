//! Configuration for the station manager service.
//!
//! Layered, highest priority first:
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/station-manager/config.toml`)
//! 4. Compiled defaults

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::store::DEFAULT_DATA_FILE;
use crate::suggest::{DEFAULT_BASE_URL, DEFAULT_MODEL};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

// -----------------------------
// TOML file (every field optional)
// -----------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    server: ServerSection,
    storage: StorageSection,
    suggestions: SuggestionsSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ServerSection {
    bind_addr: Option<String>,
    static_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StorageSection {
    data_file: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SuggestionsSection {
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
}

// -----------------------------
// CLI
// -----------------------------

#[derive(clap::Parser, Debug, Default)]
#[command(name = "station-manager", version, about = "Nursing station room and task board")]
pub struct CliArgs {
    /// Address to serve the API on.
    #[arg(short, long, env = "STATION_ADDR")]
    pub bind: Option<String>,

    /// JSON file holding every room.
    #[arg(long, env = "STATION_DATA_FILE")]
    pub data_file: Option<PathBuf>,

    /// Directory with the board's static UI files.
    #[arg(long, env = "STATION_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    /// Generative API key; suggestions are disabled without one.
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model used for task suggestions.
    #[arg(long, env = "STATION_MODEL")]
    pub model: Option<String>,

    /// Path to config file (default: `~/.config/station-manager/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "STATION_LOG")]
    pub log_level: String,
}

// -----------------------------
// Resolved configuration
// -----------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub data_file: PathBuf,
    pub static_dir: PathBuf,
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            static_dir: PathBuf::from("static"),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Merge CLI args, env vars and the TOML file.
    ///
    /// An explicit `--config` file must exist; the default path may be absent.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, file))
    }

    fn resolve(cli: &CliArgs, file: ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            bind_addr: cli
                .bind
                .clone()
                .or(file.server.bind_addr)
                .unwrap_or(defaults.bind_addr),
            data_file: cli
                .data_file
                .clone()
                .or(file.storage.data_file)
                .unwrap_or(defaults.data_file),
            static_dir: cli
                .static_dir
                .clone()
                .or(file.server.static_dir)
                .unwrap_or(defaults.static_dir),
            api_key: cli
                .api_key
                .clone()
                .or(file.suggestions.api_key)
                .filter(|k| !k.trim().is_empty()),
            model: cli
                .model
                .clone()
                .or(file.suggestions.model)
                .unwrap_or(defaults.model),
            base_url: file.suggestions.base_url.unwrap_or(defaults.base_url),
            log_level: cli.log_level.clone(),
        }
    }
}

fn load_config_file(explicit_path: Option<&Path>) -> Result<ConfigFile, ConfigError> {
    if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    }

    let Some(config_dir) = dirs::config_dir() else {
        return Ok(ConfigFile::default());
    };
    let path = config_dir.join("station-manager").join("config.toml");

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
