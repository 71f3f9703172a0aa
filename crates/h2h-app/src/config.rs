// Configuration loading and validation (config/dashboard.toml).

use std::path::{Path, PathBuf};

use h2h_core::gameweek::{Gameweek, FIRST_GAMEWEEK, LAST_GAMEWEEK};
use h2h_core::squad::ManagerId;
use serde::Deserialize;
use thiserror::Error;

const CONFIG_FILE: &str = "dashboard.toml";

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
// dashboard.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub comparison: ComparisonConfig,
    pub api: ApiConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComparisonConfig {
    pub manager_a: ManagerId,
    pub manager_b: ManagerId,
    /// Gameweek to open on. When omitted the current gameweek is derived
    /// from the reference data.
    #[serde(default)]
    pub start_gameweek: Option<u8>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub capacity: usize,
}

impl Config {
    /// The configured starting gameweek. Validation guarantees it is in
    /// range, so a present value always converts.
    pub fn start_gameweek(&self) -> Option<Gameweek> {
        self.comparison
            .start_gameweek
            .and_then(|gw| Gameweek::new(gw).ok())
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/dashboard.toml` relative to `base_dir`.
///
/// Does not copy defaults; prefer `load_config()` for normal startup.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = std::fs::read_to_string(&path)
        .map_err(|_| ConfigError::FileNotFound { path: path.clone() })?;
    let config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    validate(&config)?;

    Ok(config)
}

/// Seed `config/dashboard.toml` from `defaults/dashboard.toml` if it does
/// not exist yet. An existing config is never touched.
///
/// Returns `true` when the default was copied.
pub fn ensure_config_file(base_dir: &Path) -> Result<bool, ConfigError> {
    let target = base_dir.join("config").join(CONFIG_FILE);
    if target.exists() {
        return Ok(false);
    }

    let default = base_dir.join("defaults").join(CONFIG_FILE);
    if !default.is_file() {
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "no {} and no default at {}",
                target.display(),
                default.display()
            ),
        });
    }

    let copy_err = |e: std::io::Error| ConfigError::DefaultsCopyError {
        message: format!("failed to seed {}: {e}", target.display()),
    };
    std::fs::create_dir_all(base_dir.join("config")).map_err(copy_err)?;
    std::fs::copy(&default, &target).map_err(copy_err)?;
    Ok(true)
}

/// Load config relative to the current working directory, seeding
/// `config/` from `defaults/` first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_file(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_string(),
        message: message.into(),
    }
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    let cmp = &config.comparison;
    if cmp.manager_a == 0 {
        return Err(invalid("comparison.manager_a", "must be greater than 0"));
    }
    if cmp.manager_b == 0 {
        return Err(invalid("comparison.manager_b", "must be greater than 0"));
    }
    if let Some(gw) = cmp.start_gameweek {
        if !(FIRST_GAMEWEEK..=LAST_GAMEWEEK).contains(&gw) {
            return Err(invalid(
                "comparison.start_gameweek",
                format!("must be between {FIRST_GAMEWEEK} and {LAST_GAMEWEEK}, got {gw}"),
            ));
        }
    }

    if config.api.base_url.trim().is_empty() {
        return Err(invalid("api.base_url", "must not be empty"));
    }
    if config.api.timeout_secs == 0 {
        return Err(invalid("api.timeout_secs", "must be greater than 0"));
    }

    // Room for at least one manager pair.
    if config.cache.capacity < 2 {
        return Err(invalid(
            "cache.capacity",
            format!("must be at least 2, got {}", config.cache.capacity),
        ));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
