use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Text a freshly created note contains before anyone edits it. Files whose
/// whole content equals this are imported as empty.
pub const DEFAULT_PLACEHOLDER_TEXT: &str = "Click here to edit.";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImportConfig {
    /// Base directory that local image links are resolved against.
    #[serde(default = "default_asset_root")]
    pub asset_root: PathBuf,
    /// Domain every document is saved under. When unset, the name of the
    /// subdirectory a file lives in is used.
    #[serde(default)]
    pub domain: Option<String>,
    /// Password used when a missing domain is provisioned during a retry.
    #[serde(default = "default_password")]
    pub default_password: String,
    #[serde(default = "default_placeholder_text")]
    pub placeholder_text: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            asset_root: default_asset_root(),
            domain: None,
            default_password: default_password(),
            placeholder_text: default_placeholder_text(),
        }
    }
}

fn default_asset_root() -> PathBuf {
    PathBuf::from("./static")
}
fn default_password() -> String {
    "123".to_string()
}
fn default_placeholder_text() -> String {
    DEFAULT_PLACEHOLDER_TEXT.to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
fn default_format() -> String {
    "pretty".to_string()
}

impl Config {
    /// Configuration used when no file is present: database under `./data`,
    /// every other section at its defaults.
    pub fn minimal() -> Self {
        Self {
            db: DbConfig {
                path: PathBuf::from("./data/mdimport.sqlite"),
            },
            import: ImportConfig::default(),
            log: LogConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.import.default_password.is_empty() {
        anyhow::bail!("import.default_password must not be empty");
    }

    if let Some(domain) = &config.import.domain {
        if domain.trim().is_empty() {
            anyhow::bail!("import.domain must not be blank when set");
        }
    }

    match config.log.level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        other => anyhow::bail!(
            "Unknown log level: '{}'. Must be trace, debug, info, warn, or error.",
            other
        ),
    }

    match config.log.format.as_str() {
        "pretty" | "json" => {}
        other => anyhow::bail!("Unknown log format: '{}'. Must be pretty or json.", other),
    }

    Ok(())
}
