use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::{FileRegistry, KnownFile};

pub const DEFAULT_CONFIG_FILE_NAME: &str = "confpull.toml";
pub const DEFAULT_BACKUP_DIR: &str = "config_backup";
pub const KEY_PASSPHRASE_ENV: &str = "CONFPULL_KEY_PASSPHRASE";

#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    #[serde(default = "config_file_version")]
    version: u32,
    #[serde(default = "default_backup_dir")]
    backup_dir: String,
    #[serde(default)]
    request_timeout_secs: Option<u64>,
    #[serde(default)]
    key_passphrase: Option<String>,
    #[serde(default)]
    files: Vec<KnownFile>,
}

/// Process-wide settings, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfpullConfig {
    pub backup_dir: String,
    pub request_timeout: Option<Duration>,
    pub key_passphrase: Option<String>,
    pub registry: FileRegistry,
}

impl Default for ConfpullConfig {
    fn default() -> Self {
        Self {
            backup_dir: default_backup_dir(),
            request_timeout: None,
            key_passphrase: None,
            registry: FileRegistry::default(),
        }
    }
}

impl ConfpullConfig {
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(input).context("failed to parse confpull config")?;

        let expected = config_file_version();
        if file.version != expected {
            anyhow::bail!(
                "unsupported config version {} (expected {}): update confpull.toml to version {}",
                file.version,
                expected,
                expected
            );
        }
        if file.backup_dir.trim().is_empty() {
            return Err(anyhow!("backup_dir must not be empty"));
        }

        let request_timeout = match file.request_timeout_secs {
            Some(0) => return Err(anyhow!("request_timeout_secs must be greater than zero")),
            Some(secs) => Some(Duration::from_secs(secs)),
            None => None,
        };

        let registry = if file.files.is_empty() {
            FileRegistry::default()
        } else {
            FileRegistry::from_entries(file.files).context("invalid [[files]] registry")?
        };

        Ok(Self {
            backup_dir: file.backup_dir,
            request_timeout,
            key_passphrase: file.key_passphrase.filter(|value| !value.is_empty()),
            registry,
        })
    }

    /// Reads `path`, or returns the built-in defaults when it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read config file: {}", path.display()));
            }
        };

        Self::from_toml_str(&raw)
            .with_context(|| format!("failed parsing config file: {}", path.display()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&raw)
            .with_context(|| format!("failed parsing config file: {}", path.display()))
    }

    /// Applies `CONFPULL_KEY_PASSPHRASE` when set and non-empty.
    pub fn with_env_passphrase(mut self, value: Option<String>) -> Self {
        if let Some(passphrase) = value.filter(|value| !value.is_empty()) {
            self.key_passphrase = Some(passphrase);
        }
        self
    }
}

fn config_file_version() -> u32 {
    1
}

fn default_backup_dir() -> String {
    DEFAULT_BACKUP_DIR.to_string()
}
