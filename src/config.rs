//! `settings.toml` in the platform config directory.

use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::currency::{self, Currency};
use crate::export::email::DEFAULT_EMAIL_ENDPOINT;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Failed to write settings {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn default_output_dir() -> String {
    "~/Documents/Invoices".to_string()
}

fn default_email_endpoint() -> String {
    DEFAULT_EMAIL_ENDPOINT.to_string()
}

fn default_pdf_engine() -> String {
    "wkhtmltopdf".to_string()
}

fn default_currency_code() -> String {
    currency::DEFAULT_CURRENCY.code.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Where PDFs and saved previews go. `~` expands to the home directory.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_email_endpoint")]
    pub email_endpoint: String,
    #[serde(default = "default_pdf_engine")]
    pub pdf_engine: String,
    #[serde(default = "default_currency_code")]
    pub default_currency: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            email_endpoint: default_email_endpoint(),
            pdf_engine: default_pdf_engine(),
            default_currency: default_currency_code(),
        }
    }
}

impl Settings {
    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(expand_home_dir(&self.output_dir))
    }

    /// Catalog currency for new sessions; unknown codes fall back to the default.
    pub fn currency(&self) -> Currency {
        currency::lookup_or_default(&self.default_currency)
    }

    /// `Ok(None)` when the file does not exist yet.
    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Loaded settings from {:?}", path);
        Ok(Some(settings))
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        fs::write(path, toml_str).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Settings from the default location, or defaults when none are saved.
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self::load_from(&settings_path())?.unwrap_or_default())
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&settings_path())
    }
}

pub fn settings_path() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("com", "invoice-maker", "app") {
        return proj_dirs.config_dir().join("settings.toml");
    }
    PathBuf::from("settings.toml")
}

pub fn expand_home_dir(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(base_dirs) = BaseDirs::new() {
            let home = base_dirs.home_dir().to_string_lossy();
            return path.replacen('~', &home, 1);
        }
    }
    path.to_string()
}
