//! TOML-based configuration for worklens.
//!
//! Supports a config file (worklens.toml) with environment variable expansion
//! in path values.
//!
//! Example configuration:
//! ```toml
//! [data]
//! dir = "${HR_DATA_DIR}"
//! primary_dataset = "employee"
//!
//! [reports]
//! dir = "reports"
//! extension = "lua"
//! builtins = true
//!
//! [[filters]]
//! column = "company"
//! label = "Company"
//! group = "org"
//!
//! [auth]
//! users = ["asha", "ravi"]
//!
//! [branding]
//! name = "WorkplaceAI"
//! tagline = "AI-native people intelligence for world-class teams"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::filter::{default_dimensions, FilterDimension};
use crate::report::DEFAULT_EXTENSION;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Data source location.
    pub data: DataSettings,

    /// Report discovery.
    pub reports: ReportSettings,

    /// Filter dimensions; empty means the stock HR dimensions.
    pub filters: Vec<FilterDimension>,

    /// Users admitted by the built-in authenticator.
    pub auth: AuthSettings,

    /// Header chrome.
    pub branding: BrandingSettings,
}

/// Data source configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DataSettings {
    /// Directory of CSV/TSV files (supports ${ENV_VAR} expansion).
    pub dir: String,

    /// Dataset that filters apply to.
    pub primary_dataset: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            dir: "data".to_string(),
            primary_dataset: "employee".to_string(),
        }
    }
}

/// Report discovery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Directory scanned for report units (supports ${ENV_VAR} expansion).
    pub dir: String,

    /// File extension of report units.
    pub extension: String,

    /// Register the built-in reports.
    pub builtins: bool,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            dir: "reports".to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
            builtins: true,
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Admitted user names. Empty admits any non-empty name.
    pub users: Vec<String>,
}

/// Help link shown in the header when none is configured.
pub const DEFAULT_HELP_URL: &str = "https://yourhelp.site";

/// Header chrome configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BrandingSettings {
    pub name: String,
    pub tagline: String,
    pub help_url: Option<String>,
}

impl Default for BrandingSettings {
    fn default() -> Self {
        Self {
            name: "WorkplaceAI".to_string(),
            tagline: "AI-native people intelligence for world-class teams".to_string(),
            help_url: Some(DEFAULT_HELP_URL.to_string()),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `WORKLENS_CONFIG`
    /// 2. `./worklens.toml`
    /// 3. `~/.config/worklens/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("WORKLENS_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("worklens.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("worklens").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    fn validate(&self) -> Result<(), SettingsError> {
        let mut seen = std::collections::HashSet::new();
        for dim in &self.filters {
            if dim.column.trim().is_empty() {
                return Err(SettingsError::InvalidConfig(
                    "filter column must not be empty".to_string(),
                ));
            }
            if !seen.insert(dim.column.as_str()) {
                return Err(SettingsError::InvalidConfig(format!(
                    "filter column '{}' is configured twice",
                    dim.column
                )));
            }
        }
        if self.data.primary_dataset.trim().is_empty() {
            return Err(SettingsError::InvalidConfig(
                "data.primary_dataset must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Data directory with environment variables expanded.
    pub fn data_dir(&self) -> Result<PathBuf, SettingsError> {
        expand_env_vars(&self.data.dir).map(PathBuf::from)
    }

    /// Report directory with environment variables expanded.
    pub fn report_dir(&self) -> Result<PathBuf, SettingsError> {
        expand_env_vars(&self.reports.dir).map(PathBuf::from)
    }

    /// Configured filter dimensions, or the stock set when none are given.
    pub fn filter_dimensions(&self) -> Vec<FilterDimension> {
        if self.filters.is_empty() {
            default_dimensions()
        } else {
            self.filters.clone()
        }
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax. A lone `$` is kept.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let lookup = |name: &str| env::var(name).map_err(|_| SettingsError::MissingEnvVar(name.to_string()));

    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let mut name = String::new();
        if chars.next_if_eq(&'{').is_some() {
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                name.push(ch);
            }
            result.push_str(&lookup(&name)?);
        } else {
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                name.push(ch);
            }
            if name.is_empty() {
                result.push('$');
            } else {
                result.push_str(&lookup(&name)?);
            }
        }
    }

    Ok(result)
}
