//! Configuration module for worklens.
//!
//! Handles the TOML settings file and environment variable expansion.

mod settings;

pub use settings::{
    expand_env_vars, AuthSettings, BrandingSettings, DataSettings, ReportSettings, Settings,
    SettingsError,
};
