//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$EMLSTAMP_CONFIG` (environment variable)
//! 2. `~/.config/emlstamp/config.toml` (Linux/macOS)
//!    `%APPDATA%\emlstamp\config.toml` (Windows)
//! 3. Built-in defaults
//!
//! Only the binary loads the file. The library receives a finished [`Config`].

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::parser::mbox::BoundaryStyle;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Mailbox splitting.
    pub split: SplitConfig,
    /// Loose `.eml` retouching.
    pub retouch: RetouchConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
    /// Also write diagnostics to `emlstamp.log` in the cache directory.
    pub log_to_file: bool,
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
}

/// What to do with a mailbox message that has no usable `Date:` header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MissingDatePolicy {
    /// Write it dated `0001-01-01 00:00:00`, filed under `0001/`.
    #[default]
    MinimumDate,
    /// Do not write the message.
    Skip,
    /// Write it under `undated/`, named after the mailbox and its position.
    Unsorted,
}

/// Mailbox splitting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Extension (without dot) identifying mailbox files.
    pub mailbox_extension: String,
    /// Missing-date fallback.
    pub missing_date: MissingDatePolicy,
    /// Which lines start a new message.
    pub boundary: BoundaryStyle,
    /// Write split messages here instead of next to the mailbox.
    pub output_root: Option<PathBuf>,
    /// Maximum number of subject characters kept in a file name.
    pub max_subject_len: usize,
    /// Set creation/modification times of written messages to their date.
    pub set_timestamps: bool,
}

/// Loose message retouching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetouchConfig {
    /// Extension (without dot) identifying single-message files.
    pub message_extension: String,
    /// Do not rename files whose name already starts with their date prefix.
    pub skip_prefixed: bool,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            log_to_file: false,
            cache_dir: None,
        }
    }
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            mailbox_extension: "mbox".to_string(),
            missing_date: MissingDatePolicy::default(),
            boundary: BoundaryStyle::default(),
            output_root: None,
            max_subject_len: 120,
            set_timestamps: true,
        }
    }
}

impl Default for RetouchConfig {
    fn default() -> Self {
        Self {
            message_extension: "eml".to_string(),
            skip_prefixed: true,
        }
    }
}

// ── Load ────────────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    if let Some(path) = config_file_path() {
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<Config>(&contents) {
                    Ok(cfg) => {
                        tracing::info!(path = %path.display(), "Loaded config");
                        return cfg;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to parse config, using defaults"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to read config file, using defaults"
                    );
                }
            }
        }
    }
    Config::default()
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("EMLSTAMP_CONFIG") {
        return Some(PathBuf::from(env_path));
    }
    dirs::config_dir().map(|d| d.join("emlstamp").join("config.toml"))
}

/// Return the cache directory for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("emlstamp")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.general.log_level, "warn");
        assert_eq!(cfg.split.mailbox_extension, "mbox");
        assert_eq!(cfg.split.missing_date, MissingDatePolicy::MinimumDate);
        assert_eq!(cfg.split.boundary, BoundaryStyle::FromLine);
        assert_eq!(cfg.retouch.message_extension, "eml");
        assert!(cfg.retouch.skip_prefixed);
    }

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let parsed: Config = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.split.max_subject_len, cfg.split.max_subject_len);
        assert_eq!(parsed.split.missing_date, cfg.split.missing_date);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let partial = r#"
[split]
missing_date = "unsorted"
boundary = "strict"
"#;
        let cfg: Config = toml::from_str(partial).expect("parse partial");
        assert_eq!(cfg.split.missing_date, MissingDatePolicy::Unsorted);
        assert_eq!(cfg.split.boundary, BoundaryStyle::Strict);
        assert_eq!(cfg.split.mailbox_extension, "mbox");
        assert_eq!(cfg.retouch.message_extension, "eml");
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let bad = "[split]\nmissing_date = \"guess\"\n";
        assert!(toml::from_str::<Config>(bad).is_err());
    }
}
