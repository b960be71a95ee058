//! Dashboard configuration — bundles, benchmark, provider settings.
//!
//! Stored as a TOML file. Every field has a default, so a missing file or a
//! partial file is fine; the defaults reproduce the three stock bundles.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::Bundle;

/// File name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "pledgeboard.toml";

/// Upper bound on `provider.max_retries`.
pub const MAX_RETRIES: u32 = 10;
/// Upper bound on `provider.base_delay_ms`.
pub const MAX_BASE_DELAY_MS: u64 = 60_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Which price table provider to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Yahoo,
    Csv,
    Synthetic,
}

impl std::str::FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yahoo" => Ok(ProviderKind::Yahoo),
            "csv" => Ok(ProviderKind::Csv),
            "synthetic" => Ok(ProviderKind::Synthetic),
            other => Err(ConfigError::Invalid(format!(
                "unknown provider '{other}' (expected yahoo, csv or synthetic)"
            ))),
        }
    }
}

/// Settings handed to the provider at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Wide price CSV (csv provider).
    pub prices_path: Option<PathBuf>,
    /// Long dividend CSV (csv provider).
    pub dividends_path: Option<PathBuf>,
    /// Last generated date (synthetic provider); defaults to today.
    pub synthetic_end: Option<NaiveDate>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Yahoo,
            max_retries: 3,
            base_delay_ms: 500,
            request_timeout_secs: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".into(),
            prices_path: None,
            dividends_path: None,
            synthetic_end: None,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// First date of every price fetch.
    pub start_date: NaiveDate,
    /// Reference symbol fetched alongside each bundle.
    pub benchmark: Option<String>,
    /// Multiplier applied to the summed latest prices for the cost estimate.
    pub markup: f64,
    /// Upper bound on any single price fetch.
    pub fetch_timeout_secs: u64,
    pub provider: ProviderConfig,
    pub bundles: Vec<Bundle>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(2010, 1, 1).unwrap_or_default(),
            benchmark: Some("SPY".into()),
            markup: 1.05,
            fetch_timeout_secs: 30,
            provider: ProviderConfig::default(),
            bundles: default_bundles(),
        }
    }
}

/// The stock catalog: three two-fund bundles with a 10,000 goal each.
pub fn default_bundles() -> Vec<Bundle> {
    vec![
        Bundle::new("Bundle 1", &["DBC", "GSG"], 10_000.0),
        Bundle::new("Bundle 2", &["GLD", "DIA"], 10_000.0),
        Bundle::new("Bundle 3", &["SPY", "GOVT"], 10_000.0),
    ]
}

impl AppConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Where to look for a config file when none is given explicitly:
    /// `./pledgeboard.toml`, then `<config_dir>/pledgeboard/config.toml`.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("pledgeboard").join("config.toml"));
        }
        paths
    }

    /// Load the explicit path, else the first existing search path, else defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        for path in Self::search_paths() {
            if path.is_file() {
                tracing::info!(path = %path.display(), "loading config");
                return Self::from_file(&path);
            }
        }
        tracing::debug!("no config file found, using defaults");
        Ok(Self::default())
    }

    /// Reject configs the dashboard cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.markup.is_finite() && self.markup > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "markup must be positive, got {}",
                self.markup
            )));
        }
        if self.provider.max_retries > MAX_RETRIES {
            return Err(ConfigError::Invalid(format!(
                "provider.max_retries must be at most {MAX_RETRIES}, got {}",
                self.provider.max_retries
            )));
        }
        if self.provider.base_delay_ms > MAX_BASE_DELAY_MS {
            return Err(ConfigError::Invalid(format!(
                "provider.base_delay_ms must be at most {MAX_BASE_DELAY_MS}, got {}",
                self.provider.base_delay_ms
            )));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::Invalid("fetch_timeout_secs must be at least 1".into()));
        }
        if self.bundles.is_empty() {
            return Err(ConfigError::Invalid("at least one bundle is required".into()));
        }
        if self.provider.kind == ProviderKind::Csv && self.provider.prices_path.is_none() {
            return Err(ConfigError::Invalid(
                "provider.kind = \"csv\" requires provider.prices_path".into(),
            ));
        }
        if matches!(&self.benchmark, Some(b) if b.trim().is_empty()) {
            return Err(ConfigError::Invalid("benchmark must not be blank".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let c = AppConfig::default();
        c.validate().unwrap();
        assert_eq!(c.bundles.len(), 3);
        assert_eq!(c.benchmark.as_deref(), Some("SPY"));
        assert_eq!(c.start_date, NaiveDate::from_ymd_opt(2010, 1, 1).unwrap());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let c = AppConfig::from_toml(
            r#"
            markup = 1.10

            [provider]
            kind = "synthetic"
            "#,
        )
        .unwrap();
        assert_eq!(c.markup, 1.10);
        assert_eq!(c.provider.kind, ProviderKind::Synthetic);
        assert_eq!(c.provider.max_retries, 3);
        assert_eq!(c.bundles.len(), 3);
    }

    #[test]
    fn bundles_from_toml() {
        let c = AppConfig::from_toml(
            r#"
            [[bundles]]
            name = "Bonds"
            symbols = ["GOVT", "SCHZ", "FBND"]
            goal = 25000.0
            "#,
        )
        .unwrap();
        assert_eq!(c.bundles.len(), 1);
        assert_eq!(c.bundles[0].symbols[2], "FBND");
    }

    #[test]
    fn csv_without_path_is_invalid() {
        let err = AppConfig::from_toml("[provider]\nkind = \"csv\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn retry_settings_are_bounded() {
        let err = AppConfig::from_toml("[provider]\nmax_retries = 40\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("max_retries")));
        let err = AppConfig::from_toml("[provider]\nbase_delay_ms = 600000\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("base_delay_ms")));
        AppConfig::from_toml("[provider]\nmax_retries = 10\n").unwrap();
    }

    #[test]
    fn non_positive_markup_is_invalid() {
        assert!(AppConfig::from_toml("markup = 0.0").is_err());
    }

    #[test]
    fn toml_roundtrip() {
        let c = AppConfig::default();
        let parsed = AppConfig::from_toml(&c.to_toml().unwrap()).unwrap();
        assert_eq!(c, parsed);
    }

    #[test]
    fn provider_kind_parses() {
        assert_eq!("Yahoo".parse::<ProviderKind>().unwrap(), ProviderKind::Yahoo);
        assert!("bloomberg".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = AppConfig::from_file(Path::new("/nonexistent/pledgeboard.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
