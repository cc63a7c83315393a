//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$MAILSHRINK_CONFIG` (environment variable)
//! 2. `~/.config/mailshrink/config.toml` (Linux/macOS)
//!    `%APPDATA%\mailshrink\config.toml` (Windows)
//! 3. Built-in defaults

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::reduce::reducer::{
    ReducerConfig, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_TOTAL_SIZE_MB, DEFAULT_REDUCTION_FACTOR,
};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Size budget and resize tuning.
    pub limits: LimitsConfig,
    /// Where resized files go.
    pub files: FilesConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
}

/// Size budget and resize tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Total attachment budget in MB (default: 10, Postmark's limit).
    pub max_total_size_mb: f64,
    /// Resize rounds before giving up (default: 10).
    pub max_attempts: u32,
    /// Per-round scale of width and height (default: 0.98).
    pub reduction_factor: f64,
}

/// Where resized files go.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// Directory for resized copies (default: system temp dir).
    pub temp_dir: Option<PathBuf>,
    /// Keep intermediate files from earlier rounds (debugging aid).
    pub keep_intermediates: bool,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            log_level: "warn".to_string(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_total_size_mb: DEFAULT_MAX_TOTAL_SIZE_MB,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            reduction_factor: DEFAULT_REDUCTION_FACTOR,
        }
    }
}

impl Config {
    /// Reducer tuning described by this configuration.
    pub fn reducer_config(&self) -> ReducerConfig {
        ReducerConfig {
            max_total_size_mb: self.limits.max_total_size_mb,
            max_attempts: self.limits.max_attempts,
            reduction_factor: self.limits.reduction_factor,
            temp_dir: self.files.temp_dir.clone(),
            keep_intermediates: self.files.keep_intermediates,
        }
    }
}

// ── Load / save ─────────────────────────────────────────────────

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

/// Save configuration to the standard location.
pub fn save_config(config: &Config) -> anyhow::Result<PathBuf> {
    let path = config_file_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config file path"))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(&path, contents)?;
    tracing::info!(path = %path.display(), "Saved config");
    Ok(path)
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("MAILSHRINK_CONFIG") {
        return Some(PathBuf::from(env_path));
    }
    dirs::config_dir().map(|d| d.join("mailshrink").join("config.toml"))
}

/// Return the cache directory for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailshrink")
}

/// Return the log file path.
pub fn log_file_path(config: &Config) -> PathBuf {
    cache_dir(config).join("mailshrink.log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.general.log_level, "warn");
        assert_eq!(cfg.limits.max_total_size_mb, 10.0);
        assert_eq!(cfg.limits.max_attempts, 10);
        assert_eq!(cfg.limits.reduction_factor, 0.98);
        assert!(cfg.files.temp_dir.is_none());
        assert!(!cfg.files.keep_intermediates);
    }

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        let mut cfg = Config::default();
        cfg.limits.max_total_size_mb = 25.0;
        cfg.files.temp_dir = Some(PathBuf::from("/var/tmp/mail"));
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let parsed: Config = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.limits.max_total_size_mb, 25.0);
        assert_eq!(parsed.files.temp_dir, cfg.files.temp_dir);
        assert_eq!(parsed.general.log_level, cfg.general.log_level);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let partial = r#"
[limits]
max_total_size_mb = 20.0
reduction_factor = 0.9
"#;
        let cfg: Config = toml::from_str(partial).expect("parse partial");
        assert_eq!(cfg.limits.max_total_size_mb, 20.0);
        assert_eq!(cfg.limits.reduction_factor, 0.9);
        // Other fields use defaults
        assert_eq!(cfg.limits.max_attempts, 10);
        assert_eq!(cfg.general.log_level, "warn");
    }

    #[test]
    fn test_reducer_config_mirrors_sections() {
        let mut cfg = Config::default();
        cfg.limits.max_attempts = 3;
        cfg.files.keep_intermediates = true;
        let rc = cfg.reducer_config();
        assert_eq!(rc.max_attempts, 3);
        assert!(rc.keep_intermediates);
        assert_eq!(rc.max_total_size_mb, 10.0);
        assert!(rc.validate().is_ok());
    }

    #[test]
    fn test_log_file_under_cache_dir() {
        let mut cfg = Config::default();
        cfg.general.cache_dir = Some(PathBuf::from("/tmp/ms-cache"));
        assert_eq!(
            log_file_path(&cfg),
            PathBuf::from("/tmp/ms-cache/mailshrink.log")
        );
    }
}
