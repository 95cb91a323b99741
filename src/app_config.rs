//! Application configuration loading for CLI defaults.
//!
//! Precedence: explicit CLI flags > config file > built-in defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use mod_downloader_core::CoreConfig;
use mod_downloader_core::config::MAX_CONCURRENCY;

use crate::cli::Args;

/// Flat `key = value` file configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileConfig {
    /// Default output directory for archives.
    pub output_dir: Option<PathBuf>,
    pub max_retries: Option<u32>,
    /// Delay between retry attempts, in seconds.
    pub retry_delay: Option<u64>,
    pub concurrent_downloads: Option<usize>,
    pub include_optional: Option<bool>,
    /// Default tracing level.
    pub log_level: Option<LogLevel>,
    /// Mod portal base URL (for mirrors of the portal).
    pub portal_base_url: Option<String>,
    /// Archive mirror base URL.
    pub download_base_url: Option<String>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(concurrency) = self.concurrent_downloads
            && !(1..=MAX_CONCURRENCY).contains(&concurrency)
        {
            bail!(
                "Invalid config value for `concurrent_downloads`: {concurrency}. \
                 Expected range: 1..={MAX_CONCURRENCY}"
            );
        }
        if let Some(retries) = self.max_retries
            && retries > 10
        {
            bail!("Invalid config value for `max_retries`: {retries}. Expected range: 0..=10");
        }
        if let Some(delay) = self.retry_delay
            && delay > 300
        {
            bail!("Invalid config value for `retry_delay`: {delay}. Expected range: 0..=300");
        }
        for (key, value) in [
            ("portal_base_url", &self.portal_base_url),
            ("download_base_url", &self.download_base_url),
        ] {
            if let Some(value) = value
                && url::Url::parse(value).is_err()
            {
                bail!("Invalid config value for `{key}`: '{value}'. Expected an absolute URL");
            }
        }
        Ok(())
    }

    /// Merges file values and explicit CLI flags over the library defaults.
    #[must_use]
    pub fn to_core_config(&self, args: &Args) -> CoreConfig {
        let defaults = CoreConfig::default();
        CoreConfig {
            max_retries: args
                .max_retries
                .map(u32::from)
                .or(self.max_retries)
                .unwrap_or(defaults.max_retries),
            retry_delay: args
                .retry_delay
                .or(self.retry_delay)
                .map_or(defaults.retry_delay, Duration::from_secs),
            concurrent_downloads: args
                .concurrency
                .map(usize::from)
                .or(self.concurrent_downloads)
                .unwrap_or(defaults.concurrent_downloads),
            default_output_path: args
                .output
                .clone()
                .or_else(|| self.output_dir.clone())
                .unwrap_or_else(|| defaults.default_output_path.clone()),
            include_optional: args.include_optional || self.include_optional.unwrap_or(false),
            include_optional_all: args.include_optional_all,
            resume: !args.no_resume,
            fail_fast: args.fail_fast,
            portal_base_url: self
                .portal_base_url
                .clone()
                .unwrap_or_else(|| defaults.portal_base_url.clone()),
            download_base_url: self
                .download_base_url
                .clone()
                .unwrap_or_else(|| defaults.download_base_url.clone()),
            ..defaults
        }
    }
}

/// Supported config log levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Returns the `EnvFilter` directive for this level.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Loaded config metadata.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config; defaults when no file exists.
    pub config: FileConfig,
    /// Indicates whether configuration was loaded from disk.
    pub loaded_from_file: bool,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/mod-downloader/config.toml`
/// 2. `$HOME/.config/mod-downloader/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("mod-downloader")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("mod-downloader")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from default path if present.
pub fn load_default_file_config() -> Result<LoadedConfig> {
    let path = resolve_default_config_path();
    let Some(path_ref) = path.as_deref().filter(|p| p.exists()) else {
        return Ok(LoadedConfig {
            path,
            ..LoadedConfig::default()
        });
    };

    let config = load_file_config(path_ref)?;
    Ok(LoadedConfig {
        path,
        config,
        loaded_from_file: true,
    })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_no = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_no}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let invalid = || format!("Invalid `{key}` value on line {line_no}");

        match key {
            "output_dir" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.output_dir = Some(PathBuf::from(parsed));
            }
            "max_retries" => {
                let parsed = parse_integer_u64(value).with_context(invalid)?;
                cfg.max_retries = Some(
                    u32::try_from(parsed)
                        .map_err(|_| anyhow::anyhow!("max_retries out of range for u32"))?,
                );
            }
            "retry_delay" => {
                cfg.retry_delay = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "concurrent_downloads" => {
                let parsed = parse_integer_u64(value).with_context(invalid)?;
                cfg.concurrent_downloads = Some(usize::try_from(parsed).map_err(|_| {
                    anyhow::anyhow!("concurrent_downloads out of range for usize")
                })?);
            }
            "include_optional" => {
                cfg.include_optional = Some(parse_boolean(value).with_context(invalid)?);
            }
            "log_level" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.log_level = Some(parse_log_level(&parsed).with_context(|| {
                    format!("Invalid `log_level` value '{parsed}' on line {line_no}")
                })?);
            }
            "portal_base_url" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.portal_base_url = Some(parsed.trim_end_matches('/').to_string());
            }
            "download_base_url" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.download_base_url = Some(parsed.trim_end_matches('/').to_string());
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_log_level(value: &str) -> Result<LogLevel> {
    match value {
        "error" => Ok(LogLevel::Error),
        "warn" => Ok(LogLevel::Warn),
        "info" => Ok(LogLevel::Info),
        "debug" => Ok(LogLevel::Debug),
        "trace" => Ok(LogLevel::Trace),
        _ => bail!("Expected one of: error, warn, info, debug, trace"),
    }
}

fn parse_boolean(raw_value: &str) -> Result<bool> {
    match raw_value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => bail!("Expected 'true' or 'false'"),
    }
}
