//! Configuration file loading with precedence handling.

use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

use super::{CompensationAnchor, LayoutSettings};
use crate::model::geometry::{EdgeInsets, Size};

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Failed to read config file (file may not exist or have permission issues).
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Config file contains invalid TOML syntax or unknown keys.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// Path with invalid TOML.
        path: PathBuf,
        /// Parse error details.
        reason: String,
    },
}

/// TOML configuration file structure.
///
/// All fields are optional - if not specified, hardcoded defaults are used.
/// Corresponds to `~/.config/chat-layout/config.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,

    /// Layout settings overrides.
    #[serde(default)]
    pub layout: Option<LayoutSection>,
}

/// `[layout]` table. Each key overrides the matching default.
///
/// ```toml
/// [layout]
/// inter_item_spacing = 7.0
/// compensation_anchor = "bottom"
/// estimated_item_size = { width = 300.0, height = 40.0 }
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LayoutSection {
    /// Estimated size for auto-sized elements.
    #[serde(default)]
    pub estimated_item_size: Option<Size>,
    /// Gap between cells.
    #[serde(default)]
    pub inter_item_spacing: Option<f64>,
    /// Gap between sections.
    #[serde(default)]
    pub inter_section_spacing: Option<f64>,
    /// Extra content insets.
    #[serde(default)]
    pub additional_insets: Option<EdgeInsets>,
    /// Compensation anchor edge.
    #[serde(default)]
    pub compensation_anchor: Option<CompensationAnchor>,
    /// Pin short content to the bottom.
    #[serde(default)]
    pub keep_content_at_bottom_of_visible_area: Option<bool>,
    /// Parallel reset threshold.
    #[serde(default)]
    pub parallel_reset_threshold: Option<usize>,
}

/// Resolved configuration after applying precedence rules.
///
/// Created by merging defaults, config file, env vars, and CLI args.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    /// Layout settings, already sanitized.
    pub settings: LayoutSettings,
    /// Path to log file for tracing output.
    pub log_file_path: PathBuf,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            settings: LayoutSettings::default(),
            log_file_path: default_log_path(),
        }
    }
}

/// Resolve default log file path.
///
/// Returns `~/.local/state/chat-layout/chat-layout.log` on Unix-like systems,
/// or appropriate platform path on other systems.
///
/// If state directory cannot be determined, falls back to current directory.
pub fn default_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        state_dir.join("chat-layout").join("chat-layout.log")
    } else {
        PathBuf::from("chat-layout.log")
    }
}

/// Load configuration file from a specific path.
///
/// Returns `Ok(None)` if file doesn't exist (not an error - use defaults).
/// Returns `Err` if file exists but cannot be read or parsed.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    // Missing file is not an error - use defaults
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let config: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(config))
}

/// Resolve default config file path.
///
/// Returns `~/.config/chat-layout/config.toml` on Unix, appropriate path on other platforms.
/// Returns `None` if home directory cannot be determined.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("chat-layout").join("config.toml"))
}

/// Load configuration with precedence handling.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument (like CLI `--config`)
/// 2. `CHAT_LAYOUT_CONFIG` environment variable
/// 3. Default path `~/.config/chat-layout/config.toml`
///
/// Missing config files are NOT errors - defaults are used.
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    if let Ok(env_path) = std::env::var("CHAT_LAYOUT_CONFIG") {
        return load_config_file(PathBuf::from(env_path));
    }

    if let Some(default_path) = default_config_path() {
        return load_config_file(default_path);
    }

    Ok(None)
}

/// Apply environment variable overrides to resolved config.
///
/// Checks for:
/// - `CHAT_LAYOUT_ANCHOR`: Override compensation anchor (ignored if unparseable)
pub fn apply_env_overrides(mut config: ResolvedConfig) -> ResolvedConfig {
    if let Ok(raw) = std::env::var("CHAT_LAYOUT_ANCHOR") {
        match raw.parse::<CompensationAnchor>() {
            Ok(anchor) => config.settings.compensation_anchor = anchor,
            Err(err) => tracing::warn!(%err, "Ignoring CHAT_LAYOUT_ANCHOR"),
        }
    }

    config
}

/// Merge config file into defaults to create resolved config.
///
/// For each field in `ConfigFile`, if `Some(value)`, use it; otherwise use default.
pub fn merge_config(config_file: Option<ConfigFile>) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();

    let Some(config) = config_file else {
        return defaults;
    };

    let base = defaults.settings;
    let layout = config.layout.unwrap_or_default();
    let settings = LayoutSettings {
        estimated_item_size: layout.estimated_item_size.unwrap_or(base.estimated_item_size),
        inter_item_spacing: layout.inter_item_spacing.unwrap_or(base.inter_item_spacing),
        inter_section_spacing: layout
            .inter_section_spacing
            .unwrap_or(base.inter_section_spacing),
        additional_insets: layout.additional_insets.unwrap_or(base.additional_insets),
        compensation_anchor: layout.compensation_anchor.unwrap_or(base.compensation_anchor),
        keep_content_at_bottom_of_visible_area: layout
            .keep_content_at_bottom_of_visible_area
            .unwrap_or(base.keep_content_at_bottom_of_visible_area),
        parallel_reset_threshold: layout
            .parallel_reset_threshold
            .unwrap_or(base.parallel_reset_threshold),
    }
    .sanitized();

    ResolvedConfig {
        settings,
        log_file_path: config.log_file_path.unwrap_or(defaults.log_file_path),
    }
}

/// Apply CLI argument overrides to resolved config.
///
/// CLI args have the highest precedence and override all other sources.
/// Only applies overrides for flags that were explicitly set by the user.
///
/// Precedence chain: Defaults → Config File → Env Vars → CLI Args (highest)
pub fn apply_cli_overrides(
    mut config: ResolvedConfig,
    anchor_override: Option<CompensationAnchor>,
    log_file_override: Option<PathBuf>,
) -> ResolvedConfig {
    if let Some(anchor) = anchor_override {
        config.settings.compensation_anchor = anchor;
    }

    if let Some(path) = log_file_override {
        config.log_file_path = path;
    }

    config
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
