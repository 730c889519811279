//! Configuration loading and discovery for `mksprite.toml`
//!
//! Provides functions to find, load, and merge configuration.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::schema::{MkspriteConfig, QuantizeKind, SizeMode};
use crate::dot_matrix::DotStyle;
use crate::palette::DistanceMetric;

/// File name looked up during discovery.
pub const CONFIG_FILE_NAME: &str = "mksprite.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse mksprite.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub size: Option<SizeMode>,
    pub factor: Option<f64>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub lock_aspect: Option<bool>,
    pub mode: Option<QuantizeKind>,
    pub dot_style: Option<DotStyle>,
    pub foreground: Option<String>,
    pub background: Option<String>,
    pub block_size: Option<i64>,
    /// Replaces all 15 palette colors
    pub palette: Option<Vec<String>>,
    /// Per-slot overrides applied after `palette`
    pub slots: Vec<(String, String)>,
    pub metric: Option<DistanceMetric>,
    pub sprite_kind: Option<String>,
    pub looping: Option<bool>,
    pub preview_scale: Option<u32>,
    pub strict: Option<bool>,
}

/// Find mksprite.toml by walking up from the current working directory.
///
/// Search order:
/// 1. Walk up from current directory looking for mksprite.toml
/// 2. Check XDG_CONFIG_HOME/mksprite/mksprite.toml (or ~/.config/mksprite/mksprite.toml)
pub fn find_config() -> Option<PathBuf> {
    if let Ok(cwd) = env::current_dir() {
        if let Some(path) = find_config_from(cwd) {
            return Some(path);
        }
    }
    find_xdg_config()
}

/// Find mksprite.toml in the XDG config directory.
pub fn find_xdg_config() -> Option<PathBuf> {
    let xdg_config = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok()?;

    let config_path = xdg_config.join("mksprite").join(CONFIG_FILE_NAME);
    config_path.exists().then_some(config_path)
}

/// Find mksprite.toml by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;
    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration.
///
/// With an explicit path the file must exist. Without one, the discovered
/// file is used, or the defaults if there is none.
pub fn load_config(path: Option<&Path>) -> Result<MkspriteConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => {
            tracing::debug!(path = %p.display(), "loading config");
            load_config_file(&p)
        }
        None => Ok(MkspriteConfig::default()),
    }
}

fn load_config_file(path: &Path) -> Result<MkspriteConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: MkspriteConfig = toml::from_str(&contents)?;
    check(&config)?;
    Ok(config)
}

/// Run validation and fold the errors into a [`ConfigError`].
pub fn check(config: &MkspriteConfig) -> Result<(), ConfigError> {
    let errors = config.validate();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()))
    }
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values. An explicit
/// `palette` replaces both the configured colors and builtin, and clears
/// configured slot overrides.
pub fn merge_cli_overrides(config: &mut MkspriteConfig, overrides: &CliOverrides) {
    if let Some(mode) = overrides.size {
        config.size.mode = mode;
    }
    if overrides.factor.is_some() {
        config.size.factor = overrides.factor;
    }
    if overrides.width.is_some() {
        config.size.width = overrides.width;
    }
    if overrides.height.is_some() {
        config.size.height = overrides.height;
    }
    if let Some(lock) = overrides.lock_aspect {
        config.size.lock_aspect = lock;
    }

    if let Some(mode) = overrides.mode {
        config.quantize.mode = mode;
    }
    if let Some(metric) = overrides.metric {
        config.quantize.metric = metric;
    }

    if let Some(style) = overrides.dot_style {
        config.dot_matrix.style = style;
    }
    if let Some(ref fg) = overrides.foreground {
        config.dot_matrix.foreground = fg.clone();
    }
    if let Some(ref bg) = overrides.background {
        config.dot_matrix.background = bg.clone();
    }
    if let Some(block_size) = overrides.block_size {
        config.dot_matrix.block_size = block_size;
    }

    if let Some(ref colors) = overrides.palette {
        config.palette.colors = Some(colors.clone());
        config.palette.builtin = None;
        config.palette.slots.clear();
    }
    for (slot, hex) in &overrides.slots {
        config.palette.slots.insert(slot.clone(), hex.clone());
    }

    if let Some(ref kind) = overrides.sprite_kind {
        config.output.sprite_kind = kind.clone();
    }
    if let Some(looping) = overrides.looping {
        config.output.looping = looping;
    }
    if let Some(scale) = overrides.preview_scale {
        config.output.preview_scale = scale;
    }
    if let Some(strict) = overrides.strict {
        config.output.strict = strict;
    }
}
