//! Configuration schema types for `mksprite.toml`
//!
//! Every section is optional; a missing file behaves like an empty one.

use std::collections::BTreeMap;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::color::parse_hex_rgb;
use crate::convert::{ConversionRequest, QuantizeMode};
use crate::dot_matrix::{DotMatrixOptions, DotStyle, MAX_BLOCK_SIZE};
use crate::encoder::DEFAULT_SPRITE_KIND;
use crate::error::ConvertError;
use crate::palette::{get_builtin, list_builtins, parse_palette, DistanceMetric, Palette};
use crate::sizing::SizingPolicy;

/// How output dimensions are chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SizeMode {
    /// Keep the source size
    Original,
    /// Multiply by `factor`
    Scale,
    /// 160 pixels wide, aspect preserved
    #[default]
    FullWidth,
    /// 120 pixels high, aspect preserved
    FullHeight,
    /// Explicit `width` and/or `height`
    Custom,
}

/// Quantization mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum QuantizeKind {
    /// Nearest palette color per pixel
    #[default]
    Solid,
    /// Two-color foreground/background approximation
    DotMatrix,
}

/// `[palette]` section
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PaletteConfig {
    /// Built-in palette name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builtin: Option<String>,
    /// The 15 colors of slots 1-f; takes precedence over `builtin`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
    /// Per-slot overrides keyed by slot number (`"1"`..`"15"`) or hex digit
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub slots: BTreeMap<String, String>,
}

/// `[size]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SizeConfig {
    #[serde(default)]
    pub mode: SizeMode,
    /// Scale factor for `mode = "scale"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factor: Option<f64>,
    /// Width for `mode = "custom"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<i64>,
    /// Height for `mode = "custom"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<i64>,
    /// Derive the missing side from the aspect ratio
    #[serde(default = "default_true")]
    pub lock_aspect: bool,
}

impl Default for SizeConfig {
    fn default() -> Self {
        Self { mode: SizeMode::default(), factor: None, width: None, height: None, lock_aspect: true }
    }
}

/// `[quantize]` section
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct QuantizeConfig {
    #[serde(default)]
    pub mode: QuantizeKind,
    #[serde(default)]
    pub metric: DistanceMetric,
}

/// `[dot_matrix]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DotMatrixConfig {
    #[serde(default)]
    pub style: DotStyle,
    #[serde(default = "default_foreground")]
    pub foreground: String,
    #[serde(default = "default_background")]
    pub background: String,
    /// Values below 1 are raised to 1 with a warning; values above
    /// `MAX_BLOCK_SIZE` are rejected
    #[serde(default = "default_block_size")]
    pub block_size: i64,
}

impl Default for DotMatrixConfig {
    fn default() -> Self {
        Self {
            style: DotStyle::default(),
            foreground: default_foreground(),
            background: default_background(),
            block_size: default_block_size(),
        }
    }
}

fn default_foreground() -> String {
    "#000000".to_string()
}

fn default_background() -> String {
    "#ffffff".to_string()
}

fn default_block_size() -> i64 {
    2
}

/// `[output]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    /// `SpriteKind` used in generated code
    #[serde(default = "default_sprite_kind")]
    pub sprite_kind: String,
    /// Loop generated animations
    #[serde(default = "default_true")]
    pub looping: bool,
    /// Scale factor for preview images
    #[serde(default = "default_preview_scale")]
    pub preview_scale: u32,
    /// Treat warnings as errors
    #[serde(default)]
    pub strict: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            sprite_kind: default_sprite_kind(),
            looping: true,
            preview_scale: default_preview_scale(),
            strict: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_sprite_kind() -> String {
    DEFAULT_SPRITE_KIND.to_string()
}

fn default_preview_scale() -> u32 {
    4
}

/// Complete mksprite.toml configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MkspriteConfig {
    #[serde(default)]
    pub palette: PaletteConfig,
    #[serde(default)]
    pub size: SizeConfig,
    #[serde(default)]
    pub quantize: QuantizeConfig,
    #[serde(default)]
    pub dot_matrix: DotMatrixConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "palette.colors")
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mksprite.toml: '{}' {}", self.field, self.message)
    }
}

/// Parse a slot key: decimal `1`-`15` or a single hex digit `1`-`f`.
pub fn parse_slot_key(key: &str) -> Option<u8> {
    let slot = key
        .parse::<u8>()
        .ok()
        .or_else(|| (key.len() == 1).then(|| u8::from_str_radix(key, 16).ok()).flatten())?;
    (1..=15).contains(&slot).then_some(slot)
}

impl MkspriteConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();
        let mut push = |field: String, message: String| errors.push(ConfigValidationError { field, message });

        if let Some(ref colors) = self.palette.colors {
            if let Err(e) = parse_palette(colors) {
                push("palette.colors".to_string(), e.to_string());
            }
        }
        if let Some(ref name) = self.palette.builtin {
            if get_builtin(name).is_none() {
                push(
                    "palette.builtin".to_string(),
                    format!("unknown palette '{}' (available: {})", name, list_builtins().join(", ")),
                );
            }
        }
        for (key, hex) in &self.palette.slots {
            let field = format!("palette.slots.{}", key);
            if parse_slot_key(key).is_none() {
                push(field.clone(), "slot must be 1-15".to_string());
            }
            if let Err(e) = parse_hex_rgb(hex) {
                push(field, format!("'{}': {}", hex, e));
            }
        }

        for (field, hex) in [
            ("dot_matrix.foreground", &self.dot_matrix.foreground),
            ("dot_matrix.background", &self.dot_matrix.background),
        ] {
            if let Err(e) = parse_hex_rgb(hex) {
                push(field.to_string(), format!("'{}': {}", hex, e));
            }
        }

        if self.dot_matrix.block_size > MAX_BLOCK_SIZE as i64 {
            push(
                "dot_matrix.block_size".to_string(),
                format!("{} is larger than {}", self.dot_matrix.block_size, MAX_BLOCK_SIZE),
            );
        }

        if self.output.sprite_kind.is_empty() {
            push("output.sprite_kind".to_string(), "must be a non-empty identifier".to_string());
        }
        if self.output.preview_scale == 0 {
            push("output.preview_scale".to_string(), "must be a positive integer".to_string());
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Resolve the palette: explicit colors, else the builtin, then slot overrides.
    pub fn resolve_palette(&self) -> Result<Palette, ConvertError> {
        let mut palette = match (&self.palette.colors, &self.palette.builtin) {
            (Some(colors), _) => parse_palette(colors)?,
            (None, Some(name)) => get_builtin(name).ok_or_else(|| {
                ConvertError::InvalidHexColor(format!("unknown builtin palette '{}'", name))
            })?,
            (None, None) => Palette::arcade(),
        };
        for (key, hex) in &self.palette.slots {
            let slot = parse_slot_key(key).ok_or_else(|| {
                ConvertError::InvalidHexColor(format!("slot '{}' is not assignable (expected 1-15)", key))
            })?;
            palette = palette.with_slot(slot, hex)?;
        }
        Ok(palette)
    }

    /// Sizing policy described by `[size]`. A missing scale factor counts
    /// as invalid and falls back to the original size when planned.
    pub fn sizing_policy(&self) -> SizingPolicy {
        match self.size.mode {
            SizeMode::Original => SizingPolicy::Original,
            SizeMode::Scale => SizingPolicy::Scale(self.size.factor.unwrap_or(f64::NAN)),
            SizeMode::FullWidth => SizingPolicy::FullWidth,
            SizeMode::FullHeight => SizingPolicy::FullHeight,
            SizeMode::Custom => SizingPolicy::Custom {
                width: self.size.width,
                height: self.size.height,
                lock_aspect: self.size.lock_aspect,
            },
        }
    }

    /// Build the immutable request used by the conversion pipeline.
    pub fn to_request(&self) -> Result<ConversionRequest, ConvertError> {
        let mode = match self.quantize.mode {
            QuantizeKind::Solid => QuantizeMode::Solid,
            QuantizeKind::DotMatrix => QuantizeMode::DotMatrix(DotMatrixOptions {
                foreground: parse_reference_color("foreground", &self.dot_matrix.foreground)?,
                background: parse_reference_color("background", &self.dot_matrix.background)?,
                // Non-positive sizes become 0, which the pipeline raises to 1
                block_size: self.dot_matrix.block_size.clamp(0, u32::MAX as i64) as u32,
                style: self.dot_matrix.style,
            }),
        };

        Ok(ConversionRequest {
            palette: self.resolve_palette()?,
            sizing: self.sizing_policy(),
            mode,
            metric: self.quantize.metric,
            looping: self.output.looping,
            sprite_kind: self.output.sprite_kind.clone(),
        })
    }
}

fn parse_reference_color(which: &str, hex: &str) -> Result<image::Rgba<u8>, ConvertError> {
    parse_hex_rgb(hex)
        .map_err(|e| ConvertError::InvalidHexColor(format!("dot-matrix {} '{}': {}", which, hex, e)))
}
