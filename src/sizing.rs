//! Output dimension planning
//!
//! Computes the target sprite size from the source size and a
//! [`SizingPolicy`]. Invalid inputs never fail: they fall back to the
//! original dimensions and are reported as [`Warning`]s.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, Warning};

/// MakeCode Arcade screen width.
pub const SCREEN_WIDTH: u32 = 160;

/// MakeCode Arcade screen height.
pub const SCREEN_HEIGHT: u32 = 120;

/// Width and height in pixels, both at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width: width.max(1), height: height.max(1) }
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Rule for deriving output dimensions from the source dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SizingPolicy {
    /// Keep the source size.
    Original,
    /// Multiply both dimensions by a factor.
    Scale(f64),
    /// Fit the screen width (160), preserving aspect ratio.
    #[default]
    FullWidth,
    /// Fit the screen height (120), preserving aspect ratio.
    FullHeight,
    /// Explicit size. A missing side is derived from the aspect ratio.
    ///
    /// `lock_aspect` is carried for hosts that keep two inputs in sync; when
    /// both sides are given the explicit values win.
    Custom { width: Option<i64>, height: Option<i64>, lock_aspect: bool },
}

/// Result of [`plan`].
#[derive(Debug, Clone, PartialEq)]
pub struct Planned {
    pub dims: Dimensions,
    pub warnings: Vec<Warning>,
}

/// Compute target dimensions for `original` under `policy`.
///
/// # Examples
///
/// ```
/// use mksprite::sizing::{plan, Dimensions, SizingPolicy};
///
/// let planned = plan(Dimensions::new(100, 50), SizingPolicy::FullWidth);
/// assert_eq!(planned.dims, Dimensions::new(160, 80));
/// assert!(planned.warnings.is_empty());
/// ```
pub fn plan(original: Dimensions, policy: SizingPolicy) -> Planned {
    let mut warnings = Vec::new();
    let w = original.width as f64;
    let h = original.height as f64;

    let (width, height) = match policy {
        SizingPolicy::Original => (w, h),
        SizingPolicy::Scale(factor) => {
            if factor.is_finite() && factor > 0.0 {
                (w * factor, h * factor)
            } else {
                warnings.push(Warning::new(
                    ErrorKind::InvalidSizingInput,
                    format!("invalid scale factor {}, using original size {}", factor, original),
                ));
                (w, h)
            }
        }
        SizingPolicy::FullWidth => {
            let factor = SCREEN_WIDTH as f64 / w;
            (SCREEN_WIDTH as f64, h * factor)
        }
        SizingPolicy::FullHeight => {
            let factor = SCREEN_HEIGHT as f64 / h;
            (w * factor, SCREEN_HEIGHT as f64)
        }
        SizingPolicy::Custom { width, height, lock_aspect: _ } => {
            let width = valid_custom("width", width, &mut warnings);
            let height = valid_custom("height", height, &mut warnings);
            match (width, height) {
                (Some(cw), Some(ch)) => (cw, ch),
                (Some(cw), None) => (cw, h * (cw / w)),
                (None, Some(ch)) => (w * (ch / h), ch),
                (None, None) => {
                    warnings.push(Warning::new(
                        ErrorKind::InvalidSizingInput,
                        format!("no usable custom width or height, using original size {}", original),
                    ));
                    (w, h)
                }
            }
        }
    };

    Planned { dims: Dimensions::new(round_dim(width), round_dim(height)), warnings }
}

/// Keep a custom side only if it is positive; flag present-but-invalid values.
fn valid_custom(side: &str, value: Option<i64>, warnings: &mut Vec<Warning>) -> Option<f64> {
    match value {
        Some(v) if v > 0 => Some(v as f64),
        Some(v) => {
            warnings.push(Warning::new(
                ErrorKind::InvalidSizingInput,
                format!("custom {} must be positive, got {}", side, v),
            ));
            None
        }
        None => None,
    }
}

fn round_dim(value: f64) -> u32 {
    let rounded = value.round();
    if rounded.is_finite() && rounded >= 1.0 {
        rounded.min(u32::MAX as f64) as u32
    } else {
        1
    }
}
