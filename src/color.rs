//! Color parsing and distance utilities
//!
//! Only the strict `#RRGGBB` form is accepted: every user-facing color in a
//! sprite conversion (palette slots, dot-matrix colors) is an opaque RGB value.

use image::Rgba;
use thiserror::Error;

/// Fully transparent black, the color of palette slot 0.
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Error type for color parsing failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    /// Input string was empty
    #[error("empty color string")]
    Empty,
    /// Input string doesn't start with '#'
    #[error("color must start with '#'")]
    MissingHash,
    /// Invalid length (must be exactly 6 hex chars after #)
    #[error("invalid color length {0}, expected 6")]
    InvalidLength(usize),
    /// Contains non-hex characters
    #[error("invalid hex character '{0}'")]
    InvalidHex(char),
}

/// Parse a `#RRGGBB` string into an opaque RGBA color.
///
/// Hex digits are case-insensitive; the leading `#` is required.
///
/// # Examples
///
/// ```
/// use mksprite::color::parse_hex_rgb;
///
/// let red = parse_hex_rgb("#FF0000").unwrap();
/// assert_eq!(red, image::Rgba([255, 0, 0, 255]));
///
/// assert!(parse_hex_rgb("#F00").is_err());
/// assert!(parse_hex_rgb("FF0000").is_err());
/// ```
pub fn parse_hex_rgb(s: &str) -> Result<Rgba<u8>, ColorError> {
    if s.is_empty() {
        return Err(ColorError::Empty);
    }
    let hex = s.strip_prefix('#').ok_or(ColorError::MissingHash)?;

    // Validate characters before length so "#12345g" reports the bad digit
    if let Some(c) = hex.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(ColorError::InvalidHex(c));
    }
    if hex.len() != 6 {
        return Err(ColorError::InvalidLength(hex.len()));
    }

    let r = parse_hex_pair(&hex[0..2])?;
    let g = parse_hex_pair(&hex[2..4])?;
    let b = parse_hex_pair(&hex[4..6])?;
    Ok(Rgba([r, g, b, 255]))
}

/// Format the RGB channels of a color as lowercase `#rrggbb`.
pub fn to_hex(color: Rgba<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", color[0], color[1], color[2])
}

/// Sum of absolute per-channel differences over r, g, b.
pub fn manhattan_distance(a: Rgba<u8>, b: Rgba<u8>) -> u32 {
    (0..3).map(|i| (a[i] as i32 - b[i] as i32).unsigned_abs()).sum()
}

/// Squared Euclidean distance over r, g, b.
pub fn euclidean_distance_sq(a: Rgba<u8>, b: Rgba<u8>) -> u32 {
    (0..3)
        .map(|i| {
            let d = a[i] as i32 - b[i] as i32;
            (d * d) as u32
        })
        .sum()
}

/// Euclidean distance over r, g, b.
pub fn euclidean_distance(a: Rgba<u8>, b: Rgba<u8>) -> f64 {
    (euclidean_distance_sq(a, b) as f64).sqrt()
}

/// Parse a single hex digit (0-9, A-F, a-f) to u8 (0-15)
fn parse_hex_digit(c: char) -> Result<u8, ColorError> {
    match c {
        '0'..='9' => Ok(c as u8 - b'0'),
        'a'..='f' => Ok(c as u8 - b'a' + 10),
        'A'..='F' => Ok(c as u8 - b'A' + 10),
        _ => Err(ColorError::InvalidHex(c)),
    }
}

/// Parse a two-character hex string to u8 (0-255)
fn parse_hex_pair(s: &str) -> Result<u8, ColorError> {
    let mut chars = s.chars();
    let high = chars.next().map(parse_hex_digit).ok_or(ColorError::InvalidLength(0))??;
    let low = chars.next().map(parse_hex_digit).ok_or(ColorError::InvalidLength(1))??;
    Ok(high * 16 + low)
}
