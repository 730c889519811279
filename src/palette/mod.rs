//! The fixed 16-slot MakeCode Arcade palette.
//!
//! Slot 0 is always transparent and never parsed from user input. Slots 1-15
//! are opaque RGB colors addressed by a single lowercase hex digit (`1`..`f`),
//! which is also the character used for the slot in encoded bitmaps.

mod matcher;

pub use matcher::{nearest, DistanceMetric};

use image::Rgba;

use crate::color::{parse_hex_rgb, to_hex, TRANSPARENT};
use crate::error::ConvertError;

/// Total number of slots, including the transparent slot 0.
pub const SLOT_COUNT: usize = 16;

/// Number of user-supplied colors (slots 1-15).
pub const USER_SLOT_COUNT: usize = 15;

/// Index of the transparent slot.
pub const TRANSPARENT_SLOT: u8 = 0;

/// Default MakeCode Arcade colors for slots 1-15.
const ARCADE: [&str; USER_SLOT_COUNT] = [
    "#ffffff", "#ff2121", "#ff93c4", "#ff8135", "#fff609", "#249ca3", "#78dc52", "#003fad",
    "#87f2ff", "#8e2ec4", "#a4839f", "#5c406c", "#e5cdc4", "#91463d", "#000000",
];

/// List of all available built-in palette names.
const BUILTIN_NAMES: &[&str] = &["arcade", "grayscale"];

/// An immutable 16-entry indexed color table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    slots: [Rgba<u8>; SLOT_COUNT],
}

impl Palette {
    /// The MakeCode Arcade default palette.
    pub fn arcade() -> Self {
        let mut slots = [TRANSPARENT; SLOT_COUNT];
        for (slot, hex) in slots[1..].iter_mut().zip(ARCADE) {
            // The table above is static and always well-formed
            *slot = parse_hex_rgb(hex).unwrap_or(TRANSPARENT);
        }
        Self { slots }
    }

    /// Fifteen evenly spaced grays from white to black.
    pub fn grayscale() -> Self {
        let mut slots = [TRANSPARENT; SLOT_COUNT];
        for (i, slot) in slots[1..].iter_mut().enumerate() {
            let v = 255 - ((i as u32 * 255) / 14) as u8;
            *slot = Rgba([v, v, v, 255]);
        }
        Self { slots }
    }

    /// Color stored in `slot`. Slot 0 is `{0,0,0,0}`.
    ///
    /// # Panics
    ///
    /// Panics if `slot >= 16`.
    pub fn entry(&self, slot: u8) -> Rgba<u8> {
        self.slots[slot as usize]
    }

    /// Iterate over the opaque slots as `(slot, color)` in ascending order.
    pub fn opaque_entries(&self) -> impl Iterator<Item = (u8, Rgba<u8>)> + '_ {
        self.slots.iter().enumerate().skip(1).map(|(i, c)| (i as u8, *c))
    }

    /// Return a copy with one opaque slot replaced.
    pub fn with_slot(&self, slot: u8, hex: &str) -> Result<Self, ConvertError> {
        if slot == TRANSPARENT_SLOT || slot as usize >= SLOT_COUNT {
            return Err(ConvertError::InvalidHexColor(format!(
                "slot {} is not assignable (expected 1-15)",
                slot
            )));
        }
        let color = parse_slot_color(slot, hex)?;
        let mut slots = self.slots;
        slots[slot as usize] = color;
        Ok(Self { slots })
    }

    /// The 15 user colors formatted as lowercase `#rrggbb`.
    pub fn to_hex_strings(&self) -> Vec<String> {
        self.opaque_entries().map(|(_, c)| to_hex(c)).collect()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::arcade()
    }
}

/// Build a palette from the 15 colors of slots 1-15.
///
/// # Errors
///
/// Returns [`ConvertError::InvalidHexColor`] if the count is not 15 or any
/// entry is not a `#RRGGBB` string.
///
/// # Examples
///
/// ```
/// use mksprite::palette::{parse_palette, Palette};
///
/// let hex = Palette::arcade().to_hex_strings();
/// let palette = parse_palette(&hex).unwrap();
/// assert_eq!(palette.entry(0)[3], 0);
/// assert_eq!(palette.entry(2), image::Rgba([0xff, 0x21, 0x21, 255]));
/// ```
pub fn parse_palette<S: AsRef<str>>(hex_strings: &[S]) -> Result<Palette, ConvertError> {
    if hex_strings.len() != USER_SLOT_COUNT {
        return Err(ConvertError::InvalidHexColor(format!(
            "expected {} palette colors, got {}",
            USER_SLOT_COUNT,
            hex_strings.len()
        )));
    }

    let mut slots = [TRANSPARENT; SLOT_COUNT];
    for (i, hex) in hex_strings.iter().enumerate() {
        let slot = (i + 1) as u8;
        slots[slot as usize] = parse_slot_color(slot, hex.as_ref())?;
    }
    Ok(Palette { slots })
}

/// Hex digit used for a slot in encoded bitmaps.
pub fn slot_char(slot: u8) -> char {
    char::from_digit(slot as u32 & 0x0f, 16).unwrap_or('0')
}

/// Returns a list of all available built-in palette names.
pub fn list_builtins() -> Vec<&'static str> {
    BUILTIN_NAMES.to_vec()
}

/// Returns a built-in palette by name, or None if not found.
pub fn get_builtin(name: &str) -> Option<Palette> {
    match name {
        "arcade" => Some(Palette::arcade()),
        "grayscale" => Some(Palette::grayscale()),
        _ => None,
    }
}

fn parse_slot_color(slot: u8, hex: &str) -> Result<Rgba<u8>, ConvertError> {
    parse_hex_rgb(hex).map_err(|e| {
        ConvertError::InvalidHexColor(format!("slot {}: '{}': {}", slot_char(slot), hex, e))
    })
}
