//! Nearest-slot color matching.

use clap::ValueEnum;
use image::Rgba;
use serde::{Deserialize, Serialize};

use super::{Palette, TRANSPARENT_SLOT};
use crate::color::{euclidean_distance_sq, manhattan_distance};

/// Distance metric used to pick the nearest palette slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Sum of absolute r/g/b differences. Bit-exact with the MakeCode image tool.
    #[default]
    Manhattan,
    /// Straight-line distance in RGB space.
    Euclidean,
}

impl DistanceMetric {
    fn distance(self, a: Rgba<u8>, b: Rgba<u8>) -> u32 {
        match self {
            DistanceMetric::Manhattan => manhattan_distance(a, b),
            // Squared distance preserves ordering
            DistanceMetric::Euclidean => euclidean_distance_sq(a, b),
        }
    }
}

/// Find the palette slot closest to `pixel`.
///
/// Fully transparent pixels (`a == 0`) always map to slot 0. Otherwise slots
/// 1-15 are compared on r/g/b and the lowest slot wins a tie.
///
/// # Examples
///
/// ```
/// use mksprite::palette::{nearest, DistanceMetric, Palette};
///
/// let palette = Palette::arcade();
/// assert_eq!(nearest(image::Rgba([250, 30, 30, 255]), &palette, DistanceMetric::Manhattan), 2);
/// assert_eq!(nearest(image::Rgba([250, 30, 30, 0]), &palette, DistanceMetric::Manhattan), 0);
/// ```
pub fn nearest(pixel: Rgba<u8>, palette: &Palette, metric: DistanceMetric) -> u8 {
    if pixel[3] == 0 {
        return TRANSPARENT_SLOT;
    }

    let mut best_slot = 1;
    let mut best_distance = u32::MAX;
    for (slot, color) in palette.opaque_entries() {
        let distance = metric.distance(pixel, color);
        // Strict comparison keeps the first slot on ties
        if distance < best_distance {
            best_distance = distance;
            best_slot = slot;
            if distance == 0 {
                break;
            }
        }
    }
    best_slot
}
