//! mksprite - Convert images and animated GIFs into MakeCode Arcade sprite code
//!
//! This library provides functionality to:
//! - Decode still images and composite GIF animations frame by frame
//! - Size and quantize pixels onto the 16-slot Arcade palette
//! - Emit `img` literals as sprite or animation declarations
//!
//! ```
//! use image::{Rgba, RgbaImage};
//! use mksprite::convert::{convert_image, ConversionRequest};
//! use mksprite::sizing::SizingPolicy;
//!
//! let image = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 255]));
//! let request = ConversionRequest { sizing: SizingPolicy::Original, ..Default::default() };
//! let conversion = convert_image(&image, &request).unwrap();
//! assert!(conversion.code.contains("\nff\n"));
//! ```

pub mod cli;
pub mod color;
pub mod config;
pub mod convert;
pub mod decode;
pub mod dot_matrix;
pub mod encoder;
pub mod error;
pub mod grid;
pub mod palette;
pub mod preview;
pub mod resample;
pub mod sizing;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use convert::{convert_bytes, Conversion, ConversionRequest};
pub use error::{ConvertError, ErrorKind, Warning};
pub use palette::Palette;
