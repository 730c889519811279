//! Input decoding
//!
//! GIF bytes are handed to the frame stream in [`gif`]; everything else
//! goes through the `image` crate as a single still image.

mod composite;
pub mod gif;
mod lzw;
mod sub_block;

pub use composite::Compositor;
pub use gif::{
    extract, is_gif, normalize_delays, ComposedFrame, DelayStats, DisposalMethod, FrameRect,
    FrameStream, GifAnimation, GifDecoder, GifFrame, MAX_SCREEN_PIXELS,
};

use image::RgbaImage;
use tracing::debug;

use crate::error::ConvertError;

/// Decode non-GIF bytes as one still image.
pub fn decode_still(bytes: &[u8]) -> Result<RgbaImage, ConvertError> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| ConvertError::UnsupportedImageFormat(e.to_string()))?;
    debug!(width = image.width(), height = image.height(), "decoded still image");
    Ok(image.to_rgba8())
}
