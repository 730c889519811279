//! Preview rendering of quantized output
//!
//! Grids are turned back into RGBA through the palette so the result of a
//! conversion can be inspected as a PNG (sprites) or an animated GIF.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::gif::{GifEncoder, Repeat};
use image::imageops::FilterType;
use image::{Delay, Frame, RgbaImage};
use thiserror::Error;

use crate::convert::{Conversion, ConvertedOutput};
use crate::grid::IndexGrid;
use crate::palette::Palette;

/// Error type for preview output
#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Paint a grid with the palette's colors. Slot 0 stays transparent.
pub fn render_grid(grid: &IndexGrid, palette: &Palette) -> RgbaImage {
    RgbaImage::from_fn(grid.width(), grid.height(), |x, y| palette.entry(grid.get(x, y)))
}

/// Scale an image by an integer factor with nearest-neighbor sampling.
///
/// Factors of 0 and 1 return the image unchanged.
pub fn scale_image(image: RgbaImage, factor: u32) -> RgbaImage {
    if factor <= 1 {
        return image;
    }
    let (w, h) = image.dimensions();
    image::imageops::resize(&image, w * factor, h * factor, FilterType::Nearest)
}

/// Save an RGBA image as PNG, creating parent directories.
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<(), PreviewError> {
    create_parent_dirs(path)?;
    image.save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}

/// Write frames as an animated GIF.
///
/// `delays_ms` pairs with `frames`; GIF stores centiseconds, so delays are
/// rounded down to a multiple of 10 with a floor of 10.
pub fn render_gif(
    frames: &[RgbaImage],
    delays_ms: &[u32],
    looping: bool,
    path: &Path,
) -> Result<(), PreviewError> {
    if frames.is_empty() {
        return Ok(());
    }
    create_parent_dirs(path)?;

    let writer = BufWriter::new(File::create(path)?);
    let mut encoder = GifEncoder::new(writer);
    // Without a loop extension viewers play the animation once
    if looping {
        encoder.set_repeat(Repeat::Infinite)?;
    }

    for (i, image) in frames.iter().enumerate() {
        let delay_ms = delays_ms.get(i).copied().unwrap_or(100);
        let delay_cs = (delay_ms / 10).max(1);
        let delay = Delay::from_numer_denom_ms(delay_cs * 10, 1);
        encoder.encode_frame(Frame::from_parts(image.clone(), 0, 0, delay))?;
    }
    Ok(())
}

/// Write a preview of a conversion: PNG for a sprite, GIF for an animation.
pub fn write_preview(
    conversion: &Conversion,
    palette: &Palette,
    scale: u32,
    looping: bool,
    path: &Path,
) -> Result<(), PreviewError> {
    match &conversion.output {
        ConvertedOutput::Sprite(grid) => save_png(&scale_image(render_grid(grid, palette), scale), path),
        ConvertedOutput::Animation(animation) => {
            let frames: Vec<RgbaImage> = animation
                .frames
                .iter()
                .map(|f| scale_image(render_grid(&f.grid, palette), scale))
                .collect();
            let delays: Vec<u32> = animation.frames.iter().map(|f| f.delay_ms).collect();
            render_gif(&frames, &delays, looping, path)
        }
    }
}

fn create_parent_dirs(path: &Path) -> Result<(), PreviewError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
