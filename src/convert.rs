//! The conversion pipeline
//!
//! [`convert_bytes`] runs the whole chain for one input file:
//!
//! 1. decode (still image, or GIF frames composited onto the logical screen)
//! 2. plan the target size
//! 3. resample each frame and quantize it, either directly against the
//!    palette or through the dot-matrix synthesizer
//! 4. encode sprite or animation code
//!
//! GIF frames are quantized as soon as they are composited, so only the
//! running canvas and the finished index grids stay in memory.
//!
//! Everything a conversion depends on is carried by an immutable
//! [`ConversionRequest`]; the functions here keep no state between calls.

use std::io::Cursor;

use image::RgbaImage;
use serde::Serialize;
use tracing::{debug, warn};

use crate::decode::{self, normalize_delays, DelayStats, FrameStream};
use crate::dot_matrix::{self, DotMatrixOptions, MAX_BLOCK_SIZE};
use crate::encoder::{self, CodeNames, DEFAULT_SPRITE_KIND};
use crate::error::{ConvertError, ErrorKind, Warning};
use crate::grid::IndexGrid;
use crate::palette::{DistanceMetric, Palette};
use crate::resample;
use crate::sizing::{self, Dimensions, SizingPolicy};

/// How sampled colors become palette slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuantizeMode {
    /// Nearest palette slot per cell.
    #[default]
    Solid,
    /// Two-color blend against a foreground and a background.
    DotMatrix(DotMatrixOptions),
}

/// Everything needed to convert one input.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub palette: Palette,
    pub sizing: SizingPolicy,
    pub mode: QuantizeMode,
    pub metric: DistanceMetric,
    /// Whether generated animations loop.
    pub looping: bool,
    /// `SpriteKind` member used in generated code.
    pub sprite_kind: String,
}

impl Default for ConversionRequest {
    fn default() -> Self {
        Self {
            palette: Palette::arcade(),
            sizing: SizingPolicy::default(),
            mode: QuantizeMode::Solid,
            metric: DistanceMetric::default(),
            looping: true,
            sprite_kind: DEFAULT_SPRITE_KIND.to_string(),
        }
    }
}

/// One quantized animation frame.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationFrame {
    pub grid: IndexGrid,
    /// Playback delay, at least 1.
    pub delay_ms: u32,
}

/// Quantized frames of an animation with their delay statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationResult {
    pub frames: Vec<AnimationFrame>,
    pub stats: DelayStats,
}

/// The quantized content behind the generated code.
#[derive(Debug, Clone, PartialEq)]
pub enum ConvertedOutput {
    Sprite(IndexGrid),
    Animation(AnimationResult),
}

/// Reported when a GIF broke after some frames were already converted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartialFailure {
    #[serde(serialize_with = "serialize_error")]
    pub error: ConvertError,
    pub frames_completed: usize,
}

fn serialize_error<S: serde::Serializer>(error: &ConvertError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// A finished conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub code: String,
    pub output: ConvertedOutput,
    /// Size of every output grid.
    pub dims: Dimensions,
    pub warnings: Vec<Warning>,
    pub partial: Option<PartialFailure>,
}

impl Conversion {
    /// Number of frames; 1 for a still sprite.
    pub fn frame_count(&self) -> usize {
        match &self.output {
            ConvertedOutput::Sprite(_) => 1,
            ConvertedOutput::Animation(animation) => animation.frames.len(),
        }
    }

    /// All output grids in order.
    pub fn grids(&self) -> Vec<&IndexGrid> {
        match &self.output {
            ConvertedOutput::Sprite(grid) => vec![grid],
            ConvertedOutput::Animation(animation) => animation.frames.iter().map(|f| &f.grid).collect(),
        }
    }
}

/// Convert raw file bytes, naming identifiers after the current time.
pub fn convert_bytes(bytes: &[u8], request: &ConversionRequest) -> Result<Conversion, ConvertError> {
    let names = CodeNames::now(request.sprite_kind.clone());
    convert_bytes_with_names(bytes, request, &names)
}

/// Convert raw file bytes with explicit identifier names.
///
/// Bytes starting with `GIF8` are always treated as an animation, even
/// when they contain a single frame.
pub fn convert_bytes_with_names(
    bytes: &[u8],
    request: &ConversionRequest,
    names: &CodeNames,
) -> Result<Conversion, ConvertError> {
    if decode::is_gif(bytes) {
        debug!(len = bytes.len(), "decoding GIF");
        return convert_gif(bytes, request, names);
    }
    let image = decode::decode_still(bytes)?;
    convert_still(&image, request, names)
}

/// Convert an already decoded still image into sprite code.
pub fn convert_image(image: &RgbaImage, request: &ConversionRequest) -> Result<Conversion, ConvertError> {
    let names = CodeNames::now(request.sprite_kind.clone());
    convert_still(image, request, &names)
}

fn convert_still(
    image: &RgbaImage,
    request: &ConversionRequest,
    names: &CodeNames,
) -> Result<Conversion, ConvertError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(ConvertError::UnsupportedImageFormat(format!(
            "image is {}x{}",
            image.width(),
            image.height()
        )));
    }

    let mut warnings = Vec::new();
    let target = plan_target(Dimensions::new(image.width(), image.height()), request, &mut warnings);
    let mode = effective_mode(request.mode, &mut warnings);

    let grid = quantize_frame(image, target, mode, &request.palette, request.metric);
    let code = encoder::encode_sprite(&encoder::encode_grid(&grid), names);

    Ok(Conversion {
        code,
        dims: grid.dims(),
        output: ConvertedOutput::Sprite(grid),
        warnings,
        partial: None,
    })
}

fn convert_gif(bytes: &[u8], request: &ConversionRequest, names: &CodeNames) -> Result<Conversion, ConvertError> {
    let mut stream = FrameStream::new(Cursor::new(bytes))?;

    let mut warnings = Vec::new();
    let target = plan_target(Dimensions::new(stream.width(), stream.height()), request, &mut warnings);
    let mode = effective_mode(request.mode, &mut warnings);

    let mut grids = Vec::new();
    let mut raw_delays = Vec::new();
    while let Some((frame, canvas)) = stream.next_frame()? {
        let grid = quantize_frame(canvas, target, mode, &request.palette, request.metric);
        debug!(index = grids.len(), delay_cs = frame.delay_cs, "quantized frame");
        raw_delays.push(frame.delay_ms());
        grids.push(grid);
    }
    if grids.is_empty() {
        return Err(ConvertError::EmptyFrameSequence);
    }

    let delays = normalize_delays(&raw_delays);
    let stats = DelayStats::from_delays(&delays).ok_or(ConvertError::EmptyFrameSequence)?;
    let frames: Vec<AnimationFrame> = grids
        .into_iter()
        .zip(delays)
        .map(|(grid, delay_ms)| AnimationFrame { grid, delay_ms })
        .collect();

    let partial = stream.into_truncated().map(|error| {
        let message = format!("GIF stream broke after {} frame(s): {}", frames.len(), error);
        warn!("{}", message);
        warnings.push(Warning::new(ErrorKind::MalformedGifStream, message));
        PartialFailure { error, frames_completed: frames.len() }
    });

    let code = encoder::encode_animation(&frames, names, request.looping);
    let dims = frames[0].grid.dims();

    Ok(Conversion {
        code,
        output: ConvertedOutput::Animation(AnimationResult { frames, stats }),
        dims,
        warnings,
        partial,
    })
}

/// Resample one full-resolution frame to `target` and quantize it.
///
/// In dot-matrix pattern mode the returned grid is `target` multiplied by
/// the block size.
pub fn quantize_frame(
    image: &RgbaImage,
    target: Dimensions,
    mode: QuantizeMode,
    palette: &Palette,
    metric: DistanceMetric,
) -> IndexGrid {
    match mode {
        QuantizeMode::Solid => resample::resample(image, target, palette, metric),
        QuantizeMode::DotMatrix(options) => {
            let cells = resample::sample(image, target);
            dot_matrix::synthesize(&cells, &options, palette, metric)
        }
    }
}

fn plan_target(original: Dimensions, request: &ConversionRequest, warnings: &mut Vec<Warning>) -> Dimensions {
    let planned = sizing::plan(original, request.sizing);
    for warning in &planned.warnings {
        warn!("{}", warning);
    }
    warnings.extend(planned.warnings);
    debug!(original = %original, target = %planned.dims, "planned size");
    planned.dims
}

fn effective_mode(mode: QuantizeMode, warnings: &mut Vec<Warning>) -> QuantizeMode {
    match mode {
        QuantizeMode::DotMatrix(mut options) if !(1..=MAX_BLOCK_SIZE).contains(&options.block_size) => {
            let clamped = options.block_size.clamp(1, MAX_BLOCK_SIZE);
            let warning = Warning::new(
                ErrorKind::InvalidSizingInput,
                format!("dot-matrix block size {} changed to {}", options.block_size, clamped),
            );
            warn!("{}", warning);
            warnings.push(warning);
            options.block_size = clamped;
            QuantizeMode::DotMatrix(options)
        }
        other => other,
    }
}
