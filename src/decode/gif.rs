//! GIF stream parsing and frame extraction
//!
//! [`GifDecoder`] walks the block structure of a GIF87a/GIF89a stream and
//! yields one [`GifFrame`] per image descriptor: the decoded patch plus the
//! graphic control settings that applied to it. [`FrameStream`] pairs the
//! decoder with a [`Compositor`] and hands out one composited screen at a
//! time; [`extract`] collects the whole stream.
//!
//! Errors after at least one complete frame do not discard the frames that
//! were already produced; they are kept as the stream's truncation error.

use std::io::{self, Cursor, Read};

use image::{Rgba, RgbaImage};
use serde::Serialize;
use tracing::{debug, warn};

use super::composite::Compositor;
use super::lzw::LzwDecoder;
use super::sub_block::SubBlockReader;
use crate::color::TRANSPARENT;
use crate::error::ConvertError;

const EXTENSION_INTRODUCER: u8 = 0x21;
const IMAGE_SEPARATOR: u8 = 0x2C;
const TRAILER: u8 = 0x3B;
const GRAPHIC_CONTROL_LABEL: u8 = 0xF9;

/// Largest logical screen accepted, in pixels.
///
/// The compositor keeps the canvas and a restore snapshot, so this bounds
/// both at 512 MiB together.
pub const MAX_SCREEN_PIXELS: u64 = 1 << 26;

/// True if `bytes` starts with a GIF signature prefix.
pub fn is_gif(bytes: &[u8]) -> bool {
    bytes.starts_with(b"GIF8")
}

/// What happens to a frame's area before the next frame is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisposalMethod {
    /// 0: no disposal specified; content stays.
    Unspecified,
    /// 1: leave the frame in place.
    DoNotDispose,
    /// 2: clear the frame's rectangle to transparent.
    RestoreBackground,
    /// 3: restore the canvas as it was before the frame was drawn.
    RestorePrevious,
}

impl DisposalMethod {
    /// Decode the 3-bit disposal field. Reserved values 4-7 behave like 1.
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => DisposalMethod::Unspecified,
            2 => DisposalMethod::RestoreBackground,
            3 => DisposalMethod::RestorePrevious,
            _ => DisposalMethod::DoNotDispose,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            DisposalMethod::Unspecified => 0,
            DisposalMethod::DoNotDispose => 1,
            DisposalMethod::RestoreBackground => 2,
            DisposalMethod::RestorePrevious => 3,
        }
    }
}

/// Position and size of a frame patch on the logical screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FrameRect {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

/// One image block of the stream with its graphic control settings.
#[derive(Debug, Clone, PartialEq)]
pub struct GifFrame {
    /// Area drawn on the screen; the declared rectangle clipped to it.
    pub rect: FrameRect,
    pub disposal: DisposalMethod,
    /// Delay in hundredths of a second.
    pub delay_cs: u16,
    pub transparent_index: Option<u8>,
    pub interlaced: bool,
    /// Decoded pixels of `rect`; transparent where the index was transparent
    /// or the data ran short.
    pub patch: RgbaImage,
}

impl GifFrame {
    /// Raw delay in milliseconds.
    pub fn delay_ms(&self) -> u32 {
        self.delay_cs as u32 * 10
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct GraphicControl {
    disposal: u8,
    delay_cs: u16,
    transparent_index: Option<u8>,
}

type ColorTable = Vec<[u8; 3]>;

/// Block-level GIF reader.
pub struct GifDecoder<R> {
    reader: R,
    width: u32,
    height: u32,
    global_table: Option<ColorTable>,
    pending_control: Option<GraphicControl>,
    finished: bool,
}

impl<R: Read> GifDecoder<R> {
    /// Read the header, logical screen descriptor and global color table.
    pub fn new(mut reader: R) -> Result<Self, ConvertError> {
        let mut signature = [0u8; 6];
        reader.read_exact(&mut signature).map_err(|e| stream_error("header", e))?;
        if &signature != b"GIF89a" && &signature != b"GIF87a" {
            return Err(ConvertError::malformed(format!(
                "bad signature {:?}",
                String::from_utf8_lossy(&signature)
            )));
        }

        let mut lsd = [0u8; 7];
        reader.read_exact(&mut lsd).map_err(|e| stream_error("logical screen descriptor", e))?;
        let width = u16::from_le_bytes([lsd[0], lsd[1]]) as u32;
        let height = u16::from_le_bytes([lsd[2], lsd[3]]) as u32;
        let packed = lsd[4];
        if width == 0 || height == 0 {
            return Err(ConvertError::malformed(format!(
                "logical screen is {}x{}",
                width, height
            )));
        }
        if width as u64 * height as u64 > MAX_SCREEN_PIXELS {
            return Err(ConvertError::UnsupportedImageFormat(format!(
                "logical screen {}x{} exceeds {} pixels",
                width, height, MAX_SCREEN_PIXELS
            )));
        }

        let global_table = if packed & 0b1000_0000 != 0 {
            let size = 1usize << ((packed & 0b0000_0111) + 1);
            Some(read_color_table(&mut reader, size, "global color table")?)
        } else {
            None
        };

        debug!(width, height, global_colors = global_table.as_ref().map_or(0, Vec::len), "GIF header");

        Ok(Self { reader, width, height, global_table, pending_control: None, finished: false })
    }

    /// Logical screen width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Logical screen height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Read blocks up to and including the next image.
    ///
    /// Returns `Ok(None)` once the trailer has been read.
    pub fn next_frame(&mut self) -> Result<Option<GifFrame>, ConvertError> {
        if self.finished {
            return Ok(None);
        }

        loop {
            let mut introducer = [0u8; 1];
            self.reader.read_exact(&mut introducer).map_err(|e| stream_error("block introducer", e))?;

            match introducer[0] {
                IMAGE_SEPARATOR => return self.read_image().map(Some),
                EXTENSION_INTRODUCER => self.read_extension()?,
                TRAILER => {
                    self.finished = true;
                    return Ok(None);
                }
                other => {
                    return Err(ConvertError::malformed(format!(
                        "unexpected block introducer 0x{:02X}",
                        other
                    )))
                }
            }
        }
    }

    fn read_extension(&mut self) -> Result<(), ConvertError> {
        let mut label = [0u8; 1];
        self.reader.read_exact(&mut label).map_err(|e| stream_error("extension label", e))?;

        let mut blocks = SubBlockReader::new(&mut self.reader);
        if label[0] == GRAPHIC_CONTROL_LABEL {
            let mut payload = Vec::new();
            blocks
                .read_to_end(&mut payload)
                .map_err(|e| stream_error("graphic control extension", e))?;
            if payload.len() < 4 {
                return Err(ConvertError::malformed(format!(
                    "graphic control extension has {} bytes, expected 4",
                    payload.len()
                )));
            }
            let packed = payload[0];
            self.pending_control = Some(GraphicControl {
                disposal: (packed >> 2) & 0b0000_0111,
                delay_cs: u16::from_le_bytes([payload[1], payload[2]]),
                transparent_index: (packed & 0b0000_0001 != 0).then_some(payload[3]),
            });
        } else {
            // Application, comment and plain text extensions carry nothing we render
            debug!(label = label[0], "skipping extension");
            blocks.drain().map_err(|e| stream_error("extension data", e))?;
        }
        Ok(())
    }

    fn read_image(&mut self) -> Result<GifFrame, ConvertError> {
        let mut descriptor = [0u8; 9];
        self.reader
            .read_exact(&mut descriptor)
            .map_err(|e| stream_error("image descriptor", e))?;
        let declared = FrameRect {
            left: u16::from_le_bytes([descriptor[0], descriptor[1]]) as u32,
            top: u16::from_le_bytes([descriptor[2], descriptor[3]]) as u32,
            width: u16::from_le_bytes([descriptor[4], descriptor[5]]) as u32,
            height: u16::from_le_bytes([descriptor[6], descriptor[7]]) as u32,
        };
        let packed = descriptor[8];
        let interlaced = packed & 0b0100_0000 != 0;

        if declared.left >= self.width || declared.top >= self.height {
            return Err(ConvertError::malformed(format!(
                "frame at ({}, {}) starts outside the {}x{} screen",
                declared.left, declared.top, self.width, self.height
            )));
        }
        let rect = FrameRect {
            width: declared.width.min(self.width - declared.left),
            height: declared.height.min(self.height - declared.top),
            ..declared
        };
        if rect != declared {
            debug!(
                declared_width = declared.width,
                declared_height = declared.height,
                width = rect.width,
                height = rect.height,
                "frame clipped to screen"
            );
        }

        let local_table = if packed & 0b1000_0000 != 0 {
            let size = 1usize << ((packed & 0b0000_0111) + 1);
            Some(read_color_table(&mut self.reader, size, "local color table")?)
        } else {
            None
        };

        let mut min_code_size = [0u8; 1];
        self.reader
            .read_exact(&mut min_code_size)
            .map_err(|e| stream_error("LZW minimum code size", e))?;

        let control = self.pending_control.take().unwrap_or_default();
        let table = local_table
            .or_else(|| self.global_table.clone())
            .ok_or_else(|| ConvertError::malformed("image has no color table"))?;

        let patch = {
            let blocks = SubBlockReader::new(&mut self.reader);
            let mut lzw = LzwDecoder::new(blocks, min_code_size[0])
                .map_err(|e| stream_error("image data", e))?;
            let layout = PatchLayout { declared, visible: rect, interlaced };
            let patch = decode_patch(&mut lzw, layout, &table, control.transparent_index)
                .map_err(|e| stream_error("image data", e))?;
            lzw.into_inner().drain().map_err(|e| stream_error("image data", e))?;
            patch
        };

        Ok(GifFrame {
            rect,
            disposal: DisposalMethod::from_code(control.disposal),
            delay_cs: control.delay_cs,
            transparent_index: control.transparent_index,
            interlaced,
            patch,
        })
    }
}

fn read_color_table<R: Read>(reader: &mut R, size: usize, what: &str) -> Result<ColorTable, ConvertError> {
    let mut buffer = vec![0u8; size * 3];
    reader.read_exact(&mut buffer).map_err(|e| stream_error(what, e))?;
    Ok(buffer.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect())
}

fn stream_error(what: &str, err: io::Error) -> ConvertError {
    match err.kind() {
        io::ErrorKind::UnexpectedEof => {
            ConvertError::malformed(format!("unexpected end of stream in {}", what))
        }
        _ => ConvertError::malformed(format!("{}: {}", what, err)),
    }
}

/// Order in which rows are stored: identity, or the four GIF interlace passes.
pub fn row_order(height: u32, interlaced: bool) -> Vec<u32> {
    if !interlaced {
        return (0..height).collect();
    }
    let mut order = Vec::with_capacity(height as usize);
    for (start, step) in [(0, 8), (4, 8), (2, 4), (1, 2)] {
        order.extend((start..height).step_by(step));
    }
    order
}

#[derive(Debug, Clone, Copy)]
struct PatchLayout {
    declared: FrameRect,
    visible: FrameRect,
    interlaced: bool,
}

/// Decode image data one stored row at a time into a patch of the visible
/// size. Pixels outside the screen are read and dropped.
fn decode_patch<R: Read>(
    lzw: &mut LzwDecoder<R>,
    layout: PatchLayout,
    table: &[[u8; 3]],
    transparent_index: Option<u8>,
) -> io::Result<RgbaImage> {
    let PatchLayout { declared, visible, interlaced } = layout;
    let mut patch = RgbaImage::from_pixel(visible.width, visible.height, TRANSPARENT);
    if declared.width == 0 {
        return Ok(patch);
    }

    let mut row = vec![0u8; declared.width as usize];
    for y in row_order(declared.height, interlaced) {
        let decoded = lzw.decode(&mut row)?;
        if y < visible.height {
            let shown = decoded.min(visible.width as usize);
            for (x, &index) in row[..shown].iter().enumerate() {
                if let Some(pixel) = index_color(index, table, transparent_index) {
                    patch.put_pixel(x as u32, y, pixel);
                }
            }
        }
        if decoded < row.len() {
            debug!(row = y, decoded, expected = row.len(), "image data ended early");
            break;
        }
    }
    Ok(patch)
}

/// Color of a palette index, `None` when it is transparent or outside the table.
fn index_color(index: u8, table: &[[u8; 3]], transparent_index: Option<u8>) -> Option<Rgba<u8>> {
    if Some(index) == transparent_index {
        return None;
    }
    table.get(index as usize).map(|&[r, g, b]| Rgba([r, g, b, 255]))
}

/// A decoded frame together with the full screen after compositing it.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedFrame {
    pub frame: GifFrame,
    pub canvas: RgbaImage,
}

/// Minimum, maximum and total frame delay in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DelayStats {
    pub min_ms: u32,
    pub max_ms: u32,
    pub total_ms: u64,
}

impl DelayStats {
    /// Statistics of already normalized delays, `None` when there are none.
    pub fn from_delays(delays: &[u32]) -> Option<Self> {
        Some(DelayStats {
            min_ms: *delays.iter().min()?,
            max_ms: *delays.iter().max()?,
            total_ms: delays.iter().map(|&d| d as u64).sum(),
        })
    }
}

/// Playback delays from raw frame delays in milliseconds.
///
/// Frames without a delay take the smallest nonzero delay of the
/// animation. The result is never below 1.
pub fn normalize_delays(raw_ms: &[u32]) -> Vec<u32> {
    let min_nonzero = raw_ms.iter().copied().filter(|&ms| ms > 0).min().unwrap_or(0);
    raw_ms
        .iter()
        .map(|&ms| if ms == 0 { min_nonzero } else { ms })
        .map(|ms| ms.max(1))
        .collect()
}

/// Decodes frames and composites them onto the screen one at a time.
///
/// Only the running canvas (plus a restore snapshot) is held between
/// frames. A stream error after the first frame ends the iteration and is
/// kept in [`FrameStream::truncated`].
pub struct FrameStream<R> {
    decoder: GifDecoder<R>,
    compositor: Compositor,
    frames_read: usize,
    truncated: Option<ConvertError>,
}

impl<R: Read> FrameStream<R> {
    /// Read the stream header; fails if it is not a usable GIF.
    pub fn new(reader: R) -> Result<Self, ConvertError> {
        let decoder = GifDecoder::new(reader)?;
        let compositor = Compositor::new(decoder.width(), decoder.height());
        Ok(Self { decoder, compositor, frames_read: 0, truncated: None })
    }

    /// Logical screen width.
    pub fn width(&self) -> u32 {
        self.decoder.width()
    }

    /// Logical screen height.
    pub fn height(&self) -> u32 {
        self.decoder.height()
    }

    /// The next frame and the full screen after drawing it.
    ///
    /// Returns `Ok(None)` at the trailer or after a truncation.
    pub fn next_frame(&mut self) -> Result<Option<(GifFrame, &RgbaImage)>, ConvertError> {
        if self.truncated.is_some() {
            return Ok(None);
        }
        match self.decoder.next_frame() {
            Ok(Some(frame)) => {
                debug!(
                    index = self.frames_read,
                    left = frame.rect.left,
                    top = frame.rect.top,
                    width = frame.rect.width,
                    height = frame.rect.height,
                    disposal = frame.disposal.code(),
                    delay_cs = frame.delay_cs,
                    "GIF frame"
                );
                self.frames_read += 1;
                let canvas = self.compositor.apply(&frame);
                Ok(Some((frame, canvas)))
            }
            Ok(None) => Ok(None),
            Err(err) if self.frames_read > 0 => {
                warn!(frames = self.frames_read, error = %err, "GIF stream truncated");
                self.truncated = Some(err);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Number of frames handed out so far.
    pub fn frames_read(&self) -> usize {
        self.frames_read
    }

    /// Error that stopped the stream after at least one frame.
    pub fn truncated(&self) -> Option<&ConvertError> {
        self.truncated.as_ref()
    }

    pub fn into_truncated(self) -> Option<ConvertError> {
        self.truncated
    }
}

/// All frames of a GIF, composited in order.
#[derive(Debug, Clone)]
pub struct GifAnimation {
    pub width: u32,
    pub height: u32,
    pub frames: Vec<ComposedFrame>,
    /// Error that stopped extraction after at least one frame.
    pub truncated: Option<ConvertError>,
}

impl GifAnimation {
    /// Playback delay of every frame in milliseconds, see [`normalize_delays`].
    pub fn delays_ms(&self) -> Vec<u32> {
        let raw: Vec<u32> = self.frames.iter().map(|f| f.frame.delay_ms()).collect();
        normalize_delays(&raw)
    }

    /// Aggregate delay statistics, `None` for an empty animation.
    pub fn delay_stats(&self) -> Option<DelayStats> {
        DelayStats::from_delays(&self.delays_ms())
    }
}

/// Decode and composite every frame of a GIF byte stream, keeping each
/// composited screen.
///
/// A stream that breaks before its first frame is an error; one that breaks
/// later returns the completed frames with [`GifAnimation::truncated`] set.
/// A well-formed stream without images yields an empty frame list.
pub fn extract(bytes: &[u8]) -> Result<GifAnimation, ConvertError> {
    let mut stream = FrameStream::new(Cursor::new(bytes))?;
    let (width, height) = (stream.width(), stream.height());
    let mut frames = Vec::new();
    while let Some((frame, canvas)) = stream.next_frame()? {
        frames.push(ComposedFrame { frame, canvas: canvas.clone() });
    }
    Ok(GifAnimation { width, height, frames, truncated: stream.into_truncated() })
}
