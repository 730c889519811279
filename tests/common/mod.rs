//! Shared fixtures for integration tests
//!
//! `GifBuilder` writes small GIF89a streams byte by byte so tests can
//! control disposal, delays, transparency and interlacing exactly.

#![allow(dead_code)]

use std::io::Cursor;

use image::{ImageOutputFormat, Rgba, RgbaImage};

/// One image block of a test GIF.
#[derive(Debug, Clone)]
pub struct FrameSpec {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
    /// Color indices in natural row order
    pub indices: Vec<u8>,
    pub disposal: u8,
    pub delay_cs: u16,
    pub transparent: Option<u8>,
    pub interlaced: bool,
}

impl FrameSpec {
    /// A frame covering `width` x `height` at the origin filled with `index`.
    pub fn filled(width: u16, height: u16, index: u8) -> Self {
        Self {
            left: 0,
            top: 0,
            width,
            height,
            indices: vec![index; width as usize * height as usize],
            disposal: 0,
            delay_cs: 10,
            transparent: None,
            interlaced: false,
        }
    }

    /// A frame that declares `width` x `height` but only carries `indices`,
    /// so its image data ends early.
    pub fn declared(width: u16, height: u16, indices: &[u8]) -> Self {
        Self { indices: indices.to_vec(), ..Self::filled(0, 0, 0) }.sized(width, height)
    }

    fn sized(mut self, width: u16, height: u16) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn at(mut self, left: u16, top: u16) -> Self {
        self.left = left;
        self.top = top;
        self
    }

    pub fn disposal(mut self, disposal: u8) -> Self {
        self.disposal = disposal;
        self
    }

    pub fn delay(mut self, delay_cs: u16) -> Self {
        self.delay_cs = delay_cs;
        self
    }

    pub fn transparent(mut self, index: u8) -> Self {
        self.transparent = Some(index);
        self
    }

    pub fn interlaced(mut self) -> Self {
        self.interlaced = true;
        self
    }
}

/// Builder for GIF89a byte streams with a global color table.
pub struct GifBuilder {
    width: u16,
    height: u16,
    colors: Vec<[u8; 3]>,
    bytes: Vec<u8>,
}

impl GifBuilder {
    pub fn new(width: u16, height: u16, colors: &[[u8; 3]]) -> Self {
        let mut builder = Self { width, height, colors: colors.to_vec(), bytes: Vec::new() };
        builder.write_header();
        builder
    }

    fn table_bits(&self) -> u8 {
        let mut bits = 1;
        while (1usize << bits) < self.colors.len() {
            bits += 1;
        }
        bits
    }

    fn write_header(&mut self) {
        let bits = self.table_bits();
        self.bytes.extend_from_slice(b"GIF89a");
        self.bytes.extend_from_slice(&self.width.to_le_bytes());
        self.bytes.extend_from_slice(&self.height.to_le_bytes());
        self.bytes.push(0x80 | 0x70 | (bits - 1));
        self.bytes.push(0);
        self.bytes.push(0);
        for i in 0..(1usize << bits) {
            let [r, g, b] = self.colors.get(i).copied().unwrap_or([0, 0, 0]);
            self.bytes.extend_from_slice(&[r, g, b]);
        }
    }

    /// Append a graphic control extension and an image block.
    pub fn frame(mut self, frame: &FrameSpec) -> Self {
        let pixels = frame.width as usize * frame.height as usize;
        assert!(frame.indices.len() <= pixels);
        assert!(!frame.interlaced || frame.indices.len() == pixels);

        let packed = (frame.disposal << 2) | u8::from(frame.transparent.is_some());
        self.bytes.extend_from_slice(&[0x21, 0xF9, 0x04, packed]);
        self.bytes.extend_from_slice(&frame.delay_cs.to_le_bytes());
        self.bytes.push(frame.transparent.unwrap_or(0));
        self.bytes.push(0);

        self.bytes.push(0x2C);
        for value in [frame.left, frame.top, frame.width, frame.height] {
            self.bytes.extend_from_slice(&value.to_le_bytes());
        }
        self.bytes.push(if frame.interlaced { 0x40 } else { 0 });

        let stream_indices = if frame.interlaced {
            interlace(&frame.indices, frame.width as usize, frame.height as usize)
        } else {
            frame.indices.clone()
        };

        let min_code_size = self.table_bits().max(2);
        self.bytes.push(min_code_size);
        let data = lzw_literals(&stream_indices, min_code_size);
        for chunk in data.chunks(255) {
            self.bytes.push(chunk.len() as u8);
            self.bytes.extend_from_slice(chunk);
        }
        self.bytes.push(0);
        self
    }

    /// Append a comment extension.
    pub fn comment(mut self, text: &str) -> Self {
        self.bytes.extend_from_slice(&[0x21, 0xFE]);
        for chunk in text.as_bytes().chunks(255) {
            self.bytes.push(chunk.len() as u8);
            self.bytes.extend_from_slice(chunk);
        }
        self.bytes.push(0);
        self
    }

    /// Finish with the trailer.
    pub fn build(mut self) -> Vec<u8> {
        self.bytes.push(0x3B);
        self.bytes
    }

    /// The stream so far, without a trailer.
    pub fn build_unterminated(self) -> Vec<u8> {
        self.bytes
    }
}

/// Reorder rows into the four-pass interlaced storage order.
fn interlace(indices: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(indices.len());
    for (start, step) in [(0, 8), (4, 8), (2, 4), (1, 2)] {
        for row in (start..height).step_by(step) {
            out.extend_from_slice(&indices[row * width..(row + 1) * width]);
        }
    }
    out
}

/// LZW-encode using literal codes only.
///
/// A clear code is emitted often enough that the decoder's table never
/// grows past the initial code width.
fn lzw_literals(indices: &[u8], min_code_size: u8) -> Vec<u8> {
    let clear = 1u16 << min_code_size;
    let end = clear + 1;
    let width = min_code_size + 1;
    let run = (clear - 2) as usize;

    let mut codes = vec![clear];
    for (i, &index) in indices.iter().enumerate() {
        if i > 0 && i % run == 0 {
            codes.push(clear);
        }
        codes.push(index as u16);
    }
    codes.push(end);

    let mut out = Vec::new();
    let mut acc: u32 = 0;
    let mut bits = 0;
    for code in codes {
        acc |= (code as u32) << bits;
        bits += width as u32;
        while bits >= 8 {
            out.push(acc as u8);
            acc >>= 8;
            bits -= 8;
        }
    }
    if bits > 0 {
        out.push(acc as u8);
    }
    out
}

/// Encode an image as PNG bytes.
pub fn png_bytes(image: &RgbaImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .expect("PNG encoding should succeed");
    bytes
}

/// A solid-color PNG.
pub fn solid_png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    png_bytes(&RgbaImage::from_pixel(width, height, Rgba(color)))
}

pub const RED: [u8; 3] = [255, 0, 0];
pub const GREEN: [u8; 3] = [0, 255, 0];
pub const BLUE: [u8; 3] = [0, 0, 255];
pub const WHITE: [u8; 3] = [255, 255, 255];
