//! Running-canvas compositing of GIF frames.

use image::RgbaImage;

use super::gif::{DisposalMethod, FrameRect, GifFrame};
use crate::color::TRANSPARENT;

/// Holds the logical screen between frames and applies disposal rules.
///
/// The previous frame's disposal is applied just before the next frame is
/// drawn. For [`DisposalMethod::RestorePrevious`] the canvas is copied into
/// `saved` before the frame is drawn and swapped back in afterwards.
pub struct Compositor {
    canvas: RgbaImage,
    saved: Option<RgbaImage>,
    previous: Option<(FrameRect, DisposalMethod)>,
}

impl Compositor {
    /// A fully transparent screen.
    pub fn new(width: u32, height: u32) -> Self {
        Self { canvas: RgbaImage::from_pixel(width, height, TRANSPARENT), saved: None, previous: None }
    }

    /// Draw `frame` and return the resulting full screen.
    pub fn apply(&mut self, frame: &GifFrame) -> &RgbaImage {
        self.dispose_previous();

        if frame.disposal == DisposalMethod::RestorePrevious {
            self.saved = Some(self.canvas.clone());
        }

        let (right, bottom) = self.clip(frame.rect);
        for y in frame.rect.top..bottom {
            for x in frame.rect.left..right {
                let pixel = *frame.patch.get_pixel(x - frame.rect.left, y - frame.rect.top);
                if pixel[3] != 0 {
                    self.canvas.put_pixel(x, y, pixel);
                }
            }
        }

        self.previous = Some((frame.rect, frame.disposal));
        &self.canvas
    }

    /// The current screen.
    pub fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    fn dispose_previous(&mut self) {
        let Some((rect, disposal)) = self.previous.take() else {
            return;
        };
        match disposal {
            DisposalMethod::Unspecified | DisposalMethod::DoNotDispose => {}
            DisposalMethod::RestoreBackground => {
                let (right, bottom) = self.clip(rect);
                for y in rect.top..bottom {
                    for x in rect.left..right {
                        self.canvas.put_pixel(x, y, TRANSPARENT);
                    }
                }
            }
            DisposalMethod::RestorePrevious => {
                if let Some(saved) = self.saved.take() {
                    self.canvas = saved;
                }
            }
        }
    }

    /// Exclusive right/bottom edges of `rect` clipped to the screen.
    fn clip(&self, rect: FrameRect) -> (u32, u32) {
        let right = rect.left.saturating_add(rect.width).min(self.canvas.width());
        let bottom = rect.top.saturating_add(rect.height).min(self.canvas.height());
        (right, bottom)
    }
}
