//! MakeCode Arcade code generation
//!
//! Bitmaps are written in the engine's `img` literal format: one line per
//! row, one hex digit per cell, where `0` is transparent and `1`..`f` name
//! palette slots.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::convert::AnimationFrame;
use crate::grid::IndexGrid;
use crate::palette::slot_char;

/// Sprite kind used when none is configured.
pub const DEFAULT_SPRITE_KIND: &str = "Player";

/// Identifiers used in generated code.
///
/// Every generated variable name ends with `suffix` so that several pastes
/// into the same project do not collide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeNames {
    pub suffix: String,
    pub sprite_kind: String,
}

impl CodeNames {
    /// Names suffixed with the current UTC time.
    pub fn now(sprite_kind: impl Into<String>) -> Self {
        Self::at(Utc::now(), sprite_kind)
    }

    /// Names suffixed with the given time, e.g. `20240101T120000123Z`.
    pub fn at(time: DateTime<Utc>, sprite_kind: impl Into<String>) -> Self {
        Self {
            suffix: time.format("%Y%m%dT%H%M%S%3fZ").to_string(),
            sprite_kind: sprite_kind.into(),
        }
    }

    /// Names with a fixed suffix, for reproducible output.
    pub fn fixed(suffix: impl Into<String>, sprite_kind: impl Into<String>) -> Self {
        Self { suffix: suffix.into(), sprite_kind: sprite_kind.into() }
    }
}

impl Default for CodeNames {
    fn default() -> Self {
        Self::now(DEFAULT_SPRITE_KIND)
    }
}

/// Encode a grid as rows of hex digits joined by `\n`, without a trailing newline.
///
/// # Examples
///
/// ```
/// use mksprite::encoder::encode_grid;
/// use mksprite::grid::IndexGrid;
/// use mksprite::sizing::Dimensions;
///
/// let grid = IndexGrid::from_cells(Dimensions::new(3, 2), vec![0, 1, 15, 10, 2, 0]).unwrap();
/// assert_eq!(encode_grid(&grid), "01f\na20");
/// ```
pub fn encode_grid(grid: &IndexGrid) -> String {
    let width = grid.width() as usize;
    let height = grid.height() as usize;
    let mut out = String::with_capacity((width + 1) * height);
    for (y, row) in grid.rows().enumerate() {
        if y > 0 {
            out.push('\n');
        }
        out.extend(row.iter().map(|&slot| slot_char(slot)));
    }
    out
}

/// Wrap an encoded bitmap in a sprite declaration.
pub fn encode_sprite(bitmap: &str, names: &CodeNames) -> String {
    format!(
        "let mySprite{ts} = sprites.create(img`\n{bitmap}\n`, SpriteKind.{kind});\n",
        ts = names.suffix,
        bitmap = bitmap,
        kind = names.sprite_kind,
    )
}

/// Generate an animation: the frame list, the delay list, a sprite showing
/// the first frame and the call that runs the animation.
///
/// Delays are written in milliseconds and never below 1.
pub fn encode_animation(frames: &[AnimationFrame], names: &CodeNames, looping: bool) -> String {
    let ts = &names.suffix;
    let mut code = String::new();

    // Writing into a String cannot fail
    let _ = writeln!(code, "let animationFrames{} = [", ts);
    for (i, frame) in frames.iter().enumerate() {
        let separator = if i + 1 < frames.len() { "," } else { "" };
        let _ = writeln!(code, "    img`\n{}\n    `{}", encode_grid(&frame.grid), separator);
    }
    code.push_str("];\n");

    let delays: Vec<String> = frames.iter().map(|f| f.delay_ms.max(1).to_string()).collect();
    let _ = writeln!(code, "let frameDelays{} = [{}];", ts, delays.join(", "));
    let _ = writeln!(
        code,
        "let myAnimatedSprite{ts} = sprites.create(animationFrames{ts}[0], SpriteKind.{kind});",
        ts = ts,
        kind = names.sprite_kind,
    );
    let _ = writeln!(
        code,
        "animation.runImageAnimation(myAnimatedSprite{ts}, animationFrames{ts}, frameDelays{ts}, {looping});",
        ts = ts,
        looping = looping,
    );
    code
}
