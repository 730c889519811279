//! Inspect command implementation

use std::io::Cursor;
use std::path::Path;
use std::process::ExitCode;

use serde::Serialize;

use super::{EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};
use crate::decode::{self, normalize_delays, DelayStats, DisposalMethod, FrameRect, FrameStream};
use crate::error::ConvertError;

/// Structure of one GIF frame, without its pixels.
#[derive(Debug, Serialize)]
struct FrameSummary {
    rect: FrameRect,
    disposal: DisposalMethod,
    delay_cs: u16,
    delay_ms: u32,
    interlaced: bool,
    transparent_index: Option<u8>,
}

#[derive(Debug)]
struct GifSummary {
    width: u32,
    height: u32,
    frames: Vec<FrameSummary>,
    truncated: Option<ConvertError>,
}

impl GifSummary {
    fn read(bytes: &[u8]) -> Result<Self, ConvertError> {
        let mut stream = FrameStream::new(Cursor::new(bytes))?;
        let (width, height) = (stream.width(), stream.height());
        let mut frames = Vec::new();
        while let Some((frame, _)) = stream.next_frame()? {
            frames.push(FrameSummary {
                rect: frame.rect,
                disposal: frame.disposal,
                delay_cs: frame.delay_cs,
                delay_ms: frame.delay_ms(),
                interlaced: frame.interlaced,
                transparent_index: frame.transparent_index,
            });
        }

        let raw: Vec<u32> = frames.iter().map(|f| f.delay_ms).collect();
        for (frame, delay) in frames.iter_mut().zip(normalize_delays(&raw)) {
            frame.delay_ms = delay;
        }
        Ok(Self { width, height, frames, truncated: stream.into_truncated() })
    }

    fn delay_stats(&self) -> Option<DelayStats> {
        let delays: Vec<u32> = self.frames.iter().map(|f| f.delay_ms).collect();
        DelayStats::from_delays(&delays)
    }
}

/// Execute the inspect command
pub fn run_inspect(input: &Path, json: bool) -> ExitCode {
    let bytes = match std::fs::read(input) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error: Failed to read '{}': {}", input.display(), e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    if !decode::is_gif(&bytes) {
        return match decode::decode_still(&bytes) {
            Ok(image) => {
                if json {
                    let output = serde_json::json!({
                        "kind": "still",
                        "width": image.width(),
                        "height": image.height(),
                    });
                    println!("{}", serde_json::to_string_pretty(&output).unwrap_or_default());
                } else {
                    println!("Still image: {}x{}", image.width(), image.height());
                }
                ExitCode::from(EXIT_SUCCESS)
            }
            Err(e) => report_error(&e),
        };
    }

    let summary = match GifSummary::read(&bytes) {
        Ok(summary) => summary,
        Err(e) => return report_error(&e),
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&summary_json(&summary)).unwrap_or_default());
    } else {
        print_summary(&summary);
    }
    if let Some(ref err) = summary.truncated {
        eprintln!(
            "Warning: stream truncated after {} frame(s): {}",
            summary.frames.len(),
            err
        );
    }

    ExitCode::from(EXIT_SUCCESS)
}

fn report_error(e: &ConvertError) -> ExitCode {
    eprintln!("Error: {} ({})", e, e.kind());
    ExitCode::from(EXIT_ERROR)
}

fn print_summary(summary: &GifSummary) {
    println!(
        "GIF: {}x{}, {} frame(s)",
        summary.width,
        summary.height,
        summary.frames.len()
    );
    for (i, frame) in summary.frames.iter().enumerate() {
        let mut flags = Vec::new();
        if frame.interlaced {
            flags.push("interlaced".to_string());
        }
        if let Some(index) = frame.transparent_index {
            flags.push(format!("transparent={}", index));
        }
        println!(
            "  #{:<3} {}x{} at ({}, {})  disposal {}  delay {} ms{}",
            i,
            frame.rect.width,
            frame.rect.height,
            frame.rect.left,
            frame.rect.top,
            frame.disposal.code(),
            frame.delay_ms,
            if flags.is_empty() { String::new() } else { format!("  [{}]", flags.join(", ")) }
        );
    }
    if let Some(stats) = summary.delay_stats() {
        println!(
            "Delays: min {} ms, max {} ms, total {} ms",
            stats.min_ms, stats.max_ms, stats.total_ms
        );
    }
}

fn summary_json(summary: &GifSummary) -> serde_json::Value {
    serde_json::json!({
        "kind": "gif",
        "width": summary.width,
        "height": summary.height,
        "frames": summary.frames,
        "delay_stats": summary.delay_stats(),
        "truncated": summary.truncated.as_ref().map(|e| e.to_string()),
    })
}
