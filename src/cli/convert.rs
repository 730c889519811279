//! Convert command implementation

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Args;

use super::{EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};
use crate::config::{self, CliOverrides, QuantizeKind, SizeMode};
use crate::convert::{convert_bytes_with_names, Conversion, ConvertedOutput};
use crate::dot_matrix::DotStyle;
use crate::encoder::CodeNames;
use crate::palette::DistanceMetric;
use crate::preview;

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input image (PNG, JPEG, BMP, ...) or GIF
    pub input: PathBuf,

    /// Write the code to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Config file (default: discovered mksprite.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Sizing mode
    #[arg(long, value_enum)]
    pub size: Option<SizeMode>,

    /// Scale factor for --size scale
    #[arg(long, allow_negative_numbers = true)]
    pub factor: Option<f64>,

    /// Width for --size custom
    #[arg(long, allow_negative_numbers = true)]
    pub width: Option<i64>,

    /// Height for --size custom
    #[arg(long, allow_negative_numbers = true)]
    pub height: Option<i64>,

    /// Derive a missing custom side from the aspect ratio
    #[arg(long)]
    pub lock_aspect: bool,

    /// Quantization mode
    #[arg(long, value_enum)]
    pub mode: Option<QuantizeKind>,

    /// Dot-matrix rendering style
    #[arg(long, value_enum)]
    pub dot_style: Option<DotStyle>,

    /// Dot-matrix foreground color
    #[arg(long, value_name = "HEX")]
    pub fg: Option<String>,

    /// Dot-matrix background color
    #[arg(long, value_name = "HEX")]
    pub bg: Option<String>,

    /// Dot-matrix block size
    #[arg(long, allow_negative_numbers = true)]
    pub block_size: Option<i64>,

    /// All 15 palette colors, comma separated
    #[arg(long, value_delimiter = ',', value_name = "HEX,...")]
    pub palette: Option<Vec<String>>,

    /// Override one palette slot (1-15 or 1-f), repeatable
    #[arg(long = "color", value_name = "SLOT=HEX", value_parser = parse_slot_assignment)]
    pub colors: Vec<(String, String)>,

    /// Color distance metric
    #[arg(long, value_enum)]
    pub metric: Option<DistanceMetric>,

    /// SpriteKind used in the generated code
    #[arg(long)]
    pub sprite_kind: Option<String>,

    /// Generate a non-looping animation
    #[arg(long)]
    pub no_loop: bool,

    /// Fixed identifier suffix instead of the current timestamp
    #[arg(long)]
    pub suffix: Option<String>,

    /// Also write a preview image (PNG for sprites, GIF for animations)
    #[arg(long)]
    pub preview: Option<PathBuf>,

    /// Integer scale of the preview image
    #[arg(long)]
    pub preview_scale: Option<u32>,

    /// Strict mode: treat warnings as errors
    #[arg(long)]
    pub strict: bool,

    /// Print a JSON summary
    #[arg(long)]
    pub json: bool,
}

impl ConvertArgs {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            size: self.size,
            factor: self.factor,
            width: self.width,
            height: self.height,
            lock_aspect: self.lock_aspect.then_some(true),
            mode: self.mode,
            dot_style: self.dot_style,
            foreground: self.fg.clone(),
            background: self.bg.clone(),
            block_size: self.block_size,
            palette: self.palette.clone(),
            slots: self.colors.clone(),
            metric: self.metric,
            sprite_kind: self.sprite_kind.clone(),
            looping: self.no_loop.then_some(false),
            preview_scale: self.preview_scale,
            strict: self.strict.then_some(true),
        }
    }
}

/// Parse `SLOT=HEX`.
fn parse_slot_assignment(s: &str) -> Result<(String, String), String> {
    let (slot, hex) = s
        .split_once('=')
        .ok_or_else(|| format!("expected SLOT=HEX, got '{}'", s))?;
    if config::parse_slot_key(slot.trim()).is_none() {
        return Err(format!("slot '{}' must be 1-15 or 1-f", slot));
    }
    Ok((slot.trim().to_string(), hex.trim().to_string()))
}

/// Execute the convert command
pub fn run_convert(args: &ConvertArgs) -> ExitCode {
    let mut cfg = match config::load_config(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };
    config::merge_cli_overrides(&mut cfg, &args.overrides());
    if let Err(e) = config::check(&cfg) {
        eprintln!("Error: {}", e);
        return ExitCode::from(EXIT_INVALID_ARGS);
    }
    let request = match cfg.to_request() {
        Ok(request) => request,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let bytes = match std::fs::read(&args.input) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error: Failed to read '{}': {}", args.input.display(), e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let names = match args.suffix {
        Some(ref suffix) => CodeNames::fixed(suffix.clone(), request.sprite_kind.clone()),
        None => CodeNames::now(request.sprite_kind.clone()),
    };

    let conversion = match convert_bytes_with_names(&bytes, &request, &names) {
        Ok(conversion) => conversion,
        Err(e) => {
            eprintln!("Error: {} ({})", e, e.kind());
            return ExitCode::from(EXIT_ERROR);
        }
    };

    for warning in &conversion.warnings {
        eprintln!("Warning: {}", warning);
    }
    if cfg.output.strict && !conversion.warnings.is_empty() {
        eprintln!("Error: {} warning(s) in strict mode", conversion.warnings.len());
        return ExitCode::from(EXIT_ERROR);
    }

    if let Some(ref path) = args.output {
        if let Err(e) = write_code(path, &conversion.code) {
            eprintln!("Error: Failed to write '{}': {}", path.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    }

    if let Some(ref path) = args.preview {
        if let Err(e) = preview::write_preview(
            &conversion,
            &request.palette,
            cfg.output.preview_scale,
            request.looping,
            path,
        ) {
            eprintln!("Error: Failed to write preview '{}': {}", path.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    }

    if args.json {
        let summary = summary_json(&args.input, args.output.as_deref(), &conversion);
        println!("{}", serde_json::to_string_pretty(&summary).unwrap_or_default());
    } else if let Some(ref path) = args.output {
        println!(
            "Wrote: {} ({}, {} frame(s))",
            path.display(),
            conversion.dims,
            conversion.frame_count()
        );
    } else {
        print!("{}", conversion.code);
    }

    ExitCode::from(EXIT_SUCCESS)
}

fn write_code(path: &Path, code: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, code)
}

fn summary_json(input: &Path, output: Option<&Path>, conversion: &Conversion) -> serde_json::Value {
    let mut summary = serde_json::json!({
        "input": input.display().to_string(),
        "width": conversion.dims.width,
        "height": conversion.dims.height,
        "frames": conversion.frame_count(),
        "warnings": conversion.warnings,
        "partial": conversion.partial,
    });
    if let ConvertedOutput::Animation(ref animation) = conversion.output {
        let delays: Vec<u32> = animation.frames.iter().map(|f| f.delay_ms).collect();
        summary["delays_ms"] = serde_json::json!(delays);
        summary["delay_stats"] = serde_json::json!(animation.stats);
    }
    match output {
        Some(path) => summary["output"] = serde_json::json!(path.display().to_string()),
        None => summary["code"] = serde_json::json!(conversion.code),
    }
    summary
}
