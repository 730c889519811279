//! WASM API module for browser/JS interop
//!
//! Exposes the image-to-sprite conversion to a browser host. The host passes
//! the raw file bytes and a JSON object shaped like `mksprite.toml`.

use wasm_bindgen::prelude::*;

use crate::config::MkspriteConfig;
use crate::convert::convert_bytes;
use crate::error::ConvertError;
use crate::palette::Palette;

/// Error kind reported when the request JSON or its settings are invalid.
pub const INVALID_REQUEST: &str = "invalid-request";

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    #[cfg(feature = "wasm")]
    console_error_panic_hook::set_once();
}

/// Result of converting one image or GIF.
#[wasm_bindgen]
pub struct ConvertResult {
    code: String,
    width: u32,
    height: u32,
    frame_count: usize,
    warnings: Vec<String>,
    warning_kinds: Vec<String>,
    partial: Option<String>,
    error: Option<String>,
    error_kind: Option<String>,
}

#[wasm_bindgen]
impl ConvertResult {
    /// Generated MakeCode Arcade code, empty on error
    #[wasm_bindgen(getter)]
    pub fn code(&self) -> String {
        self.code.clone()
    }

    /// Width of the sprite in pixels
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the sprite in pixels
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of frames (1 for a still image)
    #[wasm_bindgen(getter)]
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Warnings raised during conversion
    #[wasm_bindgen(getter)]
    pub fn warnings(&self) -> Vec<String> {
        self.warnings.clone()
    }

    /// Kind of each warning, in the same order as `warnings`
    #[wasm_bindgen(getter)]
    pub fn warning_kinds(&self) -> Vec<String> {
        self.warning_kinds.clone()
    }

    /// Description of the GIF error that cut the animation short, if any
    #[wasm_bindgen(getter)]
    pub fn partial(&self) -> Option<String> {
        self.partial.clone()
    }

    /// Error message when the conversion failed
    #[wasm_bindgen(getter)]
    pub fn error(&self) -> Option<String> {
        self.error.clone()
    }

    /// Kind of the failure: an error kind such as `unsupported-image-format`,
    /// or `invalid-request` for bad settings
    #[wasm_bindgen(getter)]
    pub fn error_kind(&self) -> Option<String> {
        self.error_kind.clone()
    }
}

impl ConvertResult {
    fn failed(kind: String, message: String) -> Self {
        ConvertResult {
            code: String::new(),
            width: 0,
            height: 0,
            frame_count: 0,
            warnings: Vec::new(),
            warning_kinds: Vec::new(),
            partial: None,
            error: Some(message),
            error_kind: Some(kind),
        }
    }

    fn invalid_request(message: String) -> Self {
        Self::failed(INVALID_REQUEST.to_string(), message)
    }

    fn from_error(error: &ConvertError) -> Self {
        Self::failed(error.kind().to_string(), error.to_string())
    }
}

/// Convert image or GIF bytes into sprite code.
///
/// # Arguments
/// * `bytes` - Raw file contents (PNG, JPEG, GIF, ...)
/// * `request_json` - Settings in the `mksprite.toml` layout as JSON; empty for defaults
///
/// # Returns
/// ConvertResult with the code, output size, frame count and warnings
#[wasm_bindgen]
pub fn convert_image(bytes: &[u8], request_json: &str) -> ConvertResult {
    let config: MkspriteConfig = if request_json.trim().is_empty() {
        MkspriteConfig::default()
    } else {
        match serde_json::from_str(request_json) {
            Ok(config) => config,
            Err(e) => return ConvertResult::invalid_request(format!("invalid request: {}", e)),
        }
    };

    let errors = config.validate();
    if !errors.is_empty() {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        return ConvertResult::invalid_request(messages.join("; "));
    }

    let request = match config.to_request() {
        Ok(request) => request,
        Err(e) => return ConvertResult::from_error(&e),
    };

    match convert_bytes(bytes, &request) {
        Ok(conversion) => ConvertResult {
            width: conversion.dims.width,
            height: conversion.dims.height,
            frame_count: conversion.frame_count(),
            warnings: conversion.warnings.iter().map(|w| w.to_string()).collect(),
            warning_kinds: conversion.warnings.iter().map(|w| w.kind.to_string()).collect(),
            partial: conversion
                .partial
                .as_ref()
                .map(|p| format!("{} (after {} frame(s))", p.error, p.frames_completed)),
            error: None,
            error_kind: None,
            code: conversion.code,
        },
        Err(e) => ConvertResult::from_error(&e),
    }
}

/// The 15 opaque colors of the default MakeCode Arcade palette as hex strings.
#[wasm_bindgen]
pub fn default_palette() -> Vec<String> {
    Palette::arcade().to_hex_strings()
}
