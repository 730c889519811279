//! Error and warning types shared by the conversion pipeline.

use serde::Serialize;
use thiserror::Error;

/// Discriminant of a [`ConvertError`] or [`Warning`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A palette entry is not a `#RRGGBB` string
    InvalidHexColor,
    /// Input is neither a decodable static image nor a GIF
    UnsupportedImageFormat,
    /// GIF signature mismatch, truncated blocks or inconsistent offsets
    MalformedGifStream,
    /// Non-positive or NaN sizing parameter
    InvalidSizingInput,
    /// GIF decoded but contained no frames
    EmptyFrameSequence,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::InvalidHexColor => "invalid-hex-color",
            ErrorKind::UnsupportedImageFormat => "unsupported-image-format",
            ErrorKind::MalformedGifStream => "malformed-gif-stream",
            ErrorKind::InvalidSizingInput => "invalid-sizing-input",
            ErrorKind::EmptyFrameSequence => "empty-frame-sequence",
        };
        f.write_str(name)
    }
}

/// Error returned when a conversion cannot produce any output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    #[error("invalid hex color: {0}")]
    InvalidHexColor(String),

    #[error("unsupported image format: {0}")]
    UnsupportedImageFormat(String),

    #[error("malformed GIF stream: {0}")]
    MalformedGifStream(String),

    #[error("invalid sizing input: {0}")]
    InvalidSizingInput(String),

    #[error("GIF contains no frames")]
    EmptyFrameSequence,
}

impl ConvertError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConvertError::InvalidHexColor(_) => ErrorKind::InvalidHexColor,
            ConvertError::UnsupportedImageFormat(_) => ErrorKind::UnsupportedImageFormat,
            ConvertError::MalformedGifStream(_) => ErrorKind::MalformedGifStream,
            ConvertError::InvalidSizingInput(_) => ErrorKind::InvalidSizingInput,
            ConvertError::EmptyFrameSequence => ErrorKind::EmptyFrameSequence,
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        ConvertError::MalformedGifStream(message.into())
    }
}

/// A non-fatal issue recorded while converting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Warning {
    pub kind: ErrorKind,
    pub message: String,
}

impl Warning {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            ConvertError::InvalidHexColor("#12".to_string()).kind(),
            ErrorKind::InvalidHexColor
        );
        assert_eq!(ConvertError::EmptyFrameSequence.kind(), ErrorKind::EmptyFrameSequence);
        assert_eq!(ConvertError::malformed("eof").kind(), ErrorKind::MalformedGifStream);
    }

    #[test]
    fn test_error_display() {
        let err = ConvertError::MalformedGifStream("missing trailer".to_string());
        assert_eq!(err.to_string(), "malformed GIF stream: missing trailer");
        assert_eq!(ConvertError::EmptyFrameSequence.to_string(), "GIF contains no frames");
    }

    #[test]
    fn test_warning_display() {
        let warning = Warning::new(ErrorKind::InvalidSizingInput, "scale factor -1 ignored");
        assert_eq!(warning.to_string(), "scale factor -1 ignored (invalid-sizing-input)");
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::MalformedGifStream).unwrap();
        assert_eq!(json, "\"malformed_gif_stream\"");
    }
}
