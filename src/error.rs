// Error kinds for the byte <-> pixel codec and its PNG persistence layer.

use std::fmt;
use std::path::PathBuf;

/// Everything that can go wrong while encoding, decoding or persisting an image.
#[derive(Debug)]
pub enum CodecError {
    /// Source file unreadable or output path unwritable.
    FileAccess { path: PathBuf, source: std::io::Error },
    /// A text field cannot be stored (strict mode, ASCII-only mode, or NUL bytes).
    Encoding(String),
    /// The header was not produced by this codec.
    MalformedHeader(String),
    /// The byte stream ends before the header says it should.
    TruncatedStream { needed: usize, available: usize },
    /// PNG encode/decode failure.
    Image(image::ImageError),
    /// A zero-sized grid cannot be written as an image.
    EmptyImage,
}

pub type Result<T> = std::result::Result<T, CodecError>;

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileAccess { path, source } => {
                write!(f, "cannot access {}: {source}", path.display())
            }
            Self::Encoding(msg) => write!(f, "cannot encode text field: {msg}"),
            Self::MalformedHeader(msg) => write!(f, "malformed header: {msg}"),
            Self::TruncatedStream { needed, available } => write!(
                f,
                "truncated stream: need {needed} bytes, image holds {available}"
            ),
            Self::Image(e) => write!(f, "image error: {e}"),
            Self::EmptyImage => write!(f, "image has no pixels"),
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FileAccess { source, .. } => Some(source),
            Self::Image(e) => Some(e),
            _ => None,
        }
    }
}

impl From<image::ImageError> for CodecError {
    fn from(e: image::ImageError) -> Self {
        Self::Image(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn file_access_keeps_io_source() {
        let err = CodecError::FileAccess {
            path: PathBuf::from("missing.bin"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.to_string().contains("missing.bin"));
        assert!(err.source().is_some());
    }

    #[test]
    fn truncated_stream_message() {
        let err = CodecError::TruncatedStream { needed: 400, available: 312 };
        assert_eq!(
            err.to_string(),
            "truncated stream: need 400 bytes, image holds 312"
        );
        assert!(err.source().is_none());
    }
}
