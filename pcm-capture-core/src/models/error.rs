use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while capturing or encoding audio.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The audio source could not be opened or stopped delivering samples.
    #[error("audio source unavailable: {0}")]
    Resource(String),

    /// A file could not be opened, read, or written.
    #[error("i/o error: {0}")]
    Io(String),

    /// The operation is not valid in the current session state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A raw payload or header is malformed.
    #[error("format error: {0}")]
    Format(String),

    #[error("invalid configuration: {0}")]
    Configuration(String),
}

/// Coarse error category, reported to presentation sinks next to the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Resource,
    Io,
    InvalidState,
    Format,
    Configuration,
}

impl CaptureError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Resource(_) => ErrorKind::Resource,
            Self::Io(_) => ErrorKind::Io,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::Format(_) => ErrorKind::Format,
            Self::Configuration(_) => ErrorKind::Configuration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(CaptureError::Resource("busy".into()).kind(), ErrorKind::Resource);
        assert_eq!(CaptureError::Io("disk".into()).kind(), ErrorKind::Io);
        assert_eq!(
            CaptureError::InvalidState("idle".into()).kind(),
            ErrorKind::InvalidState
        );
        assert_eq!(CaptureError::Format("odd".into()).kind(), ErrorKind::Format);
    }

    #[test]
    fn display_includes_message() {
        let err = CaptureError::Format("raw payload has 3 bytes".into());
        assert_eq!(err.to_string(), "format error: raw payload has 3 bytes");
    }
}
