// Error types - Failures surfaced at the transport boundary
// Tempo never fails: out-of-range values are clamped, not rejected

use thiserror::Error;

/// Metronome-related errors
#[derive(Debug, Error)]
pub enum MetronomeError {
    /// The audio clock could not be created (no device, platform refusal).
    /// Not fatal: the caller may retry `play()` later.
    #[error("Audio clock unavailable: {0}")]
    Capability(String),

    #[error("Metronome has been disposed")]
    Disposed,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Configuration parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("Configuration serialization error: {0}")]
    Serialize(#[from] ron::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MetronomeError {
    /// True when retrying later may succeed (e.g. after a user gesture)
    pub fn is_retryable(&self) -> bool {
        matches!(self, MetronomeError::Capability(_))
    }
}

pub type MetronomeResult<T> = Result<T, MetronomeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_error_is_retryable() {
        let err = MetronomeError::Capability("no output device".to_string());
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "Audio clock unavailable: no output device");
    }

    #[test]
    fn test_config_error_is_not_retryable() {
        let err = MetronomeError::Config("bad".to_string());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_disposed_is_final() {
        assert!(!MetronomeError::Disposed.is_retryable());
    }
}
