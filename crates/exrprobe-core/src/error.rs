//! Typed analysis failures
//!
//! Every error here is fatal to a single analysis request and propagates to
//! the caller. Colorspace identification and tonal-encoding classification
//! never fail; absent metadata degrades to "Unknown" instead.

use std::error::Error;
use std::fmt::Display;

/// Expected versus received buffer sizes for a length mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MismatchedSize {
    pub expected: usize,
    pub received: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// The requested channel does not exist in the header.
    MissingChannel(String),

    /// A channel buffer length does not equal width * height.
    BufferSizeMismatch(String, MismatchedSize),

    /// A required channel contains zero finite samples, so statistics are
    /// undefined.
    NoFiniteSamples(String),

    /// The data window is degenerate (zero width or height).
    EmptyDataWindow,

    /// None of the R, G, B channels exist in the header.
    NoColorChannels,

    /// The external decoding collaborator failed to read the source.
    SourceRead(String),
}

impl Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisError::MissingChannel(name) => {
                write!(f, "Channel '{}' not present in header", name)
            }
            AnalysisError::BufferSizeMismatch(name, size) => write!(
                f,
                "Channel '{}' buffer size mismatch: expected {}, received {}",
                name, size.expected, size.received
            ),
            AnalysisError::NoFiniteSamples(name) => {
                write!(f, "Channel '{}' contains no finite samples", name)
            }
            AnalysisError::EmptyDataWindow => f.write_str("Data window has zero area"),
            AnalysisError::NoColorChannels => {
                f.write_str("No R, G, or B channels found in header")
            }
            AnalysisError::SourceRead(msg) => write!(f, "Failed to read source: {}", msg),
        }
    }
}

impl Error for AnalysisError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = AnalysisError::BufferSizeMismatch(
            "G".to_string(),
            MismatchedSize {
                expected: 12,
                received: 10,
            },
        );
        assert_eq!(
            err.to_string(),
            "Channel 'G' buffer size mismatch: expected 12, received 10"
        );

        let err = AnalysisError::MissingChannel("Z".to_string());
        assert!(err.to_string().contains("'Z'"));
    }
}
