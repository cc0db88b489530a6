//! exrprobe Core Library
//!
//! Analysis engine for EXR image quality: channel decoding, colorspace and
//! tonal-encoding identification, effective-bit-depth estimation, and
//! reduction of full-resolution buffers into plot-ready waveform and
//! histogram series. Produces pure data; rendering belongs to the caller.

pub mod colorspace;
pub mod config;
pub mod decoders;
pub mod encoding;
pub mod error;
pub mod models;
pub mod quality;
pub mod reduce;

// Re-export commonly used types
pub use config::{load_config, AnalysisConfig, ConfigHandle, RatingThresholds};
pub use decoders::{decode_channel, ImageSource, RawChannel, RawSamples};
pub use error::AnalysisError;
pub use models::{
    ChannelSample, ChannelStats, Chromaticities, ImageHeader, ImageTensor, QualityReport, Rating,
    SampleFormat,
};
pub use quality::{analyze, Analysis};
pub use reduce::{envelope_waveform, full_waveform, histogram};
