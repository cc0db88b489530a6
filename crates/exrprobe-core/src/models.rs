//! Data models for exrprobe
//!
//! Core data structures for image headers, decoded channels, and quality
//! reports. Reports are value objects: a re-analysis produces a new report,
//! nothing is mutated in place.

use serde::{Deserialize, Serialize};

/// Sample format declared for a channel in the file header.
///
/// This is a closed set: EXR only declares HALF, FLOAT, or UINT. `Uint` is
/// decoded through the best-effort float fallback path and labeled with the
/// raw format name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleFormat {
    /// 16-bit half precision
    Half,

    /// 32-bit floating point
    Float,

    /// 32-bit unsigned integer (decoded as float, degraded mode)
    Uint,
}

impl SampleFormat {
    /// Raw format name as it appears in the container.
    pub fn raw_name(&self) -> &'static str {
        match self {
            SampleFormat::Half => "HALF",
            SampleFormat::Float => "FLOAT",
            SampleFormat::Uint => "UINT",
        }
    }

    /// Human-readable bit-depth label for this format.
    pub fn bit_label(&self) -> &'static str {
        match self {
            SampleFormat::Half => "16-bit HALF",
            SampleFormat::Float => "32-bit FLOAT",
            // Fallback formats are labeled with the raw name
            SampleFormat::Uint => "UINT",
        }
    }
}

/// CIE xy chromaticity coordinates for the four colorspace reference points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Chromaticities {
    pub red: [f32; 2],
    pub green: [f32; 2],
    pub blue: [f32; 2],
    pub white: [f32; 2],
}

/// Per-channel metadata from the file header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelInfo {
    /// Channel name (e.g. "R", "G", "B", "A", "Z")
    pub name: String,

    /// Declared sample format
    pub format: SampleFormat,
}

/// Parsed image header. Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageHeader {
    /// Data window width in pixels (max_x - min_x + 1)
    pub width: usize,

    /// Data window height in pixels (max_y - min_y + 1)
    pub height: usize,

    /// Declared compression kind (e.g. "ZIP16", "PIZ")
    pub compression: String,

    /// Chromaticity primaries, when the file carries them
    pub chromaticities: Option<Chromaticities>,

    /// All channels listed in the header
    pub channels: Vec<ChannelInfo>,

    /// Source file name, when the source came from disk
    pub file_name: Option<String>,

    /// Source file size in bytes (0 for in-memory sources)
    pub file_size: u64,
}

impl ImageHeader {
    /// Number of samples each channel buffer must contain.
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Look up a channel's declared format by name.
    pub fn channel_format(&self, name: &str) -> Option<SampleFormat> {
        self.channels
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.format)
    }
}

/// One decoded channel: samples normalized to f32, row-major.
///
/// Owned by the decode step that produced it; downstream consumers read it
/// without mutating.
#[derive(Debug, Clone)]
pub struct ChannelSample {
    /// Channel name
    pub name: String,

    /// Declared sample format
    pub format: SampleFormat,

    /// Human-readable bit-depth label ("32-bit FLOAT", "16-bit HALF", ...)
    pub bit_label: String,

    /// Normalized samples, length width * height
    pub samples: Vec<f32>,
}

/// Statistics derived from one channel's finite samples.
///
/// Non-finite samples are excluded before anything is computed; a channel
/// with zero finite samples never produces stats (that is a typed error).
#[derive(Debug, Clone, Serialize)]
pub struct ChannelStats {
    /// Channel name
    pub name: String,

    /// Bit-depth label carried over from the decode step
    pub bit_label: String,

    /// Declared sample format
    pub format: SampleFormat,

    /// Minimum finite sample
    pub min: f32,

    /// Maximum finite sample
    pub max: f32,

    /// Mean of finite samples
    pub mean: f32,

    /// Number of distinct finite values
    pub unique_count: usize,

    /// How much finer the native quantization is than an 8-bit step,
    /// measured over distinct values strictly between 0.2 and 0.5.
    /// 0.0 means there was not enough midtone data to measure.
    pub step_ratio: f64,
}

/// Discrete five-tier quality rating.
#[derive(Debug, Clone, Serialize)]
pub struct Rating {
    /// Star count, 1-5
    pub stars: u8,

    /// Tier label ("Cinema-grade", "Good", ...)
    pub label: &'static str,
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for _ in 0..self.stars {
            f.write_str("★")?;
        }
        for _ in self.stars..5 {
            f.write_str("☆")?;
        }
        write!(f, " {}", self.label)
    }
}

/// Complete quality report for one analyzed file.
///
/// Immutable after construction; the presentation layer consumes it
/// read-only.
#[derive(Debug, Clone, Serialize)]
pub struct QualityReport {
    /// Source file name, when known
    pub file_name: Option<String>,

    /// Source file size in bytes
    pub file_size: u64,

    /// Image width in pixels
    pub width: usize,

    /// Image height in pixels
    pub height: usize,

    /// Declared compression kind
    pub compression: String,

    /// "32-bit float" if any analyzed channel is FLOAT, else "16-bit half"
    pub native_depth: String,

    /// Identified colorspace label, possibly "(approx)" or "Unknown"
    pub colorspace: String,

    /// Tonal encoding label
    pub encoding: String,

    /// Per-channel statistics, in R, G, B order (missing channels omitted)
    pub channels: Vec<ChannelStats>,

    /// Mean distinct-value count across analyzed channels
    pub avg_unique: f64,

    /// log2(avg_unique), or 0.0 when avg_unique <= 1
    pub effective_bits: f64,

    /// Percentage of all samples exceeding 1.0
    pub above_one_percent: f64,

    /// Mean midtone step ratio across analyzed channels
    pub avg_step_ratio: f64,

    /// Smallest per-channel minimum
    pub range_min: f32,

    /// Largest per-channel maximum
    pub range_max: f32,

    /// Discrete quality rating derived from effective bits
    pub rating: Rating,
}

/// Assembled height × width × 3 image tensor, interleaved RGB row-major.
///
/// Built once per analysis and reused by every reduction; re-rendering with
/// a different visibility mask never re-decodes the source.
#[derive(Debug, Clone)]
pub struct ImageTensor {
    /// Width in pixels
    pub width: usize,

    /// Height in pixels
    pub height: usize,

    /// Which of the three slots were actually present in the source
    pub present: [bool; 3],

    /// Name of the channel occupying each slot. Slots are filled in
    /// source enumeration order, so the name is not derivable from the
    /// slot index when a channel is missing.
    pub names: [Option<&'static str>; 3],

    /// Interleaved samples, length width * height * 3. Slots for channels
    /// absent from the source are zero-filled.
    pub data: Vec<f32>,
}

impl ImageTensor {
    /// Tensor of zeros for the given dimensions.
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            present: [false; 3],
            names: [None; 3],
            data: vec![0.0; width * height * 3],
        }
    }

    /// Sample at (row, col) for channel slot `ch` (0 = R, 1 = G, 2 = B).
    #[inline]
    pub fn sample(&self, row: usize, col: usize, ch: usize) -> f32 {
        self.data[(row * self.width + col) * 3 + ch]
    }

    /// Fill channel slot `ch` from a row-major sample buffer, recording
    /// the name of the channel the slot now holds.
    pub fn fill_channel(&mut self, ch: usize, name: &'static str, samples: &[f32]) {
        debug_assert_eq!(samples.len(), self.width * self.height);
        for (pixel, &value) in samples.iter().enumerate() {
            self.data[pixel * 3 + ch] = value;
        }
        self.present[ch] = true;
        self.names[ch] = Some(name);
    }
}

/// Display names for the three tensor channel slots.
pub const CHANNEL_NAMES: [&str; 3] = ["R", "G", "B"];
