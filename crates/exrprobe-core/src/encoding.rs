//! Tonal encoding classification
//!
//! Heuristic labeling of an image as linear scene-referred, logarithmic, or
//! linear SDR from aggregate per-channel mean and max statistics. Purely
//! functional, never fails; degenerate inputs may legitimately classify as
//! `Unknown`.

use serde::Serialize;

/// Tonal encoding of an image's sample values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TonalEncoding {
    /// Linear light, 1.0 is an arbitrary exposure reference
    SceneLinear,

    /// Logarithmic encoding such as ACEScct or LogC
    Log,

    /// Linear light bounded to display range
    SdrLinear,

    /// Statistics match no known pattern
    Unknown,
}

impl TonalEncoding {
    pub fn label(&self) -> &'static str {
        match self {
            TonalEncoding::SceneLinear => "Linear (scene-referred)",
            TonalEncoding::Log => "Log (ACEScct/LogC)",
            TonalEncoding::SdrLinear => "Linear (SDR)",
            TonalEncoding::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for TonalEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify tonal encoding from per-channel means and maxima.
///
/// Rules are evaluated in order and the first match wins. The `avg_max > 1.5`
/// condition intentionally appears both in the first rule and as a later
/// catch-all; the order is load-bearing and must not be rearranged.
pub fn classify_encoding(means: &[f32], maxes: &[f32]) -> TonalEncoding {
    let avg_mean = average(means);
    let avg_max = average(maxes);

    if avg_max > 5.0 && avg_mean < 2.0 {
        TonalEncoding::SceneLinear
    } else if avg_max < 1.5 && avg_mean > 0.15 {
        TonalEncoding::Log
    } else if avg_max < 1.1 {
        TonalEncoding::SdrLinear
    } else if avg_max > 1.5 {
        TonalEncoding::SceneLinear
    } else {
        TonalEncoding::Unknown
    }
}

fn average(values: &[f32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64
}
