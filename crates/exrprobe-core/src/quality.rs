//! Quality estimation
//!
//! Per-channel statistics (finite samples only), effective-bit-depth
//! estimation from distinct-value cardinality, and assembly of the complete
//! quality report. Channels are processed in parallel but always aggregated
//! in fixed R, G, B order so results are deterministic.

use rayon::prelude::*;

use crate::colorspace::identify_colorspace;
use crate::config::{AnalysisConfig, RatingThresholds};
use crate::decoders::{decode_channel, ImageSource};
use crate::encoding::classify_encoding;
use crate::error::AnalysisError;
use crate::models::{
    ChannelSample, ChannelStats, ImageTensor, QualityReport, Rating, SampleFormat, CHANNEL_NAMES,
};
use crate::verbose_println;

/// Reference 8-bit quantization step for the midtone step ratio.
const EIGHT_BIT_STEP: f64 = 1.0 / 255.0;

/// Midtone band bounds (exclusive) for the quantization step measurement.
const MIDTONE_LOW: f32 = 0.2;
const MIDTONE_HIGH: f32 = 0.5;

/// Result of analyzing one image source: the report plus the assembled
/// tensor the visualization reducers run over.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub report: QualityReport,
    pub tensor: ImageTensor,
}

/// Compute statistics over one decoded channel's finite samples.
///
/// Fails when the channel has no finite samples at all; statistics are
/// undefined in that case and must not default to zero.
pub fn channel_stats(sample: &ChannelSample) -> Result<ChannelStats, AnalysisError> {
    let mut finite: Vec<f32> = sample
        .samples
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .collect();

    if finite.is_empty() {
        return Err(AnalysisError::NoFiniteSamples(sample.name.clone()));
    }

    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    let mut sum = 0.0f64;
    for &v in &finite {
        min = min.min(v);
        max = max.max(v);
        sum += v as f64;
    }
    let mean = (sum / finite.len() as f64) as f32;

    // Distinct values: sort then merge equal neighbors (-0.0 and 0.0
    // compare equal and collapse to one value)
    finite.sort_by(f32::total_cmp);
    finite.dedup_by(|a, b| a == b);
    let unique_count = finite.len();

    let step_ratio = midtone_step_ratio(&finite);

    Ok(ChannelStats {
        name: sample.name.clone(),
        bit_label: sample.bit_label.clone(),
        format: sample.format,
        min,
        max,
        mean,
        unique_count,
        step_ratio,
    })
}

/// Ratio of the 8-bit step to the mean gap between distinct midtone values.
///
/// `unique` must be sorted ascending with duplicates removed. Returns 0.0
/// when fewer than two distinct values fall strictly inside (0.2, 0.5);
/// that signals insufficient data, not an error.
fn midtone_step_ratio(unique: &[f32]) -> f64 {
    let midtone: Vec<f64> = unique
        .iter()
        .copied()
        .filter(|&v| v > MIDTONE_LOW && v < MIDTONE_HIGH)
        .map(|v| v as f64)
        .collect();

    if midtone.len() < 2 {
        return 0.0;
    }

    let mean_diff = midtone
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .sum::<f64>()
        / (midtone.len() - 1) as f64;

    if mean_diff > 0.0 {
        EIGHT_BIT_STEP / mean_diff
    } else {
        0.0
    }
}

/// Effective bit depth estimate from mean distinct-value cardinality.
///
/// Monotonically non-decreasing in `avg_unique`; exactly 0.0 at or below a
/// single distinct value.
pub fn effective_bits(avg_unique: f64) -> f64 {
    if avg_unique > 1.0 {
        avg_unique.log2()
    } else {
        0.0
    }
}

/// Map effective bits to the five-tier rating. Tier boundaries are
/// inclusive at the lower bound.
pub fn rate(effective_bits: f64, thresholds: &RatingThresholds) -> Rating {
    if effective_bits >= thresholds.cinema_grade {
        Rating {
            stars: 5,
            label: "Cinema-grade",
        }
    } else if effective_bits >= thresholds.good {
        Rating {
            stars: 4,
            label: "Good",
        }
    } else if effective_bits >= thresholds.acceptable {
        Rating {
            stars: 3,
            label: "Acceptable",
        }
    } else if effective_bits >= thresholds.poor {
        Rating {
            stars: 2,
            label: "Poor",
        }
    } else {
        Rating {
            stars: 1,
            label: "8-bit equivalent",
        }
    }
}

/// Analyze an image source: decode R, G, B, compute per-channel and
/// aggregate statistics, and assemble the report plus image tensor.
///
/// Fails on a degenerate data window, when no color channel exists, or when
/// any required channel fails to decode or has no finite samples. Partial
/// results are discarded on failure.
pub fn analyze(source: &ImageSource, config: &AnalysisConfig) -> Result<Analysis, AnalysisError> {
    let header = &source.header;
    if header.width == 0 || header.height == 0 {
        return Err(AnalysisError::EmptyDataWindow);
    }

    let color_channels: Vec<&'static str> = CHANNEL_NAMES
        .iter()
        .copied()
        .filter(|name| header.channel_format(name).is_some())
        .collect();
    if color_channels.is_empty() {
        return Err(AnalysisError::NoColorChannels);
    }

    verbose_println!(
        "[exrprobe] analyzing {} channel(s) of {}x{}",
        color_channels.len(),
        header.width,
        header.height
    );

    let decoded: Vec<ChannelSample> = color_channels
        .iter()
        .map(|name| decode_channel(source, name))
        .collect::<Result<_, _>>()?;

    // Per-channel stats are independent; compute them in parallel and let
    // collect preserve channel order for deterministic aggregation
    let stats: Vec<ChannelStats> = decoded
        .par_iter()
        .map(channel_stats)
        .collect::<Result<_, _>>()?;

    let mut tensor = ImageTensor::zeros(header.width, header.height);
    for (slot, (name, sample)) in color_channels.iter().copied().zip(&decoded).enumerate() {
        tensor.fill_channel(slot, name, &sample.samples);
    }

    let means: Vec<f32> = stats.iter().map(|s| s.mean).collect();
    let maxes: Vec<f32> = stats.iter().map(|s| s.max).collect();
    let encoding = classify_encoding(&means, &maxes);
    let colorspace = identify_colorspace(header.chromaticities.as_ref());

    let avg_unique = stats.iter().map(|s| s.unique_count as f64).sum::<f64>()
        / stats.len() as f64;
    let eff_bits = effective_bits(avg_unique);
    let rating = rate(eff_bits, &config.rating);

    let above_one = tensor.data.iter().filter(|&&v| v > 1.0).count();
    let above_one_percent = 100.0 * above_one as f64 / tensor.data.len() as f64;

    let native_depth = if stats.iter().any(|s| s.format == SampleFormat::Float) {
        "32-bit float"
    } else {
        "16-bit half"
    };

    let avg_step_ratio =
        stats.iter().map(|s| s.step_ratio).sum::<f64>() / stats.len() as f64;
    let range_min = stats.iter().map(|s| s.min).fold(f32::INFINITY, f32::min);
    let range_max = stats
        .iter()
        .map(|s| s.max)
        .fold(f32::NEG_INFINITY, f32::max);

    let report = QualityReport {
        file_name: header.file_name.clone(),
        file_size: header.file_size,
        width: header.width,
        height: header.height,
        compression: header.compression.clone(),
        native_depth: native_depth.to_string(),
        colorspace,
        encoding: encoding.label().to_string(),
        channels: stats,
        avg_unique,
        effective_bits: eff_bits,
        above_one_percent,
        avg_step_ratio,
        range_min,
        range_max,
        rating,
    };

    Ok(Analysis { report, tensor })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoders::{RawChannel, RawSamples};
    use crate::models::{ChannelInfo, ImageHeader};

    fn sample(name: &str, values: Vec<f32>) -> ChannelSample {
        ChannelSample {
            name: name.to_string(),
            format: SampleFormat::Float,
            bit_label: "32-bit FLOAT".to_string(),
            samples: values,
        }
    }

    fn source_from(channels: Vec<(&str, Vec<f32>)>, width: usize, height: usize) -> ImageSource {
        let infos = channels
            .iter()
            .map(|(name, _)| ChannelInfo {
                name: name.to_string(),
                format: SampleFormat::Float,
            })
            .collect();
        let raw = channels
            .into_iter()
            .map(|(name, values)| RawChannel {
                name: name.to_string(),
                samples: RawSamples::F32(values),
            })
            .collect();
        ImageSource::from_parts(
            ImageHeader {
                width,
                height,
                compression: "ZIP16".to_string(),
                chromaticities: None,
                channels: infos,
                file_name: None,
                file_size: 0,
            },
            raw,
        )
    }

    #[test]
    fn test_stats_ordering_invariant() {
        let stats = channel_stats(&sample("R", vec![0.1, 0.9, 0.4, 0.3])).unwrap();
        assert!(stats.min <= stats.mean);
        assert!(stats.mean <= stats.max);
        assert_eq!(stats.min, 0.1);
        assert_eq!(stats.max, 0.9);
        assert_eq!(stats.unique_count, 4);
    }

    #[test]
    fn test_stats_exclude_non_finite() {
        let stats = channel_stats(&sample(
            "R",
            vec![f32::NAN, 0.5, f32::INFINITY, 0.5, f32::NEG_INFINITY, 0.7],
        ))
        .unwrap();
        // NaN and infinities dropped, not treated as zero
        assert_eq!(stats.min, 0.5);
        assert_eq!(stats.max, 0.7);
        assert_eq!(stats.unique_count, 2);
        assert!((stats.mean - 0.5666667).abs() < 1e-5);
    }

    #[test]
    fn test_no_finite_samples_is_an_error() {
        let err = channel_stats(&sample("G", vec![f32::NAN, f32::INFINITY])).unwrap_err();
        assert_eq!(err, AnalysisError::NoFiniteSamples("G".to_string()));
    }

    #[test]
    fn test_midtone_step_ratio() {
        // Distinct values spaced 1/510 apart inside (0.2, 0.5): twice as
        // fine as an 8-bit step
        let step = 1.0 / 510.0;
        let values: Vec<f32> = (0..100).map(|i| 0.25 + i as f32 * step).collect();
        let stats = channel_stats(&sample("R", values)).unwrap();
        assert!((stats.step_ratio - 2.0).abs() < 0.01);
    }

    #[test]
    fn test_midtone_step_ratio_insufficient_data() {
        // Only one distinct value inside the midtone band
        let stats = channel_stats(&sample("R", vec![0.3, 0.3, 0.9, 0.05])).unwrap();
        assert_eq!(stats.step_ratio, 0.0);
    }

    #[test]
    fn test_effective_bits_boundary_values() {
        assert_eq!(effective_bits(1.0), 0.0);
        assert_eq!(effective_bits(0.5), 0.0);
        assert_eq!(effective_bits(2.0), 1.0);
        assert_eq!(effective_bits(1024.0), 10.0);
    }

    #[test]
    fn test_effective_bits_monotonic() {
        let mut last = 0.0;
        for unique in [1.0, 1.5, 2.0, 100.0, 4096.0, 1e6] {
            let bits = effective_bits(unique);
            assert!(bits >= last);
            last = bits;
        }
    }

    #[test]
    fn test_rating_tiers_inclusive_lower_bound() {
        let thresholds = RatingThresholds::default();

        // Exactly 2^11.5 unique values must land in the 4-star tier
        let bits = effective_bits(2.0_f64.powf(11.5));
        assert!((bits - 11.5).abs() < 1e-9);
        assert_eq!(rate(bits, &thresholds).stars, 4);

        assert_eq!(rate(13.0, &thresholds).stars, 5);
        assert_eq!(rate(12.9, &thresholds).stars, 4);
        assert_eq!(rate(10.0, &thresholds).stars, 3);
        assert_eq!(rate(8.5, &thresholds).stars, 2);
        assert_eq!(rate(8.4, &thresholds).stars, 1);
        assert_eq!(rate(8.4, &thresholds).label, "8-bit equivalent");
    }

    #[test]
    fn test_analyze_report_fields() {
        let source = source_from(
            vec![
                ("R", vec![0.1, 0.2, 0.3, 2.0]),
                ("G", vec![0.1, 0.1, 0.1, 0.1]),
                ("B", vec![0.0, 0.5, 0.5, 1.0]),
            ],
            2,
            2,
        );
        let config = AnalysisConfig::default();
        let analysis = analyze(&source, &config).unwrap();
        let report = &analysis.report;

        assert_eq!(report.channels.len(), 3);
        assert_eq!(report.native_depth, "32-bit float");
        assert_eq!(report.colorspace, "Unknown");
        assert_eq!(report.range_min, 0.0);
        assert_eq!(report.range_max, 2.0);
        // One of twelve tensor samples exceeds 1.0
        assert!((report.above_one_percent - 100.0 / 12.0).abs() < 1e-9);
        // avg_unique = (4 + 1 + 3) / 3
        assert!((report.avg_unique - 8.0 / 3.0).abs() < 1e-9);
        assert_eq!(analysis.tensor.present, [true, true, true]);
    }

    #[test]
    fn test_analyze_records_slot_names_without_green() {
        let source = source_from(
            vec![
                ("R", vec![0.1, 0.2, 0.3, 0.4]),
                ("B", vec![0.5, 0.6, 0.7, 0.8]),
            ],
            2,
            2,
        );
        let analysis = analyze(&source, &AnalysisConfig::default()).unwrap();

        // B packs into the middle slot; the slot remembers whose data it holds
        assert_eq!(analysis.tensor.present, [true, true, false]);
        assert_eq!(analysis.tensor.names, [Some("R"), Some("B"), None]);
        assert_eq!(analysis.tensor.sample(0, 0, 1), 0.5);
    }

    #[test]
    fn test_analyze_requires_color_channels() {
        let source = source_from(vec![("A", vec![1.0, 1.0, 1.0, 1.0])], 2, 2);
        let err = analyze(&source, &AnalysisConfig::default()).unwrap_err();
        assert_eq!(err, AnalysisError::NoColorChannels);
    }

    #[test]
    fn test_analyze_discards_partial_results_on_bad_channel() {
        let source = source_from(
            vec![
                ("R", vec![0.1, 0.2, 0.3, 0.4]),
                ("G", vec![f32::NAN, f32::NAN, f32::NAN, f32::NAN]),
            ],
            2,
            2,
        );
        let err = analyze(&source, &AnalysisConfig::default()).unwrap_err();
        assert_eq!(err, AnalysisError::NoFiniteSamples("G".to_string()));
    }

    #[test]
    fn test_analyze_empty_window() {
        let source = source_from(vec![("R", vec![])], 0, 0);
        let err = analyze(&source, &AnalysisConfig::default()).unwrap_err();
        assert_eq!(err, AnalysisError::EmptyDataWindow);
    }
}
