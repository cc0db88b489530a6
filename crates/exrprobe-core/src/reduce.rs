//! Visualization data reduction
//!
//! Downsamples a full-resolution image tensor into bounded-size series that
//! plotting code can render responsively: an envelope waveform (per-column
//! min/max bands), a full-spectrum waveform (budgeted scatter points), and
//! density-normalized histograms with an outlier-capped y-axis.
//!
//! Every function here is a pure function of the tensor, the caller's
//! channel-visibility mask, and the configured caps. The mask is owned by
//! the presentation layer and is never cached in the engine.

use crate::config::AnalysisConfig;
use crate::models::{ImageTensor, CHANNEL_NAMES};

/// Per-column min/max band for one channel.
#[derive(Debug, Clone)]
pub struct ChannelEnvelope {
    /// Channel slot name ("R", "G", "B")
    pub name: &'static str,

    /// Column x positions mapped linearly to [0, 1]
    pub x: Vec<f32>,

    /// Per-column minimum, clamped to [0, max_display]
    pub min: Vec<f32>,

    /// Per-column maximum, clamped to [0, max_display]
    pub max: Vec<f32>,
}

/// Envelope waveform: one band per visible channel.
#[derive(Debug, Clone)]
pub struct EnvelopeWaveform {
    pub channels: Vec<ChannelEnvelope>,
    pub max_display: f32,
}

/// Scatter points for one channel of the full-spectrum waveform.
#[derive(Debug, Clone)]
pub struct ChannelScatter {
    pub name: &'static str,
    pub x: Vec<f32>,
    pub y: Vec<f32>,
}

/// Full-spectrum waveform: budgeted scatter per visible channel.
#[derive(Debug, Clone)]
pub struct FullWaveform {
    pub channels: Vec<ChannelScatter>,
    pub max_display: f32,
}

/// Density histogram for one channel.
#[derive(Debug, Clone)]
pub struct ChannelDensity {
    pub name: &'static str,

    /// Density per bin: count / (total samples * bin width)
    pub density: Vec<f32>,
}

/// Histogram series for the visible channels, sharing one set of bin edges.
#[derive(Debug, Clone)]
pub struct HistogramSeries {
    /// Bin edges, length bins + 1
    pub bin_edges: Vec<f32>,

    pub channels: Vec<ChannelDensity>,

    /// Display cap for the density axis, derived from the 99.5th percentile
    /// of positive densities so one quantization spike cannot dominate
    pub y_cap: f32,
}

/// Evenly spaced indices over `0..len`, at most `count` of them.
///
/// Endpoints included; fractional positions truncate toward zero.
fn spaced_indices(len: usize, count: usize) -> Vec<usize> {
    let count = count.min(len);
    if count == 0 {
        return Vec::new();
    }
    if count == 1 {
        return vec![0];
    }
    let step = (len - 1) as f64 / (count - 1) as f64;
    (0..count).map(|i| (i as f64 * step) as usize).collect()
}

/// Evenly spaced x positions over [0, 1].
fn spaced_positions(count: usize) -> Vec<f32> {
    if count == 1 {
        return vec![0.0];
    }
    (0..count)
        .map(|i| i as f32 / (count - 1) as f32)
        .collect()
}

#[inline]
fn clamp_display(value: f32, max_display: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, max_display)
    } else {
        0.0
    }
}

/// Reduce the tensor to per-column min/max bands.
///
/// Selects up to `waveform_max_columns` evenly spaced columns; for each
/// selected column and visible channel the band spans the min and max
/// sample over all rows (NaN samples ignored), clamped to
/// [0, max_display].
pub fn envelope_waveform(
    tensor: &ImageTensor,
    visible: [bool; 3],
    config: &AnalysisConfig,
) -> EnvelopeWaveform {
    let columns = spaced_indices(tensor.width, config.waveform_max_columns);
    let x = spaced_positions(columns.len());

    let mut channels = Vec::new();
    for (slot, name) in CHANNEL_NAMES.iter().enumerate() {
        if !visible[slot] {
            continue;
        }

        let mut min = Vec::with_capacity(columns.len());
        let mut max = Vec::with_capacity(columns.len());
        for &col in &columns {
            let mut lo = f32::INFINITY;
            let mut hi = f32::NEG_INFINITY;
            for row in 0..tensor.height {
                let v = tensor.sample(row, col, slot);
                if v.is_nan() {
                    continue;
                }
                lo = lo.min(v);
                hi = hi.max(v);
            }
            if lo > hi {
                // Whole column was NaN
                lo = 0.0;
                hi = 0.0;
            }
            min.push(clamp_display(lo, config.max_display));
            max.push(clamp_display(hi, config.max_display));
        }

        channels.push(ChannelEnvelope {
            name,
            x: x.clone(),
            min,
            max,
        });
    }

    EnvelopeWaveform {
        channels,
        max_display: config.max_display,
    }
}

/// Reduce the tensor to a budgeted full-spectrum scatter.
///
/// Chooses up to `full_waveform_max_columns` columns, then as many evenly
/// spaced rows as the point budget allows, and emits one clamped point per
/// (column, row) pair per visible channel. Trades per-row precision for
/// full-spectrum visibility at bounded cost.
pub fn full_waveform(
    tensor: &ImageTensor,
    visible: [bool; 3],
    config: &AnalysisConfig,
) -> FullWaveform {
    let n_cols = config.full_waveform_max_columns.min(tensor.width).max(1);
    let n_rows = tensor
        .height
        .min((config.full_waveform_max_points / n_cols).max(1));

    let columns = spaced_indices(tensor.width, n_cols);
    let rows = spaced_indices(tensor.height, n_rows);
    let x_positions = spaced_positions(columns.len());

    let mut channels = Vec::new();
    for (slot, name) in CHANNEL_NAMES.iter().enumerate() {
        if !visible[slot] {
            continue;
        }

        let mut x = Vec::with_capacity(columns.len() * rows.len());
        let mut y = Vec::with_capacity(columns.len() * rows.len());
        for (ci, &col) in columns.iter().enumerate() {
            for &row in &rows {
                x.push(x_positions[ci]);
                y.push(clamp_display(
                    tensor.sample(row, col, slot),
                    config.max_display,
                ));
            }
        }

        channels.push(ChannelScatter { name, x, y });
    }

    FullWaveform {
        channels,
        max_display: config.max_display,
    }
}

/// Reduce the tensor to density histograms for the visible channels.
///
/// Finite samples are clipped to the configured range and binned into 256
/// bins (512 in detailed mode). Channel slots absent from the source are
/// skipped so their zero fill does not masquerade as a spike at 0; each
/// series is reported under the name of the channel occupying its slot,
/// which differs from the slot's own name when a channel is missing.
pub fn histogram(
    tensor: &ImageTensor,
    visible: [bool; 3],
    detailed: bool,
    config: &AnalysisConfig,
) -> HistogramSeries {
    let bins = if detailed {
        config.histogram_bins_detailed
    } else {
        config.histogram_bins
    };
    let lo = config.histogram_min;
    let hi = config.histogram_max;
    let bin_width = (hi - lo) / bins as f32;

    let bin_edges: Vec<f32> = (0..=bins)
        .map(|i| lo + i as f32 * (hi - lo) / bins as f32)
        .collect();

    let mut channels = Vec::new();
    for slot in 0..3 {
        if !visible[slot] {
            continue;
        }
        let name = match tensor.names[slot] {
            Some(name) => name,
            None => continue,
        };

        let mut counts = vec![0u64; bins];
        let mut total = 0u64;
        for pixel in 0..tensor.width * tensor.height {
            let v = tensor.data[pixel * 3 + slot];
            if !v.is_finite() {
                continue;
            }
            let clipped = v.clamp(lo, hi);
            let idx = (((clipped - lo) / bin_width) as usize).min(bins - 1);
            counts[idx] += 1;
            total += 1;
        }

        if total == 0 {
            continue;
        }

        let density = counts
            .iter()
            .map(|&c| c as f32 / (total as f32 * bin_width))
            .collect();
        channels.push(ChannelDensity { name, density });
    }

    let y_cap = density_cap(&channels, config);

    HistogramSeries {
        bin_edges,
        channels,
        y_cap,
    }
}

/// Display cap for the density axis: 99.5th percentile of all positive
/// densities across channels, scaled by 1.1, floored and clamped to the
/// configured ceiling.
fn density_cap(channels: &[ChannelDensity], config: &AnalysisConfig) -> f32 {
    let mut positive: Vec<f32> = channels
        .iter()
        .flat_map(|c| c.density.iter().copied())
        .filter(|v| v.is_finite() && *v > 0.0)
        .collect();

    if positive.is_empty() {
        return config.density_cap_default;
    }

    positive.sort_by(f32::total_cmp);
    let cap = percentile(&positive, config.density_percentile);
    (cap * 1.1)
        .max(config.density_cap_floor)
        .min(config.density_cap_ceiling)
}

/// Linearly interpolated percentile over sorted values.
fn percentile(sorted: &[f32], p: f32) -> f32 {
    let rank = (p as f64 / 100.0) * (sorted.len() - 1) as f64;
    let low = rank.floor() as usize;
    let high = rank.ceil() as usize;
    if low == high {
        return sorted[low];
    }
    let fraction = (rank - low as f64) as f32;
    sorted[low] + (sorted[high] - sorted[low]) * fraction
}
