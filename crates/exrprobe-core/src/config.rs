//! Analysis configuration
//!
//! Reduction caps, histogram parameters, and rating thresholds, loaded once
//! at startup and immutable afterwards. A YAML file can override the
//! defaults; missing or malformed files fall back to defaults with a
//! warning rather than failing the run.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

// Global verbose flag for controlling debug output
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set the global verbose flag. When true, debug messages will be printed.
pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::SeqCst);
}

/// Check if verbose mode is enabled.
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Print a message to stderr only if verbose mode is enabled.
#[macro_export]
macro_rules! verbose_println {
    ($($arg:tt)*) => {
        if $crate::config::is_verbose() {
            eprintln!($($arg)*);
        }
    };
}

/// Canonical list of candidate config file names we search for on disk.
const CONFIG_FILENAMES: &[&str] = &["exrprobe.yml", "exrprobe.yaml"];

/// Effective-bits thresholds for the five rating tiers. Each bound is
/// inclusive.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RatingThresholds {
    pub cinema_grade: f64,
    pub good: f64,
    pub acceptable: f64,
    pub poor: f64,
}

impl Default for RatingThresholds {
    fn default() -> Self {
        Self {
            cinema_grade: 13.0,
            good: 11.5,
            acceptable: 10.0,
            poor: 8.5,
        }
    }
}

/// Tunable caps and thresholds for analysis and reduction.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Maximum columns in the envelope waveform
    pub waveform_max_columns: usize,

    /// Total point budget for the full-spectrum waveform
    pub full_waveform_max_points: usize,

    /// Maximum columns for the full-spectrum waveform
    pub full_waveform_max_columns: usize,

    /// Histogram bin count, normal mode
    pub histogram_bins: usize,

    /// Histogram bin count, detailed mode
    pub histogram_bins_detailed: usize,

    /// Lower edge of the histogram range
    pub histogram_min: f32,

    /// Upper edge of the histogram range
    pub histogram_max: f32,

    /// Percentile of positive densities used for the y-axis cap
    pub density_percentile: f32,

    /// Minimum y-axis cap
    pub density_cap_floor: f32,

    /// Hard ceiling on the y-axis cap
    pub density_cap_ceiling: f32,

    /// Cap used when no densities exist at all
    pub density_cap_default: f32,

    /// Upper clamp for waveform display values
    pub max_display: f32,

    /// Rating tier thresholds
    pub rating: RatingThresholds,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            waveform_max_columns: 1200,
            full_waveform_max_points: 150_000,
            full_waveform_max_columns: 500,
            histogram_bins: 256,
            histogram_bins_detailed: 512,
            histogram_min: -0.1,
            histogram_max: 2.0,
            density_percentile: 99.5,
            density_cap_floor: 0.5,
            density_cap_ceiling: 100.0,
            density_cap_default: 10.0,
            max_display: 1.1,
            rating: RatingThresholds::default(),
        }
    }
}

impl AnalysisConfig {
    /// Clamp out-of-range values back to something usable.
    fn sanitize(mut self) -> Self {
        let defaults = Self::default();
        if self.waveform_max_columns == 0 {
            self.waveform_max_columns = defaults.waveform_max_columns;
        }
        if self.full_waveform_max_points == 0 {
            self.full_waveform_max_points = defaults.full_waveform_max_points;
        }
        if self.full_waveform_max_columns == 0 {
            self.full_waveform_max_columns = defaults.full_waveform_max_columns;
        }
        // A column cap above the point budget would force at least one
        // point per column and overrun the budget
        if self.full_waveform_max_columns > self.full_waveform_max_points {
            self.full_waveform_max_columns = self.full_waveform_max_points;
        }
        if self.histogram_bins == 0 {
            self.histogram_bins = defaults.histogram_bins;
        }
        if self.histogram_bins_detailed == 0 {
            self.histogram_bins_detailed = defaults.histogram_bins_detailed;
        }
        if self.histogram_max <= self.histogram_min {
            self.histogram_min = defaults.histogram_min;
            self.histogram_max = defaults.histogram_max;
        }
        self.density_percentile = self.density_percentile.clamp(0.0, 100.0);
        if self.max_display <= 0.0 {
            self.max_display = defaults.max_display;
        }
        self
    }
}

/// Loaded configuration plus its source path and any warnings produced
/// while loading.
pub struct ConfigHandle {
    pub config: AnalysisConfig,
    pub source: Option<PathBuf>,
    pub warnings: Vec<String>,
}

/// Load configuration from an explicit path, or search the working
/// directory for the canonical file names. Falls back to defaults when
/// nothing is found or parsing fails.
pub fn load_config(explicit: Option<&Path>) -> ConfigHandle {
    let mut warnings = Vec::new();

    let candidate = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => CONFIG_FILENAMES
            .iter()
            .map(PathBuf::from)
            .find(|p| p.is_file()),
    };

    let path = match candidate {
        Some(p) => p,
        None => {
            return ConfigHandle {
                config: AnalysisConfig::default(),
                source: None,
                warnings,
            };
        }
    };

    match fs::read_to_string(&path) {
        Ok(contents) => match serde_yaml::from_str::<AnalysisConfig>(&contents) {
            Ok(config) => {
                verbose_println!("[exrprobe] loaded config from {}", path.display());
                ConfigHandle {
                    config: config.sanitize(),
                    source: Some(path),
                    warnings,
                }
            }
            Err(e) => {
                warnings.push(format!(
                    "Failed to parse {}: {}. Using defaults.",
                    path.display(),
                    e
                ));
                ConfigHandle {
                    config: AnalysisConfig::default(),
                    source: None,
                    warnings,
                }
            }
        },
        Err(e) => {
            warnings.push(format!(
                "Failed to read {}: {}. Using defaults.",
                path.display(),
                e
            ));
            ConfigHandle {
                config: AnalysisConfig::default(),
                source: None,
                warnings,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let config = AnalysisConfig::default();
        assert_eq!(config.waveform_max_columns, 1200);
        assert_eq!(config.full_waveform_max_points, 150_000);
        assert_eq!(config.histogram_bins, 256);
        assert!(config.histogram_min < config.histogram_max);
        assert_eq!(config.rating.good, 11.5);
    }

    #[test]
    fn test_sanitize_recovers_nonsense() {
        let mut config = AnalysisConfig::default();
        config.histogram_bins = 0;
        config.histogram_min = 5.0;
        config.histogram_max = 1.0;
        config.max_display = -2.0;
        config.density_percentile = 250.0;

        let config = config.sanitize();
        assert_eq!(config.histogram_bins, 256);
        assert!(config.histogram_min < config.histogram_max);
        assert_eq!(config.max_display, 1.1);
        assert_eq!(config.density_percentile, 100.0);
    }

    #[test]
    fn test_sanitize_clamps_columns_to_point_budget() {
        let mut config = AnalysisConfig::default();
        config.full_waveform_max_points = 100;

        let config = config.sanitize();
        assert_eq!(config.full_waveform_max_columns, 100);
        assert!(config.full_waveform_max_columns <= config.full_waveform_max_points);
    }

    #[test]
    fn test_yaml_partial_override() {
        let yaml = "histogram_bins: 128\nrating:\n  good: 12.0\n";
        let config: AnalysisConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.histogram_bins, 128);
        assert_eq!(config.rating.good, 12.0);
        // Everything else keeps defaults
        assert_eq!(config.waveform_max_columns, 1200);
        assert_eq!(config.rating.poor, 8.5);
    }

    #[test]
    fn test_missing_config_falls_back_to_defaults() {
        let handle = load_config(Some(Path::new("/nonexistent/exrprobe.yml")));
        assert!(handle.source.is_none());
        assert_eq!(handle.warnings.len(), 1);
        assert_eq!(handle.config.histogram_bins, 256);
    }
}
