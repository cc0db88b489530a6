//! Colorspace identification from chromaticity primaries
//!
//! Matches a file's (red, green, blue, white) chromaticity quadruple against
//! a fixed table of known standards by L1 distance. Never fails: missing or
//! malformed metadata yields "Unknown".

use crate::models::Chromaticities;

/// Known colorspaces and their primaries: red, green, blue, white point.
///
/// Registration order is fixed and significant: when two entries are
/// equidistant from the input, the earlier entry wins.
pub const KNOWN_CHROMATICITIES: &[(&str, [[f32; 2]; 4])] = &[
    (
        "ACES AP0",
        [[0.7347, 0.2653], [0.0, 1.0], [0.0001, -0.077], [0.3217, 0.3377]],
    ),
    (
        "ACES AP1 (ACEScg)",
        [[0.713, 0.293], [0.165, 0.830], [0.128, 0.044], [0.3217, 0.3377]],
    ),
    (
        "Rec.709 / sRGB",
        [[0.64, 0.33], [0.30, 0.60], [0.15, 0.06], [0.3127, 0.3290]],
    ),
    (
        "Rec.2020",
        [[0.708, 0.292], [0.170, 0.797], [0.131, 0.046], [0.3127, 0.3290]],
    ),
    (
        "DCI-P3",
        [[0.680, 0.320], [0.265, 0.690], [0.150, 0.060], [0.3140, 0.3510]],
    ),
];

/// Distance below which a match is considered exact.
const EXACT_THRESHOLD: f64 = 0.05;

/// Distance below which a match is reported with an "(approx)" suffix.
const APPROX_THRESHOLD: f64 = 0.15;

/// Sum of absolute coordinate differences across all 8 coordinates.
fn primary_distance(chrom: &Chromaticities, reference: &[[f32; 2]; 4]) -> f64 {
    let points = [chrom.red, chrom.green, chrom.blue, chrom.white];
    points
        .iter()
        .zip(reference.iter())
        .map(|(file, reference)| {
            (file[0] as f64 - reference[0] as f64).abs()
                + (file[1] as f64 - reference[1] as f64).abs()
        })
        .sum()
}

/// Identify the closest named colorspace for a set of primaries.
///
/// `< 0.05` distance reports the exact name, `< 0.15` the name suffixed
/// "(approx)", anything farther is "Unknown". A header without
/// chromaticities is also "Unknown".
pub fn identify_colorspace(chrom: Option<&Chromaticities>) -> String {
    let chrom = match chrom {
        Some(c) => c,
        None => return "Unknown".to_string(),
    };

    let mut best_match = "Unknown";
    let mut best_dist = f64::INFINITY;
    for (name, reference) in KNOWN_CHROMATICITIES {
        let dist = primary_distance(chrom, reference);
        if dist < best_dist {
            best_dist = dist;
            best_match = name;
        }
    }

    if best_dist < EXACT_THRESHOLD {
        best_match.to_string()
    } else if best_dist < APPROX_THRESHOLD {
        format!("{} (approx)", best_match)
    } else {
        "Unknown".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec709() -> Chromaticities {
        Chromaticities {
            red: [0.64, 0.33],
            green: [0.30, 0.60],
            blue: [0.15, 0.06],
            white: [0.3127, 0.3290],
        }
    }

    #[test]
    fn test_exact_rec709() {
        let chrom = rec709();
        assert_eq!(primary_distance(&chrom, &KNOWN_CHROMATICITIES[2].1), 0.0);
        assert_eq!(identify_colorspace(Some(&chrom)), "Rec.709 / sRGB");
    }

    #[test]
    fn test_approximate_match() {
        // Nudge each red coordinate by 0.04: total distance 0.08, inside
        // the approx band
        let mut chrom = rec709();
        chrom.red = [0.68, 0.37];
        assert_eq!(identify_colorspace(Some(&chrom)), "Rec.709 / sRGB (approx)");
    }

    #[test]
    fn test_far_primaries_are_unknown() {
        let chrom = Chromaticities {
            red: [0.9, 0.9],
            green: [0.9, 0.9],
            blue: [0.9, 0.9],
            white: [0.9, 0.9],
        };
        assert_eq!(identify_colorspace(Some(&chrom)), "Unknown");
    }

    #[test]
    fn test_missing_metadata_is_unknown() {
        assert_eq!(identify_colorspace(None), "Unknown");
    }

    #[test]
    fn test_exact_aces_ap0() {
        let chrom = Chromaticities {
            red: [0.7347, 0.2653],
            green: [0.0, 1.0],
            blue: [0.0001, -0.077],
            white: [0.3217, 0.3377],
        };
        assert_eq!(identify_colorspace(Some(&chrom)), "ACES AP0");
    }
}
