//! Channel decoding and the EXR input boundary
//!
//! The engine never parses the EXR container itself: `ImageSource::from_file`
//! delegates to the `exr` crate and hands the engine a header plus raw
//! per-channel sample buffers. Everything downstream of that boundary is
//! pure and deterministic.

use std::path::Path;

use half::f16;

use crate::error::{AnalysisError, MismatchedSize};
use crate::models::{
    ChannelInfo, ChannelSample, Chromaticities, ImageHeader, SampleFormat,
};

/// Raw sample buffer for one channel, at its native format.
#[derive(Debug, Clone)]
pub enum RawSamples {
    F16(Vec<f16>),
    F32(Vec<f32>),
    U32(Vec<u32>),
}

impl RawSamples {
    pub fn len(&self) -> usize {
        match self {
            RawSamples::F16(v) => v.len(),
            RawSamples::F32(v) => v.len(),
            RawSamples::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn format(&self) -> SampleFormat {
        match self {
            RawSamples::F16(_) => SampleFormat::Half,
            RawSamples::F32(_) => SampleFormat::Float,
            RawSamples::U32(_) => SampleFormat::Uint,
        }
    }
}

/// One channel as read from the container: name plus native samples.
#[derive(Debug, Clone)]
pub struct RawChannel {
    pub name: String,
    pub samples: RawSamples,
}

/// A readable image: parsed header plus raw channel buffers.
///
/// Constructed once per file; analysis and reduction never go back to disk.
#[derive(Debug, Clone)]
pub struct ImageSource {
    pub header: ImageHeader,
    channels: Vec<RawChannel>,
}

impl ImageSource {
    /// Read an EXR file from disk via the `exr` crate.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AnalysisError> {
        use exr::prelude::*;

        let path = path.as_ref();

        let image = read()
            .no_deep_data()
            .largest_resolution_level()
            .all_channels()
            .first_valid_layer()
            .all_attributes()
            .from_file(path)
            .map_err(|e| AnalysisError::SourceRead(e.to_string()))?;

        let file_size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.to_string());

        let layer = image.layer_data;
        let width = layer.size.width();
        let height = layer.size.height();
        let compression = format!("{:?}", layer.encoding.compression);

        let chromaticities = image.attributes.chromaticities.map(|c| Chromaticities {
            red: [c.red.0, c.red.1],
            green: [c.green.0, c.green.1],
            blue: [c.blue.0, c.blue.1],
            white: [c.white.0, c.white.1],
        });

        let mut channels = Vec::with_capacity(layer.channel_data.list.len());
        for channel in layer.channel_data.list {
            let samples = match channel.sample_data {
                FlatSamples::F16(v) => RawSamples::F16(v),
                FlatSamples::F32(v) => RawSamples::F32(v),
                FlatSamples::U32(v) => RawSamples::U32(v),
            };
            channels.push(RawChannel {
                name: channel.name.to_string(),
                samples,
            });
        }

        let infos = channels
            .iter()
            .map(|c| ChannelInfo {
                name: c.name.clone(),
                format: c.samples.format(),
            })
            .collect();

        Ok(Self {
            header: ImageHeader {
                width,
                height,
                compression,
                chromaticities,
                channels: infos,
                file_name,
                file_size,
            },
            channels,
        })
    }

    /// Assemble a source from already-read parts. Used by callers that decode
    /// elsewhere and by tests.
    pub fn from_parts(header: ImageHeader, channels: Vec<RawChannel>) -> Self {
        Self { header, channels }
    }

    /// Raw buffer for a named channel, if present.
    pub fn channel(&self, name: &str) -> Option<&RawChannel> {
        self.channels.iter().find(|c| c.name == name)
    }
}

/// Decode one named channel to a normalized f32 sequence.
///
/// HALF samples are widened to f32; FLOAT samples pass through; any other
/// declared format is read as f32 best-effort and labeled with its raw
/// format name. Fails when the channel is absent or its buffer length does
/// not equal width * height.
pub fn decode_channel(source: &ImageSource, name: &str) -> Result<ChannelSample, AnalysisError> {
    let channel = source
        .channel(name)
        .ok_or_else(|| AnalysisError::MissingChannel(name.to_string()))?;

    let expected = source.header.pixel_count();
    if channel.samples.len() != expected {
        return Err(AnalysisError::BufferSizeMismatch(
            name.to_string(),
            MismatchedSize {
                expected,
                received: channel.samples.len(),
            },
        ));
    }

    let format = channel.samples.format();
    let samples = match &channel.samples {
        RawSamples::F32(v) => v.clone(),
        RawSamples::F16(v) => v.iter().map(|s| s.to_f32()).collect(),
        // Degraded mode: no float representation declared, read the raw
        // integer samples as floats
        RawSamples::U32(v) => v.iter().map(|&s| s as f32).collect(),
    };

    Ok(ChannelSample {
        name: name.to_string(),
        format,
        bit_label: format.bit_label().to_string(),
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_header(width: usize, height: usize, channels: &[(&str, SampleFormat)]) -> ImageHeader {
        ImageHeader {
            width,
            height,
            compression: "ZIP16".to_string(),
            chromaticities: None,
            channels: channels
                .iter()
                .map(|(name, format)| ChannelInfo {
                    name: name.to_string(),
                    format: *format,
                })
                .collect(),
            file_name: None,
            file_size: 0,
        }
    }

    #[test]
    fn test_decode_float_passthrough() {
        let header = test_header(2, 2, &[("R", SampleFormat::Float)]);
        let source = ImageSource::from_parts(
            header,
            vec![RawChannel {
                name: "R".to_string(),
                samples: RawSamples::F32(vec![0.0, 0.5, 1.0, 2.0]),
            }],
        );

        let sample = decode_channel(&source, "R").unwrap();
        assert_eq!(sample.bit_label, "32-bit FLOAT");
        assert_eq!(sample.samples, vec![0.0, 0.5, 1.0, 2.0]);
    }

    #[test]
    fn test_decode_half_widens() {
        let header = test_header(2, 1, &[("G", SampleFormat::Half)]);
        let source = ImageSource::from_parts(
            header,
            vec![RawChannel {
                name: "G".to_string(),
                samples: RawSamples::F16(vec![f16::from_f32(0.25), f16::from_f32(1.5)]),
            }],
        );

        let sample = decode_channel(&source, "G").unwrap();
        assert_eq!(sample.bit_label, "16-bit HALF");
        assert_eq!(sample.format, SampleFormat::Half);
        assert_eq!(sample.samples, vec![0.25, 1.5]);
    }

    #[test]
    fn test_decode_uint_fallback_label() {
        let header = test_header(2, 1, &[("Z", SampleFormat::Uint)]);
        let source = ImageSource::from_parts(
            header,
            vec![RawChannel {
                name: "Z".to_string(),
                samples: RawSamples::U32(vec![0, 42]),
            }],
        );

        let sample = decode_channel(&source, "Z").unwrap();
        assert_eq!(sample.bit_label, "UINT");
        assert_eq!(sample.samples, vec![0.0, 42.0]);
    }

    #[test]
    fn test_missing_channel_fails() {
        let header = test_header(2, 2, &[("R", SampleFormat::Float)]);
        let source = ImageSource::from_parts(header, vec![]);

        let err = decode_channel(&source, "R").unwrap_err();
        assert_eq!(err, AnalysisError::MissingChannel("R".to_string()));
    }

    #[test]
    fn test_buffer_length_mismatch_fails() {
        let header = test_header(2, 2, &[("R", SampleFormat::Float)]);
        let source = ImageSource::from_parts(
            header,
            vec![RawChannel {
                name: "R".to_string(),
                samples: RawSamples::F32(vec![0.0, 1.0]),
            }],
        );

        let err = decode_channel(&source, "R").unwrap_err();
        assert_eq!(
            err,
            AnalysisError::BufferSizeMismatch(
                "R".to_string(),
                MismatchedSize {
                    expected: 4,
                    received: 2,
                }
            )
        );
    }
}
