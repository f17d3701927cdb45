//! Interleaved i16 audio to feed the queue

use std::path::Path;

use anyhow::{Context, Result, bail};

/// Decoded audio held in memory
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub sample_rate: u32,
    pub channels: u16,
    /// Interleaved samples
    pub samples: Vec<i16>,
}

impl Source {
    /// Load a 16-bit integer PCM WAV file
    pub fn from_wav(path: &Path) -> Result<Self> {
        let mut reader = hound::WavReader::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let spec = reader.spec();

        if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
            bail!(
                "{}: only 16-bit integer PCM is supported (got {}-bit {:?})",
                path.display(),
                spec.bits_per_sample,
                spec.sample_format
            );
        }

        let samples = reader
            .samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to read samples from {}", path.display()))?;

        Ok(Self {
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            samples,
        })
    }

    /// Sine tone at half scale, same value on every channel
    pub fn tone(freq: f32, seconds: f32, sample_rate: u32, channels: u16) -> Self {
        let frames = (seconds.max(0.0) * sample_rate as f32) as usize;
        let step = std::f32::consts::TAU * freq / sample_rate.max(1) as f32;

        let samples = (0..frames)
            .flat_map(|i| {
                let value = ((i as f32 * step).sin() * 16384.0) as i16;
                std::iter::repeat_n(value, channels as usize)
            })
            .collect();

        Self {
            sample_rate,
            channels,
            samples,
        }
    }

    /// Number of whole frames
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_length_and_layout() {
        let source = Source::tone(440.0, 0.5, 48_000, 2);
        assert_eq!(source.frames(), 24_000);
        assert_eq!(source.samples.len(), 48_000);
        assert!(source.samples.chunks(2).all(|f| f[0] == f[1]));
        assert_eq!(source.samples[0], 0);
        assert!(source.samples.iter().all(|&s| s.abs() <= 16384));
    }

    #[test]
    fn test_tone_negative_duration_is_empty() {
        assert_eq!(Source::tone(440.0, -1.0, 44_100, 1).frames(), 0);
    }

    #[test]
    fn test_wav_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 22_050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for s in [1i16, -1, 300, -300] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let source = Source::from_wav(&path).unwrap();
        assert_eq!(source.sample_rate, 22_050);
        assert_eq!(source.channels, 2);
        assert_eq!(source.samples, vec![1, -1, 300, -300]);
    }

    #[test]
    fn test_wav_rejects_float() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("float.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44_100,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        writer.write_sample(0.5f32).unwrap();
        writer.finalize().unwrap();

        assert!(Source::from_wav(&path).is_err());
    }
}
