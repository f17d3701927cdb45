//! Stream format validation and ring sizing

use crate::error::QueueError;

/// Upper bound on interleaved channels per frame
pub const MAX_CHANNELS: u16 = 32;

/// Upper bound on sample rate in Hz
pub const MAX_SAMPLE_RATE: u32 = 768_000;

/// Ring capacity is rounded up to a multiple of this many frames
const FRAME_GRANULE: usize = 64;

/// Validated sample rate and channel layout bound at init
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    sample_rate: u32,
    channels: u16,
}

impl StreamFormat {
    /// Validate a format coming from a loosely typed caller (C `long`/`int`).
    pub fn new(sample_rate: i64, channels: i64) -> Result<Self, QueueError> {
        let invalid = QueueError::InvalidFormat {
            sample_rate,
            channels,
        };

        let sample_rate = u32::try_from(sample_rate)
            .ok()
            .filter(|&rate| rate > 0 && rate <= MAX_SAMPLE_RATE)
            .ok_or(invalid.clone())?;
        let channels = u16::try_from(channels)
            .ok()
            .filter(|&ch| ch > 0 && ch <= MAX_CHANNELS)
            .ok_or(invalid)?;

        Ok(Self {
            sample_rate,
            channels,
        })
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Interleaved values per frame
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Ring capacity in frames for a latency target, rounded up to a 64-frame boundary.
    ///
    /// 50 ms at 44.1 kHz = 2205 frames -> 2240 frames.
    pub fn capacity_frames(&self, latency_ms: u32) -> usize {
        let frames = (self.sample_rate as u64 * latency_ms as u64).div_ceil(1000) as usize;
        frames.max(1).next_multiple_of(FRAME_GRANULE)
    }

    /// Number of whole frames in `samples` interleaved values
    pub(crate) fn frames_in(&self, samples: usize) -> usize {
        samples / self.channels as usize
    }

    /// Number of interleaved values in `frames` frames
    pub(crate) fn samples_in(&self, frames: usize) -> usize {
        frames * self.channels as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_positive() {
        assert!(StreamFormat::new(0, 2).is_err());
        assert!(StreamFormat::new(-44_100, 2).is_err());
        assert!(StreamFormat::new(44_100, 0).is_err());
        assert!(StreamFormat::new(44_100, -1).is_err());
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(StreamFormat::new(i64::from(u32::MAX) + 1, 2).is_err());
        assert!(StreamFormat::new(44_100, i64::from(MAX_CHANNELS) + 1).is_err());
    }

    #[test]
    fn test_rejects_rate_above_max() {
        assert!(StreamFormat::new(i64::from(u32::MAX), 32).is_err());
        assert!(StreamFormat::new(i64::from(MAX_SAMPLE_RATE) + 1, 2).is_err());

        let format =
            StreamFormat::new(i64::from(MAX_SAMPLE_RATE), i64::from(MAX_CHANNELS)).unwrap();
        assert_eq!(format.sample_rate(), MAX_SAMPLE_RATE);
    }

    #[test]
    fn test_error_carries_inputs() {
        assert_eq!(
            StreamFormat::new(0, 2),
            Err(QueueError::InvalidFormat {
                sample_rate: 0,
                channels: 2
            })
        );
    }

    #[test]
    fn test_capacity_rounds_to_granule() {
        let format = StreamFormat::new(44_100, 2).unwrap();
        assert_eq!(format.capacity_frames(50), 2240);
        assert_eq!(format.capacity_frames(50) % FRAME_GRANULE, 0);

        let format = StreamFormat::new(48_000, 1).unwrap();
        assert_eq!(format.capacity_frames(20), 960);
    }

    #[test]
    fn test_capacity_never_zero() {
        let format = StreamFormat::new(1, 1).unwrap();
        assert_eq!(format.capacity_frames(5), FRAME_GRANULE);
    }
}
