//! Sound Queue: real-time PCM sample queue
//!
//! Buffers interleaved 16-bit PCM frames written by a non-real-time producer
//! and hands them, without allocation or blocking, to a real-time audio
//! callback driven by the platform's audio clock.
//!
//! # Architecture
//!
//! ```text
//! Producer Thread                                     Audio Callback
//!     │                                                     │
//! [SoundQueue::write]──────(lock-free SPSC ring)──────►[SampleReader::pull]
//!     │                                                     │
//! [sample_count / drain]                        [zero-fill on underrun]
//! ```
//!
//! The queue is split in two halves once playback starts:
//! - [`SoundQueue`] stays with the producer (`init`, `write`, `sample_count`)
//! - [`SampleReader`] moves into the audio callback (`pull`, `pull_into`)
//!
//! Overflow drops the newest frames instead of blocking the producer, so the
//! producer is responsible for pacing itself against [`SoundQueue::vacant_frames`].
//!
//! # Usage
//!
//! ```
//! use sound_queue::SoundQueue;
//!
//! let mut queue = SoundQueue::new();
//! queue.init(44_100, 2).unwrap();
//!
//! let mut reader = queue.take_reader().unwrap();
//! let report = queue.write(&[0i16; 512 * 2]).unwrap();
//! assert_eq!(report.written, 512);
//! assert_eq!(queue.sample_count().unwrap(), 512);
//!
//! let mut out = [0i16; 512 * 2];
//! assert_eq!(reader.pull(&mut out), 512);
//! assert_eq!(queue.sample_count().unwrap(), 0);
//! ```

pub mod config;
mod error;
mod format;
mod queue;

#[cfg(feature = "output")]
mod output;

pub use config::QueueConfig;
pub use error::QueueError;
pub use format::{MAX_CHANNELS, MAX_SAMPLE_RATE, StreamFormat};
pub use queue::{
    MetricsReporter, MetricsSnapshot, OutputSample, QueueState, SampleReader, SoundQueue,
    WriteReport,
};

#[cfg(feature = "output")]
pub use output::{AudioOutput, OutputError};
