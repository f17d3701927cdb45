//! Producer half of the sound queue
//!
//! Lifecycle:
//!
//! ```text
//! Uninitialized ──init──► Initialized ──take_reader──► Playing ◄──write──┐
//!                              ▲                          │             │
//!                              └──────reader dropped──────┤──drain──► Draining
//! ```
//!
//! Dropping the `SoundQueue` is the terminal `Destroyed` state.

mod metrics;
mod reader;
mod shared;


use std::sync::Arc;

use ringbuf::traits::{Observer, Producer, Split};
use ringbuf::{HeapProd, HeapRb};
use tracing::{debug, warn};

use crate::config::QueueConfig;
use crate::error::QueueError;
use crate::format::StreamFormat;

pub use metrics::{MetricsReporter, MetricsSnapshot};
pub use reader::{OutputSample, SampleReader};

use shared::Shared;

/// Observable lifecycle state of a [`SoundQueue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    /// Created, no ring allocated yet
    Uninitialized,
    /// Ring allocated, no audio callback attached
    Initialized,
    /// Audio callback attached, producer feeding
    Playing,
    /// Audio callback attached, producer finished; emptying what is queued
    Draining,
}

/// Outcome of a [`SoundQueue::write`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteReport {
    /// Frames appended to the ring
    pub written: usize,
    /// Newest frames discarded because the ring was full
    pub dropped: usize,
}

impl WriteReport {
    /// True if any frames were dropped
    pub fn overflowed(&self) -> bool {
        self.dropped > 0
    }
}

/// Ring state allocated by `init`
struct Ring {
    format: StreamFormat,
    capacity_frames: usize,
    producer: HeapProd<i16>,
    shared: Arc<Shared>,
}

impl Ring {
    fn queued_frames(&self) -> usize {
        self.format.frames_in(self.producer.occupied_len())
    }

    fn snapshot(&self) -> MetricsSnapshot {
        self.shared
            .metrics
            .snapshot(self.queued_frames(), self.capacity_frames)
    }
}

/// Bounded single-producer/single-consumer queue of interleaved i16 frames
///
/// Owned by the producer thread. The consumer half is detached with
/// [`take_reader`](Self::take_reader) and moved into the audio callback.
pub struct SoundQueue {
    config: QueueConfig,
    reporter: MetricsReporter,
    ring: Option<Ring>,
}

impl SoundQueue {
    /// Create an uninitialized queue with default configuration
    pub fn new() -> Self {
        Self::with_config(QueueConfig::default())
    }

    /// Create an uninitialized queue
    pub fn with_config(config: QueueConfig) -> Self {
        Self {
            reporter: MetricsReporter::new(config.report_interval_ms),
            config,
            ring: None,
        }
    }

    /// Bind the stream format and allocate the ring.
    ///
    /// Re-initializing an idle queue discards anything still queued.
    ///
    /// # Errors
    ///
    /// - [`QueueError::InvalidFormat`] for a zero rate or an out of range channel count
    /// - [`QueueError::ReaderAttached`] while an audio callback holds the reader
    pub fn init(&mut self, sample_rate: u32, channels: u16) -> Result<(), QueueError> {
        let format = StreamFormat::new(sample_rate.into(), channels.into())?;
        self.init_with_format(format)
    }

    /// Bind an already validated stream format and allocate the ring.
    pub fn init_with_format(&mut self, format: StreamFormat) -> Result<(), QueueError> {
        if self
            .ring
            .as_ref()
            .is_some_and(|ring| ring.shared.is_reader_attached())
        {
            warn!("Sound queue init rejected: audio callback still attached");
            return Err(QueueError::ReaderAttached);
        }

        let latency_ms = self.config.effective_latency_ms();
        let capacity_frames = format.capacity_frames(latency_ms);
        let (producer, consumer) = HeapRb::<i16>::new(format.samples_in(capacity_frames)).split();

        self.ring = Some(Ring {
            format,
            capacity_frames,
            producer,
            shared: Arc::new(Shared::new(consumer)),
        });
        self.reporter = MetricsReporter::new(self.config.report_interval_ms);

        debug!(
            "Sound queue initialized: {}Hz, {} channel(s), {} frames (~{}ms)",
            format.sample_rate(),
            format.channels(),
            capacity_frames,
            latency_ms
        );
        Ok(())
    }

    /// Current lifecycle state
    pub fn state(&self) -> QueueState {
        match &self.ring {
            None => QueueState::Uninitialized,
            Some(ring) if !ring.shared.is_reader_attached() => QueueState::Initialized,
            Some(ring) if ring.shared.is_draining() => QueueState::Draining,
            Some(_) => QueueState::Playing,
        }
    }

    /// Format bound by `init`
    pub fn format(&self) -> Option<StreamFormat> {
        self.ring.as_ref().map(|ring| ring.format)
    }

    /// Configuration the queue was created with
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Frames queued and not yet pulled by the reader.
    ///
    /// Lock-free: reads both ring cursors.
    pub fn sample_count(&self) -> Result<usize, QueueError> {
        self.ring
            .as_ref()
            .map(Ring::queued_frames)
            .ok_or(QueueError::NotInitialized)
    }

    /// Frames that can be written right now without dropping
    pub fn vacant_frames(&self) -> Result<usize, QueueError> {
        self.ring
            .as_ref()
            .map(|ring| ring.format.frames_in(ring.producer.vacant_len()))
            .ok_or(QueueError::NotInitialized)
    }

    /// Ring capacity in frames
    pub fn capacity_frames(&self) -> Result<usize, QueueError> {
        self.ring
            .as_ref()
            .map(|ring| ring.capacity_frames)
            .ok_or(QueueError::NotInitialized)
    }

    /// Append interleaved frames to the tail of the ring.
    ///
    /// Never blocks. Frames that do not fit are dropped from the end of
    /// `samples` and reported in the returned [`WriteReport`]. A non-empty
    /// write ends a pending drain.
    ///
    /// # Errors
    ///
    /// - [`QueueError::NotInitialized`] before `init`
    /// - [`QueueError::PartialFrame`] if `samples` is not whole frames
    pub fn write(&mut self, samples: &[i16]) -> Result<WriteReport, QueueError> {
        let ring = self.ring.as_mut().ok_or(QueueError::NotInitialized)?;
        let format = ring.format;

        if format.samples_in(format.frames_in(samples.len())) != samples.len() {
            return Err(QueueError::PartialFrame {
                len: samples.len(),
                channels: format.channels(),
            });
        }

        let requested = format.frames_in(samples.len());
        if requested == 0 {
            return Ok(WriteReport::default());
        }

        let vacant = format.frames_in(ring.producer.vacant_len());
        let accepted = requested.min(vacant);
        let pushed = ring
            .producer
            .push_slice(&samples[..format.samples_in(accepted)]);
        let written = format.frames_in(pushed);
        let dropped = requested - written;

        ring.shared.metrics.record_write(written, dropped);
        ring.shared.set_draining(false);

        if dropped > 0 {
            debug!("Sound queue overflow: dropped {} frames", dropped);
        }
        self.reporter.maybe_log(ring.snapshot());

        Ok(WriteReport { written, dropped })
    }

    /// Mark end of input: the reader plays out what is queued.
    pub fn drain(&mut self) -> Result<(), QueueError> {
        let ring = self.ring.as_ref().ok_or(QueueError::NotInitialized)?;
        ring.shared.set_draining(true);
        Ok(())
    }

    /// True once `drain` was called and the reader has emptied the ring
    pub fn is_drained(&self) -> bool {
        self.ring
            .as_ref()
            .is_some_and(|ring| ring.shared.is_draining() && ring.queued_frames() == 0)
    }

    /// Detach the consumer half for the audio callback.
    ///
    /// # Errors
    ///
    /// - [`QueueError::NotInitialized`] before `init`
    /// - [`QueueError::ReaderTaken`] if a reader is already attached
    pub fn take_reader(&mut self) -> Result<SampleReader, QueueError> {
        let ring = self.ring.as_ref().ok_or(QueueError::NotInitialized)?;
        let consumer = ring.shared.attach().ok_or(QueueError::ReaderTaken)?;
        debug!("Sound queue reader attached");
        Ok(SampleReader::new(
            consumer,
            ring.shared.clone(),
            ring.format,
            ring.capacity_frames,
        ))
    }

    /// Counter snapshot, `None` before `init`
    pub fn metrics(&self) -> Option<MetricsSnapshot> {
        self.ring.as_ref().map(Ring::snapshot)
    }
}

impl Default for SoundQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SoundQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundQueue")
            .field("state", &self.state())
            .field("format", &self.format())
            .field("config", &self.config)
            .finish()
    }
}
