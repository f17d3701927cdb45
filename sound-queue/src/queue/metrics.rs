//! Queue health counters and periodic diagnostics

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tracing::debug;

/// Counters shared by the producer and the real-time reader.
///
/// Relaxed ordering only: these are diagnostics, the ring cursors carry the
/// synchronization.
#[derive(Debug, Default)]
pub(crate) struct QueueMetrics {
    frames_written: AtomicU64,
    frames_dropped: AtomicU64,
    frames_played: AtomicU64,
    overflows: AtomicU64,
    underruns: AtomicU64,
}

impl QueueMetrics {
    pub fn record_write(&self, written: usize, dropped: usize) {
        self.frames_written
            .fetch_add(written as u64, Ordering::Relaxed);
        if dropped > 0 {
            self.frames_dropped
                .fetch_add(dropped as u64, Ordering::Relaxed);
            self.overflows.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_pull(&self, delivered: usize, requested: usize) {
        self.frames_played
            .fetch_add(delivered as u64, Ordering::Relaxed);
        if delivered < requested {
            self.underruns.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self, queued_frames: usize, capacity_frames: usize) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_written: self.frames_written.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            frames_played: self.frames_played.load(Ordering::Relaxed),
            overflows: self.overflows.load(Ordering::Relaxed),
            underruns: self.underruns.load(Ordering::Relaxed),
            queued_frames,
            capacity_frames,
        }
    }
}

/// Point-in-time copy of the queue counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Total frames accepted by write()
    pub frames_written: u64,
    /// Total frames dropped because the ring was full
    pub frames_dropped: u64,
    /// Total frames delivered to the audio callback
    pub frames_played: u64,
    /// Number of writes that dropped frames
    pub overflows: u64,
    /// Number of pulls that had to pad with silence
    pub underruns: u64,
    /// Frames queued when the snapshot was taken
    pub queued_frames: usize,
    /// Ring capacity in frames
    pub capacity_frames: usize,
}

impl MetricsSnapshot {
    /// Buffer fill level in percent
    pub fn fill_percent(&self) -> f64 {
        if self.capacity_frames == 0 {
            return 0.0;
        }
        self.queued_frames as f64 / self.capacity_frames as f64 * 100.0
    }
}

/// Producer-side rate limited metrics logger
///
/// Tracks min/max fill between log lines and reports per-interval deltas.
#[derive(Debug)]
pub struct MetricsReporter {
    interval: Option<Duration>,
    last_log_time: Instant,
    last: MetricsSnapshot,
    fill_min: usize,
    fill_max: usize,
}

impl MetricsReporter {
    /// `interval_ms == 0` disables logging
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval: (interval_ms > 0).then(|| Duration::from_millis(interval_ms)),
            last_log_time: Instant::now(),
            last: MetricsSnapshot::default(),
            fill_min: usize::MAX,
            fill_max: 0,
        }
    }

    /// Fold a snapshot in and log if the interval has elapsed.
    ///
    /// Returns true if a line was logged.
    pub fn maybe_log(&mut self, snapshot: MetricsSnapshot) -> bool {
        let Some(interval) = self.interval else {
            return false;
        };

        self.fill_min = self.fill_min.min(snapshot.queued_frames);
        self.fill_max = self.fill_max.max(snapshot.queued_frames);

        if self.last_log_time.elapsed() < interval {
            return false;
        }

        let capacity = snapshot.capacity_frames.max(1) as f64;
        debug!(
            "sound queue: buf={:.1}% (min={:.1}%, max={:.1}%), written={}, played={}, \
             dropped={}, overflows={}, underruns={}",
            snapshot.fill_percent(),
            self.fill_min as f64 / capacity * 100.0,
            self.fill_max as f64 / capacity * 100.0,
            snapshot.frames_written.saturating_sub(self.last.frames_written),
            snapshot.frames_played.saturating_sub(self.last.frames_played),
            snapshot.frames_dropped.saturating_sub(self.last.frames_dropped),
            snapshot.overflows.saturating_sub(self.last.overflows),
            snapshot.underruns.saturating_sub(self.last.underruns),
        );

        self.last = snapshot;
        self.fill_min = snapshot.queued_frames;
        self.fill_max = snapshot.queued_frames;
        self.last_log_time = Instant::now();
        true
    }
}
