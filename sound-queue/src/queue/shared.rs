//! State shared between the producer half and the reader half

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use ringbuf::HeapCons;

use super::metrics::QueueMetrics;

/// Shared by `SoundQueue` and its `SampleReader` through an `Arc`.
///
/// The parking slot is only locked when a reader is taken or released,
/// never from the real-time pull path.
pub(crate) struct Shared {
    /// Consumer half while no reader is attached
    parked: Mutex<Option<HeapCons<i16>>>,
    /// True while a `SampleReader` owns the consumer half
    reader_attached: AtomicBool,
    /// Producer signalled end of input
    draining: AtomicBool,
    pub metrics: QueueMetrics,
}

impl Shared {
    pub fn new(consumer: HeapCons<i16>) -> Self {
        Self {
            parked: Mutex::new(Some(consumer)),
            reader_attached: AtomicBool::new(false),
            draining: AtomicBool::new(false),
            metrics: QueueMetrics::default(),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<HeapCons<i16>>> {
        self.parked.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take the consumer half out of the parking slot and mark the reader attached
    pub fn attach(&self) -> Option<HeapCons<i16>> {
        let mut slot = self.slot();
        let consumer = slot.take()?;
        self.reader_attached.store(true, Ordering::Release);
        Some(consumer)
    }

    /// Return the consumer half to the parking slot
    pub fn park(&self, consumer: HeapCons<i16>) {
        let mut slot = self.slot();
        *slot = Some(consumer);
        self.reader_attached.store(false, Ordering::Release);
    }

    pub fn is_reader_attached(&self) -> bool {
        self.reader_attached.load(Ordering::Acquire)
    }

    pub fn set_draining(&self, draining: bool) {
        self.draining.store(draining, Ordering::Release);
    }

    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }
}
