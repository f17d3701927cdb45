//! Real-time reader half of the sound queue
//!
//! Everything reachable from `pull`/`pull_into` is wait-free: no allocation,
//! no locks, no logging. Faults degrade to silence.

use std::sync::Arc;

use ringbuf::HeapCons;
use ringbuf::traits::{Consumer, Observer};

use super::shared::Shared;
use crate::format::StreamFormat;

/// Device sample type the reader can convert 16-bit PCM into
pub trait OutputSample: Copy + Send + 'static {
    /// Value the device treats as silence
    const SILENCE: Self;

    fn from_i16(sample: i16) -> Self;
}

impl OutputSample for i16 {
    const SILENCE: Self = 0;

    #[inline]
    fn from_i16(sample: i16) -> Self {
        sample
    }
}

impl OutputSample for f32 {
    const SILENCE: Self = 0.0;

    #[inline]
    fn from_i16(sample: i16) -> Self {
        sample as f32 / 32768.0
    }
}

impl OutputSample for u16 {
    // 0x8000 is silence for unsigned PCM
    const SILENCE: Self = 32768;

    #[inline]
    fn from_i16(sample: i16) -> Self {
        (sample as i32 + 32768) as u16
    }
}

/// Consumer half of a [`SoundQueue`](crate::SoundQueue)
///
/// Move this into the platform audio callback. Dropping it detaches the
/// callback and hands the ring back to the queue.
pub struct SampleReader {
    consumer: Option<HeapCons<i16>>,
    shared: Arc<Shared>,
    format: StreamFormat,
    /// Conversion buffer for `pull_into`, sized to the ring capacity
    scratch: Box<[i16]>,
}

impl SampleReader {
    pub(crate) fn new(
        consumer: HeapCons<i16>,
        shared: Arc<Shared>,
        format: StreamFormat,
        capacity_frames: usize,
    ) -> Self {
        Self {
            consumer: Some(consumer),
            shared,
            format,
            scratch: vec![0; format.samples_in(capacity_frames)].into_boxed_slice(),
        }
    }

    /// Format the queue was initialized with
    pub fn format(&self) -> StreamFormat {
        self.format
    }

    /// Frames ready to be pulled
    pub fn available_frames(&self) -> usize {
        self.consumer
            .as_ref()
            .map(|c| self.format.frames_in(c.occupied_len()))
            .unwrap_or(0)
    }

    /// Fill `out` with interleaved frames, padding with silence.
    ///
    /// Only whole frames are copied; a trailing partial frame in `out` is
    /// always silence. Returns the number of frames delivered.
    pub fn pull(&mut self, out: &mut [i16]) -> usize {
        let requested = self.format.frames_in(out.len());
        let popped = match self.consumer.as_mut() {
            Some(consumer) => pop_frames(consumer, self.format, out),
            None => 0,
        };
        out[popped..].fill(0);

        let delivered = self.format.frames_in(popped);
        self.shared.metrics.record_pull(delivered, requested);
        delivered
    }

    /// Like [`pull`](Self::pull), converting to the device sample type.
    pub fn pull_into<S: OutputSample>(&mut self, out: &mut [S]) -> usize {
        let requested = self.format.frames_in(out.len());
        let whole = self.format.samples_in(requested);
        let mut filled = 0;

        if let Some(consumer) = self.consumer.as_mut() {
            for chunk in out[..whole].chunks_mut(self.scratch.len().max(1)) {
                let scratch = &mut self.scratch[..chunk.len()];
                let popped = pop_frames(consumer, self.format, scratch);
                for (dst, &src) in chunk.iter_mut().zip(&scratch[..popped]) {
                    *dst = S::from_i16(src);
                }
                filled += popped;
                if popped < chunk.len() {
                    break;
                }
            }
        }
        out[filled..].fill(S::SILENCE);

        let delivered = self.format.frames_in(filled);
        self.shared.metrics.record_pull(delivered, requested);
        delivered
    }
}

/// Pop as many whole frames as fit in `out`, returning samples written.
#[inline]
fn pop_frames(consumer: &mut HeapCons<i16>, format: StreamFormat, out: &mut [i16]) -> usize {
    let available = format.frames_in(consumer.occupied_len());
    let frames = format.frames_in(out.len()).min(available);
    consumer.pop_slice(&mut out[..format.samples_in(frames)])
}

impl Drop for SampleReader {
    fn drop(&mut self) {
        if let Some(consumer) = self.consumer.take() {
            self.shared.park(consumer);
        }
    }
}

impl std::fmt::Debug for SampleReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleReader")
            .field("format", &self.format)
            .field("available_frames", &self.available_frames())
            .finish()
    }
}
