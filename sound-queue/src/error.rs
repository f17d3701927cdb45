//! Sound queue error types

/// Errors reported by the producer side of the queue.
///
/// Overflow is not an error: frames that do not fit are dropped and reported
/// through [`WriteReport`](crate::WriteReport).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// Sample rate or channel count out of range at init
    #[error("invalid stream format: {sample_rate} Hz, {channels} channel(s)")]
    InvalidFormat { sample_rate: i64, channels: i64 },

    /// write()/sample_count() called before init()
    #[error("sound queue is not initialized")]
    NotInitialized,

    /// init() called while the real-time reader is attached
    #[error("cannot re-initialize while the audio callback is attached")]
    ReaderAttached,

    /// take_reader() called while a reader is already out
    #[error("reader is already attached to an audio callback")]
    ReaderTaken,

    /// Interleaved buffer does not hold a whole number of frames
    #[error("{len} samples is not a whole number of {channels}-channel frames")]
    PartialFrame { len: usize, channels: u16 },
}
