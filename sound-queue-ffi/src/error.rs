//! Static error strings returned across the C boundary

use std::ffi::CStr;

use sound_queue::QueueError;

pub(crate) const ERR_NULL_HANDLE: &CStr = c"NULL sound queue handle";
pub(crate) const ERR_INVALID_FORMAT: &CStr = c"Invalid sample rate or channel count";
pub(crate) const ERR_NOT_INITIALIZED: &CStr = c"Sound queue is not initialized";
pub(crate) const ERR_READER_ATTACHED: &CStr = c"Audio callback still attached";
pub(crate) const ERR_READER_TAKEN: &CStr = c"Reader already attached";
pub(crate) const ERR_PARTIAL_FRAME: &CStr = c"Sample buffer is not a whole number of frames";
#[cfg_attr(not(feature = "output"), allow(dead_code))]
pub(crate) const ERR_OUTPUT: &CStr = c"Couldn't open audio output";

/// Map a queue error to its static C string
pub(crate) fn error_message(err: &QueueError) -> &'static CStr {
    match err {
        QueueError::InvalidFormat { .. } => ERR_INVALID_FORMAT,
        QueueError::NotInitialized => ERR_NOT_INITIALIZED,
        QueueError::ReaderAttached => ERR_READER_ATTACHED,
        QueueError::ReaderTaken => ERR_READER_TAKEN,
        QueueError::PartialFrame { .. } => ERR_PARTIAL_FRAME,
    }
}
