//! C ABI for the sound queue
//!
//! Opaque handles wrap a [`SoundQueue`] (producer thread) and a
//! [`SampleReader`] (audio callback). Declarations live in
//! `include/sound_queue.h`.
//!
//! # Conventions
//!
//! - Functions returning `const char*` return NULL on success and a static,
//!   NUL-terminated error message otherwise. The string is never freed.
//! - Counts are frames (one value per channel), never raw samples.
//! - Passing NULL to `sound_queue_destroy` / `sound_queue_reader_release` is a
//!   no-op. Passing NULL anywhere else is use-after-destroy: it panics (and
//!   therefore aborts) in debug builds and is logged and ignored in release.
//!
//! # Threading
//!
//! The queue handle belongs to one producer thread. A reader handle belongs
//! to the audio callback; `sound_queue_reader_pull` is wait-free and never
//! logs.

mod error;


use std::ffi::{c_char, c_int, c_long, c_short};
use std::ptr;

use sound_queue::{SampleReader, SoundQueue, StreamFormat};
use tracing::{error, warn};

use error::{ERR_NULL_HANDLE, error_message};

/// Opaque queue handle (`SoundQueue*` in C)
pub struct SoundQueueHandle {
    /// Running device output; stopped before the queue is freed
    #[cfg(feature = "output")]
    output: Option<sound_queue::AudioOutput>,
    queue: SoundQueue,
}

/// Opaque reader handle (`SoundQueueReader*` in C)
pub struct SoundQueueReaderHandle {
    reader: SampleReader,
}

/// Counter snapshot (`SoundQueueMetrics` in C)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SoundQueueMetrics {
    pub frames_written: u64,
    pub frames_dropped: u64,
    pub frames_played: u64,
    pub overflows: u64,
    pub underruns: u64,
    pub queued_frames: u64,
    pub capacity_frames: u64,
}

fn use_after_destroy(op: &str) {
    if cfg!(debug_assertions) {
        panic!("{op} called with a NULL sound queue handle");
    }
    error!("{} called with a NULL sound queue handle", op);
}

/// # Safety
///
/// `handle` must be NULL or a live pointer from `sound_queue_create`.
unsafe fn handle_ref<'a>(
    handle: *const SoundQueueHandle,
    op: &str,
) -> Option<&'a SoundQueueHandle> {
    // SAFETY: caller guarantees the pointer is NULL or live
    let handle = unsafe { handle.as_ref() };
    if handle.is_none() {
        use_after_destroy(op);
    }
    handle
}

/// # Safety
///
/// `handle` must be NULL or a live pointer from `sound_queue_create`, not
/// aliased by another call in flight.
unsafe fn handle_mut<'a>(
    handle: *mut SoundQueueHandle,
    op: &str,
) -> Option<&'a mut SoundQueueHandle> {
    // SAFETY: caller guarantees the pointer is NULL or live and unaliased
    let handle = unsafe { handle.as_mut() };
    if handle.is_none() {
        use_after_destroy(op);
    }
    handle
}

/// Install a `tracing` subscriber honouring `RUST_LOG` (default `warn`).
///
/// Safe to call more than once; later calls are ignored.
#[unsafe(no_mangle)]
pub extern "C" fn sound_queue_enable_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init();
}

/// Allocate an uninitialized queue. Never fails.
#[unsafe(no_mangle)]
pub extern "C" fn sound_queue_create() -> *mut SoundQueueHandle {
    let handle = SoundQueueHandle {
        #[cfg(feature = "output")]
        output: None,
        queue: SoundQueue::new(),
    };
    Box::into_raw(Box::new(handle))
}

/// Stop any output and free the queue. The handle is invalid afterwards.
///
/// # Safety
///
/// `handle` must be NULL or a pointer from `sound_queue_create` that has not
/// been destroyed. Readers taken from it must be released first if the host
/// drives its own callback.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sound_queue_destroy(handle: *mut SoundQueueHandle) {
    if handle.is_null() {
        return;
    }
    // SAFETY: pointer came from Box::into_raw in sound_queue_create
    #[allow(unused_mut)]
    let mut handle = unsafe { Box::from_raw(handle) };
    #[cfg(feature = "output")]
    drop(handle.output.take());
    drop(handle);
}

/// Bind sample rate and channel count and allocate the ring.
///
/// Returns NULL on success or a static error message.
///
/// # Safety
///
/// `handle` must be a live pointer from `sound_queue_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sound_queue_init(
    handle: *mut SoundQueueHandle,
    sample_rate: c_long,
    chan_count: c_int,
) -> *const c_char {
    // SAFETY: forwarded caller contract
    let Some(handle) = (unsafe { handle_mut(handle, "sound_queue_init") }) else {
        return ERR_NULL_HANDLE.as_ptr();
    };

    let result = StreamFormat::new(i64::from(sample_rate), i64::from(chan_count))
        .and_then(|format| handle.queue.init_with_format(format));

    match result {
        Ok(()) => ptr::null(),
        Err(err) => {
            warn!("sound_queue_init failed: {}", err);
            error_message(&err).as_ptr()
        }
    }
}

/// Frames queued and not yet played, or -1 before `sound_queue_init`.
///
/// Hosts may poll this before init, so the -1 path does not log.
///
/// # Safety
///
/// `handle` must be a live pointer from `sound_queue_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sound_queue_sample_count(handle: *const SoundQueueHandle) -> c_int {
    // SAFETY: forwarded caller contract
    let Some(handle) = (unsafe { handle_ref(handle, "sound_queue_sample_count") }) else {
        return -1;
    };

    handle
        .queue
        .sample_count()
        .map_or(-1, |frames| c_int::try_from(frames).unwrap_or(c_int::MAX))
}

/// Append `count` interleaved frames. Frames that do not fit are dropped.
///
/// # Safety
///
/// `handle` must be a live pointer from `sound_queue_create`. `samples` must
/// point to at least `count * chan_count` readable values.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sound_queue_write(
    handle: *mut SoundQueueHandle,
    samples: *const c_short,
    count: c_int,
) {
    // SAFETY: forwarded caller contract
    let Some(handle) = (unsafe { handle_mut(handle, "sound_queue_write") }) else {
        return;
    };
    let Some(format) = handle.queue.format() else {
        warn!("sound_queue_write: sound queue is not initialized");
        return;
    };
    let Ok(frames) = usize::try_from(count) else {
        warn!("sound_queue_write: negative frame count {}", count);
        return;
    };
    if frames == 0 {
        return;
    }
    if samples.is_null() {
        warn!("sound_queue_write: NULL sample buffer");
        return;
    }

    let len = frames * format.channels() as usize;
    // SAFETY: caller guarantees `count` whole frames are readable
    let samples = unsafe { std::slice::from_raw_parts(samples, len) };
    if let Err(err) = handle.queue.write(samples) {
        warn!("sound_queue_write: {}", err);
    }
}

/// Copy the queue counters into `out`. Returns 0, or -1 before init.
///
/// # Safety
///
/// `handle` must be a live pointer from `sound_queue_create`; `out` must be
/// NULL or writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sound_queue_metrics(
    handle: *const SoundQueueHandle,
    out: *mut SoundQueueMetrics,
) -> c_int {
    // SAFETY: forwarded caller contract
    let Some(handle) = (unsafe { handle_ref(handle, "sound_queue_metrics") }) else {
        return -1;
    };
    let Some(snapshot) = handle.queue.metrics() else {
        return -1;
    };
    // SAFETY: caller guarantees `out` is NULL or writable
    let Some(out) = (unsafe { out.as_mut() }) else {
        return -1;
    };

    *out = SoundQueueMetrics {
        frames_written: snapshot.frames_written,
        frames_dropped: snapshot.frames_dropped,
        frames_played: snapshot.frames_played,
        overflows: snapshot.overflows,
        underruns: snapshot.underruns,
        queued_frames: snapshot.queued_frames as u64,
        capacity_frames: snapshot.capacity_frames as u64,
    };
    0
}

/// Detach the reader for a host-owned audio callback.
///
/// Returns NULL if the queue is not initialized or a reader (or device
/// output) is already attached.
///
/// # Safety
///
/// `handle` must be a live pointer from `sound_queue_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sound_queue_reader_take(
    handle: *mut SoundQueueHandle,
) -> *mut SoundQueueReaderHandle {
    // SAFETY: forwarded caller contract
    let Some(handle) = (unsafe { handle_mut(handle, "sound_queue_reader_take") }) else {
        return ptr::null_mut();
    };

    match handle.queue.take_reader() {
        Ok(reader) => Box::into_raw(Box::new(SoundQueueReaderHandle { reader })),
        Err(err) => {
            warn!("sound_queue_reader_take: {}", err);
            ptr::null_mut()
        }
    }
}

/// Fill `out` with up to `frames` frames, zero-filling any shortfall.
///
/// Returns frames delivered. Wait-free; call from the audio callback.
///
/// # Safety
///
/// `reader` must be NULL or a live pointer from `sound_queue_reader_take`.
/// `out` must point to `frames * chan_count` writable values.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sound_queue_reader_pull(
    reader: *mut SoundQueueReaderHandle,
    out: *mut c_short,
    frames: c_int,
) -> c_int {
    // No logging on this path
    // SAFETY: caller guarantees the pointer is NULL or live
    let Some(handle) = (unsafe { reader.as_mut() }) else {
        return 0;
    };
    let Ok(frames) = usize::try_from(frames) else {
        return 0;
    };
    if out.is_null() || frames == 0 {
        return 0;
    }

    let len = frames * handle.reader.format().channels() as usize;
    // SAFETY: caller guarantees `frames` whole frames are writable
    let out = unsafe { std::slice::from_raw_parts_mut(out, len) };
    handle.reader.pull(out) as c_int
}

/// Release a reader back to its queue. NULL is a no-op.
///
/// # Safety
///
/// `reader` must be NULL or a live pointer from `sound_queue_reader_take`,
/// and the audio callback using it must have stopped.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sound_queue_reader_release(reader: *mut SoundQueueReaderHandle) {
    if reader.is_null() {
        return;
    }
    // SAFETY: pointer came from Box::into_raw in sound_queue_reader_take
    drop(unsafe { Box::from_raw(reader) });
}

/// Start playback on the default output device.
///
/// Returns NULL on success (or if already playing) or a static error message.
///
/// # Safety
///
/// `handle` must be a live pointer from `sound_queue_create`.
#[cfg(feature = "output")]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sound_queue_start(handle: *mut SoundQueueHandle) -> *const c_char {
    // SAFETY: forwarded caller contract
    let Some(handle) = (unsafe { handle_mut(handle, "sound_queue_start") }) else {
        return ERR_NULL_HANDLE.as_ptr();
    };
    if handle.output.is_some() {
        return ptr::null();
    }

    let reader = match handle.queue.take_reader() {
        Ok(reader) => reader,
        Err(err) => {
            warn!("sound_queue_start: {}", err);
            return error_message(&err).as_ptr();
        }
    };

    match sound_queue::AudioOutput::start(reader) {
        Ok(output) => {
            handle.output = Some(output);
            ptr::null()
        }
        Err(err) => {
            error!("sound_queue_start: {}", err);
            error::ERR_OUTPUT.as_ptr()
        }
    }
}

/// Stop device playback; queued audio is kept.
///
/// # Safety
///
/// `handle` must be a live pointer from `sound_queue_create`.
#[cfg(feature = "output")]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sound_queue_stop(handle: *mut SoundQueueHandle) {
    // SAFETY: forwarded caller contract
    if let Some(handle) = unsafe { handle_mut(handle, "sound_queue_stop") } {
        drop(handle.output.take());
    }
}
