//! Feed a source through the queue into the default output device

use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use sound_queue::{AudioOutput, QueueConfig, SoundQueue};
use tracing::{debug, info, warn};

use crate::source::Source;

/// Producer poll period while the ring is full
const POLL_INTERVAL: Duration = Duration::from_millis(2);

/// Device buffer headroom after the queue drains
const TAIL: Duration = Duration::from_millis(100);

/// Extra time allowed past the queued audio's duration before giving up on a drain
const DRAIN_SLACK: Duration = Duration::from_millis(500);

pub fn play(source: &Source, config: QueueConfig) -> Result<()> {
    let mut queue = SoundQueue::with_config(config);
    queue.init(source.sample_rate, source.channels)?;

    let output = AudioOutput::start(queue.take_reader()?)?;
    info!(
        "Playing {} frames at {}Hz, {} channel(s)",
        source.frames(),
        output.sample_rate(),
        output.channels()
    );

    let dropped = feed(&mut queue, &source.samples, POLL_INTERVAL)?;
    if dropped > 0 {
        warn!("{} frames dropped on overflow", dropped);
    }

    queue.drain()?;
    if wait_drained(&queue, DRAIN_SLACK, POLL_INTERVAL)? {
        thread::sleep(TAIL);
    } else {
        warn!(
            "Output stopped pulling; {} frames left unplayed",
            queue.sample_count()?
        );
    }
    drop(output);

    if let Some(metrics) = queue.metrics() {
        info!(
            "Done: played={}, underruns={}, overflows={}",
            metrics.frames_played, metrics.underruns, metrics.overflows
        );
    }
    Ok(())
}

/// Write all of `samples`, sleeping while the ring is too full to take a
/// reasonable chunk. Returns frames dropped, which stays zero while this is
/// the only producer.
pub fn feed(queue: &mut SoundQueue, samples: &[i16], poll: Duration) -> Result<usize> {
    let channels = queue.format().map(|f| f.channels() as usize).unwrap_or(1);
    let chunk_frames = (queue.capacity_frames()? / 4).max(1);
    let whole = samples.len() / channels * channels;
    if whole < samples.len() {
        warn!(
            "Ignoring {} trailing samples (partial frame)",
            samples.len() - whole
        );
    }
    let mut remaining = &samples[..whole];
    let mut dropped = 0;

    while !remaining.is_empty() {
        let left = remaining.len() / channels;
        let vacant = queue.vacant_frames()?;
        if vacant < chunk_frames.min(left) {
            thread::sleep(poll);
            continue;
        }

        let frames = vacant.min(left);
        let (chunk, rest) = remaining.split_at(frames * channels);
        let report = queue.write(chunk)?;
        dropped += report.dropped;
        remaining = rest;
    }

    debug!("Fed {} samples", whole);
    Ok(dropped)
}

/// Wait until the reader has played everything queued. Gives up once the
/// queued audio's playback time plus `slack` has passed, which happens when
/// the device stops pulling. Returns whether the queue drained.
pub fn wait_drained(queue: &SoundQueue, slack: Duration, poll: Duration) -> Result<bool> {
    let rate = queue.format().map_or(1, |f| f.sample_rate()).max(1);
    let queued = queue.sample_count()? as u64;
    let deadline = Instant::now() + Duration::from_millis(queued * 1000 / rate as u64) + slack;

    while !queue.is_drained() {
        if Instant::now() >= deadline {
            return Ok(false);
        }
        thread::sleep(poll);
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_feed_paces_against_reader() {
        let mut queue = SoundQueue::with_config(QueueConfig {
            latency_ms: 10,
            report_interval_ms: 0,
        });
        queue.init(8_000, 1).unwrap();
        let mut reader = queue.take_reader().unwrap();

        // Several times the ring capacity
        let samples: Vec<i16> = (0..5_000).map(|i| (i % 1000) as i16).collect();
        let done = Arc::new(AtomicBool::new(false));

        let consumer_done = done.clone();
        let consumer = thread::spawn(move || {
            let mut received = Vec::new();
            let mut out = [0i16; 32];
            loop {
                let n = reader.pull(&mut out);
                received.extend_from_slice(&out[..n]);
                if n == 0 {
                    if consumer_done.load(Ordering::Acquire) && reader.available_frames() == 0 {
                        break;
                    }
                    thread::sleep(Duration::from_micros(200));
                }
            }
            received
        });

        let dropped = feed(&mut queue, &samples, Duration::from_micros(200)).unwrap();
        done.store(true, Ordering::Release);

        assert_eq!(dropped, 0);
        assert_eq!(consumer.join().unwrap(), samples);
    }

    #[test]
    fn test_feed_ignores_partial_trailing_frame() {
        let mut queue = SoundQueue::new();
        queue.init(44_100, 2).unwrap();

        let dropped = feed(&mut queue, &[1, 2, 3], Duration::from_micros(200)).unwrap();

        assert_eq!(dropped, 0);
        assert_eq!(queue.sample_count().unwrap(), 1);
    }

    #[test]
    fn test_wait_drained_gives_up_when_reader_stalls() {
        let mut queue = SoundQueue::with_config(QueueConfig {
            latency_ms: 10,
            report_interval_ms: 0,
        });
        queue.init(8_000, 1).unwrap();
        // Attached but never pulled, like a stream that stopped
        let _reader = queue.take_reader().unwrap();
        queue.write(&[7; 40]).unwrap();
        queue.drain().unwrap();

        let start = Instant::now();
        let drained = wait_drained(
            &queue,
            Duration::from_millis(20),
            Duration::from_millis(1),
        )
        .unwrap();

        assert!(!drained);
        assert!(start.elapsed() < Duration::from_secs(2));
        assert_eq!(queue.sample_count().unwrap(), 40);
    }

    #[test]
    fn test_wait_drained_returns_once_played() {
        let mut queue = SoundQueue::with_config(QueueConfig {
            latency_ms: 10,
            report_interval_ms: 0,
        });
        queue.init(8_000, 1).unwrap();
        let mut reader = queue.take_reader().unwrap();
        queue.write(&[7; 40]).unwrap();
        queue.drain().unwrap();

        let consumer = thread::spawn(move || {
            let mut out = [0i16; 8];
            while reader.available_frames() > 0 {
                reader.pull(&mut out);
                thread::sleep(Duration::from_millis(1));
            }
            reader
        });

        let drained = wait_drained(
            &queue,
            Duration::from_secs(5),
            Duration::from_millis(1),
        )
        .unwrap();
        let _reader = consumer.join().unwrap();

        assert!(drained);
    }
}
