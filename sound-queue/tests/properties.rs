//! Property tests for queue accounting

use proptest::prelude::*;
use sound_queue::{QueueConfig, SoundQueue};

fn quiet_config() -> QueueConfig {
    QueueConfig {
        report_interval_ms: 0,
        ..Default::default()
    }
}

proptest! {
    #[test]
    fn init_then_sample_count_is_zero(rate in 1u32..=192_000, channels in 1u16..=8) {
        let mut queue = SoundQueue::with_config(quiet_config());
        queue.init(rate, channels).unwrap();
        prop_assert_eq!(queue.sample_count().unwrap(), 0);
    }

    #[test]
    fn writes_within_capacity_are_counted(
        channels in 1u16..=4,
        writes in prop::collection::vec(0usize..300, 0..20),
    ) {
        let mut queue = SoundQueue::with_config(quiet_config());
        queue.init(44_100, channels).unwrap();
        let capacity = queue.capacity_frames().unwrap();

        let mut total = 0;
        for frames in writes {
            if total + frames > capacity {
                break;
            }
            let samples = vec![1i16; frames * channels as usize];
            let report = queue.write(&samples).unwrap();
            prop_assert_eq!(report.written, frames);
            prop_assert_eq!(report.dropped, 0);
            total += frames;
        }
        prop_assert_eq!(queue.sample_count().unwrap(), total);
    }

    #[test]
    fn overflow_keeps_state_consistent(
        writes in prop::collection::vec(0usize..2_000, 1..30),
        pulls in prop::collection::vec(0usize..1_500, 1..30),
    ) {
        let mut queue = SoundQueue::with_config(quiet_config());
        queue.init(44_100, 2).unwrap();
        let capacity = queue.capacity_frames().unwrap();
        let mut reader = queue.take_reader().unwrap();

        let mut queued = 0usize;
        for (i, frames) in writes.iter().copied().enumerate() {
            let report = queue.write(&vec![3i16; frames * 2]).unwrap();
            prop_assert_eq!(report.written + report.dropped, frames);
            prop_assert_eq!(report.written, frames.min(capacity - queued));
            queued += report.written;

            if let Some(&pull) = pulls.get(i) {
                let mut out = vec![0i16; pull * 2];
                let delivered = reader.pull(&mut out);
                prop_assert_eq!(delivered, pull.min(queued));
                queued -= delivered;
            }

            let count = queue.sample_count().unwrap();
            prop_assert_eq!(count, queued);
            prop_assert!(count <= capacity);
            prop_assert_eq!(queue.vacant_frames().unwrap(), capacity - count);
        }
    }
}
