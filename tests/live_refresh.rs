//! Integration tests for the live impedance path: mock amplifier → sample feed →
//! refresh loop → electrode values.

use std::sync::Arc;
use std::time::{Duration, Instant};

use electrode_map::amplifier::{FeedEvent, MockAmplifier, SampleFeed, SampleSource};
use electrode_map::array::ElectrodeArray;
use electrode_map::refresh::{RefreshLoop, TickOutcome};
use tokio::runtime::Handle;

const FAST: Duration = Duration::from_millis(5);

fn wired_array() -> ElectrodeArray {
    let mut array = ElectrodeArray::standard(64);
    for (name, channel) in [("Fp1", 1), ("Cz", 8), ("O2", 16)] {
        array.by_name_mut(name).unwrap().set_hardware_channel(channel, 64);
    }
    array
}

#[tokio::test]
async fn test_feed_values_reach_bound_electrodes() {
    let amp = Arc::new(MockAmplifier::new(16).with_seed(11));
    let mut feed = SampleFeed::spawn(&Handle::current(), amp, FAST);
    assert_eq!(feed.next_event().await, Some(FeedEvent::Ready));
    assert!(feed.changed().await);

    let mut array = wired_array();
    let mut refresh = RefreshLoop::new(FAST);
    let samples = feed.current_samples().unwrap();
    let mut snapshot = Some(samples.clone());

    let outcome = refresh.tick(Instant::now(), &mut snapshot, array.electrodes_mut());

    assert!(matches!(outcome, TickOutcome::Updated { .. }));
    let expected = |i: usize| samples[i].clamp(0, 255) as u8;
    assert_eq!(array.by_name("Fp1").unwrap().value(), expected(0));
    assert_eq!(array.by_name("Cz").unwrap().value(), expected(7));
    assert_eq!(array.by_name("O2").unwrap().value(), expected(15));
    // Unassigned electrodes read nothing.
    assert_eq!(array.by_name("Fz").unwrap().value(), 0);
    feed.shutdown();
}

#[tokio::test]
async fn test_failed_amplifier_leaves_values_zeroed() {
    let amp = Arc::new(MockAmplifier::new(16).failing_init());
    let mut feed = SampleFeed::spawn(&Handle::current(), amp, FAST);

    assert!(matches!(feed.next_event().await, Some(FeedEvent::InitFailed(_))));

    let mut array = wired_array();
    for electrode in array.electrodes_mut() {
        electrode.set_value(200);
    }
    let mut refresh = RefreshLoop::new(FAST);

    // Repeated ticks keep degrading to zero without further events.
    for _ in 0..3 {
        let outcome = refresh.tick(Instant::now(), &mut feed, array.electrodes_mut());
        assert_eq!(outcome, TickOutcome::Zeroed);
    }
    assert!(array.electrodes().iter().all(|e| e.value() == 0));
    assert!(feed.try_event().is_none());
}

#[tokio::test]
async fn test_samples_beyond_device_read_zero() {
    let amp = Arc::new(MockAmplifier::new(8).with_seed(5));
    let mut feed = SampleFeed::spawn(&Handle::current(), amp, FAST);
    feed.next_event().await;
    assert!(feed.changed().await);

    let mut array = wired_array();
    let outcome = RefreshLoop::new(FAST).tick(Instant::now(), &mut feed, array.electrodes_mut());

    // Cz (8) is the last channel the device has; O2 (16) is past the buffer.
    assert!(matches!(outcome, TickOutcome::Updated { .. }));
    assert_eq!(array.by_name("O2").unwrap().value(), 0);
}
