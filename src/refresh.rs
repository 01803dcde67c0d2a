//! Periodic impedance refresh.
//!
//! [`RefreshLoop`] runs on the control thread. It is driven by the UI frame clock: each
//! frame asks [`RefreshLoop::due`], and when the interval has elapsed the latest buffer is
//! pulled from a [`SampleSource`] and mapped onto electrode values. The caller requests a
//! redraw after every tick.
//!
//! Hardware channels are one-based: channel `N` reads `sample[N - 1]`. Channel 0 means
//! "unassigned" and reads as 0, as does a channel past the end of the buffer. When no
//! buffer is available at all, every electrode is zeroed rather than left stale.

use std::time::{Duration, Instant};

use tracing::trace;

use crate::amplifier::SampleSource;
use crate::electrode::Electrode;

/// Default tick interval.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(300);

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A buffer was available; `unmapped` electrodes had no reading for their channel.
    Updated { unmapped: usize },
    /// No buffer; all values were zeroed.
    Zeroed,
}

/// Fixed-interval refresh driver.
#[derive(Debug, Clone)]
pub struct RefreshLoop {
    interval: Duration,
    last_tick: Option<Instant>,
}

impl RefreshLoop {
    /// Loop ticking every `interval`; the first poll is due immediately.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_tick: None,
        }
    }

    /// Tick period.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether a tick should run at `now`. The first call is always due.
    pub fn due(&self, now: Instant) -> bool {
        self.last_tick
            .map_or(true, |last| now.saturating_duration_since(last) >= self.interval)
    }

    /// Time left until the next tick, for scheduling the next repaint.
    pub fn until_next(&self, now: Instant) -> Duration {
        self.last_tick.map_or(Duration::ZERO, |last| {
            self.interval
                .saturating_sub(now.saturating_duration_since(last))
        })
    }

    /// Run one tick unconditionally.
    pub fn tick(
        &mut self,
        now: Instant,
        source: &mut dyn SampleSource,
        electrodes: &mut [Electrode],
    ) -> TickOutcome {
        self.last_tick = Some(now);
        let samples = source.current_samples();
        apply_samples(electrodes, samples.as_deref())
    }

    /// Tick if due. Returns `None` when the interval has not elapsed.
    pub fn poll(
        &mut self,
        now: Instant,
        source: &mut dyn SampleSource,
        electrodes: &mut [Electrode],
    ) -> Option<TickOutcome> {
        self.due(now).then(|| self.tick(now, source, electrodes))
    }
}

impl Default for RefreshLoop {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

/// Map a sample buffer onto electrode values.
pub fn apply_samples(electrodes: &mut [Electrode], samples: Option<&[i32]>) -> TickOutcome {
    let Some(samples) = samples else {
        for electrode in electrodes.iter_mut() {
            electrode.set_value(0);
        }
        return TickOutcome::Zeroed;
    };

    let mut unmapped = 0;
    for electrode in electrodes.iter_mut() {
        match sample_for_channel(samples, electrode.hardware_channel()) {
            Some(sample) => electrode.set_value(i64::from(sample)),
            None => {
                electrode.set_value(0);
                unmapped += 1;
            }
        }
    }
    trace!(samples = samples.len(), unmapped, "Impedance values refreshed");
    TickOutcome::Updated { unmapped }
}

/// Sample of one-based `channel`, if the buffer has one.
#[inline]
pub fn sample_for_channel(samples: &[i32], channel: u32) -> Option<i32> {
    let index = usize::try_from(channel).ok()?.checked_sub(1)?;
    samples.get(index).copied()
}
