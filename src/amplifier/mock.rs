//! Simulated amplifier for running without hardware.
//!
//! Produces one impedance reading per channel on each poll. Readings cluster around a
//! per-channel baseline drawn at start-up, and a few channels read as open circuits (255)
//! so every color band of the legend shows up on screen.

use anyhow::{bail, Result};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use super::Amplifier;

/// Probability that a channel reads as an open circuit on a given poll.
const OPEN_CIRCUIT_CHANCE: f64 = 0.02;

/// Largest jitter around the baseline.
const JITTER: i32 = 8;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct MockState {
    initialized: bool,
    impedance_mode: bool,
}

/// Mock impedance source.
///
/// # Example
///
/// ```rust,ignore
/// let amp = MockAmplifier::new(32).with_seed(7);
/// amp.initialize().await?;
/// amp.start_impedance_mode().await?;
/// let samples = amp.current_impedance_samples().await?.unwrap();
/// assert_eq!(samples.len(), 32);
/// ```
#[derive(Debug)]
pub struct MockAmplifier {
    channel_count: usize,
    seed: Option<u64>,
    fail_init: bool,
    no_samples: bool,
    state: RwLock<MockState>,
    rng: Mutex<Option<(StdRng, Vec<i32>)>>,
}

impl MockAmplifier {
    /// Mock with `channel_count` channels and an entropy-seeded generator.
    pub fn new(channel_count: usize) -> Self {
        Self {
            channel_count,
            seed: None,
            fail_init: false,
            no_samples: false,
            state: RwLock::new(MockState::default()),
            rng: Mutex::new(None),
        }
    }

    /// Make readings reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Make [`Amplifier::initialize`] fail, as an unplugged device would.
    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    /// Never report a buffer, as a device that is still warming up.
    pub fn without_samples(mut self) -> Self {
        self.no_samples = true;
        self
    }

    /// Length of every reported buffer.
    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    fn make_rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

#[async_trait]
impl Amplifier for MockAmplifier {
    async fn initialize(&self) -> Result<()> {
        if self.fail_init {
            bail!("Mock amplifier did not respond");
        }
        let mut rng = self.make_rng();
        let baselines = (0..self.channel_count)
            .map(|_| rng.gen_range(0..=220))
            .collect();
        *self.rng.lock().await = Some((rng, baselines));
        self.state.write().await.initialized = true;
        info!(channels = self.channel_count, "Mock amplifier initialized");
        Ok(())
    }

    async fn start_impedance_mode(&self) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.initialized {
            bail!("Mock amplifier not initialized");
        }
        state.impedance_mode = true;
        debug!("Mock amplifier in impedance mode");
        Ok(())
    }

    async fn current_impedance_samples(&self) -> Result<Option<Vec<i32>>> {
        if self.no_samples || !self.state.read().await.impedance_mode {
            return Ok(None);
        }
        let mut guard = self.rng.lock().await;
        let Some((rng, baselines)) = guard.as_mut() else {
            return Ok(None);
        };
        let samples = baselines
            .iter()
            .map(|&base| {
                if rng.gen_bool(OPEN_CIRCUIT_CHANCE) {
                    255
                } else {
                    (base + rng.gen_range(-JITTER..=JITTER)).clamp(0, 254)
                }
            })
            .collect();
        Ok(Some(samples))
    }
}
