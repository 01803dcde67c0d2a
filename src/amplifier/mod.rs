//! Amplifier collaborator.
//!
//! The viewer does not drive acquisition hardware itself; it consumes a small async
//! capability surface:
//!
//! - [`Amplifier::initialize`]
//! - [`Amplifier::start_impedance_mode`]
//! - [`Amplifier::current_impedance_samples`], indexed by zero-based hardware channel
//!
//! Device calls may block for an unbounded time, so they never run on the control thread.
//! [`SampleFeed`] polls the device on a tokio runtime and publishes the latest buffer; the
//! control thread reads it through the non-blocking [`SampleSource`] trait.

mod feed;
mod mock;

pub use feed::{FeedEvent, FeedStatus, SampleFeed, INIT_GUIDANCE};
pub use mock::MockAmplifier;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

/// Impedance-capable acquisition device.
///
/// Follows the same conventions as the other hardware capabilities: async, `Send + Sync`,
/// `anyhow::Result` errors.
#[async_trait]
pub trait Amplifier: Send + Sync {
    /// Open and configure the device.
    async fn initialize(&self) -> Result<()>;

    /// Switch the device into impedance measurement.
    async fn start_impedance_mode(&self) -> Result<()>;

    /// Latest impedance buffer, `None` while the device has nothing to report.
    ///
    /// Element `i` belongs to hardware channel `i + 1`.
    async fn current_impedance_samples(&self) -> Result<Option<Vec<i32>>>;
}

/// Non-blocking access to the most recent sample buffer.
pub trait SampleSource {
    /// Newest buffer, `None` when nothing has been published.
    fn current_samples(&mut self) -> Option<Arc<[i32]>>;
}

/// Fixed buffer, handy for tests and for feeding recorded readings.
impl SampleSource for Option<Arc<[i32]>> {
    fn current_samples(&mut self) -> Option<Arc<[i32]>> {
        self.clone()
    }
}
