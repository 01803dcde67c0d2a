//! Background sample feed.
//!
//! Owns a tokio task that brings the amplifier up once and then polls it at a fixed
//! interval. The newest buffer is published through a `watch` channel (older buffers are
//! simply overwritten); one-shot lifecycle events travel over an `mpsc` channel and are
//! drained by the control thread with `try_recv`, so nothing here ever blocks the UI.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use super::{Amplifier, SampleSource};

/// Appended to initialization failures shown to the operator.
pub const INIT_GUIDANCE: &str =
    "Check that the amplifier is powered on and connected, then restart the viewer.";

/// Lifecycle notifications from the feed task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// Device initialized and in impedance mode.
    Ready,
    /// Bring-up failed; live readings stay unavailable.
    InitFailed(String),
}

/// Control-thread view of the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStatus {
    /// Bring-up in progress.
    Starting,
    /// Publishing buffers.
    Running,
    /// Bring-up failed with this reason.
    Failed(String),
    /// Shut down.
    Stopped,
}

type Buffer = Option<Arc<[i32]>>;

/// Handle to a running feed task.
#[derive(Debug)]
pub struct SampleFeed {
    samples: watch::Receiver<Buffer>,
    events: mpsc::UnboundedReceiver<FeedEvent>,
    task: JoinHandle<()>,
    status: FeedStatus,
}

impl SampleFeed {
    /// Spawn the feed on `runtime`, polling every `interval`.
    pub fn spawn(runtime: &Handle, amplifier: Arc<dyn Amplifier>, interval: Duration) -> Self {
        let (sample_tx, samples) = watch::channel(None);
        let (event_tx, events) = mpsc::unbounded_channel();

        let task = runtime.spawn(async move {
            if let Err(err) = bring_up(amplifier.as_ref()).await {
                error!(error = %format!("{err:#}"), "Amplifier initialization failed");
                let _ = event_tx.send(FeedEvent::InitFailed(format!("{err:#}")));
                return;
            }
            info!(interval = ?interval, "Amplifier in impedance mode, polling samples");
            let _ = event_tx.send(FeedEvent::Ready);

            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let buffer = match amplifier.current_impedance_samples().await {
                    Ok(samples) => samples.map(Arc::<[i32]>::from),
                    Err(err) => {
                        debug!(error = %err, "Sample poll failed");
                        None
                    }
                };
                if sample_tx.send(buffer).is_err() {
                    debug!("Sample feed receiver dropped, stopping");
                    break;
                }
            }
        });

        Self {
            samples,
            events,
            task,
            status: FeedStatus::Starting,
        }
    }

    /// Drain one pending lifecycle event, updating [`status`](Self::status).
    pub fn try_event(&mut self) -> Option<FeedEvent> {
        let event = self.events.try_recv().ok()?;
        self.status = match &event {
            FeedEvent::Ready => FeedStatus::Running,
            FeedEvent::InitFailed(reason) => FeedStatus::Failed(reason.clone()),
        };
        Some(event)
    }

    /// Wait for the next lifecycle event.
    pub async fn next_event(&mut self) -> Option<FeedEvent> {
        let event = self.events.recv().await?;
        self.status = match &event {
            FeedEvent::Ready => FeedStatus::Running,
            FeedEvent::InitFailed(reason) => FeedStatus::Failed(reason.clone()),
        };
        Some(event)
    }

    /// Wait until a new buffer (or the absence of one) is published.
    pub async fn changed(&mut self) -> bool {
        self.samples.changed().await.is_ok()
    }

    /// Status as of the last drained event.
    pub fn status(&self) -> &FeedStatus {
        &self.status
    }

    /// Stop polling. Idempotent.
    pub fn shutdown(&mut self) {
        if self.status != FeedStatus::Stopped {
            self.task.abort();
            self.status = FeedStatus::Stopped;
            info!("Sample feed stopped");
        }
    }
}

impl SampleSource for SampleFeed {
    fn current_samples(&mut self) -> Option<Arc<[i32]>> {
        self.samples.borrow().clone()
    }
}

impl Drop for SampleFeed {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn bring_up(amplifier: &dyn Amplifier) -> anyhow::Result<()> {
    amplifier.initialize().await?;
    amplifier.start_impedance_mode().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amplifier::MockAmplifier;

    const FAST: Duration = Duration::from_millis(5);

    #[tokio::test]
    async fn publishes_samples_after_ready() {
        let amp = Arc::new(MockAmplifier::new(8).with_seed(9));
        let mut feed = SampleFeed::spawn(&Handle::current(), amp, FAST);

        assert_eq!(feed.next_event().await, Some(FeedEvent::Ready));
        assert_eq!(feed.status(), &FeedStatus::Running);

        assert!(feed.changed().await);
        let samples = feed.current_samples().unwrap();
        assert_eq!(samples.len(), 8);
        feed.shutdown();
    }

    #[tokio::test]
    async fn init_failure_is_reported_once() {
        let amp = Arc::new(MockAmplifier::new(8).failing_init());
        let mut feed = SampleFeed::spawn(&Handle::current(), amp, FAST);

        let event = feed.next_event().await;
        assert!(matches!(event, Some(FeedEvent::InitFailed(ref msg)) if msg.contains("did not respond")));
        assert!(matches!(feed.status(), FeedStatus::Failed(_)));

        // Task has ended; no further events and never any samples.
        assert_eq!(feed.next_event().await, None);
        assert!(feed.current_samples().is_none());
    }

    #[tokio::test]
    async fn device_without_samples_publishes_none() {
        let amp = Arc::new(MockAmplifier::new(8).without_samples());
        let mut feed = SampleFeed::spawn(&Handle::current(), amp, FAST);

        assert_eq!(feed.next_event().await, Some(FeedEvent::Ready));
        assert!(feed.changed().await);
        assert!(feed.current_samples().is_none());
    }

    #[tokio::test]
    async fn shutdown_stops_task() {
        let amp = Arc::new(MockAmplifier::new(4).with_seed(1));
        let mut feed = SampleFeed::spawn(&Handle::current(), amp, FAST);
        feed.next_event().await;

        feed.shutdown();
        feed.shutdown();

        assert_eq!(feed.status(), &FeedStatus::Stopped);
        // Drain anything published before the abort; the sender then goes away.
        let drained = tokio::time::timeout(Duration::from_secs(2), async {
            while feed.changed().await {}
        })
        .await;
        assert!(drained.is_ok());
    }
}
