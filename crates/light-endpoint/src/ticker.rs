//! Tick source backed by the tokio timer

use level_control::TickSource;
use std::time::Duration;
use tokio::time::Instant;

/// One-shot deadline polled by the endpoint task
///
/// `arm` only records when the next tick is due; the endpoint loop sleeps
/// until the deadline and calls [`TimerTickSource::fire`] before advancing
/// the engine.
#[derive(Debug, Default)]
pub struct TimerTickSource {
    deadline: Option<Instant>,
}

impl TimerTickSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// When the pending tick is due, if any
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Consume the pending tick
    pub fn fire(&mut self) -> bool {
        self.deadline.take().is_some()
    }
}

impl TickSource for TimerTickSource {
    fn arm(&mut self, period: Duration) {
        self.deadline = Some(Instant::now() + period);
    }

    fn cancel(&mut self) {
        self.deadline = None;
    }
}

/// Sleep until `deadline`, or forever when there is none
pub(crate) async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
