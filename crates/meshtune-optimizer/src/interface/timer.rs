//! Timer/clock collaborator
//!
//! Deadlines are taken on the monotonic `tokio::time::Instant`.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

#[async_trait]
pub trait TimerService: Send {
    /// Arm (or re-arm) the timer to fire after `duration`
    fn arm(&mut self, duration: Duration);

    /// Drop any pending deadline
    fn disarm(&mut self);

    fn is_armed(&self) -> bool;

    /// Suspend until the armed deadline passes
    ///
    /// Never completes while disarmed; callers bound the wait.
    async fn expired(&mut self);
}

/// `TimerService` over the tokio clock
#[derive(Debug, Default)]
pub struct TokioTimer {
    deadline: Option<Instant>,
}

impl TokioTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

#[async_trait]
impl TimerService for TokioTimer {
    fn arm(&mut self, duration: Duration) {
        self.deadline = Some(Instant::now() + duration);
    }

    fn disarm(&mut self) {
        self.deadline = None;
    }

    fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    async fn expired(&mut self) {
        match self.deadline {
            Some(deadline) => {
                tokio::time::sleep_until(deadline).await;
                self.deadline = None;
            }
            None => std::future::pending::<()>().await,
        }
    }
}
