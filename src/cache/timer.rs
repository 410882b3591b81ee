//! Timer Module
//!
//! Cancellable one-shot scheduled tasks used to expire cache entries.

use std::fmt;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::Instant;

use crate::error::{CacheError, Result};

/// Action run when a timer fires.
pub type TimerAction = Box<dyn FnOnce() + Send + 'static>;

// == Scheduler ==
/// Facility able to run an action once after a delay.
pub trait Scheduler: Send + Sync + 'static {
    fn schedule(&self, delay: Duration, action: TimerAction) -> Box<dyn ScheduledTask>;
}

/// Handle to a pending timer.
pub trait ScheduledTask: Send + Sync {
    /// Prevents the action from running. No-op once it has run.
    fn cancel(&self);
}

// == Tokio Scheduler ==
/// Scheduler backed by `tokio::time::sleep` on a runtime handle.
///
/// Honors Tokio's paused clock, so expiry can be driven by virtual time.
#[derive(Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    /// Uses the runtime the caller is running inside.
    pub fn current() -> Result<Self> {
        Handle::try_current()
            .map(Self::from_handle)
            .map_err(|_| CacheError::NoRuntime)
    }

    pub fn from_handle(handle: Handle) -> Self {
        Self { handle }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, action: TimerAction) -> Box<dyn ScheduledTask> {
        // Deadline is fixed now, not when the task is first polled.
        let deadline = {
            let _guard = self.handle.enter();
            Instant::now() + delay
        };
        let task = self.handle.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            action();
        });
        Box::new(TokioTask(task.abort_handle()))
    }
}

impl fmt::Debug for TokioScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokioScheduler").finish_non_exhaustive()
    }
}

struct TokioTask(AbortHandle);

impl ScheduledTask for TokioTask {
    fn cancel(&self) {
        self.0.abort();
    }
}
