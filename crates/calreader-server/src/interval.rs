//! Periodic background tasks.
//!
//! [`run_at_interval`] spawns a loop that runs a task once per period until
//! its [`IntervalHandle`] is cancelled or dropped.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Handle to a task started by [`run_at_interval`].
///
/// Dropping the handle cancels the task.
#[derive(Debug)]
pub struct IntervalHandle {
    name: String,
    cancel_tx: watch::Sender<bool>,
    join: Option<JoinHandle<()>>,
}

impl IntervalHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stops the loop before its next tick. A run already in progress finishes.
    pub fn cancel(&self) {
        self.cancel_tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel_tx.borrow()
    }

    /// Waits for the loop to exit.
    ///
    /// Only returns once the handle has been cancelled (or the task panicked).
    pub async fn stopped(mut self) {
        if let Some(join) = self.join.take() {
            let _ = join.await;
        }
    }
}

impl Drop for IntervalHandle {
    fn drop(&mut self) {
        self.cancel_tx.send_replace(true);
    }
}

/// Runs `task` every `period`, starting one period from now.
///
/// Ticks missed while a run overruns the period are skipped, so runs never
/// overlap or burst to catch up.
pub fn run_at_interval<F, Fut>(name: impl Into<String>, period: Duration, task: F) -> IntervalHandle
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let name = name.into();
    let period = period.max(Duration::from_millis(1));
    let (cancel_tx, mut cancel_rx) = watch::channel(false);

    let task_name = name.clone();
    let join = tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(task = %task_name, period_secs = period.as_secs(), "interval task started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if *cancel_rx.borrow() {
                        break;
                    }
                    debug!(task = %task_name, "running");
                    task().await;
                }
                changed = cancel_rx.changed() => {
                    // a closed channel means the handle is gone
                    if changed.is_err() || *cancel_rx.borrow() {
                        break;
                    }
                }
            }
        }

        info!(task = %task_name, "interval task stopped");
    });

    IntervalHandle {
        name,
        cancel_tx,
        join: Some(join),
    }
}
