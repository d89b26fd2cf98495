//! Periodic tick loop.
//!
//! The driver wakes at a nominal interval and hands the target the time that
//! actually passed since the previous wake, so scheduler jitter and long
//! suspensions are accounted for exactly. The epoch check and the tick run
//! inside the same critical section as every other command on the target,
//! which makes cancellation race-free: once `cancel()` has returned, no
//! further tick can land.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Something the driver can advance.
pub trait DriveTarget: Send + 'static {
    fn is_running(&self) -> bool;
    fn on_tick(&mut self, elapsed: Duration);
}

/// Owns at most one tick loop at a time.
#[derive(Debug)]
pub struct TickDriver {
    interval: Duration,
    epoch: Arc<AtomicU64>,
    /// Instant of the last wake, read and written under the target's lock.
    last_wake: Arc<std::sync::Mutex<Instant>>,
    handle: Option<JoinHandle<()>>,
}

impl TickDriver {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            epoch: Arc::new(AtomicU64::new(0)),
            last_wake: Arc::new(std::sync::Mutex::new(Instant::now())),
            handle: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether a loop is currently alive.
    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Spawn a loop for `target`, replacing any previous one.
    ///
    /// The loop only holds a weak reference and ends once the target is
    /// dropped. Must be called from within a tokio runtime.
    pub fn start<T: DriveTarget>(&mut self, target: &Arc<Mutex<T>>) {
        self.cancel();
        let target = Arc::downgrade(target);
        let epoch = self.epoch.load(Ordering::SeqCst);
        let current_epoch = Arc::clone(&self.epoch);
        let last_wake = Arc::clone(&self.last_wake);
        let period = self.interval;

        let started = Instant::now();
        set_instant(&last_wake, started);

        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(started + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;

                let Some(target) = target.upgrade() else {
                    tracing::debug!("tick driver stopping: target dropped");
                    break;
                };
                let mut guard = target.lock().await;
                if current_epoch.load(Ordering::SeqCst) != epoch || !guard.is_running() {
                    break;
                }
                let elapsed = take_elapsed(&last_wake);
                guard.on_tick(elapsed);
                if !guard.is_running() {
                    tracing::debug!("tick driver stopping: target no longer running");
                    break;
                }
            }
        });
        self.handle = Some(handle);
    }

    /// Time since the previous wake, consumed so the loop will not count it
    /// again. Call with the target's lock held, before pausing or skipping.
    pub fn flush(&self) -> Duration {
        if !self.is_active() {
            return Duration::ZERO;
        }
        take_elapsed(&self.last_wake)
    }

    /// Stop the current loop, if any.
    pub fn cancel(&mut self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Default for TickDriver {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL)
    }
}

impl Drop for TickDriver {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn take_elapsed(last_wake: &std::sync::Mutex<Instant>) -> Duration {
    let now = Instant::now();
    let mut last = last_wake.lock().unwrap_or_else(|e| e.into_inner());
    let elapsed = now.saturating_duration_since(*last);
    *last = now;
    elapsed
}

fn set_instant(last_wake: &std::sync::Mutex<Instant>, at: Instant) {
    *last_wake.lock().unwrap_or_else(|e| e.into_inner()) = at;
}
