use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use vidfetch_logging::{vid_debug, vid_trace};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Fixed-cadence poll timer.
///
/// At most one timer task exists at a time. Each armed timer runs under a
/// child of the owner's token, so cancelling the parent (teardown) stops it
/// as surely as [`PollScheduler::disarm`] does.
pub struct PollScheduler {
    interval: Duration,
    parent: CancellationToken,
    active: Option<CancellationToken>,
}

impl PollScheduler {
    pub fn new(interval: Duration, parent: CancellationToken) -> Self {
        Self {
            interval,
            parent,
            active: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_armed(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }

    /// Starts ticking every interval, first tick one interval from now.
    ///
    /// `on_tick` returning `false` ends the timer (its receiver is gone).
    /// Returns `false` without spawning when already armed or torn down.
    /// Must be called from within a tokio runtime.
    pub fn arm<F>(&mut self, on_tick: F) -> bool
    where
        F: Fn() -> bool + Send + 'static,
    {
        if self.is_armed() || self.parent.is_cancelled() {
            return false;
        }

        let token = self.parent.child_token();
        self.active = Some(token.clone());
        let period = self.interval;
        vid_debug!("Poll timer armed every {:?}", period);

        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        vid_trace!("Poll timer tick");
                        if !on_tick() {
                            break;
                        }
                    }
                }
            }
            vid_debug!("Poll timer stopped");
        });
        true
    }

    /// Cancels the running timer. Returns `false` if none was armed.
    pub fn disarm(&mut self) -> bool {
        match self.active.take() {
            Some(token) => {
                let was_running = !token.is_cancelled();
                token.cancel();
                was_running
            }
            None => false,
        }
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.disarm();
    }
}
