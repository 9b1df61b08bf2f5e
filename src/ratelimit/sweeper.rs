//! Background eviction of expired rate limit records.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::limiter::RateLimiter;

/// Spawn a task that calls [`RateLimiter::sweep_expired`] every `interval`.
///
/// The task exits once `shutdown` observes `true` or its sender is dropped.
pub fn spawn_sweeper(
    rate_limiter: Arc<RateLimiter>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_secs = interval.as_secs_f64(), "Starting rate limit sweeper");

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = rate_limiter.sweep_expired();
                    if removed > 0 {
                        debug!(
                            removed,
                            remaining = rate_limiter.record_count(),
                            "Evicted expired rate limit records"
                        );
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Rate limit sweeper stopped");
    })
}
