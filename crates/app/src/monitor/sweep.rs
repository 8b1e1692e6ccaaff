//! Periodic expiry sweep.

use std::sync::{Arc, Weak};

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::Monitor;
use crate::ports::EventPublisher;

impl<P> Monitor<P>
where
    P: EventPublisher + Send + Sync + 'static,
{
    /// Spawn the task that purges lapsed groups every
    /// [`sweep_interval`](super::MonitorConfig::sweep_interval).
    ///
    /// The task only holds a weak reference and stops on its own once the
    /// monitor is dropped. Abort the handle to stop it earlier.
    pub fn start_expiry_sweep(self: &Arc<Self>) -> JoinHandle<()> {
        let period = self.config.sweep_interval;
        let monitor = Arc::downgrade(self);
        tracing::info!(period_secs = period.as_secs_f64(), "starting monitor expiry sweep");
        tokio::spawn(run_sweep(monitor, period))
    }
}

async fn run_sweep<P>(monitor: Weak<Monitor<P>>, period: std::time::Duration)
where
    P: EventPublisher + Send + Sync + 'static,
{
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let Some(monitor) = monitor.upgrade() else {
            tracing::debug!("monitor dropped, expiry sweep stopped");
            break;
        };
        let expired = monitor.sweep_expired();
        if !expired.is_empty() {
            tracing::debug!(count = expired.len(), "expiry sweep removed groups");
        }
    }
}
