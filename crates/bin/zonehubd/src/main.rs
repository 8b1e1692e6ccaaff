//! # zonehubd — zonehub daemon
//!
//! Composition root that wires the event bus, the monitor and the extensions
//! together.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Initialise logging
//! - Build the in-process event bus and attach the monitor to it as both a
//!   consumer and a producer
//! - Start the monitor's expiry sweep
//! - Start the enabled extensions
//! - Watch every virtual entity through a logging delegate, renewing the
//!   lease as long as the daemon runs
//! - Stop background tasks on Ctrl-C
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

mod config;
mod delegate;

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing_subscriber::EnvFilter;

use zonehub_adapter_virtual::VirtualIntegration;
use zonehub_app::event_bus::InProcessEventBus;
use zonehub_app::monitor::{Monitor, MonitorGroup};
use zonehub_domain::id::MonitorId;

use config::Config;
use delegate::LoggingDelegate;

type HubMonitor = Monitor<Arc<InProcessEventBus>>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Event bus
    let bus = Arc::new(InProcessEventBus::new(config.bus.capacity));

    // Monitor
    let monitor: Arc<HubMonitor> =
        Arc::new(Monitor::new(Arc::clone(&bus), config.monitor_config()));
    let mut tasks = vec![bus.add_consumer(Arc::clone(&monitor))];
    bus.add_producer(&*monitor);
    tasks.push(monitor.start_expiry_sweep());

    // Extensions
    let integration = if config.integrations.virtual_enabled {
        let integration = Arc::new(VirtualIntegration::new(Arc::clone(&bus)));
        tasks.push(bus.add_consumer(Arc::clone(&integration)));
        bus.add_producer(&*integration);

        let group = MonitorGroup::builder()
            .zones(integration.zone_ids().cloned())
            .sensors(integration.sensor_ids().cloned())
            .delegate(Arc::new(LoggingDelegate))
            .lease(config.lease())
            .build()?;
        let monitor_id = monitor.subscribe(group, true).await?;
        tasks.push(keep_alive(&monitor, monitor_id, config.lease()));
        Some(integration)
    } else {
        None
    };

    tracing::info!(consumers = bus.consumer_count(), "zonehubd running");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");

    if let Some(integration) = &integration {
        bus.remove_producer(&**integration);
        bus.remove_consumer(&**integration);
    }
    bus.remove_producer(&*monitor);
    bus.remove_consumer(&*monitor);

    for task in &tasks {
        task.abort();
    }
    for task in tasks {
        let _ = task.await;
    }
    Ok(())
}

/// Renew `monitor_id` every half lease until the group is gone.
fn keep_alive(
    monitor: &Arc<HubMonitor>,
    monitor_id: MonitorId,
    lease: Duration,
) -> JoinHandle<()> {
    let monitor = Arc::clone(monitor);
    let period = lease / 2;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(err) = monitor.subscribe_renew(monitor_id) {
                tracing::warn!(%monitor_id, error = %err, "stopped renewing monitor group");
                break;
            }
        }
    })
}
