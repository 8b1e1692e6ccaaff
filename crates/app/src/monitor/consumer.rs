//! Bus roles of the monitor: it consumes value events and produces report
//! requests.

use std::future::ready;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use zonehub_domain::event::{Event, EventPayload};

use super::Monitor;
use crate::event_bus::consume;
use crate::ports::{EventConsumer, EventProducer, EventPublisher};

const NAME: &str = "Monitor";

impl<P: EventPublisher> Monitor<P> {
    /// Apply one bus event. Only value events are of interest; everything
    /// else, including the monitor's own report requests, is ignored.
    pub fn handle_event(&self, event: &Event) {
        match &event.payload {
            EventPayload::SensorAttrChanged { sensor_id, attr } => {
                self.sensor_attr_changed(sensor_id, attr.clone());
            }
            EventPayload::SensorsReporting { sensors } => {
                for (sensor_id, attr) in sensors {
                    self.sensor_attr_changed(sensor_id, attr.clone());
                }
            }
            EventPayload::ZoneLevelChanged { zone_id, level } => {
                self.zone_level_changed(zone_id, *level);
            }
            EventPayload::ZonesReporting { zones } => {
                for (zone_id, level) in zones {
                    self.zone_level_changed(zone_id, *level);
                }
            }
            EventPayload::SensorsReport { .. } | EventPayload::ZonesReport { .. } => {
                tracing::debug!(event = event.kind(), "event ignored by monitor");
            }
        }
    }

    /// The consumer missed `skipped` events, so any cached value may be
    /// stale. Drop them all; the next refresh asks the extensions again.
    fn values_lost(&self, skipped: u64) {
        let mut store = self.store.write();
        let stats = store.stats();
        store.clear_values();
        drop(store);
        tracing::warn!(
            skipped,
            cached_zones = stats.cached_zones,
            cached_sensors = stats.cached_sensors,
            "monitor missed events, value cache cleared"
        );
    }
}

impl<P> EventConsumer for Monitor<P>
where
    P: EventPublisher + Send + Sync + 'static,
{
    fn consumer_name(&self) -> &'static str {
        NAME
    }

    fn start_consuming(self: Arc<Self>, events: broadcast::Receiver<Event>) -> JoinHandle<()> {
        tokio::spawn(async move {
            consume(
                NAME,
                events,
                |event| {
                    self.handle_event(&event);
                    ready(())
                },
                |skipped| self.values_lost(skipped),
            )
            .await;
        })
    }
}

impl<P> EventProducer for Monitor<P>
where
    P: EventPublisher + Send + Sync,
{
    fn producer_name(&self) -> &'static str {
        NAME
    }
}
