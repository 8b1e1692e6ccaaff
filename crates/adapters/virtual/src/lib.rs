//! # zonehub-adapter-virtual
//!
//! Virtual/demo extension that simulates a handful of zones and sensors on
//! the event bus. It answers the monitor's report requests and publishes a
//! change event whenever one of its values is set.
//!
//! ## Provided entities
//!
//! | Kind | ID | Initial value |
//! |------|----|---------------|
//! | Light zone | `living_room_light` | level 0 |
//! | Shade zone | `bedroom_shade` | level 100 |
//! | Outlet zone | `porch_outlet` | level 0 |
//! | Sensor | `hallway_temperature` | `temperature = 21.5` |
//!
//! ## Dependency rule
//!
//! Depends on `zonehub-app` (port traits) and `zonehub-domain` only.

mod devices;
mod error;

pub use error::VirtualError;

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use zonehub_app::event_bus::consume;
use zonehub_app::ports::{EventConsumer, EventProducer, EventPublisher};
use zonehub_domain::error::HubError;
use zonehub_domain::event::{Event, EventPayload};
use zonehub_domain::id::{SensorId, ZoneId};
use zonehub_domain::sensor::{AttributeValue, SensorAttr};
use zonehub_domain::zone::{Level, ZoneType};

use devices::{VirtualSensor, VirtualZone};

const NAME: &str = "virtual";

/// Virtual extension publishing through `P`.
pub struct VirtualIntegration<P> {
    publisher: P,
    zones: BTreeMap<ZoneId, VirtualZone>,
    sensors: BTreeMap<SensorId, VirtualSensor>,
}

impl<P: EventPublisher> VirtualIntegration<P> {
    /// Create the extension with its default set of entities.
    pub fn new(publisher: P) -> Self {
        let zones = BTreeMap::from([
            (
                ZoneId::from("living_room_light"),
                VirtualZone::new(ZoneType::Light, Level::new(0.0)),
            ),
            (
                ZoneId::from("bedroom_shade"),
                VirtualZone::new(ZoneType::Shade, Level::new(100.0)),
            ),
            (
                ZoneId::from("porch_outlet"),
                VirtualZone::new(ZoneType::Outlet, Level::new(0.0)),
            ),
        ]);
        let sensors = BTreeMap::from([(
            SensorId::from("hallway_temperature"),
            VirtualSensor::new("temperature", AttributeValue::Float(21.5)),
        )]);
        Self {
            publisher,
            zones,
            sensors,
        }
    }

    /// IDs of every simulated zone.
    pub fn zone_ids(&self) -> impl Iterator<Item = &ZoneId> {
        self.zones.keys()
    }

    /// IDs of every simulated sensor.
    pub fn sensor_ids(&self) -> impl Iterator<Item = &SensorId> {
        self.sensors.keys()
    }

    /// Kind of the zone, if it exists.
    pub fn zone_type(&self, zone_id: &ZoneId) -> Option<ZoneType> {
        self.zones.get(zone_id).map(VirtualZone::zone_type)
    }

    /// Current level of the zone, if it exists.
    pub fn zone_level(&self, zone_id: &ZoneId) -> Option<Level> {
        self.zones.get(zone_id).map(VirtualZone::level)
    }

    /// Current reading of the sensor, if it exists.
    pub fn sensor_attr(&self, sensor_id: &SensorId) -> Option<SensorAttr> {
        self.sensors.get(sensor_id).map(VirtualSensor::attr)
    }

    /// Drive a zone to `level` and announce it on the bus.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] for an unknown zone, or the publisher's
    /// error if the change event could not be published.
    pub async fn set_zone_level(&self, zone_id: &ZoneId, level: Level) -> Result<(), HubError> {
        let zone = self
            .zones
            .get(zone_id)
            .ok_or_else(|| VirtualError::UnknownZone(zone_id.clone()))?;
        let previous = zone.set_level(level);
        tracing::debug!(%zone_id, from = previous.value, to = level.value, "virtual zone set");

        self.publisher
            .publish(Event::new(EventPayload::ZoneLevelChanged {
                zone_id: zone_id.clone(),
                level,
            }))
            .await
            .map_err(VirtualError::Publish)?;
        Ok(())
    }

    /// Change a sensor reading and announce it on the bus.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] for an unknown sensor, or the
    /// publisher's error if the change event could not be published.
    pub async fn set_sensor_value(
        &self,
        sensor_id: &SensorId,
        value: AttributeValue,
    ) -> Result<(), HubError> {
        let sensor = self
            .sensors
            .get(sensor_id)
            .ok_or_else(|| VirtualError::UnknownSensor(sensor_id.clone()))?;
        let attr = sensor.set_value(value);
        tracing::debug!(%sensor_id, value = %attr.value, "virtual sensor set");

        self.publisher
            .publish(Event::new(EventPayload::SensorAttrChanged {
                sensor_id: sensor_id.clone(),
                attr,
            }))
            .await
            .map_err(VirtualError::Publish)?;
        Ok(())
    }

    /// Answer a report request with the values this extension knows.
    ///
    /// Other events, and requests that name none of our entities, are
    /// ignored.
    pub async fn handle_event(&self, event: &Event) {
        let reply = match &event.payload {
            EventPayload::ZonesReport { zone_ids } => self.report_zones(zone_ids),
            EventPayload::SensorsReport { sensor_ids } => self.report_sensors(sensor_ids),
            _ => None,
        };
        let Some(reply) = reply else {
            return;
        };
        let kind = reply.kind();
        if let Err(err) = self.publisher.publish(Event::new(reply)).await {
            tracing::warn!(error = %err, event = kind, "failed to publish virtual report");
        }
    }

    fn report_zones(&self, zone_ids: &[ZoneId]) -> Option<EventPayload> {
        let zones: BTreeMap<_, _> = zone_ids
            .iter()
            .filter_map(|zone_id| match self.zones.get(zone_id) {
                Some(zone) => Some((zone_id.clone(), zone.level())),
                None => {
                    tracing::debug!(%zone_id, "zone not handled by virtual extension");
                    None
                }
            })
            .collect();
        (!zones.is_empty()).then_some(EventPayload::ZonesReporting { zones })
    }

    fn report_sensors(&self, sensor_ids: &[SensorId]) -> Option<EventPayload> {
        let sensors: BTreeMap<_, _> = sensor_ids
            .iter()
            .filter_map(|sensor_id| match self.sensors.get(sensor_id) {
                Some(sensor) => Some((sensor_id.clone(), sensor.attr())),
                None => {
                    tracing::debug!(%sensor_id, "sensor not handled by virtual extension");
                    None
                }
            })
            .collect();
        (!sensors.is_empty()).then_some(EventPayload::SensorsReporting { sensors })
    }
}

impl<P> EventConsumer for VirtualIntegration<P>
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
                    let this = Arc::clone(&self);
                    async move { this.handle_event(&event).await }
                },
                |_| {},
            )
            .await;
        })
    }
}

impl<P> EventProducer for VirtualIntegration<P>
where
    P: EventPublisher + Send + Sync,
{
    fn producer_name(&self) -> &'static str {
        NAME
    }

    fn start_producing(&self) {
        tracing::info!(
            zones = self.zones.len(),
            sensors = self.sensors.len(),
            "virtual extension ready"
        );
    }
}
