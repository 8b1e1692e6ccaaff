//! Event — an immutable record carried by the event bus.
//!
//! Two families travel on the bus:
//! - **value events** published by extensions when they learn a zone level or
//!   a sensor reading (consumed by the monitor);
//! - **report requests** published by the monitor when it needs fresh values
//!   (consumed by extensions that know how to query real devices).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{EventId, SensorId, ZoneId};
use crate::sensor::SensorAttr;
use crate::zone::Level;

/// UTC timestamp attached to bus events.
pub type Timestamp = DateTime<Utc>;

/// What happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// A single sensor reported a new attribute value.
    SensorAttrChanged { sensor_id: SensorId, attr: SensorAttr },
    /// Several sensors reported their values at once.
    SensorsReporting {
        sensors: BTreeMap<SensorId, SensorAttr>,
    },
    /// Several zones reported their levels at once.
    ZonesReporting { zones: BTreeMap<ZoneId, Level> },
    /// A single zone reported a new level.
    ZoneLevelChanged { zone_id: ZoneId, level: Level },
    /// Request: whoever owns these sensors should report their values.
    SensorsReport { sensor_ids: Vec<SensorId> },
    /// Request: whoever owns these zones should report their levels.
    ZonesReport { zone_ids: Vec<ZoneId> },
}

impl EventPayload {
    /// Stable `snake_case` name, used in logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SensorAttrChanged { .. } => "sensor_attr_changed",
            Self::SensorsReporting { .. } => "sensors_reporting",
            Self::ZonesReporting { .. } => "zones_reporting",
            Self::ZoneLevelChanged { .. } => "zone_level_changed",
            Self::SensorsReport { .. } => "sensors_report",
            Self::ZonesReport { .. } => "zones_report",
        }
    }
}

/// An event as published on the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub payload: EventPayload,
    pub timestamp: Timestamp,
}

impl Event {
    /// Stamp a payload with a fresh id and the current time.
    #[must_use]
    pub fn new(payload: EventPayload) -> Self {
        Self {
            id: EventId::new(),
            payload,
            timestamp: Utc::now(),
        }
    }

    /// Shorthand for [`EventPayload::kind`].
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.payload.kind()
    }
}
