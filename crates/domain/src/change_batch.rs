//! Change batch — the payload handed to a monitor delegate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::{MonitorId, SensorId, ZoneId};
use crate::sensor::SensorAttr;
use crate::zone::Level;

/// Zone and sensor values reported together to one monitor group.
///
/// Built per notification and handed over by value; the monitor keeps no
/// reference to it afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeBatch {
    pub monitor_id: MonitorId,
    #[serde(default)]
    pub sensors: BTreeMap<SensorId, SensorAttr>,
    #[serde(default)]
    pub zones: BTreeMap<ZoneId, Level>,
}

impl ChangeBatch {
    /// An empty batch addressed to `monitor_id`.
    #[must_use]
    pub fn new(monitor_id: MonitorId) -> Self {
        Self {
            monitor_id,
            sensors: BTreeMap::new(),
            zones: BTreeMap::new(),
        }
    }

    /// A batch carrying a single sensor value.
    #[must_use]
    pub fn sensor(monitor_id: MonitorId, sensor_id: SensorId, attr: SensorAttr) -> Self {
        let mut batch = Self::new(monitor_id);
        batch.sensors.insert(sensor_id, attr);
        batch
    }

    /// A batch carrying a single zone level.
    #[must_use]
    pub fn zone(monitor_id: MonitorId, zone_id: ZoneId, level: Level) -> Self {
        let mut batch = Self::new(monitor_id);
        batch.zones.insert(zone_id, level);
        batch
    }

    /// Whether the batch carries no values at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty() && self.zones.is_empty()
    }

    /// Total number of values in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sensors.len() + self.zones.len()
    }
}
