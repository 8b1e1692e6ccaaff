//! Monitor store — the group table, both subscription indices and both value
//! caches, kept consistent behind whole operations.
//!
//! Nothing outside this module touches the maps directly. Every method is
//! one logical step, so the monitor can run each public operation under a
//! single lock acquisition.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::time::Instant;

use zonehub_domain::change_batch::ChangeBatch;
use zonehub_domain::id::{MonitorId, SensorId, ZoneId};
use zonehub_domain::sensor::SensorAttr;
use zonehub_domain::zone::Level;

use super::cache::ValueCache;
use super::group::{ActiveGroup, MonitorGroup, deadline};
use super::index::SubscriptionIndex;
use crate::ports::MonitorDelegate;

/// A change batch together with the delegate it is addressed to.
pub(crate) struct Notification {
    pub(crate) delegate: Arc<dyn MonitorDelegate>,
    pub(crate) batch: ChangeBatch,
}

impl Notification {
    pub(crate) fn deliver(self) {
        self.delegate.update(self.batch);
    }
}

/// What a refresh has to do once the lock is released.
pub(crate) struct RefreshPlan {
    pub(crate) cached: Notification,
    pub(crate) sensor_ids: Vec<SensorId>,
    pub(crate) zone_ids: Vec<ZoneId>,
}

/// Sizes of the store's tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    /// Live monitor groups.
    pub groups: usize,
    /// Distinct zones referenced by at least one group.
    pub watched_zones: usize,
    /// Distinct sensors referenced by at least one group.
    pub watched_sensors: usize,
    /// Zones with a cached level.
    pub cached_zones: usize,
    /// Sensors with a cached value.
    pub cached_sensors: usize,
}

#[derive(Debug)]
pub(crate) struct MonitorStore {
    next_id: u64,
    groups: BTreeMap<MonitorId, ActiveGroup>,
    sensor_index: SubscriptionIndex<SensorId>,
    zone_index: SubscriptionIndex<ZoneId>,
    sensor_values: ValueCache<SensorId, SensorAttr>,
    zone_values: ValueCache<ZoneId, Level>,
}

impl Default for MonitorStore {
    fn default() -> Self {
        Self::with_values(BTreeMap::new(), BTreeMap::new())
    }
}

impl MonitorStore {
    pub(crate) fn with_values(
        sensor_values: impl IntoIterator<Item = (SensorId, SensorAttr)>,
        zone_values: impl IntoIterator<Item = (ZoneId, Level)>,
    ) -> Self {
        Self {
            next_id: 1,
            groups: BTreeMap::new(),
            sensor_index: SubscriptionIndex::default(),
            zone_index: SubscriptionIndex::default(),
            sensor_values: ValueCache::from_values(sensor_values),
            zone_values: ValueCache::from_values(zone_values),
        }
    }

    /// Register `group` under a fresh ID and index every entity it lists.
    pub(crate) fn insert(&mut self, group: MonitorGroup, now: Instant) -> MonitorId {
        let id = MonitorId::from_raw(self.next_id);
        self.next_id += 1;

        for sensor_id in &group.sensor_ids {
            self.sensor_index.insert(sensor_id.clone(), id);
        }
        for zone_id in &group.zone_ids {
            self.zone_index.insert(zone_id.clone(), id);
        }

        let expires_at = deadline(now, group.lease);
        self.groups.insert(
            id,
            ActiveGroup {
                id,
                group: Arc::new(group),
                expires_at,
            },
        );
        id
    }

    pub(crate) fn get(&self, id: MonitorId) -> Option<&ActiveGroup> {
        self.groups.get(&id)
    }

    /// Push the group's deadline to `now + lease`. `None` if unknown.
    pub(crate) fn renew(&mut self, id: MonitorId, now: Instant) -> Option<Instant> {
        let active = self.groups.get_mut(&id)?;
        active.expires_at = deadline(now, active.group.lease);
        Some(active.expires_at)
    }

    /// Drop the group, its index entries, and the cached values nobody else
    /// references any more.
    pub(crate) fn remove(&mut self, id: MonitorId) -> Option<ActiveGroup> {
        let active = self.groups.remove(&id)?;
        for sensor_id in &active.group.sensor_ids {
            if self.sensor_index.remove(sensor_id, id) {
                self.sensor_values.evict(sensor_id);
            }
        }
        for zone_id in &active.group.zone_ids {
            if self.zone_index.remove(zone_id, id) {
                self.zone_values.evict(zone_id);
            }
        }
        Some(active)
    }

    /// Split the group's entities into values answerable from the cache and
    /// IDs that must be fetched. With `force`, everything is fetched.
    pub(crate) fn plan_refresh(&self, id: MonitorId, force: bool) -> Option<RefreshPlan> {
        let active = self.groups.get(&id)?;
        let group = &active.group;
        let mut batch = ChangeBatch::new(id);
        let mut sensor_ids = Vec::new();
        let mut zone_ids = Vec::new();

        for sensor_id in &group.sensor_ids {
            match self.sensor_values.get(sensor_id) {
                Some(attr) if !force => {
                    batch.sensors.insert(sensor_id.clone(), attr.clone());
                }
                _ => sensor_ids.push(sensor_id.clone()),
            }
        }
        for zone_id in &group.zone_ids {
            match self.zone_values.get(zone_id) {
                Some(level) if !force => {
                    batch.zones.insert(zone_id.clone(), *level);
                }
                _ => zone_ids.push(zone_id.clone()),
            }
        }

        Some(RefreshPlan {
            cached: Notification {
                delegate: Arc::clone(&group.delegate),
                batch,
            },
            sensor_ids,
            zone_ids,
        })
    }

    /// Forget the cached values of every entity the group lists.
    /// Returns `false` if the group is unknown.
    pub(crate) fn invalidate(&mut self, id: MonitorId) -> bool {
        let Some(active) = self.groups.get(&id) else {
            return false;
        };
        for sensor_id in &active.group.sensor_ids {
            self.sensor_values.evict(sensor_id);
        }
        for zone_id in &active.group.zone_ids {
            self.zone_values.evict(zone_id);
        }
        true
    }

    /// Forget every cached value. The indices stay, so the next refresh
    /// fetches each watched entity again.
    pub(crate) fn clear_values(&mut self) {
        self.sensor_values.clear();
        self.zone_values.clear();
    }

    /// Apply a sensor reading. Returns one notification per interested
    /// group, or none if the sensor is not monitored or the value is
    /// unchanged.
    pub(crate) fn record_sensor(
        &mut self,
        sensor_id: &SensorId,
        attr: SensorAttr,
    ) -> Vec<Notification> {
        let Some(interested) = self.sensor_index.groups(sensor_id) else {
            return Vec::new();
        };
        if !self
            .sensor_values
            .record(sensor_id.clone(), attr.clone(), SensorAttr::same_value)
        {
            return Vec::new();
        }
        interested
            .iter()
            .filter_map(|id| self.groups.get(id))
            .map(|active| Notification {
                delegate: Arc::clone(&active.group.delegate),
                batch: ChangeBatch::sensor(active.id, sensor_id.clone(), attr.clone()),
            })
            .collect()
    }

    /// Apply a zone level. Same contract as [`record_sensor`](Self::record_sensor).
    pub(crate) fn record_zone(&mut self, zone_id: &ZoneId, level: Level) -> Vec<Notification> {
        let Some(interested) = self.zone_index.groups(zone_id) else {
            return Vec::new();
        };
        if !self.zone_values.record(zone_id.clone(), level, |a, b| a == b) {
            return Vec::new();
        }
        interested
            .iter()
            .filter_map(|id| self.groups.get(id))
            .map(|active| Notification {
                delegate: Arc::clone(&active.group.delegate),
                batch: ChangeBatch::zone(active.id, zone_id.clone(), level),
            })
            .collect()
    }

    /// Remove and return every group whose lease lapsed at `now`.
    pub(crate) fn take_expired(&mut self, now: Instant) -> Vec<ActiveGroup> {
        let expired: Vec<MonitorId> = self
            .groups
            .values()
            .filter(|active| active.is_expired(now))
            .map(|active| active.id)
            .collect();
        expired.into_iter().filter_map(|id| self.remove(id)).collect()
    }

    pub(crate) fn stats(&self) -> MonitorStats {
        MonitorStats {
            groups: self.groups.len(),
            watched_zones: self.zone_index.len(),
            watched_sensors: self.sensor_index.len(),
            cached_zones: self.zone_values.len(),
            cached_sensors: self.sensor_values.len(),
        }
    }
}
