//! Monitor groups — a client's standing subscription to zones and sensors.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use zonehub_domain::error::{HubError, ValidationError};
use zonehub_domain::id::{MonitorId, SensorId, ZoneId};

use crate::ports::MonitorDelegate;

/// Lease used when a builder is not given one.
pub const DEFAULT_LEASE: Duration = Duration::from_secs(60);

/// The zones and sensors a client wants updates for, who to notify, and
/// how long the subscription lives without renewal.
pub struct MonitorGroup {
    pub zone_ids: BTreeSet<ZoneId>,
    pub sensor_ids: BTreeSet<SensorId>,
    pub delegate: Arc<dyn MonitorDelegate>,
    pub lease: Duration,
}

impl MonitorGroup {
    /// Create a builder for constructing a [`MonitorGroup`].
    #[must_use]
    pub fn builder() -> MonitorGroupBuilder {
        MonitorGroupBuilder::default()
    }

    /// Whether the group references no zone and no sensor.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zone_ids.is_empty() && self.sensor_ids.is_empty()
    }

    /// Check the invariants required to subscribe.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] with [`ValidationError::ZeroLease`]
    /// when the lease is zero, or [`ValidationError::EmptyMonitorGroup`] when
    /// the group lists no zones and no sensors.
    pub fn validate(&self) -> Result<(), HubError> {
        if self.lease.is_zero() {
            return Err(ValidationError::ZeroLease.into());
        }
        if self.is_empty() {
            return Err(ValidationError::EmptyMonitorGroup.into());
        }
        Ok(())
    }
}

impl fmt::Debug for MonitorGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitorGroup")
            .field("zone_ids", &self.zone_ids)
            .field("sensor_ids", &self.sensor_ids)
            .field("lease", &self.lease)
            .finish_non_exhaustive()
    }
}

/// Step-by-step builder for [`MonitorGroup`].
#[derive(Default)]
pub struct MonitorGroupBuilder {
    zone_ids: BTreeSet<ZoneId>,
    sensor_ids: BTreeSet<SensorId>,
    delegate: Option<Arc<dyn MonitorDelegate>>,
    lease: Option<Duration>,
}

impl MonitorGroupBuilder {
    #[must_use]
    pub fn zone(mut self, zone_id: impl Into<ZoneId>) -> Self {
        self.zone_ids.insert(zone_id.into());
        self
    }

    #[must_use]
    pub fn zones<I, Z>(mut self, zone_ids: I) -> Self
    where
        I: IntoIterator<Item = Z>,
        Z: Into<ZoneId>,
    {
        self.zone_ids.extend(zone_ids.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn sensor(mut self, sensor_id: impl Into<SensorId>) -> Self {
        self.sensor_ids.insert(sensor_id.into());
        self
    }

    #[must_use]
    pub fn sensors<I, S>(mut self, sensor_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SensorId>,
    {
        self.sensor_ids.extend(sensor_ids.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn delegate(mut self, delegate: Arc<dyn MonitorDelegate>) -> Self {
        self.delegate = Some(delegate);
        self
    }

    #[must_use]
    pub fn lease(mut self, lease: Duration) -> Self {
        self.lease = Some(lease);
        self
    }

    /// Consume the builder, validate, and return a [`MonitorGroup`].
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] when the delegate is missing, the
    /// lease is zero, or no zone and no sensor were listed.
    pub fn build(self) -> Result<MonitorGroup, HubError> {
        let delegate = self.delegate.ok_or(ValidationError::MissingDelegate)?;
        let lease = self.lease.unwrap_or(DEFAULT_LEASE);
        let group = MonitorGroup {
            zone_ids: self.zone_ids,
            sensor_ids: self.sensor_ids,
            delegate,
            lease,
        };
        group.validate()?;
        Ok(group)
    }
}

/// A subscribed group as the monitor tracks it.
#[derive(Debug, Clone)]
pub struct ActiveGroup {
    pub id: MonitorId,
    pub group: Arc<MonitorGroup>,
    pub expires_at: Instant,
}

impl ActiveGroup {
    /// Whether the lease has lapsed at `now`.
    #[must_use]
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }
}

/// `now + lease`, saturating far in the future instead of overflowing.
pub(crate) fn deadline(now: Instant, lease: Duration) -> Instant {
    now.checked_add(lease)
        .unwrap_or_else(|| now + Duration::from_secs(60 * 60 * 24 * 365 * 30))
}
