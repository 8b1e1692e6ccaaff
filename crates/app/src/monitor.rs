//! Monitor — tracks live zone and sensor values and keeps subscribed clients
//! informed of changes.
//!
//! Clients [`subscribe`](Monitor::subscribe) a [`MonitorGroup`] listing the
//! zones and sensors they care about. The monitor then:
//! - answers [`refresh`](Monitor::refresh) requests from its value cache, or
//!   publishes report requests on the bus for values it does not know;
//! - consumes value events from the bus, caches them, and fans a
//!   [`ChangeBatch`](zonehub_domain::change_batch::ChangeBatch) out to every
//!   interested group's delegate (see `consumer`);
//! - purges groups whose lease lapsed (see `sweep`).
//!
//! All state lives in one store behind one lock. Each public operation takes
//! the lock once; delegates are called and events published only after it has
//! been released.

mod cache;
mod consumer;
mod group;
mod index;
mod store;
mod sweep;

pub use group::{ActiveGroup, DEFAULT_LEASE, MonitorGroup, MonitorGroupBuilder};
pub use store::MonitorStats;

use std::time::Duration;

use parking_lot::RwLock;
use tokio::time::Instant;

use zonehub_domain::error::{HubError, NotFoundError};
use zonehub_domain::event::{Event, EventPayload};
use zonehub_domain::id::{MonitorId, SensorId, ZoneId};
use zonehub_domain::sensor::SensorAttr;
use zonehub_domain::zone::Level;

use crate::ports::EventPublisher;

use store::{MonitorStore, Notification, RefreshPlan};

/// How often the expiry sweep runs unless configured otherwise.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Monitor tuning.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Period of the expiry sweep. A lapsed group can stay live for up to
    /// one period after its deadline.
    pub sweep_interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

/// Subscription bookkeeping, value cache and change fan-out.
pub struct Monitor<P> {
    publisher: P,
    config: MonitorConfig,
    store: RwLock<MonitorStore>,
}

impl<P: EventPublisher> Monitor<P> {
    /// Create a monitor with an empty value cache.
    pub fn new(publisher: P, config: MonitorConfig) -> Self {
        Self {
            publisher,
            config,
            store: RwLock::new(MonitorStore::default()),
        }
    }

    /// Create a monitor whose cache starts with values the caller already
    /// knows.
    pub fn with_values(
        publisher: P,
        config: MonitorConfig,
        sensor_values: impl IntoIterator<Item = (SensorId, SensorAttr)>,
        zone_values: impl IntoIterator<Item = (ZoneId, Level)>,
    ) -> Self {
        Self {
            publisher,
            config,
            store: RwLock::new(MonitorStore::with_values(sensor_values, zone_values)),
        }
    }

    /// Start tracking `group` and return its monitor ID.
    ///
    /// With `refresh_now`, the group immediately gets whatever the cache
    /// knows and report requests go out for the rest, exactly as
    /// [`refresh`](Self::refresh) with `force = false` would.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] when the lease is zero or the group
    /// lists no zones and no sensors. Nothing is registered in that case.
    pub async fn subscribe(
        &self,
        group: MonitorGroup,
        refresh_now: bool,
    ) -> Result<MonitorId, HubError> {
        group.validate()?;

        let zones = group.zone_ids.len();
        let sensors = group.sensor_ids.len();
        let lease_secs = group.lease.as_secs_f64();

        let (monitor_id, plan) = {
            let mut store = self.store.write();
            let monitor_id = store.insert(group, Instant::now());
            let plan = if refresh_now {
                store.plan_refresh(monitor_id, false)
            } else {
                None
            };
            (monitor_id, plan)
        };

        tracing::info!(%monitor_id, zones, sensors, lease_secs, "monitor group subscribed");

        if let Some(plan) = plan {
            self.execute_refresh(monitor_id, plan).await;
        }
        Ok(monitor_id)
    }

    /// Extend the group's lease to `now + lease`, using the lease length it
    /// was subscribed with.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] when the ID is unknown, e.g. because
    /// the group already expired or was unsubscribed.
    pub fn subscribe_renew(&self, monitor_id: MonitorId) -> Result<(), HubError> {
        let renewed = self.store.write().renew(monitor_id, Instant::now());
        if renewed.is_none() {
            return Err(NotFoundError {
                entity: "Monitor",
                id: monitor_id.to_string(),
            }
            .into());
        }
        tracing::debug!(%monitor_id, "monitor group renewed");
        Ok(())
    }

    /// Stop tracking the group. Cached values no other group references are
    /// dropped with it. Unknown IDs are ignored.
    pub fn unsubscribe(&self, monitor_id: MonitorId) {
        if self.store.write().remove(monitor_id).is_some() {
            tracing::info!(%monitor_id, "monitor group unsubscribed");
        }
    }

    /// Look up a live group.
    pub fn group(&self, monitor_id: MonitorId) -> Option<ActiveGroup> {
        self.store.read().get(monitor_id).cloned()
    }

    /// Report the group's current values.
    ///
    /// Values already cached are handed to the delegate right away in a
    /// single batch (unless `force`); the rest are requested from the
    /// extensions through one report request per entity kind, and arrive
    /// later through the normal change path. Unknown IDs are ignored.
    pub async fn refresh(&self, monitor_id: MonitorId, force: bool) {
        let plan = self.store.read().plan_refresh(monitor_id, force);
        if let Some(plan) = plan {
            self.execute_refresh(monitor_id, plan).await;
        }
    }

    /// Forget the cached values of every zone and sensor the group lists,
    /// so the next refresh fetches them. Unknown IDs are ignored.
    pub fn invalidate_values(&self, monitor_id: MonitorId) {
        if self.store.write().invalidate(monitor_id) {
            tracing::debug!(%monitor_id, "cached values invalidated");
        }
    }

    /// Sizes of the internal tables.
    pub fn stats(&self) -> MonitorStats {
        self.store.read().stats()
    }

    /// Number of live groups.
    pub fn group_count(&self) -> usize {
        self.stats().groups
    }

    /// Remove every group whose lease lapsed and tell its delegate.
    ///
    /// Returns the IDs that expired. Removal happens under one lock
    /// acquisition, so a group can expire at most once even when it is
    /// unsubscribed concurrently.
    pub fn sweep_expired(&self) -> Vec<MonitorId> {
        let expired = self.store.write().take_expired(Instant::now());
        expired
            .into_iter()
            .map(|active| {
                tracing::info!(monitor_id = %active.id, "monitor group expired");
                active.group.delegate.expired(active.id);
                active.id
            })
            .collect()
    }

    pub(crate) fn sensor_attr_changed(&self, sensor_id: &SensorId, attr: SensorAttr) {
        let notifications = self.store.write().record_sensor(sensor_id, attr);
        if notifications.is_empty() {
            tracing::debug!(%sensor_id, "sensor value ignored");
            return;
        }
        tracing::debug!(%sensor_id, groups = notifications.len(), "sensor value changed");
        notifications.into_iter().for_each(Notification::deliver);
    }

    pub(crate) fn zone_level_changed(&self, zone_id: &ZoneId, level: Level) {
        let notifications = self.store.write().record_zone(zone_id, level);
        if notifications.is_empty() {
            tracing::debug!(%zone_id, "zone level ignored");
            return;
        }
        tracing::debug!(%zone_id, groups = notifications.len(), "zone level changed");
        notifications.into_iter().for_each(Notification::deliver);
    }

    async fn execute_refresh(&self, monitor_id: MonitorId, plan: RefreshPlan) {
        let RefreshPlan {
            cached,
            sensor_ids,
            zone_ids,
        } = plan;

        if !cached.batch.is_empty() {
            tracing::debug!(
                %monitor_id,
                values = cached.batch.len(),
                "refresh answered from cache"
            );
            cached.deliver();
        }
        if !sensor_ids.is_empty() {
            tracing::debug!(%monitor_id, sensors = sensor_ids.len(), "requesting sensor values");
            self.request(EventPayload::SensorsReport { sensor_ids }).await;
        }
        if !zone_ids.is_empty() {
            tracing::debug!(%monitor_id, zones = zone_ids.len(), "requesting zone levels");
            self.request(EventPayload::ZonesReport { zone_ids }).await;
        }
    }

    async fn request(&self, payload: EventPayload) {
        let kind = payload.kind();
        if let Err(err) = self.publisher.publish(Event::new(payload)).await {
            tracing::warn!(error = %err, event = kind, "failed to publish report request");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use zonehub_domain::change_batch::ChangeBatch;
    use zonehub_domain::error::ValidationError;
    use zonehub_domain::sensor::AttributeValue;

    use crate::test_support::{FailingPublisher, RecordingDelegate, SpyPublisher};

    fn monitor() -> Monitor<Arc<SpyPublisher>> {
        Monitor::new(Arc::new(SpyPublisher::default()), MonitorConfig::default())
    }

    fn zones_group(delegate: &Arc<RecordingDelegate>, zones: &[&str]) -> MonitorGroup {
        MonitorGroup::builder()
            .zones(zones.iter().copied())
            .delegate(delegate.clone())
            .lease(Duration::from_secs(10))
            .build()
            .unwrap()
    }

    fn temp(value: f64) -> SensorAttr {
        SensorAttr::new("temperature", AttributeValue::Float(value))
    }

    #[tokio::test]
    async fn should_return_unique_ids_for_live_groups() {
        let monitor = monitor();
        let delegate = RecordingDelegate::shared();

        let a = monitor.subscribe(zones_group(&delegate, &["z1"]), false).await.unwrap();
        let b = monitor.subscribe(zones_group(&delegate, &["z1"]), false).await.unwrap();

        assert_ne!(a, b);
        assert_eq!(monitor.group_count(), 2);
        assert!(monitor.publisher.events().is_empty());
    }

    #[tokio::test]
    async fn should_reject_empty_group_without_registering_state() {
        let monitor = monitor();
        let group = MonitorGroup {
            zone_ids: std::collections::BTreeSet::new(),
            sensor_ids: std::collections::BTreeSet::new(),
            delegate: RecordingDelegate::shared(),
            lease: Duration::from_secs(10),
        };

        let result = monitor.subscribe(group, true).await;

        assert!(matches!(
            result,
            Err(HubError::Validation(ValidationError::EmptyMonitorGroup))
        ));
        assert_eq!(monitor.stats(), MonitorStats::default());
        assert!(monitor.publisher.events().is_empty());
    }

    #[tokio::test]
    async fn should_reject_zero_lease_without_registering_state() {
        let monitor = monitor();
        let group = MonitorGroup {
            zone_ids: std::collections::BTreeSet::from([ZoneId::from("z1")]),
            sensor_ids: std::collections::BTreeSet::new(),
            delegate: RecordingDelegate::shared(),
            lease: Duration::ZERO,
        };

        let result = monitor.subscribe(group, true).await;

        assert!(matches!(
            result,
            Err(HubError::Validation(ValidationError::ZeroLease))
        ));
        assert_eq!(monitor.stats(), MonitorStats::default());
        assert!(monitor.publisher.events().is_empty());
    }

    #[tokio::test]
    async fn should_request_uncached_zone_on_subscribe_with_refresh() {
        let monitor = monitor();
        let delegate = RecordingDelegate::shared();

        monitor.subscribe(zones_group(&delegate, &["z1"]), true).await.unwrap();

        assert_eq!(monitor.publisher.zone_requests(), vec![vec![ZoneId::from("z1")]]);
        assert!(monitor.publisher.sensor_requests().is_empty());
        assert!(delegate.updates().is_empty());
    }

    #[tokio::test]
    async fn should_split_refresh_between_cache_and_requests() {
        let monitor = Monitor::with_values(
            Arc::new(SpyPublisher::default()),
            MonitorConfig::default(),
            [(SensorId::from("s1"), temp(20.0))],
            [(ZoneId::from("z1"), Level::new(30.0))],
        );
        let delegate = RecordingDelegate::shared();
        let group = MonitorGroup::builder()
            .zones(["z1", "z2"])
            .sensors(["s1", "s2"])
            .delegate(delegate.clone())
            .build()
            .unwrap();

        let id = monitor.subscribe(group, true).await.unwrap();

        let updates = delegate.updates();
        assert_eq!(updates.len(), 1);
        let mut expected = ChangeBatch::zone(id, "z1".into(), Level::new(30.0));
        expected.sensors.insert("s1".into(), temp(20.0));
        assert_eq!(updates[0], expected);
        assert_eq!(monitor.publisher.zone_requests(), vec![vec![ZoneId::from("z2")]]);
        assert_eq!(monitor.publisher.sensor_requests(), vec![vec![SensorId::from("s2")]]);
    }

    #[tokio::test]
    async fn should_answer_refresh_with_latest_applied_change() {
        let monitor = monitor();
        let delegate = RecordingDelegate::shared();
        let id = monitor.subscribe(zones_group(&delegate, &["z1"]), false).await.unwrap();
        monitor.zone_level_changed(&"z1".into(), Level::new(10.0));
        monitor.zone_level_changed(&"z1".into(), Level::new(20.0));

        monitor.refresh(id, false).await;

        assert_eq!(
            delegate.updates(),
            vec![
                ChangeBatch::zone(id, "z1".into(), Level::new(10.0)),
                ChangeBatch::zone(id, "z1".into(), Level::new(20.0)),
                ChangeBatch::zone(id, "z1".into(), Level::new(20.0)),
            ]
        );
        assert!(monitor.publisher.events().is_empty());
    }

    #[tokio::test]
    async fn should_refetch_everything_when_forced() {
        let monitor = monitor();
        let delegate = RecordingDelegate::shared();
        let id = monitor.subscribe(zones_group(&delegate, &["z1"]), false).await.unwrap();
        monitor.zone_level_changed(&"z1".into(), Level::new(50.0));

        monitor.refresh(id, true).await;

        assert_eq!(delegate.updates().len(), 1);
        assert_eq!(monitor.publisher.zone_requests(), vec![vec![ZoneId::from("z1")]]);
    }

    #[tokio::test]
    async fn should_ignore_refresh_of_unknown_group() {
        let monitor = monitor();
        monitor.refresh(MonitorId::from_raw(5), false).await;
        assert!(monitor.publisher.events().is_empty());
    }

    #[tokio::test]
    async fn should_notify_once_per_distinct_zone_level() {
        let monitor = monitor();
        let delegate = RecordingDelegate::shared();
        let id = monitor.subscribe(zones_group(&delegate, &["z1"]), true).await.unwrap();

        monitor.zone_level_changed(&"z1".into(), Level::new(50.0));
        monitor.zone_level_changed(&"z1".into(), Level::new(50.0));

        assert_eq!(
            delegate.updates(),
            vec![ChangeBatch::zone(id, "z1".into(), Level::new(50.0))]
        );
    }

    #[tokio::test]
    async fn should_dedup_sensor_values() {
        let monitor = monitor();
        let delegate = RecordingDelegate::shared();
        let group = MonitorGroup::builder()
            .sensor("s1")
            .delegate(delegate.clone())
            .build()
            .unwrap();
        monitor.subscribe(group, false).await.unwrap();

        monitor.sensor_attr_changed(&"s1".into(), temp(21.0));
        monitor.sensor_attr_changed(&"s1".into(), temp(21.0));
        monitor.sensor_attr_changed(&"s1".into(), temp(22.0));

        assert_eq!(delegate.updates().len(), 2);
    }

    #[tokio::test]
    async fn should_notify_nan_reading_once() {
        let monitor = monitor();
        let delegate = RecordingDelegate::shared();
        let group = MonitorGroup::builder()
            .sensor("s1")
            .delegate(delegate.clone())
            .build()
            .unwrap();
        monitor.subscribe(group, false).await.unwrap();

        monitor.sensor_attr_changed(&"s1".into(), temp(f64::NAN));
        monitor.sensor_attr_changed(&"s1".into(), temp(f64::NAN));

        assert_eq!(delegate.updates().len(), 1);
    }

    #[tokio::test]
    async fn should_not_cache_values_nobody_monitors() {
        let monitor = monitor();
        monitor.zone_level_changed(&"z1".into(), Level::new(50.0));
        assert_eq!(monitor.stats().cached_zones, 0);
    }

    #[tokio::test]
    async fn should_fan_out_to_every_interested_group_in_id_order() {
        let monitor = monitor();
        let first = RecordingDelegate::shared();
        let second = RecordingDelegate::shared();
        let a = monitor.subscribe(zones_group(&first, &["z1"]), false).await.unwrap();
        let b = monitor.subscribe(zones_group(&second, &["z1", "z2"]), false).await.unwrap();

        monitor.zone_level_changed(&"z1".into(), Level::new(10.0));

        assert_eq!(first.updates()[0].monitor_id, a);
        assert_eq!(second.updates()[0].monitor_id, b);
    }

    #[tokio::test]
    async fn should_request_again_after_last_subscriber_leaves() {
        let monitor = monitor();
        let delegate = RecordingDelegate::shared();
        let first = monitor.subscribe(zones_group(&delegate, &["z1"]), false).await.unwrap();
        monitor.zone_level_changed(&"z1".into(), Level::new(50.0));
        monitor.unsubscribe(first);

        let second = monitor.subscribe(zones_group(&delegate, &["z1"]), false).await.unwrap();
        monitor.refresh(second, false).await;

        assert_eq!(monitor.publisher.zone_requests(), vec![vec![ZoneId::from("z1")]]);
        assert_eq!(delegate.updates().len(), 1);
    }

    #[tokio::test]
    async fn should_treat_double_unsubscribe_as_single() {
        let monitor = monitor();
        let delegate = RecordingDelegate::shared();
        let id = monitor.subscribe(zones_group(&delegate, &["z1"]), false).await.unwrap();

        monitor.unsubscribe(id);
        let after_first = monitor.stats();
        monitor.unsubscribe(id);

        assert_eq!(monitor.stats(), after_first);
        assert!(monitor.group(id).is_none());
        assert!(delegate.expired().is_empty());
    }

    #[tokio::test]
    async fn should_fail_to_renew_unknown_group() {
        let monitor = monitor();
        let result = monitor.subscribe_renew(MonitorId::from_raw(3));
        assert!(matches!(result, Err(HubError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_fetch_again_after_invalidation() {
        let monitor = monitor();
        let delegate = RecordingDelegate::shared();
        let id = monitor.subscribe(zones_group(&delegate, &["z1"]), false).await.unwrap();
        monitor.zone_level_changed(&"z1".into(), Level::new(50.0));

        monitor.invalidate_values(id);
        monitor.refresh(id, false).await;

        assert_eq!(monitor.publisher.zone_requests(), vec![vec![ZoneId::from("z1")]]);
        assert_eq!(monitor.stats().watched_zones, 1);
        assert!(monitor.group(id).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn should_expire_group_after_lease() {
        let monitor = monitor();
        let delegate = RecordingDelegate::shared();
        let id = monitor.subscribe(zones_group(&delegate, &["z1"]), false).await.unwrap();

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(monitor.sweep_expired().is_empty());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(monitor.sweep_expired(), vec![id]);
        assert_eq!(delegate.expired(), vec![id]);
        assert!(monitor.group(id).is_none());

        assert!(monitor.sweep_expired().is_empty());
        assert_eq!(delegate.expired().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn should_push_deadline_back_on_renew() {
        let monitor = monitor();
        let delegate = RecordingDelegate::shared();
        let id = monitor.subscribe(zones_group(&delegate, &["z1"]), false).await.unwrap();

        tokio::time::advance(Duration::from_secs(8)).await;
        monitor.subscribe_renew(id).unwrap();

        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(monitor.sweep_expired().is_empty());
        assert!(monitor.group(id).is_some());

        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(monitor.sweep_expired(), vec![id]);
    }

    #[tokio::test]
    async fn should_swallow_publish_failures() {
        let monitor = Monitor::new(FailingPublisher, MonitorConfig::default());
        let delegate = RecordingDelegate::shared();

        let result = monitor.subscribe(zones_group(&delegate, &["z1"]), true).await;

        assert!(result.is_ok());
        assert_eq!(monitor.group_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn should_hand_out_distinct_ids_to_concurrent_subscribers() {
        let monitor = Arc::new(monitor());
        let delegate = RecordingDelegate::shared();

        let tasks: Vec<_> = (0..64)
            .map(|_| {
                let monitor = Arc::clone(&monitor);
                let group = zones_group(&delegate, &["z1", "z2"]);
                tokio::spawn(async move { monitor.subscribe(group, false).await.unwrap() })
            })
            .collect();
        let mut ids = std::collections::BTreeSet::new();
        for task in tasks {
            ids.insert(task.await.unwrap());
        }

        assert_eq!(ids.len(), 64);
        assert_eq!(monitor.group_count(), 64);
        assert_eq!(monitor.stats().watched_zones, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn should_expire_at_most_once_when_racing_unsubscribe() {
        let monitor = Arc::new(monitor());
        let mut groups = Vec::new();
        for _ in 0..50 {
            let delegate = RecordingDelegate::shared();
            let group = MonitorGroup::builder()
                .zone("z1")
                .delegate(delegate.clone())
                .lease(Duration::from_millis(1))
                .build()
                .unwrap();
            let id = monitor.subscribe(group, false).await.unwrap();
            groups.push((id, delegate));
        }
        tokio::time::sleep(Duration::from_millis(5)).await;

        let mut tasks = Vec::new();
        for (id, _) in &groups {
            let monitor = Arc::clone(&monitor);
            let id = *id;
            tasks.push(tokio::spawn(async move { monitor.unsubscribe(id) }));
        }
        for _ in 0..4 {
            let monitor = Arc::clone(&monitor);
            tasks.push(tokio::spawn(async move {
                monitor.sweep_expired();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        for (id, delegate) in &groups {
            let expired = delegate.expired();
            assert!(expired.len() <= 1);
            assert!(expired.iter().all(|expired_id| expired_id == id));
        }
        assert_eq!(monitor.stats(), MonitorStats::default());
    }
}
