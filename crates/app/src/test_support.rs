//! Test doubles shared by the monitor tests.

use std::future::Future;
use std::sync::{Arc, Mutex};

use zonehub_domain::change_batch::ChangeBatch;
use zonehub_domain::error::HubError;
use zonehub_domain::event::{Event, EventPayload};
use zonehub_domain::id::{MonitorId, SensorId, ZoneId};

use crate::ports::{EventPublisher, MonitorDelegate};

// ── Recording delegate ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingDelegate {
    updates: Mutex<Vec<ChangeBatch>>,
    expired: Mutex<Vec<MonitorId>>,
}

impl RecordingDelegate {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn updates(&self) -> Vec<ChangeBatch> {
        self.updates.lock().unwrap().clone()
    }

    pub fn expired(&self) -> Vec<MonitorId> {
        self.expired.lock().unwrap().clone()
    }
}

impl MonitorDelegate for RecordingDelegate {
    fn update(&self, batch: ChangeBatch) {
        self.updates.lock().unwrap().push(batch);
    }

    fn expired(&self, monitor_id: MonitorId) {
        self.expired.lock().unwrap().push(monitor_id);
    }
}

// ── Spy publisher ──────────────────────────────────────────────────

#[derive(Default)]
pub struct SpyPublisher {
    events: Mutex<Vec<Event>>,
}

impl SpyPublisher {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn zone_requests(&self) -> Vec<Vec<ZoneId>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e.payload {
                EventPayload::ZonesReport { zone_ids } => Some(zone_ids),
                _ => None,
            })
            .collect()
    }

    pub fn sensor_requests(&self) -> Vec<Vec<SensorId>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e.payload {
                EventPayload::SensorsReport { sensor_ids } => Some(sensor_ids),
                _ => None,
            })
            .collect()
    }
}

impl EventPublisher for SpyPublisher {
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), HubError>> + Send {
        self.events.lock().unwrap().push(event);
        async { Ok(()) }
    }
}

// ── Failing publisher ──────────────────────────────────────────────

pub struct FailingPublisher;

impl EventPublisher for FailingPublisher {
    fn publish(&self, _event: Event) -> impl Future<Output = Result<(), HubError>> + Send {
        async { Err(HubError::Bus(Box::new(std::io::Error::other("bus down")))) }
    }
}
