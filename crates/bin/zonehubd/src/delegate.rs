//! Delegate that writes every notification to the log.

use zonehub_app::ports::MonitorDelegate;
use zonehub_domain::change_batch::ChangeBatch;
use zonehub_domain::id::MonitorId;

/// Logs change batches and expirations at `info`.
#[derive(Debug, Default)]
pub struct LoggingDelegate;

impl MonitorDelegate for LoggingDelegate {
    fn update(&self, batch: ChangeBatch) {
        for (zone_id, level) in &batch.zones {
            tracing::info!(
                monitor_id = %batch.monitor_id,
                %zone_id,
                level = level.value,
                r = level.r,
                g = level.g,
                b = level.b,
                "zone level"
            );
        }
        for (sensor_id, attr) in &batch.sensors {
            tracing::info!(
                monitor_id = %batch.monitor_id,
                %sensor_id,
                attribute = %attr.name,
                value = %attr.value,
                "sensor value"
            );
        }
    }

    fn expired(&self, monitor_id: MonitorId) {
        tracing::warn!(%monitor_id, "monitor group expired");
    }
}
