//! Monitor delegate port — how the monitor reaches its subscribers.

use zonehub_domain::change_batch::ChangeBatch;
use zonehub_domain::id::MonitorId;

/// Receives notifications for one monitor group.
///
/// Both methods are called synchronously, with no monitor lock held, from
/// whichever task produced the notification (a caller of `refresh`, the
/// event consumption task, or the expiry sweep). A delegate that blocks
/// stalls every later notification on that task, so implementations must
/// return quickly and hand heavy work off to their own task or channel.
///
/// Delivery is fire-and-forget: the monitor neither retries nor observes
/// failures inside the delegate.
///
/// Batches for one group are not totally ordered across tasks. A refresh
/// snapshots the cache under the lock and delivers after releasing it, so a
/// change applied in between can reach the delegate first, followed by the
/// older cached value. Changes from the event stream alone always arrive in
/// bus order. A delegate that needs the latest value should call `refresh`
/// again after the change stream has settled, or compare against its own
/// state.
pub trait MonitorDelegate: Send + Sync {
    /// New or known values for some of the group's zones and sensors.
    fn update(&self, batch: ChangeBatch);

    /// The group's lease lapsed and it has been removed.
    fn expired(&self, monitor_id: MonitorId);
}
