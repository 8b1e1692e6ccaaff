//! Event bus ports — publishing events and taking part in the bus as a
//! consumer or a producer.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use zonehub_domain::error::HubError;
use zonehub_domain::event::Event;

/// Publishes events to every current consumer.
pub trait EventPublisher {
    /// Publish an event to all current consumers.
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), HubError>> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for Arc<T> {
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), HubError>> + Send {
        (**self).publish(event)
    }
}

/// Something that reads events off the bus.
///
/// Each consumer gets its own ordered channel and processes it on a single
/// task, so events are handled strictly in arrival order.
pub trait EventConsumer: Send + Sync + 'static {
    /// Name used in logs.
    fn consumer_name(&self) -> &'static str;

    /// Spawn the consumption task for `events`.
    fn start_consuming(self: Arc<Self>, events: broadcast::Receiver<Event>) -> JoinHandle<()>;

    /// Called when the bus detaches the consumer. Nothing to do by default;
    /// the consumption task ends on its own once the channel closes.
    fn stop_consuming(&self) {}
}

/// Something that publishes events onto the bus.
pub trait EventProducer: Send + Sync {
    /// Name used in logs.
    fn producer_name(&self) -> &'static str;

    /// Called once the producer is registered with the bus.
    fn start_producing(&self) {}

    /// Called when the bus detaches the producer.
    fn stop_producing(&self) {}
}
