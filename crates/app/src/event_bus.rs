//! In-process event bus backed by a tokio broadcast channel.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use zonehub_domain::error::HubError;
use zonehub_domain::event::Event;

use crate::ports::{EventConsumer, EventProducer, EventPublisher};

/// In-process event bus using a tokio [`broadcast`] channel.
///
/// Every consumer receives every event published after it was added, in
/// publication order. Publishing succeeds even when there are no consumers
/// (the event is simply dropped).
pub struct InProcessEventBus {
    sender: broadcast::Sender<Event>,
}

impl InProcessEventBus {
    /// Create a new event bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events on this bus.
    ///
    /// Returns a receiver that will get all events published *after*
    /// the subscription is created.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Attach a consumer: give it its own channel and let it spawn its
    /// consumption task.
    pub fn add_consumer<C: EventConsumer>(&self, consumer: Arc<C>) -> JoinHandle<()> {
        tracing::info!(consumer = consumer.consumer_name(), "event consumer added");
        consumer.start_consuming(self.subscribe())
    }

    /// Attach a producer.
    pub fn add_producer<P: EventProducer + ?Sized>(&self, producer: &P) {
        tracing::info!(producer = producer.producer_name(), "event producer added");
        producer.start_producing();
    }

    /// Detach a consumer. Its consumption task keeps running until the
    /// channel closes or the task is aborted.
    pub fn remove_consumer<C: EventConsumer + ?Sized>(&self, consumer: &C) {
        tracing::info!(consumer = consumer.consumer_name(), "event consumer removed");
        consumer.stop_consuming();
    }

    /// Detach a producer.
    pub fn remove_producer<P: EventProducer + ?Sized>(&self, producer: &P) {
        tracing::info!(producer = producer.producer_name(), "event producer removed");
        producer.stop_producing();
    }

    /// Number of consumers currently attached.
    #[must_use]
    pub fn consumer_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventPublisher for InProcessEventBus {
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), HubError>> + Send {
        // Fails only when nobody is listening; the event is dropped.
        let _ = self.sender.send(event);
        async { Ok(()) }
    }
}

/// Drive a consumer's channel to completion, handing each event to `handle`
/// one at a time.
///
/// A lagging consumer loses the overwritten events. `on_lag` is told how many
/// were skipped, then consumption carries on with the oldest event still
/// buffered.
pub async fn consume<F, Fut, L>(
    consumer: &'static str,
    events: broadcast::Receiver<Event>,
    mut handle: F,
    mut on_lag: L,
) where
    F: FnMut(Event) -> Fut,
    Fut: Future<Output = ()>,
    L: FnMut(u64),
{
    tracing::info!(consumer, "start consuming events");
    let mut stream = BroadcastStream::new(events);
    while let Some(result) = stream.next().await {
        match result {
            Ok(event) => handle(event).await,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!(
                    consumer,
                    skipped,
                    "event consumer lagged, some events were dropped"
                );
                on_lag(skipped);
            }
        }
    }
    tracing::info!(consumer, "event channel has closed");
}
