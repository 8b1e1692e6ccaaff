//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the monitor and the adapter
//! layer can depend on them without creating circular dependencies.

pub mod delegate;
pub mod event_bus;

pub use delegate::MonitorDelegate;
pub use event_bus::{EventConsumer, EventProducer, EventPublisher};
