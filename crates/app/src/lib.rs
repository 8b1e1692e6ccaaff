//! # zonehub-app
//!
//! Application layer — the **monitor** subsystem and its **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** at the boundaries:
//!   - `EventPublisher` — publish events on the bus
//!   - `EventConsumer` / `EventProducer` — take part in the bus lifecycle
//!   - `MonitorDelegate` — receive change batches and expiry notices
//! - Provide **in-process infrastructure** (event bus) that doesn't need IO
//! - Provide the `Monitor`: subscriptions with leases, a value cache, change
//!   fan-out from bus events, and the background expiry sweep
//!
//! ## Dependency rule
//! Depends on `zonehub-domain` only (plus `tokio` for channels, tasks and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod event_bus;
pub mod monitor;
pub mod ports;

#[cfg(test)]
pub(crate) mod test_support;
