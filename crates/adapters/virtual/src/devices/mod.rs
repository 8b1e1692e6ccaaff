//! Simulated devices backing the virtual extension.
//!
//! Each device keeps its current reading behind a lock so the extension can
//! answer report requests while other tasks change values.

mod sensor;
mod zone;

pub use sensor::VirtualSensor;
pub use zone::VirtualZone;
