//! # zonehub-domain
//!
//! Pure domain model for the zonehub monitoring core.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions
//! - Define **Zones** (controllable actuators: lights, shades, outlets) and their [`Level`](zone::Level)
//! - Define **Sensors** (read-only entities reporting a [`SensorAttr`](sensor::SensorAttr))
//! - Define **Change batches** (notification payloads handed to monitor delegates)
//! - Define **Events** (value changes and report requests carried by the event bus)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;

pub mod change_batch;
pub mod event;
pub mod sensor;
pub mod zone;
