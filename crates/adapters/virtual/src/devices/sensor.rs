//! Virtual sensor — a single named attribute, e.g. a temperature reading.

use parking_lot::Mutex;

use zonehub_domain::sensor::{AttributeValue, SensorAttr};

/// A simulated sensor.
///
/// The attribute name is fixed at construction; only the value changes.
pub struct VirtualSensor {
    attr: Mutex<SensorAttr>,
}

impl VirtualSensor {
    #[must_use]
    pub fn new(name: &str, value: AttributeValue) -> Self {
        Self {
            attr: Mutex::new(SensorAttr::new(name, value)),
        }
    }

    /// The current reading.
    #[must_use]
    pub fn attr(&self) -> SensorAttr {
        self.attr.lock().clone()
    }

    /// Store a new value and return the resulting attribute.
    pub fn set_value(&self, value: AttributeValue) -> SensorAttr {
        let mut attr = self.attr.lock();
        attr.value = value;
        attr.clone()
    }
}
