//! Sensors — read-only entities reporting a named attribute value.

mod attribute_value;

pub use attribute_value::AttributeValue;

use serde::{Deserialize, Serialize};

/// The attribute a sensor reports, e.g. `temperature = 21.5`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorAttr {
    pub name: String,
    pub value: AttributeValue,
}

impl SensorAttr {
    /// Build an attribute from a name and a value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: AttributeValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Whether `other` carries the same reading.
    ///
    /// Only the value takes part in the comparison; a sensor that renames its
    /// attribute without changing the reading is not a change. See
    /// [`AttributeValue::same_reading`] for how values compare.
    #[must_use]
    pub fn same_value(&self, other: &Self) -> bool {
        self.value.same_reading(&other.value)
    }
}
