//! Zones — controllable actuators (lights, shades, outlets) and their levels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of physical actuator behind a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneType {
    Light,
    Shade,
    Outlet,
    #[default]
    Unknown,
}

impl fmt::Display for ZoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => f.write_str("light"),
            Self::Shade => f.write_str("shade"),
            Self::Outlet => f.write_str("outlet"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

impl FromStr for ZoneType {
    type Err = std::convert::Infallible;

    /// Unrecognised names map to [`ZoneType::Unknown`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "light" => Self::Light,
            "shade" => Self::Shade,
            "outlet" => Self::Outlet,
            _ => Self::Unknown,
        })
    }
}

/// Current level of a zone.
///
/// `value` is a 0–100 brightness/offset; `r`, `g`, `b` carry an optional
/// colour for zones that support it (all zero otherwise).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Level {
    pub value: f32,
    #[serde(default)]
    pub r: u8,
    #[serde(default)]
    pub g: u8,
    #[serde(default)]
    pub b: u8,
}

impl Level {
    /// A plain level without colour.
    #[must_use]
    pub fn new(value: f32) -> Self {
        Self {
            value,
            ..Self::default()
        }
    }

    /// A level with an RGB colour.
    #[must_use]
    pub fn rgb(value: f32, r: u8, g: u8, b: u8) -> Self {
        Self { value, r, g, b }
    }
}
