//! Virtual zone — a light, shade or outlet holding a level.

use parking_lot::Mutex;

use zonehub_domain::zone::{Level, ZoneType};

/// A simulated actuator.
pub struct VirtualZone {
    zone_type: ZoneType,
    level: Mutex<Level>,
}

impl VirtualZone {
    #[must_use]
    pub fn new(zone_type: ZoneType, level: Level) -> Self {
        Self {
            zone_type,
            level: Mutex::new(level),
        }
    }

    #[must_use]
    pub fn zone_type(&self) -> ZoneType {
        self.zone_type
    }

    /// The current level.
    #[must_use]
    pub fn level(&self) -> Level {
        *self.level.lock()
    }

    /// Store `level`, returning the previous one.
    pub fn set_level(&self, level: Level) -> Level {
        std::mem::replace(&mut *self.level.lock(), level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_report_initial_level() {
        let zone = VirtualZone::new(ZoneType::Shade, Level::new(100.0));
        assert_eq!(zone.zone_type(), ZoneType::Shade);
        assert_eq!(zone.level(), Level::new(100.0));
    }

    #[test]
    fn should_return_previous_level_when_set() {
        let zone = VirtualZone::new(ZoneType::Light, Level::default());
        let previous = zone.set_level(Level::rgb(80.0, 255, 0, 0));
        assert_eq!(previous, Level::default());
        assert_eq!(zone.level(), Level::rgb(80.0, 255, 0, 0));
    }
}
