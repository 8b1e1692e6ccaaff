//! Virtual extension error types.

use zonehub_domain::error::{HubError, NotFoundError};
use zonehub_domain::id::{SensorId, ZoneId};

/// Errors specific to the virtual extension.
#[derive(Debug, thiserror::Error)]
pub enum VirtualError {
    /// The zone is not part of the fixture.
    #[error("unknown virtual zone {0}")]
    UnknownZone(ZoneId),

    /// The sensor is not part of the fixture.
    #[error("unknown virtual sensor {0}")]
    UnknownSensor(SensorId),

    /// Publishing the resulting event failed.
    #[error("failed to publish virtual event")]
    Publish(#[source] HubError),
}

impl VirtualError {
    /// Convert into a [`HubError`] for propagation across port boundaries.
    pub fn into_domain(self) -> HubError {
        match self {
            Self::UnknownZone(id) => NotFoundError {
                entity: "Zone",
                id: id.to_string(),
            }
            .into(),
            Self::UnknownSensor(id) => NotFoundError {
                entity: "Sensor",
                id: id.to_string(),
            }
            .into(),
            Self::Publish(err) => err,
        }
    }
}

impl From<VirtualError> for HubError {
    fn from(err: VirtualError) -> Self {
        err.into_domain()
    }
}
