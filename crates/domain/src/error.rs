//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`HubError`]
//! via `#[from]` (or an explicit `From` impl for adapter errors).

/// Base error type shared by every crate in the workspace.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// A request violated a domain invariant (invalid argument).
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// The referenced item does not exist (or no longer exists).
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// The event bus (or a publisher implementation) failed.
    #[error("event bus error")]
    Bus(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A monitor group must reference at least one zone or sensor.
    #[error("no zones or sensors listed in the monitor group")]
    EmptyMonitorGroup,

    /// A monitor group was built without a delegate to notify.
    #[error("monitor group has no delegate")]
    MissingDelegate,

    /// A monitor group was built with a zero-length lease.
    #[error("monitor group lease must be greater than zero")]
    ZeroLease,
}

/// Lookup of an unknown identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} not found: {id}")]
pub struct NotFoundError {
    /// Kind of thing that was looked up (e.g. `"Monitor"`, `"Zone"`).
    pub entity: &'static str,
    /// The identifier that was not found, as text.
    pub id: String,
}
