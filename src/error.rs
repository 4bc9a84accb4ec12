//! Crate-wide error type
//!
//! Remote faults from the bus are never translated or retried; they are
//! wrapped verbatim so callers see the original D-Bus error.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("bus level must be \"system\" or \"session\", got \"{0}\"")]
    InvalidBusLevel(String),

    #[error("D-Bus error: {0}")]
    Bus(#[from] zbus::Error),

    #[error("D-Bus call failed: {0}")]
    Fdo(#[from] zbus::fdo::Error),

    #[error("malformed environment assignment (no '='): \"{0}\"")]
    MalformedAssignment(String),
}

pub type Result<T> = std::result::Result<T, Error>;
