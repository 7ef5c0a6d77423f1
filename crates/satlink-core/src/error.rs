//! Error types for satlink-core
//!
//! Two layers of errors exist: [`DriverError`] is what a driver reports from
//! its own lifecycle and device operations, and [`Error`] is what the session
//! reports to callers. Misuse of the session (operating on it before `init`)
//! is an ordinary error result, never a panic.

use thiserror::Error;

/// Errors reported by a transfer-device driver.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum DriverError {
    /// The device is not present or could not be opened
    #[error("device not connected")]
    NotConnected,
    /// The driver has not been initialized
    #[error("driver not ready")]
    NotReady,
    /// The device did not respond in time
    #[error("communication timeout")]
    Timeout,
    /// The device responded with a malformed or unexpected frame
    #[error("protocol error: {0}")]
    Protocol(&'static str),
    /// The requested address range is outside the device's memory window
    #[error("address out of range")]
    AddressOutOfRange,
    /// Transport-level I/O failure
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for DriverError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::TimedOut => DriverError::Timeout,
            _ => DriverError::Io(e.to_string()),
        }
    }
}

/// Result type for driver lifecycle and device operations.
pub type DriverResult<T> = core::result::Result<T, DriverError>;

/// Errors reported by session operations.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// The session has not been initialized
    #[error("driver session is not initialized")]
    NotInitialized,
    /// An empty driver name was passed to `select`
    #[error("driver name is empty")]
    InvalidName,
    /// No driver in the catalog matched (by name or by probing)
    #[error("no matching driver")]
    NotFound,
    /// The chosen driver's `init` failed; no driver is active
    #[error("driver init failed: {0}")]
    SelectInit(DriverError),
    /// The active driver's `deinit` failed; the driver was deselected anyway
    #[error("driver deinit failed: {0}")]
    DeselectDeinit(DriverError),
}

/// Result type for session operations.
pub type Result<T> = core::result::Result<T, Error>;
