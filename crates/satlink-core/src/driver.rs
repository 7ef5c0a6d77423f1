//! Driver capability contract
//!
//! Every transport implements [`DeviceDriver`]. The session only ever talks
//! to drivers through this trait; the byte-level protocol behind each
//! operation is the driver's own business.

use crate::error::DriverResult;

/// Maximum number of characters considered when matching driver names.
///
/// Lookup compares names only up to this bound, so an oversized name coming
/// from user input cannot turn the catalog scan into an unbounded compare.
pub const DRIVER_NAME_MAX: usize = 32;

/// A lightweight, registry-visible description of one driver.
///
/// Built from the catalog when the session initializes; carries no handle to
/// the driver itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverInfo {
    /// Driver name, unique within the catalog
    pub name: &'static str,
    /// Short human-readable description
    pub description: &'static str,
}

/// Capability contract for one transfer-device transport.
///
/// `init` and `deinit` bracket the driver's lifetime as the active driver.
/// Auto-detection probes drivers by running this cycle speculatively, so both
/// must tolerate being called repeatedly and must not leave state behind on
/// failure.
///
/// The device operations are only invoked while the driver is active; a
/// driver that has not been initialized reports [`NotReady`].
///
/// [`NotReady`]: crate::error::DriverError::NotReady
pub trait DeviceDriver: Send {
    /// Driver name as listed in the registry.
    fn name(&self) -> &'static str;

    /// One-line human-readable description.
    fn description(&self) -> &'static str;

    /// Open the transport and verify a device is present.
    fn init(&mut self) -> DriverResult<()>;

    /// Release the transport.
    fn deinit(&mut self) -> DriverResult<()>;

    /// Raw channel read from the device into `buf`, filling it completely.
    fn read(&mut self, buf: &mut [u8]) -> DriverResult<()>;

    /// Copy `buf.len()` bytes of device memory starting at `addr` to the host.
    fn download(&mut self, addr: u32, buf: &mut [u8]) -> DriverResult<()>;

    /// Copy `data` into device memory starting at `addr`.
    fn upload(&mut self, addr: u32, data: &[u8]) -> DriverResult<()>;

    /// Copy `data` into device memory at `addr`, then jump to `addr`.
    fn execute(&mut self, addr: u32, data: &[u8]) -> DriverResult<()>;
}

/// Truncate `name` to at most [`DRIVER_NAME_MAX`] characters for comparison.
pub(crate) fn bounded_name(name: &str) -> &str {
    match name.char_indices().nth(DRIVER_NAME_MAX) {
        Some((idx, _)) => &name[..idx],
        None => name,
    }
}
