//! CLI command implementations
//!
//! Every command that touches a device goes through the same flow: resolve a
//! driver (by name or by probing), then run the device operation on the
//! session's active driver.

mod list;
mod transfer;

pub use list::{detect, list_drivers};
pub use transfer::{download, exec, resolve_driver, upload};
