//! satlink-core - Driver registry and selection core
//!
//! This crate holds the transport-independent heart of satlink: the
//! capability contract every transfer-device driver implements, and the
//! [`Session`] that materializes the driver registry and enforces the
//! single-active-driver rule.
//!
//! Concrete transports (USB cartridge, datalink cables, the in-memory
//! emulator) live in their own crates and only meet this one through the
//! [`DeviceDriver`] trait.
//!
//! # Example
//!
//! ```ignore
//! use satlink_core::Session;
//!
//! let mut session = Session::new(catalog);
//! session.init();
//! for info in session.drivers()? {
//!     println!("{:16} - {}", info.name, info.description);
//! }
//! session.detect()?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod driver;
pub mod error;
pub mod session;

pub use driver::{DeviceDriver, DriverInfo, DRIVER_NAME_MAX};
pub use error::{DriverError, DriverResult, Error, Result};
pub use session::Session;
