//! Memory transfer commands (download, upload, execute)

use satlink_core::{DeviceDriver, Session};
use std::fs;
use std::path::Path;

/// Select the named driver, or probe for one when no name was given.
pub fn resolve_driver(
    session: &mut Session,
    driver: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    match driver {
        Some(name) => {
            session
                .select(name)
                .map_err(|e| format!("Failed to select driver '{}': {}", name, e))?;
            log::info!("Using driver {}", name);
        }
        None => {
            let name = session.detect().map_err(|_| {
                "No transfer device found (use --driver, see list-drivers)".to_string()
            })?;
            log::info!("Detected {}", name);
        }
    }

    Ok(())
}

fn active_driver(session: &mut Session) -> Result<&mut dyn DeviceDriver, Box<dyn std::error::Error>> {
    Ok(session.active_mut()?.ok_or("no driver selected")?)
}

/// Read `size` bytes of device memory at `address` into `output`.
pub fn download(
    session: &mut Session,
    address: u32,
    size: u32,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let driver = active_driver(session)?;

    log::info!("Downloading {} bytes from 0x{:08X}...", size, address);
    let mut buf = vec![0u8; size as usize];
    driver.download(address, &mut buf)?;

    fs::write(output, &buf)?;
    log::info!("Wrote {} bytes to {}", buf.len(), output.display());

    Ok(())
}

/// Write the contents of `input` into device memory at `address`.
pub fn upload(
    session: &mut Session,
    input: &Path,
    address: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;
    let driver = active_driver(session)?;

    log::info!("Uploading {} bytes to 0x{:08X}...", data.len(), address);
    driver.upload(address, &data)?;
    log::info!("Upload complete");

    Ok(())
}

/// Write the contents of `input` into device memory at `address` and jump
/// to it.
pub fn exec(
    session: &mut Session,
    input: &Path,
    address: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;
    let driver = active_driver(session)?;

    log::info!("Uploading {} bytes and executing at 0x{:08X}...", data.len(), address);
    driver.execute(address, &data)?;
    log::info!("Execution started");

    Ok(())
}
