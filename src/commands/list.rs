//! Listing and detection commands

use satlink_core::Session;

/// List the drivers in the registry
pub fn list_drivers(session: &Session) -> Result<(), Box<dyn std::error::Error>> {
    let drivers = session.drivers()?;

    println!("Available drivers:");
    println!();
    for info in drivers {
        println!("  {:16} - {}", info.name, info.description);
    }

    Ok(())
}

/// Probe for a connected device and report which driver answered
pub fn detect(session: &mut Session) -> Result<(), Box<dyn std::error::Error>> {
    match session.detect() {
        Ok(name) => {
            println!("Found: {}", name);
            Ok(())
        }
        Err(_) => Err("No transfer device found".into()),
    }
}
