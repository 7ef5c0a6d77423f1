//! satlink-datalink - Datalink cable drivers
//!
//! The three cable variants (the original red-label serial cable, the later
//! green-label revision, and the bluetooth adapter) speak the same framed
//! protocol and differ only in the serial device they show up as and the
//! line rate they run at. One driver type covers all three; a [`Variant`]
//! picks the personality at catalog-definition time.
//!
//! Frame layout and checksums live in [`frame`].

pub mod frame;

use std::io::{Read, Write};
use std::time::Duration;

use satlink_core::{DeviceDriver, DriverError, DriverResult};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};

/// Address probed during `init` to confirm a console is listening.
const PROBE_ADDR: u32 = 0x0600_0000;

/// Datalink cable variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Original red-label serial cable
    Red,
    /// Green-label revision
    Green,
    /// Bluetooth serial adapter
    Bluetooth,
}

impl Variant {
    /// Driver name as listed in the registry.
    pub fn driver_name(self) -> &'static str {
        match self {
            Variant::Red => "datalink-red",
            Variant::Green => "datalink-green",
            Variant::Bluetooth => "datalink-bt",
        }
    }

    /// One-line description for the registry.
    pub fn driver_description(self) -> &'static str {
        match self {
            Variant::Red => "Datalink cable, red label (serial)",
            Variant::Green => "Datalink cable, green label (serial)",
            Variant::Bluetooth => "Datalink bluetooth adapter (serial over RFCOMM)",
        }
    }

    fn default_device(self) -> &'static str {
        match self {
            Variant::Red | Variant::Green => "/dev/ttyS0",
            Variant::Bluetooth => "/dev/rfcomm0",
        }
    }

    fn baud(self) -> u32 {
        match self {
            Variant::Red => 9_600,
            Variant::Green => 19_200,
            Variant::Bluetooth => 115_200,
        }
    }
}

/// Datalink cable driver
///
/// `init` opens the serial device and pings the console; `deinit` drops the
/// port. Transfers are chunked into frames of at most
/// [`frame::MAX_PAYLOAD`] bytes.
pub struct DatalinkCable {
    variant: Variant,
    device: String,
    port: Option<Box<dyn SerialPort>>,
}

impl DatalinkCable {
    /// Create a driver for `variant` on its default serial device.
    pub fn new(variant: Variant) -> Self {
        Self::with_device(variant, variant.default_device())
    }

    /// Create a driver for `variant` on a specific serial device.
    pub fn with_device(variant: Variant, device: impl Into<String>) -> Self {
        Self {
            variant,
            device: device.into(),
            port: None,
        }
    }

    fn port(&mut self) -> DriverResult<&mut Box<dyn SerialPort>> {
        self.port.as_mut().ok_or(DriverError::NotReady)
    }

    /// Send one command frame and collect its response.
    ///
    /// A non-empty `response` expects that many payload bytes plus a
    /// trailing checksum before the ack byte.
    fn transfer(
        &mut self,
        function: u8,
        addr: u32,
        count: u8,
        payload: &[u8],
        response: &mut [u8],
    ) -> DriverResult<()> {
        let command = frame::encode(function, addr, count, payload);
        let port = self.port()?;

        port.write_all(&command)?;

        if !response.is_empty() {
            port.read_exact(response)?;

            let mut sum = [0u8; 1];
            port.read_exact(&mut sum)?;
            if sum[0] != frame::checksum(response) {
                return Err(DriverError::Protocol("response checksum mismatch"));
            }
        }

        let mut ack = [0u8; 1];
        port.read_exact(&mut ack)?;
        if ack[0] != frame::ACK {
            return Err(DriverError::Protocol("missing ack"));
        }

        Ok(())
    }
}

impl DeviceDriver for DatalinkCable {
    fn name(&self) -> &'static str {
        self.variant.driver_name()
    }

    fn description(&self) -> &'static str {
        self.variant.driver_description()
    }

    fn init(&mut self) -> DriverResult<()> {
        let port = serialport::new(self.device.as_str(), self.variant.baud())
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_millis(500))
            .open()
            .map_err(|e| {
                log::debug!("{}: open {} failed: {e}", self.variant.driver_name(), self.device);
                DriverError::NotConnected
            })?;

        log::debug!(
            "{}: opened {} at {} baud",
            self.variant.driver_name(),
            self.device,
            self.variant.baud()
        );
        self.port = Some(port);

        // Zero-length download as a presence check; the console must ack.
        if let Err(e) = self.transfer(frame::function::DOWNLOAD, PROBE_ADDR, 0, &[], &mut []) {
            self.port = None;
            return Err(e);
        }

        Ok(())
    }

    fn deinit(&mut self) -> DriverResult<()> {
        self.port = None;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> DriverResult<()> {
        self.port()?.read_exact(buf)?;
        Ok(())
    }

    fn download(&mut self, addr: u32, buf: &mut [u8]) -> DriverResult<()> {
        for (i, chunk) in buf.chunks_mut(frame::MAX_PAYLOAD).enumerate() {
            let chunk_addr = addr.wrapping_add((i * frame::MAX_PAYLOAD) as u32);
            self.transfer(
                frame::function::DOWNLOAD,
                chunk_addr,
                chunk.len() as u8,
                &[],
                chunk,
            )?;
        }

        Ok(())
    }

    fn upload(&mut self, addr: u32, data: &[u8]) -> DriverResult<()> {
        for (i, chunk) in data.chunks(frame::MAX_PAYLOAD).enumerate() {
            let chunk_addr = addr.wrapping_add((i * frame::MAX_PAYLOAD) as u32);
            self.transfer(
                frame::function::UPLOAD,
                chunk_addr,
                chunk.len() as u8,
                chunk,
                &mut [],
            )?;
        }

        Ok(())
    }

    fn execute(&mut self, addr: u32, data: &[u8]) -> DriverResult<()> {
        self.upload(addr, data)?;
        self.transfer(frame::function::EXECUTE, addr, 0, &[], &mut [])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_have_distinct_names() {
        let names = [
            Variant::Red.driver_name(),
            Variant::Green.driver_name(),
            Variant::Bluetooth.driver_name(),
        ];
        assert_eq!(names, ["datalink-red", "datalink-green", "datalink-bt"]);
    }

    #[test]
    fn operations_before_init_are_not_ready() {
        let mut cable = DatalinkCable::new(Variant::Red);
        let mut buf = [0u8; 4];

        assert_eq!(cable.read(&mut buf).unwrap_err(), DriverError::NotReady);
        assert_eq!(
            cable.download(PROBE_ADDR, &mut buf).unwrap_err(),
            DriverError::NotReady
        );
        assert_eq!(
            cable.upload(PROBE_ADDR, &buf).unwrap_err(),
            DriverError::NotReady
        );
    }

    #[test]
    fn deinit_without_init_is_harmless() {
        let mut cable = DatalinkCable::new(Variant::Green);
        cable.deinit().unwrap();
        cable.deinit().unwrap();
    }
}
