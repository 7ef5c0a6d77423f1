//! satlink-cartridge - USB flash cartridge driver
//!
//! The cartridge carries an FT245 USB FIFO that the kernel `ftdi_sio` driver
//! exposes as a tty, so the transport here is an ordinary serial device.
//! Commands are a function byte followed by a big-endian address and length;
//! bulk data follows the command raw, trailed by an additive checksum, and
//! the cartridge acknowledges each command with a single [`ACK`] byte.

use std::io::{Read, Write};
use std::time::Duration;

use satlink_core::{DeviceDriver, DriverError, DriverResult};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};

const DEFAULT_DEVICE: &str = "/dev/ttyUSB0";

// The FT245 is a FIFO; the baud setting is nominal for ftdi_sio.
const BAUD: u32 = 115_200;

/// Acknowledge byte returned by the cartridge after each command
pub const ACK: u8 = 0x00;

/// Function codes understood by the cartridge firmware
pub mod function {
    /// Read cartridge/console memory
    pub const DOWNLOAD: u8 = 0x01;
    /// Write cartridge/console memory
    pub const UPLOAD: u8 = 0x09;
    /// Jump to the given address
    pub const EXECUTE: u8 = 0x0A;
}

/// Build the 9-byte command header.
pub fn command(function: u8, addr: u32, len: u32) -> [u8; 9] {
    let mut header = [0u8; 9];
    header[0] = function;
    header[1..5].copy_from_slice(&addr.to_be_bytes());
    header[5..9].copy_from_slice(&len.to_be_bytes());
    header
}

/// Additive checksum trailing each bulk payload, wrapping at 8 bits.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, byte| sum.wrapping_add(*byte))
}

/// USB flash cartridge driver
pub struct UsbCartridge {
    device: String,
    port: Option<Box<dyn SerialPort>>,
}

impl UsbCartridge {
    /// Create a driver on the default tty.
    pub fn new() -> Self {
        Self::with_device(DEFAULT_DEVICE)
    }

    /// Create a driver on a specific tty.
    pub fn with_device(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            port: None,
        }
    }

    fn port(&mut self) -> DriverResult<&mut Box<dyn SerialPort>> {
        self.port.as_mut().ok_or(DriverError::NotReady)
    }

    fn expect_ack(&mut self) -> DriverResult<()> {
        let mut ack = [0u8; 1];
        self.port()?.read_exact(&mut ack)?;
        if ack[0] != ACK {
            return Err(DriverError::Protocol("missing ack"));
        }
        Ok(())
    }
}

impl Default for UsbCartridge {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceDriver for UsbCartridge {
    fn name(&self) -> &'static str {
        "usb-cartridge"
    }

    fn description(&self) -> &'static str {
        "USB flash cartridge (FT245 FIFO behind ftdi_sio)"
    }

    fn init(&mut self) -> DriverResult<()> {
        let port = serialport::new(self.device.as_str(), BAUD)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_millis(500))
            .open()
            .map_err(|e| {
                log::debug!("usb-cartridge: open {} failed: {e}", self.device);
                DriverError::NotConnected
            })?;

        log::debug!("usb-cartridge: opened {}", self.device);
        self.port = Some(port);

        // Zero-length download as a presence check; the cartridge must ack.
        let header = command(function::DOWNLOAD, 0, 0);
        let probe = (|| -> DriverResult<()> {
            self.port()?.write_all(&header)?;
            self.expect_ack()
        })();

        if let Err(e) = probe {
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
        let header = command(function::DOWNLOAD, addr, buf.len() as u32);
        let port = self.port()?;

        port.write_all(&header)?;
        port.read_exact(buf)?;

        let mut sum = [0u8; 1];
        port.read_exact(&mut sum)?;
        if sum[0] != checksum(buf) {
            return Err(DriverError::Protocol("payload checksum mismatch"));
        }

        self.expect_ack()
    }

    fn upload(&mut self, addr: u32, data: &[u8]) -> DriverResult<()> {
        let header = command(function::UPLOAD, addr, data.len() as u32);
        let sum = checksum(data);
        let port = self.port()?;

        port.write_all(&header)?;
        port.write_all(data)?;
        port.write_all(&[sum])?;

        self.expect_ack()
    }

    fn execute(&mut self, addr: u32, data: &[u8]) -> DriverResult<()> {
        self.upload(addr, data)?;

        let header = command(function::EXECUTE, addr, 0);
        self.port()?.write_all(&header)?;
        self.expect_ack()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_header_layout() {
        let header = command(function::DOWNLOAD, 0x0600_4000, 0x100);

        assert_eq!(header[0], function::DOWNLOAD);
        assert_eq!(&header[1..5], &[0x06, 0x00, 0x40, 0x00]);
        assert_eq!(&header[5..9], &[0x00, 0x00, 0x01, 0x00]);
    }

    #[test]
    fn checksum_wraps() {
        assert_eq!(checksum(&[]), 0);
        assert_eq!(checksum(&[0x80, 0x80, 0x01]), 0x01);
    }

    #[test]
    fn operations_before_init_are_not_ready() {
        let mut cartridge = UsbCartridge::new();
        let mut buf = [0u8; 4];

        assert_eq!(
            cartridge.download(0, &mut buf).unwrap_err(),
            DriverError::NotReady
        );
        assert_eq!(cartridge.upload(0, &buf).unwrap_err(), DriverError::NotReady);
        assert_eq!(cartridge.read(&mut buf).unwrap_err(), DriverError::NotReady);
    }
}
