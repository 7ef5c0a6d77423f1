//! satlink-dummy - In-memory emulated transfer device
//!
//! This crate provides a dummy driver that emulates a connected console's
//! RAM window in host memory. It's useful for testing and development
//! without real hardware: `init` always finds the "device", and the memory
//! operations behave like the real transports without any I/O.

use std::collections::VecDeque;

use satlink_core::{DeviceDriver, DriverError, DriverResult};

/// Configuration for the emulated device
#[derive(Debug, Clone)]
pub struct EmulatorConfig {
    /// Base address of the emulated RAM window
    pub base: u32,
    /// Size of the emulated RAM window in bytes
    pub size: usize,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        // High work RAM window of the console
        Self {
            base: 0x0600_0000,
            size: 0x10_0000,
        }
    }
}

/// Emulated transfer device
///
/// Uploads and downloads operate on a backing RAM image allocated by `init`
/// and released by `deinit`; the image is rebuilt on every `init`, so the
/// driver tolerates being probed and torn down repeatedly. `execute` records
/// the entry point instead of jumping anywhere.
pub struct EmulatedDevice {
    config: EmulatorConfig,
    ram: Option<Vec<u8>>,
    channel: VecDeque<u8>,
    entry_point: Option<u32>,
}

impl EmulatedDevice {
    /// Create an emulated device with the default RAM window.
    pub fn new() -> Self {
        Self::with_config(EmulatorConfig::default())
    }

    /// Create an emulated device with the given configuration.
    pub fn with_config(config: EmulatorConfig) -> Self {
        Self {
            config,
            ram: None,
            channel: VecDeque::new(),
            entry_point: None,
        }
    }

    /// Queue bytes for subsequent `read` calls to return.
    pub fn push_channel(&mut self, data: &[u8]) {
        self.channel.extend(data);
    }

    /// Entry point recorded by the last `execute`, if any.
    pub fn entry_point(&self) -> Option<u32> {
        self.entry_point
    }

    /// Get the configuration.
    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    fn window(&mut self, addr: u32, len: usize) -> DriverResult<&mut [u8]> {
        let base = self.config.base;
        let ram = self.ram.as_mut().ok_or(DriverError::NotReady)?;

        let start = addr.checked_sub(base).ok_or(DriverError::AddressOutOfRange)? as usize;
        let end = start
            .checked_add(len)
            .ok_or(DriverError::AddressOutOfRange)?;
        if end > ram.len() {
            return Err(DriverError::AddressOutOfRange);
        }

        Ok(&mut ram[start..end])
    }
}

impl Default for EmulatedDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceDriver for EmulatedDevice {
    fn name(&self) -> &'static str {
        "dummy"
    }

    fn description(&self) -> &'static str {
        "In-memory transfer device emulator for testing"
    }

    fn init(&mut self) -> DriverResult<()> {
        log::debug!("emulator: allocating {} byte RAM image", self.config.size);
        self.ram = Some(vec![0; self.config.size]);
        self.entry_point = None;
        Ok(())
    }

    fn deinit(&mut self) -> DriverResult<()> {
        self.ram = None;
        self.channel.clear();
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> DriverResult<()> {
        if self.ram.is_none() {
            return Err(DriverError::NotReady);
        }

        for byte in buf.iter_mut() {
            *byte = self.channel.pop_front().ok_or(DriverError::Timeout)?;
        }

        Ok(())
    }

    fn download(&mut self, addr: u32, buf: &mut [u8]) -> DriverResult<()> {
        let window = self.window(addr, buf.len())?;
        buf.copy_from_slice(window);
        Ok(())
    }

    fn upload(&mut self, addr: u32, data: &[u8]) -> DriverResult<()> {
        let window = self.window(addr, data.len())?;
        window.copy_from_slice(data);
        Ok(())
    }

    fn execute(&mut self, addr: u32, data: &[u8]) -> DriverResult<()> {
        self.upload(addr, data)?;
        self.entry_point = Some(addr);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use satlink_core::Session;

    #[test]
    fn upload_download_roundtrip() {
        let mut device = EmulatedDevice::new();
        device.init().unwrap();

        let data = [0x12, 0x34, 0x56, 0x78];
        device.upload(0x0600_4000, &data).unwrap();

        let mut buf = [0u8; 4];
        device.download(0x0600_4000, &mut buf).unwrap();
        assert_eq!(buf, data);
    }

    #[test]
    fn operations_before_init_are_not_ready() {
        let mut device = EmulatedDevice::new();
        let mut buf = [0u8; 4];

        assert_eq!(
            device.download(0x0600_0000, &mut buf).unwrap_err(),
            DriverError::NotReady
        );
        assert_eq!(
            device.upload(0x0600_0000, &buf).unwrap_err(),
            DriverError::NotReady
        );
        assert_eq!(device.read(&mut buf).unwrap_err(), DriverError::NotReady);
    }

    #[test]
    fn out_of_window_addresses_are_rejected() {
        let mut device = EmulatedDevice::with_config(EmulatorConfig {
            base: 0x0600_0000,
            size: 0x100,
        });
        device.init().unwrap();

        let mut buf = [0u8; 4];
        // below the window
        assert_eq!(
            device.download(0x05FF_FFFC, &mut buf).unwrap_err(),
            DriverError::AddressOutOfRange
        );
        // straddling the end of the window
        assert_eq!(
            device.download(0x0600_00FE, &mut buf).unwrap_err(),
            DriverError::AddressOutOfRange
        );
    }

    #[test]
    fn execute_records_entry_point() {
        let mut device = EmulatedDevice::new();
        device.init().unwrap();

        device.execute(0x0600_4000, &[0xDE, 0xAD]).unwrap();
        assert_eq!(device.entry_point(), Some(0x0600_4000));

        let mut buf = [0u8; 2];
        device.download(0x0600_4000, &mut buf).unwrap();
        assert_eq!(buf, [0xDE, 0xAD]);
    }

    #[test]
    fn read_drains_channel_then_times_out() {
        let mut device = EmulatedDevice::new();
        device.init().unwrap();
        device.push_channel(b"ok");

        let mut buf = [0u8; 2];
        device.read(&mut buf).unwrap();
        assert_eq!(&buf, b"ok");
        assert_eq!(device.read(&mut buf).unwrap_err(), DriverError::Timeout);
    }

    #[test]
    fn reinit_discards_previous_image() {
        let mut device = EmulatedDevice::new();
        device.init().unwrap();
        device.upload(0x0600_0000, &[0xAA]).unwrap();

        device.deinit().unwrap();
        device.init().unwrap();

        let mut buf = [0u8; 1];
        device.download(0x0600_0000, &mut buf).unwrap();
        assert_eq!(buf, [0x00]);
    }

    #[test]
    fn selectable_through_a_session() {
        let mut session = Session::new(vec![Box::new(EmulatedDevice::new())]);
        session.init();
        session.select("dummy").unwrap();

        let driver = session.active_mut().unwrap().unwrap();
        driver.upload(0x0600_4000, &[1, 2, 3]).unwrap();

        let mut buf = [0u8; 3];
        driver.download(0x0600_4000, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3]);
    }
}
