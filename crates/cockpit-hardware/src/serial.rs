//! Serial port backend built on the `serialport` crate.
//!
//! [`SerialPortResolver`] enumerates the ports the OS currently exposes,
//! matches them against the configured device identifier and opens the first
//! match as a [`SerialPortLink`].
//!
//! ```text
//! config.pnp_device_id ──► available_ports() ──► PortInfo::matches ──► open(8N1)
//! ```

use std::io::Write;
use std::time::Duration;

use cockpit_core::constants::SERIAL_WRITE_TIMEOUT_MS;
use serialport::{DataBits, FlowControl, Parity, SerialPortType, StopBits};
use tracing::{debug, info, trace};

use crate::error::{LinkError, Result};
use crate::traits::{DeviceResolver, SerialLink};
use crate::types::{PortInfo, PortKind};

/// Default write timeout for opened ports.
const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_millis(SERIAL_WRITE_TIMEOUT_MS);

/// List the serial ports currently attached to the system.
///
/// # Errors
///
/// Returns `LinkError::EnumerationFailed` if the OS query fails.
pub fn available_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports()
        .map_err(|e| LinkError::enumeration(e.description))?
        .into_iter()
        .map(|port| port_info(port.port_name, port.port_type))
        .collect();
    Ok(ports)
}

fn port_info(port_name: String, port_type: SerialPortType) -> PortInfo {
    match port_type {
        SerialPortType::UsbPort(usb) => {
            let description = usb
                .product
                .clone()
                .or_else(|| usb.manufacturer.clone())
                .unwrap_or_else(|| PortKind::Usb.to_string());
            PortInfo::usb(port_name, usb.vid, usb.pid, usb.serial_number.as_deref())
                .with_description(description)
        }
        SerialPortType::BluetoothPort => PortInfo::new(port_name, PortKind::Bluetooth),
        SerialPortType::PciPort => PortInfo::new(port_name, PortKind::Pci),
        SerialPortType::Unknown => PortInfo::new(port_name, PortKind::Unknown),
    }
}

/// Resolver backed by OS serial port enumeration.
#[derive(Debug, Clone)]
pub struct SerialPortResolver {
    write_timeout: Duration,
}

impl SerialPortResolver {
    /// Create a resolver with the default write timeout.
    pub fn new() -> Self {
        Self {
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }

    /// Set the write timeout applied to opened ports.
    pub fn with_write_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }

    /// Find the attached port matching `device_id`, if any.
    ///
    /// # Errors
    ///
    /// Returns `LinkError::EnumerationFailed` if the OS query fails.
    pub fn find(&self, device_id: &str) -> Result<Option<PortInfo>> {
        let port = available_ports()?
            .into_iter()
            .find(|port| port.matches(device_id));
        trace!(device_id, found = port.is_some(), "Resolved serial device");
        Ok(port)
    }
}

impl Default for SerialPortResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceResolver for SerialPortResolver {
    type Link = SerialPortLink;

    fn is_present(&self, device_id: &str) -> Result<bool> {
        Ok(self.find(device_id)?.is_some())
    }

    fn open(&self, device_id: &str, baud_rate: u32) -> Result<Self::Link> {
        let port = self
            .find(device_id)?
            .ok_or_else(|| LinkError::not_found(device_id))?;

        debug!(port = %port.port_name, baud_rate, "Opening serial port");

        let handle = serialport::new(&port.port_name, baud_rate)
            .data_bits(DataBits::Eight)
            .stop_bits(StopBits::One)
            .parity(Parity::None)
            .flow_control(FlowControl::None)
            .timeout(self.write_timeout)
            .open()
            .map_err(|e| LinkError::open_failed(&port.port_name, e.description))?;

        info!(
            "Connected to serial port {} at baud rate {}",
            port.port_name, baud_rate
        );

        Ok(SerialPortLink {
            port_name: port.port_name,
            handle,
        })
    }
}

/// Open serial port to the controller.
pub struct SerialPortLink {
    port_name: String,
    handle: Box<dyn serialport::SerialPort>,
}

impl std::fmt::Debug for SerialPortLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPortLink")
            .field("port_name", &self.port_name)
            .finish_non_exhaustive()
    }
}

impl SerialLink for SerialPortLink {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.handle
            .write_all(bytes)
            .and_then(|()| self.handle.flush())
            .map_err(|e| LinkError::send_failed(format!("{}: {}", self.port_name, e)))?;
        trace!(port = %self.port_name, len = bytes.len(), "Wrote to serial port");
        Ok(())
    }

    fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl Drop for SerialPortLink {
    fn drop(&mut self) {
        debug!(port = %self.port_name, "Closing serial port");
    }
}
