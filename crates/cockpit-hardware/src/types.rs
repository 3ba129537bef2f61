//! Common types shared by the serial backends.
//!
//! This module defines the description of an attached serial port and the
//! rules used to match a configured device identifier against it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of bus a serial port is attached through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortKind {
    /// USB CDC/ACM or USB-serial adapter.
    Usb,

    /// Bluetooth serial profile.
    Bluetooth,

    /// On-board or PCI UART.
    Pci,

    /// Anything the OS could not classify.
    Unknown,
}

impl fmt::Display for PortKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usb => write!(f, "USB"),
            Self::Bluetooth => write!(f, "Bluetooth"),
            Self::Pci => write!(f, "PCI"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Description of an attached serial port.
///
/// The `device_id` is a stable, PNP-style identifier (`USB\VID_2341&PID_8036\SERIAL`)
/// for USB ports and the port name for everything else. Either form can be
/// stored in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortInfo {
    /// OS port name (e.g., "COM3", "/dev/ttyACM0").
    pub port_name: String,

    /// Stable device identifier.
    pub device_id: String,

    /// Bus kind.
    pub kind: PortKind,

    /// Human-readable description (product or manufacturer string).
    pub description: String,
}

impl PortInfo {
    /// Create a port description whose identifier is the port name.
    pub fn new(port_name: impl Into<String>, kind: PortKind) -> Self {
        let port_name = port_name.into();
        Self {
            device_id: port_name.clone(),
            port_name,
            kind,
            description: kind.to_string(),
        }
    }

    /// Create a USB port description with a PNP-style identifier.
    pub fn usb(
        port_name: impl Into<String>,
        vid: u16,
        pid: u16,
        serial_number: Option<&str>,
    ) -> Self {
        Self {
            device_id: pnp_device_id(vid, pid, serial_number),
            ..Self::new(port_name, PortKind::Usb)
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Check whether a configured identifier refers to this port.
    ///
    /// Matches, case-insensitively, either the port name or the device id.
    ///
    /// # Examples
    ///
    /// ```
    /// use cockpit_hardware::types::PortInfo;
    ///
    /// let port = PortInfo::usb("COM3", 0x2341, 0x8036, Some("ABC"));
    /// assert!(port.matches("usb\\vid_2341&pid_8036\\abc"));
    /// assert!(port.matches("COM3"));
    /// assert!(!port.matches("COM4"));
    /// ```
    pub fn matches(&self, device_id: &str) -> bool {
        let device_id = device_id.trim();
        self.port_name.eq_ignore_ascii_case(device_id)
            || self.device_id.eq_ignore_ascii_case(device_id)
    }
}

/// Build the PNP-style identifier of a USB serial device.
///
/// # Examples
///
/// ```
/// use cockpit_hardware::types::pnp_device_id;
///
/// assert_eq!(pnp_device_id(0x2341, 0x8036, Some("5&1A2B")), "USB\\VID_2341&PID_8036\\5&1A2B");
/// assert_eq!(pnp_device_id(0x0403, 0x6001, None), "USB\\VID_0403&PID_6001");
/// ```
pub fn pnp_device_id(vid: u16, pid: u16, serial_number: Option<&str>) -> String {
    match serial_number.filter(|serial| !serial.is_empty()) {
        Some(serial) => format!("USB\\VID_{vid:04X}&PID_{pid:04X}\\{serial}"),
        None => format!("USB\\VID_{vid:04X}&PID_{pid:04X}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_plain_port_uses_name_as_id() {
        let port = PortInfo::new("/dev/ttyS0", PortKind::Pci);
        assert_eq!(port.device_id, "/dev/ttyS0");
        assert_eq!(port.description, "PCI");
    }

    #[test]
    fn test_usb_port_id() {
        let port = PortInfo::usb("/dev/ttyACM0", 0x2341, 0x8036, Some("HIDPC"))
            .with_description("Arduino Leonardo");
        assert_eq!(port.device_id, "USB\\VID_2341&PID_8036\\HIDPC");
        assert_eq!(port.description, "Arduino Leonardo");
        assert_eq!(port.kind, PortKind::Usb);
    }

    #[test]
    fn test_empty_serial_is_omitted() {
        assert_eq!(pnp_device_id(0x1A86, 0x7523, Some("")), "USB\\VID_1A86&PID_7523");
    }

    #[rstest]
    #[case("COM7", true)]
    #[case("com7", true)]
    #[case("USB\\VID_2341&PID_8036\\ABC", true)]
    #[case("usb\\vid_2341&pid_8036\\abc", true)]
    #[case("  COM7  ", true)]
    #[case("USB\\VID_2341&PID_8036", false)]
    #[case("COM8", false)]
    #[case("", false)]
    fn test_matches(#[case] device_id: &str, #[case] expected: bool) {
        let port = PortInfo::usb("COM7", 0x2341, 0x8036, Some("ABC"));
        assert_eq!(port.matches(device_id), expected);
    }

    #[test]
    fn test_port_info_serializes() {
        let port = PortInfo::new("COM1", PortKind::Unknown);
        let json = serde_json::to_string(&port).unwrap();
        assert!(json.contains("\"kind\":\"unknown\""));
    }
}
