//! Error types for serial link operations.
//!
//! This module defines the errors raised while locating the controller,
//! opening a link to it, and writing to that link.

/// Result type alias for link operations.
pub type Result<T> = std::result::Result<T, LinkError>;

/// Errors that can occur while resolving, opening or using a serial link.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// No attached device matches the configured identifier.
    #[error("Device not found: {device_id}")]
    NotFound { device_id: String },

    /// The OS device list could not be queried.
    #[error("Device enumeration failed: {message}")]
    EnumerationFailed { message: String },

    /// The device was found but could not be opened.
    #[error("Couldn't open serial port {port}: {message}")]
    OpenFailed { port: String, message: String },

    /// Writing to an open link failed.
    #[error("Send failed: {message}")]
    SendFailed { message: String },

    /// Device is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },
}

impl LinkError {
    /// Create a new not found error.
    pub fn not_found(device_id: impl Into<String>) -> Self {
        Self::NotFound {
            device_id: device_id.into(),
        }
    }

    /// Create a new enumeration error.
    pub fn enumeration(message: impl Into<String>) -> Self {
        Self::EnumerationFailed {
            message: message.into(),
        }
    }

    /// Create a new open failed error.
    pub fn open_failed(port: impl Into<String>, message: impl Into<String>) -> Self {
        Self::OpenFailed {
            port: port.into(),
            message: message.into(),
        }
    }

    /// Create a new send failed error.
    pub fn send_failed(message: impl Into<String>) -> Self {
        Self::SendFailed {
            message: message.into(),
        }
    }

    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let error = LinkError::not_found("USB\\VID_2341&PID_8036\\1");
        assert!(matches!(error, LinkError::NotFound { .. }));
        assert_eq!(
            error.to_string(),
            "Device not found: USB\\VID_2341&PID_8036\\1"
        );
    }

    #[test]
    fn test_open_failed_error() {
        let error = LinkError::open_failed("/dev/ttyACM0", "Permission denied");
        assert_eq!(
            error.to_string(),
            "Couldn't open serial port /dev/ttyACM0: Permission denied"
        );
    }

    #[test]
    fn test_send_failed_error() {
        let error = LinkError::send_failed("Broken pipe");
        assert!(matches!(error, LinkError::SendFailed { .. }));
        assert_eq!(error.to_string(), "Send failed: Broken pipe");
    }
}
