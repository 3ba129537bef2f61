//! Serial link trait definitions.
//!
//! These traits establish the contract between the polling state machine and
//! the controller hardware, enabling the state machine to be driven by the
//! real serial backend or by the mocks in [`crate::mock`].
//!
//! The methods are synchronous. A polling step runs to completion on the
//! service loop without yielding, so every call here is expected to return
//! promptly or fail.

use crate::error::Result;

/// An open byte stream to the controller.
///
/// Dropping the link releases the underlying OS handle.
///
/// # Examples
///
/// ```
/// use cockpit_hardware::traits::SerialLink;
/// use cockpit_hardware::Result;
///
/// fn greet<L: SerialLink>(link: &mut L) -> Result<()> {
///     link.send(b"{}")
/// }
/// ```
pub trait SerialLink: Send {
    /// Write `bytes` to the controller in full.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or times out. The link should be
    /// considered broken afterwards.
    fn send(&mut self, bytes: &[u8]) -> Result<()>;

    /// Name of the OS port backing this link.
    fn port_name(&self) -> &str;
}

/// Resolves a configured device identifier to an open link.
///
/// # Examples
///
/// ```
/// use cockpit_hardware::traits::{DeviceResolver, SerialLink};
/// use cockpit_hardware::mock::MockResolver;
///
/// let (resolver, _handle) = MockResolver::new();
///
/// assert!(resolver.is_present("COM3").unwrap());
/// let mut link = resolver.open("COM3", 9600).unwrap();
/// link.send(b"hello").unwrap();
/// ```
pub trait DeviceResolver {
    /// Link type produced by [`DeviceResolver::open`].
    type Link: SerialLink;

    /// Check whether a device matching `device_id` is currently attached.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS device list cannot be queried.
    fn is_present(&self, device_id: &str) -> Result<bool>;

    /// Locate the device matching `device_id` and open it at `baud_rate`.
    ///
    /// # Errors
    ///
    /// - `LinkError::NotFound` if no attached device matches
    /// - `LinkError::OpenFailed` if the port exists but cannot be opened
    fn open(&self, device_id: &str, baud_rate: u32) -> Result<Self::Link>;
}
