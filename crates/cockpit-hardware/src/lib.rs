//! Serial link abstraction layer for the cockpit companion daemon.
//!
//! This crate provides the trait-based seam between the polling state machine
//! and the hardware controller it feeds. The traits allow the state machine to
//! run against the real serial backend or against mock implementations (for
//! development and testing).
//!
//! # Design Philosophy
//!
//! - **Synchronous**: A polling step never yields, so link operations are
//!   plain blocking calls bounded by a write timeout.
//! - **Owned links**: A link is exclusively owned by whoever opened it and
//!   dropping it releases the OS handle.
//! - **Error-aware**: All operations return [`Result<T>`][error::Result] with
//!   a [`LinkError`] describing the failure.
//!
//! # Traits
//!
//! - [`DeviceResolver`] turns a configured device identifier into an open
//!   link, and answers whether that device is still attached.
//! - [`SerialLink`] writes bytes to the controller.
//!
//! ```no_run
//! use cockpit_hardware::traits::{DeviceResolver, SerialLink};
//! use cockpit_hardware::Result;
//!
//! fn push<R: DeviceResolver>(resolver: &R, payload: &[u8]) -> Result<()> {
//!     let mut link = resolver.open("USB\\VID_2341&PID_8036\\HIDPC", 9600)?;
//!     link.send(payload)
//! }
//! ```
//!
//! # Backends
//!
//! - [`serial::SerialPortResolver`] (feature `hardware-serial`, default):
//!   real ports through the `serialport` crate.
//! - [`mock::MockResolver`]: a scripted, in-memory controller.
//!
//! [`DeviceResolver`]: traits::DeviceResolver
//! [`SerialLink`]: traits::SerialLink

pub mod error;
pub mod mock;
#[cfg(feature = "hardware-serial")]
pub mod serial;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{LinkError, Result};
pub use traits::{DeviceResolver, SerialLink};
pub use types::{PortInfo, PortKind, pnp_device_id};

#[cfg(feature = "hardware-serial")]
pub use serial::{SerialPortLink, SerialPortResolver, available_ports};
