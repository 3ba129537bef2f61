//! Game status log access for the cockpit companion daemon.
//!
//! This crate reads the ship telemetry (`Status.json`) and current star
//! system (journal logs) that the polling state machine forwards to the
//! controller.
//!
//! # Components
//!
//! - [`StatusSource`]: the read capability consumed by the state machine.
//! - [`JournalStatusSource`]: reads a real log directory.
//! - [`mock::MockStatusSource`]: scripted telemetry for tests.
//!
//! # Example
//!
//! ```no_run
//! use cockpit_journal::{JournalStatusSource, StatusSource};
//! use std::path::Path;
//!
//! let source = JournalStatusSource::new();
//! match source.read_status(Path::new("/logs")) {
//!     Ok(snapshot) => println!("Flags: {:#x}", snapshot.flags),
//!     Err(e) => eprintln!("Couldn't get status: {e}"),
//! }
//! ```

pub mod error;
pub mod mock;
mod source;
pub mod traits;

pub use error::{ReadError, Result};
pub use source::JournalStatusSource;
pub use traits::StatusSource;
