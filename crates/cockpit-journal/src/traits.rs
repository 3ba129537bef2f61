//! Status source trait definition.

use std::path::Path;

use cockpit_core::Snapshot;

use crate::error::Result;

/// Reads the game's live status from a log directory.
///
/// Implementations report failures through [`ReadError`](crate::ReadError)
/// and never panic on malformed or missing files.
///
/// # Examples
///
/// ```
/// use cockpit_journal::StatusSource;
/// use cockpit_journal::mock::MockStatusSource;
/// use cockpit_core::Snapshot;
/// use std::path::Path;
///
/// let (source, handle) = MockStatusSource::new();
/// handle.set_status(Snapshot::new("2024-01-01T00:00:00Z"));
/// handle.set_location("Sol");
///
/// let dir = Path::new("logs");
/// assert_eq!(source.read_status(dir).unwrap().timestamp, "2024-01-01T00:00:00Z");
/// assert_eq!(source.read_location(dir).unwrap(), "Sol");
/// ```
pub trait StatusSource {
    /// Read the current ship telemetry.
    ///
    /// # Errors
    ///
    /// Returns an error if the status file is missing, empty or malformed.
    fn read_status(&self, log_dir: &Path) -> Result<Snapshot>;

    /// Read the name of the star system the ship is currently in.
    ///
    /// # Errors
    ///
    /// Returns an error if no journal records a location.
    fn read_location(&self, log_dir: &Path) -> Result<String>;
}
