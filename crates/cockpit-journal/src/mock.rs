//! Mock status source for testing without a game install.
//!
//! The source and its [`MockStatusSourceHandle`] share the current telemetry.
//! Tests set the snapshot and location the next reads should return, queue
//! read failures, and count how often each capability was called.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cockpit_core::Snapshot;

use crate::error::{ReadError, Result};
use crate::traits::StatusSource;

#[derive(Debug, Default)]
struct MockLog {
    status: Option<Snapshot>,
    location: Option<String>,
    status_failures: u32,
    location_failures: u32,
    status_reads: u32,
    location_reads: u32,
}

type SharedLog = Arc<Mutex<MockLog>>;

fn lock(log: &SharedLog) -> MutexGuard<'_, MockLog> {
    log.lock().unwrap_or_else(PoisonError::into_inner)
}

fn simulated_failure(log_dir: &Path, what: &str) -> ReadError {
    ReadError::io(
        log_dir.join(what),
        std::io::Error::other("simulated read failure"),
    )
}

/// Mock status source.
///
/// Until telemetry is set, reads fail as if the log directory were empty.
#[derive(Debug, Clone)]
pub struct MockStatusSource {
    log: SharedLog,
}

impl MockStatusSource {
    /// Create a new mock source with no telemetry.
    pub fn new() -> (Self, MockStatusSourceHandle) {
        let log = SharedLog::default();
        let source = Self {
            log: Arc::clone(&log),
        };
        (source, MockStatusSourceHandle { log })
    }
}

impl StatusSource for MockStatusSource {
    fn read_status(&self, log_dir: &Path) -> Result<Snapshot> {
        let mut log = lock(&self.log);
        log.status_reads += 1;

        if log.status_failures > 0 {
            log.status_failures -= 1;
            return Err(simulated_failure(log_dir, "Status.json"));
        }

        log.status
            .clone()
            .ok_or_else(|| ReadError::empty(log_dir.join("Status.json")))
    }

    fn read_location(&self, log_dir: &Path) -> Result<String> {
        let mut log = lock(&self.log);
        log.location_reads += 1;

        if log.location_failures > 0 {
            log.location_failures -= 1;
            return Err(simulated_failure(log_dir, "Journal.log"));
        }

        log.location
            .clone()
            .ok_or_else(|| ReadError::location_unknown(log_dir))
    }
}

/// Handle for scripting and inspecting a [`MockStatusSource`].
#[derive(Debug, Clone)]
pub struct MockStatusSourceHandle {
    log: SharedLog,
}

impl MockStatusSourceHandle {
    /// Set the snapshot returned by subsequent status reads.
    pub fn set_status(&self, snapshot: Snapshot) {
        lock(&self.log).status = Some(snapshot);
    }

    /// Set the star system returned by subsequent location reads.
    pub fn set_location(&self, system: impl Into<String>) {
        lock(&self.log).location = Some(system.into());
    }

    /// Make the next `count` status reads fail.
    pub fn fail_next_status_reads(&self, count: u32) {
        lock(&self.log).status_failures += count;
    }

    /// Make the next `count` location reads fail.
    pub fn fail_next_location_reads(&self, count: u32) {
        lock(&self.log).location_failures += count;
    }

    /// Number of status reads so far.
    pub fn status_reads(&self) -> u32 {
        lock(&self.log).status_reads
    }

    /// Number of location reads so far.
    pub fn location_reads(&self) -> u32 {
        lock(&self.log).location_reads
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_fail_until_set() {
        let (source, handle) = MockStatusSource::new();
        let dir = Path::new("logs");

        assert!(matches!(
            source.read_status(dir),
            Err(ReadError::Empty { .. })
        ));
        assert!(matches!(
            source.read_location(dir),
            Err(ReadError::LocationUnknown { .. })
        ));

        handle.set_status(Snapshot::new("T1"));
        handle.set_location("Sol");

        assert_eq!(source.read_status(dir).unwrap(), Snapshot::new("T1"));
        assert_eq!(source.read_location(dir).unwrap(), "Sol");
        assert_eq!(handle.status_reads(), 2);
        assert_eq!(handle.location_reads(), 2);
    }

    #[test]
    fn test_scripted_failures() {
        let (source, handle) = MockStatusSource::new();
        let dir = Path::new("logs");
        handle.set_status(Snapshot::new("T1"));
        handle.set_location("Sol");
        handle.fail_next_status_reads(1);
        handle.fail_next_location_reads(2);

        assert!(matches!(source.read_status(dir), Err(ReadError::Io { .. })));
        assert!(source.read_status(dir).is_ok());

        assert!(source.read_location(dir).is_err());
        assert!(source.read_location(dir).is_err());
        assert!(source.read_location(dir).is_ok());
    }
}
