//! File-backed status source.
//!
//! The game keeps two kinds of files in its log directory:
//!
//! - `Status.json`: rewritten in place every time ship telemetry changes.
//! - `Journal.<stamp>.<part>.log`: one JSON event per line, appended as the
//!   session progresses. A new file is started per session.
//!
//! [`JournalStatusSource`] reads the telemetry from the former and the
//! current star system from the most recent location-bearing event in the
//! latter.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use cockpit_core::Snapshot;
use cockpit_core::constants::{
    JOURNAL_FILE_EXTENSION, JOURNAL_FILE_PREFIX, LOCATION_EVENTS, STATUS_FILE_NAME,
};
use serde::Deserialize;
use tracing::{debug, trace};

use crate::error::{ReadError, Result};
use crate::traits::StatusSource;

/// Subset of a journal event needed to locate the ship.
#[derive(Debug, Deserialize)]
struct JournalEvent {
    event: String,

    #[serde(rename = "StarSystem")]
    star_system: Option<String>,
}

/// Status source reading the game's log directory.
///
/// # Examples
///
/// ```no_run
/// use cockpit_journal::{JournalStatusSource, StatusSource};
/// use std::path::Path;
///
/// let source = JournalStatusSource::new();
/// let dir = Path::new("C:/Users/cmdr/Saved Games/Frontier Developments/Elite Dangerous");
///
/// let snapshot = source.read_status(dir)?;
/// let system = source.read_location(dir)?;
/// println!("{} in {}", snapshot, system);
/// # Ok::<(), cockpit_journal::ReadError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct JournalStatusSource;

impl JournalStatusSource {
    /// Create a new journal status source.
    pub fn new() -> Self {
        Self
    }
}

impl StatusSource for JournalStatusSource {
    fn read_status(&self, log_dir: &Path) -> Result<Snapshot> {
        let path = log_dir.join(STATUS_FILE_NAME);
        let buffer = fs::read(&path).map_err(|e| ReadError::io(&path, e))?;

        if buffer.iter().all(u8::is_ascii_whitespace) {
            return Err(ReadError::empty(&path));
        }

        serde_json::from_slice(&buffer).map_err(|e| ReadError::parse(&path, e))
    }

    fn read_location(&self, log_dir: &Path) -> Result<String> {
        for path in journal_files(log_dir)? {
            let contents = fs::read_to_string(&path).map_err(|e| ReadError::io(&path, e))?;

            if let Some(system) = last_star_system(&contents) {
                trace!(journal = %path.display(), system = %system, "Found star system");
                return Ok(system);
            }

            debug!(journal = %path.display(), "No location event in journal");
        }

        Err(ReadError::location_unknown(log_dir))
    }
}

/// Whether `name` looks like a journal file name.
fn is_journal_name(name: &str) -> bool {
    name.starts_with(JOURNAL_FILE_PREFIX) && name.ends_with(JOURNAL_FILE_EXTENSION)
}

/// Journal files in `log_dir`, newest first.
///
/// Ordered by modification time, ties broken by file name.
fn journal_files(log_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(log_dir).map_err(|e| ReadError::io(log_dir, e))?;

    let mut journals: Vec<(SystemTime, String, PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            if !is_journal_name(&name) {
                return None;
            }
            let metadata = entry.metadata().ok()?;
            if !metadata.is_file() {
                return None;
            }
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            Some((modified, name, entry.path()))
        })
        .collect();

    journals.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));

    Ok(journals.into_iter().map(|(_, _, path)| path).collect())
}

/// Star system of the last location-bearing event in a journal.
///
/// Lines that do not parse are skipped; the game may be halfway through
/// appending one.
fn last_star_system(contents: &str) -> Option<String> {
    contents
        .lines()
        .rev()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str::<JournalEvent>(line).ok())
        .filter(|event| LOCATION_EVENTS.contains(&event.event.as_str()))
        .find_map(|event| event.star_system)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Journal.2024-01-01T120000.01.log", true)]
    #[case("Journal.190101120000.01.log", true)]
    #[case("Status.json", false)]
    #[case("Journal.2024-01-01T120000.01.log.bak", false)]
    #[case("JournalArchive.log", false)]
    fn test_is_journal_name(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_journal_name(name), expected);
    }

    #[test]
    fn test_last_star_system_picks_latest_location_event() {
        let journal = concat!(
            r#"{"timestamp":"2024-01-01T00:00:00Z","event":"Fileheader","part":1}"#,
            "\n",
            r#"{"timestamp":"2024-01-01T00:00:01Z","event":"Location","StarSystem":"Sol"}"#,
            "\n",
            r#"{"timestamp":"2024-01-01T00:05:00Z","event":"FSDJump","StarSystem":"Alpha Centauri"}"#,
            "\n",
            r#"{"timestamp":"2024-01-01T00:06:00Z","event":"FSSDiscoveryScan","SystemName":"Alpha Centauri"}"#,
            "\n",
        );

        assert_eq!(
            last_star_system(journal),
            Some("Alpha Centauri".to_string())
        );
    }

    #[test]
    fn test_last_star_system_ignores_other_events_with_star_system() {
        let journal = concat!(
            r#"{"event":"CarrierJump","StarSystem":"Colonia"}"#,
            "\n",
            r#"{"event":"Docked","StarSystem":"Sol"}"#,
            "\n",
        );

        assert_eq!(last_star_system(journal), Some("Colonia".to_string()));
    }

    #[test]
    fn test_last_star_system_skips_partial_line() {
        let journal = concat!(
            r#"{"event":"Location","StarSystem":"Shinrarta Dezhra"}"#,
            "\n",
            r#"{"event":"FSDJump","StarSys"#,
        );

        assert_eq!(
            last_star_system(journal),
            Some("Shinrarta Dezhra".to_string())
        );
    }

    #[test]
    fn test_last_star_system_none() {
        assert_eq!(last_star_system(""), None);
        assert_eq!(last_star_system(r#"{"event":"Music"}"#), None);
    }
}
