use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One sampled reading of the ship telemetry published in `Status.json`.
///
/// Field names follow the game's own casing so the status file can be
/// deserialized directly. Fields the game omits (e.g. while sitting in the
/// main menu) default to zero.
///
/// Two snapshots are considered the same sample when their timestamps are
/// equal, regardless of the other fields. See [`Snapshot::same_sample`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Game-provided ISO 8601 timestamp of the sample.
    #[serde(default)]
    pub timestamp: String,

    /// Ship status bitmask.
    #[serde(rename = "Flags", default)]
    pub flags: u32,

    /// Power distributor pips (systems, engines, weapons).
    #[serde(rename = "Pips", default)]
    pub pips: [i32; 3],

    /// Currently selected fire group.
    #[serde(rename = "FireGroup", default)]
    pub fire_group: i32,
}

impl Snapshot {
    /// Create a snapshot with the given timestamp and zeroed telemetry.
    pub fn new(timestamp: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            ..Self::default()
        }
    }

    /// Set the status flags.
    #[must_use]
    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    /// Set the power distributor pips.
    #[must_use]
    pub fn with_pips(mut self, pips: [i32; 3]) -> Self {
        self.pips = pips;
        self
    }

    /// Set the fire group.
    #[must_use]
    pub fn with_fire_group(mut self, fire_group: i32) -> Self {
        self.fire_group = fire_group;
        self
    }

    /// Whether `other` describes the same sample as `self`.
    ///
    /// Only the timestamp is compared.
    pub fn same_sample(&self, other: &Snapshot) -> bool {
        self.timestamp == other.timestamp
    }

    /// Whether this is the empty sentinel held before the first sample.
    pub fn is_empty(&self) -> bool {
        self.timestamp.is_empty()
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} flags={:#010x} pips={:?} fire_group={}",
            self.timestamp, self.flags, self.pips, self.fire_group
        )
    }
}

/// Telemetry payload written to the controller.
///
/// Serialized as a single JSON object with no framing:
///
/// ```text
/// {"timestamp":"...","Flags":0,"Pips":[4,4,4],"FireGroup":0,"StarSystem":"Sol"}
/// ```
///
/// # Examples
///
/// ```
/// use cockpit_core::{ControllerMessage, Snapshot};
///
/// let snapshot = Snapshot::new("2024-01-01T00:00:00Z").with_pips([4, 4, 4]);
/// let message = ControllerMessage::new(&snapshot, "Sol");
///
/// let bytes = message.to_bytes().unwrap();
/// assert_eq!(ControllerMessage::from_slice(&bytes).unwrap(), message);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerMessage {
    pub timestamp: String,

    #[serde(rename = "Flags")]
    pub flags: u32,

    #[serde(rename = "Pips")]
    pub pips: [i32; 3],

    #[serde(rename = "FireGroup")]
    pub fire_group: i32,

    #[serde(rename = "StarSystem")]
    pub star_system: String,
}

impl ControllerMessage {
    /// Build the payload for a snapshot observed in `star_system`.
    pub fn new(snapshot: &Snapshot, star_system: impl Into<String>) -> Self {
        Self {
            timestamp: snapshot.timestamp.clone(),
            flags: snapshot.flags,
            pips: snapshot.pips,
            fire_group: snapshot.fire_group,
            star_system: star_system.into(),
        }
    }

    /// Serialize into the wire representation.
    ///
    /// # Errors
    /// Returns `Error::Serialization` if JSON encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse a wire representation produced by [`ControllerMessage::to_bytes`].
    ///
    /// # Errors
    /// Returns `Error::Serialization` if the bytes are not a valid message.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
