//! Persisted daemon configuration.
//!
//! The configuration is a small JSON document stored next to the executable
//! (`config.json`). It names the controller to talk to, the speed to talk to
//! it at, and where the game writes its logs:
//!
//! ```text
//! {"pnp_device_id":"USB\\VID_2341&PID_8036\\5&1A2B3C4D","baud_rate":9600,"log_dir":"C:/Users/cmdr/Saved Games/Frontier Developments/Elite Dangerous"}
//! ```
//!
//! The daemon only reads this file; it is written by the `configure`
//! command.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::CONFIG_FILE_NAME;
use crate::{Error, Result};

/// Daemon configuration.
///
/// # Examples
///
/// ```
/// use cockpit_core::Config;
///
/// let config = Config::new("COM3", 9600, "/tmp");
/// assert_eq!(config.baud_rate, 9600);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Identifier of the controller's serial device (port name or PNP id).
    pub pnp_device_id: String,

    /// Serial transmission speed.
    pub baud_rate: u32,

    /// Directory holding `Status.json` and the journal files.
    pub log_dir: PathBuf,
}

impl Config {
    /// Create a configuration from its parts.
    pub fn new(
        pnp_device_id: impl Into<String>,
        baud_rate: u32,
        log_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            pnp_device_id: pnp_device_id.into(),
            baud_rate,
            log_dir: log_dir.into(),
        }
    }

    /// Default location of the configuration file: beside the executable.
    ///
    /// # Errors
    /// Returns `Error::Io` if the executable path cannot be determined.
    pub fn default_path() -> Result<PathBuf> {
        let exe = std::env::current_exe()?;
        let dir = exe.parent().ok_or_else(|| {
            Error::InvalidConfig(format!("{} has no parent directory", exe.display()))
        })?;
        Ok(dir.join(CONFIG_FILE_NAME))
    }

    /// Load and parse the configuration at `path`.
    ///
    /// # Errors
    /// - `Error::ConfigNotFound` if the file does not exist
    /// - `Error::Io` if the file cannot be read
    /// - `Error::Serialization` if the file is not valid configuration JSON
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let buffer = fs::read(path)?;
        let config = serde_json::from_slice(&buffer)?;
        Ok(config)
    }

    /// Write the configuration to `path`, replacing any existing file.
    ///
    /// # Errors
    /// Returns `Error::Io` or `Error::Serialization` on failure.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let buffer = serde_json::to_vec(self)?;
        fs::write(path, buffer)?;
        Ok(())
    }

    /// Check that the configuration can drive the daemon.
    ///
    /// # Errors
    /// - `Error::MissingConfig` if the device identifier is blank
    /// - `Error::InvalidConfig` if the baud rate is zero or the log
    ///   directory does not exist
    pub fn validate(&self) -> Result<()> {
        if self.pnp_device_id.trim().is_empty() {
            return Err(Error::MissingConfig("pnp_device_id".to_string()));
        }

        if self.baud_rate == 0 {
            return Err(Error::InvalidConfig(
                "baud_rate must be greater than zero".to_string(),
            ));
        }

        if !self.log_dir.is_dir() {
            return Err(Error::InvalidConfig(format!(
                "log_dir {} is not a directory",
                self.log_dir.display()
            )));
        }

        Ok(())
    }
}
