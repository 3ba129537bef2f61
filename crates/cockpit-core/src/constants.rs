//! Core constants for the cockpit companion daemon.
//!
//! This module centralizes the thresholds and intervals that drive the
//! polling state machine and the service host, along with the well-known
//! file names of the game's status log.
//!
//! # Polling Model
//!
//! ```text
//!  Fast cadence (20ms) ──► step() ──► Progressed ──┐
//!        ▲                   │                     │
//!        └───────────────────┼─────────────────────┘
//!                            │
//!                            └──► NoConnection ──► Slow cadence (10s)
//! ```
//!
//! # Usage
//!
//! ```
//! use cockpit_core::constants::*;
//! use std::time::Duration;
//!
//! let fast = Duration::from_millis(FAST_POLL_INTERVAL_MS);
//! let slow = Duration::from_millis(SLOW_POLL_INTERVAL_MS);
//! assert!(fast < slow);
//! ```

// ============================================================================
// State Machine Thresholds
// ============================================================================

/// Highest tolerated number of consecutive failing steps.
///
/// A step that starts with more consecutive errors than this returns a fatal
/// outcome and the service stops.
pub const MAX_CONSECUTIVE_ERRORS: u32 = 20;

/// Number of successful ticks tolerated between device presence checks.
///
/// Once the tick counter exceeds this value the next step re-enumerates the
/// configured device before doing anything else.
pub const PRESENCE_CHECK_INTERVAL: u32 = 50;

// ============================================================================
// Polling Cadence
// ============================================================================

/// Interval between ticks while actively polling (milliseconds).
pub const FAST_POLL_INTERVAL_MS: u64 = 20;

/// Interval between ticks while waiting for the controller to reattach
/// (milliseconds).
pub const SLOW_POLL_INTERVAL_MS: u64 = 10_000;

/// Delay between the two status echoes sent in reply to an interrogate
/// request (milliseconds).
pub const INTERROGATE_ECHO_DELAY_MS: u64 = 100;

// ============================================================================
// Serial Link
// ============================================================================

/// Default serial transmission speed offered by the setup wizard.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Write timeout applied to opened serial ports (milliseconds).
pub const SERIAL_WRITE_TIMEOUT_MS: u64 = 500;

// ============================================================================
// Game Log Files
// ============================================================================

/// Name of the live status file written by the game.
pub const STATUS_FILE_NAME: &str = "Status.json";

/// Prefix of the journal log files.
pub const JOURNAL_FILE_PREFIX: &str = "Journal.";

/// Extension of the journal log files.
pub const JOURNAL_FILE_EXTENSION: &str = ".log";

/// Journal events that carry the current star system.
pub const LOCATION_EVENTS: [&str; 3] = ["Location", "FSDJump", "CarrierJump"];

/// Default game log directory, relative to the user's home directory.
pub const DEFAULT_LOG_DIR_SUFFIX: &str = "Saved Games/Frontier Developments/Elite Dangerous";

// ============================================================================
// Configuration
// ============================================================================

/// File name of the persisted configuration.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Service name used in logs and status reports.
pub const SERVICE_NAME: &str = "elite-dangerous-cockpit-companion";

/// Human-readable service description.
pub const SERVICE_DESCRIPTION: &str = "Elite Dangerous Cockpit Companion";
