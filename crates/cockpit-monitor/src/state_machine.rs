//! Status polling and connection recovery state machine.
//!
//! This module provides the [`ConnectionStateMachine`], which is stepped once
//! per service tick. Each step decides whether to give up, re-validate the
//! controller, (re)open the serial link, poll the game status, or forward a
//! change to the controller.
//!
//! # Step Order
//!
//! ```text
//! ┌─────────────┐ errors > 20          ┌───────┐
//! │ fatal check │─────────────────────►│ Fatal │
//! └──────┬──────┘                      └───────┘
//!        ▼
//! ┌─────────────┐ every 51 good ticks, ┌──────────────┐
//! │  presence   │─── device absent ───►│ NoConnection │
//! └──────┬──────┘                      └──────────────┘
//!        ▼                                     ▲
//! ┌─────────────┐ open failed                  │
//! │ acquire link│──────────────────────────────┘
//! └──────┬──────┘
//!        ▼
//! ┌─────────────┐ read failed (errors += 1)
//! │ read status │──────────────────────────┐
//! │ + location  │                          │
//! └──────┬──────┘                          ▼
//!        ▼                           ┌────────────┐
//! ┌─────────────┐ send failed        │ Progressed │
//! │  changed?   │── (errors += 1, ──►│            │
//! │  send       │    drop link)      └────────────┘
//! └─────────────┘
//! ```
//!
//! # Error Budget
//!
//! Transient failures (unreadable status or journals, failed writes) are
//! counted. A step that completes without error resets the count. Failures
//! to open the link are not counted: they slow polling down instead, and are
//! retried indefinitely.
//!
//! # Examples
//!
//! ```
//! use cockpit_core::{Config, Snapshot};
//! use cockpit_hardware::mock::MockResolver;
//! use cockpit_journal::mock::MockStatusSource;
//! use cockpit_monitor::{ConnectionStateMachine, StepOutcome};
//!
//! let (resolver, link) = MockResolver::new();
//! let (source, status) = MockStatusSource::new();
//! status.set_status(Snapshot::new("2024-01-01T00:00:00Z"));
//! status.set_location("Sol");
//!
//! let mut machine = ConnectionStateMachine::new(resolver, source, Config::new("COM3", 9600, "logs"));
//!
//! assert_eq!(machine.step(), StepOutcome::Progressed);
//! assert_eq!(link.sent_payloads().len(), 1);
//!
//! // Nothing changed, nothing sent.
//! assert_eq!(machine.step(), StepOutcome::Progressed);
//! assert_eq!(link.sent_payloads().len(), 1);
//! ```

use std::fmt;

use cockpit_core::constants::{MAX_CONSECUTIVE_ERRORS, PRESENCE_CHECK_INTERVAL};
use cockpit_core::{Config, ControllerMessage, Snapshot};
use cockpit_hardware::{DeviceResolver, SerialLink};
use cockpit_journal::StatusSource;
use tracing::{debug, error, info, trace, warn};

/// Result of a single [`ConnectionStateMachine::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The error budget is exhausted. The caller should stop.
    Fatal(String),

    /// The controller is absent or the link could not be opened.
    NoConnection(String),

    /// The step ran, successfully or with a counted transient error.
    Progressed,
}

impl StepOutcome {
    /// Check if this outcome should terminate the service.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fatal(reason) => write!(f, "Fatal: {reason}"),
            Self::NoConnection(reason) => write!(f, "NoConnection: {reason}"),
            Self::Progressed => write!(f, "Progressed"),
        }
    }
}

/// Mutable polling state, owned by the state machine.
#[derive(Debug)]
struct ConnectionState<L> {
    /// Open link to the controller, if any.
    link: Option<L>,

    /// Last snapshot delivered to the controller.
    last_snapshot: Snapshot,

    /// Last star system delivered to the controller.
    last_location: String,

    /// Failing steps since the last clean one.
    consecutive_errors: u32,

    /// Clean steps since the last presence check.
    ticks_since_presence_check: u32,
}

impl<L> ConnectionState<L> {
    fn new() -> Self {
        Self {
            link: None,
            last_snapshot: Snapshot::default(),
            last_location: String::new(),
            consecutive_errors: 0,
            ticks_since_presence_check: 0,
        }
    }

    /// Drop the link and forget what the controller was last sent, so the
    /// next link receives a full update.
    fn link_lost(&mut self) {
        self.link = None;
        self.last_snapshot = Snapshot::default();
        self.last_location.clear();
    }

    /// Record a clean step.
    fn step_succeeded(&mut self) {
        self.consecutive_errors = 0;
        self.ticks_since_presence_check = self.ticks_since_presence_check.saturating_add(1);
    }
}

/// State machine driving status polling and link recovery.
///
/// The machine owns its collaborators and its state exclusively. It is not
/// shared between tasks; the service host steps it from a single loop.
pub struct ConnectionStateMachine<R: DeviceResolver, S: StatusSource> {
    /// Resolves the configured device identifier to a link.
    resolver: R,

    /// Reads the game status.
    source: S,

    /// Device, speed and log directory.
    config: Config,

    state: ConnectionState<R::Link>,
}

impl<R: DeviceResolver, S: StatusSource> ConnectionStateMachine<R, S> {
    /// Create a state machine with no link and empty last-seen values.
    pub fn new(resolver: R, source: S, config: Config) -> Self {
        Self {
            resolver,
            source,
            config,
            state: ConnectionState::new(),
        }
    }

    /// Create a builder for restoring a machine with pre-set counters.
    ///
    /// # Examples
    ///
    /// ```
    /// use cockpit_core::Config;
    /// use cockpit_hardware::mock::MockResolver;
    /// use cockpit_journal::mock::MockStatusSource;
    /// use cockpit_monitor::{ConnectionStateMachine, StepOutcome};
    ///
    /// let (resolver, _) = MockResolver::new();
    /// let (source, _) = MockStatusSource::new();
    ///
    /// let mut machine = ConnectionStateMachine::builder(resolver, source, Config::new("COM3", 9600, "logs"))
    ///     .with_consecutive_errors(21)
    ///     .build();
    ///
    /// assert!(machine.step().is_fatal());
    /// ```
    pub fn builder(resolver: R, source: S, config: Config) -> ConnectionStateMachineBuilder<R, S> {
        ConnectionStateMachineBuilder {
            machine: Self::new(resolver, source, config),
        }
    }

    /// Run one polling step.
    pub fn step(&mut self) -> StepOutcome {
        if self.state.consecutive_errors > MAX_CONSECUTIVE_ERRORS {
            return StepOutcome::Fatal("too many consecutive errors".to_string());
        }

        // Check in on the serial device every once in a while
        if self.state.ticks_since_presence_check > PRESENCE_CHECK_INTERVAL {
            self.state.ticks_since_presence_check = 0;
            if !self.device_present() {
                self.state.link_lost();
                info!("Device not connected");
                return StepOutcome::NoConnection("device not connected".to_string());
            }
        }

        let link = match self.state.link.take() {
            Some(link) => link,
            None => match self
                .resolver
                .open(&self.config.pnp_device_id, self.config.baud_rate)
            {
                Ok(link) => {
                    debug!(port = link.port_name(), "Serial link acquired");
                    link
                }
                Err(e) => {
                    trace!("Serial link unavailable: {}", e);
                    return StepOutcome::NoConnection(e.to_string());
                }
            },
        };
        let link = self.state.link.insert(link);

        let snapshot = match self.source.read_status(&self.config.log_dir) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.record_error(format_args!("Couldn't get status: {e}"));
                return StepOutcome::Progressed;
            }
        };

        let location = match self.source.read_location(&self.config.log_dir) {
            Ok(location) => location,
            Err(e) => {
                self.record_error(format_args!("Couldn't get star system: {e}"));
                return StepOutcome::Progressed;
            }
        };

        if snapshot.same_sample(&self.state.last_snapshot) && location == self.state.last_location
        {
            self.state.step_succeeded();
            return StepOutcome::Progressed;
        }

        let message = ControllerMessage::new(&snapshot, location.as_str());
        let bytes = match message.to_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                self.record_error(format_args!("Couldn't serialize message for serial: {e}"));
                return StepOutcome::Progressed;
            }
        };

        match link.send(&bytes) {
            Ok(()) => {
                trace!(
                    timestamp = %snapshot.timestamp,
                    system = %location,
                    len = bytes.len(),
                    "Sent status to controller"
                );
                self.state.last_snapshot = snapshot;
                self.state.last_location = location;
                self.state.step_succeeded();
            }
            Err(e) => {
                self.record_error(format_args!("Couldn't write to serial port: {e}"));
                self.state.link_lost();
                info!("Going to sleep until there is a serial connection");
            }
        }

        StepOutcome::Progressed
    }

    /// Query the resolver for the configured device. A failed query counts
    /// as absent.
    fn device_present(&self) -> bool {
        match self.resolver.is_present(&self.config.pnp_device_id) {
            Ok(present) => present,
            Err(e) => {
                warn!("Couldn't check for serial device: {}", e);
                false
            }
        }
    }

    /// Count a transient failure.
    fn record_error(&mut self, what: fmt::Arguments<'_>) {
        self.state.consecutive_errors = self.state.consecutive_errors.saturating_add(1);
        error!("{}", what);
        if self.state.consecutive_errors > 1 {
            error!(
                "Now at {} consecutive errors",
                self.state.consecutive_errors
            );
        }
    }

    /// Failing steps since the last clean one.
    pub fn consecutive_errors(&self) -> u32 {
        self.state.consecutive_errors
    }

    /// Clean steps since the last presence check.
    pub fn ticks_since_presence_check(&self) -> u32 {
        self.state.ticks_since_presence_check
    }

    /// Check if a link to the controller is currently held.
    pub fn is_connected(&self) -> bool {
        self.state.link.is_some()
    }

    /// The held link, if any.
    pub fn link(&self) -> Option<&R::Link> {
        self.state.link.as_ref()
    }

    /// Last snapshot delivered to the controller.
    pub fn last_snapshot(&self) -> &Snapshot {
        &self.state.last_snapshot
    }

    /// Last star system delivered to the controller.
    pub fn last_location(&self) -> &str {
        &self.state.last_location
    }

    /// Configuration the machine polls with.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl<R, S> fmt::Debug for ConnectionStateMachine<R, S>
where
    R: DeviceResolver,
    S: StatusSource,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionStateMachine")
            .field("config", &self.config)
            .field("connected", &self.is_connected())
            .field("last_snapshot", &self.state.last_snapshot)
            .field("last_location", &self.state.last_location)
            .field("consecutive_errors", &self.state.consecutive_errors)
            .field(
                "ticks_since_presence_check",
                &self.state.ticks_since_presence_check,
            )
            .finish()
    }
}

/// Builder for [`ConnectionStateMachine`] instances with restored counters.
pub struct ConnectionStateMachineBuilder<R: DeviceResolver, S: StatusSource> {
    machine: ConnectionStateMachine<R, S>,
}

impl<R: DeviceResolver, S: StatusSource> ConnectionStateMachineBuilder<R, S> {
    /// Set the consecutive error count.
    pub fn with_consecutive_errors(mut self, count: u32) -> Self {
        self.machine.state.consecutive_errors = count;
        self
    }

    /// Set the number of clean ticks since the last presence check.
    pub fn with_ticks_since_presence_check(mut self, ticks: u32) -> Self {
        self.machine.state.ticks_since_presence_check = ticks;
        self
    }

    /// Build the state machine.
    pub fn build(self) -> ConnectionStateMachine<R, S> {
        self.machine
    }
}
