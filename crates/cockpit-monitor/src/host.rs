//! Service host driving the state machine.
//!
//! [`ServiceHost`] owns the [`ConnectionStateMachine`] and runs a single
//! cooperative loop that waits for whichever comes first: the next poll
//! deadline or a lifecycle control request.
//!
//! ```text
//!            ┌──────────────┐
//!            │ StartPending │
//!            └──────┬───────┘
//!                   ▼
//!            ┌──────────────┐  tick: Progressed    → Fast
//!            │   Running    │  tick: NoConnection  → Slow
//!            │ (Fast│Slow)  │  Interrogate         → echo status twice
//!            └──────┬───────┘  Other(code)         → ignored
//!   Stop / Shutdown │ / Fatal
//!                   ▼
//!            ┌──────────────┐
//!            │ StopPending  │
//!            └──────┬───────┘
//!                   ▼
//!            ┌──────────────┐
//!            │   Stopped    │
//!            └──────────────┘
//! ```
//!
//! Status transitions are published on a channel for whatever supervises
//! the service. Publishing never blocks the loop.

use std::fmt;
use std::time::Duration;

use cockpit_core::constants::{
    FAST_POLL_INTERVAL_MS, INTERROGATE_ECHO_DELAY_MS, SLOW_POLL_INTERVAL_MS,
};
use cockpit_hardware::DeviceResolver;
use cockpit_journal::StatusSource;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::{self, Instant};
use tracing::{debug, error, info, warn};

use crate::state_machine::{ConnectionStateMachine, StepOutcome};

/// Polling intervals and control timings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    /// Interval between polls while the controller is connected.
    pub fast_interval: Duration,

    /// Interval between polls while waiting for the controller.
    pub slow_interval: Duration,

    /// Pause between the two status echoes answering an interrogation.
    pub interrogate_echo_delay: Duration,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            fast_interval: Duration::from_millis(FAST_POLL_INTERVAL_MS),
            slow_interval: Duration::from_millis(SLOW_POLL_INTERVAL_MS),
            interrogate_echo_delay: Duration::from_millis(INTERROGATE_ECHO_DELAY_MS),
        }
    }
}

impl HostConfig {
    /// Interval to wait before the next poll at `cadence`.
    pub fn interval(&self, cadence: Cadence) -> Duration {
        match cadence {
            Cadence::Fast => self.fast_interval,
            Cadence::Slow => self.slow_interval,
        }
    }
}

/// Polling rate currently in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Active polling.
    Fast,
    /// Waiting for the controller to reattach.
    Slow,
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fast => write!(f, "fast"),
            Self::Slow => write!(f, "slow"),
        }
    }
}

/// Lifecycle state of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    StartPending,
    Running,
    StopPending,
    Stopped,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartPending => write!(f, "StartPending"),
            Self::Running => write!(f, "Running"),
            Self::StopPending => write!(f, "StopPending"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Externally visible service status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceStatus {
    /// Lifecycle state.
    pub state: ServiceState,

    /// Whether stop and shutdown requests are accepted.
    pub accepts_stop: bool,
}

impl ServiceStatus {
    /// Status for `state`. Only a running service accepts stop requests.
    pub fn new(state: ServiceState) -> Self {
        Self {
            state,
            accepts_stop: state == ServiceState::Running,
        }
    }
}

/// Lifecycle control request delivered to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRequest {
    /// Report the current status. `current` is echoed back as-is.
    Interrogate { current: ServiceStatus },

    /// Stop the service.
    Stop,

    /// The system is shutting down.
    Shutdown,

    /// Any request the host does not handle.
    Other(u32),
}

/// Why [`ServiceHost::run`] returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostExit {
    /// Stopped on request.
    Stopped,

    /// Stopped because the state machine gave up.
    Fatal(String),
}

impl HostExit {
    /// Check if the service stopped because of an error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

/// Event loop hosting a [`ConnectionStateMachine`].
pub struct ServiceHost<R: DeviceResolver, S: StatusSource> {
    machine: ConnectionStateMachine<R, S>,
    config: HostConfig,
    cadence: Cadence,
    state: ServiceState,
}

impl<R: DeviceResolver, S: StatusSource> ServiceHost<R, S> {
    /// Create a host. Polling starts at the fast cadence.
    pub fn new(machine: ConnectionStateMachine<R, S>, config: HostConfig) -> Self {
        Self {
            machine,
            config,
            cadence: Cadence::Fast,
            state: ServiceState::StartPending,
        }
    }

    /// Run one poll and adjust the cadence to its outcome.
    pub fn handle_tick(&mut self) -> StepOutcome {
        let outcome = self.machine.step();

        match &outcome {
            StepOutcome::Progressed => self.set_cadence(Cadence::Fast),
            StepOutcome::NoConnection(reason) => {
                debug!(reason = %reason, "No connection to controller");
                self.set_cadence(Cadence::Slow);
            }
            StepOutcome::Fatal(reason) => {
                error!("Stopping service: {}", reason);
            }
        }

        outcome
    }

    /// Run until stopped by a control request, by the control channel
    /// closing, or by a fatal step outcome.
    pub async fn run(
        &mut self,
        mut control: mpsc::Receiver<ControlRequest>,
        status: mpsc::Sender<ServiceStatus>,
    ) -> HostExit {
        self.transition(ServiceState::StartPending, &status);
        self.transition(ServiceState::Running, &status);
        info!(
            device = %self.machine.config().pnp_device_id,
            log_dir = %self.machine.config().log_dir.display(),
            "Service running"
        );

        let mut deadline = Instant::now() + self.config.interval(self.cadence);

        loop {
            tokio::select! {
                request = control.recv() => match request {
                    Some(ControlRequest::Interrogate { current }) => {
                        publish(&status, current);
                        time::sleep(self.config.interrogate_echo_delay).await;
                        publish(&status, current);
                    }
                    Some(ControlRequest::Stop) => {
                        info!("Stop requested");
                        return self.shutdown(&status, HostExit::Stopped);
                    }
                    Some(ControlRequest::Shutdown) => {
                        info!("Shutdown requested");
                        return self.shutdown(&status, HostExit::Stopped);
                    }
                    Some(ControlRequest::Other(code)) => {
                        warn!("Unexpected control request #{}", code);
                    }
                    None => {
                        info!("Control channel closed");
                        return self.shutdown(&status, HostExit::Stopped);
                    }
                },

                () = time::sleep_until(deadline) => {
                    if let StepOutcome::Fatal(reason) = self.handle_tick() {
                        return self.shutdown(&status, HostExit::Fatal(reason));
                    }
                    deadline = Instant::now() + self.config.interval(self.cadence);
                }
            }
        }
    }

    fn shutdown(&mut self, status: &mpsc::Sender<ServiceStatus>, exit: HostExit) -> HostExit {
        self.transition(ServiceState::StopPending, status);
        self.transition(ServiceState::Stopped, status);
        exit
    }

    fn transition(&mut self, state: ServiceState, status: &mpsc::Sender<ServiceStatus>) {
        debug!(from = %self.state, to = %state, "Service state change");
        self.state = state;
        publish(status, ServiceStatus::new(state));
    }

    fn set_cadence(&mut self, cadence: Cadence) {
        if self.cadence != cadence {
            info!(
                cadence = %cadence,
                interval_ms = self.config.interval(cadence).as_millis() as u64,
                "Polling cadence changed"
            );
            self.cadence = cadence;
        }
    }

    /// Polling cadence currently in effect.
    pub fn cadence(&self) -> Cadence {
        self.cadence
    }

    /// Lifecycle state.
    pub fn state(&self) -> ServiceState {
        self.state
    }

    /// The hosted state machine.
    pub fn machine(&self) -> &ConnectionStateMachine<R, S> {
        &self.machine
    }

    /// Host timings.
    pub fn config(&self) -> &HostConfig {
        &self.config
    }
}

fn publish(status: &mpsc::Sender<ServiceStatus>, update: ServiceStatus) {
    match status.try_send(update) {
        Ok(()) => {}
        Err(TrySendError::Full(dropped)) => {
            warn!(state = %dropped.state, "Status channel full, update dropped");
        }
        Err(TrySendError::Closed(_)) => {
            debug!(state = %update.state, "Status channel closed");
        }
    }
}
