//! Status polling and service lifecycle for the cockpit companion.
//!
//! This crate holds the two pieces with real logic in them:
//!
//! - [`ConnectionStateMachine`]: one polling step per tick. Reads the game
//!   status, forwards changes to the controller, counts transient errors and
//!   recovers the serial link when the controller goes away.
//! - [`ServiceHost`]: the loop that ticks the state machine at a fast or slow
//!   cadence and answers lifecycle control requests in between.
//!
//! Both are generic over the [`DeviceResolver`](cockpit_hardware::DeviceResolver)
//! and [`StatusSource`](cockpit_journal::StatusSource) they use, so they run
//! against the mocks in `cockpit_hardware::mock` and `cockpit_journal::mock`
//! in tests.

pub mod host;
pub mod state_machine;

pub use host::{
    Cadence, ControlRequest, HostConfig, HostExit, ServiceHost, ServiceState, ServiceStatus,
};
pub use state_machine::{ConnectionStateMachine, ConnectionStateMachineBuilder, StepOutcome};
