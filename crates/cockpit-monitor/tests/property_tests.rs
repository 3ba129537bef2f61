//! Property-based tests for the polling state machine.
//!
//! Arbitrary sequences of samples, read failures and write failures are fed
//! through the state machine and checked against a small reference model of
//! the change detection and the error budget.

use cockpit_core::{Config, ControllerMessage, Snapshot};
use cockpit_hardware::mock::MockResolver;
use cockpit_journal::mock::MockStatusSource;
use cockpit_monitor::{ConnectionStateMachine, StepOutcome};
use proptest::prelude::*;

/// One tick's worth of scripted behavior.
#[derive(Debug, Clone)]
enum Tick {
    /// The status file can't be read.
    ReadFailure,
    /// A sample is available; `fail_send` makes the write fail if one happens.
    Sample {
        timestamp: u8,
        system: u8,
        fail_send: bool,
    },
}

/// Strategy for ticks. A small value space makes repeats (no change) common.
fn tick() -> impl Strategy<Value = Tick> {
    prop_oneof![
        1 => Just(Tick::ReadFailure),
        4 => (0u8..3, 0u8..3, prop::bool::weighted(0.2)).prop_map(
            |(timestamp, system, fail_send)| Tick::Sample {
                timestamp,
                system,
                fail_send,
            }
        ),
    ]
}

/// Reference model of the state machine's change detection and error budget.
#[derive(Debug, Default)]
struct Model {
    last: Option<(u8, u8)>,
    errors: u32,
    sent: Vec<(u8, u8)>,
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: sends happen exactly on changes, errors reset on every clean
    /// step, and the machine gives up only after more than 20 failures in a
    /// row.
    #[test]
    fn prop_matches_reference_model(ticks in prop::collection::vec(tick(), 0..120)) {
        let (resolver, link) = MockResolver::new();
        let (source, status) = MockStatusSource::new();
        let mut machine =
            ConnectionStateMachine::new(resolver, source, Config::new("COM3", 9600, "logs"));
        let mut model = Model::default();

        for tick in ticks {
            if model.errors > 20 {
                prop_assert!(machine.step().is_fatal());
                return Ok(());
            }

            match tick {
                Tick::ReadFailure => {
                    status.fail_next_status_reads(1);
                    model.errors += 1;
                }
                Tick::Sample { timestamp, system, fail_send } => {
                    status.set_status(Snapshot::new(format!("T{timestamp}")));
                    status.set_location(format!("S{system}"));

                    let sample = (timestamp, system);
                    if model.last == Some(sample) {
                        model.errors = 0;
                    } else if fail_send {
                        link.fail_next_sends(1);
                        model.errors += 1;
                        model.last = None;
                    } else {
                        model.errors = 0;
                        model.last = Some(sample);
                        model.sent.push(sample);
                    }
                }
            }

            prop_assert_eq!(machine.step(), StepOutcome::Progressed);
            prop_assert_eq!(machine.consecutive_errors(), model.errors);
        }

        let sent: Vec<(String, String)> = link
            .sent_payloads()
            .iter()
            .map(|bytes| ControllerMessage::from_slice(bytes).unwrap())
            .map(|message| (message.timestamp, message.star_system))
            .collect();
        let expected: Vec<(String, String)> = model
            .sent
            .iter()
            .map(|(timestamp, system)| (format!("T{timestamp}"), format!("S{system}")))
            .collect();
        prop_assert_eq!(sent, expected);
    }

    /// Property: any run of at most 20 failures is survivable.
    #[test]
    fn prop_short_failure_runs_are_never_fatal(failures in 0u32..=20, extra in 0u32..50) {
        let (resolver, _) = MockResolver::new();
        let (source, status) = MockStatusSource::new();
        status.set_status(Snapshot::new("T0"));
        status.set_location("Sol");
        status.fail_next_status_reads(failures);
        let mut machine =
            ConnectionStateMachine::new(resolver, source, Config::new("COM3", 9600, "logs"));

        for _ in 0..(failures + 1 + extra) {
            prop_assert_eq!(machine.step(), StepOutcome::Progressed);
        }
        prop_assert_eq!(machine.consecutive_errors(), 0);
    }
}
