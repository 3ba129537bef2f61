//! Mock resolver and link for testing without a controller attached.
//!
//! The resolver and every link it opens share one simulated bus. A
//! [`MockResolverHandle`] scripts that bus (plug or unplug the device, make
//! the next opens or sends fail) and inspects what was written.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{LinkError, Result};
use crate::traits::{DeviceResolver, SerialLink};

/// A payload written through a mock link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentFrame {
    /// Sequence number of the link that carried the payload (1 for the
    /// first link opened).
    pub link_id: u64,

    /// Bytes written.
    pub bytes: Vec<u8>,
}

#[derive(Debug)]
struct MockBus {
    port_name: String,
    present: bool,
    presence_error: Option<String>,
    open_failures: VecDeque<String>,
    send_failures: u32,
    open_attempts: u32,
    opened: u64,
    closed: u64,
    presence_queries: u32,
    last_baud_rate: Option<u32>,
    sent: Vec<SentFrame>,
}

type SharedBus = Arc<Mutex<MockBus>>;

fn lock(bus: &SharedBus) -> MutexGuard<'_, MockBus> {
    bus.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock device resolver.
///
/// The simulated device starts attached. Any device identifier resolves to
/// it while it is attached.
///
/// # Examples
///
/// ```
/// use cockpit_hardware::mock::MockResolver;
/// use cockpit_hardware::traits::{DeviceResolver, SerialLink};
///
/// let (resolver, handle) = MockResolver::new();
///
/// let mut link = resolver.open("COM3", 9600).unwrap();
/// link.send(b"{}").unwrap();
/// assert_eq!(handle.sent_payloads(), vec![b"{}".to_vec()]);
///
/// handle.unplug();
/// assert!(!resolver.is_present("COM3").unwrap());
/// assert!(resolver.open("COM3", 9600).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct MockResolver {
    bus: SharedBus,
}

impl MockResolver {
    /// Create a new mock resolver with the default port name.
    pub fn new() -> (Self, MockResolverHandle) {
        Self::with_port_name("MOCK0")
    }

    /// Create a new mock resolver whose links report `port_name`.
    pub fn with_port_name(port_name: impl Into<String>) -> (Self, MockResolverHandle) {
        let bus = Arc::new(Mutex::new(MockBus {
            port_name: port_name.into(),
            present: true,
            presence_error: None,
            open_failures: VecDeque::new(),
            send_failures: 0,
            open_attempts: 0,
            opened: 0,
            closed: 0,
            presence_queries: 0,
            last_baud_rate: None,
            sent: Vec::new(),
        }));

        let resolver = Self {
            bus: Arc::clone(&bus),
        };
        let handle = MockResolverHandle { bus };

        (resolver, handle)
    }
}

impl DeviceResolver for MockResolver {
    type Link = MockLink;

    fn is_present(&self, _device_id: &str) -> Result<bool> {
        let mut bus = lock(&self.bus);
        bus.presence_queries += 1;
        match &bus.presence_error {
            Some(message) => Err(LinkError::enumeration(message.clone())),
            None => Ok(bus.present),
        }
    }

    fn open(&self, device_id: &str, baud_rate: u32) -> Result<Self::Link> {
        let mut bus = lock(&self.bus);
        bus.open_attempts += 1;
        if !bus.present {
            return Err(LinkError::not_found(device_id));
        }
        if let Some(message) = bus.open_failures.pop_front() {
            return Err(LinkError::open_failed(bus.port_name.clone(), message));
        }

        bus.opened += 1;
        bus.last_baud_rate = Some(baud_rate);

        Ok(MockLink {
            id: bus.opened,
            port_name: bus.port_name.clone(),
            bus: Arc::clone(&self.bus),
        })
    }
}

/// Link opened by a [`MockResolver`].
#[derive(Debug)]
pub struct MockLink {
    id: u64,
    port_name: String,
    bus: SharedBus,
}

impl MockLink {
    /// Sequence number of this link.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl SerialLink for MockLink {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let mut bus = lock(&self.bus);
        if !bus.present {
            return Err(LinkError::disconnected(self.port_name.clone()));
        }
        if bus.send_failures > 0 {
            bus.send_failures -= 1;
            return Err(LinkError::send_failed("simulated write failure"));
        }

        bus.sent.push(SentFrame {
            link_id: self.id,
            bytes: bytes.to_vec(),
        });
        Ok(())
    }

    fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl Drop for MockLink {
    fn drop(&mut self) {
        lock(&self.bus).closed += 1;
    }
}

/// Handle for scripting and inspecting a [`MockResolver`].
///
/// Cloning the handle shares the same simulated bus.
#[derive(Debug, Clone)]
pub struct MockResolverHandle {
    bus: SharedBus,
}

impl MockResolverHandle {
    /// Attach the simulated device.
    pub fn plug(&self) {
        lock(&self.bus).present = true;
    }

    /// Detach the simulated device. Opens fail and open links stop
    /// accepting writes.
    pub fn unplug(&self) {
        lock(&self.bus).present = false;
    }

    /// Make presence queries fail with `message` (or succeed again with
    /// `None`).
    pub fn set_presence_error(&self, message: Option<&str>) {
        lock(&self.bus).presence_error = message.map(str::to_string);
    }

    /// Make the next open attempt fail with `message`.
    pub fn fail_next_open(&self, message: impl Into<String>) {
        lock(&self.bus).open_failures.push_back(message.into());
    }

    /// Make the next `count` writes fail.
    pub fn fail_next_sends(&self, count: u32) {
        lock(&self.bus).send_failures += count;
    }

    /// Every payload written so far, with the link that carried it.
    pub fn sent_frames(&self) -> Vec<SentFrame> {
        lock(&self.bus).sent.clone()
    }

    /// Every payload written so far.
    pub fn sent_payloads(&self) -> Vec<Vec<u8>> {
        lock(&self.bus)
            .sent
            .iter()
            .map(|frame| frame.bytes.clone())
            .collect()
    }

    /// Number of open calls, successful or not.
    pub fn open_attempts(&self) -> u32 {
        lock(&self.bus).open_attempts
    }

    /// Number of links opened.
    pub fn open_count(&self) -> u64 {
        lock(&self.bus).opened
    }

    /// Number of links dropped.
    pub fn close_count(&self) -> u64 {
        lock(&self.bus).closed
    }

    /// Number of presence queries made.
    pub fn presence_queries(&self) -> u32 {
        lock(&self.bus).presence_queries
    }

    /// Baud rate passed to the most recent successful open.
    pub fn last_baud_rate(&self) -> Option<u32> {
        lock(&self.bus).last_baud_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_and_send() {
        let (resolver, handle) = MockResolver::with_port_name("COM9");

        let mut link = resolver.open("any", 115200).unwrap();
        assert_eq!(link.port_name(), "COM9");
        assert_eq!(link.id(), 1);

        link.send(b"abc").unwrap();
        assert_eq!(
            handle.sent_frames(),
            vec![SentFrame {
                link_id: 1,
                bytes: b"abc".to_vec()
            }]
        );
        assert_eq!(handle.last_baud_rate(), Some(115200));
    }

    #[test]
    fn test_unplugged_device() {
        let (resolver, handle) = MockResolver::new();
        let mut link = resolver.open("dev", 9600).unwrap();

        handle.unplug();

        assert!(!resolver.is_present("dev").unwrap());
        assert!(matches!(
            resolver.open("dev", 9600),
            Err(LinkError::NotFound { .. })
        ));
        assert!(matches!(
            link.send(b"x"),
            Err(LinkError::Disconnected { .. })
        ));

        handle.plug();
        assert!(resolver.is_present("dev").unwrap());
        assert_eq!(handle.presence_queries(), 2);
    }

    #[test]
    fn test_scripted_open_failure() {
        let (resolver, handle) = MockResolver::new();
        handle.fail_next_open("Access is denied");

        let result = resolver.open("dev", 9600);
        assert!(matches!(result, Err(LinkError::OpenFailed { .. })));

        assert!(resolver.open("dev", 9600).is_ok());
        assert_eq!(handle.open_count(), 1);
        assert_eq!(handle.open_attempts(), 2);
    }

    #[test]
    fn test_scripted_send_failures() {
        let (resolver, handle) = MockResolver::new();
        let mut link = resolver.open("dev", 9600).unwrap();
        handle.fail_next_sends(2);

        assert!(link.send(b"1").is_err());
        assert!(link.send(b"2").is_err());
        assert!(link.send(b"3").is_ok());
        assert_eq!(handle.sent_payloads(), vec![b"3".to_vec()]);
    }

    #[test]
    fn test_presence_error() {
        let (resolver, handle) = MockResolver::new();
        handle.set_presence_error(Some("WMI unavailable"));

        assert!(matches!(
            resolver.is_present("dev"),
            Err(LinkError::EnumerationFailed { .. })
        ));

        handle.set_presence_error(None);
        assert!(resolver.is_present("dev").unwrap());
    }

    #[test]
    fn test_drop_releases_link() {
        let (resolver, handle) = MockResolver::new();
        let first = resolver.open("dev", 9600).unwrap();
        let second = resolver.open("dev", 9600).unwrap();
        assert_eq!(second.id(), 2);

        drop(first);
        assert_eq!(handle.close_count(), 1);
        drop(second);
        assert_eq!(handle.close_count(), 2);
    }
}
