//! Mock bus for testing.
//!
//! [`MockBus`] implements the transport traits entirely in memory, so bridge
//! logic can be exercised without a knxd daemon:
//!
//! - frames can be injected on any group address and reach every listener
//!   opened for it, in FIFO order
//! - every write is recorded, and by default echoed back to listeners of the
//!   destination group the way a real bus reports a telegram to all members
//! - connect and write failures can be simulated
//!
//! Clones share the same bus.
//!
//! ## Example
//!
//! ```
//! use knx_bridge::net::mock_transport::MockBus;
//! use knx_bridge::net::transport::{BusConnection, BusConnector};
//! use knx_bridge::ga;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> knx_bridge::Result<()> {
//! let bus = MockBus::new();
//! let mut listener = bus.connect().await?;
//! listener.open_group_listener(ga!(0/0/1)).await?;
//!
//! assert_eq!(bus.inject(ga!(0/0/1), &[0x00, 0x81]), 1);
//!
//! let mut buf = [0u8; 8];
//! let (len, _source) = listener.read_frame(&mut buf).await?;
//! assert_eq!(&buf[..len], &[0x00, 0x81]);
//! # Ok(())
//! # }
//! ```

use crate::addressing::{GroupAddress, IndividualAddress};
use crate::error::{KnxError, Result};
use crate::net::transport::{BusConnection, BusConnector};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, Notify};

type Delivery = (Vec<u8>, IndividualAddress);

/// Source reported for injected frames (1.1.250)
pub const INJECTED_SOURCE: u16 = 0x11FA;

/// Source reported for echoed writes (0.0.0)
pub const ECHO_SOURCE: u16 = 0x0000;

#[derive(Debug)]
struct MockState {
    listeners: HashMap<GroupAddress, Vec<mpsc::UnboundedSender<Delivery>>>,
    written: Vec<(GroupAddress, Vec<u8>)>,
    connections: usize,
    echo: bool,
    fail_connect: bool,
    fail_writes: bool,
    closed: bool,
}

impl MockState {
    fn deliver(&mut self, destination: GroupAddress, source: IndividualAddress, frame: &[u8]) -> usize {
        let Some(senders) = self.listeners.get_mut(&destination) else {
            return 0;
        };
        senders.retain(|sender| sender.send((frame.to_vec(), source)).is_ok());
        senders.len()
    }
}

/// In-memory bus shared by all of its connections.
#[derive(Debug, Clone)]
pub struct MockBus {
    state: Arc<Mutex<MockState>>,
    listeners_changed: Arc<Notify>,
}

impl Default for MockBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBus {
    /// Create an empty bus with write echo enabled.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                listeners: HashMap::new(),
                written: Vec::new(),
                connections: 0,
                echo: true,
                fail_connect: false,
                fail_writes: false,
                closed: false,
            })),
            listeners_changed: Arc::new(Notify::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deliver `frame` to every listener of `destination`.
    ///
    /// Returns how many listeners received it.
    pub fn inject(&self, destination: GroupAddress, frame: &[u8]) -> usize {
        self.inject_from(destination, IndividualAddress::from(INJECTED_SOURCE), frame)
    }

    /// Like [`inject`](Self::inject) with an explicit sender.
    pub fn inject_from(
        &self,
        destination: GroupAddress,
        source: IndividualAddress,
        frame: &[u8],
    ) -> usize {
        self.lock().deliver(destination, source, frame)
    }

    /// Every successful write so far, in order.
    pub fn written(&self) -> Vec<(GroupAddress, Vec<u8>)> {
        self.lock().written.clone()
    }

    /// Number of connections opened so far.
    pub fn connections(&self) -> usize {
        self.lock().connections
    }

    /// Number of live listeners on `address`.
    pub fn listener_count(&self, address: GroupAddress) -> usize {
        self.lock()
            .listeners
            .get(&address)
            .map_or(0, |senders| senders.iter().filter(|s| !s.is_closed()).count())
    }

    /// Wait until at least `count` listeners are open on `address`.
    pub async fn wait_for_listeners(&self, address: GroupAddress, count: usize) {
        loop {
            let notified = self.listeners_changed.notified();
            if self.listener_count(address) >= count {
                return;
            }
            notified.await;
        }
    }

    /// Echo writes back to listeners of the destination (default on).
    pub fn set_echo(&self, echo: bool) {
        self.lock().echo = echo;
    }

    /// Make subsequent connects fail.
    pub fn set_fail_connect(&self, fail: bool) {
        self.lock().fail_connect = fail;
    }

    /// Make subsequent writes fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Whether [`BusConnector::close`] was called.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

impl BusConnector for MockBus {
    type Connection = MockConnection;

    async fn connect(&self) -> Result<MockConnection> {
        {
            let mut state = self.lock();
            if state.closed {
                return Err(KnxError::transport_closed());
            }
            if state.fail_connect {
                return Err(KnxError::connect_failed());
            }
            state.connections += 1;
        }
        Ok(MockConnection {
            bus: self.clone(),
            incoming: None,
        })
    }

    fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        // Dropping the senders ends every pending read
        state.listeners.clear();
    }
}

/// Connection to a [`MockBus`].
#[derive(Debug)]
pub struct MockConnection {
    bus: MockBus,
    incoming: Option<mpsc::UnboundedReceiver<Delivery>>,
}

impl BusConnection for MockConnection {
    async fn open_group_listener(&mut self, address: GroupAddress) -> Result<()> {
        if self.incoming.is_some() {
            return Err(KnxError::invalid_state());
        }
        let (sender, receiver) = mpsc::unbounded_channel();
        {
            let mut state = self.bus.lock();
            if state.closed {
                return Err(KnxError::transport_closed());
            }
            state.listeners.entry(address).or_default().push(sender);
        }
        self.incoming = Some(receiver);
        self.bus.listeners_changed.notify_waiters();
        Ok(())
    }

    async fn read_frame(&mut self, buf: &mut [u8]) -> Result<(usize, IndividualAddress)> {
        let incoming = self.incoming.as_mut().ok_or_else(KnxError::invalid_state)?;
        match incoming.recv().await {
            Some((frame, source)) => {
                let len = frame.len().min(buf.len());
                buf[..len].copy_from_slice(&frame[..len]);
                Ok((len, source))
            }
            None => Err(KnxError::transport_closed()),
        }
    }

    async fn write_frame(&mut self, destination: GroupAddress, apdu: &[u8]) -> Result<()> {
        let mut state = self.bus.lock();
        if state.closed {
            return Err(KnxError::transport_closed());
        }
        if state.fail_writes {
            return Err(KnxError::write_failed());
        }
        state.written.push((destination, apdu.to_vec()));
        if state.echo {
            state.deliver(destination, IndividualAddress::from(ECHO_SOURCE), apdu);
        }
        Ok(())
    }
}
