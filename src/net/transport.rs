//! Bus transport abstraction.
//!
//! The bridge never talks to a socket directly. Listener tasks and the shared
//! writer go through these two traits, so the knxd client and the in-memory
//! mock bus are interchangeable:
//!
//! - [`BusConnector`] opens independent connections to the bus
//! - [`BusConnection`] is one such connection: it either listens on a single
//!   group address or writes to arbitrary groups
//!
//! ## Example
//!
//! ```
//! use knx_bridge::net::mock_transport::MockBus;
//! use knx_bridge::net::transport::{BusConnection, BusConnector};
//! use knx_bridge::{ga, protocol::apdu};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> knx_bridge::Result<()> {
//! let bus = MockBus::new();
//! let mut connection = bus.connect().await?;
//! connection.write_frame(ga!(1/2/3), &apdu::encode_bool(true)).await?;
//! assert_eq!(bus.written(), vec![(ga!(1/2/3), vec![0x00, 0x81])]);
//! # Ok(())
//! # }
//! ```

use crate::addressing::{GroupAddress, IndividualAddress};
use crate::error::Result;
use core::future::Future;

/// Factory for bus connections.
///
/// One connector is shared by every listener task and the writer, hence the
/// `Sync` bound.
pub trait BusConnector: Send + Sync + 'static {
    /// Connection type produced by [`connect`](Self::connect).
    type Connection: BusConnection;

    /// Open a fresh connection.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the bus daemon cannot be reached.
    fn connect(&self) -> impl Future<Output = Result<Self::Connection>> + Send;

    /// Shut the transport down.
    ///
    /// Every read pending on a connection from this connector must complete
    /// with a `Closed` transport error. This is what lets blocked listeners
    /// observe the interruption signal.
    fn close(&self) {}
}

/// One association with the bus.
pub trait BusConnection: Send + 'static {
    /// Associate this connection with `address` so that
    /// [`read_frame`](Self::read_frame) yields telegrams sent to it.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the association is refused.
    fn open_group_listener(&mut self, address: GroupAddress)
        -> impl Future<Output = Result<()>> + Send;

    /// Block until the next APDU arrives.
    ///
    /// The APDU is copied into `buf` (truncated to its length). Returns the
    /// number of bytes copied and the sender.
    ///
    /// # Errors
    ///
    /// Returns a transport error on I/O failure or when the transport is
    /// closed.
    fn read_frame(
        &mut self,
        buf: &mut [u8],
    ) -> impl Future<Output = Result<(usize, IndividualAddress)>> + Send;

    /// Send an APDU to `destination`.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the APDU could not be handed to the bus.
    fn write_frame(
        &mut self,
        destination: GroupAddress,
        apdu: &[u8],
    ) -> impl Future<Output = Result<()>> + Send;
}
