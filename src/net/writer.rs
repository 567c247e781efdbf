//! Shared outbound connection.
//!
//! Host commands can arrive for any device at any time, but opening a bus
//! connection per write is wasteful. [`BusWriter`] keeps one connection
//! behind an async mutex, opens it on first use and throws it away after a
//! failed write so the next write starts from a fresh connection.

use crate::addressing::GroupAddress;
use crate::error::Result;
use crate::net::transport::{BusConnection, BusConnector};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Serialised writer over a lazily opened connection.
pub struct BusWriter<C: BusConnector> {
    connector: Arc<C>,
    connection: Mutex<Option<C::Connection>>,
}

impl<C: BusConnector> core::fmt::Debug for BusWriter<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BusWriter").finish_non_exhaustive()
    }
}

impl<C: BusConnector> BusWriter<C> {
    /// Create a writer. Nothing is opened until the first write.
    pub fn new(connector: Arc<C>) -> Self {
        Self {
            connector,
            connection: Mutex::new(None),
        }
    }

    /// Send `apdu` to `destination`.
    ///
    /// # Errors
    ///
    /// Returns the transport error of the connect or the write. The
    /// connection involved is dropped in that case.
    pub async fn write(&self, destination: GroupAddress, apdu: &[u8]) -> Result<()> {
        let mut slot = self.connection.lock().await;
        let mut connection = match slot.take() {
            Some(connection) => connection,
            None => self.connector.connect().await?,
        };
        connection.write_frame(destination, apdu).await?;
        log::trace!("wrote {apdu:02x?} to {destination}");
        *slot = Some(connection);
        Ok(())
    }
}
