//! Per-group listener tasks.
//!
//! Every fixture group gets its own task and its own bus connection. The
//! task decodes each telegram and feeds write events to the device. Decode
//! failures are logged and skipped; a transport failure ends the task.
//!
//! The shutdown token is only checked between reads. A read that is already
//! pending is ended by closing the connector.

use crate::addressing::GroupAddress;
use crate::device::{Device, ListenerRole};
use crate::error::Result;
use crate::message::Outbox;
use crate::net::transport::{BusConnection, BusConnector};
use crate::protocol::apdu::{self, MAX_FRAME_LEN};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Everything one listener task needs.
#[derive(Debug)]
pub struct Listener<C> {
    pub connector: Arc<C>,
    pub device: Arc<Device>,
    pub address: GroupAddress,
    pub role: ListenerRole,
    pub outbox: Outbox,
    pub shutdown: CancellationToken,
}

impl<C: BusConnector> Listener<C> {
    /// Run on a new tokio task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let name = self.device.name().to_string();
            let address = self.address;
            match self.run().await {
                Ok(()) => log::debug!("listener {name} on {address} stopped"),
                Err(e) if e.is_closed() => log::debug!("listener {name} on {address} closed"),
                Err(e) => log::error!("listener {name} on {address} failed: {e}"),
            }
        })
    }

    /// Listen until shutdown or a transport error.
    ///
    /// # Errors
    ///
    /// Returns the transport error that ended the loop.
    pub async fn run(self) -> Result<()> {
        let mut connection = self.connector.connect().await?;
        connection.open_group_listener(self.address).await?;
        log::debug!("listening for {} on {}", self.device.name(), self.address);

        let mut buf = [0u8; MAX_FRAME_LEN];
        while !self.shutdown.is_cancelled() {
            let (len, source) = connection.read_frame(&mut buf).await?;
            let frame = &buf[..len];
            log::trace!("{} <- {source}: {frame:02x?}", self.address);

            match apdu::decode(frame) {
                Ok(Some(event)) => self.device.on_bus_event(self.role, event, &self.outbox).await,
                Ok(None) => {}
                Err(e) => log::warn!("{} from {source}: {e}", self.address),
            }
        }
        Ok(())
    }
}
