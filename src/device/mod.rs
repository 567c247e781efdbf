//! Configured devices.
//!
//! A [`Device`] couples the host-facing identity (name, channel, attribute
//! keys) with one of the supported variants:
//!
//! - [`Fixture`]: switched or dimmed light, state confirmed by the bus
//! - [`Shutter`]: up/down/stop covering, state reported optimistically

pub mod fixture;
pub mod shutter;

pub use fixture::Fixture;
pub use shutter::{Shutter, ShutterCommand};

use crate::addressing::{Channel, GroupAddress};
use crate::configuration::DeviceDescriptor;
use crate::error::{KnxError, Result};
use crate::message::{OutgoingMessage, Outbox};
use crate::net::transport::BusConnector;
use crate::net::writer::BusWriter;
use crate::protocol::apdu::ApduEvent;
use serde_json::{Map, Value};

/// Which of a fixture's groups a listener is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerRole {
    Binary,
    Dimmable,
}

/// Device variant with its own state.
#[derive(Debug)]
pub enum DeviceKind {
    Fixture(Fixture),
    Shutter(Shutter),
}

/// A configured device.
#[derive(Debug)]
pub struct Device {
    name: String,
    channel: Channel,
    attributes: Vec<String>,
    kind: DeviceKind,
}

impl Device {
    pub fn new(
        name: impl Into<String>,
        channel: Channel,
        attributes: Vec<String>,
        kind: DeviceKind,
    ) -> Self {
        Self {
            name: name.into(),
            channel,
            attributes,
            kind,
        }
    }

    /// Build a device from its configuration entry.
    ///
    /// Returns `Ok(None)` for an unsupported type tag.
    ///
    /// # Errors
    ///
    /// Returns an addressing error for a malformed group address and a
    /// configuration error for a missing one.
    pub fn from_descriptor(descriptor: &DeviceDescriptor) -> Result<Option<Self>> {
        let name = descriptor.name.as_str();
        let kind = match descriptor.kind.as_str() {
            "fixture" => DeviceKind::Fixture(Fixture::from_attributes(name, &descriptor.attributes)?),
            "shutter" => DeviceKind::Shutter(Shutter::from_attributes(name, &descriptor.attributes)?),
            other => {
                log::warn!("skipping {name}: unsupported device type {other:?}");
                return Ok(None);
            }
        };
        let attributes = descriptor.attributes.keys().cloned().collect();
        Ok(Some(Self::new(name, descriptor.channel, attributes, kind)))
    }

    /// Type tag reported on discovery.
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            DeviceKind::Fixture(_) => "Fixture",
            DeviceKind::Shutter(_) => "Shutter",
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Configured attribute keys, without their values.
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn kind(&self) -> &DeviceKind {
        &self.kind
    }

    /// Discovery message for this device.
    pub fn announcement(&self) -> OutgoingMessage {
        OutgoingMessage::Announce {
            kind: self.type_name(),
            name: self.name.clone(),
            channel: self.channel,
            attributes: self.attributes.clone(),
        }
    }

    /// Apply a host value.
    ///
    /// Unsupported values are ignored.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the bus write failed.
    pub async fn set<C: BusConnector>(
        &self,
        value: &Value,
        writer: &BusWriter<C>,
        outbox: &Outbox,
    ) -> Result<()> {
        match &self.kind {
            DeviceKind::Fixture(fixture) => fixture.set(value, writer).await,
            DeviceKind::Shutter(shutter) => shutter.set(value, self.channel, writer, outbox).await,
        }
    }

    /// Emit the current state.
    pub async fn send_update(&self, outbox: &Outbox) {
        match &self.kind {
            DeviceKind::Fixture(fixture) => fixture.send_update(self.channel, outbox).await,
            DeviceKind::Shutter(shutter) => shutter.send_update(self.channel, outbox).await,
        }
    }

    /// Groups that need a listener task.
    pub fn listen_addresses(&self) -> Vec<(GroupAddress, ListenerRole)> {
        match &self.kind {
            DeviceKind::Fixture(fixture) => {
                let mut addresses = vec![(fixture.binary(), ListenerRole::Binary)];
                if let Some(dimmable) = fixture.dimmable() {
                    addresses.push((dimmable, ListenerRole::Dimmable));
                }
                addresses
            }
            DeviceKind::Shutter(_) => Vec::new(),
        }
    }

    /// Apply an event decoded by a listener.
    pub async fn on_bus_event(&self, role: ListenerRole, event: ApduEvent, outbox: &Outbox) {
        if let DeviceKind::Fixture(fixture) = &self.kind {
            fixture.on_bus_event(role, event, self.channel, outbox).await;
        }
    }
}

/// Look up a group address attribute that must be present.
pub(crate) fn required_address(
    name: &str,
    attributes: &Map<String, Value>,
    key: &str,
) -> Result<GroupAddress> {
    match attributes.get(key) {
        Some(Value::String(text)) => text.parse(),
        Some(_) => Err(KnxError::invalid_group_address()),
        None => Err(KnxError::missing_attribute(format!("{name}: {key}"))),
    }
}
