//! Host message interface.
//!
//! The host exchanges small JSON objects with the bridge, discriminated by
//! their `action` field:
//!
//! - inbound [`HostCommand`]: `{"action":"query"}` and
//!   `{"action":"write","channel":"1/2/3","payload":true}`
//! - outbound [`OutgoingMessage`]: `announce` for discovery, `state` for
//!   device state
//!
//! Outgoing messages are queued on an [`Outbox`], a cheap clonable handle
//! shared by the router and every listener task.

use crate::addressing::Channel;
use crate::device::shutter::ShutterCommand;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

/// Command received from the host.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum HostCommand {
    /// Announce every configured device.
    Query,
    /// Forward `payload` to the device on `channel`.
    Write {
        #[serde(default)]
        channel: Option<Channel>,
        #[serde(default)]
        payload: Value,
    },
    /// Any other action. Ignored.
    #[serde(other)]
    Unknown,
}

impl HostCommand {
    /// Parse one JSON command.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error for anything that is not a command
    /// object.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// Message sent to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum OutgoingMessage {
    /// Discovery response for one device.
    Announce {
        #[serde(rename = "type")]
        kind: &'static str,
        name: String,
        channel: Channel,
        attributes: Vec<String>,
    },
    /// Current state of one device.
    State {
        channel: Channel,
        payload: StatePayload,
    },
}

impl OutgoingMessage {
    /// Encode as a single JSON line.
    ///
    /// # Errors
    ///
    /// Serialization of these types only fails on I/O, which cannot happen
    /// for an in-memory string.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// `payload` of a state message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StatePayload {
    /// Non-dimmable fixture.
    Switch(bool),
    /// Dimmable fixture.
    Level(u8),
    /// Shutter; `null` until the first command.
    Position(Option<ShutterCommand>),
}

/// Producer side of the host-bound queue.
#[derive(Debug, Clone)]
pub struct Outbox {
    sender: mpsc::UnboundedSender<OutgoingMessage>,
}

impl Outbox {
    /// Create an outbox and the receiver the host side drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<OutgoingMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Queue `message`. Dropped with a warning once the host side is gone.
    pub fn post(&self, message: OutgoingMessage) {
        if let Err(mpsc::error::SendError(message)) = self.sender.send(message) {
            log::warn!("host queue closed, dropping {message:?}");
        }
    }
}
