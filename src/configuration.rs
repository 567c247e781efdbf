//! Bridge configuration.
//!
//! Loaded once at startup from a JSON document:
//!
//! ```json
//! {
//!   "connection": "ip:localhost:6720",
//!   "devices": [
//!     {"name": "Lamp", "type": "fixture", "channel": [1, 2, 3],
//!      "attributes": {"binary": "0/0/1", "dimmable": "0/0/2"}}
//!   ]
//! }
//! ```

use crate::addressing::channel::ChannelRepr;
use crate::addressing::Channel;
use crate::error::{KnxError, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

/// Endpoint used when the document names none.
pub const DEFAULT_CONNECTION: &str = "ip:localhost";

fn default_connection() -> String {
    DEFAULT_CONNECTION.to_string()
}

/// Top-level configuration document.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    /// knxd endpoint URL (`ip:host[:port]` or `local:path`).
    pub connection: String,
    /// Devices in declaration order.
    pub devices: Vec<DeviceDescriptor>,
}

/// One configured device.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceDescriptor {
    pub name: String,
    /// `"fixture"` or `"shutter"`; anything else is skipped.
    pub kind: String,
    pub channel: Channel,
    /// Type-specific group addresses and flags.
    pub attributes: Map<String, Value>,
}

// Document shape as written; channel text is validated afterwards so that a
// bad channel surfaces as an addressing error rather than a syntax error.
#[derive(Deserialize)]
struct RawConfig {
    #[serde(default = "default_connection")]
    connection: String,
    #[serde(default)]
    devices: Vec<RawDevice>,
}

#[derive(Deserialize)]
struct RawDevice {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    channel: ChannelRepr,
    #[serde(default)]
    attributes: Map<String, Value>,
}

impl RawDevice {
    fn validate(self) -> Result<DeviceDescriptor> {
        Ok(DeviceDescriptor {
            channel: self.channel.into_channel()?,
            name: self.name,
            kind: self.kind,
            attributes: self.attributes,
        })
    }
}

impl BridgeConfig {
    /// Read and parse the file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| KnxError::config_io(format!("{}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    /// Parse a configuration document.
    ///
    /// # Errors
    ///
    /// A configuration error for unreadable JSON or a wrong document shape,
    /// an addressing error for a malformed `"a/b/c"` channel.
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: RawConfig =
            serde_json::from_str(text).map_err(|e| KnxError::config_syntax(e.to_string()))?;
        let devices = raw
            .devices
            .into_iter()
            .map(RawDevice::validate)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            connection: raw.connection,
            devices,
        })
    }
}
