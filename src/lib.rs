#![doc = include_str!("../README.md")]

//! ## Library layout
//!
//! - [`addressing`]: group addresses, individual addresses, host channels
//! - [`protocol`]: APDU codec and the knxd client wire format
//! - [`net`]: transport traits, the knxd client, the mock bus, the shared writer
//! - [`device`], [`registry`], [`router`], [`listener`]: device logic
//! - [`bridge`]: everything above wired together
//!
//! ## Example
//!
//! ```
//! use knx_bridge::{Bridge, BridgeConfig, HostCommand, MockBus, Outbox};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> knx_bridge::Result<()> {
//! let config = BridgeConfig::from_json(r#"{"devices": [
//!     {"name": "Lamp", "type": "fixture", "channel": [1, 2, 3],
//!      "attributes": {"binary": "0/0/1"}}
//! ]}"#)?;
//! let (outbox, mut messages) = Outbox::channel();
//! let bridge = Bridge::start(&config, MockBus::new(), outbox)?;
//!
//! bridge.handle(HostCommand::Query).await;
//! let announce = messages.recv().await.unwrap();
//! assert_eq!(
//!     announce.to_json().unwrap(),
//!     r#"{"action":"announce","type":"Fixture","name":"Lamp","channel":"1/2/3","attributes":["binary"]}"#
//! );
//! bridge.shutdown().await;
//! # Ok(())
//! # }
//! ```

// Macro modules (must be declared before use)
#[macro_use]
pub mod macros;

pub mod addressing;
pub mod bridge;
pub mod configuration;
pub mod device;
pub mod error;
pub mod listener;
pub mod message;
pub mod net;
pub mod protocol;
pub mod registry;
pub mod router;

// Re-export commonly used types
#[doc(inline)]
pub use addressing::{Channel, GroupAddress, IndividualAddress};
#[doc(inline)]
pub use bridge::Bridge;
#[doc(inline)]
pub use configuration::{BridgeConfig, DeviceDescriptor};
#[doc(inline)]
pub use device::{Device, ShutterCommand};
#[doc(inline)]
pub use error::{KnxError, Result};
#[doc(inline)]
pub use message::{HostCommand, OutgoingMessage, Outbox, StatePayload};
#[doc(inline)]
pub use net::{KnxdConnector, MockBus};
