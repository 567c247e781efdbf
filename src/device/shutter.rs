//! Motorised shutter driven through short and long press groups.
//!
//! No group is listened to, so the reported position is whatever the host
//! last commanded successfully.

use super::required_address;
use crate::addressing::{Channel, GroupAddress};
use crate::error::Result;
use crate::message::{OutgoingMessage, Outbox, StatePayload};
use crate::net::transport::BusConnector;
use crate::net::writer::BusWriter;
use crate::protocol::apdu;
use core::fmt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

/// Movement command, also the reported state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShutterCommand {
    Up,
    Down,
    Stop,
}

impl ShutterCommand {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Stop => "stop",
        }
    }
}

impl fmt::Display for ShutterCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for ShutterCommand {
    type Err = ();

    fn from_str(s: &str) -> core::result::Result<Self, ()> {
        match s {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "stop" => Ok(Self::Stop),
            _ => Err(()),
        }
    }
}

/// Shutter addresses and last commanded position.
#[derive(Debug)]
pub struct Shutter {
    short: GroupAddress,
    long: GroupAddress,
    current: Mutex<Option<ShutterCommand>>,
}

impl Shutter {
    pub fn new(short: GroupAddress, long: GroupAddress) -> Self {
        Self {
            short,
            long,
            current: Mutex::new(None),
        }
    }

    /// Build from the `short` and `long` configuration attributes.
    pub(crate) fn from_attributes(name: &str, attributes: &Map<String, Value>) -> Result<Self> {
        let short = required_address(name, attributes, "short")?;
        let long = required_address(name, attributes, "long")?;
        Ok(Self::new(short, long))
    }

    /// Last successfully issued command.
    pub async fn current_value(&self) -> Option<ShutterCommand> {
        *self.current.lock().await
    }

    /// Issue `"up"`, `"down"` or `"stop"` and report the new position.
    ///
    /// Up and down switch the long press group (off and on respectively),
    /// stop switches the short press group off. Other values are ignored.
    pub async fn set<C: BusConnector>(
        &self,
        value: &Value,
        channel: Channel,
        writer: &BusWriter<C>,
        outbox: &Outbox,
    ) -> Result<()> {
        let Some(command) = value.as_str().and_then(|s| s.parse::<ShutterCommand>().ok()) else {
            log::debug!("shutter ignores {value}");
            return Ok(());
        };
        let (address, on) = match command {
            ShutterCommand::Up => (self.long, false),
            ShutterCommand::Down => (self.long, true),
            ShutterCommand::Stop => (self.short, false),
        };

        let mut current = self.current.lock().await;
        writer.write(address, &apdu::encode_bool(on)).await?;
        *current = Some(command);
        outbox.post(Self::state_message(*current, channel));
        Ok(())
    }

    /// Emit the current position.
    pub async fn send_update(&self, channel: Channel, outbox: &Outbox) {
        let current = self.current.lock().await;
        outbox.post(Self::state_message(*current, channel));
    }

    fn state_message(value: Option<ShutterCommand>, channel: Channel) -> OutgoingMessage {
        OutgoingMessage::State {
            channel,
            payload: StatePayload::Position(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::mock_transport::MockBus;
    use serde_json::json;
    use std::sync::Arc;

    const CHANNEL: Channel = Channel::new(1, 2, 4);

    fn setup() -> (MockBus, BusWriter<MockBus>, Shutter) {
        let bus = MockBus::new();
        let writer = BusWriter::new(Arc::new(bus.clone()));
        (bus, writer, Shutter::new(ga!(0 / 1 / 1), ga!(0 / 1 / 2)))
    }

    #[tokio::test]
    async fn test_up_writes_long_off() {
        let (bus, writer, shutter) = setup();
        let (outbox, mut rx) = Outbox::channel();

        shutter.set(&json!("up"), CHANNEL, &writer, &outbox).await.unwrap();

        assert_eq!(bus.written(), vec![(ga!(0 / 1 / 2), vec![0x00, 0x80])]);
        assert_eq!(shutter.current_value().await, Some(ShutterCommand::Up));
        assert_eq!(
            rx.try_recv().unwrap(),
            OutgoingMessage::State {
                channel: CHANNEL,
                payload: StatePayload::Position(Some(ShutterCommand::Up)),
            }
        );
    }

    #[tokio::test]
    async fn test_down_and_stop() {
        let (bus, writer, shutter) = setup();
        let (outbox, _rx) = Outbox::channel();

        shutter.set(&json!("down"), CHANNEL, &writer, &outbox).await.unwrap();
        shutter.set(&json!("stop"), CHANNEL, &writer, &outbox).await.unwrap();

        assert_eq!(
            bus.written(),
            vec![
                (ga!(0 / 1 / 2), vec![0x00, 0x81]),
                (ga!(0 / 1 / 1), vec![0x00, 0x80]),
            ]
        );
        assert_eq!(shutter.current_value().await, Some(ShutterCommand::Stop));
    }

    #[tokio::test]
    async fn test_unknown_command_is_noop() {
        let (bus, writer, shutter) = setup();
        let (outbox, mut rx) = Outbox::channel();

        for value in [json!("sideways"), json!(true), json!(1), json!("UP")] {
            shutter.set(&value, CHANNEL, &writer, &outbox).await.unwrap();
        }

        assert!(bus.written().is_empty());
        assert!(rx.try_recv().is_err());
        assert_eq!(shutter.current_value().await, None);
    }

    #[tokio::test]
    async fn test_failed_write_reports_nothing() {
        let (bus, writer, shutter) = setup();
        let (outbox, mut rx) = Outbox::channel();
        bus.set_fail_writes(true);

        assert!(shutter.set(&json!("up"), CHANNEL, &writer, &outbox).await.is_err());
        assert!(rx.try_recv().is_err());
        assert_eq!(shutter.current_value().await, None);
    }

    #[test]
    fn test_from_attributes_requires_both() {
        let attrs = json!({"short": "0/1/1"});
        let err = Shutter::from_attributes("Blind", attrs.as_object().unwrap()).unwrap_err();
        match err {
            crate::KnxError::Configuration(e) => {
                assert!(e.is_missing_attribute());
                assert!(e.detail().contains("long"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
