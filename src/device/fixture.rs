//! Lighting fixture, optionally dimmable.
//!
//! Host writes go to the bus; the host-visible state follows what the
//! listeners observe on the binary and dimmable groups afterwards.

use super::{required_address, ListenerRole};
use crate::addressing::{Channel, GroupAddress};
use crate::error::Result;
use crate::message::{OutgoingMessage, Outbox, StatePayload};
use crate::net::transport::BusConnector;
use crate::net::writer::BusWriter;
use crate::protocol::apdu::{self, ApduEvent};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

/// Fixture state and addresses.
#[derive(Debug)]
pub struct Fixture {
    binary: GroupAddress,
    dimmable: Option<GroupAddress>,
    current: Mutex<u8>,
}

impl Fixture {
    /// Current value of a switched-off fixture.
    pub const OFF: u8 = 0;
    /// Current value of a fully on fixture.
    pub const FULL: u8 = 255;

    /// Create a fixture that starts switched off.
    pub fn new(binary: GroupAddress, dimmable: Option<GroupAddress>) -> Self {
        Self {
            binary,
            dimmable,
            current: Mutex::new(Self::OFF),
        }
    }

    /// Build from configuration attributes.
    ///
    /// `binary` is required. A string `dimmable` makes the fixture dimmable,
    /// any other value is ignored.
    pub(crate) fn from_attributes(name: &str, attributes: &Map<String, Value>) -> Result<Self> {
        let binary = required_address(name, attributes, "binary")?;
        let dimmable = match attributes.get("dimmable") {
            Some(Value::String(text)) => Some(text.parse()?),
            _ => None,
        };
        Ok(Self::new(binary, dimmable))
    }

    pub fn binary(&self) -> GroupAddress {
        self.binary
    }

    pub fn dimmable(&self) -> Option<GroupAddress> {
        self.dimmable
    }

    pub fn is_dimmable(&self) -> bool {
        self.dimmable.is_some()
    }

    /// Current intensity (0 off, 255 full on).
    pub async fn current_value(&self) -> u8 {
        *self.current.lock().await
    }

    /// Apply a host value.
    ///
    /// A boolean switches the binary group, an integer in 0..=255 dims a
    /// dimmable fixture. Anything else is ignored. The current value changes
    /// only once the write succeeded; no state message is emitted here.
    pub async fn set<C: BusConnector>(&self, value: &Value, writer: &BusWriter<C>) -> Result<()> {
        match value {
            Value::Bool(on) => {
                let mut current = self.current.lock().await;
                writer.write(self.binary, &apdu::encode_bool(*on)).await?;
                *current = if *on { Self::FULL } else { Self::OFF };
            }
            Value::Number(number) => {
                let level = number.as_u64().and_then(|n| u8::try_from(n).ok());
                match (self.dimmable, level) {
                    (Some(address), Some(level)) => {
                        let mut current = self.current.lock().await;
                        writer.write(address, &apdu::encode_u8(level)).await?;
                        *current = level;
                    }
                    _ => log::debug!("fixture ignores {value}"),
                }
            }
            other => log::debug!("fixture ignores {other}"),
        }
        Ok(())
    }

    /// Apply an event seen by one of the listeners and report the new state.
    pub(crate) async fn on_bus_event(
        &self,
        role: ListenerRole,
        event: ApduEvent,
        channel: Channel,
        outbox: &Outbox,
    ) {
        let value = match (role, event) {
            (_, ApduEvent::BooleanWrite(on)) => {
                if on {
                    Self::FULL
                } else {
                    Self::OFF
                }
            }
            (ListenerRole::Dimmable, ApduEvent::IntegerWrite(level)) => level,
            (ListenerRole::Binary, ApduEvent::IntegerWrite(_)) => return,
        };
        let mut current = self.current.lock().await;
        *current = value;
        outbox.post(self.state_message(*current, channel));
    }

    /// Emit the current state.
    pub async fn send_update(&self, channel: Channel, outbox: &Outbox) {
        let current = self.current.lock().await;
        outbox.post(self.state_message(*current, channel));
    }

    fn state_message(&self, value: u8, channel: Channel) -> OutgoingMessage {
        let payload = if self.is_dimmable() {
            StatePayload::Level(value)
        } else {
            StatePayload::Switch(value != Self::OFF)
        };
        OutgoingMessage::State { channel, payload }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::mock_transport::MockBus;
    use serde_json::json;
    use std::sync::Arc;

    fn setup() -> (MockBus, BusWriter<MockBus>) {
        let bus = MockBus::new();
        let writer = BusWriter::new(Arc::new(bus.clone()));
        (bus, writer)
    }

    #[tokio::test]
    async fn test_set_bool() {
        let (bus, writer) = setup();
        let fixture = Fixture::new(ga!(0 / 0 / 1), None);

        fixture.set(&json!(true), &writer).await.unwrap();
        assert_eq!(fixture.current_value().await, 255);
        assert_eq!(bus.written(), vec![(ga!(0 / 0 / 1), vec![0x00, 0x81])]);

        fixture.set(&json!(false), &writer).await.unwrap();
        assert_eq!(fixture.current_value().await, 0);
        assert_eq!(bus.written().len(), 2);
    }

    #[tokio::test]
    async fn test_set_level() {
        let (bus, writer) = setup();
        let fixture = Fixture::new(ga!(0 / 0 / 1), Some(ga!(0 / 0 / 2)));

        fixture.set(&json!(128), &writer).await.unwrap();
        assert_eq!(fixture.current_value().await, 128);
        assert_eq!(bus.written(), vec![(ga!(0 / 0 / 2), vec![0x00, 0x80, 128])]);
    }

    #[tokio::test]
    async fn test_set_ignored_values() {
        let (bus, writer) = setup();
        let plain = Fixture::new(ga!(0 / 0 / 1), None);
        plain.set(&json!(128), &writer).await.unwrap();

        let dimmable = Fixture::new(ga!(0 / 0 / 1), Some(ga!(0 / 0 / 2)));
        for value in [json!(256), json!(-1), json!(0.5), json!("on"), Value::Null] {
            dimmable.set(&value, &writer).await.unwrap();
        }

        assert!(bus.written().is_empty());
        assert_eq!(plain.current_value().await, 0);
        assert_eq!(dimmable.current_value().await, 0);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_value() {
        let (bus, writer) = setup();
        let fixture = Fixture::new(ga!(0 / 0 / 1), None);
        bus.set_fail_writes(true);

        assert!(fixture.set(&json!(true), &writer).await.is_err());
        assert_eq!(fixture.current_value().await, 0);
    }

    #[tokio::test]
    async fn test_bus_events() {
        let (outbox, mut rx) = Outbox::channel();
        let channel = Channel::new(1, 2, 3);
        let fixture = Fixture::new(ga!(0 / 0 / 1), Some(ga!(0 / 0 / 2)));

        fixture
            .on_bus_event(ListenerRole::Dimmable, ApduEvent::IntegerWrite(40), channel, &outbox)
            .await;
        assert_eq!(
            rx.try_recv().unwrap(),
            OutgoingMessage::State { channel, payload: StatePayload::Level(40) }
        );

        // integers on the binary group carry no switch state
        fixture
            .on_bus_event(ListenerRole::Binary, ApduEvent::IntegerWrite(7), channel, &outbox)
            .await;
        assert!(rx.try_recv().is_err());
        assert_eq!(fixture.current_value().await, 40);

        fixture
            .on_bus_event(ListenerRole::Binary, ApduEvent::BooleanWrite(true), channel, &outbox)
            .await;
        assert_eq!(fixture.current_value().await, 255);
        assert_eq!(
            rx.try_recv().unwrap(),
            OutgoingMessage::State { channel, payload: StatePayload::Level(255) }
        );
    }

    #[tokio::test]
    async fn test_send_update_switch() {
        let (outbox, mut rx) = Outbox::channel();
        let channel = Channel::new(0, 0, 9);
        let fixture = Fixture::new(ga!(0 / 0 / 1), None);
        fixture.send_update(channel, &outbox).await;
        assert_eq!(
            rx.try_recv().unwrap(),
            OutgoingMessage::State { channel, payload: StatePayload::Switch(false) }
        );
    }

    #[test]
    fn test_from_attributes() {
        let attrs = json!({"binary": "0/0/1", "dimmable": "0/0/2"});
        let fixture = Fixture::from_attributes("Lamp", attrs.as_object().unwrap()).unwrap();
        assert_eq!(fixture.dimmable(), Some(ga!(0 / 0 / 2)));

        let attrs = json!({"binary": "0/0/1", "dimmable": false});
        let fixture = Fixture::from_attributes("Lamp", attrs.as_object().unwrap()).unwrap();
        assert!(!fixture.is_dimmable());

        let attrs = json!({"dimmable": "0/0/2"});
        assert!(Fixture::from_attributes("Lamp", attrs.as_object().unwrap()).is_err());

        let attrs = json!({"binary": "0/0/1", "dimmable": "40/0/2"});
        let err = Fixture::from_attributes("Lamp", attrs.as_object().unwrap()).unwrap_err();
        assert!(err.is_address_format());
    }
}
