//! Host command dispatch.

use crate::message::{HostCommand, Outbox};
use crate::net::transport::BusConnector;
use crate::net::writer::BusWriter;
use crate::registry::Registry;
use std::sync::Arc;

/// Routes host commands to registered devices.
///
/// Never fails towards the host: unknown channels and rejected writes are
/// logged and dropped.
#[derive(Debug)]
pub struct CommandRouter<C: BusConnector> {
    registry: Arc<Registry>,
    writer: BusWriter<C>,
    outbox: Outbox,
}

impl<C: BusConnector> CommandRouter<C> {
    pub fn new(registry: Arc<Registry>, connector: Arc<C>, outbox: Outbox) -> Self {
        Self {
            registry,
            writer: BusWriter::new(connector),
            outbox,
        }
    }

    pub async fn handle(&self, command: HostCommand) {
        match command {
            HostCommand::Query => {
                for message in self.registry.announcements() {
                    self.outbox.post(message);
                }
            }
            HostCommand::Write {
                channel: Some(channel),
                payload,
            } => {
                let Some(device) = self.registry.get(&channel) else {
                    log::debug!("write to unknown channel {channel}");
                    return;
                };
                if let Err(e) = device.set(&payload, &self.writer, &self.outbox).await {
                    log::error!("{} ({channel}): {e}", device.name());
                }
            }
            HostCommand::Write { channel: None, .. } => log::debug!("write without channel"),
            HostCommand::Unknown => log::debug!("ignoring unknown action"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addressing::Channel;
    use crate::configuration::BridgeConfig;
    use crate::message::OutgoingMessage;
    use crate::net::mock_transport::MockBus;
    use serde_json::json;

    fn router(bus: &MockBus) -> (CommandRouter<MockBus>, tokio::sync::mpsc::UnboundedReceiver<OutgoingMessage>) {
        let config = BridgeConfig::from_json(
            r#"{"devices": [
                {"name": "Lamp", "type": "fixture", "channel": [1, 2, 3],
                 "attributes": {"binary": "0/0/1"}},
                {"name": "Blind", "type": "shutter", "channel": [1, 2, 4],
                 "attributes": {"short": "0/1/1", "long": "0/1/2"}}
            ]}"#,
        )
        .unwrap();
        let registry = Arc::new(Registry::build(&config.devices).unwrap());
        let (outbox, rx) = Outbox::channel();
        (CommandRouter::new(registry, Arc::new(bus.clone()), outbox), rx)
    }

    #[tokio::test]
    async fn test_query_announces_all() {
        let bus = MockBus::new();
        let (router, mut rx) = router(&bus);
        router.handle(HostCommand::Query).await;

        let mut names = Vec::new();
        while let Ok(OutgoingMessage::Announce { name, .. }) = rx.try_recv() {
            names.push(name);
        }
        assert_eq!(names, ["Lamp", "Blind"]);
    }

    #[tokio::test]
    async fn test_write_reaches_device() {
        let bus = MockBus::new();
        let (router, _rx) = router(&bus);
        router
            .handle(HostCommand::Write {
                channel: Some(Channel::new(1, 2, 3)),
                payload: json!(true),
            })
            .await;
        assert_eq!(bus.written(), vec![(ga!(0 / 0 / 1), vec![0x00, 0x81])]);
    }

    #[tokio::test]
    async fn test_unknown_channel_is_silent() {
        let bus = MockBus::new();
        let (router, mut rx) = router(&bus);
        router
            .handle(HostCommand::Write {
                channel: Some(Channel::new(9, 9, 9)),
                payload: json!(true),
            })
            .await;
        router
            .handle(HostCommand::Write { channel: None, payload: json!(true) })
            .await;
        router.handle(HostCommand::Unknown).await;

        assert!(bus.written().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_transport_failure_is_swallowed() {
        let bus = MockBus::new();
        let (router, mut rx) = router(&bus);
        bus.set_fail_connect(true);
        router
            .handle(HostCommand::Write {
                channel: Some(Channel::new(1, 2, 4)),
                payload: json!("down"),
            })
            .await;
        assert!(rx.try_recv().is_err());
    }
}
