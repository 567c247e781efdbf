//! Running bridge instance.
//!
//! [`Bridge::start`] builds the registry from configuration and spawns one
//! listener per fixture group. [`Bridge::shutdown`] stops them and drops the
//! registry only after every listener has exited.

use crate::configuration::BridgeConfig;
use crate::error::Result;
use crate::listener::Listener;
use crate::message::{HostCommand, Outbox};
use crate::net::transport::BusConnector;
use crate::registry::Registry;
use crate::router::CommandRouter;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Registry, router and listener tasks over one connector.
#[derive(Debug)]
pub struct Bridge<C: BusConnector> {
    connector: Arc<C>,
    registry: Arc<Registry>,
    router: CommandRouter<C>,
    listeners: Vec<JoinHandle<()>>,
    shutdown: CancellationToken,
}

impl<C: BusConnector> Bridge<C> {
    /// Build the registry and start listening.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns the addressing or configuration error of the first invalid
    /// device entry. No task is started in that case.
    pub fn start(config: &BridgeConfig, connector: C, outbox: Outbox) -> Result<Self> {
        let registry = Arc::new(Registry::build(&config.devices)?);
        let connector = Arc::new(connector);
        let shutdown = CancellationToken::new();

        let mut listeners = Vec::new();
        for device in registry.iter() {
            for (address, role) in device.listen_addresses() {
                let listener = Listener {
                    connector: Arc::clone(&connector),
                    device: Arc::clone(device),
                    address,
                    role,
                    outbox: outbox.clone(),
                    shutdown: shutdown.clone(),
                };
                listeners.push(listener.spawn());
            }
        }
        log::info!("{} devices, {} listeners", registry.len(), listeners.len());

        let router = CommandRouter::new(Arc::clone(&registry), Arc::clone(&connector), outbox);
        Ok(Self {
            connector,
            registry,
            router,
            listeners,
            shutdown,
        })
    }

    /// Handle one host command.
    pub async fn handle(&self, command: HostCommand) {
        self.router.handle(command).await;
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Number of listener tasks started.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Stop all listeners and wait for them to exit.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        self.connector.close();
        for handle in self.listeners {
            if let Err(e) = handle.await {
                log::error!("listener task panicked: {e}");
            }
        }
        drop(self.router);
        drop(self.registry);
        log::info!("bridge stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::mock_transport::MockBus;

    const CONFIG: &str = r#"{"devices": [
        {"name": "Lamp", "type": "fixture", "channel": [1, 2, 3],
         "attributes": {"binary": "0/0/1", "dimmable": "0/0/2"}},
        {"name": "Hall", "type": "fixture", "channel": [1, 2, 5],
         "attributes": {"binary": "0/0/5"}},
        {"name": "Blind", "type": "shutter", "channel": [1, 2, 4],
         "attributes": {"short": "0/1/1", "long": "0/1/2"}}
    ]}"#;

    #[tokio::test]
    async fn test_start_spawns_listeners() {
        let bus = MockBus::new();
        let (outbox, _rx) = Outbox::channel();
        let config = BridgeConfig::from_json(CONFIG).unwrap();
        let bridge = Bridge::start(&config, bus.clone(), outbox).unwrap();

        assert_eq!(bridge.registry().len(), 3);
        assert_eq!(bridge.listener_count(), 3);
        bus.wait_for_listeners(ga!(0 / 0 / 1), 1).await;
        bus.wait_for_listeners(ga!(0 / 0 / 2), 1).await;
        bus.wait_for_listeners(ga!(0 / 0 / 5), 1).await;

        bridge.shutdown().await;
        assert!(bus.is_closed());
    }

    #[tokio::test]
    async fn test_start_rejects_bad_config() {
        let bus = MockBus::new();
        let (outbox, _rx) = Outbox::channel();
        let config = BridgeConfig::from_json(
            r#"{"devices": [{"name": "x", "type": "shutter", "channel": [0, 0, 1],
                "attributes": {"short": "0/1/1"}}]}"#,
        )
        .unwrap();
        assert!(Bridge::start(&config, bus.clone(), outbox).is_err());
        assert_eq!(bus.connections(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_with_failed_listeners() {
        let bus = MockBus::new();
        bus.set_fail_connect(true);
        let (outbox, _rx) = Outbox::channel();
        let config = BridgeConfig::from_json(CONFIG).unwrap();
        let bridge = Bridge::start(&config, bus, outbox).unwrap();
        bridge.shutdown().await;
    }
}
