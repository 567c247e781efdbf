//! Channel to device mapping.
//!
//! Built once before any listener starts and never modified afterwards, so
//! lookups need no locking. Devices are handed out as `Arc`s because each
//! listener task keeps its own reference.

use crate::addressing::Channel;
use crate::configuration::DeviceDescriptor;
use crate::device::Device;
use crate::error::Result;
use crate::message::OutgoingMessage;
use std::collections::btree_map::{BTreeMap, Entry};
use std::sync::Arc;

/// Immutable set of configured devices keyed by channel.
#[derive(Debug, Default)]
pub struct Registry {
    devices: BTreeMap<Channel, Arc<Device>>,
}

impl Registry {
    /// Build the registry from configuration entries.
    ///
    /// Unsupported device types are skipped. When two entries share a
    /// channel the first one wins.
    ///
    /// # Errors
    ///
    /// Any malformed or missing address aborts the whole load.
    pub fn build(descriptors: &[DeviceDescriptor]) -> Result<Self> {
        let mut devices = BTreeMap::new();
        for descriptor in descriptors {
            let Some(device) = Device::from_descriptor(descriptor)? else {
                continue;
            };
            match devices.entry(device.channel()) {
                Entry::Vacant(slot) => {
                    log::debug!("registered {} {} on {}", device.type_name(), device.name(), device.channel());
                    slot.insert(Arc::new(device));
                }
                Entry::Occupied(existing) => log::warn!(
                    "channel {} already used by {}, skipping {}",
                    existing.key(),
                    existing.get().name(),
                    device.name()
                ),
            }
        }
        Ok(Self { devices })
    }

    pub fn get(&self, channel: &Channel) -> Option<&Arc<Device>> {
        self.devices.get(channel)
    }

    /// Devices in channel order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Device>> {
        self.devices.values()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// One discovery message per device.
    pub fn announcements(&self) -> Vec<OutgoingMessage> {
        self.iter().map(|device| device.announcement()).collect()
    }
}
