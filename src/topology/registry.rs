use crate::network::{Device, DeviceId, DeviceType, MacAddress};
use rand::Rng;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

/// Hands out device ids. Ids start at 1 and are never reused.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn allocate(&mut self) -> DeviceId {
        let id = DeviceId::new(self.next);
        self.next += 1;
        id
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default, Clone)]
pub struct DeviceRegistry {
    ids: IdAllocator,
    devices: BTreeMap<DeviceId, Device>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create<R: Rng>(&mut self, kind: DeviceType, rng: &mut R) -> DeviceId {
        let id = self.ids.allocate();
        self.devices.insert(id, Device::new(id, kind, MacAddress::random(rng)));
        id
    }

    pub fn remove(&mut self, id: DeviceId) -> Option<Device> {
        self.devices.remove(&id)
    }

    pub fn get(&self, id: DeviceId) -> Option<&Device> {
        self.devices.get(&id)
    }

    pub fn get_mut(&mut self, id: DeviceId) -> Option<&mut Device> {
        self.devices.get_mut(&id)
    }

    pub fn contains(&self, id: DeviceId) -> bool {
        self.devices.contains_key(&id)
    }

    /// Newest device (highest id) carrying `ip`. Addresses are not forced to be unique.
    pub fn find_by_ip(&self, ip: Ipv4Addr) -> Option<&Device> {
        self.devices.values().rev().find(|d| d.ip() == ip)
    }

    /// Devices in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
