use super::address::{self, MacAddress};
use crate::error::{Result, SimError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeviceId(u32);

impl DeviceId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub type PortId = u8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceType {
    Router,
    Switch,
    Hub,
    #[serde(rename = "PC")]
    Pc,
    #[serde(rename = "TV")]
    Tv,
    Phone,
}

impl DeviceType {
    pub const ALL: [DeviceType; 6] = [
        DeviceType::Router,
        DeviceType::Switch,
        DeviceType::Hub,
        DeviceType::Pc,
        DeviceType::Tv,
        DeviceType::Phone,
    ];

    pub fn port_capacity(&self) -> PortId {
        match self {
            DeviceType::Pc | DeviceType::Tv | DeviceType::Phone => 1,
            DeviceType::Hub => 4,
            DeviceType::Router => 6,
            DeviceType::Switch => 8,
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceType::Router => "Router",
            DeviceType::Switch => "Switch",
            DeviceType::Hub => "Hub",
            DeviceType::Pc => "PC",
            DeviceType::Tv => "TV",
            DeviceType::Phone => "Phone",
        };
        f.write_str(name)
    }
}

impl FromStr for DeviceType {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "router" => Ok(DeviceType::Router),
            "switch" => Ok(DeviceType::Switch),
            "hub" => Ok(DeviceType::Hub),
            "pc" => Ok(DeviceType::Pc),
            "tv" => Ok(DeviceType::Tv),
            "phone" => Ok(DeviceType::Phone),
            _ => Err(SimError::InvalidDeviceType(s.to_string())),
        }
    }
}

/// A device placed in the topology. Ports live in exactly one of the two sets.
#[derive(Debug, Clone)]
pub struct Device {
    id: DeviceId,
    kind: DeviceType,
    mac: MacAddress,
    ip: Ipv4Addr,
    subnet_mask: Ipv4Addr,
    available: BTreeSet<PortId>,
    in_use: BTreeSet<PortId>,
}

impl Device {
    pub fn new(id: DeviceId, kind: DeviceType, mac: MacAddress) -> Self {
        Self {
            id,
            kind,
            mac,
            ip: address::default_address(id.get()),
            subnet_mask: address::DEFAULT_SUBNET_MASK,
            available: (1..=kind.port_capacity()).collect(),
            in_use: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn kind(&self) -> DeviceType {
        self.kind
    }

    pub fn mac(&self) -> MacAddress {
        self.mac
    }

    pub fn ip(&self) -> Ipv4Addr {
        self.ip
    }

    pub fn subnet_mask(&self) -> Ipv4Addr {
        self.subnet_mask
    }

    pub fn set_address(&mut self, ip: Ipv4Addr, subnet_mask: Ipv4Addr) {
        self.ip = ip;
        self.subnet_mask = subnet_mask;
    }

    pub fn has_available_ports(&self) -> bool {
        !self.available.is_empty()
    }

    /// Lowest free port, if any.
    pub fn choose_port(&self) -> Option<PortId> {
        self.available.first().copied()
    }

    pub fn available_ports(&self) -> impl Iterator<Item = PortId> + '_ {
        self.available.iter().copied()
    }

    pub fn ports_in_use(&self) -> impl Iterator<Item = PortId> + '_ {
        self.in_use.iter().copied()
    }

    pub fn use_port(&mut self, port: PortId) -> Result<()> {
        if !self.available.remove(&port) {
            return Err(SimError::PortState {
                device: self.id,
                port,
                expected: "available",
            });
        }
        self.in_use.insert(port);
        Ok(())
    }

    pub fn release_port(&mut self, port: PortId) -> Result<()> {
        if !self.in_use.remove(&port) {
            return Err(SimError::PortState {
                device: self.id,
                port,
                expected: "in use",
            });
        }
        self.available.insert(port);
        Ok(())
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (ID: {}) - IP: {}", self.kind, self.id, self.ip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(kind: DeviceType) -> Device {
        Device::new(DeviceId::new(3), kind, MacAddress::new([0; 6]))
    }

    #[test]
    fn capacity_by_type() {
        let expected = [
            (DeviceType::Pc, 1),
            (DeviceType::Tv, 1),
            (DeviceType::Phone, 1),
            (DeviceType::Hub, 4),
            (DeviceType::Router, 6),
            (DeviceType::Switch, 8),
        ];
        for (kind, ports) in expected {
            assert_eq!(device(kind).available_ports().count(), ports, "{kind}");
        }
    }

    #[test]
    fn ports_move_between_sets() {
        let mut hub = device(DeviceType::Hub);
        assert_eq!(hub.choose_port(), Some(1));

        hub.use_port(1).unwrap();
        hub.use_port(3).unwrap();
        assert_eq!(hub.choose_port(), Some(2));
        assert_eq!(hub.ports_in_use().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(hub.available_ports().count() + hub.ports_in_use().count(), 4);

        hub.release_port(1).unwrap();
        assert_eq!(hub.choose_port(), Some(1));
    }

    #[test]
    fn bookkeeping_mistakes_are_reported() {
        let mut pc = device(DeviceType::Pc);
        assert!(matches!(
            pc.release_port(1),
            Err(SimError::PortState { expected: "in use", .. })
        ));

        pc.use_port(1).unwrap();
        assert!(!pc.has_available_ports());
        assert!(matches!(
            pc.use_port(1),
            Err(SimError::PortState { expected: "available", .. })
        ));
    }

    #[test]
    fn display_matches_device_listing() {
        let router = device(DeviceType::Router);
        assert_eq!(router.to_string(), "Router (ID: 3) - IP: 192.168.0.3");
    }

    #[test]
    fn types_parse_case_insensitively() {
        assert_eq!("pc".parse::<DeviceType>().unwrap(), DeviceType::Pc);
        assert_eq!("SWITCH".parse::<DeviceType>().unwrap(), DeviceType::Switch);
        assert!("toaster".parse::<DeviceType>().is_err());
    }
}
