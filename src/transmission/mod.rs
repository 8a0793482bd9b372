pub mod marker;
pub mod queue;
pub mod walker;

pub use marker::{MarkerColor, PacketMarker};
pub use queue::{Advance, TransmissionQueue};
pub use walker::{Direction, Hop, PathWalker, Progress};

use crate::error::SimError;
use crate::network::DeviceId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(u64);

impl RequestId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    pub fn from_reliable(reliable: bool) -> Self {
        if reliable { Protocol::Tcp } else { Protocol::Udp }
    }

    /// TCP waits for an acknowledgment walked back along the reversed path.
    pub fn expects_ack(&self) -> bool {
        matches!(self, Protocol::Tcp)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => f.write_str("TCP"),
            Protocol::Udp => f.write_str("UDP"),
        }
    }
}

impl FromStr for Protocol {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "TCP" => Ok(Protocol::Tcp),
            "UDP" => Ok(Protocol::Udp),
            _ => Err(SimError::InvalidProtocol),
        }
    }
}

/// Where a request is in its life. `Queued` requests wait behind the active one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Queued,
    AnimatingForward,
    AnimatingReturn,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransmissionRequest {
    pub id: RequestId,
    pub path: Vec<DeviceId>,
    pub source: DeviceId,
    pub destination: DeviceId,
    pub protocol: Protocol,
    pub expects_ack: bool,
}

impl TransmissionRequest {
    /// `path` runs from source to destination inclusive. `None` unless it covers at least one hop.
    pub fn new(id: RequestId, path: Vec<DeviceId>, protocol: Protocol) -> Option<Self> {
        let (&source, &destination) = match path.as_slice() {
            [first, .., last] => (first, last),
            _ => return None,
        };
        Some(Self {
            id,
            path,
            source,
            destination,
            protocol,
            expects_ack: protocol.expects_ack(),
        })
    }

    /// The return leg: same id, reversed path, no further acknowledgment.
    pub fn acknowledgment(&self) -> Self {
        Self {
            id: self.id,
            path: self.path.iter().rev().copied().collect(),
            source: self.destination,
            destination: self.source,
            protocol: self.protocol,
            expects_ack: false,
        }
    }

    pub fn hops(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    pub fn uses_device(&self, id: DeviceId) -> bool {
        self.path.contains(&id)
    }

    pub fn uses_link(&self, a: DeviceId, b: DeviceId) -> bool {
        self.path
            .windows(2)
            .any(|hop| (hop[0] == a && hop[1] == b) || (hop[0] == b && hop[1] == a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u32]) -> Vec<DeviceId> {
        raw.iter().copied().map(DeviceId::new).collect()
    }

    #[test]
    fn protocol_tokens() {
        assert_eq!("tcp".parse::<Protocol>(), Ok(Protocol::Tcp));
        assert_eq!("Udp".parse::<Protocol>(), Ok(Protocol::Udp));
        assert_eq!("ICMP".parse::<Protocol>(), Err(SimError::InvalidProtocol));
        assert!(Protocol::from_reliable(true).expects_ack());
        assert!(!Protocol::from_reliable(false).expects_ack());
    }

    #[test]
    fn acknowledgment_reverses_the_path() {
        let req = TransmissionRequest::new(RequestId::new(1), ids(&[1, 2, 3]), Protocol::Tcp).unwrap();
        assert_eq!((req.source, req.destination), (DeviceId::new(1), DeviceId::new(3)));
        assert!(req.expects_ack);

        let ack = req.acknowledgment();
        assert_eq!(ack.path, ids(&[3, 2, 1]));
        assert_eq!((ack.source, ack.destination), (DeviceId::new(3), DeviceId::new(1)));
        assert!(!ack.expects_ack);
        assert_eq!(ack.id, req.id);
    }

    #[test]
    fn path_membership() {
        let req = TransmissionRequest::new(RequestId::new(1), ids(&[1, 2, 3]), Protocol::Udp).unwrap();
        assert_eq!(req.hops(), 2);
        assert!(req.uses_device(DeviceId::new(2)));
        assert!(req.uses_link(DeviceId::new(3), DeviceId::new(2)));
        assert!(!req.uses_link(DeviceId::new(1), DeviceId::new(3)));
    }

    #[test]
    fn requests_need_at_least_one_hop() {
        let id = RequestId::new(1);
        assert_eq!(TransmissionRequest::new(id, Vec::new(), Protocol::Udp), None);
        assert_eq!(TransmissionRequest::new(id, ids(&[4]), Protocol::Tcp), None);

        let req = TransmissionRequest::new(id, ids(&[4, 5]), Protocol::Udp).unwrap();
        assert_eq!((req.source, req.destination), (DeviceId::new(4), DeviceId::new(5)));
        assert_eq!(req.hops(), 1);
    }
}
