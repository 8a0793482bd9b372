use super::device::{DeviceId, PortId};
use crate::error::SimError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Medium {
    Copper,
    Fiber,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for Medium {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Medium::Copper => "Copper",
            Medium::Fiber => "Fiber",
            Medium::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

impl FromStr for Medium {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "copper" => Ok(Medium::Copper),
            "fiber" | "fibre" => Ok(Medium::Fiber),
            _ => Err(SimError::InvalidMedium(s.to_string())),
        }
    }
}

/// One end of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub device: DeviceId,
    pub port: PortId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    a: Endpoint,
    b: Endpoint,
    medium: Medium,
}

impl Connection {
    pub fn new(a: Endpoint, b: Endpoint, medium: Medium) -> Self {
        Self { a, b, medium }
    }

    pub fn endpoints(&self) -> (Endpoint, Endpoint) {
        (self.a, self.b)
    }

    pub fn medium(&self) -> Medium {
        self.medium
    }

    pub fn touches(&self, device: DeviceId) -> bool {
        self.a.device == device || self.b.device == device
    }

    /// Order-insensitive match on the device pair.
    pub fn joins(&self, x: DeviceId, y: DeviceId) -> bool {
        (self.a.device == x && self.b.device == y) || (self.a.device == y && self.b.device == x)
    }

    /// The endpoint opposite `device`, if this connection touches it.
    pub fn peer_of(&self, device: DeviceId) -> Option<Endpoint> {
        if self.a.device == device {
            Some(self.b)
        } else if self.b.device == device {
            Some(self.a)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> Connection {
        Connection::new(
            Endpoint { device: DeviceId::new(1), port: 2 },
            Endpoint { device: DeviceId::new(4), port: 1 },
            Medium::Fiber,
        )
    }

    #[test]
    fn pair_matching_ignores_order() {
        let c = conn();
        assert!(c.joins(DeviceId::new(1), DeviceId::new(4)));
        assert!(c.joins(DeviceId::new(4), DeviceId::new(1)));
        assert!(!c.joins(DeviceId::new(1), DeviceId::new(2)));
        assert!(c.touches(DeviceId::new(4)));
        assert_eq!(c.peer_of(DeviceId::new(4)).map(|e| e.port), Some(2));
        assert_eq!(c.peer_of(DeviceId::new(9)), None);
    }

    #[test]
    fn media_parse() {
        assert_eq!("Copper".parse::<Medium>().unwrap(), Medium::Copper);
        assert_eq!("FIBER".parse::<Medium>().unwrap(), Medium::Fiber);
        assert!("wifi".parse::<Medium>().is_err());

        let unknown: Medium = serde_json::from_str("\"coax\"").unwrap();
        assert_eq!(unknown, Medium::Unknown);
    }
}
