use crate::error::{Result, SimError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// 48-bit link-layer address, fixed for the lifetime of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    pub fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self(rng.r#gen())
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

/// Parses a dotted quad ("192.168.0.1"), used for both addresses and masks.
pub fn parse_dotted_quad(text: &str) -> Result<Ipv4Addr> {
    text.trim()
        .parse::<Ipv4Addr>()
        .map_err(|_| SimError::InvalidAddress(text.to_string()))
}

/// Address handed to a freshly created device. Ids past 255 carry into the third octet;
/// from 65536 on every device shares `192.168.255.255` until reconfigured.
pub fn default_address(id: u32) -> Ipv4Addr {
    match u8::try_from(id / 256) {
        Ok(third) => Ipv4Addr::new(192, 168, third, (id % 256) as u8),
        Err(_) => Ipv4Addr::new(192, 168, u8::MAX, u8::MAX),
    }
}

pub const DEFAULT_SUBNET_MASK: Ipv4Addr = Ipv4Addr::new(255, 255, 255, 0);

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn mac_formats_as_colon_separated_hex() {
        let mac = MacAddress::new([0x00, 0x1a, 0x2b, 0xff, 0x04, 0x10]);
        assert_eq!(mac.to_string(), "00:1a:2b:ff:04:10");
    }

    #[test]
    fn random_macs_differ() {
        let mut rng = StdRng::seed_from_u64(7);
        let a = MacAddress::random(&mut rng);
        let b = MacAddress::random(&mut rng);
        assert_ne!(a, b);
    }

    #[test]
    fn dotted_quads() {
        assert_eq!(parse_dotted_quad("10.0.0.1").unwrap(), Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(parse_dotted_quad(" 255.255.255.0 ").unwrap(), DEFAULT_SUBNET_MASK);

        for bad in ["256.1.1.1", "1.2.3", "a.b.c.d", "1.2.3.4.5", ""] {
            assert_eq!(
                parse_dotted_quad(bad),
                Err(SimError::InvalidAddress(bad.to_string())),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn default_addresses_follow_the_id() {
        assert_eq!(default_address(1), Ipv4Addr::new(192, 168, 0, 1));
        assert_eq!(default_address(42), Ipv4Addr::new(192, 168, 0, 42));
        assert_eq!(default_address(300), Ipv4Addr::new(192, 168, 1, 44));
        assert_eq!(default_address(65535), Ipv4Addr::new(192, 168, 255, 255));
    }

    #[test]
    fn huge_ids_saturate_instead_of_wrapping() {
        assert_eq!(default_address(65536), Ipv4Addr::new(192, 168, 255, 255));
        assert_eq!(default_address(65537), Ipv4Addr::new(192, 168, 255, 255));
        assert_ne!(default_address(65537), default_address(1));
        assert_eq!(default_address(u32::MAX), Ipv4Addr::new(192, 168, 255, 255));
    }
}
