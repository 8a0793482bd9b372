use super::Simulator;
use crate::error::Result;
use crate::network::{DeviceId, DeviceType, Medium};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Prebuilt topologies for a session that has no canvas to draw on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    Empty,
    /// PC -copper- Router -fiber- PC
    Example,
    /// Routers in a chain, alternating copper and fiber.
    Line,
    /// A switch with PCs hanging off it (at most 8).
    Star,
    /// Routers in a closed loop.
    Ring,
}

impl FromStr for Scenario {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "empty" | "none" => Ok(Scenario::Empty),
            "example" | "abc" => Ok(Scenario::Example),
            "line" => Ok(Scenario::Line),
            "star" => Ok(Scenario::Star),
            "ring" => Ok(Scenario::Ring),
            _ => anyhow::bail!("Unknown scenario: {}", s),
        }
    }
}

impl Scenario {
    pub fn build(&self, sim: &mut Simulator, devices: u32) -> Result<Vec<DeviceId>> {
        match self {
            Scenario::Empty => Ok(Vec::new()),
            Scenario::Example => {
                let a = sim.add_device(DeviceType::Pc);
                let b = sim.add_device(DeviceType::Router);
                let c = sim.add_device(DeviceType::Pc);
                sim.connect(a, b, Medium::Copper)?;
                sim.connect(b, c, Medium::Fiber)?;
                Ok(vec![a, b, c])
            }
            Scenario::Line => {
                let ids: Vec<_> = (0..devices).map(|_| sim.add_device(DeviceType::Router)).collect();
                for (i, pair) in ids.windows(2).enumerate() {
                    let medium = if i % 2 == 0 { Medium::Copper } else { Medium::Fiber };
                    sim.connect(pair[0], pair[1], medium)?;
                }
                Ok(ids)
            }
            Scenario::Star => {
                let hub = sim.add_device(DeviceType::Switch);
                let leaves = devices.saturating_sub(1).min(u32::from(DeviceType::Switch.port_capacity()));
                let mut ids = vec![hub];
                for _ in 0..leaves {
                    let pc = sim.add_device(DeviceType::Pc);
                    sim.connect(hub, pc, Medium::Copper)?;
                    ids.push(pc);
                }
                Ok(ids)
            }
            Scenario::Ring => {
                let ids: Vec<_> = (0..devices).map(|_| sim.add_device(DeviceType::Router)).collect();
                for pair in ids.windows(2) {
                    sim.connect(pair[0], pair[1], Medium::Fiber)?;
                }
                if ids.len() > 2 {
                    sim.connect(ids[ids.len() - 1], ids[0], Medium::Copper)?;
                }
                Ok(ids)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::SimConfig;

    fn build(scenario: Scenario, devices: u32) -> (Simulator, Vec<DeviceId>) {
        let mut sim = Simulator::new(SimConfig::default().with_seed(5));
        let ids = scenario.build(&mut sim, devices).unwrap();
        (sim, ids)
    }

    #[test]
    fn example_matches_the_walkthrough() {
        let (sim, ids) = build(Scenario::Example, 0);
        let t = sim.topology();
        assert_eq!(ids.len(), 3);
        assert_eq!(t.device(ids[0]).unwrap().ip().to_string(), "192.168.0.1");
        assert_eq!(t.medium(ids[0], ids[1]), Some(Medium::Copper));
        assert_eq!(t.medium(ids[1], ids[2]), Some(Medium::Fiber));
    }

    #[test]
    fn ring_offers_two_ways_round() {
        let (sim, ids) = build(Scenario::Ring, 6);
        let t = sim.topology();
        assert_eq!(t.connections().len(), 6);
        // opposite corners are three hops apart either way
        assert_eq!(t.path(ids[0], ids[3]).map(|p| p.len()), Some(4));
        assert_eq!(t.path(ids[0], ids[5]).map(|p| p.len()), Some(2));
    }

    #[test]
    fn star_is_capped_by_switch_ports() {
        let (sim, ids) = build(Scenario::Star, 20);
        assert_eq!(ids.len(), 9);
        assert!(!sim.topology().device(ids[0]).unwrap().has_available_ports());
    }

    #[test]
    fn line_and_names() {
        let (sim, ids) = build(Scenario::Line, 4);
        assert_eq!(sim.topology().path(ids[0], ids[3]).map(|p| p.len()), Some(4));
        assert_eq!("STAR".parse::<Scenario>().unwrap(), Scenario::Star);
        assert!("mesh".parse::<Scenario>().is_err());
    }
}
