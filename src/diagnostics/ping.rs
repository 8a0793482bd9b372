use crate::error::{Result, SimError};
use crate::network::{DeviceId, Medium};
use crate::topology::Topology;
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// Base per-hop delays in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediumDelays {
    pub copper_ms: f64,
    pub fiber_ms: f64,
    pub unknown_ms: f64,
}

impl Default for MediumDelays {
    fn default() -> Self {
        Self {
            copper_ms: 50.0,
            fiber_ms: 10.0,
            unknown_ms: 100.0,
        }
    }
}

impl MediumDelays {
    /// Base delay for a hop. Negative or non-finite settings count as zero.
    pub fn base(&self, medium: Medium) -> f64 {
        let ms = match medium {
            Medium::Copper => self.copper_ms,
            Medium::Fiber => self.fiber_ms,
            Medium::Unknown => self.unknown_ms,
        };
        if ms.is_finite() { ms.max(0.0) } else { 0.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PingConfig {
    pub probes: u32,
    pub initial_ttl: u32,
    /// Fraction of the base delay each hop may deviate by, both ways.
    pub jitter: f64,
    pub delays: MediumDelays,
}

impl Default for PingConfig {
    fn default() -> Self {
        Self {
            probes: 4,
            initial_ttl: 64,
            jitter: 0.05,
            delays: MediumDelays::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Probe {
    Reply { ttl: u32, delay_ms: f64 },
    TimedOut,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PingReport {
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    pub hops: usize,
    pub probes: Vec<Probe>,
}

impl PingReport {
    pub fn replies(&self) -> usize {
        self.probes.iter().filter(|p| matches!(p, Probe::Reply { .. })).count()
    }
}

impl fmt::Display for PingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pinging {} from {} with {} packets:",
            self.destination,
            self.source,
            self.probes.len()
        )?;
        for (n, probe) in self.probes.iter().enumerate() {
            match probe {
                Probe::Reply { ttl, delay_ms } => write!(
                    f,
                    "\nReply from {}: TTL={}, Delay={:.2}ms (Packet {})",
                    self.destination,
                    ttl,
                    delay_ms,
                    n + 1
                )?,
                Probe::TimedOut => write!(f, "\nRequest timed out (TTL expired).")?,
            }
        }
        Ok(())
    }
}

/// Computes a ping between two devices. Read-only: nothing in the topology changes.
pub fn ping<R: Rng>(
    topology: &Topology,
    source: DeviceId,
    destination: DeviceId,
    config: &PingConfig,
    rng: &mut R,
) -> Result<PingReport> {
    let src = topology.device(source).ok_or(SimError::UnknownDevice(source))?;
    let dst = topology.device(destination).ok_or(SimError::UnknownDevice(destination))?;
    if source == destination {
        return Err(SimError::SameEndpoints);
    }

    let path = topology
        .path(source, destination)
        .ok_or_else(|| SimError::Unreachable {
            src: src.ip().to_string(),
            dst: dst.ip().to_string(),
        })?;
    let hops = path.len() - 1;
    let media = topology.hop_media(&path);
    let ttl = i64::from(config.initial_ttl) - hops as i64;

    let jitter = if config.jitter.is_finite() {
        config.jitter.clamp(0.0, 0.99)
    } else {
        0.0
    };
    let probes = (0..config.probes)
        .map(|_| {
            if ttl <= 0 {
                return Probe::TimedOut;
            }
            let delay_ms = media
                .iter()
                .map(|&m| {
                    let base = config.delays.base(m);
                    Uniform::new_inclusive(base * (1.0 - jitter), base * (1.0 + jitter)).sample(&mut *rng)
                })
                .sum();
            Probe::Reply { ttl: ttl as u32, delay_ms }
        })
        .collect();

    Ok(PingReport {
        source: src.ip(),
        destination: dst.ip(),
        hops,
        probes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricsCollector;
    use crate::network::DeviceType;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    // A(.1) -copper- B(.2) -fiber- C(.3), D(.4) isolated
    fn abc() -> (Topology, Vec<DeviceId>) {
        let mut rng = StdRng::seed_from_u64(3);
        let mut t = Topology::new(MetricsCollector::new());
        let ids: Vec<_> = [DeviceType::Pc, DeviceType::Router, DeviceType::Pc, DeviceType::Pc]
            .into_iter()
            .map(|k| t.add_device(k, &mut rng))
            .collect();
        t.connect(ids[0], ids[1], Medium::Copper).unwrap();
        t.connect(ids[1], ids[2], Medium::Fiber).unwrap();
        (t, ids)
    }

    #[test]
    fn two_hops_report_ttl_62() {
        let (t, ids) = abc();
        let mut rng = StdRng::seed_from_u64(9);
        let report = ping(&t, ids[0], ids[2], &PingConfig::default(), &mut rng).unwrap();

        assert_eq!(report.hops, 2);
        assert_eq!(report.replies(), 4);
        for probe in &report.probes {
            let Probe::Reply { ttl, delay_ms } = probe else {
                panic!("expected a reply, got {probe:?}");
            };
            assert_eq!(*ttl, 62);
            // (50 + 10) ms within ±5%
            assert!((57.0..=63.0).contains(delay_ms), "delay {delay_ms}");
        }

        let text = report.to_string();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "Pinging 192.168.0.3 from 192.168.0.1 with 4 packets:");
        assert!(lines[4].starts_with("Reply from 192.168.0.3: TTL=62, Delay="));
        assert!(lines[4].ends_with("ms (Packet 4)"));
    }

    #[test]
    fn zero_jitter_is_exact() {
        let (t, ids) = abc();
        let config = PingConfig { jitter: 0.0, ..PingConfig::default() };
        let report = ping(&t, ids[2], ids[0], &config, &mut StdRng::seed_from_u64(1)).unwrap();
        assert!(report.probes.iter().all(|p| *p == Probe::Reply { ttl: 62, delay_ms: 60.0 }));
    }

    #[test]
    fn ttl_exhaustion_times_out() {
        let (t, ids) = abc();
        let config = PingConfig { initial_ttl: 2, probes: 3, ..PingConfig::default() };
        let report = ping(&t, ids[0], ids[2], &config, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(report.probes, vec![Probe::TimedOut; 3]);
        assert_eq!(report.to_string().lines().nth(1), Some("Request timed out (TTL expired)."));
    }

    #[test]
    fn bad_delay_settings_do_not_panic() {
        let (t, ids) = abc();
        let config = PingConfig {
            jitter: f64::NAN,
            delays: MediumDelays {
                copper_ms: -10.0,
                fiber_ms: f64::INFINITY,
                unknown_ms: 100.0,
            },
            ..PingConfig::default()
        };
        let report = ping(&t, ids[0], ids[2], &config, &mut StdRng::seed_from_u64(1)).unwrap();
        assert!(report.probes.iter().all(|p| *p == Probe::Reply { ttl: 62, delay_ms: 0.0 }));
    }

    #[test]
    fn failures() {
        let (t, ids) = abc();
        let config = PingConfig::default();
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(
            ping(&t, ids[0], ids[3], &config, &mut rng),
            Err(SimError::Unreachable {
                src: "192.168.0.1".into(),
                dst: "192.168.0.4".into()
            })
        );
        assert_eq!(ping(&t, ids[0], ids[0], &config, &mut rng), Err(SimError::SameEndpoints));
        assert_eq!(
            ping(&t, ids[0], DeviceId::new(42), &config, &mut rng),
            Err(SimError::UnknownDevice(DeviceId::new(42)))
        );
    }
}
