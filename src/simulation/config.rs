use super::scenario::Scenario;
use crate::diagnostics::PingConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub name: String,
    /// Time between two hop advances.
    pub tick_ms: u64,
    /// How long an arrived packet marker stays on screen.
    pub marker_linger_ms: u64,
    /// Fixed seed for MAC generation and ping jitter. Random when unset.
    pub seed: Option<u64>,
    pub scenario: Scenario,
    pub devices: u32,
    pub ping: PingConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            name: "packetlab".to_string(),
            tick_ms: 1000,
            marker_linger_ms: 2500,
            seed: None,
            scenario: Scenario::Empty,
            devices: 3,
            ping: PingConfig::default(),
        }
    }
}

impl SimConfig {
    /// Reads a JSON config; missing fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: SimConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("checking config {}", path.display()))?;
        Ok(config)
    }

    /// Rejects settings the simulation cannot run with.
    pub fn validate(&self) -> Result<()> {
        let delays = &self.ping.delays;
        for (name, value) in [
            ("copper_ms", delays.copper_ms),
            ("fiber_ms", delays.fiber_ms),
            ("unknown_ms", delays.unknown_ms),
        ] {
            if !value.is_finite() || value < 0.0 {
                anyhow::bail!("ping delay {} must be a non-negative number, got {}", name, value);
            }
        }
        if !(0.0..1.0).contains(&self.ping.jitter) {
            anyhow::bail!("ping jitter must be in [0, 1), got {}", self.ping.jitter);
        }
        Ok(())
    }

    pub fn with_scenario(mut self, scenario: Scenario, devices: u32) -> Self {
        self.scenario = scenario;
        self.devices = devices;
        self
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick_ms = tick.as_millis() as u64;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    /// Linger expressed in whole ticks, rounded up.
    pub fn marker_linger_ticks(&self) -> u32 {
        let tick = self.tick_ms.max(1);
        self.marker_linger_ms.div_ceil(tick) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: SimConfig =
            serde_json::from_str(r#"{ "tick_ms": 250, "ping": { "probes": 2 } }"#).unwrap();
        assert_eq!(config.tick(), Duration::from_millis(250));
        assert_eq!(config.ping.probes, 2);
        assert_eq!(config.ping.initial_ttl, 64);
        assert_eq!(config.ping.delays.copper_ms, 50.0);
        assert_eq!(config.scenario, Scenario::Empty);
    }

    #[test]
    fn linger_rounds_up_to_ticks() {
        let config = SimConfig::default();
        assert_eq!(config.marker_linger_ticks(), 3);

        let config = config.with_tick(Duration::from_millis(500));
        assert_eq!(config.marker_linger_ticks(), 5);
    }

    #[test]
    fn load_reports_bad_files() {
        let path = std::env::temp_dir().join(format!("packetlab-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "scenario": "ring", "devices": 5 }"#).unwrap();
        let config = SimConfig::load(&path).unwrap();
        assert_eq!((config.scenario, config.devices), (Scenario::Ring, 5));

        std::fs::write(&path, "{ not json").unwrap();
        assert!(SimConfig::load(&path).is_err());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn negative_delays_are_refused_on_load() {
        let path = std::env::temp_dir().join(format!("packetlab-delays-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "ping": { "delays": { "copper_ms": -10.0 } } }"#).unwrap();
        let err = SimConfig::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("copper_ms"), "{err:#}");

        std::fs::write(&path, r#"{ "ping": { "jitter": 1.5 } }"#).unwrap();
        assert!(SimConfig::load(&path).is_err());
        let _ = std::fs::remove_file(&path);

        assert!(SimConfig::default().validate().is_ok());
    }
}
