pub mod ping;

pub use ping::{MediumDelays, PingConfig, PingReport, Probe, ping};
