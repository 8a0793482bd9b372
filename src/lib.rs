pub mod diagnostics;
pub mod error;
pub mod metrics;
pub mod network;
pub mod simulation;
pub mod terminal;
pub mod topology;
pub mod transmission;

pub use error::SimError;
pub use metrics::MetricsCollector;
pub use simulation::{SimConfig, SimEvent, Simulator};
pub use topology::Topology;

pub mod prelude {
    pub use crate::diagnostics::{PingConfig, PingReport};
    pub use crate::error::SimError;
    pub use crate::metrics::MetricsSnapshot;
    pub use crate::network::{DeviceId, DeviceType, Medium};
    pub use crate::simulation::{Scenario, SimConfig, SimEvent, Simulator};
    pub use crate::transmission::{Protocol, RequestId};
}
