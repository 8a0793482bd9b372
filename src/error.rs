use crate::network::{DeviceId, PortId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    // Validation
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("One or both IPs not found in the network.")]
    AddressNotFound,
    #[error("Source and destination must differ.")]
    SameEndpoints,
    #[error("Invalid protocol. Use either TCP or UDP.")]
    InvalidProtocol,
    #[error("Unknown medium: {0}")]
    InvalidMedium(String),
    #[error("Unknown device type: {0}")]
    InvalidDeviceType(String),

    // Topology
    #[error("Device {0} does not exist")]
    UnknownDevice(DeviceId),
    #[error("One or both devices have no available ports.")]
    NoFreePorts,
    #[error("Devices {0} and {1} are already connected")]
    DuplicateLink(DeviceId, DeviceId),
    #[error("A device cannot be connected to itself")]
    SelfLink,
    #[error("No connection found between these devices.")]
    NoSuchLink,
    #[error("{dst} is unreachable from {src}.")]
    Unreachable { src: String, dst: String },
    #[error("Topology changed during transmission")]
    TopologyChanged,
    #[error("Cancelled by user")]
    Cancelled,

    // Bookkeeping
    #[error("Port {port} on device {device} is not {expected}")]
    PortState {
        device: DeviceId,
        port: PortId,
        expected: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, SimError>;
