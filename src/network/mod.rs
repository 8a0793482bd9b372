pub mod address;
pub mod connection;
pub mod device;

pub use address::MacAddress;
pub use connection::{Connection, Endpoint, Medium};
pub use device::{Device, DeviceId, DeviceType, PortId};
