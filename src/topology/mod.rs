pub mod graph;
pub mod registry;

pub use graph::TopologyGraph;
pub use registry::{DeviceRegistry, IdAllocator};

use crate::error::{Result, SimError};
use crate::metrics::MetricsCollector;
use crate::network::address::parse_dotted_quad;
use crate::network::{Connection, Device, DeviceId, DeviceType, Endpoint, Medium};
use rand::Rng;
use std::net::Ipv4Addr;
use tracing::{debug, error, info};

/// Devices, the links between them and the graph mirroring those links.
///
/// Every entry in `connections` has a matching graph edge and the other way around;
/// all mutation goes through this type so both sides change together.
#[derive(Debug)]
pub struct Topology {
    registry: DeviceRegistry,
    graph: TopologyGraph,
    connections: Vec<Connection>,
    metrics: MetricsCollector,
}

impl Topology {
    pub fn new(metrics: MetricsCollector) -> Self {
        Self {
            registry: DeviceRegistry::new(),
            graph: TopologyGraph::new(),
            connections: Vec::new(),
            metrics,
        }
    }

    pub fn add_device<R: Rng>(&mut self, kind: DeviceType, rng: &mut R) -> DeviceId {
        let id = self.registry.create(kind, rng);
        self.graph.add_device(id);
        info!("Added {} with id {}", kind, id);
        id
    }

    /// Removes the device and every connection touching it, returning those connections.
    pub fn remove_device(&mut self, id: DeviceId) -> Result<Vec<Connection>> {
        if !self.registry.contains(id) {
            return Err(SimError::UnknownDevice(id));
        }

        let (dropped, kept): (Vec<_>, Vec<_>) =
            self.connections.drain(..).partition(|c| c.touches(id));
        self.connections = kept;

        for conn in &dropped {
            if let Some(peer) = conn.peer_of(id) {
                self.release(peer);
            }
        }

        self.graph.remove_device(id);
        self.registry.remove(id);
        info!("Removed device {} and {} connection(s)", id, dropped.len());
        Ok(dropped)
    }

    pub fn connect(&mut self, a: DeviceId, b: DeviceId, medium: Medium) -> Result<Connection> {
        let (port_a, port_b) = {
            let dev_a = self.registry.get(a).ok_or(SimError::UnknownDevice(a))?;
            let dev_b = self.registry.get(b).ok_or(SimError::UnknownDevice(b))?;
            if a == b {
                return Err(SimError::SelfLink);
            }
            if self.graph.has_link(a, b) {
                return Err(SimError::DuplicateLink(a, b));
            }
            match (dev_a.choose_port(), dev_b.choose_port()) {
                (Some(pa), Some(pb)) => (pa, pb),
                _ => return Err(SimError::NoFreePorts),
            }
        };

        let end_a = Endpoint { device: a, port: port_a };
        let end_b = Endpoint { device: b, port: port_b };
        self.occupy(end_a)?;
        if let Err(e) = self.occupy(end_b) {
            self.release(end_a);
            return Err(e);
        }

        self.graph.add_link(a, b, medium);
        let conn = Connection::new(end_a, end_b, medium);
        self.connections.push(conn);
        info!("Connected {}:{} <-> {}:{} over {}", a, port_a, b, port_b, medium);
        Ok(conn)
    }

    pub fn disconnect(&mut self, a: DeviceId, b: DeviceId) -> Result<Connection> {
        let idx = self
            .connections
            .iter()
            .position(|c| c.joins(a, b))
            .ok_or(SimError::NoSuchLink)?;
        let conn = self.connections.remove(idx);

        if self.graph.remove_link(a, b).is_none() {
            self.fault(format_args!("connection {}-{} had no graph edge", a, b));
        }
        let (end_a, end_b) = conn.endpoints();
        self.release(end_a);
        self.release(end_b);

        info!("Disconnected {} <-> {}", a, b);
        Ok(conn)
    }

    /// Sets address and mask; both must be valid dotted quads or nothing changes.
    pub fn configure(&mut self, id: DeviceId, ip: &str, subnet_mask: &str) -> Result<()> {
        let ip = parse_dotted_quad(ip)?;
        let mask = parse_dotted_quad(subnet_mask)?;
        let device = self.registry.get_mut(id).ok_or(SimError::UnknownDevice(id))?;
        device.set_address(ip, mask);
        info!("Device {} configured: IP {}, subnet {}", id, ip, mask);
        Ok(())
    }

    pub fn path(&self, from: DeviceId, to: DeviceId) -> Option<Vec<DeviceId>> {
        self.graph.path(from, to)
    }

    pub fn medium(&self, a: DeviceId, b: DeviceId) -> Option<Medium> {
        self.graph.medium(a, b)
    }

    /// Medium of every hop along `path`. A missing edge reads as `Medium::Unknown`.
    pub fn hop_media(&self, path: &[DeviceId]) -> Vec<Medium> {
        path.windows(2)
            .map(|hop| self.medium(hop[0], hop[1]).unwrap_or(Medium::Unknown))
            .collect()
    }

    pub fn neighbors(&self, id: DeviceId) -> Vec<DeviceId> {
        self.graph.neighbors(id)
    }

    pub fn has_link(&self, a: DeviceId, b: DeviceId) -> bool {
        self.graph.has_link(a, b)
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn device(&self, id: DeviceId) -> Option<&Device> {
        self.registry.get(id)
    }

    pub fn device_by_ip(&self, ip: Ipv4Addr) -> Option<&Device> {
        self.registry.find_by_ip(ip)
    }

    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.registry.iter()
    }

    pub fn device_count(&self) -> usize {
        self.registry.len()
    }

    fn occupy(&mut self, end: Endpoint) -> Result<()> {
        let device = self
            .registry
            .get_mut(end.device)
            .ok_or(SimError::UnknownDevice(end.device))?;
        device.use_port(end.port)
    }

    fn release(&mut self, end: Endpoint) {
        let outcome = match self.registry.get_mut(end.device) {
            Some(device) => device.release_port(end.port),
            None => Err(SimError::UnknownDevice(end.device)),
        };
        match outcome {
            Ok(()) => debug!("Released port {} on device {}", end.port, end.device),
            Err(e) => self.fault(format_args!("{}", e)),
        }
    }

    fn fault(&self, what: std::fmt::Arguments<'_>) {
        error!(target: "consistency", "Topology bookkeeping fault: {}", what);
        self.metrics.consistency_fault();
    }
}
