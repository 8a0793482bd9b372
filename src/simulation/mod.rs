pub mod config;
pub mod driver;
pub mod scenario;

pub use config::SimConfig;
pub use driver::drive;
pub use scenario::Scenario;

use crate::diagnostics::{self, PingReport};
use crate::error::{Result, SimError};
use crate::metrics::{MetricsCollector, TransmissionRecord};
use crate::network::{Connection, DeviceId, DeviceType, Medium};
use crate::topology::Topology;
use crate::transmission::queue::Finished;
use crate::transmission::{
    Hop, PacketMarker, Phase, Progress, Protocol, RequestId, TransmissionQueue, TransmissionRequest,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::net::Ipv4Addr;
use tracing::{debug, info, warn};

/// Everything the presentation layer needs to draw or print.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    TransmissionStarted {
        id: RequestId,
        protocol: Protocol,
        source: DeviceId,
        destination: DeviceId,
    },
    HopAdvanced(Hop),
    /// The reliable request reached its destination and the acknowledgment heads back.
    AcknowledgmentStarted {
        id: RequestId,
        from: DeviceId,
        to: DeviceId,
    },
    TransmissionCompleted {
        id: RequestId,
        protocol: Protocol,
        source: DeviceId,
        destination: DeviceId,
        hops: u64,
    },
    TransmissionAborted {
        id: RequestId,
        reason: SimError,
        hops: u64,
    },
    MarkerRemoved {
        id: RequestId,
    },
    DraggingLocked,
    DraggingUnlocked,
}

type HopObserver = Box<dyn FnMut(&Hop) + Send>;
type EventObserver = Box<dyn FnMut(&SimEvent) + Send>;

/// The simulation engine. Single owner: every mutation goes through `&mut self`,
/// and animation only moves when `tick` is called.
pub struct Simulator {
    config: SimConfig,
    topology: Topology,
    queue: TransmissionQueue,
    marker: Option<PacketMarker>,
    rng: StdRng,
    metrics: MetricsCollector,
    hop_observers: Vec<HopObserver>,
    observers: Vec<EventObserver>,
    outbox: Vec<SimEvent>,
    drag_locked: bool,
    ticks: u64,
}

impl Simulator {
    pub fn new(config: SimConfig) -> Self {
        Self::with_metrics(config, MetricsCollector::new())
    }

    pub fn with_metrics(config: SimConfig, metrics: MetricsCollector) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            topology: Topology::new(metrics.clone()),
            queue: TransmissionQueue::new(),
            marker: None,
            rng,
            metrics,
            hop_observers: Vec::new(),
            observers: Vec::new(),
            outbox: Vec::new(),
            drag_locked: false,
            ticks: 0,
            config,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub fn marker(&self) -> Option<&PacketMarker> {
        self.marker.as_ref()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// True while any transmission is queued or walking. Device dragging is off meanwhile.
    pub fn is_busy(&self) -> bool {
        self.queue.is_busy()
    }

    /// Idle with no marker left on screen.
    pub fn is_settled(&self) -> bool {
        !self.is_busy() && self.marker.is_none()
    }

    pub fn phase(&self, id: RequestId) -> Option<Phase> {
        self.queue.phase(id)
    }

    pub fn on_hop_advance<F>(&mut self, callback: F)
    where
        F: FnMut(&Hop) + Send + 'static,
    {
        self.hop_observers.push(Box::new(callback));
    }

    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&SimEvent) + Send + 'static,
    {
        self.observers.push(Box::new(callback));
    }

    /// Events produced since the last call (or the last `tick`).
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.outbox)
    }

    pub fn add_device(&mut self, kind: DeviceType) -> DeviceId {
        self.topology.add_device(kind, &mut self.rng)
    }

    /// Removes a device; transmissions routed through it are aborted.
    pub fn remove_device(&mut self, id: DeviceId) -> Result<Vec<Connection>> {
        let dropped = self.topology.remove_device(id)?;
        self.abort_where(move |r| r.uses_device(id), SimError::TopologyChanged);
        Ok(dropped)
    }

    pub fn connect(&mut self, a: DeviceId, b: DeviceId, medium: Medium) -> Result<Connection> {
        self.topology.connect(a, b, medium)
    }

    /// Removes a link; transmissions crossing it are aborted.
    pub fn disconnect(&mut self, a: DeviceId, b: DeviceId) -> Result<Connection> {
        let conn = self.topology.disconnect(a, b)?;
        self.abort_where(move |r| r.uses_link(a, b), SimError::TopologyChanged);
        Ok(conn)
    }

    pub fn configure_device(&mut self, id: DeviceId, ip: &str, subnet_mask: &str) -> Result<()> {
        self.topology.configure(id, ip, subnet_mask)
    }

    /// Maps a typed address to a device. Unparseable text cannot name a device either.
    pub fn resolve_ip(&self, text: &str) -> Result<DeviceId> {
        let ip: Ipv4Addr = text.trim().parse().map_err(|_| SimError::AddressNotFound)?;
        self.topology
            .device_by_ip(ip)
            .map(|d| d.id())
            .ok_or(SimError::AddressNotFound)
    }

    pub fn submit_ping(&mut self, source: DeviceId, destination: DeviceId) -> Result<PingReport> {
        self.metrics.ping();
        let report = diagnostics::ping(
            &self.topology,
            source,
            destination,
            &self.config.ping,
            &mut self.rng,
        )?;
        debug!("Ping {} -> {}: {} hop(s)", source, destination, report.hops);
        Ok(report)
    }

    /// Validates and queues a transmission. Nothing is queued when this fails.
    pub fn submit_transmission(
        &mut self,
        source: DeviceId,
        destination: DeviceId,
        reliable: bool,
    ) -> Result<RequestId> {
        match self.route(source, destination) {
            Ok(path) => {
                let submission = self.queue.submit(path, Protocol::from_reliable(reliable))?;
                self.metrics.transmission_submitted();
                info!(
                    "Transmission {} queued: {} -> {} ({})",
                    submission.id,
                    source,
                    destination,
                    Protocol::from_reliable(reliable)
                );
                if submission.started {
                    self.announce_start();
                }
                Ok(submission.id)
            }
            Err(e) => {
                self.metrics.transmission_rejected();
                warn!("Transmission {} -> {} rejected: {}", source, destination, e);
                Err(e)
            }
        }
    }

    /// Aborts the walking transmission and lets the next one start.
    pub fn cancel_active(&mut self) -> Option<RequestId> {
        let (finished, next) = self.queue.cancel_active()?;
        let id = finished.request.id;
        self.finish(finished, Some(SimError::Cancelled));
        self.settle(next);
        Some(id)
    }

    /// One scheduler step: a hop of the active transmission, or marker upkeep when idle.
    pub fn tick(&mut self) -> Vec<SimEvent> {
        self.ticks += 1;

        match self.queue.advance() {
            Some(advance) => {
                let hop = advance.hop;
                self.metrics.hop_advanced();
                self.place_marker(&hop);
                for observer in &mut self.hop_observers {
                    observer(&hop);
                }
                self.emit(SimEvent::HopAdvanced(hop));

                if advance.progress == Progress::TurnedAround {
                    self.emit(SimEvent::AcknowledgmentStarted {
                        id: hop.request,
                        from: hop.to,
                        to: hop.from,
                    });
                }
                if let Some(finished) = advance.finished {
                    self.finish(finished, None);
                    self.settle(advance.next);
                }
            }
            None => {
                if self.marker.as_mut().is_some_and(|m| m.expire()) {
                    if let Some(marker) = self.marker.take() {
                        self.emit(SimEvent::MarkerRemoved { id: marker.request() });
                    }
                }
            }
        }

        self.drain_events()
    }

    fn route(&self, source: DeviceId, destination: DeviceId) -> Result<Vec<DeviceId>> {
        let src = self.topology.device(source).ok_or(SimError::UnknownDevice(source))?;
        let dst = self
            .topology
            .device(destination)
            .ok_or(SimError::UnknownDevice(destination))?;
        if source == destination {
            return Err(SimError::SameEndpoints);
        }
        self.topology
            .path(source, destination)
            .ok_or_else(|| SimError::Unreachable {
                src: src.ip().to_string(),
                dst: dst.ip().to_string(),
            })
    }

    fn place_marker(&mut self, hop: &Hop) {
        let same_request = self.marker.as_ref().is_some_and(|m| m.request() == hop.request);
        if same_request {
            if let Some(marker) = self.marker.as_mut() {
                marker.move_to(hop);
            }
        } else if let Some(old) = self.marker.replace(PacketMarker::at(hop)) {
            // a previous transmission's marker may still be lingering
            self.emit(SimEvent::MarkerRemoved { id: old.request() });
        }
        if hop.is_final {
            let linger = self.config.marker_linger_ticks();
            if let Some(marker) = self.marker.as_mut() {
                marker.arrive(linger);
            }
        }
    }

    fn announce_start(&mut self) {
        let Some(request) = self.queue.active().map(|w| w.request().clone()) else {
            return;
        };
        self.emit(SimEvent::TransmissionStarted {
            id: request.id,
            protocol: request.protocol,
            source: request.source,
            destination: request.destination,
        });
        if !self.drag_locked {
            self.drag_locked = true;
            self.emit(SimEvent::DraggingLocked);
        }
    }

    /// After a request left the queue: announce its successor, or unlock dragging once empty.
    fn settle(&mut self, next: Option<RequestId>) {
        if next.is_some() {
            self.announce_start();
        } else if !self.queue.is_busy() && self.drag_locked {
            self.drag_locked = false;
            self.emit(SimEvent::DraggingUnlocked);
        }
    }

    fn abort_where<F>(&mut self, doomed: F, reason: SimError)
    where
        F: Fn(&TransmissionRequest) -> bool,
    {
        let (aborted, next) = self.queue.abort_where(doomed);
        if aborted.is_empty() {
            return;
        }
        for finished in aborted {
            let id = finished.request.id;
            self.finish(finished, Some(reason.clone()));
            if self.marker.as_ref().is_some_and(|m| m.request() == id) {
                self.marker = None;
                self.emit(SimEvent::MarkerRemoved { id });
            }
        }
        self.settle(next);
    }

    fn finish(&mut self, finished: Finished, failure: Option<SimError>) {
        let Finished { request, hops_walked } = finished;
        let outcome = match &failure {
            None => "completed".to_string(),
            Some(reason) => format!("aborted: {reason}"),
        };
        let record = TransmissionRecord {
            request_id: request.id.get(),
            protocol: request.protocol.to_string(),
            source: self.address_of(request.source),
            destination: self.address_of(request.destination),
            path_len: request.path.len(),
            hops_walked,
            outcome,
            finished_at: chrono::Local::now(),
        };
        self.metrics.transmission_finished(record, failure.is_none());

        match failure {
            None => {
                info!("Transmission {} done after {} hop(s)", request.id, hops_walked);
                self.emit(SimEvent::TransmissionCompleted {
                    id: request.id,
                    protocol: request.protocol,
                    source: request.source,
                    destination: request.destination,
                    hops: hops_walked,
                });
            }
            Some(reason) => {
                warn!("Transmission {} aborted: {}", request.id, reason);
                self.emit(SimEvent::TransmissionAborted {
                    id: request.id,
                    reason,
                    hops: hops_walked,
                });
            }
        }
    }

    fn address_of(&self, id: DeviceId) -> String {
        self.topology
            .device(id)
            .map(|d| d.ip().to_string())
            .unwrap_or_else(|| format!("device {id}"))
    }

    fn emit(&mut self, event: SimEvent) {
        for observer in &mut self.observers {
            observer(&event);
        }
        self.outbox.push(event);
    }
}
