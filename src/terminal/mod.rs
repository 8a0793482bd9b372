pub mod command;

pub use command::{Command, ParseError};

use crate::error::SimError;
use crate::network::DeviceId;
use crate::simulation::{SimEvent, Simulator};
use crate::transmission::{Direction, Protocol};
use tracing::debug;

pub const HELP: &str = "Available commands:\n- Ping <source_ip> <destination_ip>\n- Show Devices\n- SendPacket <source_ip> <destination_ip> TCP/UDP\n- Add <Router|Switch|Hub|PC|TV|Phone>\n- Connect <ip> <ip> Copper/Fiber\n- Disconnect <ip> <ip>\n- Remove <ip>\n- Configure <ip> <new_ip> <subnet_mask>\n- Cancel";

pub const PROMPT_READY: &str = "Terminal ready. Type 'help' for commands.";

/// Runs one terminal line and returns the text to show, including whatever
/// the simulator announced while handling it.
pub fn execute(sim: &mut Simulator, line: &str) -> Vec<String> {
    debug!("Terminal: {:?}", line.trim());
    let mut out = match line.parse::<Command>() {
        Ok(command) => run(sim, command),
        Err(e) => vec![e.to_string()],
    };
    let events = sim.drain_events();
    out.extend(render(sim, &events));
    out
}

/// Text for a batch of events, skipping the silent ones.
pub fn render(sim: &Simulator, events: &[SimEvent]) -> Vec<String> {
    events.iter().filter_map(|e| describe(sim, e)).collect()
}

pub fn describe(sim: &Simulator, event: &SimEvent) -> Option<String> {
    let ip = |id: DeviceId| {
        sim.topology()
            .device(id)
            .map(|d| d.ip().to_string())
            .unwrap_or_else(|| format!("device {id}"))
    };

    match event {
        SimEvent::TransmissionStarted { protocol: Protocol::Tcp, source, destination, .. } => Some(
            format!("TCP packet sent from {} to {}...", ip(*source), ip(*destination)),
        ),
        SimEvent::TransmissionStarted { protocol: Protocol::Udp, source, destination, .. } => Some(
            format!("UDP packet sent from {} to {}...", ip(*source), ip(*destination)),
        ),
        SimEvent::AcknowledgmentStarted { from, to, .. } => {
            Some(format!("TCP acknowledgment sent from {} to {}...", ip(*from), ip(*to)))
        }
        SimEvent::HopAdvanced(hop) => {
            let leg = match hop.direction {
                Direction::Forward => "",
                Direction::Return => " (ack)",
            };
            Some(format!("  {} -> {}{}", ip(hop.from), ip(hop.to), leg))
        }
        SimEvent::TransmissionCompleted { protocol: Protocol::Tcp, source, .. } => {
            Some(format!("Acknowledgment received by {}.", ip(*source)))
        }
        SimEvent::TransmissionCompleted { protocol: Protocol::Udp, destination, .. } => {
            Some(format!("Packet delivered to {}.", ip(*destination)))
        }
        SimEvent::TransmissionAborted { id, reason, hops } => Some(format!(
            "Transmission {} aborted after {} hop(s): {}",
            id, hops, reason
        )),
        SimEvent::MarkerRemoved { .. } => None,
        SimEvent::DraggingLocked => Some("Device dragging disabled during transmission.".to_string()),
        SimEvent::DraggingUnlocked => Some("Device dragging re-enabled.".to_string()),
    }
}

fn run(sim: &mut Simulator, command: Command) -> Vec<String> {
    match command {
        Command::Help => vec![HELP.to_string()],
        Command::ShowDevices => {
            let devices: Vec<String> = sim.topology().devices().map(|d| d.to_string()).collect();
            if devices.is_empty() {
                vec!["No devices found in the network.".to_string()]
            } else {
                devices
            }
        }
        Command::Ping { source, destination } => {
            let result = resolve(sim, &source, &destination)
                .and_then(|(src, dst)| sim.submit_ping(src, dst));
            match result {
                Ok(report) => report.to_string().lines().map(str::to_string).collect(),
                Err(SimError::Unreachable { .. }) => {
                    vec![format!("Ping failed: {destination} is unreachable from {source}.")]
                }
                Err(e) => vec![format!("Error: {e}")],
            }
        }
        Command::SendPacket { source, destination, protocol } => {
            let result = resolve(sim, &source, &destination).and_then(|(src, dst)| {
                sim.submit_transmission(src, dst, protocol.expects_ack())
            });
            match result {
                Ok(_) => vec![format!("Sending {protocol} packet from {source} to {destination}...")],
                Err(SimError::Unreachable { .. }) => {
                    vec![format!("SendPacket failed: {destination} is unreachable from {source}.")]
                }
                Err(e) => vec![format!("Error: {e}")],
            }
        }
        Command::Add { kind } => {
            let id = sim.add_device(kind);
            match sim.topology().device(id) {
                Some(device) => vec![format!("Added {device}")],
                None => vec![format!("Added {kind} (ID: {id})")],
            }
        }
        Command::Connect { first, second, medium } => {
            let result = resolve(sim, &first, &second).and_then(|(a, b)| sim.connect(a, b, medium));
            match result {
                Ok(conn) => {
                    let (a, b) = conn.endpoints();
                    vec![format!(
                        "Connected {} port {} to {} port {} via {}.",
                        first, a.port, second, b.port, medium
                    )]
                }
                Err(e) => vec![format!("Error: {e}")],
            }
        }
        Command::Disconnect { first, second } => {
            let result = resolve(sim, &first, &second).and_then(|(a, b)| sim.disconnect(a, b));
            match result {
                Ok(_) => vec![format!("Deleted connection between {first} and {second}.")],
                Err(e) => vec![format!("Error: {e}")],
            }
        }
        Command::Remove { address } => {
            let result = sim.resolve_ip(&address).and_then(|id| {
                let label = sim
                    .topology()
                    .device(id)
                    .map(|d| format!("{} (ID: {})", d.kind(), id))
                    .unwrap_or_else(|| format!("device {id}"));
                sim.remove_device(id).map(|dropped| (label, dropped.len()))
            });
            match result {
                Ok((label, links)) => vec![format!("Removed {label} and {links} connection(s).")],
                Err(e) => vec![format!("Error: {e}")],
            }
        }
        Command::Configure { address, ip, subnet_mask } => {
            let result = sim
                .resolve_ip(&address)
                .and_then(|id| sim.configure_device(id, &ip, &subnet_mask).map(|_| id));
            match result {
                Ok(id) => {
                    let kind = sim.topology().device(id).map(|d| d.kind().to_string());
                    vec![format!(
                        "Updated {} (ID: {}) - IP: {}, Subnet: {}",
                        kind.unwrap_or_default(),
                        id,
                        ip,
                        subnet_mask
                    )]
                }
                Err(SimError::InvalidAddress(_)) => vec!["Error: Enter valid IP and Subnet.".to_string()],
                Err(e) => vec![format!("Error: {e}")],
            }
        }
        Command::Cancel => match sim.cancel_active() {
            Some(id) => vec![format!("Cancelled transmission {id}.")],
            None => vec!["No transmission in progress.".to_string()],
        },
    }
}

fn resolve(sim: &Simulator, source: &str, destination: &str) -> Result<(DeviceId, DeviceId), SimError> {
    Ok((sim.resolve_ip(source)?, sim.resolve_ip(destination)?))
}
