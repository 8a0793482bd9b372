use crate::network::{DeviceType, Medium};
use crate::transmission::Protocol;
use std::str::FromStr;
use thiserror::Error;

/// A parsed terminal line. Addresses stay as typed; resolving them is the simulator's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    ShowDevices,
    Ping {
        source: String,
        destination: String,
    },
    SendPacket {
        source: String,
        destination: String,
        protocol: Protocol,
    },
    Add {
        kind: DeviceType,
    },
    Connect {
        first: String,
        second: String,
        medium: Medium,
    },
    Disconnect {
        first: String,
        second: String,
    },
    Remove {
        address: String,
    },
    Configure {
        address: String,
        ip: String,
        subnet_mask: String,
    },
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Invalid command. Use: ping <source_ip> <destination_ip>")]
    PingUsage,
    #[error("Invalid command. Use: SendPacket <source_ip> <destination_ip> TCP/UDP")]
    SendPacketUsage,
    #[error("Invalid protocol. Use either TCP or UDP.")]
    InvalidProtocol,
    #[error("Invalid command. Use: add <Router|Switch|Hub|PC|TV|Phone>")]
    AddUsage,
    #[error("Unknown device type: {0}")]
    InvalidDeviceType(String),
    #[error("Invalid command. Use: connect <ip> <ip> Copper/Fiber")]
    ConnectUsage,
    #[error("Invalid medium: {0}. Use either Copper or Fiber.")]
    InvalidMedium(String),
    #[error("Invalid command. Use: disconnect <ip> <ip>")]
    DisconnectUsage,
    #[error("Invalid command. Use: remove <ip>")]
    RemoveUsage,
    #[error("Invalid command. Use: configure <ip> <new_ip> <subnet_mask>")]
    ConfigureUsage,
    #[error("Unknown command. Type 'help' for a list of commands.")]
    Unknown,
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some(head) = words.first() else {
            return Err(ParseError::Unknown);
        };

        match head.to_lowercase().as_str() {
            "help" if words.len() == 1 => Ok(Command::Help),
            "show" if words.len() == 2 && words[1].eq_ignore_ascii_case("devices") => {
                Ok(Command::ShowDevices)
            }
            "ping" => match words[1..] {
                [source, destination] => Ok(Command::Ping {
                    source: source.to_string(),
                    destination: destination.to_string(),
                }),
                _ => Err(ParseError::PingUsage),
            },
            "sendpacket" => match words[1..] {
                [source, destination, protocol] => Ok(Command::SendPacket {
                    source: source.to_string(),
                    destination: destination.to_string(),
                    protocol: protocol.parse().map_err(|_| ParseError::InvalidProtocol)?,
                }),
                _ => Err(ParseError::SendPacketUsage),
            },
            "add" => match words[1..] {
                [kind] => Ok(Command::Add {
                    kind: kind
                        .parse()
                        .map_err(|_| ParseError::InvalidDeviceType(kind.to_string()))?,
                }),
                _ => Err(ParseError::AddUsage),
            },
            "connect" => match words[1..] {
                [first, second, medium] => Ok(Command::Connect {
                    first: first.to_string(),
                    second: second.to_string(),
                    medium: medium
                        .parse()
                        .map_err(|_| ParseError::InvalidMedium(medium.to_string()))?,
                }),
                _ => Err(ParseError::ConnectUsage),
            },
            "disconnect" => match words[1..] {
                [first, second] => Ok(Command::Disconnect {
                    first: first.to_string(),
                    second: second.to_string(),
                }),
                _ => Err(ParseError::DisconnectUsage),
            },
            "remove" => match words[1..] {
                [address] => Ok(Command::Remove { address: address.to_string() }),
                _ => Err(ParseError::RemoveUsage),
            },
            "configure" => match words[1..] {
                [address, ip, subnet_mask] => Ok(Command::Configure {
                    address: address.to_string(),
                    ip: ip.to_string(),
                    subnet_mask: subnet_mask.to_string(),
                }),
                _ => Err(ParseError::ConfigureUsage),
            },
            "cancel" if words.len() == 1 => Ok(Command::Cancel),
            _ => Err(ParseError::Unknown),
        }
    }
}
