use super::{Hop, RequestId};
use crate::network::DeviceId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerColor {
    /// Red while travelling.
    InFlight,
    /// Green once the packet reached the end of its leg.
    Arrived,
}

/// The single on-canvas packet glyph shared by every transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketMarker {
    request: RequestId,
    from: DeviceId,
    to: DeviceId,
    color: MarkerColor,
    linger: Option<u32>,
}

impl PacketMarker {
    pub fn at(hop: &Hop) -> Self {
        Self {
            request: hop.request,
            from: hop.from,
            to: hop.to,
            color: MarkerColor::InFlight,
            linger: None,
        }
    }

    pub fn request(&self) -> RequestId {
        self.request
    }

    /// The edge the marker is drawn on, travelling `from` → `to`.
    pub fn position(&self) -> (DeviceId, DeviceId) {
        (self.from, self.to)
    }

    pub fn color(&self) -> MarkerColor {
        self.color
    }

    pub fn move_to(&mut self, hop: &Hop) {
        self.request = hop.request;
        self.from = hop.from;
        self.to = hop.to;
        self.color = MarkerColor::InFlight;
        self.linger = None;
    }

    /// Turns the marker green; it stays visible for `ticks` idle ticks.
    pub fn arrive(&mut self, ticks: u32) {
        self.color = MarkerColor::Arrived;
        self.linger = Some(ticks);
    }

    /// Counts down an arrived marker. Returns true when it should be removed.
    pub fn expire(&mut self) -> bool {
        match self.linger.as_mut() {
            Some(0) => true,
            Some(left) => {
                *left -= 1;
                *left == 0
            }
            None => false,
        }
    }
}
