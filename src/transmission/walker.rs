use super::{Phase, RequestId, TransmissionRequest};
use crate::network::DeviceId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Return,
}

/// One edge traversed by the packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hop {
    pub request: RequestId,
    pub from: DeviceId,
    pub to: DeviceId,
    pub index: usize,
    pub direction: Direction,
    /// Last hop of the current leg.
    pub is_final: bool,
}

/// What the walker did right after a hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Moving,
    /// Forward leg reached the destination and the acknowledgment leg begins.
    TurnedAround,
    /// The request is done.
    Arrived,
}

/// Steps one request along its path: `{path, index, direction}` advanced once per tick.
#[derive(Debug, Clone)]
pub struct PathWalker {
    request: TransmissionRequest,
    leg: TransmissionRequest,
    index: usize,
    direction: Direction,
    hops_walked: u64,
    done: bool,
}

impl PathWalker {
    pub fn new(request: TransmissionRequest) -> Self {
        Self {
            leg: request.clone(),
            request,
            index: 0,
            direction: Direction::Forward,
            hops_walked: 0,
            done: false,
        }
    }

    pub fn request(&self) -> &TransmissionRequest {
        &self.request
    }

    /// The leg being walked right now (the request itself or its acknowledgment).
    pub fn leg(&self) -> &TransmissionRequest {
        &self.leg
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn hops_walked(&self) -> u64 {
        self.hops_walked
    }

    pub fn phase(&self) -> Phase {
        match (self.done, self.direction) {
            (true, _) => Phase::Done,
            (false, Direction::Forward) => Phase::AnimatingForward,
            (false, Direction::Return) => Phase::AnimatingReturn,
        }
    }

    /// Advances one hop. Returns `None` once the walk is over.
    pub fn step(&mut self) -> Option<(Hop, Progress)> {
        if self.done {
            return None;
        }
        let (Some(&from), Some(&to)) = (
            self.leg.path.get(self.index),
            self.leg.path.get(self.index + 1),
        ) else {
            self.done = true;
            return None;
        };

        let is_final = self.index + 2 == self.leg.path.len();
        let hop = Hop {
            request: self.request.id,
            from,
            to,
            index: self.index,
            direction: self.direction,
            is_final,
        };
        self.index += 1;
        self.hops_walked += 1;

        let progress = if !is_final {
            Progress::Moving
        } else if self.leg.expects_ack {
            self.leg = self.leg.acknowledgment();
            self.direction = Direction::Return;
            self.index = 0;
            Progress::TurnedAround
        } else {
            self.done = true;
            Progress::Arrived
        };

        Some((hop, progress))
    }
}
