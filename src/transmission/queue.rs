use super::walker::{Hop, PathWalker, Progress};
use super::{Phase, Protocol, RequestId, TransmissionRequest};
use crate::error::{Result, SimError};
use crate::network::DeviceId;
use std::collections::VecDeque;
use tracing::debug;

/// A request that left the queue, with how far it got.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finished {
    pub request: TransmissionRequest,
    pub hops_walked: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advance {
    pub hop: Hop,
    pub progress: Progress,
    /// Set when this hop completed the active request.
    pub finished: Option<Finished>,
    /// Request activated in its place, if one was waiting.
    pub next: Option<RequestId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub id: RequestId,
    /// True when the request went straight to `AnimatingForward`.
    pub started: bool,
}

/// FIFO of transmissions with at most one walking at a time.
#[derive(Debug, Default)]
pub struct TransmissionQueue {
    pending: VecDeque<TransmissionRequest>,
    active: Option<PathWalker>,
    next_id: u64,
}

impl TransmissionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a walk over `path` (source first). Paths shorter than one hop are refused.
    pub fn submit(&mut self, path: Vec<DeviceId>, protocol: Protocol) -> Result<Submission> {
        let id = RequestId::new(self.next_id + 1);
        let request = TransmissionRequest::new(id, path, protocol).ok_or(SimError::SameEndpoints)?;
        self.next_id += 1;
        self.pending.push_back(request);
        debug!("Queued transmission {} ({} pending)", id, self.pending.len());

        let started = self.active.is_none() && self.start_next() == Some(id);
        Ok(Submission { id, started })
    }

    /// Moves the active request one hop. Does nothing when idle.
    pub fn advance(&mut self) -> Option<Advance> {
        let walker = self.active.as_mut()?;
        let Some((hop, progress)) = walker.step() else {
            // a walker with nothing left to do is finished
            let finished = self.finish_active();
            debug!("Dropped exhausted walker {:?}", finished.map(|f| f.request.id));
            self.start_next();
            return None;
        };

        let mut finished = None;
        let mut next = None;
        if progress == Progress::Arrived {
            finished = self.finish_active();
            next = self.start_next();
        }

        Some(Advance { hop, progress, finished, next })
    }

    /// Stops the active walk and starts the next request.
    pub fn cancel_active(&mut self) -> Option<(Finished, Option<RequestId>)> {
        let finished = self.finish_active()?;
        let next = self.start_next();
        Some((finished, next))
    }

    /// Removes every queued or active request `doomed` selects, then restarts the queue if needed.
    pub fn abort_where<F>(&mut self, doomed: F) -> (Vec<Finished>, Option<RequestId>)
    where
        F: Fn(&TransmissionRequest) -> bool,
    {
        let mut aborted = Vec::new();

        if self.active.as_ref().is_some_and(|w| doomed(w.request())) {
            aborted.extend(self.finish_active());
        }

        let (dropped, kept): (Vec<_>, Vec<_>) = self.pending.drain(..).partition(|r| doomed(r));
        self.pending = kept.into();
        aborted.extend(dropped.into_iter().map(|request| Finished { request, hops_walked: 0 }));

        let next = if self.active.is_none() { self.start_next() } else { None };
        (aborted, next)
    }

    pub fn is_busy(&self) -> bool {
        self.active.is_some() || !self.pending.is_empty()
    }

    pub fn active(&self) -> Option<&PathWalker> {
        self.active.as_ref()
    }

    pub fn pending(&self) -> impl Iterator<Item = &TransmissionRequest> {
        self.pending.iter()
    }

    /// `None` once a request is done (or was never submitted).
    pub fn phase(&self, id: RequestId) -> Option<Phase> {
        if let Some(walker) = self.active.as_ref().filter(|w| w.request().id == id) {
            return Some(walker.phase());
        }
        self.pending.iter().any(|r| r.id == id).then_some(Phase::Queued)
    }

    fn start_next(&mut self) -> Option<RequestId> {
        let request = self.pending.pop_front()?;
        let id = request.id;
        debug!("Transmission {} is now walking", id);
        self.active = Some(PathWalker::new(request));
        Some(id)
    }

    fn finish_active(&mut self) -> Option<Finished> {
        self.active.take().map(|walker| Finished {
            hops_walked: walker.hops_walked(),
            request: walker.request().clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(raw: &[u32]) -> Vec<DeviceId> {
        raw.iter().copied().map(DeviceId::new).collect()
    }

    fn drain(queue: &mut TransmissionQueue) -> Vec<Advance> {
        std::iter::from_fn(|| queue.advance()).collect()
    }

    #[test]
    fn first_submission_starts_at_once() {
        let mut queue = TransmissionQueue::new();
        let first = queue.submit(path(&[1, 2]), Protocol::Udp).unwrap();
        let second = queue.submit(path(&[2, 1]), Protocol::Udp).unwrap();

        assert!(first.started);
        assert!(!second.started);
        assert_eq!(queue.phase(first.id), Some(Phase::AnimatingForward));
        assert_eq!(queue.phase(second.id), Some(Phase::Queued));
        assert!(queue.is_busy());
    }

    #[test]
    fn zero_hop_paths_are_refused() {
        let mut queue = TransmissionQueue::new();
        assert_eq!(queue.submit(path(&[1]), Protocol::Tcp), Err(SimError::SameEndpoints));
        assert_eq!(queue.submit(Vec::new(), Protocol::Udp), Err(SimError::SameEndpoints));
        assert!(!queue.is_busy());

        // refusals do not burn ids
        let first = queue.submit(path(&[1, 2]), Protocol::Udp).unwrap();
        assert_eq!(first.id, RequestId::new(1));
        assert_eq!(queue.active().map(|w| w.request().source), Some(DeviceId::new(1)));
    }

    #[test]
    fn completes_in_submission_order_one_at_a_time() {
        let mut queue = TransmissionQueue::new();
        let ids: Vec<_> = [path(&[1, 2, 3]), path(&[3, 2]), path(&[2, 1, 4])]
            .into_iter()
            .zip([Protocol::Tcp, Protocol::Udp, Protocol::Udp])
            .map(|(p, proto)| queue.submit(p, proto).unwrap().id)
            .collect();

        let mut finished = Vec::new();
        while let Some(advance) = queue.advance() {
            // only the active request ever moves
            let active: Vec<_> = ids
                .iter()
                .filter(|&&id| {
                    matches!(queue.phase(id), Some(Phase::AnimatingForward | Phase::AnimatingReturn))
                })
                .collect();
            assert!(active.len() <= 1);
            if let Some(done) = advance.finished {
                finished.push(done.request.id);
            }
        }

        assert_eq!(finished, ids);
        assert!(!queue.is_busy());
        assert!(ids.iter().all(|&id| queue.phase(id).is_none()));
    }

    #[test]
    fn hop_counts_per_protocol() {
        let mut queue = TransmissionQueue::new();
        queue.submit(path(&[1, 2, 3, 4]), Protocol::Tcp).unwrap();
        let advances = drain(&mut queue);
        assert_eq!(advances.len(), 6);
        assert_eq!(advances.last().and_then(|a| a.finished.as_ref()).map(|f| f.hops_walked), Some(6));

        queue.submit(path(&[1, 2, 3, 4]), Protocol::Udp).unwrap();
        assert_eq!(drain(&mut queue).len(), 3);
    }

    #[test]
    fn completion_hands_over_to_the_next_request() {
        let mut queue = TransmissionQueue::new();
        let a = queue.submit(path(&[1, 2]), Protocol::Udp).unwrap().id;
        let b = queue.submit(path(&[2, 3]), Protocol::Udp).unwrap().id;

        let advance = queue.advance().unwrap();
        assert_eq!(advance.progress, Progress::Arrived);
        assert_eq!(advance.finished.map(|f| f.request.id), Some(a));
        assert_eq!(advance.next, Some(b));
        assert_eq!(queue.phase(b), Some(Phase::AnimatingForward));
    }

    #[test]
    fn cancel_moves_on() {
        let mut queue = TransmissionQueue::new();
        let a = queue.submit(path(&[1, 2, 3]), Protocol::Tcp).unwrap().id;
        let b = queue.submit(path(&[3, 4]), Protocol::Udp).unwrap().id;
        queue.advance();

        let (cancelled, next) = queue.cancel_active().unwrap();
        assert_eq!((cancelled.request.id, cancelled.hops_walked), (a, 1));
        assert_eq!(next, Some(b));

        queue.cancel_active();
        assert!(queue.cancel_active().is_none());
        assert!(!queue.is_busy());
    }

    #[test]
    fn abort_drops_matching_requests_only() {
        let mut queue = TransmissionQueue::new();
        let a = queue.submit(path(&[1, 2, 3]), Protocol::Udp).unwrap().id;
        let b = queue.submit(path(&[4, 5]), Protocol::Udp).unwrap().id;
        let c = queue.submit(path(&[3, 2]), Protocol::Udp).unwrap().id;

        let (aborted, next) = queue.abort_where(|r| r.uses_device(DeviceId::new(2)));
        let aborted: Vec<_> = aborted.into_iter().map(|f| f.request.id).collect();
        assert_eq!(aborted, vec![a, c]);
        assert_eq!(next, Some(b));
        assert_eq!(queue.pending().count(), 0);
        assert_eq!(queue.phase(b), Some(Phase::AnimatingForward));
    }
}
