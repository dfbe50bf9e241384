//! Request/response correlation state for one capture run
//!
//! Requests are remembered by the host's flow id so that a response is
//! attached to the request of its own flow, even if the host interleaves
//! several flows. Events without a flow id fall back to sequence order:
//! the response belongs to the most recently recorded request.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::event::FlowId;
use crate::gateway::RowId;

/// Identifier of the active capture run (always strictly positive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(i32);

impl RunId {
    /// `None` unless `id` is strictly positive
    pub fn new(id: i32) -> Option<Self> {
        (id > 0).then_some(Self(id))
    }

    pub fn get(self) -> i32 {
        self.0
    }
}

impl FromStr for RunId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::MissingRunId);
        }

        let id: i64 = trimmed
            .parse()
            .map_err(|_| ConfigError::InvalidRunId(s.to_owned()))?;
        if id <= 0 {
            return Err(ConfigError::NonPositiveRunId(id));
        }

        i32::try_from(id)
            .map(Self)
            .map_err(|_| ConfigError::InvalidRunId(s.to_owned()))
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a response was matched to its parent request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correlation {
    /// Matched through the flow id shared with the request
    Flow(RowId),
    /// No flow id on the response; last recorded request was used
    Sequence(RowId),
    /// No matching request is known
    Unmatched,
}

impl Correlation {
    pub fn request_id(self) -> Option<RowId> {
        match self {
            Self::Flow(id) | Self::Sequence(id) => Some(id),
            Self::Unmatched => None,
        }
    }
}

/// Run id plus the requests still waiting for their response
#[derive(Debug)]
pub struct CorrelationState {
    run_id: RunId,
    last_request: Option<RowId>,
    pending: HashMap<FlowId, RowId>,
    /// Insertion order of `pending`, oldest first
    order: VecDeque<FlowId>,
    capacity: usize,
}

impl CorrelationState {
    pub const DEFAULT_CAPACITY: usize = 4096;

    pub fn new(run_id: RunId) -> Self {
        Self::with_capacity(run_id, Self::DEFAULT_CAPACITY)
    }

    /// Keep at most `capacity` unanswered requests; the oldest is dropped first
    pub fn with_capacity(run_id: RunId, capacity: usize) -> Self {
        Self {
            run_id,
            last_request: None,
            pending: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn last_request(&self) -> Option<RowId> {
        self.last_request
    }

    /// Number of requests still waiting for a response
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Remember a freshly inserted request
    pub fn record_request(&mut self, flow_id: Option<&FlowId>, request_id: RowId) {
        self.last_request = Some(request_id);

        let Some(flow_id) = flow_id else {
            return;
        };

        if self.pending.insert(flow_id.clone(), request_id).is_none() {
            self.order.push_back(flow_id.clone());
        }

        while self.pending.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            if self.pending.remove(&oldest).is_some() {
                tracing::debug!("Dropped unanswered request of flow {}", oldest);
            }
        }
    }

    /// Find the parent request for a response without consuming it
    pub fn parent_of(&self, flow_id: Option<&FlowId>) -> Correlation {
        match flow_id {
            Some(flow_id) => self
                .pending
                .get(flow_id)
                .map_or(Correlation::Unmatched, |&id| Correlation::Flow(id)),
            None => self
                .last_request
                .map_or(Correlation::Unmatched, Correlation::Sequence),
        }
    }

    /// Forget the pending request of a flow once its response is stored
    pub fn complete(&mut self, flow_id: &FlowId) -> Option<RowId> {
        let request_id = self.pending.remove(flow_id)?;
        self.order.retain(|pending| pending != flow_id);
        Some(request_id)
    }

    /// Find the parent request for a response and forget it
    pub fn take_parent(&mut self, flow_id: Option<&FlowId>) -> Correlation {
        let correlation = self.parent_of(flow_id);
        if let (Correlation::Flow(_), Some(flow_id)) = (correlation, flow_id) {
            self.complete(flow_id);
        }
        correlation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run() -> RunId {
        RunId::new(42).unwrap()
    }

    #[test]
    fn test_run_id_parsing() {
        assert_eq!("42".parse::<RunId>().unwrap().get(), 42);
        assert_eq!(" 7 ".parse::<RunId>().unwrap().get(), 7);
        assert_eq!("".parse::<RunId>(), Err(ConfigError::MissingRunId));
        assert_eq!("0".parse::<RunId>(), Err(ConfigError::NonPositiveRunId(0)));
        assert_eq!("-3".parse::<RunId>(), Err(ConfigError::NonPositiveRunId(-3)));
        assert_eq!(
            "abc".parse::<RunId>(),
            Err(ConfigError::InvalidRunId("abc".to_string()))
        );
        assert!(matches!(
            "99999999999".parse::<RunId>(),
            Err(ConfigError::InvalidRunId(_))
        ));
    }

    #[test]
    fn test_sequence_fallback_uses_last_request() {
        let mut state = CorrelationState::new(run());
        assert_eq!(state.take_parent(None), Correlation::Unmatched);

        state.record_request(None, 10);
        state.record_request(None, 11);

        assert_eq!(state.take_parent(None), Correlation::Sequence(11));
        assert_eq!(state.last_request(), Some(11));
    }

    #[test]
    fn test_interleaved_flows_are_not_cross_wired() {
        let mut state = CorrelationState::new(run());
        let a = FlowId::new("a");
        let b = FlowId::new("b");

        state.record_request(Some(&a), 1);
        state.record_request(Some(&b), 2);

        assert_eq!(state.take_parent(Some(&a)), Correlation::Flow(1));
        assert_eq!(state.take_parent(Some(&b)), Correlation::Flow(2));
        assert_eq!(state.pending(), 0);
    }

    #[test]
    fn test_unknown_flow_is_unmatched() {
        let mut state = CorrelationState::new(run());
        state.record_request(Some(&FlowId::new("a")), 1);

        assert_eq!(
            state.take_parent(Some(&FlowId::new("zzz"))),
            Correlation::Unmatched
        );
        // A response is matched at most once
        assert_eq!(state.take_parent(Some(&FlowId::new("a"))), Correlation::Flow(1));
        assert_eq!(
            state.take_parent(Some(&FlowId::new("a"))),
            Correlation::Unmatched
        );
    }

    #[test]
    fn test_oldest_pending_request_is_evicted() {
        let mut state = CorrelationState::with_capacity(run(), 2);

        for (i, flow) in ["a", "b", "c"].iter().enumerate() {
            state.record_request(Some(&FlowId::new(*flow)), i as RowId);
        }

        assert_eq!(state.pending(), 2);
        assert_eq!(
            state.take_parent(Some(&FlowId::new("a"))),
            Correlation::Unmatched
        );
        assert_eq!(state.take_parent(Some(&FlowId::new("c"))), Correlation::Flow(2));
    }

    #[test]
    fn test_reused_flow_id_is_not_evicted_early() {
        let mut state = CorrelationState::with_capacity(run(), 2);
        let a = FlowId::new("a");

        state.record_request(Some(&a), 1);
        assert_eq!(state.take_parent(Some(&a)), Correlation::Flow(1));

        state.record_request(Some(&FlowId::new("b")), 2);
        state.record_request(Some(&a), 3);
        state.record_request(Some(&FlowId::new("c")), 4);

        // "b" is the oldest live entry, not the re-recorded "a"
        assert_eq!(state.take_parent(Some(&a)), Correlation::Flow(3));
        assert_eq!(
            state.take_parent(Some(&FlowId::new("b"))),
            Correlation::Unmatched
        );
    }

    #[test]
    fn test_parent_of_does_not_consume() {
        let mut state = CorrelationState::new(run());
        let a = FlowId::new("a");
        state.record_request(Some(&a), 5);

        assert_eq!(state.parent_of(Some(&a)), Correlation::Flow(5));
        assert_eq!(state.parent_of(Some(&a)), Correlation::Flow(5));
        assert_eq!(state.pending(), 1);

        assert_eq!(state.complete(&a), Some(5));
        assert_eq!(state.complete(&a), None);
        assert_eq!(state.parent_of(Some(&a)), Correlation::Unmatched);
    }
}
