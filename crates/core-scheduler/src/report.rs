//! Per-tick summary handed back to the host.

use core_effects::{CancelReason, InstanceId, Rejection, Ticket};

/// What changed during one `tick()`. Lists are in processing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    /// Queued instances that became Active.
    pub promoted: Vec<InstanceId>,
    pub expired: Vec<InstanceId>,
    pub cancelled: Vec<(InstanceId, CancelReason)>,
    /// Instances created by ambient rolls (already Active).
    pub ambient_spawned: Vec<InstanceId>,
    pub ambient_rolls: usize,
    /// Outcomes for requests that arrived through the intake queue.
    pub intake: Vec<(Ticket, Result<InstanceId, Rejection>)>,
}

impl TickReport {
    pub(crate) fn new(tick: u64) -> Self {
        Self {
            tick,
            ..Default::default()
        }
    }

    /// True when the set of visible instances changed.
    pub fn changed(&self) -> bool {
        !(self.promoted.is_empty()
            && self.expired.is_empty()
            && self.cancelled.is_empty()
            && self.ambient_spawned.is_empty()
            && self.intake.iter().all(|(_, r)| r.is_err()))
    }

    pub fn outcome(&self, ticket: Ticket) -> Option<&Result<InstanceId, Rejection>> {
        self.intake
            .iter()
            .find(|(t, _)| *t == ticket)
            .map(|(_, r)| r)
    }
}

/// Result of `cancel(id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The instance is hidden now and leaves the set at the next tick.
    Cancelled,
    /// Unknown id, or the instance already reached a terminal state.
    NotFound,
}
