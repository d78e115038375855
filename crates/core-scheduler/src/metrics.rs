//! Scheduler counters.
//!
//! Relaxed atomics so a host can read them through a shared reference while
//! the frame loop keeps ticking. Counts are cumulative since construction.

use core_effects::Rejection;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct SchedulerMetrics {
    pub ticks: AtomicU64,
    /// Requests (explicit, queued or ambient) that became instances.
    pub accepted: AtomicU64,
    pub rejected_invalid_target: AtomicU64,
    pub rejected_unknown_kind: AtomicU64,
    pub rejected_cooldown: AtomicU64,
    pub rejected_conflict: AtomicU64,
    pub rejected_intensity: AtomicU64,
    /// Instances displaced by a higher priority newcomer.
    pub preemptions: AtomicU64,
    pub expirations: AtomicU64,
    /// All cancellations, preemptions included.
    pub cancellations: AtomicU64,
    pub ambient_rolls: AtomicU64,
    pub ambient_spawns: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SchedulerMetricsSnapshot {
    pub ticks: u64,
    pub accepted: u64,
    pub rejected_invalid_target: u64,
    pub rejected_unknown_kind: u64,
    pub rejected_cooldown: u64,
    pub rejected_conflict: u64,
    pub rejected_intensity: u64,
    pub preemptions: u64,
    pub expirations: u64,
    pub cancellations: u64,
    pub ambient_rolls: u64,
    pub ambient_spawns: u64,
}

impl SchedulerMetricsSnapshot {
    pub fn rejected_total(&self) -> u64 {
        self.rejected_invalid_target
            + self.rejected_unknown_kind
            + self.rejected_cooldown
            + self.rejected_conflict
            + self.rejected_intensity
    }
}

impl SchedulerMetrics {
    pub(crate) fn record_rejection(&self, rejection: &Rejection) {
        let counter = match rejection {
            Rejection::InvalidTarget { .. } => &self.rejected_invalid_target,
            Rejection::UnknownKind(_) => &self.rejected_unknown_kind,
            Rejection::CooldownActive { .. } => &self.rejected_cooldown,
            Rejection::ConflictLost { .. } => &self.rejected_conflict,
            Rejection::InvalidIntensity => &self.rejected_intensity,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn bump(counter: &AtomicU64, n: u64) {
        if n > 0 {
            counter.fetch_add(n, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> SchedulerMetricsSnapshot {
        SchedulerMetricsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected_invalid_target: self.rejected_invalid_target.load(Ordering::Relaxed),
            rejected_unknown_kind: self.rejected_unknown_kind.load(Ordering::Relaxed),
            rejected_cooldown: self.rejected_cooldown.load(Ordering::Relaxed),
            rejected_conflict: self.rejected_conflict.load(Ordering::Relaxed),
            rejected_intensity: self.rejected_intensity.load(Ordering::Relaxed),
            preemptions: self.preemptions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            cancellations: self.cancellations.load(Ordering::Relaxed),
            ambient_rolls: self.ambient_rolls.load(Ordering::Relaxed),
            ambient_spawns: self.ambient_spawns.load(Ordering::Relaxed),
        }
    }
}
