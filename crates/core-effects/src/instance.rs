//! Live effect instances and the identifiers around them.

use crate::kind::{EffectKind, ExclusivityGroup};
use std::fmt;

/// Identifier of an accepted instance. Monotonic, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Receipt for a request posted through the cross-context intake queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(pub u64);

/// Region an instance applies to. Line ranges are half-open `[start, end)` over
/// absolute buffer indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Target {
    Lines { start: usize, end: usize },
    Global,
}

impl Target {
    /// Single-line target. `usize::MAX` yields an empty range that
    /// validation rejects.
    pub fn line(index: usize) -> Self {
        Target::Lines {
            start: index,
            end: index.saturating_add(1),
        }
    }

    pub fn lines(range: std::ops::Range<usize>) -> Self {
        Target::Lines {
            start: range.start,
            end: range.end,
        }
    }

    pub fn range(&self) -> Option<std::ops::Range<usize>> {
        match *self {
            Target::Lines { start, end } => Some(start..end),
            Target::Global => None,
        }
    }

    /// Number of lines covered (0 for `Global`).
    pub fn line_count(&self) -> usize {
        match *self {
            Target::Lines { start, end } => end.saturating_sub(start),
            Target::Global => 0,
        }
    }

    /// Whether rendering line `index` must consult this target.
    pub fn covers(&self, index: usize) -> bool {
        match *self {
            Target::Lines { start, end } => index >= start && index < end,
            Target::Global => true,
        }
    }

    /// Collision test for exclusivity: overlapping line ranges collide, `Global`
    /// collides only with `Global`.
    pub fn overlaps(&self, other: &Target) -> bool {
        match (*self, *other) {
            (Target::Global, Target::Global) => true,
            (Target::Lines { start: a, end: b }, Target::Lines { start: c, end: d }) => {
                a < d && c < b
            }
            _ => false,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Target::Lines { start, end } if end == start + 1 => write!(f, "line{start}"),
            Target::Lines { start, end } => write!(f, "lines{start}..{end}"),
            Target::Global => f.write_str("global"),
        }
    }
}

/// Lifetime of an instance in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectDuration {
    Ticks(u32),
    /// Lives until cancelled explicitly (by id or `clear_all`).
    Indefinite,
}

/// Rate-limit key: the same kind on the same target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CooldownKey {
    pub kind: EffectKind,
    pub target: Target,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    Explicit,
    Ambient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstanceState {
    Queued,
    Active,
    Expired,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancelReason {
    Preempted { by: InstanceId },
    Cleared,
    Explicit,
    TargetEvicted,
}

/// A scheduled distortion. Immutable once created; the scheduler only moves it
/// between states.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectInstance {
    pub id: InstanceId,
    pub kind: EffectKind,
    pub target: Target,
    pub start_tick: u64,
    pub duration: EffectDuration,
    /// Strength in `[0, 1]`.
    pub intensity: f32,
    pub priority: i32,
    pub group: ExclusivityGroup,
    pub cooldown_key: CooldownKey,
    /// Drawn from the scheduler's random source at creation; the renderer derives
    /// every pseudo-random choice from it.
    pub seed: u64,
    pub origin: Origin,
}

impl EffectInstance {
    /// First tick at which the instance is no longer active (None when indefinite).
    pub fn end_tick(&self) -> Option<u64> {
        match self.duration {
            EffectDuration::Ticks(n) => Some(self.start_tick + n as u64),
            EffectDuration::Indefinite => None,
        }
    }

    /// Expiry rule: finite and `start_tick + duration <= tick`.
    pub fn is_expired_at(&self, tick: u64) -> bool {
        self.end_tick().is_some_and(|end| end <= tick)
    }

    /// Fraction of the lifetime elapsed at `tick`, in `[0, 1]`. Indefinite
    /// instances report full progress.
    pub fn progress(&self, tick: u64) -> f32 {
        match self.duration {
            EffectDuration::Ticks(0) | EffectDuration::Indefinite => 1.0,
            EffectDuration::Ticks(n) => {
                let elapsed = tick.saturating_sub(self.start_tick) as f32;
                (elapsed / n as f32).clamp(0.0, 1.0)
            }
        }
    }

    /// Whether a newcomer in `group` aimed at `target` contends with this
    /// instance for exclusivity.
    pub fn collides_with(&self, group: ExclusivityGroup, target: &Target) -> bool {
        self.group == group && self.target.overlaps(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inst(target: Target, start: u64, duration: EffectDuration) -> EffectInstance {
        EffectInstance {
            id: InstanceId(1),
            kind: EffectKind::Flicker,
            target,
            start_tick: start,
            duration,
            intensity: 0.5,
            priority: 0,
            group: ExclusivityGroup::VisualOverlay,
            cooldown_key: CooldownKey {
                kind: EffectKind::Flicker,
                target,
            },
            seed: 7,
            origin: Origin::Explicit,
        }
    }

    #[test]
    fn overlap_rules() {
        assert!(Target::line(5).overlaps(&Target::lines(3..6)));
        assert!(!Target::line(6).overlaps(&Target::lines(3..6)));
        assert!(Target::Global.overlaps(&Target::Global));
        assert!(!Target::Global.overlaps(&Target::line(0)));
        assert!(Target::Global.covers(42));
    }

    #[test]
    fn last_line_index_does_not_overflow() {
        let t = Target::line(usize::MAX);
        assert_eq!(t.line_count(), 0);
        assert!(!t.covers(usize::MAX));
    }

    #[test]
    fn collisions_need_same_group_and_overlap() {
        let i = inst(Target::lines(2..5), 0, EffectDuration::Ticks(5));
        assert!(i.collides_with(ExclusivityGroup::VisualOverlay, &Target::line(4)));
        assert!(!i.collides_with(ExclusivityGroup::Geometry, &Target::line(4)));
        assert!(!i.collides_with(ExclusivityGroup::VisualOverlay, &Target::line(5)));
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let i = inst(Target::line(0), 10, EffectDuration::Ticks(5));
        assert!(!i.is_expired_at(14));
        assert!(i.is_expired_at(15));
        let forever = inst(Target::line(0), 10, EffectDuration::Indefinite);
        assert!(!forever.is_expired_at(u64::MAX));
    }

    #[test]
    fn progress_clamps() {
        let i = inst(Target::Global, 10, EffectDuration::Ticks(10));
        assert_eq!(i.progress(5), 0.0);
        assert_eq!(i.progress(15), 0.5);
        assert_eq!(i.progress(40), 1.0);
    }
}
