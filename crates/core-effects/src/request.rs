//! Caller-facing trigger request.

use crate::instance::{EffectDuration, Target};
use crate::kind::EffectKind;

/// A request to schedule one effect. Omitted fields take the kind's
/// descriptor defaults when the scheduler resolves it.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectRequest {
    /// Kind by stable name; resolved against the registry.
    pub kind: String,
    pub target: Target,
    pub intensity: Option<f32>,
    pub priority: Option<i32>,
    pub duration: Option<EffectDuration>,
}

impl EffectRequest {
    pub fn new(kind: impl Into<String>, target: Target) -> Self {
        Self {
            kind: kind.into(),
            target,
            intensity: None,
            priority: None,
            duration: None,
        }
    }

    pub fn of(kind: EffectKind, target: Target) -> Self {
        Self::new(kind.name(), target)
    }

    pub fn intensity(mut self, intensity: f32) -> Self {
        self.intensity = Some(intensity);
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn ticks(mut self, ticks: u32) -> Self {
        self.duration = Some(EffectDuration::Ticks(ticks));
        self
    }

    pub fn indefinite(mut self) -> Self {
        self.duration = Some(EffectDuration::Indefinite);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_optional_fields() {
        let r = EffectRequest::of(EffectKind::Flicker, Target::line(5))
            .priority(5)
            .ticks(30);
        assert_eq!(r.kind, "flicker");
        assert_eq!(r.priority, Some(5));
        assert_eq!(r.duration, Some(EffectDuration::Ticks(30)));
        assert_eq!(r.intensity, None);
    }
}
