//! Static catalog of effect kinds.
//!
//! Built once (from the built-in table, optionally tuned by the `[effects]`
//! config section) and read-only afterwards. The scheduler validates every
//! request against it; the renderer reads animation rates from it.

use crate::error::EffectError;
use crate::instance::Target;
use crate::kind::{Applicability, Category, EffectKind, ExclusivityGroup};
use ahash::AHashMap;
use core_config::EffectOverride;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Inclusive tick range an instance's lifetime is sampled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationRange {
    pub min: u32,
    pub max: u32,
}

impl DurationRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Map a uniform roll onto the range; `min` and `max` swap if inverted.
    pub fn pick(&self, roll: u32) -> u32 {
        let (lo, hi) = if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        };
        let span = hi - lo;
        if span == u32::MAX {
            return roll;
        }
        lo + roll % (span + 1)
    }

    /// Midpoint, used when a request omits its duration.
    pub fn midpoint(&self) -> u32 {
        let (lo, hi) = (self.min.min(self.max), self.min.max(self.max));
        lo + (hi - lo) / 2
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectKindDescriptor {
    pub kind: EffectKind,
    pub name: &'static str,
    /// Ambient roll category; `None` means the kind never spawns ambiently.
    pub category: Option<Category>,
    pub duration: DurationRange,
    pub applicability: Applicability,
    pub group: ExclusivityGroup,
    pub priority: i32,
    pub ambient_priority: i32,
    /// Cooldown at level 0; the profile shrinks it as corruption rises.
    pub base_cooldown: u32,
    /// Ticks per pattern change while animating.
    pub rate: u32,
}

impl EffectKindDescriptor {
    #[allow(clippy::too_many_arguments)]
    const fn builtin(
        kind: EffectKind,
        category: Option<Category>,
        applicability: Applicability,
        group: ExclusivityGroup,
        duration: DurationRange,
        priority: i32,
        ambient_priority: i32,
        base_cooldown: u32,
        rate: u32,
    ) -> Self {
        Self {
            kind,
            name: kind.name(),
            category,
            duration,
            applicability,
            group,
            priority,
            ambient_priority,
            base_cooldown,
            rate,
        }
    }

    /// Whether `target` has the shape this kind needs. Presence of the lines in
    /// the buffer is checked separately by the scheduler.
    pub fn applies_to(&self, target: &Target) -> Result<(), &'static str> {
        match (self.applicability, target) {
            (_, Target::Lines { start, end }) if end <= start => Err("empty line range"),
            (Applicability::Global, Target::Global) => Ok(()),
            (Applicability::Global, Target::Lines { .. }) => Err("kind only applies globally"),
            (_, Target::Global) => Err("kind does not apply globally"),
            (Applicability::Character | Applicability::Line, t) if t.line_count() != 1 => {
                Err("kind applies to a single line")
            }
            _ => Ok(()),
        }
    }

    /// Animation step for `tick` (pattern index that changes every `rate` ticks).
    pub fn step(&self, tick: u64, start_tick: u64) -> u64 {
        tick.saturating_sub(start_tick) / self.rate.max(1) as u64
    }
}

use Applicability as A;
use Category as C;
use EffectKind as K;
use ExclusivityGroup as G;

#[rustfmt::skip]
const BUILTIN: [EffectKindDescriptor; 12] = [
    EffectKindDescriptor::builtin(K::CharacterDecay, Some(C::Glyph), A::Character, G::VisualOverlay, DurationRange::new(20, 60), 10, 2, 90, 4),
    EffectKindDescriptor::builtin(K::CharacterStutter, Some(C::Glyph), A::Character, G::VisualOverlay, DurationRange::new(8, 24), 8, 1, 60, 2),
    EffectKindDescriptor::builtin(K::CharacterJitter, Some(C::Geometry), A::Character, G::Geometry, DurationRange::new(10, 30), 6, 1, 60, 2),
    EffectKindDescriptor::builtin(K::Flicker, Some(C::Color), A::Line, G::VisualOverlay, DurationRange::new(10, 40), 5, 1, 45, 3),
    EffectKindDescriptor::builtin(K::ColorBleed, Some(C::Color), A::Line, G::VisualOverlay, DurationRange::new(30, 90), 7, 2, 120, 6),
    EffectKindDescriptor::builtin(K::ColorShift, Some(C::Color), A::Line, G::VisualOverlay, DurationRange::new(20, 60), 6, 1, 90, 1),
    EffectKindDescriptor::builtin(K::Redaction, Some(C::Glyph), A::Block, G::VisualOverlay, DurationRange::new(30, 90), 12, 3, 150, 8),
    EffectKindDescriptor::builtin(K::ScreenTear, Some(C::Geometry), A::Block, G::Geometry, DurationRange::new(4, 12), 9, 2, 80, 1),
    EffectKindDescriptor::builtin(K::TextBreathing, Some(C::Atmosphere), A::Global, G::Luminance, DurationRange::new(60, 180), 3, 0, 240, 1),
    EffectKindDescriptor::builtin(K::Scanline, Some(C::Atmosphere), A::Global, G::Luminance, DurationRange::new(40, 120), 4, 0, 200, 2),
    EffectKindDescriptor::builtin(K::GlyphNoise, Some(C::Glyph), A::Global, G::Noise, DurationRange::new(10, 40), 5, 1, 150, 3),
    EffectKindDescriptor::builtin(K::Typing, None, A::Line, G::Reveal, DurationRange::new(20, 60), 15, 0, 0, 1),
];

#[derive(Debug, Clone)]
pub struct EffectRegistry {
    descriptors: BTreeMap<EffectKind, EffectKindDescriptor>,
    by_name: AHashMap<&'static str, EffectKind>,
}

impl Default for EffectRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl EffectRegistry {
    pub fn builtin() -> Self {
        Self::from_descriptors(BUILTIN.to_vec())
    }

    /// Built-in table with `[effects.<name>]` overrides applied. Unknown names
    /// and invalid group strings are logged and ignored.
    pub fn from_config(overrides: &BTreeMap<String, EffectOverride>) -> Self {
        let mut descriptors = Vec::with_capacity(BUILTIN.len());
        for name in overrides.keys() {
            if EffectKind::from_name(name).is_none() {
                warn!(target: "effects.registry", name = name.as_str(), "override_for_unknown_kind");
            }
        }
        for mut d in BUILTIN {
            let Some(o) = overrides.get(d.name) else {
                descriptors.push(d);
                continue;
            };
            if !o.enabled {
                debug!(target: "effects.registry", kind = d.name, "kind_disabled");
                continue;
            }
            if let Some(min) = o.min_ticks {
                d.duration.min = min;
            }
            if let Some(max) = o.max_ticks {
                d.duration.max = max;
            }
            if d.duration.min > d.duration.max {
                std::mem::swap(&mut d.duration.min, &mut d.duration.max);
            }
            if let Some(p) = o.priority {
                d.priority = p;
            }
            if let Some(p) = o.ambient_priority {
                d.ambient_priority = p;
            }
            if let Some(c) = o.cooldown {
                d.base_cooldown = c;
            }
            if let Some(group) = o.group.as_deref() {
                match ExclusivityGroup::from_name(group) {
                    Some(g) => d.group = g,
                    None => {
                        warn!(target: "effects.registry", kind = d.name, group, "unknown_group_ignored")
                    }
                }
            }
            descriptors.push(d);
        }
        Self::from_descriptors(descriptors)
    }

    fn from_descriptors(list: Vec<EffectKindDescriptor>) -> Self {
        let by_name = list.iter().map(|d| (d.name, d.kind)).collect();
        let descriptors = list.into_iter().map(|d| (d.kind, d)).collect();
        Self {
            descriptors,
            by_name,
        }
    }

    pub fn lookup(&self, name: &str) -> Result<&EffectKindDescriptor, EffectError> {
        self.by_name
            .get(name)
            .and_then(|k| self.descriptors.get(k))
            .ok_or_else(|| EffectError::UnknownKind(name.to_string()))
    }

    pub fn get(&self, kind: EffectKind) -> Result<&EffectKindDescriptor, EffectError> {
        self.descriptors
            .get(&kind)
            .ok_or_else(|| EffectError::UnknownKind(kind.name().to_string()))
    }

    /// Enabled kinds of `category`, in declaration order.
    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &EffectKindDescriptor> {
        self.descriptors
            .values()
            .filter(move |d| d.category == Some(category))
    }

    pub fn iter(&self) -> impl Iterator<Item = &EffectKindDescriptor> {
        self.descriptors.values()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builtin_lookup_by_name() {
        let reg = EffectRegistry::builtin();
        assert_eq!(reg.len(), 12);
        let d = reg.lookup("character_decay").unwrap();
        assert_eq!(d.kind, EffectKind::CharacterDecay);
        assert_eq!(d.group, ExclusivityGroup::VisualOverlay);
        assert_eq!(
            reg.lookup("nope"),
            Err(EffectError::UnknownKind("nope".into()))
        );
    }

    #[test]
    fn applicability_shapes() {
        let reg = EffectRegistry::builtin();
        let decay = reg.get(EffectKind::CharacterDecay).unwrap();
        assert!(decay.applies_to(&Target::line(3)).is_ok());
        assert!(decay.applies_to(&Target::lines(3..5)).is_err());
        assert!(decay.applies_to(&Target::Global).is_err());
        let tear = reg.get(EffectKind::ScreenTear).unwrap();
        assert!(tear.applies_to(&Target::lines(0..4)).is_ok());
        assert!(tear.applies_to(&Target::lines(4..4)).is_err());
        let scan = reg.get(EffectKind::Scanline).unwrap();
        assert!(scan.applies_to(&Target::Global).is_ok());
        assert!(scan.applies_to(&Target::line(0)).is_err());
    }

    #[test]
    fn character_kinds_target_like_line_kinds() {
        let reg = EffectRegistry::builtin();
        let line_kind = reg.get(EffectKind::Flicker).unwrap();
        let character_kinds: Vec<_> = reg
            .iter()
            .filter(|d| d.applicability == Applicability::Character)
            .collect();
        assert_eq!(character_kinds.len(), 3);
        let targets = [
            Target::line(0),
            Target::lines(2..3),
            Target::lines(0..2),
            Target::lines(5..5),
            Target::Global,
        ];
        for d in character_kinds {
            for t in &targets {
                assert_eq!(d.applies_to(t), line_kind.applies_to(t), "{:?} on {t:?}", d.kind);
            }
        }
    }

    #[test]
    fn overrides_disable_and_retune() {
        let mut overrides = BTreeMap::new();
        overrides.insert(
            "flicker".to_string(),
            EffectOverride {
                enabled: false,
                ..Default::default()
            },
        );
        overrides.insert(
            "redaction".to_string(),
            EffectOverride {
                min_ticks: Some(100),
                max_ticks: Some(10),
                priority: Some(40),
                group: Some("noise".into()),
                ..Default::default()
            },
        );
        let reg = EffectRegistry::from_config(&overrides);
        assert_eq!(reg.len(), 11);
        assert!(reg.lookup("flicker").is_err());
        let r = reg.lookup("redaction").unwrap();
        assert_eq!(r.duration, DurationRange::new(10, 100));
        assert_eq!(r.priority, 40);
        assert_eq!(r.group, ExclusivityGroup::Noise);
    }

    #[test]
    fn typing_has_no_ambient_category() {
        let reg = EffectRegistry::builtin();
        for c in Category::ALL {
            assert!(reg.in_category(c).all(|d| d.kind != EffectKind::Typing));
        }
        assert_eq!(reg.in_category(Category::Atmosphere).count(), 2);
    }

    #[test]
    fn duration_pick_stays_in_range() {
        let r = DurationRange::new(8, 24);
        for roll in [0, 1, 16, 17, u32::MAX] {
            let v = r.pick(roll);
            assert!((8..=24).contains(&v));
        }
        assert_eq!(r.midpoint(), 16);
    }
}
