//! Corruption profile: the scalar level and everything derived from it.
//!
//! The level is the single dial collaborators turn. It feeds two curves:
//! - `trigger_probability(category)`: chance an ambient roll succeeds,
//!   non-decreasing in level, bounded by a ceiling strictly below 1.0.
//! - `cooldown_ticks(descriptor)`: spacing between spawns of the same
//!   `(kind, target)`, non-increasing in level, bounded below by a floor.
//!
//! The profile also owns the cooldown table so the scheduler's rate limiting
//! and the level that tunes it live in one place.

use core_config::{ProfileConfig, WeightsConfig};
use core_effects::{Category, CooldownKey, EffectKindDescriptor};
use tracing::{debug, info};

pub mod cooldown;
pub use cooldown::CooldownTable;

pub const LEVEL_MIN: f32 = 0.0;
pub const LEVEL_MAX: f32 = 100.0;

/// Outcome of a level mutation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LevelChange {
    Applied { level: f32 },
    /// Requested value was outside `[0, 100]`; `applied` is what was stored.
    Clamped { requested: f32, applied: f32 },
    /// Non-finite input; the level did not change.
    Ignored { current: f32 },
}

impl LevelChange {
    /// Level in effect after the call.
    pub fn level(&self) -> f32 {
        match *self {
            LevelChange::Applied { level } => level,
            LevelChange::Clamped { applied, .. } => applied,
            LevelChange::Ignored { current } => current,
        }
    }

    pub fn was_clamped(&self) -> bool {
        matches!(self, LevelChange::Clamped { .. })
    }
}

/// Per-category multipliers in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryWeights {
    glyph: f64,
    color: f64,
    geometry: f64,
    atmosphere: f64,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self::from(&WeightsConfig::default())
    }
}

impl From<&WeightsConfig> for CategoryWeights {
    fn from(w: &WeightsConfig) -> Self {
        let mut out = Self {
            glyph: 0.0,
            color: 0.0,
            geometry: 0.0,
            atmosphere: 0.0,
        };
        out.set(Category::Glyph, w.glyph);
        out.set(Category::Color, w.color);
        out.set(Category::Geometry, w.geometry);
        out.set(Category::Atmosphere, w.atmosphere);
        out
    }
}

impl CategoryWeights {
    pub fn get(&self, category: Category) -> f64 {
        match category {
            Category::Glyph => self.glyph,
            Category::Color => self.color,
            Category::Geometry => self.geometry,
            Category::Atmosphere => self.atmosphere,
        }
    }

    pub fn set(&mut self, category: Category, weight: f64) {
        let w = if weight.is_finite() {
            weight.clamp(0.0, 1.0)
        } else {
            0.0
        };
        match category {
            Category::Glyph => self.glyph = w,
            Category::Color => self.color = w,
            Category::Geometry => self.geometry = w,
            Category::Atmosphere => self.atmosphere = w,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CorruptionProfile {
    level: f32,
    weights: CategoryWeights,
    floor: f64,
    ceiling: f64,
    curve: f64,
    min_cooldown: u32,
    cooldown_shrink: f64,
    cooldowns: CooldownTable,
}

impl Default for CorruptionProfile {
    fn default() -> Self {
        Self::from_config(&ProfileConfig::default())
    }
}

impl CorruptionProfile {
    /// Build from (already sanitized) configuration. Values are re-clamped so a
    /// hand-built `ProfileConfig` cannot break the bounds either.
    pub fn from_config(cfg: &ProfileConfig) -> Self {
        let ceiling = if cfg.ceiling.is_finite() {
            cfg.ceiling.clamp(0.0, core_config::MAX_CEILING)
        } else {
            core_config::MAX_CEILING
        };
        let floor = if cfg.floor.is_finite() {
            cfg.floor.clamp(0.0, ceiling)
        } else {
            0.0
        };
        let curve = if cfg.curve.is_finite() && cfg.curve > 0.0 {
            cfg.curve
        } else {
            1.0
        };
        let cooldown_shrink = if cfg.cooldown_shrink.is_finite() {
            cfg.cooldown_shrink.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let mut profile = Self {
            level: LEVEL_MIN,
            weights: CategoryWeights::from(&cfg.weights),
            floor,
            ceiling,
            curve,
            min_cooldown: cfg.min_cooldown,
            cooldown_shrink,
            cooldowns: CooldownTable::new(),
        };
        profile.set_level(cfg.initial_level);
        profile
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    /// Set the level, clamping into `[0, 100]`. Non-finite input is ignored.
    pub fn set_level(&mut self, requested: f32) -> LevelChange {
        if !requested.is_finite() {
            debug!(target: "effects.profile", requested, current = self.level, "level_non_finite_ignored");
            return LevelChange::Ignored {
                current: self.level,
            };
        }
        let applied = requested.clamp(LEVEL_MIN, LEVEL_MAX);
        self.level = applied;
        if applied != requested {
            info!(target: "effects.profile", requested, applied, "level_clamped");
            LevelChange::Clamped { requested, applied }
        } else {
            debug!(target: "effects.profile", level = applied, "level_set");
            LevelChange::Applied { level: applied }
        }
    }

    /// Shift the level by `delta` (story progression). Clamps like `set_level`.
    pub fn adjust_level(&mut self, delta: f32) -> LevelChange {
        self.set_level(self.level + delta)
    }

    pub fn weights(&self) -> &CategoryWeights {
        &self.weights
    }

    pub fn set_weight(&mut self, category: Category, weight: f64) {
        self.weights.set(category, weight);
    }

    /// Chance that one ambient roll for `category` succeeds.
    pub fn trigger_probability(&self, category: Category) -> f64 {
        let t = (self.level as f64 / LEVEL_MAX as f64).clamp(0.0, 1.0);
        let base = self.floor + (self.ceiling - self.floor) * t.powf(self.curve);
        (self.weights.get(category) * base).clamp(0.0, self.ceiling)
    }

    /// Cooldown for a kind at the current level. Kinds outside every ambient
    /// category with a zero base cooldown are never rate limited. Everything
    /// else stays at or above the configured floor, or the base itself when
    /// that is smaller and nonzero.
    pub fn cooldown_ticks(&self, descriptor: &EffectKindDescriptor) -> u64 {
        if descriptor.base_cooldown == 0 && descriptor.category.is_none() {
            return 0;
        }
        let base = descriptor.base_cooldown as f64;
        let t = (self.level as f64 / LEVEL_MAX as f64).clamp(0.0, 1.0);
        let scaled = (base * (1.0 - self.cooldown_shrink * t)).round() as u64;
        let floor = if descriptor.base_cooldown == 0 {
            self.min_cooldown
        } else {
            self.min_cooldown.min(descriptor.base_cooldown)
        };
        scaled.max(floor as u64)
    }

    /// Intensity for an ambient instance. `roll` in `[0, 1)` adds variance;
    /// the band rises with the level.
    pub fn ambient_intensity(&self, roll: f64) -> f32 {
        let t = (self.level / LEVEL_MAX).clamp(0.0, 1.0);
        let roll = if roll.is_finite() {
            roll.clamp(0.0, 1.0) as f32
        } else {
            0.0
        };
        let base = 0.2 + 0.8 * t;
        (base * (0.5 + 0.5 * roll)).clamp(0.05, 1.0)
    }

    pub fn cooldown_ready(&self, key: &CooldownKey, tick: u64) -> Result<(), u64> {
        self.cooldowns.ready(key, tick)
    }

    pub fn arm_cooldown(&mut self, key: CooldownKey, until: u64) {
        self.cooldowns.arm(key, until);
    }

    pub fn prune_cooldowns(&mut self, tick: u64) -> usize {
        self.cooldowns.prune(tick)
    }

    pub fn cooldowns(&self) -> &CooldownTable {
        &self.cooldowns
    }
}
