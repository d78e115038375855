//! Configuration loading and parsing.
//!
//! Parses `glitchterm.toml` (or an override path provided by the binary).
//! Every field has a default so an absent file, an empty file, or a file with
//! only some sections all produce a usable `Config`. Unknown fields are
//! ignored to allow forward evolution without warnings.
//!
//! Values that would break engine invariants are clamped in
//! `Config::sanitize` (e.g. the probability ceiling must stay below 1.0 so
//! some ticks carry no ambient effect even at maximum corruption). Each clamp
//! emits an `info` event on the `config` target.

use anyhow::Result;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

pub mod theme;
pub use theme::Palette;

/// Hard upper bound for the ambient probability ceiling.
pub const MAX_CEILING: f64 = 0.99;

#[derive(Debug, Deserialize, Clone)]
pub struct BufferConfig {
    #[serde(default = "BufferConfig::default_capacity")]
    pub capacity: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: Self::default_capacity(),
        }
    }
}

impl BufferConfig {
    const fn default_capacity() -> usize {
        1000
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct WeightsConfig {
    #[serde(default = "WeightsConfig::default_glyph")]
    pub glyph: f64,
    #[serde(default = "WeightsConfig::default_color")]
    pub color: f64,
    #[serde(default = "WeightsConfig::default_geometry")]
    pub geometry: f64,
    #[serde(default = "WeightsConfig::default_atmosphere")]
    pub atmosphere: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            glyph: Self::default_glyph(),
            color: Self::default_color(),
            geometry: Self::default_geometry(),
            atmosphere: Self::default_atmosphere(),
        }
    }
}

impl WeightsConfig {
    const fn default_glyph() -> f64 {
        1.0
    }
    const fn default_color() -> f64 {
        0.8
    }
    const fn default_geometry() -> f64 {
        0.6
    }
    const fn default_atmosphere() -> f64 {
        0.4
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ProfileConfig {
    /// Probability at level 0 (before category weighting).
    #[serde(default = "ProfileConfig::default_floor")]
    pub floor: f64,
    /// Probability at level 100; always below 1.0.
    #[serde(default = "ProfileConfig::default_ceiling")]
    pub ceiling: f64,
    /// Exponent applied to the normalized level (1.0 = linear).
    #[serde(default = "ProfileConfig::default_curve")]
    pub curve: f64,
    /// Cooldowns never shrink below this many ticks.
    #[serde(default = "ProfileConfig::default_min_cooldown")]
    pub min_cooldown: u32,
    /// Fraction of a kind's base cooldown removed at level 100.
    #[serde(default = "ProfileConfig::default_cooldown_shrink")]
    pub cooldown_shrink: f64,
    #[serde(default)]
    pub initial_level: f32,
    #[serde(default)]
    pub weights: WeightsConfig,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            floor: Self::default_floor(),
            ceiling: Self::default_ceiling(),
            curve: Self::default_curve(),
            min_cooldown: Self::default_min_cooldown(),
            cooldown_shrink: Self::default_cooldown_shrink(),
            initial_level: 0.0,
            weights: WeightsConfig::default(),
        }
    }
}

impl ProfileConfig {
    const fn default_floor() -> f64 {
        0.005
    }
    const fn default_ceiling() -> f64 {
        0.9
    }
    const fn default_curve() -> f64 {
        2.0
    }
    const fn default_min_cooldown() -> u32 {
        4
    }
    const fn default_cooldown_shrink() -> f64 {
        0.85
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerConfig {
    /// Upper bound on ambient rolls per tick.
    #[serde(default = "SchedulerConfig::default_max_ambient_rolls")]
    pub max_ambient_rolls: usize,
    /// Seed for the ambient random source.
    #[serde(default = "SchedulerConfig::default_seed")]
    pub seed: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_ambient_rolls: Self::default_max_ambient_rolls(),
            seed: Self::default_seed(),
        }
    }
}

impl SchedulerConfig {
    const fn default_max_ambient_rolls() -> usize {
        32
    }
    const fn default_seed() -> u64 {
        0x5EED_0F_C0DE
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrailConfig {
    #[serde(default = "TrailConfig::default_length")]
    pub length: usize,
    /// Weight multiplier applied each tick.
    #[serde(default = "TrailConfig::default_decay")]
    pub decay: f32,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            length: Self::default_length(),
            decay: Self::default_decay(),
        }
    }
}

impl TrailConfig {
    const fn default_length() -> usize {
        12
    }
    const fn default_decay() -> f32 {
        0.8
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ThemeConfig {
    #[serde(default = "ThemeConfig::default_name")]
    pub name: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            name: Self::default_name(),
        }
    }
}

impl ThemeConfig {
    fn default_name() -> String {
        "default".to_string()
    }
}

/// Per-kind tuning under `[effects.<kind_name>]`.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct EffectOverride {
    #[serde(default = "EffectOverride::default_enabled")]
    pub enabled: bool,
    pub min_ticks: Option<u32>,
    pub max_ticks: Option<u32>,
    pub priority: Option<i32>,
    pub ambient_priority: Option<i32>,
    pub cooldown: Option<u32>,
    pub group: Option<String>,
}

impl Default for EffectOverride {
    fn default() -> Self {
        Self {
            enabled: true,
            min_ticks: None,
            max_ticks: None,
            priority: None,
            ambient_priority: None,
            cooldown: None,
            group: None,
        }
    }
}

impl EffectOverride {
    const fn default_enabled() -> bool {
        true
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub buffer: BufferConfig,
    #[serde(default)]
    pub profile: ProfileConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub trail: TrailConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
    #[serde(default)]
    pub effects: BTreeMap<String, EffectOverride>,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>, // original file string (optional)
    pub file: ConfigFile,    // parsed (or default) data
}

/// Best-effort config path: working directory first, then the platform config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from("glitchterm.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("glitchterm").join("glitchterm.toml");
    }
    PathBuf::from("glitchterm.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        return Ok(Config::default());
    };
    parse_str(&content).or_else(|e| {
        warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed");
        Ok(Config::default())
    })
}

/// Parse configuration text, then sanitize it.
pub fn parse_str(content: &str) -> Result<Config> {
    let file = toml::from_str::<ConfigFile>(content)?;
    let mut cfg = Config {
        raw: Some(content.to_string()),
        file,
    };
    cfg.sanitize();
    Ok(cfg)
}

impl Config {
    /// Clamp values into their legal ranges. Returns the number of fields changed.
    pub fn sanitize(&mut self) -> usize {
        let mut changed = 0;
        let p = &mut self.file.profile;

        let ceiling = finite_or(p.ceiling, ProfileConfig::default_ceiling()).clamp(0.0, MAX_CEILING);
        if ceiling != p.ceiling {
            info!(target: "config", raw = p.ceiling, clamped = ceiling, "profile_ceiling_clamped");
            p.ceiling = ceiling;
            changed += 1;
        }
        let floor = finite_or(p.floor, ProfileConfig::default_floor()).clamp(0.0, p.ceiling);
        if floor != p.floor {
            info!(target: "config", raw = p.floor, clamped = floor, "profile_floor_clamped");
            p.floor = floor;
            changed += 1;
        }
        let curve = finite_or(p.curve, ProfileConfig::default_curve()).clamp(0.1, 8.0);
        if curve != p.curve {
            info!(target: "config", raw = p.curve, clamped = curve, "profile_curve_clamped");
            p.curve = curve;
            changed += 1;
        }
        let shrink = finite_or(p.cooldown_shrink, ProfileConfig::default_cooldown_shrink())
            .clamp(0.0, 1.0);
        if shrink != p.cooldown_shrink {
            info!(target: "config", raw = p.cooldown_shrink, clamped = shrink, "profile_cooldown_shrink_clamped");
            p.cooldown_shrink = shrink;
            changed += 1;
        }
        let level = if p.initial_level.is_finite() {
            p.initial_level.clamp(0.0, 100.0)
        } else {
            0.0
        };
        if level != p.initial_level {
            info!(target: "config", raw = p.initial_level, clamped = level, "profile_initial_level_clamped");
            p.initial_level = level;
            changed += 1;
        }
        for w in [
            &mut p.weights.glyph,
            &mut p.weights.color,
            &mut p.weights.geometry,
            &mut p.weights.atmosphere,
        ] {
            let clamped = finite_or(*w, 0.0).clamp(0.0, 1.0);
            if clamped != *w {
                info!(target: "config", raw = *w, clamped, "profile_weight_clamped");
                *w = clamped;
                changed += 1;
            }
        }

        if self.file.buffer.capacity == 0 {
            info!(target: "config", raw = 0, clamped = 1, "buffer_capacity_clamped");
            self.file.buffer.capacity = 1;
            changed += 1;
        }
        let decay = self.file.trail.decay;
        let clamped_decay = if decay.is_finite() {
            decay.clamp(0.0, 0.99)
        } else {
            TrailConfig::default_decay()
        };
        if clamped_decay != decay {
            info!(target: "config", raw = decay, clamped = clamped_decay, "trail_decay_clamped");
            self.file.trail.decay = clamped_decay;
            changed += 1;
        }
        changed
    }

    /// Resolved palette for the configured theme (falls back to the default theme).
    pub fn palette(&self) -> Palette {
        theme::by_name(&self.file.theme.name).unwrap_or_else(|| {
            warn!(target: "config", theme = self.file.theme.name.as_str(), "unknown_theme");
            Palette::default()
        })
    }
}

fn finite_or(v: f64, fallback: f64) -> f64 {
    if v.is_finite() { v } else { fallback }
}
