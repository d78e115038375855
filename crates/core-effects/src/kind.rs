//! Effect kinds and their classification tags.

use std::fmt;

/// Every distortion the engine knows how to schedule and draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EffectKind {
    CharacterDecay,
    CharacterStutter,
    CharacterJitter,
    Flicker,
    ColorBleed,
    ColorShift,
    Redaction,
    ScreenTear,
    TextBreathing,
    Scanline,
    GlyphNoise,
    Typing,
}

impl EffectKind {
    pub const ALL: [EffectKind; 12] = [
        EffectKind::CharacterDecay,
        EffectKind::CharacterStutter,
        EffectKind::CharacterJitter,
        EffectKind::Flicker,
        EffectKind::ColorBleed,
        EffectKind::ColorShift,
        EffectKind::Redaction,
        EffectKind::ScreenTear,
        EffectKind::TextBreathing,
        EffectKind::Scanline,
        EffectKind::GlyphNoise,
        EffectKind::Typing,
    ];

    /// Stable snake_case name used by callers and configuration files.
    pub const fn name(self) -> &'static str {
        match self {
            EffectKind::CharacterDecay => "character_decay",
            EffectKind::CharacterStutter => "character_stutter",
            EffectKind::CharacterJitter => "character_jitter",
            EffectKind::Flicker => "flicker",
            EffectKind::ColorBleed => "color_bleed",
            EffectKind::ColorShift => "color_shift",
            EffectKind::Redaction => "redaction",
            EffectKind::ScreenTear => "screen_tear",
            EffectKind::TextBreathing => "text_breathing",
            EffectKind::Scanline => "scanline",
            EffectKind::GlyphNoise => "glyph_noise",
            EffectKind::Typing => "typing",
        }
    }

    pub fn from_name(name: &str) -> Option<EffectKind> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ambient roll categories. Each carries its own weight in the corruption profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Glyph,
    Color,
    Geometry,
    Atmosphere,
}

impl Category {
    /// Fixed roll order within a target.
    pub const ALL: [Category; 4] = [
        Category::Glyph,
        Category::Color,
        Category::Geometry,
        Category::Atmosphere,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Category::Glyph => "glyph",
            Category::Color => "color",
            Category::Geometry => "geometry",
            Category::Atmosphere => "atmosphere",
        }
    }

    pub fn from_name(name: &str) -> Option<Category> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

/// What a kind can be aimed at.
///
/// `Character` and `Line` kinds take a single-line target, `Block` kinds take
/// any non-empty line range, `Global` kinds take only the global target.
///
/// `Character` targets exactly like `Line`. It only tags kinds whose renderer
/// pass picks individual graphemes within the line rather than restyling the
/// whole line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Applicability {
    Character,
    Line,
    Block,
    Global,
}

/// Mutually incompatible kinds share a group; one Active member per target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExclusivityGroup {
    VisualOverlay,
    Geometry,
    Luminance,
    Noise,
    Reveal,
}

impl ExclusivityGroup {
    pub const fn as_str(self) -> &'static str {
        match self {
            ExclusivityGroup::VisualOverlay => "visual_overlay",
            ExclusivityGroup::Geometry => "geometry",
            ExclusivityGroup::Luminance => "luminance",
            ExclusivityGroup::Noise => "noise",
            ExclusivityGroup::Reveal => "reveal",
        }
    }

    pub fn from_name(name: &str) -> Option<ExclusivityGroup> {
        [
            ExclusivityGroup::VisualOverlay,
            ExclusivityGroup::Geometry,
            ExclusivityGroup::Luminance,
            ExclusivityGroup::Noise,
            ExclusivityGroup::Reveal,
        ]
        .into_iter()
        .find(|g| g.as_str() == name)
    }
}

impl fmt::Display for ExclusivityGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
