//! Named color themes.
//!
//! Effects never hardcode colors: flicker uses `error`, color bleed blends
//! toward `highlight`, and so on. Switching themes only swaps this table.

use core_text::Rgb;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub name: &'static str,
    pub default_fg: Rgb,
    pub default_bg: Rgb,
    pub prompt: Rgb,
    pub error: Rgb,
    pub success: Rgb,
    pub highlight: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        DEFAULT
    }
}

const DEFAULT: Palette = Palette {
    name: "Default",
    default_fg: Rgb::new(200, 200, 200),
    default_bg: Rgb::BLACK,
    prompt: Rgb::new(0, 255, 0),
    error: Rgb::new(255, 0, 0),
    success: Rgb::new(0, 255, 0),
    highlight: Rgb::new(0, 255, 255),
};

const CORRUPTED_KALI: Palette = Palette {
    name: "Corrupted Kali",
    default_fg: Rgb::new(180, 220, 180),
    default_bg: Rgb::new(10, 20, 10),
    prompt: Rgb::new(100, 255, 100),
    error: Rgb::new(255, 80, 80),
    success: Rgb::new(80, 220, 80),
    highlight: Rgb::new(220, 80, 220),
};

const DIGITAL_NIGHTMARE: Palette = Palette {
    name: "Digital Nightmare",
    default_fg: Rgb::new(150, 0, 0),
    default_bg: Rgb::new(10, 0, 0),
    prompt: Rgb::new(200, 50, 50),
    error: Rgb::new(255, 150, 0),
    success: Rgb::new(100, 0, 0),
    highlight: Rgb::new(255, 0, 255),
};

const CLASSIC_DOS: Palette = Palette {
    name: "Classic DOS",
    default_fg: Rgb::new(200, 200, 200),
    default_bg: Rgb::new(0, 0, 128),
    prompt: Rgb::WHITE,
    error: Rgb::new(255, 255, 0),
    success: Rgb::new(0, 255, 0),
    highlight: Rgb::WHITE,
};

/// Config keys of the built-in themes.
pub const THEME_NAMES: [&str; 4] = ["default", "corrupted_kali", "digital_nightmare", "classic_dos"];

pub fn by_name(name: &str) -> Option<Palette> {
    match name {
        "default" => Some(DEFAULT),
        "corrupted_kali" => Some(CORRUPTED_KALI),
        "digital_nightmare" => Some(DIGITAL_NIGHTMARE),
        "classic_dos" => Some(CLASSIC_DOS),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_theme_resolves() {
        for name in THEME_NAMES {
            assert!(by_name(name).is_some(), "{name}");
        }
        assert_eq!(by_name("classic_dos").unwrap().default_bg, Rgb::new(0, 0, 128));
        assert!(by_name("solarized").is_none());
    }
}
