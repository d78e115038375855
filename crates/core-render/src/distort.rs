//! Per-kind cell transforms.
//!
//! Each pass rewrites a line descriptor in place. Passes run in ascending
//! priority so a later (higher priority) pass wins wherever two touch the same
//! cell. Content widths are preserved: a replaced cluster keeps its column
//! count so geometry never shifts under a glyph swap.

use crate::hash::{noise, unit};
use crate::{CellFlags, LineRenderDescriptor, RenderCell};
use core_config::Palette;
use core_effects::{EffectInstance, EffectKind};
use core_text::grapheme::is_blank;
use std::f32::consts::TAU;

pub const CORRUPTION_GLYPHS: &str = "!@#$%^&*()_+[];',./<>?:{}|`~¡¢£¤¥¦§¨©ª«¬®¯°±²³´µ¶·¸¹º»¼½¾¿ÀÁÂÃÄÅÆÇÈÉÊËÌÍÎÏÐÑÒÓÔÕÖ×ØÙÚÛÜÝÞß";
pub const NOISE_GLYPHS: &str = "░▒▓▖▗▘▝▚▞│┤╡╢╖╕╣║╗╝";
pub const REDACTION_GLYPH: char = '█';

/// Ticks per full breathing cycle.
const BREATH_PERIOD: f32 = 48.0;
/// Rows between dimmed scanlines.
const SCANLINE_SPACING: usize = 4;

pub(crate) struct Pass<'a> {
    pub inst: &'a EffectInstance,
    pub tick: u64,
    /// Animation step: changes every `rate` ticks of the kind.
    pub step: u64,
    pub line: usize,
    pub row: usize,
    pub palette: &'a Palette,
}

impl Pass<'_> {
    fn hash(&self, col: usize) -> u64 {
        noise(self.inst.seed, self.step, self.line, col)
    }
}

pub(crate) fn apply(pass: &Pass<'_>, d: &mut LineRenderDescriptor) {
    match pass.inst.kind {
        EffectKind::CharacterDecay => decay(pass, d),
        EffectKind::CharacterStutter => stutter(pass, d),
        EffectKind::CharacterJitter => jitter(pass, d),
        EffectKind::Flicker => flicker(pass, d),
        EffectKind::ColorBleed => color_bleed(pass, d),
        EffectKind::ColorShift => color_shift(pass, d),
        EffectKind::Redaction => redaction(pass, d),
        EffectKind::ScreenTear => screen_tear(pass, d),
        EffectKind::TextBreathing => breathing(pass, d),
        EffectKind::Scanline => scanline(pass, d),
        EffectKind::GlyphNoise => glyph_noise(pass, d),
        EffectKind::Typing => typing(pass, d),
    }
    d.applied.push(pass.inst.id);
}

fn pick(set: &str, h: u64) -> char {
    let n = set.chars().count() as u64;
    set.chars().nth((h % n.max(1)) as usize).unwrap_or('?')
}

/// Replace the cell's glyph with `ch`, padding to keep its width.
fn set_glyph(cell: &mut RenderCell, ch: char) {
    cell.glyph.clear();
    cell.glyph.push(ch);
    for _ in 1..cell.width {
        cell.glyph.push(' ');
    }
}

fn decay(p: &Pass<'_>, d: &mut LineRenderDescriptor) {
    let fraction = p.inst.intensity * (0.3 + 0.7 * p.inst.progress(p.tick));
    let blip = p.hash(usize::MAX) % 4 == 0;
    for (col, cell) in d.cells.iter_mut().enumerate() {
        if is_blank(&cell.glyph) || cell.flags.contains(CellFlags::HIDDEN) {
            continue;
        }
        let h = p.hash(col);
        if unit(h) >= fraction {
            continue;
        }
        set_glyph(cell, pick(CORRUPTION_GLYPHS, h >> 8));
        cell.flags |= CellFlags::CORRUPTED;
        if blip {
            cell.fg = p.palette.error;
            cell.flags |= CellFlags::BLIP;
        }
    }
}

fn stutter(p: &Pass<'_>, d: &mut LineRenderDescriptor) {
    let n = d.cells.len();
    if n < 2 {
        return;
    }
    let repeats = 1 + (p.inst.intensity * 3.0) as usize;
    for r in 0..repeats {
        let src = (p.hash(r) % (n as u64 - 1)) as usize;
        let (head, tail) = d.cells.split_at_mut(src + 1);
        let (from, to) = (&head[src], &mut tail[0]);
        if is_blank(&from.glyph) || from.width != to.width {
            continue;
        }
        to.glyph.clone_from(&from.glyph);
        to.flags |= CellFlags::CORRUPTED;
    }
}

fn jitter(p: &Pass<'_>, d: &mut LineRenderDescriptor) {
    let n = d.cells.len();
    if n < 2 {
        return;
    }
    let swaps = ((p.inst.intensity * n as f32 / 6.0) as usize).max(1);
    for r in 0..swaps {
        let i = (p.hash(r) % (n as u64 - 1)) as usize;
        let (head, tail) = d.cells.split_at_mut(i + 1);
        let (a, b) = (&mut head[i], &mut tail[0]);
        std::mem::swap(&mut a.glyph, &mut b.glyph);
        std::mem::swap(&mut a.width, &mut b.width);
    }
}

fn flicker(p: &Pass<'_>, d: &mut LineRenderDescriptor) {
    if p.inst.intensity <= 0.0 || p.step % 2 == 0 {
        return;
    }
    for cell in d.cells.iter_mut() {
        if cell.fg == p.palette.error {
            // Toggling to the same color would be invisible: hide instead.
            cell.fg = cell.bg;
            cell.flags |= CellFlags::HIDDEN;
        } else {
            cell.fg = p.palette.error;
        }
    }
}

fn color_bleed(p: &Pass<'_>, d: &mut LineRenderDescriptor) {
    let n = d.cells.len().max(1) as f32;
    for (i, cell) in d.cells.iter_mut().enumerate() {
        let t = p.inst.intensity * (i + 1) as f32 / n;
        cell.fg = cell.fg.lerp(p.palette.highlight, t);
        cell.bg = cell.bg.lerp(p.palette.highlight, t * 0.25);
    }
}

fn color_shift(p: &Pass<'_>, d: &mut LineRenderDescriptor) {
    let choices = [
        p.palette.error,
        p.palette.highlight,
        p.palette.success,
        p.palette.prompt,
    ];
    let to = choices[(p.inst.seed % choices.len() as u64) as usize];
    let t = 0.4 + 0.6 * p.inst.intensity;
    for cell in d.cells.iter_mut() {
        cell.fg = cell.fg.lerp(to, t);
        cell.bg = cell.bg.lerp(to, 0.15 * p.inst.intensity);
    }
}

fn redaction(p: &Pass<'_>, d: &mut LineRenderDescriptor) {
    let n = d.cells.len();
    if n == 0 {
        return;
    }
    let len = ((p.inst.intensity * n as f32).round() as usize).clamp(1, n);
    let start = (p.hash(0) % (n - len + 1) as u64) as usize;
    for cell in &mut d.cells[start..start + len] {
        cell.glyph = REDACTION_GLYPH.to_string().repeat(cell.width.max(1) as usize);
        cell.flags |= CellFlags::REDACTED;
    }
}

fn screen_tear(p: &Pass<'_>, d: &mut LineRenderDescriptor) {
    let amplitude = 1 + (p.inst.intensity * 6.0) as u64;
    let h = p.hash(0);
    let magnitude = (1 + h % amplitude) as i16;
    d.offset = if h >> 63 == 1 { -magnitude } else { magnitude };
}

fn breathing(p: &Pass<'_>, d: &mut LineRenderDescriptor) {
    let elapsed = p.tick.saturating_sub(p.inst.start_tick) as f32;
    let shift = (p.inst.seed % 1000) as f32 / 1000.0;
    let phase = (elapsed / BREATH_PERIOD + shift) * TAU;
    let dip = p.inst.intensity * 0.45 * (0.5 - 0.5 * phase.cos());
    d.brightness *= 1.0 - dip;
}

fn scanline(p: &Pass<'_>, d: &mut LineRenderDescriptor) {
    let band = (p.step % SCANLINE_SPACING as u64) as usize;
    if p.row % SCANLINE_SPACING != band {
        return;
    }
    d.brightness *= 1.0 - 0.5 * p.inst.intensity;
    for cell in d.cells.iter_mut() {
        cell.flags |= CellFlags::DIM;
    }
}

fn glyph_noise(p: &Pass<'_>, d: &mut LineRenderDescriptor) {
    let density = p.inst.intensity * 0.08;
    for (col, cell) in d.cells.iter_mut().enumerate() {
        let h = p.hash(col);
        if unit(h) < density {
            set_glyph(cell, pick(NOISE_GLYPHS, h >> 8));
            cell.fg = p.palette.error;
            cell.flags |= CellFlags::NOISE;
        }
    }
}

fn typing(p: &Pass<'_>, d: &mut LineRenderDescriptor) {
    let n = d.cells.len();
    let shown = (p.inst.progress(p.tick) * n as f32).ceil() as usize;
    for cell in d.cells.iter_mut().skip(shown) {
        let width = cell.width.max(1) as usize;
        cell.glyph = " ".repeat(width);
        cell.flags |= CellFlags::HIDDEN;
    }
}
