//! Render descriptors for corrupted terminal text.
//!
//! The renderer is a pure function of its inputs: buffer window, active
//! instances, tick and cursor trail in, `Vec<LineRenderDescriptor>` out. It
//! owns no randomness (choices hash each instance's seed, see `hash`) and
//! never mutates what it reads. Hosts turn descriptors into terminal output.
//!
//! Layering:
//! - Base cells come from the stored line (content, colors, bold).
//! - Instances covering the line (by range, or `Global`) apply in ascending
//!   priority, ties broken by id, so higher priority wins on overlap.
//! - Cursor trail marks apply last and always sit on top.
//!
//! Cells hold one grapheme cluster each; `width` is its terminal column count
//! and glyph replacements keep that width.

use bitflags::bitflags;
use core_effects::InstanceId;
use core_text::Rgb;
use smallvec::SmallVec;

mod distort;
pub mod frame;
pub mod hash;
pub mod metrics;
pub mod trail;

pub use distort::{CORRUPTION_GLYPHS, NOISE_GLYPHS, REDACTION_GLYPH};
pub use frame::Renderer;
pub use metrics::{RenderMetrics, RenderMetricsSnapshot};
pub use trail::{CursorTrail, TrailMark};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CellFlags: u16 {
        const BOLD      = 0b0000_0000_0001;
        const CORRUPTED = 0b0000_0000_0010; // glyph replaced by decay/stutter
        const REDACTED  = 0b0000_0000_0100;
        const HIDDEN    = 0b0000_0000_1000; // drawn in background color / not yet typed
        const NOISE     = 0b0000_0001_0000;
        const DIM       = 0b0000_0010_0000; // scanline band
        const TRAIL     = 0b0000_0100_0000;
        const BLIP      = 0b0000_1000_0000; // decayed cell in an error-colored burst
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderCell {
    pub glyph: String,
    pub width: u8,
    pub fg: Rgb,
    pub bg: Rgb,
    pub flags: CellFlags,
}

/// Where a rendered row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSource {
    /// Stored line with this absolute index.
    Buffer(usize),
    /// The pending-output placeholder shown after the newest line.
    Placeholder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineRenderDescriptor {
    /// Screen row within the viewport.
    pub row: u16,
    pub source: LineSource,
    pub cells: Vec<RenderCell>,
    /// Horizontal shift in columns (screen tear).
    pub offset: i16,
    /// Whole-line brightness in `[0, 1]`.
    pub brightness: f32,
    /// Instances applied to this line, in application order.
    pub applied: SmallVec<[InstanceId; 4]>,
    pub trail_marks: u16,
}

impl LineRenderDescriptor {
    /// True when nothing altered the stored line.
    pub fn is_pristine(&self) -> bool {
        self.applied.is_empty() && self.trail_marks == 0
    }

    /// Visible text: hidden cells read as spaces.
    pub fn text(&self) -> String {
        self.cells
            .iter()
            .map(|c| {
                if c.flags.contains(CellFlags::HIDDEN) {
                    " ".repeat(c.width.max(1) as usize)
                } else {
                    c.glyph.clone()
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_config::Palette;
    use core_effects::{
        CooldownKey, EffectDuration, EffectInstance, EffectKind, EffectRegistry, Origin, Target,
    };
    use core_text::{ScrollState, TextBuffer, TextLine};
    use pretty_assertions::assert_eq;

    fn instance(id: u64, kind: EffectKind, target: Target, priority: i32) -> EffectInstance {
        let reg = EffectRegistry::builtin();
        EffectInstance {
            id: InstanceId(id),
            kind,
            target,
            start_tick: 0,
            duration: EffectDuration::Ticks(40),
            intensity: 1.0,
            priority,
            group: reg.get(kind).unwrap().group,
            cooldown_key: CooldownKey { kind, target },
            seed: 0xC0FFEE ^ id,
            origin: Origin::Explicit,
        }
    }

    fn buffer() -> TextBuffer {
        let mut b = TextBuffer::with_capacity(16);
        b.append(TextLine::new("root@host:~$ ls", Rgb::new(0, 255, 0)));
        b.append(TextLine::new("password.txt  notes.md", Rgb::new(200, 200, 200)));
        b.append(TextLine::new("", Rgb::WHITE));
        b
    }

    fn renderer() -> Renderer {
        Renderer::new(Palette::default(), EffectRegistry::builtin())
    }

    #[test]
    fn no_instances_renders_content_verbatim() {
        let b = buffer();
        let frame = renderer().render_frame(3, &b, &ScrollState::new(10), &[], &CursorTrail::default());
        assert_eq!(frame.len(), 3);
        assert_eq!(frame[0].text(), "root@host:~$ ls");
        assert_eq!(frame[1].source, LineSource::Buffer(1));
        assert!(frame.iter().all(|d| d.is_pristine()));
        assert_eq!(frame[0].cells[0].fg, Rgb::new(0, 255, 0));
        assert_eq!(frame[0].cells[0].bg, Palette::default().default_bg);
    }

    #[test]
    fn placeholder_row_is_marked() {
        let mut b = buffer();
        b.set_placeholder(TextLine::new("...", Rgb::WHITE));
        let decay = instance(1, EffectKind::CharacterDecay, Target::line(2), 10);
        let frame = renderer().render_frame(1, &b, &ScrollState::new(10), &[&decay], &CursorTrail::default());
        assert_eq!(frame.len(), 4);
        assert_eq!(frame[3].source, LineSource::Placeholder);
        assert!(frame[3].is_pristine());
    }

    #[test]
    fn redaction_covers_a_span() {
        let b = buffer();
        let red = instance(1, EffectKind::Redaction, Target::lines(0..2), 12);
        let frame = renderer().render_frame(5, &b, &ScrollState::new(10), &[&red], &CursorTrail::default());
        for d in &frame[..2] {
            assert!(d.cells.iter().all(|c| c.flags.contains(CellFlags::REDACTED)));
            assert_eq!(d.applied.as_slice(), &[InstanceId(1)]);
        }
        assert!(frame[2].is_pristine());
    }

    #[test]
    fn typing_reveals_progressively() {
        let b = buffer();
        let typing = instance(1, EffectKind::Typing, Target::line(1), 15);
        let r = renderer();
        let early = r.render_frame(4, &b, &ScrollState::new(10), &[&typing], &CursorTrail::default());
        let late = r.render_frame(40, &b, &ScrollState::new(10), &[&typing], &CursorTrail::default());
        let hidden = |d: &LineRenderDescriptor| {
            d.cells
                .iter()
                .filter(|c| c.flags.contains(CellFlags::HIDDEN))
                .count()
        };
        assert!(hidden(&early[1]) > 0);
        assert_eq!(hidden(&late[1]), 0);
        assert_eq!(late[1].text(), "password.txt  notes.md");
    }

    #[test]
    fn flicker_hides_text_already_in_error_color() {
        let mut b = TextBuffer::with_capacity(4);
        b.append(TextLine::new("ALERT", Palette::default().error));
        let flicker = instance(1, EffectKind::Flicker, Target::line(0), 5);
        // rate 3: ticks 3..=5 are step 1 (on).
        let frame = renderer().render_frame(3, &b, &ScrollState::new(4), &[&flicker], &CursorTrail::default());
        assert!(frame[0].cells.iter().all(|c| c.flags.contains(CellFlags::HIDDEN)));
        assert!(frame[0].cells.iter().all(|c| c.fg == c.bg));
    }

    #[test]
    fn higher_priority_applies_last() {
        let b = buffer();
        let shift = instance(2, EffectKind::ColorShift, Target::line(0), 6);
        let tear = instance(1, EffectKind::ScreenTear, Target::lines(0..1), 9);
        let frame = renderer().render_frame(2, &b, &ScrollState::new(10), &[&tear, &shift], &CursorTrail::default());
        assert_eq!(frame[0].applied.as_slice(), &[InstanceId(2), InstanceId(1)]);
        assert_ne!(frame[0].offset, 0);
    }

    #[test]
    fn trail_pads_and_tints() {
        let b = buffer();
        let mut trail = CursorTrail::new(4, 0.8);
        trail.record(0, 20);
        let frame = renderer().render_frame(1, &b, &ScrollState::new(10), &[], &trail);
        assert_eq!(frame[0].cells.len(), 21);
        assert!(frame[0].cells[20].flags.contains(CellFlags::TRAIL));
        assert_eq!(frame[0].trail_marks, 1);
        assert!(!frame[0].is_pristine());
    }

    #[test]
    fn trail_far_past_line_end_is_dropped() {
        let b = buffer();
        let mut trail = CursorTrail::new(4, 0.8);
        trail.record(0, 5_000_000);
        trail.record(1, usize::MAX);
        let frame = renderer().render_frame(1, &b, &ScrollState::new(10), &[], &trail);
        assert_eq!(frame[0].cells.len(), 15);
        assert_eq!(frame[0].trail_marks, 0);
        assert_eq!(frame[1].cells.len(), 22);
        assert_eq!(frame[1].trail_marks, 0);
    }

    #[test]
    fn trail_column_follows_glyph_widths() {
        let mut b = TextBuffer::with_capacity(4);
        b.append(TextLine::new("日本x", Rgb::WHITE));
        let r = renderer();
        let view = ScrollState::new(4);

        let mut trail = CursorTrail::new(4, 0.8);
        trail.record(0, 3);
        let frame = r.render_frame(1, &b, &view, &[], &trail);
        assert_eq!(frame[0].cells.len(), 3);
        assert!(frame[0].cells[1].flags.contains(CellFlags::TRAIL));
        assert!(!frame[0].cells[2].flags.contains(CellFlags::TRAIL));

        let mut trail = CursorTrail::new(4, 0.8);
        trail.record(0, 4);
        let frame = r.render_frame(1, &b, &view, &[], &trail);
        assert_eq!(frame[0].cells[2].glyph, "x");
        assert!(frame[0].cells[2].flags.contains(CellFlags::TRAIL));

        let mut trail = CursorTrail::new(4, 0.8);
        trail.record(0, 6);
        let frame = r.render_frame(1, &b, &view, &[], &trail);
        assert_eq!(frame[0].cells.len(), 5);
        assert!(frame[0].cells[4].flags.contains(CellFlags::TRAIL));
    }

    #[test]
    fn scroll_window_selects_rows() {
        let mut b = TextBuffer::with_capacity(16);
        for i in 0..10 {
            b.append(TextLine::new(format!("l{i}"), Rgb::WHITE));
        }
        let mut view = ScrollState::new(3);
        view.scroll_to_bottom(b.len());
        let frame = renderer().render_frame(0, &b, &view, &[], &CursorTrail::default());
        let sources: Vec<_> = frame.iter().map(|d| d.source).collect();
        assert_eq!(
            sources,
            vec![LineSource::Buffer(7), LineSource::Buffer(8), LineSource::Buffer(9)]
        );
        assert_eq!(frame[0].row, 0);
    }
}
