use core_config::Palette;
use core_effects::{
    CooldownKey, EffectDuration, EffectInstance, EffectKind, EffectRegistry, InstanceId, Origin,
    Target,
};
use core_render::{CellFlags, CursorTrail, Renderer};
use core_text::{Rgb, ScrollState, TextBuffer, TextLine};

fn one_line(text: &str) -> TextBuffer {
    let mut b = TextBuffer::with_capacity(4);
    b.append(TextLine::new(text, Rgb::WHITE));
    b
}

fn redaction() -> EffectInstance {
    let target = Target::lines(0..1);
    EffectInstance {
        id: InstanceId(1),
        kind: EffectKind::Redaction,
        target,
        start_tick: 0,
        duration: EffectDuration::Indefinite,
        intensity: 1.0,
        priority: 12,
        group: core_effects::ExclusivityGroup::VisualOverlay,
        cooldown_key: CooldownKey {
            kind: EffectKind::Redaction,
            target,
        },
        seed: 99,
        origin: Origin::Explicit,
    }
}

fn render(b: &TextBuffer, instances: &[&EffectInstance]) -> Vec<core_render::LineRenderDescriptor> {
    Renderer::new(Palette::default(), EffectRegistry::builtin()).render_frame(
        0,
        b,
        &ScrollState::new(4),
        instances,
        &CursorTrail::default(),
    )
}

#[test]
fn combining_mark_is_one_cell() {
    let b = one_line("e\u{0301}z");
    let frame = render(&b, &[]);
    assert_eq!(frame[0].cells.len(), 2);
    assert_eq!(frame[0].cells[0].glyph, "e\u{0301}");
    assert_eq!(frame[0].cells[1].glyph, "z");
}

#[test]
fn zwj_family_single_cell() {
    let b = one_line("👨‍👩‍👧‍👦Z");
    let frame = render(&b, &[]);
    assert_eq!(frame[0].cells[0].glyph, "👨‍👩‍👧‍👦");
    assert_eq!(frame[0].cells[1].glyph, "Z");
}

#[test]
fn redacting_wide_cluster_keeps_columns() {
    let b = one_line("日本");
    let red = redaction();
    let frame = render(&b, &[&red]);
    for cell in &frame[0].cells {
        assert!(cell.flags.contains(CellFlags::REDACTED));
        assert_eq!(cell.width, 2);
        assert_eq!(cell.glyph, "██");
    }
}
