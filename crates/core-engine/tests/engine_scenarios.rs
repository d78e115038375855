//! End-to-end scenarios through the engine facade.

use core_config::Config;
use core_effects::{EffectKind, EffectRequest, Rejection, Target};
use core_engine::{Engine, EngineSnapshot, HandleError};
use core_state::LevelChange;
use pretty_assertions::assert_eq;

fn config(text: &str) -> Config {
    core_config::parse_str(text).unwrap()
}

fn quiet_engine(height: usize) -> Engine {
    Engine::from_config(&config("[scheduler]\nmax_ambient_rolls = 0\n"), height)
}

fn with_lines(engine: &mut Engine, n: usize) {
    for i in 0..n {
        engine.append_text(&format!("$ line {i}"));
    }
}

#[test]
fn capacity_overflow_evicts_only_the_oldest() {
    let mut e = Engine::from_config(&config("[buffer]\ncapacity = 3\n"), 10);
    with_lines(&mut e, 4);
    let contents: Vec<&str> = e.buffer().iter().map(|l| l.content()).collect();
    assert_eq!(contents, vec!["$ line 1", "$ line 2", "$ line 3"]);
    assert_eq!(e.buffer().first_index(), 1);
    assert_eq!(e.buffer().get(3).map(|l| l.index()), Some(3));
}

#[test]
fn lower_priority_flicker_loses_to_decay() {
    let mut e = quiet_engine(10);
    with_lines(&mut e, 8);
    let decay = e
        .submit_effect("character_decay", Target::line(5), None, Some(10), None)
        .unwrap();
    let flicker = e.submit_effect("flicker", Target::line(5), None, Some(5), None);
    assert_eq!(flicker, Err(Rejection::ConflictLost { holder: decay }));
    e.tick();
    let active: Vec<_> = e.active_effects().iter().map(|i| i.id).collect();
    assert_eq!(active, vec![decay]);
}

#[test]
fn clear_all_leaves_a_pristine_frame() {
    let mut e = quiet_engine(6);
    with_lines(&mut e, 4);
    e.submit(EffectRequest::of(EffectKind::Redaction, Target::lines(1..3)).indefinite())
        .unwrap();
    e.submit(EffectRequest::of(EffectKind::Scanline, Target::Global).ticks(200))
        .unwrap();
    e.tick();
    assert!(e.frame().iter().any(|d| !d.is_pristine()));

    assert_eq!(e.clear_all_effects(), 2);
    assert!(e.frame().iter().all(|d| d.is_pristine()));
    let report = e.tick();
    assert_eq!(report.cancelled.len(), 2);
    assert!(e.frame().iter().all(|d| d.is_pristine()));
}

#[test]
fn rendering_twice_is_identical() {
    let mut e = Engine::from_config(&config("[profile]\ninitial_level = 100.0\n"), 8);
    with_lines(&mut e, 12);
    for _ in 0..40 {
        e.tick();
    }
    let tick = e.now();
    assert_eq!(e.render_frame(tick), e.render_frame(tick));
}

#[test]
fn same_seed_same_frames() {
    let run = || {
        let mut e = Engine::from_config(
            &config("[profile]\ninitial_level = 80.0\n[scheduler]\nseed = 7\n"),
            8,
        );
        with_lines(&mut e, 10);
        let mut frames = Vec::new();
        for _ in 0..30 {
            e.tick();
            frames.push(e.frame());
        }
        frames
    };
    assert_eq!(run(), run());
}

#[test]
fn out_of_range_level_is_clamped_and_reported() {
    let mut e = quiet_engine(4);
    assert_eq!(
        e.set_corruption_level(150.0),
        LevelChange::Clamped {
            requested: 150.0,
            applied: 100.0
        }
    );
    assert_eq!(e.corruption_level(), 100.0);
    assert!(e.adjust_corruption_level(-250.0).was_clamped());
    assert_eq!(e.corruption_level(), 0.0);
    assert_eq!(
        e.set_corruption_level(f32::NAN),
        LevelChange::Ignored { current: 0.0 }
    );
}

#[test]
fn handle_requests_resolve_on_the_next_tick() {
    let mut e = quiet_engine(6);
    let handle = e.handle();
    let ticket = std::thread::spawn(move || {
        handle.post_text(["worker output"]).unwrap();
        handle.set_level(40.0).unwrap();
        handle
            .submit(EffectRequest::of(EffectKind::Flicker, Target::line(0)))
            .unwrap()
    })
    .join()
    .unwrap();

    assert!(e.buffer().is_empty());
    let report = e.tick();
    assert_eq!(e.buffer().get(0).map(|l| l.content()), Some("worker output"));
    assert_eq!(e.corruption_level(), 40.0);
    let id = report.outcome(ticket).unwrap().clone().unwrap();
    assert!(e.active_effects().iter().any(|i| i.id == id));
}

#[test]
fn handle_rejections_are_reported_by_ticket() {
    let mut e = quiet_engine(6);
    let handle = e.handle();
    let ticket = handle
        .submit(EffectRequest::new("static_burst", Target::Global))
        .unwrap();
    let report = e.tick();
    assert_eq!(
        report.outcome(ticket),
        Some(&Err(Rejection::UnknownKind("static_burst".into())))
    );
}

#[test]
fn handle_placeholder_then_content() {
    let mut e = quiet_engine(3);
    let handle = e.handle();
    handle.set_placeholder(Some("...".into())).unwrap();
    e.tick();
    assert_eq!(e.frame().last().map(|d| d.text()), Some("...".to_string()));
    handle.post_text(["answer"]).unwrap();
    e.tick();
    let rows: Vec<String> = e.frame().iter().map(|d| d.text()).collect();
    assert_eq!(rows, vec!["answer".to_string()]);
}

#[test]
fn handle_outliving_engine_reports_shutdown() {
    let e = quiet_engine(3);
    let handle = e.handle();
    drop(e);
    assert_eq!(handle.clear_all(), Err(HandleError::EngineGone));
}

#[test]
fn snapshot_round_trips_through_toml() {
    let mut e = quiet_engine(3);
    e.set_corruption_level(42.5);
    let text = toml::to_string(&e.snapshot()).unwrap();
    let restored: EngineSnapshot = toml::from_str(&text).unwrap();
    assert_eq!(restored, EngineSnapshot { corruption_level: 42.5 });

    let mut fresh = quiet_engine(3);
    assert_eq!(
        fresh.restore(&restored),
        LevelChange::Applied { level: 42.5 }
    );
    assert_eq!(fresh.corruption_level(), 42.5);
}
