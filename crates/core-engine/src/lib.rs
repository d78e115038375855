//! Engine facade.
//!
//! `Engine` owns the text buffer, the viewport, the corruption profile, the
//! scheduler, the renderer and the cursor trail, and is the surface external
//! collaborators (shell simulation, story logic, audio cues) talk to. It is
//! single-threaded: the host calls `tick()` once per frame and renders with
//! `frame()`. Work from other threads goes through an `EngineHandle`, whose
//! commands are drained at the start of each tick.

use anyhow::Result;
use core_config::Config;
use core_effects::{EffectDuration, EffectInstance, EffectRequest, InstanceId, Rejection, Target};
use core_render::{CursorTrail, LineRenderDescriptor, Renderer};
use core_scheduler::{CancelOutcome, EffectScheduler, TickReport};
use core_state::{CorruptionProfile, LevelChange};
use core_text::{Rgb, ScrollState, TextBuffer, TextLine};
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use tracing::{debug, info, trace};

mod intake;
pub mod snapshot;

use intake::Command;
pub use intake::{EngineHandle, HandleError};
pub use snapshot::EngineSnapshot;

pub struct Engine {
    buffer: TextBuffer,
    scroll: ScrollState,
    profile: CorruptionProfile,
    scheduler: EffectScheduler,
    renderer: Renderer,
    trail: CursorTrail,
    tx: Sender<Command>,
    rx: Receiver<Command>,
    tickets: Arc<AtomicU64>,
}

impl Engine {
    /// Build an engine showing `height` rows.
    pub fn from_config(cfg: &Config, height: usize) -> Self {
        let registry = core_effects::EffectRegistry::from_config(&cfg.file.effects);
        let (tx, rx) = crossbeam_channel::unbounded();
        info!(
            target: "engine",
            capacity = cfg.file.buffer.capacity,
            kinds = registry.len(),
            theme = cfg.file.theme.name.as_str(),
            height,
            "engine_ready"
        );
        Self {
            buffer: TextBuffer::with_capacity(cfg.file.buffer.capacity),
            scroll: ScrollState::new(height),
            profile: CorruptionProfile::from_config(&cfg.file.profile),
            scheduler: EffectScheduler::new(registry.clone(), &cfg.file.scheduler),
            renderer: Renderer::new(cfg.palette(), registry),
            trail: CursorTrail::from_config(&cfg.file.trail),
            tx,
            rx,
            tickets: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Load configuration (`None` discovers `glitchterm.toml`) and build.
    pub fn load(config_path: Option<PathBuf>, height: usize) -> Result<Self> {
        let cfg = core_config::load_from(config_path)?;
        Ok(Self::from_config(&cfg, height))
    }

    pub fn handle(&self) -> EngineHandle {
        EngineHandle::new(self.tx.clone(), Arc::clone(&self.tickets))
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn scroll(&self) -> &ScrollState {
        &self.scroll
    }

    pub fn profile(&self) -> &CorruptionProfile {
        &self.profile
    }

    pub fn profile_mut(&mut self) -> &mut CorruptionProfile {
        &mut self.profile
    }

    pub fn scheduler(&self) -> &EffectScheduler {
        &self.scheduler
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn trail(&self) -> &CursorTrail {
        &self.trail
    }

    /// Current tick (0 before the first `tick()`).
    pub fn now(&self) -> u64 {
        self.scheduler.now()
    }

    // ----- effects -------------------------------------------------------

    /// Trigger an effect by kind name. Omitted fields take the kind's defaults.
    pub fn submit_effect(
        &mut self,
        kind: &str,
        target: Target,
        intensity: Option<f32>,
        priority: Option<i32>,
        duration: Option<EffectDuration>,
    ) -> Result<InstanceId, Rejection> {
        self.submit(EffectRequest {
            kind: kind.to_string(),
            target,
            intensity,
            priority,
            duration,
        })
    }

    /// Accepted requests become Active at the next tick.
    pub fn submit(&mut self, request: EffectRequest) -> Result<InstanceId, Rejection> {
        self.scheduler
            .submit(request, &mut self.profile, &self.buffer)
    }

    pub fn set_corruption_level(&mut self, level: f32) -> LevelChange {
        self.profile.set_level(level)
    }

    pub fn adjust_corruption_level(&mut self, delta: f32) -> LevelChange {
        self.profile.adjust_level(delta)
    }

    pub fn corruption_level(&self) -> f32 {
        self.profile.level()
    }

    /// Cancel every live instance; the next frame is pristine.
    pub fn clear_all_effects(&mut self) -> usize {
        self.scheduler.clear_all()
    }

    pub fn cancel_effect(&mut self, id: InstanceId) -> CancelOutcome {
        self.scheduler.cancel(id)
    }

    pub fn active_effects(&self) -> Vec<&EffectInstance> {
        self.scheduler.active_snapshot()
    }

    // ----- content -------------------------------------------------------

    /// Append a completed line; replaces any pending placeholder.
    pub fn append_line(&mut self, line: TextLine) -> usize {
        self.buffer.clear_placeholder();
        let index = self.buffer.append(line);
        self.scroll.on_buffer_changed(self.scroll_len());
        index
    }

    /// Append plain text in the theme's default foreground, one line per `\n`.
    pub fn append_text(&mut self, text: &str) -> usize {
        let fg = self.renderer.palette().default_fg;
        let mut last = self.buffer.next_index();
        for content in text.split('\n') {
            last = self.append_line(TextLine::new(content, fg));
        }
        last
    }

    pub fn post_lines<I>(&mut self, lines: I) -> usize
    where
        I: IntoIterator<Item = TextLine>,
    {
        lines.into_iter().map(|l| self.append_line(l)).count()
    }

    /// Show a pending-output row (e.g. "...") after the newest line.
    pub fn set_placeholder(&mut self, text: &str) {
        let palette = self.renderer.palette();
        let line = TextLine::new(text, palette.default_fg.scale(0.6));
        self.buffer.set_placeholder(line);
        self.scroll.on_buffer_changed(self.scroll_len());
    }

    pub fn clear_placeholder(&mut self) {
        self.buffer.clear_placeholder();
        self.scroll.on_buffer_changed(self.scroll_len());
    }

    /// Drop all stored lines. Instances targeting them are cancelled at the
    /// next tick.
    pub fn clear_buffer(&mut self) {
        self.buffer.clear();
        self.buffer.clear_placeholder();
        self.trail.clear();
        self.scroll.scroll_to_bottom(0);
        debug!(target: "engine", next_index = self.buffer.next_index(), "buffer_cleared");
    }

    // ----- viewport ------------------------------------------------------

    fn scroll_len(&self) -> usize {
        self.buffer.len() + usize::from(self.buffer.placeholder().is_some())
    }

    pub fn scroll_up(&mut self, amount: Option<usize>) {
        self.scroll.scroll_up(amount);
    }

    pub fn scroll_down(&mut self, amount: Option<usize>) {
        let len = self.scroll_len();
        self.scroll.scroll_down(amount, len);
    }

    pub fn scroll_to_bottom(&mut self) {
        let len = self.scroll_len();
        self.scroll.scroll_to_bottom(len);
    }

    pub fn resize(&mut self, height: usize) {
        let len = self.scroll_len();
        self.scroll.resize(height, len);
    }

    /// Record the host cursor at a viewport `row` and column.
    pub fn record_cursor(&mut self, row: usize, col: usize) {
        let line = self
            .buffer
            .first_index()
            .saturating_add(self.scroll.offset)
            .saturating_add(row);
        self.trail.record(line, col);
    }

    // ----- frame loop ----------------------------------------------------

    /// Drain the intake queue, fade the cursor trail and advance the scheduler.
    pub fn tick(&mut self) -> TickReport {
        let drained = self.drain_intake();
        self.trail.decay();
        let visible = self
            .buffer
            .visible_range(self.scroll.offset, self.scroll.height);
        let report = self.scheduler.tick(&mut self.profile, &self.buffer, visible);
        if drained > 0 || report.changed() {
            trace!(
                target: "engine",
                tick = report.tick,
                drained,
                active = self.scheduler.active_len(),
                "tick"
            );
        }
        report
    }

    /// Descriptors for the viewport at `tick`.
    pub fn render_frame(&self, tick: u64) -> Vec<LineRenderDescriptor> {
        let active = self.scheduler.active_snapshot();
        self.renderer
            .render_frame(tick, &self.buffer, &self.scroll, &active, &self.trail)
    }

    /// Descriptors for the viewport at the current tick.
    pub fn frame(&self) -> Vec<LineRenderDescriptor> {
        self.render_frame(self.now())
    }

    fn drain_intake(&mut self) -> usize {
        let mut drained = 0;
        loop {
            match self.rx.try_recv() {
                Ok(cmd) => {
                    self.apply(cmd);
                    drained += 1;
                }
                // The engine holds a sender, so the channel never disconnects.
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        drained
    }

    fn apply(&mut self, cmd: Command) {
        match cmd {
            Command::Submit(ticket, request) => self.scheduler.enqueue(ticket, request),
            Command::SetLevel(level) => {
                self.profile.set_level(level);
            }
            Command::AdjustLevel(delta) => {
                self.profile.adjust_level(delta);
            }
            Command::ClearAll => {
                self.scheduler.clear_all();
            }
            Command::Cancel(id) => {
                if self.scheduler.cancel(id) == CancelOutcome::NotFound {
                    debug!(target: "engine", %id, "cancel_unknown_instance");
                }
            }
            Command::PostLines(lines) => {
                self.post_lines(lines);
            }
            Command::PostText(lines) => {
                let fg: Rgb = self.renderer.palette().default_fg;
                self.post_lines(lines.into_iter().map(|l| TextLine::new(l, fg)));
            }
            Command::Placeholder(Some(text)) => self.set_placeholder(&text),
            Command::Placeholder(None) => self.clear_placeholder(),
        }
    }

    // ----- persistence ---------------------------------------------------

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            corruption_level: self.profile.level(),
        }
    }

    pub fn restore(&mut self, snapshot: &EngineSnapshot) -> LevelChange {
        info!(target: "engine", level = snapshot.corruption_level, "snapshot_restored");
        self.profile.set_level(snapshot.corruption_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_effects::EffectKind;

    fn engine() -> Engine {
        let mut cfg = Config::default();
        cfg.file.scheduler.max_ambient_rolls = 0;
        Engine::from_config(&cfg, 5)
    }

    #[test]
    fn append_text_splits_lines() {
        let mut e = engine();
        let last = e.append_text("one\ntwo\nthree");
        assert_eq!(last, 2);
        assert_eq!(e.buffer().len(), 3);
        assert_eq!(e.buffer().get(1).map(|l| l.content()), Some("two"));
    }

    #[test]
    fn view_follows_new_output() {
        let mut e = engine();
        for i in 0..12 {
            e.append_text(&format!("line {i}"));
        }
        assert_eq!(e.scroll().offset, 7);
        e.scroll_up(Some(3));
        e.append_text("more");
        assert_eq!(e.scroll().offset, 4);
        e.scroll_to_bottom();
        assert_eq!(e.scroll().offset, 8);
    }

    #[test]
    fn placeholder_occupies_bottom_row() {
        let mut e = engine();
        for i in 0..5 {
            e.append_text(&format!("l{i}"));
        }
        e.set_placeholder("...");
        let frame = e.frame();
        assert_eq!(frame.len(), 5);
        assert_eq!(frame[4].text(), "...");
        e.append_text("done");
        let frame = e.frame();
        assert_eq!(frame[4].text(), "done");
        assert!(e.buffer().placeholder().is_none());
    }

    #[test]
    fn cursor_rows_map_to_absolute_lines() {
        let mut e = engine();
        for i in 0..8 {
            e.append_text(&format!("l{i}"));
        }
        e.record_cursor(0, 1);
        let frame = e.frame();
        assert_eq!(frame[0].trail_marks, 1);
        assert_eq!(e.trail().marks_on(3).count(), 1);
    }

    #[test]
    fn far_cursor_column_does_not_grow_the_line() {
        let mut e = engine();
        e.append_text("hi");
        e.record_cursor(0, 5_000_000);
        e.record_cursor(usize::MAX, usize::MAX);
        let frame = e.frame();
        assert_eq!(frame[0].cells.len(), 2);
        assert_eq!(frame[0].trail_marks, 0);
    }

    #[test]
    fn submit_effect_uses_defaults() {
        let mut e = engine();
        e.append_text("target");
        let id = e
            .submit_effect("flicker", Target::line(0), None, None, None)
            .unwrap();
        e.tick();
        let active = e.active_effects();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, id);
        assert_eq!(active[0].kind, EffectKind::Flicker);
    }

    #[test]
    fn clearing_buffer_evicts_targets() {
        let mut e = engine();
        e.append_text("a\nb");
        e.submit(EffectRequest::of(EffectKind::Redaction, Target::lines(0..2)).indefinite())
            .unwrap();
        e.tick();
        e.clear_buffer();
        let report = e.tick();
        assert_eq!(report.cancelled.len(), 1);
        assert!(e.active_effects().is_empty());
    }
}
