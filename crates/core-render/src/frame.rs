//! Frame composition.

use crate::distort::{self, Pass};
use crate::metrics::RenderMetrics;
use crate::trail::CursorTrail;
use crate::{CellFlags, LineRenderDescriptor, LineSource, RenderCell};
use core_config::Palette;
use core_effects::{EffectInstance, EffectRegistry, Target};
use core_text::{ScrollState, TextBuffer, TextLine, grapheme};
use smallvec::SmallVec;
use std::sync::atomic::Ordering;
use tracing::trace;

/// Trail marks tint the background toward `highlight` by at most this much.
const TRAIL_TINT: f32 = 0.7;

/// Marks further than this many columns past the end of a line are dropped.
const TRAIL_PAD_LIMIT: usize = 8;

/// Pure compositor: identical inputs always yield identical descriptors.
#[derive(Debug)]
pub struct Renderer {
    palette: Palette,
    registry: EffectRegistry,
    metrics: RenderMetrics,
}

impl Renderer {
    pub fn new(palette: Palette, registry: EffectRegistry) -> Self {
        Self {
            palette,
            registry,
            metrics: RenderMetrics::default(),
        }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn metrics(&self) -> &RenderMetrics {
        &self.metrics
    }

    /// Describe every row of the viewport at `tick`.
    pub fn render_frame(
        &self,
        tick: u64,
        buffer: &TextBuffer,
        viewport: &ScrollState,
        instances: &[&EffectInstance],
        trail: &CursorTrail,
    ) -> Vec<LineRenderDescriptor> {
        let mut ordered: Vec<&EffectInstance> = instances.to_vec();
        ordered.sort_by_key(|i| (i.priority, i.id));

        let window = buffer.visible_window(viewport.offset, viewport.height);
        let frame: Vec<LineRenderDescriptor> = window
            .iter()
            .enumerate()
            .map(|(row, line)| {
                self.render_line(tick, row, line, buffer.is_placeholder(line), &ordered, trail)
            })
            .collect();

        self.metrics.frames.fetch_add(1, Ordering::Relaxed);
        self.metrics
            .lines
            .fetch_add(frame.len() as u64, Ordering::Relaxed);
        trace!(target: "render.frame", tick, rows = frame.len(), instances = ordered.len(), "frame_composed");
        frame
    }

    fn render_line(
        &self,
        tick: u64,
        row: usize,
        line: &TextLine,
        placeholder: bool,
        ordered: &[&EffectInstance],
        trail: &CursorTrail,
    ) -> LineRenderDescriptor {
        let mut d = self.base_descriptor(row, line, placeholder);
        let index = line.index();

        for inst in ordered {
            let applies = match inst.target {
                Target::Global => true,
                Target::Lines { .. } => !placeholder && inst.target.covers(index),
            };
            if !applies {
                continue;
            }
            let step = self
                .registry
                .get(inst.kind)
                .map(|k| k.step(tick, inst.start_tick))
                .unwrap_or_else(|_| tick.saturating_sub(inst.start_tick));
            let pass = Pass {
                inst,
                tick,
                step,
                line: index,
                row,
                palette: &self.palette,
            };
            distort::apply(&pass, &mut d);
        }
        self.metrics
            .effect_passes
            .fetch_add(d.applied.len() as u64, Ordering::Relaxed);

        if !placeholder {
            self.apply_trail(index, line, trail, &mut d);
        }
        d.brightness = d.brightness.clamp(0.0, 1.0);
        if d.is_pristine() {
            self.metrics.pristine_lines.fetch_add(1, Ordering::Relaxed);
        }
        d
    }

    fn base_descriptor(&self, row: usize, line: &TextLine, placeholder: bool) -> LineRenderDescriptor {
        let bg = line.bg().unwrap_or(self.palette.default_bg);
        let flags = if line.bold() {
            CellFlags::BOLD
        } else {
            CellFlags::empty()
        };
        let cells = grapheme::iter(line.content())
            .map(|g| RenderCell {
                glyph: g.to_string(),
                width: grapheme::cluster_width(g).min(u8::MAX as usize) as u8,
                fg: line.fg(),
                bg,
                flags,
            })
            .collect();
        LineRenderDescriptor {
            row: row.min(u16::MAX as usize) as u16,
            source: if placeholder {
                LineSource::Placeholder
            } else {
                LineSource::Buffer(line.index())
            },
            cells,
            offset: 0,
            brightness: 1.0,
            applied: SmallVec::new(),
            trail_marks: 0,
        }
    }

    fn apply_trail(&self, index: usize, line: &TextLine, trail: &CursorTrail, d: &mut LineRenderDescriptor) {
        let line_cols: usize = d.cells.iter().map(|c| c.width as usize).sum();
        for mark in trail.marks_on(index) {
            if mark.col >= line_cols + TRAIL_PAD_LIMIT {
                continue;
            }
            let Some(at) = cell_at_column(d, mark.col, line, self.palette.default_bg) else {
                continue;
            };
            let cell = &mut d.cells[at];
            cell.bg = cell.bg.lerp(self.palette.highlight, mark.weight * TRAIL_TINT);
            cell.flags |= CellFlags::TRAIL;
            d.trail_marks += 1;
        }
        self.metrics
            .trail_marks
            .fetch_add(d.trail_marks as u64, Ordering::Relaxed);
    }
}

/// Index of the cell covering terminal column `col`, padding the line with
/// blank cells when the column lies past its end.
fn cell_at_column(
    d: &mut LineRenderDescriptor,
    col: usize,
    line: &TextLine,
    default_bg: core_text::Rgb,
) -> Option<usize> {
    let mut start = 0usize;
    for (i, cell) in d.cells.iter().enumerate() {
        let end = start + cell.width as usize;
        if col < end {
            return Some(i);
        }
        start = end;
    }
    while start <= col {
        d.cells.push(RenderCell {
            glyph: " ".to_string(),
            width: 1,
            fg: line.fg(),
            bg: line.bg().unwrap_or(default_bg),
            flags: CellFlags::empty(),
        });
        start += 1;
    }
    d.cells.len().checked_sub(1)
}
