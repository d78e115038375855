//! Frame composition counters.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct RenderMetrics {
    pub frames: AtomicU64,
    pub lines: AtomicU64,
    /// Instance passes applied across all lines.
    pub effect_passes: AtomicU64,
    pub trail_marks: AtomicU64,
    /// Lines left untouched by any effect or trail mark.
    pub pristine_lines: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderMetricsSnapshot {
    pub frames: u64,
    pub lines: u64,
    pub effect_passes: u64,
    pub trail_marks: u64,
    pub pristine_lines: u64,
}

impl RenderMetrics {
    pub fn snapshot(&self) -> RenderMetricsSnapshot {
        RenderMetricsSnapshot {
            frames: self.frames.load(Ordering::Relaxed),
            lines: self.lines.load(Ordering::Relaxed),
            effect_passes: self.effect_passes.load(Ordering::Relaxed),
            trail_marks: self.trail_marks.load(Ordering::Relaxed),
            pristine_lines: self.pristine_lines.load(Ordering::Relaxed),
        }
    }
}
