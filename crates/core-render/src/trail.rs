//! Fading cursor trail.
//!
//! Positions are recorded as the host cursor moves; each tick multiplies every
//! weight by `decay` and drops marks that faded out. The renderer draws the
//! trail last so it always sits on top of effects.

use core_config::TrailConfig;
use std::collections::VecDeque;

/// Marks below this weight are dropped.
const MIN_WEIGHT: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailMark {
    /// Absolute buffer line index.
    pub line: usize,
    /// Terminal column; wide glyphs span two.
    pub col: usize,
    /// `(0, 1]`; newest mark is 1.0.
    pub weight: f32,
}

#[derive(Debug, Clone)]
pub struct CursorTrail {
    marks: VecDeque<TrailMark>,
    length: usize,
    decay: f32,
}

impl Default for CursorTrail {
    fn default() -> Self {
        Self::from_config(&TrailConfig::default())
    }
}

impl CursorTrail {
    pub fn from_config(cfg: &TrailConfig) -> Self {
        Self::new(cfg.length, cfg.decay)
    }

    pub fn new(length: usize, decay: f32) -> Self {
        let decay = if decay.is_finite() {
            decay.clamp(0.0, 0.99)
        } else {
            0.0
        };
        Self {
            marks: VecDeque::with_capacity(length),
            length,
            decay,
        }
    }

    /// Record the cursor at `(line, col)`. Re-recording the newest position
    /// only refreshes its weight.
    pub fn record(&mut self, line: usize, col: usize) {
        if self.length == 0 {
            return;
        }
        if let Some(last) = self.marks.back_mut()
            && last.line == line
            && last.col == col
        {
            last.weight = 1.0;
            return;
        }
        self.marks.push_back(TrailMark {
            line,
            col,
            weight: 1.0,
        });
        while self.marks.len() > self.length {
            self.marks.pop_front();
        }
    }

    /// Fade every mark by one tick.
    pub fn decay(&mut self) {
        let factor = self.decay;
        for m in self.marks.iter_mut() {
            m.weight *= factor;
        }
        self.marks.retain(|m| m.weight >= MIN_WEIGHT);
    }

    pub fn clear(&mut self) {
        self.marks.clear();
    }

    /// Marks on `line`, oldest first.
    pub fn marks_on(&self, line: usize) -> impl Iterator<Item = &TrailMark> {
        self.marks.iter().filter(move |m| m.line == line)
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_caps_length() {
        let mut t = CursorTrail::new(3, 0.5);
        for c in 0..5 {
            t.record(0, c);
        }
        assert_eq!(t.len(), 3);
        let cols: Vec<_> = t.marks_on(0).map(|m| m.col).collect();
        assert_eq!(cols, vec![2, 3, 4]);
    }

    #[test]
    fn decay_fades_and_drops() {
        let mut t = CursorTrail::new(4, 0.5);
        t.record(1, 1);
        t.decay();
        assert_eq!(t.marks_on(1).next().unwrap().weight, 0.5);
        for _ in 0..5 {
            t.decay();
        }
        assert!(t.is_empty());
    }

    #[test]
    fn repeated_position_refreshes() {
        let mut t = CursorTrail::new(4, 0.5);
        t.record(2, 7);
        t.decay();
        t.record(2, 7);
        assert_eq!(t.len(), 1);
        assert_eq!(t.marks_on(2).next().unwrap().weight, 1.0);
    }

    #[test]
    fn zero_length_records_nothing() {
        let mut t = CursorTrail::new(0, 0.8);
        t.record(0, 0);
        assert!(t.is_empty());
    }
}
