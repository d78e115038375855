//! Vertical scroll position over a `TextBuffer`.
//!
//! Guarantees:
//! * `offset` counts lines from the oldest retained line and never exceeds
//!   `len - height` (saturating at 0).
//! * While the view sits at the bottom it follows new output; scrolling up
//!   detaches it until the bottom is reached again.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollState {
    pub offset: usize,
    pub height: usize,
    follow_tail: bool,
}

impl ScrollState {
    pub fn new(height: usize) -> Self {
        Self {
            offset: 0,
            height,
            follow_tail: true,
        }
    }

    fn max_offset(&self, len: usize) -> usize {
        len.saturating_sub(self.height)
    }

    /// Default step: a third of the visible height, at least one line.
    fn default_step(&self) -> usize {
        (self.height / 3).max(1)
    }

    pub fn scroll_up(&mut self, amount: Option<usize>) {
        let step = amount.unwrap_or_else(|| self.default_step()).max(1);
        self.offset = self.offset.saturating_sub(step);
        self.follow_tail = false;
    }

    pub fn scroll_down(&mut self, amount: Option<usize>, len: usize) {
        let step = amount.unwrap_or_else(|| self.default_step()).max(1);
        let max = self.max_offset(len);
        self.offset = (self.offset + step).min(max);
        self.follow_tail = self.offset == max;
    }

    pub fn scroll_to_bottom(&mut self, len: usize) {
        self.offset = self.max_offset(len);
        self.follow_tail = true;
    }

    /// Re-clamp after the buffer changed (append, eviction, clear).
    pub fn on_buffer_changed(&mut self, len: usize) {
        if self.follow_tail {
            self.offset = self.max_offset(len);
        } else {
            self.offset = self.offset.min(self.max_offset(len));
        }
    }

    pub fn resize(&mut self, height: usize, len: usize) {
        self.height = height;
        self.on_buffer_changed(len);
    }

    pub fn is_following(&self) -> bool {
        self.follow_tail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follows_tail_until_scrolled_up() {
        let mut s = ScrollState::new(5);
        s.on_buffer_changed(12);
        assert_eq!(s.offset, 7);
        s.scroll_up(None); // step = 5 / 3 = 1
        assert_eq!(s.offset, 6);
        s.on_buffer_changed(13);
        assert_eq!(s.offset, 6, "detached view stays put");
        s.scroll_down(Some(10), 13);
        assert_eq!(s.offset, 8);
        assert!(s.is_following());
    }

    #[test]
    fn short_buffer_pins_to_top() {
        let mut s = ScrollState::new(10);
        s.scroll_to_bottom(3);
        assert_eq!(s.offset, 0);
        s.scroll_up(Some(4));
        assert_eq!(s.offset, 0);
    }
}
