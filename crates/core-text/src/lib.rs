//! Capacity-bounded terminal line store.
//!
//! `TextBuffer` keeps the authoritative, uncorrupted history of everything the
//! host printed. Lines are immutable once appended; corruption only ever
//! happens on the way out (render time), never in place.
//!
//! Indexing:
//! - Every appended line receives an absolute, monotonically increasing
//!   `index`. Indices are never reused, so an effect aimed at line 5 keeps
//!   pointing at the same content even after older lines are evicted.
//! - `first_index()..next_index()` is the range of indices currently retained.
//!
//! Eviction is normal operation: appending past capacity silently drops the
//! oldest line. `clear()` drops everything but keeps the index counter running.

use std::collections::VecDeque;
use std::ops::Range;

pub mod color;
pub mod scroll;

pub use color::Rgb;
pub use scroll::ScrollState;

/// Default number of retained lines when no configuration overrides it.
pub const DEFAULT_CAPACITY: usize = 1000;

/// A single rendered terminal line with its base style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLine {
    index: usize,
    content: String,
    fg: Rgb,
    bg: Option<Rgb>,
    bold: bool,
}

impl TextLine {
    pub fn new(content: impl Into<String>, fg: Rgb) -> Self {
        Self {
            index: 0,
            content: content.into(),
            fg,
            bg: None,
            bold: false,
        }
    }

    pub fn with_bg(mut self, bg: Rgb) -> Self {
        self.bg = Some(bg);
        self
    }

    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    /// Absolute index assigned by the buffer on append (0 before append).
    pub fn index(&self) -> usize {
        self.index
    }
    pub fn content(&self) -> &str {
        &self.content
    }
    pub fn fg(&self) -> Rgb {
        self.fg
    }
    pub fn bg(&self) -> Option<Rgb> {
        self.bg
    }
    pub fn bold(&self) -> bool {
        self.bold
    }
}

/// Ring buffer of `TextLine`s, oldest first.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    lines: VecDeque<TextLine>,
    capacity: usize,
    next_index: usize,
    placeholder: Option<TextLine>,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl TextBuffer {
    /// Create a buffer retaining at most `capacity` lines (0 is coerced to 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity.min(4096)),
            capacity,
            next_index: 0,
            placeholder: None,
        }
    }

    /// Append a line, returning its absolute index. Evicts the oldest line when full.
    pub fn append(&mut self, mut line: TextLine) -> usize {
        let index = self.next_index;
        self.next_index += 1;
        line.index = index;
        self.lines.push_back(line);
        while self.lines.len() > self.capacity {
            if let Some(evicted) = self.lines.pop_front() {
                tracing::trace!(target: "text.buffer", index = evicted.index, "line_evicted");
            }
        }
        index
    }

    /// Ordered window of at most `height` lines starting `scroll_offset` lines after the oldest
    /// retained line. A pending placeholder is shown after the newest line when the window
    /// reaches the end of the buffer.
    pub fn visible_window(&self, scroll_offset: usize, height: usize) -> Vec<&TextLine> {
        let start = scroll_offset.min(self.lines.len());
        let mut out: Vec<&TextLine> = self.lines.iter().skip(start).take(height).collect();
        if let Some(ph) = self.placeholder.as_ref()
            && out.len() < height
        {
            out.push(ph);
        }
        out
    }

    /// Absolute index range of the stored lines a window would show (placeholder excluded).
    pub fn visible_range(&self, scroll_offset: usize, height: usize) -> Range<usize> {
        let start = scroll_offset.min(self.lines.len());
        let end = (start + height).min(self.lines.len());
        let first = self.first_index();
        (first + start)..(first + end)
    }

    /// Drop every stored line immediately. Indices keep counting from where they were.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn get(&self, index: usize) -> Option<&TextLine> {
        let first = self.first_index();
        if index < first {
            return None;
        }
        self.lines.get(index - first)
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.first_index() && index < self.next_index
    }

    /// True when every index in the (non-empty) half-open range is currently stored.
    pub fn contains_range(&self, range: &Range<usize>) -> bool {
        !range.is_empty() && self.contains(range.start) && self.contains(range.end - 1)
    }

    /// True when at least one index of the range is still stored.
    pub fn intersects(&self, range: &Range<usize>) -> bool {
        range.start < self.next_index && range.end > self.first_index() && !self.lines.is_empty()
    }

    /// Index of the oldest retained line (equals `next_index()` when empty).
    pub fn first_index(&self) -> usize {
        self.lines
            .front()
            .map(|l| l.index)
            .unwrap_or(self.next_index)
    }

    /// Index the next appended line will receive.
    pub fn next_index(&self) -> usize {
        self.next_index
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &TextLine> {
        self.lines.iter()
    }

    /// Show `line` after the newest stored line until content is posted.
    pub fn set_placeholder(&mut self, mut line: TextLine) {
        line.index = self.next_index;
        self.placeholder = Some(line);
    }

    pub fn clear_placeholder(&mut self) {
        self.placeholder = None;
    }

    pub fn placeholder(&self) -> Option<&TextLine> {
        self.placeholder.as_ref()
    }

    /// Whether `line` is the virtual placeholder rather than a stored line.
    pub fn is_placeholder(&self, line: &TextLine) -> bool {
        self.placeholder
            .as_ref()
            .is_some_and(|p| std::ptr::eq(p, line))
    }
}

/// Grapheme and width utilities. Pure helpers operating on a single line.
pub mod grapheme {
    use unicode_segmentation::UnicodeSegmentation;
    use unicode_width::UnicodeWidthStr;

    /// Iterate grapheme clusters in a line.
    pub fn iter(line: &str) -> impl Iterator<Item = &str> {
        line.graphemes(true)
    }

    /// Width in terminal cells of this grapheme cluster (at least 1 for non-empty input).
    pub fn cluster_width(g: &str) -> usize {
        if g.is_empty() {
            return 0;
        }
        g.width().max(1)
    }

    /// Whitespace clusters are never corrupted.
    pub fn is_blank(g: &str) -> bool {
        g.chars().all(char::is_whitespace)
    }
}
