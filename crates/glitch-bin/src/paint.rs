//! Turn line render descriptors into crossterm output.

use anyhow::Result;
use core_render::{CellFlags, LineRenderDescriptor, RenderCell};
use core_text::Rgb;
use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Attribute, Color, Print, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use std::io::Write;

fn color(rgb: Rgb) -> Color {
    Color::Rgb {
        r: rgb.r,
        g: rgb.g,
        b: rgb.b,
    }
}

/// First screen column and the cells that land on screen once `offset` is
/// applied. Negative offsets cut cells off the left edge.
pub fn placed(descriptor: &LineRenderDescriptor, width: u16) -> (u16, &[RenderCell]) {
    let offset = descriptor.offset;
    let (start, skip_cols) = if offset >= 0 {
        (offset as u16, 0usize)
    } else {
        (0, offset.unsigned_abs() as usize)
    };
    if start >= width {
        return (start, &[]);
    }
    let mut skipped = 0usize;
    let mut first = 0usize;
    while first < descriptor.cells.len() && skipped < skip_cols {
        skipped += descriptor.cells[first].width.max(1) as usize;
        first += 1;
    }
    (start, &descriptor.cells[first..])
}

/// Column just past the last visible glyph on the bottom row.
pub fn cursor_col(frame: &[LineRenderDescriptor]) -> usize {
    frame
        .last()
        .map(|d| d.cells.iter().map(|c| c.width as usize).sum())
        .unwrap_or(0)
}

pub fn draw<W: Write>(out: &mut W, frame: &[LineRenderDescriptor], width: u16) -> Result<()> {
    for descriptor in frame {
        queue!(
            out,
            MoveTo(0, descriptor.row),
            SetAttribute(Attribute::Reset),
            Clear(ClearType::CurrentLine)
        )?;
        let (start, cells) = placed(descriptor, width);
        queue!(out, MoveTo(start, descriptor.row))?;
        let mut col = start as usize;
        for cell in cells {
            let w = cell.width.max(1) as usize;
            if col + w > width as usize {
                break;
            }
            let fg = cell.fg.scale(descriptor.brightness);
            queue!(
                out,
                SetForegroundColor(color(fg)),
                SetBackgroundColor(color(cell.bg))
            )?;
            if cell.flags.contains(CellFlags::BOLD) {
                queue!(out, SetAttribute(Attribute::Bold))?;
            }
            if cell.flags.contains(CellFlags::HIDDEN) {
                queue!(out, Print(" ".repeat(w)))?;
            } else {
                queue!(out, Print(&cell.glyph))?;
            }
            if cell.flags.contains(CellFlags::BOLD) {
                queue!(out, SetAttribute(Attribute::NormalIntensity))?;
            }
            col += w;
        }
    }
    queue!(out, SetAttribute(Attribute::Reset))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_render::LineSource;

    fn cells(text: &str) -> Vec<RenderCell> {
        text.chars()
            .map(|c| RenderCell {
                glyph: c.to_string(),
                width: 1,
                fg: Rgb::WHITE,
                bg: Rgb::new(0, 0, 0),
                flags: CellFlags::empty(),
            })
            .collect()
    }

    fn descriptor(text: &str, offset: i16) -> LineRenderDescriptor {
        LineRenderDescriptor {
            row: 0,
            source: LineSource::Buffer(0),
            cells: cells(text),
            offset,
            brightness: 1.0,
            applied: Default::default(),
            trail_marks: 0,
        }
    }

    #[test]
    fn positive_offset_shifts_start() {
        let d = descriptor("abc", 2);
        let (start, visible) = placed(&d, 80);
        assert_eq!(start, 2);
        assert_eq!(visible.len(), 3);
    }

    #[test]
    fn negative_offset_clips_left() {
        let d = descriptor("abcdef", -2);
        let (start, visible) = placed(&d, 80);
        assert_eq!(start, 0);
        assert_eq!(visible[0].glyph, "c");
    }

    #[test]
    fn draw_writes_glyphs() {
        let mut out = Vec::new();
        draw(&mut out, &[descriptor("hi", 0)], 10).unwrap();
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains('h') && text.contains('i'));
    }

    #[test]
    fn cursor_follows_bottom_row() {
        assert_eq!(cursor_col(&[descriptor("abc", 0), descriptor("hello", 0)]), 5);
        assert_eq!(cursor_col(&[]), 0);
    }
}
