//! Presenters that turn an RGBA frame into terminal escape sequences.

mod ascii;
mod halfblock;

pub use ascii::AsciiRenderer;
pub use halfblock::HalfBlockRenderer;

use std::io::Write;

pub struct Frame<'a> {
    pub term_cols: u16,
    pub term_rows: u16,
    pub visual_rows: u16,
    pub pixel_width: usize,
    pub pixel_height: usize,
    pub pixels_rgba: &'a [u8],
    pub hud: &'a str,
    pub hud_rows: u16,
    pub overlay: Option<&'a str>,
    pub sync_updates: bool,
}

pub trait Renderer {
    fn name(&self) -> &'static str;
    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()>;
}

#[inline]
pub(crate) fn luma_u8(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 77 + g as u32 * 150 + b as u32 * 29) >> 8) as u8
}

/// Validates the frame geometry for `px_x` by `px_y` pixels per cell and
/// writes the frame prologue. Returns `(cols, visual_rows)` when drawable.
pub(crate) fn frame_begin(
    frame: &Frame<'_>,
    px_x: usize,
    px_y: usize,
    out: &mut dyn Write,
) -> anyhow::Result<Option<(usize, usize)>> {
    let cols = frame.term_cols as usize;
    let rows = frame.visual_rows as usize;
    if cols == 0 || rows == 0 || frame.pixel_width == 0 || frame.pixel_height == 0 {
        return Ok(None);
    }
    if frame.pixel_width != cols * px_x || frame.pixel_height != rows * px_y {
        return Ok(None);
    }
    let need = frame.pixel_width * frame.pixel_height * 4;
    if frame.sync_updates {
        out.write_all(b"\x1b[?2026h")?;
    }
    if frame.pixels_rgba.len() < need {
        out.write_all(b"\x1b[H\x1b[0m\x1b[2J")?;
        write!(out, "pixel buffer too small (need {}, got {})", need, frame.pixels_rgba.len())?;
        if frame.sync_updates {
            out.write_all(b"\x1b[?2026l")?;
        }
        out.flush()?;
        return Ok(None);
    }
    // Home, reset, and no autowrap while painting full-width rows.
    out.write_all(b"\x1b[H\x1b[0m\x1b[?7l")?;
    Ok(Some((cols, rows)))
}

/// HUD lines, optional overlay, then the epilogue matching [`frame_begin`].
pub(crate) fn frame_end(frame: &Frame<'_>, cols: usize, rows: usize, out: &mut dyn Write) -> anyhow::Result<()> {
    let mut hud = frame.hud.lines();
    for i in 0..frame.hud_rows as usize {
        write!(out, "\x1b[{};1H\x1b[0m\x1b[2K", rows + i + 1)?;
        if let Some(line) = hud.next() {
            let clipped: String = line.chars().take(cols).collect();
            out.write_all(clipped.as_bytes())?;
        }
    }
    if let Some(text) = frame.overlay {
        draw_overlay_popup(out, frame.term_cols, frame.term_rows, text)?;
    }
    out.write_all(b"\x1b[0m\x1b[?7h")?;
    if frame.sync_updates {
        out.write_all(b"\x1b[?2026l")?;
    }
    out.flush()?;
    Ok(())
}

/// Centered box with the first line as a bold title.
pub fn draw_overlay_popup(out: &mut dyn Write, term_cols: u16, term_rows: u16, text: &str) -> anyhow::Result<()> {
    let cols = term_cols as usize;
    let rows = term_rows as usize;
    if text.trim().is_empty() || cols < 8 || rows < 4 {
        return Ok(());
    }

    let max_inner = cols.saturating_sub(6).max(1);
    let lines: Vec<String> = text
        .lines()
        .map(|l| l.chars().take(max_inner).collect())
        .take(rows.saturating_sub(3).max(1))
        .collect();
    let inner = lines
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0)
        .clamp(1, max_inner);
    let box_w = inner + 4;
    let box_h = lines.len() + 2;
    let col0 = cols.saturating_sub(box_w) / 2 + 1;
    let row0 = rows.saturating_sub(box_h) / 2 + 1;

    let edge = "-".repeat(box_w - 2);
    out.write_all(b"\x1b[0m\x1b[38;2;236;242;255m\x1b[48;2;10;14;24m")?;
    write!(out, "\x1b[{};{}H+{}+", row0, col0, edge)?;
    for (i, line) in lines.iter().enumerate() {
        let pad = inner - line.chars().count().min(inner);
        if i == 0 {
            write!(
                out,
                "\x1b[{};{}H| \x1b[1m\x1b[38;2;255;236;160m{}{}\x1b[22m\x1b[38;2;236;242;255m |",
                row0 + 1 + i,
                col0,
                line,
                " ".repeat(pad)
            )?;
        } else {
            write!(out, "\x1b[{};{}H| {}{} |", row0 + 1 + i, col0, line, " ".repeat(pad))?;
        }
    }
    write!(out, "\x1b[{};{}H+{}+", row0 + box_h - 1, col0, edge)?;
    out.write_all(b"\x1b[0m")?;
    Ok(())
}
