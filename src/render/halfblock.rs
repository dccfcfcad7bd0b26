use crate::render::{frame_begin, frame_end, Frame, Renderer};
use std::io::Write;

const HALF_BLOCK: char = '\u{2580}';

/// Two pixels per cell: upper half in the foreground color, lower half in
/// the background color.
#[derive(Default)]
pub struct HalfBlockRenderer {
    last_fg: Option<(u8, u8, u8)>,
    last_bg: Option<(u8, u8, u8)>,
}

impl HalfBlockRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Renderer for HalfBlockRenderer {
    fn name(&self) -> &'static str {
        "halfblock"
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        let Some((cols, rows)) = frame_begin(frame, 1, 2, out)? else {
            return Ok(());
        };
        self.last_fg = None;
        self.last_bg = None;

        let w = frame.pixel_width;
        let px = frame.pixels_rgba;
        for row in 0..rows {
            let top = row * 2 * w;
            let bot = top + w;
            for x in 0..cols {
                let ti = (top + x) * 4;
                let bi = (bot + x) * 4;
                let fg = (px[ti], px[ti + 1], px[ti + 2]);
                let bg = (px[bi], px[bi + 1], px[bi + 2]);
                if self.last_fg != Some(fg) {
                    write!(out, "\x1b[38;2;{};{};{}m", fg.0, fg.1, fg.2)?;
                    self.last_fg = Some(fg);
                }
                if self.last_bg != Some(bg) {
                    write!(out, "\x1b[48;2;{};{};{}m", bg.0, bg.1, bg.2)?;
                    self.last_bg = Some(bg);
                }
                write!(out, "{HALF_BLOCK}")?;
            }
            out.write_all(b"\r\n")?;
        }

        frame_end(frame, cols, rows, out)
    }
}
