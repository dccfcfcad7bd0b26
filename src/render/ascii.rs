use crate::render::{frame_begin, frame_end, luma_u8, Frame, Renderer};
use std::io::Write;

// Dark to bright.
const RAMP: &[u8] = b" .:-=+*#%@";

/// One pixel per cell, picked from a brightness ramp and tinted.
#[derive(Default)]
pub struct AsciiRenderer {
    last_fg: Option<(u8, u8, u8)>,
}

impl AsciiRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Renderer for AsciiRenderer {
    fn name(&self) -> &'static str {
        "ascii"
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        let Some((cols, rows)) = frame_begin(frame, 1, 1, out)? else {
            return Ok(());
        };
        self.last_fg = None;

        let w = frame.pixel_width;
        for y in 0..rows {
            for x in 0..cols {
                let i = (y * w + x) * 4;
                let fg = (
                    frame.pixels_rgba[i],
                    frame.pixels_rgba[i + 1],
                    frame.pixels_rgba[i + 2],
                );
                let l = luma_u8(fg.0, fg.1, fg.2) as usize;
                let ch = RAMP[l * (RAMP.len() - 1) / 255];
                if self.last_fg != Some(fg) {
                    write!(out, "\x1b[38;2;{};{};{}m", fg.0, fg.1, fg.2)?;
                    self.last_fg = Some(fg);
                }
                out.write_all(&[ch])?;
            }
            out.write_all(b"\r\n")?;
        }

        frame_end(frame, cols, rows, out)
    }
}
