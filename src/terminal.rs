use anyhow::Context;
use crossterm::{cursor, execute, terminal};
use std::io::{stdout, BufWriter, Stdout, Write};

/// Smallest terminal the host will draw into, `(cols, rows)`.
pub const MIN_TERMINAL: (u16, u16) = (16, 4);

/// Owns the screen for the host: raw mode, alternate screen, hidden cursor,
/// and the buffered writer every frame goes through. All of it is undone on
/// drop, including after a panic unwinds out of the host loop.
pub struct TerminalGuard {
    out: BufWriter<Stdout>,
}

impl TerminalGuard {
    pub fn new() -> anyhow::Result<Self> {
        terminal::enable_raw_mode().context("enable raw mode")?;
        // From here on Drop owns the cleanup.
        let mut guard = Self {
            out: BufWriter::with_capacity(1 << 16, stdout()),
        };
        execute!(
            guard.out,
            terminal::EnterAlternateScreen,
            terminal::Clear(terminal::ClearType::All),
            cursor::Hide
        )
        .context("prepare screen")?;
        Ok(guard)
    }

    pub fn out(&mut self) -> &mut BufWriter<Stdout> {
        &mut self.out
    }

    /// Current size, rejecting terminals too small to draw into.
    pub fn size() -> anyhow::Result<(u16, u16)> {
        let (cols, rows) = terminal::size().context("query terminal size")?;
        if cols < MIN_TERMINAL.0 || rows < MIN_TERMINAL.1 {
            anyhow::bail!(
                "terminal is {cols}x{rows}, need at least {}x{}",
                MIN_TERMINAL.0,
                MIN_TERMINAL.1
            );
        }
        Ok((cols, rows))
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Renderers may leave synchronized output on, autowrap off or a color set.
        let _ = self.out.write_all(b"\x1b[?2026l\x1b[?7h\x1b[0m");
        let _ = execute!(self.out, cursor::Show, terminal::LeaveAlternateScreen);
        let _ = self.out.flush();
        let _ = terminal::disable_raw_mode();
    }
}
