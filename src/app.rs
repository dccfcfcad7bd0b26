use crate::canvas::PixelCanvas;
use crate::config::{Config, FeedSource, RendererMode};
use crate::engine::{Engine, TickOutcome};
use crate::feed::DemoSource;
use crate::modes::ModeKind;
use crate::render::{AsciiRenderer, Frame, HalfBlockRenderer, Renderer};
use crate::spectrum::DEFAULT_SOURCE_BANDS;
use crate::terminal::TerminalGuard;
use anyhow::Context;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::time::{Duration, Instant};

const DEMO_FEED_HZ: u32 = 43;
const DENSITY_STEP: usize = 8;

/// Host-side toggles that are not engine state.
struct HostState {
    show_hud: bool,
    show_help: bool,
    log_mapping: bool,
    adaptive: bool,
    dirty: bool,
}

pub fn run(cfg: Config) -> anyhow::Result<()> {
    let mut term = TerminalGuard::new()?;

    let mut renderer: Box<dyn Renderer> = match cfg.renderer {
        RendererMode::HalfBlock => Box::new(HalfBlockRenderer::new()),
        RendererMode::Ascii => Box::new(AsciiRenderer::new()),
    };
    let cell = cfg.renderer.cell_pixels();

    let mut host = HostState {
        show_hud: true,
        show_help: false,
        log_mapping: cfg.log_mapping,
        adaptive: cfg.adaptive,
        dirty: true,
    };

    let mut last_size = TerminalGuard::size()?;
    let mut hud_rows = hud_rows_for_size(last_size, host.show_hud);
    let (w, h) = pixel_size(last_size, hud_rows, cell);
    let mut canvas = PixelCanvas::new(w, h);
    let mut engine = Engine::new(cfg.to_engine_config(w, h));

    let _demo = match cfg.source {
        FeedSource::Synthetic => Some(DemoSource::spawn(
            engine.spectrum_sender(),
            DEFAULT_SOURCE_BANDS,
            DEMO_FEED_HZ,
        )),
        FeedSource::Idle => None,
    };

    let mut fps = FpsCounter::new();
    let mut last_tick_ms = 0.0f32;
    let mut last_render_ms = 0.0f32;

    loop {
        while event::poll(Duration::from_millis(0)).context("poll terminal events")? {
            match event::read().context("read terminal event")? {
                Event::Key(k) if k.kind != KeyEventKind::Release => {
                    let old_hud = host.show_hud;
                    if handle_key(k.code, k.modifiers, &mut engine, &mut host) {
                        return Ok(());
                    }
                    if host.show_hud != old_hud {
                        hud_rows = hud_rows_for_size(last_size, host.show_hud);
                        resize_surface(&mut engine, &mut canvas, last_size, hud_rows, cell);
                    }
                }
                Event::Resize(c, r) => {
                    last_size = (c, r);
                    hud_rows = hud_rows_for_size(last_size, host.show_hud);
                    resize_surface(&mut engine, &mut canvas, last_size, hud_rows, cell);
                    host.dirty = true;
                }
                _ => {}
            }
        }

        // Resize events can be missed in some terminals.
        let sz = crossterm::terminal::size().context("get terminal size")?;
        if sz != last_size {
            last_size = sz;
            hud_rows = hud_rows_for_size(last_size, host.show_hud);
            resize_surface(&mut engine, &mut canvas, last_size, hud_rows, cell);
            host.dirty = true;
        }

        let now = Instant::now();
        let tick_start = Instant::now();
        let outcome = engine.pump(now, &mut canvas);
        if matches!(outcome, Some(TickOutcome::Rendered | TickOutcome::Diagnostic)) {
            last_tick_ms = tick_start.elapsed().as_secs_f32() * 1000.0;
            fps.tick();
            host.dirty = true;
        }

        if host.dirty {
            host.dirty = false;
            let hud = if host.show_hud {
                build_hud(last_size.0 as usize, &engine, &host, fps.fps(), last_tick_ms, last_render_ms, renderer.name())
            } else {
                String::new()
            };
            let visual_rows = last_size.1.saturating_sub(hud_rows).max(1);
            let frame = Frame {
                term_cols: last_size.0,
                term_rows: last_size.1,
                visual_rows,
                pixel_width: canvas.width(),
                pixel_height: canvas.height(),
                pixels_rgba: canvas.pixels(),
                hud: &hud,
                hud_rows,
                overlay: host.show_help.then(help_popup_text),
                sync_updates: cfg.sync_updates,
            };
            let render_start = Instant::now();
            renderer.render(&frame, term.out())?;
            last_render_ms = render_start.elapsed().as_secs_f32() * 1000.0;
        }

        let wait = if engine.is_paused() {
            Duration::from_millis(30)
        } else {
            engine
                .scheduler()
                .until_next(Instant::now())
                .clamp(Duration::from_millis(1), Duration::from_millis(30))
        };
        std::thread::sleep(wait);
    }
}

fn pixel_size(size: (u16, u16), hud_rows: u16, cell: (usize, usize)) -> (usize, usize) {
    let (cols, rows) = size;
    let visual_rows = rows.saturating_sub(hud_rows).max(1);
    (
        (cols as usize).saturating_mul(cell.0),
        (visual_rows as usize).saturating_mul(cell.1),
    )
}

fn resize_surface(
    engine: &mut Engine,
    canvas: &mut PixelCanvas,
    size: (u16, u16),
    hud_rows: u16,
    cell: (usize, usize),
) {
    let (w, h) = pixel_size(size, hud_rows, cell);
    canvas.resize(w, h);
    engine.resize(w, h);
}

fn step_mode(engine: &mut Engine, forward: bool) {
    let cur = engine.active_mode();
    let next = if forward { cur.next() } else { cur.prev() };
    if let Err(err) = engine.set_mode_kind(next) {
        tracing::warn!(%err, "mode change rejected");
    }
}

fn handle_key(code: KeyCode, mods: KeyModifiers, engine: &mut Engine, host: &mut HostState) -> bool {
    if mods.contains(KeyModifiers::CONTROL) && matches!(code, KeyCode::Char('c')) {
        return true;
    }
    host.dirty = true;

    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => return true,
        KeyCode::Left => step_mode(engine, false),
        KeyCode::Right => step_mode(engine, true),
        KeyCode::Char(d @ '0'..='9') => {
            // 1..9 pick the first nine modes, 0 the tenth; shift the range with alt.
            let n = d.to_digit(10).unwrap_or(0) as usize;
            let base = if n == 0 { 9 } else { n - 1 };
            let idx = if mods.contains(KeyModifiers::ALT) { base + 10 } else { base };
            if let Err(err) = engine.set_mode_index(idx) {
                tracing::warn!(%err, "mode index rejected");
            }
        }
        KeyCode::Up => engine.set_sensitivity(engine.sensitivity() + 0.1),
        KeyCode::Down => engine.set_sensitivity(engine.sensitivity() - 0.1),
        KeyCode::Char('+') | KeyCode::Char('=') => {
            engine.set_density(engine.bar_count() + DENSITY_STEP)
        }
        KeyCode::Char('-') | KeyCode::Char('_') => {
            engine.set_density(engine.bar_count().saturating_sub(DENSITY_STEP))
        }
        KeyCode::Char('c') | KeyCode::Char('C') => {
            engine.set_color_scheme(engine.color_scheme().next())
        }
        KeyCode::Char('p') | KeyCode::Char('P') => engine.set_preset(engine.preset().next()),
        KeyCode::Char('a') | KeyCode::Char('A') => {
            host.adaptive = !host.adaptive;
            engine.set_adaptive(host.adaptive);
        }
        KeyCode::Char('l') | KeyCode::Char('L') => {
            host.log_mapping = !host.log_mapping;
            engine.set_log_mapping(host.log_mapping);
        }
        KeyCode::Char(' ') => {
            if engine.is_paused() {
                engine.resume();
            } else {
                engine.pause();
            }
        }
        KeyCode::Char('r') | KeyCode::Char('R') => {
            if let Err(err) = engine.reset() {
                tracing::warn!(%err, "reset rejected");
            }
        }
        KeyCode::Char('i') | KeyCode::Char('I') => host.show_hud = !host.show_hud,
        KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::F(1) | KeyCode::Tab => {
            host.show_help = !host.show_help
        }
        _ => {}
    }
    false
}

fn hud_rows_for_size(size: (u16, u16), show_hud: bool) -> u16 {
    if !show_hud || size.1 <= 1 {
        return 0;
    }
    (size.1 - 1).min(2)
}

fn build_hud(
    cols: usize,
    engine: &Engine,
    host: &HostState,
    fps: f32,
    tick_ms: f32,
    render_ms: f32,
    renderer_name: &str,
) -> String {
    let mode = engine.active_mode();
    let preset = if engine.effective_preset() == engine.preset() {
        engine.preset().label().to_string()
    } else {
        format!("{}->{}", engine.preset().label(), engine.effective_preset().label())
    };
    let lines = [
        format!(
            "Mode: {} ({}/{}) | Colors: {} | Preset: {}{} | Bars: {} | Sens: {:.1} | Map: {} | {}",
            mode.label(),
            mode.index() + 1,
            ModeKind::COUNT,
            engine.color_scheme().label(),
            preset,
            if host.adaptive { " (adaptive)" } else { "" },
            engine.bar_count(),
            engine.sensitivity(),
            if host.log_mapping { "log" } else { "linear" },
            if engine.is_paused() { "PAUSED" } else { "running" },
        ),
        format!(
            "Audio: {} | FPS: {:>4.1}/{} | ms(T/R): {:>4.1}/{:>4.1} | Dropped: {} | Faults: {} | Renderer: {} | ? help | q quit",
            if engine.audio_active() { "live" } else { "idle" },
            fps,
            engine.profile().target_tick_rate_hz,
            tick_ms,
            render_ms,
            engine.scheduler().dropped(),
            engine.diagnostics(),
            renderer_name,
        ),
    ];
    lines
        .iter()
        .map(|l| l.chars().take(cols.max(1)).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

fn help_popup_text() -> &'static str {
    "Spectral Viz Hotkeys\n\
←/→  previous/next mode\n\
1-9, 0  jump to mode 1-10 (alt: 11-20)\n\
up/down  sensitivity\n\
+ / -  more/fewer bars\n\
c  cycle color scheme\n\
p  cycle performance preset\n\
a  toggle adaptive load tuning\n\
l  toggle log/linear band mapping\n\
space  pause/resume\n\
r  reset (new track)\n\
i  show/hide HUD\n\
? or h or F1 or tab  toggle this help\n\
q or esc  quit"
}

struct FpsCounter {
    last: Instant,
    frames: u32,
    fps: f32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            last: Instant::now(),
            frames: 0,
            fps: 0.0,
        }
    }

    fn tick(&mut self) {
        self.frames += 1;
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        if dt >= 0.5 {
            self.fps = self.frames as f32 / dt;
            self.frames = 0;
            self.last = now;
        }
    }

    fn fps(&self) -> f32 {
        self.fps
    }
}
