use spectral_viz::canvas::PixelCanvas;
use spectral_viz::render::{AsciiRenderer, Frame, HalfBlockRenderer, Renderer};
use spectral_viz::{Engine, EngineConfig, ModeKind, TickOutcome};

/// Build a solid-color RGBA pixel buffer.
fn solid_pixels(w: usize, h: usize, r: u8, g: u8, b: u8) -> Vec<u8> {
    let mut buf = vec![0u8; w * h * 4];
    for px in buf.chunks_exact_mut(4) {
        px[0] = r;
        px[1] = g;
        px[2] = b;
        px[3] = 255;
    }
    buf
}

/// Build a gradient pixel buffer (varies across x).
fn gradient_pixels(w: usize, h: usize) -> Vec<u8> {
    let mut buf = vec![0u8; w * h * 4];
    for y in 0..h {
        for x in 0..w {
            let i = (y * w + x) * 4;
            let t = (x as f32 / w.max(1) as f32 * 255.0) as u8;
            buf[i] = t;
            buf[i + 1] = 128;
            buf[i + 2] = 255 - t;
            buf[i + 3] = 255;
        }
    }
    buf
}

fn make_frame<'a>(
    cols: u16,
    visual_rows: u16,
    pw: usize,
    ph: usize,
    pixels: &'a [u8],
    sync: bool,
) -> Frame<'a> {
    Frame {
        term_cols: cols,
        term_rows: visual_rows + 2,
        visual_rows,
        pixel_width: pw,
        pixel_height: ph,
        pixels_rgba: pixels,
        hud: "Mode: Bars | FPS 22",
        hud_rows: 1,
        overlay: None,
        sync_updates: sync,
    }
}

// ── ASCII renderer ──────────────────────────────────────────────────────────

#[test]
fn ascii_renders_solid_frame() {
    let cols = 10u16;
    let rows = 5u16;
    let pixels = solid_pixels(cols as usize, rows as usize, 200, 200, 200);
    let frame = make_frame(cols, rows, cols as usize, rows as usize, &pixels, false);
    let mut out = Vec::new();
    let mut renderer = AsciiRenderer::new();
    renderer.render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(s.contains("\x1b[H"), "missing home cursor");
    assert!(s.contains("\x1b[?7l"), "missing autowrap-off");
    assert!(s.contains("\x1b[?7h"), "missing autowrap-on");
    assert!(s.contains("38;2;200;200;200"), "missing FG color");
    assert!(s.contains("FPS 22"), "HUD text missing");
}

#[test]
fn ascii_maps_black_to_blank_and_white_to_densest_glyph() {
    let dark = solid_pixels(4, 2, 0, 0, 0);
    let mut out = Vec::new();
    AsciiRenderer::new()
        .render(&make_frame(4, 2, 4, 2, &dark, false), &mut out)
        .unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(s.contains("    "), "black pixels should render as spaces");

    let bright = solid_pixels(4, 2, 255, 255, 255);
    let mut out = Vec::new();
    AsciiRenderer::new()
        .render(&make_frame(4, 2, 4, 2, &bright, false), &mut out)
        .unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(s.contains("@@@@"), "white pixels should render as the densest glyph");
}

#[test]
fn ascii_name() {
    assert_eq!(AsciiRenderer::new().name(), "ascii");
}

#[test]
fn ascii_skips_zero_size() {
    let pixels = solid_pixels(1, 1, 0, 0, 0);
    let frame = make_frame(0, 0, 0, 0, &pixels, false);
    let mut out = Vec::new();
    AsciiRenderer::new().render(&frame, &mut out).unwrap();
    assert!(out.is_empty(), "expected empty output for zero-size frame");
}

#[test]
fn ascii_reports_short_pixel_buffer() {
    let pixels = solid_pixels(2, 2, 10, 10, 10);
    let frame = make_frame(8, 4, 8, 4, &pixels, false);
    let mut out = Vec::new();
    AsciiRenderer::new().render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(s.contains("pixel buffer too small"), "short buffer not reported");
}

// ── HalfBlock renderer ─────────────────────────────────────────────────────

#[test]
fn halfblock_renders_gradient_frame() {
    let cols = 8u16;
    let rows = 4u16;
    let pw = cols as usize;
    let ph = (rows as usize) * 2;
    let pixels = gradient_pixels(pw, ph);
    let frame = make_frame(cols, rows, pw, ph, &pixels, true);
    let mut out = Vec::new();
    let mut renderer = HalfBlockRenderer::new();
    renderer.render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(s.contains("\x1b[?2026h"), "missing sync-begin");
    assert!(s.contains("\x1b[?2026l"), "missing sync-end");
    assert!(s.contains("\u{2580}"), "missing half-block char");
    assert!(s.contains("38;2;"), "missing FG escape");
    assert!(s.contains("48;2;"), "missing BG escape");
}

#[test]
fn halfblock_name() {
    assert_eq!(HalfBlockRenderer::new().name(), "halfblock");
}

#[test]
fn halfblock_skips_dimension_mismatch() {
    // pixel_height should be visual_rows*2, but give visual_rows*1
    let cols = 4u16;
    let rows = 4u16;
    let pixels = solid_pixels(4, 4, 100, 100, 100);
    let frame = make_frame(cols, rows, 4, 4, &pixels, false);
    let mut out = Vec::new();
    HalfBlockRenderer::new().render(&frame, &mut out).unwrap();
    assert!(out.is_empty(), "expected empty output for dimension mismatch");
}

// ── Overlay rendering ───────────────────────────────────────────────────────

#[test]
fn ascii_renders_overlay_popup() {
    let cols = 40u16;
    let rows = 20u16;
    let pixels = solid_pixels(cols as usize, rows as usize, 50, 50, 50);
    let mut frame = make_frame(cols, rows, cols as usize, rows as usize, &pixels, false);
    frame.overlay = Some("Test Overlay\nSecond line");
    let mut out = Vec::new();
    let mut renderer = AsciiRenderer::new();
    renderer.render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(s.contains("Test Overlay"), "overlay text missing");
    assert!(s.contains("Second line"), "overlay body missing");
}

#[test]
fn overlay_is_skipped_on_tiny_terminals() {
    let pixels = solid_pixels(4, 2, 50, 50, 50);
    let mut frame = make_frame(4, 2, 4, 2, &pixels, false);
    frame.overlay = Some("Hidden Overlay");
    let mut out = Vec::new();
    AsciiRenderer::new().render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(!s.contains("Hidden Overlay"), "overlay should not fit");
}

// ── Multiple frames (color cache reset) ─────────────────────────────────────

#[test]
fn halfblock_resets_color_cache_each_frame() {
    let cols = 4u16;
    let rows = 2u16;
    let pw = 4;
    let ph = 4;

    let pixels1 = solid_pixels(pw, ph, 255, 0, 0);
    let frame1 = make_frame(cols, rows, pw, ph, &pixels1, false);
    let mut out1 = Vec::new();
    let mut renderer = HalfBlockRenderer::new();
    renderer.render(&frame1, &mut out1).unwrap();
    let s1 = String::from_utf8_lossy(&out1);
    assert!(s1.contains("38;2;255;0;0"), "first frame missing red FG");

    let pixels2 = solid_pixels(pw, ph, 0, 0, 255);
    let frame2 = make_frame(cols, rows, pw, ph, &pixels2, false);
    let mut out2 = Vec::new();
    renderer.render(&frame2, &mut out2).unwrap();
    let s2 = String::from_utf8_lossy(&out2);
    assert!(s2.contains("38;2;0;0;255"), "second frame missing blue FG");
}

// ── Engine to terminal ──────────────────────────────────────────────────────

#[test]
fn engine_frame_presents_through_halfblock() {
    let cols = 40usize;
    let rows = 12usize;
    let (pw, ph) = (cols, rows * 2);
    let mut engine = Engine::new(EngineConfig {
        mode: ModeKind::Bars,
        width: pw,
        height: ph,
        ..EngineConfig::default()
    });
    let mut canvas = PixelCanvas::new(pw, ph);
    for _ in 0..10 {
        assert_eq!(engine.tick(1.0 / 22.0, &mut canvas), TickOutcome::Rendered);
    }

    let frame = Frame {
        term_cols: cols as u16,
        term_rows: rows as u16 + 1,
        visual_rows: rows as u16,
        pixel_width: canvas.width(),
        pixel_height: canvas.height(),
        pixels_rgba: canvas.pixels(),
        hud: "Mode: Bars",
        hud_rows: 1,
        overlay: None,
        sync_updates: false,
    };
    let mut out = Vec::new();
    HalfBlockRenderer::new().render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert_eq!(s.matches('\u{2580}').count(), cols * rows);
    assert!(s.contains("Mode: Bars"), "HUD text missing");
}
