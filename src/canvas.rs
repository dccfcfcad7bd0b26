//! Software rasterizer over RGBA8 buffers.
//!
//! The free functions operate on raw `(buf, w, h)` triples so the feedback
//! compositor can draw straight into its own surfaces; [`PixelCanvas`] wraps
//! them behind the [`DrawSurface`] trait for hosts and tests.

use crate::draw::{DrawCommand, DrawSurface, Point, Rgba};
use crate::error::DrawError;

pub struct PixelCanvas {
    w: usize,
    h: usize,
    pixels: Vec<u8>,
}

impl PixelCanvas {
    pub fn new(w: usize, h: usize) -> Self {
        let mut pixels = vec![0u8; w.saturating_mul(h).saturating_mul(4)];
        for px in pixels.chunks_exact_mut(4) {
            px[3] = 255;
        }
        Self { w, h, pixels }
    }

    pub fn resize(&mut self, w: usize, h: usize) {
        if w == self.w && h == self.h {
            return;
        }
        *self = Self::new(w, h);
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.w || y >= self.h {
            return None;
        }
        let i = (y * self.w + x) * 4;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }
}

impl DrawSurface for PixelCanvas {
    fn size(&self) -> (usize, usize) {
        (self.w, self.h)
    }

    fn execute(&mut self, cmd: &DrawCommand) -> Result<(), DrawError> {
        draw_command(&mut self.pixels, self.w, self.h, cmd)
    }

    fn blit_rgba(&mut self, pixels: &[u8], w: usize, h: usize) -> Result<(), DrawError> {
        blit_scaled(pixels, w, h, &mut self.pixels, self.w, self.h)
    }
}

fn check(p: Point, what: &'static str) -> Result<(), DrawError> {
    if p.is_finite() { Ok(()) } else { Err(DrawError::NonFinite(what)) }
}

fn check_f(v: f32, what: &'static str) -> Result<(), DrawError> {
    if v.is_finite() { Ok(()) } else { Err(DrawError::NonFinite(what)) }
}

pub fn draw_command(buf: &mut [u8], w: usize, h: usize, cmd: &DrawCommand) -> Result<(), DrawError> {
    let need = w.saturating_mul(h).saturating_mul(4);
    if buf.len() < need {
        return Err(DrawError::BufferSize { need, got: buf.len() });
    }
    match cmd {
        DrawCommand::Clear(c) => {
            clear(buf, *c);
        }
        DrawCommand::FillRect { x, y, w: rw, h: rh, color } => {
            for v in [*x, *y, *rw, *rh] {
                check_f(v, cmd.kind())?;
            }
            fill_rect(buf, w, h, *x, *y, *rw, *rh, *color);
        }
        DrawCommand::Line { from, to, width, color } => {
            check(*from, cmd.kind())?;
            check(*to, cmd.kind())?;
            check_f(*width, cmd.kind())?;
            line(buf, w, h, *from, *to, *width, *color);
        }
        DrawCommand::Polyline { points, closed, width, color } => {
            for p in points {
                check(*p, cmd.kind())?;
            }
            check_f(*width, cmd.kind())?;
            for pair in points.windows(2) {
                line(buf, w, h, pair[0], pair[1], *width, *color);
            }
            if *closed && points.len() > 2 {
                line(buf, w, h, points[points.len() - 1], points[0], *width, *color);
            }
        }
        DrawCommand::FillCircle { center, radius, color } => {
            check(*center, cmd.kind())?;
            check_f(*radius, cmd.kind())?;
            fill_circle(buf, w, h, *center, *radius, *color);
        }
        DrawCommand::StrokeCircle { center, radius, width, color } => {
            check(*center, cmd.kind())?;
            check_f(*radius, cmd.kind())?;
            check_f(*width, cmd.kind())?;
            stroke_circle(buf, w, h, *center, *radius, *width, *color);
        }
        DrawCommand::Glyph { at, ch, size, color } => {
            check(*at, cmd.kind())?;
            check_f(*size, cmd.kind())?;
            glyph(buf, w, h, *at, *ch, *size, *color);
        }
        DrawCommand::Text { at, text, size, color } => {
            check(*at, cmd.kind())?;
            check_f(*size, cmd.kind())?;
            let advance = (*size * 0.7).max(1.0);
            for (i, ch) in text.chars().enumerate() {
                let p = Point::new(at.x + i as f32 * advance, at.y);
                glyph(buf, w, h, p, ch, *size, *color);
            }
        }
        DrawCommand::VerticalGradient { x, y, w: gw, h: gh, top, bottom } => {
            for v in [*x, *y, *gw, *gh] {
                check_f(v, cmd.kind())?;
            }
            gradient(buf, w, h, *x, *y, *gw, *gh, *top, *bottom);
        }
    }
    Ok(())
}

pub fn clear(buf: &mut [u8], c: Rgba) {
    for px in buf.chunks_exact_mut(4) {
        px[0] = c.r;
        px[1] = c.g;
        px[2] = c.b;
        px[3] = 255;
    }
}

#[inline]
pub fn blend_px(buf: &mut [u8], w: usize, h: usize, x: isize, y: isize, c: Rgba, coverage: f32) {
    if x < 0 || y < 0 || x as usize >= w || y as usize >= h {
        return;
    }
    let a = (c.a as f32 / 255.0) * coverage.clamp(0.0, 1.0);
    if a <= 0.0 {
        return;
    }
    let i = (y as usize * w + x as usize) * 4;
    let ia = 1.0 - a;
    buf[i] = (buf[i] as f32 * ia + c.r as f32 * a) as u8;
    buf[i + 1] = (buf[i + 1] as f32 * ia + c.g as f32 * a) as u8;
    buf[i + 2] = (buf[i + 2] as f32 * ia + c.b as f32 * a) as u8;
    buf[i + 3] = 255;
}

/// Saturating additive blend, used for glow and flashes.
#[inline]
pub fn add_px(buf: &mut [u8], w: usize, h: usize, x: isize, y: isize, rgb: [u8; 3], k: f32) {
    if x < 0 || y < 0 || x as usize >= w || y as usize >= h {
        return;
    }
    let i = (y as usize * w + x as usize) * 4;
    for ch in 0..3 {
        let v = buf[i + ch] as f32 + rgb[ch] as f32 * k;
        buf[i + ch] = v.clamp(0.0, 255.0) as u8;
    }
}

pub fn fill_rect(buf: &mut [u8], w: usize, h: usize, x: f32, y: f32, rw: f32, rh: f32, c: Rgba) {
    let (x0, x1) = span(x, rw, w);
    let (y0, y1) = span(y, rh, h);
    for py in y0..y1 {
        for px in x0..x1 {
            blend_px(buf, w, h, px as isize, py as isize, c, 1.0);
        }
    }
}

fn span(start: f32, len: f32, limit: usize) -> (usize, usize) {
    let (a, b) = if len >= 0.0 { (start, start + len) } else { (start + len, start) };
    let a = a.round().clamp(0.0, limit as f32) as usize;
    let b = b.round().clamp(0.0, limit as f32) as usize;
    (a, b.max(a))
}

/// Clips the segment to the (expanded) surface rectangle.
fn clip_segment(a: Point, b: Point, w: usize, h: usize, pad: f32) -> Option<(Point, Point)> {
    let (xmin, ymin) = (-pad, -pad);
    let (xmax, ymax) = (w as f32 + pad, h as f32 + pad);
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let mut t0 = 0.0f32;
    let mut t1 = 1.0f32;
    for (p, q) in [
        (-dx, a.x - xmin),
        (dx, xmax - a.x),
        (-dy, a.y - ymin),
        (dy, ymax - a.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((
        Point::new(a.x + dx * t0, a.y + dy * t0),
        Point::new(a.x + dx * t1, a.y + dy * t1),
    ))
}

pub fn line(buf: &mut [u8], w: usize, h: usize, a: Point, b: Point, width: f32, c: Rgba) {
    let width = width.max(0.5);
    let Some((a, b)) = clip_segment(a, b, w, h, width + 1.0) else {
        return;
    };
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;
    let sx = dx / steps as f32;
    let sy = dy / steps as f32;

    if width <= 1.5 {
        // Two-pixel coverage split across the minor axis.
        let steep = dy.abs() > dx.abs();
        for i in 0..=steps {
            let x = a.x + sx * i as f32;
            let y = a.y + sy * i as f32;
            if steep {
                let fx = x.floor();
                let frac = x - fx;
                blend_px(buf, w, h, fx as isize, y.round() as isize, c, 1.0 - frac);
                blend_px(buf, w, h, fx as isize + 1, y.round() as isize, c, frac);
            } else {
                let fy = y.floor();
                let frac = y - fy;
                blend_px(buf, w, h, x.round() as isize, fy as isize, c, 1.0 - frac);
                blend_px(buf, w, h, x.round() as isize, fy as isize + 1, c, frac);
            }
        }
        return;
    }

    let r = width * 0.5;
    for i in 0..=steps {
        let p = Point::new(a.x + sx * i as f32, a.y + sy * i as f32);
        stamp(buf, w, h, p, r, c);
    }
}

/// Hard-edged disc used for thick strokes; avoids alpha stacking.
fn stamp(buf: &mut [u8], w: usize, h: usize, p: Point, r: f32, c: Rgba) {
    let r2 = r * r;
    let x0 = (p.x - r).floor() as isize;
    let x1 = (p.x + r).ceil() as isize;
    let y0 = (p.y - r).floor() as isize;
    let y1 = (p.y + r).ceil() as isize;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let ddx = x as f32 - p.x;
            let ddy = y as f32 - p.y;
            if ddx * ddx + ddy * ddy <= r2 {
                let cov = if c.a == 255 { 1.0 } else { 0.5 };
                blend_px(buf, w, h, x, y, c, cov);
            }
        }
    }
}

pub fn fill_circle(buf: &mut [u8], w: usize, h: usize, center: Point, radius: f32, c: Rgba) {
    let r = radius.abs();
    if r <= 0.0 {
        return;
    }
    let x0 = (center.x - r - 1.0).floor().max(0.0) as isize;
    let x1 = (center.x + r + 1.0).ceil().min(w as f32) as isize;
    let y0 = (center.y - r - 1.0).floor().max(0.0) as isize;
    let y1 = (center.y + r + 1.0).ceil().min(h as f32) as isize;
    for y in y0..y1 {
        for x in x0..x1 {
            let ddx = x as f32 + 0.5 - center.x;
            let ddy = y as f32 + 0.5 - center.y;
            let d = (ddx * ddx + ddy * ddy).sqrt();
            let cov = (r + 0.5 - d).clamp(0.0, 1.0);
            if cov > 0.0 {
                blend_px(buf, w, h, x, y, c, cov);
            }
        }
    }
}

pub fn stroke_circle(
    buf: &mut [u8],
    w: usize,
    h: usize,
    center: Point,
    radius: f32,
    width: f32,
    c: Rgba,
) {
    let r = radius.abs();
    let half = (width * 0.5).max(0.5);
    let outer = r + half + 1.0;
    let x0 = (center.x - outer).floor().max(0.0) as isize;
    let x1 = (center.x + outer).ceil().min(w as f32) as isize;
    let y0 = (center.y - outer).floor().max(0.0) as isize;
    let y1 = (center.y + outer).ceil().min(h as f32) as isize;
    for y in y0..y1 {
        for x in x0..x1 {
            let ddx = x as f32 + 0.5 - center.x;
            let ddy = y as f32 + 0.5 - center.y;
            let d = (ddx * ddx + ddy * ddy).sqrt();
            let cov = (half + 0.5 - (d - r).abs()).clamp(0.0, 1.0);
            if cov > 0.0 {
                blend_px(buf, w, h, x, y, c, cov);
            }
        }
    }
}

pub fn gradient(
    buf: &mut [u8],
    w: usize,
    h: usize,
    x: f32,
    y: f32,
    gw: f32,
    gh: f32,
    top: Rgba,
    bottom: Rgba,
) {
    let (x0, x1) = span(x, gw, w);
    let (y0, y1) = span(y, gh, h);
    let rows = (y1 - y0).max(1) as f32;
    for py in y0..y1 {
        let t = (py - y0) as f32 / rows;
        let c = Rgba {
            r: lerp_u8(top.r, bottom.r, t),
            g: lerp_u8(top.g, bottom.g, t),
            b: lerp_u8(top.b, bottom.b, t),
            a: lerp_u8(top.a, bottom.a, t),
        };
        for px in x0..x1 {
            blend_px(buf, w, h, px as isize, py as isize, c, 1.0);
        }
    }
}

/// Procedural 3x5 glyph. No font assets are loaded; every character maps to a
/// stable bit pattern, with a few hand-made shapes for digits and space.
pub fn glyph(buf: &mut [u8], w: usize, h: usize, at: Point, ch: char, size: f32, c: Rgba) {
    if ch.is_whitespace() {
        return;
    }
    let bits = glyph_bits(ch);
    let cell_h = size.max(1.0);
    let px_h = cell_h / 5.0;
    let px_w = (cell_h * 0.6) / 3.0;
    for row in 0..5 {
        for col in 0..3 {
            if bits & (1 << (row * 3 + col)) == 0 {
                continue;
            }
            let x = at.x + col as f32 * px_w;
            let y = at.y + row as f32 * px_h;
            let (x0, x1) = span(x, px_w.max(1.0), w);
            let (y0, y1) = span(y, px_h.max(1.0), h);
            for py in y0..y1 {
                for px in x0..x1 {
                    blend_px(buf, w, h, px as isize, py as isize, c, 1.0);
                }
            }
        }
    }
}

fn glyph_bits(ch: char) -> u16 {
    // Rows top to bottom, three bits each, LSB = left column.
    const DIGITS: [u16; 10] = [
        0b111_101_101_101_111,
        0b111_010_010_011_010,
        0b111_001_111_100_111,
        0b111_100_111_100_111,
        0b100_100_111_101_101,
        0b111_100_111_001_111,
        0b111_101_111_001_111,
        0b100_100_100_100_111,
        0b111_101_111_101_111,
        0b111_100_111_101_111,
    ];
    if let Some(d) = ch.to_digit(10) {
        return DIGITS[d as usize];
    }
    let mut n = (ch as u32).wrapping_mul(0x9E37_79B9);
    n ^= n >> 15;
    n = n.wrapping_mul(0x85EB_CA6B);
    n ^= n >> 13;
    // Keep at least a spine so sparse hashes still read as a glyph.
    ((n & 0x7FFF) as u16) | 0b010_000_010_000_010
}

pub fn blit_scaled(
    src: &[u8],
    sw: usize,
    sh: usize,
    dst: &mut [u8],
    dw: usize,
    dh: usize,
) -> Result<(), DrawError> {
    let need_src = sw.saturating_mul(sh).saturating_mul(4);
    if src.len() < need_src {
        return Err(DrawError::BufferSize { need: need_src, got: src.len() });
    }
    let need_dst = dw.saturating_mul(dh).saturating_mul(4);
    if dst.len() < need_dst {
        return Err(DrawError::BufferSize { need: need_dst, got: dst.len() });
    }
    if sw == 0 || sh == 0 || dw == 0 || dh == 0 {
        return Ok(());
    }
    for y in 0..dh {
        let syy = (y * sh / dh).min(sh - 1);
        for x in 0..dw {
            let sxx = (x * sw / dw).min(sw - 1);
            let si = (syy * sw + sxx) * 4;
            let di = (y * dw + x) * 4;
            dst[di] = src[si];
            dst[di + 1] = src[si + 1];
            dst[di + 2] = src[si + 2];
            dst[di + 3] = 255;
        }
    }
    Ok(())
}

#[inline]
pub fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    let t = t.clamp(0.0, 1.0);
    (a as f32 + (b as f32 - a as f32) * t).round().clamp(0.0, 255.0) as u8
}
