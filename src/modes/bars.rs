use super::{backdrop, EngineContext};
use crate::draw::{DrawList, Point, Rgba};
use crate::spectrum::SmoothedSpectrum;
use std::f32::consts::{PI, TAU};

const BAR_GAP: f32 = 0.18;
const PEAK_CAP_PX: f32 = 2.0;

pub(super) fn draw_bars(spectrum: &SmoothedSpectrum, ctx: &EngineContext) -> DrawList {
    let mut list = backdrop(ctx, Rgba::rgb(6, 6, 10));
    let n = spectrum.len();
    if n == 0 {
        return list;
    }
    let slot = ctx.width / n as f32;
    let w = (slot * (1.0 - BAR_GAP)).max(1.0);
    for (i, (&v, &peak)) in spectrum.current.iter().zip(&spectrum.peak).enumerate() {
        let x = i as f32 * slot + (slot - w) * 0.5;
        let h = v * ctx.height * 0.92;
        let pos = i as f32 / n as f32;
        let top = ctx.scheme.color(pos + ctx.phase * 0.02, v);
        let bottom = ctx.scheme.color(pos, v * 0.35);
        if h >= 1.0 {
            list.gradient(x, ctx.height - h, w, h, top, bottom);
        }
        let py = ctx.height - peak * ctx.height * 0.92 - PEAK_CAP_PX;
        list.rect(x, py.max(0.0), w, PEAK_CAP_PX, top.scaled(1.3));
    }
    list
}

pub(super) fn draw_mirror(spectrum: &SmoothedSpectrum, ctx: &EngineContext) -> DrawList {
    let mut list = backdrop(ctx, Rgba::rgb(4, 4, 8));
    let n = spectrum.len();
    if n == 0 {
        return list;
    }
    let mid = ctx.height * 0.5;
    let slot = ctx.width / n as f32;
    let w = (slot * (1.0 - BAR_GAP)).max(1.0);
    for (i, &v) in spectrum.current.iter().enumerate() {
        let x = i as f32 * slot + (slot - w) * 0.5;
        let h = v * mid * 0.95;
        if h < 0.5 {
            continue;
        }
        let pos = i as f32 / n as f32;
        let hot = ctx.scheme.color(pos, v);
        let cold = ctx.scheme.color(pos, 0.15);
        list.gradient(x, mid - h, w, h, hot.with_alpha(0.4), hot);
        list.gradient(x, mid, w, h, hot, cold.with_alpha(0.2));
    }
    list.line(
        Point::new(0.0, mid),
        Point::new(ctx.width, mid),
        1.0,
        ctx.scheme.color(ctx.phase * 0.05, 0.4 + ctx.bass * 0.6),
    );
    list
}

/// Bars arranged around a slowly rotating ring.
pub struct CircularState {
    rotation: f32,
    spin: f32,
}

impl CircularState {
    pub(super) fn new() -> Self {
        Self {
            rotation: fastrand::f32() * TAU,
            spin: if fastrand::bool() { 0.25 } else { -0.25 },
        }
    }

    pub(super) fn advance(
        &mut self,
        spectrum: &SmoothedSpectrum,
        ctx: &EngineContext,
        dt: f32,
    ) -> DrawList {
        self.rotation = (self.rotation + self.spin * (0.4 + ctx.bass * 2.5) * dt).rem_euclid(TAU);

        let mut list = backdrop(ctx, Rgba::rgb(5, 5, 12));
        let n = spectrum.len();
        if n == 0 {
            return list;
        }
        let c = ctx.center();
        let base = ctx.min_dim() * (0.18 + ctx.bass * 0.05);
        let reach = ctx.min_dim() * 0.3;
        let width = (TAU * base / n as f32 * 0.6).clamp(1.0, 6.0);
        for (i, &v) in spectrum.current.iter().enumerate() {
            // Mirror the spectrum so bass sits at both ends of the ring seam.
            let a = self.rotation + PI * i as f32 / n as f32;
            for angle in [a, a + PI] {
                let (s, co) = angle.sin_cos();
                let from = Point::new(c.x + co * base, c.y + s * base);
                let len = base + v * reach;
                let to = Point::new(c.x + co * len, c.y + s * len);
                list.line(from, to, width, ctx.scheme.color(i as f32 / n as f32, v));
            }
        }
        list.ring(c, base * 0.96, 1.5, ctx.scheme.color(ctx.phase * 0.03, 0.3 + ctx.energy));
        list
    }
}

const NEEDLE_SWEEP: f32 = 50.0 * PI / 180.0;
const NEEDLE_STIFFNESS: f32 = 140.0;
const NEEDLE_DAMPING: f32 = 14.0;
const PEAK_LAMP_LEVEL: f32 = 0.85;
const PEAK_HOLD_SECONDS: f32 = 0.5;

#[derive(Debug, Clone, Copy, Default)]
struct Needle {
    pos: f32,
    vel: f32,
    lamp: f32,
}

impl Needle {
    fn step(&mut self, target: f32, dt: f32) {
        // Fixed substeps keep the spring stable at low tick rates.
        let steps = (dt / 0.005).ceil().clamp(1.0, 64.0) as usize;
        let h = dt / steps as f32;
        for _ in 0..steps {
            let acc = NEEDLE_STIFFNESS * (target - self.pos) - NEEDLE_DAMPING * self.vel;
            self.vel += acc * h;
            self.pos += self.vel * h;
        }
        self.pos = self.pos.clamp(-0.05, 1.1);
        if target > PEAK_LAMP_LEVEL {
            self.lamp = PEAK_HOLD_SECONDS;
        } else {
            self.lamp = (self.lamp - dt).max(0.0);
        }
    }
}

/// Twin analog meters with sprung needles.
pub struct VuMeterState {
    needles: [Needle; 2],
}

impl VuMeterState {
    pub(super) fn new() -> Self {
        Self {
            needles: [Needle::default(); 2],
        }
    }

    pub(super) fn advance(
        &mut self,
        spectrum: &SmoothedSpectrum,
        ctx: &EngineContext,
        dt: f32,
    ) -> DrawList {
        let half = spectrum.len() / 2;
        let left = mean(&spectrum.current[..half]);
        let right = mean(&spectrum.current[half..]);
        let dt = dt.clamp(0.0, 0.25);
        self.needles[0].step((left * 1.6).min(1.0), dt);
        self.needles[1].step((right * 1.6).min(1.0), dt);

        let mut list = backdrop(ctx, Rgba::rgb(18, 14, 10));
        let face_w = ctx.width * 0.42;
        let face_h = ctx.height * 0.6;
        for (k, needle) in self.needles.iter().enumerate() {
            let x0 = ctx.width * (0.05 + 0.5 * k as f32);
            let y0 = ctx.height * 0.2;
            list.gradient(
                x0,
                y0,
                face_w,
                face_h,
                Rgba::rgb(236, 222, 178),
                Rgba::rgb(196, 176, 128),
            );
            let pivot = Point::new(x0 + face_w * 0.5, y0 + face_h * 0.95);
            let r = face_h * 0.8;
            for tick in 0..=10 {
                let a = -NEEDLE_SWEEP + 2.0 * NEEDLE_SWEEP * tick as f32 / 10.0;
                let (s, c) = a.sin_cos();
                let color = if tick >= 8 {
                    Rgba::rgb(190, 30, 20)
                } else {
                    Rgba::rgb(40, 30, 20)
                };
                list.line(
                    Point::new(pivot.x + s * r * 0.9, pivot.y - c * r * 0.9),
                    Point::new(pivot.x + s * r, pivot.y - c * r),
                    1.5,
                    color,
                );
            }
            let a = -NEEDLE_SWEEP + 2.0 * NEEDLE_SWEEP * needle.pos;
            let (s, c) = a.sin_cos();
            list.line(
                pivot,
                Point::new(pivot.x + s * r * 0.97, pivot.y - c * r * 0.97),
                2.0,
                Rgba::rgb(20, 16, 12),
            );
            list.circle(pivot, face_h * 0.05, Rgba::rgb(30, 26, 22));
            let lamp = if needle.lamp > 0.0 {
                Rgba::rgb(255, 40, 30)
            } else {
                Rgba::rgb(70, 20, 16)
            };
            list.circle(Point::new(x0 + face_w * 0.9, y0 + face_h * 0.12), face_h * 0.04, lamp);
        }
        list
    }
}

fn mean(v: &[f32]) -> f32 {
    if v.is_empty() {
        0.0
    } else {
        v.iter().sum::<f32>() / v.len() as f32
    }
}
