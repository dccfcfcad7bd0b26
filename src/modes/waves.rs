use super::{backdrop, tick_scale, EngineContext};
use crate::draw::{DrawList, Point, Rgba};
use crate::spectrum::{resample_into, SmoothedSpectrum};
use std::collections::VecDeque;
use std::f32::consts::TAU;

/// Sum-of-sines trace shaped by the spectrum: each bar contributes one
/// harmonic whose amplitude is the bar level.
fn synth_trace(spectrum: &SmoothedSpectrum, phase: f32, samples: usize) -> Vec<f32> {
    let n = spectrum.len().min(24);
    let mut out = vec![0.0f32; samples];
    if n == 0 || samples == 0 {
        return out;
    }
    let stride = (spectrum.len() / n).max(1);
    for (s, slot) in out.iter_mut().enumerate() {
        let x = s as f32 / samples as f32;
        let mut acc = 0.0;
        for k in 0..n {
            let amp = spectrum.current[k * stride];
            acc += amp * (TAU * x * (k + 1) as f32 + phase * (1.0 + k as f32 * 0.3)).sin()
                / (1.0 + k as f32 * 0.35);
        }
        *slot = acc;
    }
    let peak = out.iter().fold(0.0f32, |m, v| m.max(v.abs()));
    if peak > 1.0 {
        for v in &mut out {
            *v /= peak;
        }
    }
    out
}

pub struct WaveformState {
    phase: f32,
    speed: f32,
}

impl WaveformState {
    pub(super) fn new() -> Self {
        Self {
            phase: fastrand::f32() * TAU,
            speed: 1.5 + fastrand::f32(),
        }
    }

    pub(super) fn advance(
        &mut self,
        spectrum: &SmoothedSpectrum,
        ctx: &EngineContext,
        dt: f32,
    ) -> DrawList {
        self.phase = (self.phase + self.speed * (0.5 + ctx.energy * 2.0) * dt).rem_euclid(TAU * 64.0);
        let samples = (ctx.width as usize / 3).clamp(32, 256);
        let trace = synth_trace(spectrum, self.phase, samples);
        let mid = ctx.height * 0.5;
        let amp = ctx.height * 0.4;
        let points: Vec<Point> = trace
            .iter()
            .enumerate()
            .map(|(i, v)| {
                Point::new(
                    ctx.width * i as f32 / (samples - 1) as f32,
                    mid - v * amp,
                )
            })
            .collect();
        let color = ctx.scheme.color(ctx.phase * 0.04, 0.5 + ctx.energy * 0.5);
        let mut list = backdrop(ctx, Rgba::rgb(4, 6, 10));
        list.polyline(points.clone(), false, 5.0, color.with_alpha(0.18));
        list.polyline(points, false, 1.5, color);
        list
    }
}

const SCOPE_TRACES: usize = 6;

/// Phosphor scope: the newest trace is bright, older ones fade out.
pub struct OscilloscopeState {
    traces: VecDeque<Vec<f32>>,
    phase: f32,
}

impl OscilloscopeState {
    pub(super) fn new() -> Self {
        Self {
            traces: VecDeque::with_capacity(SCOPE_TRACES),
            phase: 0.0,
        }
    }

    pub(super) fn advance(
        &mut self,
        spectrum: &SmoothedSpectrum,
        ctx: &EngineContext,
        dt: f32,
    ) -> DrawList {
        self.phase = (self.phase + (2.0 + ctx.treble * 6.0) * dt).rem_euclid(TAU * 64.0);
        if self.traces.len() == SCOPE_TRACES {
            self.traces.pop_front();
        }
        self.traces.push_back(synth_trace(spectrum, self.phase, 160));

        let mut list = backdrop(ctx, Rgba::rgb(2, 10, 4));
        let grid = Rgba::rgb(14, 40, 18);
        for k in 1..8 {
            let x = ctx.width * k as f32 / 8.0;
            list.line(Point::new(x, 0.0), Point::new(x, ctx.height), 1.0, grid);
        }
        for k in 1..6 {
            let y = ctx.height * k as f32 / 6.0;
            list.line(Point::new(0.0, y), Point::new(ctx.width, y), 1.0, grid);
        }
        let total = self.traces.len();
        for (age, trace) in self.traces.iter().enumerate() {
            let fresh = (age + 1) as f32 / total as f32;
            let pts: Vec<Point> = trace
                .iter()
                .enumerate()
                .map(|(i, v)| {
                    Point::new(
                        ctx.width * i as f32 / (trace.len() - 1).max(1) as f32,
                        ctx.height * 0.5 - v * ctx.height * 0.38,
                    )
                })
                .collect();
            let color = ctx.scheme.color(0.3, fresh).with_alpha(fresh * fresh);
            list.polyline(pts, false, if age + 1 == total { 2.0 } else { 1.0 }, color);
        }
        list
    }
}

struct AuroraLayer {
    phase: f32,
    speed: f32,
    hue: f32,
    height: f32,
    freq: f32,
}

/// Layered curtains whose ripple follows bands of the spectrum.
pub struct AuroraState {
    layers: Vec<AuroraLayer>,
    stars: Vec<Point>,
}

impl AuroraState {
    pub(super) fn new() -> Self {
        let layers = (0..4)
            .map(|i| AuroraLayer {
                phase: fastrand::f32() * TAU,
                speed: 0.2 + fastrand::f32() * 0.5,
                hue: 0.25 + i as f32 * 0.12 + fastrand::f32() * 0.05,
                height: 0.2 + fastrand::f32() * 0.25,
                freq: 1.5 + fastrand::f32() * 2.5,
            })
            .collect();
        let stars = (0..40)
            .map(|_| Point::new(fastrand::f32(), fastrand::f32() * 0.6))
            .collect();
        Self { layers, stars }
    }

    pub(super) fn advance(
        &mut self,
        spectrum: &SmoothedSpectrum,
        ctx: &EngineContext,
        dt: f32,
    ) -> DrawList {
        for layer in &mut self.layers {
            layer.phase = (layer.phase + layer.speed * (0.5 + ctx.mid * 2.0) * dt).rem_euclid(TAU);
        }
        let mut list = backdrop(ctx, Rgba::rgb(2, 4, 14));
        list.gradient(
            0.0,
            0.0,
            ctx.width,
            ctx.height,
            Rgba::rgb(2, 4, 18),
            Rgba::rgb(8, 14, 30),
        );
        for s in &self.stars {
            list.rect(s.x * ctx.width, s.y * ctx.height, 1.0, 1.0, Rgba::rgb(160, 170, 200));
        }

        let strips = (ctx.width as usize / 4).clamp(16, 160);
        let strip_w = ctx.width / strips as f32 + 1.0;
        let mut bands = vec![0.0f32; strips];
        resample_into(&spectrum.current, false, &mut bands);
        for (li, layer) in self.layers.iter().enumerate() {
            for (k, &band) in bands.iter().enumerate() {
                let x = k as f32 / strips as f32;
                let wave = (x * TAU * layer.freq + layer.phase).sin() * 0.5 + 0.5;
                let top = ctx.height * (0.12 + 0.1 * li as f32 + 0.08 * wave);
                let h = ctx.height * (layer.height + band * 0.35);
                let color = ctx.scheme.color(layer.hue + x * 0.1, 0.4 + band * 0.6);
                list.gradient(
                    x * ctx.width,
                    top,
                    strip_w,
                    h,
                    color.with_alpha(0.05),
                    color.with_alpha(0.35 + 0.3 * band),
                );
            }
        }
        list
    }
}

const GRID_ROWS: usize = 24;
const GRID_COLS: usize = 32;

/// Receding terrain of recent spectra.
pub struct WaveGridState {
    rows: VecDeque<Vec<f32>>,
}

impl WaveGridState {
    pub(super) fn new() -> Self {
        Self {
            rows: VecDeque::with_capacity(GRID_ROWS),
        }
    }

    pub(super) fn advance(
        &mut self,
        spectrum: &SmoothedSpectrum,
        ctx: &EngineContext,
        _dt: f32,
    ) -> DrawList {
        let mut row = vec![0.0f32; GRID_COLS];
        resample_into(&spectrum.current, false, &mut row);
        if self.rows.len() == GRID_ROWS {
            self.rows.pop_back();
        }
        self.rows.push_front(row);

        let mut list = backdrop(ctx, Rgba::rgb(6, 2, 14));
        let horizon = ctx.height * 0.28;
        // Far rows first so near rows paint over them.
        for (depth, row) in self.rows.iter().enumerate().rev() {
            let z = depth as f32 / GRID_ROWS as f32;
            let persp = 1.0 - z * 0.75;
            let base_y = horizon + (ctx.height * 0.95 - horizon) * (1.0 - z).powf(1.6);
            let span = ctx.width * persp;
            let x0 = (ctx.width - span) * 0.5;
            let pts: Vec<Point> = row
                .iter()
                .enumerate()
                .map(|(i, v)| {
                    Point::new(
                        x0 + span * i as f32 / (GRID_COLS - 1) as f32,
                        base_y - v * ctx.height * 0.3 * persp,
                    )
                })
                .collect();
            let color = ctx.scheme.color(0.6 + z * 0.3 + ctx.phase * 0.01, 1.0 - z);
            list.polyline(pts, false, 1.0, color.with_alpha(1.0 - z * 0.8));
        }
        list
    }
}

/// Scrolling spectrogram: newest row at the top.
pub struct WaterfallState {
    rows: VecDeque<Vec<f32>>,
}

impl WaterfallState {
    pub(super) fn new() -> Self {
        Self {
            rows: VecDeque::new(),
        }
    }

    pub(super) fn advance(
        &mut self,
        spectrum: &SmoothedSpectrum,
        ctx: &EngineContext,
        dt: f32,
    ) -> DrawList {
        let cell = (ctx.height / 90.0).max(2.0);
        let capacity = (ctx.height / cell).ceil().max(1.0) as usize;
        // Scroll roughly once per reference tick regardless of rate.
        let pushes = tick_scale(dt).round().max(1.0) as usize;
        for _ in 0..pushes {
            self.rows.push_front(spectrum.current.clone());
        }
        self.rows.truncate(capacity);

        let mut list = backdrop(ctx, Rgba::BLACK);
        for (r, row) in self.rows.iter().enumerate() {
            let n = row.len().max(1);
            let w = ctx.width / n as f32;
            let y = r as f32 * cell;
            for (i, &v) in row.iter().enumerate() {
                if v < 0.02 {
                    continue;
                }
                list.rect(i as f32 * w, y, w + 0.5, cell, ctx.scheme.color(v * 0.8, v));
            }
        }
        list
    }
}
