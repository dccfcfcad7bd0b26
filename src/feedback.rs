//! Double-buffered feedback accumulation used by the generative plasma modes.
//!
//! Each composite warps the previous output (`front`) into `back`, fades and
//! tints it, draws fresh wave content on top, then swaps the two buffers by
//! ownership. Neither buffer is ever read while it is being written.

use crate::canvas;
use crate::draw::Point;
use crate::modes::EngineContext;
use crate::palette::hsv_to_rgb;
use crate::spectrum::SmoothedSpectrum;
use std::f32::consts::TAU;

pub const MAX_FEEDBACK_W: usize = 320;
pub const MAX_FEEDBACK_H: usize = 200;
pub const WAVE_MODE_SECONDS: f32 = 8.0;

pub struct PixelBuffer {
    id: u64,
    w: usize,
    h: usize,
    data: Vec<u8>,
}

impl PixelBuffer {
    fn new(id: u64, w: usize, h: usize) -> Self {
        let mut data = vec![0u8; w * h * 4];
        for px in data.chunks_exact_mut(4) {
            px[3] = 255;
        }
        Self { id, w, h, data }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    pub fn mean_luma(&self) -> f32 {
        let n = (self.w * self.h).max(1) as f32;
        let sum: f32 = self
            .data
            .chunks_exact(4)
            .map(|p| 0.299 * p[0] as f32 + 0.587 * p[1] as f32 + 0.114 * p[2] as f32)
            .sum();
        sum / n
    }
}

/// Two equally sized surfaces that are only ever exchanged, never copied.
pub struct FeedbackBufferPair {
    front: PixelBuffer,
    back: PixelBuffer,
}

impl FeedbackBufferPair {
    fn new(w: usize, h: usize, first_id: u64) -> Self {
        Self {
            front: PixelBuffer::new(first_id, w, h),
            back: PixelBuffer::new(first_id + 1, w, h),
        }
    }

    pub fn front(&self) -> &PixelBuffer {
        &self.front
    }

    pub fn back(&self) -> &PixelBuffer {
        &self.back
    }

    pub fn size(&self) -> (usize, usize) {
        (self.front.w, self.front.h)
    }

    pub fn swap(&mut self) {
        std::mem::swap(&mut self.front, &mut self.back);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveMode {
    Waveform,
    RadialBurst,
    SpectrumBars,
    Scatter,
}

impl WaveMode {
    pub fn next(self) -> Self {
        match self {
            Self::Waveform => Self::RadialBurst,
            Self::RadialBurst => Self::SpectrumBars,
            Self::SpectrumBars => Self::Scatter,
            Self::Scatter => Self::Waveform,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Waveform => "waveform",
            Self::RadialBurst => "radial",
            Self::SpectrumBars => "bars",
            Self::Scatter => "scatter",
        }
    }
}

/// Warp and blend gains for one plasma flavor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedbackParams {
    /// Zoom is `1 + zoom_gain * bass`.
    pub zoom_gain: f32,
    pub base_zoom: f32,
    /// Rotation in radians is `rotate_gain * treble`.
    pub rotate_gain: f32,
    pub jitter_gain: f32,
    pub decay_gain: f32,
    pub tint_strength: f32,
    pub hue_speed: f32,
    pub flash_threshold: f32,
    pub drift: (f32, f32),
}

impl FeedbackParams {
    /// Flat drifting plasma.
    pub fn flat() -> Self {
        Self {
            zoom_gain: 0.04,
            base_zoom: 1.004,
            rotate_gain: 0.03,
            jitter_gain: 0.012,
            decay_gain: 0.018,
            tint_strength: 0.018,
            hue_speed: 0.05,
            flash_threshold: 0.09,
            drift: (0.004, -0.002),
        }
    }

    /// Zooming tunnel.
    pub fn tunnel() -> Self {
        Self {
            zoom_gain: 0.12,
            base_zoom: 1.02,
            rotate_gain: 0.09,
            jitter_gain: 0.02,
            decay_gain: 0.025,
            tint_strength: 0.012,
            hue_speed: 0.08,
            flash_threshold: 0.07,
            drift: (0.0, 0.0),
        }
    }
}

pub struct FeedbackCompositor {
    pair: Option<FeedbackBufferPair>,
    params: FeedbackParams,
    hue_phase: f32,
    wave_mode: WaveMode,
    wave_timer: f32,
    flash: f32,
    next_id: u64,
    allocations: u64,
}

impl Default for FeedbackCompositor {
    fn default() -> Self {
        Self::new(FeedbackParams::flat())
    }
}

impl FeedbackCompositor {
    pub fn new(params: FeedbackParams) -> Self {
        Self {
            pair: None,
            params,
            hue_phase: fastrand::f32(),
            wave_mode: WaveMode::Waveform,
            wave_timer: 0.0,
            flash: 0.0,
            next_id: 1,
            allocations: 0,
        }
    }

    pub fn params(&self) -> FeedbackParams {
        self.params
    }

    pub fn set_params(&mut self, params: FeedbackParams) {
        self.params = params;
    }

    pub fn wave_mode(&self) -> WaveMode {
        self.wave_mode
    }

    pub fn is_allocated(&self) -> bool {
        self.pair.is_some()
    }

    pub fn pair(&self) -> Option<&FeedbackBufferPair> {
        self.pair.as_ref()
    }

    /// Number of times a buffer pair has been allocated.
    pub fn allocations(&self) -> u64 {
        self.allocations
    }

    pub fn dispose(&mut self) {
        if self.pair.take().is_some() {
            tracing::debug!("feedback buffers disposed");
        }
        self.flash = 0.0;
    }

    /// Buffer size for a surface, clamped to the resolution ceiling with the
    /// aspect ratio preserved.
    pub fn buffer_size_for(surface_w: usize, surface_h: usize) -> (usize, usize) {
        let w = surface_w.max(1);
        let h = surface_h.max(1);
        let k = (MAX_FEEDBACK_W as f32 / w as f32)
            .min(MAX_FEEDBACK_H as f32 / h as f32)
            .min(1.0);
        (
            ((w as f32 * k).round() as usize).max(1),
            ((h as f32 * k).round() as usize).max(1),
        )
    }

    /// Allocates the pair lazily, or reallocates it when the surface changed.
    pub fn ensure(&mut self, surface_w: usize, surface_h: usize) -> (usize, usize) {
        self.ensure_pair(surface_w, surface_h).size()
    }

    fn ensure_pair(&mut self, surface_w: usize, surface_h: usize) -> &mut FeedbackBufferPair {
        let size = Self::buffer_size_for(surface_w, surface_h);
        if self.pair.as_ref().is_some_and(|p| p.size() != size) {
            self.pair = None;
        }
        let first_id = self.next_id;
        if self.pair.is_none() {
            self.next_id += 2;
            self.allocations += 1;
            tracing::debug!(w = size.0, h = size.1, "feedback buffers allocated");
        }
        self.pair
            .get_or_insert_with(|| FeedbackBufferPair::new(size.0, size.1, first_id))
    }

    pub fn composite(
        &mut self,
        spectrum: &SmoothedSpectrum,
        ctx: &EngineContext,
        dt: f32,
    ) -> &PixelBuffer {
        self.hue_phase = (self.hue_phase + dt * self.params.hue_speed * (1.0 + ctx.energy)).fract();
        self.wave_timer += dt;
        if self.wave_timer >= WAVE_MODE_SECONDS {
            self.wave_timer = 0.0;
            self.wave_mode = self.wave_mode.next();
        }
        if spectrum.bass_transient() > self.params.flash_threshold && ctx.bass > 0.4 {
            self.flash = (self.flash + 0.8).min(1.0);
        }

        let params = self.params;
        let hue = self.hue_phase;
        let wave_mode = self.wave_mode;
        let flash = self.flash;
        self.flash *= 0.55;

        let pair = self.ensure_pair(ctx.width as usize, ctx.height as usize);
        {
            let FeedbackBufferPair { front, back } = &mut *pair;
            warp_decay_tint(front, back, &params, ctx, hue);
            draw_wave_content(back, wave_mode, spectrum, ctx, hue);
            if flash > 0.01 {
                flash_add(back, flash, hue);
            }
        }
        pair.swap();
        &pair.front
    }
}

fn warp_decay_tint(
    src: &PixelBuffer,
    dst: &mut PixelBuffer,
    params: &FeedbackParams,
    ctx: &EngineContext,
    hue: f32,
) {
    let w = dst.w;
    let h = dst.h;
    let zoom = (params.base_zoom + params.zoom_gain * ctx.bass).max(0.5);
    let angle = params.rotate_gain * ctx.treble * if (ctx.t * 0.11).sin() >= 0.0 { 1.0 } else { -1.0 };
    let (sa, ca) = angle.sin_cos();
    let jitter = params.jitter_gain * ctx.mid;
    let jx = (fastrand::f32() - 0.5) * 2.0 * jitter + params.drift.0;
    let jy = (fastrand::f32() - 0.5) * 2.0 * jitter + params.drift.1;

    let decay = (params.decay_gain / (0.35 + ctx.energy)).clamp(0.01, 0.2);
    let keep = 1.0 - decay;
    let tint = hsv_to_rgb(hue, 0.8, 1.0);
    let tint = [
        tint[0] as f32 * params.tint_strength,
        tint[1] as f32 * params.tint_strength,
        tint[2] as f32 * params.tint_strength,
    ];

    let wf = w as f32;
    let hf = h as f32;
    for y in 0..h {
        let ny = ((y as f32 + 0.5) / hf) * 2.0 - 1.0;
        for x in 0..w {
            let nx = ((x as f32 + 0.5) / wf) * 2.0 - 1.0;
            // Inverse transform: where did this pixel come from last frame?
            let sx = (nx * ca + ny * sa) / zoom + jx;
            let sy = (-nx * sa + ny * ca) / zoom + jy;
            let i = (y * w + x) * 4;
            let rgb = sample(src, sx, sy);
            dst.data[i] = (rgb[0] as f32 * keep + tint[0]).min(255.0) as u8;
            dst.data[i + 1] = (rgb[1] as f32 * keep + tint[1]).min(255.0) as u8;
            dst.data[i + 2] = (rgb[2] as f32 * keep + tint[2]).min(255.0) as u8;
            dst.data[i + 3] = 255;
        }
    }
}

fn sample(src: &PixelBuffer, nx: f32, ny: f32) -> [u8; 3] {
    if !(-1.0..=1.0).contains(&nx) || !(-1.0..=1.0).contains(&ny) {
        return [0, 0, 0];
    }
    let x = ((nx * 0.5 + 0.5) * (src.w as f32 - 1.0)).round() as usize;
    let y = ((ny * 0.5 + 0.5) * (src.h as f32 - 1.0)).round() as usize;
    let i = (y.min(src.h - 1) * src.w + x.min(src.w - 1)) * 4;
    [src.data[i], src.data[i + 1], src.data[i + 2]]
}

fn draw_wave_content(
    buf: &mut PixelBuffer,
    mode: WaveMode,
    spectrum: &SmoothedSpectrum,
    ctx: &EngineContext,
    hue: f32,
) {
    let w = buf.w;
    let h = buf.h;
    let wf = w as f32;
    let hf = h as f32;
    let bands = &spectrum.current;
    if bands.is_empty() {
        return;
    }
    let color = |v: f32, level: f32| ctx.scheme.color(hue + v, level);

    match mode {
        WaveMode::Waveform => {
            let steps = w.clamp(8, 256);
            let mut prev: Option<Point> = None;
            for s in 0..=steps {
                let x = s as f32 / steps as f32;
                let mut v = 0.0f32;
                for (k, &b) in bands.iter().enumerate().step_by(4) {
                    v += b * (x * TAU * (1.0 + k as f32 * 0.25) + ctx.t * (2.0 + k as f32 * 0.1)).sin();
                }
                v /= (bands.len() / 4).max(1) as f32 * 0.5;
                let p = Point::new(x * wf, hf * 0.5 + v.clamp(-1.0, 1.0) * hf * 0.4);
                if let Some(q) = prev {
                    canvas::line(&mut buf.data, w, h, q, p, 1.0, color(x * 0.3, 0.6 + ctx.energy));
                }
                prev = Some(p);
            }
        }
        WaveMode::RadialBurst => {
            let c = Point::new(wf * 0.5, hf * 0.5);
            let spokes = bands.len().min(48);
            let r0 = hf.min(wf) * 0.08;
            for i in 0..spokes {
                let b = bands[i * bands.len() / spokes];
                let ang = i as f32 / spokes as f32 * TAU + ctx.t * 0.3;
                let r1 = r0 + b * hf.min(wf) * 0.45;
                let a = Point::new(c.x + ang.cos() * r0, c.y + ang.sin() * r0);
                let e = Point::new(c.x + ang.cos() * r1, c.y + ang.sin() * r1);
                canvas::line(&mut buf.data, w, h, a, e, 1.0, color(i as f32 / spokes as f32, b));
            }
        }
        WaveMode::SpectrumBars => {
            let n = bands.len();
            let bw = wf / n as f32;
            for (i, &b) in bands.iter().enumerate() {
                let bh = b * hf * 0.5;
                canvas::fill_rect(
                    &mut buf.data,
                    w,
                    h,
                    i as f32 * bw,
                    hf - bh,
                    (bw - 1.0).max(1.0),
                    bh,
                    color(i as f32 / n as f32, b).with_alpha(0.7),
                );
            }
        }
        WaveMode::Scatter => {
            let count = (8.0 + ctx.energy * 40.0) as usize;
            for _ in 0..count {
                let k = fastrand::usize(..bands.len());
                let b = bands[k];
                let p = Point::new(fastrand::f32() * wf, fastrand::f32() * hf);
                canvas::fill_circle(&mut buf.data, w, h, p, 0.5 + b * 3.0, color(k as f32 / bands.len() as f32, b));
            }
        }
    }
}

fn flash_add(buf: &mut PixelBuffer, flash: f32, hue: f32) {
    let tint = hsv_to_rgb(hue + 0.5, 0.3, 1.0);
    let k = flash * 0.35;
    let w = buf.w;
    let h = buf.h;
    for y in 0..h {
        for x in 0..w {
            canvas::add_px(&mut buf.data, w, h, x as isize, y as isize, tint, k);
        }
    }
}
