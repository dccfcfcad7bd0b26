use crate::draw::Rgba;
use crate::error::{EngineError, Result};
use clap::ValueEnum;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorScheme {
    Spectrum,
    Neon,
    Fire,
    Ocean,
    Phosphor,
    Mono,
}

impl ColorScheme {
    pub const fn all() -> [Self; 6] {
        [
            Self::Spectrum,
            Self::Neon,
            Self::Fire,
            Self::Ocean,
            Self::Phosphor,
            Self::Mono,
        ]
    }

    pub fn next(self) -> Self {
        let all = Self::all();
        let idx = all.iter().position(|&c| c == self).unwrap_or(0);
        all[(idx + 1) % all.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Spectrum => "Spectrum",
            Self::Neon => "Neon",
            Self::Fire => "Fire",
            Self::Ocean => "Ocean",
            Self::Phosphor => "Phosphor",
            Self::Mono => "Mono",
        }
    }

    /// Color at position `v` (0..1 along the scheme) with brightness `level`.
    pub fn color(self, v: f32, level: f32) -> Rgba {
        let v = fract01(v);
        let level = level.clamp(0.0, 1.0);
        let rgb = match self {
            Self::Spectrum => hsv_to_rgb(v * 0.85, 0.9, 0.35 + 0.65 * level),
            Self::Neon => iq_palette(
                v,
                [0.5, 0.5, 0.5],
                [0.5, 0.5, 0.5],
                [1.0, 1.0, 1.0],
                [0.80, 0.20, 0.55],
            ),
            Self::Fire => {
                let x = (v * 0.6 + level * 0.4).clamp(0.0, 1.0);
                [
                    (255.0 * (x * 2.2).min(1.0)) as u8,
                    (255.0 * (x * 1.6 - 0.35).clamp(0.0, 1.0)) as u8,
                    (255.0 * (x * 2.0 - 1.2).clamp(0.0, 1.0)) as u8,
                ]
            }
            Self::Ocean => hsv_to_rgb(0.47 + v * 0.2, 0.75, 0.3 + 0.7 * level),
            Self::Phosphor => {
                let g = 0.25 + 0.75 * level;
                [
                    (40.0 * g + 120.0 * v * level) as u8,
                    (255.0 * g) as u8,
                    (70.0 * g) as u8,
                ]
            }
            Self::Mono => {
                let g = (60.0 + 195.0 * (0.3 * v + 0.7 * level)).min(255.0) as u8;
                [g, g, g]
            }
        };
        let c = Rgba::from_rgb(rgb);
        if matches!(self, Self::Neon) {
            c.scaled(0.35 + 0.75 * level)
        } else {
            c
        }
    }
}

impl FromStr for ColorScheme {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase();
        Self::all()
            .into_iter()
            .find(|c| c.label().to_ascii_lowercase() == key)
            .ok_or_else(|| EngineError::UnknownColorScheme(s.to_string()))
    }
}

pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [u8; 3] {
    let h = fract01(h) * 6.0;
    let i = h.floor() as i32;
    let f = h - i as f32;
    let p = v * (1.0 - s);
    let q = v * (1.0 - f * s);
    let t = v * (1.0 - (1.0 - f) * s);
    let (r, g, b) = match i.rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    [
        (r.clamp(0.0, 1.0) * 255.0) as u8,
        (g.clamp(0.0, 1.0) * 255.0) as u8,
        (b.clamp(0.0, 1.0) * 255.0) as u8,
    ]
}

fn iq_palette(t: f32, a: [f32; 3], b: [f32; 3], c: [f32; 3], d: [f32; 3]) -> [u8; 3] {
    let tau = std::f32::consts::TAU;
    let ch = |i: usize| {
        let v = a[i] + b[i] * (tau * (c[i] * t + d[i])).cos();
        (v.clamp(0.0, 1.0) * 255.0) as u8
    };
    [ch(0), ch(1), ch(2)]
}

pub fn fract01(x: f32) -> f32 {
    let f = x - x.floor();
    if f < 0.0 { f + 1.0 } else { f }
}
