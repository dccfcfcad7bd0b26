use crate::error::{EngineError, Result};
use crate::spectrum::{MAX_BARS, MIN_BARS};
use clap::ValueEnum;
use std::str::FromStr;

pub const MIN_FPS: u32 = 10;
pub const MAX_FPS: u32 = 60;
pub const DEFAULT_FPS: u32 = 22;

const MB: u64 = 1024 * 1024;
pub const MIN_MEMORY_BYTES: u64 = 10 * MB;
pub const MAX_MEMORY_BYTES: u64 = 100 * MB;

pub const PARTICLES_PER_MB: u64 = 2;
pub const STARS_PER_MB: u64 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum PerformancePreset {
    Low,
    Medium,
    High,
    Ultra,
}

impl PerformancePreset {
    pub const fn all() -> [Self; 4] {
        [Self::Low, Self::Medium, Self::High, Self::Ultra]
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Ultra => "ultra",
        }
    }

    pub fn lower(self) -> Self {
        match self {
            Self::Ultra => Self::High,
            Self::High => Self::Medium,
            Self::Medium => Self::Low,
            Self::Low => Self::Low,
        }
    }

    pub fn higher(self) -> Self {
        match self {
            Self::Low => Self::Medium,
            Self::Medium => Self::High,
            Self::High => Self::Ultra,
            Self::Ultra => Self::Ultra,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Ultra => Self::Low,
            other => other.higher(),
        }
    }

    /// `(fps, bars, memory MB)` before overrides.
    fn base(self) -> (u32, usize, u64) {
        match self {
            Self::Low => (15, 32, 20),
            Self::Medium => (DEFAULT_FPS, 64, 40),
            Self::High => (30, 96, 60),
            Self::Ultra => (60, 128, 100),
        }
    }
}

impl FromStr for PerformancePreset {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" | "balanced" | "default" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "ultra" => Ok(Self::Ultra),
            _ => Err(EngineError::UnknownPreset(s.to_string())),
        }
    }
}

/// Explicit numeric knobs that win over the preset's values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileOverrides {
    pub fps: Option<u32>,
    pub bars: Option<usize>,
    pub memory_mb: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerformanceProfile {
    pub target_tick_rate_hz: u32,
    pub max_bars: usize,
    pub max_particles: usize,
    pub max_stars: usize,
    pub memory_budget_bytes: u64,
}

impl Default for PerformanceProfile {
    fn default() -> Self {
        Self::derive(PerformancePreset::Medium, &ProfileOverrides::default())
    }
}

impl PerformanceProfile {
    pub fn derive(preset: PerformancePreset, overrides: &ProfileOverrides) -> Self {
        let (fps, bars, mem_mb) = preset.base();
        let fps = overrides.fps.unwrap_or(fps).clamp(MIN_FPS, MAX_FPS);
        let bars = overrides.bars.unwrap_or(bars).clamp(MIN_BARS, MAX_BARS);
        let memory = overrides
            .memory_mb
            .unwrap_or(mem_mb)
            .saturating_mul(MB)
            .clamp(MIN_MEMORY_BYTES, MAX_MEMORY_BYTES);
        let budget_mb = memory / MB;
        Self {
            target_tick_rate_hz: fps,
            max_bars: bars,
            max_particles: (budget_mb * PARTICLES_PER_MB) as usize,
            max_stars: (budget_mb * STARS_PER_MB) as usize,
            memory_budget_bytes: memory,
        }
    }

    pub fn memory_budget_mb(&self) -> u64 {
        self.memory_budget_bytes / MB
    }

    pub fn tick_budget_ms(&self) -> f32 {
        1000.0 / self.target_tick_rate_hz.max(1) as f32
    }
}

/// Trims `items` down to `target`, or back-fills with freshly spawned entities.
pub fn rebalance<T>(items: &mut Vec<T>, target: usize, mut spawn: impl FnMut() -> T) {
    if items.len() > target {
        items.truncate(target);
        return;
    }
    items.reserve(target - items.len());
    while items.len() < target {
        items.push(spawn());
    }
}

/// Steps the effective preset down when ticks keep overrunning their budget,
/// and back up toward the chosen preset when there is sustained headroom.
#[derive(Debug, Clone)]
pub struct LoadTuner {
    ceiling: PerformancePreset,
    current: PerformancePreset,
    adaptive: bool,
    ema_ms: f32,
    cooldown: u32,
}

const TUNER_COOLDOWN_TICKS: u32 = 45;

impl LoadTuner {
    pub fn new(preset: PerformancePreset, adaptive: bool) -> Self {
        Self {
            ceiling: preset,
            current: preset,
            adaptive,
            ema_ms: 0.0,
            cooldown: 0,
        }
    }

    pub fn preset(&self) -> PerformancePreset {
        self.current
    }

    pub fn set_preset(&mut self, preset: PerformancePreset) {
        self.ceiling = preset;
        self.current = preset;
        self.ema_ms = 0.0;
        self.cooldown = 0;
    }

    pub fn set_adaptive(&mut self, on: bool) {
        self.adaptive = on;
        if !on {
            self.current = self.ceiling;
        }
    }

    pub fn ema_ms(&self) -> f32 {
        self.ema_ms
    }

    /// Feeds one tick duration. Returns the new preset when it changed.
    pub fn update(&mut self, tick_ms: f32, budget_ms: f32) -> Option<PerformancePreset> {
        if !self.adaptive || !tick_ms.is_finite() {
            return None;
        }
        self.ema_ms = if self.ema_ms == 0.0 {
            tick_ms
        } else {
            self.ema_ms * 0.95 + tick_ms * 0.05
        };
        if self.cooldown > 0 {
            self.cooldown -= 1;
            return None;
        }

        let prev = self.current;
        if self.ema_ms > budget_ms * 1.22 {
            self.current = self.current.lower();
        } else if self.ema_ms < budget_ms * 0.55 && self.current < self.ceiling {
            self.current = self.current.higher().min(self.ceiling);
        }

        if self.current != prev {
            self.cooldown = TUNER_COOLDOWN_TICKS;
            self.ema_ms = 0.0;
            Some(self.current)
        } else {
            None
        }
    }
}
