use crate::engine::EngineConfig;
use crate::governor::{PerformancePreset, ProfileOverrides};
use crate::modes::ModeKind;
use crate::palette::ColorScheme;
use clap::{Parser, ValueEnum};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "spectral-viz",
    version,
    about = "Audio-reactive terminal visualizer with twenty procedural modes"
)]
pub struct Config {
    #[arg(long, value_enum, default_value_t = ModeKind::Bars)]
    pub mode: ModeKind,

    #[arg(long, value_enum, default_value_t = PerformancePreset::Medium)]
    pub preset: PerformancePreset,

    #[arg(long, value_enum, default_value_t = ColorScheme::Spectrum)]
    pub scheme: ColorScheme,

    #[arg(long, value_enum, default_value_t = RendererMode::HalfBlock)]
    pub renderer: RendererMode,

    #[arg(long, value_enum, default_value_t = FeedSource::Synthetic)]
    pub source: FeedSource,

    /// Overrides the preset's tick rate (10..=60).
    #[arg(long)]
    pub fps: Option<u32>,

    /// Overrides the preset's bar ceiling (16..=128).
    #[arg(long)]
    pub bars: Option<usize>,

    /// Overrides the preset's memory budget in MB (10..=100).
    #[arg(long)]
    pub memory_mb: Option<u64>,

    /// Requested bar count, capped by the preset.
    #[arg(long, default_value_t = crate::spectrum::DEFAULT_BARS)]
    pub density: usize,

    #[arg(long, default_value_t = 1.0)]
    pub sensitivity: f32,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub log_mapping: bool,

    #[arg(long, default_value_t = false)]
    pub adaptive: bool,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub sync_updates: bool,

    #[arg(long, default_value_t = false)]
    pub list_modes: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RendererMode {
    #[value(alias = "ansi", alias = "text")]
    Ascii,
    #[value(name = "half-block", alias = "halfblock", alias = "half_block", alias = "hb")]
    HalfBlock,
}

impl RendererMode {
    /// Pixels per terminal cell, `(x, y)`.
    pub fn cell_pixels(self) -> (usize, usize) {
        match self {
            Self::Ascii => (1, 1),
            Self::HalfBlock => (1, 2),
        }
    }
}

/// Where spectrum frames come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FeedSource {
    /// A background thread plays a generated beat pattern into the feed.
    #[value(alias = "demo")]
    Synthetic,
    /// No producer; the engine runs on its idle spectrum.
    #[value(alias = "none")]
    Idle,
}

impl Config {
    pub fn overrides(&self) -> ProfileOverrides {
        ProfileOverrides {
            fps: self.fps,
            bars: self.bars,
            memory_mb: self.memory_mb,
        }
    }

    pub fn to_engine_config(&self, width: usize, height: usize) -> EngineConfig {
        EngineConfig {
            mode: self.mode,
            sensitivity: self.sensitivity,
            density: self.density,
            scheme: self.scheme,
            preset: self.preset,
            overrides: self.overrides(),
            log_mapping: self.log_mapping,
            adaptive: self.adaptive,
            width,
            height,
        }
    }
}
