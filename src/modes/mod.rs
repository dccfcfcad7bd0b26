//! Visualization modes.
//!
//! Every mode is one variant of [`ModeState`] carrying only its own private
//! state. [`initialize`] builds that state on entry, [`advance`] steps it once
//! per tick and returns draw instructions, and dropping the variant is the
//! teardown. Nothing here is global: shared per-tick values travel in
//! [`EngineContext`].

mod bars;
mod emblems;
mod gate;
mod orbit;
mod particles;
mod plasma;
mod rain;
mod starfield;
mod waves;

pub use bars::{CircularState, VuMeterState};
pub use emblems::{CrawlState, FactionAState, FactionBState};
pub use gate::{
    GateDialState, GatePhase, CHEVRON_COUNT, DIAL_ENERGY_THRESHOLD, ENGAGE_SECONDS, GLYPH_COUNT,
    LOCK_TOLERANCE_DEG,
};
pub use orbit::{OrbitBody, OrbitSceneState};
pub use particles::{Particle, ParticleFieldState, RadialState};
pub use plasma::PlasmaState;
pub use rain::{CharacterRainState, RainColumn, RAIN_MUTATION_CHANCE};
pub use starfield::{Star, StarfieldState};
pub use waves::{AuroraState, OscilloscopeState, WaveGridState, WaterfallState, WaveformState};

use crate::draw::{DrawList, Point, Rgba};
use crate::error::{EngineError, Result};
use crate::governor::PerformanceProfile;
use crate::palette::ColorScheme;
use crate::spectrum::{SmoothedSpectrum, DEFAULT_BARS};
use clap::ValueEnum;
use std::str::FromStr;

/// Motion constants in the animators are tuned per tick at this rate; `dt`
/// is converted back to "ticks" so other rates move at the same speed.
pub const REFERENCE_HZ: f32 = 22.0;

pub(crate) fn tick_scale(dt: f32) -> f32 {
    (dt * REFERENCE_HZ).clamp(0.0, 4.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum ModeKind {
    #[value(alias = "spectrum")]
    Bars,
    Mirror,
    #[value(alias = "wave")]
    Waveform,
    Circular,
    Radial,
    Particles,
    Aurora,
    WaveGrid,
    #[value(alias = "stars")]
    Starfield,
    #[value(alias = "matrix", alias = "rain")]
    CharacterRain,
    Crawl,
    #[value(alias = "stargate", alias = "gate")]
    GateDial,
    FactionA,
    FactionB,
    #[value(alias = "orbit")]
    OrbitScene,
    #[value(alias = "vu")]
    VuMeter,
    #[value(alias = "scope")]
    Oscilloscope,
    #[value(name = "plasma-3d", alias = "plasma3d", alias = "tunnel")]
    Plasma3D,
    #[value(alias = "spectrogram")]
    Waterfall,
    #[value(name = "plasma-2d", alias = "plasma2d", alias = "plasma")]
    Plasma2D,
}

impl ModeKind {
    pub const COUNT: usize = 20;

    pub const fn all() -> [Self; Self::COUNT] {
        [
            Self::Bars,
            Self::Mirror,
            Self::Waveform,
            Self::Circular,
            Self::Radial,
            Self::Particles,
            Self::Aurora,
            Self::WaveGrid,
            Self::Starfield,
            Self::CharacterRain,
            Self::Crawl,
            Self::GateDial,
            Self::FactionA,
            Self::FactionB,
            Self::OrbitScene,
            Self::VuMeter,
            Self::Oscilloscope,
            Self::Plasma3D,
            Self::Waterfall,
            Self::Plasma2D,
        ]
    }

    pub fn index(self) -> usize {
        Self::all().iter().position(|&m| m == self).unwrap_or(0)
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::all().get(idx).copied()
    }

    pub fn next(self) -> Self {
        Self::all()[(self.index() + 1) % Self::COUNT]
    }

    pub fn prev(self) -> Self {
        Self::all()[(self.index() + Self::COUNT - 1) % Self::COUNT]
    }

    /// Modes rendered through the feedback compositor.
    pub fn is_generative(self) -> bool {
        matches!(self, Self::Plasma2D | Self::Plasma3D)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Bars => "Bars",
            Self::Mirror => "Mirror",
            Self::Waveform => "Waveform",
            Self::Circular => "Circular",
            Self::Radial => "Radial",
            Self::Particles => "Particles",
            Self::Aurora => "Aurora",
            Self::WaveGrid => "Wave Grid",
            Self::Starfield => "Starfield",
            Self::CharacterRain => "Character Rain",
            Self::Crawl => "Crawl",
            Self::GateDial => "Gate Dial",
            Self::FactionA => "Faction A",
            Self::FactionB => "Faction B",
            Self::OrbitScene => "Orbit Scene",
            Self::VuMeter => "VU Meter",
            Self::Oscilloscope => "Oscilloscope",
            Self::Plasma3D => "Plasma 3D",
            Self::Waterfall => "Waterfall",
            Self::Plasma2D => "Plasma 2D",
        }
    }
}

impl FromStr for ModeKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        if key.is_empty() {
            return Err(EngineError::UnknownMode(s.to_string()));
        }
        if let Some(m) = Self::all().into_iter().find(|m| {
            m.label()
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .map(|c| c.to_ascii_lowercase())
                .eq(key.chars())
        }) {
            return Ok(m);
        }
        let alias = match key.as_str() {
            "spectrum" | "bar" => Self::Bars,
            "wave" | "line" => Self::Waveform,
            "circle" => Self::Circular,
            "burst" => Self::Radial,
            "grid" => Self::WaveGrid,
            "stars" => Self::Starfield,
            "matrix" | "rain" => Self::CharacterRain,
            "scroll" | "textcrawl" => Self::Crawl,
            "stargate" | "gate" | "dial" => Self::GateDial,
            "orbit" | "orbits" | "solar" => Self::OrbitScene,
            "vu" | "meter" => Self::VuMeter,
            "scope" => Self::Oscilloscope,
            "tunnel" | "milkdrop" => Self::Plasma3D,
            "spectrogram" => Self::Waterfall,
            "plasma" => Self::Plasma2D,
            _ => return Err(EngineError::UnknownMode(s.to_string())),
        };
        Ok(alias)
    }
}

/// Per-tick values shared by every animator. Owned by the engine and passed
/// by reference; the global animation phase lives here.
#[derive(Debug, Clone)]
pub struct EngineContext {
    pub t: f32,
    pub dt: f32,
    pub width: f32,
    pub height: f32,
    /// Cross-mode animation phase, reset to zero on every mode teardown.
    pub phase: f32,
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
    /// Mean of all bars.
    pub energy: f32,
    pub transient: f32,
    pub scheme: ColorScheme,
    pub profile: PerformanceProfile,
    pub audio_active: bool,
    pub bar_count: usize,
}

impl EngineContext {
    pub fn new(width: usize, height: usize, profile: PerformanceProfile, scheme: ColorScheme) -> Self {
        Self {
            t: 0.0,
            dt: 0.0,
            width: width as f32,
            height: height as f32,
            phase: 0.0,
            bass: 0.0,
            mid: 0.0,
            treble: 0.0,
            energy: 0.0,
            transient: 0.0,
            scheme,
            profile,
            audio_active: false,
            bar_count: DEFAULT_BARS,
        }
    }

    pub fn absorb(&mut self, spectrum: &SmoothedSpectrum) {
        self.bass = spectrum.bass();
        self.mid = spectrum.mid();
        self.treble = spectrum.treble();
        self.energy = spectrum.average();
        self.transient = spectrum.bass_transient();
        self.bar_count = spectrum.len();
    }

    pub fn center(&self) -> Point {
        Point::new(self.width * 0.5, self.height * 0.5)
    }

    pub fn min_dim(&self) -> f32 {
        self.width.min(self.height).max(1.0)
    }
}

/// Private state of the active mode.
pub enum ModeState {
    Bars,
    Mirror,
    Waveform(WaveformState),
    Circular(CircularState),
    Radial(RadialState),
    Particles(ParticleFieldState),
    Aurora(AuroraState),
    WaveGrid(WaveGridState),
    Starfield(StarfieldState),
    CharacterRain(CharacterRainState),
    Crawl(CrawlState),
    GateDial(GateDialState),
    FactionA(FactionAState),
    FactionB(FactionBState),
    OrbitScene(OrbitSceneState),
    VuMeter(VuMeterState),
    Oscilloscope(OscilloscopeState),
    Plasma3D(PlasmaState),
    Waterfall(WaterfallState),
    Plasma2D(PlasmaState),
    /// No private state: the mode failed to initialize.
    Dormant,
}

impl ModeState {
    pub fn kind(&self) -> Option<ModeKind> {
        Some(match self {
            Self::Bars => ModeKind::Bars,
            Self::Mirror => ModeKind::Mirror,
            Self::Waveform(_) => ModeKind::Waveform,
            Self::Circular(_) => ModeKind::Circular,
            Self::Radial(_) => ModeKind::Radial,
            Self::Particles(_) => ModeKind::Particles,
            Self::Aurora(_) => ModeKind::Aurora,
            Self::WaveGrid(_) => ModeKind::WaveGrid,
            Self::Starfield(_) => ModeKind::Starfield,
            Self::CharacterRain(_) => ModeKind::CharacterRain,
            Self::Crawl(_) => ModeKind::Crawl,
            Self::GateDial(_) => ModeKind::GateDial,
            Self::FactionA(_) => ModeKind::FactionA,
            Self::FactionB(_) => ModeKind::FactionB,
            Self::OrbitScene(_) => ModeKind::OrbitScene,
            Self::VuMeter(_) => ModeKind::VuMeter,
            Self::Oscilloscope(_) => ModeKind::Oscilloscope,
            Self::Plasma3D(_) => ModeKind::Plasma3D,
            Self::Waterfall(_) => ModeKind::Waterfall,
            Self::Plasma2D(_) => ModeKind::Plasma2D,
            Self::Dormant => return None,
        })
    }

    pub fn gate_dial(&self) -> Option<&GateDialState> {
        match self {
            Self::GateDial(s) => Some(s),
            _ => None,
        }
    }

    pub fn character_rain(&self) -> Option<&CharacterRainState> {
        match self {
            Self::CharacterRain(s) => Some(s),
            _ => None,
        }
    }

    pub fn particles(&self) -> Option<&ParticleFieldState> {
        match self {
            Self::Particles(s) => Some(s),
            _ => None,
        }
    }

    pub fn starfield(&self) -> Option<&StarfieldState> {
        match self {
            Self::Starfield(s) => Some(s),
            _ => None,
        }
    }

    pub fn orbit_scene(&self) -> Option<&OrbitSceneState> {
        match self {
            Self::OrbitScene(s) => Some(s),
            _ => None,
        }
    }

    /// Applies new entity ceilings: trims excess, back-fills deficits.
    pub fn rebalance(&mut self, profile: &PerformanceProfile) {
        match self {
            Self::Particles(s) => s.rebalance(profile.max_particles),
            Self::Starfield(s) => s.rebalance(profile.max_stars),
            Self::Crawl(s) => s.rebalance(profile.max_stars / 8),
            _ => {}
        }
    }
}

/// Builds fresh private state for `kind`. Randomized parameters are drawn anew
/// on every call so each activation looks different.
pub fn initialize(kind: ModeKind, ctx: &EngineContext) -> ModeState {
    match kind {
        ModeKind::Bars => ModeState::Bars,
        ModeKind::Mirror => ModeState::Mirror,
        ModeKind::Waveform => ModeState::Waveform(WaveformState::new()),
        ModeKind::Circular => ModeState::Circular(CircularState::new()),
        ModeKind::Radial => ModeState::Radial(RadialState::new()),
        ModeKind::Particles => ModeState::Particles(ParticleFieldState::new(ctx.profile.max_particles)),
        ModeKind::Aurora => ModeState::Aurora(AuroraState::new()),
        ModeKind::WaveGrid => ModeState::WaveGrid(WaveGridState::new()),
        ModeKind::Starfield => ModeState::Starfield(StarfieldState::new(ctx.profile.max_stars)),
        ModeKind::CharacterRain => ModeState::CharacterRain(CharacterRainState::new(ctx)),
        ModeKind::Crawl => ModeState::Crawl(CrawlState::new(ctx.profile.max_stars / 8)),
        ModeKind::GateDial => ModeState::GateDial(GateDialState::new()),
        ModeKind::FactionA => ModeState::FactionA(FactionAState::new()),
        ModeKind::FactionB => ModeState::FactionB(FactionBState::new()),
        ModeKind::OrbitScene => ModeState::OrbitScene(OrbitSceneState::new()),
        ModeKind::VuMeter => ModeState::VuMeter(VuMeterState::new()),
        ModeKind::Oscilloscope => ModeState::Oscilloscope(OscilloscopeState::new()),
        ModeKind::Plasma3D => ModeState::Plasma3D(PlasmaState::new(kind)),
        ModeKind::Waterfall => ModeState::Waterfall(WaterfallState::new()),
        ModeKind::Plasma2D => ModeState::Plasma2D(PlasmaState::new(kind)),
    }
}

/// Steps the active mode by `dt` seconds and returns its draw instructions.
pub fn advance(
    state: &mut ModeState,
    spectrum: &SmoothedSpectrum,
    ctx: &EngineContext,
    dt: f32,
) -> DrawList {
    match state {
        ModeState::Bars => bars::draw_bars(spectrum, ctx),
        ModeState::Mirror => bars::draw_mirror(spectrum, ctx),
        ModeState::Waveform(s) => s.advance(spectrum, ctx, dt),
        ModeState::Circular(s) => s.advance(spectrum, ctx, dt),
        ModeState::Radial(s) => s.advance(spectrum, ctx, dt),
        ModeState::Particles(s) => s.advance(spectrum, ctx, dt),
        ModeState::Aurora(s) => s.advance(spectrum, ctx, dt),
        ModeState::WaveGrid(s) => s.advance(spectrum, ctx, dt),
        ModeState::Starfield(s) => s.advance(spectrum, ctx, dt),
        ModeState::CharacterRain(s) => s.advance(spectrum, ctx, dt),
        ModeState::Crawl(s) => s.advance(spectrum, ctx, dt),
        ModeState::GateDial(s) => s.advance(spectrum, ctx, dt),
        ModeState::FactionA(s) => s.advance(spectrum, ctx, dt),
        ModeState::FactionB(s) => s.advance(spectrum, ctx, dt),
        ModeState::OrbitScene(s) => s.advance(spectrum, ctx, dt),
        ModeState::VuMeter(s) => s.advance(spectrum, ctx, dt),
        ModeState::Oscilloscope(s) => s.advance(spectrum, ctx, dt),
        ModeState::Plasma3D(s) | ModeState::Plasma2D(s) => s.advance(spectrum, ctx, dt),
        ModeState::Waterfall(s) => s.advance(spectrum, ctx, dt),
        ModeState::Dormant => dormant(ctx),
    }
}

fn dormant(ctx: &EngineContext) -> DrawList {
    let mut list = DrawList::with_capacity(3);
    list.clear(Rgba::rgb(8, 8, 12));
    let r = ctx.min_dim() * (0.08 + 0.02 * (ctx.t * 1.5).sin());
    list.ring(ctx.center(), r, 1.0, ctx.scheme.color(ctx.phase, 0.3));
    list
}

/// Background fill shared by most modes.
pub(crate) fn backdrop(ctx: &EngineContext, base: Rgba) -> DrawList {
    let mut list = DrawList::with_capacity(ctx.bar_count * 2 + 16);
    list.clear(base);
    list
}
