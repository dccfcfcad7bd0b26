pub mod app;
pub mod canvas;
pub mod config;
pub mod controller;
pub mod draw;
pub mod engine;
pub mod error;
pub mod feed;
pub mod feedback;
pub mod governor;
pub mod modes;
pub mod palette;
pub mod render;
pub mod scheduler;
pub mod spectrum;
pub mod terminal;

pub use controller::{ModeController, ModeHooks, TransitionOrigin};
pub use draw::{DrawCommand, DrawList, DrawSurface, Point, Rgba};
pub use engine::{Engine, EngineConfig, TickOutcome};
pub use error::{DrawError, EngineError, Result};
pub use feed::{spectrum_feed, SpectrumReceiver, SpectrumSender};
pub use governor::{PerformancePreset, PerformanceProfile, ProfileOverrides};
pub use modes::{EngineContext, ModeKind, ModeState};
pub use palette::ColorScheme;
pub use spectrum::{SmoothedSpectrum, SpectrumFrame, SpectrumProcessor};
