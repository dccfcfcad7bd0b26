/// Result alias carrying [`EngineError`].
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors surfaced by the engine's control surface.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("unknown visualization mode: {0}")]
    UnknownMode(String),
    #[error("unknown performance preset: {0}")]
    UnknownPreset(String),
    #[error("unknown color scheme: {0}")]
    UnknownColorScheme(String),
    /// A spectrum frame with a band count outside the supported range.
    #[error("spectrum frame has {len} bands (expected {min}..={max})")]
    InvalidSpectrum { len: usize, min: usize, max: usize },
    #[error("engine has been disposed")]
    Disposed,
    #[error(transparent)]
    Draw(#[from] DrawError),
}

/// Errors raised by a [`crate::draw::DrawSurface`] while executing commands.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DrawError {
    #[error("non-finite coordinate in {0}")]
    NonFinite(&'static str),
    #[error("pixel buffer too small (need {need}, got {got})")]
    BufferSize { need: usize, got: usize },
}
