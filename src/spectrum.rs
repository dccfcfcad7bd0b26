use crate::error::{EngineError, Result};
use std::f32::consts::PI;

pub const MIN_SOURCE_BANDS: usize = 8;
pub const MAX_SOURCE_BANDS: usize = 128;
pub const DEFAULT_SOURCE_BANDS: usize = 64;

pub const MIN_BARS: usize = 16;
pub const MAX_BARS: usize = 128;
pub const DEFAULT_BARS: usize = 64;

pub const MIN_SENSITIVITY: f32 = 0.1;
pub const MAX_SENSITIVITY: f32 = 3.0;

/// Per-tick linear decay of the peak-hold markers.
pub const PEAK_DECAY: f32 = 0.01;
/// Envelope values below this snap to zero.
pub const SNAP_FLOOR: f32 = 1e-3;

/// One immutable spectrum update from the audio service.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumFrame {
    bands: Vec<f32>,
}

impl SpectrumFrame {
    pub fn new(bands: &[f32]) -> Result<Self> {
        if !(MIN_SOURCE_BANDS..=MAX_SOURCE_BANDS).contains(&bands.len()) {
            return Err(EngineError::InvalidSpectrum {
                len: bands.len(),
                min: MIN_SOURCE_BANDS,
                max: MAX_SOURCE_BANDS,
            });
        }
        let bands = bands
            .iter()
            .map(|&v| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 })
            .collect();
        Ok(Self { bands })
    }

    pub fn silent(n: usize) -> Self {
        Self {
            bands: vec![0.0; n.clamp(MIN_SOURCE_BANDS, MAX_SOURCE_BANDS)],
        }
    }

    pub fn bands(&self) -> &[f32] {
        &self.bands
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }
}

/// Idle spectrum: a few slow sines folded over the band axis so animators keep
/// breathing when no audio is flowing.
pub fn synthetic_frame(t: f32, n: usize) -> SpectrumFrame {
    let n = n.clamp(MIN_SOURCE_BANDS, MAX_SOURCE_BANDS);
    let mut bands = Vec::with_capacity(n);
    for i in 0..n {
        let x = i as f32 / n as f32;
        let tilt = 1.0 - x * 0.7;
        let a = (t * 0.9 + x * 2.0 * PI).sin() * 0.5 + 0.5;
        let b = (t * 1.7 - x * 5.0).sin() * 0.5 + 0.5;
        let c = (t * 0.37 + x * 11.0).sin() * 0.5 + 0.5;
        let v = (0.12 + 0.16 * a + 0.08 * b + 0.05 * c) * tilt;
        bands.push(v.clamp(0.0, 1.0));
    }
    SpectrumFrame { bands }
}

/// Smoothed per-bar state. All three vectors always share one length.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedSpectrum {
    pub current: Vec<f32>,
    pub peak: Vec<f32>,
    pub previous: Vec<f32>,
}

impl SmoothedSpectrum {
    pub fn new(bars: usize) -> Self {
        Self {
            current: vec![0.0; bars],
            peak: vec![0.0; bars],
            previous: vec![0.0; bars],
        }
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    fn range_mean(values: &[f32], from: f32, to: f32) -> f32 {
        let n = values.len();
        if n == 0 {
            return 0.0;
        }
        let a = ((n as f32 * from) as usize).min(n - 1);
        let b = ((n as f32 * to).ceil() as usize).clamp(a + 1, n);
        values[a..b].iter().sum::<f32>() / (b - a) as f32
    }

    pub fn bass(&self) -> f32 {
        Self::range_mean(&self.current, 0.0, 0.15)
    }

    pub fn mid(&self) -> f32 {
        Self::range_mean(&self.current, 0.15, 0.5)
    }

    pub fn treble(&self) -> f32 {
        Self::range_mean(&self.current, 0.5, 1.0)
    }

    pub fn average(&self) -> f32 {
        Self::range_mean(&self.current, 0.0, 1.0)
    }

    /// Positive rise of the bass range since the previous envelope step.
    pub fn bass_transient(&self) -> f32 {
        let now = Self::range_mean(&self.current, 0.0, 0.15);
        let before = Self::range_mean(&self.previous, 0.0, 0.15);
        (now - before).max(0.0)
    }
}

/// Resamples incoming frames onto the bar layout and runs the attack/release
/// envelope plus peak-hold.
#[derive(Debug, Clone)]
pub struct SpectrumProcessor {
    sensitivity: f32,
    log_mapping: bool,
    state: SmoothedSpectrum,
    targets: Vec<f32>,
}

impl SpectrumProcessor {
    pub fn new(bar_count: usize, sensitivity: f32, log_mapping: bool) -> Self {
        let bars = bar_count.clamp(MIN_BARS, MAX_BARS);
        Self {
            sensitivity: sensitivity.clamp(MIN_SENSITIVITY, MAX_SENSITIVITY),
            log_mapping,
            state: SmoothedSpectrum::new(bars),
            targets: vec![0.0; bars],
        }
    }

    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    pub fn set_sensitivity(&mut self, s: f32) {
        if s.is_finite() {
            self.sensitivity = s.clamp(MIN_SENSITIVITY, MAX_SENSITIVITY);
        }
    }

    pub fn log_mapping(&self) -> bool {
        self.log_mapping
    }

    pub fn set_log_mapping(&mut self, on: bool) {
        self.log_mapping = on;
    }

    /// `(rise, fall)` envelope coefficients for the current sensitivity.
    pub fn rates(&self) -> (f32, f32) {
        let s = self.sensitivity;
        ((0.2 + s * 0.3).min(1.0), (0.04 + s * 0.04).min(1.0))
    }

    pub fn bar_count(&self) -> usize {
        self.state.len()
    }

    pub fn state(&self) -> &SmoothedSpectrum {
        &self.state
    }

    pub fn targets(&self) -> &[f32] {
        &self.targets
    }

    /// Changes the bar count. Contents are re-initialized to zero.
    pub fn resize(&mut self, bar_count: usize) {
        let bars = bar_count.clamp(MIN_BARS, MAX_BARS);
        if bars == self.state.len() {
            return;
        }
        self.state = SmoothedSpectrum::new(bars);
        self.targets = vec![0.0; bars];
    }

    pub fn ingest(&mut self, frame: &SpectrumFrame, bar_count: usize) -> &SmoothedSpectrum {
        self.resize(bar_count);
        resample_into(frame.bands(), self.log_mapping, &mut self.targets);
        self.step();
        &self.state
    }

    fn step(&mut self) {
        let (rise, fall) = self.rates();
        let st = &mut self.state;
        for i in 0..st.current.len() {
            let target = self.targets[i];
            let cur = st.current[i];
            st.previous[i] = cur;

            let rate = if target > cur { rise } else { fall };
            let mut next = cur + (target - cur) * rate;
            if next < SNAP_FLOOR {
                next = 0.0;
            }
            st.current[i] = next;

            let peak = st.peak[i];
            st.peak[i] = if next >= peak {
                next
            } else {
                (peak - PEAK_DECAY).max(next).max(0.0)
            };
        }
    }

    /// Interactive transitions: jump straight to the latest targets so the new
    /// mode doesn't open on a frozen-looking frame.
    pub fn reset_to_targets(&mut self) {
        let st = &mut self.state;
        st.current.copy_from_slice(&self.targets);
        st.peak.copy_from_slice(&self.targets);
        st.previous.copy_from_slice(&self.targets);
    }

    /// Externally driven transitions start from silence for a visible onset.
    pub fn reset_to_zero(&mut self) {
        let st = &mut self.state;
        st.current.fill(0.0);
        st.peak.fill(0.0);
        st.previous.fill(0.0);
    }
}

/// Maps `src` onto `out.len()` bars.
pub fn resample_into(src: &[f32], log_mapping: bool, out: &mut [f32]) {
    let n = src.len();
    let bars = out.len();
    if n == 0 || bars == 0 {
        out.fill(0.0);
        return;
    }

    if log_mapping {
        let radius = n / (2 * bars);
        for (i, slot) in out.iter_mut().enumerate() {
            let x = i as f32 / bars as f32;
            let center = (x * x * (n - 1) as f32).round() as usize;
            let lo = center.saturating_sub(radius);
            let hi = (center + radius).min(n - 1);
            let sum: f32 = src[lo..=hi].iter().sum();
            *slot = sum / (hi - lo + 1) as f32;
        }
    } else {
        for (i, slot) in out.iter_mut().enumerate() {
            let lo = (i * n / bars).min(n - 1);
            let hi = ((i + 1) * n / bars).clamp(lo + 1, n);
            let sum: f32 = src[lo..hi].iter().sum();
            *slot = sum / (hi - lo) as f32;
        }
    }
}
