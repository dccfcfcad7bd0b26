//! Tick orchestration and the control surface.

use crate::controller::{panic_message, ModeController, TransitionOrigin};
use crate::draw::{DrawList, DrawSurface, Point, Rgba};
use crate::error::{DrawError, EngineError, Result};
use crate::feed::{spectrum_feed, SpectrumReceiver, SpectrumSender};
use crate::governor::{LoadTuner, PerformancePreset, PerformanceProfile, ProfileOverrides};
use crate::modes::{EngineContext, ModeKind};
use crate::palette::ColorScheme;
use crate::scheduler::TickScheduler;
use crate::spectrum::{
    synthetic_frame, SmoothedSpectrum, SpectrumFrame, SpectrumProcessor, DEFAULT_BARS,
    DEFAULT_SOURCE_BANDS, MIN_BARS,
};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub mode: ModeKind,
    pub sensitivity: f32,
    /// Requested bar count; the profile's `max_bars` caps it.
    pub density: usize,
    pub scheme: ColorScheme,
    pub preset: PerformancePreset,
    pub overrides: ProfileOverrides,
    pub log_mapping: bool,
    pub adaptive: bool,
    pub width: usize,
    pub height: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: ModeKind::Bars,
            sensitivity: 1.0,
            density: DEFAULT_BARS,
            scheme: ColorScheme::Spectrum,
            preset: PerformancePreset::Medium,
            overrides: ProfileOverrides::default(),
            log_mapping: true,
            adaptive: false,
            width: 320,
            height: 200,
        }
    }
}

/// What a call to [`Engine::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Rendered,
    /// Another tick was still in flight.
    Dropped,
    Paused,
    /// The frame failed and a diagnostic frame was drawn instead.
    Diagnostic,
    Disposed,
}

pub struct Engine {
    processor: SpectrumProcessor,
    controller: ModeController,
    ctx: EngineContext,
    scheduler: TickScheduler,
    tuner: LoadTuner,
    preset: PerformancePreset,
    overrides: ProfileOverrides,
    profile: PerformanceProfile,
    density: usize,
    bar_count: usize,
    inbox: SpectrumReceiver,
    sender: SpectrumSender,
    last_frame: Option<SpectrumFrame>,
    pending_size: Option<(usize, usize)>,
    needs_rebuild: bool,
    disposed: bool,
    diagnostics: u64,
}

fn bars_for(density: usize, profile: &PerformanceProfile) -> usize {
    density.clamp(MIN_BARS, profile.max_bars.max(MIN_BARS))
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let profile = PerformanceProfile::derive(config.preset, &config.overrides);
        let bar_count = bars_for(config.density, &profile);
        let processor = SpectrumProcessor::new(bar_count, config.sensitivity, config.log_mapping);
        let mut ctx = EngineContext::new(config.width, config.height, profile, config.scheme);
        ctx.bar_count = bar_count;
        let controller = ModeController::new(config.mode, &ctx);
        let (sender, inbox) = spectrum_feed();
        tracing::debug!(
            preset = config.preset.label(),
            fps = profile.target_tick_rate_hz,
            bars = bar_count,
            mode = config.mode.label(),
            "engine created"
        );
        Self {
            processor,
            controller,
            ctx,
            scheduler: TickScheduler::new(profile.target_tick_rate_hz),
            tuner: LoadTuner::new(config.preset, config.adaptive),
            preset: config.preset,
            overrides: config.overrides,
            profile,
            density: config.density,
            bar_count,
            inbox,
            sender,
            last_frame: None,
            pending_size: None,
            needs_rebuild: false,
            disposed: false,
            diagnostics: 0,
        }
    }

    /// Producer handle for the audio service.
    pub fn spectrum_sender(&self) -> SpectrumSender {
        self.sender.clone()
    }

    pub fn active_mode(&self) -> ModeKind {
        self.controller.active()
    }

    pub fn controller(&self) -> &ModeController {
        &self.controller
    }

    #[doc(hidden)]
    pub fn controller_mut(&mut self) -> &mut ModeController {
        &mut self.controller
    }

    pub fn processor(&self) -> &SpectrumProcessor {
        &self.processor
    }

    pub fn spectrum(&self) -> &SmoothedSpectrum {
        self.processor.state()
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    pub fn scheduler(&self) -> &TickScheduler {
        &self.scheduler
    }

    pub fn profile(&self) -> &PerformanceProfile {
        &self.profile
    }

    /// The preset the user chose.
    pub fn preset(&self) -> PerformancePreset {
        self.preset
    }

    /// The preset currently in force; lower than [`Engine::preset`] while the
    /// adaptive tuner is shedding load.
    pub fn effective_preset(&self) -> PerformancePreset {
        self.tuner.preset()
    }

    pub fn bar_count(&self) -> usize {
        self.bar_count
    }

    pub fn color_scheme(&self) -> ColorScheme {
        self.ctx.scheme
    }

    pub fn is_paused(&self) -> bool {
        !self.scheduler.is_running()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn needs_rebuild(&self) -> bool {
        self.needs_rebuild
    }

    pub fn diagnostics(&self) -> u64 {
        self.diagnostics
    }

    pub fn audio_active(&self) -> bool {
        self.ctx.audio_active
    }

    fn live(&self) -> Result<()> {
        if self.disposed {
            Err(EngineError::Disposed)
        } else {
            Ok(())
        }
    }

    /// Interactive mode change by name. Returns whether a transition happened.
    pub fn set_mode(&mut self, name: &str) -> Result<bool> {
        let kind: ModeKind = name.parse()?;
        self.set_mode_kind(kind)
    }

    pub fn set_mode_kind(&mut self, kind: ModeKind) -> Result<bool> {
        self.live()?;
        Ok(self.controller.request(
            kind,
            TransitionOrigin::Interactive,
            &mut self.ctx,
            &mut self.processor,
        ))
    }

    /// External mode change by position in [`ModeKind::all`].
    pub fn set_mode_index(&mut self, index: usize) -> Result<bool> {
        self.live()?;
        let kind = ModeKind::from_index(index)
            .ok_or_else(|| EngineError::UnknownMode(index.to_string()))?;
        Ok(self.controller.request(
            kind,
            TransitionOrigin::External,
            &mut self.ctx,
            &mut self.processor,
        ))
    }

    pub fn set_sensitivity(&mut self, sensitivity: f32) {
        self.processor.set_sensitivity(sensitivity);
    }

    pub fn sensitivity(&self) -> f32 {
        self.processor.sensitivity()
    }

    pub fn set_log_mapping(&mut self, on: bool) {
        self.processor.set_log_mapping(on);
    }

    /// Requested bar count, capped by the active profile.
    pub fn set_density(&mut self, bars: usize) {
        self.density = bars;
        self.sync_bar_count();
    }

    pub fn set_color_scheme(&mut self, scheme: ColorScheme) {
        self.ctx.scheme = scheme;
    }

    pub fn set_target_fps(&mut self, fps: u32) {
        self.overrides.fps = Some(fps);
        self.apply_profile();
    }

    pub fn set_performance_preset(&mut self, name: &str) -> Result<()> {
        let preset: PerformancePreset = name.parse()?;
        self.set_preset(preset);
        Ok(())
    }

    pub fn set_preset(&mut self, preset: PerformancePreset) {
        self.preset = preset;
        self.tuner.set_preset(preset);
        self.apply_profile();
    }

    pub fn set_adaptive(&mut self, on: bool) {
        self.tuner.set_adaptive(on);
        self.apply_profile();
    }

    /// New track: the active mode starts over and the bars drop to silence.
    pub fn reset(&mut self) -> Result<()> {
        self.live()?;
        self.controller.reinitialize_active(&mut self.ctx);
        self.processor.reset_to_zero();
        self.last_frame = None;
        Ok(())
    }

    pub fn pause(&mut self) {
        self.scheduler.stop();
    }

    pub fn resume(&mut self) {
        if !self.disposed {
            self.scheduler.start();
        }
    }

    /// Records a new surface size; the rebuild happens on the next tick.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.pending_size = Some((width, height));
        self.needs_rebuild = true;
    }

    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.scheduler.stop();
        self.controller.dispose();
        self.disposed = true;
        tracing::debug!("engine disposed");
    }

    fn sync_bar_count(&mut self) {
        let bars = bars_for(self.density, &self.profile);
        if bars != self.bar_count {
            self.bar_count = bars;
            self.processor.resize(bars);
            self.ctx.bar_count = bars;
        }
    }

    fn apply_profile(&mut self) {
        self.profile = PerformanceProfile::derive(self.tuner.preset(), &self.overrides);
        self.scheduler.set_rate(self.profile.target_tick_rate_hz);
        self.ctx.profile = self.profile;
        self.sync_bar_count();
        self.controller.rebalance(&self.profile);
        tracing::debug!(
            preset = self.tuner.preset().label(),
            fps = self.profile.target_tick_rate_hz,
            bars = self.bar_count,
            particles = self.profile.max_particles,
            stars = self.profile.max_stars,
            "performance profile applied"
        );
    }

    /// Ticks when the scheduler says one is due at `now`.
    pub fn pump(&mut self, now: Instant, surface: &mut dyn DrawSurface) -> Option<TickOutcome> {
        if self.disposed {
            return Some(TickOutcome::Disposed);
        }
        let dt = self.scheduler.poll(now)?;
        Some(self.tick(dt, surface))
    }

    /// Runs one tick of `dt` seconds against `surface`.
    pub fn tick(&mut self, dt: f32, surface: &mut dyn DrawSurface) -> TickOutcome {
        if self.disposed {
            return TickOutcome::Disposed;
        }
        if !self.scheduler.is_running() {
            return TickOutcome::Paused;
        }
        if !self.scheduler.begin() {
            return TickOutcome::Dropped;
        }
        let started = Instant::now();
        let outcome = self.run_tick(dt.max(0.0), surface);
        self.scheduler.finish();

        let elapsed_ms = started.elapsed().as_secs_f32() * 1000.0;
        if let Some(preset) = self.tuner.update(elapsed_ms, self.profile.tick_budget_ms()) {
            tracing::debug!(preset = preset.label(), tick_ms = elapsed_ms, "load tuner moved preset");
            self.apply_profile();
        }
        outcome
    }

    fn run_tick(&mut self, dt: f32, surface: &mut dyn DrawSurface) -> TickOutcome {
        if let Some(frame) = self.inbox.drain_latest() {
            self.last_frame = Some(frame);
        }

        let (sw, sh) = surface.size();
        if (sw as f32, sh as f32) != (self.ctx.width, self.ctx.height) && self.pending_size.is_none() {
            self.resize(sw, sh);
        }
        if self.needs_rebuild {
            if let Some((w, h)) = self.pending_size.take() {
                self.ctx.width = w as f32;
                self.ctx.height = h as f32;
            }
            self.controller.invalidate_buffers();
            self.needs_rebuild = false;
            tracing::debug!(w = self.ctx.width, h = self.ctx.height, "surface rebuilt");
        }

        self.ctx.dt = dt;
        self.ctx.t += dt;
        self.ctx.phase += dt;
        self.ctx.audio_active = self.inbox.is_flowing() && self.last_frame.is_some();

        let idle;
        let frame = match (&self.last_frame, self.ctx.audio_active) {
            (Some(frame), true) => frame,
            _ => {
                idle = synthetic_frame(self.ctx.t, DEFAULT_SOURCE_BANDS);
                &idle
            }
        };
        let spectrum = self.processor.ingest(frame, self.bar_count);
        self.ctx.absorb(spectrum);

        let controller = &mut self.controller;
        let ctx = &self.ctx;
        let rendered = catch_unwind(AssertUnwindSafe(|| -> std::result::Result<(), DrawError> {
            if controller.active().is_generative() {
                if let Some(comp) = controller.compositor_mut() {
                    let front = comp.composite(spectrum, ctx, dt);
                    surface.blit_rgba(front.pixels(), front.width(), front.height())?;
                }
            }
            let list = controller.advance(spectrum, ctx, dt);
            surface.execute_all(&list)
        }));

        let fault = match rendered {
            Ok(Ok(())) => return TickOutcome::Rendered,
            Ok(Err(err)) => err.to_string(),
            Err(payload) => panic_message(payload.as_ref()),
        };
        self.diagnostics += 1;
        tracing::error!(
            mode = self.controller.active().label(),
            fault = %fault,
            "tick failed, drawing diagnostic frame"
        );
        if let Err(err) = surface.execute_all(&diagnostic_frame(&self.ctx)) {
            tracing::error!(%err, "diagnostic frame failed");
        }
        TickOutcome::Diagnostic
    }
}

fn diagnostic_frame(ctx: &EngineContext) -> DrawList {
    let (w, h) = (ctx.width.max(1.0), ctx.height.max(1.0));
    let red = Rgba::rgb(200, 30, 30);
    let mut list = DrawList::with_capacity(4);
    list.clear(Rgba::rgb(16, 4, 4));
    list.line(Point::new(0.0, 0.0), Point::new(w, h), 2.0, red);
    list.line(Point::new(w, 0.0), Point::new(0.0, h), 2.0, red);
    list.text(Point::new(4.0, 4.0), "render fault", 8.0, Rgba::WHITE);
    list
}
