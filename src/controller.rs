use crate::draw::DrawList;
use crate::feedback::{FeedbackCompositor, FeedbackParams};
use crate::governor::PerformanceProfile;
use crate::modes::{self, EngineContext, ModeKind, ModeState};
use crate::spectrum::{SmoothedSpectrum, SpectrumProcessor};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Who asked for a mode change. The two paths reset the spectrum differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOrigin {
    /// User picked a mode: bars restart at the latest targets.
    Interactive,
    /// Host selected a mode by index: bars restart from silence.
    External,
}

/// How mode state is built and torn down. Swappable so the isolation of a
/// failing mode can be exercised.
#[derive(Clone, Copy)]
pub struct ModeHooks {
    pub initialize: fn(ModeKind, &EngineContext) -> ModeState,
    pub teardown: fn(ModeState),
}

impl Default for ModeHooks {
    fn default() -> Self {
        Self {
            initialize: modes::initialize,
            teardown: drop,
        }
    }
}

/// Owns the active mode and enforces teardown-before-initialize on every
/// transition. The feedback compositor lives here too, since only the
/// generative modes need it.
pub struct ModeController {
    active: ModeKind,
    state: ModeState,
    compositor: Option<FeedbackCompositor>,
    hooks: ModeHooks,
    teardowns: u64,
    initializations: u64,
    failures: u64,
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn params_for(kind: ModeKind) -> FeedbackParams {
    match kind {
        ModeKind::Plasma3D => FeedbackParams::tunnel(),
        _ => FeedbackParams::flat(),
    }
}

impl ModeController {
    pub fn new(kind: ModeKind, ctx: &EngineContext) -> Self {
        let mut controller = Self {
            active: kind,
            state: ModeState::Dormant,
            compositor: None,
            hooks: ModeHooks::default(),
            teardowns: 0,
            initializations: 0,
            failures: 0,
        };
        controller.attach_compositor(kind);
        controller.initialize(kind, ctx);
        controller
    }

    pub fn active(&self) -> ModeKind {
        self.active
    }

    pub fn state(&self) -> &ModeState {
        &self.state
    }

    pub fn compositor(&self) -> Option<&FeedbackCompositor> {
        self.compositor.as_ref()
    }

    pub fn compositor_mut(&mut self) -> Option<&mut FeedbackCompositor> {
        self.compositor.as_mut()
    }

    #[doc(hidden)]
    pub fn set_hooks(&mut self, hooks: ModeHooks) {
        self.hooks = hooks;
    }

    pub fn teardowns(&self) -> u64 {
        self.teardowns
    }

    pub fn initializations(&self) -> u64 {
        self.initializations
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Switches to `kind`. Returns `false` when `kind` is already active, in
    /// which case nothing is torn down or rebuilt.
    pub fn request(
        &mut self,
        kind: ModeKind,
        origin: TransitionOrigin,
        ctx: &mut EngineContext,
        processor: &mut SpectrumProcessor,
    ) -> bool {
        if kind == self.active {
            return false;
        }
        let from = self.active;
        self.teardown(kind);
        ctx.phase = 0.0;
        match origin {
            TransitionOrigin::Interactive => processor.reset_to_targets(),
            TransitionOrigin::External => processor.reset_to_zero(),
        }
        self.active = kind;
        self.attach_compositor(kind);
        self.initialize(kind, ctx);
        tracing::debug!(from = from.label(), to = kind.label(), ?origin, "mode transition");
        true
    }

    /// Rebuilds the active mode's private state in place (new track).
    pub fn reinitialize_active(&mut self, ctx: &mut EngineContext) {
        let kind = self.active;
        self.teardown(kind);
        ctx.phase = 0.0;
        self.initialize(kind, ctx);
    }

    pub fn rebalance(&mut self, profile: &PerformanceProfile) {
        self.state.rebalance(profile);
    }

    pub fn advance(&mut self, spectrum: &SmoothedSpectrum, ctx: &EngineContext, dt: f32) -> DrawList {
        modes::advance(&mut self.state, spectrum, ctx, dt)
    }

    /// Drops the compositor buffers so the next composite reallocates them
    /// at the new size.
    pub fn invalidate_buffers(&mut self) {
        if let Some(comp) = self.compositor.as_mut() {
            comp.dispose();
        }
    }

    pub fn dispose(&mut self) {
        self.teardown(self.active);
        if let Some(mut comp) = self.compositor.take() {
            comp.dispose();
        }
    }

    fn teardown(&mut self, next: ModeKind) {
        let state = std::mem::replace(&mut self.state, ModeState::Dormant);
        let teardown = self.hooks.teardown;
        if let Err(payload) = catch_unwind(AssertUnwindSafe(move || teardown(state))) {
            self.failures += 1;
            tracing::error!(
                mode = self.active.label(),
                panic = %panic_message(payload.as_ref()),
                "mode teardown panicked"
            );
        }
        self.teardowns += 1;
        if self.active.is_generative() && !next.is_generative() {
            if let Some(mut comp) = self.compositor.take() {
                comp.dispose();
            }
        }
    }

    fn attach_compositor(&mut self, kind: ModeKind) {
        if !kind.is_generative() {
            return;
        }
        let params = params_for(kind);
        match self.compositor.as_mut() {
            // Plasma2D <-> Plasma3D keeps the buffers and only swaps params.
            Some(comp) => comp.set_params(params),
            None => self.compositor = Some(FeedbackCompositor::new(params)),
        }
    }

    fn initialize(&mut self, kind: ModeKind, ctx: &EngineContext) {
        let initialize = self.hooks.initialize;
        match catch_unwind(AssertUnwindSafe(|| initialize(kind, ctx))) {
            Ok(state) => {
                self.state = state;
                self.initializations += 1;
            }
            Err(payload) => {
                self.failures += 1;
                self.state = ModeState::Dormant;
                tracing::error!(
                    mode = kind.label(),
                    panic = %panic_message(payload.as_ref()),
                    "mode initialize panicked"
                );
            }
        }
    }
}
