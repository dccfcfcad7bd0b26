use super::{EngineContext, ModeKind};
use crate::draw::{DrawList, Point, Rgba};
use crate::spectrum::SmoothedSpectrum;

/// Overlay for the generative modes. The feedback compositor paints the
/// field itself; this only adds a light frame of spectrum ticks on top.
pub struct PlasmaState {
    kind: ModeKind,
    glow: f32,
}

impl PlasmaState {
    pub(super) fn new(kind: ModeKind) -> Self {
        Self { kind, glow: 0.0 }
    }

    pub fn kind(&self) -> ModeKind {
        self.kind
    }

    pub(super) fn advance(
        &mut self,
        spectrum: &SmoothedSpectrum,
        ctx: &EngineContext,
        _dt: f32,
    ) -> DrawList {
        self.glow = (self.glow * 0.9).max(ctx.transient * 8.0).min(1.0);
        let mut list = DrawList::with_capacity(spectrum.len() + 2);
        let n = spectrum.len().max(1);
        let w = ctx.width / n as f32;
        let base = ctx.height - 2.0;
        for (i, &v) in spectrum.current.iter().enumerate() {
            let h = v * ctx.height * 0.06;
            if h < 0.5 {
                continue;
            }
            list.rect(
                i as f32 * w,
                base - h,
                (w - 1.0).max(1.0),
                h,
                ctx.scheme.color(i as f32 / n as f32, v).with_alpha(0.55),
            );
        }
        if self.kind == ModeKind::Plasma3D && self.glow > 0.05 {
            list.ring(
                ctx.center(),
                ctx.min_dim() * (0.1 + 0.3 * self.glow),
                1.0,
                Rgba::WHITE.with_alpha(self.glow * 0.4),
            );
        }
        list.text(Point::new(4.0, 4.0), self.kind.label(), 8.0, Rgba::WHITE.with_alpha(0.35));
        list
    }
}
