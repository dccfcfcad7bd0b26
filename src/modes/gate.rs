//! Ring-dialing sequence: the glyph ring turns toward each address glyph,
//! locks a chevron, reverses, and after the last lock opens the wormhole.

use super::{backdrop, EngineContext};
use crate::draw::{DrawList, Point, Rgba};
use crate::spectrum::SmoothedSpectrum;
use std::f32::consts::TAU;

pub const GLYPH_COUNT: usize = 39;
/// Chevrons that must lock before the wormhole opens.
pub const CHEVRON_COUNT: u32 = 7;
pub const LOCK_TOLERANCE_DEG: f32 = 3.0;
pub const ENGAGE_SECONDS: f32 = 0.6;
/// Below this mean energy the ring does not turn.
pub const DIAL_ENERGY_THRESHOLD: f32 = 0.12;

const BASE_DIAL_DEG_PER_SEC: f32 = 40.0;
const BASS_DIAL_DEG_PER_SEC: f32 = 160.0;
const GLYPH_STEP_DEG: f32 = 360.0 / GLYPH_COUNT as f32;
const RIM_CHEVRONS: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GatePhase {
    Dialing,
    ChevronEngaging { remaining: f32 },
    WormholeActive,
}

pub struct GateDialState {
    phase: GatePhase,
    locks: u32,
    ring_deg: f32,
    direction: f32,
    address: [usize; CHEVRON_COUNT as usize],
    wormhole_t: f32,
}

fn wrap_deg(d: f32) -> f32 {
    let d = d.rem_euclid(360.0);
    if d > 180.0 { d - 360.0 } else { d }
}

impl GateDialState {
    pub(super) fn new() -> Self {
        let mut pool: Vec<usize> = (0..GLYPH_COUNT).collect();
        fastrand::shuffle(&mut pool);
        let mut address = [0usize; CHEVRON_COUNT as usize];
        address.copy_from_slice(&pool[..CHEVRON_COUNT as usize]);
        Self {
            phase: GatePhase::Dialing,
            locks: 0,
            ring_deg: fastrand::f32() * 360.0,
            direction: 1.0,
            address,
            wormhole_t: 0.0,
        }
    }

    pub fn phase(&self) -> GatePhase {
        self.phase
    }

    pub fn locks(&self) -> u32 {
        self.locks
    }

    pub fn ring_deg(&self) -> f32 {
        self.ring_deg
    }

    /// `+1.0` or `-1.0`; flips after every lock.
    pub fn direction(&self) -> f32 {
        self.direction
    }

    pub fn address(&self) -> &[usize] {
        &self.address
    }

    pub fn is_wormhole_open(&self) -> bool {
        self.phase == GatePhase::WormholeActive
    }

    fn target_deg(&self) -> Option<f32> {
        self.address
            .get(self.locks as usize)
            .map(|&g| g as f32 * GLYPH_STEP_DEG)
    }

    fn step(&mut self, ctx: &EngineContext, dt: f32) {
        match self.phase {
            GatePhase::Dialing => {
                let Some(target) = self.target_deg() else {
                    self.phase = GatePhase::WormholeActive;
                    return;
                };
                // Silence freezes the whole sequence, locking included.
                if ctx.energy <= DIAL_ENERGY_THRESHOLD {
                    return;
                }
                let rate = BASE_DIAL_DEG_PER_SEC + BASS_DIAL_DEG_PER_SEC * ctx.bass;
                let travel = rate * dt;
                let ahead = ((target - self.ring_deg) * self.direction).rem_euclid(360.0);
                if travel >= ahead {
                    self.ring_deg = target;
                } else {
                    self.ring_deg = (self.ring_deg + travel * self.direction).rem_euclid(360.0);
                }
                if wrap_deg(target - self.ring_deg).abs() < LOCK_TOLERANCE_DEG {
                    self.phase = GatePhase::ChevronEngaging {
                        remaining: ENGAGE_SECONDS,
                    };
                }
            }
            GatePhase::ChevronEngaging { remaining } => {
                let remaining = remaining - dt;
                if remaining > 0.0 {
                    self.phase = GatePhase::ChevronEngaging { remaining };
                    return;
                }
                self.locks += 1;
                self.direction = -self.direction;
                tracing::debug!(locks = self.locks, "chevron locked");
                self.phase = if self.locks >= CHEVRON_COUNT {
                    GatePhase::WormholeActive
                } else {
                    GatePhase::Dialing
                };
            }
            GatePhase::WormholeActive => {
                self.wormhole_t += dt * (1.0 + ctx.energy * 2.0);
            }
        }
    }

    pub(super) fn advance(
        &mut self,
        _spectrum: &SmoothedSpectrum,
        ctx: &EngineContext,
        dt: f32,
    ) -> DrawList {
        self.step(ctx, dt);

        let mut list = backdrop(ctx, Rgba::rgb(6, 8, 12));
        let c = ctx.center();
        let outer = ctx.min_dim() * 0.45;
        let inner = outer * 0.74;
        let metal = Rgba::rgb(96, 100, 108);
        list.circle(c, outer, Rgba::rgb(52, 56, 62));
        list.circle(c, inner, Rgba::rgb(6, 8, 12));
        list.ring(c, outer, 2.0, metal);
        list.ring(c, inner, 2.0, metal);

        let glyph_r = (outer + inner) * 0.5;
        let glyph_px = (outer - inner) * 0.45;
        let target = self.address.get(self.locks as usize).copied();
        for g in 0..GLYPH_COUNT {
            let a = (self.ring_deg + g as f32 * GLYPH_STEP_DEG - 90.0).to_radians();
            let at = Point::new(c.x + a.cos() * glyph_r - glyph_px * 0.3, c.y + a.sin() * glyph_r - glyph_px * 0.5);
            let ch = char::from(b'A' + (g % 26) as u8);
            let color = if Some(g) == target && matches!(self.phase, GatePhase::ChevronEngaging { .. }) {
                Rgba::rgb(255, 170, 60)
            } else {
                Rgba::rgb(150, 156, 166)
            };
            list.glyph(at, ch, glyph_px, color);
        }

        for k in 0..RIM_CHEVRONS {
            let a = (k as f32 / RIM_CHEVRONS as f32 * 360.0 - 90.0).to_radians();
            let lit = (k as u32) < self.locks
                || (k as u32 == self.locks && matches!(self.phase, GatePhase::ChevronEngaging { .. }));
            let color = if lit {
                Rgba::rgb(255, 120, 40)
            } else {
                Rgba::rgb(70, 40, 30)
            };
            let p = Point::new(c.x + a.cos() * outer * 1.02, c.y + a.sin() * outer * 1.02);
            list.circle(p, outer * 0.045, color);
        }

        if self.is_wormhole_open() {
            // Ripple rings travel outward with the wormhole's own clock.
            list.circle(c, inner * 0.98, Rgba::rgb(20, 60, 140));
            for k in 0..6 {
                let f = (self.wormhole_t * 0.35 + k as f32 / 6.0).fract();
                let r = inner * 0.95 * f;
                let wobble = (self.wormhole_t * 3.0 + k as f32).sin() * 0.5 + 0.5;
                let color = Rgba::rgb(120, 190, 255).with_alpha((1.0 - f) * (0.4 + 0.4 * wobble));
                list.ring(c, r, 2.0 + ctx.bass * 3.0, color);
            }
            let shimmer = (self.wormhole_t * TAU * 0.5).sin() * 0.5 + 0.5;
            list.circle(c, inner * 0.12, Rgba::rgb(200, 230, 255).with_alpha(0.3 + 0.5 * shimmer));
        }
        list
    }
}
