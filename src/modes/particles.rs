use super::{backdrop, tick_scale, EngineContext};
use crate::draw::{DrawList, Point, Rgba};
use crate::governor::rebalance;
use crate::spectrum::SmoothedSpectrum;
use std::f32::consts::TAU;

/// Link particles closer than this fraction of the shorter screen side.
pub const LINK_DISTANCE: f32 = 0.14;

/// A drifting point in normalized `[0, 1)` screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub size: f32,
    pub hue: f32,
}

impl Particle {
    fn spawn() -> Self {
        let a = fastrand::f32() * TAU;
        let speed = 0.01 + fastrand::f32() * 0.03;
        Self {
            x: fastrand::f32(),
            y: fastrand::f32(),
            vx: a.cos() * speed,
            vy: a.sin() * speed,
            size: 1.0 + fastrand::f32() * 2.0,
            hue: fastrand::f32(),
        }
    }
}

/// Energy-driven particle field with proximity links.
pub struct ParticleFieldState {
    particles: Vec<Particle>,
}

impl ParticleFieldState {
    pub(super) fn new(count: usize) -> Self {
        let mut particles = Vec::new();
        rebalance(&mut particles, count, Particle::spawn);
        Self { particles }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub(super) fn rebalance(&mut self, target: usize) {
        rebalance(&mut self.particles, target, Particle::spawn);
    }

    pub(super) fn advance(
        &mut self,
        _spectrum: &SmoothedSpectrum,
        ctx: &EngineContext,
        dt: f32,
    ) -> DrawList {
        if self.particles.len() != ctx.profile.max_particles {
            self.rebalance(ctx.profile.max_particles);
        }
        let boost = 0.3 + ctx.energy * 2.5 + ctx.transient * 6.0;
        for p in &mut self.particles {
            p.x = (p.x + p.vx * boost * dt).rem_euclid(1.0);
            p.y = (p.y + p.vy * boost * dt).rem_euclid(1.0);
        }

        let mut list = backdrop(ctx, Rgba::rgb(3, 3, 8));
        let scale = ctx.min_dim();
        let link = LINK_DISTANCE * scale;
        let link_sq = link * link;
        let pts: Vec<Point> = self
            .particles
            .iter()
            .map(|p| Point::new(p.x * ctx.width, p.y * ctx.height))
            .collect();
        for i in 0..pts.len() {
            for j in (i + 1)..pts.len() {
                let dx = pts[i].x - pts[j].x;
                let dy = pts[i].y - pts[j].y;
                let d2 = dx * dx + dy * dy;
                if d2 >= link_sq {
                    continue;
                }
                let alpha = (1.0 - d2.sqrt() / link) * (0.25 + ctx.energy * 0.6);
                let hue = (self.particles[i].hue + self.particles[j].hue) * 0.5;
                list.line(pts[i], pts[j], 1.0, ctx.scheme.color(hue, 0.6).with_alpha(alpha));
            }
        }
        for (p, at) in self.particles.iter().zip(&pts) {
            let r = p.size * (1.0 + ctx.bass * 1.5);
            list.circle(*at, r, ctx.scheme.color(p.hue, 0.5 + ctx.energy * 0.5));
        }
        list
    }
}

const MAX_SHOCK_RINGS: usize = 12;
const SHOCK_TRIGGER: f32 = 0.04;

struct ShockRing {
    radius: f32,
    speed: f32,
    life: f32,
    hue: f32,
}

/// Spokes from the center plus expanding rings fired by bass hits.
pub struct RadialState {
    rings: Vec<ShockRing>,
    twist: f32,
    cooldown: f32,
}

impl RadialState {
    pub(super) fn new() -> Self {
        Self {
            rings: Vec::with_capacity(MAX_SHOCK_RINGS),
            twist: fastrand::f32() * TAU,
            cooldown: 0.0,
        }
    }

    pub(super) fn advance(
        &mut self,
        spectrum: &SmoothedSpectrum,
        ctx: &EngineContext,
        dt: f32,
    ) -> DrawList {
        let k = tick_scale(dt);
        self.twist = (self.twist + 0.01 * k * (1.0 + ctx.mid * 3.0)).rem_euclid(TAU);
        self.cooldown = (self.cooldown - dt).max(0.0);
        if ctx.transient > SHOCK_TRIGGER && self.cooldown == 0.0 && self.rings.len() < MAX_SHOCK_RINGS {
            self.rings.push(ShockRing {
                radius: ctx.min_dim() * 0.05,
                speed: ctx.min_dim() * (0.4 + ctx.transient * 4.0),
                life: 1.0,
                hue: ctx.phase * 0.1 + fastrand::f32() * 0.2,
            });
            self.cooldown = 0.12;
        }
        for ring in &mut self.rings {
            ring.radius += ring.speed * dt;
            ring.life -= dt * 0.9;
        }
        self.rings.retain(|r| r.life > 0.0);

        let mut list = backdrop(ctx, Rgba::rgb(4, 2, 8));
        let c = ctx.center();
        let n = spectrum.len();
        let reach = ctx.min_dim() * 0.48;
        for (i, &v) in spectrum.current.iter().enumerate() {
            let a = self.twist + TAU * i as f32 / n.max(1) as f32;
            let (s, co) = a.sin_cos();
            let len = reach * (0.1 + v * 0.9);
            list.line(
                c,
                Point::new(c.x + co * len, c.y + s * len),
                1.5,
                ctx.scheme.color(i as f32 / n.max(1) as f32, v),
            );
        }
        for ring in &self.rings {
            list.ring(
                c,
                ring.radius,
                1.0 + 2.0 * ring.life,
                ctx.scheme.color(ring.hue, ring.life).with_alpha(ring.life),
            );
        }
        list.circle(c, ctx.min_dim() * (0.03 + ctx.bass * 0.05), ctx.scheme.color(ctx.phase * 0.05, 1.0));
        list
    }
}
