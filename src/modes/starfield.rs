use super::{backdrop, EngineContext};
use crate::draw::{DrawList, Point, Rgba};
use crate::governor::rebalance;
use crate::spectrum::SmoothedSpectrum;

const NEAR_PLANE: f32 = 0.02;
const BASE_SPEED: f32 = 0.12;
const BASS_SPEED: f32 = 1.1;

/// A star in view space: `x`/`y` in `[-1, 1]`, depth `z` in `(0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Star {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub pz: f32,
}

impl Star {
    fn spawn() -> Self {
        let z = 0.1 + fastrand::f32() * 0.9;
        Self {
            x: fastrand::f32() * 2.0 - 1.0,
            y: fastrand::f32() * 2.0 - 1.0,
            z,
            pz: z,
        }
    }

    fn respawn_far(&mut self) {
        self.x = fastrand::f32() * 2.0 - 1.0;
        self.y = fastrand::f32() * 2.0 - 1.0;
        self.z = 1.0;
        self.pz = 1.0;
    }
}

fn project(ctx: &EngineContext, x: f32, y: f32, z: f32) -> Point {
    let c = ctx.center();
    let f = ctx.min_dim() * 0.5;
    Point::new(c.x + x / z * f, c.y + y / z * f)
}

/// Perspective star flight; bass pushes the camera forward.
pub struct StarfieldState {
    stars: Vec<Star>,
}

impl StarfieldState {
    pub(super) fn new(count: usize) -> Self {
        let mut stars = Vec::new();
        rebalance(&mut stars, count, Star::spawn);
        Self { stars }
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    pub(super) fn rebalance(&mut self, target: usize) {
        rebalance(&mut self.stars, target, Star::spawn);
    }

    pub(super) fn advance(
        &mut self,
        _spectrum: &SmoothedSpectrum,
        ctx: &EngineContext,
        dt: f32,
    ) -> DrawList {
        if self.stars.len() != ctx.profile.max_stars {
            self.rebalance(ctx.profile.max_stars);
        }
        let speed = (BASE_SPEED + BASS_SPEED * ctx.bass) * dt;
        let mut list = backdrop(ctx, Rgba::BLACK);
        for star in &mut self.stars {
            star.pz = star.z;
            star.z -= speed;
            if star.z <= NEAR_PLANE {
                star.respawn_far();
                continue;
            }
            let at = project(ctx, star.x, star.y, star.z);
            if at.x < 0.0 || at.y < 0.0 || at.x >= ctx.width || at.y >= ctx.height {
                star.respawn_far();
                continue;
            }
            let from = project(ctx, star.x, star.y, star.pz);
            let bright = (1.0 - star.z).clamp(0.0, 1.0);
            let color = ctx
                .scheme
                .color(0.55 + star.x * 0.1, bright)
                .with_alpha(0.3 + bright * 0.7);
            list.line(from, at, 0.5 + bright * 2.0, color);
        }
        list
    }
}
