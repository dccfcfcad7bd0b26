use super::{backdrop, EngineContext};
use crate::draw::{DrawList, Point, Rgba};
use crate::spectrum::SmoothedSpectrum;
use std::collections::VecDeque;
use std::f32::consts::TAU;

const TRAIL_POINTS: usize = 24;
/// Angular rate of a body on a unit-radius circular orbit, rad/s.
const KEPLER_K: f32 = 0.12;

#[derive(Debug, Clone)]
struct Moon {
    radius: f32,
    angle: f32,
    rate: f32,
}

/// A planet on an elliptical orbit. `semi_major` is a fraction of the
/// shorter screen side.
#[derive(Debug, Clone)]
pub struct OrbitBody {
    pub semi_major: f32,
    pub eccentricity: f32,
    pub anomaly: f32,
    pub size: f32,
    pub hue: f32,
    moons: Vec<Moon>,
    trail: VecDeque<Point>,
}

impl OrbitBody {
    /// Mean motion from Kepler's third law: `n ∝ a^-1.5`.
    pub fn mean_motion(&self) -> f32 {
        KEPLER_K * self.semi_major.max(0.01).powf(-1.5)
    }

    /// Orbital radius at the current true anomaly.
    pub fn radius(&self) -> f32 {
        let e = self.eccentricity;
        self.semi_major * (1.0 - e * e) / (1.0 + e * self.anomaly.cos())
    }

    /// Rate of change of the true anomaly; faster near periapsis.
    pub fn angular_rate(&self) -> f32 {
        let e = self.eccentricity;
        let k = 1.0 + e * self.anomaly.cos();
        self.mean_motion() * k * k / (1.0 - e * e).powf(1.5)
    }

    fn step(&mut self, dt: f32) {
        self.anomaly = (self.anomaly + self.angular_rate() * dt).rem_euclid(TAU);
        for m in &mut self.moons {
            m.angle = (m.angle + m.rate * dt).rem_euclid(TAU);
        }
    }
}

/// Sun with planets and moons; energy scales simulated time.
pub struct OrbitSceneState {
    bodies: Vec<OrbitBody>,
    sun_pulse: f32,
}

impl OrbitSceneState {
    pub(super) fn new() -> Self {
        let count = 4 + fastrand::usize(..3);
        let bodies = (0..count)
            .map(|i| {
                let a = 0.12 + 0.07 * i as f32 + fastrand::f32() * 0.02;
                let moons = (0..fastrand::usize(..3))
                    .map(|_| Moon {
                        radius: 0.015 + fastrand::f32() * 0.015,
                        angle: fastrand::f32() * TAU,
                        rate: 1.5 + fastrand::f32() * 2.0,
                    })
                    .collect();
                OrbitBody {
                    semi_major: a,
                    eccentricity: fastrand::f32() * 0.25,
                    anomaly: fastrand::f32() * TAU,
                    size: 0.008 + fastrand::f32() * 0.012,
                    hue: fastrand::f32(),
                    moons,
                    trail: VecDeque::with_capacity(TRAIL_POINTS),
                }
            })
            .collect();
        Self {
            bodies,
            sun_pulse: 0.0,
        }
    }

    pub fn bodies(&self) -> &[OrbitBody] {
        &self.bodies
    }

    pub(super) fn advance(
        &mut self,
        _spectrum: &SmoothedSpectrum,
        ctx: &EngineContext,
        dt: f32,
    ) -> DrawList {
        let time_scale = 0.3 + ctx.energy * 1.7;
        self.sun_pulse = self.sun_pulse * 0.85 + ctx.bass * 0.15;
        let c = ctx.center();
        let scale = ctx.min_dim();

        let mut list = backdrop(ctx, Rgba::rgb(2, 2, 6));
        for body in &mut self.bodies {
            body.step(dt * time_scale);
            let r = body.radius() * scale;
            let at = Point::new(c.x + body.anomaly.cos() * r, c.y + body.anomaly.sin() * r);
            if body.trail.len() == TRAIL_POINTS {
                body.trail.pop_front();
            }
            body.trail.push_back(at);

            list.ring(c, body.semi_major * scale, 1.0, Rgba::rgb(24, 26, 36));
            let trail: Vec<Point> = body.trail.iter().copied().collect();
            list.polyline(trail, false, 1.0, ctx.scheme.color(body.hue, 0.4).with_alpha(0.5));
            list.circle(at, body.size * scale * (1.0 + ctx.mid * 0.4), ctx.scheme.color(body.hue, 0.9));
            for m in &body.moons {
                let mp = Point::new(
                    at.x + m.angle.cos() * m.radius * scale,
                    at.y + m.angle.sin() * m.radius * scale,
                );
                list.circle(mp, (scale * 0.004).max(1.0), Rgba::rgb(190, 190, 200));
            }
        }
        let sun_r = scale * (0.04 + self.sun_pulse * 0.03);
        list.circle(c, sun_r * 1.6, Rgba::rgb(255, 160, 40).with_alpha(0.25));
        list.circle(c, sun_r, Rgba::rgb(255, 210, 90));
        list
    }
}
