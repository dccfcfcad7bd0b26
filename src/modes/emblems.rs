use super::{backdrop, tick_scale, EngineContext};
use crate::draw::{DrawList, Point, Rgba};
use crate::governor::rebalance;
use crate::spectrum::SmoothedSpectrum;
use std::f32::consts::{PI, TAU};

fn star_polygon(c: Point, r: f32, points: usize, skip: usize, rot: f32) -> Vec<Point> {
    (0..points)
        .map(|k| {
            let a = rot + TAU * ((k * skip) % points) as f32 / points as f32;
            Point::new(c.x + a.cos() * r, c.y + a.sin() * r)
        })
        .collect()
}

struct Spark {
    angle: f32,
    radius: f32,
    speed: f32,
    life: f32,
}

/// Rotating seven-point star sigil ringed by orbiting sparks.
pub struct FactionAState {
    rotation: f32,
    pulse: f32,
    sparks: Vec<Spark>,
}

impl FactionAState {
    pub(super) fn new() -> Self {
        Self {
            rotation: fastrand::f32() * TAU,
            pulse: 0.0,
            sparks: Vec::new(),
        }
    }

    pub(super) fn advance(
        &mut self,
        _spectrum: &SmoothedSpectrum,
        ctx: &EngineContext,
        dt: f32,
    ) -> DrawList {
        self.rotation = (self.rotation + dt * (0.2 + ctx.mid)).rem_euclid(TAU);
        self.pulse = (self.pulse * 0.9).max(ctx.bass);
        if ctx.transient > 0.03 && self.sparks.len() < 32 {
            for _ in 0..3 {
                self.sparks.push(Spark {
                    angle: fastrand::f32() * TAU,
                    radius: 1.2 + fastrand::f32() * 0.3,
                    speed: 0.6 + fastrand::f32() * 1.2,
                    life: 1.0,
                });
            }
        }
        for s in &mut self.sparks {
            s.angle = (s.angle + s.speed * dt).rem_euclid(TAU);
            s.life -= dt * 0.4;
        }
        self.sparks.retain(|s| s.life > 0.0);

        let mut list = backdrop(ctx, Rgba::rgb(10, 2, 2));
        let c = ctx.center();
        let r = ctx.min_dim() * (0.3 + self.pulse * 0.06);
        let hot = ctx.scheme.color(0.02 + ctx.phase * 0.01, 0.6 + self.pulse * 0.4);
        list.circle(c, r * 1.1, hot.scaled(0.25));
        list.ring(c, r * 1.1, 3.0, hot);
        list.polyline(star_polygon(c, r, 7, 3, self.rotation), true, 3.0, hot);
        list.polyline(
            star_polygon(c, r * 0.45, 7, 2, -self.rotation * 1.5),
            true,
            2.0,
            hot.scaled(0.8),
        );
        for s in &self.sparks {
            let rr = s.radius * r;
            let p = Point::new(c.x + s.angle.cos() * rr, c.y + s.angle.sin() * rr);
            list.circle(p, 1.0 + self.pulse * 2.5, hot.with_alpha(s.life));
        }
        list
    }
}

struct Shard {
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    life: f32,
}

/// Counter-rotating nested triangles with a sweeping beam.
pub struct FactionBState {
    spin: f32,
    beam: f32,
    shards: Vec<Shard>,
}

impl FactionBState {
    pub(super) fn new() -> Self {
        Self {
            spin: fastrand::f32() * TAU,
            beam: 0.0,
            shards: Vec::new(),
        }
    }

    pub(super) fn advance(
        &mut self,
        _spectrum: &SmoothedSpectrum,
        ctx: &EngineContext,
        dt: f32,
    ) -> DrawList {
        self.spin = (self.spin + dt * (0.3 + ctx.treble * 2.0)).rem_euclid(TAU);
        self.beam = (self.beam + dt * (0.8 + ctx.energy * 3.0)).rem_euclid(TAU);
        if ctx.treble > 0.25 && self.shards.len() < 48 && fastrand::f32() < ctx.treble {
            for _ in 0..4 {
                let a = fastrand::f32() * TAU;
                let v = 0.2 + fastrand::f32() * 0.4;
                self.shards.push(Shard {
                    x: 0.5,
                    y: 0.5,
                    vx: a.cos() * v,
                    vy: a.sin() * v,
                    life: 1.0,
                });
            }
        }
        for s in &mut self.shards {
            s.x += s.vx * dt;
            s.y += s.vy * dt;
            s.life -= dt;
        }
        self.shards.retain(|s| s.life > 0.0);

        let mut list = backdrop(ctx, Rgba::rgb(2, 4, 12));
        let c = ctx.center();
        let r = ctx.min_dim() * (0.32 + ctx.bass * 0.05);
        let cold = ctx.scheme.color(0.6, 0.5 + ctx.energy * 0.5);
        for k in 0..3 {
            let dir = if k % 2 == 0 { 1.0 } else { -1.0 };
            let rr = r * (1.0 - k as f32 * 0.3);
            list.polyline(
                star_polygon(c, rr, 3, 1, self.spin * dir - PI / 2.0),
                true,
                2.5 - k as f32 * 0.5,
                cold.scaled(1.0 - k as f32 * 0.2),
            );
        }
        let (s, co) = self.beam.sin_cos();
        list.line(c, Point::new(c.x + co * r * 1.3, c.y + s * r * 1.3), 2.0, cold.with_alpha(0.7));
        for sh in &self.shards {
            list.rect(sh.x * ctx.width, sh.y * ctx.height, 2.0, 2.0, cold.with_alpha(sh.life));
        }
        list
    }
}

const CRAWL_TEXT: &[&str] = &[
    "EPISODE {N}",
    "",
    "A SIGNAL IN THE NOISE",
    "",
    "Across the spectrum a low",
    "pulse rises from the bass,",
    "carrying an old rhythm",
    "through the empty bands.",
    "",
    "The meters wake. The bars",
    "climb toward the ceiling",
    "and the peaks hold on",
    "a moment longer than",
    "they should.",
];

/// Perspective text crawl over a quiet star backdrop.
pub struct CrawlState {
    offset: f32,
    lines: Vec<String>,
    stars: Vec<Point>,
}

impl CrawlState {
    pub(super) fn new(stars: usize) -> Self {
        let episode = ["I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX"][fastrand::usize(..9)];
        let lines = CRAWL_TEXT
            .iter()
            .map(|l| l.replace("{N}", episode))
            .collect();
        let mut state = Self {
            offset: 0.0,
            lines,
            stars: Vec::new(),
        };
        state.rebalance(stars);
        state
    }

    pub(super) fn rebalance(&mut self, target: usize) {
        rebalance(&mut self.stars, target, || Point::new(fastrand::f32(), fastrand::f32()));
    }

    pub(super) fn advance(
        &mut self,
        _spectrum: &SmoothedSpectrum,
        ctx: &EngineContext,
        dt: f32,
    ) -> DrawList {
        self.offset += 0.012 * tick_scale(dt) * (1.0 + ctx.energy);
        let spacing = 0.11;
        let span = self.lines.len() as f32 * spacing + 1.2;
        if self.offset > span {
            self.offset = 0.0;
        }

        let mut list = backdrop(ctx, Rgba::BLACK);
        for s in &self.stars {
            list.rect(s.x * ctx.width, s.y * ctx.height, 1.0, 1.0, Rgba::rgb(180, 180, 190));
        }
        let horizon = ctx.height * 0.12;
        let color = Rgba::rgb(240, 200, 70);
        for (i, line) in self.lines.iter().enumerate() {
            // Depth 0 is the bottom edge, 1 the vanishing point.
            let depth = self.offset - i as f32 * spacing;
            if !(0.0..1.0).contains(&depth) || line.is_empty() {
                continue;
            }
            let persp = 1.0 - depth;
            let y = horizon + (ctx.height - horizon) * persp * persp;
            let size = (ctx.height * 0.06 * persp).max(3.0);
            let w = line.chars().count() as f32 * size * 0.75;
            let fade = (persp * 2.0).min(1.0);
            list.text(Point::new((ctx.width - w) * 0.5, y - size), line.as_str(), size, color.with_alpha(fade));
        }
        list
    }
}
