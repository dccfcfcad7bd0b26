use super::{backdrop, tick_scale, EngineContext};
use crate::draw::{DrawList, Point, Rgba};
use crate::spectrum::SmoothedSpectrum;

/// Per-tick chance that any one trail character is swapped for another.
pub const RAIN_MUTATION_CHANCE: f32 = 0.03;
/// Trail brightness falls off as `(1 - i / len)^TRAIL_FALLOFF`.
pub const TRAIL_FALLOFF: f32 = 0.6;

const MIN_CELL_PX: f32 = 8.0;

fn random_glyph() -> char {
    // Half-width katakana and digits.
    if fastrand::u8(..5) == 0 {
        char::from(b'0' + fastrand::u8(..10))
    } else {
        char::from_u32(0xFF66 + fastrand::u32(..56)).unwrap_or('0')
    }
}

/// One falling column. `head_y` is in cells and may start above the screen.
#[derive(Debug, Clone, PartialEq)]
pub struct RainColumn {
    pub head_y: f32,
    pub speed: f32,
    pub glyphs: Vec<char>,
}

impl RainColumn {
    fn spawn(rows: usize, scattered: bool) -> Self {
        let rows = rows.max(4);
        let len = 6 + fastrand::usize(..(rows * 3 / 5).max(2));
        let start = if scattered {
            fastrand::f32() * rows as f32
        } else {
            -(fastrand::f32() * rows as f32 * 0.5)
        };
        Self {
            head_y: start,
            speed: 0.3 + fastrand::f32() * 0.9,
            glyphs: (0..len).map(|_| random_glyph()).collect(),
        }
    }

    pub fn trail_len(&self) -> usize {
        self.glyphs.len()
    }

    /// Brightness of the `i`-th character behind the head.
    pub fn trail_level(&self, i: usize) -> f32 {
        let len = self.glyphs.len().max(1) as f32;
        (1.0 - i as f32 / len).max(0.0).powf(TRAIL_FALLOFF)
    }
}

/// Falling glyph columns; bass speeds them up.
pub struct CharacterRainState {
    columns: Vec<RainColumn>,
    cell: f32,
    rows: usize,
}

impl CharacterRainState {
    pub(super) fn new(ctx: &EngineContext) -> Self {
        let mut state = Self {
            columns: Vec::new(),
            cell: MIN_CELL_PX,
            rows: 0,
        };
        state.fit(ctx);
        state
    }

    pub fn columns(&self) -> &[RainColumn] {
        &self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    fn layout(ctx: &EngineContext) -> (f32, usize, usize) {
        let cell = (ctx.height / 40.0).max(MIN_CELL_PX);
        let cols = (ctx.width / (cell * 0.75)).floor().max(1.0) as usize;
        let rows = (ctx.height / cell).ceil().max(1.0) as usize;
        (cell, cols, rows)
    }

    fn fit(&mut self, ctx: &EngineContext) {
        let (cell, cols, rows) = Self::layout(ctx);
        if cols == self.columns.len() && rows == self.rows {
            return;
        }
        self.cell = cell;
        self.rows = rows;
        crate::governor::rebalance(&mut self.columns, cols, || RainColumn::spawn(rows, true));
    }

    pub(super) fn advance(
        &mut self,
        _spectrum: &SmoothedSpectrum,
        ctx: &EngineContext,
        dt: f32,
    ) -> DrawList {
        self.fit(ctx);
        let step = tick_scale(dt) * (1.0 + ctx.bass * 2.0);
        let rows = self.rows;
        for col in &mut self.columns {
            col.head_y += col.speed * step;
            if col.head_y - col.glyphs.len() as f32 > rows as f32 {
                *col = RainColumn::spawn(rows, false);
                continue;
            }
            for g in &mut col.glyphs {
                if fastrand::f32() < RAIN_MUTATION_CHANCE {
                    *g = random_glyph();
                }
            }
        }

        let mut list = backdrop(ctx, Rgba::BLACK);
        let col_w = self.cell * 0.75;
        let level = 0.5 + 0.5 * ctx.energy;
        for (c, col) in self.columns.iter().enumerate() {
            let x = c as f32 * col_w;
            let head = col.head_y.floor();
            for (i, &ch) in col.glyphs.iter().enumerate() {
                let y = (head - i as f32) * self.cell;
                if y < -self.cell || y > ctx.height {
                    continue;
                }
                let color = if i == 0 {
                    Rgba::rgb(220, 255, 220)
                } else {
                    let b = col.trail_level(i) * level;
                    ctx.scheme.color(0.3, b).with_alpha(b)
                };
                list.glyph(Point::new(x, y), ch, self.cell, color);
            }
        }
        list
    }
}
