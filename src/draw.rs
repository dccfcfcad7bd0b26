use crate::error::DrawError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn from_rgb(c: [u8; 3]) -> Self {
        Self::rgb(c[0], c[1], c[2])
    }

    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            a: (alpha.clamp(0.0, 1.0) * 255.0) as u8,
            ..self
        }
    }

    pub fn scaled(self, k: f32) -> Self {
        let k = k.clamp(0.0, 4.0);
        Self {
            r: (self.r as f32 * k).min(255.0) as u8,
            g: (self.g as f32 * k).min(255.0) as u8,
            b: (self.b as f32 * k).min(255.0) as u8,
            a: self.a,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Backend-neutral drawing primitive. Coordinates are surface pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Rgba),
    FillRect { x: f32, y: f32, w: f32, h: f32, color: Rgba },
    Line { from: Point, to: Point, width: f32, color: Rgba },
    Polyline { points: Vec<Point>, closed: bool, width: f32, color: Rgba },
    FillCircle { center: Point, radius: f32, color: Rgba },
    StrokeCircle { center: Point, radius: f32, width: f32, color: Rgba },
    /// One character cell; `size` is the cell height in pixels.
    Glyph { at: Point, ch: char, size: f32, color: Rgba },
    Text { at: Point, text: String, size: f32, color: Rgba },
    VerticalGradient { x: f32, y: f32, w: f32, h: f32, top: Rgba, bottom: Rgba },
}

impl DrawCommand {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Clear(_) => "clear",
            Self::FillRect { .. } => "fill_rect",
            Self::Line { .. } => "line",
            Self::Polyline { .. } => "polyline",
            Self::FillCircle { .. } => "fill_circle",
            Self::StrokeCircle { .. } => "stroke_circle",
            Self::Glyph { .. } => "glyph",
            Self::Text { .. } => "text",
            Self::VerticalGradient { .. } => "vertical_gradient",
        }
    }
}

/// Ordered draw instructions produced by one animator step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            commands: Vec::with_capacity(n),
        }
    }

    pub fn push(&mut self, cmd: DrawCommand) {
        self.commands.push(cmd);
    }

    pub fn clear(&mut self, color: Rgba) {
        self.push(DrawCommand::Clear(color));
    }

    pub fn rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba) {
        self.push(DrawCommand::FillRect { x, y, w, h, color });
    }

    pub fn line(&mut self, from: Point, to: Point, width: f32, color: Rgba) {
        self.push(DrawCommand::Line { from, to, width, color });
    }

    pub fn polyline(&mut self, points: Vec<Point>, closed: bool, width: f32, color: Rgba) {
        if points.len() >= 2 {
            self.push(DrawCommand::Polyline { points, closed, width, color });
        }
    }

    pub fn circle(&mut self, center: Point, radius: f32, color: Rgba) {
        self.push(DrawCommand::FillCircle { center, radius, color });
    }

    pub fn ring(&mut self, center: Point, radius: f32, width: f32, color: Rgba) {
        self.push(DrawCommand::StrokeCircle { center, radius, width, color });
    }

    pub fn glyph(&mut self, at: Point, ch: char, size: f32, color: Rgba) {
        self.push(DrawCommand::Glyph { at, ch, size, color });
    }

    pub fn text(&mut self, at: Point, text: impl Into<String>, size: f32, color: Rgba) {
        self.push(DrawCommand::Text {
            at,
            text: text.into(),
            size,
            color,
        });
    }

    pub fn gradient(&mut self, x: f32, y: f32, w: f32, h: f32, top: Rgba, bottom: Rgba) {
        self.push(DrawCommand::VerticalGradient { x, y, w, h, top, bottom });
    }

    pub fn extend(&mut self, other: DrawList) {
        self.commands.extend(other.commands);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DrawCommand> {
        self.commands.iter()
    }
}

impl<'a> IntoIterator for &'a DrawList {
    type Item = &'a DrawCommand;
    type IntoIter = std::slice::Iter<'a, DrawCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}

/// The externally supplied drawing context.
pub trait DrawSurface {
    fn size(&self) -> (usize, usize);
    fn execute(&mut self, cmd: &DrawCommand) -> Result<(), DrawError>;
    /// Blits an RGBA8 buffer over the whole surface, scaling as needed.
    fn blit_rgba(&mut self, pixels: &[u8], w: usize, h: usize) -> Result<(), DrawError>;

    fn execute_all(&mut self, list: &DrawList) -> Result<(), DrawError> {
        for cmd in list {
            self.execute(cmd)?;
        }
        Ok(())
    }
}
