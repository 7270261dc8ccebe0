//! Immediate-mode 2D drawing primitives used by renderers.
//!
//! Coordinates are in surface pixels with the origin at the top-left corner
//! and `y` growing downwards.

/// Straight-alpha colour. `a` is in `0.0..=1.0`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    pub fn lerp(self, other: Rgba, t: f32) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8;
        Rgba {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: self.a + (other.a - self.a) * t,
        }
    }

    /// Composite over an opaque backdrop.
    pub fn over(self, backdrop: Rgba) -> Rgba {
        let opaque = Rgba {
            a: 1.0,
            ..self
        };
        backdrop.lerp(opaque, self.a).with_alpha(1.0)
    }
}

/// Opaque colour from hue (degrees), saturation and lightness (`0.0..=1.0`).
pub fn hsl(h: f32, s: f32, l: f32) -> Rgba {
    hsla(h, s, l, 1.0)
}

pub fn hsla(h: f32, s: f32, l: f32, a: f32) -> Rgba {
    let h = h.rem_euclid(360.0) / 60.0;
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    let channel = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba {
        r: channel(r),
        g: channel(g),
        b: channel(b),
        a: a.clamp(0.0, 1.0),
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }
}

/// Linear gradient between two points with colour stops at offsets
/// `0.0..=1.0` along the axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    pub from: Point,
    pub to: Point,
    pub stops: Vec<(f32, Rgba)>,
}

impl Gradient {
    /// Top-to-bottom gradient across `rect`.
    pub fn vertical(rect: Rect, stops: Vec<(f32, Rgba)>) -> Self {
        Self {
            from: Point::new(rect.x, rect.y),
            to: Point::new(rect.x, rect.bottom()),
            stops,
        }
    }

    /// Colour at offset `t` along the gradient axis.
    pub fn at(&self, t: f32) -> Rgba {
        let Some(&(first_offset, first)) = self.stops.first() else {
            return Rgba::rgb(0, 0, 0).with_alpha(0.0);
        };
        if t <= first_offset {
            return first;
        }
        for pair in self.stops.windows(2) {
            let (o0, c0) = pair[0];
            let (o1, c1) = pair[1];
            if t <= o1 {
                let span = o1 - o0;
                return if span <= f32::EPSILON {
                    c1
                } else {
                    c0.lerp(c1, (t - o0) / span)
                };
            }
        }
        self.stops.last().map_or(first, |&(_, c)| c)
    }

    /// Colour at a point, projected onto the gradient axis.
    pub fn at_point(&self, p: Point) -> Rgba {
        let dx = self.to.x - self.from.x;
        let dy = self.to.y - self.from.y;
        let len2 = dx * dx + dy * dy;
        if len2 <= f32::EPSILON {
            return self.at(0.0);
        }
        let t = ((p.x - self.from.x) * dx + (p.y - self.from.y) * dy) / len2;
        self.at(t.clamp(0.0, 1.0))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Rgba),
    Linear(Gradient),
}

impl Paint {
    pub fn color_at(&self, p: Point) -> Rgba {
        match self {
            Paint::Solid(c) => *c,
            Paint::Linear(g) => g.at_point(p),
        }
    }
}

impl From<Rgba> for Paint {
    fn from(color: Rgba) -> Self {
        Paint::Solid(color)
    }
}

/// Raw drawing surface. No retained scene graph; each call draws over
/// whatever is already there.
pub trait Surface {
    /// Called once before each frame is drawn.
    fn begin_frame(&mut self) {}
    fn width(&self) -> f32;
    fn height(&self) -> f32;
    fn fill_rect(&mut self, rect: Rect, paint: &Paint);
    /// Filled circular sector; angles in radians, clockwise from +x.
    fn fill_arc(&mut self, center: Point, radius: f32, start: f32, end: f32, paint: &Paint);
    fn stroke_path(&mut self, points: &[Point], width: f32, color: Rgba);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    FillRect {
        rect: Rect,
        paint: Paint,
    },
    FillArc {
        center: Point,
        radius: f32,
        start: f32,
        end: f32,
        paint: Paint,
    },
    StrokePath {
        points: Vec<Point>,
        width: f32,
        color: Rgba,
    },
}

/// Surface that records draw calls for a backend to replay later.
#[derive(Debug, Clone, Default)]
pub struct DisplayList {
    width: f32,
    height: f32,
    ops: Vec<DrawOp>,
}

impl DisplayList {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl Surface for DisplayList {
    fn begin_frame(&mut self) {
        self.ops.clear();
    }

    fn width(&self) -> f32 {
        self.width
    }

    fn height(&self) -> f32 {
        self.height
    }

    fn fill_rect(&mut self, rect: Rect, paint: &Paint) {
        self.ops.push(DrawOp::FillRect {
            rect,
            paint: paint.clone(),
        });
    }

    fn fill_arc(&mut self, center: Point, radius: f32, start: f32, end: f32, paint: &Paint) {
        self.ops.push(DrawOp::FillArc {
            center,
            radius,
            start,
            end,
            paint: paint.clone(),
        });
    }

    fn stroke_path(&mut self, points: &[Point], width: f32, color: Rgba) {
        self.ops.push(DrawOp::StrokePath {
            points: points.to_vec(),
            width,
            color,
        });
    }
}
