//! Flattens a recorded [`DisplayList`] into line segments a `ratatui`
//! canvas can draw.
//!
//! Canvas space has `y` growing upwards, so every point is flipped. A
//! braille cell holds one colour, so fills are cut into bands one cell tall
//! and sampled at the band centre.

use ratatui::style::Color;
use ratatui::widgets::canvas::{Context, Line};

use crate::visualizer::{DisplayList, DrawOp, Paint, Point, Rect, Rgba};

/// Dots per terminal cell along each axis with the braille marker.
pub const DOTS_PER_COLUMN: u16 = 2;
pub const DOTS_PER_ROW: u16 = 4;

const DEFAULT_BACKDROP: Rgba = Rgba::rgb(0, 0, 0);
/// Angular resolution cap for sectors.
const MAX_ARC_STEPS: usize = 720;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Segment {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub color: Rgba,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    pub background: Rgba,
    pub segments: Vec<Segment>,
}

impl Scene {
    pub fn from_display_list(list: &DisplayList) -> Self {
        use crate::visualizer::Surface;

        let width = list.width();
        let height = list.height();
        let mut scene = Scene {
            width: f64::from(width),
            height: f64::from(height),
            background: DEFAULT_BACKDROP,
            segments: Vec::new(),
        };

        for op in list.ops() {
            match op {
                DrawOp::FillRect { rect, paint } => {
                    if let Paint::Solid(color) = paint
                        && covers(rect, width, height)
                    {
                        scene.background = color.over(scene.background);
                        scene.segments.clear();
                        continue;
                    }
                    scene.fill_rect(rect, paint);
                }
                DrawOp::FillArc {
                    center,
                    radius,
                    start,
                    end,
                    paint,
                } => scene.fill_arc(*center, *radius, *start, *end, paint),
                DrawOp::StrokePath { points, color, .. } => scene.stroke_path(points, *color),
            }
        }
        scene
    }

    fn flip(&self, y: f32) -> f64 {
        self.height - f64::from(y)
    }

    fn push(&mut self, from: Point, to: Point, color: Rgba) {
        let color = color.over(self.background);
        let segment = Segment {
            x1: f64::from(from.x),
            y1: self.flip(from.y),
            x2: f64::from(to.x),
            y2: self.flip(to.y),
            color,
        };
        self.segments.push(segment);
    }

    fn fill_rect(&mut self, rect: &Rect, paint: &Paint) {
        if rect.w <= 0.0 || rect.h <= 0.0 {
            return;
        }
        let band = f32::from(DOTS_PER_ROW);
        let mut top = rect.y;
        while top < rect.bottom() {
            let bottom = (top + band).min(rect.bottom());
            let mid_y = (top + bottom) / 2.0;
            let mut x = rect.x;
            while x < rect.x + rect.w {
                let color = paint.color_at(Point::new(x, mid_y));
                self.push(Point::new(x, top), Point::new(x, bottom), color);
                x += 1.0;
            }
            top = bottom;
        }
    }

    fn fill_arc(&mut self, center: Point, radius: f32, start: f32, end: f32, paint: &Paint) {
        if radius <= 0.0 {
            return;
        }
        let sweep = end - start;
        let steps = ((sweep.abs() * radius).ceil() as usize).clamp(1, MAX_ARC_STEPS);
        let color = paint.color_at(center);
        for i in 0..=steps {
            let angle = start + sweep * i as f32 / steps as f32;
            let edge = Point::new(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
            );
            self.push(center, edge, color);
        }
    }

    fn stroke_path(&mut self, points: &[Point], color: Rgba) {
        for pair in points.windows(2) {
            self.push(pair[0], pair[1], color);
        }
    }

    /// Draw every segment onto a canvas context.
    pub fn paint(&self, ctx: &mut Context<'_>) {
        for s in &self.segments {
            ctx.draw(&Line::new(s.x1, s.y1, s.x2, s.y2, to_color(s.color)));
        }
    }
}

fn covers(rect: &Rect, width: f32, height: f32) -> bool {
    rect.x <= 0.0 && rect.y <= 0.0 && rect.x + rect.w >= width && rect.bottom() >= height
}

pub fn to_color(c: Rgba) -> Color {
    Color::Rgb(c.r, c.g, c.b)
}
