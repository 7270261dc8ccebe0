//! Bar spectrum: gradient bars on a floor with reflections, peak markers and
//! a contour line across the bar tops.

use super::dynamics::{AnimationState, TARGET_SCALE, decimate, normalized};
use super::registry::{Renderer, RendererKind};
use super::surface::{Gradient, Paint, Point, Rect, Rgba, Surface, hsl, hsla};

pub const HUE_START: f32 = 190.0;
pub const HUE_END: f32 = 330.0;

/// Floor line as a fraction of the canvas height; reflections go below it.
const FLOOR_RATIO: f32 = 0.78;
const REFLECTION_RATIO: f32 = 0.25;
const BAR_FILL: f32 = 0.8;
const PEAK_MARKER_HEIGHT: f32 = 2.0;

/// Colour of bucket `index` of `count` for a sample of `sample`.
///
/// Hue is linear in the index; saturation and lightness grow with loudness.
pub fn bucket_color(index: usize, count: usize, sample: u8) -> Rgba {
    let t = if count > 1 {
        index as f32 / (count - 1) as f32
    } else {
        0.0
    };
    let level = normalized(sample);
    hsl(
        HUE_START + (HUE_END - HUE_START) * t,
        0.55 + 0.45 * level,
        0.35 + 0.30 * level,
    )
}

pub(super) fn background(surface: &mut dyn Surface) {
    let rect = Rect::new(0.0, 0.0, surface.width(), surface.height());
    let paint = Paint::Linear(Gradient::vertical(
        rect,
        vec![(0.0, Rgba::rgb(10, 12, 24)), (1.0, Rgba::rgb(22, 26, 46))],
    ));
    surface.fill_rect(rect, &paint);
}

pub(super) fn peak_color() -> Rgba {
    Rgba::rgb(240, 244, 255).with_alpha(0.9)
}

pub(super) fn contour_color() -> Rgba {
    hsla(260.0, 0.9, 0.78, 0.85)
}

#[derive(Debug, Default)]
pub struct Bars;

impl Renderer for Bars {
    fn kind(&self) -> RendererKind {
        RendererKind::Bars
    }

    fn render(
        &self,
        samples: &[u8],
        elements: usize,
        state: &mut AnimationState,
        surface: &mut dyn Surface,
    ) {
        let width = surface.width();
        let height = surface.height();
        let buckets = decimate(samples, elements);
        state.step(&buckets, height);

        background(surface);
        if elements == 0 || width <= 0.0 || height <= 0.0 {
            return;
        }

        let floor = height * FLOOR_RATIO;
        let slot = width / elements as f32;
        let bar_width = (slot * BAR_FILL).max(1.0);
        let bar_x = |i: usize| i as f32 * slot + (slot - bar_width) / 2.0;
        // Bar heights are tracked against the full canvas; project them onto
        // the space above the floor. Spring overshoot is clipped at the top.
        let drawn = |i: usize| (state.heights[i] * FLOOR_RATIO).min(floor);

        for (i, &sample) in buckets.iter().enumerate() {
            let bar_height = drawn(i);
            if bar_height <= 0.0 {
                continue;
            }
            let color = bucket_color(i, elements, sample);
            let body = Rect::new(bar_x(i), floor - bar_height, bar_width, bar_height);
            surface.fill_rect(
                body,
                &Paint::Linear(Gradient::vertical(
                    body,
                    vec![
                        (0.0, color.lerp(Rgba::rgb(255, 255, 255), 0.35)),
                        (0.5, color),
                        (1.0, color.lerp(Rgba::rgb(0, 0, 0), 0.3)),
                    ],
                )),
            );

            let reflection = Rect::new(body.x, floor, bar_width, bar_height * REFLECTION_RATIO);
            surface.fill_rect(
                reflection,
                &Paint::Linear(Gradient::vertical(
                    reflection,
                    vec![(0.0, color.with_alpha(0.35)), (1.0, color.with_alpha(0.0))],
                )),
            );
        }

        let marker = Paint::Solid(peak_color());
        for (i, &peak) in state.peaks.iter().enumerate() {
            if peak <= 0.0 {
                continue;
            }
            let top = floor - peak * height * TARGET_SCALE * FLOOR_RATIO;
            surface.fill_rect(
                Rect::new(bar_x(i), top - PEAK_MARKER_HEIGHT, bar_width, PEAK_MARKER_HEIGHT),
                &marker,
            );
        }

        if elements > 1 {
            let contour: Vec<Point> = (0..elements)
                .map(|i| Point::new(bar_x(i) + bar_width / 2.0, floor - drawn(i)))
                .collect();
            surface.stroke_path(&contour, 1.5, contour_color());
        }
    }
}
