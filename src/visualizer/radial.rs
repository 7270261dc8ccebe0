use std::f32::consts::{FRAC_PI_2, TAU};

use super::bars::{background, bucket_color, contour_color, peak_color};
use super::dynamics::{AnimationState, TARGET_SCALE, decimate};
use super::registry::{Renderer, RendererKind};
use super::surface::{Paint, Point, Rgba, Surface, hsla};

const INNER_RATIO: f32 = 0.18;
const SPOKE_RATIO: f32 = 0.30;

/// Spokes radiating from a glowing hub.
#[derive(Debug, Default)]
pub struct Radial;

impl Renderer for Radial {
    fn kind(&self) -> RendererKind {
        RendererKind::Radial
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
        let side = width.min(height);
        let inner = side * INNER_RATIO;
        let reach = side * SPOKE_RATIO;

        let buckets = decimate(samples, elements);
        state.step(&buckets, reach);

        background(surface);
        if elements == 0 || side <= 0.0 {
            return;
        }

        let center = Point::new(width / 2.0, height / 2.0);
        let at = |i: usize, radius: f32| {
            let angle = i as f32 / elements as f32 * TAU - FRAC_PI_2;
            Point::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
        };

        let energy = state.heights.iter().sum::<f32>() / (elements as f32 * reach.max(1.0));
        surface.fill_arc(
            center,
            inner * 0.9,
            0.0,
            TAU,
            &Paint::Solid(hsla(220.0, 0.6, 0.2 + 0.3 * energy.min(1.0), 0.9)),
        );

        let spoke_width = (TAU * inner / elements as f32 * 0.6).max(1.0);
        for (i, &sample) in buckets.iter().enumerate() {
            let length = state.heights[i].min(reach);
            if length <= 0.0 {
                continue;
            }
            let color = bucket_color(i, elements, sample);
            surface.stroke_path(&[at(i, inner), at(i, inner + length)], spoke_width, color);
        }

        let marker = Paint::Solid(peak_color());
        for (i, &peak) in state.peaks.iter().enumerate() {
            if peak <= 0.0 {
                continue;
            }
            let tip = at(i, inner + peak * reach * TARGET_SCALE + 1.5);
            surface.fill_arc(tip, 1.2, 0.0, TAU, &marker);
        }

        if elements > 1 {
            let mut ring: Vec<Point> = (0..elements)
                .map(|i| at(i, inner + state.heights[i].min(reach)))
                .collect();
            ring.push(ring[0]);
            surface.stroke_path(&ring, 1.0, contour_color().lerp(Rgba::rgb(255, 255, 255), 0.2));
        }
    }
}
