use super::bars::{background, bucket_color, contour_color, peak_color};
use super::dynamics::{AnimationState, TARGET_SCALE, decimate};
use super::registry::{Renderer, RendererKind};
use super::surface::{Gradient, Paint, Point, Rect, Surface};

/// Filled contour mirrored around the horizontal centre line.
#[derive(Debug, Default)]
pub struct Wave;

impl Renderer for Wave {
    fn kind(&self) -> RendererKind {
        RendererKind::Wave
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
        let half = height / 2.0;

        let buckets = decimate(samples, elements);
        state.step(&buckets, half);

        background(surface);
        if elements == 0 || width <= 0.0 || height <= 0.0 {
            return;
        }

        let slot = width / elements as f32;
        let x = |i: usize| i as f32 * slot + slot / 2.0;

        for (i, &sample) in buckets.iter().enumerate() {
            let amplitude = state.heights[i].min(half);
            if amplitude <= 0.0 {
                continue;
            }
            let color = bucket_color(i, elements, sample);
            let column = Rect::new(i as f32 * slot, half - amplitude, slot, amplitude * 2.0);
            surface.fill_rect(
                column,
                &Paint::Linear(Gradient::vertical(
                    column,
                    vec![
                        (0.0, color.with_alpha(0.25)),
                        (0.5, color),
                        (1.0, color.with_alpha(0.25)),
                    ],
                )),
            );
        }

        let marker = Paint::Solid(peak_color());
        for (i, &peak) in state.peaks.iter().enumerate() {
            if peak <= 0.0 {
                continue;
            }
            let offset = peak * half * TARGET_SCALE;
            let left = i as f32 * slot;
            surface.fill_rect(Rect::new(left, half - offset - 1.0, slot, 1.0), &marker);
            surface.fill_rect(Rect::new(left, half + offset, slot, 1.0), &marker);
        }

        if elements > 1 {
            let upper: Vec<Point> = (0..elements)
                .map(|i| Point::new(x(i), half - state.heights[i].min(half)))
                .collect();
            let lower: Vec<Point> = (0..elements)
                .map(|i| Point::new(x(i), half + state.heights[i].min(half)))
                .collect();
            surface.stroke_path(&upper, 1.5, contour_color());
            surface.stroke_path(&lower, 1.5, contour_color());
        }
    }
}
