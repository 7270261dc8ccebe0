//! Spectrum visualizers.
//!
//! Each style implements [`Renderer`]: a frame is a function of the latest
//! frequency magnitudes, the surface size and the per-bucket
//! [`AnimationState`]. Drawing goes through the [`Surface`] trait; the
//! terminal UI replays a recorded [`DisplayList`].

mod bars;
mod dynamics;
mod radial;
mod registry;
mod surface;
mod wave;

pub use bars::bucket_color;
pub use dynamics::{AnimationState, decimate};
pub use registry::{Renderer, RendererKind, RendererRegistry, UnknownRenderer};
pub use surface::*;
