use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::bars::Bars;
use super::dynamics::AnimationState;
use super::radial::Radial;
use super::surface::Surface;
use super::wave::Wave;

/// The closed set of visualizer styles.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RendererKind {
    #[default]
    #[serde(alias = "spectrum", alias = "bar")]
    Bars,
    #[serde(alias = "circle")]
    Radial,
    #[serde(alias = "waveform")]
    Wave,
}

impl RendererKind {
    pub const ALL: [RendererKind; 3] = [RendererKind::Bars, RendererKind::Radial, RendererKind::Wave];

    /// Next style in display order, wrapping around.
    pub fn next(self) -> Self {
        match self {
            RendererKind::Bars => RendererKind::Radial,
            RendererKind::Radial => RendererKind::Wave,
            RendererKind::Wave => RendererKind::Bars,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RendererKind::Bars => "bars",
            RendererKind::Radial => "radial",
            RendererKind::Wave => "wave",
        }
    }
}

impl fmt::Display for RendererKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown visualizer `{0}` (expected bars, radial or wave)")]
pub struct UnknownRenderer(pub String);

impl FromStr for RendererKind {
    type Err = UnknownRenderer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bars" | "bar" | "spectrum" => Ok(RendererKind::Bars),
            "radial" | "circle" => Ok(RendererKind::Radial),
            "wave" | "waveform" => Ok(RendererKind::Wave),
            _ => Err(UnknownRenderer(s.to_string())),
        }
    }
}

/// Per-frame contract shared by every visualizer style.
///
/// `render` decimates `samples` to `elements` buckets, advances `state` one
/// frame (resetting it first if its length differs from `elements`) and
/// draws the frame onto `surface`.
pub trait Renderer {
    fn kind(&self) -> RendererKind;
    fn render(
        &self,
        samples: &[u8],
        elements: usize,
        state: &mut AnimationState,
        surface: &mut dyn Surface,
    );
}

/// Lookup from [`RendererKind`] to its renderer.
#[derive(Debug, Default)]
pub struct RendererRegistry {
    bars: Bars,
    radial: Radial,
    wave: Wave,
}

impl RendererRegistry {
    pub fn lookup(&self, kind: RendererKind) -> &dyn Renderer {
        match kind {
            RendererKind::Bars => &self.bars,
            RendererKind::Radial => &self.radial,
            RendererKind::Wave => &self.wave,
        }
    }
}
