//! Frame driver for the active visualizer.

use std::time::{Duration, Instant};

use crate::config::VisualizerSettings;
use crate::visualizer::{AnimationState, RendererKind, RendererRegistry, Surface};

/// Pull-based access to the latest frequency magnitudes.
pub trait SampleSource {
    /// The newest magnitude snapshot, or `None` when nothing changed since
    /// the previous call.
    fn poll_frequency_data(&mut self) -> Option<&[u8]>;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A frame was drawn; `fresh` is false when the previous snapshot was
    /// reused.
    Drawn { fresh: bool },
    /// The session is inactive; nothing was polled or drawn.
    Skipped,
    /// The loop was halted and will not draw again.
    Halted,
}

pub struct RenderLoop {
    registry: RendererRegistry,
    kind: RendererKind,
    elements: usize,
    state: AnimationState,
    snapshot: Vec<u8>,
    frame_interval: Duration,
    next_frame: Option<Instant>,
    halted: bool,
}

impl RenderLoop {
    pub fn new(kind: RendererKind, elements: usize, fps: u32) -> Self {
        Self {
            registry: RendererRegistry::default(),
            kind,
            elements,
            state: AnimationState::new(elements),
            snapshot: Vec::new(),
            frame_interval: Duration::from_secs_f64(1.0 / f64::from(fps.max(1))),
            next_frame: None,
            halted: false,
        }
    }

    pub fn from_settings(settings: &VisualizerSettings) -> Self {
        Self::new(settings.renderer, settings.elements, settings.fps)
    }

    pub fn kind(&self) -> RendererKind {
        self.kind
    }

    pub fn elements(&self) -> usize {
        self.elements
    }

    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    /// Swap the active renderer. The incoming renderer starts from rest.
    pub fn set_renderer(&mut self, kind: RendererKind) {
        if kind == self.kind {
            return;
        }
        tracing::info!(from = %self.kind, to = %kind, "visualizer switched");
        self.kind = kind;
        self.state = AnimationState::new(self.elements);
    }

    pub fn cycle_renderer(&mut self) -> RendererKind {
        self.set_renderer(self.kind.next());
        self.kind
    }

    /// Change the bucket count; the animation arrays reset when it differs.
    pub fn set_element_count(&mut self, elements: usize) {
        let elements = elements.clamp(1, 512);
        if elements == self.elements {
            return;
        }
        tracing::debug!(from = self.elements, to = elements, "visualizer element count changed");
        self.elements = elements;
        self.state = AnimationState::new(elements);
    }

    pub fn frame_due(&self, now: Instant) -> bool {
        !self.halted && self.next_frame.is_none_or(|at| now >= at)
    }

    /// How long the caller may sleep before the next frame is due.
    pub fn time_until_next_frame(&self, now: Instant) -> Option<Duration> {
        if self.halted {
            return None;
        }
        Some(
            self.next_frame
                .map_or(Duration::ZERO, |at| at.saturating_duration_since(now)),
        )
    }

    /// Stop drawing for good.
    pub fn halt(&mut self) {
        if !self.halted {
            tracing::debug!("render loop halted");
        }
        self.halted = true;
    }

    /// Draw one frame with the newest samples, or the previous snapshot when
    /// the source has nothing new so the animation keeps settling.
    pub fn tick(
        &mut self,
        now: Instant,
        source: &mut dyn SampleSource,
        session_active: bool,
        surface: &mut dyn Surface,
    ) -> FrameOutcome {
        if self.halted {
            return FrameOutcome::Halted;
        }
        if !session_active {
            self.next_frame = None;
            return FrameOutcome::Skipped;
        }

        let fresh = match source.poll_frequency_data() {
            Some(data) => {
                self.snapshot.clear();
                self.snapshot.extend_from_slice(data);
                true
            }
            None => false,
        };

        surface.begin_frame();
        self.registry
            .lookup(self.kind)
            .render(&self.snapshot, self.elements, &mut self.state, surface);
        self.next_frame = Some(now + self.frame_interval);
        FrameOutcome::Drawn { fresh }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::visualizer::{DisplayList, DrawOp};

    /// Hands out a scripted sequence of snapshots, one per poll.
    #[derive(Default)]
    struct Scripted {
        script: VecDeque<Option<Vec<u8>>>,
        current: Vec<u8>,
        polls: usize,
    }

    impl Scripted {
        fn new(script: impl IntoIterator<Item = Option<Vec<u8>>>) -> Self {
            Self {
                script: script.into_iter().collect(),
                ..Self::default()
            }
        }
    }

    impl SampleSource for Scripted {
        fn poll_frequency_data(&mut self) -> Option<&[u8]> {
            self.polls += 1;
            match self.script.pop_front().flatten() {
                Some(next) => {
                    self.current = next;
                    Some(self.current.as_slice())
                }
                None => None,
            }
        }
    }

    fn surface() -> DisplayList {
        DisplayList::new(200.0, 100.0)
    }

    #[test]
    fn reuses_the_last_snapshot_when_nothing_new_arrives() {
        let mut rl = RenderLoop::new(RendererKind::Bars, 8, 60);
        let mut src = Scripted::new([Some(vec![255; 8]), None, None]);
        let mut out = surface();
        let now = Instant::now();

        assert_eq!(rl.tick(now, &mut src, true, &mut out), FrameOutcome::Drawn { fresh: true });
        let after_first = rl.state().heights[0];
        assert_eq!(rl.tick(now, &mut src, true, &mut out), FrameOutcome::Drawn { fresh: false });
        // The spring keeps moving towards the reused target.
        assert!(rl.state().heights[0] > after_first);
        assert_eq!(rl.tick(now, &mut src, true, &mut out), FrameOutcome::Drawn { fresh: false });
        assert_eq!(src.polls, 3);
    }

    #[test]
    fn inactive_session_skips_all_work() {
        let mut rl = RenderLoop::new(RendererKind::Bars, 8, 60);
        let mut src = Scripted::new([Some(vec![255; 8])]);
        let mut out = surface();

        assert_eq!(rl.tick(Instant::now(), &mut src, false, &mut out), FrameOutcome::Skipped);
        assert_eq!(src.polls, 0);
        assert!(out.is_empty());
        assert!(rl.state().is_settled(0.0));
    }

    #[test]
    fn halted_loop_never_draws_again() {
        let mut rl = RenderLoop::new(RendererKind::Wave, 8, 60);
        let mut src = Scripted::new([Some(vec![100; 8]), Some(vec![100; 8])]);
        let mut out = surface();
        let now = Instant::now();

        rl.tick(now, &mut src, true, &mut out);
        rl.halt();
        assert!(!rl.frame_due(now + Duration::from_secs(1)));
        assert_eq!(rl.time_until_next_frame(now), None);

        let ops_before = out.ops().len();
        assert_eq!(rl.tick(now, &mut src, true, &mut out), FrameOutcome::Halted);
        assert_eq!(src.polls, 1);
        assert_eq!(out.ops().len(), ops_before);
    }

    #[test]
    fn switching_renderer_starts_from_rest() {
        let mut rl = RenderLoop::new(RendererKind::Bars, 16, 60);
        let mut src = Scripted::new(vec![Some(vec![255; 64])]);
        let mut out = surface();
        for _ in 0..5 {
            rl.tick(Instant::now(), &mut src, true, &mut out);
        }
        assert!(!rl.state().is_settled(0.0));

        assert_eq!(rl.cycle_renderer(), RendererKind::Radial);
        assert_eq!(rl.state(), &AnimationState::new(16));

        // The reused snapshot drives the new renderer from zero.
        rl.tick(Instant::now(), &mut src, true, &mut out);
        assert!(matches!(out.ops().first(), Some(DrawOp::FillRect { .. })));
        assert!(rl.state().heights.iter().all(|&h| h > 0.0));
    }

    #[test]
    fn element_count_change_resets_arrays() {
        let mut rl = RenderLoop::new(RendererKind::Bars, 16, 60);
        let mut src = Scripted::new([Some(vec![200; 64])]);
        let mut out = surface();
        rl.tick(Instant::now(), &mut src, true, &mut out);

        rl.set_element_count(16);
        assert!(!rl.state().is_settled(0.0));

        rl.set_element_count(32);
        assert_eq!(rl.elements(), 32);
        assert_eq!(rl.state(), &AnimationState::new(32));
        rl.set_element_count(0);
        assert_eq!(rl.elements(), 1);
    }

    #[test]
    fn frames_are_paced_to_the_configured_rate() {
        let mut rl = RenderLoop::new(RendererKind::Bars, 4, 50);
        let mut src = Scripted::default();
        let mut out = surface();
        let t0 = Instant::now();

        assert!(rl.frame_due(t0));
        rl.tick(t0, &mut src, true, &mut out);
        assert!(!rl.frame_due(t0 + Duration::from_millis(10)));
        assert!(rl.frame_due(t0 + Duration::from_millis(20)));
        assert_eq!(
            rl.time_until_next_frame(t0 + Duration::from_millis(5)),
            Some(Duration::from_millis(15))
        );
    }
}
