use std::io;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rodio::{OutputStream, OutputStreamBuilder, Sink};

use crate::config::AudioSettings;
use crate::library::Track;

use super::sink::create_sink_at;
use super::tap::SampleTap;
use super::types::{AudioCmd, AudioError, AudioEvent, PlaybackHandle};

/// How often the thread wakes up to check for track end and refresh elapsed.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Everything the audio thread owns about the loaded track.
struct Deck {
    stream: OutputStream,
    settings: AudioSettings,
    playback: PlaybackHandle,
    tap: SampleTap,
    sink: Option<Sink>,
    track: Option<Track>,
    paused: bool,
    // Track start time and accumulated elapsed when paused.
    started_at: Option<Instant>,
    accumulated: Duration,
}

impl Deck {
    fn elapsed(&self) -> Duration {
        self.accumulated + self.started_at.map_or(Duration::ZERO, |st| st.elapsed())
    }

    fn track_id(&self) -> String {
        self.track.as_ref().map(|t| t.id.clone()).unwrap_or_default()
    }

    fn publish(&self) {
        if let Ok(mut info) = self.playback.lock() {
            info.track_id = self.track.as_ref().map(|t| t.id.clone());
            info.elapsed = self.elapsed();
            info.playing = self.sink.is_some() && !self.paused;
        }
    }

    fn load(&mut self, track: Track, start_at: Duration, autoplay: bool) -> Result<(), AudioError> {
        let new_sink = create_sink_at(&self.stream, &track, start_at, &self.tap)?;
        // Keep the default volume sane even if crossfade is disabled.
        new_sink.set_volume(1.0);

        match self.sink.take() {
            Some(old_sink) if !self.paused && autoplay => self.crossfade(&old_sink, &new_sink),
            Some(old_sink) => old_sink.stop(),
            None => {}
        }

        if autoplay {
            new_sink.play();
            self.started_at = Some(Instant::now());
        } else {
            self.started_at = None;
        }
        tracing::debug!(track = %track.title, ?start_at, autoplay, "track loaded");
        self.sink = Some(new_sink);
        self.track = Some(track);
        self.paused = !autoplay;
        self.accumulated = start_at;
        Ok(())
    }

    fn crossfade(&self, old_sink: &Sink, new_sink: &Sink) {
        let crossfade_ms = self.settings.crossfade_ms;
        if crossfade_ms == 0 {
            // Crossfade disabled: hard swap.
            old_sink.stop();
            return;
        }
        let steps = self.settings.crossfade_steps.max(1);

        old_sink.set_volume(1.0);
        new_sink.set_volume(0.0);
        new_sink.play();

        // Fade volumes in a short blocking loop. This is simple and good enough
        // for a TUI player; audio continues in rodio's mixer thread.
        for step in 1..=steps {
            let t = step as f32 / steps as f32;
            old_sink.set_volume(1.0 - t);
            new_sink.set_volume(t);
            thread::sleep(Duration::from_millis((crossfade_ms / steps).max(1)));
        }
        old_sink.stop();
    }

    fn replay(&mut self) -> Result<(), AudioError> {
        let Some(track) = self.track.take() else {
            return Ok(());
        };
        if let Some(s) = self.sink.take() {
            s.stop();
        }
        self.paused = true;
        self.load(track, Duration::ZERO, true)
    }

    fn stop(&mut self) {
        if let Some(s) = self.sink.take() {
            s.stop();
        }
        self.track = None;
        self.paused = true;
        self.started_at = None;
        self.accumulated = Duration::ZERO;
        self.tap.reset();
    }

    fn toggle_pause(&mut self) {
        let Some(s) = self.sink.as_ref() else {
            return;
        };
        if self.paused {
            s.play();
            self.started_at = Some(Instant::now());
        } else {
            s.pause();
            if let Some(st) = self.started_at.take() {
                self.accumulated += st.elapsed();
            }
        }
        self.paused = !self.paused;
    }

    /// Scrubbing: rebuild the current sink and skip into the file.
    /// This uses `Source::skip_duration` (works for common formats).
    fn seek_by(&mut self, secs: i32) -> Result<(), AudioError> {
        let Some(track) = self.track.as_ref() else {
            return Ok(());
        };
        if self.sink.is_none() {
            return Ok(());
        }

        let cur = self.elapsed().as_secs() as i64;
        let mut target = (cur + i64::from(secs)).max(0) as u64;
        if let Some(total) = track.duration() {
            target = target.min(total.as_secs());
        }
        let new_elapsed = Duration::from_secs(target);

        let new_sink = create_sink_at(&self.stream, track, new_elapsed, &self.tap)?;
        if let Some(s) = self.sink.take() {
            s.stop();
        }
        if self.paused {
            self.started_at = None;
        } else {
            new_sink.play();
            self.started_at = Some(Instant::now());
        }
        self.sink = Some(new_sink);
        self.accumulated = new_elapsed;
        Ok(())
    }

    /// True once the loaded track has played out.
    fn finished(&self) -> bool {
        !self.paused && self.sink.as_ref().is_some_and(Sink::empty)
    }

    fn fade_out(&mut self, fade_out_ms: u64) {
        let Some(sink) = self.sink.take() else {
            return;
        };
        if fade_out_ms > 0 && !self.paused {
            let steps: u64 = 20;
            let step_ms = (fade_out_ms / steps).max(1);
            sink.set_volume(1.0);
            for step in 1..=steps {
                let t = step as f32 / steps as f32;
                sink.set_volume(1.0 - t);
                thread::sleep(Duration::from_millis(step_ms));
            }
        }
        sink.set_volume(0.0);
        sink.stop();
        self.paused = true;
        self.started_at = None;
    }
}

pub(super) fn spawn_audio_thread(
    rx: Receiver<AudioCmd>,
    events: Sender<AudioEvent>,
    playback: PlaybackHandle,
    tap: SampleTap,
    settings: AudioSettings,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("encore-audio".into())
        .spawn(move || {
            let mut stream = match OutputStreamBuilder::open_default_stream() {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::error!(error = %e, "no audio output device");
                    let _ = events.send(AudioEvent::Unavailable(e.to_string()));
                    return;
                }
            };
            // rodio logs to stderr when OutputStream is dropped. That's useful in debugging,
            // but noisy for a TUI app.
            stream.log_on_drop(false);

            let mut deck = Deck {
                stream,
                settings,
                playback,
                tap,
                sink: None,
                track: None,
                paused: true,
                started_at: None,
                accumulated: Duration::ZERO,
            };

            loop {
                let result = match rx.recv_timeout(POLL_INTERVAL) {
                    Ok(AudioCmd::Load {
                        track,
                        start_at,
                        autoplay,
                    }) => {
                        let id = track.id.clone();
                        deck.load(track, start_at, autoplay).map_err(|e| (id, e))
                    }
                    Ok(AudioCmd::Replay) => {
                        let id = deck.track_id();
                        deck.replay().map_err(|e| (id, e))
                    }
                    Ok(AudioCmd::Stop) => {
                        deck.stop();
                        Ok(())
                    }
                    Ok(AudioCmd::TogglePause) => {
                        deck.toggle_pause();
                        Ok(())
                    }
                    Ok(AudioCmd::SeekBy(secs)) => {
                        let id = deck.track_id();
                        deck.seek_by(secs).map_err(|e| (id, e))
                    }
                    Ok(AudioCmd::Quit { fade_out_ms }) => {
                        deck.fade_out(fade_out_ms);
                        deck.publish();
                        break;
                    }
                    Err(RecvTimeoutError::Timeout) => Ok(()),
                    Err(RecvTimeoutError::Disconnected) => break,
                };

                if let Err((track_id, e)) = result {
                    tracing::warn!(track_id = %track_id, error = %e, "playback failed");
                    deck.stop();
                    let _ = events.send(AudioEvent::LoadFailed {
                        track_id,
                        reason: e.to_string(),
                    });
                }

                if deck.finished() {
                    // Keep the track so a replay can reopen it.
                    if let Some(s) = deck.sink.take() {
                        s.stop();
                    }
                    deck.accumulated = deck.elapsed();
                    deck.started_at = None;
                    deck.paused = true;
                    let _ = events.send(AudioEvent::TrackEnded {
                        track_id: deck.track_id(),
                    });
                }
                deck.publish();
            }
        })
}
