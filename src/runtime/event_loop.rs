use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::layout::Rect;
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::{App, Pane, PlaybackState};
use crate::audio::{AudioEvent, AudioPlayer, TapSpectrum};
use crate::config;
use crate::mpris::{ControlCmd, MprisHandle};
use crate::persist::Persister;
use crate::render_loop::RenderLoop;
use crate::runtime::controller::Controller;
use crate::runtime::mpris_sync::update_mpris;
use crate::ui::{self, VisualizerView};
use crate::visualizer::DisplayList;

/// Longest the loop waits for input when no frame is due sooner.
const IDLE_POLL: Duration = Duration::from_millis(50);

/// Everything the event loop drives. Owned by the loop's thread only.
pub struct Session<'a> {
    pub settings: &'a config::Settings,
    pub app: App,
    pub controller: Controller<AudioPlayer>,
    pub persister: Option<Persister>,
    pub mpris: MprisHandle,
    pub render_loop: RenderLoop,
    pub spectrum: TapSpectrum,
    pub scene: DisplayList,
}

/// State tracked by the runtime event loop across iterations.
#[derive(Default)]
pub struct EventLoopState {
    /// Internal two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
    /// Last-known playback state as emitted to MPRIS.
    pub last_mpris_playback: PlaybackState,
}

enum Flow {
    Continue,
    Quit,
}

/// Main terminal event loop: handles input, audio events, UI drawing and
/// visualizer frames. Returns `Ok(())` when shutdown is requested.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    session: &mut Session<'_>,
    control_rx: &mpsc::Receiver<ControlCmd>,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        while let Some(ev) = session.controller.transport.try_event() {
            handle_audio_event(ev, session);
        }

        // Mirror the audio clock into the queue so the position is saved.
        if let Some(handle) = session.app.playback_handle.clone() {
            if let Ok(info) = handle.lock() {
                let track_id = info.track_id.clone();
                let elapsed = info.elapsed;
                drop(info);
                session.controller.sync_position(track_id.as_deref(), elapsed);
            }
        }
        session.app.playback = session.controller.playback();
        let pending_len = session.controller.store.state().pending.len();
        session.app.clamp_queue_cursor(pending_len);

        // Keep MPRIS in sync even when playback changes come from media keys or track ends.
        if session.app.playback != state.last_mpris_playback {
            update_mpris(&session.mpris, &session.app);
            state.last_mpris_playback = session.app.playback;
        }

        let now = Instant::now();
        let size = terminal.size()?;
        let area = Rect::new(0, 0, size.width, size.height);
        if let Some((w, h)) =
            ui::visualizer_canvas_size(area, session.app.visualizer_visible, &session.settings.ui)
        {
            session.scene.resize(w, h);
        }
        if session.render_loop.frame_due(now) {
            session.render_loop.tick(
                now,
                &mut session.spectrum,
                session.app.visualizer_active(),
                &mut session.scene,
            );
        }

        let display = session.app.display_indices();
        let view = VisualizerView {
            scene: &session.scene,
            renderer: session.render_loop.kind(),
            elements: session.render_loop.elements(),
        };
        terminal.draw(|f| {
            ui::draw(
                f,
                &session.app,
                &display,
                session.controller.store.state(),
                &view,
                &session.settings.ui,
                &session.settings.controls,
            )
        })?;

        while let Ok(cmd) = control_rx.try_recv() {
            if let Flow::Quit = handle_control_cmd(cmd, session) {
                return Ok(());
            }
        }

        // Sleep no longer than the next visualizer frame.
        let timeout = if session.app.visualizer_active() {
            session
                .render_loop
                .time_until_next_frame(Instant::now())
                .map_or(IDLE_POLL, |d| d.min(IDLE_POLL))
        } else {
            IDLE_POLL
        };

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if let Flow::Quit = handle_key_event(key, session, state) {
                        break;
                    }
                }
                Event::FocusGained => session.app.terminal_focused = true,
                Event::FocusLost => session.app.terminal_focused = false,
                _ => {}
            }
        }
    }

    Ok(())
}

fn handle_audio_event(ev: AudioEvent, session: &mut Session<'_>) {
    match ev {
        AudioEvent::TrackEnded { track_id } => {
            session.controller.track_ended(&track_id, &session.app.tracks);
        }
        AudioEvent::LoadFailed { track_id, reason } => {
            tracing::warn!(track_id = %track_id, reason = %reason, "track could not be played");
            if session.controller.load_failed(&track_id) {
                session.app.set_status(format!("Cannot play: {reason}"));
            }
        }
        AudioEvent::Unavailable(reason) => {
            session.controller.output_lost();
            session.app.set_status(format!("No audio output: {reason}"));
        }
    }
}

fn handle_control_cmd(cmd: ControlCmd, session: &mut Session<'_>) -> Flow {
    let library = &session.app.tracks;
    match cmd {
        ControlCmd::Quit => return Flow::Quit,
        ControlCmd::Play => session.controller.play(),
        ControlCmd::Pause => session.controller.pause(),
        ControlCmd::PlayPause => session.controller.toggle_pause(),
        ControlCmd::Stop => session.controller.stop(),
        ControlCmd::Next => session.controller.next(library),
        ControlCmd::Prev => session.controller.previous(),
    }
    session.app.playback = session.controller.playback();
    update_mpris(&session.mpris, &session.app);
    Flow::Continue
}

fn scrub_seconds(settings: &config::Settings) -> i32 {
    settings.controls.scrub_seconds.min(i32::MAX as u64) as i32
}

fn handle_filter_key(key: KeyEvent, session: &mut Session<'_>) {
    let app = &mut session.app;
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => app.clear_filter(),
        KeyCode::Backspace => app.pop_filter_char(),
        KeyCode::Char('j') | KeyCode::Char('n') if ctrl => app.next(),
        KeyCode::Char('k') | KeyCode::Char('p') if ctrl => app.prev(),
        KeyCode::Down => app.next(),
        KeyCode::Up => app.prev(),
        KeyCode::Char(c) => {
            if !c.is_control() {
                app.push_filter_char(c);
            }
        }
        KeyCode::Enter => {
            if app.display_indices().is_empty() {
                return;
            }
            app.exit_filter_mode();
            if let Some(track) = app.selected_track().cloned() {
                session.controller.play_track(track);
            }
        }
        _ => {}
    }
}

fn handle_key_event(key: KeyEvent, session: &mut Session<'_>, state: &mut EventLoopState) -> Flow {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Flow::Quit;
    }
    if session.app.filter_mode {
        state.pending_gg = false;
        handle_filter_key(key, session);
        return Flow::Continue;
    }

    // g pending should clear on any other key
    if key.code != KeyCode::Char('g') {
        state.pending_gg = false;
    }

    let pending_len = session.controller.store.state().pending.len();
    match key.code {
        KeyCode::Char('q') => return Flow::Quit,
        KeyCode::Char('/') => session.app.enter_filter_mode(),
        KeyCode::Tab => session.app.toggle_focus(),
        KeyCode::Char('g') => {
            if state.pending_gg {
                state.pending_gg = false;
                match session.app.focus {
                    Pane::Library => {
                        if let Some(&first) = session.app.display_indices().first() {
                            session.app.set_selected(first);
                        }
                    }
                    Pane::Queue => session.app.queue_cursor = 0,
                }
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => match session.app.focus {
            Pane::Library => {
                if let Some(&last) = session.app.display_indices().last() {
                    session.app.set_selected(last);
                }
            }
            Pane::Queue => session.app.queue_cursor = pending_len.saturating_sub(1),
        },
        KeyCode::Char('j') | KeyCode::Down => match session.app.focus {
            Pane::Library => session.app.next(),
            Pane::Queue => session.app.queue_next(pending_len),
        },
        KeyCode::Char('k') | KeyCode::Up => match session.app.focus {
            Pane::Library => session.app.prev(),
            Pane::Queue => session.app.queue_prev(pending_len),
        },
        KeyCode::Enter => match session.app.focus {
            Pane::Library => {
                if let Some(track) = session.app.selected_track().cloned() {
                    session.controller.play_track(track);
                }
            }
            Pane::Queue => {
                // Jump the queue: play the entry now, the rest stays pending.
                if let Ok(entry) = session.controller.store.dequeue(session.app.queue_cursor) {
                    session.controller.play_track(entry.track);
                }
            }
        },
        KeyCode::Char('a') => {
            if let Some(track) = session.app.selected_track().cloned() {
                let title = track.title.clone();
                match session.controller.enqueue(vec![track]) {
                    Ok(_) => session.app.set_status(format!("Queued: {title}")),
                    Err(e) => session.app.set_status(e.to_string()),
                }
            }
        }
        KeyCode::Char('A') => {
            let visible = session.app.visible_tracks();
            match session.controller.enqueue(visible) {
                Ok(n) => session.app.set_status(format!("Queued {n} tracks")),
                Err(e) => session.app.set_status(e.to_string()),
            }
        }
        KeyCode::Char('d') | KeyCode::Char('x') | KeyCode::Delete => {
            if session.app.focus == Pane::Queue {
                if let Ok(entry) = session.controller.store.dequeue(session.app.queue_cursor) {
                    session.app.set_status(format!("Removed: {}", entry.track.title));
                }
            }
        }
        KeyCode::Char('c') => {
            let dropped = session.controller.store.clear();
            session.app.set_status(format!("Cleared {dropped} queued tracks"));
        }
        KeyCode::Char('p') | KeyCode::Char(' ') => session.controller.toggle_pause(),
        KeyCode::Char('l') | KeyCode::Char('n') => session.controller.next(&session.app.tracks),
        KeyCode::Char('h') => session.controller.previous(),
        KeyCode::Char('L') => session.controller.seek_by(scrub_seconds(session.settings)),
        KeyCode::Char('H') => session.controller.seek_by(-scrub_seconds(session.settings)),
        KeyCode::Char('s') => {
            let on = session.controller.store.toggle_shuffle();
            session.app.queue_cursor = 0;
            session.app.set_status(if on { "Shuffle on" } else { "Shuffle off" });
        }
        KeyCode::Char('r') => {
            let mode = session.controller.store.cycle_repeat_mode();
            session.app.set_status(format!("Repeat: {}", mode.label()));
        }
        KeyCode::Char('o') => {
            let current = session
                .controller
                .store
                .state()
                .current_track()
                .map(|t| t.id.clone());
            if let Some(id) = current {
                session.app.select_track_id(&id);
            }
        }
        KeyCode::Char('v') => session.app.toggle_visualizer(),
        KeyCode::Char('V') => {
            let kind = session.render_loop.cycle_renderer();
            session.app.set_status(format!("Visualizer: {kind}"));
        }
        KeyCode::Char('+') | KeyCode::Char('=') => {
            let n = session.render_loop.elements();
            session.render_loop.set_element_count(n.saturating_mul(2));
        }
        KeyCode::Char('-') => {
            let n = session.render_loop.elements();
            session.render_loop.set_element_count(n / 2);
        }
        KeyCode::Char('K') => session.app.toggle_metadata_window(),
        KeyCode::Char('X') => {
            if let Some(persister) = session.persister.as_ref() {
                match persister.clear_persisted() {
                    Ok(()) => session.app.set_status("Saved session forgotten"),
                    Err(e) => {
                        tracing::warn!(error = %e, "could not clear saved queue");
                        session.app.set_status(format!("Could not forget session: {e}"));
                    }
                }
            }
        }
        _ => {}
    }

    session.app.playback = session.controller.playback();
    Flow::Continue
}
