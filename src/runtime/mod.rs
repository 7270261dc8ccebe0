use std::env;
use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{DisableFocusChange, EnableFocusChange};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::App;
use crate::audio::{AudioPlayer, SampleTap, SpectrumAnalyzer, TapSpectrum};
use crate::library::scan;
use crate::mpris::{ControlCmd, MprisObserver};
use crate::persist::PersistObserver;
use crate::queue::{QueueLimits, QueueStore};
use crate::render_loop::RenderLoop;
use crate::visualizer::DisplayList;

mod controller;
mod event_loop;
mod mpris_sync;
mod settings;
mod startup;

use controller::Controller;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, settings_problem) = settings::load_settings();
    let _log_guard = crate::logging::init(&settings);
    if let Some(problem) = &settings_problem {
        tracing::warn!("{problem}");
    }

    let dir = env::args().skip(1).find(|a| !a.starts_with("--")).unwrap_or_else(|| {
        std::env::current_dir()
            .ok()
            .and_then(|p| p.to_str().map(|s| s.to_string()))
            .unwrap_or_else(|| "Music".to_string())
    });

    let tracks = scan(Path::new(&dir), &settings.library);

    // Two FFT windows of history so a late poll still sees a full window.
    let tap = SampleTap::new(settings.visualizer.fft_size * 2);
    let audio_player = AudioPlayer::new(settings.audio.clone(), tap.clone());
    let spectrum = TapSpectrum::new(tap, SpectrumAnalyzer::from_settings(&settings.visualizer));

    let mut app = App::new(tracks);
    app.visualizer_visible = settings.visualizer.enabled;
    app.set_current_dir(dir.clone());
    app.set_playback_handle(audio_player.playback_handle());
    if let Some(problem) = settings_problem {
        app.set_status(problem);
    }

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris = crate::mpris::spawn_mpris(control_tx);

    let persister = startup::open_persister(&settings);
    let mut store = QueueStore::new(QueueLimits::from(&settings.queue));
    store.subscribe(Box::new(MprisObserver::new(mpris.clone())));
    if let Some(p) = &persister {
        store.subscribe(Box::new(PersistObserver::new(
            p.handle(),
            Duration::from_secs(settings.persistence.position_interval_secs),
        )));
    }

    let restored = startup::restore_session(&mut store, persister.as_ref());
    if !restored {
        startup::apply_playback_defaults(&mut store, &settings);
    }

    let mut controller = Controller::new(store, audio_player, settings.queue.auto_queue.clone());
    if restored {
        controller.cue_restored();
        if let Some(id) = controller.store.state().current_track().map(|t| t.id.clone()) {
            app.select_track_id(&id);
        }
    }

    let mut session = event_loop::Session {
        settings: &settings,
        app,
        controller,
        persister,
        mpris,
        render_loop: RenderLoop::from_settings(&settings.visualizer),
        spectrum,
        scene: DisplayList::default(),
    };

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result: Result<(), Box<dyn std::error::Error>> = (|| {
        let mut state = event_loop::EventLoopState::default();
        event_loop::run(&mut terminal, &mut session, &control_rx, &mut state)
    })();

    // Teardown: no frames, no pending snapshot, then let the audio fade.
    session.render_loop.halt();
    if let Some(persister) = session.persister.take() {
        persister.shutdown();
    }
    session
        .controller
        .transport
        .quit_softly(Duration::from_millis(settings.audio.quit_fade_out_ms));

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableFocusChange, LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = &run_result {
        tracing::error!(error = %e, "event loop failed");
    }
    run_result
}
