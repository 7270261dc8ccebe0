use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_io::{Timer, block_on};
use zbus::{Connection, interface};
use zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Value};

use crate::app::PlaybackState;
use crate::queue::{QueueEntry, QueueObserver, QueueState, RepeatMode, Transition};

const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const BUS_NAME: &str = "org.mpris.MediaPlayer2.encore";
/// How often the service thread checks for state changes to announce.
const NOTIFY_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Clone, Debug)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
}

#[derive(Debug, Default)]
struct SharedState {
    playback: PlaybackState,
    title: Option<String>,
    artist: Vec<String>,
    album: Option<String>,
    url: Option<String>,
    art_url: Option<String>,
    length_micros: Option<i64>,
    track_id: Option<OwnedObjectPath>,
    shuffle: bool,
    repeat_mode: RepeatMode,
}

/// Writer side of the media session. Cheap to clone; every update wakes the
/// service thread so it can emit `PropertiesChanged`.
#[derive(Clone)]
pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
    notify: Sender<()>,
}

impl MprisHandle {
    pub fn set_playback(&self, playback: PlaybackState) {
        if let Ok(mut s) = self.state.lock() {
            if s.playback == playback {
                return;
            }
            s.playback = playback;
        }
        let _ = self.notify.send(());
    }

    /// Publish the now-playing entry, or clear the metadata with `None`.
    pub fn set_track_metadata(&self, entry: Option<&QueueEntry>) {
        if let Ok(mut s) = self.state.lock() {
            match entry {
                Some(entry) => {
                    let track = &entry.track;
                    s.title = Some(track.title.clone());
                    s.artist = track.artist_name().map(str::to_string).into_iter().collect();
                    s.album = track.album_title().map(str::to_string);
                    s.url = Some(format!("file://{}", track.source.display()));
                    s.art_url = track
                        .album
                        .as_ref()
                        .and_then(|a| a.cover.largest())
                        .map(|loc| format!("file://{loc}"));
                    s.length_micros = track
                        .duration()
                        .and_then(|d| i64::try_from(d.as_micros()).ok());
                    s.track_id = ObjectPath::try_from(format!("{OBJECT_PATH}/track/{}", entry.uid))
                        .ok()
                        .map(OwnedObjectPath::from);
                }
                None => {
                    s.title = None;
                    s.artist.clear();
                    s.album = None;
                    s.url = None;
                    s.art_url = None;
                    s.length_micros = None;
                    s.track_id = None;
                }
            }
        }
        let _ = self.notify.send(());
    }

    fn set_queue_modes(&self, shuffle: bool, repeat_mode: RepeatMode) {
        if let Ok(mut s) = self.state.lock() {
            s.shuffle = shuffle;
            s.repeat_mode = repeat_mode;
        }
        let _ = self.notify.send(());
    }
}

/// Keeps the published metadata in step with the queue.
pub struct MprisObserver {
    handle: MprisHandle,
}

impl MprisObserver {
    pub fn new(handle: MprisHandle) -> Self {
        Self { handle }
    }
}

impl QueueObserver for MprisObserver {
    fn on_transition(&mut self, transition: &Transition, state: &QueueState) {
        if transition.changes_current() {
            self.handle.set_track_metadata(state.current.as_ref());
        }
        if matches!(
            transition,
            Transition::ShuffleToggled(_) | Transition::RepeatModeChanged(_) | Transition::Restored
        ) {
            self.handle.set_queue_modes(state.shuffled, state.repeat_mode);
        }
    }
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // No-op for TUI.
    }

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "encore"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["file".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

fn owned(value: Value<'_>) -> Option<OwnedValue> {
    OwnedValue::try_from(value).ok()
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        let _ = self.tx.send(ControlCmd::Next);
    }

    fn previous(&self) {
        let _ = self.tx.send(ControlCmd::Prev);
    }

    fn play(&self) {
        let _ = self.tx.send(ControlCmd::Play);
    }

    fn pause(&self) {
        let _ = self.tx.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        let _ = self.tx.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        let _ = self.tx.send(ControlCmd::Stop);
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        let Ok(s) = self.state.lock() else {
            return "Stopped";
        };
        match s.playback {
            PlaybackState::Stopped => "Stopped",
            PlaybackState::Playing => "Playing",
            PlaybackState::Paused => "Paused",
        }
    }

    #[zbus(property)]
    fn loop_status(&self) -> &str {
        let Ok(s) = self.state.lock() else {
            return "None";
        };
        match s.repeat_mode {
            RepeatMode::None => "None",
            RepeatMode::All => "Playlist",
            RepeatMode::One => "Track",
        }
    }

    #[zbus(property)]
    fn shuffle(&self) -> bool {
        self.state.lock().map(|s| s.shuffle).unwrap_or(false)
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Ok(s) = self.state.lock() else {
            return map;
        };

        let mut put = |key: &str, value: Option<OwnedValue>| {
            if let Some(v) = value {
                map.insert(key.to_string(), v);
            }
        };

        put(
            "mpris:trackid",
            s.track_id
                .as_ref()
                .and_then(|p| owned(Value::from(p.clone().into_inner()))),
        );
        put("xesam:title", s.title.clone().and_then(|t| owned(Value::from(t))));
        if !s.artist.is_empty() {
            put("xesam:artist", owned(Value::from(s.artist.clone())));
        }
        put("xesam:album", s.album.clone().and_then(|a| owned(Value::from(a))));
        put("xesam:url", s.url.clone().and_then(|u| owned(Value::from(u))));
        put("mpris:artUrl", s.art_url.clone().and_then(|u| owned(Value::from(u))));
        put("mpris:length", s.length_micros.and_then(|l| owned(Value::from(l))));
        map
    }
}

async fn announce_changes(connection: &Connection) -> zbus::Result<()> {
    let iface_ref = connection
        .object_server()
        .interface::<_, PlayerIface>(OBJECT_PATH)
        .await?;
    let emitter = iface_ref.signal_emitter();
    let iface = iface_ref.get().await;
    iface.playback_status_changed(emitter).await?;
    iface.metadata_changed(emitter).await?;
    iface.loop_status_changed(emitter).await?;
    iface.shuffle_changed(emitter).await?;
    Ok(())
}

async fn serve(
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
    notify: Receiver<()>,
) -> zbus::Result<()> {
    let connection = Connection::session().await?;
    connection.request_name(BUS_NAME).await?;

    let object_server = connection.object_server();
    object_server
        .at(OBJECT_PATH, RootIface { tx: tx.clone() })
        .await?;
    object_server.at(OBJECT_PATH, PlayerIface { tx, state }).await?;
    tracing::info!(bus = BUS_NAME, "media session registered");

    loop {
        Timer::after(NOTIFY_INTERVAL).await;
        let mut changed = false;
        loop {
            match notify.try_recv() {
                Ok(()) => changed = true,
                Err(mpsc::TryRecvError::Empty) => break,
                // Every handle is gone; the player is shutting down.
                Err(mpsc::TryRecvError::Disconnected) => return Ok(()),
            }
        }
        if changed {
            if let Err(e) = announce_changes(&connection).await {
                tracing::debug!(error = %e, "could not emit PropertiesChanged");
            }
        }
    }
}

pub fn spawn_mpris(tx: Sender<ControlCmd>) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify, notify_rx) = mpsc::channel::<()>();

    let state_for_thread = state.clone();
    let spawned = std::thread::Builder::new()
        .name("encore-mpris".into())
        .spawn(move || {
            if let Err(e) = block_on(serve(tx, state_for_thread, notify_rx)) {
                // Media keys are optional; the player keeps running without them.
                tracing::warn!(error = %e, "MPRIS unavailable");
            }
        });
    if let Err(e) = spawned {
        tracing::warn!(error = %e, "could not start the MPRIS thread");
    }

    MprisHandle { state, notify }
}

#[cfg(test)]
mod tests;
