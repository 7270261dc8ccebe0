use super::*;
use std::path::PathBuf;
use std::sync::mpsc;

use crate::library::{AlbumRef, ArtistRef, CoverArt, Track};

fn make_entry(uid: u64) -> QueueEntry {
    QueueEntry {
        uid,
        track: Track {
            id: "/tmp/music/test.mp3".to_string(),
            title: "Test Title".to_string(),
            artist: Some(ArtistRef::named("Test Artist")),
            album: Some(AlbumRef {
                id: "test album".to_string(),
                title: "Test Album".to_string(),
                cover: CoverArt::uniform("/tmp/music/cover.jpg".to_string()),
            }),
            duration_secs: 123,
            explicit: false,
            source: PathBuf::from("/tmp/music/test.mp3"),
            display: "Test Artist - Test Title".to_string(),
        },
    }
}

fn handle() -> (MprisHandle, Arc<Mutex<SharedState>>, mpsc::Receiver<()>) {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify, notify_rx) = mpsc::channel::<()>();
    (
        MprisHandle {
            state: state.clone(),
            notify,
        },
        state,
        notify_rx,
    )
}

#[test]
fn set_track_metadata_sets_and_clears_shared_state() {
    let (handle, state, notify_rx) = handle();

    handle.set_track_metadata(Some(&make_entry(7)));
    {
        let s = state.lock().unwrap();
        assert_eq!(s.title.as_deref(), Some("Test Title"));
        assert_eq!(s.artist, vec!["Test Artist".to_string()]);
        assert_eq!(s.album.as_deref(), Some("Test Album"));
        assert!(s.url.as_deref().unwrap().contains("/tmp/music/test.mp3"));
        assert_eq!(s.art_url.as_deref(), Some("file:///tmp/music/cover.jpg"));
        assert_eq!(s.length_micros, Some(123_000_000));
        assert_eq!(
            s.track_id.as_ref().map(|p| p.as_str()),
            Some("/org/mpris/MediaPlayer2/track/7")
        );
    }
    assert!(notify_rx.try_recv().is_ok());

    handle.set_track_metadata(None);
    {
        let s = state.lock().unwrap();
        assert_eq!(s.title, None);
        assert!(s.artist.is_empty());
        assert_eq!(s.album, None);
        assert_eq!(s.url, None);
        assert_eq!(s.length_micros, None);
        assert!(s.track_id.is_none());
    }
}

#[test]
fn unchanged_playback_state_does_not_notify() {
    let (handle, _state, notify_rx) = handle();

    handle.set_playback(PlaybackState::Stopped);
    assert!(notify_rx.try_recv().is_err());

    handle.set_playback(PlaybackState::Playing);
    assert!(notify_rx.try_recv().is_ok());
}

#[test]
fn playback_status_maps_state_to_mpris_strings() {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (tx, _rx) = mpsc::channel::<ControlCmd>();
    let iface = PlayerIface {
        tx,
        state: state.clone(),
    };

    assert_eq!(iface.playback_status(), "Stopped");

    state.lock().unwrap().playback = PlaybackState::Playing;
    assert_eq!(iface.playback_status(), "Playing");

    state.lock().unwrap().playback = PlaybackState::Paused;
    assert_eq!(iface.playback_status(), "Paused");
}

#[test]
fn loop_status_follows_repeat_mode() {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (tx, _rx) = mpsc::channel::<ControlCmd>();
    let iface = PlayerIface {
        tx,
        state: state.clone(),
    };

    assert_eq!(iface.loop_status(), "None");
    state.lock().unwrap().repeat_mode = RepeatMode::All;
    assert_eq!(iface.loop_status(), "Playlist");
    state.lock().unwrap().repeat_mode = RepeatMode::One;
    assert_eq!(iface.loop_status(), "Track");
}

#[test]
fn metadata_contains_expected_keys() {
    let (handle, state, _notify_rx) = handle();
    let (tx, _rx) = mpsc::channel::<ControlCmd>();
    let iface = PlayerIface { tx, state };

    assert!(iface.metadata().is_empty());

    handle.set_track_metadata(Some(&make_entry(3)));
    let md = iface.metadata();
    for key in [
        "mpris:trackid",
        "xesam:title",
        "xesam:artist",
        "xesam:album",
        "xesam:url",
        "mpris:artUrl",
        "mpris:length",
    ] {
        assert!(md.contains_key(key), "missing {key}");
    }
}

#[test]
fn observer_tracks_current_entry_and_modes() {
    let (handle, state, _notify_rx) = handle();
    let mut observer = MprisObserver::new(handle);

    let mut queue = QueueState {
        current: Some(make_entry(1)),
        ..QueueState::default()
    };
    observer.on_transition(&Transition::Loaded, &queue);
    assert_eq!(state.lock().unwrap().title.as_deref(), Some("Test Title"));

    // Enqueueing leaves the published track alone.
    state.lock().unwrap().title = Some("sentinel".to_string());
    observer.on_transition(&Transition::Enqueued(1), &queue);
    assert_eq!(state.lock().unwrap().title.as_deref(), Some("sentinel"));

    queue.shuffled = true;
    queue.repeat_mode = RepeatMode::One;
    observer.on_transition(&Transition::RepeatModeChanged(RepeatMode::One), &queue);
    {
        let s = state.lock().unwrap();
        assert!(s.shuffle);
        assert_eq!(s.repeat_mode, RepeatMode::One);
    }

    queue.current = None;
    observer.on_transition(&Transition::Exhausted, &queue);
    assert_eq!(state.lock().unwrap().title, None);
}
