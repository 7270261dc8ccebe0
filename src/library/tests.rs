use super::display::{display_from_fields, has_explicit_marker};
use super::model::{ArtistRef, Track};
use crate::config::TrackDisplayField;
use std::collections::HashSet;
use std::path::Path;

#[test]
fn display_from_fields_can_format_artist_title() {
    let p = Path::new("/tmp/Song.mp3");
    let fields = [TrackDisplayField::Artist, TrackDisplayField::Title];
    assert_eq!(
        display_from_fields(p, "Song", Some("Artist"), None, &fields, " - "),
        "Artist - Song"
    );
    assert_eq!(
        display_from_fields(p, "Song", Some("  Artist  "), None, &fields, " - "),
        "Artist - Song"
    );
    assert_eq!(display_from_fields(p, "Song", None, None, &fields, " - "), "Song");
}

#[test]
fn display_from_fields_falls_back_to_title() {
    let p = Path::new("/tmp/x.mp3");
    assert_eq!(
        display_from_fields(p, "Title", None, None, &[TrackDisplayField::Album], "|"),
        "Title"
    );
}

#[test]
fn explicit_marker_detection() {
    assert!(has_explicit_marker("Song (Explicit)"));
    assert!(has_explicit_marker("Song [EXPLICIT]"));
    assert!(!has_explicit_marker("Explicitly Clean"));
}

#[test]
fn tracks_compare_by_id_only() {
    let a = Track::from_path(Path::new("/music/a.mp3"));
    let mut renamed = a.clone();
    renamed.title = "Something else".into();
    renamed.artist = Some(ArtistRef::named("Someone"));

    assert_eq!(a, renamed);
    let set: HashSet<Track> = [a.clone(), renamed].into_iter().collect();
    assert_eq!(set.len(), 1);

    let b = Track::from_path(Path::new("/music/b.mp3"));
    assert_ne!(a, b);
}

#[test]
fn artist_ref_id_is_case_folded() {
    let artist = ArtistRef::named("  Daft Punk ");
    assert_eq!(artist.name, "Daft Punk");
    assert_eq!(artist.id, "daft punk");
}
