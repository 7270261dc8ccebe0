use std::path::Path;

use lofty::prelude::{Accessor, AudioFile, TaggedFileExt};
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::display::{display_from_fields, has_explicit_marker};
use super::model::{AlbumRef, ArtistRef, CoverArt, Track};

const COVER_NAMES: [&str; 6] = [
    "cover.jpg",
    "cover.png",
    "folder.jpg",
    "folder.png",
    "front.jpg",
    "front.png",
];

/// Configured extensions, lowercased and without the leading dot.
fn normalized_extensions(settings: &LibrarySettings) -> Vec<String> {
    settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
        return false;
    };
    extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

/// Look for a cover image next to `path`.
fn find_cover(path: &Path) -> CoverArt {
    let Some(dir) = path.parent() else {
        return CoverArt::default();
    };
    COVER_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
        .map(|found| CoverArt::uniform(format!("file://{}", found.display())))
        .unwrap_or_default()
}

/// Read one audio file into a `Track`, falling back to the file name when
/// tags are missing or unreadable.
fn read_track(path: &Path, settings: &LibrarySettings) -> Track {
    let mut track = Track::from_path(path);
    let mut album_title: Option<String> = None;

    if let Ok(tagged) = lofty::read_from_path(path) {
        track.duration_secs = tagged.properties().duration().as_secs().min(u64::from(u32::MAX)) as u32;

        if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
            if let Some(v) = tag.title() {
                if !v.trim().is_empty() {
                    track.title = v.to_string();
                }
            }
            if let Some(v) = tag.artist() {
                if !v.trim().is_empty() {
                    track.artist = Some(ArtistRef::named(&v));
                }
            }
            if let Some(v) = tag.album() {
                let v = v.trim();
                if !v.is_empty() {
                    album_title = Some(v.to_string());
                }
            }
        }
    }

    if let Some(title) = album_title {
        let artist_id = track.artist.as_ref().map(|a| a.id.as_str()).unwrap_or("");
        track.album = Some(AlbumRef {
            id: format!("{}/{}", artist_id, title.to_lowercase()),
            title,
            cover: find_cover(path),
        });
    }

    track.explicit = has_explicit_marker(&track.title);
    track.display = display_from_fields(
        path,
        &track.title,
        track.artist_name(),
        track.album_title(),
        &settings.display_fields,
        &settings.display_separator,
    );
    track
}

/// Walk `dir` and read every audio file found into a `Track`, sorted by
/// display string.
pub fn scan(dir: &Path, settings: &LibrarySettings) -> Vec<Track> {
    let extensions = normalized_extensions(settings);
    let max_depth = if settings.recursive { settings.max_depth } else { Some(1) };

    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);
    if let Some(depth) = max_depth {
        walker = walker.max_depth(depth);
    }

    let visible = |path: &Path| settings.include_hidden || !is_hidden(path);
    let mut tracks: Vec<Track> = walker
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || visible(e.path()))
        .filter_map(Result::ok)
        .filter(|e| e.path().is_file())
        .filter(|e| visible(e.path()) && has_extension(e.path(), &extensions))
        .map(|e| read_track(e.path(), settings))
        .collect();

    tracks.sort_by_cached_key(|t| t.display.to_lowercase());
    tracing::info!(dir = %dir.display(), count = tracks.len(), "library scanned");
    tracks
}
