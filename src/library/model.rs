use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Reference to the performing artist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRef {
    pub id: String,
    pub name: String,
}

impl ArtistRef {
    /// Build a reference whose id is the case-folded name.
    pub fn named(name: &str) -> Self {
        let name = name.trim();
        Self {
            id: name.to_lowercase(),
            name: name.to_string(),
        }
    }
}

/// Cover image locations in increasing resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverArt {
    pub small: Option<String>,
    pub medium: Option<String>,
    pub big: Option<String>,
    pub xl: Option<String>,
}

impl CoverArt {
    /// A single image used for every size variant.
    pub fn uniform(location: String) -> Self {
        Self {
            small: Some(location.clone()),
            medium: Some(location.clone()),
            big: Some(location.clone()),
            xl: Some(location),
        }
    }

    /// The largest available variant.
    pub fn largest(&self) -> Option<&str> {
        self.xl
            .as_deref()
            .or(self.big.as_deref())
            .or(self.medium.as_deref())
            .or(self.small.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumRef {
    pub id: String,
    pub title: String,
    pub cover: CoverArt,
}

/// A playable track. Equality and hashing only look at `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: Option<ArtistRef>,
    pub album: Option<AlbumRef>,
    pub duration_secs: u32,
    pub explicit: bool,
    /// Where the audio thread streams this track from.
    pub source: PathBuf,
    pub display: String,
}

impl Track {
    /// Minimal track for a file with no tag information.
    pub fn from_path(path: &Path) -> Self {
        let title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("UNKNOWN")
            .to_string();
        Self {
            id: path.to_string_lossy().into_owned(),
            display: title.clone(),
            title,
            artist: None,
            album: None,
            duration_secs: 0,
            explicit: false,
            source: path.to_path_buf(),
        }
    }

    pub fn duration(&self) -> Option<Duration> {
        (self.duration_secs > 0).then(|| Duration::from_secs(u64::from(self.duration_secs)))
    }

    pub fn artist_name(&self) -> Option<&str> {
        self.artist.as_ref().map(|a| a.name.as_str())
    }

    pub fn album_title(&self) -> Option<&str> {
        self.album.as_ref().map(|a| a.title.as_str())
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Track {}

impl Hash for Track {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
