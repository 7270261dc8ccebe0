use std::path::Path;

use crate::config::TrackDisplayField;

/// Build a display string for a track according to the provided `fields` and separator.
///
/// This composes metadata fields (artist, title, album, filename, path) in the
/// configured order and falls back to `title` when no parts were produced.
pub fn display_from_fields(
    path: &Path,
    title: &str,
    artist: Option<&str>,
    album: Option<&str>,
    fields: &[TrackDisplayField],
    sep: &str,
) -> String {
    let mut parts: Vec<String> = Vec::new();
    let non_blank = |s: Option<&str>| s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);

    for f in fields {
        match f {
            TrackDisplayField::Display => {
                // "display" inside the field list means "artist - title".
                parts.extend(non_blank(artist));
                parts.extend(non_blank(Some(title)));
            }
            TrackDisplayField::Title => parts.extend(non_blank(Some(title))),
            TrackDisplayField::Artist => parts.extend(non_blank(artist)),
            TrackDisplayField::Album => parts.extend(non_blank(album)),
            TrackDisplayField::Filename => {
                parts.extend(non_blank(path.file_stem().and_then(|s| s.to_str())));
            }
            TrackDisplayField::Path => parts.push(path.display().to_string()),
        }
    }

    if parts.is_empty() {
        title.to_string()
    } else {
        parts.join(sep)
    }
}

/// True when a title carries an explicit-content marker such as `(Explicit)`.
pub fn has_explicit_marker(title: &str) -> bool {
    let lower = title.to_ascii_lowercase();
    lower.contains("(explicit)") || lower.contains("[explicit]")
}
