//! Application model types: `App`, `Pane` and `PlaybackState`.
//!
//! The `App` struct holds the library browser state (selection, fuzzy
//! filter), the queue pane cursor and the view flags used by the UI and
//! runtime. The queue itself lives in `QueueStore`.

use std::time::Duration;

use crate::audio::PlaybackHandle;
use crate::library::Track;

/// Libraries larger than this keep a lowercase copy of every display
/// string for filtering.
const LOWER_CACHE_MIN_TRACKS: usize = 100;

/// The playback state of the application.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Which list receives navigation keys.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Pane {
    #[default]
    Library,
    Queue,
}

/// The main application model.
pub struct App {
    pub tracks: Vec<Track>,
    pub selected: usize,
    pub playback: PlaybackState,
    pub playback_handle: Option<PlaybackHandle>,

    lower_titles: Option<Vec<String>>,

    pub focus: Pane,
    /// Index into the pending queue.
    pub queue_cursor: usize,

    pub filter_mode: bool,
    pub filter_query: String,
    pub current_dir: Option<String>,
    pub metadata_window: bool,
    pub visualizer_visible: bool,
    pub terminal_focused: bool,
    /// One-line message shown in the status box until replaced.
    pub status_message: Option<String>,
}

impl App {
    /// Create a new `App` with the provided list of `tracks`.
    pub fn new(tracks: Vec<Track>) -> Self {
        let lower_titles = (tracks.len() > LOWER_CACHE_MIN_TRACKS)
            .then(|| tracks.iter().map(|t| t.display.to_ascii_lowercase()).collect());

        Self {
            tracks,
            selected: 0,
            playback: PlaybackState::Stopped,
            playback_handle: None,

            lower_titles,

            focus: Pane::Library,
            queue_cursor: 0,

            filter_mode: false,
            filter_query: String::new(),
            current_dir: None,
            metadata_window: false,
            visualizer_visible: true,
            terminal_focused: true,
            status_message: None,
        }
    }

    pub fn toggle_metadata_window(&mut self) {
        self.metadata_window = !self.metadata_window;
    }
    pub fn toggle_visualizer(&mut self) {
        self.visualizer_visible = !self.visualizer_visible;
    }
    /// Switch keyboard focus between the library and the queue pane.
    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Pane::Library => Pane::Queue,
            Pane::Queue => Pane::Library,
        };
    }
    /// Attach a `PlaybackHandle` used to observe playback progress.
    pub fn set_playback_handle(&mut self, h: PlaybackHandle) {
        self.playback_handle = Some(h);
    }
    /// Record the current directory in the app state.
    pub fn set_current_dir(&mut self, dir: String) {
        self.current_dir = Some(dir);
    }
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    /// Frames are only worth drawing while the panel is shown and the
    /// terminal has focus.
    pub fn visualizer_active(&self) -> bool {
        self.visualizer_visible && self.terminal_focused
    }

    /// Elapsed time of the loaded track as last published by the audio thread.
    pub fn elapsed(&self) -> Duration {
        self.playback_handle
            .as_ref()
            .and_then(|h| h.lock().ok().map(|info| info.elapsed))
            .unwrap_or_default()
    }

    pub fn selected_track(&self) -> Option<&Track> {
        self.tracks.get(self.selected)
    }

    /// Tracks currently visible in the library pane, in display order.
    pub fn visible_tracks(&self) -> Vec<Track> {
        self.display_indices()
            .into_iter()
            .map(|i| self.tracks[i].clone())
            .collect()
    }

    /// Move the library cursor onto the track with `id`, clearing a filter
    /// that would hide it. Returns false when the library has no such track.
    pub fn select_track_id(&mut self, id: &str) -> bool {
        let Some(idx) = self.tracks.iter().position(|t| t.id == id) else {
            return false;
        };
        if !self.display_indices().contains(&idx) {
            self.clear_filter();
        }
        self.focus = Pane::Library;
        self.set_selected(idx);
        true
    }

    /// Library indices that pass the filter, in display order.
    pub fn display_indices(&self) -> Vec<usize> {
        let query = self.filter_query.trim();
        if query.is_empty() {
            return (0..self.tracks.len()).collect();
        }
        let query = query.to_ascii_lowercase();
        (0..self.tracks.len())
            .filter(|&i| self.match_positions(i, &query).is_some())
            .collect()
    }

    /// Character positions of the track's display string matched by
    /// `query`, or `None` when it does not match.
    pub fn match_positions(&self, track_index: usize, query: &str) -> Option<Vec<usize>> {
        match self.lower_titles.as_deref() {
            Some(lower) => subsequence(&lower[track_index], query, false),
            None => subsequence(&self.tracks[track_index].display, query, true),
        }
    }

    /// Return the next visible index in the current display order after `current`.
    /// Wraps around to the first element.
    pub fn next_in_view_from(&self, current: usize) -> Option<usize> {
        let display = self.display_indices();
        if display.is_empty() {
            return None;
        }

        let pos = display.iter().position(|&i| i == current);
        match pos {
            Some(p) => Some(display[(p + 1) % display.len()]),
            None => Some(display[0]),
        }
    }

    /// Return the previous visible index in the current display order before `current`.
    /// Wraps around to the last element.
    pub fn prev_in_view_from(&self, current: usize) -> Option<usize> {
        let display = self.display_indices();
        if display.is_empty() {
            return None;
        }

        let pos = display.iter().position(|&i| i == current);
        match pos {
            Some(0) => Some(display[display.len() - 1]),
            Some(p) => Some(display[p - 1]),
            None => Some(display[display.len() - 1]),
        }
    }

    /// Set the selected track index and ensure it is visible in the display.
    pub fn set_selected(&mut self, idx: usize) {
        self.selected = idx;
        self.ensure_selected_visible();
    }
    /// Case-insensitive subsequence match of `query` in `title`.
    pub fn fuzzy_match_positions(title: &str, query: &str) -> Option<Vec<usize>> {
        subsequence(title, query, true)
    }

    /// Enter filter mode; the filter always applies to the library pane.
    pub fn enter_filter_mode(&mut self) {
        self.filter_mode = true;
        self.focus = Pane::Library;
        self.ensure_selected_visible();
    }
    pub fn exit_filter_mode(&mut self) {
        self.filter_mode = false;
    }
    /// Clear the active filter and restore selection visibility.
    pub fn clear_filter(&mut self) {
        self.filter_query.clear();
        self.filter_mode = false;
        self.ensure_selected_visible();
    }
    /// Append a character to the filter query and refresh view.
    pub fn push_filter_char(&mut self, c: char) {
        self.filter_query.push(c);
        self.ensure_selected_visible();
    }
    /// Remove the last character from the filter query and refresh view.
    pub fn pop_filter_char(&mut self) {
        self.filter_query.pop();
        self.ensure_selected_visible();
    }

    /// Ensure that `selected` is part of the current filtered view,
    /// otherwise move selection to the first visible track.
    fn ensure_selected_visible(&mut self) {
        let display = self.display_indices();
        if display.is_empty() {
            self.selected = 0;
            return;
        }

        if !display.contains(&self.selected) {
            self.selected = display[0];
        }
    }
    /// Move selection to the next visible track.
    pub fn next(&mut self) {
        if let Some(next) = self.next_in_view_from(self.selected) {
            self.selected = next;
        }
    }

    /// Move selection to the previous visible track.
    pub fn prev(&mut self) {
        if let Some(prev) = self.prev_in_view_from(self.selected) {
            self.selected = prev;
        }
    }

    /// Move the queue cursor down, wrapping within `pending_len` entries.
    pub fn queue_next(&mut self, pending_len: usize) {
        if pending_len > 0 {
            self.queue_cursor = (self.queue_cursor + 1) % pending_len;
        }
    }

    pub fn queue_prev(&mut self, pending_len: usize) {
        if pending_len > 0 {
            self.queue_cursor = (self.queue_cursor + pending_len - 1) % pending_len;
        }
    }

    /// Keep the queue cursor on an existing entry after the queue shrank.
    pub fn clamp_queue_cursor(&mut self, pending_len: usize) {
        self.queue_cursor = self.queue_cursor.min(pending_len.saturating_sub(1));
    }
}

/// Positions in `haystack` of each char of `needle`, matched in order.
fn subsequence(haystack: &str, needle: &str, fold_case: bool) -> Option<Vec<usize>> {
    let fold = |c: char| if fold_case { c.to_ascii_lowercase() } else { c };
    let mut hay = haystack.chars().enumerate();
    needle
        .chars()
        .map(|nc| {
            let nc = fold(nc);
            hay.find(|&(_, hc)| fold(hc) == nc).map(|(i, _)| i)
        })
        .collect()
}
