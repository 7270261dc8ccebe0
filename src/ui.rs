//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

mod scene;

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style, Stylize},
    symbols::Marker,
    widgets::{
        Block, Borders, Clear, List, ListItem, ListState, Padding, Paragraph, Wrap,
        canvas::Canvas,
    },
};
use std::{collections::BTreeMap, sync::LazyLock, time::Duration};

use crate::app::{App, Pane, PlaybackState};
use crate::config::{ControlsSettings, TimeField, TrackDisplayField, UiSettings};
use crate::library::Track;
use crate::queue::QueueState;
use crate::visualizer::{DisplayList, RendererKind};

pub use scene::{DOTS_PER_COLUMN, DOTS_PER_ROW, Scene};

static CONTROLS_MAP: LazyLock<BTreeMap<String, String>> = LazyLock::new(|| {
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    map.insert("j/k".to_string(), "up/down".to_string());
    map.insert("gg/G".to_string(), "top/bottom".to_string());
    map.insert("tab".to_string(), "library/queue".to_string());
    map.insert("enter".to_string(), "play selected".to_string());
    map.insert("a/A".to_string(), "queue song/visible".to_string());
    map.insert("d".to_string(), "remove from queue".to_string());
    map.insert("c".to_string(), "clear queue".to_string());
    map.insert("space/p".to_string(), "play/pause".to_string());
    map.insert("h/l".to_string(), "prev/next song".to_string());
    // H/L is filled dynamically from config.
    map.insert("/".to_string(), "filter".to_string());
    map.insert("s".to_string(), "shuffle".to_string());
    map.insert("r".to_string(), "repeat".to_string());
    map.insert("v/V".to_string(), "visualizer/style".to_string());
    map.insert("+/-".to_string(), "bars".to_string());
    map.insert("o".to_string(), "go to playing".to_string());
    map.insert("K".to_string(), "metadata".to_string());
    map.insert("X".to_string(), "forget session".to_string());
    map.insert("q".to_string(), "quit".to_string());
    map
});

/// Render the controls help text, incorporating scrub seconds.
fn controls_text(scrub_seconds: u64) -> String {
    // Keep the rendered order stable and human-friendly.
    let order = [
        "j/k", "h/l", "H/L", "enter", "space/p", "tab", "a/A", "d", "c", "gg/G", "o", "/", "s",
        "r", "v/V", "+/-", "K", "X", "q",
    ];
    order
        .iter()
        .filter_map(|k| {
            if *k == "H/L" {
                Some(format!("[H/L] scrub -/+{}s", scrub_seconds))
            } else {
                CONTROLS_MAP.get(*k).map(|v| format!("[{}] {}", k, v))
            }
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Format a `Duration` as `MM:SS`.
fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Build the "now playing" track text according to `ui` settings.
fn now_playing_track_text(track: &Track, ui: &UiSettings) -> String {
    let non_blank = |s: &str| {
        let s = s.trim();
        (!s.is_empty()).then(|| s.to_string())
    };
    let parts: Vec<String> = ui
        .now_playing_track_fields
        .iter()
        .filter_map(|field| match field {
            TrackDisplayField::Display => non_blank(&track.display),
            TrackDisplayField::Title => non_blank(&track.title),
            TrackDisplayField::Artist => track.artist_name().and_then(non_blank),
            TrackDisplayField::Album => track.album_title().and_then(non_blank),
            TrackDisplayField::Filename => {
                track.source.file_stem().and_then(|s| s.to_str()).and_then(non_blank)
            }
            TrackDisplayField::Path => Some(track.source.display().to_string()),
        })
        .collect();

    if parts.is_empty() {
        track.display.clone()
    } else {
        parts.join(&ui.now_playing_track_separator)
    }
}

/// Build the now-playing time text (elapsed/total/remaining) per `UiSettings`.
fn now_playing_time_text(
    elapsed: Duration,
    total: Option<Duration>,
    ui: &UiSettings,
) -> Option<String> {
    if ui.now_playing_time_fields.is_empty() {
        return None;
    }

    let mut parts: Vec<String> = Vec::new();
    for f in &ui.now_playing_time_fields {
        match f {
            TimeField::Elapsed => parts.push(format_mmss(elapsed)),
            TimeField::Total => {
                if let Some(t) = total {
                    parts.push(format_mmss(t));
                }
            }
            TimeField::Remaining => {
                if let Some(t) = total {
                    let rem = t.saturating_sub(elapsed);
                    parts.push(format!("-{}", format_mmss(rem)));
                }
            }
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(&ui.now_playing_time_separator))
    }
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    // Keep the popup smaller and avoid covering the entire UI.
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

/// Format an optional duration, rounding up partial seconds, showing total seconds.
fn format_duration_mmss_ceil(d: Option<Duration>) -> String {
    let Some(d) = d else {
        return "-".to_string();
    };

    let mut total_secs = d.as_secs();
    if d.subsec_nanos() > 0 {
        total_secs = total_secs.saturating_add(1);
    }

    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    format!("{}:{:02} ({}s)", minutes, seconds, total_secs)
}

/// Screen regions for one frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Areas {
    pub header: Rect,
    pub status: Rect,
    pub library: Rect,
    pub queue: Rect,
    pub history: Rect,
    pub visualizer: Option<Rect>,
    pub footer: Rect,
}

/// Split the terminal area. The visualizer row only exists while visible.
pub fn layout(area: Rect, visualizer_visible: bool, ui: &UiSettings) -> Areas {
    let visualizer_rows = if visualizer_visible {
        ui.visualizer_rows.max(3)
    } else {
        0
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Min(3),
            Constraint::Length(visualizer_rows),
            Constraint::Length(4),
        ])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[2]);
    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(columns[1]);

    Areas {
        header: chunks[0],
        status: chunks[1],
        library: columns[0],
        queue: side[0],
        history: side[1],
        visualizer: visualizer_visible.then_some(chunks[3]),
        footer: chunks[4],
    }
}

/// Drawable size, in canvas dots, of the visualizer panel for `area`.
pub fn visualizer_canvas_size(area: Rect, visualizer_visible: bool, ui: &UiSettings) -> Option<(f32, f32)> {
    let panel = layout(area, visualizer_visible, ui).visualizer?;
    let inner = Block::bordered().inner(panel);
    if inner.width == 0 || inner.height == 0 {
        return None;
    }
    Some((
        f32::from(inner.width * DOTS_PER_COLUMN),
        f32::from(inner.height * DOTS_PER_ROW),
    ))
}

/// Window of `height` rows around `selected` out of `total` items.
/// Returns `(start, end, selected_pos_in_visible)`.
fn visible_window(total: usize, height: usize, selected: usize) -> (usize, usize, usize) {
    if total <= height || height == 0 {
        return (0, total, selected);
    }
    let half = height / 2;
    let mut start = selected.saturating_sub(half);
    if start + height > total {
        start = total - height;
    }
    (start, start + height, selected - start)
}

fn pane_block(title: &str, focused: bool) -> Block<'_> {
    let block = Block::default().borders(Borders::ALL).title(title);
    if focused {
        block.border_style(Style::default().add_modifier(Modifier::BOLD))
    } else {
        block
    }
}

fn status_text(app: &App, queue: &QueueState, renderer: RendererKind, ui: &UiSettings) -> String {
    let mut parts: Vec<String> = Vec::new();

    match app.focus {
        Pane::Library => parts.push(" FOCUS: Library".to_string()),
        Pane::Queue => parts.push(" FOCUS: Queue".to_string()),
    }
    parts.push(format!("REPEAT: {}", queue.repeat_mode.label()));
    if queue.shuffled {
        parts.push("Shuffle: ON".to_string());
    } else {
        parts.push("Shuffle: OFF".to_string());
    }

    // filter
    let q = app.filter_query.trim();
    if app.filter_mode || !q.is_empty() {
        let mut filter_part = String::from("FILTER:");
        if !q.is_empty() {
            filter_part.push(' ');
            filter_part.push_str(q);
        }
        parts.push(filter_part);
    }

    match queue.current_track() {
        Some(track) => {
            let song = now_playing_track_text(track, ui);
            match now_playing_time_text(app.elapsed(), track.duration(), ui) {
                Some(time) => parts.push(format!("Song: {} [{}]", song, time)),
                None => parts.push(format!("Song: {}", song)),
            }
            let state = match app.playback {
                PlaybackState::Playing => "Playing",
                PlaybackState::Paused => "Paused",
                PlaybackState::Stopped => "Stopped",
            };
            parts.push(state.to_string());
        }
        None => parts.push("Stopped".to_string()),
    }

    parts.push(format!("Queue: {}", queue.pending.len()));
    if app.visualizer_visible {
        parts.push(format!("Visualizer: {}", renderer));
    }
    if let Some(dir) = &app.current_dir {
        parts.push(format!("Dir: {}", dir));
    }
    if let Some(msg) = &app.status_message {
        parts.push(msg.clone());
    }

    parts.join(" • ")
}

fn draw_library(frame: &mut Frame, app: &App, display: &[usize], area: Rect) {
    let q = app.filter_query.trim().to_ascii_lowercase();

    // Only build ListItems for the visible window (avoid allocating the entire list).
    let sel_pos = display.iter().position(|&i| i == app.selected).unwrap_or(0);
    let (start, end, selected_pos_in_visible) =
        visible_window(display.len(), area.height.saturating_sub(2) as usize, sel_pos);

    let visible_items: Vec<ListItem> = display[start..end]
        .iter()
        .map(|&i| {
            let title = &app.tracks[i].display;
            if q.is_empty() {
                return ListItem::new(title.as_str());
            }
            let Some(positions) = app.match_positions(i, &q) else {
                return ListItem::new(title.as_str());
            };

            let mut rendered = String::new();
            let mut pos_iter = positions.into_iter();
            let mut next_pos = pos_iter.next();
            for (ci, ch) in title.chars().enumerate() {
                if next_pos == Some(ci) {
                    for up in ch.to_uppercase() {
                        rendered.push(up);
                    }
                    next_pos = pos_iter.next();
                } else {
                    rendered.push(ch);
                }
            }
            ListItem::new(rendered)
        })
        .collect();

    let focused = app.focus == Pane::Library;
    let list = List::new(visible_items)
        .block(pane_block(" library ", focused))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    if !display.is_empty() && focused {
        state.select(Some(selected_pos_in_visible));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_queue(frame: &mut Frame, app: &App, queue: &QueueState, area: Rect) {
    let focused = app.focus == Pane::Queue;
    let (start, end, selected_pos_in_visible) = visible_window(
        queue.pending.len(),
        area.height.saturating_sub(2) as usize,
        app.queue_cursor,
    );
    let items: Vec<ListItem> = queue
        .pending
        .range(start..end)
        .enumerate()
        .map(|(i, entry)| ListItem::new(format!("{:>3}. {}", start + i + 1, entry.track.display)))
        .collect();

    let title = format!(" queue ({}) ", queue.pending.len());
    let list = List::new(items)
        .block(pane_block(&title, focused))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    if !queue.pending.is_empty() && focused {
        state.select(Some(selected_pos_in_visible));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_history(frame: &mut Frame, queue: &QueueState, area: Rect) {
    let rows = area.height.saturating_sub(2) as usize;
    // Most recent first.
    let items: Vec<ListItem> = queue
        .history
        .iter()
        .rev()
        .take(rows)
        .map(|entry| ListItem::new(entry.track.display.as_str()).dim())
        .collect();
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(" history "));
    frame.render_widget(list, area);
}

fn draw_visualizer(frame: &mut Frame, list: &DisplayList, renderer: RendererKind, elements: usize, area: Rect) {
    let scene = Scene::from_display_list(list);
    let title = format!(" {} · {} ", renderer, elements);
    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .marker(Marker::Braille)
        .background_color(scene::to_color(scene.background))
        .x_bounds([0.0, scene.width])
        .y_bounds([0.0, scene.height])
        .paint(|ctx| scene.paint(ctx));
    frame.render_widget(canvas, area);
}

/// What the visualizer panel shows this frame.
pub struct VisualizerView<'a> {
    pub scene: &'a DisplayList,
    pub renderer: RendererKind,
    pub elements: usize,
}

/// Render the entire UI into the provided `frame` using `app` state and settings.
pub fn draw(
    frame: &mut Frame,
    app: &App,
    display: &[usize],
    queue: &QueueState,
    visualizer: &VisualizerView<'_>,
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
) {
    let areas = layout(frame.area(), app.visualizer_visible, ui_settings);

    // Header
    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" encore ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, areas.header);

    let status_par = Paragraph::new(status_text(app, queue, visualizer.renderer, ui_settings))
        .block(
            Block::bordered()
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                })
                .title(" status "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(status_par, areas.status);

    draw_library(frame, app, display, areas.library);
    draw_queue(frame, app, queue, areas.queue);
    draw_history(frame, queue, areas.history);

    if let Some(area) = areas.visualizer {
        draw_visualizer(
            frame,
            visualizer.scene,
            visualizer.renderer,
            visualizer.elements,
            area,
        );
    }

    // Overlay metadata popup (keeps list visible under it)
    if app.metadata_window {
        let popup_area = centered_rect_sized(72, 10, areas.library);
        frame.render_widget(Clear, popup_area);

        let track = match app.focus {
            Pane::Library => app.selected_track(),
            Pane::Queue => queue.pending.get(app.queue_cursor).map(|e| &e.track),
        };
        let meta = if let Some(track) = track {
            let dur = format_duration_mmss_ceil(track.duration());
            format!(
                "Title: {}{}\nArtist: {}\nAlbum: {}\nDuration: {}\nPath: {}",
                track.title,
                if track.explicit { " [E]" } else { "" },
                track.artist_name().unwrap_or("-"),
                track.album_title().unwrap_or("-"),
                dur,
                track.source.display()
            )
        } else {
            "No track selected".to_string()
        };
        let meta_paragraph = Paragraph::new(meta)
            .block(
                Block::default()
                    .padding(Padding {
                        left: 1,
                        right: 0,
                        top: 0,
                        bottom: 0,
                    })
                    .borders(Borders::ALL)
                    .title(" metadata (K closes) "),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(meta_paragraph, popup_area);
    }

    let footer_text = controls_text(controls_settings.scrub_seconds);
    let footer = Paragraph::new(footer_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(footer, areas.footer);
}

#[cfg(test)]
mod tests;
