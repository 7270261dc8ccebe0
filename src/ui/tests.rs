use std::path::Path;

use super::*;
use crate::library::ArtistRef;
use crate::visualizer::{Gradient, Paint, Point, Rect as VRect, Rgba, Surface};

#[test]
fn controls_text_includes_scrub_seconds() {
    let text = controls_text(7);
    assert!(text.contains("[H/L] scrub -/+7s"));
    assert!(text.contains("[tab] library/queue"));
    assert!(text.starts_with("[j/k]"));
}

#[test]
fn time_text_follows_configured_fields() {
    let ui = UiSettings::default();
    let text = now_playing_time_text(
        Duration::from_secs(65),
        Some(Duration::from_secs(200)),
        &ui,
    );
    assert_eq!(text.as_deref(), Some("01:05 / 03:20 / -02:15"));

    // Without a known duration only the elapsed part remains.
    let text = now_playing_time_text(Duration::from_secs(5), None, &ui);
    assert_eq!(text.as_deref(), Some("00:05"));
}

#[test]
fn duration_rounds_partial_seconds_up() {
    assert_eq!(format_duration_mmss_ceil(None), "-");
    assert_eq!(
        format_duration_mmss_ceil(Some(Duration::from_millis(61_200))),
        "1:02 (62s)"
    );
}

#[test]
fn visible_window_centers_the_selection() {
    assert_eq!(visible_window(5, 10, 3), (0, 5, 3));
    assert_eq!(visible_window(100, 10, 50), (45, 55, 5));
    assert_eq!(visible_window(100, 10, 98), (90, 100, 8));
}

#[test]
fn layout_drops_the_visualizer_row_when_hidden() {
    let ui = UiSettings::default();
    let area = Rect::new(0, 0, 120, 40);

    let shown = layout(area, true, &ui);
    let panel = shown.visualizer.unwrap();
    assert_eq!(panel.height, ui.visualizer_rows);
    assert_eq!(panel.width, 120);

    let hidden = layout(area, false, &ui);
    assert!(hidden.visualizer.is_none());
    assert!(hidden.library.height > shown.library.height);
}

#[test]
fn canvas_size_counts_braille_dots_inside_the_border() {
    let ui = UiSettings::default();
    let (w, h) = visualizer_canvas_size(Rect::new(0, 0, 80, 40), true, &ui).unwrap();
    assert_eq!(w, 78.0 * 2.0);
    assert_eq!(h, f32::from(ui.visualizer_rows - 2) * 4.0);
    assert!(visualizer_canvas_size(Rect::new(0, 0, 80, 40), false, &ui).is_none());
}

#[test]
fn scene_takes_background_from_full_canvas_fill() {
    let mut list = DisplayList::new(40.0, 20.0);
    list.fill_rect(VRect::new(0.0, 0.0, 40.0, 20.0), &Paint::Solid(Rgba::rgb(10, 20, 30)));
    list.fill_rect(VRect::new(0.0, 12.0, 2.0, 8.0), &Paint::Solid(Rgba::rgb(200, 0, 0)));

    let scene = Scene::from_display_list(&list);
    assert_eq!(scene.background, Rgba::rgb(10, 20, 30));
    // Two columns, two bands of four dots each.
    assert_eq!(scene.segments.len(), 4);
    // Canvas space is flipped: the bar sits at the bottom.
    assert!(scene.segments.iter().all(|s| s.y1 <= 8.0 && s.y2 <= 8.0));
    assert!(scene.segments.iter().all(|s| s.color == Rgba::rgb(200, 0, 0)));
}

#[test]
fn scene_composites_translucent_fills_over_the_background() {
    let mut list = DisplayList::new(10.0, 10.0);
    list.fill_rect(VRect::new(0.0, 0.0, 10.0, 10.0), &Paint::Solid(Rgba::rgb(0, 0, 0)));
    list.fill_rect(
        VRect::new(0.0, 0.0, 1.0, 4.0),
        &Paint::Solid(Rgba::rgb(200, 100, 0).with_alpha(0.5)),
    );

    let scene = Scene::from_display_list(&list);
    assert_eq!(scene.segments.len(), 1);
    assert_eq!(scene.segments[0].color, Rgba::rgb(100, 50, 0));
}

#[test]
fn scene_samples_gradients_per_band() {
    let rect = VRect::new(0.0, 0.0, 1.0, 8.0);
    let gradient = Gradient::vertical(
        rect,
        vec![(0.0, Rgba::rgb(255, 0, 0)), (1.0, Rgba::rgb(0, 0, 255))],
    );
    let mut list = DisplayList::new(20.0, 20.0);
    list.fill_rect(rect, &Paint::Linear(gradient));

    let scene = Scene::from_display_list(&list);
    assert_eq!(scene.segments.len(), 2);
    let top = scene.segments[0].color;
    let bottom = scene.segments[1].color;
    assert!(top.r > top.b);
    assert!(bottom.b > bottom.r);
}

#[test]
fn scene_flattens_paths_and_arcs() {
    let mut list = DisplayList::new(50.0, 50.0);
    list.stroke_path(
        &[Point::new(0.0, 0.0), Point::new(10.0, 10.0), Point::new(20.0, 0.0)],
        1.0,
        Rgba::rgb(1, 2, 3),
    );
    let scene = Scene::from_display_list(&list);
    assert_eq!(scene.segments.len(), 2);
    assert_eq!(scene.segments[0].y1, 50.0);
    assert_eq!(scene.segments[0].y2, 40.0);

    let mut list = DisplayList::new(50.0, 50.0);
    list.fill_arc(
        Point::new(25.0, 25.0),
        10.0,
        0.0,
        std::f32::consts::TAU,
        &Paint::Solid(Rgba::rgb(9, 9, 9)),
    );
    let scene = Scene::from_display_list(&list);
    assert!(scene.segments.len() > 60);
    assert!(scene.segments.iter().all(|s| s.x1 == 25.0 && s.y1 == 25.0));
}

#[test]
fn now_playing_text_skips_blank_fields() {
    let mut track = Track::from_path(Path::new("/music/Some File.mp3"));
    track.title = "Song".into();
    track.artist = Some(ArtistRef::named("  "));
    let ui = UiSettings {
        now_playing_track_fields: vec![
            TrackDisplayField::Artist,
            TrackDisplayField::Title,
            TrackDisplayField::Filename,
        ],
        now_playing_track_separator: " | ".into(),
        ..UiSettings::default()
    };
    assert_eq!(now_playing_track_text(&track, &ui), "Song | Some File");
}
