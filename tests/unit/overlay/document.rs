use super::*;
use crate::foundation::core::Point;
use crate::overlay::font::FontSpec;
use crate::overlay::model::{ColorToken, TextSegment, TitleOverlay};

fn one_title() -> OverlaySet {
    OverlaySet {
        titles: vec![TitleOverlay {
            segments: vec![TextSegment::new("hi", ColorToken::css("blue"))],
            position: Point::new(0.0, 0.0),
            start_time: 0.0,
            end_time: 1.0,
            style: FontSpec::new("Arial", 20.0),
            type_speed: 10.0,
        }],
        image: None,
    }
}

#[test]
fn document_flattens_overlays_next_to_fonts() {
    let doc = OverlayDocument::from_json_str(
        r#"{
            "fonts": ["fonts/Inter.ttf"],
            "titles": [],
            "image": {"url": "a.png", "position": {"x": 1, "y": 2}, "startTime": 0, "endTime": 1}
        }"#,
    )
    .unwrap();
    assert_eq!(doc.fonts, vec!["fonts/Inter.ttf".to_owned()]);
    assert_eq!(doc.overlays.image.as_ref().unwrap().url, "a.png");
    assert_eq!(doc.assets_root(), Path::new("."));
}

#[test]
fn from_path_resolves_root_to_parent_dir() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.json");
    std::fs::write(&path, r#"{"titles": []}"#).unwrap();
    let doc = OverlayDocument::from_path(&path).unwrap();
    assert_eq!(doc.assets_root(), dir.path());
}

#[test]
fn malformed_json_is_a_serde_error() {
    let err = OverlayDocument::from_json_str("{").unwrap_err();
    assert!(matches!(err, ReelError::Serde(_)));
}

#[test]
fn snapshots_are_isolated_from_later_edits() {
    let live = LiveOverlays::new(one_title());
    let before = live.snapshot();
    live.update(|set| set.titles.clear());
    assert_eq!(before.titles.len(), 1);
    assert!(live.snapshot().titles.is_empty());
}

#[test]
fn diagnostics_toggle_round_trips() {
    let live = LiveOverlays::default();
    assert!(!live.diagnostics_enabled());
    live.set_diagnostics(true);
    assert!(live.diagnostics_enabled());
}

#[test]
fn concurrent_updates_are_not_lost() {
    let live = LiveOverlays::new(OverlaySet::default());
    let title = one_title().titles.remove(0);
    let before = live.snapshot();
    std::thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                for _ in 0..50 {
                    live.update(|set| set.titles.push(title.clone()));
                }
            });
        }
    });
    assert_eq!(live.snapshot().titles.len(), 400);
    assert!(before.titles.is_empty());
}
