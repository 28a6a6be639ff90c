use super::*;
use crate::overlay::font::FontSpec;
use crate::overlay::model::{ColorToken, ImageOverlay, TextSegment, TitleOverlay};

struct PerChar;

impl TextMeasure for PerChar {
    fn advance(&mut self, text: &str, font: &FontSpec) -> f64 {
        text.chars().count() as f64 * f64::from(font.size_px) * 0.5
    }
}

const CANVAS: Canvas = Canvas {
    width: 1280,
    height: 720,
};

fn title(start: f64, end: f64) -> TitleOverlay {
    TitleOverlay {
        segments: vec![
            TextSegment::new("AB", ColorToken::css("red")),
            TextSegment::new("CD", ColorToken::css("blue")),
        ],
        position: Point::new(10.0, 100.0),
        start_time: start,
        end_time: end,
        style: FontSpec::new("Arial", 20.0),
        type_speed: 2.0,
    }
}

fn set() -> OverlaySet {
    OverlaySet {
        titles: vec![title(0.0, 10.0), title(5.0, 8.0)],
        image: Some(ImageOverlay {
            url: "img.png".to_owned(),
            position: Point::new(820.0, 300.0),
            start_time: 6.0,
            end_time: 10.0,
        }),
    }
}

fn compile(overlays: &OverlaySet, time: f64, diagnostics: bool, image_loaded: bool) -> FramePlan {
    let req = FrameRequest {
        time,
        overlays,
        diagnostics,
        fade_in_secs: 1.0,
        image_loaded,
    };
    compile_frame(CANVAS, &req, &mut PerChar)
}

#[test]
fn base_only_when_nothing_is_active() {
    let s = set();
    let plan = compile(&s, 11.0, false, true);
    assert_eq!(plan.ops(), &[DrawOp::Base]);
}

#[test]
fn inactive_overlays_contribute_no_ops() {
    let s = set();
    for i in 0..=120 {
        let t = f64::from(i) / 10.0;
        let plan = compile(&s, t, false, true);
        if !(5.0..=8.0).contains(&t) {
            assert_eq!(plan.layer_ops(Layer::Title(1)).count(), 0, "t={t}");
        }
        if !(6.0..=10.0).contains(&t) {
            assert_eq!(plan.layer_ops(Layer::Image).count(), 0, "t={t}");
        }
    }
}

#[test]
fn two_segment_example_compiles_to_two_lines() {
    let s = OverlaySet {
        titles: vec![title(0.0, 10.0)],
        image: None,
    };
    let plan = compile(&s, 1.5, false, false);
    let lines: Vec<_> = plan.layer_ops(Layer::Title(0)).cloned().collect();
    assert_eq!(
        lines,
        vec![
            DrawOp::TextLine {
                title: 0,
                segment: 0,
                range: 0..2,
                origin: Point::new(10.0, 100.0),
            },
            DrawOp::TextLine {
                title: 0,
                segment: 1,
                range: 0..1,
                origin: Point::new(30.0, 100.0),
            },
        ]
    );
}

#[test]
fn layers_are_in_painter_order() {
    let s = set();
    let plan = compile(&s, 7.0, true, true);
    let layers: Vec<_> = plan.ops().iter().map(DrawOp::layer).collect();
    let mut sorted = layers.clone();
    sorted.sort();
    assert_eq!(layers, sorted);
    assert_eq!(layers.first(), Some(&Layer::Base));
    assert_eq!(layers.last(), Some(&Layer::Diagnostics));
    assert!(layers.contains(&Layer::Title(0)));
    assert!(layers.contains(&Layer::Title(1)));
    assert!(layers.contains(&Layer::Image));
}

#[test]
fn image_op_uses_fixed_geometry_and_fade() {
    let s = set();
    let plan = compile(&s, 6.5, false, true);
    let op = plan.layer_ops(Layer::Image).next().cloned().unwrap();
    let DrawOp::Image {
        rect,
        radius,
        opacity,
    } = op
    else {
        panic!("expected image op");
    };
    assert_eq!(rect, Rect::new(820.0, 300.0, 1220.0, 700.0));
    assert_eq!(radius, 20.0);
    assert!((opacity - 0.5).abs() < 1e-6);
}

#[test]
fn unloaded_image_is_skipped() {
    let s = set();
    let plan = compile(&s, 7.0, false, false);
    assert_eq!(plan.layer_ops(Layer::Image).count(), 0);
}

#[test]
fn recompiling_reuses_plan_and_is_deterministic() {
    let s = set();
    let req = FrameRequest {
        time: 7.25,
        overlays: &s,
        diagnostics: true,
        fade_in_secs: 1.0,
        image_loaded: true,
    };
    let mut plan = FramePlan::new(CANVAS);
    compile_frame_into(&mut plan, &req, &mut PerChar);
    let first = plan.ops().to_vec();
    compile_frame_into(&mut plan, &req, &mut PerChar);
    assert_eq!(plan.ops(), first.as_slice());
}

#[test]
fn zero_speed_caption_draws_nothing() {
    let mut t = title(0.0, 10.0);
    t.type_speed = 0.0;
    let s = OverlaySet {
        titles: vec![t],
        image: None,
    };
    for i in 0..100 {
        let plan = compile(&s, f64::from(i) / 10.0, false, false);
        assert_eq!(plan.ops(), &[DrawOp::Base]);
    }
}
