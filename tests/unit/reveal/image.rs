use super::*;
use crate::foundation::core::Point;
use crate::overlay::model::DEFAULT_FADE_IN_SECS;

fn img(start: f64, end: f64) -> ImageOverlay {
    ImageOverlay {
        url: "mage.jpg".to_owned(),
        position: Point::new(820.0, 400.0),
        start_time: start,
        end_time: end,
    }
}

#[test]
fn fade_example_values() {
    let o = img(6.0, 10.0);
    let half = reveal_image(&o, 6.5, true, DEFAULT_FADE_IN_SECS).unwrap();
    assert!((half.opacity - 0.5).abs() < 1e-6);
    let full = reveal_image(&o, 7.0, true, DEFAULT_FADE_IN_SECS).unwrap();
    assert_eq!(full.opacity, 1.0);
    assert!(reveal_image(&o, 11.0, true, DEFAULT_FADE_IN_SECS).is_none());
    assert!(reveal_image(&o, 5.9, true, DEFAULT_FADE_IN_SECS).is_none());
}

#[test]
fn not_loaded_is_not_visible() {
    let o = img(0.0, 10.0);
    assert!(reveal_image(&o, 5.0, false, DEFAULT_FADE_IN_SECS).is_none());
}

#[test]
fn opacity_is_clamped_and_non_decreasing() {
    let o = img(2.0, 9.0);
    let mut prev = 0.0f32;
    for i in 0..=700 {
        let t = 2.0 + f64::from(i) * 0.01;
        let r = reveal_image(&o, t, true, DEFAULT_FADE_IN_SECS).unwrap();
        assert!((0.0..=1.0).contains(&r.opacity));
        assert!(r.opacity >= prev);
        if t >= 3.0 {
            assert_eq!(r.opacity, 1.0);
        }
        prev = r.opacity;
    }
}

#[test]
fn zero_fade_is_immediately_opaque() {
    let o = img(1.0, 2.0);
    assert_eq!(reveal_image(&o, 1.0, true, 0.0).unwrap().opacity, 1.0);
}

#[test]
fn inverted_window_never_shows() {
    let o = img(5.0, 4.0);
    assert!(reveal_image(&o, 4.5, true, DEFAULT_FADE_IN_SECS).is_none());
    assert!(reveal_image(&o, 5.0, true, DEFAULT_FADE_IN_SECS).is_none());
}
