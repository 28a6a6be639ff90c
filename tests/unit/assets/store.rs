use std::io::Cursor;

use super::*;
use crate::foundation::core::Point;
use crate::overlay::model::{ImageOverlay, OverlaySet};

#[test]
fn normalize_path_slash_normalization() {
    assert_eq!(normalize_rel_path("a/b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("a\\b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("./a//b.png").unwrap(), "a/b.png");
    assert!(normalize_rel_path("../x.png").is_err());
    assert!(normalize_rel_path("/abs.png").is_err());
    assert!(normalize_rel_path("").is_err());
    assert!(normalize_rel_path("./.").is_err());
}

#[test]
fn no_fonts_means_no_face() {
    let assets = OverlayAssets::new();
    assert_eq!(assets.resolve_face("Arial"), None);
}

#[test]
fn garbage_font_bytes_are_rejected() {
    let mut assets = OverlayAssets::new();
    assert!(assets.register_font(b"not a font".to_vec()).is_err());
    assert!(assets.fonts().is_empty());
}

#[test]
fn straight_rgba_is_premultiplied_and_length_checked() {
    let img = PreparedImage::from_straight_rgba8(1, 1, &[200, 100, 50, 0]).unwrap();
    assert_eq!(img.rgba8_premul.as_slice(), &[0, 0, 0, 0]);
    assert!(PreparedImage::from_straight_rgba8(2, 2, &[0; 4]).is_err());
}

#[test]
fn load_reads_image_and_skips_missing_fonts() {
    let dir = tempfile::tempdir().unwrap();
    let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([255, 0, 0, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    std::fs::write(dir.path().join("mage.png"), buf).unwrap();

    let mut doc = OverlayDocument::new(OverlaySet {
        titles: Vec::new(),
        image: Some(ImageOverlay {
            url: "mage.png".to_owned(),
            position: Point::new(0.0, 0.0),
            start_time: 0.0,
            end_time: 1.0,
        }),
    })
    .with_assets_root(dir.path());
    doc.fonts.push("fonts/missing.ttf".to_owned());

    let assets = OverlayAssets::load(&doc);
    assert!(assets.fonts().is_empty());
    let loaded = assets.image("mage.png").unwrap();
    assert_eq!((loaded.width, loaded.height), (4, 4));
}

#[test]
fn missing_image_stays_absent() {
    let dir = tempfile::tempdir().unwrap();
    let doc = OverlayDocument::new(OverlaySet {
        titles: Vec::new(),
        image: Some(ImageOverlay {
            url: "nope.png".to_owned(),
            position: Point::new(0.0, 0.0),
            start_time: 0.0,
            end_time: 1.0,
        }),
    })
    .with_assets_root(dir.path());
    let assets = OverlayAssets::load(&doc);
    assert!(assets.image("nope.png").is_none());
}

#[test]
fn engine_without_faces_reports_unregistered_face() {
    let mut engine = TextLayoutEngine::new(&OverlayAssets::new());
    let err = engine
        .shape_line("hi", 0, &FontSpec::new("Arial", 20.0))
        .unwrap_err();
    assert_eq!(
        err.kind(),
        crate::foundation::error::ErrorKind::ResourceUnavailable
    );
}
