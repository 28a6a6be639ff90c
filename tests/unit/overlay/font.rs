use super::*;
use serde_json::json;

#[test]
fn parses_css_shorthand() {
    let f = FontSpec::parse_css("50px Arial").unwrap();
    assert_eq!(f, FontSpec::new("Arial", 50.0));

    let f = FontSpec::parse_css("italic bold 100px \"Noto Sans\"").unwrap();
    assert_eq!(f.family, "Noto Sans");
    assert_eq!(f.size_px, 100.0);
}

#[test]
fn rejects_missing_size_or_family() {
    assert!(FontSpec::parse_css("Arial").is_err());
    assert!(FontSpec::parse_css("40px").is_err());
    assert!(FontSpec::parse_css("0px Arial").is_err());
}

#[test]
fn line_pitch_is_size_times_1_2() {
    let f = FontSpec::new("Arial", 50.0);
    assert!((f.line_pitch() - 60.0).abs() < 1e-9);
}

#[test]
fn serde_accepts_both_forms_and_writes_shorthand() {
    let a: FontSpec = serde_json::from_value(json!("40px Arial")).unwrap();
    let b: FontSpec = serde_json::from_value(json!({"family": "Arial", "sizePx": 40})).unwrap();
    assert_eq!(a, b);
    assert_eq!(serde_json::to_value(&a).unwrap(), json!("40px Arial"));
}
