use super::*;

#[test]
fn default_level_is_info_text() {
    let c = LoggingConfig::default();
    assert_eq!(c.level, "info");
    assert!(!c.json);
}

#[test]
fn config_deserializes_from_json() {
    let c: LoggingConfig =
        serde_json::from_str(r#"{ "level": "typereel=debug", "json": true }"#).unwrap();
    assert_eq!(c.level, "typereel=debug");
    assert!(c.json);
}

#[test]
fn second_install_reports_false() {
    let cfg = LoggingConfig {
        level: "warn".to_owned(),
        json: false,
    };
    let _ = init_logging(&cfg);
    assert!(!init_logging(&cfg));
}
