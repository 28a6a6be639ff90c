use super::*;

fn css(s: &str) -> Option<[u8; 4]> {
    resolve_color(&ColorToken::css(s))
}

#[test]
fn hex_forms() {
    assert_eq!(css("#ff0000"), Some([255, 0, 0, 255]));
    assert_eq!(css("#FFFFFF"), Some([255, 255, 255, 255]));
    assert_eq!(css("#0000ff80"), Some([0, 0, 255, 128]));
    assert_eq!(css("#f00"), Some([255, 0, 0, 255]));
    assert_eq!(css("#f008"), Some([255, 0, 0, 136]));
    assert_eq!(css("#12345"), None);
    assert_eq!(css("#gg0000"), None);
}

#[test]
fn rgb_functions() {
    assert_eq!(css("rgba(0,0,0,0.5)"), Some([0, 0, 0, 128]));
    assert_eq!(css("rgb(255, 128, 0)"), Some([255, 128, 0, 255]));
    assert_eq!(css("rgb(255 0 0 / 50%)"), Some([255, 0, 0, 128]));
    assert_eq!(css("RGBA(255,255,255,0.2)"), Some([255, 255, 255, 51]));
    assert_eq!(css("rgb(1,2)"), None);
}

#[test]
fn hsl_functions() {
    assert_eq!(css("hsl(0, 100%, 50%)"), Some([255, 0, 0, 255]));
    assert_eq!(css("hsla(240, 100%, 50%, 0.5)"), Some([0, 0, 255, 128]));
    assert_eq!(css("hsl(0, 0%, 100%)"), Some([255, 255, 255, 255]));
}

#[test]
fn named_colors_from_the_authoring_tool() {
    assert_eq!(css("yellow"), Some([255, 255, 0, 255]));
    assert_eq!(css("Red"), Some([255, 0, 0, 255]));
    assert_eq!(css(" blue "), Some([0, 0, 255, 255]));
    assert_eq!(css("transparent"), Some([0, 0, 0, 0]));
}

#[test]
fn unknown_tokens_do_not_resolve() {
    assert_eq!(css("not-a-color"), None);
    assert_eq!(css(""), None);
    assert_eq!(css("url(x)"), None);
}

#[test]
fn rgba_tuple_passes_through() {
    assert_eq!(
        resolve_color(&ColorToken::Rgba([1, 2, 3, 4])),
        Some([1, 2, 3, 4])
    );
}
