use crate::overlay::model::ColorToken;

/// Resolve a caption color token into straight-alpha RGBA8.
///
/// Accepts `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb()`/`rgba()`, `hsl()`/`hsla()` and the
/// common CSS color keywords. Returns `None` for anything else.
pub fn resolve_color(token: &ColorToken) -> Option<[u8; 4]> {
    match token {
        ColorToken::Rgba(rgba) => Some(*rgba),
        ColorToken::Css(s) => parse_css_color(s),
    }
}

fn parse_css_color(s: &str) -> Option<[u8; 4]> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }
    let lower = s.to_ascii_lowercase();
    if let Some((name, args)) = lower.split_once('(') {
        let args = args.strip_suffix(')')?;
        return match name.trim() {
            "rgb" | "rgba" => parse_rgb_fn(args),
            "hsl" | "hsla" => parse_hsl_fn(args),
            _ => None,
        };
    }
    named_color(&lower)
}

fn parse_hex(s: &str) -> Option<[u8; 4]> {
    fn nibble(c: u8) -> Option<u8> {
        (c as char).to_digit(16).map(|d| d as u8)
    }
    fn byte(pair: &[u8]) -> Option<u8> {
        Some(nibble(pair[0])? * 16 + nibble(pair[1])?)
    }

    let b = s.as_bytes();
    match b.len() {
        3 | 4 => {
            let mut out = [255u8; 4];
            for (i, c) in b.iter().enumerate() {
                out[i] = nibble(*c)? * 17;
            }
            Some(out)
        }
        6 | 8 => {
            let mut out = [255u8; 4];
            for (i, pair) in b.chunks_exact(2).enumerate() {
                out[i] = byte(pair)?;
            }
            Some(out)
        }
        _ => None,
    }
}

/// Split CSS function arguments on commas, whitespace and the `/` alpha separator.
fn fn_args(args: &str) -> Vec<&str> {
    args.split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .collect()
}

fn parse_alpha(tok: Option<&&str>) -> Option<f64> {
    let Some(tok) = tok else {
        return Some(1.0);
    };
    let v = match tok.strip_suffix('%') {
        Some(p) => p.parse::<f64>().ok()? / 100.0,
        None => tok.parse::<f64>().ok()?,
    };
    v.is_finite().then(|| v.clamp(0.0, 1.0))
}

fn parse_rgb_fn(args: &str) -> Option<[u8; 4]> {
    let parts = fn_args(args);
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let channel = |tok: &str| -> Option<u8> {
        let v = match tok.strip_suffix('%') {
            Some(p) => p.parse::<f64>().ok()? * 2.55,
            None => tok.parse::<f64>().ok()?,
        };
        v.is_finite().then(|| v.round().clamp(0.0, 255.0) as u8)
    };
    let a = parse_alpha(parts.get(3))?;
    Some([
        channel(parts[0])?,
        channel(parts[1])?,
        channel(parts[2])?,
        unit_to_u8(a),
    ])
}

fn parse_hsl_fn(args: &str) -> Option<[u8; 4]> {
    let parts = fn_args(args);
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let h = parts[0].trim_end_matches("deg").parse::<f64>().ok()?;
    let s = parts[1].strip_suffix('%')?.parse::<f64>().ok()? / 100.0;
    let l = parts[2].strip_suffix('%')?.parse::<f64>().ok()? / 100.0;
    let a = parse_alpha(parts.get(3))?;
    if !h.is_finite() || !s.is_finite() || !l.is_finite() {
        return None;
    }
    let (r, g, b) = hsl_to_rgb(h, s, l);
    Some([unit_to_u8(r), unit_to_u8(g), unit_to_u8(b), unit_to_u8(a)])
}

fn unit_to_u8(x: f64) -> u8 {
    (x.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (f64, f64, f64) {
    let h = (h % 360.0 + 360.0) % 360.0 / 360.0;
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    if s == 0.0 {
        return (l, l, l);
    }

    fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            return p + (q - p) * 6.0 * t;
        }
        if t < 1.0 / 2.0 {
            return q;
        }
        if t < 2.0 / 3.0 {
            return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
        }
        p
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;

    (
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
    )
}

fn named_color(name: &str) -> Option<[u8; 4]> {
    let rgb: [u8; 3] = match name {
        "transparent" => return Some([0, 0, 0, 0]),
        "black" => [0, 0, 0],
        "white" => [255, 255, 255],
        "red" => [255, 0, 0],
        "green" => [0, 128, 0],
        "lime" => [0, 255, 0],
        "blue" => [0, 0, 255],
        "yellow" => [255, 255, 0],
        "cyan" | "aqua" => [0, 255, 255],
        "magenta" | "fuchsia" => [255, 0, 255],
        "gray" | "grey" => [128, 128, 128],
        "silver" => [192, 192, 192],
        "maroon" => [128, 0, 0],
        "olive" => [128, 128, 0],
        "navy" => [0, 0, 128],
        "purple" => [128, 0, 128],
        "teal" => [0, 128, 128],
        "orange" => [255, 165, 0],
        "pink" => [255, 192, 203],
        "brown" => [165, 42, 42],
        "gold" => [255, 215, 0],
        "violet" => [238, 130, 238],
        "indigo" => [75, 0, 130],
        _ => return None,
    };
    Some([rgb[0], rgb[1], rgb[2], 255])
}

#[cfg(test)]
#[path = "../../tests/unit/render/color.rs"]
mod tests;
