use serde::{Deserialize, Serialize};

use crate::foundation::error::{ReelError, ReelResult};

/// Font family plus pixel size for one caption.
///
/// Deserializes from either `{ "family": "Arial", "sizePx": 50 }` or the CSS-style shorthand
/// `"50px Arial"` used by the authoring tool. Serializes back to the shorthand.
#[derive(Clone, Debug, PartialEq)]
pub struct FontSpec {
    /// Family name used to look up a registered font. Matching is case-insensitive.
    pub family: String,
    /// Em size in pixels.
    pub size_px: f32,
}

impl FontSpec {
    /// Create a font spec.
    pub fn new(family: impl Into<String>, size_px: f32) -> Self {
        Self {
            family: family.into(),
            size_px,
        }
    }

    /// Parse the `"[style] [weight] <size>px <family>"` shorthand.
    ///
    /// Only the size and family are kept; style and weight tokens before the size are ignored.
    pub fn parse_css(s: &str) -> ReelResult<Self> {
        let mut tokens = s.split_whitespace();
        let size_px = loop {
            let Some(tok) = tokens.next() else {
                return Err(ReelError::validation(format!(
                    "font \"{s}\" has no pixel size (expected e.g. \"50px Arial\")"
                )));
            };
            if let Some(num) = tok.strip_suffix("px")
                && let Ok(v) = num.parse::<f32>()
            {
                break v;
            }
        };

        let family = tokens
            .collect::<Vec<_>>()
            .join(" ")
            .trim_matches(|c| c == '"' || c == '\'')
            .to_owned();
        if family.is_empty() {
            return Err(ReelError::validation(format!(
                "font \"{s}\" has no family name"
            )));
        }
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(ReelError::validation(format!(
                "font \"{s}\" size must be finite and > 0"
            )));
        }

        Ok(Self { family, size_px })
    }

    /// Vertical distance between consecutive caption lines.
    pub fn line_pitch(&self) -> f64 {
        f64::from(self.size_px) * 1.2
    }

    pub(crate) fn size_key(&self) -> u32 {
        self.size_px.to_bits()
    }
}

impl std::fmt::Display for FontSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}px {}", self.size_px, self.family)
    }
}

impl Serialize for FontSpec {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FontSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Css(String),
            #[serde(rename_all = "camelCase")]
            Obj { family: String, size_px: f32 },
        }

        match Repr::deserialize(deserializer)? {
            Repr::Css(s) => Self::parse_css(&s).map_err(serde::de::Error::custom),
            Repr::Obj { family, size_px } => {
                if !size_px.is_finite() || size_px <= 0.0 {
                    return Err(serde::de::Error::custom(
                        "font sizePx must be finite and > 0",
                    ));
                }
                Ok(Self { family, size_px })
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/font.rs"]
mod tests;
