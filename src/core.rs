use crate::error::{OralmarkError, OralmarkResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// One of the three fixed camera angles captured per submission.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Upper,
    Front,
    Bottom,
}

impl View {
    pub const ALL: [View; 3] = [View::Upper, View::Front, View::Bottom];

    pub fn as_str(self) -> &'static str {
        match self {
            View::Upper => "upper",
            View::Front => "front",
            View::Bottom => "bottom",
        }
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for View {
    type Err = OralmarkError;

    fn from_str(s: &str) -> OralmarkResult<Self> {
        match s {
            "upper" => Ok(View::Upper),
            "front" => Ok(View::Front),
            "bottom" => Ok(View::Bottom),
            other => Err(OralmarkError::validation(format!(
                "unknown view \"{other}\" (expected upper, front, or bottom)"
            ))),
        }
    }
}

/// Straight (non-premultiplied) RGBA color carried by every annotation
/// record. Serializes as the wire's hex token (`#rrggbb`, or `#rrggbbaa`
/// when not fully opaque).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    fn to_hex_token(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex_token())
    }
}

fn parse_hex(s: &str) -> Result<Color, String> {
    let s = s.trim();
    let s = s.strip_prefix('#').unwrap_or(s);

    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    let (r, g, b, a) = match s.len() {
        6 => {
            let r = hex_byte(&s[0..2])?;
            let g = hex_byte(&s[2..4])?;
            let b = hex_byte(&s[4..6])?;
            (r, g, b, 255)
        }
        8 => {
            let r = hex_byte(&s[0..2])?;
            let g = hex_byte(&s[2..4])?;
            let b = hex_byte(&s[4..6])?;
            let a = hex_byte(&s[6..8])?;
            (r, g, b, a)
        }
        _ => {
            return Err("hex color must be #RRGGBB or #RRGGBBAA (case-insensitive)".to_owned());
        }
    };

    Ok(Color::from_rgba8(r, g, b, a))
}

impl serde::Serialize for Color {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex_token())
    }
}

impl<'de> serde::Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// A palette color with its clinical meaning; doubles as the report legend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaletteEntry {
    pub label: &'static str,
    pub color: Color,
}

/// The six finding colors offered to reviewers. Records may carry any
/// color; the palette is the advisory default set.
pub const CLINICAL_PALETTE: [PaletteEntry; 6] = [
    PaletteEntry {
        label: "Inflamed/Red Gums",
        color: Color::from_rgb8(0x6B, 0x2B, 0x2B),
    },
    PaletteEntry {
        label: "Malaligned",
        color: Color::from_rgb8(0xFF, 0xD7, 0x00),
    },
    PaletteEntry {
        label: "Receded Gums",
        color: Color::from_rgb8(0xA0, 0x52, 0x2D),
    },
    PaletteEntry {
        label: "Stains",
        color: Color::from_rgb8(0xFF, 0x00, 0x00),
    },
    PaletteEntry {
        label: "Attrition",
        color: Color::from_rgb8(0x00, 0xFF, 0xFF),
    },
    PaletteEntry {
        label: "Crowns",
        color: Color::from_rgb8(0xFF, 0x00, 0xFF),
    },
];

/// Default annotation color: the first palette entry.
pub fn default_annotation_color() -> Color {
    CLINICAL_PALETTE[0].color
}

/// Output surface dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Surface {
    pub width: u32,
    pub height: u32,
}

impl Surface {
    /// Default bounding box a base image is fitted into.
    pub const DEFAULT_MAX: Surface = Surface {
        width: 800,
        height: 600,
    };

    pub fn new(width: u32, height: u32) -> OralmarkResult<Self> {
        if width == 0 || height == 0 {
            return Err(OralmarkError::validation("Surface dimensions must be > 0"));
        }
        if width > u16::MAX as u32 || height > u16::MAX as u32 {
            return Err(OralmarkError::validation(
                "Surface dimensions must fit in u16",
            ));
        }
        Ok(Self { width, height })
    }

    /// Fit an image into `max`, preserving aspect ratio: landscape images
    /// clamp the width to `max.width`, portrait images clamp the height to
    /// `max.height`, and images already inside the box keep their natural
    /// size.
    pub fn fit(image_width: u32, image_height: u32, max: Surface) -> OralmarkResult<Self> {
        if image_width == 0 || image_height == 0 {
            return Err(OralmarkError::validation("image dimensions must be > 0"));
        }
        let iw = image_width as f64;
        let ih = image_height as f64;
        let aspect = iw / ih;

        let (w, h) = if image_width > image_height {
            let w = (max.width as f64).min(iw);
            (w, w / aspect)
        } else {
            let h = (max.height as f64).min(ih);
            (h * aspect, h)
        };

        Surface::new((w.round() as u32).max(1), (h.round() as u32).max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_parses_and_displays() {
        for v in View::ALL {
            assert_eq!(v.as_str().parse::<View>().unwrap(), v);
        }
        assert!("side".parse::<View>().is_err());
    }

    #[test]
    fn parses_hex_rgb_and_rgba() {
        let c: Color = serde_json::from_value(serde_json::json!("#ff0000")).unwrap();
        assert_eq!(c, Color::from_rgb8(255, 0, 0));

        let c: Color = serde_json::from_value(serde_json::json!("#0000ff80")).unwrap();
        assert_eq!(c, Color::from_rgba8(0, 0, 255, 0x80));

        let c: Color = serde_json::from_value(serde_json::json!("#6B2B2B")).unwrap();
        assert_eq!(c, CLINICAL_PALETTE[0].color);
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!(serde_json::from_value::<Color>(serde_json::json!("#ff00")).is_err());
        assert!(serde_json::from_value::<Color>(serde_json::json!("red")).is_err());
    }

    #[test]
    fn serializes_lowercase_hex_tokens() {
        let v = serde_json::to_value(Color::from_rgb8(0x6B, 0x2B, 0x2B)).unwrap();
        assert_eq!(v, serde_json::json!("#6b2b2b"));

        let v = serde_json::to_value(Color::from_rgba8(0, 0, 255, 0x80)).unwrap();
        assert_eq!(v, serde_json::json!("#0000ff80"));
    }

    #[test]
    fn fit_clamps_landscape_width_and_portrait_height() {
        let max = Surface::DEFAULT_MAX;

        let s = Surface::fit(1600, 1200, max).unwrap();
        assert_eq!((s.width, s.height), (800, 600));

        let s = Surface::fit(600, 1200, max).unwrap();
        assert_eq!((s.width, s.height), (300, 600));

        // Already inside the box: natural size.
        let s = Surface::fit(400, 300, max).unwrap();
        assert_eq!((s.width, s.height), (400, 300));
    }

    #[test]
    fn surface_rejects_degenerate_dimensions() {
        assert!(Surface::new(0, 10).is_err());
        assert!(Surface::new(10, 0).is_err());
        assert!(Surface::new(70_000, 10).is_err());
    }
}
