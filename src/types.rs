use std::fmt;

/// A resolved, canonical 32-bit RGBA color. Displays as `#rrggbbaa`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0,
        g: 0,
        b: 0,
        a: 255,
    };

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Parses exactly `#rrggbbaa` (either case).
    pub fn from_canonical(input: &str) -> Option<Color> {
        let hex = input.strip_prefix('#')?;
        if hex.len() != 8 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        Some(Color {
            r: u8::from_str_radix(&hex[0..2], 16).ok()?,
            g: u8::from_str_radix(&hex[2..4], 16).ok()?,
            b: u8::from_str_radix(&hex[4..6], 16).ok()?,
            a: u8::from_str_radix(&hex[6..8], 16).ok()?,
        })
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

/// A resolved paint: either a flat color or an explicit "paint nothing".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Paint {
    None,
    Color(Color),
}

impl Paint {
    pub fn color(self) -> Option<Color> {
        match self {
            Paint::None => None,
            Paint::Color(color) => Some(color),
        }
    }
}

impl fmt::Display for Paint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Paint::None => f.write_str("none"),
            Paint::Color(color) => color.fmt(f),
        }
    }
}

/// Axis-aligned bounding box in user units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BBox {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl BBox {
    pub const ORIGIN: BBox = BBox {
        min_x: 0.0,
        min_y: 0.0,
        max_x: 0.0,
        max_y: 0.0,
    };

    /// Tight box over `points`. Unlike a box seeded at the origin, a shape far
    /// from (0, 0) does not stretch back to it.
    pub fn from_points(points: &[(f32, f32)]) -> BBox {
        let Some(&(x0, y0)) = points.first() else {
            return BBox::ORIGIN;
        };
        let mut out = BBox {
            min_x: x0,
            min_y: y0,
            max_x: x0,
            max_y: y0,
        };
        for &(x, y) in &points[1..] {
            out.min_x = out.min_x.min(x);
            out.min_y = out.min_y.min(y);
            out.max_x = out.max_x.max(x);
            out.max_y = out.max_y.max(y);
        }
        out
    }

    pub fn around(cx: f32, cy: f32, rx: f32, ry: f32) -> BBox {
        BBox {
            min_x: cx - rx,
            min_y: cy - ry,
            max_x: cx + rx,
            max_y: cy + ry,
        }
    }

    // Half-open on every axis: boxes that only touch do not overlap.
    pub fn overlaps(&self, other: &BBox) -> bool {
        self.min_x < other.max_x
            && other.min_x < self.max_x
            && self.min_y < other.max_y
            && other.min_y < self.max_y
    }
}

/// Formats a number the way SVG authors write them: no trailing `.0`, no `-0`.
pub(crate) fn fmt_number<T: Into<f64> + fmt::Display + Copy>(value: T) -> String {
    if value.into() == 0.0 {
        return "0".to_string();
    }
    format!("{}", value)
}

/// Lenient SVG number parse; unit suffixes are ignored.
pub(crate) fn parse_number(input: &str) -> Option<f32> {
    let s = input.trim();
    let s = s
        .trim_end_matches("px")
        .trim_end_matches("pt")
        .trim_end_matches("mm")
        .trim_end_matches("cm")
        .trim_end_matches("in")
        .trim();
    s.parse::<f32>().ok()
}
