use crate::error::LayerFontError;
use crate::types::{Color, Paint};

/// Normalizes an SVG paint value to a canonical color.
///
/// `None` (no paint declared) is passed through so the caller can fall back to
/// the inherited paint. Accepted forms are `none`, `#rgb`, `#rrggbb`,
/// `#rrggbbaa` and `rgb(r, g, b)` with percentage or 0-255 components.
pub fn normalize(input: Option<&str>) -> Result<Option<Paint>, LayerFontError> {
    let Some(raw) = input else {
        return Ok(None);
    };
    let v = raw.trim().to_ascii_lowercase();
    if v == "none" {
        return Ok(Some(Paint::None));
    }
    let color = if let Some(hex) = v.strip_prefix('#') {
        parse_hex(hex)
    } else if let Some(args) = v.strip_prefix("rgb(").and_then(|s| s.strip_suffix(')')) {
        parse_rgb_args(args)
    } else {
        None
    };
    match color {
        Some(color) => Ok(Some(Paint::Color(color))),
        None => Err(LayerFontError::InvalidColor(raw.to_string())),
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok();
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => Some(Color::rgb(nibble(0)? * 17, nibble(1)? * 17, nibble(2)? * 17)),
        6 => Some(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Color {
            r: byte(0)?,
            g: byte(2)?,
            b: byte(4)?,
            a: byte(6)?,
        }),
        _ => None,
    }
}

fn parse_rgb_args(args: &str) -> Option<Color> {
    let mut channels = [0u8; 3];
    let mut parts = args.split(',');
    for slot in channels.iter_mut() {
        let part = parts.next()?.trim();
        let value = if let Some(pct) = part.strip_suffix('%') {
            pct.trim().parse::<f64>().ok()? * 2.55
        } else {
            part.parse::<f64>().ok()?
        };
        *slot = value.round().clamp(0.0, 255.0) as u8;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(Color::rgb(channels[0], channels[1], channels[2]))
}

/// Scales the alpha byte by `factor`, which is the product of all ancestor opacities.
pub fn composite_opacity(paint: Paint, factor: f32) -> Paint {
    match paint {
        Paint::None => Paint::None,
        Paint::Color(color) => {
            let alpha = (color.a as f64 * factor as f64).round().clamp(0.0, 255.0) as u8;
            Paint::Color(color.with_alpha(alpha))
        }
    }
}

/// Flattens a gradient to the rounded mean of its stop colors. Alpha is dropped;
/// the result is always opaque, and an empty stop list is black.
pub fn resolve_gradient(stops: &[Color]) -> Color {
    if stops.is_empty() {
        return Color::BLACK;
    }
    let n = stops.len() as f64;
    let mean = |channel: fn(&Color) -> u8| {
        let sum: u32 = stops.iter().map(|c| channel(c) as u32).sum();
        (sum as f64 / n).round() as u8
    };
    Color::rgb(mean(|c| c.r), mean(|c| c.g), mean(|c| c.b))
}

/// Returns the `#id` target of a `url(#id)` paint, quotes stripped.
pub(crate) fn url_reference(input: &str) -> Option<&str> {
    let s = input.trim();
    let inner = s
        .strip_prefix("url(")
        .or_else(|| s.strip_prefix("URL("))?
        .strip_suffix(')')?
        .trim()
        .trim_matches('"')
        .trim_matches('\'');
    if inner.len() < 2 || !inner.starts_with('#') {
        return None;
    }
    Some(inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(input: &str) -> String {
        normalize(Some(input))
            .expect("valid color")
            .expect("explicit paint")
            .to_string()
    }

    #[test]
    fn expands_short_and_long_hex() {
        assert_eq!(norm("#abc"), "#aabbccff");
        assert_eq!(norm("#A0B1C2"), "#a0b1c2ff");
        assert_eq!(norm("#a0b1c280"), "#a0b1c280");
    }

    #[test]
    fn rgb_percentages_scale_by_255() {
        assert_eq!(norm("rgb(100%,0%,0%)"), "#ff0000ff");
        assert_eq!(norm("rgb(60%, 20%, 120%)"), "#9933ffff");
        assert_eq!(norm("rgb(0, 128, 300)"), "#0080ffff");
    }

    #[test]
    fn absent_and_none_pass_through() {
        assert_eq!(normalize(None).unwrap(), None);
        assert_eq!(normalize(Some("none")).unwrap(), Some(Paint::None));
        assert_eq!(normalize(Some(" NONE ")).unwrap(), Some(Paint::None));
    }

    #[test]
    fn normalize_is_idempotent_on_canonical_values() {
        for input in ["#abc", "#123456", "rgb(10%,20%,30%)", "#00000000"] {
            let once = norm(input);
            assert_eq!(norm(&once), once);
        }
    }

    #[test]
    fn unknown_formats_are_rejected() {
        for input in ["red", "#12345", "#ggg", "hsl(0, 100%, 50%)", "rgb(1,2)", "url(#g)"] {
            assert!(
                matches!(normalize(Some(input)), Err(LayerFontError::InvalidColor(_))),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn opacity_scales_existing_alpha() {
        let c = normalize(Some("#112233ff")).unwrap().unwrap();
        assert_eq!(composite_opacity(c, 0.5).to_string(), "#11223380");
        let half = normalize(Some("#11223380")).unwrap().unwrap();
        assert_eq!(composite_opacity(half, 0.5).to_string(), "#11223340");
        assert_eq!(composite_opacity(Paint::None, 0.5), Paint::None);
        assert_eq!(composite_opacity(c, 1.0), c);
    }

    #[test]
    fn gradients_average_to_an_opaque_color() {
        let stops = [
            Color::rgb(0, 255, 0),
            Color::rgb(0, 0, 255).with_alpha(0x10),
        ];
        assert_eq!(resolve_gradient(&stops).to_string(), "#008080ff");
        assert_eq!(resolve_gradient(&[]), Color::BLACK);
    }

    #[test]
    fn url_references_keep_the_hash() {
        assert_eq!(url_reference("url(#grad1)"), Some("#grad1"));
        assert_eq!(url_reference("url('#g')"), Some("#g"));
        assert_eq!(url_reference("#g"), None);
        assert_eq!(url_reference("url(#)"), None);
    }
}
