use crate::scene::Presentation;
use crate::types::{Color, fmt_number, parse_number};
use lightningcss::printer::PrinterOptions;
use lightningcss::properties::Property;
use lightningcss::properties::svg::{SVGPaint, SVGPaintFallback};
use lightningcss::stylesheet::{ParserOptions, StyleAttribute};
use lightningcss::traits::ToCss;
use lightningcss::values::color::{CssColor, SRGB};

// Inline style="" declarations win over presentation attributes. Only the
// properties that take part in layer decomposition are folded; the style
// attribute itself is never forwarded to the outline compiler.
pub(crate) fn fold_style(input: &str, out: &mut Presentation) {
    if let Ok(style_attr) = StyleAttribute::parse(input, ParserOptions::default()) {
        for prop in style_attr
            .declarations
            .declarations
            .iter()
            .chain(style_attr.declarations.important_declarations.iter())
        {
            apply_property(prop, out);
        }
        return;
    }
    fold_style_legacy(input, out);
}

/// `stop-color` is not a typed property in the CSS parser, so stops always use
/// the plain declaration splitter.
pub(crate) fn stop_color_from_style(input: &str) -> Option<String> {
    declarations(input)
        .filter(|(key, _)| key == "stop-color")
        .map(|(_, value)| value.to_string())
        .last()
}

fn apply_property(prop: &Property<'_>, out: &mut Presentation) {
    match prop {
        Property::Fill(paint) => {
            if let Some(value) = paint_to_attr(paint) {
                out.fill = Some(value);
            }
        }
        Property::Stroke(paint) => {
            if let Some(value) = paint_to_attr(paint) {
                out.stroke = Some(value);
            }
        }
        Property::StrokeWidth(value) => {
            if let Ok(raw) = value.to_css_string(PrinterOptions::default()) {
                if let Some(v) = parse_number(&raw) {
                    out.stroke_width = Some(fmt_number(v.max(0.0)));
                }
            }
        }
        Property::Opacity(value) => {
            out.opacity = Some(fmt_number(value.0.clamp(0.0, 1.0)));
        }
        _ => {}
    }
}

fn paint_to_attr(paint: &SVGPaint<'_>) -> Option<String> {
    match paint {
        SVGPaint::None => Some("none".to_string()),
        SVGPaint::Color(color) => css_color_to_attr(color),
        SVGPaint::Url { url, fallback } => {
            let raw = url.url.as_ref().trim();
            if raw.len() > 1 && raw.starts_with('#') {
                return Some(format!("url({})", raw));
            }
            match fallback {
                Some(SVGPaintFallback::Color(color)) => css_color_to_attr(color),
                Some(SVGPaintFallback::None) => Some("none".to_string()),
                None => None,
            }
        }
        SVGPaint::ContextFill | SVGPaint::ContextStroke => None,
    }
}

fn css_color_to_attr(color: &CssColor) -> Option<String> {
    if let CssColor::RGBA(rgba) = color {
        let alpha = (rgba.alpha as f32 / 255.0).clamp(0.0, 1.0);
        let c = Color {
            r: rgba.red,
            g: rgba.green,
            b: rgba.blue,
            a: (alpha * 255.0).round() as u8,
        };
        return Some(c.to_string());
    }
    if let Ok(srgb) = SRGB::try_from(color) {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        return Some(Color::rgb(channel(srgb.r), channel(srgb.g), channel(srgb.b)).to_string());
    }
    None
}

fn fold_style_legacy(input: &str, out: &mut Presentation) {
    for (key, val) in declarations(input) {
        match key.as_str() {
            "fill" => out.fill = Some(val.to_string()),
            "stroke" => out.stroke = Some(val.to_string()),
            "stroke-width" => {
                if let Some(v) = parse_number(val) {
                    out.stroke_width = Some(fmt_number(v.max(0.0)));
                }
            }
            "opacity" => {
                if let Some(v) = parse_number(val) {
                    out.opacity = Some(fmt_number(v.clamp(0.0, 1.0)));
                }
            }
            _ => {}
        }
    }
}

fn declarations(input: &str) -> impl Iterator<Item = (String, &str)> {
    input.split(';').filter_map(|decl| {
        let (k, v) = decl.trim().split_once(':')?;
        let val = v.trim().trim_end_matches("!important").trim();
        Some((k.trim().to_ascii_lowercase(), val))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_declarations_fold_into_presentation() {
        let mut p = Presentation {
            fill: Some("#ff0000".to_string()),
            ..Presentation::default()
        };
        fold_style("fill:#0000ff; stroke: rgb(0, 255, 0); stroke-width: 2px; opacity: 0.5", &mut p);
        assert_eq!(p.fill.as_deref(), Some("#0000ffff"));
        assert_eq!(p.stroke.as_deref(), Some("#00ff00ff"));
        assert_eq!(p.stroke_width.as_deref(), Some("2"));
        assert_eq!(p.opacity.as_deref(), Some("0.5"));
    }

    #[test]
    fn style_paint_none_and_url() {
        let mut p = Presentation::default();
        fold_style("fill: url(#grad); stroke: none", &mut p);
        assert_eq!(p.fill.as_deref(), Some("url(#grad)"));
        assert_eq!(p.stroke.as_deref(), Some("none"));
    }

    #[test]
    fn legacy_splitter_handles_stop_color() {
        assert_eq!(
            stop_color_from_style("offset: 0; stop-color:#123456 ; stop-opacity:1").as_deref(),
            Some("#123456")
        );
        assert_eq!(stop_color_from_style("stop-opacity:1"), None);
    }
}
