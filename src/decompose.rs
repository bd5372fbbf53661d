use std::collections::HashMap;

use log::{debug, warn};

use crate::color::{composite_opacity, normalize, resolve_gradient, url_reference};
use crate::error::LayerFontError;
use crate::merge::shape_bbox;
use crate::report::PaintReport;
use crate::scene::{NodeKind, SceneNode, SvgDocument};
use crate::types::{BBox, Color, Paint, fmt_number, parse_number};

/// Inherited rendering context threaded through the traversal.
#[derive(Debug, Clone, PartialEq)]
pub struct PaintState {
    pub fill: Paint,
    pub stroke: Paint,
    /// Product of all ancestor opacities.
    pub opacity: f32,
    pub stroke_width: String,
    /// Nearest ancestor transform, inherited verbatim.
    pub transform: Option<String>,
}

impl Default for PaintState {
    fn default() -> Self {
        Self {
            fill: Paint::Color(Color::BLACK),
            stroke: Paint::None,
            opacity: 1.0,
            stroke_width: "1".to_string(),
            transform: None,
        }
    }
}

/// One self-contained monochrome drawable. The node's paint attributes are
/// already flattened to black; the real color travels alongside.
#[derive(Debug, Clone, PartialEq)]
pub struct Sublayer {
    pub node: SceneNode,
    pub color: Color,
    pub bbox: BBox,
}

impl Sublayer {
    pub fn new(node: SceneNode, color: Color) -> Self {
        let bbox = shape_bbox(&node);
        Self { node, color, bbox }
    }

    pub fn is_transformed(&self) -> bool {
        self.node.is_transformed()
    }
}

/// Thin-stroke exclusion policy applied before outline import.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeFilter {
    pub drop_width: f32,
    pub hairline_width: f32,
    pub complex_path_len: usize,
}

impl Default for StrokeFilter {
    fn default() -> Self {
        Self {
            drop_width: 0.25,
            hairline_width: 0.1,
            complex_path_len: 500,
        }
    }
}

impl StrokeFilter {
    /// Non-path shapes always keep their stroke. An unparsable width never
    /// passes the thresholds.
    pub fn keeps(&self, node: &SceneNode, stroke_width: &str) -> bool {
        let NodeKind::Path { d } = &node.kind else {
            return true;
        };
        let width = parse_number(stroke_width).unwrap_or(f32::NAN);
        width > self.drop_width || (d.len() < self.complex_path_len && width > self.hairline_width)
    }
}

/// Splits a document into fill and stroke sublayers in painter's order.
pub fn decompose(
    doc: &SvgDocument,
    character: &str,
    policy: &StrokeFilter,
    report: &mut PaintReport,
) -> Result<Vec<Sublayer>, LayerFontError> {
    let mut walker = Decomposer {
        character,
        policy,
        report,
        definitions: HashMap::new(),
        gradients: HashMap::new(),
        expanding: Vec::new(),
        out: Vec::new(),
    };
    walker.visit(&doc.children, &PaintState::default())?;
    Ok(walker.out)
}

struct Decomposer<'a> {
    character: &'a str,
    policy: &'a StrokeFilter,
    report: &'a mut PaintReport,
    // Keyed by "#id", filled in traversal order.
    definitions: HashMap<String, SceneNode>,
    gradients: HashMap<String, Color>,
    expanding: Vec<String>,
    out: Vec<Sublayer>,
}

impl Decomposer<'_> {
    fn visit(&mut self, nodes: &[SceneNode], state: &PaintState) -> Result<(), LayerFontError> {
        for node in nodes {
            match &node.kind {
                NodeKind::Metadata => continue,
                NodeKind::Defs => {
                    self.record_definitions(node)?;
                    continue;
                }
                NodeKind::Gradient { .. } => {
                    self.record_gradient(node)?;
                    continue;
                }
                _ => {}
            }

            if let Some(id) = &node.id {
                self.definitions.insert(format!("#{id}"), node.clone());
            }

            let own_transform = node
                .presentation
                .transform
                .as_deref()
                .map(expand_pivot_rotations);
            let fill = self.resolve_paint(node.presentation.fill.as_deref())?;
            let stroke = self.resolve_paint(node.presentation.stroke.as_deref())?;
            let opacity = node
                .presentation
                .opacity
                .as_deref()
                .and_then(parse_number)
                .map_or(1.0, |o| o.clamp(0.0, 1.0));

            let inner = PaintState {
                fill: fill.unwrap_or(state.fill),
                stroke: stroke.unwrap_or(state.stroke),
                opacity: opacity * state.opacity,
                stroke_width: node
                    .presentation
                    .stroke_width
                    .clone()
                    .unwrap_or_else(|| state.stroke_width.clone()),
                transform: own_transform.or_else(|| state.transform.clone()),
            };

            match &node.kind {
                NodeKind::Group => self.visit(&node.children, &inner)?,
                NodeKind::Reference { href } => self.expand_reference(href, &inner)?,
                _ => self.emit(node, &inner),
            }
        }
        Ok(())
    }

    fn record_definitions(&mut self, defs: &SceneNode) -> Result<(), LayerFontError> {
        for def in &defs.children {
            match &def.kind {
                NodeKind::Gradient { .. } => self.record_gradient(def)?,
                NodeKind::Metadata => {}
                _ => {
                    if let Some(id) = &def.id {
                        self.definitions.insert(format!("#{id}"), def.clone());
                    }
                }
            }
        }
        Ok(())
    }

    fn record_gradient(&mut self, node: &SceneNode) -> Result<(), LayerFontError> {
        let (Some(id), NodeKind::Gradient { stops }) = (&node.id, &node.kind) else {
            return Ok(());
        };
        let mut colors = Vec::with_capacity(stops.len());
        for stop in stops {
            let paint = normalize(Some(stop.as_deref().unwrap_or("#000")))?;
            colors.push(paint.and_then(Paint::color).unwrap_or(Color::BLACK));
        }
        // A stop-less gradient inherits from the gradient it links to.
        let inherited = node
            .attributes
            .iter()
            .find(|(k, _)| k == "href" || k.ends_with(":href"))
            .and_then(|(_, v)| self.gradients.get(v.trim()).copied());
        let color = match inherited {
            Some(color) if colors.is_empty() => color,
            _ => resolve_gradient(&colors),
        };
        self.gradients.insert(format!("#{id}"), color);
        Ok(())
    }

    fn resolve_paint(&mut self, raw: Option<&str>) -> Result<Option<Paint>, LayerFontError> {
        let Some(raw) = raw else {
            return Ok(None);
        };
        if raw.trim_start().get(..3).is_some_and(|p| p.eq_ignore_ascii_case("url")) {
            if let Some(color) = url_reference(raw).and_then(|id| self.gradients.get(id)) {
                return Ok(Some(Paint::Color(*color)));
            }
            warn!("{}: no mapping for {}", self.character, raw.trim());
            self.report.record_unresolved(self.character, raw.trim());
            return Ok(None);
        }
        normalize(Some(raw))
    }

    fn expand_reference(&mut self, href: &str, state: &PaintState) -> Result<(), LayerFontError> {
        if self.expanding.iter().any(|h| h == href) {
            debug!("{}: reference cycle through {}", self.character, href);
            return Ok(());
        }
        let Some(target) = self.definitions.get(href).cloned() else {
            debug!("{}: no definition for {}", self.character, href);
            return Ok(());
        };
        self.expanding.push(href.to_string());
        let result = self.visit(std::slice::from_ref(&target), state);
        self.expanding.pop();
        result
    }

    fn emit(&mut self, node: &SceneNode, state: &PaintState) {
        let mut base = node.clone();
        base.children.clear();
        base.presentation.opacity = None;
        base.presentation.transform = state.transform.clone();

        if let Paint::Color(color) = state.fill {
            let mut fill = base.clone();
            fill.presentation.fill = Some("#000".to_string());
            fill.presentation.stroke = Some("none".to_string());
            fill.presentation.stroke_width = Some("0".to_string());
            if let NodeKind::Path { d } = &mut fill.kind {
                *d = close_subpaths(d);
            }
            let color = if state.opacity != 1.0 {
                composite(color, state.opacity)
            } else {
                color
            };
            self.out.push(Sublayer::new(fill, color));
        }

        if let Paint::Color(color) = state.stroke {
            if !self.policy.keeps(&base, &state.stroke_width) {
                debug!(
                    "{}: dropping thin stroke (width {})",
                    self.character, state.stroke_width
                );
                return;
            }
            let mut stroke = base;
            stroke.presentation.fill = Some("none".to_string());
            stroke.presentation.stroke = Some("#000".to_string());
            stroke.presentation.stroke_width = Some(state.stroke_width.clone());
            self.out.push(Sublayer::new(stroke, composite(color, state.opacity)));
        }
    }
}

fn composite(color: Color, opacity: f32) -> Color {
    composite_opacity(Paint::Color(color), opacity)
        .color()
        .unwrap_or(color)
}

/// Rewrites every `rotate(a cx cy)` as `translate(cx cy) rotate(a) translate(-cx -cy)`.
pub(crate) fn expand_pivot_rotations(transform: &str) -> String {
    const ROTATE: &str = "rotate(";
    let mut out = String::with_capacity(transform.len());
    let mut rest = transform;
    while let Some(start) = rest.find(ROTATE) {
        let args_at = start + ROTATE.len();
        let Some(len) = rest[args_at..].find(')') else {
            break;
        };
        let end = args_at + len + 1;
        let args: Vec<f64> = rest[args_at..args_at + len]
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map_while(|s| s.parse::<f64>().ok())
            .collect();
        out.push_str(&rest[..start]);
        if let [angle, x, y] = args[..] {
            out.push_str(&format!(
                "translate({} {}) rotate({}) translate({} {})",
                fmt_number(x),
                fmt_number(y),
                fmt_number(angle),
                fmt_number(-x),
                fmt_number(-y)
            ));
        } else {
            out.push_str(&rest[start..end]);
        }
        rest = &rest[end..];
    }
    out.push_str(rest);
    out
}

/// Closes every subpath before the next moveto. A leading moveto gets nothing
/// and an existing closepath is never doubled.
pub(crate) fn close_subpaths(d: &str) -> String {
    let mut out = String::with_capacity(d.len() + 8);
    for ch in d.chars() {
        if ch == 'M' || ch == 'm' {
            match out.trim_end().chars().last() {
                None | Some('z') | Some('Z') => {}
                Some(_) => out.push('z'),
            }
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(svg: &str) -> (Vec<Sublayer>, PaintReport) {
        let doc = SvgDocument::parse(svg).expect("valid svg");
        let mut report = PaintReport::default();
        let layers =
            decompose(&doc, "41", &StrokeFilter::default(), &mut report).expect("decomposes");
        (layers, report)
    }

    fn markup(s: &Sublayer) -> String {
        s.node.to_element().to_compact_string()
    }

    #[test]
    fn leaves_split_into_fill_and_stroke() {
        let (layers, _) = run(
            r##"<svg xmlns="http://www.w3.org/2000/svg"><path d="M0 0L10 0L10 10" fill="#f00" stroke="#00f" stroke-width="2"/></svg>"##,
        );
        assert_eq!(layers.len(), 2);
        assert_eq!(
            markup(&layers[0]),
            r##"<path d="M0 0L10 0L10 10" fill="#000" stroke="none" stroke-width="0"/>"##
        );
        assert_eq!(layers[0].color.to_string(), "#ff0000ff");
        assert_eq!(
            markup(&layers[1]),
            r##"<path d="M0 0L10 0L10 10" fill="none" stroke="#000" stroke-width="2"/>"##
        );
        assert_eq!(layers[1].color.to_string(), "#0000ffff");
    }

    #[test]
    fn defaults_to_black_fill_without_stroke() {
        let (layers, _) = run(r#"<svg xmlns="http://www.w3.org/2000/svg"><circle cx="1" cy="1" r="1"/></svg>"#);
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].color, Color::BLACK);
    }

    #[test]
    fn groups_propagate_paint_opacity_and_transform() {
        let (layers, _) = run(
            r##"<svg xmlns="http://www.w3.org/2000/svg">
              <g fill="#112233" opacity="0.5" transform="scale(2)">
                <g opacity="0.5"><circle cx="1" cy="1" r="1"/></g>
                <circle cx="5" cy="5" r="1" transform="translate(1 1)"/>
              </g>
            </svg>"##,
        );
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].color.to_string(), "#11223340");
        assert_eq!(layers[0].node.presentation.transform.as_deref(), Some("scale(2)"));
        assert_eq!(layers[1].color.to_string(), "#11223380");
        assert_eq!(
            layers[1].node.presentation.transform.as_deref(),
            Some("translate(1 1)")
        );
    }

    #[test]
    fn references_expand_definitions_with_their_own_context() {
        let (layers, _) = run(
            r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">
              <defs><circle id="dot" cx="2" cy="2" r="1"/></defs>
              <use xlink:href="#dot" fill="#0f0"/>
              <use href="#dot" fill="#00f" transform="translate(10 0)"/>
              <use xlink:href="#missing"/>
            </svg>"##,
        );
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].color.to_string(), "#00ff00ff");
        assert!(!layers[0].is_transformed());
        assert_eq!(layers[1].color.to_string(), "#0000ffff");
        assert_eq!(
            layers[1].node.presentation.transform.as_deref(),
            Some("translate(10 0)")
        );
        assert_eq!(markup(&layers[1]), r##"<circle id="dot" cx="2" cy="2" r="1" transform="translate(10 0)" fill="#000" stroke="none" stroke-width="0"/>"##);
    }

    #[test]
    fn references_without_a_target_are_dropped() {
        let (layers, report) = run(
            r##"<svg xmlns="http://www.w3.org/2000/svg"><use x="3"/><use href="#nowhere" y="1"/></svg>"##,
        );
        assert!(layers.is_empty());
        assert!(report.is_empty());
    }

    #[test]
    fn shapes_with_ids_are_reusable() {
        let (layers, _) = run(
            r##"<svg xmlns="http://www.w3.org/2000/svg">
              <circle id="c" cx="2" cy="2" r="1" fill="#f00"/>
              <use href="#c" transform="translate(5 0)"/>
            </svg>"##,
        );
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[1].color.to_string(), "#ff0000ff");
    }

    #[test]
    fn reference_cycles_terminate() {
        let (layers, _) = run(
            r##"<svg xmlns="http://www.w3.org/2000/svg">
              <g id="a"><circle cx="1" cy="1" r="1"/><use href="#a"/></g>
            </svg>"##,
        );
        assert_eq!(layers.len(), 2);
    }

    #[test]
    fn gradients_flatten_and_unknown_urls_are_reported() {
        let (layers, report) = run(
            r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">
              <defs>
                <linearGradient id="g"><stop stop-color="#00ff00"/><stop stop-color="#0000ff"/></linearGradient>
                <radialGradient id="r" xlink:href="#g"/>
              </defs>
              <g fill="#f00">
                <circle cx="1" cy="1" r="1" fill="url(#g)"/>
                <circle cx="5" cy="5" r="1" fill="url(#r)"/>
                <circle cx="9" cy="9" r="1" fill="url(#nope)"/>
              </g>
            </svg>"##,
        );
        let colors: Vec<String> = layers.iter().map(|l| l.color.to_string()).collect();
        assert_eq!(colors, vec!["#008080ff", "#008080ff", "#ff0000ff"]);
        let unresolved = report.unresolved();
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].references, vec!["url(#nope)"]);
    }

    #[test]
    fn standalone_gradients_resolve_like_defs() {
        let (layers, report) = run(
            r##"<svg xmlns="http://www.w3.org/2000/svg">
              <linearGradient id="sky"><stop stop-color="#ff0000"/><stop stop-color="#0000ff"/></linearGradient>
              <path d="M0 0h4v4z" fill="url(#sky)"/>
            </svg>"##,
        );
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].color.to_string(), "#800080ff");
        assert!(report.is_empty());
    }

    #[test]
    fn stroke_colors_are_always_composited() {
        let (layers, _) = run(
            r##"<svg xmlns="http://www.w3.org/2000/svg">
              <g opacity="0.5" fill="#112233" stroke="#445566" stroke-width="2">
                <circle cx="1" cy="1" r="1"/>
              </g>
              <circle cx="9" cy="9" r="1" fill="#11223380" stroke="#44556680" stroke-width="2"/>
            </svg>"##,
        );
        let colors: Vec<String> = layers.iter().map(|l| l.color.to_string()).collect();
        assert_eq!(
            colors,
            vec!["#11223380", "#44556680", "#11223380", "#44556680"]
        );
        assert_eq!(layers[1].node.presentation.stroke.as_deref(), Some("#000"));
        assert_eq!(layers[1].node.presentation.opacity, None);
    }

    #[test]
    fn metadata_and_non_rendering_nodes_are_skipped() {
        let (layers, _) = run(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><title>t</title><metadata><x/></metadata><circle cx="1" cy="1" r="1"/></svg>"#,
        );
        assert_eq!(layers.len(), 1);
    }

    #[test]
    fn invalid_colors_are_fatal() {
        let doc = SvgDocument::parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><circle cx="1" cy="1" r="1" fill="red"/></svg>"#,
        )
        .expect("valid svg");
        let mut report = PaintReport::default();
        let err = decompose(&doc, "41", &StrokeFilter::default(), &mut report).unwrap_err();
        assert!(matches!(err, LayerFontError::InvalidColor(ref c) if c == "red"));
    }

    #[test]
    fn thin_strokes_follow_the_policy() {
        let policy = StrokeFilter::default();
        let short = SceneNode::new(NodeKind::Path {
            d: "M0 0L1 1".to_string(),
        });
        let long = SceneNode::new(NodeKind::Path {
            d: format!("M0 0{}", "L1 1".repeat(200)),
        });
        let circle = SceneNode::new(NodeKind::Circle {
            cx: 0.0,
            cy: 0.0,
            r: 1.0,
        });
        assert!(policy.keeps(&short, "0.3"));
        assert!(policy.keeps(&long, "0.3"));
        assert!(policy.keeps(&short, "0.2"));
        assert!(!policy.keeps(&long, "0.2"));
        assert!(!policy.keeps(&short, "0.1"));
        assert!(!policy.keeps(&short, "thin"));
        assert!(policy.keeps(&circle, "0.01"));
    }

    #[test]
    fn stroke_width_is_inherited() {
        let (layers, _) = run(
            r##"<svg xmlns="http://www.w3.org/2000/svg">
              <g stroke="#000" stroke-width="0.05" fill="none"><path d="M0 0L5 5"/><circle cx="1" cy="1" r="1"/></g>
            </svg>"##,
        );
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].node.presentation.stroke_width.as_deref(), Some("0.05"));
    }

    #[test]
    fn pivot_rotations_expand() {
        assert_eq!(
            expand_pivot_rotations("rotate(45 10 20)"),
            "translate(10 20) rotate(45) translate(-10 -20)"
        );
        assert_eq!(
            expand_pivot_rotations("scale(2) rotate(-90,1.5,0) rotate(30) rotate(1 2 3)"),
            "scale(2) translate(1.5 0) rotate(-90) translate(-1.5 0) rotate(30) translate(2 3) rotate(1) translate(-2 -3)"
        );
        assert_eq!(expand_pivot_rotations("rotate(5"), "rotate(5");
    }

    #[test]
    fn subpaths_are_closed_before_each_moveto() {
        assert_eq!(close_subpaths("M0 0L1 1M2 2L3 3"), "M0 0L1 1zM2 2L3 3");
        assert_eq!(close_subpaths(" m0 0 l1 1 m2 2"), " m0 0 l1 1 zm2 2");
        assert_eq!(close_subpaths("M0 0L1 1Z M2 2z"), "M0 0L1 1Z M2 2z");
        assert_eq!(close_subpaths("M0 0 1 1"), "M0 0 1 1");
    }
}
