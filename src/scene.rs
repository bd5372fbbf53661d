use crate::error::LayerFontError;
use crate::style::{fold_style, stop_color_from_style};
use crate::types::parse_number;
use crate::xml::Element;

const SVG_NS: &str = "http://www.w3.org/2000/svg";

// Attributes consumed while parsing; everything else is forwarded verbatim.
const CONSUMED_ATTRIBUTES: &[&str] = &[
    "id",
    "fill",
    "stroke",
    "stroke-width",
    "opacity",
    "transform",
    "style",
    "shape-rendering",
];

/// Paint-related attributes as written in the source, after `style=""` folding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Presentation {
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: Option<String>,
    pub opacity: Option<String>,
    pub transform: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Group,
    Defs,
    /// Non-rendering content: metadata, title, desc, style, foreign namespaces.
    Metadata,
    Path {
        d: String,
    },
    /// Parsed for bounding boxes only. The source `cx`/`cy`/`r` strings stay in
    /// `attributes` and are what gets serialized.
    Circle {
        cx: f32,
        cy: f32,
        r: f32,
    },
    Ellipse {
        cx: f32,
        cy: f32,
        rx: f32,
        ry: f32,
    },
    /// A `<use>` element; `href` keeps the leading `#` and is also forwarded
    /// verbatim through `attributes`. Empty when the element has no target.
    Reference {
        href: String,
    },
    /// Linear or radial gradient; raw `stop-color` per stop, `None` when unset.
    Gradient {
        stops: Vec<Option<String>>,
    },
    Other {
        tag: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub kind: NodeKind,
    pub id: Option<String>,
    pub presentation: Presentation,
    /// Attributes irrelevant to decomposition, in source order.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            id: None,
            presentation: Presentation::default(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn tag(&self) -> &str {
        match &self.kind {
            NodeKind::Group => "g",
            NodeKind::Defs => "defs",
            NodeKind::Metadata => "metadata",
            NodeKind::Path { .. } => "path",
            NodeKind::Circle { .. } => "circle",
            NodeKind::Ellipse { .. } => "ellipse",
            NodeKind::Reference { .. } => "use",
            NodeKind::Gradient { .. } => "linearGradient",
            NodeKind::Other { tag } => tag,
        }
    }

    pub fn is_transformed(&self) -> bool {
        self.presentation.transform.is_some()
    }

    /// Serializes a drawable node (children are never written).
    pub fn to_element(&self) -> Element {
        let mut e = Element::new(self.tag());
        if let Some(id) = &self.id {
            e.set_attr("id", id);
        }
        if let NodeKind::Path { d } = &self.kind {
            e.set_attr("d", d);
        }
        for (k, v) in &self.attributes {
            e.set_attr(k.as_str(), v);
        }
        let p = &self.presentation;
        let paint = [
            ("transform", &p.transform),
            ("fill", &p.fill),
            ("stroke", &p.stroke),
            ("stroke-width", &p.stroke_width),
            ("opacity", &p.opacity),
        ];
        for (k, v) in paint {
            if let Some(v) = v {
                e.set_attr(k, v);
            }
        }
        e
    }
}

/// A parsed input illustration.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgDocument {
    /// Root `<svg>` attributes, namespace declarations first.
    pub root_attributes: Vec<(String, String)>,
    pub children: Vec<SceneNode>,
}

impl SvgDocument {
    pub fn parse(text: &str) -> Result<Self, LayerFontError> {
        let doc = roxmltree::Document::parse(text)?;
        let root = doc.root_element();
        if !root.tag_name().name().eq_ignore_ascii_case("svg") {
            return Err(LayerFontError::Xml(format!(
                "expected <svg> root, found <{}>",
                root.tag_name().name()
            )));
        }

        let mut root_attributes = Vec::new();
        for ns in root.namespaces() {
            match ns.name() {
                Some("xml") => {}
                Some(prefix) => {
                    root_attributes.push((format!("xmlns:{prefix}"), ns.uri().to_string()))
                }
                None => root_attributes.push(("xmlns".to_string(), ns.uri().to_string())),
            }
        }
        for attr in root.attributes() {
            root_attributes.push((qualified_name(root, attr), attr.value().to_string()));
        }

        let children = root
            .children()
            .filter(|n| n.is_element())
            .map(parse_node)
            .collect();
        Ok(Self {
            root_attributes,
            children,
        })
    }
}

fn qualified_name(node: roxmltree::Node<'_, '_>, attr: roxmltree::Attribute<'_, '_>) -> String {
    match attr.namespace().and_then(|uri| node.lookup_prefix(uri)) {
        Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, attr.name()),
        _ => attr.name().to_string(),
    }
}

fn number_attr(node: roxmltree::Node<'_, '_>, name: &str) -> f32 {
    node.attribute(name).and_then(parse_number).unwrap_or(0.0)
}

fn href_attr(node: roxmltree::Node<'_, '_>) -> Option<String> {
    node.attributes()
        .find(|a| a.name() == "href")
        .map(|a| a.value().trim().to_string())
}

fn parse_node(node: roxmltree::Node<'_, '_>) -> SceneNode {
    let tag = node.tag_name();
    let foreign = tag.namespace().is_some_and(|ns| ns != SVG_NS);
    let name = tag.name();

    let kind = if foreign {
        NodeKind::Metadata
    } else {
        match name {
            "g" => NodeKind::Group,
            "defs" => NodeKind::Defs,
            "metadata" | "title" | "desc" | "style" => NodeKind::Metadata,
            "path" => NodeKind::Path {
                d: node.attribute("d").unwrap_or("").to_string(),
            },
            "circle" => NodeKind::Circle {
                cx: number_attr(node, "cx"),
                cy: number_attr(node, "cy"),
                r: number_attr(node, "r"),
            },
            "ellipse" => NodeKind::Ellipse {
                cx: number_attr(node, "cx"),
                cy: number_attr(node, "cy"),
                rx: number_attr(node, "rx"),
                ry: number_attr(node, "ry"),
            },
            "use" => NodeKind::Reference {
                href: href_attr(node).unwrap_or_default(),
            },
            "linearGradient" | "radialGradient" => NodeKind::Gradient {
                stops: node
                    .children()
                    .filter(|c| c.is_element() && c.tag_name().name() == "stop")
                    .map(|stop| {
                        stop.attribute("style")
                            .and_then(stop_color_from_style)
                            .or_else(|| stop.attribute("stop-color").map(str::to_string))
                    })
                    .collect(),
            },
            _ => NodeKind::Other {
                tag: name.to_string(),
            },
        }
    };

    let mut presentation = Presentation {
        fill: node.attribute("fill").map(str::to_string),
        stroke: node.attribute("stroke").map(str::to_string),
        stroke_width: node.attribute("stroke-width").map(str::to_string),
        opacity: node.attribute("opacity").map(str::to_string),
        transform: node.attribute("transform").map(str::to_string),
    };
    if let Some(style) = node.attribute("style") {
        fold_style(style, &mut presentation);
    }

    let attributes = node
        .attributes()
        .filter(|a| a.namespace().is_some() || !CONSUMED_ATTRIBUTES.contains(&a.name()))
        .filter(|a| !(matches!(kind, NodeKind::Path { .. }) && a.name() == "d"))
        .map(|a| (qualified_name(node, a), a.value().to_string()))
        .collect();

    let children = match &kind {
        NodeKind::Group | NodeKind::Defs => node
            .children()
            .filter(|n| n.is_element())
            .map(parse_node)
            .collect(),
        _ => Vec::new(),
    };

    SceneNode {
        kind,
        id: node.attribute("id").map(str::to_string),
        presentation,
        attributes,
        children,
    }
}
