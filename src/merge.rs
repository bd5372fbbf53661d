use crate::decompose::Sublayer;
use crate::path::sample_path;
use crate::scene::{NodeKind, SceneNode};
use crate::types::{BBox, Color};

/// Same-colored sublayers that are flattened into one component glyph, in
/// painter's order. Holds either untransformed members only or exactly one
/// transformed member.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorLayer {
    pub color: Color,
    pub sublayers: Vec<Sublayer>,
}

impl ColorLayer {
    fn blocks(&self, bbox: &BBox) -> bool {
        self.sublayers
            .iter()
            .any(|s| s.is_transformed() || s.bbox.overlaps(bbox))
    }
}

/// Appends `sublayer` to the nearest compatible layer or starts a new one.
///
/// Scanning runs backward from the top layer and stops at the first layer that
/// holds a transformed member or a member overlapping the new shape; a color
/// match before that point absorbs the sublayer.
pub fn add_or_merge(layers: &mut Vec<ColorLayer>, sublayer: Sublayer) {
    if !sublayer.is_transformed() {
        for i in (0..layers.len()).rev() {
            if layers[i].blocks(&sublayer.bbox) {
                break;
            }
            if layers[i].color == sublayer.color {
                layers[i].sublayers.push(sublayer);
                return;
            }
        }
    }
    layers.push(ColorLayer {
        color: sublayer.color,
        sublayers: vec![sublayer],
    });
}

pub fn merge_layers(sublayers: Vec<Sublayer>) -> Vec<ColorLayer> {
    let mut layers = Vec::new();
    for sublayer in sublayers {
        add_or_merge(&mut layers, sublayer);
    }
    layers
}

/// Bounding box used for merge decisions. Unsupported shapes report the
/// degenerate origin box.
pub fn shape_bbox(node: &SceneNode) -> BBox {
    match &node.kind {
        // Extremes of the samples only; the origin is not folded in.
        NodeKind::Path { d } => BBox::from_points(&sample_path(d)),
        NodeKind::Circle { cx, cy, r } => BBox::around(*cx, *cy, *r, *r),
        NodeKind::Ellipse { cx, cy, rx, ry } => BBox::around(*cx, *cy, *rx, *ry),
        _ => BBox::ORIGIN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f32, y: f32, w: f32, color: Color) -> Sublayer {
        let d = format!("M{x} {y}h{w}v{w}h-{w}z");
        Sublayer::new(SceneNode::new(NodeKind::Path { d }), color)
    }

    fn transformed(mut s: Sublayer) -> Sublayer {
        s.node.presentation.transform = Some("translate(1 1)".to_string());
        s
    }

    const RED: Color = Color {
        r: 255,
        g: 0,
        b: 0,
        a: 255,
    };

    #[test]
    fn disjoint_same_color_siblings_merge() {
        let layers = merge_layers(vec![
            rect(0.0, 0.0, 10.0, Color::BLACK),
            rect(20.0, 0.0, 10.0, Color::BLACK),
        ]);
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].sublayers.len(), 2);
    }

    #[test]
    fn interposed_overlapping_color_prevents_merge() {
        let layers = merge_layers(vec![
            rect(0.0, 0.0, 10.0, Color::BLACK),
            rect(15.0, 0.0, 10.0, RED),
            rect(20.0, 0.0, 10.0, Color::BLACK),
        ]);
        assert_eq!(layers.len(), 3);
        assert_eq!(layers[2].color, Color::BLACK);
    }

    #[test]
    fn interposed_disjoint_color_is_skipped_over() {
        let layers = merge_layers(vec![
            rect(0.0, 0.0, 10.0, Color::BLACK),
            rect(40.0, 40.0, 5.0, RED),
            rect(20.0, 0.0, 10.0, Color::BLACK),
        ]);
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].sublayers.len(), 2);
        assert_eq!(layers[1].color, RED);
    }

    #[test]
    fn transformed_shapes_never_merge() {
        let layers = merge_layers(vec![
            rect(0.0, 0.0, 10.0, Color::BLACK),
            transformed(rect(20.0, 0.0, 10.0, Color::BLACK)),
            rect(40.0, 0.0, 10.0, Color::BLACK),
        ]);
        assert_eq!(layers.len(), 3);
        assert!(layers.iter().all(|l| l.sublayers.len() == 1));
    }

    #[test]
    fn overlapping_same_color_shapes_start_a_new_layer() {
        let layers = merge_layers(vec![
            rect(0.0, 0.0, 10.0, Color::BLACK),
            rect(5.0, 5.0, 10.0, Color::BLACK),
        ]);
        assert_eq!(layers.len(), 2);
    }

    #[test]
    fn boxes_per_shape_kind() {
        let circle = SceneNode::new(NodeKind::Circle {
            cx: 5.0,
            cy: 5.0,
            r: 2.0,
        });
        assert_eq!(shape_bbox(&circle), BBox::around(5.0, 5.0, 2.0, 2.0));
        let ellipse = SceneNode::new(NodeKind::Ellipse {
            cx: 0.0,
            cy: 0.0,
            rx: 3.0,
            ry: 1.0,
        });
        assert_eq!(shape_bbox(&ellipse).max_x, 3.0);
        let other = SceneNode::new(NodeKind::Other {
            tag: "rect".to_string(),
        });
        assert_eq!(shape_bbox(&other), BBox::ORIGIN);
        let path = SceneNode::new(NodeKind::Path {
            d: "M10 10 l5 -20".to_string(),
        });
        let b = shape_bbox(&path);
        assert_eq!((b.min_x, b.min_y, b.max_x, b.max_y), (10.0, -10.0, 15.0, 10.0));
    }
}
