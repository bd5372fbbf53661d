use std::collections::HashMap;

use log::debug;

use crate::error::LayerFontError;
use crate::merge::ColorLayer;
use crate::outline::{GlyphOutline, OutlineCompiler};
use crate::xml::Element;

/// Serializes a layer's shapes inside an `<svg>` root carrying the source
/// document's root attributes. The color is not part of the key.
pub fn canonical_key(root_attributes: &[(String, String)], layer: &ColorLayer) -> String {
    let mut svg = Element::new("svg");
    for (k, v) in root_attributes {
        svg.set_attr(k.as_str(), v);
    }
    for sublayer in &layer.sublayers {
        svg.push(sublayer.node.to_element());
    }
    svg.to_compact_string()
}

/// A compiled glyph fragment shared by every layer with the same key.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerComponent {
    pub name: String,
    pub lsb: i16,
    pub outline: GlyphOutline,
    pub key: String,
}

/// Run-wide component cache, in creation order.
#[derive(Debug, Default)]
pub struct LayerCache {
    index: HashMap<String, usize>,
    components: Vec<LayerComponent>,
    reused: usize,
}

impl LayerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the component index for `key`, compiling it under `name` on a
    /// miss. The compiler runs at most once per distinct key.
    pub fn get_or_compile(
        &mut self,
        key: String,
        name: String,
        compiler: &mut dyn OutlineCompiler,
    ) -> Result<usize, LayerFontError> {
        if let Some(&index) = self.index.get(&key) {
            debug!("reusing {} for {}", self.components[index].name, name);
            self.reused += 1;
            return Ok(index);
        }
        let compiled = compiler.compile_layer(&key)?;
        let index = self.components.len();
        debug!("compiled {} ({} contours)", name, compiled.outline.contours.len());
        self.components.push(LayerComponent {
            name,
            lsb: compiled.lsb,
            outline: compiled.outline,
            key: key.clone(),
        });
        self.index.insert(key, index);
        Ok(index)
    }

    pub fn get(&self, index: usize) -> Option<&LayerComponent> {
        self.components.get(index)
    }

    pub fn components(&self) -> &[LayerComponent] {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Lookups answered from the cache.
    pub fn reused(&self) -> usize {
        self.reused
    }
}
