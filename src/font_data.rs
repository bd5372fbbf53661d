use log::debug;

use crate::dedup::{LayerCache, canonical_key};
use crate::error::LayerFontError;
use crate::info::FontInfo;
use crate::merge::ColorLayer;
use crate::outline::OutlineCompiler;
use crate::palette::Palette;
use crate::types::Color;

/// One color layer of a character: a palette entry painted through a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphLayer {
    pub color: Color,
    pub palette_index: usize,
    pub component: usize,
}

/// One output glyph, layers bottom to top.
#[derive(Debug, Clone, PartialEq)]
pub struct Character {
    /// Hex codepoint as written in the source file name.
    pub ident: String,
    pub codepoint: u32,
    pub name: String,
    pub layers: Vec<GlyphLayer>,
}

impl Character {
    pub fn null() -> Self {
        Self {
            ident: "0".to_string(),
            codepoint: 0,
            name: ".null".to_string(),
            layers: Vec::new(),
        }
    }

    pub fn is_null(&self) -> bool {
        self.codepoint == 0
    }
}

/// Run-wide accumulator: characters in processing order plus the component
/// cache and palette they share.
#[derive(Debug)]
pub struct FontData {
    pub info: FontInfo,
    pub characters: Vec<Character>,
    pub components: LayerCache,
    pub palette: Palette,
}

impl FontData {
    pub fn new(info: FontInfo) -> Self {
        Self {
            info,
            characters: vec![Character::null()],
            components: LayerCache::new(),
            palette: Palette::new(),
        }
    }

    pub fn contains(&self, codepoint: u32) -> bool {
        self.characters.iter().any(|c| c.codepoint == codepoint)
    }

    /// Deduplicates `layers` against the component cache and records the
    /// character. Component names use the layer's position in this character.
    pub fn add_character(
        &mut self,
        ident: &str,
        codepoint: u32,
        root_attributes: &[(String, String)],
        layers: &[ColorLayer],
        compiler: &mut dyn OutlineCompiler,
    ) -> Result<&Character, LayerFontError> {
        let mut glyph_layers = Vec::with_capacity(layers.len());
        for (position, layer) in layers.iter().enumerate() {
            let key = canonical_key(root_attributes, layer);
            let name = format!("u{}layer{}", ident, position);
            let component = self.components.get_or_compile(key, name, compiler)?;
            glyph_layers.push(GlyphLayer {
                color: layer.color,
                palette_index: self.palette.id_for(layer.color),
                component,
            });
        }
        debug!("u{}: {} color layers", ident, glyph_layers.len());
        self.characters.push(Character {
            ident: ident.to_string(),
            codepoint,
            name: format!("u{}", ident),
            layers: glyph_layers,
        });
        let index = self.characters.len() - 1;
        Ok(&self.characters[index])
    }
}
