use std::collections::HashMap;

use crate::types::Color;

/// Colors in first-seen order; a color's id is its position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Palette {
    ids: HashMap<Color, usize>,
    colors: Vec<Color>,
}

impl Palette {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id_for(&mut self, color: Color) -> usize {
        if let Some(&id) = self.ids.get(&color) {
            return id;
        }
        let id = self.colors.len();
        self.ids.insert(color, id);
        self.colors.push(color);
        id
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}
