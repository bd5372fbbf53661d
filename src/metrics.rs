#[derive(Debug, Clone, Default, PartialEq)]
pub struct CharacterMetrics {
    pub ident: String,
    pub process_ms: f64,
    pub sublayer_count: usize,
    pub layer_count: usize,
    pub compiled_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunMetrics {
    pub characters: Vec<CharacterMetrics>,
    pub total_ms: f64,
    pub component_count: usize,
    pub reused_count: usize,
    pub palette_size: usize,
}

impl RunMetrics {
    pub fn layer_count(&self) -> usize {
        self.characters.iter().map(|c| c.layer_count).sum()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} characters, {} layers, {} components ({} reused), {} colors in {:.1} ms",
            self.characters.len(),
            self.layer_count(),
            self.component_count,
            self.reused_count,
            self.palette_size,
            self.total_ms
        )
    }
}
