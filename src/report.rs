use std::collections::BTreeMap;

/// Paint references that could not be resolved, grouped per character.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaintReport {
    unresolved: BTreeMap<String, UnresolvedPaint>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnresolvedPaint {
    pub character: String,
    pub references: Vec<String>,
    pub count: usize,
}

impl PaintReport {
    pub fn record_unresolved(&mut self, character: &str, reference: &str) {
        let entry = self
            .unresolved
            .entry(character.to_string())
            .or_insert_with(|| UnresolvedPaint {
                character: character.to_string(),
                references: Vec::new(),
                count: 0,
            });
        if !entry.references.iter().any(|r| r == reference) {
            entry.references.push(reference.to_string());
        }
        entry.count = entry.count.saturating_add(1);
    }

    pub fn unresolved(&self) -> Vec<UnresolvedPaint> {
        self.unresolved.values().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.unresolved.is_empty()
    }
}
