use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::LayerFontError;

pub const INFO_FILE: &str = "info.json";

/// Font-level metadata read from `info.json`.
///
/// Besides the three named fields, every key that is a name-table id carries
/// that record's text: a string, a number referring to another id, or an
/// array of those concatenated.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FontInfo {
    #[serde(rename = "fontName")]
    pub font_name: String,
    pub version: Value,
    pub vendor: String,
    #[serde(flatten)]
    pub names: BTreeMap<String, Value>,
}

impl FontInfo {
    pub fn from_json(text: &str) -> Result<Self, LayerFontError> {
        let info: FontInfo = serde_json::from_str(text)
            .map_err(|err| LayerFontError::InvalidMetadata(err.to_string()))?;
        if info.font_name.trim().is_empty() {
            return Err(LayerFontError::InvalidMetadata("fontName is empty".to_string()));
        }
        Ok(info)
    }

    pub fn load(source_dir: &Path) -> Result<Self, LayerFontError> {
        let path = source_dir.join(INFO_FILE);
        let text = std::fs::read_to_string(&path).map_err(|err| {
            LayerFontError::InvalidMetadata(format!("{}: {}", path.display(), err))
        })?;
        Self::from_json(&text)
    }

    pub fn version_text(&self) -> String {
        match &self.version {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Name records in ascending id order. Ids 3, 5 and 6 are always derived
    /// from the family name, version and font name.
    pub fn name_records(&self) -> Result<Vec<(u16, String)>, LayerFontError> {
        let mut ids: BTreeMap<u16, &Value> = BTreeMap::new();
        for (key, value) in &self.names {
            if !key.starts_with(|c: char| c.is_ascii_digit() && c != '0') {
                continue;
            }
            let id = key.parse::<u16>().map_err(|_| {
                LayerFontError::InvalidMetadata(format!("invalid name id {:?}", key))
            })?;
            ids.insert(id, value);
        }

        let mut records: BTreeMap<u16, String> = BTreeMap::new();
        for (&id, value) in &ids {
            records.insert(id, self.resolve_text(id, value)?);
        }
        let family = records.get(&1).cloned().ok_or_else(|| {
            LayerFontError::InvalidMetadata("name id 1 (family) is missing".to_string())
        })?;
        let version = self.version_text();
        records.insert(3, format!("{} {}", family, version));
        records.insert(5, format!("Version {}", version));
        records.insert(6, self.font_name.clone());
        Ok(records.into_iter().collect())
    }

    fn resolve_text(&self, id: u16, value: &Value) -> Result<String, LayerFontError> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Number(_) => self.lookup(id, value),
            Value::Array(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        Value::String(s) => out.push_str(s),
                        Value::Number(_) => out.push_str(&self.lookup(id, part)?),
                        _ => return Err(invalid_text(id)),
                    }
                }
                Ok(out)
            }
            _ => Err(invalid_text(id)),
        }
    }

    // Numbers refer to another key's plain string.
    fn lookup(&self, id: u16, reference: &Value) -> Result<String, LayerFontError> {
        match self.names.get(&reference.to_string()) {
            Some(Value::String(s)) => Ok(s.clone()),
            _ => Err(LayerFontError::InvalidMetadata(format!(
                "name id {} refers to missing text {}",
                id, reference
            ))),
        }
    }
}

fn invalid_text(id: u16) -> LayerFontError {
    LayerFontError::InvalidMetadata(format!("invalid text type for name id {}", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const INFO: &str = r#"{
        "fontName": "DemoColor",
        "version": "1.2",
        "vendor": "DEMO",
        "0": "ignored",
        "1": "Demo Color",
        "2": "Regular",
        "4": ["Demo Color", " ", 2],
        "10": 1,
        "comment": "not a name"
    }"#;

    #[test]
    fn name_records_resolve_references_and_derived_ids() {
        let info = FontInfo::from_json(INFO).expect("valid info");
        assert_eq!(info.font_name, "DemoColor");
        let records = info.name_records().expect("names resolve");
        let expected: Vec<(u16, String)> = vec![
            (1, "Demo Color".into()),
            (2, "Regular".into()),
            (3, "Demo Color 1.2".into()),
            (4, "Demo Color Regular".into()),
            (5, "Version 1.2".into()),
            (6, "DemoColor".into()),
            (10, "Demo Color".into()),
        ];
        assert_eq!(records, expected);
    }

    #[test]
    fn numeric_versions_are_printed() {
        let info = FontInfo::from_json(r#"{"fontName":"X","version":2,"vendor":"V","1":"F"}"#).unwrap();
        assert_eq!(info.version_text(), "2");
    }

    #[test]
    fn bad_metadata_is_rejected() {
        assert!(matches!(
            FontInfo::from_json(r#"{"version":"1","vendor":"V"}"#),
            Err(LayerFontError::InvalidMetadata(_))
        ));
        let dangling = FontInfo::from_json(r#"{"fontName":"X","version":"1","vendor":"V","1":7}"#).unwrap();
        assert!(dangling.name_records().is_err());
        let object = FontInfo::from_json(r#"{"fontName":"X","version":"1","vendor":"V","1":{}}"#).unwrap();
        assert!(object.name_records().is_err());
        let no_family = FontInfo::from_json(r#"{"fontName":"X","version":"1","vendor":"V"}"#).unwrap();
        assert!(no_family.name_records().is_err());
    }

    #[test]
    fn load_reads_from_the_source_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(INFO_FILE), INFO).unwrap();
        assert_eq!(FontInfo::load(dir.path()).unwrap().vendor, "DEMO");
        let empty = tempfile::tempdir().unwrap();
        assert!(matches!(
            FontInfo::load(empty.path()),
            Err(LayerFontError::InvalidMetadata(_))
        ));
    }
}
