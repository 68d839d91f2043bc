// Documents and attachments - the in-memory form of one corpus entity

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A typed field value. References live in `Document::foreign_keys` instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(serde_yaml::Number),
    TextList(Vec<String>),
}

/// A loaded document with its validated fields, references and attachments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub collection: String,
    pub key: String,
    /// Path of the document file relative to the corpus root
    pub path: String,
    pub fields: BTreeMap<String, FieldValue>,
    /// Foreign-key property -> referenced document keys, in file order
    pub foreign_keys: BTreeMap<String, Vec<String>>,
    pub attachments: Vec<AttachmentRef>,
}

impl Document {
    pub fn new(collection: &str, key: &str, path: &str) -> Self {
        Document {
            collection: collection.to_string(),
            key: key.to_string(),
            path: path.to_string(),
            fields: BTreeMap::new(),
            foreign_keys: BTreeMap::new(),
            attachments: Vec::new(),
        }
    }
}

/// A file bound to a document purely by its name:
/// `<owner-key><boundary><tag>[-<part>].<ext>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub owner_key: String,
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part: Option<u32>,
    /// Lowercased with leading dot, empty when the file has no extension
    pub extension: String,
    pub path: String,
}

/// Read a document file as raw YAML. An empty file reads as null.
pub fn read_document_data(path: &Path) -> Result<serde_yaml::Value> {
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(serde_yaml::Value::Null);
    }
    let data: serde_yaml::Value = serde_yaml::from_str(&content)?;
    Ok(data)
}

/// Suggest a conforming key for a file stem that breaks the key policy
pub fn suggest_key(stem: &str) -> String {
    slug::slugify(stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggest_key_transliterates() {
        assert_eq!(suggest_key("Īśvaravāda"), "isvaravada");
        assert_eq!(suggest_key("Nyaya Sutra"), "nyaya-sutra");
    }

    #[test]
    fn test_read_document_data() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("isvaravada.yaml");
        std::fs::write(&path, "title: Isvaravada\nyear: 1025\n").unwrap();
        let data = read_document_data(&path).unwrap();
        assert_eq!(data["title"], serde_yaml::Value::String("Isvaravada".into()));

        std::fs::write(&path, "\n").unwrap();
        assert_eq!(read_document_data(&path).unwrap(), serde_yaml::Value::Null);

        std::fs::write(&path, "title: [unclosed\n").unwrap();
        assert!(read_document_data(&path).is_err());
    }

    #[test]
    fn test_document_serializes_to_json() {
        let mut doc = Document::new("_works", "isvaravada", "_works/isvaravada.yaml");
        doc.fields.insert("title".into(), FieldValue::Text("Isvaravada".into()));
        doc.foreign_keys
            .insert("_composedby-authors".into(), vec!["jnanasrimitra".into()]);
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["fields"]["title"], "Isvaravada");
        assert_eq!(json["foreign_keys"]["_composedby-authors"][0], "jnanasrimitra");
    }
}
