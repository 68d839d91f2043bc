use super::types::SchemaFile;
use crate::error::{CorpusError, Result};
use std::path::Path;

/// Parse a collection schema file
pub fn parse_schema_file(path: &Path) -> Result<SchemaFile> {
    let content = std::fs::read_to_string(path)?;
    parse_schema_str(&content)
        .map_err(|e| CorpusError::Schema(format!("{}: {e}", path.display())))
}

/// Parse a collection schema YAML string. An empty file declares no fields.
pub fn parse_schema_str(content: &str) -> Result<SchemaFile> {
    if content.trim().is_empty() {
        return Ok(SchemaFile::default());
    }
    // Going through a Value rejects duplicate property names
    let value: serde_yaml::Value = serde_yaml::from_str(content)?;
    let schema: SchemaFile = serde_yaml::from_value(value)?;
    Ok(schema)
}
