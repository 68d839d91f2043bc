use super::types::RuleSpecFile;
use super::RuleSpec;
use crate::error::{CorpusError, Result};
use std::path::Path;

/// Parse an `fs_spec.yaml` file into a compiled RuleSpec
pub fn parse_rule_spec(path: &Path) -> Result<RuleSpec> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        CorpusError::RuleSpec(format!("cannot read rule spec {}: {e}", path.display()))
    })?;
    parse_rule_spec_str(&content)
        .map_err(|e| CorpusError::RuleSpec(format!("{}: {e}", path.display())))
}

/// Parse a rule spec YAML string into a compiled RuleSpec
pub fn parse_rule_spec_str(content: &str) -> Result<RuleSpec> {
    let file: RuleSpecFile = serde_yaml::from_str(content)?;
    RuleSpec::compile(file)
}
