use crate::document::FieldValue;
use crate::schema::{Cardinality, CollectionSchema, FieldKind, FieldSpec, ForeignKey};
use crate::violation::rules;
use std::collections::BTreeMap;

/// A field-shape problem found in one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub rule_id: &'static str,
    pub message: String,
}

/// Result of validating a document: the typed values that passed, plus issues.
/// Issues never stop the remaining fields from being checked.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub fields: BTreeMap<String, FieldValue>,
    pub foreign_keys: BTreeMap<String, Vec<String>>,
    pub issues: Vec<Issue>,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }

    fn issue(&mut self, rule_id: &'static str, message: String) {
        self.issues.push(Issue { rule_id, message });
    }
}

/// Validate a document's data against its collection schema.
pub fn validate_document(schema: &CollectionSchema, data: &serde_yaml::Value) -> ValidationResult {
    let mut result = ValidationResult::default();

    let empty = serde_yaml::Mapping::new();
    let mapping = match data {
        serde_yaml::Value::Mapping(m) => m,
        serde_yaml::Value::Null => &empty,
        other => {
            result.issue(
                rules::DOC_WRONG_KIND,
                format!("Document data must be a YAML mapping, got {}", type_name(other)),
            );
            return result;
        }
    };

    for (field_name, spec) in &schema.fields {
        let value = mapping
            .get(serde_yaml::Value::String(field_name.clone()))
            .filter(|v| !v.is_null());

        match value {
            None if spec.required => result.issue(
                rules::DOC_MISSING_FIELD,
                format!("Required field '{field_name}' is missing"),
            ),
            None => {}
            Some(val) => validate_field_value(spec, val, &mut result),
        }
    }

    for key in mapping.keys() {
        match key {
            serde_yaml::Value::String(key_str) => {
                if schema.forbids_additional_properties() && !schema.fields.contains_key(key_str) {
                    result.issue(
                        rules::DOC_UNKNOWN_FIELD,
                        format!("Unexpected field '{key_str}' (additional_properties is false)"),
                    );
                }
            }
            other => result.issue(
                rules::DOC_WRONG_KIND,
                format!("Field names must be strings, got {}", type_name(other)),
            ),
        }
    }

    result
}

fn validate_field_value(spec: &FieldSpec, value: &serde_yaml::Value, result: &mut ValidationResult) {
    let field_name = &spec.name;
    match &spec.kind {
        FieldKind::Text => match value.as_str() {
            Some(s) => {
                result
                    .fields
                    .insert(field_name.clone(), FieldValue::Text(s.to_string()));
            }
            None => wrong_kind(result, field_name, "text", value),
        },
        FieldKind::Number => match value {
            serde_yaml::Value::Number(n) if n.is_nan() || n.is_infinite() => {
                wrong_kind(result, field_name, "finite number", value)
            }
            serde_yaml::Value::Number(n) => {
                result
                    .fields
                    .insert(field_name.clone(), FieldValue::Number(n.clone()));
            }
            other => wrong_kind(result, field_name, "number", other),
        },
        FieldKind::TextList => {
            let Some(items) = value.as_sequence() else {
                wrong_kind(result, field_name, "list of text", value);
                return;
            };
            let mut texts = Vec::with_capacity(items.len());
            for (idx, item) in items.iter().enumerate() {
                match item.as_str() {
                    Some(s) => texts.push(s.to_string()),
                    None => {
                        result.issue(
                            rules::DOC_WRONG_KIND,
                            format!(
                                "Field '{field_name}' entry #{} expected text, got {}",
                                idx + 1,
                                type_name(item)
                            ),
                        );
                        return;
                    }
                }
            }
            result
                .fields
                .insert(field_name.clone(), FieldValue::TextList(texts));
        }
        FieldKind::Reference(fk) => validate_reference(fk, value, result),
    }
}

/// References are a key string, or a `{id: key, ...}` link mapping whose
/// other attributes are ignored. Cardinality `one` takes a single reference,
/// `many` takes a list of them.
fn validate_reference(fk: &ForeignKey, value: &serde_yaml::Value, result: &mut ValidationResult) {
    let property = &fk.property;
    match fk.cardinality {
        Cardinality::One => match reference_key(value) {
            Some(key) => {
                result.foreign_keys.insert(property.clone(), vec![key]);
            }
            None => wrong_kind(result, property, "document key reference", value),
        },
        Cardinality::Many => {
            let Some(items) = value.as_sequence() else {
                wrong_kind(result, property, "list of document key references", value);
                return;
            };
            let mut keys = Vec::with_capacity(items.len());
            for (idx, item) in items.iter().enumerate() {
                match reference_key(item) {
                    Some(key) => keys.push(key),
                    None => result.issue(
                        rules::DOC_WRONG_KIND,
                        format!(
                            "Field '{property}' entry #{} expected a document key, got {}",
                            idx + 1,
                            type_name(item)
                        ),
                    ),
                }
            }
            result.foreign_keys.insert(property.clone(), keys);
        }
    }
}

fn reference_key(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_yaml::Value::Mapping(m) => m
            .get(serde_yaml::Value::String("id".into()))
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        _ => None,
    }
}

fn wrong_kind(result: &mut ValidationResult, field_name: &str, expected: &str, value: &serde_yaml::Value) {
    result.issue(
        rules::DOC_WRONG_KIND,
        format!("Field '{field_name}' expected {expected}, got {}", type_name(value)),
    );
}

fn type_name(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "boolean",
        serde_yaml::Value::Number(_) => "number",
        serde_yaml::Value::String(_) => "string",
        serde_yaml::Value::Sequence(_) => "list",
        serde_yaml::Value::Mapping(_) => "object",
        serde_yaml::Value::Tagged(_) => "tagged",
    }
}
