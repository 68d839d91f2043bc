// Collection schemas: loading, foreign-key inference and load-time checks

mod parser;
mod types;

pub use parser::{parse_schema_file, parse_schema_str};
pub use types::*;

use crate::config::CorpusConfig;
use crate::error::{CorpusError, Result};
use crate::violation::{rules, Violation};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Column name reserved for the document key in every entity table
pub const KEY_COLUMN: &str = "id";

/// The closed set of value kinds a field can hold
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    TextList,
    Reference(ForeignKey),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
}

/// A foreign-key property: its name encodes the target collection and,
/// through grammatical number, the cardinality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKey {
    pub property: String,
    pub target: String,
    pub cardinality: Cardinality,
}

/// Validated schema for one collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionSchema {
    pub collection: String,
    pub fields: BTreeMap<String, FieldSpec>,
    pub additional_properties: bool,
}

impl CollectionSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.values().filter(|f| f.required)
    }

    pub fn optional_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.values().filter(|f| !f.required)
    }

    /// Foreign keys in property-name order
    pub fn foreign_keys(&self) -> impl Iterator<Item = &ForeignKey> {
        self.fields.values().filter_map(|f| match &f.kind {
            FieldKind::Reference(fk) => Some(fk),
            _ => None,
        })
    }

    /// Non-reference fields in name order; these become entity-table columns
    pub fn value_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields
            .values()
            .filter(|f| !matches!(f.kind, FieldKind::Reference(_)))
    }

    pub fn forbids_additional_properties(&self) -> bool {
        !self.additional_properties
    }
}

/// All collection schemas of a corpus, keyed by collection name
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchemaSet {
    collections: BTreeMap<String, CollectionSchema>,
}

impl SchemaSet {
    /// Load every `<prefix><name>.yaml` file in `schemas_dir`.
    ///
    /// Fails fast on the first malformed schema: unparsable YAML, a file name
    /// that is not a collection name, a foreign-key property whose name does
    /// not resolve to an existing collection or whose declared cardinality
    /// contradicts its grammatical number, and duplicate property names.
    pub fn load(schemas_dir: &Path, collection_prefix: &str) -> Result<Self> {
        if !schemas_dir.is_dir() {
            return Err(CorpusError::Schema(format!(
                "schemas directory not found: {}",
                schemas_dir.display()
            )));
        }

        let mut files = Vec::new();
        for ext in ["yaml", "yml"] {
            let pattern = format!(
                "{}/*.{ext}",
                glob::Pattern::escape(&schemas_dir.to_string_lossy())
            );
            let paths = glob::glob(&pattern)
                .map_err(|e| CorpusError::Schema(format!("Glob error: {e}")))?
                .filter_map(|r| r.ok());
            files.extend(paths);
        }
        files.sort();

        let mut raw = BTreeMap::new();
        for path in &files {
            let name = collection_name_from_path(path, collection_prefix)?;
            let schema = parse_schema_file(path)?;
            if raw.insert(name.clone(), (path.clone(), schema)).is_some() {
                return Err(CorpusError::Schema(format!(
                    "collection '{name}' has more than one schema file"
                )));
            }
        }

        let set = Self::from_files(raw, collection_prefix)?;
        log::info!(
            "loaded {} collection schema(s) from {}",
            set.collections.len(),
            schemas_dir.display()
        );
        Ok(set)
    }

    /// Build a schema set from already-parsed schema files keyed by collection name
    pub fn from_files(
        files: BTreeMap<String, (PathBuf, SchemaFile)>,
        collection_prefix: &str,
    ) -> Result<Self> {
        let names: Vec<String> = files.keys().cloned().collect();
        let mut collections = BTreeMap::new();
        for (name, (path, file)) in files {
            let schema = compile_schema(&name, file, &names, collection_prefix)
                .map_err(|e| match e {
                    CorpusError::Schema(msg) => {
                        CorpusError::Schema(format!("{}: {msg}", path.display()))
                    }
                    other => other,
                })?;
            collections.insert(name, schema);
        }
        check_table_names(&collections)?;
        Ok(SchemaSet { collections })
    }

    /// Parse inline schemas, keyed by collection name. Used by tests and tools
    /// that keep schemas outside the filesystem.
    pub fn from_strs(schemas: &[(&str, &str)], collection_prefix: &str) -> Result<Self> {
        let mut files = BTreeMap::new();
        for (name, content) in schemas {
            check_collection_name(name, collection_prefix)?;
            files.insert(
                name.to_string(),
                (PathBuf::from(format!("{name}.yaml")), parse_schema_str(content)?),
            );
        }
        Self::from_files(files, collection_prefix)
    }

    pub fn get(&self, collection: &str) -> Option<&CollectionSchema> {
        self.collections.get(collection)
    }

    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CollectionSchema> {
        self.collections.values()
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// Advisory check: a schema that forbids additional properties should
    /// declare every field the corpus config refers to. Schemas may be
    /// provisional, so this only ever yields warnings.
    pub fn cross_check(&self, config: &CorpusConfig) -> Vec<Violation> {
        let mut warnings = Vec::new();
        for schema in self.iter().filter(|s| s.forbids_additional_properties()) {
            let Some(rules) = config.rules_for(&schema.collection) else {
                continue;
            };
            for field in &rules.display_fields {
                if schema.field(field).is_none() {
                    warnings.push(Violation::warning(
                        format!("schemas/{}.yaml", schema.collection),
                        rules::SCHEMA_UNDECLARED_FIELD,
                        format!(
                            "field '{field}' is referenced by config but not declared, \
                             and '{}' forbids additional properties",
                            schema.collection
                        ),
                    ));
                }
            }
        }
        warnings
    }
}

/// Join-table name for every foreign key, keyed by (collection, property).
///
/// A property declared by exactly one schema names its own table, unless
/// that name is also a collection name. Otherwise the table is
/// `<collection>__<property>`.
pub fn join_table_names<'a, I>(schemas: I) -> BTreeMap<(String, String), String>
where
    I: IntoIterator<Item = &'a CollectionSchema>,
{
    let schemas: Vec<&CollectionSchema> = schemas.into_iter().collect();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for fk in schemas.iter().copied().flat_map(CollectionSchema::foreign_keys) {
        *counts.entry(fk.property.as_str()).or_insert(0) += 1;
    }
    let is_collection = |name: &str| schemas.iter().any(|s| s.collection == name);

    let mut names = BTreeMap::new();
    for schema in &schemas {
        for fk in schema.foreign_keys() {
            let table = if counts.get(fk.property.as_str()) == Some(&1) && !is_collection(&fk.property)
            {
                fk.property.clone()
            } else {
                format!("{}__{}", schema.collection, fk.property)
            };
            names.insert((schema.collection.clone(), fk.property.clone()), table);
        }
    }
    names
}

/// Every relational table name must be unique, so a clash is rejected
/// before any document is read.
fn check_table_names(collections: &BTreeMap<String, CollectionSchema>) -> Result<()> {
    let mut taken: HashMap<String, String> = collections
        .keys()
        .map(|name| (name.clone(), format!("collection '{name}'")))
        .collect();
    for ((collection, property), table) in join_table_names(collections.values()) {
        let owner = format!("property '{property}' of {collection}");
        if let Some(previous) = taken.insert(table.clone(), owner.clone()) {
            return Err(CorpusError::Schema(format!(
                "join table '{table}' for {owner} clashes with {previous}"
            )));
        }
    }
    Ok(())
}

fn collection_name_from_path(path: &Path, prefix: &str) -> Result<String> {
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    check_collection_name(&name, prefix)?;
    Ok(name)
}

/// Collection names carry the prefix and stay within a conservative
/// identifier alphabet so relational names are predictable.
fn check_collection_name(name: &str, prefix: &str) -> Result<()> {
    if !name.starts_with(prefix) || name.len() <= prefix.len() {
        return Err(CorpusError::Schema(format!(
            "schema file '{name}' does not name a collection (expected '{prefix}<name>')"
        )));
    }
    if !is_safe_identifier(name) {
        return Err(CorpusError::Schema(format!(
            "collection name '{name}' is not identifier-safe (allowed: [a-z0-9_-])"
        )));
    }
    Ok(())
}

pub fn is_safe_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-')
}

fn compile_schema(
    collection: &str,
    file: SchemaFile,
    collection_names: &[String],
    prefix: &str,
) -> Result<CollectionSchema> {
    let mut lowered: HashMap<String, &str> = HashMap::new();
    for name in file.fields.keys() {
        if let Some(prev) = lowered.insert(name.to_lowercase(), name) {
            return Err(CorpusError::Schema(format!(
                "duplicate property names '{prev}' and '{name}'"
            )));
        }
        if name == KEY_COLUMN {
            return Err(CorpusError::Schema(format!(
                "property name '{KEY_COLUMN}' is reserved for the document key"
            )));
        }
    }

    let mut fields = BTreeMap::new();
    for (name, def) in file.fields {
        let kind = match def.field_type {
            FieldType::Ref => {
                FieldKind::Reference(compile_foreign_key(&name, &def, collection_names, prefix)?)
            }
            other => {
                if def.target.is_some() || def.cardinality.is_some() {
                    return Err(CorpusError::Schema(format!(
                        "property '{name}' declares target/cardinality but is not a ref"
                    )));
                }
                match other {
                    FieldType::Text => FieldKind::Text,
                    FieldType::Number => FieldKind::Number,
                    _ => FieldKind::TextList,
                }
            }
        };
        fields.insert(
            name.clone(),
            FieldSpec {
                name,
                kind,
                required: def.required,
            },
        );
    }

    Ok(CollectionSchema {
        collection: collection.to_string(),
        fields,
        additional_properties: file.additional_properties,
    })
}

fn compile_foreign_key(
    property: &str,
    def: &FieldDefinition,
    collection_names: &[String],
    prefix: &str,
) -> Result<ForeignKey> {
    if !is_safe_identifier(property) {
        return Err(CorpusError::Schema(format!(
            "foreign-key property '{property}' is not identifier-safe (allowed: [a-z0-9_-])"
        )));
    }

    let (target, implied) = infer_target(property, collection_names, prefix).ok_or_else(|| {
        CorpusError::Schema(format!(
            "foreign-key property '{property}' does not end in a known collection name \
             (singular or plural)"
        ))
    })?;

    if let Some(declared) = &def.target {
        let declared = if declared.starts_with(prefix) {
            declared.clone()
        } else {
            format!("{prefix}{declared}")
        };
        if declared != target {
            return Err(CorpusError::Schema(format!(
                "foreign-key property '{property}' names collection '{target}' \
                 but declares target '{declared}'"
            )));
        }
    }

    match def.cardinality {
        None => Err(CorpusError::Schema(format!(
            "foreign-key property '{property}' must declare a cardinality ({implied})"
        ))),
        Some(declared) if declared != implied => Err(CorpusError::Schema(format!(
            "foreign-key property '{property}' declares cardinality '{declared}' \
             but its name is {}",
            if implied == Cardinality::Many { "plural" } else { "singular" }
        ))),
        Some(cardinality) => Ok(ForeignKey {
            property: property.to_string(),
            target,
            cardinality,
        }),
    }
}

/// Infer the target collection from the last dash-separated token of a
/// property name. An exact collection name is plural (many); a token that
/// pluralizes to a collection name is singular (one).
pub fn infer_target(
    property: &str,
    collection_names: &[String],
    prefix: &str,
) -> Option<(String, Cardinality)> {
    let stripped = property.strip_prefix(prefix).unwrap_or(property);
    let token = stripped.rsplit('-').next().unwrap_or(stripped);
    if token.is_empty() {
        return None;
    }

    let exists = |stem: &str| {
        let candidate = format!("{prefix}{stem}");
        collection_names.iter().any(|n| *n == candidate).then_some(candidate)
    };

    if let Some(name) = exists(token) {
        return Some((name, Cardinality::Many));
    }
    for plural in plural_forms(token) {
        if let Some(name) = exists(&plural) {
            return Some((name, Cardinality::One));
        }
    }
    None
}

fn plural_forms(singular: &str) -> Vec<String> {
    let mut forms = vec![format!("{singular}s"), format!("{singular}es")];
    if let Some(stem) = singular.strip_suffix('y') {
        forms.push(format!("{stem}ies"));
    }
    forms
}
