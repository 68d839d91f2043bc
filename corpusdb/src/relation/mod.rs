// Relational model extraction from a referentially valid document map

use crate::collection::DocumentMap;
use crate::document::FieldValue;
use crate::error::{CorpusError, Result};
use crate::schema::{join_table_names, Cardinality, CollectionSchema, FieldKind, KEY_COLUMN};
use serde::Serialize;
use std::collections::HashSet;

/// Entity tables (one per collection) and join tables (one per foreign-key
/// property), both in name order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RelationalModel {
    pub entity_tables: Vec<EntityTable>,
    pub join_tables: Vec<JoinTable>,
}

impl RelationalModel {
    pub fn entity_table(&self, name: &str) -> Option<&EntityTable> {
        self.entity_tables.iter().find(|t| t.name == name)
    }

    pub fn join_table(&self, name: &str) -> Option<&JoinTable> {
        self.join_tables.iter().find(|t| t.name == name)
    }

    pub fn row_count(&self) -> usize {
        self.entity_tables.iter().map(|t| t.rows.len()).sum::<usize>()
            + self.join_tables.iter().map(|t| t.rows.len()).sum::<usize>()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SqlType {
    Text,
    Numeric,
}

impl SqlType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Numeric => "NUMERIC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    pub sql_type: SqlType,
    pub not_null: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Text(String),
    Integer(i64),
    Real(f64),
}

/// One table per collection; the key column comes first and is the primary key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityTable {
    pub name: String,
    /// Value columns after the key column, in field-name order
    pub columns: Vec<Column>,
    pub rows: Vec<EntityRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityRow {
    pub id: String,
    /// One value per entry of `EntityTable::columns`
    pub values: Vec<SqlValue>,
}

/// Link table for one foreign-key property. Every property becomes a join
/// table regardless of cardinality; the cardinality is carried along as
/// documentation only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinTable {
    pub name: String,
    pub property: String,
    pub cardinality: Cardinality,
    pub source_table: String,
    pub target_table: String,
    pub source_column: String,
    pub target_column: String,
    pub rows: Vec<JoinRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinRow {
    pub source: String,
    pub target: String,
}

/// Project a validated document map onto the relational model.
///
/// The map must be free of content violations. Anything that contradicts
/// that (a dangling reference, a duplicate link, a missing required value)
/// is reported as `CorpusError::Integrity` rather than silently dropped.
pub fn extract(map: &DocumentMap) -> Result<RelationalModel> {
    let mut model = RelationalModel::default();

    for entry in map.collections.values() {
        model
            .entity_tables
            .push(entity_table(&entry.name, entry.schema.as_ref(), map)?);
    }

    let table_names =
        join_table_names(map.collections.values().filter_map(|e| e.schema.as_ref()));
    for entry in map.collections.values() {
        let Some(schema) = &entry.schema else {
            continue;
        };
        for fk in schema.foreign_keys() {
            let name = table_names
                .get(&(entry.name.clone(), fk.property.clone()))
                .cloned()
                .unwrap_or_else(|| format!("{}__{}", entry.name, fk.property));
            let (source_column, target_column) = link_columns(&entry.name, &fk.target);

            let mut rows = Vec::new();
            let mut seen = HashSet::new();
            for doc in entry.documents.values() {
                for target in doc.foreign_keys.get(&fk.property).into_iter().flatten() {
                    if !map.contains(&fk.target, target) {
                        return Err(CorpusError::Integrity(format!(
                            "{}/{}: '{}' references missing key '{target}' in {}",
                            entry.name, doc.key, fk.property, fk.target
                        )));
                    }
                    if !seen.insert((doc.key.as_str(), target.as_str())) {
                        return Err(CorpusError::Integrity(format!(
                            "{}/{}: '{}' links '{target}' twice",
                            entry.name, doc.key, fk.property
                        )));
                    }
                    rows.push(JoinRow {
                        source: doc.key.clone(),
                        target: target.clone(),
                    });
                }
            }

            model.join_tables.push(JoinTable {
                name,
                property: fk.property.clone(),
                cardinality: fk.cardinality,
                source_table: entry.name.clone(),
                target_table: fk.target.clone(),
                source_column,
                target_column,
                rows,
            });
        }
    }
    model.join_tables.sort_by(|a, b| a.name.cmp(&b.name));

    let mut names = HashSet::new();
    for name in model
        .entity_tables
        .iter()
        .map(|t| &t.name)
        .chain(model.join_tables.iter().map(|t| &t.name))
    {
        if !names.insert(name.as_str()) {
            return Err(CorpusError::Integrity(format!("table name '{name}' is used twice")));
        }
    }

    log::info!(
        "extracted {} entity table(s), {} join table(s), {} row(s)",
        model.entity_tables.len(),
        model.join_tables.len(),
        model.row_count()
    );
    Ok(model)
}

fn entity_table(
    name: &str,
    schema: Option<&CollectionSchema>,
    map: &DocumentMap,
) -> Result<EntityTable> {
    let fields: Vec<_> = schema.map(|s| s.value_fields().collect()).unwrap_or_default();
    let columns = fields
        .iter()
        .map(|f| Column {
            name: f.name.clone(),
            sql_type: match f.kind {
                FieldKind::Number => SqlType::Numeric,
                _ => SqlType::Text,
            },
            not_null: f.required,
        })
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    if let Some(entry) = map.get(name) {
        for doc in entry.documents.values() {
            let mut values = Vec::with_capacity(fields.len());
            for field in &fields {
                let value = match doc.fields.get(&field.name) {
                    Some(v) => sql_value(v)?,
                    None => SqlValue::Null,
                };
                if field.required && value == SqlValue::Null {
                    return Err(CorpusError::Integrity(format!(
                        "{name}/{}: required field '{}' has no value",
                        doc.key, field.name
                    )));
                }
                values.push(value);
            }
            rows.push(EntityRow {
                id: doc.key.clone(),
                values,
            });
        }
    }

    Ok(EntityTable {
        name: name.to_string(),
        columns,
        rows,
    })
}

fn sql_value(value: &FieldValue) -> Result<SqlValue> {
    Ok(match value {
        FieldValue::Text(s) => SqlValue::Text(s.clone()),
        FieldValue::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => match n.as_f64() {
                Some(f) if f.is_finite() => SqlValue::Real(f),
                _ => SqlValue::Null,
            },
        },
        // Lists are stored as JSON text so they round-trip through any store
        FieldValue::TextList(items) => SqlValue::Text(serde_json::to_string(items)?),
    })
}

/// Column names for a link between two collections. A collection linking to
/// itself gets `_src_id`/`_dst_id` columns so the names stay distinct.
fn link_columns(source: &str, target: &str) -> (String, String) {
    let source_stem = column_stem(source);
    if source == target {
        (format!("{source_stem}_src_{KEY_COLUMN}"), format!("{source_stem}_dst_{KEY_COLUMN}"))
    } else {
        (
            format!("{source_stem}_{KEY_COLUMN}"),
            format!("{}_{KEY_COLUMN}", column_stem(target)),
        )
    }
}

fn column_stem(collection: &str) -> &str {
    let stem = collection.trim_start_matches(|c: char| !c.is_ascii_alphanumeric());
    if stem.is_empty() {
        collection
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::validate_collections;
    use crate::config::CorpusConfig;
    use crate::schema::SchemaSet;
    use pretty_assertions::assert_eq;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn load(tmp: &TempDir, schemas: &[(&str, &str)]) -> DocumentMap {
        let schemas = SchemaSet::from_strs(schemas, "_").unwrap();
        let (map, violations) =
            validate_collections(tmp.path(), &schemas, &CorpusConfig::default(), &[]).unwrap();
        assert!(violations.is_empty(), "{violations:?}");
        map
    }

    const WORKS: &str = r#"
fields:
  title: { type: text, required: true }
  year: { type: number }
  tags: { type: list }
  _composedby-authors: { type: ref, cardinality: many }
"#;
    const AUTHORS: &str = "fields:\n  name: { type: text, required: true }\n";

    fn scenario() -> TempDir {
        let tmp = TempDir::new().unwrap();
        write(
            &tmp.path().join("_works/isvaravada.yaml"),
            "title: Isvaravada\nyear: 1025\ntags: [nyaya]\n_composedby-authors: [jnanasrimitra]\n",
        );
        write(&tmp.path().join("_authors/jnanasrimitra.yaml"), "name: Jnanasrimitra\n");
        tmp
    }

    #[test]
    fn test_end_to_end_model() {
        let tmp = scenario();
        let map = load(&tmp, &[("_works", WORKS), ("_authors", AUTHORS)]);
        let model = extract(&map).unwrap();

        let names: Vec<_> = model.entity_tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["_authors", "_works"]);

        let works = model.entity_table("_works").unwrap();
        assert_eq!(
            works.columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            vec!["tags", "title", "year"]
        );
        assert_eq!(
            works.rows,
            vec![EntityRow {
                id: "isvaravada".into(),
                values: vec![
                    SqlValue::Text("[\"nyaya\"]".into()),
                    SqlValue::Text("Isvaravada".into()),
                    SqlValue::Integer(1025),
                ],
            }]
        );
        assert_eq!(model.entity_table("_authors").unwrap().rows[0].id, "jnanasrimitra");

        let link = model.join_table("_composedby-authors").unwrap();
        assert_eq!(link.source_column, "works_id");
        assert_eq!(link.target_column, "authors_id");
        assert_eq!(link.cardinality, Cardinality::Many);
        assert_eq!(
            link.rows,
            vec![JoinRow {
                source: "isvaravada".into(),
                target: "jnanasrimitra".into(),
            }]
        );
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let tmp = scenario();
        let map = load(&tmp, &[("_works", WORKS), ("_authors", AUTHORS)]);
        let first = serde_json::to_string(&extract(&map).unwrap()).unwrap();
        let second = serde_json::to_string(&extract(&map).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_self_reference_and_shared_property_names() {
        let tmp = TempDir::new().unwrap();
        write(&tmp.path().join("_works/a.yaml"), "_cites-works: [b]\n_by-author: x\n");
        write(&tmp.path().join("_works/b.yaml"), "");
        write(&tmp.path().join("_authors/x.yaml"), "_cites-works: [a, b]\n");
        write(&tmp.path().join("_authors/y.yaml"), "");
        let map = load(
            &tmp,
            &[
                (
                    "_works",
                    "fields:\n  _cites-works: { type: ref, cardinality: many }\n  _by-author: { type: ref, cardinality: one }\n",
                ),
                ("_authors", "fields:\n  _cites-works: { type: ref, cardinality: many }\n"),
            ],
        );
        let model = extract(&map).unwrap();

        let names: Vec<_> = model.join_tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["_authors___cites-works", "_by-author", "_works___cites-works"]);

        let self_ref = model.join_table("_works___cites-works").unwrap();
        assert_eq!(self_ref.source_column, "works_src_id");
        assert_eq!(self_ref.target_column, "works_dst_id");

        let authors = model.join_table("_authors___cites-works").unwrap();
        assert_eq!(
            authors.rows.iter().map(|r| r.target.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );

        // Cardinality one is still materialised as a join table
        let by = model.join_table("_by-author").unwrap();
        assert_eq!(by.cardinality, Cardinality::One);
        assert_eq!(by.rows.len(), 1);
    }

    #[test]
    fn test_dangling_reference_is_integrity_error() {
        let tmp = scenario();
        let mut map = load(&tmp, &[("_works", WORKS), ("_authors", AUTHORS)]);
        map.collections
            .get_mut("_authors")
            .unwrap()
            .documents
            .clear();

        let err = extract(&map).unwrap_err();
        assert!(matches!(err, CorpusError::Integrity(_)), "{err}");
        assert!(!err.is_setup_error());
    }

    #[test]
    fn test_non_finite_numbers_become_null() {
        let value = FieldValue::Number(serde_yaml::Number::from(f64::NAN));
        assert_eq!(sql_value(&value).unwrap(), SqlValue::Null);
        let value = FieldValue::Number(serde_yaml::Number::from(2.5));
        assert_eq!(sql_value(&value).unwrap(), SqlValue::Real(2.5));
    }
}
