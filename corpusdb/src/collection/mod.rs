// Collection validation: documents, attachments and cross-collection references

mod attachment;

pub use attachment::{match_owner, parse_attachment};

use crate::config::CorpusConfig;
use crate::document::{read_document_data, suggest_key, AttachmentRef, Document};
use crate::error::{CorpusError, Result};
use crate::schema::{CollectionSchema, FieldKind, SchemaSet};
use crate::validation;
use crate::violation::{display_path, rules, Violation};
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

/// Every loaded collection, keyed by name. Documents are keyed by document
/// key, so iteration order is lexicographic and reproducible.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentMap {
    pub collections: BTreeMap<String, CollectionEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionEntry {
    pub name: String,
    /// Directory relative to the corpus root, if the collection has one
    pub dir: Option<String>,
    pub schema: Option<CollectionSchema>,
    pub documents: BTreeMap<String, Document>,
}

impl CollectionEntry {
    fn new(name: &str, dir: Option<String>, schema: Option<CollectionSchema>) -> Self {
        CollectionEntry {
            name: name.to_string(),
            dir,
            schema,
            documents: BTreeMap::new(),
        }
    }
}

impl DocumentMap {
    pub fn get(&self, collection: &str) -> Option<&CollectionEntry> {
        self.collections.get(collection)
    }

    pub fn document(&self, collection: &str, key: &str) -> Option<&Document> {
        self.collections.get(collection)?.documents.get(key)
    }

    pub fn contains(&self, collection: &str, key: &str) -> bool {
        self.document(collection, key).is_some()
    }

    pub fn document_count(&self) -> usize {
        self.collections.values().map(|c| c.documents.len()).sum()
    }

    /// Pretty JSON map of collections, documents and attachments
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Validates every collection directory under a corpus root.
pub struct CollectionValidator<'a> {
    root: &'a Path,
    schemas: &'a SchemaSet,
    config: &'a CorpusConfig,
    ignore: &'a [Regex],
}

impl<'a> CollectionValidator<'a> {
    pub fn new(root: &'a Path, schemas: &'a SchemaSet, config: &'a CorpusConfig) -> Self {
        CollectionValidator {
            root,
            schemas,
            config,
            ignore: &[],
        }
    }

    /// Skip nested directories whose names match any of these patterns
    pub fn with_ignore_patterns(mut self, ignore: &'a [Regex]) -> Self {
        self.ignore = ignore;
        self
    }

    /// Run both passes: load every collection, then resolve references
    /// across collections. Violations accumulate; only I/O failures abort.
    pub fn validate(&self) -> Result<(DocumentMap, Vec<Violation>)> {
        let (map, mut violations) = self.load()?;
        violations.extend(resolve_references(&map));
        Ok((map, violations))
    }

    /// Pass 1: discover collections and load raw documents and attachments.
    pub fn load(&self) -> Result<(DocumentMap, Vec<Violation>)> {
        if !self.root.is_dir() {
            return Err(CorpusError::Config(format!(
                "root directory not found: {}",
                self.root.display()
            )));
        }

        let mut map = DocumentMap::default();
        let mut violations = Vec::new();

        let (_, dirs) = list_dir(self.root)?;
        for name in dirs.iter().filter(|n| self.config.is_collection_dir(n)) {
            let before = violations.len();
            let entry = self.load_collection(name, &self.root.join(name), &mut violations)?;
            log::info!(
                "collection {name}: {} document(s), {} violation(s)",
                entry.documents.len(),
                violations.len() - before
            );
            map.collections.insert(name.clone(), entry);
        }

        for schema in self.schemas.iter() {
            if map.collections.contains_key(&schema.collection) {
                continue;
            }
            violations.push(Violation::warning(
                schema.collection.clone(),
                rules::SCHEMA_UNUSED,
                format!(
                    "schema declares collection '{}' but no directory exists",
                    schema.collection
                ),
            ));
            map.collections.insert(
                schema.collection.clone(),
                CollectionEntry::new(&schema.collection, None, Some(schema.clone())),
            );
        }

        Ok((map, violations))
    }

    fn load_collection(
        &self,
        name: &str,
        dir: &Path,
        out: &mut Vec<Violation>,
    ) -> Result<CollectionEntry> {
        let schema = self.schemas.get(name).cloned();
        if schema.is_none() {
            out.push(Violation::error(
                display_path(self.root, dir),
                rules::SCHEMA_MISSING,
                format!("collection '{name}' has no schema file {name}.yaml"),
            ));
        }

        let mut entry = CollectionEntry::new(name, Some(display_path(self.root, dir)), schema);
        let mut seen_keys = HashMap::new();
        self.load_directory(&mut entry, dir, &mut seen_keys, out)?;
        self.check_required_attachments(&entry, out);
        Ok(entry)
    }

    fn load_directory(
        &self,
        entry: &mut CollectionEntry,
        dir: &Path,
        seen_keys: &mut HashMap<String, String>,
        out: &mut Vec<Violation>,
    ) -> Result<()> {
        let (files, dirs) = list_dir(dir)?;
        let boundary = &self.config.attachment_boundary;

        let mut keys_here = Vec::new();
        let mut attachment_files = Vec::new();
        for name in files {
            let path = dir.join(&name);
            let rel = display_path(self.root, &path);
            if has_multiple_dots(&name) {
                out.push(Violation::warning(
                    rel.clone(),
                    rules::NAMING_MULTIPLE_DOTS,
                    format!("file name '{name}' contains more than one dot"),
                ));
            }
            match self.document_stem(&name) {
                Some(stem) => {
                    if let Some(key) = self.load_document(entry, stem, &path, rel, seen_keys, out) {
                        keys_here.push(key);
                    }
                }
                None => attachment_files.push((name, rel)),
            }
        }

        keys_here.sort();
        check_key_prefixes(entry, &keys_here, out);

        for (name, rel) in attachment_files {
            let Some(owner) = match_owner(&name, keys_here.iter().map(String::as_str), boundary)
            else {
                out.push(Violation::error(
                    rel,
                    rules::ATTACHMENT_STRAY,
                    format!(
                        "stray attachment name (expected <document>{boundary}<tag>[-<part>].<ext> \
                         next to its document)"
                    ),
                ));
                continue;
            };
            let attachment = parse_attachment(&name, owner, boundary, rel);
            self.check_attachment(&entry.name, &attachment, out);
            if let Some(doc) = entry.documents.get_mut(owner) {
                doc.attachments.push(attachment);
            }
        }

        for name in dirs {
            if self.ignore.iter().any(|re| re.is_match(&name)) {
                log::debug!("skipping ignored directory {name} in {}", entry.name);
                continue;
            }
            self.load_directory(entry, &dir.join(&name), seen_keys, out)?;
        }
        Ok(())
    }

    /// The document stem of a file, when the file is a document rather than
    /// an attachment: a document extension and no boundary marker.
    fn document_stem<'n>(&self, name: &'n str) -> Option<&'n str> {
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty()
            || !self.config.is_document_extension(ext)
            || stem.contains(self.config.attachment_boundary.as_str())
        {
            return None;
        }
        Some(stem)
    }

    fn load_document(
        &self,
        entry: &mut CollectionEntry,
        key: &str,
        path: &Path,
        rel: String,
        seen_keys: &mut HashMap<String, String>,
        out: &mut Vec<Violation>,
    ) -> Option<String> {
        if !self.config.is_valid_key(&entry.name, key) {
            out.push(Violation::error(
                rel,
                rules::DOC_INVALID_KEY,
                format!(
                    "document key '{key}' does not match {} (suggested key: '{}')",
                    self.config.key_pattern(&entry.name),
                    suggest_key(key)
                ),
            ));
            return None;
        }

        if let Some(existing) = seen_keys.get(&key.to_lowercase()) {
            out.push(Violation::error(
                rel,
                rules::DOC_DUPLICATE_KEY,
                format!("document key '{key}' is already used by {existing}"),
            ));
            return None;
        }
        seen_keys.insert(key.to_lowercase(), rel.clone());

        let mut doc = Document::new(&entry.name, key, &rel);
        match read_document_data(path) {
            Ok(data) => {
                if let Some(schema) = &entry.schema {
                    let result = validation::validate_document(schema, &data);
                    for issue in result.issues {
                        out.push(Violation::error(
                            rel.clone(),
                            issue.rule_id,
                            format!("{}/{key}: {}", entry.name, issue.message),
                        ));
                    }
                    doc.fields = result.fields;
                    doc.foreign_keys = result.foreign_keys;
                }
            }
            Err(e) => {
                log::warn!("cannot parse document {rel}: {e}");
                out.push(Violation::error(
                    rel,
                    rules::DOC_PARSE,
                    format!("cannot parse YAML: {e}"),
                ));
            }
        }

        entry.documents.insert(key.to_string(), doc);
        Some(key.to_string())
    }

    fn check_attachment(&self, collection: &str, attachment: &AttachmentRef, out: &mut Vec<Violation>) {
        let Some(collection_rules) = self.config.rules_for(collection) else {
            return;
        };
        if collection_rules.allowed_attachments.is_empty() {
            return;
        }

        let for_ext: Vec<_> = collection_rules
            .allowed_attachments
            .iter()
            .filter(|r| r.extension == attachment.extension)
            .collect();
        if for_ext.is_empty() {
            let ext = if attachment.extension.is_empty() {
                "<none>"
            } else {
                attachment.extension.as_str()
            };
            out.push(Violation::error(
                attachment.path.clone(),
                rules::ATTACHMENT_DISALLOWED_EXT,
                format!("disallowed attachment extension '{ext}'"),
            ));
        } else if !for_ext.iter().any(|r| r.matches_tag(&attachment.tag)) {
            out.push(Violation::error(
                attachment.path.clone(),
                rules::ATTACHMENT_DISALLOWED_TAG,
                format!(
                    "tag '{}' does not match allowed patterns for extension '{}'",
                    attachment.tag, attachment.extension
                ),
            ));
        }
    }

    fn check_required_attachments(&self, entry: &CollectionEntry, out: &mut Vec<Violation>) {
        let Some(collection_rules) = self.config.rules_for(&entry.name) else {
            return;
        };
        for rule in collection_rules.allowed_attachments.iter().filter(|r| r.required) {
            for doc in entry.documents.values() {
                let present = doc
                    .attachments
                    .iter()
                    .any(|a| a.extension == rule.extension && rule.matches_tag(&a.tag));
                if !present {
                    out.push(Violation::error(
                        doc.path.clone(),
                        rules::ATTACHMENT_MISSING_REQUIRED,
                        format!(
                            "{}/{}: missing required attachment ext={} tag_pattern={}",
                            entry.name,
                            doc.key,
                            rule.extension,
                            rule.describe_tag()
                        ),
                    ));
                }
            }
        }
    }
}

/// Pass 2: resolve every foreign-key value against the target collection.
/// Must run after all collections are loaded, since references may point
/// forward to collections discovered later.
pub fn resolve_references(map: &DocumentMap) -> Vec<Violation> {
    let mut violations = Vec::new();
    for entry in map.collections.values() {
        let Some(schema) = &entry.schema else {
            continue;
        };
        for doc in entry.documents.values() {
            for (property, keys) in &doc.foreign_keys {
                let Some(FieldKind::Reference(fk)) = schema.field(property).map(|f| &f.kind) else {
                    continue;
                };
                let mut seen = HashSet::new();
                for key in keys {
                    if !seen.insert(key) {
                        violations.push(Violation::error(
                            doc.path.clone(),
                            rules::REF_DUPLICATE,
                            format!(
                                "{}/{}: property '{property}' lists '{key}' more than once",
                                entry.name, doc.key
                            ),
                        ));
                        continue;
                    }
                    if !map.contains(&fk.target, key) {
                        violations.push(Violation::error(
                            doc.path.clone(),
                            rules::REF_UNRESOLVED,
                            format!(
                                "{}/{}: property '{property}' references missing key '{key}' in {}",
                                entry.name, doc.key, fk.target
                            ),
                        ));
                    }
                }
            }
        }
    }
    violations
}

/// Validate every collection under `root`: both passes, violations in
/// discovery order.
pub fn validate_collections(
    root: &Path,
    schemas: &SchemaSet,
    config: &CorpusConfig,
    ignore: &[Regex],
) -> Result<(DocumentMap, Vec<Violation>)> {
    CollectionValidator::new(root, schemas, config)
        .with_ignore_patterns(ignore)
        .validate()
}

/// Keys where one is a prefix of another make attachment names ambiguous
/// to a human reader, even though matching picks the longest key.
fn check_key_prefixes(entry: &CollectionEntry, sorted_keys: &[String], out: &mut Vec<Violation>) {
    for (i, short) in sorted_keys.iter().enumerate() {
        // In sorted order every key extending `short` directly follows it
        for long in sorted_keys[i + 1..].iter().take_while(|k| k.starts_with(short.as_str())) {
            let path = entry
                .documents
                .get(long)
                .map(|d| d.path.clone())
                .unwrap_or_else(|| long.clone());
            out.push(Violation::warning(
                path,
                rules::NAMING_KEY_PREFIX,
                format!("document key '{short}' is a prefix of '{long}' in the same directory"),
            ));
        }
    }
}

fn has_multiple_dots(name: &str) -> bool {
    name.trim_start_matches('.').matches('.').count() > 1
}

/// Sorted (files, dirs) of a directory, hidden entries excluded
fn list_dir(dir: &Path) -> Result<(Vec<String>, Vec<String>)> {
    let mut files = Vec::new();
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        if entry.file_type()?.is_dir() {
            dirs.push(name);
        } else {
            files.push(name);
        }
    }
    files.sort();
    dirs.sort();
    Ok((files, dirs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const WORKS_SCHEMA: &str = r#"
fields:
  title: { type: text, required: true }
  year: { type: number }
  _composedby-authors: { type: ref, cardinality: many }
additional_properties: false
"#;

    const AUTHORS_SCHEMA: &str = "fields:\n  name: { type: text, required: true }\n";

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn schemas() -> SchemaSet {
        SchemaSet::from_strs(&[("_works", WORKS_SCHEMA), ("_authors", AUTHORS_SCHEMA)], "_").unwrap()
    }

    fn make_corpus() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(
            &root.join("_works/isvaravada.yaml"),
            "title: Isvaravada\nyear: 1025\n_composedby-authors: [jnanasrimitra]\n",
        );
        write(&root.join("_works/isvaravada_fake-1.txt"), "lorem");
        write(&root.join("_authors/jnanasrimitra.yaml"), "name: Jnanasrimitra\n");
        tmp
    }

    fn ids(violations: &[Violation]) -> Vec<(&str, &str)> {
        violations
            .iter()
            .map(|v| (v.path.as_str(), v.rule_id.as_str()))
            .collect()
    }

    #[test]
    fn test_valid_corpus() {
        let tmp = make_corpus();
        let schemas = schemas();
        let config = CorpusConfig::default();

        let (map, violations) = validate_collections(tmp.path(), &schemas, &config, &[]).unwrap();
        assert!(violations.is_empty(), "{violations:?}");
        assert_eq!(map.document_count(), 2);

        let work = map.document("_works", "isvaravada").unwrap();
        assert_eq!(work.path, "_works/isvaravada.yaml");
        assert_eq!(work.foreign_keys["_composedby-authors"], vec!["jnanasrimitra".to_string()]);
        assert_eq!(work.attachments.len(), 1);
        assert_eq!(work.attachments[0].tag, "fake");
        assert_eq!(work.attachments[0].part, Some(1));
    }

    #[test]
    fn test_unresolved_reference_reported_once() {
        let tmp = make_corpus();
        std::fs::remove_file(tmp.path().join("_authors/jnanasrimitra.yaml")).unwrap();
        let schemas = schemas();
        let config = CorpusConfig::default();

        let (_, violations) = validate_collections(tmp.path(), &schemas, &config, &[]).unwrap();
        assert_eq!(ids(&violations), vec![("_works/isvaravada.yaml", rules::REF_UNRESOLVED)]);
        let message = &violations[0].message;
        assert!(message.contains("isvaravada"));
        assert!(message.contains("_composedby-authors"));
        assert!(message.contains("jnanasrimitra"));
    }

    #[test]
    fn test_forward_references_resolve() {
        // `_authors` sorts before `_works`; a reference from authors to works
        // points at a collection loaded later.
        let tmp = make_corpus();
        write(
            &tmp.path().join("_authors/jnanasrimitra.yaml"),
            "name: Jnanasrimitra\n_wrote-works: [isvaravada]\n",
        );
        let schemas = SchemaSet::from_strs(
            &[
                ("_works", WORKS_SCHEMA),
                (
                    "_authors",
                    "fields:\n  name: { type: text }\n  _wrote-works: { type: ref, cardinality: many }\n",
                ),
            ],
            "_",
        )
        .unwrap();

        let (map, violations) =
            validate_collections(tmp.path(), &schemas, &CorpusConfig::default(), &[]).unwrap();
        assert!(violations.is_empty(), "{violations:?}");
        assert_eq!(
            map.document("_authors", "jnanasrimitra").unwrap().foreign_keys["_wrote-works"],
            vec!["isvaravada".to_string()]
        );
    }

    #[test]
    fn test_longest_prefix_attachment_owner() {
        let tmp = make_corpus();
        write(&tmp.path().join("_works/isvarasiddhi.yaml"), "title: Isvarasiddhi\n");
        let (map, violations) =
            validate_collections(tmp.path(), &schemas(), &CorpusConfig::default(), &[]).unwrap();

        assert!(violations.is_empty(), "{violations:?}");
        assert_eq!(map.document("_works", "isvaravada").unwrap().attachments.len(), 1);
        assert!(map.document("_works", "isvarasiddhi").unwrap().attachments.is_empty());
    }

    #[test]
    fn test_stray_attachment() {
        let tmp = make_corpus();
        write(&tmp.path().join("_works/lonely.txt"), "oops");
        write(&tmp.path().join("_works/nobody_notes.txt"), "oops");

        let (_, violations) =
            validate_collections(tmp.path(), &schemas(), &CorpusConfig::default(), &[]).unwrap();
        assert_eq!(
            ids(&violations),
            vec![
                ("_works/lonely.txt", rules::ATTACHMENT_STRAY),
                ("_works/nobody_notes.txt", rules::ATTACHMENT_STRAY),
            ]
        );
    }

    #[test]
    fn test_attachment_must_sit_next_to_its_document() {
        let tmp = make_corpus();
        write(&tmp.path().join("_works/scans/isvaravada_scan.pdf"), "pdf");

        let (_, violations) =
            validate_collections(tmp.path(), &schemas(), &CorpusConfig::default(), &[]).unwrap();
        assert_eq!(
            ids(&violations),
            vec![("_works/scans/isvaravada_scan.pdf", rules::ATTACHMENT_STRAY)]
        );
    }

    #[test]
    fn test_bad_document_does_not_block_siblings() {
        let tmp = make_corpus();
        write(&tmp.path().join("_works/broken.yaml"), "year: soon\n");
        write(&tmp.path().join("_works/unparsable.yaml"), "title: [unclosed\n");

        let (map, violations) =
            validate_collections(tmp.path(), &schemas(), &CorpusConfig::default(), &[]).unwrap();
        assert_eq!(
            ids(&violations),
            vec![
                ("_works/broken.yaml", rules::DOC_MISSING_FIELD),
                ("_works/broken.yaml", rules::DOC_WRONG_KIND),
                ("_works/unparsable.yaml", rules::DOC_PARSE),
            ]
        );
        assert!(map.contains("_works", "isvaravada"));
        assert!(map.contains("_works", "unparsable"));
    }

    #[test]
    fn test_invalid_and_duplicate_keys() {
        let tmp = make_corpus();
        write(&tmp.path().join("_works/Nyaya Sutra.yaml"), "title: NS\n");
        write(&tmp.path().join("_works/copies/isvaravada.yaml"), "title: Copy\n");

        let (_, violations) =
            validate_collections(tmp.path(), &schemas(), &CorpusConfig::default(), &[]).unwrap();
        assert_eq!(
            ids(&violations),
            vec![
                ("_works/Nyaya Sutra.yaml", rules::DOC_INVALID_KEY),
                ("_works/copies/isvaravada.yaml", rules::DOC_DUPLICATE_KEY),
            ]
        );
        assert!(violations[0].message.contains("nyaya-sutra"));
    }

    #[test]
    fn test_case_insensitive_key_uniqueness() {
        let tmp = make_corpus();
        write(&tmp.path().join("_works/sub/Isvaravada.yaml"), "title: Upper\n");
        let config = CorpusConfig::parse_str(
            "collections:\n  works:\n    id_pattern: \"^[A-Za-z0-9-]+$\"\n",
        )
        .unwrap();

        let (_, violations) = validate_collections(tmp.path(), &schemas(), &config, &[]).unwrap();
        assert_eq!(
            ids(&violations),
            vec![("_works/sub/Isvaravada.yaml", rules::DOC_DUPLICATE_KEY)]
        );
    }

    #[test]
    fn test_key_prefix_warning() {
        let tmp = make_corpus();
        write(&tmp.path().join("_works/isvara.yaml"), "title: Isvara\n");

        let (map, violations) =
            validate_collections(tmp.path(), &schemas(), &CorpusConfig::default(), &[]).unwrap();
        assert_eq!(
            ids(&violations),
            vec![("_works/isvaravada.yaml", rules::NAMING_KEY_PREFIX)]
        );
        assert!(!violations[0].is_error());
        assert_eq!(map.document("_works", "isvaravada").unwrap().attachments.len(), 1);
    }

    #[test]
    fn test_attachment_rules() {
        let tmp = make_corpus();
        write(&tmp.path().join("_works/isvaravada_draft.pdf"), "pdf");
        write(&tmp.path().join("_works/isvaravada_cover.png"), "png");
        write(&tmp.path().join("_works/other.yaml"), "title: Other\n");
        let config = CorpusConfig::parse_str(
            r#"
collections:
  works:
    allowed_attachments:
      - extension: txt
        required: true
        tag_pattern: "^fake$"
      - extension: pdf
        tag_pattern: "^(final)$"
"#,
        )
        .unwrap();

        let (_, violations) = validate_collections(tmp.path(), &schemas(), &config, &[]).unwrap();
        assert_eq!(
            ids(&violations),
            vec![
                ("_works/isvaravada_cover.png", rules::ATTACHMENT_DISALLOWED_EXT),
                ("_works/isvaravada_draft.pdf", rules::ATTACHMENT_DISALLOWED_TAG),
                ("_works/other.yaml", rules::ATTACHMENT_MISSING_REQUIRED),
            ]
        );
    }

    #[test]
    fn test_missing_and_unused_schemas() {
        let tmp = make_corpus();
        write(&tmp.path().join("_places/varanasi.yaml"), "name: Varanasi\n");
        std::fs::remove_dir_all(tmp.path().join("_authors")).unwrap();

        let (map, violations) =
            validate_collections(tmp.path(), &schemas(), &CorpusConfig::default(), &[]).unwrap();
        assert_eq!(
            ids(&violations),
            vec![
                ("_places", rules::SCHEMA_MISSING),
                ("_authors", rules::SCHEMA_UNUSED),
                ("_works/isvaravada.yaml", rules::REF_UNRESOLVED),
            ]
        );
        assert!(map.contains("_places", "varanasi"));
        assert!(map.get("_authors").unwrap().documents.is_empty());
    }

    #[test]
    fn test_duplicate_reference() {
        let tmp = make_corpus();
        write(
            &tmp.path().join("_works/isvaravada.yaml"),
            "title: Isvaravada\n_composedby-authors: [jnanasrimitra, jnanasrimitra]\n",
        );

        let (_, violations) =
            validate_collections(tmp.path(), &schemas(), &CorpusConfig::default(), &[]).unwrap();
        assert_eq!(ids(&violations), vec![("_works/isvaravada.yaml", rules::REF_DUPLICATE)]);
    }

    #[test]
    fn test_ignored_and_hidden_entries_skipped() {
        let tmp = make_corpus();
        write(&tmp.path().join("_works/.DS_Store"), "junk");
        write(&tmp.path().join("_works/_drafts/unfinished.txt"), "junk");
        let ignore = vec![Regex::new("^_").unwrap()];

        let (_, violations) =
            validate_collections(tmp.path(), &schemas(), &CorpusConfig::default(), &ignore).unwrap();
        assert!(violations.is_empty(), "{violations:?}");
    }

    #[test]
    fn test_multiple_dots_warning() {
        let tmp = make_corpus();
        write(&tmp.path().join("_works/isvaravada_scan.v2.txt"), "x");

        let (_, violations) =
            validate_collections(tmp.path(), &schemas(), &CorpusConfig::default(), &[]).unwrap();
        assert_eq!(
            ids(&violations),
            vec![("_works/isvaravada_scan.v2.txt", rules::NAMING_MULTIPLE_DOTS)]
        );
    }

    #[test]
    fn test_map_serializes_to_json() {
        let tmp = make_corpus();
        let (map, _) =
            validate_collections(tmp.path(), &schemas(), &CorpusConfig::default(), &[]).unwrap();
        let json: serde_json::Value = serde_json::from_str(&map.to_json_pretty().unwrap()).unwrap();
        assert_eq!(
            json["collections"]["_works"]["documents"]["isvaravada"]["attachments"][0]["path"],
            "_works/isvaravada_fake-1.txt"
        );
    }
}
