use crate::error::{CorpusError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Default document key alphabet: lowercase ASCII words joined by dashes
pub const DEFAULT_KEY_PATTERN: &str = "^[a-z0-9]+(-[a-z0-9]+)*$";

/// Corpus-level configuration parsed from `config.yaml`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorpusConfigFile {
    #[serde(default = "default_marker")]
    pub collection_prefix: String,
    #[serde(default = "default_marker")]
    pub attachment_boundary: String,
    #[serde(default = "default_document_extensions")]
    pub document_extensions: Vec<String>,
    #[serde(default)]
    pub collections: BTreeMap<String, CollectionRulesDefinition>,
}

impl Default for CorpusConfigFile {
    fn default() -> Self {
        CorpusConfigFile {
            collection_prefix: default_marker(),
            attachment_boundary: default_marker(),
            document_extensions: default_document_extensions(),
            collections: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectionRulesDefinition {
    #[serde(default)]
    pub id_pattern: Option<String>,
    #[serde(default)]
    pub allowed_attachments: Vec<AttachmentRuleDefinition>,
    #[serde(default)]
    pub display_fields: Vec<String>,
}

/// An attachment rule, either a bare extension or a full mapping
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttachmentRuleDefinition {
    Extension(String),
    Full {
        extension: String,
        #[serde(default)]
        required: bool,
        #[serde(default)]
        tag_pattern: Option<String>,
    },
}

fn default_marker() -> String {
    "_".to_string()
}

fn default_document_extensions() -> Vec<String> {
    vec!["yaml".to_string(), "yml".to_string()]
}

/// Compiled corpus configuration
#[derive(Debug, Clone)]
pub struct CorpusConfig {
    pub collection_prefix: String,
    pub attachment_boundary: String,
    document_extensions: Vec<String>,
    collections: BTreeMap<String, CollectionRules>,
    fallback: Option<CollectionRules>,
}

/// Compiled per-collection rules
#[derive(Debug, Clone)]
pub struct CollectionRules {
    pub name: String,
    pub id_re: Option<Regex>,
    pub allowed_attachments: Vec<AttachmentRule>,
    pub display_fields: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AttachmentRule {
    /// Lowercased, with leading dot
    pub extension: String,
    pub required: bool,
    pub tag_re: Option<Regex>,
}

impl AttachmentRule {
    pub fn matches_tag(&self, tag: &str) -> bool {
        self.tag_re.as_ref().map_or(true, |re| re.is_match(tag))
    }

    pub fn describe_tag(&self) -> &str {
        self.tag_re.as_ref().map_or("<any>", |re| re.as_str())
    }
}

impl Default for CorpusConfig {
    fn default() -> Self {
        let file = CorpusConfigFile::default();
        CorpusConfig {
            collection_prefix: file.collection_prefix,
            attachment_boundary: file.attachment_boundary,
            document_extensions: file.document_extensions,
            collections: BTreeMap::new(),
            fallback: None,
        }
    }
}

impl CorpusConfig {
    /// Load `config.yaml`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("no corpus config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse_str(&content)
            .map_err(|e| CorpusError::Config(format!("{}: {e}", path.display())))
    }

    pub fn parse_str(content: &str) -> Result<Self> {
        let file: CorpusConfigFile = serde_yaml::from_str(content)?;
        Self::compile(file)
    }

    pub fn compile(file: CorpusConfigFile) -> Result<Self> {
        if file.collection_prefix.is_empty() {
            return Err(CorpusError::Config("collection_prefix must not be empty".into()));
        }
        if file.attachment_boundary.is_empty() {
            return Err(CorpusError::Config("attachment_boundary must not be empty".into()));
        }
        if file.document_extensions.is_empty() {
            return Err(CorpusError::Config("document_extensions must not be empty".into()));
        }

        let mut collections = BTreeMap::new();
        let mut fallback = None;
        for (name, def) in file.collections {
            if name == "*" {
                fallback = Some(CollectionRules::compile("*".to_string(), def)?);
                continue;
            }
            let name = if name.starts_with(&file.collection_prefix) {
                name
            } else {
                format!("{}{name}", file.collection_prefix)
            };
            let rules = CollectionRules::compile(name.clone(), def)?;
            if collections.insert(name.clone(), rules).is_some() {
                return Err(CorpusError::Config(format!(
                    "collection '{name}' is configured twice"
                )));
            }
        }

        Ok(CorpusConfig {
            collection_prefix: file.collection_prefix,
            attachment_boundary: file.attachment_boundary,
            document_extensions: file
                .document_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            collections,
            fallback,
        })
    }

    /// Rules for a collection: exact match first, then the `*` fallback
    pub fn rules_for(&self, collection: &str) -> Option<&CollectionRules> {
        self.collections.get(collection).or(self.fallback.as_ref())
    }

    /// Whether a document key satisfies the collection's key policy
    pub fn is_valid_key(&self, collection: &str, key: &str) -> bool {
        match self.rules_for(collection).and_then(|r| r.id_re.as_ref()) {
            Some(re) => re.is_match(key),
            None => is_default_key(key),
        }
    }

    pub fn key_pattern(&self, collection: &str) -> &str {
        self.rules_for(collection)
            .and_then(|r| r.id_re.as_ref())
            .map_or(DEFAULT_KEY_PATTERN, |re| re.as_str())
    }

    /// Whether a file extension (without dot) marks a document file
    pub fn is_document_extension(&self, ext: &str) -> bool {
        let ext = ext.to_lowercase();
        self.document_extensions.iter().any(|e| *e == ext)
    }

    pub fn is_collection_dir(&self, name: &str) -> bool {
        name.len() > self.collection_prefix.len() && name.starts_with(&self.collection_prefix)
    }
}

/// Matches [`DEFAULT_KEY_PATTERN`]
pub fn is_default_key(key: &str) -> bool {
    !key.is_empty()
        && key.split('-').all(|part| {
            !part.is_empty()
                && part
                    .bytes()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        })
}

impl CollectionRules {
    fn compile(name: String, def: CollectionRulesDefinition) -> Result<Self> {
        // Keys must match the whole pattern, not just contain a match
        let id_re = def
            .id_pattern
            .as_deref()
            .map(|p| Regex::new(&format!("^(?:{p})$")))
            .transpose()?;
        let allowed_attachments = def
            .allowed_attachments
            .into_iter()
            .map(AttachmentRule::compile)
            .collect::<Result<Vec<_>>>()?;
        Ok(CollectionRules {
            name,
            id_re,
            allowed_attachments,
            display_fields: def.display_fields,
        })
    }
}

impl AttachmentRule {
    fn compile(def: AttachmentRuleDefinition) -> Result<Self> {
        let (extension, required, tag_pattern) = match def {
            AttachmentRuleDefinition::Extension(ext) => (ext, false, None),
            AttachmentRuleDefinition::Full {
                extension,
                required,
                tag_pattern,
            } => (extension, required, tag_pattern),
        };
        let ext = extension.trim().to_lowercase();
        if ext.is_empty() || ext == "." {
            return Err(CorpusError::Config("attachment rule has an empty extension".into()));
        }
        let extension = if ext.starts_with('.') { ext } else { format!(".{ext}") };
        Ok(AttachmentRule {
            extension,
            required,
            tag_re: tag_pattern.as_deref().map(Regex::new).transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_missing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = CorpusConfig::load(&tmp.path().join("config.yaml")).unwrap();
        assert_eq!(config.collection_prefix, "_");
        assert_eq!(config.attachment_boundary, "_");
        assert!(config.is_document_extension("YAML"));
        assert!(config.is_valid_key("_works", "isvaravada"));
        assert!(config.is_valid_key("_works", "nyaya-sutra-2"));
        assert!(!config.is_valid_key("_works", "Isvaravada"));
        assert!(!config.is_valid_key("_works", "bad--key"));
    }

    #[test]
    fn test_collection_rules_and_fallback() {
        let config = CorpusConfig::parse_str(
            r#"
collections:
  works:
    id_pattern: "^[a-z0-9-]{2,64}$"
    allowed_attachments:
      - extension: txt
        required: true
        tag_pattern: "^ver[0-9]+$"
      - pdf
    display_fields: [title]
  "*":
    allowed_attachments: [md]
"#,
        )
        .unwrap();

        let works = config.rules_for("_works").unwrap();
        assert_eq!(works.name, "_works");
        assert_eq!(works.allowed_attachments.len(), 2);
        assert_eq!(works.allowed_attachments[0].extension, ".txt");
        assert!(works.allowed_attachments[0].matches_tag("ver2"));
        assert!(!works.allowed_attachments[0].matches_tag("draft"));
        assert!(works.allowed_attachments[1].matches_tag("anything"));
        assert!(config.is_valid_key("_works", "a--b"));

        let other = config.rules_for("_authors").unwrap();
        assert_eq!(other.name, "*");
    }

    #[test]
    fn test_collection_dir_detection() {
        let config = CorpusConfig::default();
        assert!(config.is_collection_dir("_works"));
        assert!(!config.is_collection_dir("_"));
        assert!(!config.is_collection_dir("schemas"));
    }

    #[test]
    fn test_bad_pattern_is_setup_error() {
        let err = CorpusConfig::parse_str("collections:\n  works:\n    id_pattern: \"[\"\n")
            .unwrap_err();
        assert!(err.is_setup_error());
    }

    #[test]
    fn test_id_pattern_is_anchored() {
        let config =
            CorpusConfig::parse_str("collections:\n  works:\n    id_pattern: \"[a-z]+\"\n").unwrap();
        assert!(config.is_valid_key("_works", "foo"));
        assert!(!config.is_valid_key("_works", "Foo-bar"));
        assert!(!config.is_valid_key("_works", "foo-bar"));
    }

    #[test]
    fn test_default_key_agrees_with_pattern() {
        let re = Regex::new(DEFAULT_KEY_PATTERN).unwrap();
        for key in [
            "isvaravada",
            "nyaya-sutra-2",
            "a",
            "0",
            "",
            "-a",
            "a-",
            "a--b",
            "Isvaravada",
            "nyaya_sutra",
            "īśvara",
            "a b",
        ] {
            assert_eq!(is_default_key(key), re.is_match(key), "{key:?}");
        }
    }
}
