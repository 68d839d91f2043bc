// Pipeline: structure -> collections -> relations, with stage gating

use crate::collection::{CollectionValidator, DocumentMap};
use crate::config::CorpusConfig;
use crate::error::{CorpusError, Result};
use crate::fs_rules::{parse_rule_spec, RuleSpec};
use crate::relation::{extract, RelationalModel};
use crate::schema::SchemaSet;
use crate::structure::validate_structure;
use crate::violation::{has_errors, Violation};
use std::path::{Path, PathBuf};

pub const EXIT_CLEAN: i32 = 0;
pub const EXIT_VIOLATIONS: i32 = 1;
pub const EXIT_SETUP_ERROR: i32 = 2;

pub const DEFAULT_RULE_SPEC: &str = "fs_spec.yaml";
pub const DEFAULT_SCHEMAS_DIR: &str = "schemas";
pub const DEFAULT_CONFIG: &str = "config.yaml";

/// Input locations. Relative defaults resolve against the corpus root.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub root: PathBuf,
    pub rule_spec: PathBuf,
    pub schemas_dir: PathBuf,
    pub config: PathBuf,
}

impl PipelineOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        PipelineOptions {
            rule_spec: root.join(DEFAULT_RULE_SPEC),
            schemas_dir: root.join(DEFAULT_SCHEMAS_DIR),
            config: root.join(DEFAULT_CONFIG),
            root,
        }
    }
}

/// How a run ended. Each variant maps to one exit code.
#[derive(Debug)]
pub enum Outcome {
    /// Every stage passed; warnings never gate a stage
    Clean {
        map: DocumentMap,
        model: RelationalModel,
        warnings: Vec<Violation>,
    },
    /// The tree is mis-shaped; content was not scanned
    StructureViolations { violations: Vec<Violation> },
    /// Content problems; relations were not extracted
    ContentViolations {
        map: DocumentMap,
        violations: Vec<Violation>,
    },
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Clean { .. } => EXIT_CLEAN,
            _ => EXIT_VIOLATIONS,
        }
    }

    pub fn is_clean(&self) -> bool {
        matches!(self, Outcome::Clean { .. })
    }

    /// Everything reported, warnings included
    pub fn violations(&self) -> &[Violation] {
        match self {
            Outcome::Clean { warnings, .. } => warnings,
            Outcome::StructureViolations { violations } => violations,
            Outcome::ContentViolations { violations, .. } => violations,
        }
    }
}

/// A corpus with its rule spec, config and schemas loaded.
///
/// Opening performs every setup step, so a malformed rule spec, config or
/// schema surfaces here before any tree walk.
pub struct Pipeline {
    root: PathBuf,
    rule_spec: RuleSpec,
    config: CorpusConfig,
    schemas: SchemaSet,
    setup_warnings: Vec<Violation>,
}

impl Pipeline {
    pub fn open(options: &PipelineOptions) -> Result<Self> {
        if !options.root.is_dir() {
            return Err(CorpusError::Config(format!(
                "root directory not found: {}",
                options.root.display()
            )));
        }

        let rule_spec = parse_rule_spec(&options.rule_spec)?;
        let config = CorpusConfig::load(&options.config)?;
        let schemas = SchemaSet::load(&options.schemas_dir, &config.collection_prefix)?;
        let setup_warnings = schemas.cross_check(&config);

        log::debug!(
            "opened corpus {} ({} rule(s), {} schema(s))",
            options.root.display(),
            rule_spec.directories().len(),
            schemas.len()
        );

        Ok(Pipeline {
            root: options.root.clone(),
            rule_spec,
            config,
            schemas,
            setup_warnings,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn rule_spec(&self) -> &RuleSpec {
        &self.rule_spec
    }

    pub fn config(&self) -> &CorpusConfig {
        &self.config
    }

    pub fn schemas(&self) -> &SchemaSet {
        &self.schemas
    }

    /// Advisory findings from loading schemas against the config
    pub fn setup_warnings(&self) -> &[Violation] {
        &self.setup_warnings
    }

    pub fn check_structure(&self) -> Result<Vec<Violation>> {
        validate_structure(&self.root, &self.rule_spec)
    }

    pub fn check_collections(&self) -> Result<(DocumentMap, Vec<Violation>)> {
        CollectionValidator::new(&self.root, &self.schemas, &self.config)
            .with_ignore_patterns(self.rule_spec.ignore_patterns())
            .validate()
    }

    /// Run every stage, stopping at the first stage that reports errors.
    /// Each stage still completes fully so its report is exhaustive.
    pub fn run(&self) -> Result<Outcome> {
        let mut violations = self.setup_warnings.clone();

        violations.extend(self.check_structure()?);
        if has_errors(&violations) {
            log::info!("structure check failed; skipping content validation");
            return Ok(Outcome::StructureViolations { violations });
        }

        let (map, content) = self.check_collections()?;
        violations.extend(content);
        if has_errors(&violations) {
            log::info!("content validation failed; skipping relation extraction");
            return Ok(Outcome::ContentViolations { map, violations });
        }

        let model = extract(&map)?;
        Ok(Outcome::Clean {
            map,
            model,
            warnings: violations,
        })
    }
}
