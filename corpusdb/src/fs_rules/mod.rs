// Declarative filesystem rules: loading, compilation and rule lookup

mod parser;
mod types;

pub use parser::{parse_rule_spec, parse_rule_spec_str};
pub use types::*;

use crate::error::{CorpusError, Result};
use glob::Pattern;
use regex::Regex;
use std::collections::HashSet;

/// README names accepted when `require_readme_per_dir: true`
pub const DEFAULT_README_NAMES: &[&str] = &["README.md", "README", "README.txt", "README.rst"];

/// A loaded, immutable rule spec. Rules are kept sorted by specificity
/// (segment count, then path) so lookups never depend on file order.
#[derive(Debug, Clone)]
pub struct RuleSpec {
    ignore: Vec<Regex>,
    required_files: Vec<String>,
    required_dirs: Vec<String>,
    directories: Vec<DirectoryRule>,
}

/// A compiled `directories[]` entry
#[derive(Debug, Clone)]
pub struct DirectoryRule {
    /// Normalized relative path, `.` for the root
    pub path: String,
    segments: Vec<String>,
    allowed_names: Vec<Pattern>,
    allowed_extensions: Vec<String>,
    file_name_regex: Option<Regex>,
    pub allow_subdirs: bool,
    readme_names: Option<Vec<String>>,
    pub only_allow_matching: bool,
    pub recursive: bool,
    pub require_exists: bool,
    pub allow_any: bool,
}

impl RuleSpec {
    /// Compile regexes and glob patterns and check the spec is well formed.
    pub fn compile(file: RuleSpecFile) -> Result<Self> {
        let ignore = file
            .ignore
            .dir_name_regex
            .iter()
            .map(|p| Regex::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        for name in file.required.files.iter().chain(&file.required.dirs) {
            if name.is_empty() || name.contains('/') || name.contains('\\') {
                return Err(CorpusError::RuleSpec(format!(
                    "required entry '{name}' must be a plain root-level name"
                )));
            }
        }

        let mut seen = HashSet::new();
        let mut directories = Vec::with_capacity(file.directories.len());
        for def in file.directories {
            let rule = DirectoryRule::compile(def)?;
            if !seen.insert(rule.path.clone()) {
                return Err(CorpusError::RuleSpec(format!(
                    "duplicate directory rule for path '{}'",
                    rule.path
                )));
            }
            directories.push(rule);
        }
        directories.sort_by(|a, b| {
            a.segments
                .len()
                .cmp(&b.segments.len())
                .then_with(|| a.path.cmp(&b.path))
        });

        Ok(RuleSpec {
            ignore,
            required_files: file.required.files,
            required_dirs: file.required.dirs,
            directories,
        })
    }

    pub fn is_ignored_dir(&self, name: &str) -> bool {
        self.ignore.iter().any(|re| re.is_match(name))
    }

    pub fn ignore_patterns(&self) -> &[Regex] {
        &self.ignore
    }

    pub fn required_files(&self) -> &[String] {
        &self.required_files
    }

    pub fn required_dirs(&self) -> &[String] {
        &self.required_dirs
    }

    /// Directory rules in evaluation order (least to most specific)
    pub fn directories(&self) -> &[DirectoryRule] {
        &self.directories
    }

    /// The most specific rule governing the directory at `segments` (relative
    /// to the root). A rule governs its own directory, and its descendants
    /// only when it is recursive.
    pub fn governing_rule(&self, segments: &[String]) -> Option<&DirectoryRule> {
        self.directories
            .iter()
            .rev()
            .find(|rule| rule.governs(segments))
    }
}

impl DirectoryRule {
    fn compile(def: DirectoryRuleDefinition) -> Result<Self> {
        let def = def.merged();
        let segments = normalize_rule_path(&def.path)?;
        let path = if segments.is_empty() {
            ".".to_string()
        } else {
            segments.join("/")
        };

        let allowed_names = def
            .allowed_names
            .iter()
            .map(|n| Pattern::new(n))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let allowed_extensions = def
            .allowed_extensions
            .iter()
            .map(|e| normalize_extension(e))
            .collect();

        let file_name_regex = def
            .file_name_regex
            .as_deref()
            .map(Regex::new)
            .transpose()?;

        let readme_names = match def.require_readme_per_dir {
            ReadmeRequirement::Flag(false) => None,
            ReadmeRequirement::Flag(true) => Some(
                DEFAULT_README_NAMES.iter().map(|s| s.to_string()).collect(),
            ),
            ReadmeRequirement::Names(names) if names.is_empty() => None,
            ReadmeRequirement::Names(names) => Some(names),
        };

        Ok(DirectoryRule {
            path,
            segments,
            allowed_names,
            allowed_extensions,
            file_name_regex,
            allow_subdirs: def.allow_subdirs,
            readme_names,
            only_allow_matching: def.only_allow_matching,
            recursive: def.recursive,
            require_exists: def.require_exists,
            allow_any: def.allow_any,
        })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn governs(&self, segments: &[String]) -> bool {
        if segments == self.segments.as_slice() {
            return true;
        }
        self.recursive && segments.starts_with(&self.segments)
    }

    /// README names of which at least one must exist, if any are required
    pub fn readme_names(&self) -> Option<&[String]> {
        self.readme_names.as_deref()
    }

    pub fn has_file_constraints(&self) -> bool {
        !self.allowed_names.is_empty()
            || !self.allowed_extensions.is_empty()
            || self.file_name_regex.is_some()
            || self.only_allow_matching
    }

    /// Whether a file name is explicitly allowed by names, extensions or regex
    pub fn allows_file(&self, name: &str) -> bool {
        if self.allowed_names.iter().any(|p| p.matches(name)) {
            return true;
        }
        if let Some(ext) = file_extension(name) {
            if self.allowed_extensions.contains(&ext) {
                return true;
            }
        }
        self.file_name_regex
            .as_ref()
            .is_some_and(|re| re.is_match(name))
    }

    /// Human-readable summary of what this rule allows
    pub fn describe_allowance(&self) -> String {
        let mut desc = Vec::new();
        if !self.allowed_names.is_empty() {
            let names: Vec<&str> = self.allowed_names.iter().map(|p| p.as_str()).collect();
            desc.push(format!("names={names:?}"));
        }
        if !self.allowed_extensions.is_empty() {
            desc.push(format!("exts={:?}", self.allowed_extensions));
        }
        if let Some(re) = &self.file_name_regex {
            desc.push(format!("regex={}", re.as_str()));
        }
        if desc.is_empty() {
            "<none>".to_string()
        } else {
            desc.join(", ")
        }
    }
}

fn normalize_rule_path(raw: &str) -> Result<Vec<String>> {
    let trimmed = raw.trim();
    if trimmed.starts_with('/') || trimmed.starts_with('\\') {
        return Err(CorpusError::RuleSpec(format!(
            "directory rule path '{raw}' must be relative to the root"
        )));
    }
    let mut segments = Vec::new();
    for seg in trimmed.split(['/', '\\']) {
        match seg {
            "" | "." => continue,
            ".." => {
                return Err(CorpusError::RuleSpec(format!(
                    "directory rule path '{raw}' must not leave the root"
                )))
            }
            s => segments.push(s.to_string()),
        }
    }
    Ok(segments)
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{ext}")
    }
}

/// Lowercased extension including the leading dot, if any
pub(crate) fn file_extension(name: &str) -> Option<String> {
    std::path::Path::new(name)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
}
