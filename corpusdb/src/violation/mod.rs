// Violation reports shared by every validation stage

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// A single rule breach. Violations are pure reports and never touch the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Path relative to the validated root, forward-slash separated.
    pub path: String,
    pub rule_id: String,
    pub message: String,
    pub severity: Severity,
}

impl Violation {
    pub fn error(path: impl Into<String>, rule_id: &str, message: impl Into<String>) -> Self {
        Violation {
            path: path.into(),
            rule_id: rule_id.to_string(),
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn warning(path: impl Into<String>, rule_id: &str, message: impl Into<String>) -> Self {
        Violation {
            path: path.into(),
            rule_id: rule_id.to_string(),
            message: message.into(),
            severity: Severity::Warning,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "[{level}] {}: {} ({})", self.path, self.message, self.rule_id)
    }
}

/// Rule identifiers, grouped by the stage that emits them.
pub mod rules {
    pub const FS_DISALLOWED_FILE: &str = "fs.disallowed-file";
    pub const FS_MISSING_README: &str = "fs.missing-readme";
    pub const FS_SUBDIR_NOT_ALLOWED: &str = "fs.subdir-not-allowed";
    pub const FS_MISSING_REQUIRED_FILE: &str = "fs.missing-required-file";
    pub const FS_MISSING_REQUIRED_DIR: &str = "fs.missing-required-dir";
    pub const FS_MISSING_DIRECTORY: &str = "fs.missing-directory";

    pub const SCHEMA_MISSING: &str = "schema.missing";
    pub const SCHEMA_UNUSED: &str = "schema.unused";
    pub const SCHEMA_UNDECLARED_FIELD: &str = "schema.undeclared-field";

    pub const DOC_PARSE: &str = "document.parse";
    pub const DOC_INVALID_KEY: &str = "document.invalid-key";
    pub const DOC_DUPLICATE_KEY: &str = "document.duplicate-key";
    pub const DOC_MISSING_FIELD: &str = "document.missing-field";
    pub const DOC_UNKNOWN_FIELD: &str = "document.unknown-field";
    pub const DOC_WRONG_KIND: &str = "document.wrong-kind";

    pub const ATTACHMENT_STRAY: &str = "attachment.stray";
    pub const ATTACHMENT_DISALLOWED_EXT: &str = "attachment.disallowed-extension";
    pub const ATTACHMENT_DISALLOWED_TAG: &str = "attachment.disallowed-tag";
    pub const ATTACHMENT_MISSING_REQUIRED: &str = "attachment.missing-required";

    pub const NAMING_KEY_PREFIX: &str = "naming.key-prefix";
    pub const NAMING_MULTIPLE_DOTS: &str = "naming.multiple-dots";

    pub const REF_UNRESOLVED: &str = "reference.unresolved";
    pub const REF_DUPLICATE: &str = "reference.duplicate";
}

/// Whether any violation in the list is an error (warnings never gate a stage).
pub fn has_errors(violations: &[Violation]) -> bool {
    violations.iter().any(Violation::is_error)
}

/// Render a path relative to `root` the way every report expects it.
pub fn display_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let s = rel.to_string_lossy().replace('\\', "/");
    if s.is_empty() {
        ".".to_string()
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_display_path_is_relative() {
        let root = PathBuf::from("/corpus");
        assert_eq!(display_path(&root, &root.join("docs/README.md")), "docs/README.md");
        assert_eq!(display_path(&root, &root), ".");
    }

    #[test]
    fn test_warnings_do_not_count_as_errors() {
        let list = vec![Violation::warning("a", rules::NAMING_KEY_PREFIX, "prefix")];
        assert!(!has_errors(&list));

        let list = vec![
            Violation::warning("a", rules::NAMING_KEY_PREFIX, "prefix"),
            Violation::error("b", rules::DOC_PARSE, "bad yaml"),
        ];
        assert!(has_errors(&list));
    }

    #[test]
    fn test_display_format() {
        let v = Violation::error("whatever", rules::FS_DISALLOWED_FILE, "disallowed file");
        assert_eq!(v.to_string(), "[error] whatever: disallowed file (fs.disallowed-file)");
    }
}
