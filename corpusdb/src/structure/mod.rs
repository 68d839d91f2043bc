use crate::error::{CorpusError, Result};
use crate::fs_rules::{DirectoryRule, RuleSpec};
use crate::violation::{display_path, rules, Violation};
use std::path::{Path, PathBuf};

/// Directory listing split into files and subdirectories, both sorted by name
struct Listing {
    files: Vec<String>,
    dirs: Vec<String>,
}

/// Validate the filesystem layout under `root` against a rule spec.
///
/// Directories whose names match an ignore pattern are pruned together with
/// their whole subtree. Every other directory is checked against its most
/// specific governing rule; directories without one are unconstrained unless
/// their parent's rule forbids subdirectories. The walk always completes so
/// the report lists every violation, not just the first.
pub fn validate_structure(root: &Path, spec: &RuleSpec) -> Result<Vec<Violation>> {
    if !root.is_dir() {
        return Err(CorpusError::Config(format!(
            "root directory not found: {}",
            root.display()
        )));
    }

    let mut violations = Vec::new();
    check_required(root, spec, &mut violations);
    check_rule_directories_exist(root, spec, &mut violations);
    walk(root, root, &mut Vec::new(), spec, &mut violations)?;

    log::info!(
        "structure check of {} finished with {} violation(s)",
        root.display(),
        violations.len()
    );
    Ok(violations)
}

fn check_required(root: &Path, spec: &RuleSpec, out: &mut Vec<Violation>) {
    for name in spec.required_files() {
        if !root.join(name).is_file() {
            out.push(Violation::error(
                name.clone(),
                rules::FS_MISSING_REQUIRED_FILE,
                format!("required file '{name}' is missing"),
            ));
        }
    }
    for name in spec.required_dirs() {
        if !root.join(name).is_dir() {
            out.push(Violation::error(
                name.clone(),
                rules::FS_MISSING_REQUIRED_DIR,
                format!("required directory '{name}' is missing"),
            ));
        }
    }
}

fn check_rule_directories_exist(root: &Path, spec: &RuleSpec, out: &mut Vec<Violation>) {
    for rule in spec.directories().iter().filter(|r| r.require_exists) {
        let dir: PathBuf = rule.segments().iter().fold(root.to_path_buf(), |p, s| p.join(s));
        if !dir.is_dir() {
            out.push(Violation::error(
                rule.path.clone(),
                rules::FS_MISSING_DIRECTORY,
                format!("directory '{}' is required by a rule but missing", rule.path),
            ));
        }
    }
}

fn walk(
    root: &Path,
    dir: &Path,
    segments: &mut Vec<String>,
    spec: &RuleSpec,
    out: &mut Vec<Violation>,
) -> Result<()> {
    log::debug!("checking directory {}", display_path(root, dir));
    let listing = list_dir(dir)?;
    let rule = spec.governing_rule(segments).filter(|r| !r.allow_any);

    if let Some(rule) = rule {
        check_readme(root, dir, rule, &listing, out);
        check_files(root, dir, rule, &listing, out);
    }

    for name in &listing.dirs {
        if spec.is_ignored_dir(name) {
            log::debug!("pruning ignored directory {}", display_path(root, &dir.join(name)));
            continue;
        }
        let child = dir.join(name);
        if let Some(rule) = rule {
            if !rule.allow_subdirs {
                out.push(Violation::error(
                    display_path(root, &child),
                    rules::FS_SUBDIR_NOT_ALLOWED,
                    format!(
                        "subdirectories are not allowed in '{}'",
                        display_path(root, dir)
                    ),
                ));
                continue;
            }
        }
        segments.push(name.clone());
        walk(root, &child, segments, spec, out)?;
        segments.pop();
    }

    Ok(())
}

fn check_readme(
    root: &Path,
    dir: &Path,
    rule: &DirectoryRule,
    listing: &Listing,
    out: &mut Vec<Violation>,
) {
    let Some(names) = rule.readme_names() else {
        return;
    };
    let found = listing
        .files
        .iter()
        .any(|f| names.iter().any(|n| n.eq_ignore_ascii_case(f)));
    if !found {
        out.push(Violation::error(
            display_path(root, dir),
            rules::FS_MISSING_README,
            format!("missing README (one of: {names:?})"),
        ));
    }
}

fn check_files(
    root: &Path,
    dir: &Path,
    rule: &DirectoryRule,
    listing: &Listing,
    out: &mut Vec<Violation>,
) {
    if !rule.has_file_constraints() || !rule.only_allow_matching {
        return;
    }
    for name in &listing.files {
        if !rule.allows_file(name) {
            out.push(Violation::error(
                display_path(root, &dir.join(name)),
                rules::FS_DISALLOWED_FILE,
                format!("disallowed file. Allowed by: {}", rule.describe_allowance()),
            ));
        }
    }
}

fn list_dir(dir: &Path) -> Result<Listing> {
    let mut files = Vec::new();
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        // Symlinks are listed as files and never followed
        if entry.file_type()?.is_dir() {
            dirs.push(name);
        } else {
            files.push(name);
        }
    }
    files.sort();
    dirs.sort();
    Ok(Listing { files, dirs })
}
