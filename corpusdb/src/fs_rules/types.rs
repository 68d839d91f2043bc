use serde::{Deserialize, Serialize};

/// Top-level rule spec as written in `fs_spec.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSpecFile {
    #[serde(default)]
    pub ignore: IgnoreSection,
    #[serde(default)]
    pub required: RequiredSection,
    #[serde(default)]
    pub directories: Vec<DirectoryRuleDefinition>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IgnoreSection {
    /// Directory names matching any of these regexes are pruned everywhere.
    #[serde(default)]
    pub dir_name_regex: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequiredSection {
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub dirs: Vec<String>,
}

/// One entry of `directories[]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectoryRuleDefinition {
    pub path: String,
    #[serde(default)]
    pub allowed_names: Vec<String>,
    #[serde(default)]
    pub allowed_extensions: Vec<String>,
    #[serde(default)]
    pub file_name_regex: Option<String>,
    #[serde(default = "default_true")]
    pub allow_subdirs: bool,
    #[serde(default)]
    pub require_readme_per_dir: ReadmeRequirement,
    #[serde(default)]
    pub only_allow_matching: bool,
    #[serde(default)]
    pub recursive: bool,
    #[serde(default)]
    pub require_exists: bool,
    #[serde(default)]
    pub allow_any: bool,
    /// Nested option block; set keys here override the inline ones
    #[serde(default)]
    pub rules: Option<DirectoryRuleOptions>,
}

/// The `rules:` block of a directory entry. Every key is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectoryRuleOptions {
    pub allowed_names: Option<Vec<String>>,
    pub allowed_extensions: Option<Vec<String>>,
    pub file_name_regex: Option<String>,
    pub allow_subdirs: Option<bool>,
    pub require_readme_per_dir: Option<ReadmeRequirement>,
    pub only_allow_matching: Option<bool>,
    pub recursive: Option<bool>,
    pub require_exists: Option<bool>,
    pub allow_any: Option<bool>,
}

impl DirectoryRuleDefinition {
    /// Fold the nested `rules:` block into the inline keys
    pub fn merged(mut self) -> Self {
        let Some(opts) = self.rules.take() else {
            return self;
        };
        if let Some(v) = opts.allowed_names {
            self.allowed_names = v;
        }
        if let Some(v) = opts.allowed_extensions {
            self.allowed_extensions = v;
        }
        if opts.file_name_regex.is_some() {
            self.file_name_regex = opts.file_name_regex;
        }
        if let Some(v) = opts.allow_subdirs {
            self.allow_subdirs = v;
        }
        if let Some(v) = opts.require_readme_per_dir {
            self.require_readme_per_dir = v;
        }
        if let Some(v) = opts.only_allow_matching {
            self.only_allow_matching = v;
        }
        if let Some(v) = opts.recursive {
            self.recursive = v;
        }
        // Either location may ask for the directory to exist
        self.require_exists |= opts.require_exists.unwrap_or(false);
        if let Some(v) = opts.allow_any {
            self.allow_any = v;
        }
        self
    }
}

/// `require_readme_per_dir` is either a flag or the list of accepted names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReadmeRequirement {
    Flag(bool),
    Names(Vec<String>),
}

impl Default for ReadmeRequirement {
    fn default() -> Self {
        ReadmeRequirement::Flag(false)
    }
}

fn default_true() -> bool {
    true
}
