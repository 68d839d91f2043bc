use thiserror::Error;

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("Rule spec error: {0}")]
    RuleSpec(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Relational model inconsistency: {0}")]
    Integrity(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Glob pattern error: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("{0}")]
    Other(String),
}

impl CorpusError {
    /// Malformed rule specs, schemas and configs halt the pipeline before any
    /// tree walk. The CLI maps these to exit code 2.
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            CorpusError::RuleSpec(_)
                | CorpusError::Schema(_)
                | CorpusError::Config(_)
                | CorpusError::Yaml(_)
                | CorpusError::Regex(_)
                | CorpusError::Pattern(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CorpusError>;
