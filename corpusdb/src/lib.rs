pub mod collection;
pub mod config;
pub mod document;
pub mod error;
pub mod fs_rules;
pub mod pipeline;
pub mod relation;
pub mod schema;
pub mod sink;
pub mod structure;
pub mod validation;
pub mod violation;

pub use collection::{validate_collections, CollectionValidator, DocumentMap};
pub use config::CorpusConfig;
pub use document::{AttachmentRef, Document};
pub use error::{CorpusError, Result};
pub use fs_rules::RuleSpec;
pub use pipeline::{Outcome, Pipeline, PipelineOptions};
pub use relation::{extract, RelationalModel};
pub use schema::SchemaSet;
pub use sink::{RelationalSink, SqlDumpSink, SqliteSink};
pub use structure::validate_structure;
pub use violation::{Severity, Violation};
