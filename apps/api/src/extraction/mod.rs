// Skill extraction pipeline.
// document bytes -> text (text) -> sections (sections) -> tokens (tokenizer)
// -> taxonomy hits (taxonomy) -> confidence-scored skills (extractor).
// Everything up to the extractor is pure; pipeline owns the background job.

pub mod details;
pub mod extractor;
pub mod handlers;
pub mod pipeline;
pub mod sections;
pub mod taxonomy;
pub mod text;
pub mod tokenizer;

use thiserror::Error;

pub use extractor::{ExtractedSkill, SkillExtractor, SkillProfile, SourceSection};
pub use taxonomy::SkillTaxonomy;
pub use text::DocumentFormat;

/// Failure kinds of the extraction pipeline.
///
/// The `Display` text doubles as the human-readable reason stored alongside a
/// `FAILED` profile status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Document could not be read: {0}")]
    CorruptDocument(String),

    #[error("Document contains no extractable text")]
    EmptyDocument,

    #[error("Extraction exceeded the {limit_ms}ms time limit")]
    ExtractionTimeout { limit_ms: u64 },
}
