//! Error types for the extraction layer.
//!
//! Per-entry errors (`FieldMissing`, `DateParse`, `PayloadMalformed`) are
//! recovered inside the extractors by skipping the owning entry. Per-file
//! errors (`FormatMismatch`) are recovered by the orchestrator, which marks
//! the category failed and moves on to the next source file.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("source file does not match the expected format: {0}")]
    FormatMismatch(String),

    #[error("required field missing: {0}")]
    FieldMissing(&'static str),

    #[error("unrecognized timestamp: {0:?}")]
    DateParse(String),

    #[error("comment payload not parseable: {0}")]
    PayloadMalformed(String),
}

pub type Result<T, E = ExtractError> = std::result::Result<T, E>;
