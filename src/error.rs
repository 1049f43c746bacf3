//! Error types for compendium ingestion.
//!
//! Only structural failures surface here. A phrase that no extractor recognizes
//! is never an error; the extractors return `None` or an empty list instead.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    // ========================================================================
    // Document Errors
    // ========================================================================

    #[error("Failed to parse XML: {0}")]
    XmlParse(String),

    #[error("XML file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("Unrecognized compendium document: {0}")]
    UnknownDocument(String),

    // ========================================================================
    // Environment Errors
    // ========================================================================

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IngestError {
    /// Whether this error came from malformed or missing input, as opposed to
    /// the environment the importer runs in.
    pub fn is_document_error(&self) -> bool {
        matches!(
            self,
            Self::XmlParse(_) | Self::FileNotFound { .. } | Self::UnknownDocument(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
