//! Proposta - rental proposal and contract generation
//!
//! This crate provides:
//! - Request validation with pt-BR messages
//! - The generation pipeline (template fill, PDF conversion, persistence)
//! - A headless office converter behind [`DocumentConverter`]
//! - A SQLite store behind [`ProposalStore`]
//! - Settings read from the environment
//!
//! # Example
//!
//! ```ignore
//! use proposta::{DocumentGenerator, OfficeConverter, ProposalRequest, SqliteProposalStore};
//! use std::time::Duration;
//!
//! let generator = DocumentGenerator::new(
//!     "templates",
//!     OfficeConverter::new("soffice", Duration::from_secs(60)),
//!     SqliteProposalStore::open("propostas.db")?,
//! );
//! let doc = generator.generate_proposal(ProposalRequest {
//!     cliente: "Maria Silva".into(),
//!     cpf: "123.456.789-01".into(),
//!     modelo: "MP 301".into(),
//!     franquia: "5000".into(),
//!     valor: "1.234,50".into(),
//!     ..Default::default()
//! })?;
//! std::fs::write(&doc.filename, &doc.pdf)?;
//! ```

pub mod config;
pub mod converter;
pub mod generator;
pub mod request;
pub mod store;
pub mod validation;

pub use config::{ConfigError, Settings};
pub use converter::{ConvertError, DocumentConverter, OfficeConverter};
pub use generator::{sanitize_filename, DocumentFields, DocumentGenerator, GeneratedDocument};
pub use request::{ContractRequest, ImageUpload, ProposalRequest, ValidContract, ValidProposal};
pub use store::{NewProposal, ProposalStore, ProposalSummary, SqliteProposalStore, StoreError};
pub use validation::{ValidationError, ValidationErrors};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while generating a document
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("invalid request: {0}")]
    Validation(ValidationErrors),

    #[error("template not found: {}", .0.display())]
    TemplateMissing(PathBuf),

    #[error("PDF conversion failed: {0}")]
    ConversionFailed(#[from] ConvertError),

    #[error("template error: {0}")]
    Template(#[from] template::TemplateError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("failed to create temporary directory: {0}")]
    TempDir(#[source] std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for generation
pub type Result<T> = std::result::Result<T, GeneratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            GeneratorError::TemplateMissing(PathBuf::from("templates/proposta.docx")).to_string(),
            "template not found: templates/proposta.docx"
        );
        assert_eq!(
            GeneratorError::from(ConvertError::Exit(1)).to_string(),
            "PDF conversion failed: converter exited with status 1"
        );
    }
}
