//! Template Engine - placeholder filling for Word templates
//!
//! This crate provides:
//! - Placeholder replacement across fragmented runs, tables and
//!   headers/footers
//! - Image placement at a marked token
//! - Typed field sets for proposals and contracts
//! - Token scanning and linting against the recognized keys
//!
//! # Example
//!
//! ```ignore
//! use docx_core::Document;
//! use template::{fill, PlaceholderMap, Traversal};
//!
//! let mut doc = Document::open("proposta.docx")?;
//! let mut map = PlaceholderMap::new();
//! map.insert_field("CLIENTE", "Maria Silva");
//! fill(&mut doc, &map, Traversal::Body);
//! doc.save("saida.docx")?;
//! ```

mod engine;
mod fields;
mod image;

pub use engine::{
    fill, lint_tokens, scan_tokens, PlaceholderEngine, PlaceholderMap, Traversal, TOKEN_CLOSE,
    TOKEN_OPEN,
};
pub use fields::{ContractFields, DocumentKind, FieldKey, ProposalFields};
pub use image::{place_image, ImageSource};

use thiserror::Error;

/// Errors that can occur during template processing
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Document error: {0}")]
    Docx(#[from] docx_core::DocxError),

    #[error("Formatting error: {0}")]
    Text(#[from] pt_text::TextError),

    #[error("Unsupported image: {0}")]
    UnsupportedImage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for template operations
pub type Result<T> = std::result::Result<T, TemplateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_from_text() {
        let err: TemplateError = pt_text::TextError::InvalidAmount("x".to_string()).into();
        assert_eq!(err.to_string(), "Formatting error: Invalid amount: x");
    }
}
