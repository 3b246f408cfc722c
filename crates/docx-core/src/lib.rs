//! DOCX Core - Word document package reading and writing
//!
//! This crate provides functionality for:
//! - Opening and saving `.docx` packages (all unknown parts kept as-is)
//! - A rich-text model of the body, headers and footers
//!   (paragraphs, runs, nested tables, content controls)
//! - Adding inline images (PNG, JPEG)
//!
//! # Example
//!
//! ```ignore
//! use docx_core::{Document, Paragraph};
//!
//! let mut doc = Document::open("template.docx")?;
//! for paragraph in doc.body.paragraphs() {
//!     println!("{}", paragraph.text());
//! }
//! doc.push_paragraph(Paragraph::with_text("Hello, World!"));
//! doc.save("output.docx")?;
//! ```

mod document;
mod image;
mod model;
mod package;
mod xml;

pub use document::{Document, Part, PartKind};
pub use image::{
    detect_format, fit_width, pixel_dimensions, ImageFormat, InlineImage, Length, Media, MediaId,
};
pub use model::{
    paragraphs, paragraphs_mut, Block, Cell, ContentControl, Inline, InlineGroup, Paragraph, Row,
    Run, RunContent, RunFormat, Table,
};
pub use xml::{XmlElement, XmlNode};

use thiserror::Error;

/// Errors that can occur during DOCX operations
#[derive(Debug, Error)]
pub enum DocxError {
    #[error("Failed to read package: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Package part not found: {0}")]
    MissingPart(String),

    #[error("Malformed document: {0}")]
    Malformed(String),

    #[error("Unsupported image: {0}")]
    UnsupportedImage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for DOCX operations
pub type Result<T> = std::result::Result<T, DocxError>;
