//! PT Text - Brazilian Portuguese text formatting
//!
//! This crate provides:
//! - Portuguese cardinal numbers (um, dois, três...)
//! - Brazilian real amounts (parsing, "1.234,50", "... reais")
//! - Loose date parsing and written dates ("20 de fevereiro de 2026")
//! - Today's date in the São Paulo civil timezone
//!
//! # Example
//!
//! ```
//! use pt_text::{format_brl_full, format_pt_date_long, format_pt_number, CalendarDate, MonetaryAmount};
//!
//! assert_eq!(format_pt_number(42).unwrap(), "quarenta e dois");
//!
//! let valor: MonetaryAmount = "R$ 1.234,50".parse().unwrap();
//! assert_eq!(
//!     format_brl_full(&valor).unwrap(),
//!     "R$ 1.234,50 (mil duzentos e trinta e quatro reais)"
//! );
//!
//! let data = CalendarDate::parse("20/02/2026").unwrap();
//! assert_eq!(format_pt_date_long(&data), "20 de fevereiro de 2026");
//! ```

mod currency;
mod date;
mod formatter;
mod number;

pub use currency::{
    format_brl, format_brl_full, format_brl_words, format_grouped, MonetaryAmount,
};
pub use date::{
    format_pt_date_long, format_pt_date_short, format_pt_date_words, month_name,
    today_sao_paulo, CalendarDate,
};
pub use formatter::{format_months, format_tax_id, PtFormatter};
pub use number::{format_pt_number, MAX_SUPPORTED};

use thiserror::Error;

/// Errors that can occur during Portuguese text formatting
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TextError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Number out of supported range: {0}")]
    UnsupportedMagnitude(i64),

    #[error("Invalid CPF/CNPJ: {0}")]
    InvalidTaxId(String),
}

/// Result type for text formatting operations
pub type Result<T> = std::result::Result<T, TextError>;
