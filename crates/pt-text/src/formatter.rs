//! Formatting facade and tax id display

use crate::{
    format_brl, format_brl_full, format_brl_words, format_pt_date_long, format_pt_date_short,
    format_pt_number, CalendarDate, MonetaryAmount, Result, TextError,
};

/// Portuguese text formatting utilities
pub struct PtFormatter;

impl PtFormatter {
    /// Format a number as Portuguese words
    pub fn format_number(n: i64) -> Result<String> {
        format_pt_number(n)
    }

    /// Parse a monetary amount and format it as "1.234,50"
    pub fn format_amount(input: &str) -> Result<String> {
        Ok(format_brl(&MonetaryAmount::parse(input)?))
    }

    /// Parse a monetary amount and format it as "... reais"
    pub fn format_amount_words(input: &str) -> Result<String> {
        format_brl_words(&MonetaryAmount::parse(input)?)
    }

    /// Parse a monetary amount and format it in the long document form
    pub fn format_amount_full(input: &str) -> Result<String> {
        format_brl_full(&MonetaryAmount::parse(input)?)
    }

    /// Parse a loose date and format it as "20 de fevereiro de 2026"
    pub fn format_date_long(input: &str) -> Result<String> {
        Ok(format_pt_date_long(&CalendarDate::parse(input)?))
    }

    /// Parse a loose date and format it as "20/02/2026"
    pub fn format_date_short(input: &str) -> Result<String> {
        Ok(format_pt_date_short(&CalendarDate::parse(input)?))
    }
}

/// Format a duration in months as "12 (doze) meses"
///
/// A single month reads "1 (um) mês".
pub fn format_months(months: u32) -> Result<String> {
    let unit = if months == 1 { "mês" } else { "meses" };
    Ok(format!("{months} ({}) {unit}", format_pt_number(months as i64)?))
}

/// Format a CPF (11 digits) or CNPJ (14 digits) for display
///
/// Punctuation in the input is ignored.
///
/// # Examples
/// ```
/// use pt_text::format_tax_id;
/// assert_eq!(format_tax_id("12345678901").unwrap(), "123.456.789-01");
/// assert_eq!(format_tax_id("12.345.678/0001-95").unwrap(), "12.345.678/0001-95");
/// ```
pub fn format_tax_id(input: &str) -> Result<String> {
    let digits: String = input.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != input.chars().filter(|c| c.is_alphanumeric()).count() {
        return Err(TextError::InvalidTaxId(input.to_string()));
    }

    match digits.len() {
        11 => Ok(format!(
            "{}.{}.{}-{}",
            &digits[0..3],
            &digits[3..6],
            &digits[6..9],
            &digits[9..11]
        )),
        14 => Ok(format!(
            "{}.{}.{}/{}-{}",
            &digits[0..2],
            &digits[2..5],
            &digits[5..8],
            &digits[8..12],
            &digits[12..14]
        )),
        _ => Err(TextError::InvalidTaxId(input.to_string())),
    }
}
