//! Request validation with user-facing (pt-BR) messages
//!
//! Every check appends to a shared [`ValidationErrors`] so a single pass
//! reports all problems at once.

use docx_core::{detect_format, pixel_dimensions};
use pt_text::{CalendarDate, MonetaryAmount, MAX_SUPPORTED};
use std::fmt;

/// One invalid field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Request field name
    pub field: String,
    pub message: String,
    /// How to fix it
    pub suggestion: Option<String>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Empty required field
    pub fn empty_field(field: &str, label: &str) -> Self {
        Self::new(field, format!("{label} é obrigatório"))
            .with_suggestion(format!("Informe {}", label.to_lowercase()))
    }

    pub fn invalid_tax_id(field: &str) -> Self {
        Self::new(field, "CPF/CNPJ deve ter 11 ou 14 dígitos")
            .with_suggestion("Exemplos: 123.456.789-01 ou 12.345.678/0001-90")
    }

    pub fn invalid_amount(field: &str, value: &str) -> Self {
        Self::new(field, format!("Valor '{value}' inválido"))
            .with_suggestion("Use o formato 1.234,50 ou 1234.50")
    }

    pub fn invalid_date(field: &str, value: &str) -> Self {
        Self::new(field, format!("Data '{value}' inválida"))
            .with_suggestion("Use o formato DD/MM/AAAA, por exemplo 20/02/2026")
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, ". {suggestion}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// All problems found in one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    /// Names of the invalid fields, in check order
    pub fn fields(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.field.as_str()).collect()
    }

    /// `Ok(value)` when nothing was reported
    pub fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} campo(s) inválido(s)", self.errors.len())?;
        for (i, error) in self.errors.iter().enumerate() {
            write!(f, "\n{}. {error}", i + 1)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Non-empty after trimming
pub fn validate_required(value: &str, field: &str, label: &str, errors: &mut ValidationErrors) {
    if value.trim().is_empty() {
        errors.add(ValidationError::empty_field(field, label));
    }
}

/// CPF (11 digits) or CNPJ (14 digits); punctuation is ignored
pub fn validate_tax_id(value: &str, field: &str, errors: &mut ValidationErrors) {
    if value.trim().is_empty() {
        errors.add(ValidationError::empty_field(field, "CPF/CNPJ"));
        return;
    }
    let digits = value.chars().filter(char::is_ascii_digit).count();
    let stray = value
        .chars()
        .any(|c| !(c.is_ascii_digit() || matches!(c, '.' | '-' | '/' | ' ')));
    if stray || !(digits == 11 || digits == 14) {
        errors.add(ValidationError::invalid_tax_id(field));
    }
}

/// Brazilian or plain decimal amount that can still be written in words
pub fn validate_amount(
    value: &str,
    field: &str,
    errors: &mut ValidationErrors,
) -> Option<MonetaryAmount> {
    if value.trim().is_empty() {
        errors.add(ValidationError::empty_field(field, "Valor"));
        return None;
    }
    match MonetaryAmount::parse(value) {
        Ok(amount) if amount.reais() <= MAX_SUPPORTED as u64 => Some(amount),
        _ => {
            errors.add(ValidationError::invalid_amount(field, value));
            None
        }
    }
}

/// Non-negative integer count; `.` thousands separators are accepted
pub fn validate_quota(value: &str, field: &str, errors: &mut ValidationErrors) -> Option<u64> {
    let cleaned: String = value.trim().chars().filter(|c| *c != '.').collect();
    if cleaned.is_empty() {
        errors.add(ValidationError::empty_field(field, "Franquia"));
        return None;
    }
    match cleaned.parse::<u64>() {
        Ok(quota) => Some(quota),
        Err(_) => {
            errors.add(
                ValidationError::new(field, format!("Franquia '{value}' inválida"))
                    .with_suggestion("Informe um número inteiro de cópias, por exemplo 5000"),
            );
            None
        }
    }
}

/// Day/month/year date
pub fn validate_date(
    value: &str,
    field: &str,
    label: &str,
    errors: &mut ValidationErrors,
) -> Option<CalendarDate> {
    if value.trim().is_empty() {
        errors.add(ValidationError::empty_field(field, label));
        return None;
    }
    match CalendarDate::parse(value) {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(ValidationError::invalid_date(field, value));
            None
        }
    }
}

/// Contract term, at least one month
pub fn validate_term(months: u32, field: &str, errors: &mut ValidationErrors) {
    if months == 0 {
        errors.add(
            ValidationError::new(field, "Prazo deve ser de pelo menos 1 mês")
                .with_suggestion("Informe o prazo em meses, por exemplo 12"),
        );
    }
}

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// File name extension is png/jpg/jpeg and the bytes decode
pub fn validate_image(filename: &str, bytes: &[u8], field: &str, errors: &mut ValidationErrors) {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        errors.add(
            ValidationError::new(field, format!("Tipo de arquivo '{filename}' não permitido"))
                .with_suggestion("Envie uma imagem PNG ou JPEG"),
        );
        return;
    }
    if detect_format(bytes).is_err() || pixel_dimensions(bytes).is_err() {
        errors.add(
            ValidationError::new(field, format!("Não foi possível ler a imagem '{filename}'"))
                .with_suggestion("Verifique se o arquivo não está corrompido"),
        );
    }
}
