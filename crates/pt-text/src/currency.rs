//! Brazilian real (BRL) amounts: parsing and display

use crate::{format_pt_number, Result, TextError};
use std::fmt;
use std::str::FromStr;

/// A non-negative monetary amount with two fraction digits
///
/// Stored as an integer count of centavos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MonetaryAmount {
    centavos: u64,
}

impl MonetaryAmount {
    /// Create an amount from a centavo count
    pub fn from_centavos(centavos: u64) -> Self {
        Self { centavos }
    }

    /// Create an amount from whole reais and centavos
    pub fn new(reais: u64, centavos: u8) -> Result<Self> {
        if centavos > 99 {
            return Err(TextError::InvalidAmount(format!(
                "{reais},{centavos}: centavos must be below 100"
            )));
        }
        reais
            .checked_mul(100)
            .and_then(|c| c.checked_add(centavos as u64))
            .map(Self::from_centavos)
            .ok_or_else(|| TextError::InvalidAmount(format!("{reais}: amount too large")))
    }

    /// Total amount in centavos
    pub fn centavos(&self) -> u64 {
        self.centavos
    }

    /// Whole reais (fraction truncated)
    pub fn reais(&self) -> u64 {
        self.centavos / 100
    }

    /// Fractional part in centavos (0-99)
    pub fn fraction(&self) -> u8 {
        (self.centavos % 100) as u8
    }

    /// Parse free-form monetary input
    ///
    /// Accepts an optional `R$` prefix and either a comma or a period as the
    /// decimal marker. When both separators occur, the rightmost one is the
    /// decimal marker. A single separator is a decimal marker only when it
    /// occurs once and is followed by one or two digits.
    ///
    /// # Examples
    /// ```
    /// use pt_text::MonetaryAmount;
    /// let a = MonetaryAmount::parse("R$ 1.234,50").unwrap();
    /// let b = MonetaryAmount::parse("1234.50").unwrap();
    /// assert_eq!(a, b);
    /// assert_eq!(a.centavos(), 123450);
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || TextError::InvalidAmount(input.to_string());

        let trimmed = input.trim();
        let without_prefix = match trimmed.get(..2) {
            Some(prefix) if prefix.eq_ignore_ascii_case("r$") => &trimmed[2..],
            _ => trimmed,
        };
        let compact: String = without_prefix
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let is_separator = |c: char| c == ',' || c == '.';
        if compact.is_empty() || compact.starts_with(is_separator) || compact.ends_with(is_separator)
        {
            return Err(invalid());
        }

        let normalized = normalize_separators(&compact).ok_or_else(invalid)?;
        let (int_part, frac_part) = match normalized.split_once('.') {
            Some((i, f)) => (i, f),
            None => (normalized.as_str(), ""),
        };

        let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if int_part.is_empty()
            || !all_digits(int_part)
            || !all_digits(frac_part)
            || frac_part.len() > 2
            || (normalized.contains('.') && frac_part.is_empty())
        {
            return Err(invalid());
        }

        let reais: u64 = int_part.parse().map_err(|_| invalid())?;
        let centavos: u8 = match frac_part.len() {
            0 => 0,
            1 => frac_part.parse::<u8>().map_err(|_| invalid())? * 10,
            _ => frac_part.parse().map_err(|_| invalid())?,
        };

        Self::new(reais, centavos)
    }
}

/// Resolve grouping and decimal separators into `digits[.digits]`
///
/// `None` when the separators are inconsistent: the decimal marker also used
/// for grouping, or groups that are not three digits wide.
fn normalize_separators(s: &str) -> Option<String> {
    let is_separator = |c: char| c == ',' || c == '.';
    let occurs_once = |pos: usize| s.matches(&s[pos..pos + 1]).count() == 1;

    let decimal = match (s.rfind(','), s.rfind('.')) {
        (Some(c), Some(p)) => {
            let pos = c.max(p);
            if !occurs_once(pos) {
                return None;
            }
            Some(pos)
        }
        (Some(pos), None) | (None, Some(pos)) => {
            let digits_after = s.len() - pos - 1;
            (occurs_once(pos) && (1..=2).contains(&digits_after)).then_some(pos)
        }
        (None, None) => None,
    };

    let (int_part, frac_part) = match decimal {
        Some(pos) => (&s[..pos], Some(&s[pos + 1..])),
        None => (s, None),
    };
    if int_part.contains(is_separator) && !is_grouped(int_part) {
        return None;
    }

    let mut out: String = int_part.chars().filter(|c| !is_separator(*c)).collect();
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    Some(out)
}

/// `d{1,3}(sep d{3})*` with a single separator kind
fn is_grouped(int_part: &str) -> bool {
    let mut groups = int_part.split(|c: char| c == ',' || c == '.');
    let lead_ok = groups.next().is_some_and(|g| (1..=3).contains(&g.len()));
    lead_ok && groups.all(|g| g.len() == 3)
}

impl FromStr for MonetaryAmount {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for MonetaryAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_brl(self))
    }
}

/// Format an integer with period thousands separators (e.g. "1.234.567")
pub fn format_grouped(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);

    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push('.');
        }
        result.push(c);
    }

    result
}

/// Grouped display form (e.g. "1.234,50")
pub fn format_brl(amount: &MonetaryAmount) -> String {
    format!("{},{:02}", format_grouped(amount.reais()), amount.fraction())
}

/// Words form of the whole reais (e.g. "mil duzentos e trinta e quatro reais")
///
/// Centavos are not spoken.
pub fn format_brl_words(amount: &MonetaryAmount) -> Result<String> {
    let reais = i64::try_from(amount.reais())
        .map_err(|_| TextError::InvalidAmount(format_brl(amount)))?;
    Ok(format!("{} reais", format_pt_number(reais)?))
}

/// Long form used in documents: "R$ 1.234,50 (mil duzentos e trinta e quatro reais)"
pub fn format_brl_full(amount: &MonetaryAmount) -> Result<String> {
    Ok(format!(
        "R$ {} ({})",
        format_brl(amount),
        format_brl_words(amount)?
    ))
}
