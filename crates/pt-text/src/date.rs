//! Calendar date parsing and Portuguese date rendering

use crate::{format_pt_number, Result, TextError};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use std::fmt;
use std::str::FromStr;

/// Portuguese month names
const MONTHS: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

/// UTC offset of the America/Sao_Paulo civil time (no daylight saving since 2019)
const SAO_PAULO_OFFSET_SECS: i32 = -3 * 3600;

/// A validated calendar date
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    /// Create a date, failing for impossible day/month/year combinations
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(|| {
                TextError::InvalidDate(format!("{day:02}/{month:02}/{year:04} is not a valid date"))
            })
    }

    /// Parse loosely formatted day/month/year input
    ///
    /// Non-digit characters are stripped first; 8 digits are read as
    /// `DDMMYYYY` and 6 digits as `DDMMYY` (year 2000 + YY). Any other digit
    /// count is rejected.
    ///
    /// # Examples
    /// ```
    /// use pt_text::CalendarDate;
    /// let a = CalendarDate::parse("20/02/2026").unwrap();
    /// let b = CalendarDate::parse("20022026").unwrap();
    /// assert_eq!(a, b);
    /// assert!(CalendarDate::parse("31/04/2026").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        let digits: String = input.chars().filter(|c| c.is_ascii_digit()).collect();

        let field = |range: std::ops::Range<usize>| -> Result<u32> {
            digits[range]
                .parse()
                .map_err(|_| TextError::InvalidDate(input.to_string()))
        };

        let (day, month, year) = match digits.len() {
            8 => (field(0..2)?, field(2..4)?, field(4..8)? as i32),
            6 => (field(0..2)?, field(2..4)?, 2000 + field(4..6)? as i32),
            n => {
                return Err(TextError::InvalidDate(format!(
                    "{input}: expected 6 or 8 digits, found {n}"
                )))
            }
        };

        Self::new(year, month, day)
    }

    /// Today's date in the São Paulo civil timezone
    pub fn today() -> Self {
        Self::today_at(Utc::now())
    }

    /// The São Paulo civil date at the given instant
    pub fn today_at(now: DateTime<Utc>) -> Self {
        let civil = FixedOffset::east_opt(SAO_PAULO_OFFSET_SECS)
            .map(|offset| now.with_timezone(&offset).date_naive())
            .unwrap_or_else(|| now.date_naive());
        Self(civil)
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// The underlying chrono date
    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }
}

impl FromStr for CalendarDate {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_pt_date_short(self))
    }
}

/// Today's date in the São Paulo civil timezone
pub fn today_sao_paulo() -> CalendarDate {
    CalendarDate::today()
}

/// Portuguese month name (1-12), lowercase
pub fn month_name(month: u32) -> &'static str {
    let idx = month.saturating_sub(1) as usize;
    MONTHS.get(idx).copied().unwrap_or("")
}

/// Long written form, e.g. "20 de fevereiro de 2026"
pub fn format_pt_date_long(date: &CalendarDate) -> String {
    format!(
        "{} de {} de {}",
        date.day(),
        month_name(date.month()),
        date.year()
    )
}

/// Short numeric form, e.g. "20/02/2026"
pub fn format_pt_date_short(date: &CalendarDate) -> String {
    format!("{:02}/{:02}/{:04}", date.day(), date.month(), date.year())
}

/// Fully worded form, e.g. "vinte de fevereiro de dois mil e vinte e seis"
///
/// The first day of the month is written as "primeiro".
pub fn format_pt_date_words(date: &CalendarDate) -> Result<String> {
    let day = match date.day() {
        1 => "primeiro".to_string(),
        d => format_pt_number(d as i64)?,
    };
    Ok(format!(
        "{day} de {} de {}",
        month_name(date.month()),
        format_pt_number(date.year() as i64)?
    ))
}
