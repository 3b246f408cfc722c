//! Portuguese cardinal numbers

use crate::{Result, TextError};

/// Units (0-9)
const UNITS: [&str; 10] = [
    "zero", "um", "dois", "três", "quatro", "cinco", "seis", "sete", "oito", "nove",
];

/// Teens (10-19)
const TEENS: [&str; 10] = [
    "dez",
    "onze",
    "doze",
    "treze",
    "catorze",
    "quinze",
    "dezesseis",
    "dezessete",
    "dezoito",
    "dezenove",
];

/// Tens (20-90), indexed by the tens digit
const TENS: [&str; 10] = [
    "", "", "vinte", "trinta", "quarenta", "cinquenta", "sessenta", "setenta", "oitenta",
    "noventa",
];

/// Hundreds (100-900), indexed by the hundreds digit
const HUNDREDS: [&str; 10] = [
    "",
    "cento",
    "duzentos",
    "trezentos",
    "quatrocentos",
    "quinhentos",
    "seiscentos",
    "setecentos",
    "oitocentos",
    "novecentos",
];

/// Magnitude groups above the thousands: (size, singular, plural)
const SCALES: [(i64, &str, &str); 2] = [
    (1_000_000_000, "bilhão", "bilhões"),
    (1_000_000, "milhão", "milhões"),
];

/// Largest value [`format_pt_number`] accepts
pub const MAX_SUPPORTED: i64 = 999_999_999_999;

/// Format an integer as Portuguese words
///
/// Values are supported from 0 up to [`MAX_SUPPORTED`]; negative or larger
/// values fail with [`TextError::UnsupportedMagnitude`].
///
/// # Examples
/// ```
/// use pt_text::format_pt_number;
/// assert_eq!(format_pt_number(21).unwrap(), "vinte e um");
/// assert_eq!(format_pt_number(100).unwrap(), "cem");
/// assert_eq!(format_pt_number(2345).unwrap(), "dois mil trezentos e quarenta e cinco");
/// ```
pub fn format_pt_number(n: i64) -> Result<String> {
    if !(0..=MAX_SUPPORTED).contains(&n) {
        return Err(TextError::UnsupportedMagnitude(n));
    }
    if n == 0 {
        return Ok(UNITS[0].to_string());
    }
    Ok(large(n))
}

/// Words for 1..=MAX_SUPPORTED, splitting off one magnitude group at a time
fn large(n: i64) -> String {
    for (size, singular, plural) in SCALES {
        if n >= size {
            let count = n / size;
            let rest = n % size;
            let head = if count == 1 {
                format!("um {singular}")
            } else {
                format!("{} {plural}", large(count))
            };
            return join_group(head, rest, large);
        }
    }
    thousands(n)
}

/// Words for 1..=999_999
fn thousands(n: i64) -> String {
    if n < 1000 {
        return below_thousand(n);
    }
    let count = n / 1000;
    let rest = n % 1000;
    let head = if count == 1 {
        "mil".to_string()
    } else {
        format!("{} mil", below_thousand(count))
    };
    join_group(head, rest, below_thousand)
}

/// Append the lower part of a number to its group phrase.
///
/// "e" goes before the remainder only when it is below one hundred.
fn join_group(head: String, rest: i64, words: fn(i64) -> String) -> String {
    match rest {
        0 => head,
        r if r < 100 => format!("{head} e {}", words(r)),
        r => format!("{head} {}", words(r)),
    }
}

/// Words for 1..=999
fn below_thousand(n: i64) -> String {
    if n == 100 {
        return "cem".to_string();
    }
    if n < 100 {
        return below_hundred(n);
    }
    let hundreds = HUNDREDS[(n / 100) as usize];
    match n % 100 {
        0 => hundreds.to_string(),
        rest => format!("{hundreds} e {}", below_hundred(rest)),
    }
}

/// Words for 0..=99
fn below_hundred(n: i64) -> String {
    match n {
        0..=9 => UNITS[n as usize].to_string(),
        10..=19 => TEENS[(n - 10) as usize].to_string(),
        _ => {
            let tens = TENS[(n / 10) as usize];
            match n % 10 {
                0 => tens.to_string(),
                unit => format!("{tens} e {}", UNITS[unit as usize]),
            }
        }
    }
}
