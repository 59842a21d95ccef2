//! Value normalization rules shared by the extractor and record assembly

use thiserror::Error;

/// Collapse every whitespace run (newlines included) to one space and trim.
/// Idempotent: normalizing a normalized value returns it unchanged.
pub fn normalize_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CreditError {
    #[error("no digits in credit value")]
    NoDigits,
    #[error("credit value {0} out of range")]
    OutOfRange(String),
}

/// Credit points as an integer: the first ASCII digit run, anything after
/// it (a `.`/`,` decimal part included) is dropped. "7,5" -> 7, never 8.
pub fn normalize_credits(value: &str) -> Result<u32, CreditError> {
    let start = value
        .find(|c: char| c.is_ascii_digit())
        .ok_or(CreditError::NoDigits)?;
    let digits = &value[start..];
    let len = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let digits = &digits[..len];
    digits
        .parse::<u32>()
        .map_err(|_| CreditError::OutOfRange(digits.to_string()))
}

/// First `limit` characters of `text`, cut on a char boundary
pub fn char_prefix(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// URI-safe pseudo-key fragment: umlauts transliterated, everything
/// outside `[A-Za-z0-9_]` removed
pub fn key_fragment(name: &str, char_limit: usize) -> String {
    let mut key = String::new();
    for c in char_prefix(name, char_limit).chars() {
        match c {
            'ä' => key.push_str("ae"),
            'ö' => key.push_str("oe"),
            'ü' => key.push_str("ue"),
            'Ä' => key.push_str("Ae"),
            'Ö' => key.push_str("Oe"),
            'Ü' => key.push_str("Ue"),
            'ß' => key.push_str("ss"),
            c if c.is_ascii_alphanumeric() || c == '_' => key.push(c),
            _ => {}
        }
    }
    key
}
