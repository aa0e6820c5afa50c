//! Currency text to numeric price conversion.
//!
//! Only the symbol-prefixed, comma-grouped, dot-decimal format (`$2,499.99`)
//! is understood. Anything else is a [`ShopError::Format`].

use crate::error::{ShopError, ShopResult};

/// Currency symbol stripped from the front of a price.
pub const CURRENCY_SYMBOL: char = '$';

/// Thousands separator removed before parsing.
pub const THOUSANDS_SEPARATOR: char = ',';

/// Parses a price such as `$2,499.99` into `2499.99`.
pub fn parse_price(text: &str) -> ShopResult<f64> {
    let trimmed = text.trim();
    let unsigned = trimmed.strip_prefix(CURRENCY_SYMBOL).unwrap_or(trimmed).trim_start();

    let cleaned: String = unsigned.chars().filter(|c| *c != THOUSANDS_SEPARATOR).collect();

    if !is_decimal_numeral(&cleaned) {
        return Err(ShopError::format(text));
    }

    cleaned.parse().map_err(|_| ShopError::format(text))
}

/// Digits with at most one decimal point and at least one digit.
fn is_decimal_numeral(text: &str) -> bool {
    let mut digits = 0;
    let mut points = 0;

    for c in text.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => points += 1,
            _ => return false,
        }
    }

    digits > 0 && points <= 1
}
