//! Input parsing.
//!
//! Every numeric field passes through [`parse_valid_number`] before it is
//! used. Failures are `None`, never a panic.

use crate::types::NumericInput;

/// Smallest accepted price or funds amount.
pub const MIN_AMOUNT: f64 = 0.01;

/// Parse a raw value and check it against the sign rule and `[min, max]`.
///
/// Text is trimmed first. Blank text, non-numeric text, NaN and infinities
/// are rejected, as is anything `<= 0` (or `< 0` when `allow_zero`).
pub fn parse_valid_number(raw: &NumericInput, min: f64, max: f64, allow_zero: bool) -> Option<f64> {
    if raw.is_blank() {
        return None;
    }
    let value = raw.as_finite()?;

    let sign_ok = if allow_zero { value >= 0.0 } else { value > 0.0 };
    (sign_ok && value >= min && value <= max).then_some(value)
}

/// Funds or a price: strictly positive, at least [`MIN_AMOUNT`].
pub fn parse_amount(raw: &NumericInput) -> Option<f64> {
    parse_valid_number(raw, MIN_AMOUNT, f64::INFINITY, false)
}

/// Same as [`parse_amount`] for a field that may be absent.
pub fn parse_optional_amount(raw: Option<&NumericInput>) -> Option<f64> {
    raw.and_then(parse_amount)
}

/// Position percent, 1 to 100.
pub fn parse_percent(raw: &NumericInput) -> Option<f64> {
    parse_valid_number(raw, 1.0, 100.0, false)
}

/// Whether a manual leverage was entered at all, regardless of range.
///
/// Text that does not read as a number counts as not entered. Values that
/// overflow to infinity count as entered and fail the range check later.
pub fn is_supplied(raw: Option<&NumericInput>) -> bool {
    let value = match raw {
        Some(NumericInput::Number(n)) => *n,
        Some(NumericInput::Text(s)) => match s.trim().parse::<f64>() {
            Ok(v) => v,
            Err(_) => return false,
        },
        None => return false,
    };
    !value.is_nan()
}
