//! USD strings to and from [`Micros`].
//!
//! Parsing is deterministic and never touches floating point. Accepted
//! shapes:
//! - `1234.5`, `+1234.5`, `-1234.5`
//! - `$1,234.56`, `-$1,234.56`, `$-1,234.56`
//! - `(1,234.56)` / `($1,234.56)`: accounting notation for a negative amount
//!
//! At most 6 decimal places (the micros scale); more would need rounding and
//! is rejected.

use std::fmt;

use stockopt_solver::{Micros, MICROS_SCALE};

/// Errors produced by [`parse_usd`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurrencyError {
    /// The string was empty (after trimming).
    Empty,
    /// Not a recognisable amount.
    Invalid { raw: String },
    /// More than 6 decimal places.
    TooManyDecimalPlaces { raw: String },
    /// The amount does not fit in `i64` micros.
    Overflow { raw: String },
}

impl fmt::Display for CurrencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurrencyError::Empty => write!(f, "currency amount is empty"),
            CurrencyError::Invalid { raw } => write!(f, "invalid currency amount: '{raw}'"),
            CurrencyError::TooManyDecimalPlaces { raw } => {
                write!(f, "currency amount has more than 6 decimal places: '{raw}'")
            }
            CurrencyError::Overflow { raw } => write!(f, "currency amount out of range: '{raw}'"),
        }
    }
}

impl std::error::Error for CurrencyError {}

/// Parse a USD amount into micros.
///
/// # Errors
///
/// [`CurrencyError`] describing why the string was rejected.
pub fn parse_usd(s: &str) -> Result<Micros, CurrencyError> {
    let raw = s.trim();
    if raw.is_empty() {
        return Err(CurrencyError::Empty);
    }
    let invalid = || CurrencyError::Invalid {
        raw: raw.to_string(),
    };

    // Accounting parentheses. The parentheses are the sign; an explicit
    // sign inside them is malformed.
    let (parenthesized, mut body) = match raw.strip_prefix('(') {
        Some(rest) => (true, rest.strip_suffix(')').ok_or_else(invalid)?.trim()),
        None => (false, raw),
    };
    let mut negative = parenthesized;

    // Sign and dollar sign, in either order.
    let mut signs = 0;
    loop {
        if let Some(rest) = body.strip_prefix(&['-', '+'][..]) {
            if parenthesized {
                return Err(invalid());
            }
            negative = body.starts_with('-');
            signs += 1;
            body = rest;
        } else if let Some(rest) = body.strip_prefix('$') {
            body = rest;
        } else {
            break;
        }
    }
    if signs > 1 || body.is_empty() {
        return Err(invalid());
    }

    let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));

    // Thousands separators are only legal in the integer part.
    let int_digits = strip_thousands(int_part).ok_or_else(invalid)?;

    let all_digits = |p: &str| p.chars().all(|c| c.is_ascii_digit());
    if int_digits.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    if !all_digits(&int_digits) || !all_digits(frac_part) {
        return Err(invalid());
    }
    if frac_part.len() > 6 {
        return Err(CurrencyError::TooManyDecimalPlaces {
            raw: raw.to_string(),
        });
    }

    let overflow = || CurrencyError::Overflow {
        raw: raw.to_string(),
    };
    let int_val: i64 = if int_digits.is_empty() {
        0
    } else {
        int_digits.parse().map_err(|_| overflow())?
    };
    let frac_val: i64 = format!("{frac_part:0<6}").parse().map_err(|_| invalid())?;

    let micros = int_val
        .checked_mul(MICROS_SCALE)
        .and_then(|v| v.checked_add(frac_val))
        .ok_or_else(overflow)?;

    Ok(Micros::new(if negative { -micros } else { micros }))
}

/// Remove thousands separators from `s`. `None` when a comma is not
/// between two digits (`",100"`, `"1,"`, `"1,,000"`).
pub(crate) fn strip_thousands(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b',' {
            let before = i.checked_sub(1).and_then(|j| bytes.get(j));
            let after = bytes.get(i + 1);
            let digit = |b: Option<&u8>| b.is_some_and(u8::is_ascii_digit);
            if !digit(before) || !digit(after) {
                return None;
            }
        }
    }
    Some(s.replace(',', ""))
}

/// Render micros as `$1,234.56`, rounding half away from zero to cents.
pub fn format_usd(amount: Micros) -> String {
    let raw = i128::from(amount.raw());
    let per_cent = i128::from(MICROS_SCALE / 100);
    let half = per_cent / 2;
    let cents = if raw < 0 {
        (raw - half) / per_cent
    } else {
        (raw + half) / per_cent
    };

    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.abs();
    let dollars = (cents / 100).to_string();
    format!("{sign}${}.{:02}", group_thousands(&dollars), cents % 100)
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd(s: &str) -> i64 {
        parse_usd(s).unwrap().raw()
    }

    #[test]
    fn plain_numbers() {
        assert_eq!(usd("0"), 0);
        assert_eq!(usd("100"), 100_000_000);
        assert_eq!(usd("182.34"), 182_340_000);
        assert_eq!(usd(".5"), 500_000);
        assert_eq!(usd("1.123456"), 1_123_456);
    }

    #[test]
    fn dollar_sign_and_thousands() {
        assert_eq!(usd("$1,234.56"), 1_234_560_000);
        assert_eq!(usd("  $12  "), 12_000_000);
        assert_eq!(usd("$1,000,000"), 1_000_000_000_000);
    }

    #[test]
    fn negative_forms() {
        assert_eq!(usd("-$12.00"), -12_000_000);
        assert_eq!(usd("$-12.00"), -12_000_000);
        assert_eq!(usd("-12"), -12_000_000);
        assert_eq!(usd("(12.50)"), -12_500_000);
        assert_eq!(usd("($1,012.50)"), -1_012_500_000);
        assert_eq!(usd("+3"), 3_000_000);
    }

    #[test]
    fn rejects_garbage() {
        for s in [
            "abc", "$", "-", "1.2.3", "12a", "--1", "(12", "1,,000", ",100", "$1,", ".",
        ] {
            assert!(
                matches!(parse_usd(s), Err(CurrencyError::Invalid { .. })),
                "expected Invalid for '{s}'"
            );
        }
        assert_eq!(parse_usd("   "), Err(CurrencyError::Empty));
    }

    #[test]
    fn sign_inside_parentheses_is_rejected() {
        for s in ["(-12)", "(-12.00)", "($-12)", "(-$12)", "(+12)", "( -12 )"] {
            assert!(
                matches!(parse_usd(s), Err(CurrencyError::Invalid { .. })),
                "expected Invalid for '{s}'"
            );
        }
    }

    #[test]
    fn strip_thousands_requires_digits_around_commas() {
        assert_eq!(strip_thousands("1,200").as_deref(), Some("1200"));
        assert_eq!(strip_thousands("1,000,000").as_deref(), Some("1000000"));
        assert_eq!(strip_thousands("12").as_deref(), Some("12"));
        assert_eq!(strip_thousands("-5").as_deref(), Some("-5"));
        for s in [",1,,2,", ",12", "12,", "1,,2", "-,5", "1,-2"] {
            assert_eq!(strip_thousands(s), None, "'{s}'");
        }
    }

    #[test]
    fn rejects_too_many_decimals() {
        assert!(matches!(
            parse_usd("1.1234567"),
            Err(CurrencyError::TooManyDecimalPlaces { .. })
        ));
    }

    #[test]
    fn rejects_overflow() {
        assert!(matches!(
            parse_usd("99999999999999999999"),
            Err(CurrencyError::Overflow { .. })
        ));
        assert!(matches!(
            parse_usd("9223372036854.775808"),
            Err(CurrencyError::Overflow { .. })
        ));
    }

    #[test]
    fn format_groups_and_rounds() {
        assert_eq!(format_usd(Micros::ZERO), "$0.00");
        assert_eq!(format_usd(Micros::new(1_234_560_000)), "$1,234.56");
        assert_eq!(format_usd(Micros::new(-1_234_560_000)), "-$1,234.56");
        assert_eq!(format_usd(Micros::new(1_000_000_000_000)), "$1,000,000.00");
        assert_eq!(format_usd(Micros::new(5_000)), "$0.01");
        assert_eq!(format_usd(Micros::new(4_999)), "$0.00");
        assert_eq!(format_usd(Micros::new(-5_000)), "-$0.01");
        assert_eq!(format_usd(Micros::new(999_999)), "$1.00");
    }

    #[test]
    fn format_then_parse_keeps_cent_amounts() {
        for cents in [0i64, 1, 99, 100, 123_456, -7, -100_001] {
            let m = Micros::from_cents(cents);
            assert_eq!(parse_usd(&format_usd(m)).unwrap(), m, "cents={cents}");
        }
    }
}
