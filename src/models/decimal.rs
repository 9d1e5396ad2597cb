//! Fixed-point amounts stored as `NUMERIC(30, 18)`.
//!
//! Amounts are parsed from their decimal string form so no precision is lost,
//! and rendered back as plain strings with exactly [`AMOUNT_SCALE`] fractional
//! digits, e.g. `"150.000000000000000000"`.

use std::str::FromStr;

use bigdecimal::num_bigint::Sign;
use bigdecimal::BigDecimal;

/// Number of fractional digits kept for balances and amounts.
pub const AMOUNT_SCALE: i64 = 18;

/// Total number of significant digits a stored amount may carry.
pub const AMOUNT_MAX_DIGITS: i64 = 30;

/// Reasons an amount string is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("A valid number is required.")]
    Invalid,
    #[error("Amount cannot have more than 18 decimal places.")]
    TooManyDecimalPlaces,
    #[error("Ensure that there are no more than 12 digits before the decimal point.")]
    TooManyWholeDigits,
}

/// Parse an amount, enforcing the `NUMERIC(30, 18)` limits.
///
/// Trailing zeros count as written: `"0.1000000000000000000"` has 19
/// fractional digits and is rejected. The result is normalised to
/// [`AMOUNT_SCALE`].
pub fn parse_amount(raw: &str) -> Result<BigDecimal, AmountError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Invalid);
    }
    let value = BigDecimal::from_str(trimmed).map_err(|_| AmountError::Invalid)?;

    let (int, scale) = value.as_bigint_and_exponent();
    if scale > AMOUNT_SCALE {
        return Err(AmountError::TooManyDecimalPlaces);
    }

    if !fits_column(&value) {
        return Err(AmountError::TooManyWholeDigits);
    }

    Ok(value.with_scale(AMOUNT_SCALE))
}

/// Digits before the decimal point, ignoring sign.
fn whole_digits(value: &BigDecimal) -> i64 {
    let (int, scale) = value.as_bigint_and_exponent();
    let digits = if int.sign() == Sign::NoSign {
        0
    } else {
        int.magnitude().to_string().len() as i64
    };
    (digits - scale.max(0)).max(0) + (-scale).max(0)
}

/// Whether `value` has few enough whole digits for a `NUMERIC(30, 18)` column.
pub fn fits_column(value: &BigDecimal) -> bool {
    whole_digits(value) <= AMOUNT_MAX_DIGITS - AMOUNT_SCALE
}

/// Render a value as a plain decimal string with [`AMOUNT_SCALE`] fractional digits.
pub fn format_decimal(value: &BigDecimal) -> String {
    let (int, _) = value.with_scale(AMOUNT_SCALE).as_bigint_and_exponent();
    let scale = AMOUNT_SCALE as usize;
    let padded = format!("{:0>width$}", int.magnitude().to_string(), width = scale + 1);
    let split = padded.len() - scale;
    let sign = if int.sign() == Sign::Minus { "-" } else { "" };
    format!("{}{}.{}", sign, &padded[..split], &padded[split..])
}

/// The zero amount.
pub fn zero() -> BigDecimal {
    BigDecimal::from(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fits_column() {
        let largest = parse_amount("999999999999.999999999999999999").unwrap();
        assert!(fits_column(&largest));
        assert!(fits_column(&zero()));

        let doubled = &largest + &largest;
        assert!(!fits_column(&doubled));
        assert!(!fits_column(&BigDecimal::from_str("1e12").unwrap()));
    }

    #[test]
    fn test_parse_accepts_eighteen_places() {
        let value = parse_amount("12345.123456789012345678").unwrap();
        assert_eq!(format_decimal(&value), "12345.123456789012345678");
    }

    #[test]
    fn test_parse_rejects_nineteen_places() {
        assert_eq!(
            parse_amount("0.1234567890123456789"),
            Err(AmountError::TooManyDecimalPlaces)
        );
        // Trailing zeros are significant.
        assert_eq!(
            parse_amount("0.1000000000000000000"),
            Err(AmountError::TooManyDecimalPlaces)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_amount(""), Err(AmountError::Invalid));
        assert_eq!(parse_amount("   "), Err(AmountError::Invalid));
        assert_eq!(parse_amount("ten"), Err(AmountError::Invalid));
        assert_eq!(parse_amount("1.2.3"), Err(AmountError::Invalid));
    }

    #[test]
    fn test_parse_whole_digit_limit() {
        assert!(parse_amount("999999999999").is_ok());
        assert_eq!(
            parse_amount("1000000000000"),
            Err(AmountError::TooManyWholeDigits)
        );
        assert_eq!(parse_amount("1e13"), Err(AmountError::TooManyWholeDigits));
    }

    #[test]
    fn test_parse_negative_and_exponent() {
        assert_eq!(
            format_decimal(&parse_amount("-25.0").unwrap()),
            "-25.000000000000000000"
        );
        assert_eq!(
            format_decimal(&parse_amount("1e3").unwrap()),
            "1000.000000000000000000"
        );
    }

    #[test]
    fn test_format_small_and_zero() {
        assert_eq!(format_decimal(&zero()), "0.000000000000000000");
        let tiny = parse_amount("0.000000000000000001").unwrap();
        assert_eq!(format_decimal(&tiny), "0.000000000000000001");
        let neg_tiny = parse_amount("-0.5").unwrap();
        assert_eq!(format_decimal(&neg_tiny), "-0.500000000000000000");
    }

    proptest! {
        #[test]
        fn prop_formatted_value_parses_back(whole in -999_999_999_999i64..=999_999_999_999i64, frac in 0u64..1_000_000_000_000_000_000u64) {
            let sign = if whole < 0 { "-" } else { "" };
            let raw = format!("{}{}.{:018}", sign, whole.abs(), frac);
            let parsed = parse_amount(&raw).unwrap();
            let rendered = format_decimal(&parsed);
            prop_assert_eq!(parse_amount(&rendered).unwrap(), parsed);
            prop_assert_eq!(rendered.split('.').nth(1).map(str::len), Some(18));
        }
    }
}
