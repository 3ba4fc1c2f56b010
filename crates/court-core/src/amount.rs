//! # Token Amount Scaling
//!
//! Converts human-scale token amounts (`"150"`, `"12.5"`) to base units using
//! the token's declared decimal precision, and back for display.
//!
//! All arithmetic is on 256-bit integers. Decimal input is split on the point
//! and the fractional digits are right-padded to the token's precision, so no
//! rounding ever happens: an amount that cannot be represented exactly is
//! rejected.

use alloy_primitives::U256;

use crate::error::AmountError;

/// Scale a human-scale amount to base units: `amount × 10^decimals`.
///
/// # Errors
///
/// Returns [`AmountError`] for empty or non-numeric input, negative values,
/// more fractional digits than `decimals` allows (trailing zeros excepted),
/// and results that do not fit in 256 bits.
pub fn to_base_units(amount: &str, decimals: u8) -> Result<U256, AmountError> {
    let trimmed = amount.trim();
    if trimmed.starts_with('-') {
        return Err(AmountError::Negative(amount.to_string()));
    }

    let (integer, fraction) = match trimmed.split_once('.') {
        Some((integer, fraction)) => (integer, fraction.trim_end_matches('0')),
        None => (trimmed, ""),
    };

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (integer.is_empty() && fraction.is_empty() && !trimmed.contains('0'))
        || !all_digits(integer)
        || !all_digits(fraction)
    {
        return Err(AmountError::Malformed(amount.to_string()));
    }

    if fraction.len() > usize::from(decimals) {
        return Err(AmountError::TooPrecise {
            amount: amount.to_string(),
            decimals,
        });
    }

    let padding = usize::from(decimals) - fraction.len();
    let mut digits = String::with_capacity(integer.len() + usize::from(decimals));
    digits.push_str(integer);
    digits.push_str(fraction);
    digits.extend(std::iter::repeat('0').take(padding));

    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 10).map_err(|_| AmountError::Overflow(amount.to_string()))
}

/// Render base units as a human-scale decimal string, without trailing
/// fractional zeros.
pub fn format_units(value: U256, decimals: u8) -> String {
    let raw = value.to_string();
    let decimals = usize::from(decimals);
    if decimals == 0 {
        return raw;
    }

    let padded = if raw.len() <= decimals {
        format!("{}{raw}", "0".repeat(decimals - raw.len() + 1))
    } else {
        raw
    };
    let (integer, fraction) = padded.split_at(padded.len() - decimals);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        integer.to_string()
    } else {
        format!("{integer}.{fraction}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pow10(exp: u8) -> U256 {
        U256::from(10u64).pow(U256::from(exp))
    }

    #[test]
    fn integer_amount_is_scaled() {
        assert_eq!(
            to_base_units("150", 18).unwrap(),
            U256::from(150u64) * pow10(18)
        );
    }

    #[test]
    fn decimal_amount_is_scaled_exactly() {
        assert_eq!(to_base_units("12.5", 2).unwrap(), U256::from(1250u64));
        assert_eq!(to_base_units("0.000001", 6).unwrap(), U256::from(1u64));
    }

    #[test]
    fn trailing_fraction_zeros_do_not_count_as_precision() {
        assert_eq!(to_base_units("1.500", 1).unwrap(), U256::from(15u64));
    }

    #[test]
    fn zero_is_accepted() {
        assert_eq!(to_base_units("0", 18).unwrap(), U256::ZERO);
        assert_eq!(to_base_units("0.0", 18).unwrap(), U256::ZERO);
    }

    #[test]
    fn rejects_excess_precision() {
        assert_eq!(
            to_base_units("1.001", 2),
            Err(AmountError::TooPrecise {
                amount: "1.001".into(),
                decimals: 2
            })
        );
    }

    #[test]
    fn rejects_malformed_and_negative() {
        assert!(matches!(to_base_units("", 18), Err(AmountError::Malformed(_))));
        assert!(matches!(to_base_units(".", 18), Err(AmountError::Malformed(_))));
        assert!(matches!(to_base_units("1e18", 18), Err(AmountError::Malformed(_))));
        assert!(matches!(to_base_units("1.2.3", 18), Err(AmountError::Malformed(_))));
        assert!(matches!(to_base_units("-5", 18), Err(AmountError::Negative(_))));
    }

    #[test]
    fn rejects_overflow() {
        let huge = "9".repeat(80);
        assert!(matches!(
            to_base_units(&huge, 0),
            Err(AmountError::Overflow(_))
        ));
    }

    #[test]
    fn formats_fractional_values() {
        assert_eq!(format_units(U256::from(1250u64), 2), "12.5");
        assert_eq!(format_units(U256::from(5u64), 3), "0.005");
        assert_eq!(format_units(U256::from(3000u64), 3), "3");
        assert_eq!(format_units(U256::ZERO, 18), "0");
    }

    proptest! {
        #[test]
        fn integer_scaling_multiplies_by_power_of_ten(n in any::<u64>(), d in 0u8..=30) {
            let scaled = to_base_units(&n.to_string(), d).unwrap();
            prop_assert_eq!(scaled, U256::from(n) * pow10(d));
            prop_assert_eq!(format_units(scaled, d), n.to_string());
        }
    }
}
