//! Mantissa/scale values: `mantissa * 10^-scale`.

use std::fmt;

use alloy_primitives::U256;
use ledger_codec::{Layout, StructLayout, StructValue};
use rust_decimal::Decimal;

use crate::error::FixedPointError;

/// Most decimal digits a [`Decimal`] mantissa always holds.
pub const MAX_DECIMAL_DIGITS: usize = 28;

/// Fewest significant digits a conversion may keep before it is rejected.
pub const MIN_SIGNIFICANT_DIGITS: usize = 20;

/// Number of value limbs in a multi-limb mantissa; trailing limbs are padding.
pub const VALUE_LIMBS: usize = 4;

/// An exact base-10 scaled value with up to a 256-bit mantissa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScaledValue {
    negative: bool,
    mantissa: U256,
    scale: u32,
}

impl ScaledValue {
    pub fn new(mantissa: U256, scale: u32) -> Self {
        Self {
            negative: false,
            mantissa,
            scale,
        }
    }

    pub fn from_i128(mantissa: i128, scale: u32) -> Self {
        Self {
            negative: mantissa < 0,
            mantissa: U256::from(mantissa.unsigned_abs()),
            scale,
        }
    }

    /// Combine little-endian 64-bit limbs: `sum(limb[i] * 2^(64 i))`.
    ///
    /// Only the first [`VALUE_LIMBS`] limbs carry value; anything after is
    /// padding and ignored.
    pub fn from_limbs(limbs: &[u64], scale: u32) -> Self {
        let mut value = [0u64; VALUE_LIMBS];
        for (dst, src) in value.iter_mut().zip(limbs) {
            *dst = *src;
        }
        Self::new(U256::from_limbs(value), scale)
    }

    pub fn mantissa(&self) -> U256 {
        self.mantissa
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn is_negative(&self) -> bool {
        self.negative && !self.mantissa.is_zero()
    }

    /// Convert to a [`Decimal`].
    ///
    /// Keeps up to 28 significant digits; fractional digits beyond that are
    /// truncated toward zero. Fails with `Overflow` when the integer part
    /// alone needs more than 28 digits, and with `PrecisionLoss` when fewer
    /// than [`MIN_SIGNIFICANT_DIGITS`] of the value's significant digits
    /// would survive.
    pub fn to_decimal(&self) -> Result<Decimal, FixedPointError> {
        let mut digits = self.mantissa.to_string();
        let mut scale = self.scale as usize;
        // Trailing zeros below the point carry no value.
        while scale > 0 && digits.len() > 1 && digits.ends_with('0') {
            digits.pop();
            scale -= 1;
        }
        let len = digits.len();
        let significant = if self.mantissa.is_zero() {
            0
        } else {
            digits.trim_end_matches('0').len()
        };

        let int_len = len.saturating_sub(scale);
        if int_len > MAX_DECIMAL_DIGITS {
            return Err(FixedPointError::Overflow(format!(
                "{int_len} integer digits in {self}"
            )));
        }
        let frac_keep = scale.min(MAX_DECIMAL_DIGITS - int_len);
        let dropped = scale - frac_keep;
        let kept_len = len.saturating_sub(dropped);
        if kept_len < significant.min(MIN_SIGNIFICANT_DIGITS) {
            return Err(FixedPointError::PrecisionLoss(format!(
                "{kept_len} of {significant} significant digits fit in {self}"
            )));
        }
        let kept = if kept_len == 0 { "0" } else { &digits[..kept_len] };

        let magnitude: i128 = kept
            .parse()
            .map_err(|_| FixedPointError::Overflow(format!("mantissa {kept}")))?;
        let signed = if self.negative { -magnitude } else { magnitude };
        Decimal::try_from_i128_with_scale(signed, frac_keep as u32)
            .map(|d| d.normalize())
            .map_err(|e| FixedPointError::Overflow(e.to_string()))
    }
}

impl fmt::Display for ScaledValue {
    /// Exact decimal text, no precision limit.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.mantissa.to_string();
        let scale = self.scale as usize;
        if self.is_negative() {
            f.write_str("-")?;
        }
        if scale == 0 {
            return f.write_str(&digits);
        }
        let padded = if digits.len() <= scale {
            format!("{}{digits}", "0".repeat(scale + 1 - digits.len()))
        } else {
            digits
        };
        let (int, frac) = padded.split_at(padded.len() - scale);
        write!(f, "{int}.{frac}")
    }
}

/// Decode a multi-limb mantissa with a base-10 scale into a decimal.
pub fn decode_scaled(limbs: &[u64], scale: u32) -> Result<Decimal, FixedPointError> {
    ScaledValue::from_limbs(limbs, scale).to_decimal()
}

/// Oracle decimal: signed 128-bit mantissa with a base-10 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SwitchboardDecimal {
    pub mantissa: i128,
    pub scale: u32,
}

impl SwitchboardDecimal {
    pub fn layout() -> StructLayout {
        StructLayout::new()
            .field("mantissa", Layout::I128)
            .field("scale", Layout::U32)
    }

    pub fn from_value(value: &StructValue) -> Result<Self, FixedPointError> {
        Ok(Self {
            mantissa: value.field("mantissa")?.as_i128()?,
            scale: value.field("scale")?.as_u32()?,
        })
    }

    pub fn to_value(&self) -> StructValue {
        StructValue::new()
            .with("mantissa", self.mantissa)
            .with("scale", self.scale)
    }

    pub fn to_scaled(&self) -> ScaledValue {
        ScaledValue::from_i128(self.mantissa, self.scale)
    }

    pub fn to_decimal(&self) -> Result<Decimal, FixedPointError> {
        self.to_scaled().to_decimal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    // ─── Limb decoding ───────────────────────────────────────────

    #[test]
    fn single_unit_limb_is_one() {
        assert_eq!(decode_scaled(&[1, 0, 0, 0, 0, 0], 0).unwrap(), Decimal::ONE);
    }

    #[test]
    fn scale_divides_by_power_of_ten() {
        assert_eq!(decode_scaled(&[1_000_000, 0, 0, 0, 0, 0], 6).unwrap(), Decimal::ONE);
        assert_eq!(decode_scaled(&[15, 0, 0, 0], 1).unwrap(), dec("1.5"));
    }

    #[test]
    fn padding_limbs_are_ignored() {
        let with_padding = decode_scaled(&[42, 0, 0, 0, u64::MAX, u64::MAX], 0).unwrap();
        assert_eq!(with_padding, dec("42"));
    }

    #[test]
    fn second_limb_is_two_pow_64() {
        assert_eq!(
            decode_scaled(&[0, 1, 0, 0], 0).unwrap(),
            dec("18446744073709551616")
        );
    }

    #[test]
    fn twenty_significant_digits_survive() {
        // 1.2345678901234567890123
        let mantissa: u128 = 12_345_678_901_234_567_890_123;
        let limbs = [mantissa as u64, (mantissa >> 64) as u64, 0, 0];
        let value = decode_scaled(&limbs, 22).unwrap();
        assert_eq!(value, dec("1.2345678901234567890123"));
        assert!(value.to_string().len() >= 21);
    }

    #[test]
    fn huge_integer_part_overflows() {
        let err = decode_scaled(&[0, 0, 0, 1], 0).unwrap_err();
        assert!(matches!(err, FixedPointError::Overflow(_)));
    }

    #[test]
    fn huge_mantissa_with_large_scale_keeps_28_digits() {
        // 2^192 / 10^50 = 62771017.35386680763835789423207666416102355444464034512896
        let value = decode_scaled(&[0, 0, 0, 1], 50).unwrap();
        assert_eq!(value, dec("62771017.35386680763835789423"));
    }

    #[test]
    fn digits_below_decimal_range_are_rejected() {
        let err = decode_scaled(&[1, 0, 0, 0], 30).unwrap_err();
        assert!(matches!(err, FixedPointError::PrecisionLoss(_)));
    }

    #[test]
    fn small_value_keeping_too_few_digits_is_rejected() {
        // 1.2345678901234567890123e-18: only 11 digits fit below 10^-28.
        let mantissa: u128 = 12_345_678_901_234_567_890_123;
        let limbs = [mantissa as u64, (mantissa >> 64) as u64, 0, 0];
        let err = decode_scaled(&limbs, 40).unwrap_err();
        assert!(matches!(err, FixedPointError::PrecisionLoss(_)));
    }

    #[test]
    fn small_value_with_few_digits_is_exact() {
        // 1.5e-27 needs only two digits.
        assert_eq!(decode_scaled(&[15, 0, 0, 0], 28).unwrap(), dec("0.0000000000000000000000000015"));
    }

    #[test]
    fn trailing_zeros_do_not_count_as_lost() {
        // 10^12 / 10^40 = 10^-28
        let value = decode_scaled(&[1_000_000_000_000, 0, 0, 0], 40).unwrap();
        assert_eq!(value, dec("0.0000000000000000000000000001"));
    }

    // ─── Display ─────────────────────────────────────────────────

    #[test]
    fn display_is_exact() {
        assert_eq!(ScaledValue::from_limbs(&[5], 3).to_string(), "0.005");
        assert_eq!(ScaledValue::from_limbs(&[12345], 2).to_string(), "123.45");
        assert_eq!(ScaledValue::from_i128(-7, 0).to_string(), "-7");
        assert_eq!(ScaledValue::from_i128(0, 2).to_string(), "0.00");
    }

    // ─── Switchboard decimal ─────────────────────────────────────

    #[test]
    fn negative_switchboard_decimal() {
        let d = SwitchboardDecimal {
            mantissa: -12_345,
            scale: 3,
        };
        assert_eq!(d.to_decimal().unwrap(), dec("-12.345"));
        assert!(d.to_scaled().is_negative());
    }

    #[test]
    fn switchboard_decimal_through_layout() {
        let d = SwitchboardDecimal {
            mantissa: i128::MIN + 1,
            scale: 28,
        };
        let bytes = SwitchboardDecimal::layout().encode_to_vec(&d.to_value()).unwrap();
        assert_eq!(bytes.len(), 20);
        let (value, _) = SwitchboardDecimal::layout().decode(&bytes, 0).unwrap();
        assert_eq!(SwitchboardDecimal::from_value(&value).unwrap(), d);
    }

    #[test]
    fn zero_mantissa_is_never_negative() {
        assert!(!ScaledValue::from_i128(0, 5).is_negative());
        assert_eq!(ScaledValue::from_i128(0, 5).to_decimal().unwrap(), Decimal::ZERO);
    }
}
