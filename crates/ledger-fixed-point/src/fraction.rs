//! Binary fixed-point fractions scaled by 2^60.
//!
//! The lending program stores ratios and prices as integers scaled by
//! `2^FRACTION_BITS`: `u128` for the `..._sf` fields and 256-bit
//! [`BigFractionBytes`] for the `..._bsf` fields.

use alloy_primitives::U256;
use ledger_codec::{Layout, StructLayout, StructValue, Value};
use rust_decimal::Decimal;

use crate::error::FixedPointError;
use crate::scaled::{ScaledValue, VALUE_LIMBS};

pub const FRACTION_BITS: u32 = 60;

/// Decimal digits kept for the fractional part; 10^18 < 2^60.
const FRACTION_DIGITS: u32 = 18;

/// `u128` scaled by 2^60.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Fraction(pub u128);

impl Fraction {
    pub const ONE: Fraction = Fraction(1 << FRACTION_BITS);

    pub const fn from_bits(bits: u128) -> Self {
        Self(bits)
    }

    pub const fn to_bits(self) -> u128 {
        self.0
    }

    /// Value to 18 fractional digits, truncated.
    pub fn to_decimal(self) -> Result<Decimal, FixedPointError> {
        fraction_to_scaled(U256::from(self.0)).to_decimal()
    }
}

/// Little-endian 256-bit value plus two padding limbs, as stored on chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BigFractionBytes {
    pub value: [u64; 4],
    pub padding: [u64; 2],
}

impl BigFractionBytes {
    pub fn layout() -> StructLayout {
        StructLayout::new()
            .field("value", Layout::array(Layout::U64, VALUE_LIMBS))
            .field("padding", Layout::array(Layout::U64, 2))
    }

    pub fn from_value(value: &StructValue) -> Result<Self, FixedPointError> {
        Ok(Self {
            value: limbs(value.field("value")?)?,
            padding: limbs(value.field("padding")?)?,
        })
    }

    pub fn to_value(&self) -> StructValue {
        let array = |limbs: &[u64]| Value::Array(limbs.iter().map(|l| Value::from(*l)).collect());
        StructValue::new()
            .with("value", array(&self.value))
            .with("padding", array(&self.padding))
    }

    /// The value limbs as an integer mantissa over `10^scale`.
    pub fn to_scaled(&self, scale: u32) -> ScaledValue {
        ScaledValue::from_limbs(&self.value, scale)
    }

    /// The value limbs as a 2^60-scaled fraction, to 18 fractional digits.
    pub fn to_fraction_decimal(&self) -> Result<Decimal, FixedPointError> {
        fraction_to_scaled(U256::from_limbs(self.value)).to_decimal()
    }
}

/// `bits / 2^60` as an exact integer part plus 18 truncated decimals.
fn fraction_to_scaled(bits: U256) -> ScaledValue {
    let int_part = bits >> FRACTION_BITS as usize;
    let frac_bits = (bits & U256::from((1u128 << FRACTION_BITS) - 1)).to::<u128>();
    let frac_digits = (frac_bits * 10u128.pow(FRACTION_DIGITS)) >> FRACTION_BITS;
    let mantissa = int_part * U256::from(10u128.pow(FRACTION_DIGITS)) + U256::from(frac_digits);
    ScaledValue::new(mantissa, FRACTION_DIGITS)
}

fn limbs<const N: usize>(value: &Value) -> Result<[u64; N], FixedPointError> {
    let items = value.as_array()?;
    let mut out = [0u64; N];
    if items.len() != N {
        return Err(ledger_codec::CodecError::Shape(format!(
            "expected {N} limbs, got {}",
            items.len()
        ))
        .into());
    }
    for (dst, item) in out.iter_mut().zip(items) {
        *dst = item.as_u64()?;
    }
    Ok(out)
}

/// Convert a 2^60-scaled `u128` to a decimal.
pub fn fraction_to_decimal(bits: u128) -> Result<Decimal, FixedPointError> {
    Fraction(bits).to_decimal()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn one_is_two_pow_sixty() {
        assert_eq!(Fraction::ONE.to_decimal().unwrap(), Decimal::ONE);
    }

    #[test]
    fn halves_and_quarters_are_exact() {
        assert_eq!(fraction_to_decimal(1 << 59).unwrap(), dec("0.5"));
        assert_eq!(fraction_to_decimal(3 << 58).unwrap(), dec("0.75"));
        assert_eq!(fraction_to_decimal(5 << 60).unwrap(), dec("5"));
    }

    #[test]
    fn smallest_step_truncates() {
        // 2^-60 = 8.67e-19, below the 18th decimal.
        assert_eq!(fraction_to_decimal(1).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn tenth_is_truncated_at_eighteen_digits() {
        // floor(0.1 * 2^60) / 2^60 = 0.09999999999999999913...
        let bits = (1u128 << 60) / 10;
        assert_eq!(fraction_to_decimal(bits).unwrap(), dec("0.099999999999999999"));
    }

    #[test]
    fn big_fraction_uses_value_limbs() {
        let big = BigFractionBytes {
            value: [0, 1 << 4, 0, 0], // 2^68 = 256 * 2^60
            padding: [u64::MAX, u64::MAX],
        };
        assert_eq!(big.to_fraction_decimal().unwrap(), dec("256"));
    }

    #[test]
    fn big_fraction_as_scaled() {
        let big = BigFractionBytes {
            value: [1_000_000, 0, 0, 0],
            padding: [0, 0],
        };
        assert_eq!(big.to_scaled(6).to_decimal().unwrap(), Decimal::ONE);
    }

    #[test]
    fn big_fraction_through_layout() {
        let big = BigFractionBytes {
            value: [1, 2, 3, 4],
            padding: [5, 6],
        };
        let layout = BigFractionBytes::layout();
        assert_eq!(layout.fixed_size(), Some(48));
        let bytes = layout.encode_to_vec(&big.to_value()).unwrap();
        assert_eq!(&bytes[..8], &1u64.to_le_bytes());
        let (value, consumed) = layout.decode(&bytes, 0).unwrap();
        assert_eq!(consumed, 48);
        assert_eq!(BigFractionBytes::from_value(&value).unwrap(), big);
    }

    #[test]
    fn wrong_limb_count_is_shape_error() {
        let value = StructValue::new()
            .with("value", Value::Array(vec![Value::from(1u64); 3]))
            .with("padding", Value::Array(vec![Value::from(0u64); 2]));
        let err = BigFractionBytes::from_value(&value).unwrap_err();
        assert!(matches!(
            err,
            FixedPointError::Codec(ledger_codec::CodecError::Shape(_))
        ));
    }
}
