//! Fixed-point conversions for on-chain numeric fields.
//!
//! - [`ScaledValue`] / [`decode_scaled`]: base-10 mantissa and scale, up to 256 bits
//! - [`Fraction`] / [`BigFractionBytes`]: binary fractions scaled by 2^60
//! - [`latest_value`]: staleness-checked oracle readings

pub mod error;
pub mod fraction;
pub mod reading;
pub mod scaled;

pub use error::FixedPointError;
pub use fraction::{fraction_to_decimal, BigFractionBytes, Fraction, FRACTION_BITS};
pub use reading::{latest_value, LatestValue, TimestampedReading, RESULT_SIGNIFICANT_DIGITS};
pub use scaled::{
    decode_scaled, ScaledValue, SwitchboardDecimal, MAX_DECIMAL_DIGITS, MIN_SIGNIFICANT_DIGITS,
    VALUE_LIMBS,
};
