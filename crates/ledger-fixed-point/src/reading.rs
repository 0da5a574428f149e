//! Latest-value extraction from timestamped oracle readings.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::FixedPointError;
use crate::scaled::ScaledValue;

/// Significant digits kept in a reported value.
pub const RESULT_SIGNIFICANT_DIGITS: u32 = 20;

/// A confirmed reading as an oracle round reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampedReading {
    pub value: ScaledValue,
    /// Unix seconds at which the round opened.
    pub timestamp: i64,
    /// Oracle responses confirming the round; zero means unconfirmed.
    pub success_count: u32,
}

/// Outcome of [`latest_value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LatestValue {
    Valid { value: Decimal },
    NoConfirmedRound,
    Stale { age_secs: i64, max_staleness_secs: u64 },
}

impl LatestValue {
    pub fn valid(&self) -> Option<Decimal> {
        match self {
            LatestValue::Valid { value } => Some(*value),
            _ => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, LatestValue::Valid { .. })
    }
}

/// The reading's value rounded to 20 significant digits, unless the round
/// is unconfirmed or older than `max_staleness_secs` at `now`.
///
/// `max_staleness_secs == 0` disables the age check.
pub fn latest_value(
    reading: &TimestampedReading,
    max_staleness_secs: u64,
    now: i64,
) -> Result<LatestValue, FixedPointError> {
    if reading.success_count == 0 {
        tracing::debug!("no confirmed round");
        return Ok(LatestValue::NoConfirmedRound);
    }

    if max_staleness_secs != 0 {
        let age_secs = now.saturating_sub(reading.timestamp);
        if age_secs > 0 && age_secs as u64 > max_staleness_secs {
            tracing::debug!(age_secs, max_staleness_secs, "stale reading");
            return Ok(LatestValue::Stale {
                age_secs,
                max_staleness_secs,
            });
        }
    }

    let value = reading.value.to_decimal()?;
    let value = value
        .round_sf_with_strategy(RESULT_SIGNIFICANT_DIGITS, RoundingStrategy::MidpointAwayFromZero)
        .unwrap_or(value)
        .normalize();
    Ok(LatestValue::Valid { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn reading(mantissa: i128, scale: u32, timestamp: i64) -> TimestampedReading {
        TimestampedReading {
            value: ScaledValue::from_i128(mantissa, scale),
            timestamp,
            success_count: 3,
        }
    }

    // ─── Staleness ───────────────────────────────────────────────

    #[test]
    fn older_than_window_is_stale() {
        let result = latest_value(&reading(15, 1, 500), 400, 1000).unwrap();
        assert_eq!(
            result,
            LatestValue::Stale {
                age_secs: 500,
                max_staleness_secs: 400
            }
        );
        assert_eq!(result.valid(), None);
    }

    #[test]
    fn inside_window_is_valid() {
        let result = latest_value(&reading(15, 1, 500), 600, 1000).unwrap();
        assert_eq!(result.valid(), Some(dec("1.5")));
    }

    #[test]
    fn age_equal_to_window_is_valid() {
        assert!(latest_value(&reading(1, 0, 600), 400, 1000).unwrap().is_valid());
    }

    #[test]
    fn zero_window_disables_check() {
        let result = latest_value(&reading(7, 0, 0), 0, i64::MAX).unwrap();
        assert_eq!(result.valid(), Some(dec("7")));
    }

    #[test]
    fn future_timestamp_is_not_stale() {
        assert!(latest_value(&reading(1, 0, 2000), 10, 1000).unwrap().is_valid());
    }

    // ─── Confirmation ────────────────────────────────────────────

    #[test]
    fn unconfirmed_round_has_no_value() {
        let mut r = reading(1, 0, 1000);
        r.success_count = 0;
        assert_eq!(latest_value(&r, 0, 1000).unwrap(), LatestValue::NoConfirmedRound);
    }

    // ─── Precision ───────────────────────────────────────────────

    #[test]
    fn keeps_twenty_significant_digits() {
        let r = reading(12_345_678_901_234_567_890_123, 22, 1000);
        let value = latest_value(&r, 0, 1000).unwrap().valid().unwrap();
        assert_eq!(value, dec("1.2345678901234567890"));
    }

    #[test]
    fn rounds_half_away_from_zero() {
        let r = reading(-123_456_789_012_345_678_905, 20, 1000);
        let value = latest_value(&r, 0, 1000).unwrap().valid().unwrap();
        assert_eq!(value, dec("-1.2345678901234567891"));
    }

    #[test]
    fn overflowing_value_is_an_error() {
        let r = TimestampedReading {
            value: ScaledValue::from_limbs(&[0, 0, 0, 1], 0),
            timestamp: 0,
            success_count: 1,
        };
        assert!(matches!(
            latest_value(&r, 0, 0),
            Err(FixedPointError::Overflow(_))
        ));
    }

    #[test]
    fn tiny_nonzero_value_is_never_a_valid_zero() {
        let r = reading(1, 30, 0);
        assert!(matches!(
            latest_value(&r, 0, 0),
            Err(FixedPointError::PrecisionLoss(_))
        ));
    }

    #[test]
    fn serializes_with_status_tag() {
        let json = serde_json::to_value(LatestValue::NoConfirmedRound).unwrap();
        assert_eq!(json, serde_json::json!({"status": "no_confirmed_round"}));
    }
}
