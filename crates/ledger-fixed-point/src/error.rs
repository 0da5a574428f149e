use ledger_codec::CodecError;
use thiserror::Error;

/// Errors raised while turning raw fixed-point fields into decimals.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FixedPointError {
    /// The integer part needs more digits than a `Decimal` can hold.
    #[error("value overflows decimal precision: {0}")]
    Overflow(String),

    /// Too few significant digits fit in a `Decimal`.
    #[error("value loses precision: {0}")]
    PrecisionLoss(String),

    #[error(transparent)]
    Codec(#[from] CodecError),
}
