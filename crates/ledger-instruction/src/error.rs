use ledger_codec::CodecError;
use thiserror::Error;

/// Errors raised while assembling an instruction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstructionError {
    /// The account list does not fit the operation's declared slots.
    #[error("schema violation in {operation}: {reason}")]
    SchemaViolation { operation: String, reason: String },

    /// A signer slot was given a reference that cannot sign.
    #[error("missing signer capability for `{slot}` in {operation}")]
    MissingSignerCapability { operation: String, slot: String },

    #[error("signing error: {0}")]
    Signing(String),

    #[error("program address derivation failed: {0}")]
    Pda(String),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl InstructionError {
    pub(crate) fn schema(operation: &str, reason: impl Into<String>) -> Self {
        InstructionError::SchemaViolation {
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_schema_violation() {
        let err = InstructionError::schema("refresh_reserve", "expected 6 accounts, got 5");
        assert_eq!(
            err.to_string(),
            "schema violation in refresh_reserve: expected 6 accounts, got 5"
        );
    }

    #[test]
    fn display_missing_signer_capability() {
        let err = InstructionError::MissingSignerCapability {
            operation: "init_obligation".into(),
            slot: "fee_payer".into(),
        };
        assert_eq!(
            err.to_string(),
            "missing signer capability for `fee_payer` in init_obligation"
        );
    }

    #[test]
    fn display_signing() {
        let err = InstructionError::Signing("bad key".into());
        assert_eq!(err.to_string(), "signing error: bad key");
    }

    #[test]
    fn display_pda() {
        let err = InstructionError::Pda("too many seeds".into());
        assert_eq!(
            err.to_string(),
            "program address derivation failed: too many seeds"
        );
    }

    #[test]
    fn codec_errors_pass_through() {
        let err: InstructionError = CodecError::Shape("missing field `amount`".into()).into();
        assert_eq!(err.to_string(), "shape mismatch: missing field `amount`");
    }
}
