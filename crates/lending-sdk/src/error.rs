use ledger_codec::{Address, CodecError};
use ledger_fixed_point::FixedPointError;
use ledger_instruction::InstructionError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SdkError {
    #[error("codec: {0}")]
    Codec(#[from] CodecError),

    #[error("instruction: {0}")]
    Instruction(#[from] InstructionError),

    #[error("fixed point: {0}")]
    FixedPoint(#[from] FixedPointError),

    #[error("account {account} is owned by {actual}, expected {expected}")]
    OwnerMismatch {
        account: Address,
        expected: Address,
        actual: Address,
    },

    #[error("invalid config: {0}")]
    Config(String),
}
