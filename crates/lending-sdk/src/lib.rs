//! Client SDK for the lending program and its oracle aggregator.
//!
//! Operations are data: [`klend::schemas`] and [`switchboard::schemas`]
//! describe every instruction, and a [`ProgramTable`] builds any of them
//! against the program address in a [`ProgramConfig`].
//!
//! ```text
//! args + accounts -> ProgramTable::build -> Instruction
//! raw account bytes -> decode_accounts -> LendingAccount
//! aggregator round -> TimestampedReading -> latest_value
//! ```

pub mod accounts;
pub mod config;
pub mod error;
pub mod klend;
pub mod program;
pub mod seeds;
pub mod switchboard;
pub mod types;

pub use accounts::{
    decode_accounts, AccountData, LendingAccount, LendingMarket, Obligation, RawAccount,
    ReferrerState, UserMetadata,
};
pub use config::ProgramConfig;
pub use error::SdkError;
pub use program::ProgramTable;
pub use switchboard::AggregatorRound;

pub use ledger_codec as codec;
pub use ledger_fixed_point as fixed_point;
pub use ledger_instruction as instruction;

/// Schema tables for both programs, addressed by `config`.
#[derive(Debug, Clone)]
pub struct LendingClient {
    config: ProgramConfig,
    lending: ProgramTable,
    oracle: ProgramTable,
}

impl LendingClient {
    pub fn new(config: ProgramConfig) -> Result<Self, SdkError> {
        Ok(Self {
            lending: klend::table(config.lending_program)?,
            oracle: switchboard::table(config.oracle_program)?,
            config,
        })
    }

    pub fn config(&self) -> &ProgramConfig {
        &self.config
    }

    pub fn lending(&self) -> &ProgramTable {
        &self.lending
    }

    pub fn oracle(&self) -> &ProgramTable {
        &self.oracle
    }

    /// Decode lending accounts owned by the configured lending program.
    pub fn decode_accounts(
        &self,
        accounts: &[RawAccount],
    ) -> Result<Vec<Result<LendingAccount, SdkError>>, SdkError> {
        decode_accounts(accounts, &self.config.lending_program)
    }
}
