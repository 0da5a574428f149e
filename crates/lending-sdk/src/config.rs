//! Program addresses the builders target.
//!
//! Nothing in the SDK reaches for a global program address: every builder
//! takes it from a [`ProgramConfig`] (or an explicit [`Address`]).

use ledger_codec::Address;
use serde::{Deserialize, Serialize};

use crate::error::SdkError;

/// Lending program on mainnet: `KLend2g3cP87fffoy8q1mQqGKjrxjC8boSyAYavgmjD`
pub const LENDING_PROGRAM_ID: Address = Address::new_from_array([
    0x04, 0xb2, 0xac, 0xb1, 0x12, 0x58, 0xcc, 0xe3, 0x68, 0x2c, 0x41, 0x8b, 0xa8, 0x72, 0xff, 0x3d,
    0xf9, 0x11, 0x02, 0x71, 0x2f, 0x15, 0xaf, 0x12, 0xb6, 0xbe, 0x69, 0xb3, 0x43, 0x5b, 0x00, 0x08,
]);

/// Oracle aggregator on mainnet: `SW1TCH7qEPTdLsDHRgPuMQjbQxKdH2aBStViMFnt64f`
pub const ORACLE_PROGRAM_ID: Address = Address::new_from_array([
    0x06, 0x88, 0x51, 0xc6, 0x8c, 0x68, 0x32, 0xf0, 0x2f, 0xa5, 0x81, 0xb1, 0xbf, 0x49, 0x1b, 0x77,
    0xca, 0x41, 0x77, 0x6b, 0xa2, 0xb9, 0x88, 0xb5, 0xa6, 0xfa, 0xba, 0x8e, 0xe3, 0xa2, 0xec, 0x90,
]);

/// System program: `11111111111111111111111111111111`
pub const SYSTEM_PROGRAM_ID: Address = Address::new_from_array([0; 32]);

/// Instructions sysvar: `Sysvar1nstructions1111111111111111111111111`
pub const SYSVAR_INSTRUCTIONS_ID: Address = Address::new_from_array([
    0x06, 0xa7, 0xd5, 0x17, 0x18, 0x7b, 0xd1, 0x66, 0x35, 0xda, 0xd4, 0x04, 0x55, 0xfd, 0xc2, 0xc0,
    0xc1, 0x24, 0xc6, 0x8f, 0x21, 0x56, 0x75, 0xa5, 0xdb, 0xba, 0xcb, 0x5f, 0x08, 0x00, 0x00, 0x00,
]);

/// Rent sysvar: `SysvarRent111111111111111111111111111111111`
pub const SYSVAR_RENT_ID: Address = Address::new_from_array([
    0x06, 0xa7, 0xd5, 0x17, 0x19, 0x2c, 0x5c, 0x51, 0x21, 0x8c, 0xc9, 0x4c, 0x3d, 0x4a, 0xf1, 0x7f,
    0x58, 0xda, 0xee, 0x08, 0x9b, 0xa1, 0xfd, 0x44, 0xe3, 0xdb, 0xd9, 0x8a, 0x00, 0x00, 0x00, 0x00,
]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramConfig {
    pub lending_program: Address,
    pub oracle_program: Address,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            lending_program: LENDING_PROGRAM_ID,
            oracle_program: ORACLE_PROGRAM_ID,
        }
    }
}

impl ProgramConfig {
    /// Parse `{"lending_program": "...", "oracle_program": "..."}`.
    pub fn from_json(json: &str) -> Result<Self, SdkError> {
        serde_json::from_str(json).map_err(|e| SdkError::Config(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, SdkError> {
        serde_json::to_string(self).map_err(|e| SdkError::Config(e.to_string()))
    }
}
