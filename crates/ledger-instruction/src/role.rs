//! Account access roles.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Access permission of one account reference.
///
/// The discriminants match the wire numbering used by transaction builders:
/// bit 0 is "writable", bit 1 is "signer".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum AccountRole {
    Readonly = 0,
    Writable = 1,
    ReadonlySigner = 2,
    WritableSigner = 3,
}

impl AccountRole {
    pub const ALL: [AccountRole; 4] = [
        AccountRole::Readonly,
        AccountRole::Writable,
        AccountRole::ReadonlySigner,
        AccountRole::WritableSigner,
    ];

    pub const fn from_flags(signer: bool, writable: bool) -> Self {
        match (signer, writable) {
            (true, true) => AccountRole::WritableSigner,
            (true, false) => AccountRole::ReadonlySigner,
            (false, true) => AccountRole::Writable,
            (false, false) => AccountRole::Readonly,
        }
    }

    pub const fn is_signer(self) -> bool {
        matches!(self, AccountRole::ReadonlySigner | AccountRole::WritableSigner)
    }

    pub const fn is_writable(self) -> bool {
        matches!(self, AccountRole::Writable | AccountRole::WritableSigner)
    }

    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(AccountRole::Readonly),
            1 => Some(AccountRole::Writable),
            2 => Some(AccountRole::ReadonlySigner),
            3 => Some(AccountRole::WritableSigner),
            _ => None,
        }
    }
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AccountRole::Readonly => "READONLY",
            AccountRole::Writable => "WRITABLE",
            AccountRole::ReadonlySigner => "READONLY_SIGNER",
            AccountRole::WritableSigner => "WRITABLE_SIGNER",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_map_to_roles() {
        assert_eq!(AccountRole::from_flags(true, true), AccountRole::WritableSigner);
        assert_eq!(AccountRole::from_flags(true, false), AccountRole::ReadonlySigner);
        assert_eq!(AccountRole::from_flags(false, true), AccountRole::Writable);
        assert_eq!(AccountRole::from_flags(false, false), AccountRole::Readonly);
    }

    #[test]
    fn flags_roundtrip_through_role() {
        for signer in [false, true] {
            for writable in [false, true] {
                let role = AccountRole::from_flags(signer, writable);
                assert_eq!(role.is_signer(), signer);
                assert_eq!(role.is_writable(), writable);
            }
        }
    }

    #[test]
    fn wire_numbering() {
        let numbers: Vec<u8> = AccountRole::ALL.iter().map(|r| r.to_u8()).collect();
        assert_eq!(numbers, [0, 1, 2, 3]);
        assert_eq!(AccountRole::from_u8(3), Some(AccountRole::WritableSigner));
        assert_eq!(AccountRole::from_u8(4), None);
    }

    #[test]
    fn serde_uses_screaming_snake_case() {
        let json = serde_json::to_string(&AccountRole::ReadonlySigner).unwrap();
        assert_eq!(json, "\"READONLY_SIGNER\"");
        let back: AccountRole = serde_json::from_str("\"WRITABLE\"").unwrap();
        assert_eq!(back, AccountRole::Writable);
        assert_eq!(AccountRole::WritableSigner.to_string(), "WRITABLE_SIGNER");
    }
}
