//! Substitution for unset optional account slots.
//!
//! Remote programs read accounts positionally, so an absent optional slot
//! still occupies its position: it is filled with the program's own address
//! as a read-only reference.

use ledger_codec::Address;

use crate::account::AccountReference;
use crate::role::AccountRole;

/// Resolve one optional slot. A present reference passes through unchanged.
pub fn resolve_optional(slot: Option<AccountReference>, sentinel: Address) -> AccountReference {
    match slot {
        Some(reference) => reference,
        None => {
            tracing::debug!(%sentinel, "optional account absent, using program address");
            AccountReference::new(sentinel, AccountRole::Readonly)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_becomes_readonly_sentinel() {
        let program = Address::new_from_array([0xaa; 32]);
        let resolved = resolve_optional(None, program);
        assert_eq!(resolved.address(), program);
        assert_eq!(resolved.role(), AccountRole::Readonly);
        assert!(resolved.signer_capability().is_none());
    }

    #[test]
    fn present_passes_through() {
        let program = Address::new_from_array([0xaa; 32]);
        let referrer = AccountReference::writable(Address::new_from_array([0x01; 32]));
        let resolved = resolve_optional(Some(referrer.clone()), program);
        assert_eq!(resolved, referrer);
    }
}
