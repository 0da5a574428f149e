//! Account references and per-call account inputs.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use ledger_codec::Address;
use serde::{Deserialize, Serialize};

use crate::role::AccountRole;
use crate::signer::TransactionSigner;

/// One positional account of an instruction.
///
/// Signer references may carry the capability that will later sign the
/// transaction. The reference only shares it; the assembler reads the
/// address and never calls it.
#[derive(Clone)]
pub struct AccountReference {
    address: Address,
    role: AccountRole,
    signer: Option<Arc<dyn TransactionSigner>>,
}

/// Wire view of an account reference: address and role only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountMeta {
    pub address: Address,
    pub role: AccountRole,
}

impl AccountReference {
    pub fn new(address: Address, role: AccountRole) -> Self {
        Self {
            address,
            role,
            signer: None,
        }
    }

    pub fn readonly(address: Address) -> Self {
        Self::new(address, AccountRole::Readonly)
    }

    pub fn writable(address: Address) -> Self {
        Self::new(address, AccountRole::Writable)
    }

    /// A signer reference backed by `signer`; its address is the signer's.
    pub fn signer(signer: Arc<dyn TransactionSigner>, writable: bool) -> Self {
        Self {
            address: signer.address(),
            role: AccountRole::from_flags(true, writable),
            signer: Some(signer),
        }
    }

    /// Same address and capability, different role.
    pub fn with_role(mut self, role: AccountRole) -> Self {
        self.role = role;
        self
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn role(&self) -> AccountRole {
        self.role
    }

    pub fn signer_capability(&self) -> Option<&Arc<dyn TransactionSigner>> {
        self.signer.as_ref()
    }

    /// A capability is present and it signs for this address.
    pub fn can_sign(&self) -> bool {
        self.signer
            .as_ref()
            .is_some_and(|s| s.address() == self.address)
    }

    pub fn meta(&self) -> AccountMeta {
        AccountMeta {
            address: self.address,
            role: self.role,
        }
    }
}

impl From<AccountMeta> for AccountReference {
    fn from(meta: AccountMeta) -> Self {
        Self::new(meta.address, meta.role)
    }
}

impl PartialEq for AccountReference {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
            && self.role == other.role
            && self.signer.is_some() == other.signer.is_some()
    }
}

impl Eq for AccountReference {}

impl fmt::Debug for AccountReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountReference")
            .field("address", &self.address)
            .field("role", &self.role)
            .field("signer", &self.signer.is_some())
            .finish()
    }
}

/// Accounts supplied for one call, keyed by slot name.
///
/// Optional slots are simply left out. Roles come from the operation's
/// schema, so only the address (and the signer, for signer slots) matters.
#[derive(Debug, Clone, Default)]
pub struct AccountInputs {
    slots: BTreeMap<String, AccountReference>,
}

impl AccountInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, slot: impl Into<String>, reference: AccountReference) -> Self {
        self.insert(slot, reference);
        self
    }

    /// Shorthand for a non-signer slot.
    pub fn with_address(self, slot: impl Into<String>, address: Address) -> Self {
        self.with(slot, AccountReference::readonly(address))
    }

    /// Shorthand for a signer slot.
    pub fn with_signer(self, slot: impl Into<String>, signer: Arc<dyn TransactionSigner>) -> Self {
        self.with(slot, AccountReference::signer(signer, false))
    }

    /// Set a slot only when `address` is present.
    pub fn with_optional(self, slot: impl Into<String>, address: Option<Address>) -> Self {
        match address {
            Some(address) => self.with_address(slot, address),
            None => self,
        }
    }

    pub fn insert(&mut self, slot: impl Into<String>, reference: AccountReference) {
        self.slots.insert(slot.into(), reference);
    }

    pub fn get(&self, slot: &str) -> Option<&AccountReference> {
        self.slots.get(slot)
    }

    pub(crate) fn take(&mut self, slot: &str) -> Option<AccountReference> {
        self.slots.remove(slot)
    }

    pub(crate) fn remaining_names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::KeypairSigner;

    #[test]
    fn signer_reference_takes_signer_address() {
        let signer = Arc::new(KeypairSigner::from_seed(&[5u8; 32]));
        let reference = AccountReference::signer(signer.clone(), true);
        assert_eq!(reference.address(), signer.address());
        assert_eq!(reference.role(), AccountRole::WritableSigner);
        assert!(reference.can_sign());
    }

    #[test]
    fn plain_reference_cannot_sign() {
        let reference = AccountReference::new(Address::default(), AccountRole::ReadonlySigner);
        assert!(!reference.can_sign());
        assert!(reference.signer_capability().is_none());
    }

    #[test]
    fn with_role_keeps_capability() {
        let signer = Arc::new(KeypairSigner::from_seed(&[5u8; 32]));
        let reference = AccountReference::signer(signer, false).with_role(AccountRole::WritableSigner);
        assert_eq!(reference.role(), AccountRole::WritableSigner);
        assert!(reference.can_sign());
    }

    #[test]
    fn meta_serializes_address_and_role() {
        let meta = AccountReference::writable(Address::default()).meta();
        let json = serde_json::to_value(meta).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "address": "11111111111111111111111111111111",
                "role": "WRITABLE"
            })
        );
        let back: AccountMeta = serde_json::from_value(json).unwrap();
        assert_eq!(back, meta);
    }

    #[test]
    fn inputs_skip_absent_optionals() {
        let inputs = AccountInputs::new()
            .with_address("lending_market", Address::new_from_array([1; 32]))
            .with_optional("pyth_oracle", None)
            .with_optional("scope_prices", Some(Address::new_from_array([2; 32])));
        assert_eq!(inputs.len(), 2);
        assert!(inputs.get("pyth_oracle").is_none());
        assert!(inputs.get("scope_prices").is_some());
    }
}
