//! Declarative per-operation schemas.
//!
//! One [`InstructionSchema`] replaces a hand-written builder: it names the
//! operation, its discriminator, the argument layout, and the positional
//! account slots with their roles.

use ledger_codec::{Discriminator, StructLayout};

use crate::role::AccountRole;

/// One positional account slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountSlot {
    name: &'static str,
    role: AccountRole,
    optional: bool,
}

impl AccountSlot {
    pub const fn new(name: &'static str, role: AccountRole) -> Self {
        Self {
            name,
            role,
            optional: false,
        }
    }

    pub const fn readonly(name: &'static str) -> Self {
        Self::new(name, AccountRole::Readonly)
    }

    pub const fn writable(name: &'static str) -> Self {
        Self::new(name, AccountRole::Writable)
    }

    pub const fn readonly_signer(name: &'static str) -> Self {
        Self::new(name, AccountRole::ReadonlySigner)
    }

    pub const fn writable_signer(name: &'static str) -> Self {
        Self::new(name, AccountRole::WritableSigner)
    }

    /// Mark the slot optional; an absent value is replaced by the program
    /// address.
    pub const fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn role(&self) -> AccountRole {
        self.role
    }

    pub const fn is_optional(&self) -> bool {
        self.optional
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionSchema {
    name: String,
    discriminator: Discriminator,
    args: StructLayout,
    accounts: Vec<AccountSlot>,
    remaining_accounts: bool,
}

impl InstructionSchema {
    /// A schema whose discriminator is derived from `name`.
    pub fn new(name: impl Into<String>, args: StructLayout, accounts: &[AccountSlot]) -> Self {
        let name = name.into();
        Self {
            discriminator: Discriminator::for_instruction(&name),
            name,
            args,
            accounts: accounts.to_vec(),
            remaining_accounts: false,
        }
    }

    pub fn with_discriminator(mut self, discriminator: Discriminator) -> Self {
        self.discriminator = discriminator;
        self
    }

    /// Allow callers to append a variable-length accounts tail.
    pub fn with_remaining_accounts(mut self) -> Self {
        self.remaining_accounts = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn discriminator(&self) -> Discriminator {
        self.discriminator
    }

    pub fn args(&self) -> &StructLayout {
        &self.args
    }

    pub fn accounts(&self) -> &[AccountSlot] {
        &self.accounts
    }

    pub fn slot(&self, name: &str) -> Option<&AccountSlot> {
        self.accounts.iter().find(|s| s.name == name)
    }

    pub fn accepts_remaining_accounts(&self) -> bool {
        self.remaining_accounts
    }

    pub fn optional_count(&self) -> usize {
        self.accounts.iter().filter(|s| s.optional).count()
    }
}
