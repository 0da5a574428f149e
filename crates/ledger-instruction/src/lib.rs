//! Instruction assembly for remote ledger programs.
//!
//! An operation is described once as an [`InstructionSchema`] (argument
//! layout plus positional account slots). [`build`] turns a schema, argument
//! values and the caller's accounts into an immutable [`Instruction`]:
//! `discriminator ++ encoded args` plus the ordered account list.

pub mod account;
pub mod assembler;
pub mod error;
pub mod pda;
pub mod resolve;
pub mod role;
pub mod schema;
pub mod signer;

pub use account::{AccountInputs, AccountMeta, AccountReference};
pub use assembler::{assemble, build, Instruction};
pub use error::InstructionError;
pub use pda::{create_program_address, find_program_address};
pub use resolve::resolve_optional;
pub use role::AccountRole;
pub use schema::{AccountSlot, InstructionSchema};
pub use signer::{KeypairSigner, TransactionSigner};
