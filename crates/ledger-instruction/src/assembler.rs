//! Instruction assembly: discriminator + encoded args + positional accounts.

use ledger_codec::{Address, CodecError, Discriminator, StructValue};
use serde::{Deserialize, Serialize};

use crate::account::{AccountInputs, AccountMeta, AccountReference};
use crate::error::InstructionError;
use crate::resolve::resolve_optional;
use crate::schema::InstructionSchema;

/// A wire-ready instruction. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    program: Address,
    accounts: Vec<AccountReference>,
    data: Vec<u8>,
}

impl Instruction {
    pub fn program_address(&self) -> Address {
        self.program
    }

    pub fn accounts(&self) -> &[AccountReference] {
        &self.accounts
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn discriminator(&self) -> Result<Discriminator, CodecError> {
        Discriminator::from_prefix(&self.data)
    }

    /// Payload after the 8-byte discriminator.
    pub fn args_data(&self) -> &[u8] {
        self.data.get(Discriminator::LEN..).unwrap_or_default()
    }

    pub fn metas(&self) -> Vec<AccountMeta> {
        self.accounts.iter().map(AccountReference::meta).collect()
    }

    /// `{programAddress, accounts: [{address, role}], data: "<hex>"}`.
    pub fn to_json(&self) -> Result<serde_json::Value, CodecError> {
        serde_json::to_value(InstructionJson::from(self)).map_err(|e| CodecError::Json(e.to_string()))
    }

    /// Rebuild from [`to_json`](Self::to_json) output. Signer capabilities do
    /// not travel through JSON.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, CodecError> {
        let wire: InstructionJson =
            serde_json::from_value(json.clone()).map_err(|e| CodecError::Json(e.to_string()))?;
        let data = hex::decode(&wire.data).map_err(|e| CodecError::Json(e.to_string()))?;
        Ok(Self {
            program: wire.program_address,
            accounts: wire.accounts.into_iter().map(AccountReference::from).collect(),
            data,
        })
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstructionJson {
    program_address: Address,
    accounts: Vec<AccountMeta>,
    data: String,
}

impl From<&Instruction> for InstructionJson {
    fn from(ix: &Instruction) -> Self {
        Self {
            program_address: ix.program,
            accounts: ix.metas(),
            data: hex::encode(&ix.data),
        }
    }
}

/// Combine pre-encoded args and an ordered account list into an instruction.
///
/// The first `schema.accounts().len()` references must line up with the
/// declared slots. Anything after them is the remaining-accounts tail.
pub fn assemble(
    schema: &InstructionSchema,
    program: Address,
    encoded_args: &[u8],
    accounts: Vec<AccountReference>,
) -> Result<Instruction, InstructionError> {
    let declared = schema.accounts().len();
    if accounts.len() < declared {
        return Err(InstructionError::schema(
            schema.name(),
            format!("expected {declared} accounts, got {}", accounts.len()),
        ));
    }
    if accounts.len() > declared && !schema.accepts_remaining_accounts() {
        return Err(InstructionError::schema(
            schema.name(),
            format!(
                "expected {declared} accounts, got {} and no remaining accounts are accepted",
                accounts.len()
            ),
        ));
    }

    for (slot, reference) in schema.accounts().iter().zip(&accounts) {
        let sentinel = slot.is_optional() && reference.address() == program;
        if !sentinel && reference.role() != slot.role() {
            return Err(InstructionError::schema(
                schema.name(),
                format!(
                    "slot `{}` declared {} but given {}",
                    slot.name(),
                    slot.role(),
                    reference.role()
                ),
            ));
        }
        if reference.role().is_signer() && !reference.can_sign() {
            return Err(InstructionError::MissingSignerCapability {
                operation: schema.name().to_string(),
                slot: slot.name().to_string(),
            });
        }
    }

    let mut data = Vec::with_capacity(Discriminator::LEN + encoded_args.len());
    data.extend_from_slice(schema.discriminator().as_bytes());
    data.extend_from_slice(encoded_args);

    Ok(Instruction {
        program,
        accounts,
        data,
    })
}

/// Encode `args`, place every declared slot in order, and append `remaining`.
///
/// Roles always come from the schema. Absent optional slots are filled with
/// the program address (see [`resolve_optional`]).
pub fn build(
    schema: &InstructionSchema,
    program: Address,
    args: &StructValue,
    mut inputs: AccountInputs,
    remaining: Vec<AccountReference>,
) -> Result<Instruction, InstructionError> {
    let encoded_args = schema.args().encode_to_vec(args)?;

    let mut accounts = Vec::with_capacity(schema.accounts().len() + remaining.len());
    for slot in schema.accounts() {
        let supplied = inputs.take(slot.name()).map(|r| r.with_role(slot.role()));
        let reference = if slot.is_optional() {
            resolve_optional(supplied, program)
        } else {
            supplied.ok_or_else(|| {
                InstructionError::schema(
                    schema.name(),
                    format!("missing account `{}`", slot.name()),
                )
            })?
        };
        accounts.push(reference);
    }

    if let Some(unknown) = inputs.remaining_names().next() {
        return Err(InstructionError::schema(
            schema.name(),
            format!("unknown account slot `{unknown}`"),
        ));
    }
    accounts.extend(remaining);

    let ix = assemble(schema, program, &encoded_args, accounts)?;
    tracing::debug!(
        operation = schema.name(),
        program = %program,
        accounts = ix.accounts().len(),
        data_len = ix.data().len(),
        "assembled instruction"
    );
    Ok(ix)
}
