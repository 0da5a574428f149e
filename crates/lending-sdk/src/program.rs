//! A remote program as data: its address and the schema of every operation.
//!
//! One generic [`ProgramTable::build`] replaces a hand-written builder per
//! operation. The table also runs the other direction, identifying and
//! decoding instruction data it produced.

use std::collections::BTreeMap;

use ledger_codec::{Address, DiscriminatorRegistry, StructValue};
use ledger_instruction::{build, AccountInputs, AccountReference, Instruction, InstructionSchema};

use crate::error::SdkError;

#[derive(Debug, Clone)]
pub struct ProgramTable {
    program: Address,
    schemas: BTreeMap<String, InstructionSchema>,
    registry: DiscriminatorRegistry,
}

impl ProgramTable {
    /// Fails if two schemas share a name or a discriminator.
    pub fn new(
        program: Address,
        schemas: impl IntoIterator<Item = InstructionSchema>,
    ) -> Result<Self, SdkError> {
        let mut registry = DiscriminatorRegistry::new();
        let mut by_name = BTreeMap::new();
        for schema in schemas {
            registry.register(schema.name(), schema.discriminator())?;
            by_name.insert(schema.name().to_string(), schema);
        }
        Ok(Self {
            program,
            schemas: by_name,
            registry,
        })
    }

    pub fn program(&self) -> Address {
        self.program
    }

    pub fn schema(&self, operation: &str) -> Result<&InstructionSchema, SdkError> {
        self.schemas
            .get(operation)
            .ok_or_else(|| ledger_codec::CodecError::UnknownOperation(operation.to_string()).into())
    }

    pub fn schemas(&self) -> impl Iterator<Item = &InstructionSchema> {
        self.schemas.values()
    }

    pub fn registry(&self) -> &DiscriminatorRegistry {
        &self.registry
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Build `operation` against this table's program address.
    pub fn build(
        &self,
        operation: &str,
        args: &StructValue,
        accounts: AccountInputs,
        remaining: Vec<AccountReference>,
    ) -> Result<Instruction, SdkError> {
        let schema = self.schema(operation)?;
        Ok(build(schema, self.program, args, accounts, remaining)?)
    }

    /// Identify the operation behind `data` and decode its arguments.
    ///
    /// Trailing bytes after the arguments are a decode error.
    pub fn decode_args<'t>(
        &'t self,
        data: &[u8],
    ) -> Result<(&'t InstructionSchema, StructValue), SdkError> {
        let (name, body) = self.registry.split(data)?;
        let schema = self.schema(name)?;
        let (args, consumed) = schema.args().decode(body, 0)?;
        if consumed != body.len() {
            return Err(ledger_codec::CodecError::Decode(format!(
                "{} trailing bytes after {} args",
                body.len() - consumed,
                schema.name()
            ))
            .into());
        }
        Ok((schema, args))
    }
}
