//! 8-byte tags identifying an instruction or a kind of account data.
//!
//! Programs built with the Anchor framework derive them as the first 8 bytes
//! of `SHA-256("global:<snake_case_instruction>")` for instructions and
//! `SHA-256("account:<TypeName>")` for account data.

use std::collections::BTreeMap;
use std::fmt;

use sha2::{Digest, Sha256};

use crate::error::CodecError;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Discriminator([u8; 8]);

impl Discriminator {
    pub const LEN: usize = 8;

    pub const fn new(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    pub fn for_instruction(snake_name: &str) -> Self {
        Self::hashed("global", snake_name)
    }

    pub fn for_account(type_name: &str) -> Self {
        Self::hashed("account", type_name)
    }

    fn hashed(namespace: &str, name: &str) -> Self {
        let hash = Sha256::new()
            .chain_update(namespace.as_bytes())
            .chain_update(b":")
            .chain_update(name.as_bytes())
            .finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash[..8]);
        Self(bytes)
    }

    /// Read the tag from the first 8 bytes of `data`.
    pub fn from_prefix(data: &[u8]) -> Result<Self, CodecError> {
        let bytes: [u8; 8] = data
            .get(..Self::LEN)
            .and_then(|prefix| prefix.try_into().ok())
            .ok_or_else(|| CodecError::truncated(0, Self::LEN, data.len()))?;
        Ok(Self(bytes))
    }

    pub fn matches(&self, data: &[u8]) -> bool {
        data.starts_with(&self.0)
    }

    pub const fn to_bytes(&self) -> [u8; 8] {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

impl fmt::Display for Discriminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Discriminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Discriminator({self})")
    }
}

impl AsRef<[u8]> for Discriminator {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Name <-> discriminator table for one program namespace.
///
/// Two names never share a tag, and identifying data never falls back to a
/// guessed kind.
#[derive(Debug, Clone, Default)]
pub struct DiscriminatorRegistry {
    by_name: BTreeMap<String, Discriminator>,
    by_tag: BTreeMap<Discriminator, String>,
}

impl DiscriminatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        discriminator: Discriminator,
    ) -> Result<(), CodecError> {
        let name = name.into();
        if self.by_name.contains_key(&name) || self.by_tag.contains_key(&discriminator) {
            return Err(CodecError::DuplicateDiscriminator {
                name,
                discriminator: discriminator.to_string(),
            });
        }
        self.by_name.insert(name.clone(), discriminator);
        self.by_tag.insert(discriminator, name);
        Ok(())
    }

    pub fn discriminator_for(&self, name: &str) -> Result<Discriminator, CodecError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| CodecError::UnknownOperation(name.to_string()))
    }

    /// Name of the kind whose tag prefixes `data`.
    pub fn identify(&self, data: &[u8]) -> Result<&str, CodecError> {
        let tag = Discriminator::from_prefix(data)?;
        let name = self
            .by_tag
            .get(&tag)
            .ok_or_else(|| CodecError::UnrecognizedDiscriminator(tag.to_string()))?;
        tracing::trace!(kind = %name, discriminator = %tag, "identified data kind");
        Ok(name)
    }

    /// Identify `data` and return the name with the bytes after the tag.
    pub fn split<'d>(&self, data: &'d [u8]) -> Result<(&str, &'d [u8]), CodecError> {
        let name = self.identify(data)?;
        Ok((name, &data[Discriminator::LEN..]))
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Discriminator)> {
        self.by_name.iter().map(|(name, tag)| (name.as_str(), *tag))
    }
}
