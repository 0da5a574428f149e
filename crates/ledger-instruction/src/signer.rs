//! Signing capability attached to signer account references.
//!
//! The assembler only reads a signer's address; producing signatures is the
//! transaction builder's job.

use std::fmt;

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use ledger_codec::Address;
use zeroize::Zeroize;

use crate::error::InstructionError;

/// Something that can sign a message on behalf of an address.
pub trait TransactionSigner: fmt::Debug + Send + Sync {
    fn address(&self) -> Address;

    fn sign_message(&self, message: &[u8]) -> Result<[u8; 64], InstructionError>;
}

/// In-memory Ed25519 keypair.
///
/// The secret key is wiped on drop (ed25519-dalek `zeroize` support).
pub struct KeypairSigner {
    key: SigningKey,
}

impl KeypairSigner {
    /// Build from a 32-byte Ed25519 seed. The local seed copy is wiped.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let mut copy = *seed;
        let key = SigningKey::from_bytes(&copy);
        copy.zeroize();
        Self { key }
    }

    /// Check a signature produced by this keypair.
    pub fn verify(&self, message: &[u8], signature: &[u8; 64]) -> bool {
        verify_signature(&self.address(), message, signature)
    }
}

impl TransactionSigner for KeypairSigner {
    fn address(&self) -> Address {
        Address::new_from_array(self.key.verifying_key().to_bytes())
    }

    fn sign_message(&self, message: &[u8]) -> Result<[u8; 64], InstructionError> {
        self.key
            .try_sign(message)
            .map(|signature| signature.to_bytes())
            .map_err(|e| InstructionError::Signing(e.to_string()))
    }
}

impl fmt::Debug for KeypairSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeypairSigner({})", self.address())
    }
}

/// Verify an Ed25519 signature against an address.
pub fn verify_signature(address: &Address, message: &[u8], signature: &[u8; 64]) -> bool {
    let Ok(key) = VerifyingKey::from_bytes(address.as_bytes()) else {
        return false;
    };
    key.verify(message, &ed25519_dalek::Signature::from_bytes(signature))
        .is_ok()
}
