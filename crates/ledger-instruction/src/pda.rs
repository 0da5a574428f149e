//! Program-derived addresses.
//!
//! `SHA-256(seed_0 || ... || seed_n || program || "ProgramDerivedAddress")`,
//! accepted only when the hash is NOT a valid Ed25519 point, so no private
//! key can exist for it.

use ledger_codec::Address;
use sha2::{Digest, Sha256};

use crate::error::InstructionError;

pub const MAX_SEEDS: usize = 16;
pub const MAX_SEED_LEN: usize = 32;

const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// Derive the address for `seeds` exactly as given (bump included).
pub fn create_program_address(
    seeds: &[&[u8]],
    program: &Address,
) -> Result<Address, InstructionError> {
    check_seeds(seeds)?;
    let address = derive(seeds, program);
    if address.is_on_curve() {
        return Err(InstructionError::Pda("derived address is on the curve".into()));
    }
    Ok(address)
}

/// Search bump seeds from 255 down to 0 and return the first off-curve
/// address with its bump.
pub fn find_program_address(
    seeds: &[&[u8]],
    program: &Address,
) -> Result<(Address, u8), InstructionError> {
    if seeds.len() >= MAX_SEEDS {
        return Err(InstructionError::Pda(format!(
            "at most {} seeds plus the bump, got {}",
            MAX_SEEDS - 1,
            seeds.len()
        )));
    }
    check_seeds(seeds)?;
    for bump in (0u8..=255).rev() {
        let bump_seed = [bump];
        let mut with_bump = seeds.to_vec();
        with_bump.push(&bump_seed);
        let address = derive(&with_bump, program);
        if !address.is_on_curve() {
            return Ok((address, bump));
        }
    }
    Err(InstructionError::Pda("no valid bump seed".into()))
}

fn derive(seeds: &[&[u8]], program: &Address) -> Address {
    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update(program.as_bytes());
    hasher.update(PDA_MARKER);
    Address::new_from_array(hasher.finalize().into())
}

fn check_seeds(seeds: &[&[u8]]) -> Result<(), InstructionError> {
    if seeds.len() > MAX_SEEDS {
        return Err(InstructionError::Pda(format!(
            "at most {MAX_SEEDS} seeds, got {}",
            seeds.len()
        )));
    }
    if let Some(seed) = seeds.iter().find(|s| s.len() > MAX_SEED_LEN) {
        return Err(InstructionError::Pda(format!(
            "seed of {} bytes exceeds {MAX_SEED_LEN}",
            seed.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program() -> Address {
        "KLend2g3cP87fffoy8q1mQqGKjrxjC8boSyAYavgmjD".parse().unwrap()
    }

    #[test]
    fn user_metadata_address_for_fixed_owner() {
        let owner = [0x42u8; 32];
        let (address, bump) = find_program_address(&[b"user_meta", &owner], &program()).unwrap();
        assert_eq!(
            address.to_string(),
            "4N1Do5hNi3U5HSrgx6fvPsfvZkm2SjNcnWi3i5KZ36sK"
        );
        assert_eq!(bump, 255);
        assert!(!address.is_on_curve());
    }

    #[test]
    fn create_matches_find() {
        let market = [0x07u8; 32];
        let (address, bump) = find_program_address(&[b"lma", &market], &program()).unwrap();
        let created = create_program_address(&[b"lma", &market, &[bump]], &program()).unwrap();
        assert_eq!(created, address);
    }

    #[test]
    fn derivation_is_deterministic_and_seed_sensitive() {
        let a = find_program_address(&[b"ref_state", &[1u8; 32]], &program()).unwrap();
        let b = find_program_address(&[b"ref_state", &[1u8; 32]], &program()).unwrap();
        let c = find_program_address(&[b"ref_state", &[2u8; 32]], &program()).unwrap();
        assert_eq!(a, b);
        assert_ne!(a.0, c.0);
    }

    #[test]
    fn long_seed_is_rejected() {
        let seed = [0u8; 33];
        let err = find_program_address(&[&seed], &program()).unwrap_err();
        assert_eq!(
            err,
            InstructionError::Pda("seed of 33 bytes exceeds 32".into())
        );
    }

    #[test]
    fn too_many_seeds_are_rejected() {
        let seeds: Vec<&[u8]> = vec![&b"s"[..]; 16];
        assert!(find_program_address(&seeds, &program()).is_err());
        let seeds: Vec<&[u8]> = vec![&b"s"[..]; 17];
        assert!(create_program_address(&seeds, &program()).is_err());
    }

    #[test]
    fn bumps_above_the_found_one_are_on_curve() {
        let market = [0x07u8; 32];
        let (_, bump) = find_program_address(&[b"lma", &market], &program()).unwrap();
        for skipped in (bump as u16 + 1)..=255 {
            let seeds: [&[u8]; 3] = [b"lma", &market, &[skipped as u8]];
            assert!(create_program_address(&seeds, &program()).is_err());
        }
    }
}
