//! Program-derived addresses of the lending program.

use ledger_codec::Address;
use ledger_instruction::find_program_address;

use crate::error::SdkError;
use crate::types::InitObligationArgs;

pub const LENDING_MARKET_AUTH_SEED: &[u8] = b"lma";
pub const RESERVE_LIQ_SUPPLY_SEED: &[u8] = b"reserve_liq_supply";
pub const FEE_RECEIVER_SEED: &[u8] = b"fee_receiver";
pub const RESERVE_COLL_MINT_SEED: &[u8] = b"reserve_coll_mint";
pub const RESERVE_COLL_SUPPLY_SEED: &[u8] = b"reserve_coll_supply";
pub const USER_METADATA_SEED: &[u8] = b"user_meta";
pub const REFERRER_TOKEN_STATE_SEED: &[u8] = b"referrer_acc";
pub const REFERRER_STATE_SEED: &[u8] = b"ref_state";
pub const SHORT_URL_SEED: &[u8] = b"short_url";
pub const GLOBAL_CONFIG_SEED: &[u8] = b"global_config";

/// Authority that signs for a lending market's token vaults.
pub fn lending_market_authority(
    market: &Address,
    program: &Address,
) -> Result<(Address, u8), SdkError> {
    Ok(find_program_address(
        &[LENDING_MARKET_AUTH_SEED, market.as_bytes()],
        program,
    )?)
}

pub fn user_metadata(owner: &Address, program: &Address) -> Result<(Address, u8), SdkError> {
    Ok(find_program_address(
        &[USER_METADATA_SEED, owner.as_bytes()],
        program,
    )?)
}

pub fn referrer_state(referrer: &Address, program: &Address) -> Result<(Address, u8), SdkError> {
    Ok(find_program_address(
        &[REFERRER_STATE_SEED, referrer.as_bytes()],
        program,
    )?)
}

pub fn referrer_token_state(
    referrer: &Address,
    reserve: &Address,
    program: &Address,
) -> Result<(Address, u8), SdkError> {
    Ok(find_program_address(
        &[REFERRER_TOKEN_STATE_SEED, referrer.as_bytes(), reserve.as_bytes()],
        program,
    )?)
}

/// `short_url` is used as raw UTF-8 bytes, so it must fit in one seed.
pub fn short_url(short_url: &str, program: &Address) -> Result<(Address, u8), SdkError> {
    Ok(find_program_address(
        &[SHORT_URL_SEED, short_url.as_bytes()],
        program,
    )?)
}

pub fn global_config(program: &Address) -> Result<(Address, u8), SdkError> {
    Ok(find_program_address(&[GLOBAL_CONFIG_SEED], program)?)
}

/// Obligation address: `[tag, id, owner, market, seed1, seed2]`.
///
/// Vanilla obligations use the all-zero address for both extra seeds.
pub fn obligation(
    args: &InitObligationArgs,
    owner: &Address,
    market: &Address,
    seed1: &Address,
    seed2: &Address,
    program: &Address,
) -> Result<(Address, u8), SdkError> {
    Ok(find_program_address(
        &[
            &[args.tag],
            &[args.id],
            owner.as_bytes(),
            market.as_bytes(),
            seed1.as_bytes(),
            seed2.as_bytes(),
        ],
        program,
    )?)
}

/// The four vault addresses created with a reserve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservePdas {
    pub liquidity_supply_vault: Address,
    pub collateral_mint: Address,
    pub collateral_supply_vault: Address,
    pub fee_vault: Address,
}

pub fn reserve_pdas(
    market: &Address,
    mint: &Address,
    program: &Address,
) -> Result<ReservePdas, SdkError> {
    let derive = |seed: &[u8]| -> Result<Address, SdkError> {
        Ok(find_program_address(&[seed, market.as_bytes(), mint.as_bytes()], program)?.0)
    };
    Ok(ReservePdas {
        liquidity_supply_vault: derive(RESERVE_LIQ_SUPPLY_SEED)?,
        collateral_mint: derive(RESERVE_COLL_MINT_SEED)?,
        collateral_supply_vault: derive(RESERVE_COLL_SUPPLY_SEED)?,
        fee_vault: derive(FEE_RECEIVER_SEED)?,
    })
}
