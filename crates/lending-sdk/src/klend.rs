//! Lending program operations.
//!
//! Each function returns the schema of one operation: its argument layout
//! and the positional account slots exactly as the deployed program reads
//! them. [`table`] collects them behind a program address.

use ledger_codec::{Layout, StructLayout};
use ledger_instruction::{AccountSlot, InstructionSchema};

use crate::error::SdkError;
use crate::program::ProgramTable;
use crate::types::{
    update_config_mode_layout, InitObligationArgs, ReserveFarmKind, LENDING_MARKET_VALUE_LEN,
};

// ---------------------------------------------------------------------------
// Users and obligations
// ---------------------------------------------------------------------------

pub fn init_user_metadata() -> InstructionSchema {
    InstructionSchema::new(
        "init_user_metadata",
        StructLayout::new().field("user_lookup_table", Layout::Address),
        &[
            AccountSlot::readonly_signer("owner"),
            AccountSlot::writable_signer("fee_payer"),
            AccountSlot::writable("user_metadata"),
            AccountSlot::readonly("referrer_user_metadata").optional(),
            AccountSlot::readonly("rent"),
            AccountSlot::readonly("system_program"),
        ],
    )
    .with_remaining_accounts()
}

pub fn init_obligation() -> InstructionSchema {
    InstructionSchema::new(
        "init_obligation",
        StructLayout::new().field("args", Layout::Struct(InitObligationArgs::layout())),
        &[
            AccountSlot::readonly_signer("obligation_owner"),
            AccountSlot::writable_signer("fee_payer"),
            AccountSlot::writable("obligation"),
            AccountSlot::readonly("lending_market"),
            AccountSlot::readonly("seed1_account"),
            AccountSlot::readonly("seed2_account"),
            AccountSlot::readonly("owner_user_metadata"),
            AccountSlot::readonly("rent"),
            AccountSlot::readonly("system_program"),
        ],
    )
    .with_remaining_accounts()
}

pub fn request_elevation_group() -> InstructionSchema {
    InstructionSchema::new(
        "request_elevation_group",
        StructLayout::new().field("elevation_group", Layout::U8),
        &[
            AccountSlot::readonly_signer("owner"),
            AccountSlot::writable("obligation"),
            AccountSlot::readonly("lending_market"),
        ],
    )
    .with_remaining_accounts()
}

/// The obligation's deposit and borrow reserves follow as remaining
/// accounts, deposits first.
pub fn refresh_obligation() -> InstructionSchema {
    InstructionSchema::new(
        "refresh_obligation",
        StructLayout::new(),
        &[
            AccountSlot::readonly("lending_market"),
            AccountSlot::writable("obligation"),
        ],
    )
    .with_remaining_accounts()
}

// ---------------------------------------------------------------------------
// Reserves
// ---------------------------------------------------------------------------

/// Any oracle the reserve does not use is left absent.
pub fn refresh_reserve() -> InstructionSchema {
    InstructionSchema::new(
        "refresh_reserve",
        StructLayout::new(),
        &[
            AccountSlot::writable("reserve"),
            AccountSlot::readonly("lending_market"),
            AccountSlot::readonly("pyth_oracle").optional(),
            AccountSlot::readonly("switchboard_price_oracle").optional(),
            AccountSlot::readonly("switchboard_twap_oracle").optional(),
            AccountSlot::readonly("scope_prices").optional(),
        ],
    )
    .with_remaining_accounts()
}

pub fn deposit_reserve_liquidity_and_obligation_collateral() -> InstructionSchema {
    InstructionSchema::new(
        "deposit_reserve_liquidity_and_obligation_collateral",
        StructLayout::new().field("liquidity_amount", Layout::U64),
        &[
            AccountSlot::writable_signer("owner"),
            AccountSlot::writable("obligation"),
            AccountSlot::readonly("lending_market"),
            AccountSlot::readonly("lending_market_authority"),
            AccountSlot::writable("reserve"),
            AccountSlot::readonly("reserve_liquidity_mint"),
            AccountSlot::writable("reserve_liquidity_supply"),
            AccountSlot::writable("reserve_collateral_mint"),
            AccountSlot::writable("reserve_destination_deposit_collateral"),
            AccountSlot::writable("user_source_liquidity"),
            AccountSlot::readonly("placeholder_user_destination_collateral").optional(),
            AccountSlot::readonly("collateral_token_program"),
            AccountSlot::readonly("liquidity_token_program"),
            AccountSlot::readonly("instruction_sysvar_account"),
        ],
    )
    .with_remaining_accounts()
}

/// A present referrer token state is writable; an absent one becomes the
/// read-only program address.
pub fn borrow_obligation_liquidity() -> InstructionSchema {
    InstructionSchema::new(
        "borrow_obligation_liquidity",
        StructLayout::new().field("liquidity_amount", Layout::U64),
        &[
            AccountSlot::readonly_signer("owner"),
            AccountSlot::writable("obligation"),
            AccountSlot::readonly("lending_market"),
            AccountSlot::readonly("lending_market_authority"),
            AccountSlot::writable("borrow_reserve"),
            AccountSlot::readonly("borrow_reserve_liquidity_mint"),
            AccountSlot::writable("reserve_source_liquidity"),
            AccountSlot::writable("borrow_reserve_liquidity_fee_receiver"),
            AccountSlot::writable("user_destination_liquidity"),
            AccountSlot::writable("referrer_token_state").optional(),
            AccountSlot::readonly("token_program"),
            AccountSlot::readonly("instruction_sysvar_account"),
        ],
    )
    .with_remaining_accounts()
}

pub fn repay_obligation_liquidity() -> InstructionSchema {
    InstructionSchema::new(
        "repay_obligation_liquidity",
        StructLayout::new().field("liquidity_amount", Layout::U64),
        &[
            AccountSlot::readonly_signer("owner"),
            AccountSlot::writable("obligation"),
            AccountSlot::readonly("lending_market"),
            AccountSlot::writable("repay_reserve"),
            AccountSlot::readonly("reserve_liquidity_mint"),
            AccountSlot::writable("reserve_destination_liquidity"),
            AccountSlot::writable("user_source_liquidity"),
            AccountSlot::readonly("token_program"),
            AccountSlot::readonly("instruction_sysvar_account"),
        ],
    )
    .with_remaining_accounts()
}

pub fn withdraw_obligation_collateral_and_redeem_reserve_collateral() -> InstructionSchema {
    InstructionSchema::new(
        "withdraw_obligation_collateral_and_redeem_reserve_collateral",
        StructLayout::new().field("collateral_amount", Layout::U64),
        &[
            AccountSlot::writable_signer("owner"),
            AccountSlot::writable("obligation"),
            AccountSlot::readonly("lending_market"),
            AccountSlot::readonly("lending_market_authority"),
            AccountSlot::writable("withdraw_reserve"),
            AccountSlot::readonly("reserve_liquidity_mint"),
            AccountSlot::writable("reserve_source_collateral"),
            AccountSlot::writable("reserve_collateral_mint"),
            AccountSlot::writable("reserve_liquidity_supply"),
            AccountSlot::writable("user_destination_liquidity"),
            AccountSlot::readonly("placeholder_user_destination_collateral").optional(),
            AccountSlot::readonly("collateral_token_program"),
            AccountSlot::readonly("liquidity_token_program"),
            AccountSlot::readonly("instruction_sysvar_account"),
        ],
    )
    .with_remaining_accounts()
}

// ---------------------------------------------------------------------------
// Administration
// ---------------------------------------------------------------------------

/// `value` is the mode's payload zero-padded to 72 bytes; see
/// [`UpdateLendingMarketConfigValue::to_padded_bytes`](crate::types::UpdateLendingMarketConfigValue::to_padded_bytes).
pub fn update_lending_market() -> InstructionSchema {
    InstructionSchema::new(
        "update_lending_market",
        StructLayout::new()
            .field("mode", Layout::U64)
            .field("value", Layout::Bytes(LENDING_MARKET_VALUE_LEN)),
        &[
            AccountSlot::readonly_signer("lending_market_owner"),
            AccountSlot::writable("lending_market"),
        ],
    )
    .with_remaining_accounts()
}

pub fn update_reserve_config() -> InstructionSchema {
    InstructionSchema::new(
        "update_reserve_config",
        StructLayout::new()
            .field("mode", Layout::Union(update_config_mode_layout()))
            .field("value", Layout::ByteVec)
            .field("skip_config_integrity_validation", Layout::Bool),
        &[
            AccountSlot::readonly_signer("signer"),
            AccountSlot::readonly("global_config"),
            AccountSlot::readonly("lending_market"),
            AccountSlot::writable("reserve"),
        ],
    )
    .with_remaining_accounts()
}

/// `mode` picks the collateral or debt farm of the reserve.
pub fn init_farms_for_reserve() -> InstructionSchema {
    InstructionSchema::new(
        "init_farms_for_reserve",
        StructLayout::new().field("mode", Layout::Union(ReserveFarmKind::layout())),
        &[
            AccountSlot::writable_signer("lending_market_owner"),
            AccountSlot::readonly("lending_market"),
            AccountSlot::readonly("lending_market_authority"),
            AccountSlot::writable("reserve"),
            AccountSlot::readonly("farms_program"),
            AccountSlot::readonly("farms_global_config"),
            AccountSlot::writable("farm_state"),
            AccountSlot::readonly("farms_vault_authority"),
            AccountSlot::readonly("rent"),
            AccountSlot::readonly("system_program"),
        ],
    )
    .with_remaining_accounts()
}

/// Every lending operation this SDK builds.
pub fn schemas() -> Vec<InstructionSchema> {
    vec![
        init_user_metadata(),
        init_obligation(),
        refresh_reserve(),
        deposit_reserve_liquidity_and_obligation_collateral(),
        borrow_obligation_liquidity(),
        repay_obligation_liquidity(),
        withdraw_obligation_collateral_and_redeem_reserve_collateral(),
        request_elevation_group(),
        update_lending_market(),
        update_reserve_config(),
        init_farms_for_reserve(),
        refresh_obligation(),
    ]
}

pub fn table(program: ledger_codec::Address) -> Result<ProgramTable, SdkError> {
    ProgramTable::new(program, schemas())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ledger_codec::{Address, EnumValue, StructValue};
    use ledger_instruction::{
        AccountInputs, AccountReference, AccountRole, InstructionError, KeypairSigner,
        TransactionSigner,
    };

    use super::*;
    use crate::config::{LENDING_PROGRAM_ID, SYSVAR_INSTRUCTIONS_ID};

    fn addr(byte: u8) -> Address {
        Address::new_from_array([byte; 32])
    }

    fn signer(seed: u8) -> Arc<dyn TransactionSigner> {
        Arc::new(KeypairSigner::from_seed(&[seed; 32]))
    }

    // ─── Discriminators ──────────────────────────────────────────

    #[test]
    fn discriminators_match_deployed_program() {
        let expected: [(&str, [u8; 8]); 12] = [
            ("init_user_metadata", [117, 169, 176, 69, 197, 23, 15, 162]),
            ("init_obligation", [251, 10, 231, 76, 27, 11, 159, 96]),
            ("refresh_reserve", [2, 218, 138, 235, 79, 201, 25, 102]),
            (
                "deposit_reserve_liquidity_and_obligation_collateral",
                [129, 199, 4, 2, 222, 39, 26, 46],
            ),
            ("borrow_obligation_liquidity", [121, 127, 18, 204, 73, 245, 225, 65]),
            ("repay_obligation_liquidity", [145, 178, 13, 225, 76, 240, 147, 72]),
            (
                "withdraw_obligation_collateral_and_redeem_reserve_collateral",
                [75, 93, 93, 220, 34, 150, 218, 196],
            ),
            ("request_elevation_group", [36, 119, 251, 129, 34, 240, 7, 147]),
            ("update_lending_market", [209, 157, 53, 210, 97, 180, 31, 45]),
            ("update_reserve_config", [61, 148, 100, 70, 143, 107, 17, 13]),
            ("init_farms_for_reserve", [218, 6, 62, 233, 1, 33, 232, 82]),
            ("refresh_obligation", [33, 132, 147, 228, 151, 192, 72, 89]),
        ];
        let table = table(LENDING_PROGRAM_ID).unwrap();
        assert_eq!(table.len(), expected.len());
        for (name, bytes) in expected {
            assert_eq!(table.schema(name).unwrap().discriminator().to_bytes(), bytes, "{name}");
        }
    }

    // ─── Account placement ───────────────────────────────────────

    #[test]
    fn refresh_reserve_without_oracles_keeps_six_slots() {
        let table = table(LENDING_PROGRAM_ID).unwrap();
        let ix = table
            .build(
                "refresh_reserve",
                &StructValue::new(),
                AccountInputs::new()
                    .with_address("reserve", addr(1))
                    .with_address("lending_market", addr(2))
                    .with_optional("scope_prices", Some(addr(3))),
                vec![],
            )
            .unwrap();
        let metas = ix.metas();
        assert_eq!(metas.len(), 6);
        assert_eq!(metas[0].address, addr(1));
        assert_eq!(metas[0].role, AccountRole::Writable);
        for meta in &metas[2..5] {
            assert_eq!(meta.address, LENDING_PROGRAM_ID);
            assert_eq!(meta.role, AccountRole::Readonly);
        }
        assert_eq!(metas[5].address, addr(3));
        assert_eq!(ix.data(), &[2, 218, 138, 235, 79, 201, 25, 102]);
    }

    #[test]
    fn borrow_referrer_slot_role_depends_on_presence() {
        let table = table(LENDING_PROGRAM_ID).unwrap();
        let owner = signer(1);
        let inputs = |referrer: Option<Address>| {
            AccountInputs::new()
                .with_signer("owner", owner.clone())
                .with_address("obligation", addr(2))
                .with_address("lending_market", addr(3))
                .with_address("lending_market_authority", addr(4))
                .with_address("borrow_reserve", addr(5))
                .with_address("borrow_reserve_liquidity_mint", addr(6))
                .with_address("reserve_source_liquidity", addr(7))
                .with_address("borrow_reserve_liquidity_fee_receiver", addr(8))
                .with_address("user_destination_liquidity", addr(9))
                .with_optional("referrer_token_state", referrer)
                .with_address("token_program", addr(10))
                .with_address("instruction_sysvar_account", SYSVAR_INSTRUCTIONS_ID)
        };
        let args = StructValue::new().with("liquidity_amount", 5_000u64);

        let with = table
            .build("borrow_obligation_liquidity", &args, inputs(Some(addr(11))), vec![])
            .unwrap();
        assert_eq!(with.metas()[9].role, AccountRole::Writable);
        assert_eq!(with.metas()[9].address, addr(11));

        let without = table
            .build("borrow_obligation_liquidity", &args, inputs(None), vec![])
            .unwrap();
        assert_eq!(without.metas()[9].role, AccountRole::Readonly);
        assert_eq!(without.metas()[9].address, LENDING_PROGRAM_ID);
        assert_eq!(without.metas()[0].role, AccountRole::ReadonlySigner);
        assert_eq!(without.accounts().len(), with.accounts().len());
    }

    #[test]
    fn refresh_obligation_appends_reserves() {
        let table = table(LENDING_PROGRAM_ID).unwrap();
        let reserves = vec![
            AccountReference::writable(addr(20)),
            AccountReference::writable(addr(21)),
        ];
        let ix = table
            .build(
                "refresh_obligation",
                &StructValue::new(),
                AccountInputs::new()
                    .with_address("lending_market", addr(1))
                    .with_address("obligation", addr(2)),
                reserves,
            )
            .unwrap();
        let addresses: Vec<Address> = ix.metas().iter().map(|m| m.address).collect();
        assert_eq!(addresses, [addr(1), addr(2), addr(20), addr(21)]);
        assert_eq!(ix.data().len(), 8);
    }

    #[test]
    fn owner_without_signer_is_rejected() {
        let table = table(LENDING_PROGRAM_ID).unwrap();
        let err = table
            .build(
                "request_elevation_group",
                &StructValue::new().with("elevation_group", 1u8),
                AccountInputs::new()
                    .with_address("owner", addr(1))
                    .with_address("obligation", addr(2))
                    .with_address("lending_market", addr(3)),
                vec![],
            )
            .unwrap_err();
        assert_eq!(
            err,
            SdkError::Instruction(InstructionError::MissingSignerCapability {
                operation: "request_elevation_group".into(),
                slot: "owner".into(),
            })
        );
    }

    // ─── Arguments ───────────────────────────────────────────────

    #[test]
    fn update_reserve_config_args_wire() {
        let table = table(LENDING_PROGRAM_ID).unwrap();
        let args = StructValue::new()
            .with("mode", EnumValue::unit("UpdateDepositLimit"))
            .with("value", 1_000_000u64.to_le_bytes().to_vec())
            .with("skip_config_integrity_validation", false);
        let ix = table
            .build(
                "update_reserve_config",
                &args,
                AccountInputs::new()
                    .with_signer("signer", signer(2))
                    .with_address("global_config", addr(1))
                    .with_address("lending_market", addr(2))
                    .with_address("reserve", addr(3)),
                vec![],
            )
            .unwrap();
        let mut expected = vec![8u8, 8, 0, 0, 0];
        expected.extend_from_slice(&1_000_000u64.to_le_bytes());
        expected.push(0);
        assert_eq!(ix.args_data(), expected.as_slice());

        let (schema, decoded) = table.decode_args(ix.data()).unwrap();
        assert_eq!(schema.name(), "update_reserve_config");
        assert_eq!(decoded, args);
    }

    #[test]
    fn update_lending_market_value_is_fixed_width() {
        let schema = update_lending_market();
        assert_eq!(schema.args().fixed_size(), Some(8 + 72));
        let short = StructValue::new()
            .with("mode", 0u64)
            .with("value", vec![0u8; 71]);
        assert!(schema.args().encode_to_vec(&short).is_err());
    }

    #[test]
    fn init_obligation_nests_args() {
        let schema = init_obligation();
        let args = StructValue::new().with(
            "args",
            InitObligationArgs { tag: 0, id: 3 }.to_value(),
        );
        assert_eq!(schema.args().encode_to_vec(&args).unwrap(), [0, 3]);
    }

    #[test]
    fn init_farms_for_reserve_sends_farm_kind_tag() {
        let table = table(LENDING_PROGRAM_ID).unwrap();
        let args = StructValue::new().with("mode", ReserveFarmKind::Debt.to_value());
        let ix = table
            .build(
                "init_farms_for_reserve",
                &args,
                AccountInputs::new()
                    .with_signer("lending_market_owner", signer(3))
                    .with_address("lending_market", addr(1))
                    .with_address("lending_market_authority", addr(2))
                    .with_address("reserve", addr(3))
                    .with_address("farms_program", addr(4))
                    .with_address("farms_global_config", addr(5))
                    .with_address("farm_state", addr(6))
                    .with_address("farms_vault_authority", addr(7))
                    .with_address("rent", addr(8))
                    .with_address("system_program", addr(9)),
                vec![],
            )
            .unwrap();
        assert_eq!(ix.data(), &[218, 6, 62, 233, 1, 33, 232, 82, 1]);
        assert_eq!(ix.metas()[0].role, AccountRole::WritableSigner);
        assert_eq!(ix.metas()[6].role, AccountRole::Writable);

        let (_, decoded) = table.decode_args(ix.data()).unwrap();
        let mode = decoded.field("mode").unwrap().as_enum().unwrap();
        assert_eq!(ReserveFarmKind::from_value(mode).unwrap(), ReserveFarmKind::Debt);
        assert!(table.decode_args(&[218, 6, 62, 233, 1, 33, 232, 82, 2]).is_err());
    }
}
