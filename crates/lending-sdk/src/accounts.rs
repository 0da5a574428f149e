//! Typed decoding of lending program account data.
//!
//! Raw bytes are validated before any typed value is built: the owner must
//! be the lending program, the leading tag must name the expected kind, and
//! every field must decode.

use ledger_codec::{
    Address, CodecError, Discriminator, DiscriminatorRegistry, Layout, StructLayout, StructValue,
};

use ledger_fixed_point::{FixedPointError, Fraction};
use rust_decimal::Decimal;

use crate::error::SdkError;
use crate::types::{
    fixed_array, ElevationGroup, LastUpdate, ObligationCollateral, ObligationLiquidity,
    ObligationOrder,
};

/// Account bytes as fetched, with the program that owns them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAccount {
    pub address: Address,
    pub owner: Address,
    pub data: Vec<u8>,
}

/// A fixed account type stored by the lending program.
pub trait AccountData: Sized {
    /// Type name the account tag is derived from.
    const NAME: &'static str;

    fn layout() -> StructLayout;

    fn from_value(value: &StructValue) -> Result<Self, SdkError>;

    fn discriminator() -> Discriminator {
        Discriminator::for_account(Self::NAME)
    }

    /// Decode `data`, tag included. Bytes past the layout are ignored, since
    /// accounts may be allocated larger than their current layout.
    fn decode(data: &[u8]) -> Result<Self, SdkError> {
        let tag = Discriminator::from_prefix(data)?;
        if tag != Self::discriminator() {
            return Err(CodecError::UnrecognizedDiscriminator(format!(
                "{tag} is not a {}",
                Self::NAME
            ))
            .into());
        }
        let (value, _) = Self::layout().decode(data, Discriminator::LEN)?;
        Self::from_value(&value)
    }

    /// Like [`decode`](Self::decode), after checking the account is owned by
    /// `program`.
    fn decode_account(account: &RawAccount, program: &Address) -> Result<Self, SdkError> {
        check_owner(account, program)?;
        Self::decode(&account.data)
    }
}

fn check_owner(account: &RawAccount, program: &Address) -> Result<(), SdkError> {
    if account.owner != *program {
        return Err(SdkError::OwnerMismatch {
            account: account.address,
            expected: *program,
            actual: account.owner,
        });
    }
    Ok(())
}

fn padding(value: &StructValue, name: &str, len: usize) -> Result<(), SdkError> {
    fixed_array(value, name, len)?;
    Ok(())
}

fn fraction(value: &StructValue, name: &str) -> Result<Fraction, SdkError> {
    Ok(Fraction(value.field(name)?.as_u128()?))
}

fn slots<T>(
    value: &StructValue,
    name: &str,
    len: usize,
    from_value: impl Fn(&StructValue) -> Result<T, SdkError>,
) -> Result<Vec<T>, SdkError> {
    fixed_array(value, name, len)?
        .iter()
        .map(|item| from_value(item.as_struct()?))
        .collect()
}

// ---------------------------------------------------------------------------
// Account types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserMetadata {
    pub referrer: Address,
    pub bump: u64,
    pub user_lookup_table: Address,
    pub owner: Address,
}

impl UserMetadata {
    /// The all-zero address marks "no referrer".
    pub fn referrer(&self) -> Option<Address> {
        (self.referrer != Address::default()).then_some(self.referrer)
    }
}

impl AccountData for UserMetadata {
    const NAME: &'static str = "UserMetadata";

    fn layout() -> StructLayout {
        StructLayout::new()
            .field("referrer", Layout::Address)
            .field("bump", Layout::U64)
            .field("user_lookup_table", Layout::Address)
            .field("owner", Layout::Address)
            .field("padding1", Layout::array(Layout::U64, 51))
            .field("padding2", Layout::array(Layout::U64, 64))
    }

    fn from_value(value: &StructValue) -> Result<Self, SdkError> {
        padding(value, "padding1", 51)?;
        padding(value, "padding2", 64)?;
        Ok(Self {
            referrer: value.field("referrer")?.as_address()?,
            bump: value.field("bump")?.as_u64()?,
            user_lookup_table: value.field("user_lookup_table")?.as_address()?,
            owner: value.field("owner")?.as_address()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferrerState {
    pub short_url: Address,
    pub owner: Address,
}

impl AccountData for ReferrerState {
    const NAME: &'static str = "ReferrerState";

    fn layout() -> StructLayout {
        StructLayout::new()
            .field("short_url", Layout::Address)
            .field("owner", Layout::Address)
    }

    fn from_value(value: &StructValue) -> Result<Self, SdkError> {
        Ok(Self {
            short_url: value.field("short_url")?.as_address()?,
            owner: value.field("owner")?.as_address()?,
        })
    }
}

/// Market-wide settings shared by every reserve and obligation in a market.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LendingMarket {
    pub version: u64,
    pub bump_seed: u64,
    pub lending_market_owner: Address,
    pub lending_market_owner_cached: Address,
    pub quote_currency: [u8; 32],
    pub referral_fee_bps: u16,
    pub emergency_mode: u8,
    pub autodeleverage_enabled: u8,
    pub borrow_disabled: u8,
    pub price_refresh_trigger_to_max_age_pct: u8,
    pub liquidation_max_debt_close_factor_pct: u8,
    pub insolvency_risk_unhealthy_ltv_pct: u8,
    pub min_full_liquidation_value_threshold: u64,
    pub max_liquidatable_debt_market_value_at_once: u64,
    pub global_allowed_borrow_value: u64,
    pub risk_council: Address,
    pub elevation_groups: Vec<ElevationGroup>,
    pub min_net_value_in_obligation_sf: Fraction,
    pub min_value_skip_liquidation_ltv_checks: u64,
    pub name: [u8; 32],
    pub min_value_skip_liquidation_bf_checks: u64,
    pub individual_autodeleverage_margin_call_period_secs: u64,
    pub min_initial_deposit_amount: u64,
    pub obligation_order_execution_enabled: u8,
    pub immutable: u8,
    pub obligation_order_creation_enabled: u8,
}

impl LendingMarket {
    pub const ELEVATION_GROUPS: usize = 32;

    /// The market name with its zero padding removed.
    pub fn name_str(&self) -> String {
        let end = self.name.iter().position(|b| *b == 0).unwrap_or(self.name.len());
        String::from_utf8_lossy(&self.name[..end]).into_owned()
    }

    /// The group with `id`; id 0 means no group.
    pub fn elevation_group(&self, id: u8) -> Option<&ElevationGroup> {
        if id == 0 {
            return None;
        }
        self.elevation_groups.iter().find(|group| group.id == id)
    }

    pub fn is_emergency(&self) -> bool {
        self.emergency_mode != 0
    }
}

impl AccountData for LendingMarket {
    const NAME: &'static str = "LendingMarket";

    fn layout() -> StructLayout {
        StructLayout::new()
            .field("version", Layout::U64)
            .field("bump_seed", Layout::U64)
            .field("lending_market_owner", Layout::Address)
            .field("lending_market_owner_cached", Layout::Address)
            .field("quote_currency", Layout::Bytes(32))
            .field("referral_fee_bps", Layout::U16)
            .field("emergency_mode", Layout::U8)
            .field("autodeleverage_enabled", Layout::U8)
            .field("borrow_disabled", Layout::U8)
            .field("price_refresh_trigger_to_max_age_pct", Layout::U8)
            .field("liquidation_max_debt_close_factor_pct", Layout::U8)
            .field("insolvency_risk_unhealthy_ltv_pct", Layout::U8)
            .field("min_full_liquidation_value_threshold", Layout::U64)
            .field("max_liquidatable_debt_market_value_at_once", Layout::U64)
            .field("reserved0", Layout::Bytes(8))
            .field("global_allowed_borrow_value", Layout::U64)
            .field("risk_council", Layout::Address)
            .field("reserved1", Layout::Bytes(8))
            .field(
                "elevation_groups",
                Layout::array(
                    Layout::Struct(ElevationGroup::layout()),
                    Self::ELEVATION_GROUPS,
                ),
            )
            .field("elevation_group_padding", Layout::array(Layout::U64, 90))
            .field("min_net_value_in_obligation_sf", Layout::U128)
            .field("min_value_skip_liquidation_ltv_checks", Layout::U64)
            .field("name", Layout::Bytes(32))
            .field("min_value_skip_liquidation_bf_checks", Layout::U64)
            .field("individual_autodeleverage_margin_call_period_secs", Layout::U64)
            .field("min_initial_deposit_amount", Layout::U64)
            .field("obligation_order_execution_enabled", Layout::U8)
            .field("immutable", Layout::U8)
            .field("obligation_order_creation_enabled", Layout::U8)
            .field("padding2", Layout::Bytes(5))
            .field("padding1", Layout::array(Layout::U64, 169))
    }

    fn from_value(value: &StructValue) -> Result<Self, SdkError> {
        padding(value, "elevation_group_padding", 90)?;
        padding(value, "padding1", 169)?;
        Ok(Self {
            version: value.field("version")?.as_u64()?,
            bump_seed: value.field("bump_seed")?.as_u64()?,
            lending_market_owner: value.field("lending_market_owner")?.as_address()?,
            lending_market_owner_cached: value.field("lending_market_owner_cached")?.as_address()?,
            quote_currency: value.field("quote_currency")?.as_byte_array()?,
            referral_fee_bps: value.field("referral_fee_bps")?.as_u16()?,
            emergency_mode: value.field("emergency_mode")?.as_u8()?,
            autodeleverage_enabled: value.field("autodeleverage_enabled")?.as_u8()?,
            borrow_disabled: value.field("borrow_disabled")?.as_u8()?,
            price_refresh_trigger_to_max_age_pct: value
                .field("price_refresh_trigger_to_max_age_pct")?
                .as_u8()?,
            liquidation_max_debt_close_factor_pct: value
                .field("liquidation_max_debt_close_factor_pct")?
                .as_u8()?,
            insolvency_risk_unhealthy_ltv_pct: value
                .field("insolvency_risk_unhealthy_ltv_pct")?
                .as_u8()?,
            min_full_liquidation_value_threshold: value
                .field("min_full_liquidation_value_threshold")?
                .as_u64()?,
            max_liquidatable_debt_market_value_at_once: value
                .field("max_liquidatable_debt_market_value_at_once")?
                .as_u64()?,
            global_allowed_borrow_value: value.field("global_allowed_borrow_value")?.as_u64()?,
            risk_council: value.field("risk_council")?.as_address()?,
            elevation_groups: slots(value, "elevation_groups", Self::ELEVATION_GROUPS, |v| {
                Ok(ElevationGroup::from_value(v)?)
            })?,
            min_net_value_in_obligation_sf: fraction(value, "min_net_value_in_obligation_sf")?,
            min_value_skip_liquidation_ltv_checks: value
                .field("min_value_skip_liquidation_ltv_checks")?
                .as_u64()?,
            name: value.field("name")?.as_byte_array()?,
            min_value_skip_liquidation_bf_checks: value
                .field("min_value_skip_liquidation_bf_checks")?
                .as_u64()?,
            individual_autodeleverage_margin_call_period_secs: value
                .field("individual_autodeleverage_margin_call_period_secs")?
                .as_u64()?,
            min_initial_deposit_amount: value.field("min_initial_deposit_amount")?.as_u64()?,
            obligation_order_execution_enabled: value
                .field("obligation_order_execution_enabled")?
                .as_u8()?,
            immutable: value.field("immutable")?.as_u8()?,
            obligation_order_creation_enabled: value
                .field("obligation_order_creation_enabled")?
                .as_u8()?,
        })
    }
}

/// A user's deposits and borrows in one market.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Obligation {
    pub tag: u64,
    pub last_update: LastUpdate,
    pub lending_market: Address,
    pub owner: Address,
    pub deposits: Vec<ObligationCollateral>,
    pub lowest_reserve_deposit_liquidation_ltv: u64,
    pub deposited_value_sf: Fraction,
    pub borrows: Vec<ObligationLiquidity>,
    pub borrow_factor_adjusted_debt_value_sf: Fraction,
    pub borrowed_assets_market_value_sf: Fraction,
    pub allowed_borrow_value_sf: Fraction,
    pub unhealthy_borrow_value_sf: Fraction,
    pub deposits_asset_tiers: [u8; 8],
    pub borrows_asset_tiers: [u8; 5],
    pub elevation_group: u8,
    pub num_of_obsolete_deposit_reserves: u8,
    pub has_debt: u8,
    pub referrer: Address,
    pub borrowing_disabled: u8,
    pub autodeleverage_target_ltv_pct: u8,
    pub lowest_reserve_deposit_max_ltv_pct: u8,
    pub num_of_obsolete_borrow_reserves: u8,
    pub highest_borrow_factor_pct: u64,
    pub autodeleverage_margin_call_started_timestamp: u64,
    pub orders: Vec<ObligationOrder>,
}

impl Obligation {
    pub const DEPOSIT_SLOTS: usize = 8;
    pub const BORROW_SLOTS: usize = 5;
    pub const ORDER_SLOTS: usize = 2;

    pub fn active_deposits(&self) -> impl Iterator<Item = &ObligationCollateral> {
        self.deposits.iter().filter(|slot| slot.is_active())
    }

    pub fn active_borrows(&self) -> impl Iterator<Item = &ObligationLiquidity> {
        self.borrows.iter().filter(|slot| slot.is_active())
    }

    /// The all-zero address marks "no referrer".
    pub fn referrer(&self) -> Option<Address> {
        (self.referrer != Address::default()).then_some(self.referrer)
    }

    /// Borrow-factor-adjusted debt over deposited value; zero with no deposits.
    pub fn loan_to_value(&self) -> Result<Decimal, SdkError> {
        let deposited = self.deposited_value_sf.to_decimal()?;
        if deposited.is_zero() {
            return Ok(Decimal::ZERO);
        }
        let debt = self.borrow_factor_adjusted_debt_value_sf.to_decimal()?;
        debt.checked_div(deposited).ok_or_else(|| {
            FixedPointError::Overflow(format!("{debt} / {deposited}")).into()
        })
    }
}

impl AccountData for Obligation {
    const NAME: &'static str = "Obligation";

    fn layout() -> StructLayout {
        StructLayout::new()
            .field("tag", Layout::U64)
            .field("last_update", Layout::Struct(LastUpdate::layout()))
            .field("lending_market", Layout::Address)
            .field("owner", Layout::Address)
            .field(
                "deposits",
                Layout::array(
                    Layout::Struct(ObligationCollateral::layout()),
                    Self::DEPOSIT_SLOTS,
                ),
            )
            .field("lowest_reserve_deposit_liquidation_ltv", Layout::U64)
            .field("deposited_value_sf", Layout::U128)
            .field(
                "borrows",
                Layout::array(
                    Layout::Struct(ObligationLiquidity::layout()),
                    Self::BORROW_SLOTS,
                ),
            )
            .field("borrow_factor_adjusted_debt_value_sf", Layout::U128)
            .field("borrowed_assets_market_value_sf", Layout::U128)
            .field("allowed_borrow_value_sf", Layout::U128)
            .field("unhealthy_borrow_value_sf", Layout::U128)
            .field("deposits_asset_tiers", Layout::Bytes(8))
            .field("borrows_asset_tiers", Layout::Bytes(5))
            .field("elevation_group", Layout::U8)
            .field("num_of_obsolete_deposit_reserves", Layout::U8)
            .field("has_debt", Layout::U8)
            .field("referrer", Layout::Address)
            .field("borrowing_disabled", Layout::U8)
            .field("autodeleverage_target_ltv_pct", Layout::U8)
            .field("lowest_reserve_deposit_max_ltv_pct", Layout::U8)
            .field("num_of_obsolete_borrow_reserves", Layout::U8)
            .field("reserved", Layout::Bytes(4))
            .field("highest_borrow_factor_pct", Layout::U64)
            .field("autodeleverage_margin_call_started_timestamp", Layout::U64)
            .field(
                "orders",
                Layout::array(Layout::Struct(ObligationOrder::layout()), Self::ORDER_SLOTS),
            )
            .field("padding3", Layout::array(Layout::U64, 93))
    }

    fn from_value(value: &StructValue) -> Result<Self, SdkError> {
        padding(value, "padding3", 93)?;
        Ok(Self {
            tag: value.field("tag")?.as_u64()?,
            last_update: LastUpdate::from_value(value.field("last_update")?.as_struct()?)?,
            lending_market: value.field("lending_market")?.as_address()?,
            owner: value.field("owner")?.as_address()?,
            deposits: slots(
                value,
                "deposits",
                Self::DEPOSIT_SLOTS,
                ObligationCollateral::from_value,
            )?,
            lowest_reserve_deposit_liquidation_ltv: value
                .field("lowest_reserve_deposit_liquidation_ltv")?
                .as_u64()?,
            deposited_value_sf: fraction(value, "deposited_value_sf")?,
            borrows: slots(value, "borrows", Self::BORROW_SLOTS, ObligationLiquidity::from_value)?,
            borrow_factor_adjusted_debt_value_sf: fraction(
                value,
                "borrow_factor_adjusted_debt_value_sf",
            )?,
            borrowed_assets_market_value_sf: fraction(value, "borrowed_assets_market_value_sf")?,
            allowed_borrow_value_sf: fraction(value, "allowed_borrow_value_sf")?,
            unhealthy_borrow_value_sf: fraction(value, "unhealthy_borrow_value_sf")?,
            deposits_asset_tiers: value.field("deposits_asset_tiers")?.as_byte_array()?,
            borrows_asset_tiers: value.field("borrows_asset_tiers")?.as_byte_array()?,
            elevation_group: value.field("elevation_group")?.as_u8()?,
            num_of_obsolete_deposit_reserves: value
                .field("num_of_obsolete_deposit_reserves")?
                .as_u8()?,
            has_debt: value.field("has_debt")?.as_u8()?,
            referrer: value.field("referrer")?.as_address()?,
            borrowing_disabled: value.field("borrowing_disabled")?.as_u8()?,
            autodeleverage_target_ltv_pct: value.field("autodeleverage_target_ltv_pct")?.as_u8()?,
            lowest_reserve_deposit_max_ltv_pct: value
                .field("lowest_reserve_deposit_max_ltv_pct")?
                .as_u8()?,
            num_of_obsolete_borrow_reserves: value
                .field("num_of_obsolete_borrow_reserves")?
                .as_u8()?,
            highest_borrow_factor_pct: value.field("highest_borrow_factor_pct")?.as_u64()?,
            autodeleverage_margin_call_started_timestamp: value
                .field("autodeleverage_margin_call_started_timestamp")?
                .as_u64()?,
            orders: slots(value, "orders", Self::ORDER_SLOTS, ObligationOrder::from_value)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Any account
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LendingAccount {
    LendingMarket(Box<LendingMarket>),
    Obligation(Box<Obligation>),
    UserMetadata(UserMetadata),
    ReferrerState(ReferrerState),
}

/// Tags of every account kind [`LendingAccount`] covers.
pub fn account_registry() -> Result<DiscriminatorRegistry, SdkError> {
    let mut registry = DiscriminatorRegistry::new();
    registry.register(LendingMarket::NAME, LendingMarket::discriminator())?;
    registry.register(Obligation::NAME, Obligation::discriminator())?;
    registry.register(UserMetadata::NAME, UserMetadata::discriminator())?;
    registry.register(ReferrerState::NAME, ReferrerState::discriminator())?;
    Ok(registry)
}

impl LendingAccount {
    /// Identify the kind from the leading tag, then decode it.
    pub fn decode(registry: &DiscriminatorRegistry, data: &[u8]) -> Result<Self, SdkError> {
        let kind = registry.identify(data)?;
        if kind == LendingMarket::NAME {
            Ok(Self::LendingMarket(Box::new(LendingMarket::decode(data)?)))
        } else if kind == Obligation::NAME {
            Ok(Self::Obligation(Box::new(Obligation::decode(data)?)))
        } else if kind == UserMetadata::NAME {
            Ok(Self::UserMetadata(UserMetadata::decode(data)?))
        } else if kind == ReferrerState::NAME {
            Ok(Self::ReferrerState(ReferrerState::decode(data)?))
        } else {
            Err(CodecError::UnknownOperation(kind.to_string()).into())
        }
    }
}

/// Decode many accounts, one result per input in input order.
///
/// A bad account never affects its neighbours.
pub fn decode_accounts(
    accounts: &[RawAccount],
    program: &Address,
) -> Result<Vec<Result<LendingAccount, SdkError>>, SdkError> {
    let registry = account_registry()?;
    Ok(accounts
        .iter()
        .map(|account| {
            check_owner(account, program)
                .and_then(|()| LendingAccount::decode(&registry, &account.data))
                .inspect_err(|e| {
                    tracing::warn!(account = %account.address, error = %e, "account decode failed");
                })
        })
        .collect())
}
