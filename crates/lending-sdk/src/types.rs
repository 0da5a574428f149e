//! Lending program argument and account field types.
//!
//! Each type has a `layout()` describing its wire shape and a strict
//! `from_value` that checks every field before building the Rust value.

use ledger_codec::{Address, CodecError, EnumValue, Layout, StructLayout, StructValue, UnionLayout, Value};
use ledger_fixed_point::{BigFractionBytes, Fraction};
use rust_decimal::Decimal;

use crate::error::SdkError;

// ---------------------------------------------------------------------------
// Structs
// ---------------------------------------------------------------------------

/// Slot of the last refresh and whether the owning account is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LastUpdate {
    pub slot: u64,
    pub stale: u8,
    pub price_status: u8,
    pub placeholder: [u8; 6],
}

impl LastUpdate {
    pub fn layout() -> StructLayout {
        StructLayout::new()
            .field("slot", Layout::U64)
            .field("stale", Layout::U8)
            .field("price_status", Layout::U8)
            .field("placeholder", Layout::Bytes(6))
    }

    pub fn from_value(value: &StructValue) -> Result<Self, CodecError> {
        Ok(Self {
            slot: value.field("slot")?.as_u64()?,
            stale: value.field("stale")?.as_u8()?,
            price_status: value.field("price_status")?.as_u8()?,
            placeholder: value.field("placeholder")?.as_byte_array()?,
        })
    }

    pub fn to_value(&self) -> StructValue {
        StructValue::new()
            .with("slot", self.slot)
            .with("stale", self.stale)
            .with("price_status", self.price_status)
            .with("placeholder", self.placeholder)
    }

    pub fn is_stale(&self) -> bool {
        self.stale != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ElevationGroup {
    pub max_liquidation_bonus_bps: u16,
    pub id: u8,
    pub ltv_pct: u8,
    pub liquidation_threshold_pct: u8,
    pub allow_new_loans: u8,
    pub max_reserves_as_collateral: u8,
    pub padding0: u8,
    pub debt_reserve: Address,
    pub padding1: [u64; 4],
}

impl ElevationGroup {
    pub fn layout() -> StructLayout {
        StructLayout::new()
            .field("max_liquidation_bonus_bps", Layout::U16)
            .field("id", Layout::U8)
            .field("ltv_pct", Layout::U8)
            .field("liquidation_threshold_pct", Layout::U8)
            .field("allow_new_loans", Layout::U8)
            .field("max_reserves_as_collateral", Layout::U8)
            .field("padding0", Layout::U8)
            .field("debt_reserve", Layout::Address)
            .field("padding1", Layout::array(Layout::U64, 4))
    }

    pub fn from_value(value: &StructValue) -> Result<Self, CodecError> {
        let padding = value.field("padding1")?.as_array()?;
        if padding.len() != 4 {
            return Err(CodecError::Shape(format!(
                "expected 4 elements, got {}",
                padding.len()
            )));
        }
        let mut padding1 = [0u64; 4];
        for (dst, v) in padding1.iter_mut().zip(padding) {
            *dst = v.as_u64()?;
        }
        Ok(Self {
            max_liquidation_bonus_bps: value.field("max_liquidation_bonus_bps")?.as_u16()?,
            id: value.field("id")?.as_u8()?,
            ltv_pct: value.field("ltv_pct")?.as_u8()?,
            liquidation_threshold_pct: value.field("liquidation_threshold_pct")?.as_u8()?,
            allow_new_loans: value.field("allow_new_loans")?.as_u8()?,
            max_reserves_as_collateral: value.field("max_reserves_as_collateral")?.as_u8()?,
            padding0: value.field("padding0")?.as_u8()?,
            debt_reserve: value.field("debt_reserve")?.as_address()?,
            padding1,
        })
    }

    pub fn to_value(&self) -> StructValue {
        StructValue::new()
            .with("max_liquidation_bonus_bps", self.max_liquidation_bonus_bps)
            .with("id", self.id)
            .with("ltv_pct", self.ltv_pct)
            .with("liquidation_threshold_pct", self.liquidation_threshold_pct)
            .with("allow_new_loans", self.allow_new_loans)
            .with("max_reserves_as_collateral", self.max_reserves_as_collateral)
            .with("padding0", self.padding0)
            .with("debt_reserve", self.debt_reserve)
            .with(
                "padding1",
                Value::Array(self.padding1.iter().map(|v| Value::from(*v)).collect()),
            )
    }
}

/// Obligation kind and index; also the first two obligation PDA seeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InitObligationArgs {
    pub tag: u8,
    pub id: u8,
}

impl InitObligationArgs {
    /// Plain deposit/borrow obligation.
    pub const VANILLA_TAG: u8 = 0;
    pub const MULTIPLY_TAG: u8 = 1;
    pub const LENDING_TAG: u8 = 2;
    pub const LEVERAGE_TAG: u8 = 3;

    pub fn layout() -> StructLayout {
        StructLayout::new()
            .field("tag", Layout::U8)
            .field("id", Layout::U8)
    }

    pub fn from_value(value: &StructValue) -> Result<Self, CodecError> {
        Ok(Self {
            tag: value.field("tag")?.as_u8()?,
            id: value.field("id")?.as_u8()?,
        })
    }

    pub fn to_value(&self) -> StructValue {
        StructValue::new().with("tag", self.tag).with("id", self.id)
    }
}

/// Items of the array field `name`, which must hold exactly `len`.
pub(crate) fn fixed_array<'v>(
    value: &'v StructValue,
    name: &str,
    len: usize,
) -> Result<&'v [Value], CodecError> {
    let items = value.field(name)?.as_array()?;
    if items.len() != len {
        return Err(CodecError::Shape(format!(
            "expected {len} elements in `{name}`, got {}",
            items.len()
        )));
    }
    Ok(items)
}

/// One deposit slot of an obligation. An all-zero reserve marks it unused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObligationCollateral {
    pub deposit_reserve: Address,
    pub deposited_amount: u64,
    pub market_value_sf: Fraction,
    pub borrowed_amount_against_this_collateral_in_elevation_group: u64,
}

impl ObligationCollateral {
    pub fn layout() -> StructLayout {
        StructLayout::new()
            .field("deposit_reserve", Layout::Address)
            .field("deposited_amount", Layout::U64)
            .field("market_value_sf", Layout::U128)
            .field(
                "borrowed_amount_against_this_collateral_in_elevation_group",
                Layout::U64,
            )
            .field("padding", Layout::array(Layout::U64, 9))
    }

    pub fn from_value(value: &StructValue) -> Result<Self, SdkError> {
        fixed_array(value, "padding", 9)?;
        Ok(Self {
            deposit_reserve: value.field("deposit_reserve")?.as_address()?,
            deposited_amount: value.field("deposited_amount")?.as_u64()?,
            market_value_sf: Fraction(value.field("market_value_sf")?.as_u128()?),
            borrowed_amount_against_this_collateral_in_elevation_group: value
                .field("borrowed_amount_against_this_collateral_in_elevation_group")?
                .as_u64()?,
        })
    }

    pub fn is_active(&self) -> bool {
        self.deposit_reserve != Address::default()
    }
}

/// One borrow slot of an obligation. An all-zero reserve marks it unused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObligationLiquidity {
    pub borrow_reserve: Address,
    pub cumulative_borrow_rate_bsf: BigFractionBytes,
    pub borrowed_amount_sf: Fraction,
    pub market_value_sf: Fraction,
    pub borrow_factor_adjusted_market_value_sf: Fraction,
    pub borrowed_amount_outside_elevation_groups: u64,
}

impl ObligationLiquidity {
    pub fn layout() -> StructLayout {
        StructLayout::new()
            .field("borrow_reserve", Layout::Address)
            .field(
                "cumulative_borrow_rate_bsf",
                Layout::Struct(BigFractionBytes::layout()),
            )
            .field("padding", Layout::U64)
            .field("borrowed_amount_sf", Layout::U128)
            .field("market_value_sf", Layout::U128)
            .field("borrow_factor_adjusted_market_value_sf", Layout::U128)
            .field("borrowed_amount_outside_elevation_groups", Layout::U64)
            .field("padding2", Layout::array(Layout::U64, 7))
    }

    pub fn from_value(value: &StructValue) -> Result<Self, SdkError> {
        value.field("padding")?.as_u64()?;
        fixed_array(value, "padding2", 7)?;
        Ok(Self {
            borrow_reserve: value.field("borrow_reserve")?.as_address()?,
            cumulative_borrow_rate_bsf: BigFractionBytes::from_value(
                value.field("cumulative_borrow_rate_bsf")?.as_struct()?,
            )?,
            borrowed_amount_sf: Fraction(value.field("borrowed_amount_sf")?.as_u128()?),
            market_value_sf: Fraction(value.field("market_value_sf")?.as_u128()?),
            borrow_factor_adjusted_market_value_sf: Fraction(
                value.field("borrow_factor_adjusted_market_value_sf")?.as_u128()?,
            ),
            borrowed_amount_outside_elevation_groups: value
                .field("borrowed_amount_outside_elevation_groups")?
                .as_u64()?,
        })
    }

    pub fn is_active(&self) -> bool {
        self.borrow_reserve != Address::default()
    }

    /// Borrow rate index at the last refresh of this slot.
    pub fn cumulative_borrow_rate(&self) -> Result<Decimal, SdkError> {
        Ok(self.cumulative_borrow_rate_bsf.to_fraction_decimal()?)
    }
}

/// Conditional order attached to an obligation; condition type 0 is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObligationOrder {
    pub condition_threshold_sf: Fraction,
    pub opportunity_parameter_sf: Fraction,
    pub min_execution_bonus_bps: u16,
    pub max_execution_bonus_bps: u16,
    pub condition_type: u8,
    pub opportunity_type: u8,
}

impl ObligationOrder {
    pub fn layout() -> StructLayout {
        StructLayout::new()
            .field("condition_threshold_sf", Layout::U128)
            .field("opportunity_parameter_sf", Layout::U128)
            .field("min_execution_bonus_bps", Layout::U16)
            .field("max_execution_bonus_bps", Layout::U16)
            .field("condition_type", Layout::U8)
            .field("opportunity_type", Layout::U8)
            .field("padding1", Layout::Bytes(10))
            .field("padding2", Layout::array(Layout::U128, 5))
    }

    pub fn from_value(value: &StructValue) -> Result<Self, SdkError> {
        value.field("padding1")?.as_byte_array::<10>()?;
        fixed_array(value, "padding2", 5)?;
        Ok(Self {
            condition_threshold_sf: Fraction(value.field("condition_threshold_sf")?.as_u128()?),
            opportunity_parameter_sf: Fraction(
                value.field("opportunity_parameter_sf")?.as_u128()?,
            ),
            min_execution_bonus_bps: value.field("min_execution_bonus_bps")?.as_u16()?,
            max_execution_bonus_bps: value.field("max_execution_bonus_bps")?.as_u16()?,
            condition_type: value.field("condition_type")?.as_u8()?,
            opportunity_type: value.field("opportunity_type")?.as_u8()?,
        })
    }

    pub fn is_active(&self) -> bool {
        self.condition_type != 0
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveFarmKind {
    Collateral,
    Debt,
}

impl ReserveFarmKind {
    pub fn layout() -> UnionLayout {
        UnionLayout::units("ReserveFarmKind", ["Collateral", "Debt"])
    }

    pub fn name(&self) -> &'static str {
        match self {
            ReserveFarmKind::Collateral => "Collateral",
            ReserveFarmKind::Debt => "Debt",
        }
    }

    pub fn from_value(value: &EnumValue) -> Result<Self, CodecError> {
        match value.variant.as_str() {
            "Collateral" => Ok(ReserveFarmKind::Collateral),
            "Debt" => Ok(ReserveFarmKind::Debt),
            other => Err(CodecError::Shape(format!("unknown ReserveFarmKind `{other}`"))),
        }
    }

    pub fn to_value(&self) -> EnumValue {
        EnumValue::unit(self.name())
    }
}

/// Reserve config fields an `update_reserve_config` call can target.
/// The position in this list is the wire tag.
pub const UPDATE_CONFIG_MODES: &[&str] = &[
    "UpdateLoanToValuePct",
    "UpdateMaxLiquidationBonusBps",
    "UpdateLiquidationThresholdPct",
    "UpdateProtocolLiquidationFee",
    "UpdateProtocolTakeRate",
    "UpdateFeesBorrowFee",
    "UpdateFeesFlashLoanFee",
    "DeprecatedUpdateFeesReferralFeeBps",
    "UpdateDepositLimit",
    "UpdateBorrowLimit",
    "UpdateTokenInfoLowerHeuristic",
    "UpdateTokenInfoUpperHeuristic",
    "UpdateTokenInfoExpHeuristic",
    "UpdateTokenInfoTwapDivergence",
    "UpdateTokenInfoScopeTwap",
    "UpdateTokenInfoScopeChain",
    "UpdateTokenInfoName",
    "UpdateTokenInfoPriceMaxAge",
    "UpdateTokenInfoTwapMaxAge",
    "UpdateScopePriceFeed",
    "UpdatePythPrice",
    "UpdateSwitchboardFeed",
    "UpdateSwitchboardTwapFeed",
    "UpdateBorrowRateCurve",
    "UpdateEntireReserveConfig",
    "UpdateDebtWithdrawalCap",
    "UpdateDepositWithdrawalCap",
    "DeprecatedUpdateDebtWithdrawalCapCurrentTotal",
    "DeprecatedUpdateDepositWithdrawalCapCurrentTotal",
    "UpdateBadDebtLiquidationBonusBps",
    "UpdateMinLiquidationBonusBps",
    "UpdateDeleveragingMarginCallPeriod",
    "UpdateBorrowFactor",
    "UpdateAssetTier",
    "UpdateElevationGroup",
    "UpdateDeleveragingThresholdDecreaseBpsPerDay",
    "DeprecatedUpdateMultiplierSideBoost",
    "DeprecatedUpdateMultiplierTagBoost",
    "UpdateReserveStatus",
    "UpdateFarmCollateral",
    "UpdateFarmDebt",
    "UpdateDisableUsageAsCollateralOutsideEmode",
    "UpdateBlockBorrowingAboveUtilizationPct",
    "UpdateBlockPriceUsage",
    "UpdateBorrowLimitOutsideElevationGroup",
    "UpdateBorrowLimitsInElevationGroupAgainstThisReserve",
    "UpdateHostFixedInterestRateBps",
    "UpdateAutodeleverageEnabled",
    "UpdateDeleveragingBonusIncreaseBpsPerDay",
    "UpdateProtocolOrderExecutionFee",
];

pub fn update_config_mode_layout() -> UnionLayout {
    UnionLayout::units("UpdateConfigMode", UPDATE_CONFIG_MODES.iter().copied())
}

/// Lending market fields an `update_lending_market` call can target.
/// `update_lending_market` sends the tag as a `u64`, not a union byte.
pub const UPDATE_LENDING_MARKET_MODES: &[&str] = &[
    "UpdateOwner",
    "UpdateEmergencyMode",
    "UpdateLiquidationCloseFactor",
    "UpdateLiquidationMaxValue",
    "DeprecatedUpdateGlobalUnhealthyBorrow",
    "UpdateGlobalAllowedBorrow",
    "UpdateRiskCouncil",
    "UpdateMinFullLiquidationThreshold",
    "UpdateInsolvencyRiskLtv",
    "UpdateElevationGroup",
    "UpdateReferralFeeBps",
    "DeprecatedUpdateMultiplierPoints",
    "UpdatePriceRefreshTriggerToMaxAgePct",
    "UpdateAutodeleverageEnabled",
    "UpdateBorrowingDisabled",
    "UpdateMinNetValueObligationPostAction",
    "UpdateMinValueLtvSkipPriorityLiqCheck",
    "UpdateMinValueBfSkipPriorityLiqCheck",
    "UpdatePaddingFields",
    "UpdateName",
    "UpdateIndividualAutodeleverageMarginCallPeriodSecs",
    "UpdateInitialDepositAmount",
    "UpdateObligationOrderExecutionEnabled",
    "UpdateImmutableFlag",
    "UpdateObligationOrderCreationEnabled",
];

/// The `u64` mode number for a lending market update.
pub fn lending_market_mode(name: &str) -> Result<u64, CodecError> {
    UPDATE_LENDING_MARKET_MODES
        .iter()
        .position(|m| *m == name)
        .map(|i| i as u64)
        .ok_or_else(|| CodecError::Shape(format!("unknown lending market mode `{name}`")))
}

/// Bytes an `update_lending_market` value occupies on the wire.
pub const LENDING_MARKET_VALUE_LEN: usize = 72;

/// Typed payload for `update_lending_market`, before zero-padding to
/// [`LENDING_MARKET_VALUE_LEN`] bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateLendingMarketConfigValue {
    Bool(bool),
    U8(u8),
    U8Array([u8; 8]),
    U16(u16),
    U64(u64),
    U128(u128),
    Pubkey(Address),
    ElevationGroup(ElevationGroup),
    Name([u8; 32]),
}

impl UpdateLendingMarketConfigValue {
    pub fn layout() -> UnionLayout {
        let one = |layout: Layout| StructLayout::new().field("_0", layout);
        UnionLayout::new("UpdateLendingMarketConfigValue")
            .variant("Bool", one(Layout::Bool))
            .variant("U8", one(Layout::U8))
            .variant("U8Array", one(Layout::Bytes(8)))
            .variant("U16", one(Layout::U16))
            .variant("U64", one(Layout::U64))
            .variant("U128", one(Layout::U128))
            .variant("Pubkey", one(Layout::Address))
            .variant("ElevationGroup", one(Layout::Struct(ElevationGroup::layout())))
            .variant("Name", one(Layout::Bytes(32)))
    }

    pub fn to_value(&self) -> EnumValue {
        let one = |name: &str, value: Value| EnumValue::new(name, StructValue::new().with("_0", value));
        match self {
            Self::Bool(v) => one("Bool", Value::from(*v)),
            Self::U8(v) => one("U8", Value::from(*v)),
            Self::U8Array(v) => one("U8Array", Value::from(*v)),
            Self::U16(v) => one("U16", Value::from(*v)),
            Self::U64(v) => one("U64", Value::from(*v)),
            Self::U128(v) => one("U128", Value::from(*v)),
            Self::Pubkey(v) => one("Pubkey", Value::from(*v)),
            Self::ElevationGroup(v) => one("ElevationGroup", Value::from(v.to_value())),
            Self::Name(v) => one("Name", Value::from(*v)),
        }
    }

    pub fn from_value(value: &EnumValue) -> Result<Self, CodecError> {
        let inner = value.fields.field("_0")?;
        Ok(match value.variant.as_str() {
            "Bool" => Self::Bool(inner.as_bool()?),
            "U8" => Self::U8(inner.as_u8()?),
            "U8Array" => Self::U8Array(inner.as_byte_array()?),
            "U16" => Self::U16(inner.as_u16()?),
            "U64" => Self::U64(inner.as_u64()?),
            "U128" => Self::U128(inner.as_u128()?),
            "Pubkey" => Self::Pubkey(inner.as_address()?),
            "ElevationGroup" => Self::ElevationGroup(ElevationGroup::from_value(inner.as_struct()?)?),
            "Name" => Self::Name(inner.as_byte_array()?),
            other => {
                return Err(CodecError::Shape(format!(
                    "unknown UpdateLendingMarketConfigValue `{other}`"
                )))
            }
        })
    }

    /// The raw little-endian payload, zero-padded to 72 bytes.
    pub fn to_padded_bytes(&self) -> Result<[u8; LENDING_MARKET_VALUE_LEN], CodecError> {
        let mut raw = Vec::with_capacity(LENDING_MARKET_VALUE_LEN);
        let value = self.to_value();
        let layout = Self::layout();
        let variant = layout
            .by_name(&value.variant)
            .ok_or_else(|| CodecError::Shape(format!("unknown variant `{}`", value.variant)))?;
        variant.fields.encode(&value.fields, &mut raw)?;
        if raw.len() > LENDING_MARKET_VALUE_LEN {
            return Err(CodecError::Shape(format!(
                "{} bytes exceed the {LENDING_MARKET_VALUE_LEN}-byte value slot",
                raw.len()
            )));
        }
        let mut out = [0u8; LENDING_MARKET_VALUE_LEN];
        out[..raw.len()].copy_from_slice(&raw);
        Ok(out)
    }
}
