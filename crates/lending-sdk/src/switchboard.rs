//! Oracle aggregator operations and round decoding.

use ledger_codec::{Layout, StructLayout, StructValue};
use ledger_fixed_point::{SwitchboardDecimal, TimestampedReading};
use ledger_instruction::{AccountSlot, InstructionSchema};

use crate::error::SdkError;
use crate::program::ProgramTable;

/// Oracles a single round can hold.
pub const MAX_ORACLES_PER_ROUND: usize = 16;

fn decimal() -> Layout {
    Layout::Struct(SwitchboardDecimal::layout())
}

// ---------------------------------------------------------------------------
// Parameter layouts
// ---------------------------------------------------------------------------

pub fn open_round_params() -> StructLayout {
    StructLayout::new()
        .field("state_bump", Layout::U8)
        .field("lease_bump", Layout::U8)
        .field("permission_bump", Layout::U8)
        .field("jitter", Layout::U8)
}

pub fn save_result_params() -> StructLayout {
    StructLayout::new()
        .field("oracle_idx", Layout::U32)
        .field("error", Layout::Bool)
        .field("value", decimal())
        .field("jobs_checksum", Layout::Bytes(32))
        .field("min_response", decimal())
        .field("max_response", decimal())
        .field("feed_permission_bump", Layout::U8)
        .field("oracle_permission_bump", Layout::U8)
        .field("lease_bump", Layout::U8)
        .field("state_bump", Layout::U8)
}

pub fn heartbeat_params() -> StructLayout {
    StructLayout::new().field("permission_bump", Layout::U8)
}

pub fn set_resolution_mode_params() -> StructLayout {
    StructLayout::new().field("mode", Layout::U8)
}

fn with_params(params: StructLayout) -> StructLayout {
    StructLayout::new().field("params", Layout::Struct(params))
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

pub fn aggregator_open_round() -> InstructionSchema {
    InstructionSchema::new(
        "aggregator_open_round",
        with_params(open_round_params()),
        &[
            AccountSlot::writable("aggregator"),
            AccountSlot::writable("lease"),
            AccountSlot::writable("oracle_queue"),
            AccountSlot::readonly("queue_authority"),
            AccountSlot::writable("permission"),
            AccountSlot::writable("escrow"),
            AccountSlot::readonly("program_state"),
            AccountSlot::writable("payout_wallet"),
            AccountSlot::readonly("token_program"),
            AccountSlot::readonly("data_buffer"),
            AccountSlot::readonly("mint"),
        ],
    )
}

pub fn aggregator_save_result() -> InstructionSchema {
    InstructionSchema::new(
        "aggregator_save_result",
        with_params(save_result_params()),
        &[
            AccountSlot::writable("aggregator"),
            AccountSlot::writable("oracle"),
            AccountSlot::readonly_signer("oracle_authority"),
            AccountSlot::readonly("oracle_queue"),
            AccountSlot::readonly("queue_authority"),
            AccountSlot::writable("feed_permission"),
            AccountSlot::readonly("oracle_permission"),
            AccountSlot::writable("lease"),
            AccountSlot::writable("escrow"),
            AccountSlot::readonly("token_program"),
            AccountSlot::readonly("program_state"),
            AccountSlot::writable("history_buffer"),
            AccountSlot::readonly("mint"),
        ],
    )
}

/// Its params struct has no fields, so the payload is the tag alone.
pub fn aggregator_set_authority() -> InstructionSchema {
    InstructionSchema::new(
        "aggregator_set_authority",
        with_params(StructLayout::new()),
        &[
            AccountSlot::writable("aggregator"),
            AccountSlot::readonly_signer("authority"),
            AccountSlot::readonly("new_authority"),
        ],
    )
}

pub fn oracle_heartbeat() -> InstructionSchema {
    InstructionSchema::new(
        "oracle_heartbeat",
        with_params(heartbeat_params()),
        &[
            AccountSlot::writable("oracle"),
            AccountSlot::readonly_signer("oracle_authority"),
            AccountSlot::readonly("token_account"),
            AccountSlot::writable("gc_oracle"),
            AccountSlot::writable("oracle_queue"),
            AccountSlot::readonly("permission"),
            AccountSlot::writable("data_buffer"),
        ],
    )
}

pub fn aggregator_set_resolution_mode() -> InstructionSchema {
    InstructionSchema::new(
        "aggregator_set_resolution_mode",
        with_params(set_resolution_mode_params()),
        &[
            AccountSlot::writable("aggregator"),
            AccountSlot::readonly_signer("authority"),
            AccountSlot::writable("sliding_window"),
            AccountSlot::writable_signer("payer"),
            AccountSlot::readonly("system_program"),
        ],
    )
}

pub fn schemas() -> Vec<InstructionSchema> {
    vec![
        aggregator_open_round(),
        aggregator_save_result(),
        aggregator_set_authority(),
        oracle_heartbeat(),
        aggregator_set_resolution_mode(),
    ]
}

pub fn table(program: ledger_codec::Address) -> Result<ProgramTable, SdkError> {
    ProgramTable::new(program, schemas())
}

// ---------------------------------------------------------------------------
// Rounds
// ---------------------------------------------------------------------------

/// One aggregation round as stored in the aggregator account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorRound {
    pub num_success: u32,
    pub num_error: u32,
    pub is_closed: bool,
    pub round_open_slot: u64,
    pub round_open_timestamp: i64,
    pub result: SwitchboardDecimal,
    pub std_deviation: SwitchboardDecimal,
    pub min_response: SwitchboardDecimal,
    pub max_response: SwitchboardDecimal,
}

impl AggregatorRound {
    /// Full on-chain layout, including the per-oracle tables this type
    /// does not keep.
    pub fn layout() -> StructLayout {
        let n = MAX_ORACLES_PER_ROUND;
        StructLayout::new()
            .field("num_success", Layout::U32)
            .field("num_error", Layout::U32)
            .field("is_closed", Layout::Bool)
            .field("round_open_slot", Layout::U64)
            .field("round_open_timestamp", Layout::I64)
            .field("result", decimal())
            .field("std_deviation", decimal())
            .field("min_response", decimal())
            .field("max_response", decimal())
            .field("oracle_pubkeys_data", Layout::array(Layout::Address, n))
            .field("medians_data", Layout::array(decimal(), n))
            .field("current_payout", Layout::array(Layout::I64, n))
            .field("medians_fulfilled", Layout::array(Layout::Bool, n))
            .field("errors_fulfilled", Layout::array(Layout::Bool, n))
    }

    pub fn from_value(value: &StructValue) -> Result<Self, SdkError> {
        let decimal = |name: &str| -> Result<SwitchboardDecimal, SdkError> {
            Ok(SwitchboardDecimal::from_value(value.field(name)?.as_struct()?)?)
        };
        Ok(Self {
            num_success: value.field("num_success")?.as_u32()?,
            num_error: value.field("num_error")?.as_u32()?,
            is_closed: value.field("is_closed")?.as_bool()?,
            round_open_slot: value.field("round_open_slot")?.as_u64()?,
            round_open_timestamp: value.field("round_open_timestamp")?.as_i64()?,
            result: decimal("result")?,
            std_deviation: decimal("std_deviation")?,
            min_response: decimal("min_response")?,
            max_response: decimal("max_response")?,
        })
    }

    /// Decode a round starting at `offset`; returns the round and the bytes
    /// it spans.
    pub fn decode(buf: &[u8], offset: usize) -> Result<(Self, usize), SdkError> {
        let (value, consumed) = Self::layout().decode(buf, offset)?;
        Ok((Self::from_value(&value)?, consumed))
    }

    pub fn to_reading(&self) -> TimestampedReading {
        TimestampedReading {
            value: self.result.to_scaled(),
            timestamp: self.round_open_timestamp,
            success_count: self.num_success,
        }
    }
}
