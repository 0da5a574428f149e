use thiserror::Error;

/// Errors raised while encoding or decoding wire values.
///
/// Every encode/decode call either succeeds completely or returns one of
/// these; there is no partially-written result the caller can rely on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A value does not fit the declared integer width (or sign).
    #[error("value {value} out of range for {kind}")]
    Range { kind: &'static str, value: String },

    /// Array/struct arity or value kind does not match the layout.
    #[error("shape mismatch: {0}")]
    Shape(String),

    /// Not enough bytes left to decode what the layout declares.
    #[error("truncated buffer: need {needed} bytes at offset {offset}, {available} available")]
    TruncatedBuffer {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// The leading tag bytes do not belong to any registered kind.
    #[error("unrecognized discriminator: {0}")]
    UnrecognizedDiscriminator(String),

    /// No discriminator is registered under this operation or account name.
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    /// Two registry entries would share the same tag.
    #[error("duplicate discriminator {discriminator} for {name}")]
    DuplicateDiscriminator { name: String, discriminator: String },

    /// Unknown union tag, invalid bool/option byte, bad UTF-8, ...
    #[error("decode error: {0}")]
    Decode(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("json error: {0}")]
    Json(String),
}

impl CodecError {
    pub(crate) fn range(kind: &'static str, value: impl ToString) -> Self {
        CodecError::Range {
            kind,
            value: value.to_string(),
        }
    }

    pub(crate) fn truncated(offset: usize, needed: usize, buf_len: usize) -> Self {
        CodecError::TruncatedBuffer {
            offset,
            needed,
            available: buf_len.saturating_sub(offset),
        }
    }
}
