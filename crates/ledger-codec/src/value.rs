//! Dynamic values that flow through layouts.
//!
//! A [`Value`] is what a [`Layout`](crate::layout::Layout) encodes from and
//! decodes into. Integers are carried as `u128`/`i128` so that an
//! out-of-range value can be represented and rejected by the layout with a
//! range error instead of being truncated silently.

use crate::address::Address;
use crate::error::CodecError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    Unsigned(u128),
    Signed(i128),
    /// Fixed-size byte arrays and length-prefixed byte vectors.
    Bytes(Vec<u8>),
    /// Fixed-size arrays and length-prefixed vectors of a sub-layout.
    Array(Vec<Value>),
    String(String),
    Address(Address),
    Option(Option<Box<Value>>),
    Struct(StructValue),
    Enum(EnumValue),
}

/// Named fields in wire order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StructValue {
    fields: Vec<(String, Value)>,
}

impl StructValue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field append.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.fields.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Like [`get`](Self::get) but a missing field is a shape error.
    pub fn field(&self, name: &str) -> Result<&Value, CodecError> {
        self.get(name)
            .ok_or_else(|| CodecError::Shape(format!("missing field `{name}`")))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// One active variant of a tagged union, identified by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub variant: String,
    pub fields: StructValue,
}

impl EnumValue {
    pub fn new(variant: impl Into<String>, fields: StructValue) -> Self {
        Self {
            variant: variant.into(),
            fields,
        }
    }

    /// A variant that carries no payload.
    pub fn unit(variant: impl Into<String>) -> Self {
        Self::new(variant, StructValue::new())
    }
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Unsigned(_) => "unsigned integer",
            Value::Signed(_) => "signed integer",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::String(_) => "string",
            Value::Address(_) => "address",
            Value::Option(_) => "option",
            Value::Struct(_) => "struct",
            Value::Enum(_) => "enum",
        }
    }

    fn mismatch(&self, expected: &str) -> CodecError {
        CodecError::Shape(format!("expected {expected}, got {}", self.kind_name()))
    }

    pub fn as_bool(&self) -> Result<bool, CodecError> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(other.mismatch("bool")),
        }
    }

    pub fn as_u128(&self) -> Result<u128, CodecError> {
        match self {
            Value::Unsigned(v) => Ok(*v),
            Value::Signed(v) if *v >= 0 => Ok(*v as u128),
            Value::Signed(v) => Err(CodecError::range("u128", v)),
            other => Err(other.mismatch("integer")),
        }
    }

    pub fn as_i128(&self) -> Result<i128, CodecError> {
        match self {
            Value::Signed(v) => Ok(*v),
            Value::Unsigned(v) => i128::try_from(*v).map_err(|_| CodecError::range("i128", v)),
            other => Err(other.mismatch("integer")),
        }
    }

    pub fn as_u64(&self) -> Result<u64, CodecError> {
        let v = self.as_u128()?;
        u64::try_from(v).map_err(|_| CodecError::range("u64", v))
    }

    pub fn as_u32(&self) -> Result<u32, CodecError> {
        let v = self.as_u128()?;
        u32::try_from(v).map_err(|_| CodecError::range("u32", v))
    }

    pub fn as_u16(&self) -> Result<u16, CodecError> {
        let v = self.as_u128()?;
        u16::try_from(v).map_err(|_| CodecError::range("u16", v))
    }

    pub fn as_u8(&self) -> Result<u8, CodecError> {
        let v = self.as_u128()?;
        u8::try_from(v).map_err(|_| CodecError::range("u8", v))
    }

    pub fn as_i64(&self) -> Result<i64, CodecError> {
        let v = self.as_i128()?;
        i64::try_from(v).map_err(|_| CodecError::range("i64", v))
    }

    pub fn as_bytes(&self) -> Result<&[u8], CodecError> {
        match self {
            Value::Bytes(bytes) => Ok(bytes),
            other => Err(other.mismatch("bytes")),
        }
    }

    /// Fixed-size byte array of exactly `N` bytes.
    pub fn as_byte_array<const N: usize>(&self) -> Result<[u8; N], CodecError> {
        let bytes = self.as_bytes()?;
        bytes.try_into().map_err(|_| {
            CodecError::Shape(format!("expected {N} bytes, got {}", bytes.len()))
        })
    }

    pub fn as_array(&self) -> Result<&[Value], CodecError> {
        match self {
            Value::Array(items) => Ok(items),
            other => Err(other.mismatch("array")),
        }
    }

    pub fn as_str(&self) -> Result<&str, CodecError> {
        match self {
            Value::String(s) => Ok(s),
            other => Err(other.mismatch("string")),
        }
    }

    pub fn as_address(&self) -> Result<Address, CodecError> {
        match self {
            Value::Address(addr) => Ok(*addr),
            other => Err(other.mismatch("address")),
        }
    }

    pub fn as_option(&self) -> Result<Option<&Value>, CodecError> {
        match self {
            Value::Option(inner) => Ok(inner.as_deref()),
            other => Err(other.mismatch("option")),
        }
    }

    pub fn as_struct(&self) -> Result<&StructValue, CodecError> {
        match self {
            Value::Struct(fields) => Ok(fields),
            other => Err(other.mismatch("struct")),
        }
    }

    pub fn as_enum(&self) -> Result<&EnumValue, CodecError> {
        match self {
            Value::Enum(variant) => Ok(variant),
            other => Err(other.mismatch("enum")),
        }
    }
}

macro_rules! impl_from_unsigned {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::Unsigned(v as u128)
            }
        })*
    };
}

macro_rules! impl_from_signed {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::Signed(v as i128)
            }
        })*
    };
}

impl_from_unsigned!(u8, u16, u32, u64, u128);
impl_from_signed!(i8, i16, i32, i64, i128);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<Address> for Value {
    fn from(v: Address) -> Self {
        Value::Address(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl<const N: usize> From<[u8; N]> for Value {
    fn from(v: [u8; N]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<StructValue> for Value {
    fn from(v: StructValue) -> Self {
        Value::Struct(v)
    }
}

impl From<EnumValue> for Value {
    fn from(v: EnumValue) -> Self {
        Value::Enum(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        Value::Option(v.map(|inner| Box::new(inner.into())))
    }
}
