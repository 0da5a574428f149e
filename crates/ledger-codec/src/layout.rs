//! Composable field descriptors and the canonical binary wire format.
//!
//! Wire rules:
//! - integers are fixed width, little-endian
//! - `bool` is one byte, strictly `0` or `1`
//! - fixed arrays carry no length prefix
//! - vectors, byte vectors and strings carry a `u32` little-endian count
//! - options are a `0`/`1` presence byte followed by the payload
//! - unions are a one-byte tag followed by the variant's struct payload
//! - structs are their fields in declaration order, nothing in between

use crate::address::Address;
use crate::error::CodecError;
use crate::union::UnionLayout;
use crate::value::{StructValue, Value};

/// Wire shape of one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    U8,
    U16,
    U32,
    U64,
    U128,
    I8,
    I16,
    I32,
    I64,
    I128,
    Bool,
    /// Exactly `n` raw bytes.
    Bytes(usize),
    /// `u32` length followed by that many raw bytes.
    ByteVec,
    /// Exactly `n` elements of the inner layout.
    Array(Box<Layout>, usize),
    /// `u32` count followed by that many elements of the inner layout.
    Vec(Box<Layout>),
    /// `u32` length followed by UTF-8 bytes.
    String,
    Address,
    Option(Box<Layout>),
    Struct(StructLayout),
    Union(UnionLayout),
}

/// One named field of a [`StructLayout`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub layout: Layout,
}

/// Ordered fields. Declaration order is wire order.
///
/// Built once with [`StructLayout::field`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StructLayout {
    fields: Vec<Field>,
}

impl Layout {
    pub fn array(inner: Layout, len: usize) -> Self {
        Layout::Array(Box::new(inner), len)
    }

    pub fn vec(inner: Layout) -> Self {
        Layout::Vec(Box::new(inner))
    }

    pub fn option(inner: Layout) -> Self {
        Layout::Option(Box::new(inner))
    }

    /// Static encoded size, or `None` when it depends on the value.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            Layout::U8 | Layout::I8 | Layout::Bool => Some(1),
            Layout::U16 | Layout::I16 => Some(2),
            Layout::U32 | Layout::I32 => Some(4),
            Layout::U64 | Layout::I64 => Some(8),
            Layout::U128 | Layout::I128 => Some(16),
            Layout::Bytes(n) => Some(*n),
            Layout::Address => Some(Address::LEN),
            Layout::Array(inner, n) => inner.fixed_size().and_then(|s| s.checked_mul(*n)),
            Layout::Struct(s) => s.fixed_size(),
            Layout::Union(u) => u.fixed_size(),
            Layout::ByteVec | Layout::Vec(_) | Layout::String | Layout::Option(_) => None,
        }
    }

    /// Encoded size of `value` under this layout, without encoding it.
    pub fn size_of(&self, value: &Value) -> Result<usize, CodecError> {
        if let Some(size) = self.fixed_size() {
            return Ok(size);
        }
        match self {
            Layout::ByteVec => Ok(4 + value.as_bytes()?.len()),
            Layout::String => Ok(4 + value.as_str()?.len()),
            Layout::Vec(inner) => {
                let mut total = 4;
                for item in value.as_array()? {
                    total += inner.size_of(item)?;
                }
                Ok(total)
            }
            Layout::Array(inner, n) => {
                let items = value.as_array()?;
                check_arity(*n, items.len())?;
                let mut total = 0;
                for item in items {
                    total += inner.size_of(item)?;
                }
                Ok(total)
            }
            Layout::Option(inner) => match value.as_option()? {
                None => Ok(1),
                Some(v) => Ok(1 + inner.size_of(v)?),
            },
            Layout::Struct(s) => s.size_of(value.as_struct()?),
            Layout::Union(u) => u.size_of(value),
            _ => Err(CodecError::Shape("layout has no static size".into())),
        }
    }

    /// Append the encoding of `value` to `out`, returning the bytes written.
    ///
    /// On error `out` is truncated back to its original length.
    pub fn encode(&self, value: &Value, out: &mut Vec<u8>) -> Result<usize, CodecError> {
        let start = out.len();
        match self.encode_into(value, out) {
            Ok(()) => Ok(out.len() - start),
            Err(e) => {
                out.truncate(start);
                Err(e)
            }
        }
    }

    /// Encode into a fresh, exactly sized buffer.
    pub fn encode_to_vec(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::with_capacity(self.size_of(value)?);
        self.encode_into(value, &mut out)?;
        Ok(out)
    }

    /// Encode into `buf` starting at `offset`, returning the bytes written.
    ///
    /// Nothing is written unless the whole encoding fits.
    pub fn encode_at(
        &self,
        value: &Value,
        buf: &mut [u8],
        offset: usize,
    ) -> Result<usize, CodecError> {
        let bytes = self.encode_to_vec(value)?;
        let end = offset
            .checked_add(bytes.len())
            .filter(|end| *end <= buf.len())
            .ok_or_else(|| CodecError::truncated(offset, bytes.len(), buf.len()))?;
        buf[offset..end].copy_from_slice(&bytes);
        Ok(bytes.len())
    }

    /// Decode one value at `offset`, returning it with the bytes consumed.
    pub fn decode(&self, buf: &[u8], offset: usize) -> Result<(Value, usize), CodecError> {
        let mut pos = offset;
        let value = self.decode_at(buf, &mut pos)?;
        Ok((value, pos - offset))
    }

    pub(crate) fn encode_into(&self, value: &Value, out: &mut Vec<u8>) -> Result<(), CodecError> {
        match self {
            Layout::U8 => out.push(unsigned::<u8>(value, "u8")?),
            Layout::U16 => out.extend_from_slice(&unsigned::<u16>(value, "u16")?.to_le_bytes()),
            Layout::U32 => out.extend_from_slice(&unsigned::<u32>(value, "u32")?.to_le_bytes()),
            Layout::U64 => out.extend_from_slice(&unsigned::<u64>(value, "u64")?.to_le_bytes()),
            Layout::U128 => {
                out.extend_from_slice(&unsigned::<u128>(value, "u128")?.to_le_bytes())
            }
            Layout::I8 => out.extend_from_slice(&signed::<i8>(value, "i8")?.to_le_bytes()),
            Layout::I16 => out.extend_from_slice(&signed::<i16>(value, "i16")?.to_le_bytes()),
            Layout::I32 => out.extend_from_slice(&signed::<i32>(value, "i32")?.to_le_bytes()),
            Layout::I64 => out.extend_from_slice(&signed::<i64>(value, "i64")?.to_le_bytes()),
            Layout::I128 => out.extend_from_slice(&signed::<i128>(value, "i128")?.to_le_bytes()),
            Layout::Bool => out.push(u8::from(value.as_bool()?)),
            Layout::Bytes(n) => {
                let bytes = value.as_bytes()?;
                check_arity(*n, bytes.len())?;
                out.extend_from_slice(bytes);
            }
            Layout::ByteVec => {
                let bytes = value.as_bytes()?;
                write_len(bytes.len(), out)?;
                out.extend_from_slice(bytes);
            }
            Layout::Array(inner, n) => {
                let items = value.as_array()?;
                check_arity(*n, items.len())?;
                for item in items {
                    inner.encode_into(item, out)?;
                }
            }
            Layout::Vec(inner) => {
                let items = value.as_array()?;
                write_len(items.len(), out)?;
                for item in items {
                    inner.encode_into(item, out)?;
                }
            }
            Layout::String => {
                let s = value.as_str()?;
                write_len(s.len(), out)?;
                out.extend_from_slice(s.as_bytes());
            }
            Layout::Address => out.extend_from_slice(value.as_address()?.as_bytes()),
            Layout::Option(inner) => match value.as_option()? {
                None => out.push(0),
                Some(v) => {
                    out.push(1);
                    inner.encode_into(v, out)?;
                }
            },
            Layout::Struct(s) => s.encode_into(value.as_struct()?, out)?,
            Layout::Union(u) => u.encode_into(value, out)?,
        }
        Ok(())
    }

    pub(crate) fn decode_at(&self, buf: &[u8], pos: &mut usize) -> Result<Value, CodecError> {
        let value = match self {
            Layout::U8 => Value::Unsigned(take::<1>(buf, pos)?[0] as u128),
            Layout::U16 => Value::Unsigned(u16::from_le_bytes(take(buf, pos)?) as u128),
            Layout::U32 => Value::Unsigned(u32::from_le_bytes(take(buf, pos)?) as u128),
            Layout::U64 => Value::Unsigned(u64::from_le_bytes(take(buf, pos)?) as u128),
            Layout::U128 => Value::Unsigned(u128::from_le_bytes(take(buf, pos)?)),
            Layout::I8 => Value::Signed(i8::from_le_bytes(take(buf, pos)?) as i128),
            Layout::I16 => Value::Signed(i16::from_le_bytes(take(buf, pos)?) as i128),
            Layout::I32 => Value::Signed(i32::from_le_bytes(take(buf, pos)?) as i128),
            Layout::I64 => Value::Signed(i64::from_le_bytes(take(buf, pos)?) as i128),
            Layout::I128 => Value::Signed(i128::from_le_bytes(take(buf, pos)?)),
            Layout::Bool => match take::<1>(buf, pos)?[0] {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                b => return Err(CodecError::Decode(format!("invalid bool byte {b}"))),
            },
            Layout::Bytes(n) => Value::Bytes(take_slice(buf, pos, *n)?.to_vec()),
            Layout::ByteVec => {
                let len = read_len(buf, pos)?;
                Value::Bytes(take_slice(buf, pos, len)?.to_vec())
            }
            Layout::Array(inner, n) => {
                let mut items = Vec::with_capacity((*n).min(buf.len()));
                for _ in 0..*n {
                    items.push(inner.decode_at(buf, pos)?);
                }
                Value::Array(items)
            }
            Layout::Vec(inner) => {
                let len = read_len(buf, pos)?;
                // Zero-width elements consume nothing, so bound the count by
                // the bytes left.
                if inner.fixed_size() == Some(0) && len > buf.len() - *pos {
                    return Err(CodecError::truncated(*pos, len, buf.len()));
                }
                let mut items = Vec::with_capacity(len.min(buf.len() - *pos));
                for _ in 0..len {
                    items.push(inner.decode_at(buf, pos)?);
                }
                Value::Array(items)
            }
            Layout::String => {
                let len = read_len(buf, pos)?;
                let bytes = take_slice(buf, pos, len)?;
                let s = std::str::from_utf8(bytes)
                    .map_err(|e| CodecError::Decode(format!("invalid utf-8 string: {e}")))?;
                Value::String(s.to_string())
            }
            Layout::Address => Value::Address(Address::new_from_array(take(buf, pos)?)),
            Layout::Option(inner) => match take::<1>(buf, pos)?[0] {
                0 => Value::Option(None),
                1 => Value::Option(Some(Box::new(inner.decode_at(buf, pos)?))),
                b => return Err(CodecError::Decode(format!("invalid option tag {b}"))),
            },
            Layout::Struct(s) => Value::Struct(s.decode_at(buf, pos)?),
            Layout::Union(u) => u.decode_at(buf, pos)?,
        };
        Ok(value)
    }
}

impl StructLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field. Fields are encoded in the order they are added.
    pub fn field(mut self, name: impl Into<String>, layout: Layout) -> Self {
        self.fields.push(Field {
            name: name.into(),
            layout,
        });
        self
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fixed_size(&self) -> Option<usize> {
        self.fields
            .iter()
            .try_fold(0usize, |acc, f| acc.checked_add(f.layout.fixed_size()?))
    }

    pub fn size_of(&self, value: &StructValue) -> Result<usize, CodecError> {
        self.check_fields(value)?;
        let mut total = 0;
        for field in &self.fields {
            total += field.layout.size_of(value.field(&field.name)?)?;
        }
        Ok(total)
    }

    /// Append the encoding of `value` to `out`; truncates `out` on error.
    pub fn encode(&self, value: &StructValue, out: &mut Vec<u8>) -> Result<usize, CodecError> {
        let start = out.len();
        match self.encode_into(value, out) {
            Ok(()) => Ok(out.len() - start),
            Err(e) => {
                out.truncate(start);
                Err(e)
            }
        }
    }

    pub fn encode_to_vec(&self, value: &StructValue) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::with_capacity(self.size_of(value)?);
        self.encode_into(value, &mut out)?;
        Ok(out)
    }

    pub fn decode(&self, buf: &[u8], offset: usize) -> Result<(StructValue, usize), CodecError> {
        let mut pos = offset;
        let value = self.decode_at(buf, &mut pos)?;
        Ok((value, pos - offset))
    }

    pub(crate) fn encode_into(
        &self,
        value: &StructValue,
        out: &mut Vec<u8>,
    ) -> Result<(), CodecError> {
        self.check_fields(value)?;
        for field in &self.fields {
            field.layout.encode_into(value.field(&field.name)?, out)?;
        }
        Ok(())
    }

    pub(crate) fn decode_at(&self, buf: &[u8], pos: &mut usize) -> Result<StructValue, CodecError> {
        let mut value = StructValue::new();
        for field in &self.fields {
            let v = field.layout.decode_at(buf, pos)?;
            value.push(field.name.clone(), v);
        }
        Ok(value)
    }

    /// Every declared field must be present, and nothing else.
    fn check_fields(&self, value: &StructValue) -> Result<(), CodecError> {
        if let Some(extra) = value
            .names()
            .find(|name| !self.fields.iter().any(|f| f.name == *name))
        {
            return Err(CodecError::Shape(format!("unexpected field `{extra}`")));
        }
        if value.len() != self.fields.len() {
            return Err(CodecError::Shape(format!(
                "expected {} fields, got {}",
                self.fields.len(),
                value.len()
            )));
        }
        Ok(())
    }
}

pub(crate) fn unsigned<T: TryFrom<u128>>(value: &Value, kind: &'static str) -> Result<T, CodecError> {
    let v = match value {
        Value::Unsigned(v) => *v,
        Value::Signed(v) if *v >= 0 => *v as u128,
        Value::Signed(v) => return Err(CodecError::range(kind, v)),
        other => {
            return Err(CodecError::Shape(format!(
                "expected {kind}, got {}",
                other.kind_name()
            )))
        }
    };
    T::try_from(v).map_err(|_| CodecError::range(kind, v))
}

pub(crate) fn signed<T: TryFrom<i128>>(value: &Value, kind: &'static str) -> Result<T, CodecError> {
    let v = match value {
        Value::Signed(v) => *v,
        Value::Unsigned(v) => i128::try_from(*v).map_err(|_| CodecError::range(kind, v))?,
        other => {
            return Err(CodecError::Shape(format!(
                "expected {kind}, got {}",
                other.kind_name()
            )))
        }
    };
    T::try_from(v).map_err(|_| CodecError::range(kind, v))
}

fn check_arity(expected: usize, got: usize) -> Result<(), CodecError> {
    if expected != got {
        return Err(CodecError::Shape(format!(
            "expected {expected} elements, got {got}"
        )));
    }
    Ok(())
}

fn write_len(len: usize, out: &mut Vec<u8>) -> Result<(), CodecError> {
    let len = u32::try_from(len).map_err(|_| CodecError::range("u32 length prefix", len))?;
    out.extend_from_slice(&len.to_le_bytes());
    Ok(())
}

fn read_len(buf: &[u8], pos: &mut usize) -> Result<usize, CodecError> {
    Ok(u32::from_le_bytes(take(buf, pos)?) as usize)
}

pub(crate) fn take_slice<'a>(
    buf: &'a [u8],
    pos: &mut usize,
    n: usize,
) -> Result<&'a [u8], CodecError> {
    let start = *pos;
    let end = start
        .checked_add(n)
        .filter(|end| *end <= buf.len())
        .ok_or_else(|| CodecError::truncated(start, n, buf.len()))?;
    *pos = end;
    Ok(&buf[start..end])
}

pub(crate) fn take<const N: usize>(buf: &[u8], pos: &mut usize) -> Result<[u8; N], CodecError> {
    let mut arr = [0u8; N];
    arr.copy_from_slice(take_slice(buf, pos, N)?);
    Ok(arr)
}
