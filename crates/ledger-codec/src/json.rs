//! Lossless JSON interchange driven by a [`Layout`].
//!
//! - integers of 64 bits and wider are decimal strings; narrower ones are numbers
//! - addresses are Base58 strings
//! - byte arrays and byte vectors are arrays of numbers
//! - options are `null` or the inner value
//! - unions are `{"kind": "<Variant>"}` plus `"value": {...}` when the variant
//!   has fields

use serde_json::{Map, Value as Json};

use crate::address::Address;
use crate::error::CodecError;
use crate::layout::{signed, unsigned, Layout, StructLayout};
use crate::union::UnionLayout;
use crate::value::{EnumValue, StructValue, Value};

impl Layout {
    pub fn to_json(&self, value: &Value) -> Result<Json, CodecError> {
        let json = match self {
            Layout::U8 => Json::from(unsigned::<u8>(value, "u8")?),
            Layout::U16 => Json::from(unsigned::<u16>(value, "u16")?),
            Layout::U32 => Json::from(unsigned::<u32>(value, "u32")?),
            Layout::U64 => Json::String(unsigned::<u64>(value, "u64")?.to_string()),
            Layout::U128 => Json::String(unsigned::<u128>(value, "u128")?.to_string()),
            Layout::I8 => Json::from(signed::<i8>(value, "i8")?),
            Layout::I16 => Json::from(signed::<i16>(value, "i16")?),
            Layout::I32 => Json::from(signed::<i32>(value, "i32")?),
            Layout::I64 => Json::String(signed::<i64>(value, "i64")?.to_string()),
            Layout::I128 => Json::String(signed::<i128>(value, "i128")?.to_string()),
            Layout::Bool => Json::Bool(value.as_bool()?),
            Layout::Bytes(_) | Layout::ByteVec => {
                Json::Array(value.as_bytes()?.iter().map(|b| Json::from(*b)).collect())
            }
            Layout::Array(inner, _) | Layout::Vec(inner) => Json::Array(
                value
                    .as_array()?
                    .iter()
                    .map(|item| inner.to_json(item))
                    .collect::<Result<_, _>>()?,
            ),
            Layout::String => Json::String(value.as_str()?.to_string()),
            Layout::Address => Json::String(value.as_address()?.to_string()),
            Layout::Option(inner) => match value.as_option()? {
                None => Json::Null,
                Some(v) => inner.to_json(v)?,
            },
            Layout::Struct(s) => s.to_json(value.as_struct()?)?,
            Layout::Union(u) => u.to_json(value.as_enum()?)?,
        };
        Ok(json)
    }

    pub fn from_json(&self, json: &Json) -> Result<Value, CodecError> {
        let value = match self {
            Layout::U8 | Layout::U16 | Layout::U32 | Layout::U64 | Layout::U128 => {
                let value = Value::Unsigned(json_unsigned(json)?);
                // width check
                self.to_json(&value)?;
                value
            }
            Layout::I8 | Layout::I16 | Layout::I32 | Layout::I64 | Layout::I128 => {
                let value = Value::Signed(json_signed(json)?);
                self.to_json(&value)?;
                value
            }
            Layout::Bool => Value::Bool(json.as_bool().ok_or_else(|| mismatch("bool", json))?),
            Layout::Bytes(_) | Layout::ByteVec => {
                let items = json.as_array().ok_or_else(|| mismatch("byte array", json))?;
                let bytes = items
                    .iter()
                    .map(|item| {
                        let v = json_unsigned(item)?;
                        u8::try_from(v).map_err(|_| CodecError::range("u8", v))
                    })
                    .collect::<Result<Vec<u8>, _>>()?;
                Value::Bytes(bytes)
            }
            Layout::Array(inner, _) | Layout::Vec(inner) => {
                let items = json.as_array().ok_or_else(|| mismatch("array", json))?;
                Value::Array(
                    items
                        .iter()
                        .map(|item| inner.from_json(item))
                        .collect::<Result<_, _>>()?,
                )
            }
            Layout::String => Value::String(
                json.as_str()
                    .ok_or_else(|| mismatch("string", json))?
                    .to_string(),
            ),
            Layout::Address => {
                let s = json.as_str().ok_or_else(|| mismatch("address string", json))?;
                Value::Address(s.parse::<Address>()?)
            }
            Layout::Option(inner) => match json {
                Json::Null => Value::Option(None),
                other => Value::Option(Some(Box::new(inner.from_json(other)?))),
            },
            Layout::Struct(s) => Value::Struct(s.from_json(json)?),
            Layout::Union(u) => Value::Enum(u.from_json(json)?),
        };
        Ok(value)
    }
}

impl StructLayout {
    pub fn to_json(&self, value: &StructValue) -> Result<Json, CodecError> {
        let mut map = Map::new();
        for field in self.fields() {
            map.insert(field.name.clone(), field.layout.to_json(value.field(&field.name)?)?);
        }
        Ok(Json::Object(map))
    }

    pub fn from_json(&self, json: &Json) -> Result<StructValue, CodecError> {
        let map = json.as_object().ok_or_else(|| mismatch("object", json))?;
        if let Some(extra) = map
            .keys()
            .find(|key| !self.fields().iter().any(|f| f.name == **key))
        {
            return Err(CodecError::Shape(format!("unexpected field `{extra}`")));
        }
        let mut value = StructValue::new();
        for field in self.fields() {
            let item = map
                .get(&field.name)
                .ok_or_else(|| CodecError::Shape(format!("missing field `{}`", field.name)))?;
            value.push(field.name.clone(), field.layout.from_json(item)?);
        }
        Ok(value)
    }
}

impl UnionLayout {
    pub fn to_json(&self, value: &EnumValue) -> Result<Json, CodecError> {
        let variant = self.by_name(&value.variant).ok_or_else(|| {
            CodecError::Shape(format!("unknown variant `{}` for {}", value.variant, self.name()))
        })?;
        let mut map = Map::new();
        map.insert("kind".into(), Json::String(variant.name.clone()));
        if !variant.fields.is_empty() {
            map.insert("value".into(), variant.fields.to_json(&value.fields)?);
        }
        Ok(Json::Object(map))
    }

    pub fn from_json(&self, json: &Json) -> Result<EnumValue, CodecError> {
        let kind = json
            .get("kind")
            .and_then(Json::as_str)
            .ok_or_else(|| mismatch("object with a \"kind\" string", json))?;
        let variant = self.by_name(kind).ok_or_else(|| {
            CodecError::Shape(format!("unknown variant `{kind}` for {}", self.name()))
        })?;
        let fields = if variant.fields.is_empty() {
            StructValue::new()
        } else {
            let payload = json
                .get("value")
                .ok_or_else(|| CodecError::Shape(format!("variant `{kind}` needs a value")))?;
            variant.fields.from_json(payload)?
        };
        Ok(EnumValue::new(kind, fields))
    }
}

fn mismatch(expected: &str, got: &Json) -> CodecError {
    CodecError::Json(format!("expected {expected}, got {got}"))
}

fn json_unsigned(json: &Json) -> Result<u128, CodecError> {
    match json {
        Json::Number(n) => match n.as_u64() {
            Some(v) => Ok(v as u128),
            None => Err(CodecError::range("unsigned integer", n)),
        },
        Json::String(s) => s
            .parse::<u128>()
            .map_err(|_| CodecError::range("unsigned integer", s)),
        other => Err(mismatch("integer", other)),
    }
}

fn json_signed(json: &Json) -> Result<i128, CodecError> {
    match json {
        Json::Number(n) => match n.as_i64() {
            Some(v) => Ok(v as i128),
            None => Err(CodecError::range("signed integer", n)),
        },
        Json::String(s) => s
            .parse::<i128>()
            .map_err(|_| CodecError::range("signed integer", s)),
        other => Err(mismatch("integer", other)),
    }
}
