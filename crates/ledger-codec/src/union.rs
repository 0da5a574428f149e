//! Tagged unions: a one-byte variant tag followed by the variant's payload.
//!
//! Tags are part of the wire contract. A variant keeps its tag forever, so
//! new variants are only ever appended.

use std::collections::HashSet;

use crate::error::CodecError;
use crate::layout::{take, StructLayout};
use crate::value::{EnumValue, Value};

/// One variant of a [`UnionLayout`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub name: String,
    pub tag: u8,
    pub fields: StructLayout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionLayout {
    name: String,
    variants: Vec<Variant>,
    /// Variants appended after the positional tags ran out.
    overflow: Vec<String>,
}

impl UnionLayout {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variants: Vec::new(),
            overflow: Vec::new(),
        }
    }

    /// Append a variant whose tag is its declaration index.
    ///
    /// Past the 256th variant nothing is appended: the name is unknown to
    /// encode and decode, and [`validate`](Self::validate) reports it.
    pub fn variant(mut self, name: impl Into<String>, fields: StructLayout) -> Self {
        match u8::try_from(self.variants.len()) {
            Ok(tag) => self.tagged_variant(name, tag, fields),
            Err(_) => {
                self.overflow.push(name.into());
                self
            }
        }
    }

    /// Append a variant with no payload.
    pub fn unit(self, name: impl Into<String>) -> Self {
        self.variant(name, StructLayout::new())
    }

    /// Append a variant with an explicit tag.
    pub fn tagged_variant(mut self, name: impl Into<String>, tag: u8, fields: StructLayout) -> Self {
        self.variants.push(Variant {
            name: name.into(),
            tag,
            fields,
        });
        self
    }

    /// A union whose variants all carry no payload, tagged by position.
    pub fn units<'a>(name: impl Into<String>, variants: impl IntoIterator<Item = &'a str>) -> Self {
        variants
            .into_iter()
            .fold(Self::new(name), |union, variant| union.unit(variant))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    pub fn by_name(&self, name: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.name == name)
    }

    pub fn by_tag(&self, tag: u8) -> Option<&Variant> {
        self.variants.iter().find(|v| v.tag == tag)
    }

    /// Reject duplicate names or tags, and variants past the last tag.
    pub fn validate(&self) -> Result<(), CodecError> {
        if let Some(first) = self.overflow.first() {
            return Err(CodecError::Shape(format!(
                "no tag left for variant `{first}` in {} ({} variants dropped)",
                self.name,
                self.overflow.len()
            )));
        }
        let mut names = HashSet::new();
        let mut tags = HashSet::new();
        for v in &self.variants {
            if !names.insert(v.name.as_str()) {
                return Err(CodecError::Shape(format!(
                    "duplicate variant `{}` in {}",
                    v.name, self.name
                )));
            }
            if !tags.insert(v.tag) {
                return Err(CodecError::Shape(format!(
                    "duplicate tag {} in {}",
                    v.tag, self.name
                )));
            }
        }
        Ok(())
    }

    /// `1 + payload` when every variant has the same static payload size.
    pub fn fixed_size(&self) -> Option<usize> {
        let mut sizes = self.variants.iter().map(|v| v.fields.fixed_size());
        let first = sizes.next()??;
        sizes
            .all(|s| s == Some(first))
            .then_some(1 + first)
    }

    pub fn size_of(&self, value: &Value) -> Result<usize, CodecError> {
        let (variant, fields) = self.resolve(value)?;
        Ok(1 + variant.fields.size_of(fields)?)
    }

    /// Encode one variant into a fresh buffer.
    pub fn encode(&self, value: &EnumValue) -> Result<Vec<u8>, CodecError> {
        let value = Value::Enum(value.clone());
        let mut out = Vec::with_capacity(self.size_of(&value)?);
        self.encode_into(&value, &mut out)?;
        Ok(out)
    }

    /// Decode one variant at `offset`, returning it with the bytes consumed.
    pub fn decode(&self, buf: &[u8], offset: usize) -> Result<(EnumValue, usize), CodecError> {
        let mut pos = offset;
        let value = match self.decode_at(buf, &mut pos)? {
            Value::Enum(v) => v,
            other => {
                return Err(CodecError::Decode(format!(
                    "expected enum, got {}",
                    other.kind_name()
                )))
            }
        };
        Ok((value, pos - offset))
    }

    pub(crate) fn encode_into(&self, value: &Value, out: &mut Vec<u8>) -> Result<(), CodecError> {
        let (variant, fields) = self.resolve(value)?;
        out.push(variant.tag);
        variant.fields.encode_into(fields, out)
    }

    pub(crate) fn decode_at(&self, buf: &[u8], pos: &mut usize) -> Result<Value, CodecError> {
        let [tag] = take::<1>(buf, pos)?;
        let variant = self.by_tag(tag).ok_or_else(|| {
            CodecError::Decode(format!("unknown tag {tag} for {}", self.name))
        })?;
        let fields = variant.fields.decode_at(buf, pos)?;
        Ok(Value::Enum(EnumValue::new(variant.name.clone(), fields)))
    }

    fn resolve<'v>(
        &self,
        value: &'v Value,
    ) -> Result<(&Variant, &'v crate::value::StructValue), CodecError> {
        let value = value.as_enum()?;
        let variant = self.by_name(&value.variant).ok_or_else(|| {
            CodecError::Shape(format!("unknown variant `{}` for {}", value.variant, self.name))
        })?;
        Ok((variant, &value.fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::layout::Layout;
    use crate::value::StructValue;

    fn farm_kind() -> UnionLayout {
        UnionLayout::units("ReserveFarmKind", ["Collateral", "Debt"])
    }

    fn config_value() -> UnionLayout {
        UnionLayout::new("ConfigValue")
            .variant("Bool", StructLayout::new().field("_0", Layout::Bool))
            .variant("U16", StructLayout::new().field("_0", Layout::U16))
            .variant("Pubkey", StructLayout::new().field("_0", Layout::Address))
            .unit("Reset")
    }

    #[test]
    fn sequential_tags() {
        let union = config_value();
        let tags: Vec<u8> = union.variants().iter().map(|v| v.tag).collect();
        assert_eq!(tags, [0, 1, 2, 3]);
        union.validate().unwrap();
    }

    #[test]
    fn zero_field_variant_is_tag_only() {
        let bytes = farm_kind().encode(&EnumValue::unit("Debt")).unwrap();
        assert_eq!(bytes, [1]);
        let (decoded, consumed) = farm_kind().decode(&bytes, 0).unwrap();
        assert_eq!(decoded, EnumValue::unit("Debt"));
        assert_eq!(consumed, 1);
    }

    #[test]
    fn payload_follows_tag() {
        let value = EnumValue::new("U16", StructValue::new().with("_0", 0x0201u16));
        let bytes = config_value().encode(&value).unwrap();
        assert_eq!(bytes, [1, 0x01, 0x02]);
        assert_eq!(config_value().decode(&bytes, 0).unwrap().0, value);
    }

    #[test]
    fn every_variant_roundtrips() {
        let union = config_value();
        let values = [
            EnumValue::new("Bool", StructValue::new().with("_0", true)),
            EnumValue::new("U16", StructValue::new().with("_0", 9u16)),
            EnumValue::new(
                "Pubkey",
                StructValue::new().with("_0", Address::new_from_array([3; 32])),
            ),
            EnumValue::unit("Reset"),
        ];
        for value in values {
            let bytes = union.encode(&value).unwrap();
            assert_eq!(union.decode(&bytes, 0).unwrap(), (value, bytes.len()));
        }
    }

    #[test]
    fn unknown_tag_is_decode_error() {
        let err = farm_kind().decode(&[2], 0).unwrap_err();
        assert_eq!(
            err,
            CodecError::Decode("unknown tag 2 for ReserveFarmKind".into())
        );
    }

    #[test]
    fn unknown_variant_name_is_shape_error() {
        let err = farm_kind().encode(&EnumValue::unit("Supply")).unwrap_err();
        assert!(matches!(err, CodecError::Shape(_)));
    }

    #[test]
    fn empty_buffer_is_truncated() {
        let err = farm_kind().decode(&[], 0).unwrap_err();
        assert!(matches!(err, CodecError::TruncatedBuffer { .. }));
    }

    #[test]
    fn explicit_tags_are_honoured() {
        let union = UnionLayout::new("Sparse")
            .tagged_variant("A", 10, StructLayout::new())
            .tagged_variant("B", 20, StructLayout::new());
        assert_eq!(union.encode(&EnumValue::unit("B")).unwrap(), [20]);
        assert_eq!(union.decode(&[10], 0).unwrap().0, EnumValue::unit("A"));
    }

    #[test]
    fn duplicate_tags_fail_validation() {
        let union = UnionLayout::new("Dup")
            .tagged_variant("A", 1, StructLayout::new())
            .tagged_variant("B", 1, StructLayout::new());
        assert!(union.validate().is_err());
    }

    #[test]
    fn tags_never_wrap_past_255() {
        let union = (0..257).fold(UnionLayout::new("Wide"), |u, i| {
            u.variant(format!("V{i}"), StructLayout::new())
        });
        assert_eq!(union.variants().len(), 256);
        assert_eq!(union.by_name("V255").map(|v| v.tag), Some(255));
        assert!(union.by_name("V256").is_none());
        assert!(matches!(union.validate(), Err(CodecError::Shape(_))));
        assert!(union.encode(&EnumValue::unit("V256")).is_err());
        assert_eq!(union.decode(&[0], 0).unwrap().0, EnumValue::unit("V0"));
    }

    #[test]
    fn fixed_size_only_when_uniform() {
        assert_eq!(farm_kind().fixed_size(), Some(1));
        assert_eq!(config_value().fixed_size(), None);
    }

    #[test]
    fn union_inside_struct() {
        let layout = Layout::Struct(
            StructLayout::new()
                .field("kind", Layout::Union(farm_kind()))
                .field("amount", Layout::U64),
        );
        let value = Value::Struct(
            StructValue::new()
                .with("kind", EnumValue::unit("Collateral"))
                .with("amount", 3u64),
        );
        let bytes = layout.encode_to_vec(&value).unwrap();
        assert_eq!(bytes[0], 0);
        assert_eq!(layout.decode(&bytes, 0).unwrap().0, value);
    }
}
