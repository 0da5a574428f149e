//! Property tests for the layout engine.
//!
//! A random layout tree is generated first, then random values that fit it.

use ledger_codec::{
    Address, CodecError, Discriminator, DiscriminatorRegistry, EnumValue, Layout, StructLayout,
    StructValue, UnionLayout, Value,
};
use proptest::prelude::*;

// =============================================================================
// STRATEGY GENERATORS
// =============================================================================

fn leaf_layout() -> impl Strategy<Value = Layout> {
    prop_oneof![
        Just(Layout::U8),
        Just(Layout::U16),
        Just(Layout::U32),
        Just(Layout::U64),
        Just(Layout::U128),
        Just(Layout::I8),
        Just(Layout::I16),
        Just(Layout::I32),
        Just(Layout::I64),
        Just(Layout::I128),
        Just(Layout::Bool),
        Just(Layout::Address),
        Just(Layout::ByteVec),
        Just(Layout::String),
        (0usize..8).prop_map(Layout::Bytes),
    ]
}

fn struct_of(layouts: Vec<Layout>) -> StructLayout {
    layouts
        .into_iter()
        .enumerate()
        .fold(StructLayout::new(), |s, (i, l)| s.field(format!("f{i}"), l))
}

fn arb_layout() -> impl Strategy<Value = Layout> {
    leaf_layout().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            inner.clone().prop_map(Layout::vec),
            (inner.clone(), 0usize..4).prop_map(|(l, n)| Layout::array(l, n)),
            // `Some(None)` and `None` share the JSON form `null`.
            inner
                .clone()
                .prop_filter("nested option", |l| !matches!(l, Layout::Option(_)))
                .prop_map(Layout::option),
            prop::collection::vec(inner.clone(), 0..4).prop_map(|ls| Layout::Struct(struct_of(ls))),
            prop::collection::vec(prop::collection::vec(inner, 0..3), 1..4).prop_map(|variants| {
                let union = variants
                    .into_iter()
                    .enumerate()
                    .fold(UnionLayout::new("Arb"), |u, (i, ls)| {
                        u.variant(format!("V{i}"), struct_of(ls))
                    });
                Layout::Union(union)
            }),
        ]
    })
}

fn struct_values(layout: &StructLayout) -> BoxedStrategy<StructValue> {
    let names: Vec<String> = layout.fields().iter().map(|f| f.name.clone()).collect();
    let values: Vec<BoxedStrategy<Value>> =
        layout.fields().iter().map(|f| value_for(&f.layout)).collect();
    values
        .prop_map(move |vals| {
            names
                .iter()
                .zip(vals)
                .fold(StructValue::new(), |s, (n, v)| s.with(n.clone(), v))
        })
        .boxed()
}

fn value_for(layout: &Layout) -> BoxedStrategy<Value> {
    match layout {
        Layout::U8 => any::<u8>().prop_map(Value::from).boxed(),
        Layout::U16 => any::<u16>().prop_map(Value::from).boxed(),
        Layout::U32 => any::<u32>().prop_map(Value::from).boxed(),
        Layout::U64 => any::<u64>().prop_map(Value::from).boxed(),
        Layout::U128 => any::<u128>().prop_map(Value::from).boxed(),
        Layout::I8 => any::<i8>().prop_map(Value::from).boxed(),
        Layout::I16 => any::<i16>().prop_map(Value::from).boxed(),
        Layout::I32 => any::<i32>().prop_map(Value::from).boxed(),
        Layout::I64 => any::<i64>().prop_map(Value::from).boxed(),
        Layout::I128 => any::<i128>().prop_map(Value::from).boxed(),
        Layout::Bool => any::<bool>().prop_map(Value::from).boxed(),
        Layout::Address => any::<[u8; 32]>()
            .prop_map(|b| Value::Address(Address::new_from_array(b)))
            .boxed(),
        Layout::Bytes(n) => prop::collection::vec(any::<u8>(), *n)
            .prop_map(Value::Bytes)
            .boxed(),
        Layout::ByteVec => prop::collection::vec(any::<u8>(), 0..16)
            .prop_map(Value::Bytes)
            .boxed(),
        Layout::String => "[a-zA-Z0-9 éü]{0,12}".prop_map(Value::String).boxed(),
        Layout::Array(inner, n) => prop::collection::vec(value_for(inner), *n)
            .prop_map(Value::Array)
            .boxed(),
        Layout::Vec(inner) => prop::collection::vec(value_for(inner), 0..4)
            .prop_map(Value::Array)
            .boxed(),
        Layout::Option(inner) => prop::option::of(value_for(inner))
            .prop_map(|o| Value::Option(o.map(Box::new)))
            .boxed(),
        Layout::Struct(s) => struct_values(s).prop_map(Value::Struct).boxed(),
        Layout::Union(u) => {
            let u = u.clone();
            (0..u.variants().len())
                .prop_flat_map(move |i| {
                    let variant = &u.variants()[i];
                    let name = variant.name.clone();
                    struct_values(&variant.fields)
                        .prop_map(move |fields| Value::Enum(EnumValue::new(name.clone(), fields)))
                })
                .boxed()
        }
    }
}

fn layout_and_value() -> impl Strategy<Value = (Layout, Value)> {
    arb_layout().prop_flat_map(|layout| {
        let values = value_for(&layout);
        (Just(layout), values)
    })
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    #[test]
    fn binary_roundtrip((layout, value) in layout_and_value()) {
        let bytes = layout.encode_to_vec(&value).unwrap();
        prop_assert_eq!(layout.size_of(&value).unwrap(), bytes.len());
        let (decoded, consumed) = layout.decode(&bytes, 0).unwrap();
        prop_assert_eq!(decoded, value);
        prop_assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn json_roundtrip((layout, value) in layout_and_value()) {
        let json = layout.to_json(&value).unwrap();
        prop_assert_eq!(layout.from_json(&json).unwrap(), value);
    }

    #[test]
    fn every_strict_prefix_is_truncated((layout, value) in layout_and_value()) {
        let bytes = layout.encode_to_vec(&value).unwrap();
        for cut in 0..bytes.len() {
            let result = layout.decode(&bytes[..cut], 0);
            prop_assert!(
                matches!(result, Err(CodecError::TruncatedBuffer { .. })),
                "prefix {} of {} decoded as {:?}", cut, bytes.len(), result
            );
        }
    }

    #[test]
    fn decoding_at_offset_ignores_leading_bytes(
        (layout, value) in layout_and_value(),
        junk in prop::collection::vec(any::<u8>(), 0..8),
    ) {
        let mut buf = junk.clone();
        layout.encode(&value, &mut buf).unwrap();
        let (decoded, consumed) = layout.decode(&buf, junk.len()).unwrap();
        prop_assert_eq!(decoded, value);
        prop_assert_eq!(consumed, buf.len() - junk.len());
    }

    #[test]
    fn unregistered_tag_is_never_matched(tag in any::<[u8; 8]>()) {
        let names = ["init_obligation", "refresh_reserve", "borrow_obligation_liquidity"];
        let mut registry = DiscriminatorRegistry::new();
        for name in names {
            registry.register(name, Discriminator::for_instruction(name)).unwrap();
        }
        let known = names.iter().any(|n| Discriminator::for_instruction(n).to_bytes() == tag);
        let result = registry.identify(&tag);
        if known {
            prop_assert!(result.is_ok());
        } else {
            prop_assert_eq!(
                result.unwrap_err(),
                CodecError::UnrecognizedDiscriminator(hex::encode(tag))
            );
        }
    }
}
