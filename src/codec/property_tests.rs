//! Property-Based Tests for Codec Module
//!
//! Uses proptest to check the round-trip law over generated value trees.

use proptest::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::codec::{Codec, Registry, Value};

// == Strategies ==
/// JSON-native scalars, finite floats only.
fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        (-1.0e12..1.0e12f64).prop_map(Value::Float),
        "[a-zA-Z0-9 _:]{0,16}".prop_map(Value::Str),
    ]
}

/// Non-JSON scalars covered by the built-in table.
fn tagged_scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        prop::collection::vec(any::<u8>(), 0..24).prop_map(Value::Bytes),
        (0u32..86_400, 0u32..1_000_000).prop_map(|(secs, micros)| {
            Value::Time(
                NaiveTime::from_num_seconds_from_midnight_opt(secs, micros * 1_000)
                    .unwrap_or_default(),
            )
        }),
        (1i32..9999, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| {
            Value::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default())
        }),
        (0i64..4_000_000_000, 0u32..1_000_000).prop_map(|(secs, micros)| {
            Value::DateTime(
                chrono::DateTime::from_timestamp(secs, micros * 1_000)
                    .map(|dt| dt.naive_utc())
                    .unwrap_or_else(NaiveDateTime::default),
            )
        }),
        (-1_000_000_000_000i64..1_000_000_000_000).prop_map(|micros| {
            Value::TimeDelta(Duration::microseconds(micros))
        }),
        any::<u128>().prop_map(|n| Value::Uuid(uuid::Uuid::from_u128(n))),
        any::<u32>().prop_map(|n| Value::Ipv4Address(n.into())),
        (any::<i64>(), 0u32..10).prop_map(|(n, scale)| {
            Value::Decimal(rust_decimal::Decimal::new(n, scale))
        }),
    ]
}

fn value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![scalar_strategy(), tagged_scalar_strategy()];
    leaf.prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::List),
            // Keys never collide with the tagged-value shape.
            prop::collection::btree_map("[a-c]{1,3}", inner.clone(), 0..4).prop_map(Value::Map),
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::set),
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::frozen_set),
            (prop::collection::vec(inner, 0..6), prop::option::of(0usize..8))
                .prop_map(|(items, maxlen)| Value::deque(items, maxlen)),
        ]
    })
}

fn codec() -> Codec {
    Codec::new(Arc::new(Registry::with_builtins()))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // For any value built from registered types, decode(encode(v)) == v.
    #[test]
    fn prop_round_trip(value in value_strategy()) {
        let codec = codec();
        let encoded = codec.encode(&value).unwrap();
        let decoded = codec.decode(&encoded).unwrap();
        prop_assert_eq!(decoded, value);
    }

    // Encoding is deterministic, and a second pass reproduces the same text.
    #[test]
    fn prop_encoding_is_stable(value in value_strategy()) {
        let codec = codec();
        let first = codec.encode(&value).unwrap();
        let second = codec.encode(&codec.decode(&first).unwrap()).unwrap();
        prop_assert_eq!(first, second);
    }

    // Sets encode identically regardless of insertion order.
    #[test]
    fn prop_set_order_is_canonical(items in prop::collection::vec(scalar_strategy(), 0..12)) {
        let codec = codec();
        let mut reversed = items.clone();
        reversed.reverse();
        prop_assert_eq!(
            codec.encode(&Value::set(items)).unwrap(),
            codec.encode(&Value::set(reversed)).unwrap()
        );
    }

    // Plain maps without the tagged shape decode back to maps.
    #[test]
    fn prop_plain_maps_untouched(entries in prop::collection::btree_map("[d-z]{1,6}", any::<i64>(), 0..6)) {
        let codec = codec();
        let map: BTreeMap<String, Value> =
            entries.into_iter().map(|(k, v)| (k, Value::Int(v))).collect();
        let value = Value::Map(map);
        prop_assert_eq!(codec.decode(&codec.encode(&value).unwrap()).unwrap(), value);
    }
}
