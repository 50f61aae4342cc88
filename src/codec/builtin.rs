//! Built-in encoders and decoders.
//!
//! Encoders return payloads that may still contain native values; the codec
//! encodes those recursively. Decoders receive payloads whose children have
//! already been decoded.

use std::collections::BTreeMap;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use ipnet::{Ipv4Net, Ipv6Net};

use crate::codec::charset;
use crate::codec::registry::Registry;
use crate::codec::value::{canonicalize, Kind, Pattern, Value};
use crate::error::CodecError;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Registers every built-in kind on the registry.
pub(crate) fn install(registry: &Registry) {
    registry.insert_builtin(Kind::Set, encode_collection, |payload| {
        Ok(Value::set(expect_list(Kind::Set, payload)?))
    });
    registry.insert_builtin(Kind::FrozenSet, encode_collection, |payload| {
        Ok(Value::frozen_set(expect_list(Kind::FrozenSet, payload)?))
    });
    registry.insert_builtin(Kind::Deque, encode_deque, decode_deque);
    registry.insert_builtin(Kind::Bytes, encode_bytes, decode_bytes);
    registry.insert_builtin(Kind::Pattern, encode_pattern, decode_pattern);
    registry.insert_builtin(Kind::TimeDelta, encode_timedelta, decode_timedelta);

    registry.insert_builtin(Kind::Time, encode_display, |payload| {
        parse_str(Kind::Time, payload, NaiveTime::from_str).map(Value::Time)
    });
    registry.insert_builtin(Kind::Date, encode_display, |payload| {
        parse_str(Kind::Date, payload, NaiveDate::from_str).map(Value::Date)
    });
    registry.insert_builtin(Kind::DateTime, encode_display, |payload| {
        parse_str(Kind::DateTime, payload, |s| {
            NaiveDateTime::parse_from_str(s, DATETIME_FORMAT).or_else(|_| s.parse())
        })
        .map(Value::DateTime)
    });
    registry.insert_builtin(Kind::Decimal, encode_display, |payload| {
        parse_str(Kind::Decimal, payload, rust_decimal::Decimal::from_str).map(Value::Decimal)
    });
    registry.insert_builtin(Kind::Uuid, encode_display, |payload| {
        parse_str(Kind::Uuid, payload, uuid::Uuid::parse_str).map(Value::Uuid)
    });
    registry.insert_builtin(Kind::Path, encode_display, |payload| {
        expect_str(Kind::Path, payload).map(|s| Value::Path(s.into()))
    });
    registry.insert_builtin(Kind::Ipv4Address, encode_display, |payload| {
        parse_str(Kind::Ipv4Address, payload, str::parse::<Ipv4Addr>).map(Value::Ipv4Address)
    });
    registry.insert_builtin(Kind::Ipv4Interface, encode_display, |payload| {
        parse_str(Kind::Ipv4Interface, payload, str::parse::<Ipv4Net>).map(Value::Ipv4Interface)
    });
    registry.insert_builtin(Kind::Ipv4Network, encode_display, |payload| {
        parse_str(Kind::Ipv4Network, payload, str::parse::<Ipv4Net>)
            .map(|net| Value::Ipv4Network(net.trunc()))
    });
    registry.insert_builtin(Kind::Ipv6Address, encode_display, |payload| {
        parse_str(Kind::Ipv6Address, payload, str::parse::<Ipv6Addr>).map(Value::Ipv6Address)
    });
    registry.insert_builtin(Kind::Ipv6Interface, encode_display, |payload| {
        parse_str(Kind::Ipv6Interface, payload, str::parse::<Ipv6Net>).map(Value::Ipv6Interface)
    });
    registry.insert_builtin(Kind::Ipv6Network, encode_display, |payload| {
        parse_str(Kind::Ipv6Network, payload, str::parse::<Ipv6Net>)
            .map(|net| Value::Ipv6Network(net.trunc()))
    });
}

// == Encoders ==
fn mismatch(value: &Value) -> CodecError {
    CodecError::UnknownEncoder {
        type_name: value.type_name().to_string(),
    }
}

fn encode_collection(value: &Value) -> Result<Value, CodecError> {
    match value {
        Value::Set(items) | Value::FrozenSet(items) => {
            Ok(Value::List(canonicalize(items.iter().cloned())))
        }
        other => Err(mismatch(other)),
    }
}

fn encode_deque(value: &Value) -> Result<Value, CodecError> {
    let Value::Deque { items, maxlen } = value else {
        return Err(mismatch(value));
    };
    let start = maxlen.map_or(0, |max| items.len().saturating_sub(max));
    let mut payload = BTreeMap::new();
    payload.insert("iterable".to_string(), Value::List(items[start..].to_vec()));
    payload.insert(
        "maxlen".to_string(),
        maxlen.map_or(Value::Null, |max| Value::Int(max as i64)),
    );
    Ok(Value::Map(payload))
}

fn encode_bytes(value: &Value) -> Result<Value, CodecError> {
    let Value::Bytes(raw) = value else {
        return Err(mismatch(value));
    };
    let (text, encoding) = charset::to_text(raw);
    let mut payload = BTreeMap::new();
    payload.insert("bytes".to_string(), Value::Str(text));
    payload.insert("encoding".to_string(), Value::Str(encoding));
    Ok(Value::Map(payload))
}

fn encode_pattern(value: &Value) -> Result<Value, CodecError> {
    let Value::Pattern(pattern) = value else {
        return Err(mismatch(value));
    };
    let mut payload = BTreeMap::new();
    payload.insert("flags".to_string(), Value::Int(i64::from(pattern.flags())));
    payload.insert("pattern".to_string(), Value::Str(pattern.as_str().to_string()));
    Ok(Value::Map(payload))
}

fn encode_timedelta(value: &Value) -> Result<Value, CodecError> {
    let Value::TimeDelta(delta) = value else {
        return Err(mismatch(value));
    };
    let micros = delta
        .num_microseconds()
        .ok_or_else(|| CodecError::invalid_payload(Kind::TimeDelta.tag(), "out of range"))?;
    if *delta != Duration::microseconds(micros) {
        return Err(CodecError::invalid_payload(
            Kind::TimeDelta.tag(),
            "sub-microsecond precision",
        ));
    }
    Ok(Value::Float(micros as f64 / 1_000_000.0))
}

/// Scalars whose payload is their canonical string form.
fn encode_display(value: &Value) -> Result<Value, CodecError> {
    let text = match value {
        Value::Time(t) => t.to_string(),
        Value::Date(d) => d.to_string(),
        Value::DateTime(dt) => dt.format(DATETIME_FORMAT).to_string(),
        Value::Decimal(d) => d.to_string(),
        Value::Uuid(u) => u.hyphenated().to_string(),
        Value::Path(p) => p
            .to_str()
            .ok_or_else(|| CodecError::invalid_payload(Kind::Path.tag(), "path is not UTF-8"))?
            .to_string(),
        Value::Ipv4Address(ip) => ip.to_string(),
        Value::Ipv4Interface(net) => net.to_string(),
        Value::Ipv4Network(net) => net.trunc().to_string(),
        Value::Ipv6Address(ip) => ip.to_string(),
        Value::Ipv6Interface(net) => net.to_string(),
        Value::Ipv6Network(net) => net.trunc().to_string(),
        other => return Err(mismatch(other)),
    };
    Ok(Value::Str(text))
}

// == Decoders ==
fn expect_list(kind: Kind, payload: Value) -> Result<Vec<Value>, CodecError> {
    match payload {
        Value::List(items) => Ok(items),
        other => Err(CodecError::invalid_payload(
            kind.tag(),
            format!("expected list, found {}", other.type_name()),
        )),
    }
}

fn expect_str(kind: Kind, payload: Value) -> Result<String, CodecError> {
    match payload {
        Value::Str(text) => Ok(text),
        other => Err(CodecError::invalid_payload(
            kind.tag(),
            format!("expected str, found {}", other.type_name()),
        )),
    }
}

fn expect_map(kind: Kind, payload: Value) -> Result<BTreeMap<String, Value>, CodecError> {
    match payload {
        Value::Map(map) => Ok(map),
        other => Err(CodecError::invalid_payload(
            kind.tag(),
            format!("expected map, found {}", other.type_name()),
        )),
    }
}

fn take_field(
    kind: Kind,
    map: &mut BTreeMap<String, Value>,
    field: &str,
) -> Result<Value, CodecError> {
    map.remove(field)
        .ok_or_else(|| CodecError::invalid_payload(kind.tag(), format!("missing field {field:?}")))
}

fn parse_str<T, E, F>(kind: Kind, payload: Value, parse: F) -> Result<T, CodecError>
where
    F: FnOnce(&str) -> Result<T, E>,
    E: std::fmt::Display,
{
    let text = expect_str(kind, payload)?;
    parse(&text).map_err(|err| CodecError::invalid_payload(kind.tag(), err.to_string()))
}

fn decode_deque(payload: Value) -> Result<Value, CodecError> {
    let mut map = expect_map(Kind::Deque, payload)?;
    let items = expect_list(Kind::Deque, take_field(Kind::Deque, &mut map, "iterable")?)?;
    let maxlen = match map.remove("maxlen").unwrap_or(Value::Null) {
        Value::Null => None,
        Value::Int(max) if max >= 0 => Some(max as usize),
        other => {
            return Err(CodecError::invalid_payload(
                Kind::Deque.tag(),
                format!("invalid maxlen {other:?}"),
            ))
        }
    };
    Ok(Value::deque(items, maxlen))
}

fn decode_bytes(payload: Value) -> Result<Value, CodecError> {
    let mut map = expect_map(Kind::Bytes, payload)?;
    let text = expect_str(Kind::Bytes, take_field(Kind::Bytes, &mut map, "bytes")?)?;
    let encoding = expect_str(Kind::Bytes, take_field(Kind::Bytes, &mut map, "encoding")?)?;
    charset::from_text(&text, &encoding)
        .map(Value::Bytes)
        .map_err(|reason| CodecError::invalid_payload(Kind::Bytes.tag(), reason))
}

fn decode_pattern(payload: Value) -> Result<Value, CodecError> {
    let mut map = expect_map(Kind::Pattern, payload)?;
    let pattern = expect_str(Kind::Pattern, take_field(Kind::Pattern, &mut map, "pattern")?)?;
    let flags = match take_field(Kind::Pattern, &mut map, "flags")? {
        Value::Int(flags) => u32::try_from(flags)
            .map_err(|_| CodecError::invalid_payload(Kind::Pattern.tag(), "invalid flags"))?,
        other => {
            return Err(CodecError::invalid_payload(
                Kind::Pattern.tag(),
                format!("invalid flags {other:?}"),
            ))
        }
    };
    Pattern::with_flags(&pattern, flags)
        .map(Value::Pattern)
        .map_err(|err| CodecError::invalid_payload(Kind::Pattern.tag(), err.to_string()))
}

fn decode_timedelta(payload: Value) -> Result<Value, CodecError> {
    let seconds = match payload {
        Value::Float(secs) => secs,
        Value::Int(secs) => secs as f64,
        other => {
            return Err(CodecError::invalid_payload(
                Kind::TimeDelta.tag(),
                format!("expected seconds, found {}", other.type_name()),
            ))
        }
    };
    Ok(Value::TimeDelta(Duration::microseconds(
        (seconds * 1_000_000.0).round() as i64,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Registry {
        Registry::with_builtins()
    }

    fn round_trip(value: Value) -> Value {
        let registry = registry();
        let key = value.type_key().unwrap();
        let (tag, payload) = registry.encode(key, &value).unwrap();
        registry.decode(&tag, payload).unwrap()
    }

    #[test]
    fn test_deque_payload_shape() {
        let value = Value::deque(vec![Value::Int(1), Value::Int(2)], Some(4));
        let (tag, payload) = registry()
            .encode(value.type_key().unwrap(), &value)
            .unwrap();
        assert_eq!(tag, "deque");
        let Value::Map(map) = payload else {
            panic!("deque payload should be a map");
        };
        assert_eq!(map["maxlen"], Value::Int(4));
        assert_eq!(map["iterable"], Value::List(vec![Value::Int(1), Value::Int(2)]));
    }

    #[test]
    fn test_timedelta_payload_is_seconds() {
        let value = Value::TimeDelta(Duration::seconds(60));
        let (_, payload) = registry()
            .encode(value.type_key().unwrap(), &value)
            .unwrap();
        assert_eq!(payload, Value::Float(60.0));
        assert_eq!(round_trip(value.clone()), value);
    }

    #[test]
    fn test_sub_microsecond_timedelta_rejected() {
        let value = Value::TimeDelta(Duration::nanoseconds(1_500));
        let err = registry()
            .encode(value.type_key().unwrap(), &value)
            .unwrap_err();
        assert!(matches!(err, CodecError::InvalidPayload { .. }));

        let exact = Value::TimeDelta(Duration::microseconds(1));
        assert_eq!(round_trip(exact.clone()), exact);
    }

    #[test]
    fn test_unordered_set_is_encoded_canonically() {
        let raw = Value::Set(vec![Value::Int(2), Value::Int(1), Value::Int(2)]);
        let (_, payload) = registry().encode(raw.type_key().unwrap(), &raw).unwrap();
        assert_eq!(payload, Value::List(vec![Value::Int(1), Value::Int(2)]));
        assert_eq!(round_trip(raw), Value::set([Value::Int(1), Value::Int(2)]));
    }

    #[test]
    fn test_overlong_deque_is_trimmed_on_encode() {
        let raw = Value::Deque {
            items: (1..=5).map(Value::Int).collect(),
            maxlen: Some(2),
        };
        let decoded = round_trip(raw);
        assert_eq!(decoded, Value::deque([Value::Int(4), Value::Int(5)], Some(2)));
    }

    #[test]
    fn test_network_host_bits_dropped_on_encode() {
        let v4 = Value::Ipv4Network("192.0.2.1/24".parse().unwrap());
        let (_, payload) = registry().encode(v4.type_key().unwrap(), &v4).unwrap();
        assert_eq!(payload, Value::Str("192.0.2.0/24".into()));
        assert_eq!(
            round_trip(v4),
            Value::Ipv4Network("192.0.2.0/24".parse().unwrap())
        );

        let v6 = Value::Ipv6Network("2001:db8::1/64".parse().unwrap());
        assert_eq!(
            round_trip(v6),
            Value::Ipv6Network("2001:db8::/64".parse().unwrap())
        );
    }

    #[test]
    fn test_datetime_accepts_iso_t_separator() {
        let decoded = registry()
            .decode("datetime", Value::Str("2023-07-09T17:34:53.149702".into()))
            .unwrap();
        let expected = NaiveDateTime::parse_from_str(
            "2023-07-09 17:34:53.149702",
            DATETIME_FORMAT,
        )
        .unwrap();
        assert_eq!(decoded, Value::DateTime(expected));
    }

    #[test]
    fn test_scalar_round_trips() {
        let values = vec![
            Value::Time(NaiveTime::from_hms_opt(10, 0, 0).unwrap()),
            Value::Date(NaiveDate::from_ymd_opt(2023, 7, 9).unwrap()),
            Value::Decimal(rust_decimal::Decimal::from_str("3.14159").unwrap()),
            Value::Uuid(uuid::Uuid::parse_str("aecd57c4-5bf2-433a-b642-08f75465d6b9").unwrap()),
            Value::Path(".".into()),
            Value::Ipv4Address("192.0.2.1".parse().unwrap()),
            Value::Ipv4Interface("192.0.2.1/24".parse().unwrap()),
            Value::Ipv4Network("192.0.2.0/24".parse().unwrap()),
            Value::Ipv6Address("2001:db8::".parse().unwrap()),
            Value::Ipv6Interface("2001:db8::1/64".parse().unwrap()),
            Value::Ipv6Network("2001:db8::/128".parse().unwrap()),
            Value::Pattern(Pattern::new(r"\s").unwrap()),
            Value::Bytes(vec![0xde, 0xad, 0xbe, 0xef]),
        ];
        for value in values {
            assert_eq!(round_trip(value.clone()), value);
        }
    }

    #[test]
    fn test_invalid_payloads() {
        let registry = registry();
        assert!(matches!(
            registry.decode("uuid", Value::Str("not-a-uuid".into())),
            Err(CodecError::InvalidPayload { .. })
        ));
        assert!(matches!(
            registry.decode("set", Value::Int(1)),
            Err(CodecError::InvalidPayload { .. })
        ));
        assert!(matches!(
            registry.decode("bytes", Value::Map(BTreeMap::new())),
            Err(CodecError::InvalidPayload { .. })
        ));
    }
}
