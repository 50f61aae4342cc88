//! Conversions between Rust types and [`Value`].

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::Hash;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::PathBuf;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use ipnet::{Ipv4Net, Ipv6Net};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::codec::value::{Pattern, Value};
use crate::error::CodecError;

// == Traits ==
/// Types that can be turned into a [`Value`].
pub trait ToValue {
    fn to_value(&self) -> Value;
}

/// Types that can be rebuilt from a decoded [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, CodecError>;
}

fn unexpected(expected: &'static str, found: &Value) -> CodecError {
    CodecError::UnexpectedValue {
        expected,
        found: found.type_name().to_string(),
    }
}

/// Implements [`ToValue`] and [`FromValue`] for a type with a registered
/// serializer, carrying it as [`Value::Custom`].
#[macro_export]
macro_rules! impl_custom_value {
    ($ty:ty) => {
        impl $crate::ToValue for $ty {
            fn to_value(&self) -> $crate::Value {
                $crate::Value::custom(::std::clone::Clone::clone(self))
            }
        }

        impl $crate::FromValue for $ty {
            fn from_value(value: $crate::Value) -> ::std::result::Result<Self, $crate::CodecError> {
                match &value {
                    $crate::Value::Custom(custom) => custom
                        .downcast_ref::<$ty>()
                        .cloned()
                        .ok_or_else(|| $crate::CodecError::UnexpectedValue {
                            expected: ::std::any::type_name::<$ty>(),
                            found: custom.type_name().to_string(),
                        }),
                    other => Err($crate::CodecError::UnexpectedValue {
                        expected: ::std::any::type_name::<$ty>(),
                        found: other.type_name().to_string(),
                    }),
                }
            }
        }
    };
}

// == Identity ==
impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, CodecError> {
        Ok(value)
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

// == Scalars ==
impl ToValue for () {
    fn to_value(&self) -> Value {
        Value::Null
    }
}

impl FromValue for () {
    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Null => Ok(()),
            other => Err(unexpected("null", &other)),
        }
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(unexpected("bool", &other)),
        }
    }
}

macro_rules! int_value {
    ($($ty:ty),*) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Value {
                    Value::Int(i64::from(*self))
                }
            }

            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self, CodecError> {
                    match value {
                        Value::Int(n) => <$ty>::try_from(n)
                            .map_err(|_| unexpected(stringify!($ty), &Value::Int(n))),
                        other => Err(unexpected(stringify!($ty), &other)),
                    }
                }
            }
        )*
    };
}

int_value!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! wide_uint_value {
    ($($ty:ty),*) => {
        $(
            /// Values beyond `i64::MAX` are carried as decimals.
            impl ToValue for $ty {
                fn to_value(&self) -> Value {
                    i64::try_from(*self)
                        .map(Value::Int)
                        .unwrap_or_else(|_| Value::Decimal(Decimal::from(*self)))
                }
            }

            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self, CodecError> {
                    let converted = match &value {
                        Value::Int(n) => <$ty>::try_from(*n).ok(),
                        Value::Decimal(d) if d.fract().is_zero() => d.to_u64().and_then(|n| <$ty>::try_from(n).ok()),
                        _ => None,
                    };
                    converted.ok_or_else(|| unexpected(stringify!($ty), &value))
                }
            }
        )*
    };
}

wide_uint_value!(u64, usize);

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Int(n) => Ok(n as f64),
            other => Err(unexpected("float", &other)),
        }
    }
}

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, CodecError> {
        f64::from_value(value).map(|f| f as f32)
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::Str(self.to_string())
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Str(self.clone())
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(unexpected("str", &other)),
        }
    }
}

// == Wrappers And Collections ==
impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, ToValue::to_value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Value {
        Value::List(self.iter().map(ToValue::to_value).collect())
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(unexpected("list", &other)),
        }
    }
}

/// Unbounded deque.
impl<T: ToValue> ToValue for VecDeque<T> {
    fn to_value(&self) -> Value {
        Value::deque(self.iter().map(ToValue::to_value), None)
    }
}

impl<T: FromValue> FromValue for VecDeque<T> {
    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Deque { items, .. } | Value::List(items) => {
                items.into_iter().map(T::from_value).collect()
            }
            other => Err(unexpected("deque", &other)),
        }
    }
}

fn set_items(value: Value) -> Result<Vec<Value>, CodecError> {
    match value {
        Value::Set(items) | Value::FrozenSet(items) | Value::List(items) => Ok(items),
        other => Err(unexpected("set", &other)),
    }
}

impl<T: ToValue> ToValue for HashSet<T> {
    fn to_value(&self) -> Value {
        Value::set(self.iter().map(ToValue::to_value))
    }
}

impl<T: FromValue + Eq + Hash> FromValue for HashSet<T> {
    fn from_value(value: Value) -> Result<Self, CodecError> {
        set_items(value)?.into_iter().map(T::from_value).collect()
    }
}

impl<T: ToValue> ToValue for BTreeSet<T> {
    fn to_value(&self) -> Value {
        Value::set(self.iter().map(ToValue::to_value))
    }
}

impl<T: FromValue + Ord> FromValue for BTreeSet<T> {
    fn from_value(value: Value) -> Result<Self, CodecError> {
        set_items(value)?.into_iter().map(T::from_value).collect()
    }
}

impl<T: ToValue> ToValue for BTreeMap<String, T> {
    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.clone(), v.to_value()))
                .collect(),
        )
    }
}

impl<T: FromValue> FromValue for BTreeMap<String, T> {
    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Map(map) => map
                .into_iter()
                .map(|(k, v)| T::from_value(v).map(|v| (k, v)))
                .collect(),
            other => Err(unexpected("map", &other)),
        }
    }
}

impl<T: ToValue> ToValue for HashMap<String, T> {
    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.clone(), v.to_value()))
                .collect(),
        )
    }
}

impl<T: FromValue> FromValue for HashMap<String, T> {
    fn from_value(value: Value) -> Result<Self, CodecError> {
        BTreeMap::<String, T>::from_value(value).map(|map| map.into_iter().collect())
    }
}

// == Binary ==
/// Raw bytes, carried as [`Value::Bytes`] rather than a list of ints.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Binary(pub Vec<u8>);

impl ToValue for Binary {
    fn to_value(&self) -> Value {
        Value::Bytes(self.0.clone())
    }
}

impl FromValue for Binary {
    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Bytes(raw) => Ok(Binary(raw)),
            other => Err(unexpected("bytes", &other)),
        }
    }
}

// == Tagged Scalars ==
macro_rules! variant_value {
    ($($ty:ty => $variant:ident, $expected:literal;)*) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Value {
                    Value::$variant(self.clone())
                }
            }

            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self, CodecError> {
                    match value {
                        Value::$variant(inner) => Ok(inner),
                        other => Err(unexpected($expected, &other)),
                    }
                }
            }
        )*
    };
}

variant_value! {
    NaiveTime => Time, "time";
    NaiveDate => Date, "date";
    NaiveDateTime => DateTime, "datetime";
    Decimal => Decimal, "decimal";
    Uuid => Uuid, "uuid";
    PathBuf => Path, "posixpath";
    Ipv4Addr => Ipv4Address, "ipv4address";
    Ipv6Addr => Ipv6Address, "ipv6address";
    Pattern => Pattern, "pattern";
}

/// Truncated to microseconds, the precision of the wire form.
impl ToValue for Duration {
    fn to_value(&self) -> Value {
        let micros = self.num_microseconds().unwrap_or(i64::MAX);
        Value::TimeDelta(Duration::microseconds(micros))
    }
}

impl FromValue for Duration {
    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::TimeDelta(delta) => Ok(delta),
            other => Err(unexpected("timedelta", &other)),
        }
    }
}

/// Carried as an interface; host bits are kept.
impl ToValue for Ipv4Net {
    fn to_value(&self) -> Value {
        Value::Ipv4Interface(*self)
    }
}

impl FromValue for Ipv4Net {
    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Ipv4Interface(net) | Value::Ipv4Network(net) => Ok(net),
            other => Err(unexpected("ipv4interface", &other)),
        }
    }
}

/// Carried as an interface; host bits are kept.
impl ToValue for Ipv6Net {
    fn to_value(&self) -> Value {
        Value::Ipv6Interface(*self)
    }
}

impl FromValue for Ipv6Net {
    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Ipv6Interface(net) | Value::Ipv6Network(net) => Ok(net),
            other => Err(unexpected("ipv6interface", &other)),
        }
    }
}
