//! Value Module
//!
//! The native value model the codec converts to and from wire text.

use std::any::{Any, TypeId};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use ipnet::{Ipv4Net, Ipv6Net};
use regex::{Regex, RegexBuilder};
use rust_decimal::Decimal;
use uuid::Uuid;

// == Value ==
/// A value that can survive a round trip through a text-only store.
///
/// The first seven variants map directly onto JSON. Every other variant is
/// written as a tagged record and needs a registered encoder and decoder.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// Canonically ordered, deduplicated elements
    Set(Vec<Value>),
    /// Canonically ordered, deduplicated elements
    FrozenSet(Vec<Value>),
    Deque {
        items: Vec<Value>,
        maxlen: Option<usize>,
    },
    Bytes(Vec<u8>),
    Pattern(Pattern),
    Time(NaiveTime),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    TimeDelta(Duration),
    Decimal(Decimal),
    Uuid(Uuid),
    Path(PathBuf),
    Ipv4Address(Ipv4Addr),
    Ipv4Interface(Ipv4Net),
    Ipv4Network(Ipv4Net),
    Ipv6Address(Ipv6Addr),
    Ipv6Interface(Ipv6Net),
    Ipv6Network(Ipv6Net),
    Custom(Custom),
}

// == Kind ==
/// The built-in tagged types, used as encode-table keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    Set,
    FrozenSet,
    Deque,
    Bytes,
    Pattern,
    Time,
    Date,
    DateTime,
    TimeDelta,
    Decimal,
    Uuid,
    Path,
    Ipv4Address,
    Ipv4Interface,
    Ipv4Network,
    Ipv6Address,
    Ipv6Interface,
    Ipv6Network,
}

impl Kind {
    /// Every built-in kind, in registration order.
    pub const ALL: [Kind; 18] = [
        Kind::Set,
        Kind::FrozenSet,
        Kind::Deque,
        Kind::Bytes,
        Kind::Pattern,
        Kind::Time,
        Kind::Date,
        Kind::DateTime,
        Kind::TimeDelta,
        Kind::Decimal,
        Kind::Uuid,
        Kind::Path,
        Kind::Ipv4Address,
        Kind::Ipv4Interface,
        Kind::Ipv4Network,
        Kind::Ipv6Address,
        Kind::Ipv6Interface,
        Kind::Ipv6Network,
    ];

    /// The tag this kind is registered under by default.
    pub fn tag(self) -> &'static str {
        match self {
            Kind::Set => "set",
            Kind::FrozenSet => "frozenset",
            Kind::Deque => "deque",
            Kind::Bytes => "bytes",
            Kind::Pattern => "pattern",
            Kind::Time => "time",
            Kind::Date => "date",
            Kind::DateTime => "datetime",
            Kind::TimeDelta => "timedelta",
            Kind::Decimal => "decimal",
            Kind::Uuid => "uuid",
            Kind::Path => "posixpath",
            Kind::Ipv4Address => "ipv4address",
            Kind::Ipv4Interface => "ipv4interface",
            Kind::Ipv4Network => "ipv4network",
            Kind::Ipv6Address => "ipv6address",
            Kind::Ipv6Interface => "ipv6interface",
            Kind::Ipv6Network => "ipv6network",
        }
    }
}

/// Where the registry looks up the encoder for a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKey {
    Builtin(Kind),
    Custom(TypeId),
}

impl Value {
    // == Constructors ==
    /// Builds a set in canonical order.
    pub fn set(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Set(canonicalize(items))
    }

    /// Builds a frozen set in canonical order.
    pub fn frozen_set(items: impl IntoIterator<Item = Value>) -> Self {
        Value::FrozenSet(canonicalize(items))
    }

    /// Builds a deque, keeping only the last `maxlen` items when bounded.
    pub fn deque(items: impl IntoIterator<Item = Value>, maxlen: Option<usize>) -> Self {
        let mut items: Vec<Value> = items.into_iter().collect();
        if let Some(max) = maxlen {
            if items.len() > max {
                items.drain(..items.len() - max);
            }
        }
        Value::Deque { items, maxlen }
    }

    /// Wraps a user value; encoding it requires a registered serializer.
    pub fn custom<T>(value: T) -> Self
    where
        T: Any + fmt::Debug + PartialEq + Send + Sync,
    {
        Value::Custom(Custom::new(value))
    }

    // == Introspection ==
    /// The built-in kind, or `None` for JSON-native and custom values.
    pub fn kind(&self) -> Option<Kind> {
        let kind = match self {
            Value::Null
            | Value::Bool(_)
            | Value::Int(_)
            | Value::Float(_)
            | Value::Str(_)
            | Value::List(_)
            | Value::Map(_)
            | Value::Custom(_) => return None,
            Value::Set(_) => Kind::Set,
            Value::FrozenSet(_) => Kind::FrozenSet,
            Value::Deque { .. } => Kind::Deque,
            Value::Bytes(_) => Kind::Bytes,
            Value::Pattern(_) => Kind::Pattern,
            Value::Time(_) => Kind::Time,
            Value::Date(_) => Kind::Date,
            Value::DateTime(_) => Kind::DateTime,
            Value::TimeDelta(_) => Kind::TimeDelta,
            Value::Decimal(_) => Kind::Decimal,
            Value::Uuid(_) => Kind::Uuid,
            Value::Path(_) => Kind::Path,
            Value::Ipv4Address(_) => Kind::Ipv4Address,
            Value::Ipv4Interface(_) => Kind::Ipv4Interface,
            Value::Ipv4Network(_) => Kind::Ipv4Network,
            Value::Ipv6Address(_) => Kind::Ipv6Address,
            Value::Ipv6Interface(_) => Kind::Ipv6Interface,
            Value::Ipv6Network(_) => Kind::Ipv6Network,
        };
        Some(kind)
    }

    /// The encode-table key, or `None` for JSON-native values.
    pub fn type_key(&self) -> Option<TypeKey> {
        match self {
            Value::Custom(custom) => Some(TypeKey::Custom(custom.value_type_id())),
            other => other.kind().map(TypeKey::Builtin),
        }
    }

    /// Runtime type name, used for typed keys and error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Custom(custom) => custom.type_name(),
            other => other.kind().map(Kind::tag).unwrap_or("unknown"),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) | Value::Float(_) => 2,
            Value::Str(_) => 3,
            Value::List(_) => 4,
            Value::Map(_) => 5,
            Value::Custom(_) => 100,
            other => other.kind().map(|kind| 6 + kind as u8).unwrap_or(99),
        }
    }

    // == Canonical Ordering ==
    /// Total order used to lay out set elements deterministically.
    ///
    /// Ints and floats compare numerically; on a numeric tie the int sorts
    /// first, so `Equal` only ever holds for values that are `==`.
    pub fn canonical_cmp(&self, other: &Value) -> Ordering {
        use Value::*;

        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Int(a), Int(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Int(a), Float(b)) => (*a as f64).total_cmp(b).then(Ordering::Less),
            (Float(a), Int(b)) => a.total_cmp(&(*b as f64)).then(Ordering::Greater),
            (Str(a), Str(b)) => a.cmp(b),
            (List(a), List(b)) | (Set(a), Set(b)) | (FrozenSet(a), FrozenSet(b)) => {
                cmp_slices(a, b)
            }
            (Map(a), Map(b)) => a
                .iter()
                .zip(b.iter())
                .map(|((ka, va), (kb, vb))| ka.cmp(kb).then_with(|| va.canonical_cmp(vb)))
                .find(|ord| ord.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            (
                Deque {
                    items: a,
                    maxlen: ma,
                },
                Deque {
                    items: b,
                    maxlen: mb,
                },
            ) => cmp_slices(a, b).then(ma.cmp(mb)),
            (Bytes(a), Bytes(b)) => a.cmp(b),
            (Pattern(a), Pattern(b)) => a
                .as_str()
                .cmp(b.as_str())
                .then(a.flags().cmp(&b.flags())),
            (Time(a), Time(b)) => a.cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            (DateTime(a), DateTime(b)) => a.cmp(b),
            (TimeDelta(a), TimeDelta(b)) => a.cmp(b),
            (Decimal(a), Decimal(b)) => a.cmp(b),
            (Uuid(a), Uuid(b)) => a.cmp(b),
            (Path(a), Path(b)) => a.cmp(b),
            (Ipv4Address(a), Ipv4Address(b)) => a.cmp(b),
            (Ipv4Interface(a), Ipv4Interface(b)) | (Ipv4Network(a), Ipv4Network(b)) => a.cmp(b),
            (Ipv6Address(a), Ipv6Address(b)) => a.cmp(b),
            (Ipv6Interface(a), Ipv6Interface(b)) | (Ipv6Network(a), Ipv6Network(b)) => a.cmp(b),
            (Custom(a), Custom(b)) => a
                .type_name()
                .cmp(b.type_name())
                .then_with(|| format!("{:?}", a).cmp(&format!("{:?}", b))),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

fn cmp_slices(a: &[Value], b: &[Value]) -> Ordering {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| x.canonical_cmp(y))
        .find(|ord| ord.is_ne())
        .unwrap_or_else(|| a.len().cmp(&b.len()))
}

/// Sorts by canonical order and drops duplicates.
pub(crate) fn canonicalize(items: impl IntoIterator<Item = Value>) -> Vec<Value> {
    let mut items: Vec<Value> = items.into_iter().collect();
    items.sort_by(|a, b| a.canonical_cmp(b));

    // Custom values can tie without being equal; dedup within each run of ties.
    let mut unique: Vec<Value> = Vec::with_capacity(items.len());
    let mut run_start = 0;
    for item in items {
        match unique.last() {
            Some(last) if last.canonical_cmp(&item).is_eq() => {
                if unique[run_start..].contains(&item) {
                    continue;
                }
            }
            _ => run_start = unique.len(),
        }
        unique.push(item);
    }
    unique
}

// == Pattern ==
/// A compiled regular expression together with its integer flags.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
    flags: u32,
}

impl Pattern {
    pub const IGNORECASE: u32 = 2;
    pub const MULTILINE: u32 = 8;
    pub const DOTALL: u32 = 16;
    pub const UNICODE: u32 = 32;
    pub const VERBOSE: u32 = 64;

    /// Compiles a pattern with the default (unicode) flags.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Self::with_flags(pattern, Self::UNICODE)
    }

    /// Compiles a pattern, translating flags to regex builder options.
    pub fn with_flags(pattern: &str, flags: u32) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(flags & Self::IGNORECASE != 0)
            .multi_line(flags & Self::MULTILINE != 0)
            .dot_matches_new_line(flags & Self::DOTALL != 0)
            .ignore_whitespace(flags & Self::VERBOSE != 0)
            .build()?;
        Ok(Self { regex, flags })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn flags(&self) -> u32 {
        self.flags
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str() && self.flags == other.flags
    }
}

// == Custom ==
trait DynValue: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn eq_dyn(&self, other: &dyn DynValue) -> bool;
    fn type_name(&self) -> &'static str;
}

impl<T> DynValue for T
where
    T: Any + fmt::Debug + PartialEq + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_dyn(&self, other: &dyn DynValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .map_or(false, |other| self == other)
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A user-defined value carried inside [`Value::Custom`].
#[derive(Clone)]
pub struct Custom(Arc<dyn DynValue>);

impl Custom {
    pub fn new<T>(value: T) -> Self
    where
        T: Any + fmt::Debug + PartialEq + Send + Sync,
    {
        Custom(Arc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    pub fn type_name(&self) -> &'static str {
        self.0.type_name()
    }

    pub(crate) fn value_type_id(&self) -> TypeId {
        self.0.as_any().type_id()
    }
}

impl fmt::Debug for Custom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl PartialEq for Custom {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_dyn(&*other.0)
    }
}
