//! Leaf values and raw nested mappings.
//!
//! [`Value`] is what an attribute holds. [`Item`] and [`Mapping`] form the
//! plain, ordered nested-map representation that loaders produce, that
//! [`Node::get`](crate::tree::Node::get) returns, and that writers consume.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};

/// Ordered string-keyed mapping of raw configuration items.
pub type Mapping = IndexMap<String, Item>;

/// Date and datetime layouts recognised when a string looks like a date.
///
/// Order matters: the first layout that parses the whole string wins.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%m-%d-%Y"];

// ============================================================================
// Value
// ============================================================================

/// A leaf configuration value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent value; an attribute holding it is omitted after validation.
    #[default]
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating-point number.
    Float(f64),
    /// Free text.
    String(String),
    /// Calendar date.
    Date(NaiveDate),
    /// Date and time without timezone.
    DateTime(NaiveDateTime),
    /// List of scalar values.
    List(Vec<Value>),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` for null, the empty string and the empty list.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Runtime type of the value, `None` for null.
    #[must_use]
    pub const fn value_type(&self) -> Option<ValueType> {
        match self {
            Self::Null => None,
            Self::Bool(_) => Some(ValueType::Bool),
            Self::Int(_) => Some(ValueType::Int),
            Self::Float(_) => Some(ValueType::Float),
            Self::String(_) => Some(ValueType::String),
            Self::Date(_) => Some(ValueType::Date),
            Self::DateTime(_) => Some(ValueType::DateTime),
            Self::List(_) => Some(ValueType::List),
        }
    }

    /// Borrows the string contents, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer contents, if this is an integer.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric contents widened to `f64`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Boolean contents, if this is a boolean.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrows the list elements, if this is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Interprets `s` as a date or datetime if it matches a known layout.
    ///
    /// Strings that parse as numbers are never treated as dates.
    #[must_use]
    pub fn parse_date_like(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() || s.parse::<f64>().is_ok() {
            return None;
        }
        for fmt in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(Self::DateTime(dt));
            }
        }
        for fmt in DATE_FORMATS {
            if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
                return Some(Self::Date(d));
            }
        }
        None
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => f.write_str(s),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(x) => serializer.serialize_f64(*x),
            Self::String(s) => serializer.serialize_str(s),
            Self::Date(d) => serializer.collect_str(&d.format("%Y-%m-%d")),
            Self::DateTime(dt) => serializer.collect_str(&dt.format("%Y-%m-%dT%H:%M:%S")),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Self::DateTime(dt)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

// ============================================================================
// Value Types
// ============================================================================

/// Declared type of an attribute template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ValueType {
    /// Text
    #[default]
    #[serde(rename = "str", alias = "string")]
    String,
    /// Signed integer
    #[serde(rename = "int", alias = "integer")]
    Int,
    /// Floating-point number
    #[serde(rename = "float")]
    Float,
    /// Boolean
    #[serde(rename = "bool", alias = "boolean")]
    Bool,
    /// Calendar date
    #[serde(rename = "date")]
    Date,
    /// Date and time
    #[serde(rename = "datetime")]
    DateTime,
    /// List of scalars
    #[serde(rename = "list")]
    List,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "str",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::List => "list",
        })
    }
}

impl ValueType {
    /// Returns `true` if `value` already has this type.
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        value.value_type() == Some(self)
    }

    /// Converts `value` to this type.
    ///
    /// Returns `None` when no conversion is defined; callers decide whether
    /// that is a type mismatch. Null is never converted.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn coerce(self, value: &Value) -> Option<Value> {
        if self.matches(value) {
            return Some(value.clone());
        }
        match (self, value) {
            (_, Value::Null) => None,
            (Self::String, v) => Some(Value::String(v.to_string())),

            (Self::Int, Value::String(s)) => s.trim().parse().ok().map(Value::Int),
            (Self::Int, Value::Float(x)) if x.is_finite() => Some(Value::Int(x.trunc() as i64)),
            (Self::Int, Value::Bool(b)) => Some(Value::Int(i64::from(*b))),

            (Self::Float, Value::String(s)) => s.trim().parse().ok().map(Value::Float),
            (Self::Float, Value::Int(_)) => value.as_f64().map(Value::Float),
            (Self::Float, Value::Bool(b)) => Some(Value::Float(if *b { 1.0 } else { 0.0 })),

            (Self::Bool, Value::String(s)) => parse_bool(s).map(Value::Bool),
            (Self::Bool, Value::Int(i)) => Some(Value::Bool(*i != 0)),

            (Self::Date, Value::DateTime(dt)) => Some(Value::Date(dt.date())),
            (Self::Date, Value::String(s)) => match Value::parse_date_like(s)? {
                Value::DateTime(dt) => Some(Value::Date(dt.date())),
                d => Some(d),
            },

            (Self::DateTime, Value::Date(d)) => Some(Value::DateTime(d.and_time(NaiveTime::MIN))),
            (Self::DateTime, Value::String(s)) => match Value::parse_date_like(s)? {
                Value::Date(d) => Some(Value::DateTime(d.and_time(NaiveTime::MIN))),
                dt => Some(dt),
            },

            (Self::List, v) => Some(Value::List(vec![v.clone()])),

            _ => None,
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

// ============================================================================
// Item
// ============================================================================

/// One entry of a raw nested mapping: a leaf value or a nested mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    /// Leaf value.
    Value(Value),
    /// Nested mapping, materialised as a child node.
    Map(Mapping),
}

impl Item {
    /// Borrows the leaf value, if this is one.
    #[must_use]
    pub const fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            Self::Map(_) => None,
        }
    }

    /// Borrows the nested mapping, if this is one.
    #[must_use]
    pub const fn as_map(&self) -> Option<&Mapping> {
        match self {
            Self::Map(m) => Some(m),
            Self::Value(_) => None,
        }
    }

    /// Converts to a JSON value. Dates become ISO-8601 strings.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Value(v) => value_to_json(v),
            Self::Map(m) => serde_json::Value::Object(
                m.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }

    /// Builds an item from JSON.
    ///
    /// Objects become mappings. With `decode_dates`, strings that look like
    /// dates are decoded as dates.
    #[must_use]
    pub fn from_json(json: &serde_json::Value, decode_dates: bool) -> Self {
        match json {
            serde_json::Value::Object(obj) => Self::Map(
                obj.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v, decode_dates)))
                    .collect(),
            ),
            other => Self::Value(json_to_value(other, decode_dates)),
        }
    }

    /// Builds an item from YAML. Non-string keys are rendered to strings.
    #[must_use]
    pub fn from_yaml(yaml: &serde_yaml::Value) -> Self {
        match yaml {
            serde_yaml::Value::Mapping(map) => Self::Map(
                map.iter()
                    .map(|(k, v)| (yaml_key(k), Self::from_yaml(v)))
                    .collect(),
            ),
            serde_yaml::Value::Tagged(tagged) => Self::from_yaml(&tagged.value),
            other => Self::Value(yaml_to_value(other)),
        }
    }
}

impl Serialize for Item {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(v) => v.serialize(serializer),
            Self::Map(m) => {
                let mut map = serializer.serialize_map(Some(m.len()))?;
                for (k, v) in m {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl From<Value> for Item {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

macro_rules! item_from_scalar {
    ($($t:ty),*) => {
        $(impl From<$t> for Item {
            fn from(v: $t) -> Self {
                Self::Value(v.into())
            }
        })*
    };
}

item_from_scalar!(&str, String, bool, i64, i32, f64, NaiveDate, NaiveDateTime);

impl From<Mapping> for Item {
    fn from(m: Mapping) -> Self {
        Self::Map(m)
    }
}

/// Converts a mapping to a JSON object.
#[must_use]
pub fn mapping_to_json(mapping: &Mapping) -> serde_json::Value {
    Item::Map(mapping.clone()).to_json()
}

/// Converts a leaf value to JSON.
#[must_use]
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::from(*i),
        Value::Float(x) => serde_json::Number::from_f64(*x)
            .map_or(serde_json::Value::Null, serde_json::Value::Number),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Date(d) => serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
        Value::DateTime(dt) => {
            serde_json::Value::String(dt.format("%Y-%m-%dT%H:%M:%S").to_string())
        }
        Value::List(items) => serde_json::Value::Array(items.iter().map(value_to_json).collect()),
    }
}

#[allow(clippy::cast_precision_loss)]
fn json_to_value(json: &serde_json::Value, decode_dates: bool) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => n.as_i64().map_or_else(
            || {
                n.as_f64()
                    .or_else(|| n.as_u64().map(|u| u as f64))
                    .map_or(Value::Null, Value::Float)
            },
            Value::Int,
        ),
        serde_json::Value::String(s) => {
            if decode_dates {
                Value::parse_date_like(s).unwrap_or_else(|| Value::String(s.clone()))
            } else {
                Value::String(s.clone())
            }
        }
        serde_json::Value::Array(items) => Value::List(
            items
                .iter()
                .map(|i| json_to_value(i, decode_dates))
                .collect(),
        ),
        // Objects inside lists have no tree representation; keep their text.
        serde_json::Value::Object(_) => Value::String(json.to_string()),
    }
}

#[allow(clippy::cast_precision_loss)]
fn yaml_to_value(yaml: &serde_yaml::Value) -> Value {
    match yaml {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(*b),
        serde_yaml::Value::Number(n) => n.as_i64().map_or_else(
            || {
                n.as_f64()
                    .or_else(|| n.as_u64().map(|u| u as f64))
                    .map_or(Value::Null, Value::Float)
            },
            Value::Int,
        ),
        serde_yaml::Value::String(s) => {
            Value::parse_date_like(s).unwrap_or_else(|| Value::String(s.clone()))
        }
        serde_yaml::Value::Sequence(items) => Value::List(items.iter().map(yaml_to_value).collect()),
        serde_yaml::Value::Tagged(tagged) => yaml_to_value(&tagged.value),
        serde_yaml::Value::Mapping(_) => {
            Value::String(serde_yaml::to_string(yaml).unwrap_or_default().trim().to_string())
        }
    }
}

fn yaml_key(key: &serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s.clone(),
        other => yaml_to_value(other).to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
