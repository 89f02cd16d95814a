//! Request parameter values and their wire normalisation.
//!
//! The JustCall API expects booleans as `0`/`1` integers, dates as `"YYYY-MM-DD"`
//! and datetimes as `"YYYY-MM-DD HH:MM:SS"`. Callers build parameters from native
//! Rust values; [`ParamValue::normalize`] turns them into the JSON sent on the
//! wire, recursing through nested lists and maps.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use jcall_error::WireFormatError;
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// JustCall API date format: `2020-12-15`.
pub const API_DATE_FORMAT: &str = "%Y-%m-%d";

/// JustCall API datetime format: `2020-12-03 14:46:52`.
pub const API_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Ordered parameter mapping used for query strings and JSON bodies.
pub type Params = BTreeMap<String, ParamValue>;

/// A single request parameter value.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use jcall_core::ParamValue;
/// use serde_json::json;
///
/// assert_eq!(ParamValue::from(true).normalize(), json!(1));
///
/// let date = NaiveDate::from_ymd_opt(2023, 1, 5).unwrap();
/// assert_eq!(ParamValue::from(date).normalize(), json!("2023-01-05"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Sent as `1` or `0`
    Bool(bool),
    /// Integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// String
    Text(String),
    /// Sent as `YYYY-MM-DD`
    Date(NaiveDate),
    /// Sent as `YYYY-MM-DD HH:MM:SS`
    DateTime(NaiveDateTime),
    /// Sequence of values
    List(Vec<ParamValue>),
    /// Nested mapping
    Map(Params),
    /// Pre-built JSON, booleans inside are still normalised
    Json(Value),
}

macro_rules! param_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for ParamValue {
                fn from(value: $ty) -> Self {
                    ParamValue::$variant(value)
                }
            }
        )*
    };
}

param_from! {
    bool => Bool,
    i64 => Int,
    f64 => Float,
    String => Text,
    NaiveDate => Date,
    NaiveDateTime => DateTime,
    Value => Json,
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        ParamValue::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<usize> for ParamValue {
    fn from(value: usize) -> Self {
        ParamValue::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(values: Vec<T>) -> Self {
        ParamValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<Params> for ParamValue {
    fn from(values: Params) -> Self {
        ParamValue::Map(values)
    }
}

impl ParamValue {
    /// Convert to the JSON value sent on the wire.
    pub fn normalize(&self) -> Value {
        match self {
            ParamValue::Bool(b) => Value::from(u8::from(*b)),
            ParamValue::Int(i) => Value::from(*i),
            ParamValue::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
            ParamValue::Text(s) => Value::String(s.clone()),
            ParamValue::Date(d) => Value::String(to_api_date(d)),
            ParamValue::DateTime(dt) => Value::String(to_api_datetime(dt)),
            ParamValue::List(items) => Value::Array(items.iter().map(ParamValue::normalize).collect()),
            ParamValue::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.normalize()))
                    .collect::<Map<String, Value>>(),
            ),
            ParamValue::Json(value) => normalize_json(value),
        }
    }

    /// Query-string pairs for this value under `key`.
    ///
    /// Scalars produce one pair, lists repeat the key once per element and
    /// nested maps are sent as their JSON encoding.
    pub fn query_pairs(&self, key: &str) -> Vec<(String, String)> {
        match self.normalize() {
            Value::Array(items) => items
                .into_iter()
                .map(|item| (key.to_string(), scalar_to_string(item)))
                .collect(),
            other => vec![(key.to_string(), scalar_to_string(other))],
        }
    }
}

fn scalar_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Replace JSON booleans with `0`/`1` throughout a JSON document.
pub fn normalize_json(value: &Value) -> Value {
    match value {
        Value::Bool(b) => Value::from(u8::from(*b)),
        Value::Array(items) => Value::Array(items.iter().map(normalize_json).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), normalize_json(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Format a date in the API date format.
pub fn to_api_date(value: &NaiveDate) -> String {
    value.format(API_DATE_FORMAT).to_string()
}

/// Format a datetime in the API datetime format.
pub fn to_api_datetime(value: &NaiveDateTime) -> String {
    value.format(API_DATETIME_FORMAT).to_string()
}

/// Parse an API date string. Empty input yields `None`.
///
/// # Examples
///
/// ```
/// use jcall_core::from_api_date;
///
/// let date = from_api_date("2020-12-15").unwrap().unwrap();
/// assert_eq!(date.to_string(), "2020-12-15");
/// assert!(from_api_date("").unwrap().is_none());
/// ```
pub fn from_api_date(value: &str) -> Result<Option<NaiveDate>, WireFormatError> {
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, API_DATE_FORMAT)
        .map(Some)
        .map_err(|e| WireFormatError::new(format!("Invalid date format: {}. Expected 'YYYY-MM-DD' ({})", value, e)))
}

/// Parse an API datetime string, accepting a bare date as midnight.
/// Empty input yields `None`.
pub fn from_api_datetime(value: &str) -> Result<Option<NaiveDateTime>, WireFormatError> {
    if value.is_empty() {
        return Ok(None);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, API_DATETIME_FORMAT) {
        return Ok(Some(dt));
    }
    NaiveDate::parse_from_str(value, API_DATE_FORMAT)
        .map(|d| Some(d.and_time(NaiveTime::MIN)))
        .map_err(|_| {
            WireFormatError::new(format!(
                "Invalid datetime format: {}. Expected 'YYYY-MM-DD HH:MM:SS' or 'YYYY-MM-DD'",
                value
            ))
        })
}
