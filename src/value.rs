//! Scalar values shared by constants, parameters and result fields.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A nullable scalar value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Real(f32),
    Double(f64),
    Numeric(Decimal),
    Text(String),
    Uuid(Uuid),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Date(NaiveDate),
    Time(NaiveTime),
    Interval(Interval),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
    /// One-dimensional array; elements may be `Null`.
    Array(Vec<Value>),
}

/// PostgreSQL `interval`: months and days are kept apart from the clock part
/// because their length depends on the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Interval {
    pub months: i32,
    pub days: i32,
    pub microseconds: i64,
}

/// Type tag carried next to a value: the declared type of a constant or a
/// result column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Bool,
    SmallInt,
    Int,
    BigInt,
    Real,
    Double,
    Numeric,
    Text,
    Uuid,
    Timestamp,
    TimestampTz,
    Date,
    Time,
    Interval,
    Bytes,
    Json,
    Array,
    /// No declared type, e.g. a bare `NULL`.
    Unknown,
}

impl ValueType {
    /// Integral and floating point types render as bare literals.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ValueType::SmallInt
                | ValueType::Int
                | ValueType::BigInt
                | ValueType::Real
                | ValueType::Double
                | ValueType::Numeric
        )
    }

    /// Map a PostgreSQL type name (as reported for a result column) to a tag.
    pub fn from_pg_name(name: &str) -> Option<Self> {
        let tag = match name {
            "BOOL" => ValueType::Bool,
            "INT2" => ValueType::SmallInt,
            "INT4" => ValueType::Int,
            "INT8" => ValueType::BigInt,
            "FLOAT4" => ValueType::Real,
            "FLOAT8" => ValueType::Double,
            "NUMERIC" => ValueType::Numeric,
            "TEXT" | "VARCHAR" | "BPCHAR" | "CHAR" | "NAME" => ValueType::Text,
            "UUID" => ValueType::Uuid,
            "TIMESTAMP" => ValueType::Timestamp,
            "TIMESTAMPTZ" => ValueType::TimestampTz,
            "DATE" => ValueType::Date,
            "TIME" => ValueType::Time,
            "INTERVAL" => ValueType::Interval,
            "BYTEA" => ValueType::Bytes,
            "JSON" | "JSONB" => ValueType::Json,
            n if n.ends_with("[]") => ValueType::Array,
            _ => return None,
        };
        Some(tag)
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ValueType::Bool => "bool",
            ValueType::SmallInt => "smallint",
            ValueType::Int => "integer",
            ValueType::BigInt => "bigint",
            ValueType::Real => "real",
            ValueType::Double => "double precision",
            ValueType::Numeric => "numeric",
            ValueType::Text => "text",
            ValueType::Uuid => "uuid",
            ValueType::Timestamp => "timestamp",
            ValueType::TimestampTz => "timestamptz",
            ValueType::Date => "date",
            ValueType::Time => "time",
            ValueType::Interval => "interval",
            ValueType::Bytes => "bytea",
            ValueType::Json => "json",
            ValueType::Array => "array",
            ValueType::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

impl Value {
    /// The type tag this value carries.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Unknown,
            Value::Bool(_) => ValueType::Bool,
            Value::SmallInt(_) => ValueType::SmallInt,
            Value::Int(_) => ValueType::Int,
            Value::BigInt(_) => ValueType::BigInt,
            Value::Real(_) => ValueType::Real,
            Value::Double(_) => ValueType::Double,
            Value::Numeric(_) => ValueType::Numeric,
            Value::Text(_) => ValueType::Text,
            Value::Uuid(_) => ValueType::Uuid,
            Value::Timestamp(_) => ValueType::Timestamp,
            Value::TimestampTz(_) => ValueType::TimestampTz,
            Value::Date(_) => ValueType::Date,
            Value::Time(_) => ValueType::Time,
            Value::Interval(_) => ValueType::Interval,
            Value::Bytes(_) => ValueType::Bytes,
            Value::Json(_) => ValueType::Json,
            Value::Array(_) => ValueType::Array,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Plain JSON form: numbers and booleans as themselves, everything else
    /// as its display text.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::SmallInt(n) => Json::from(*n),
            Value::Int(n) => Json::from(*n),
            Value::BigInt(n) => Json::from(*n),
            Value::Real(n) => Json::from(f64::from(*n)),
            Value::Double(n) => Json::from(*n),
            Value::Json(j) => j.clone(),
            Value::Array(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            other => Json::String(other.to_string()),
        }
    }
}

/// Plain text of the value, without any SQL quoting.
impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::SmallInt(n) => write!(f, "{}", n),
            Value::Int(n) => write!(f, "{}", n),
            Value::BigInt(n) => write!(f, "{}", n),
            Value::Real(n) => write!(f, "{}", n),
            Value::Double(n) => write!(f, "{}", n),
            Value::Numeric(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
            Value::Uuid(u) => write!(f, "{}", u),
            Value::Timestamp(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S%.f")),
            Value::TimestampTz(t) => write!(f, "{}", t.to_rfc3339()),
            Value::Date(d) => write!(f, "{}", d),
            Value::Time(t) => write!(f, "{}", t.format("%H:%M:%S%.f")),
            Value::Interval(i) => write!(f, "{}", i),
            Value::Bytes(b) => {
                write!(f, "\\x")?;
                for byte in b {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            Value::Json(j) => write!(f, "{}", j),
            Value::Array(items) => {
                write!(f, "{{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write_array_element(f, item)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Array elements in PostgreSQL array-literal syntax: numbers, booleans and
/// nested arrays bare, everything else double-quoted.
fn write_array_element(f: &mut std::fmt::Formatter<'_>, item: &Value) -> std::fmt::Result {
    match item {
        Value::Null => write!(f, "NULL"),
        Value::Array(_) | Value::Bool(_) => write!(f, "{}", item),
        v if v.value_type().is_numeric() => write!(f, "{}", v),
        v => {
            write!(f, "\"")?;
            for c in v.to_string().chars() {
                if c == '"' || c == '\\' {
                    write!(f, "\\")?;
                }
                write!(f, "{}", c)?;
            }
            write!(f, "\"")
        }
    }
}

/// PostgreSQL's default `postgres` output style, e.g. `1 year 2 mons 3 days 04:05:06`.
impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        let (years, months) = (self.months / 12, self.months % 12);
        for (n, unit) in [(years, "year"), (months, "mon"), (self.days, "day")] {
            if n != 0 {
                parts.push(format!("{} {}{}", n, unit, if n.abs() == 1 { "" } else { "s" }));
            }
        }

        if self.microseconds != 0 || parts.is_empty() {
            let sign = if self.microseconds < 0 { "-" } else { "" };
            let micros = self.microseconds.unsigned_abs();
            let secs = micros / 1_000_000;
            let mut clock = format!("{}{:02}:{:02}:{:02}", sign, secs / 3600, secs / 60 % 60, secs % 60);
            if micros % 1_000_000 != 0 {
                let fraction = format!("{:06}", micros % 1_000_000);
                clock.push('.');
                clock.push_str(fraction.trim_end_matches('0'));
            }
            parts.push(clock);
        }
        write!(f, "{}", parts.join(" "))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::SmallInt(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::BigInt(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Real(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Numeric(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::TimestampTz(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Value::Time(v)
    }
}

impl From<Interval> for Value {
    fn from(v: Interval) -> Self {
        Value::Interval(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_classification() {
        assert!(Value::from(42i32).value_type().is_numeric());
        assert!(Value::from(3.5f64).value_type().is_numeric());
        assert!(Value::from(Decimal::new(1995, 2)).value_type().is_numeric());
        assert!(!Value::from("42").value_type().is_numeric());
        assert!(!Value::from(true).value_type().is_numeric());
        assert!(!Value::Null.value_type().is_numeric());
    }

    #[test]
    fn test_option_into_value() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some("Ali")), Value::Text("Ali".to_string()));
    }

    #[test]
    fn test_pg_type_names() {
        assert_eq!(ValueType::from_pg_name("INT4"), Some(ValueType::Int));
        assert_eq!(ValueType::from_pg_name("VARCHAR"), Some(ValueType::Text));
        assert_eq!(ValueType::from_pg_name("TIMESTAMP"), Some(ValueType::Timestamp));
        assert_eq!(ValueType::from_pg_name("INTERVAL"), Some(ValueType::Interval));
        assert_eq!(ValueType::from_pg_name("TIME"), Some(ValueType::Time));
        assert_eq!(ValueType::from_pg_name("INT4[]"), Some(ValueType::Array));
        assert_eq!(ValueType::from_pg_name("INET"), None);
    }

    #[test]
    fn test_to_json() {
        assert_eq!(Value::Int(7).to_json(), serde_json::json!(7));
        assert_eq!(Value::Null.to_json(), serde_json::Value::Null);
        assert_eq!(Value::from("Ali").to_json(), serde_json::json!("Ali"));
        assert_eq!(Value::Uuid(Uuid::nil()).to_json(), serde_json::json!("00000000-0000-0000-0000-000000000000"));
    }

    #[test]
    fn test_bytes_display_as_hex() {
        assert_eq!(Value::Bytes(vec![0xde, 0xad]).to_string(), "\\xdead");
    }

    #[test]
    fn test_time_and_interval_display() {
        let time = NaiveTime::from_hms_micro_opt(4, 5, 6, 500_000).unwrap();
        assert_eq!(Value::Time(time).to_string(), "04:05:06.500");
        assert_eq!(Value::Interval(Interval { months: 14, days: 3, microseconds: 14_706_000_000 }).to_string(), "1 year 2 mons 3 days 04:05:06");
        assert_eq!(Value::Interval(Interval { months: 0, days: 1, microseconds: 0 }).to_string(), "1 day");
        assert_eq!(Value::Interval(Interval::default()).to_string(), "00:00:00");
        assert_eq!(Value::Interval(Interval { months: 0, days: 0, microseconds: -1_500_000 }).to_string(), "-00:00:01.5");
    }

    #[test]
    fn test_array_display_and_json() {
        let ints = Value::Array(vec![Value::Int(1), Value::Null, Value::Int(3)]);
        assert_eq!(ints.to_string(), "{1,NULL,3}");
        assert_eq!(ints.value_type(), ValueType::Array);
        assert_eq!(ints.to_json(), serde_json::json!([1, null, 3]));

        let texts = Value::Array(vec![Value::from("a b"), Value::from("say \"hi\"")]);
        assert_eq!(texts.to_string(), r#"{"a b","say \"hi\""}"#);
    }
}
