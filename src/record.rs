//! Schema-less records read back from result rows.

use crate::error::{PlanError, PlanResult};
use crate::value::{Interval, Value, ValueType};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One named, typed, nullable column value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value_type: ValueType,
    pub value: Value,
}

impl Field {
    pub fn new(name: impl Into<String>, value_type: ValueType, value: Value) -> Self {
        Self {
            name: name.into(),
            value_type,
            value,
        }
    }
}

/// An ordered set of fields, in result-set column order.
///
/// Records are detached from the connection that produced them.
///
/// Name lookups try the exact name first, then fall back to an ASCII
/// case-insensitive match, since PostgreSQL folds unquoted column names to
/// lower case.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GenericRecord {
    fields: Vec<Field>,
}

impl GenericRecord {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Build a record from `(name, value)` pairs, typing each field by its value.
    pub fn from_values<N, V>(values: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: Into<String>,
        V: Into<Value>,
    {
        let fields = values
            .into_iter()
            .map(|(name, value)| {
                let value = value.into();
                Field::new(name, value.value_type(), value)
            })
            .collect();
        Self { fields }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<Field> {
        self.fields
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| f.name == name)
            .or_else(|| self.fields.iter().position(|f| f.name.eq_ignore_ascii_case(name)))
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.position(name).map(|i| &self.fields[i])
    }

    /// The raw value of a field.
    pub fn value(&self, name: &str) -> PlanResult<&Value> {
        self.field(name)
            .map(|f| &f.value)
            .ok_or_else(|| PlanError::FieldNotFound(name.to_string()))
    }

    /// Typed access to a field.
    ///
    /// Fails with [`PlanError::FieldNotFound`] when absent and
    /// [`PlanError::TypeMismatch`] when the stored value does not convert to
    /// `T`. Use `Option<T>` for nullable columns.
    pub fn get<T: FromValue>(&self, name: &str) -> PlanResult<T> {
        let field = self
            .field(name)
            .ok_or_else(|| PlanError::FieldNotFound(name.to_string()))?;
        convert(&field.name, field.value_type, &field.value)
    }

    /// Replace the value of an existing field or append a new one.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        match self.position(name) {
            Some(i) => {
                let field = &mut self.fields[i];
                if !value.is_null() {
                    field.value_type = value.value_type();
                }
                field.value = value;
            }
            None => self.fields.push(Field::new(name, value.value_type(), value)),
        }
    }

    /// A JSON object of field name to plain value.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.value.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }
}

impl<'a> IntoIterator for &'a GenericRecord {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Convert `value` to `T`, reporting `name` on mismatch.
pub fn convert<T: FromValue>(name: &str, value_type: ValueType, value: &Value) -> PlanResult<T> {
    T::from_value(value).ok_or_else(|| {
        let found = if value.is_null() {
            "NULL".to_string()
        } else {
            value_type.to_string()
        };
        PlanError::mismatch(name, T::TYPE_NAME, found)
    })
}

/// Conversion out of a stored [`Value`].
pub trait FromValue: Sized {
    /// Name used in type mismatch errors.
    const TYPE_NAME: &'static str;

    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for Value {
    const TYPE_NAME: &'static str = "Value";

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    const TYPE_NAME: &'static str = T::TYPE_NAME;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl FromValue for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromValue for i16 {
    const TYPE_NAME: &'static str = "i16";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::SmallInt(n) => Some(*n),
            Value::Int(n) => i16::try_from(*n).ok(),
            Value::BigInt(n) => i16::try_from(*n).ok(),
            _ => None,
        }
    }
}

impl FromValue for i32 {
    const TYPE_NAME: &'static str = "i32";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::SmallInt(n) => Some(i32::from(*n)),
            Value::Int(n) => Some(*n),
            Value::BigInt(n) => i32::try_from(*n).ok(),
            _ => None,
        }
    }
}

impl FromValue for i64 {
    const TYPE_NAME: &'static str = "i64";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::SmallInt(n) => Some(i64::from(*n)),
            Value::Int(n) => Some(i64::from(*n)),
            Value::BigInt(n) => Some(*n),
            _ => None,
        }
    }
}

impl FromValue for f32 {
    const TYPE_NAME: &'static str = "f32";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Real(n) => Some(*n),
            Value::SmallInt(n) => Some(f32::from(*n)),
            _ => None,
        }
    }
}

impl FromValue for f64 {
    const TYPE_NAME: &'static str = "f64";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Real(n) => Some(f64::from(*n)),
            Value::Double(n) => Some(*n),
            Value::SmallInt(n) => Some(f64::from(*n)),
            Value::Int(n) => Some(f64::from(*n)),
            _ => None,
        }
    }
}

impl FromValue for Decimal {
    const TYPE_NAME: &'static str = "Decimal";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Numeric(n) => Some(*n),
            Value::SmallInt(n) => Some(Decimal::from(*n)),
            Value::Int(n) => Some(Decimal::from(*n)),
            Value::BigInt(n) => Some(Decimal::from(*n)),
            _ => None,
        }
    }
}

impl FromValue for String {
    const TYPE_NAME: &'static str = "String";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromValue for Uuid {
    const TYPE_NAME: &'static str = "Uuid";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Uuid(u) => Some(*u),
            Value::Text(s) => Uuid::parse_str(s).ok(),
            _ => None,
        }
    }
}

impl FromValue for NaiveDateTime {
    const TYPE_NAME: &'static str = "NaiveDateTime";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }
}

impl FromValue for DateTime<Utc> {
    const TYPE_NAME: &'static str = "DateTime<Utc>";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::TimestampTz(t) => Some(*t),
            Value::Timestamp(t) => Some(t.and_utc()),
            _ => None,
        }
    }
}

impl FromValue for NaiveDate {
    const TYPE_NAME: &'static str = "NaiveDate";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl FromValue for NaiveTime {
    const TYPE_NAME: &'static str = "NaiveTime";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Time(t) => Some(*t),
            _ => None,
        }
    }
}

impl FromValue for Interval {
    const TYPE_NAME: &'static str = "Interval";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Interval(i) => Some(*i),
            _ => None,
        }
    }
}

/// Arrays convert element by element; a `NULL` element fails the conversion
/// unless the element type is an `Option`.
macro_rules! array_from_value {
    ($($t:ty),* $(,)?) => {
        $(
            impl FromValue for Vec<$t> {
                const TYPE_NAME: &'static str = concat!("Vec<", stringify!($t), ">");

                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::Array(items) => items.iter().map(<$t>::from_value).collect(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

array_from_value!(
    bool,
    i16,
    i32,
    i64,
    f64,
    Decimal,
    String,
    Uuid,
    Option<i32>,
    Option<i64>,
    Option<String>,
);

impl FromValue for Vec<u8> {
    const TYPE_NAME: &'static str = "Vec<u8>";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bytes(b) => Some(b.clone()),
            _ => None,
        }
    }
}

impl FromValue for serde_json::Value {
    const TYPE_NAME: &'static str = "serde_json::Value";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Json(j) => Some(j.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee() -> GenericRecord {
        GenericRecord::new(vec![
            Field::new("Id", ValueType::Int, Value::Int(7)),
            Field::new("UId", ValueType::Uuid, Value::Uuid(Uuid::nil())),
            Field::new("DateUpdated", ValueType::Timestamp, Value::Null),
            Field::new("FirstName", ValueType::Text, Value::from("Ali")),
        ])
    }

    #[test]
    fn test_field_order_is_preserved() {
        let record = employee();
        let names: Vec<&str> = record.names().collect();
        assert_eq!(names, vec!["Id", "UId", "DateUpdated", "FirstName"]);
    }

    #[test]
    fn test_typed_access() {
        let record = employee();
        assert_eq!(record.get::<i32>("Id").unwrap(), 7);
        assert_eq!(record.get::<i64>("Id").unwrap(), 7);
        assert_eq!(record.get::<String>("FirstName").unwrap(), "Ali");
        assert_eq!(record.get::<Uuid>("UId").unwrap(), Uuid::nil());
        assert_eq!(record.get::<Option<NaiveDateTime>>("DateUpdated").unwrap(), None);
    }

    #[test]
    fn test_lookup_falls_back_to_case_insensitive() {
        let record = employee();
        assert_eq!(record.get::<String>("firstname").unwrap(), "Ali");
        assert!(record.contains("uid"));
    }

    #[test]
    fn test_missing_field() {
        let err = employee().get::<String>("LastName").unwrap_err();
        assert!(matches!(err, PlanError::FieldNotFound(name) if name == "LastName"));
    }

    #[test]
    fn test_type_mismatch() {
        let record = employee();
        let err = record.get::<i32>("FirstName").unwrap_err();
        assert!(matches!(
            err,
            PlanError::TypeMismatch { ref field, expected: "i32", ref found } if field == "FirstName" && found == "text"
        ));

        let err = record.get::<NaiveDateTime>("DateUpdated").unwrap_err();
        assert!(matches!(err, PlanError::TypeMismatch { ref found, .. } if found == "NULL"));
    }

    #[test]
    fn test_set_replaces_or_appends() {
        let mut record = employee();
        record.set("FirstName", "Updated New");
        record.set("LastName", "Desidero");
        assert_eq!(record.get::<String>("FirstName").unwrap(), "Updated New");
        assert_eq!(record.len(), 5);
        assert_eq!(record.fields()[4].name, "LastName");
    }

    #[test]
    fn test_time_interval_and_array_access() {
        let shift = NaiveTime::from_hms_opt(9, 30, 0).unwrap();
        let record = GenericRecord::new(vec![
            Field::new("Starts", ValueType::Time, Value::Time(shift)),
            Field::new("Length", ValueType::Interval, Value::Interval(Interval { months: 0, days: 0, microseconds: 28_800_000_000 })),
            Field::new("Grades", ValueType::Array, Value::Array(vec![Value::Int(1), Value::Null, Value::Int(3)])),
        ]);
        assert_eq!(record.get::<NaiveTime>("Starts").unwrap(), shift);
        assert_eq!(record.get::<Interval>("Length").unwrap().microseconds, 28_800_000_000);
        assert_eq!(record.get::<Vec<Option<i32>>>("Grades").unwrap(), vec![Some(1), None, Some(3)]);

        let err = record.get::<Vec<i32>>("Grades").unwrap_err();
        assert!(matches!(err, PlanError::TypeMismatch { expected: "Vec<i32>", .. }));
    }

    #[test]
    fn test_to_json_object() {
        let json = employee().to_json();
        assert_eq!(json["Id"], 7);
        assert_eq!(json["FirstName"], "Ali");
        assert!(json["DateUpdated"].is_null());
    }

    #[test]
    fn test_record_serializes() {
        let json = serde_json::to_value(employee()).unwrap();
        assert_eq!(json["fields"][3]["name"], "FirstName");
    }
}
