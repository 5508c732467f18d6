//! Literal and identifier formatting for the PostgreSQL dialect.
//!
//! Identifiers are double-quoted. String-like literals are wrapped in single
//! quotes without escaping, so constants must not carry caller-controlled
//! text; pass such values as bound parameters instead.

use crate::expr::MemberRef;
use crate::value::{Value, ValueType};

/// Quote a single identifier: `name` -> `"name"`.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name)
}

/// Table identity `"<namespace>.<type_name>"`, quoted as one identifier.
pub fn table_name(namespace: &str, type_name: &str) -> String {
    if namespace.is_empty() {
        return quote_identifier(type_name);
    }
    quote_identifier(&format!("{}.{}", namespace, type_name))
}

/// Column reference `"<namespace>.<object_name>"."<member_name>"`.
pub fn member_name(member: &MemberRef) -> String {
    format!(
        "{}.{}",
        table_name(&member.namespace, &member.object_name),
        quote_identifier(&member.member_name)
    )
}

/// Render a constant by its declared type: numbers bare, `NULL` as the
/// keyword, anything else single-quoted. Infinite and NaN floats use the
/// quoted spellings PostgreSQL accepts.
pub fn literal(value: &Value, value_type: ValueType) -> String {
    if value.is_null() {
        return "NULL".to_string();
    }
    if let Some(special) = non_finite(value) {
        return format!("'{}'", special);
    }
    if value_type.is_numeric() {
        value.to_string()
    } else {
        format!("'{}'", value)
    }
}

fn non_finite(value: &Value) -> Option<&'static str> {
    let n = match value {
        Value::Real(n) => f64::from(*n),
        Value::Double(n) => *n,
        _ => return None,
    };
    if n.is_nan() {
        Some("NaN")
    } else if n.is_infinite() {
        Some(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else {
        None
    }
}
