//! Conversion between JSON values and SQLite values.

use adminkit_admin::column::{ColumnKind, ModelMeta};
use adminkit_admin::Row;
use rusqlite::types::{Value as SqlValue, ValueRef};
use serde_json::Value;

/// Binds a JSON value. Booleans become `0`/`1`; arrays and objects are stored
/// as JSON text.
pub fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => n.as_i64().map_or_else(
            || SqlValue::Real(n.as_f64().unwrap_or_default()),
            SqlValue::Integer,
        ),
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Array(_) | Value::Object(_) => SqlValue::Text(value.to_string()),
    }
}

/// Binds a primary key given as text, as an integer when the key column is one.
pub fn pk_to_sql(meta: &ModelMeta, pk: &str) -> SqlValue {
    let integer_pk = meta
        .pk_column()
        .map_or(true, |c| c.kind == ColumnKind::Integer);
    match pk.parse::<i64>() {
        Ok(n) if integer_pk => SqlValue::Integer(n),
        _ => SqlValue::Text(pk.to_string()),
    }
}

/// Reads a column value as stored.
pub fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => Value::from(n),
        ValueRef::Real(f) => Value::from(f),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
    }
}

/// Restores the JSON shape of a stored value: booleans from integers and
/// documents from JSON text.
pub fn decode(kind: ColumnKind, value: Value) -> Value {
    match (kind, value) {
        (ColumnKind::Boolean, Value::Number(n)) => Value::Bool(n.as_i64().unwrap_or_default() != 0),
        (ColumnKind::Json, Value::String(text)) => {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        }
        (_, value) => value,
    }
}

/// Reads a result row into a JSON object, decoding values by their column.
pub fn read_row(
    row: &rusqlite::Row<'_>,
    names: &[String],
    meta: Option<&ModelMeta>,
) -> rusqlite::Result<Row> {
    let mut out = Row::new();
    for (index, name) in names.iter().enumerate() {
        let value = from_sql(row.get_ref(index)?);
        let value = match meta.and_then(|m| m.get(name)) {
            Some(column) => decode(column.kind, value),
            None => value,
        };
        out.insert(name.clone(), value);
    }
    Ok(out)
}

/// Quotes an identifier.
pub fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use adminkit_admin::column::ColumnMeta;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_to_sql() {
        assert_eq!(to_sql(&json!(true)), SqlValue::Integer(1));
        assert_eq!(to_sql(&json!(3)), SqlValue::Integer(3));
        assert_eq!(to_sql(&json!(1.5)), SqlValue::Real(1.5));
        assert_eq!(to_sql(&json!("x")), SqlValue::Text("x".into()));
        assert_eq!(to_sql(&json!({"a": 1})), SqlValue::Text("{\"a\":1}".into()));
        assert_eq!(to_sql(&Value::Null), SqlValue::Null);
    }

    #[test]
    fn test_pk_to_sql() {
        let meta = ModelMeta::new("t").column(ColumnMeta::primary_key("id"));
        assert_eq!(pk_to_sql(&meta, "7"), SqlValue::Integer(7));
        let meta = ModelMeta::new("t").column({
            let mut c = ColumnMeta::new("code", ColumnKind::String);
            c.primary_key = true;
            c
        });
        assert_eq!(pk_to_sql(&meta, "7"), SqlValue::Text("7".into()));
    }

    #[test]
    fn test_decode() {
        assert_eq!(decode(ColumnKind::Boolean, json!(0)), json!(false));
        assert_eq!(decode(ColumnKind::Json, json!("[1,2]")), json!([1, 2]));
        assert_eq!(decode(ColumnKind::Json, json!("not json")), json!("not json"));
        assert_eq!(decode(ColumnKind::Integer, json!(5)), json!(5));
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("name"), "\"name\"");
        assert_eq!(quote("we\"ird"), "\"we\"\"ird\"");
    }
}
