//! Model metadata read from the SQLite schema.

use adminkit_admin::column::{ColumnKind, ColumnMeta, ModelMeta, Relation};
use adminkit_core::{AdminError, AdminResult};
use rusqlite::Connection;

use super::db_error;

/// Maps a declared SQLite type to a column kind.
///
/// Follows SQLite's affinity rules, with the common date, boolean and JSON
/// spellings recognized first.
pub fn column_kind(declared: &str) -> ColumnKind {
    let declared = declared.to_ascii_uppercase();
    if declared.starts_with("BOOL") {
        ColumnKind::Boolean
    } else if declared.contains("DATETIME") || declared.contains("TIMESTAMP") {
        ColumnKind::DateTime
    } else if declared.starts_with("DATE") {
        ColumnKind::Date
    } else if declared.starts_with("JSON") {
        ColumnKind::Json
    } else if declared.contains("INT") {
        ColumnKind::Integer
    } else if declared.contains("CHAR") {
        ColumnKind::String
    } else if declared.contains("CLOB") || declared.contains("TEXT") {
        ColumnKind::Text
    } else if ["REAL", "FLOA", "DOUB", "NUMERIC", "DECIMAL"]
        .iter()
        .any(|t| declared.contains(t))
    {
        ColumnKind::Float
    } else {
        ColumnKind::Other
    }
}

/// Reads the columns and foreign keys of `table`.
///
/// A foreign key column `author_id` becomes the relation `author` stored in
/// `author_id`. Fails with `NotFound` when the table does not exist.
pub fn introspect(conn: &Connection, table: &str) -> AdminResult<ModelMeta> {
    let mut stmt = conn
        .prepare(r#"SELECT name, type, "notnull", dflt_value, pk FROM pragma_table_info(?1)"#)
        .map_err(db_error)?;
    let mut columns = stmt
        .query_map([table], |row| {
            let name: String = row.get(0)?;
            let declared: String = row.get(1)?;
            let not_null: bool = row.get(2)?;
            let default: Option<String> = row.get(3)?;
            let pk: i64 = row.get(4)?;

            let kind = column_kind(&declared);
            let mut column = ColumnMeta::new(name, kind);
            column.primary_key = pk > 0;
            column.nullable = !not_null && pk == 0;
            column.server_default =
                default.is_some() || (column.primary_key && kind == ColumnKind::Integer);
            Ok(column)
        })
        .map_err(db_error)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(db_error)?;
    if columns.is_empty() {
        return Err(AdminError::NotFound(format!("table '{table}'")));
    }

    let mut stmt = conn
        .prepare(r#"SELECT "table", "from", "to" FROM pragma_foreign_key_list(?1)"#)
        .map_err(db_error)?;
    let foreign_keys = stmt
        .query_map([table], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })
        .map_err(db_error)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(db_error)?;

    for (target, from, to) in foreign_keys {
        let Some(slot) = columns.iter_mut().find(|c| c.name == from) else {
            continue;
        };
        let name = from.strip_suffix("_id").unwrap_or(&from).to_string();
        let relation = Relation::new(target).target_pk(to.unwrap_or_else(|| "id".to_string()));
        let mut column = ColumnMeta::foreign_key(name, from.clone(), relation);
        column.nullable = slot.nullable;
        column.default = slot.default.take();
        *slot = column;
    }
    Ok(into_meta(table, columns))
}

fn into_meta(table: &str, columns: Vec<ColumnMeta>) -> ModelMeta {
    columns
        .into_iter()
        .fold(ModelMeta::new(table), ModelMeta::column)
}

/// Introspects `declared`'s table and lays the declared columns over it.
///
/// A declared column replaces the introspected one with the same name or
/// storage column, in place.
pub fn reflect(conn: &Connection, declared: ModelMeta) -> AdminResult<ModelMeta> {
    let mut columns = introspect(conn, declared.name())?.columns().to_vec();
    for column in declared.columns() {
        let storage = column.storage_name();
        match columns
            .iter_mut()
            .find(|c| c.name == column.name || c.storage_name() == storage)
        {
            Some(slot) => *slot = column.clone(),
            None => columns.push(column.clone()),
        }
    }
    Ok(into_meta(declared.name(), columns))
}
