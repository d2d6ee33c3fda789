//! Admin accounts in a SQLite table.

use adminkit_admin::dao::{AdminDao, AdminLookup, AdminModel, AdminRecord, AdminUpdate};
use adminkit_core::{AdminError, AdminResult};
use async_trait::async_trait;
use rusqlite::types::Value as SqlValue;
use rusqlite::OptionalExtension;
use serde_json::Value;

use super::value::{quote, to_sql};
use super::{db_error, SqlConnection};

/// Reads and writes admin accounts in the table named by an [`AdminModel`].
#[derive(Debug, Clone)]
pub struct SqlAdminDao {
    conn: SqlConnection,
    model: AdminModel,
}

impl SqlAdminDao {
    /// Accounts stored as described by `model`.
    pub fn new(conn: SqlConnection, model: AdminModel) -> Self {
        Self { conn, model }
    }

    fn select_sql(&self) -> String {
        let m = &self.model;
        format!(
            "SELECT {}, {}, {}, {} FROM {}",
            quote(&m.id_column),
            quote(&m.username_column),
            quote(&m.password_column),
            quote(&m.profile_pic_column),
            quote(&m.table)
        )
    }

    fn lookup(&self, lookup: &AdminLookup) -> (String, SqlValue) {
        match lookup {
            AdminLookup::Id(id) => (quote(&self.model.id_column), to_sql(id)),
            AdminLookup::Username(name) => (
                quote(&self.model.username_column),
                SqlValue::Text(name.clone()),
            ),
        }
    }
}

fn read_admin(row: &rusqlite::Row<'_>) -> rusqlite::Result<AdminRecord> {
    Ok(AdminRecord {
        id: super::value::from_sql(row.get_ref(0)?),
        username: row.get(1)?,
        password: row.get(2)?,
        profile_pic: row.get(3)?,
    })
}

#[async_trait]
impl AdminDao for SqlAdminDao {
    async fn get_one_admin_by_filters(&self, lookup: &AdminLookup) -> AdminResult<AdminRecord> {
        let (column, param) = self.lookup(lookup);
        let sql = format!("{} WHERE {column} = ?1", self.select_sql());
        let table = self.model.table.clone();
        self.conn
            .run(move |conn| {
                conn.query_row(&sql, [param], read_admin)
                    .optional()
                    .map_err(db_error)?
                    .ok_or_else(|| AdminError::EntityNotFound(table))
            })
            .await
    }

    async fn is_exists_at_least_one_admin(&self) -> AdminResult<bool> {
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {})", quote(&self.model.table));
        self.conn
            .run(move |conn| conn.query_row(&sql, [], |row| row.get(0)).map_err(db_error))
            .await
    }

    async fn add_admin(
        &self,
        username: &str,
        password: &str,
        profile_pic: Option<&str>,
    ) -> AdminResult<AdminRecord> {
        let m = &self.model;
        let sql = format!(
            "INSERT INTO {} ({}, {}, {}) VALUES (?1, ?2, ?3)",
            quote(&m.table),
            quote(&m.username_column),
            quote(&m.password_column),
            quote(&m.profile_pic_column)
        );
        let record = AdminRecord {
            id: Value::Null,
            username: username.to_string(),
            password: password.to_string(),
            profile_pic: profile_pic.map(str::to_string),
        };
        let params = (
            record.username.clone(),
            record.password.clone(),
            record.profile_pic.clone(),
        );
        let id = self
            .conn
            .run(move |conn| {
                conn.execute(&sql, params).map_err(db_error)?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        tracing::debug!(username = %username, id, "Inserted admin");
        Ok(AdminRecord {
            id: Value::from(id),
            ..record
        })
    }

    async fn update_admin(&self, lookup: &AdminLookup, update: &AdminUpdate) -> AdminResult<()> {
        let mut assignments = Vec::new();
        let mut params = Vec::new();
        if let Some(password) = &update.password {
            assignments.push(format!("{} = ?", quote(&self.model.password_column)));
            params.push(SqlValue::Text(password.clone()));
        }
        if let Some(pic) = &update.profile_pic {
            assignments.push(format!("{} = ?", quote(&self.model.profile_pic_column)));
            params.push(SqlValue::Text(pic.clone()));
        }
        if assignments.is_empty() {
            return Ok(());
        }
        let (column, param) = self.lookup(lookup);
        params.push(param);
        let sql = format!(
            "UPDATE {} SET {} WHERE {column} = ?",
            quote(&self.model.table),
            assignments.join(", ")
        );
        let table = self.model.table.clone();
        self.conn
            .run(move |conn| {
                match conn
                    .execute(&sql, rusqlite::params_from_iter(params))
                    .map_err(db_error)?
                {
                    0 => Err(AdminError::EntityNotFound(table)),
                    _ => Ok(()),
                }
            })
            .await
    }
}
