//! The SQL dialect over SQLite.
//!
//! [`SqlBackend`] runs the admin's list and CRUD operations as SQL through
//! `rusqlite`. The connection sits behind a `tokio::sync::Mutex` and every
//! call runs on `tokio::task::spawn_blocking`. Writes happen in one
//! transaction per operation, including the link-table rows of many-to-many
//! fields.
//!
//! ```no_run
//! # async fn demo() -> adminkit_core::AdminResult<()> {
//! use adminkit_backends::sql::SqlBackend;
//!
//! let backend = SqlBackend::open("admin.db")?;
//! backend
//!     .execute_batch("CREATE TABLE IF NOT EXISTS tag (id INTEGER PRIMARY KEY, name TEXT)")
//!     .await?;
//! let meta = backend.introspect("tag").await?;
//! assert_eq!(meta.pk(), "id");
//! # Ok(())
//! # }
//! ```

mod dao;
mod introspect;
mod select;
mod value;

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use adminkit_admin::backend::{OrmBackend, Pagination, ResolvedForm, ResourceList, Row};
use adminkit_admin::column::{ModelMeta, Relation};
use adminkit_admin::converters::ConverterRegistry;
use adminkit_admin::dao::{AdminDao, AdminModel};
use adminkit_admin::ModelResource;
use adminkit_core::settings::AdminSettings;
use adminkit_core::{AdminError, AdminResult};
use adminkit_widgets::filters::Search;
use adminkit_widgets::options::OptionsSource;
use adminkit_widgets::Filter;
use async_trait::async_trait;
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, Transaction};
use serde_json::Value;
use tokio::sync::Mutex;

pub use dao::SqlAdminDao;
pub use introspect::column_kind;
pub use select::SqlSelect;
pub use value::{decode, from_sql, to_sql};

use value::{pk_to_sql, quote, read_row};

pub(crate) fn db_error(e: rusqlite::Error) -> AdminError {
    AdminError::Database(format!("{e}"))
}

fn join_error(e: tokio::task::JoinError) -> AdminError {
    AdminError::Database(format!("Task join error: {e}"))
}

// ── Connection ──────────────────────────────────────────────────────────

/// A shared SQLite connection.
///
/// Cheap to clone. Closures passed to [`run`](Self::run) execute on the
/// blocking pool while holding the connection.
#[derive(Clone)]
pub struct SqlConnection {
    path: PathBuf,
    conn: Arc<Mutex<Connection>>,
}

impl fmt::Debug for SqlConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlConnection")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqlConnection {
    /// Opens the database at `path`; `:memory:` opens an in-memory database.
    ///
    /// File databases use WAL journaling. Foreign keys are enforced.
    pub fn open(path: impl Into<PathBuf>) -> AdminResult<Self> {
        let path = path.into();
        let in_memory = path.to_str() == Some(":memory:");
        let conn = if in_memory {
            Connection::open_in_memory()
        } else {
            Connection::open(&path)
        }
        .map_err(|e| AdminError::Database(format!("SQLite open failed: {e}")))?;

        let pragmas = if in_memory {
            "PRAGMA foreign_keys=ON;"
        } else {
            "PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;"
        };
        conn.execute_batch(pragmas)
            .map_err(|e| AdminError::Database(format!("Failed to set pragmas: {e}")))?;

        Ok(Self {
            path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory database.
    pub fn memory() -> AdminResult<Self> {
        Self::open(":memory:")
    }

    /// The database path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runs `f` with the connection on the blocking pool.
    pub async fn run<T, F>(&self, f: F) -> AdminResult<T>
    where
        F: FnOnce(&mut Connection) -> AdminResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.blocking_lock();
            f(&mut conn)
        })
        .await
        .map_err(join_error)?
    }

    /// Runs `f` inside a transaction, committed when `f` succeeds.
    pub async fn transaction<T, F>(&self, f: F) -> AdminResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> AdminResult<T> + Send + 'static,
        T: Send + 'static,
    {
        self.run(move |conn| {
            let tx = conn.transaction().map_err(db_error)?;
            let out = f(&tx)?;
            tx.commit().map_err(db_error)?;
            Ok(out)
        })
        .await
    }

    /// Runs several `;`-separated statements.
    pub async fn execute_batch(&self, sql: &str) -> AdminResult<()> {
        let sql = sql.to_string();
        self.run(move |conn| conn.execute_batch(&sql).map_err(db_error))
            .await
    }

    /// Runs one statement, returning the number of changed rows.
    pub async fn execute(&self, sql: &str, params: &[Value]) -> AdminResult<u64> {
        let sql = sql.to_string();
        let params: Vec<SqlValue> = params.iter().map(to_sql).collect();
        self.run(move |conn| {
            let count = conn
                .execute(&sql, rusqlite::params_from_iter(params))
                .map_err(db_error)?;
            Ok(count as u64)
        })
        .await
    }

    /// Runs a query, returning rows as JSON objects.
    pub async fn query(&self, sql: &str, params: &[Value]) -> AdminResult<Vec<Row>> {
        let sql = sql.to_string();
        let params: Vec<SqlValue> = params.iter().map(to_sql).collect();
        self.run(move |conn| query_rows(conn, &sql, params, None))
            .await
    }
}

fn query_rows(
    conn: &Connection,
    sql: &str,
    params: Vec<SqlValue>,
    meta: Option<&ModelMeta>,
) -> AdminResult<Vec<Row>> {
    let mut stmt = conn.prepare(sql).map_err(db_error)?;
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let rows = stmt
        .query_map(rusqlite::params_from_iter(params), |row| {
            read_row(row, &names, meta)
        })
        .map_err(db_error)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(db_error)?;
    Ok(rows)
}

// ── Relation options ────────────────────────────────────────────────────

/// `(label, key)` options read from the related table, ordered by key.
#[derive(Debug, Clone)]
pub struct SqlRelationOptions {
    conn: SqlConnection,
    relation: Relation,
}

#[async_trait]
impl OptionsSource for SqlRelationOptions {
    async fn options(&self) -> AdminResult<Vec<(String, Value)>> {
        let sql = format!(
            "SELECT {}, {} FROM {} ORDER BY {}",
            quote(&self.relation.label_column),
            quote(&self.relation.target_pk),
            quote(&self.relation.target),
            quote(&self.relation.target_pk),
        );
        self.conn
            .run(move |conn| {
                let mut stmt = conn.prepare(&sql).map_err(db_error)?;
                let options = stmt
                    .query_map([], |row| {
                        let label = from_sql(row.get_ref(0)?);
                        let key = from_sql(row.get_ref(1)?);
                        Ok((adminkit_widgets::widget::value_to_string(&label), key))
                    })
                    .map_err(db_error)?
                    .collect::<rusqlite::Result<Vec<_>>>()
                    .map_err(db_error)?;
                Ok(options)
            })
            .await
    }
}

// ── Backend ─────────────────────────────────────────────────────────────

/// The SQL dialect.
pub struct SqlBackend {
    conn: SqlConnection,
    converters: ConverterRegistry,
    admin_model: AdminModel,
}

impl fmt::Debug for SqlBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlBackend")
            .field("conn", &self.conn)
            .field("admin_table", &self.admin_model.table)
            .finish_non_exhaustive()
    }
}

impl SqlBackend {
    /// A backend over `conn`.
    pub fn new(conn: SqlConnection) -> Self {
        Self {
            conn,
            converters: ConverterRegistry::standard(),
            admin_model: AdminModel::default(),
        }
    }

    /// Opens the database at `path`.
    pub fn open(path: impl Into<PathBuf>) -> AdminResult<Self> {
        Ok(Self::new(SqlConnection::open(path)?))
    }

    /// A backend over an in-memory database.
    pub fn memory() -> AdminResult<Self> {
        Ok(Self::new(SqlConnection::memory()?))
    }

    /// Opens `settings.database_url` (`sqlite://path` or a plain path).
    /// An empty url or `:memory:` gives an in-memory database.
    pub fn from_settings(settings: &AdminSettings) -> AdminResult<Self> {
        let url = settings.database_url.as_str();
        let path = url.strip_prefix("sqlite://").unwrap_or(url);
        match path {
            "" | ":memory:" => Self::memory(),
            path => Self::open(path),
        }
    }

    /// Stores admin accounts as described by `model`.
    #[must_use]
    pub fn admin_model(mut self, model: AdminModel) -> Self {
        self.admin_model = model;
        self
    }

    /// Replaces the converter registry.
    #[must_use]
    pub fn converters(mut self, converters: ConverterRegistry) -> Self {
        self.converters = converters;
        self
    }

    /// The shared connection.
    pub fn connection(&self) -> &SqlConnection {
        &self.conn
    }

    /// Runs several `;`-separated statements.
    pub async fn execute_batch(&self, sql: &str) -> AdminResult<()> {
        self.conn.execute_batch(sql).await
    }

    /// Reads the metadata of `table` from the schema.
    pub async fn introspect(&self, table: &str) -> AdminResult<ModelMeta> {
        let table = table.to_string();
        self.conn
            .run(move |conn| introspect::introspect(conn, &table))
            .await
    }

    /// Reads the metadata of `declared`'s table, keeping every declared column.
    pub async fn reflect(&self, declared: ModelMeta) -> AdminResult<ModelMeta> {
        self.conn
            .run(move |conn| introspect::reflect(conn, declared))
            .await
    }
}

/// Replaces the link rows of every many-to-many field present in `values`.
fn write_many_to_many(
    tx: &Transaction<'_>,
    meta: &ModelMeta,
    pk: &SqlValue,
    values: &HashMap<String, Vec<Value>>,
) -> AdminResult<()> {
    for (name, keys) in values {
        let Some(through) = meta
            .get(name)
            .and_then(|c| c.relation.as_ref())
            .and_then(|r| r.through.as_ref())
        else {
            return Err(AdminError::FieldNotFound {
                model: meta.name().to_string(),
                field: name.clone(),
            });
        };
        tx.execute(
            &format!(
                "DELETE FROM {} WHERE {} = ?1",
                quote(&through.table),
                quote(&through.source_column)
            ),
            [pk],
        )
        .map_err(db_error)?;
        let insert = format!(
            "INSERT INTO {} ({}, {}) VALUES (?1, ?2)",
            quote(&through.table),
            quote(&through.source_column),
            quote(&through.target_column)
        );
        for key in keys {
            tx.execute(&insert, (pk, to_sql(key))).map_err(db_error)?;
        }
    }
    Ok(())
}

fn read_many_to_many(conn: &Connection, meta: &ModelMeta, pk: &SqlValue, row: &mut Row) -> AdminResult<()> {
    for column in meta.many_to_many() {
        let Some(through) = column.relation.as_ref().and_then(|r| r.through.as_ref()) else {
            continue;
        };
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1",
            quote(&through.target_column),
            quote(&through.table),
            quote(&through.source_column)
        );
        let mut stmt = conn.prepare(&sql).map_err(db_error)?;
        let keys = stmt
            .query_map([pk], |r| Ok(from_sql(r.get_ref(0)?)))
            .map_err(db_error)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_error)?;
        row.insert(column.name.clone(), Value::Array(keys));
    }
    Ok(())
}

#[async_trait]
impl OrmBackend for SqlBackend {
    fn name(&self) -> &'static str {
        "sql"
    }

    fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    fn default_filter(&self, name: &str) -> Arc<dyn Filter> {
        Arc::new(Search::new(name))
    }

    fn relation_options(&self, relation: &Relation) -> Arc<dyn OptionsSource> {
        Arc::new(SqlRelationOptions {
            conn: self.conn.clone(),
            relation: relation.clone(),
        })
    }

    fn admin_dao(&self) -> Arc<dyn AdminDao> {
        Arc::new(SqlAdminDao::new(self.conn.clone(), self.admin_model.clone()))
    }

    async fn list(
        &self,
        resource: &ModelResource,
        params: &HashMap<String, String>,
        page: Pagination,
    ) -> AdminResult<ResourceList> {
        let params = resource.parse_query_params(params);
        let select = resource.enrich_select_with_filters(&params, SqlSelect::new(resource.meta()));
        tracing::debug!(
            table = %resource.meta().name(),
            conditions = select.conditions().len(),
            page = page.page_num,
            "Listing rows"
        );
        let meta = resource.meta().clone();
        self.conn
            .run(move |conn| {
                let bound = select.params().to_vec();
                let total: i64 = conn
                    .query_row(
                        &select.count_sql(),
                        rusqlite::params_from_iter(bound.iter()),
                        |row| row.get(0),
                    )
                    .map_err(db_error)?;
                let models = query_rows(conn, &select.page_sql(page), bound, Some(&meta))?;
                Ok(ResourceList {
                    models,
                    total_entries_count: u64::try_from(total).unwrap_or_default(),
                })
            })
            .await
    }

    async fn get(&self, meta: &ModelMeta, pk: &str) -> AdminResult<Option<Row>> {
        let meta = meta.clone();
        let key = pk_to_sql(&meta, pk);
        self.conn
            .run(move |conn| {
                let sql = format!(
                    "SELECT * FROM {} WHERE {} = ?1",
                    quote(meta.name()),
                    quote(meta.pk())
                );
                let Some(mut row) = query_rows(conn, &sql, vec![key.clone()], Some(&meta))?
                    .into_iter()
                    .next()
                else {
                    return Ok(None);
                };
                read_many_to_many(conn, &meta, &key, &mut row)?;
                Ok(Some(row))
            })
            .await
    }

    async fn create(&self, meta: &ModelMeta, form: ResolvedForm) -> AdminResult<Value> {
        let meta = meta.clone();
        self.conn
            .transaction(move |tx| {
                let table = quote(meta.name());
                if form.data.is_empty() {
                    tx.execute(&format!("INSERT INTO {table} DEFAULT VALUES"), [])
                        .map_err(db_error)?;
                } else {
                    let columns: Vec<String> = form.data.keys().map(|k| quote(k)).collect();
                    let marks = vec!["?"; columns.len()].join(", ");
                    let sql = format!(
                        "INSERT INTO {table} ({}) VALUES ({marks})",
                        columns.join(", ")
                    );
                    tx.execute(&sql, rusqlite::params_from_iter(form.data.values().map(to_sql)))
                        .map_err(db_error)?;
                }
                let pk = match form.data.get(meta.pk()) {
                    Some(pk) if !pk.is_null() => pk.clone(),
                    _ => Value::from(tx.last_insert_rowid()),
                };
                write_many_to_many(tx, &meta, &to_sql(&pk), &form.many_to_many)?;
                tracing::debug!(table = %meta.name(), pk = %pk, "Inserted row");
                Ok(pk)
            })
            .await
    }

    async fn update(&self, meta: &ModelMeta, pk: &str, form: ResolvedForm) -> AdminResult<()> {
        let meta = meta.clone();
        let key = pk_to_sql(&meta, pk);
        let pk = pk.to_string();
        self.conn
            .transaction(move |tx| {
                let table = quote(meta.name());
                let pk_column = quote(meta.pk());
                let exists: bool = tx
                    .query_row(
                        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE {pk_column} = ?1)"),
                        [&key],
                        |row| row.get(0),
                    )
                    .map_err(db_error)?;
                if !exists {
                    return Err(AdminError::NotFound(format!("{} {pk}", meta.name())));
                }
                if !form.data.is_empty() {
                    let assignments: Vec<String> = form
                        .data
                        .keys()
                        .map(|k| format!("{} = ?", quote(k)))
                        .collect();
                    let sql = format!(
                        "UPDATE {table} SET {} WHERE {pk_column} = ?",
                        assignments.join(", ")
                    );
                    let params = form.data.values().map(to_sql).chain([key.clone()]);
                    tx.execute(&sql, rusqlite::params_from_iter(params))
                        .map_err(db_error)?;
                }
                write_many_to_many(tx, &meta, &key, &form.many_to_many)?;
                Ok(())
            })
            .await
    }

    async fn delete(&self, meta: &ModelMeta, pks: &[String]) -> AdminResult<u64> {
        if pks.is_empty() {
            return Ok(0);
        }
        let meta = meta.clone();
        let keys: Vec<SqlValue> = pks.iter().map(|pk| pk_to_sql(&meta, pk)).collect();
        self.conn
            .transaction(move |tx| {
                let marks = vec!["?"; keys.len()].join(", ");
                for column in meta.many_to_many() {
                    if let Some(through) = column.relation.as_ref().and_then(|r| r.through.as_ref()) {
                        tx.execute(
                            &format!(
                                "DELETE FROM {} WHERE {} IN ({marks})",
                                quote(&through.table),
                                quote(&through.source_column)
                            ),
                            rusqlite::params_from_iter(keys.iter()),
                        )
                        .map_err(db_error)?;
                    }
                }
                let count = tx
                    .execute(
                        &format!(
                            "DELETE FROM {} WHERE {} IN ({marks})",
                            quote(meta.name()),
                            quote(meta.pk())
                        ),
                        rusqlite::params_from_iter(keys.iter()),
                    )
                    .map_err(db_error)?;
                tracing::debug!(table = %meta.name(), count, "Deleted rows");
                Ok(count as u64)
            })
            .await
    }
}
