//! Admin accounts in a document collection.

use adminkit_admin::dao::{AdminDao, AdminLookup, AdminModel, AdminRecord, AdminUpdate};
use adminkit_admin::Row;
use adminkit_core::{AdminError, AdminResult};
use async_trait::async_trait;
use serde_json::Value;

use super::{DocumentQuery, DocumentStore};

/// Reads and writes admin accounts in the collection named by an [`AdminModel`].
#[derive(Debug, Clone)]
pub struct DocumentAdminDao {
    store: DocumentStore,
    model: AdminModel,
}

impl DocumentAdminDao {
    /// Accounts stored as described by `model`.
    pub fn new(store: DocumentStore, model: AdminModel) -> Self {
        Self { store, model }
    }

    fn query(&self, lookup: &AdminLookup) -> DocumentQuery {
        let query = DocumentQuery::new(&self.model.table);
        match lookup {
            AdminLookup::Id(id) => query.filter(&self.model.id_column, id.clone()),
            AdminLookup::Username(name) => {
                query.filter(&self.model.username_column, Value::String(name.clone()))
            }
        }
    }

    fn record(&self, document: &Row) -> AdminRecord {
        let text = |column: &str| {
            document
                .get(column)
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        AdminRecord {
            id: document
                .get(&self.model.id_column)
                .cloned()
                .unwrap_or(Value::Null),
            username: text(&self.model.username_column).unwrap_or_default(),
            password: text(&self.model.password_column).unwrap_or_default(),
            profile_pic: text(&self.model.profile_pic_column),
        }
    }
}

#[async_trait]
impl AdminDao for DocumentAdminDao {
    async fn get_one_admin_by_filters(&self, lookup: &AdminLookup) -> AdminResult<AdminRecord> {
        self.store
            .find_one(&self.query(lookup))
            .await
            .map(|document| self.record(&document))
            .ok_or_else(|| AdminError::EntityNotFound(self.model.table.clone()))
    }

    async fn is_exists_at_least_one_admin(&self) -> AdminResult<bool> {
        Ok(self
            .store
            .find_one(&DocumentQuery::new(&self.model.table))
            .await
            .is_some())
    }

    async fn add_admin(
        &self,
        username: &str,
        password: &str,
        profile_pic: Option<&str>,
    ) -> AdminResult<AdminRecord> {
        let mut document = Row::new();
        document.insert(self.model.username_column.clone(), Value::from(username));
        document.insert(self.model.password_column.clone(), Value::from(password));
        document.insert(
            self.model.profile_pic_column.clone(),
            profile_pic.map_or(Value::Null, Value::from),
        );
        let id = self
            .store
            .insert(&self.model.table, &self.model.id_column, document)
            .await;
        tracing::debug!(username = %username, id = %id, "Inserted admin");
        Ok(AdminRecord {
            id,
            username: username.to_string(),
            password: password.to_string(),
            profile_pic: profile_pic.map(str::to_string),
        })
    }

    async fn update_admin(&self, lookup: &AdminLookup, update: &AdminUpdate) -> AdminResult<()> {
        let count = self
            .store
            .update(&self.query(lookup), |document| {
                if let Some(password) = &update.password {
                    document.insert(self.model.password_column.clone(), Value::from(password.as_str()));
                }
                if let Some(pic) = &update.profile_pic {
                    document.insert(self.model.profile_pic_column.clone(), Value::from(pic.as_str()));
                }
            })
            .await;
        match count {
            0 => Err(AdminError::EntityNotFound(self.model.table.clone())),
            _ => Ok(()),
        }
    }
}
