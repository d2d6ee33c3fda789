//! The document dialect over in-memory JSON collections.
//!
//! [`DocumentStore`] keeps each collection as a vector of JSON objects.
//! [`DocumentBackend`] runs the admin against it: filters become
//! [`DocumentQuery`] lookups, many-to-many values are stored as arrays on the
//! document itself, and integer keys are assigned on insert.

mod dao;
mod query;

use std::collections::HashMap;
use std::sync::Arc;

use adminkit_admin::backend::{OrmBackend, Pagination, ResolvedForm, ResourceList, Row};
use adminkit_admin::column::{ColumnKind, ModelMeta, Relation};
use adminkit_admin::converters::{convert_text, ConverterRegistry};
use adminkit_admin::dao::{AdminDao, AdminModel};
use adminkit_admin::ModelResource;
use adminkit_core::{AdminError, AdminResult};
use adminkit_widgets::filters::{Search, SearchMode};
use adminkit_widgets::options::OptionsSource;
use adminkit_widgets::widget::value_to_string;
use adminkit_widgets::Filter;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

pub use dao::DocumentAdminDao;
pub use query::{DocumentQuery, Lookup, LookupOp};

// ── Store ───────────────────────────────────────────────────────────────

/// Named collections of JSON documents.
///
/// Cheap to clone; clones share the same collections.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    collections: Arc<RwLock<HashMap<String, Vec<Row>>>>,
}

impl DocumentStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `document` into `collection`, returning its key.
    ///
    /// A missing or null `pk` is set to one more than the largest integer
    /// key in the collection.
    pub async fn insert(&self, collection: &str, pk: &str, mut document: Row) -> Value {
        let mut collections = self.collections.write().await;
        let documents = collections.entry(collection.to_string()).or_default();
        let key = match document.get(pk) {
            Some(key) if !key.is_null() => key.clone(),
            _ => {
                let next = documents
                    .iter()
                    .filter_map(|d| d.get(pk).and_then(Value::as_i64))
                    .max()
                    .unwrap_or(0)
                    + 1;
                Value::from(next)
            }
        };
        document.insert(pk.to_string(), key.clone());
        documents.push(document);
        key
    }

    /// Documents matching `query`, in insertion order.
    pub async fn find(&self, query: &DocumentQuery) -> Vec<Row> {
        self.collections
            .read()
            .await
            .get(query.collection())
            .map(|documents| {
                documents
                    .iter()
                    .filter(|d| query.matches(d))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The first document matching `query`.
    pub async fn find_one(&self, query: &DocumentQuery) -> Option<Row> {
        self.collections
            .read()
            .await
            .get(query.collection())?
            .iter()
            .find(|d| query.matches(d))
            .cloned()
    }

    /// Applies `f` to every document matching `query`, returning how many
    /// were changed.
    pub async fn update<F>(&self, query: &DocumentQuery, mut f: F) -> u64
    where
        F: FnMut(&mut Row),
    {
        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(query.collection()) else {
            return 0;
        };
        let mut count = 0;
        for document in documents.iter_mut().filter(|d| query.matches(d)) {
            f(document);
            count += 1;
        }
        count
    }

    /// Removes every document matching `query`, returning how many were removed.
    pub async fn delete(&self, query: &DocumentQuery) -> u64 {
        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(query.collection()) else {
            return 0;
        };
        let before = documents.len();
        documents.retain(|d| !query.matches(d));
        (before - documents.len()) as u64
    }
}

// ── Relation options ────────────────────────────────────────────────────

/// `(label, key)` options read from the related collection.
#[derive(Debug, Clone)]
pub struct DocumentRelationOptions {
    store: DocumentStore,
    relation: Relation,
}

#[async_trait]
impl OptionsSource for DocumentRelationOptions {
    async fn options(&self) -> AdminResult<Vec<(String, Value)>> {
        let documents = self
            .store
            .find(&DocumentQuery::new(&self.relation.target))
            .await;
        Ok(documents
            .iter()
            .map(|d| {
                let label = d.get(&self.relation.label_column).unwrap_or(&Value::Null);
                let key = d
                    .get(&self.relation.target_pk)
                    .cloned()
                    .unwrap_or(Value::Null);
                (value_to_string(label), key)
            })
            .collect())
    }
}

// ── Backend ─────────────────────────────────────────────────────────────

/// The document dialect.
///
/// String columns get a single-line input, and filters declared by name
/// match case-insensitive substrings.
#[derive(Debug)]
pub struct DocumentBackend {
    store: DocumentStore,
    converters: ConverterRegistry,
    admin_model: AdminModel,
}

impl DocumentBackend {
    /// A backend over `store`.
    pub fn new(store: DocumentStore) -> Self {
        let mut converters = ConverterRegistry::standard();
        converters.register(ColumnKind::String, convert_text);
        Self {
            store,
            converters,
            admin_model: AdminModel::default(),
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

    /// The shared store.
    pub fn store(&self) -> &DocumentStore {
        &self.store
    }
}

fn by_pk(meta: &ModelMeta, pk: &str) -> DocumentQuery {
    DocumentQuery::new(meta.name()).filter(meta.pk(), Value::String(pk.to_string()))
}

/// Moves the many-to-many values of `form` onto `document` as arrays.
fn embed_many_to_many(
    meta: &ModelMeta,
    document: &mut Row,
    values: HashMap<String, Vec<Value>>,
) -> AdminResult<()> {
    for (name, keys) in values {
        if !meta
            .get(&name)
            .is_some_and(|c| c.kind == ColumnKind::ManyToMany)
        {
            return Err(AdminError::FieldNotFound {
                model: meta.name().to_string(),
                field: name,
            });
        }
        document.insert(name, Value::Array(keys));
    }
    Ok(())
}

#[async_trait]
impl OrmBackend for DocumentBackend {
    fn name(&self) -> &'static str {
        "document"
    }

    fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    fn default_filter(&self, name: &str) -> Arc<dyn Filter> {
        Arc::new(Search::with_mode(name, SearchMode::IContains))
    }

    fn relation_options(&self, relation: &Relation) -> Arc<dyn OptionsSource> {
        Arc::new(DocumentRelationOptions {
            store: self.store.clone(),
            relation: relation.clone(),
        })
    }

    fn admin_dao(&self) -> Arc<dyn AdminDao> {
        Arc::new(DocumentAdminDao::new(
            self.store.clone(),
            self.admin_model.clone(),
        ))
    }

    async fn list(
        &self,
        resource: &ModelResource,
        params: &HashMap<String, String>,
        page: Pagination,
    ) -> AdminResult<ResourceList> {
        let params = resource.parse_query_params(params);
        let query = resource
            .enrich_select_with_filters(&params, DocumentQuery::new(resource.meta().name()));
        tracing::debug!(
            collection = %query.collection(),
            lookups = query.lookups().len(),
            page = page.page_num,
            "Listing documents"
        );
        let documents = self.store.find(&query).await;
        let skip = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(page.page_size).unwrap_or(usize::MAX);
        Ok(ResourceList {
            total_entries_count: documents.len() as u64,
            models: documents.into_iter().skip(skip).take(take).collect(),
        })
    }

    async fn get(&self, meta: &ModelMeta, pk: &str) -> AdminResult<Option<Row>> {
        let Some(mut document) = self.store.find_one(&by_pk(meta, pk)).await else {
            return Ok(None);
        };
        for column in meta.many_to_many() {
            document
                .entry(column.name.clone())
                .or_insert_with(|| Value::Array(Vec::new()));
        }
        Ok(Some(document))
    }

    async fn create(&self, meta: &ModelMeta, form: ResolvedForm) -> AdminResult<Value> {
        let mut document = form.data;
        embed_many_to_many(meta, &mut document, form.many_to_many)?;
        let pk = self.store.insert(meta.name(), meta.pk(), document).await;
        tracing::debug!(collection = %meta.name(), pk = %pk, "Inserted document");
        Ok(pk)
    }

    async fn update(&self, meta: &ModelMeta, pk: &str, form: ResolvedForm) -> AdminResult<()> {
        let mut changes = form.data;
        embed_many_to_many(meta, &mut changes, form.many_to_many)?;
        let count = self
            .store
            .update(&by_pk(meta, pk), |document| {
                for (key, value) in &changes {
                    document.insert(key.clone(), value.clone());
                }
            })
            .await;
        if count == 0 {
            return Err(AdminError::NotFound(format!("{} {pk}", meta.name())));
        }
        Ok(())
    }

    async fn delete(&self, meta: &ModelMeta, pks: &[String]) -> AdminResult<u64> {
        if pks.is_empty() {
            return Ok(0);
        }
        let keys = pks.iter().cloned().map(Value::String).collect();
        let query = DocumentQuery::new(meta.name()).filter(&format!("{}__in", meta.pk()), Value::Array(keys));
        let count = self.store.delete(&query).await;
        tracing::debug!(collection = %meta.name(), count, "Deleted documents");
        Ok(count)
    }
}
