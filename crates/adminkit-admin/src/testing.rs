//! In-crate test doubles.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use adminkit_core::i18n::I18nTranslator;
use adminkit_core::{AdminError, AdminResult};
use adminkit_template::Templates;
use adminkit_widgets::filters::Search;
use adminkit_widgets::options::{OptionsSource, StaticOptions};
use adminkit_widgets::Filter;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::backend::{OrmBackend, Pagination, ResolvedForm, ResourceList, Row};
use crate::column::{ModelMeta, Relation};
use crate::converters::ConverterRegistry;
use crate::dao::{AdminDao, AdminLookup, AdminRecord, AdminUpdate};
use crate::resource::ModelResource;

pub(crate) fn templates() -> Templates {
    Templates::new(Arc::new(I18nTranslator::builder().build().unwrap())).unwrap()
}

/// Rows of one model kept in a vector. Filters are ignored.
#[derive(Debug, Default)]
pub(crate) struct StubBackend {
    converters: ConverterRegistry,
    rows: Mutex<Vec<Row>>,
}

impl StubBackend {
    pub(crate) fn with_rows(rows: Vec<Value>) -> Self {
        Self {
            converters: ConverterRegistry::standard(),
            rows: Mutex::new(
                rows.into_iter()
                    .filter_map(|v| v.as_object().cloned())
                    .collect(),
            ),
        }
    }

    pub(crate) fn rows(&self) -> Vec<Row> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

fn pk_matches(row: &Row, meta: &ModelMeta, pk: &str) -> bool {
    row.get(meta.pk())
        .is_some_and(|v| adminkit_widgets::widget::value_to_string(v) == pk)
}

struct NoAdmins;

#[async_trait]
impl AdminDao for NoAdmins {
    async fn get_one_admin_by_filters(&self, _: &AdminLookup) -> AdminResult<AdminRecord> {
        Err(AdminError::EntityNotFound("admin".into()))
    }

    async fn is_exists_at_least_one_admin(&self) -> AdminResult<bool> {
        Ok(false)
    }

    async fn add_admin(&self, _: &str, _: &str, _: Option<&str>) -> AdminResult<AdminRecord> {
        Err(AdminError::Internal("read-only".into()))
    }

    async fn update_admin(&self, _: &AdminLookup, _: &AdminUpdate) -> AdminResult<()> {
        Ok(())
    }
}

#[async_trait]
impl OrmBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    fn default_filter(&self, name: &str) -> Arc<dyn Filter> {
        Arc::new(Search::new(name))
    }

    fn relation_options(&self, _relation: &Relation) -> Arc<dyn OptionsSource> {
        Arc::new(StaticOptions::new([("News", 1), ("Blog", 2)]))
    }

    fn admin_dao(&self) -> Arc<dyn AdminDao> {
        Arc::new(NoAdmins)
    }

    async fn list(
        &self,
        _resource: &ModelResource,
        _params: &HashMap<String, String>,
        page: Pagination,
    ) -> AdminResult<ResourceList> {
        let rows = self.rows();
        let total = rows.len() as u64;
        let models = rows
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.page_size as usize)
            .collect();
        Ok(ResourceList {
            models,
            total_entries_count: total,
        })
    }

    async fn get(&self, meta: &ModelMeta, pk: &str) -> AdminResult<Option<Row>> {
        Ok(self.rows().into_iter().find(|row| pk_matches(row, meta, pk)))
    }

    async fn create(&self, meta: &ModelMeta, form: ResolvedForm) -> AdminResult<Value> {
        let mut rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        let pk = json!(rows.len() + 1);
        let mut row = form.data;
        row.insert(meta.pk().to_string(), pk.clone());
        rows.push(row);
        Ok(pk)
    }

    async fn update(&self, meta: &ModelMeta, pk: &str, form: ResolvedForm) -> AdminResult<()> {
        let mut rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        let row = rows
            .iter_mut()
            .find(|row| pk_matches(row, meta, pk))
            .ok_or_else(|| AdminError::NotFound(pk.to_string()))?;
        row.extend(form.data);
        Ok(())
    }

    async fn delete(&self, meta: &ModelMeta, pks: &[String]) -> AdminResult<u64> {
        let mut rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        let before = rows.len();
        rows.retain(|row| !pks.iter().any(|pk| pk_matches(row, meta, pk)));
        Ok((before - rows.len()) as u64)
    }
}
