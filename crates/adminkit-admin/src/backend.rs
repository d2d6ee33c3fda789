//! The ORM backend contract.
//!
//! An [`OrmBackend`] is the strategy a dialect plugs into the admin: it
//! supplies the column-to-field converters and the default list filter,
//! lists related rows for select inputs, and runs the CRUD operations the
//! admin routes dispatch. Rows travel as JSON objects so one admin serves
//! every model.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use adminkit_core::AdminResult;
use adminkit_widgets::options::OptionsSource;
use adminkit_widgets::Filter;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::column::{ModelMeta, Relation};
use crate::converters::ConverterRegistry;
use crate::dao::AdminDao;
use crate::resource::ModelResource;

/// One entity as a JSON object keyed by column.
pub type Row = Map<String, Value>;

/// One page of a list query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceList {
    /// The rows of the page.
    pub models: Vec<Row>,
    /// Rows matching the filters across all pages.
    pub total_entries_count: u64,
}

/// Largest accepted page size.
pub const MAX_PAGE_SIZE: u64 = 1000;

/// Largest accepted page number.
pub const MAX_PAGE_NUM: u64 = u32::MAX as u64;

/// Which page of a list to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// The page number, starting at 1.
    pub page_num: u64,
    /// Rows per page.
    pub page_size: u64,
}

impl Pagination {
    /// A page. Zero values are raised to 1; values past [`MAX_PAGE_NUM`]
    /// and [`MAX_PAGE_SIZE`] are lowered to them.
    pub fn new(page_num: u64, page_size: u64) -> Self {
        Self {
            page_num: page_num.clamp(1, MAX_PAGE_NUM),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Rows to skip.
    pub const fn offset(&self) -> u64 {
        self.page_num.saturating_sub(1).saturating_mul(self.page_size)
    }

    /// Pages needed for `total` rows, at least 1.
    pub fn page_count(&self, total: u64) -> u64 {
        total.div_ceil(self.page_size).max(1)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, 10)
    }
}

/// A submitted form split into column values and many-to-many values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedForm {
    /// Values assigned to columns.
    pub data: Row,
    /// Selected related keys, keyed by many-to-many field name. Associated
    /// after the row is written.
    pub many_to_many: HashMap<String, Vec<Value>>,
}

/// A dialect the admin runs against.
#[async_trait]
pub trait OrmBackend: Send + Sync + fmt::Debug {
    /// A short dialect name for logs.
    fn name(&self) -> &'static str;

    /// The column-to-field converters of this dialect.
    fn converters(&self) -> &ConverterRegistry;

    /// The filter used for filters declared by name.
    fn default_filter(&self, name: &str) -> Arc<dyn Filter>;

    /// The `(label, key)` options of a relation.
    fn relation_options(&self, relation: &Relation) -> Arc<dyn OptionsSource>;

    /// The data-access object for admin accounts.
    fn admin_dao(&self) -> Arc<dyn AdminDao>;

    /// Lists one page of `resource`, narrowed by the filter values in `params`.
    async fn list(
        &self,
        resource: &ModelResource,
        params: &HashMap<String, String>,
        page: Pagination,
    ) -> AdminResult<ResourceList>;

    /// Fetches one row by primary key, with its many-to-many keys.
    async fn get(&self, meta: &ModelMeta, pk: &str) -> AdminResult<Option<Row>>;

    /// Inserts a row and associates its many-to-many values in one transaction.
    ///
    /// Returns the primary key of the new row.
    async fn create(&self, meta: &ModelMeta, form: ResolvedForm) -> AdminResult<Value>;

    /// Updates a row and replaces its many-to-many values in one transaction.
    async fn update(&self, meta: &ModelMeta, pk: &str, form: ResolvedForm) -> AdminResult<()>;

    /// Deletes rows by primary key, returning how many were removed.
    async fn delete(&self, meta: &ModelMeta, pks: &[String]) -> AdminResult<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination() {
        let page = Pagination::new(3, 10);
        assert_eq!(page.offset(), 20);
        assert_eq!(page.page_count(0), 1);
        assert_eq!(page.page_count(10), 1);
        assert_eq!(page.page_count(11), 2);
    }

    #[test]
    fn test_pagination_clamps_huge_values() {
        let page = Pagination::new(u64::MAX, u64::MAX);
        assert_eq!(page.page_num, MAX_PAGE_NUM);
        assert_eq!(page.page_size, MAX_PAGE_SIZE);
        assert_eq!(page.offset(), (MAX_PAGE_NUM - 1) * MAX_PAGE_SIZE);
        assert!(i64::try_from(page.offset()).is_ok());
        assert_eq!(page.page_count(u64::MAX), u64::MAX.div_ceil(MAX_PAGE_SIZE));
    }

    #[test]
    fn test_pagination_clamps_zero() {
        let page = Pagination::new(0, 0);
        assert_eq!(page.page_num, 1);
        assert_eq!(page.page_size, 1);
        assert_eq!(page.offset(), 0);
    }
}
