//! Model resources.
//!
//! A [`ModelResource`] is built once, when it is registered, from a
//! [`ModelMeta`] and the fields and filters the application declares. Fields
//! declared by name are scaffolded through the backend's converters; filters
//! declared by name become the backend's default filter. The resource is then
//! shared read-only by every request.
//!
//! ```
//! # use adminkit_admin::column::{ColumnKind, ColumnMeta, ModelMeta};
//! # use adminkit_admin::resource::ModelResource;
//! let meta = ModelMeta::new("user")
//!     .column(ColumnMeta::primary_key("id"))
//!     .column(ColumnMeta::new("username", ColumnKind::String));
//! let builder = ModelResource::builder(meta)
//!     .label("Users")
//!     .icon("ti ti-user")
//!     .fields(["username"])
//!     .filters(["username"])
//!     .page_size(25);
//! // builder.build(&backend) scaffolds the fields against a dialect.
//! # let _ = builder;
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use adminkit_core::{AdminError, AdminResult};
use adminkit_http::FormData;
use adminkit_widgets::filters::apply_filters;
use adminkit_widgets::inputs;
use adminkit_widgets::widget::{title_case, value_to_string};
use adminkit_widgets::{Filter, FilterableQuery, RenderContext};
use futures::future::{join_all, try_join_all};
use serde_json::Value;

use crate::backend::{OrmBackend, ResolvedForm, Row};
use crate::column::ModelMeta;
use crate::field::{Field, FieldDecl};
use crate::hooks::{Attributes, DefaultHooks, ResourceHooks};

/// Rows per page when the resource does not set one.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// The list cells of one page, with their attributes.
///
/// `rows`, `row_attributes` and `cell_attributes` have one entry per row;
/// `column_attributes` and each inner vector one entry per display field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedFields {
    /// Rendered cells, row by row.
    pub rows: Vec<Vec<String>>,
    /// Attributes of each row.
    pub row_attributes: Vec<Attributes>,
    /// Attributes of each column header.
    pub column_attributes: Vec<Attributes>,
    /// Attributes of each cell, row by row.
    pub cell_attributes: Vec<Vec<Attributes>>,
}

/// The controls of a create or update form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedInputs {
    /// Rendered controls in field order.
    pub inputs: Vec<String>,
    /// The form `enctype`: multipart when a file input is present.
    pub enctype: &'static str,
}

/// A filter declared on a resource.
#[derive(Debug)]
enum FilterDecl {
    Name(String),
    Filter(Arc<dyn Filter>),
}

/// Declares a [`ModelResource`].
pub struct ModelResourceBuilder {
    meta: ModelMeta,
    slug: Option<String>,
    label: Option<String>,
    icon: String,
    page_title: Option<String>,
    page_pre_title: Option<String>,
    fields: Vec<FieldDecl>,
    filters: Vec<FilterDecl>,
    page_size: Option<u64>,
    hooks: Arc<dyn ResourceHooks>,
}

impl fmt::Debug for ModelResourceBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelResourceBuilder")
            .field("model", &self.meta.name())
            .field("fields", &self.fields)
            .field("filters", &self.filters)
            .finish_non_exhaustive()
    }
}

impl ModelResourceBuilder {
    /// Sets the URL segment. Defaults to the model name.
    #[must_use]
    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    /// Sets the menu and page label. Defaults to the title-cased model name.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the menu icon classes.
    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    /// Sets the page title.
    #[must_use]
    pub fn page_title(mut self, title: impl Into<String>) -> Self {
        self.page_title = Some(title.into());
        self
    }

    /// Sets the line above the page title.
    #[must_use]
    pub fn page_pre_title(mut self, pre_title: impl Into<String>) -> Self {
        self.page_pre_title = Some(pre_title.into());
        self
    }

    /// Appends one field, by name or fully specified.
    #[must_use]
    pub fn field(mut self, field: impl Into<FieldDecl>) -> Self {
        self.fields.push(field.into());
        self
    }

    /// Appends fields by name or fully specified.
    #[must_use]
    pub fn fields<I, F>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FieldDecl>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Appends filters by field name, using the backend's default filter.
    #[must_use]
    pub fn filters<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters
            .extend(names.into_iter().map(|name| FilterDecl::Name(name.into())));
        self
    }

    /// Appends a configured filter.
    #[must_use]
    pub fn filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(FilterDecl::Filter(Arc::new(filter)));
        self
    }

    /// Sets the rows per page.
    #[must_use]
    pub const fn page_size(mut self, page_size: u64) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Sets the rows per page unless the resource chose its own.
    #[must_use]
    pub fn default_page_size(mut self, page_size: u64) -> Self {
        self.page_size.get_or_insert(page_size);
        self
    }

    /// The slug the resource will be registered under.
    pub fn slug_or_name(&self) -> &str {
        self.slug.as_deref().unwrap_or_else(|| self.meta.name())
    }

    /// Sets the list-page overrides.
    #[must_use]
    pub fn hooks(mut self, hooks: impl ResourceHooks + 'static) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    /// Scaffolds the fields and filters against `backend`.
    ///
    /// Fails with `FieldNotFound` when a field declared by name is not a
    /// column of the model.
    pub fn build(self, backend: &dyn OrmBackend) -> AdminResult<ModelResource> {
        let filters = scaffold_filters(self.filters, backend);
        let fields = scaffold_fields(&self.meta, self.fields, backend)?;
        let display_fields: Vec<Arc<Field>> = fields
            .iter()
            .filter(|f| !f.is_input_only())
            .cloned()
            .collect();
        let input_fields: Vec<Arc<Field>> = fields
            .iter()
            .filter(|f| !f.is_computed() && !f.is_display_only())
            .cloned()
            .collect();

        let slug = self.slug.unwrap_or_else(|| self.meta.name().to_string());
        let label = self.label.unwrap_or_else(|| title_case(self.meta.name()));
        tracing::debug!(
            resource = %slug,
            backend = backend.name(),
            display = display_fields.len(),
            input = input_fields.len(),
            filters = filters.len(),
            "Scaffolded model resource"
        );

        Ok(ModelResource {
            slug,
            label,
            icon: self.icon,
            page_title: self.page_title,
            page_pre_title: self.page_pre_title,
            meta: self.meta,
            fields,
            display_fields,
            input_fields,
            filters,
            page_size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1),
            hooks: self.hooks,
        })
    }
}

fn scaffold_filters(decls: Vec<FilterDecl>, backend: &dyn OrmBackend) -> Vec<Arc<dyn Filter>> {
    decls
        .into_iter()
        .map(|decl| match decl {
            FilterDecl::Name(name) => backend.default_filter(&name),
            FilterDecl::Filter(filter) => filter,
        })
        .collect()
}

fn scaffold_fields(
    meta: &ModelMeta,
    decls: Vec<FieldDecl>,
    backend: &dyn OrmBackend,
) -> AdminResult<Vec<Arc<Field>>> {
    let decls = if decls.is_empty() {
        meta.columns()
            .iter()
            .map(|c| FieldDecl::Name(c.name.clone()))
            .collect()
    } else {
        decls
    };

    let mut fields = Vec::with_capacity(decls.len() + 1);
    for decl in decls {
        match decl {
            FieldDecl::Name(name) => {
                let column = meta.get(&name).ok_or_else(|| AdminError::FieldNotFound {
                    model: meta.name().to_string(),
                    field: name.clone(),
                })?;
                if column.kind.is_backward() {
                    tracing::debug!(model = %meta.name(), field = %name, "Skipping backward relation");
                    continue;
                }
                fields.push(backend.converters().convert(column, backend));
            }
            FieldDecl::Field(field) => fields.push(field),
        }
    }

    let pk = meta.pk();
    match fields.iter().position(|f| f.name() == pk) {
        Some(0) => {}
        Some(index) => {
            let field = fields.remove(index);
            fields.insert(0, field);
        }
        None => {
            let field = meta.pk_column().map_or_else(
                || Field::new(pk).input(inputs::DisplayOnly::new()),
                |column| backend.converters().convert(column, backend),
            );
            fields.insert(0, field);
        }
    }

    Ok(fields.into_iter().map(Arc::new).collect())
}

/// The admin screens of one model.
pub struct ModelResource {
    slug: String,
    label: String,
    icon: String,
    page_title: Option<String>,
    page_pre_title: Option<String>,
    meta: ModelMeta,
    fields: Vec<Arc<Field>>,
    display_fields: Vec<Arc<Field>>,
    input_fields: Vec<Arc<Field>>,
    filters: Vec<Arc<dyn Filter>>,
    page_size: u64,
    hooks: Arc<dyn ResourceHooks>,
}

impl fmt::Debug for ModelResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelResource")
            .field("slug", &self.slug)
            .field("label", &self.label)
            .field("fields", &self.field_names())
            .field("filters", &self.filters.len())
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl ModelResource {
    /// Starts declaring a resource over `meta`.
    pub fn builder(meta: ModelMeta) -> ModelResourceBuilder {
        ModelResourceBuilder {
            meta,
            slug: None,
            label: None,
            icon: String::new(),
            page_title: None,
            page_pre_title: None,
            fields: Vec::new(),
            filters: Vec::new(),
            page_size: None,
            hooks: Arc::new(DefaultHooks),
        }
    }

    /// The URL segment.
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// The menu and page label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The menu icon classes.
    pub fn icon(&self) -> &str {
        &self.icon
    }

    /// The page title, if set.
    pub fn page_title(&self) -> Option<&str> {
        self.page_title.as_deref()
    }

    /// The line above the page title, if set.
    pub fn page_pre_title(&self) -> Option<&str> {
        self.page_pre_title.as_deref()
    }

    /// The model.
    pub fn meta(&self) -> &ModelMeta {
        &self.meta
    }

    /// Every scaffolded field, primary key first.
    pub fn fields(&self) -> &[Arc<Field>] {
        &self.fields
    }

    /// Fields shown as list columns. The primary key is always first.
    pub fn get_model_fields_for_display(&self) -> &[Arc<Field>] {
        &self.display_fields
    }

    /// Fields shown as form controls: no computed or display-only fields.
    pub fn get_model_fields_for_input(&self) -> &[Arc<Field>] {
        &self.input_fields
    }

    /// The list filters.
    pub fn filters(&self) -> &[Arc<dyn Filter>] {
        &self.filters
    }

    /// Rows per page.
    pub const fn page_size(&self) -> u64 {
        self.page_size
    }

    /// The list-page overrides.
    pub fn hooks(&self) -> &dyn ResourceHooks {
        self.hooks.as_ref()
    }

    /// Column headers of the list.
    pub fn field_labels(&self) -> Vec<&str> {
        self.display_fields.iter().map(|f| f.label_text()).collect()
    }

    /// Names of the list columns.
    pub fn field_names(&self) -> Vec<&str> {
        self.display_fields.iter().map(|f| f.name()).collect()
    }

    /// The primary key of `row` as text.
    pub fn pk_of(&self, row: &Row) -> String {
        row.get(self.meta.pk())
            .map(value_to_string)
            .unwrap_or_default()
    }

    /// Drops empty query values.
    pub fn parse_query_params(&self, params: &HashMap<String, String>) -> HashMap<String, String> {
        params
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Narrows a native query by every filter with a value in `params`.
    ///
    /// Values failing validation leave the query unchanged.
    pub fn enrich_select_with_filters<Q: FilterableQuery>(
        &self,
        params: &HashMap<String, String>,
        query: Q,
    ) -> Q {
        apply_filters(&self.filters, params, query)
    }

    /// Renders the list cells of `rows` and computes their attributes.
    pub async fn render_fields(
        &self,
        cx: &RenderContext<'_>,
        rows: &[Row],
    ) -> AdminResult<RenderedFields> {
        let hooks = self.hooks.as_ref();
        let fields = &self.display_fields;

        let cells = try_join_all(rows.iter().map(|row| {
            try_join_all(fields.iter().map(move |field| field.render(cx, row)))
        }));
        let row_attributes = join_all(rows.iter().map(|row| hooks.row_attributes(cx, row)));
        let column_attributes =
            join_all(fields.iter().map(|field| hooks.column_attributes(cx, field)));
        let cell_attributes = join_all(rows.iter().map(|row| {
            join_all(
                fields
                    .iter()
                    .map(move |field| hooks.cell_attributes(cx, row, field)),
            )
        }));

        let (cells, row_attributes, column_attributes, cell_attributes) =
            futures::join!(cells, row_attributes, column_attributes, cell_attributes);

        Ok(RenderedFields {
            rows: cells?,
            row_attributes,
            column_attributes,
            cell_attributes,
        })
    }

    /// Renders the form controls, filled from `obj` when editing.
    pub async fn render_inputs(
        &self,
        cx: &RenderContext<'_>,
        obj: Option<&Row>,
    ) -> AdminResult<RenderedInputs> {
        let mut rendered = Vec::with_capacity(self.input_fields.len());
        let mut enctype = "application/x-www-form-urlencoded";
        for field in &self.input_fields {
            let input = field.input_widget();
            if input.input_type().is_file() {
                enctype = "multipart/form-data";
            }
            let value = obj
                .and_then(|row| row.get(field.name()))
                .cloned()
                .unwrap_or(Value::Null);
            rendered.push(input.render(cx, &value).await?);
        }
        Ok(RenderedInputs {
            inputs: rendered,
            enctype,
        })
    }

    /// Renders the filter controls, pre-filled from the query.
    pub async fn render_filters(
        &self,
        cx: &RenderContext<'_>,
        params: &HashMap<String, String>,
    ) -> AdminResult<Vec<String>> {
        try_join_all(
            self.filters
                .iter()
                .map(|filter| filter.render(cx, params.get(filter.name()).map(String::as_str))),
        )
        .await
    }

    /// Parses a submitted form into column values and many-to-many values.
    ///
    /// Fields missing from the form are left out so an update keeps them.
    pub async fn resolve_form_data(&self, form: &FormData) -> AdminResult<ResolvedForm> {
        let mut resolved = ResolvedForm::default();
        for field in &self.input_fields {
            let input = field.input_widget();
            let Some(value) = input.parse(form).await? else {
                continue;
            };
            if input.input_type().is_many_to_many() {
                let keys = match value {
                    Value::Array(items) => items,
                    Value::Null => Vec::new(),
                    other => vec![other],
                };
                resolved.many_to_many.insert(field.name().to_string(), keys);
            } else {
                resolved.data.insert(field.name().to_string(), value);
            }
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use adminkit_widgets::displays;
    use adminkit_widgets::filters::DateRange;
    use adminkit_widgets::options::EnumChoices;
    use adminkit_widgets::{Condition, FilterClause, InputType};
    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::column::{ColumnKind, ColumnMeta, Relation, Through};
    use crate::testing::{templates, StubBackend};

    fn article_meta() -> ModelMeta {
        ModelMeta::new("article")
            .column(ColumnMeta::primary_key("id"))
            .column(ColumnMeta::new("title", ColumnKind::String).description("Headline"))
            .column(ColumnMeta::new("published", ColumnKind::Boolean))
            .column(ColumnMeta::new("created_at", ColumnKind::DateTime).server_default())
            .column(ColumnMeta::enumeration(
                "status",
                EnumChoices::ints([("draft", 0), ("live", 1)]),
            ))
            .column(ColumnMeta::foreign_key(
                "category",
                "category_id",
                Relation::new("category").label_column("name"),
            ))
            .column(ColumnMeta::many_to_many(
                "tags",
                Relation::new("tag"),
                Through {
                    table: "article_tag".into(),
                    source_column: "article_id".into(),
                    target_column: "tag_id".into(),
                },
            ))
            .column(ColumnMeta::new("comments", ColumnKind::BackwardRelation))
    }

    fn rows() -> Vec<Row> {
        vec![
            json!({"id": 1, "title": "First", "published": true, "created_at": "2024-01-02 03:04:05", "status": 1, "category_id": 2}),
            json!({"id": 2, "title": "Second", "published": false, "created_at": null, "status": 0, "category_id": 1}),
            json!({"id": 3, "title": "Third", "published": false, "created_at": null, "status": 0, "category_id": null}),
        ]
        .into_iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect()
    }

    // ============ Scaffolding ============

    #[test]
    fn test_pk_is_first_when_omitted() {
        let resource = ModelResource::builder(article_meta())
            .fields(["title", "published"])
            .build(&StubBackend::default())
            .unwrap();
        assert_eq!(resource.field_names(), vec!["id", "title", "published"]);
    }

    #[test]
    fn test_pk_is_moved_to_front() {
        let resource = ModelResource::builder(article_meta())
            .fields(["title", "id", "published"])
            .build(&StubBackend::default())
            .unwrap();
        assert_eq!(resource.get_model_fields_for_display()[0].name(), "id");
        assert_eq!(resource.fields().iter().filter(|f| f.name() == "id").count(), 1);
    }

    #[test]
    fn test_pk_is_first_for_custom_fields() {
        let resource = ModelResource::builder(article_meta())
            .field(Field::computed("summary", |row: &Row| row["title"].clone()))
            .field("title")
            .build(&StubBackend::default())
            .unwrap();
        assert_eq!(resource.field_names(), vec!["id", "summary", "title"]);
    }

    #[test]
    fn test_all_columns_when_no_fields_declared() {
        let resource = ModelResource::builder(article_meta())
            .build(&StubBackend::default())
            .unwrap();
        let names: Vec<&str> = resource.fields().iter().map(|f| f.name()).collect();
        assert_eq!(
            names,
            vec!["id", "title", "published", "created_at", "status", "category_id", "tags"]
        );
        // Many-to-many values are not list columns.
        assert!(!resource.field_names().contains(&"tags"));
    }

    #[test]
    fn test_unknown_field_fails_fast() {
        let err = ModelResource::builder(article_meta())
            .fields(["title", "nope"])
            .build(&StubBackend::default())
            .unwrap_err();
        assert!(matches!(
            err,
            AdminError::FieldNotFound { ref model, ref field } if model == "article" && field == "nope"
        ));
    }

    #[test]
    fn test_input_fields_exclude_display_only_and_computed() {
        let resource = ModelResource::builder(article_meta())
            .fields(["title", "created_at", "category", "tags"])
            .field(Field::computed("summary", |row: &Row| row["title"].clone()))
            .field(
                Field::new("secret")
                    .display(displays::InputOnly::new())
                    .input(inputs::Text::password()),
            )
            .build(&StubBackend::default())
            .unwrap();

        let inputs: Vec<&str> = resource
            .get_model_fields_for_input()
            .iter()
            .map(|f| f.name())
            .collect();
        assert_eq!(inputs, vec!["title", "category_id", "tags", "secret"]);

        // Display-only fields stay listed; input-only fields do not.
        let display = resource.field_names();
        assert!(display.contains(&"created_at"));
        assert!(display.contains(&"summary"));
        assert!(!display.contains(&"secret"));
    }

    #[test]
    fn test_converters_by_kind() {
        let resource = ModelResource::builder(article_meta())
            .build(&StubBackend::default())
            .unwrap();
        let kinds: HashMap<&str, InputType> = resource
            .fields()
            .iter()
            .map(|f| (f.name(), f.input_widget().input_type()))
            .collect();
        assert_eq!(kinds["id"], InputType::DisplayOnly);
        assert_eq!(kinds["title"], InputType::TextArea);
        assert_eq!(kinds["published"], InputType::Switch);
        assert_eq!(kinds["created_at"], InputType::DisplayOnly);
        assert_eq!(kinds["status"], InputType::Enum);
        assert_eq!(kinds["category_id"], InputType::ForeignKey);
        assert_eq!(kinds["tags"], InputType::ManyToMany);

        let category = resource.fields().iter().find(|f| f.name() == "category_id").unwrap();
        assert_eq!(category.label_text(), "Category");
        let title = resource.fields().iter().find(|f| f.name() == "title").unwrap();
        assert_eq!(title.input_widget().widget().get_str("placeholder"), "Headline");
    }

    #[test]
    fn test_string_filters_use_default_filter() {
        let resource = ModelResource::builder(article_meta())
            .filters(["title"])
            .filter(DateRange::new("created_at"))
            .build(&StubBackend::default())
            .unwrap();
        let names: Vec<&str> = resource.filters().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["title", "created_at"]);
        assert_eq!(resource.filters()[0].label(), "Title");
        assert_eq!(resource.page_size(), DEFAULT_PAGE_SIZE);
    }

    // ============ Rendering ============

    #[tokio::test]
    async fn test_render_fields_is_index_aligned() {
        let resource = ModelResource::builder(article_meta())
            .fields(["title", "published", "created_at", "status"])
            .build(&StubBackend::default())
            .unwrap();
        let t = templates();
        let cx = RenderContext::new(&t, "en");
        let rows = rows();

        let rendered = resource.render_fields(&cx, &rows).await.unwrap();
        assert_eq!(rendered.rows.len(), rows.len());
        assert_eq!(rendered.row_attributes.len(), rows.len());
        assert_eq!(rendered.cell_attributes.len(), rows.len());
        assert_eq!(
            rendered.column_attributes.len(),
            resource.get_model_fields_for_display().len()
        );
        for (cells, attributes) in rendered.rows.iter().zip(&rendered.cell_attributes) {
            assert_eq!(cells.len(), resource.get_model_fields_for_display().len());
            assert_eq!(attributes.len(), cells.len());
        }
        assert_eq!(rendered.rows[0][0], "1");
        assert_eq!(rendered.rows[0][1], "First");
        assert_eq!(rendered.rows[0][3], "2024-01-02 03:04:05");
        assert_eq!(rendered.rows[0][4], "live");
        assert_eq!(rendered.rows[1][3], "");
    }

    struct Highlight;

    #[async_trait]
    impl ResourceHooks for Highlight {
        async fn row_attributes(&self, _cx: &RenderContext<'_>, row: &Row) -> Attributes {
            let mut attributes = Attributes::new();
            if row.get("status") == Some(&json!(0)) {
                attributes.insert("class".into(), "bg-red-lt".into());
            }
            attributes
        }

        async fn cell_attributes(
            &self,
            _cx: &RenderContext<'_>,
            _row: &Row,
            field: &Field,
        ) -> Attributes {
            let mut attributes = Attributes::new();
            attributes.insert("data-field".into(), field.name().into());
            attributes
        }
    }

    #[tokio::test]
    async fn test_hooks_feed_attributes() {
        let resource = ModelResource::builder(article_meta())
            .fields(["title"])
            .hooks(Highlight)
            .build(&StubBackend::default())
            .unwrap();
        let t = templates();
        let cx = RenderContext::new(&t, "en");
        let rendered = resource.render_fields(&cx, &rows()).await.unwrap();
        assert!(rendered.row_attributes[0].is_empty());
        assert_eq!(rendered.row_attributes[1]["class"], "bg-red-lt");
        assert_eq!(rendered.cell_attributes[2][1]["data-field"], "title");
        assert!(rendered.column_attributes.iter().all(Attributes::is_empty));
    }

    #[tokio::test]
    async fn test_render_inputs_with_values() {
        let resource = ModelResource::builder(article_meta())
            .fields(["title", "published", "category"])
            .build(&StubBackend::default())
            .unwrap();
        let t = templates();
        let cx = RenderContext::new(&t, "en");

        let empty = resource.render_inputs(&cx, None).await.unwrap();
        assert_eq!(empty.inputs.len(), 3);
        assert_eq!(empty.enctype, "application/x-www-form-urlencoded");

        let row = &rows()[0];
        let filled = resource.render_inputs(&cx, Some(row)).await.unwrap();
        assert!(filled.inputs[0].contains("First"));
        assert!(filled.inputs[1].contains("checked"));
        assert!(filled.inputs[2].contains("<option value=\"2\" selected>Blog</option>"));
    }

    #[tokio::test]
    async fn test_render_filters_prefilled() {
        let resource = ModelResource::builder(article_meta())
            .filters(["title"])
            .build(&StubBackend::default())
            .unwrap();
        let t = templates();
        let cx = RenderContext::new(&t, "en");
        let params = HashMap::from([("title".to_string(), "rust".to_string())]);
        let filters = resource.render_filters(&cx, &params).await.unwrap();
        assert_eq!(filters.len(), 1);
        assert!(filters[0].contains("value=\"rust\""));
    }

    // ============ Forms and queries ============

    #[tokio::test]
    async fn test_resolve_form_data_separates_many_to_many() {
        let resource = ModelResource::builder(article_meta())
            .fields(["title", "published", "status", "tags"])
            .build(&StubBackend::default())
            .unwrap();
        let form = FormData::from_urlencoded(b"title=Hi&published=on&status=1&tags=1&tags=3");
        let resolved = resource.resolve_form_data(&form).await.unwrap();
        assert_eq!(resolved.data["title"], json!("Hi"));
        assert_eq!(resolved.data["published"], json!(true));
        assert_eq!(resolved.data["status"], json!(1));
        assert!(!resolved.data.contains_key("tags"));
        assert_eq!(resolved.many_to_many["tags"], vec![json!("1"), json!("3")]);
    }

    #[tokio::test]
    async fn test_resolve_rejects_unknown_enum_member() {
        let resource = ModelResource::builder(article_meta())
            .fields(["status"])
            .build(&StubBackend::default())
            .unwrap();
        let form = FormData::from_urlencoded(b"status=7");
        assert!(resource.resolve_form_data(&form).await.is_err());
    }

    #[derive(Debug, Default)]
    struct Recorded(Vec<FilterClause>);

    impl FilterableQuery for Recorded {
        fn apply_clause(mut self, clause: &FilterClause) -> Self {
            self.0.push(clause.clone());
            self
        }
    }

    #[test]
    fn test_enrich_select_with_date_range() {
        let resource = ModelResource::builder(article_meta())
            .filters(["title"])
            .filter(DateRange::new("created_at"))
            .build(&StubBackend::default())
            .unwrap();
        let params = resource.parse_query_params(&HashMap::from([
            ("created_at".to_string(), "2024-01-01 - 2024-01-31".to_string()),
            ("title".to_string(), String::new()),
        ]));
        assert!(!params.contains_key("title"));

        let query = resource.enrich_select_with_filters(&params, Recorded::default());
        assert_eq!(
            query.0,
            vec![FilterClause::new(
                "created_at",
                Condition::Between(json!("2024-01-01 00:00:00"), json!("2024-01-31 00:00:00"))
            )]
        );
    }

    #[test]
    fn test_pk_of() {
        let resource = ModelResource::builder(article_meta())
            .build(&StubBackend::default())
            .unwrap();
        assert_eq!(resource.pk_of(&rows()[1]), "2");
    }
}
