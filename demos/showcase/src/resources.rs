//! The showcase schema, its resources and the `switch_status` action.

use std::sync::Arc;

use adminkit::admin::actions::{self, HttpMethod};
use adminkit::admin::hooks::Attributes;
use adminkit::admin::{AdminAppBuilder, ResolvedForm, Row};
use adminkit::async_trait;
use adminkit::core::files::StaticFilesManager;
use adminkit::http::HttpResult;
use adminkit::prelude::*;
use adminkit::widgets::RenderContext;
use axum::extract::{Path, State};
use axum::routing::put;
use axum::Json;
use serde_json::{json, Value};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS admin (
        id INTEGER PRIMARY KEY,
        username VARCHAR(50) NOT NULL UNIQUE,
        password VARCHAR(200) NOT NULL,
        profile_pic VARCHAR(200)
    );
    CREATE TABLE IF NOT EXISTS category (
        id INTEGER PRIMARY KEY,
        slug VARCHAR(200) NOT NULL,
        name VARCHAR(200) NOT NULL,
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
    );
    CREATE TABLE IF NOT EXISTS tag (
        id INTEGER PRIMARY KEY,
        name VARCHAR(50) NOT NULL
    );
    CREATE TABLE IF NOT EXISTS product (
        id INTEGER PRIMARY KEY,
        name VARCHAR(50) NOT NULL,
        view_num INTEGER NOT NULL DEFAULT 0,
        sort INTEGER NOT NULL DEFAULT 0,
        is_reviewed BOOLEAN NOT NULL DEFAULT 0,
        image VARCHAR(200),
        body TEXT,
        category_id INTEGER REFERENCES category(id),
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
    );
    CREATE TABLE IF NOT EXISTS product_tag (
        product_id INTEGER NOT NULL REFERENCES product(id),
        tag_id INTEGER NOT NULL REFERENCES tag(id)
    );
    CREATE TABLE IF NOT EXISTS config (
        id INTEGER PRIMARY KEY,
        label VARCHAR(200) NOT NULL,
        key VARCHAR(20) NOT NULL UNIQUE,
        value JSON NOT NULL DEFAULT '{}',
        status BOOLEAN NOT NULL DEFAULT 1
    );
";

const SAMPLE_ROWS: &str = "
    INSERT INTO category (slug, name) VALUES ('books', 'Books'), ('games', 'Games');
    INSERT INTO tag (name) VALUES ('new'), ('sale');
    INSERT INTO product (name, view_num, is_reviewed, category_id) VALUES
        ('The Rust Book', 120, 1, 1),
        ('Chess', 40, 0, 2);
    INSERT INTO product_tag (product_id, tag_id) VALUES (1, 1), (2, 2);
    INSERT INTO config (label, key, value, status) VALUES
        ('Site name', 'site_name', '{\"text\": \"Showcase\"}', 1),
        ('Maintenance', 'maintenance', '{\"enabled\": false}', 0);
";

/// Creates the showcase tables when they do not exist yet.
pub async fn create_schema(backend: &SqlBackend) -> AdminResult<()> {
    backend.execute_batch(SCHEMA).await
}

/// Inserts sample rows unless categories already exist.
pub async fn seed(backend: &SqlBackend) -> AdminResult<()> {
    let existing = backend
        .connection()
        .query("SELECT id FROM category LIMIT 1", &[])
        .await?;
    if !existing.is_empty() {
        tracing::info!("Database already seeded");
        return Ok(());
    }
    backend.execute_batch(SAMPLE_ROWS).await?;
    tracing::info!("Inserted sample rows");
    Ok(())
}

/// Highlights disabled entries and adds the switch button to each row.
struct ConfigHooks;

#[async_trait]
impl ResourceHooks for ConfigHooks {
    async fn row_attributes(&self, _cx: &RenderContext<'_>, row: &Row) -> Attributes {
        let mut attributes = Attributes::new();
        if !is_enabled(row.get("status")) {
            attributes.insert("class".into(), "bg-yellow-lt".into());
        }
        attributes
    }

    async fn actions(&self, cx: &RenderContext<'_>) -> Vec<Action> {
        let mut actions = actions::default_actions(cx);
        actions.push(
            Action::new("Switch status", "switch_status", HttpMethod::Put)
                .icon("ti ti-toggle-left"),
        );
        actions
    }
}

fn is_enabled(status: Option<&Value>) -> bool {
    match status {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64() != Some(0),
        _ => false,
    }
}

/// Toggles the `status` of a config entry.
async fn switch_status(
    State(state): State<AdminState>,
    Path(id): Path<String>,
) -> HttpResult<Json<Value>> {
    let resource = state.resource("config")?;
    let backend = state.backend();
    let row = backend
        .get(resource.meta(), &id)
        .await?
        .ok_or_else(|| AdminError::NotFound(format!("config {id}")))?;
    let status = !is_enabled(row.get("status"));

    let mut data = Row::new();
    data.insert("status".into(), Value::Bool(status));
    backend
        .update(
            resource.meta(),
            &id,
            ResolvedForm {
                data,
                ..ResolvedForm::default()
            },
        )
        .await?;
    tracing::info!(id = %id, status, "Switched config status");
    Ok(Json(json!({ "success": true })))
}

/// Registers the showcase resources, menu and custom route on `builder`.
pub async fn register(
    builder: AdminAppBuilder,
    backend: &SqlBackend,
    settings: &AdminSettings,
) -> AdminResult<AdminAppBuilder> {
    let files = Arc::new(StaticFilesManager::from_settings(settings));

    let categories = backend.introspect("category").await?;
    let products = backend
        .reflect(ModelMeta::new("product").column(ColumnMeta::many_to_many(
            "tags",
            Relation::new("tag").label_column("name"),
            Through {
                table: "product_tag".into(),
                source_column: "product_id".into(),
                target_column: "tag_id".into(),
            },
        )))
        .await?;
    let configs = backend.introspect("config").await?;

    Ok(builder
        .resource(
            ModelResource::builder(categories)
                .icon("ti ti-category")
                .fields(["id", "slug", "name"])
                .field(Field::new("created_at").display(displays::DatetimeDisplay::new("%Y-%m-%d")))
                .filters(["name"]),
        )
        .resource(
            ModelResource::builder(products)
                .icon("ti ti-shopping-cart")
                .fields(["id", "name", "view_num", "sort", "category", "tags"])
                .field(
                    Field::new("is_reviewed")
                        .display(displays::Boolean::new())
                        .input(inputs::Switch::new()),
                )
                .field(
                    Field::new("image")
                        .display(displays::Image::new(Some("40"), None))
                        .input(inputs::File::new(files)),
                )
                .field(Field::new("body").input(inputs::Editor::new()))
                .fields(["created_at"])
                .filters(["name"])
                .filter(filters::DateRange::new("created_at")),
        )
        .resource(
            ModelResource::builder(configs)
                .icon("ti ti-settings")
                .fields(["id", "label", "key"])
                .field(
                    Field::new("value")
                        .display(displays::Json::new())
                        .input(inputs::Json::new()),
                )
                .field(
                    Field::new("status")
                        .display(displays::Boolean::new())
                        .input(inputs::Switch::new()),
                )
                .hooks(ConfigHooks),
        )
        .menu([
            Dropdown::new(
                "Content",
                [MenuEntry::model("category"), MenuEntry::model("product")],
            )
            .icon("ti ti-folders")
            .into(),
            MenuEntry::model("config"),
            Link::new("Source", "https://github.com/adminkit-rs/adminkit")
                .icon("ti ti-brand-github")
                .target("_blank")
                .into(),
        ])
        .route("/config/switch_status/{id}", put(switch_status)))
}
