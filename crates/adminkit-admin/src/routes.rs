//! CRUD routes of model resources.
//!
//! Mounted under the admin path:
//!
//! | Method | Path | Handler |
//! |---|---|---|
//! | GET | `/` | dashboard |
//! | GET | `/{resource}/list` | paginated, filtered list |
//! | GET, POST | `/{resource}/create` | create form |
//! | GET, POST | `/{resource}/update/{id}` | update form |
//! | DELETE | `/{resource}/delete/{id}` | delete one row |
//! | DELETE | `/{resource}/delete?ids=a,b` | delete selected rows |

use std::collections::HashMap;

use adminkit_core::AdminError;
use adminkit_http::response::see_other;
use adminkit_http::{FormData, HttpError, HttpResult};
use adminkit_template::Context;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::routing::{delete, get};
use axum::Router;
use http::header::REFERER;
use http::{HeaderMap, StatusCode};
use serde_json::{json, Value};

use crate::actions::ActionView;
use crate::backend::{Pagination, Row};
use crate::resource::ModelResource;
use crate::state::{resource_templates, AdminState, Page};

pub(crate) fn router() -> Router<AdminState> {
    Router::new()
        .route("/", get(index))
        .route("/{resource}/list", get(list))
        .route("/{resource}/create", get(create_view).post(create))
        .route("/{resource}/update/{id}", get(update_view).post(update))
        .route("/{resource}/delete/{id}", delete(delete_one))
        .route("/{resource}/delete", delete(delete_many))
}

// ── Fallback ─────────────────────────────────────────────────────────

pub(crate) async fn not_found(page: Page) -> HttpError {
    HttpError(AdminError::NotFound(page.path))
}

// ── Dashboard ────────────────────────────────────────────────────────

async fn index(State(state): State<AdminState>, page: Page) -> HttpResult {
    let context = page.context(&state);
    state.render_page(&["index.html".to_string()], &context, StatusCode::OK)
}

// ── List ─────────────────────────────────────────────────────────────

/// The query string without the page number, ready for `page_num=` to be appended.
fn pagination_query(params: &HashMap<String, String>) -> String {
    let mut keys: Vec<&String> = params.keys().filter(|k| *k != "page_num").collect();
    keys.sort();
    if keys.is_empty() {
        return String::new();
    }
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for key in keys {
        serializer.append_pair(key, &params[key]);
    }
    format!("{}&", serializer.finish())
}

async fn list(
    State(state): State<AdminState>,
    page: Page,
    Path(slug): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> HttpResult {
    let resource = state.resource(&slug)?;
    let params = resource.parse_query_params(&query);
    let page_num = params
        .get("page_num")
        .and_then(|p| p.parse().ok())
        .unwrap_or(1);
    let page_size = params
        .get("page_size")
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(|| resource.page_size());
    let pagination = Pagination::new(page_num, page_size);

    let result = state.backend().list(&resource, &params, pagination).await?;
    tracing::debug!(
        resource = %slug,
        page = pagination.page_num,
        rows = result.models.len(),
        total = result.total_entries_count,
        "Listed resource"
    );

    let cx = page.render_cx(&state);
    let hooks = resource.hooks();
    let (rendered, filters, toolbar_actions, actions, bulk_actions) = futures::join!(
        resource.render_fields(&cx, &result.models),
        resource.render_filters(&cx, &params),
        hooks.toolbar_actions(&cx),
        hooks.actions(&cx),
        hooks.bulk_actions(&cx),
    );
    let rendered = rendered?;
    let filters = filters?;

    let resource_url = state.url(&slug);
    let columns: Vec<Value> = resource
        .field_labels()
        .into_iter()
        .zip(&rendered.column_attributes)
        .map(|(label, attributes)| json!({"label": label, "attributes": attributes}))
        .collect();
    let rows: Vec<Value> = result
        .models
        .iter()
        .zip(rendered.rows)
        .zip(rendered.row_attributes)
        .zip(rendered.cell_attributes)
        .map(|(((row, cells), attributes), cell_attributes)| {
            let cells: Vec<Value> = cells
                .into_iter()
                .zip(cell_attributes)
                .map(|(html, attributes)| json!({"html": html, "attributes": attributes}))
                .collect();
            json!({
                "pk": resource.pk_of(row),
                "attributes": attributes,
                "cells": cells,
            })
        })
        .collect();
    let toolbar_actions: Vec<ActionView> = toolbar_actions
        .iter()
        .map(|action| ActionView::toolbar(action, &resource_url))
        .collect();
    let actions: Vec<ActionView> = actions
        .iter()
        .map(|action| ActionView::new(action, &resource_url, ""))
        .collect();
    let bulk_actions: Vec<ActionView> = bulk_actions
        .iter()
        .map(|action| ActionView::new(action, &resource_url, ""))
        .collect();

    let mut context = resource_context(&page, &state, &resource, &resource_url);
    context.insert("filters", &filters);
    context.insert("columns", &columns);
    context.insert("rows", &rows);
    context.insert("toolbar_actions", &toolbar_actions);
    context.insert("actions", &actions);
    context.insert("bulk_actions", &bulk_actions);
    context.insert("total", &result.total_entries_count);
    context.insert("page_num", &pagination.page_num);
    context.insert("page_size", &pagination.page_size);
    context.insert(
        "page_count",
        &pagination.page_count(result.total_entries_count),
    );
    context.insert("query_string", &pagination_query(&params));
    state.render_page(&resource_templates(&slug, "list"), &context, StatusCode::OK)
}

fn resource_context(
    page: &Page,
    state: &AdminState,
    resource: &ModelResource,
    resource_url: &str,
) -> Context {
    let mut context = page.context(state);
    context.insert("resource", resource.slug());
    context.insert("resource_label", resource.label());
    context.insert("resource_url", resource_url);
    context.insert("page_title", &resource.page_title());
    context.insert("page_pre_title", &resource.page_pre_title());
    context
}

// ── Forms ────────────────────────────────────────────────────────────

/// Submitted text values as a row, to refill a form that failed.
fn submitted_row(form: &FormData) -> Row {
    form.field_names()
        .filter_map(|name| {
            let values = form.get_all(name);
            match values {
                [] => None,
                [single] => Some((name.to_string(), Value::String(single.clone()))),
                many => Some((
                    name.to_string(),
                    Value::Array(many.iter().cloned().map(Value::String).collect()),
                )),
            }
        })
        .collect()
}

/// Errors shown inline on the form instead of an error page.
const fn is_form_error(err: &AdminError) -> bool {
    matches!(err, AdminError::Validation(_) | AdminError::BadRequest(_))
}

#[allow(clippy::too_many_arguments)]
async fn render_form(
    state: &AdminState,
    page: &Page,
    resource: &ModelResource,
    form_page: &str,
    pk: Option<&str>,
    obj: Option<&Row>,
    error: Option<String>,
    status: StatusCode,
) -> HttpResult {
    let cx = page.render_cx(state);
    let rendered = resource.render_inputs(&cx, obj).await?;
    let resource_url = state.url(resource.slug());
    let mut context = resource_context(page, state, resource, &resource_url);
    context.insert("inputs", &rendered.inputs);
    context.insert("enctype", rendered.enctype);
    context.insert("pk", &pk);
    context.insert("error", &error);
    state.render_page(
        &resource_templates(resource.slug(), form_page),
        &context,
        status,
    )
}

async fn create_view(
    State(state): State<AdminState>,
    page: Page,
    Path(slug): Path<String>,
) -> HttpResult {
    let resource = state.resource(&slug)?;
    render_form(&state, &page, &resource, "create", None, None, None, StatusCode::OK).await
}

async fn create(
    State(state): State<AdminState>,
    page: Page,
    Path(slug): Path<String>,
    form: FormData,
) -> HttpResult {
    let resource = state.resource(&slug)?;
    let result = async {
        let resolved = resource.resolve_form_data(&form).await?;
        state.backend().create(resource.meta(), resolved).await
    }
    .await;

    match result {
        Ok(pk) => {
            tracing::info!(resource = %slug, pk = %pk, "Created row");
            if form.contains("save") {
                return Ok(see_other(&state.url(&format!("{slug}/list"))));
            }
            render_form(&state, &page, &resource, "create", None, None, None, StatusCode::OK).await
        }
        Err(e) if is_form_error(&e) => {
            let row = submitted_row(&form);
            render_form(
                &state,
                &page,
                &resource,
                "create",
                None,
                Some(&row),
                Some(e.to_string()),
                StatusCode::BAD_REQUEST,
            )
            .await
        }
        Err(e) => Err(e.into()),
    }
}

async fn update_view(
    State(state): State<AdminState>,
    page: Page,
    Path((slug, id)): Path<(String, String)>,
) -> HttpResult {
    let resource = state.resource(&slug)?;
    let obj = state
        .backend()
        .get(resource.meta(), &id)
        .await?
        .ok_or_else(|| AdminError::NotFound(format!("{slug} {id}")))?;
    render_form(
        &state,
        &page,
        &resource,
        "update",
        Some(&id),
        Some(&obj),
        None,
        StatusCode::OK,
    )
    .await
}

async fn update(
    State(state): State<AdminState>,
    page: Page,
    Path((slug, id)): Path<(String, String)>,
    form: FormData,
) -> HttpResult {
    let resource = state.resource(&slug)?;
    let result = async {
        let resolved = resource.resolve_form_data(&form).await?;
        state.backend().update(resource.meta(), &id, resolved).await
    }
    .await;

    match result {
        Ok(()) => {
            tracing::info!(resource = %slug, pk = %id, "Updated row");
            if !form.contains("save_and_continue") {
                return Ok(see_other(&state.url(&format!("{slug}/list"))));
            }
            let obj = state
                .backend()
                .get(resource.meta(), &id)
                .await?
                .ok_or_else(|| AdminError::NotFound(format!("{slug} {id}")))?;
            render_form(
                &state,
                &page,
                &resource,
                "update",
                Some(&id),
                Some(&obj),
                None,
                StatusCode::OK,
            )
            .await
        }
        Err(e) if is_form_error(&e) => {
            let row = submitted_row(&form);
            render_form(
                &state,
                &page,
                &resource,
                "update",
                Some(&id),
                Some(&row),
                Some(e.to_string()),
                StatusCode::BAD_REQUEST,
            )
            .await
        }
        Err(e) => Err(e.into()),
    }
}

// ── Delete ───────────────────────────────────────────────────────────

/// Back to the referring page, or to the list.
fn redirect_back(state: &AdminState, headers: &HeaderMap, slug: &str) -> Response {
    let target = headers
        .get(REFERER)
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| state.url(&format!("{slug}/list")), str::to_string);
    see_other(&target)
}

async fn delete_one(
    State(state): State<AdminState>,
    Path((slug, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> HttpResult {
    let resource = state.resource(&slug)?;
    let deleted = state.backend().delete(resource.meta(), &[id.clone()]).await?;
    tracing::info!(resource = %slug, pk = %id, deleted, "Deleted row");
    Ok(redirect_back(&state, &headers, &slug))
}

async fn delete_many(
    State(state): State<AdminState>,
    Path(slug): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> HttpResult {
    let resource = state.resource(&slug)?;
    let ids: Vec<String> = query
        .get("ids")
        .map(|ids| {
            ids.split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    if ids.is_empty() {
        return Err(AdminError::BadRequest("No rows selected".into()).into());
    }
    let deleted = state.backend().delete(resource.meta(), &ids).await?;
    tracing::info!(resource = %slug, deleted, "Deleted selected rows");
    Ok(redirect_back(&state, &headers, &slug))
}
