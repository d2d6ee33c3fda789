//! The document dialect served through the admin routes, without a login
//! provider in front.

use std::sync::Arc;

use adminkit::admin::column::{ColumnKind, ColumnMeta, ModelMeta, Relation, Through};
use adminkit::axum::routing::get;
use adminkit::prelude::*;
use adminkit_test::{
    assert_contains, assert_not_contains, assert_redirects, assert_status, TestClient,
};
use serde_json::{json, Value};

fn post_meta() -> ModelMeta {
    ModelMeta::new("post")
        .column(ColumnMeta::primary_key("id"))
        .column(ColumnMeta::new("title", ColumnKind::String))
        .column(ColumnMeta::many_to_many(
            "tags",
            Relation::new("tag").label_column("name"),
            Through {
                table: "post_tags".into(),
                source_column: "post_id".into(),
                target_column: "tag_id".into(),
            },
        ))
}

fn doc(value: Value) -> adminkit::admin::Row {
    value.as_object().cloned().unwrap()
}

async fn setup() -> (TestClient, Arc<DocumentBackend>) {
    let store = DocumentStore::new();
    for name in ["rust", "web"] {
        store.insert("tag", "id", doc(json!({ "name": name }))).await;
    }
    for title in ["Hello Rust", "Axum routing", "Tera templates"] {
        store
            .insert("post", "id", doc(json!({ "title": title, "tags": [] })))
            .await;
    }
    let backend = Arc::new(DocumentBackend::new(store));
    let app = AdminApp::builder(AdminSettings::default(), backend.clone())
        .resource(ModelResource::builder(post_meta()).filters(["title"]))
        .route("/ping", get(|| async { "pong" }))
        .build()
        .unwrap();
    (TestClient::new(app.into_router()), backend)
}

// ============ Listing ============

#[tokio::test]
async fn test_list_with_default_filter() {
    let (mut client, _) = setup().await;
    let response = client.get("/admin/post/list").await;
    assert_status(&response, 200);
    assert_contains(&response, "Axum routing");
    assert_contains(&response, "3 entries");

    // The document dialect searches case-insensitive substrings.
    let response = client.get("/admin/post/list?title=RUST").await;
    assert_contains(&response, "Hello Rust");
    assert_not_contains(&response, "Axum routing");
}

#[tokio::test]
async fn test_list_paginates() {
    let (mut client, _) = setup().await;
    let response = client.get("/admin/post/list?page_size=2&page_num=2").await;
    assert_status(&response, 200);
    assert_contains(&response, "Tera templates");
    assert_not_contains(&response, "Hello Rust");
}

// ============ Forms ============

#[tokio::test]
async fn test_create_form_offers_related_options() {
    let (mut client, _) = setup().await;
    let response = client.get("/admin/post/create").await;
    assert_status(&response, 200);
    assert_contains(&response, "rust");
    assert_contains(&response, "web");
}

#[tokio::test]
async fn test_create_with_tags() {
    let (mut client, backend) = setup().await;
    let response = client
        .post_form(
            "/admin/post/create",
            &[("title", "Tagged"), ("tags", "1"), ("tags", "2"), ("save", "")],
        )
        .await;
    assert_redirects(&response, "/admin/post/list");

    let row = backend.get(&post_meta(), "4").await.unwrap().unwrap();
    assert_eq!(row["title"], json!("Tagged"));
    assert_eq!(row["tags"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_update_and_continue() {
    let (mut client, backend) = setup().await;
    let response = client
        .post_form(
            "/admin/post/update/2",
            &[("title", "Axum 0.8 routing"), ("save_and_continue", "")],
        )
        .await;
    assert_status(&response, 200);
    assert_contains(&response, "Axum 0.8 routing");
    let row = backend.get(&post_meta(), "2").await.unwrap().unwrap();
    assert_eq!(row["title"], json!("Axum 0.8 routing"));
}

#[tokio::test]
async fn test_delete_selected() {
    let (mut client, backend) = setup().await;
    let response = client.delete("/admin/post/delete?ids=1,3").await;
    assert_redirects(&response, "/admin/post/list");
    assert!(backend.get(&post_meta(), "1").await.unwrap().is_none());
    assert!(backend.get(&post_meta(), "2").await.unwrap().is_some());
}

// ============ Middleware ============

#[tokio::test]
async fn test_custom_route_shares_the_stack() {
    let (mut client, _) = setup().await;
    let response = client.get("/admin/ping").await;
    assert_eq!(response.text(), "pong");
    assert!(response.set_cookie("language").is_some());
}

#[tokio::test]
async fn test_locale_from_accept_language() {
    let (client, _) = setup().await;
    let mut client = client.with_header("accept-language", "uk-UA,uk;q=0.9");
    let response = client.get("/admin").await;
    assert_contains(&response, "Ласкаво просимо");
}

#[tokio::test]
async fn test_theme_switch() {
    let (mut client, _) = setup().await;
    let response = client.get("/admin?theme=dark").await;
    assert_eq!(response.set_cookie("dark_mode").unwrap().value, "yes");
    assert_eq!(client.cookie("dark_mode"), Some("yes"));

    let response = client.get("/admin?theme=light").await;
    assert!(response.set_cookie("dark_mode").unwrap().is_removal());
    assert_eq!(client.cookie("dark_mode"), None);
}
