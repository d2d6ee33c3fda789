//! End-to-end tests of a SQLite-backed admin behind the security provider.
//!
//! Requests flow through the full stack: tracing, locale and theme, error
//! pages, the security provider, then the CRUD routes.

use std::sync::Arc;

use adminkit::auth::cache::InMemoryCache;
use adminkit::auth::provider::session_key;
use adminkit::auth::{CacheStore, SESSION_COOKIE};
use adminkit::core::files::{OnPremiseFileManager, StaticFilesManager};
use adminkit::prelude::*;
use adminkit::widgets::filters::DateRange;
use adminkit_test::{assert_contains, assert_not_contains, assert_redirects, assert_status};
use adminkit_test::{Multipart, TestClient};
use serde_json::json;
use tempfile::TempDir;

const SCHEMA: &str = "
    CREATE TABLE admin (
        id INTEGER PRIMARY KEY,
        username VARCHAR(50) NOT NULL UNIQUE,
        password VARCHAR(200) NOT NULL,
        profile_pic VARCHAR(200)
    );
    CREATE TABLE article (
        id INTEGER PRIMARY KEY,
        title VARCHAR(200) NOT NULL,
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
    );
";

struct Harness {
    client: TestClient,
    backend: Arc<SqlBackend>,
    cache: Arc<InMemoryCache>,
    uploads: TempDir,
}

async fn harness() -> Harness {
    let backend = Arc::new(SqlBackend::memory().unwrap());
    backend.execute_batch(SCHEMA).await.unwrap();
    let articles = backend.introspect("article").await.unwrap();

    let uploads = TempDir::new().unwrap();
    let cache = Arc::new(InMemoryCache::new());
    let files = StaticFilesManager::new(OnPremiseFileManager::new(uploads.path()));
    let security = SecurityProvider::builder(cache.clone(), Arc::new(files)).build();

    let app = AdminApp::builder(AdminSettings::default(), backend.clone())
        .provider(security)
        .resource(
            ModelResource::builder(articles)
                .fields(["title", "created_at"])
                .filters(["title"])
                .filter(DateRange::new("created_at")),
        )
        .build()
        .unwrap();

    Harness {
        client: TestClient::new(app.into_router()),
        backend,
        cache,
        uploads,
    }
}

async fn create_admin(backend: &SqlBackend, username: &str, password: &str) {
    let hash = Argon2PasswordHasher::new().hash(password).await.unwrap();
    backend
        .admin_dao()
        .add_admin(username, &hash, None)
        .await
        .unwrap();
}

async fn logged_in() -> Harness {
    let mut h = harness().await;
    create_admin(&h.backend, "root", "secret").await;
    let response = h
        .client
        .post_form("/admin/login", &[("username", "root"), ("password", "secret")])
        .await;
    assert_redirects(&response, "/admin");
    h
}

async fn seed_articles(backend: &SqlBackend) {
    backend
        .execute_batch(
            "INSERT INTO article (title, created_at) VALUES
                ('Intro to Rust', '2024-01-01 00:00:00'),
                ('Month end', '2024-01-31 00:00:00'),
                ('Late night', '2024-01-31 12:00:00'),
                ('February', '2024-02-01 00:00:00');",
        )
        .await
        .unwrap();
}

// ============================================================================
// First run
// ============================================================================

#[tokio::test]
async fn test_login_page_redirects_to_init_without_admins() {
    let mut h = harness().await;
    let response = h.client.get("/admin/login").await;
    assert_redirects(&response, "/admin/init");
}

#[tokio::test]
async fn test_init_creates_first_admin() {
    let mut h = harness().await;
    let response = h.client.get("/admin/init").await;
    assert_status(&response, 200);

    let form = Multipart::new()
        .text("username", "root")
        .text("password", "secret")
        .text("confirm_password", "secret")
        .file("profile_pic", "me.png", "image/png", b"\x89PNG");
    let response = h.client.post_multipart("/admin/init", form).await;
    assert_redirects(&response, "/admin");

    let admin = h
        .backend
        .admin_dao()
        .get_one_admin_by_filters(&adminkit::admin::dao::AdminLookup::Username("root".into()))
        .await
        .unwrap();
    assert_ne!(admin.password, "secret");
    assert_eq!(admin.profile_pic.as_deref(), Some("/static/uploads/me.png"));

    // Once an admin exists, init is closed.
    let response = h.client.get("/admin/init").await;
    assert_redirects(&response, "/admin/login");
}

#[tokio::test]
async fn test_init_accepts_upload_above_default_body_limit() {
    let mut h = harness().await;
    let picture = vec![0u8; 3 * 1024 * 1024];
    let form = Multipart::new()
        .text("username", "root")
        .text("password", "secret")
        .text("confirm_password", "secret")
        .file("profile_pic", "big.png", "image/png", &picture);
    let response = h.client.post_multipart("/admin/init", form).await;
    assert_redirects(&response, "/admin");

    assert!(h
        .backend
        .admin_dao()
        .is_exists_at_least_one_admin()
        .await
        .unwrap());
    let stored = std::fs::metadata(h.uploads.path().join("big.png")).unwrap();
    assert_eq!(stored.len(), picture.len() as u64);
}

#[tokio::test]
async fn test_init_rejects_mismatched_confirmation() {
    let mut h = harness().await;
    let response = h
        .client
        .post_form(
            "/admin/init",
            &[
                ("username", "root"),
                ("password", "secret"),
                ("confirm_password", "other"),
            ],
        )
        .await;
    assert_status(&response, 400);
    assert_contains(&response, "Password and confirmation are different");
    assert!(!h
        .backend
        .admin_dao()
        .is_exists_at_least_one_admin()
        .await
        .unwrap());
}

// ============================================================================
// Login and sessions
// ============================================================================

#[tokio::test]
async fn test_anonymous_requests_redirect_to_login() {
    let mut h = harness().await;
    create_admin(&h.backend, "root", "secret").await;
    let response = h.client.get("/admin/article/list").await;
    assert_redirects(&response, "/admin/login");
    let response = h.client.get("/admin/login").await;
    assert_status(&response, 200);
}

#[tokio::test]
async fn test_forged_session_token_is_rejected() {
    let mut h = harness().await;
    create_admin(&h.backend, "root", "secret").await;
    seed_articles(&h.backend).await;
    h.client.set_cookie(SESSION_COOKIE, "forged");

    let response = h.client.get("/admin/article/list").await;
    assert_redirects(&response, "/admin/login");
    assert!(response.set_cookie(SESSION_COOKIE).unwrap().is_removal());
    assert_not_contains(&response, "Intro to Rust");

    h.client.set_cookie(SESSION_COOKIE, "forged");
    let response = h.client.delete("/admin/article/delete/1").await;
    assert_redirects(&response, "/admin/login");
    let rows = h
        .backend
        .connection()
        .query("SELECT id FROM article", &[])
        .await
        .unwrap();
    assert_eq!(rows.len(), 4);

    // The login page stays reachable with a stale cookie.
    h.client.set_cookie(SESSION_COOKIE, "forged");
    let response = h.client.get("/admin/login").await;
    assert_status(&response, 200);
}

#[tokio::test]
async fn test_expired_session_is_rejected() {
    let mut h = logged_in().await;
    seed_articles(&h.backend).await;
    let token = h.client.cookie(SESSION_COOKIE).unwrap().to_string();
    h.cache.delete(&session_key(&token)).await.unwrap();

    let response = h.client.delete("/admin/article/delete?ids=1,2").await;
    assert_redirects(&response, "/admin/login");
    assert!(h.client.cookie(SESSION_COOKIE).is_none());
    let rows = h
        .backend
        .connection()
        .query("SELECT id FROM article", &[])
        .await
        .unwrap();
    assert_eq!(rows.len(), 4);
}

#[tokio::test]
async fn test_login_sets_session_cookie() {
    let mut h = harness().await;
    create_admin(&h.backend, "root", "secret").await;

    let response = h
        .client
        .post_form("/admin/login", &[("username", "root"), ("password", "secret")])
        .await;
    assert_eq!(response.status_code(), 303);
    assert_eq!(response.location(), Some("/admin"));
    let cookie = response.set_cookie(SESSION_COOKIE).unwrap();
    assert!(cookie.has_flag("HttpOnly"));
    assert_eq!(cookie.attribute("Path"), Some("/admin"));
    assert_eq!(cookie.attribute("Max-Age"), Some("3600"));

    // The issued token resolves to the admin's id in the cache store.
    let stored = h.cache.get(&session_key(&cookie.value)).await.unwrap();
    assert_eq!(stored.as_deref(), Some("1"));

    let response = h.client.get("/admin").await;
    assert_status(&response, 200);
    assert_contains(&response, "Welcome, root");
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let mut h = harness().await;
    create_admin(&h.backend, "root", "secret").await;

    let response = h
        .client
        .post_form("/admin/login", &[("username", "root"), ("password", "wrong")])
        .await;
    assert_status(&response, 401);
    assert!(response.set_cookie(SESSION_COOKIE).is_none());
    assert_contains(&response, "Login failed: wrong username or password");
    assert!(h.client.cookie(SESSION_COOKIE).is_none());

    let response = h
        .client
        .post_form("/admin/login", &[("username", "ghost"), ("password", "secret")])
        .await;
    assert_status(&response, 401);
}

#[tokio::test]
async fn test_remember_me_extends_session() {
    let mut h = harness().await;
    create_admin(&h.backend, "root", "secret").await;
    let response = h
        .client
        .post_form(
            "/admin/login",
            &[("username", "root"), ("password", "secret"), ("remember_me", "on")],
        )
        .await;
    let cookie = response.set_cookie(SESSION_COOKIE).unwrap();
    assert_eq!(cookie.attribute("Max-Age"), Some("2592000"));
    assert_eq!(response.set_cookie("remember_me").unwrap().value, "on");
}

#[tokio::test]
async fn test_logout_ends_session() {
    let mut h = logged_in().await;
    let token = h.client.cookie(SESSION_COOKIE).unwrap().to_string();

    let response = h.client.get("/admin/logout").await;
    assert_redirects(&response, "/admin/login");
    assert!(response.set_cookie(SESSION_COOKIE).unwrap().is_removal());
    assert!(h.cache.get(&session_key(&token)).await.unwrap().is_none());

    let response = h.client.get("/admin/article/list").await;
    assert_redirects(&response, "/admin/login");
}

#[tokio::test]
async fn test_renew_password() {
    let mut h = logged_in().await;

    let response = h
        .client
        .post_form(
            "/admin/renew_password",
            &[
                ("old_password", "nope"),
                ("new_password", "next"),
                ("confirmation_new_password", "next"),
            ],
        )
        .await;
    assert_status(&response, 400);
    assert_contains(&response, "Old password is incorrect");

    let response = h
        .client
        .post_form(
            "/admin/renew_password",
            &[
                ("old_password", "secret"),
                ("new_password", "next"),
                ("confirmation_new_password", "next"),
            ],
        )
        .await;
    assert_redirects(&response, "/admin/login");

    let response = h
        .client
        .post_form("/admin/login", &[("username", "root"), ("password", "next")])
        .await;
    assert_redirects(&response, "/admin");
}

// ============================================================================
// CRUD
// ============================================================================

#[tokio::test]
async fn test_create_and_list() {
    let mut h = logged_in().await;

    let response = h.client.get("/admin/article/create").await;
    assert_status(&response, 200);
    assert_contains(&response, "name=\"title\"");

    let response = h
        .client
        .post_form("/admin/article/create", &[("title", "Hello admin"), ("save", "")])
        .await;
    assert_redirects(&response, "/admin/article/list");

    let response = h.client.get("/admin/article/list").await;
    assert_status(&response, 200);
    assert_contains(&response, "Hello admin");
    assert_contains(&response, "1 entry");
}

#[tokio::test]
async fn test_update_row() {
    let mut h = logged_in().await;
    seed_articles(&h.backend).await;

    let response = h.client.get("/admin/article/update/1").await;
    assert_status(&response, 200);
    assert_contains(&response, "Intro to Rust");

    let response = h
        .client
        .post_form("/admin/article/update/1", &[("title", "Intro to axum")])
        .await;
    assert_redirects(&response, "/admin/article/list");

    let meta = h.backend.introspect("article").await.unwrap();
    let row = h.backend.get(&meta, "1").await.unwrap().unwrap();
    assert_eq!(row["title"], json!("Intro to axum"));
    assert_eq!(row["created_at"], json!("2024-01-01 00:00:00"));
}

#[tokio::test]
async fn test_update_missing_row_is_not_found() {
    let mut h = logged_in().await;
    let response = h.client.get("/admin/article/update/99").await;
    assert_status(&response, 404);
    assert_contains(&response, "Page not found");
}

#[tokio::test]
async fn test_delete_one_and_many() {
    let mut h = logged_in().await;
    seed_articles(&h.backend).await;

    let response = h.client.delete("/admin/article/delete/1").await;
    assert_redirects(&response, "/admin/article/list");

    let response = h
        .client
        .delete_with_headers(
            "/admin/article/delete?ids=2,3",
            &[("referer", "/admin/article/list?page_num=2")],
        )
        .await;
    assert_redirects(&response, "/admin/article/list?page_num=2");

    let rows = h
        .backend
        .connection()
        .query("SELECT title FROM article", &[])
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["title"], json!("February"));

    let response = h.client.delete("/admin/article/delete").await;
    assert_status(&response, 400);
}

// ============================================================================
// Filters and navigation
// ============================================================================

#[tokio::test]
async fn test_list_search_filter() {
    let mut h = logged_in().await;
    seed_articles(&h.backend).await;
    let response = h.client.get("/admin/article/list?title=%5Eintro").await;
    assert_contains(&response, "Intro to Rust");
    assert_not_contains(&response, "February");
}

#[tokio::test]
async fn test_list_date_range_filter() {
    let mut h = logged_in().await;
    seed_articles(&h.backend).await;
    let response = h
        .client
        .get("/admin/article/list?created_at=2024-01-01%20-%202024-01-31")
        .await;
    assert_status(&response, 200);
    assert_contains(&response, "Intro to Rust");
    assert_contains(&response, "Month end");
    assert_not_contains(&response, "Late night");
    assert_not_contains(&response, "February");
}

#[tokio::test]
async fn test_list_with_out_of_range_paging() {
    let mut h = logged_in().await;
    seed_articles(&h.backend).await;
    let response = h
        .client
        .get("/admin/article/list?page_num=18446744073709551615&page_size=2")
        .await;
    assert_status(&response, 200);
    assert_not_contains(&response, "Intro to Rust");

    let response = h
        .client
        .get("/admin/article/list?page_num=1&page_size=18446744073709551615")
        .await;
    assert_status(&response, 200);
    assert_contains(&response, "Intro to Rust");
    assert_contains(&response, "February");
}

#[tokio::test]
async fn test_dashboard_lists_menu() {
    let mut h = logged_in().await;
    let response = h.client.get("/admin").await;
    assert_contains(&response, "href=\"/admin/article/list\"");
}

#[tokio::test]
async fn test_unknown_resource_is_not_found() {
    let mut h = logged_in().await;
    let response = h.client.get("/admin/ghost/list").await;
    assert_status(&response, 404);
    let response = h.client.get("/admin/no/such/page").await;
    assert_status(&response, 404);
}
