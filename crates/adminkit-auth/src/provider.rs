//! The security provider.
//!
//! Serves the login, logout, first-admin and renew-password pages, and runs
//! the session check on every admin request. A session is an opaque token in
//! the `access_token` cookie; the cache store maps `login_user:{token}` to the
//! admin id until the session TTL runs out.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use adminkit_admin::dao::{AdminDao, AdminLookup, AdminRecord, AdminUpdate};
use adminkit_admin::{AdminState, CurrentAdmin, Page, Provider};
use adminkit_core::files::{FileManager, StaticFilesManager};
use adminkit_core::settings::AdminSettings;
use adminkit_core::{AdminError, AdminResult};
use adminkit_http::cookies::cookie_value;
use adminkit_http::response::see_other;
use adminkit_http::{Cookie, FormData, HttpResult};
use adminkit_template::Context;
use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use axum::routing::get;
use axum::{Extension, Router};
use http::StatusCode;
use serde_json::Value;

use crate::cache::{cache_from_settings, CacheStore};
use crate::hasher::{Argon2PasswordHasher, PasswordHasher};

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "access_token";

/// Cookie set while a long-lived session is active.
pub const REMEMBER_ME_COOKIE: &str = "remember_me";

/// The cache key of a session token.
pub fn session_key(token: &str) -> String {
    format!("login_user:{token}")
}

const LOGIN_PATH: &str = "/login";
const LOGOUT_PATH: &str = "/logout";
const INIT_PATH: &str = "/init";
const RENEW_PASSWORD_PATH: &str = "/renew_password";

/// Paths an anonymous request may reach.
fn is_public_path(path: &str) -> bool {
    matches!(path, LOGIN_PATH | INIT_PATH | RENEW_PASSWORD_PATH)
}

/// Declares a [`SecurityProvider`].
pub struct SecurityProviderBuilder {
    cache: Arc<dyn CacheStore>,
    file_manager: Arc<dyn FileManager>,
    hasher: Arc<dyn PasswordHasher>,
    login_template: String,
    login_logo_url: Option<String>,
}

impl SecurityProviderBuilder {
    /// Replaces the default Argon2id hasher.
    #[must_use]
    pub fn hasher(mut self, hasher: impl PasswordHasher + 'static) -> Self {
        self.hasher = Arc::new(hasher);
        self
    }

    /// The template of the login page.
    #[must_use]
    pub fn login_template(mut self, template: impl Into<String>) -> Self {
        self.login_template = template.into();
        self
    }

    /// A logo shown on the login page instead of the app's.
    #[must_use]
    pub fn login_logo_url(mut self, url: impl Into<String>) -> Self {
        self.login_logo_url = Some(url.into());
        self
    }

    /// Builds the provider.
    pub fn build(self) -> SecurityProvider {
        SecurityProvider {
            cache: self.cache,
            file_manager: self.file_manager,
            hasher: self.hasher,
            login_template: self.login_template,
            login_logo_url: self.login_logo_url,
        }
    }
}

/// Authentication for the admin panel.
pub struct SecurityProvider {
    cache: Arc<dyn CacheStore>,
    file_manager: Arc<dyn FileManager>,
    hasher: Arc<dyn PasswordHasher>,
    login_template: String,
    login_logo_url: Option<String>,
}

impl fmt::Debug for SecurityProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityProvider")
            .field("login_template", &self.login_template)
            .field("login_logo_url", &self.login_logo_url)
            .finish_non_exhaustive()
    }
}

impl SecurityProvider {
    /// Starts a provider storing sessions in `cache` and avatars through
    /// `file_manager`.
    pub fn builder(
        cache: Arc<dyn CacheStore>,
        file_manager: Arc<dyn FileManager>,
    ) -> SecurityProviderBuilder {
        SecurityProviderBuilder {
            cache,
            file_manager,
            hasher: Arc::new(Argon2PasswordHasher::new()),
            login_template: "providers/login/login.html".to_string(),
            login_logo_url: None,
        }
    }

    /// A provider with the session store and upload directory named by the
    /// settings.
    pub async fn from_settings(settings: &AdminSettings) -> AdminResult<Self> {
        let cache = cache_from_settings(settings).await?;
        let files = Arc::new(StaticFilesManager::from_settings(settings));
        Ok(Self::builder(cache, files).build())
    }

    fn session_ttl(settings: &AdminSettings, remember_me: bool) -> Duration {
        Duration::from_secs(if remember_me {
            settings.remember_me_ttl_secs
        } else {
            settings.session_ttl_secs
        })
    }

    fn login_context(&self, page: &Page, state: &AdminState) -> Context {
        let mut context = page.context(state);
        if let Some(url) = &self.login_logo_url {
            context.insert("login_logo_url", url);
        }
        context
    }

    fn render_login(
        &self,
        page: &Page,
        state: &AdminState,
        error: Option<&str>,
        status: StatusCode,
    ) -> HttpResult {
        let mut context = self.login_context(page, state);
        context.insert("error", &error);
        state.render_page(std::slice::from_ref(&self.login_template), &context, status)
    }

    /// Checks `password` against the stored hash, re-hashing it when the
    /// hash was made with outdated parameters.
    async fn check_password(
        &self,
        dao: &dyn AdminDao,
        admin: &AdminRecord,
        password: &str,
    ) -> AdminResult<bool> {
        if !self.hasher.verify(password, &admin.password).await? {
            return Ok(false);
        }
        if self.hasher.is_rehashing_required(&admin.password) {
            tracing::info!(username = %admin.username, "Re-hashing stale password hash");
            let update = AdminUpdate {
                password: Some(self.hasher.hash(password).await?),
                ..AdminUpdate::default()
            };
            dao.update_admin(&AdminLookup::Id(admin.id.clone()), &update)
                .await?;
        }
        Ok(true)
    }

    /// Starts a session for `admin` and redirects to the admin root.
    async fn start_session(
        &self,
        state: &AdminState,
        admin: &AdminRecord,
        remember_me: bool,
    ) -> HttpResult {
        let token = uuid::Uuid::new_v4().simple().to_string();
        let ttl = Self::session_ttl(state.settings(), remember_me);
        let admin_id = serde_json::to_string(&admin.id)
            .map_err(|e| AdminError::Serialization(format!("{e}")))?;
        self.cache.set(&session_key(&token), &admin_id, ttl).await?;
        tracing::info!(username = %admin.username, remember_me, "Admin logged in");

        let cookie_path = state.url("");
        let mut response = see_other(&cookie_path);
        let headers = response.headers_mut();
        Cookie::new(SESSION_COOKIE, token)
            .path(cookie_path.clone())
            .max_age(ttl.as_secs())
            .http_only(true)
            .append_to(headers);
        if remember_me {
            Cookie::new(REMEMBER_ME_COOKIE, "on")
                .path(cookie_path)
                .max_age(ttl.as_secs())
                .append_to(headers);
        } else {
            Cookie::removal(REMEMBER_ME_COOKIE, cookie_path).append_to(headers);
        }
        Ok(response)
    }

    /// Ends the session of `token`, if any, and redirects to the login page.
    async fn end_session(&self, state: &AdminState, token: Option<&str>) -> HttpResult {
        if let Some(token) = token {
            self.cache.delete(&session_key(token)).await?;
        }
        let cookie_path = state.url("");
        let mut response = see_other(&state.url(LOGIN_PATH));
        let headers = response.headers_mut();
        Cookie::removal(SESSION_COOKIE, cookie_path.clone()).append_to(headers);
        Cookie::removal(REMEMBER_ME_COOKIE, cookie_path).append_to(headers);
        Ok(response)
    }

    /// The admin owning `token`, or `None` when the session is unknown.
    async fn resolve_admin(&self, state: &AdminState, token: &str) -> AdminResult<Option<CurrentAdmin>> {
        let Some(raw_id) = self.cache.get(&session_key(token)).await? else {
            tracing::warn!("Session token not found in cache store");
            return Ok(None);
        };
        let id: Value = serde_json::from_str(&raw_id)
            .map_err(|e| AdminError::Serialization(format!("{e}")))?;
        match state
            .backend()
            .admin_dao()
            .get_one_admin_by_filters(&AdminLookup::Id(id))
            .await
        {
            Ok(admin) => Ok(Some(CurrentAdmin {
                id: admin.id,
                username: admin.username,
                profile_pic: admin.profile_pic,
            })),
            Err(AdminError::EntityNotFound(_)) => {
                tracing::warn!("Session refers to a deleted admin");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl Provider for SecurityProvider {
    fn name(&self) -> &str {
        "security_provider"
    }

    fn routes(self: Arc<Self>) -> Router<AdminState> {
        Router::new()
            .route(LOGIN_PATH, get(login_view).post(login))
            .route(LOGOUT_PATH, get(logout))
            .route(INIT_PATH, get(init_view).post(init))
            .route(RENEW_PASSWORD_PATH, get(renew_password_view).post(renew_password))
            .layer(Extension(self))
    }

    async fn handle(&self, state: &AdminState, mut request: Request, next: Next) -> Response {
        let path = request.uri().path().to_string();
        let Some(token) = cookie_value(request.headers(), SESSION_COOKIE) else {
            if is_public_path(&path) {
                return next.run(request).await;
            }
            tracing::debug!(path = %path, "Anonymous request, redirecting to login");
            return see_other(&state.url(LOGIN_PATH));
        };
        match self.resolve_admin(state, &token).await {
            Ok(Some(admin)) => {
                tracing::debug!(username = %admin.username, "Authenticated admin request");
                request.extensions_mut().insert(admin);
                return next.run(request).await;
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Cannot resolve session"),
        }
        if is_public_path(&path) {
            return next.run(request).await;
        }
        // A stale or forged token counts as no session at all.
        tracing::debug!(path = %path, "Unknown session, redirecting to login");
        let cookie_path = state.url("");
        let mut response = see_other(&state.url(LOGIN_PATH));
        let headers = response.headers_mut();
        Cookie::removal(SESSION_COOKIE, cookie_path.clone()).append_to(headers);
        Cookie::removal(REMEMBER_ME_COOKIE, cookie_path).append_to(headers);
        response
    }
}

// ── Handlers ──────────────────────────────────────────────────────────

type Security = Extension<Arc<SecurityProvider>>;

async fn login_view(
    State(state): State<AdminState>,
    Extension(provider): Security,
    page: Page,
) -> HttpResult {
    if !state.backend().admin_dao().is_exists_at_least_one_admin().await? {
        return Ok(see_other(&state.url(INIT_PATH)));
    }
    provider.render_login(&page, &state, None, StatusCode::OK)
}

async fn login(
    State(state): State<AdminState>,
    Extension(provider): Security,
    page: Page,
    form: FormData,
) -> HttpResult {
    let username = form.get("username").unwrap_or_default();
    let password = form.get("password").unwrap_or_default();
    let remember_me = form.contains("remember_me");

    let dao = state.backend().admin_dao();
    let admin = match dao
        .get_one_admin_by_filters(&AdminLookup::Username(username.to_string()))
        .await
    {
        Ok(admin) => Some(admin),
        Err(AdminError::EntityNotFound(_)) => None,
        Err(e) => return Err(e.into()),
    };
    let authenticated = match &admin {
        Some(admin) => provider.check_password(dao.as_ref(), admin, password).await?,
        None => false,
    };
    match admin {
        Some(admin) if authenticated => provider.start_session(&state, &admin, remember_me).await,
        _ => {
            tracing::info!(username = %username, "Login failed");
            let error = page.t(&state, "login_failed");
            provider.render_login(&page, &state, Some(&error), StatusCode::UNAUTHORIZED)
        }
    }
}

async fn logout(
    State(state): State<AdminState>,
    Extension(provider): Security,
    request: Request,
) -> HttpResult {
    let token = cookie_value(request.headers(), SESSION_COOKIE);
    if let Some(admin) = request.extensions().get::<CurrentAdmin>() {
        tracing::info!(username = %admin.username, "Admin logged out");
    }
    provider.end_session(&state, token.as_deref()).await
}

fn render_init(state: &AdminState, page: &Page, error: Option<&str>, status: StatusCode) -> HttpResult {
    let mut context = page.context(state);
    context.insert("error", &error);
    state.render_page(&["init.html".to_string()], &context, status)
}

async fn init_view(State(state): State<AdminState>, page: Page) -> HttpResult {
    if state.backend().admin_dao().is_exists_at_least_one_admin().await? {
        return Ok(see_other(&state.url(LOGIN_PATH)));
    }
    render_init(&state, &page, None, StatusCode::OK)
}

async fn init(
    State(state): State<AdminState>,
    Extension(provider): Security,
    page: Page,
    form: FormData,
) -> HttpResult {
    let dao = state.backend().admin_dao();
    if dao.is_exists_at_least_one_admin().await? {
        return Ok(see_other(&state.url(LOGIN_PATH)));
    }

    let username = form.get("username").unwrap_or_default().trim();
    let password = form.get("password").unwrap_or_default();
    if username.is_empty() || password.is_empty() {
        return Err(AdminError::BadRequest("username and password are required".into()).into());
    }
    if form.get("confirm_password") != Some(password) {
        let error = page.t(&state, "confirm_password_different");
        return render_init(&state, &page, Some(&error), StatusCode::BAD_REQUEST);
    }

    let profile_pic = match form.file("profile_pic").filter(|f| !f.filename.is_empty()) {
        Some(file) => Some(provider.file_manager.upload(file).await?),
        None => None,
    };
    let hash = provider.hasher.hash(password).await?;
    let admin = dao
        .add_admin(username, &hash, profile_pic.as_deref())
        .await?;
    tracing::info!(username = %admin.username, "Created the first admin");
    Ok(see_other(&state.url("")))
}

fn render_renew_password(
    state: &AdminState,
    page: &Page,
    error: Option<&str>,
    status: StatusCode,
) -> HttpResult {
    let mut context = page.context(state);
    context.insert("error", &error);
    state.render_page(
        &["providers/login/renew_password.html".to_string()],
        &context,
        status,
    )
}

async fn renew_password_view(State(state): State<AdminState>, page: Page) -> HttpResult {
    if page.admin.is_none() {
        return Err(AdminError::Unauthorized("login required".into()).into());
    }
    render_renew_password(&state, &page, None, StatusCode::OK)
}

async fn renew_password(
    State(state): State<AdminState>,
    Extension(provider): Security,
    page: Page,
    headers: http::HeaderMap,
    form: FormData,
) -> HttpResult {
    let Some(current) = &page.admin else {
        return Err(AdminError::Unauthorized("login required".into()).into());
    };
    let dao = state.backend().admin_dao();
    let lookup = AdminLookup::Id(current.id.clone());
    let admin = dao.get_one_admin_by_filters(&lookup).await?;

    let old_password = form.get("old_password").unwrap_or_default();
    let new_password = form.get("new_password").unwrap_or_default();
    let confirmation = form.get("confirmation_new_password").unwrap_or_default();

    let error = if !provider.hasher.verify(old_password, &admin.password).await? {
        Some("old_password_error")
    } else if new_password != confirmation {
        Some("new_password_different")
    } else if new_password.is_empty() {
        Some("new_password")
    } else {
        None
    };
    if let Some(msgid) = error {
        let message = page.t(&state, msgid);
        return render_renew_password(&state, &page, Some(&message), StatusCode::BAD_REQUEST);
    }

    let update = AdminUpdate {
        password: Some(provider.hasher.hash(new_password).await?),
        ..AdminUpdate::default()
    };
    dao.update_admin(&lookup, &update).await?;
    tracing::info!(username = %admin.username, "Password renewed");

    let token = cookie_value(&headers, SESSION_COOKIE);
    provider.end_session(&state, token.as_deref()).await
}
