//! Shared state of a built admin app and the per-request page extractor.

use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use adminkit_core::i18n::Translator;
use adminkit_core::settings::AdminSettings;
use adminkit_core::{AdminError, AdminResult};
use adminkit_http::response::html;
use adminkit_http::{HttpResult, LocaleStrategy};
use adminkit_template::{Context, Templates};
use adminkit_widgets::RenderContext;
use axum::extract::{FromRequestParts, OriginalUri};
use axum::response::Response;
use http::request::Parts;
use http::StatusCode;
use serde::Serialize;
use serde_json::Value;

use crate::backend::OrmBackend;
use crate::menu::Menu;
use crate::resource::ModelResource;

/// The locale resolved for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLocale(pub String);

/// The theme of a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Theme {
    /// Whether the dark theme is on.
    pub dark_mode: bool,
}

/// The admin signed in for a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentAdmin {
    /// The primary key.
    pub id: Value,
    /// The login name.
    pub username: String,
    /// Location of the avatar.
    pub profile_pic: Option<String>,
}

struct Inner {
    settings: AdminSettings,
    templates: Templates,
    translator: Arc<dyn Translator>,
    backend: Arc<dyn OrmBackend>,
    resources: Vec<Arc<ModelResource>>,
    menu: Menu,
    locale_strategy: LocaleStrategy,
}

/// Everything request handlers share. Cheap to clone.
#[derive(Clone)]
pub struct AdminState {
    inner: Arc<Inner>,
}

impl fmt::Debug for AdminState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminState")
            .field("admin_path", &self.inner.settings.admin_path)
            .field("backend", &self.inner.backend.name())
            .field("resources", &self.inner.resources.len())
            .finish_non_exhaustive()
    }
}

impl AdminState {
    pub(crate) fn new(
        settings: AdminSettings,
        templates: Templates,
        backend: Arc<dyn OrmBackend>,
        resources: Vec<Arc<ModelResource>>,
        menu: Menu,
        locale_strategy: LocaleStrategy,
    ) -> Self {
        let translator = Arc::clone(templates.translator());
        Self {
            inner: Arc::new(Inner {
                settings,
                templates,
                translator,
                backend,
                resources,
                menu,
                locale_strategy,
            }),
        }
    }

    /// The app settings.
    pub fn settings(&self) -> &AdminSettings {
        &self.inner.settings
    }

    /// The template engine.
    pub fn templates(&self) -> &Templates {
        &self.inner.templates
    }

    /// The translator.
    pub fn translator(&self) -> &Arc<dyn Translator> {
        &self.inner.translator
    }

    /// The ORM backend.
    pub fn backend(&self) -> &Arc<dyn OrmBackend> {
        &self.inner.backend
    }

    /// The registered resources, in registration order.
    pub fn resources(&self) -> &[Arc<ModelResource>] {
        &self.inner.resources
    }

    /// The resource registered under `slug`.
    pub fn resource(&self, slug: &str) -> AdminResult<Arc<ModelResource>> {
        self.inner
            .resources
            .iter()
            .find(|r| r.slug() == slug)
            .cloned()
            .ok_or_else(|| AdminError::ResourceNotFound(slug.to_string()))
    }

    /// The navigation menu.
    pub fn menu(&self) -> &Menu {
        &self.inner.menu
    }

    /// How request locales are picked.
    pub fn locale_strategy(&self) -> &LocaleStrategy {
        &self.inner.locale_strategy
    }

    /// `path` under the admin path.
    pub fn url(&self, path: &str) -> String {
        self.inner.settings.url(path)
    }

    /// Renders the first existing template of `names` as an HTML response.
    pub fn render_page(
        &self,
        names: &[String],
        context: &Context,
        status: StatusCode,
    ) -> HttpResult<Response> {
        let body = self.inner.templates.render_first(names, context)?;
        Ok(html(status, body))
    }
}

/// Per-request page data: locale, theme, signed-in admin and path.
///
/// Reads the extensions the admin middleware sets, resolving the locale
/// itself when it runs outside them.
#[derive(Debug, Clone)]
pub struct Page {
    /// The request locale.
    pub locale: String,
    /// Whether the dark theme is on.
    pub dark_mode: bool,
    /// The signed-in admin, if any.
    pub admin: Option<CurrentAdmin>,
    /// The full request path, including the admin path.
    pub path: String,
}

impl FromRequestParts<AdminState> for Page {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AdminState,
    ) -> Result<Self, Self::Rejection> {
        let locale = match parts.extensions.get::<RequestLocale>() {
            Some(locale) => locale.0.clone(),
            None => state
                .locale_strategy()
                .resolve(parts, state.translator().as_ref()),
        };
        let path = parts
            .extensions
            .get::<OriginalUri>()
            .map_or_else(|| parts.uri.path(), |uri| uri.0.path())
            .to_string();
        Ok(Self {
            locale,
            dark_mode: parts
                .extensions
                .get::<Theme>()
                .is_some_and(|theme| theme.dark_mode),
            admin: parts.extensions.get::<CurrentAdmin>().cloned(),
            path,
        })
    }
}

impl Page {
    /// The render context for widgets on this page.
    pub fn render_cx<'a>(&'a self, state: &'a AdminState) -> RenderContext<'a> {
        RenderContext::new(state.templates(), &self.locale)
    }

    /// Translates `msgid` into the page locale.
    pub fn t(&self, state: &AdminState, msgid: &str) -> String {
        state.templates().gettext(msgid, &self.locale)
    }

    /// The context every page layout expects.
    pub fn context(&self, state: &AdminState) -> Context {
        let settings = state.settings();
        let mut context = Context::new();
        context.insert("title", &settings.title);
        context.insert("admin_path", &state.url(""));
        context.insert("logo_url", &settings.logo_url);
        context.insert("favicon_url", &settings.favicon_url);
        context.insert("login_logo_url", &settings.login_logo_url);
        context.insert("current_locale", &self.locale);
        context.insert(
            "available_locales",
            &state.translator().available_translations(),
        );
        context.insert("dark_mode", &self.dark_mode);
        context.insert("admin", &self.admin);
        if self.admin.is_some() {
            context.insert("menu", &state.menu().items_for(&self.path));
        }
        context
    }
}

/// Template names tried for `page` of `slug`: the resource's own, then the generic one.
pub fn resource_templates(slug: &str, page: &str) -> Vec<String> {
    vec![format!("{slug}/{page}.html"), format!("{page}.html")]
}
