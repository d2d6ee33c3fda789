//! The composition root.
//!
//! [`AdminApp::builder`] takes the settings and the ORM backend; providers,
//! resources, the menu and custom routes are added before [`build`]. The
//! built app turns into an axum [`Router`] mounted at the admin path.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use adminkit_admin::app::AdminApp;
//! # use adminkit_admin::backend::OrmBackend;
//! # use adminkit_core::settings::AdminSettings;
//! # fn wire(backend: Arc<dyn OrmBackend>) -> adminkit_core::AdminResult<axum::Router> {
//! let app = AdminApp::builder(AdminSettings::default(), backend).build()?;
//! let router: axum::Router = axum::Router::new().merge(app.into_router());
//! # Ok(router)
//! # }
//! ```
//!
//! [`build`]: AdminAppBuilder::build

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use adminkit_core::i18n::{I18nTranslator, Translator};
use adminkit_core::logging::request_span;
use adminkit_core::settings::AdminSettings;
use adminkit_core::{AdminError, AdminResult};
use adminkit_http::LocaleStrategy;
use adminkit_template::Templates;
use axum::extract::{DefaultBodyLimit, Request};
use axum::middleware::from_fn_with_state;
use axum::routing::MethodRouter;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::backend::OrmBackend;
use crate::menu::{Menu, MenuEntry};
use crate::middleware::{error_pages, locale_and_theme};
use crate::provider::{provider_middleware, Provider};
use crate::resource::ModelResourceBuilder;
use crate::routes;
use crate::state::AdminState;

/// Declares an [`AdminApp`].
pub struct AdminAppBuilder {
    settings: AdminSettings,
    backend: Arc<dyn OrmBackend>,
    resources: Vec<ModelResourceBuilder>,
    menu: Option<Vec<MenuEntry>>,
    providers: Vec<Arc<dyn Provider>>,
    routes: Vec<(String, MethodRouter<AdminState>)>,
    translator: Option<Arc<dyn Translator>>,
    template_dirs: Vec<PathBuf>,
    locale_strategy: Option<LocaleStrategy>,
}

impl fmt::Debug for AdminAppBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminAppBuilder")
            .field("admin_path", &self.settings.admin_path)
            .field("backend", &self.backend.name())
            .field("resources", &self.resources.len())
            .field("providers", &self.providers.len())
            .finish_non_exhaustive()
    }
}

impl AdminAppBuilder {
    /// Registers a model resource.
    #[must_use]
    pub fn resource(mut self, resource: ModelResourceBuilder) -> Self {
        self.resources.push(resource);
        self
    }

    /// Replaces the default menu, which lists every resource in order.
    #[must_use]
    pub fn menu(mut self, entries: impl IntoIterator<Item = MenuEntry>) -> Self {
        self.menu = Some(entries.into_iter().collect());
        self
    }

    /// Adds a provider. Providers run in the order they are added.
    #[must_use]
    pub fn provider(mut self, provider: impl Provider + 'static) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    /// Adds a route under the admin path, behind the admin middleware.
    #[must_use]
    pub fn route(mut self, path: impl Into<String>, method_router: MethodRouter<AdminState>) -> Self {
        self.routes.push((path.into(), method_router));
        self
    }

    /// Uses `translator` instead of one loaded from the settings.
    #[must_use]
    pub fn translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Adds a template folder, searched before the settings' folders.
    #[must_use]
    pub fn template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.template_dirs.push(dir.into());
        self
    }

    /// Overrides the locale strategy chosen from the settings.
    #[must_use]
    pub fn locale_strategy(mut self, strategy: LocaleStrategy) -> Self {
        self.locale_strategy = Some(strategy);
        self
    }

    /// Loads translations and templates and scaffolds every resource.
    ///
    /// Fails on an unknown field, a duplicate slug, or a menu entry that
    /// references an unregistered resource.
    pub fn build(self) -> AdminResult<AdminApp> {
        let settings = self.settings;
        let translator: Arc<dyn Translator> = match self.translator {
            Some(translator) => translator,
            None => Arc::new(I18nTranslator::from_settings(&settings)?),
        };

        let mut dirs = self.template_dirs;
        dirs.extend(settings.template_dirs.iter().cloned());
        let templates = Templates::with_dirs(translator, dirs)?;

        let mut slugs = HashSet::new();
        let mut resources = Vec::with_capacity(self.resources.len());
        for builder in self.resources {
            if !slugs.insert(builder.slug_or_name().to_string()) {
                return Err(AdminError::Configuration(format!(
                    "resource '{}' is registered twice",
                    builder.slug_or_name()
                )));
            }
            let resource = builder
                .default_page_size(settings.default_page_size)
                .build(self.backend.as_ref())?;
            resources.push(Arc::new(resource));
        }

        let menu = match &self.menu {
            Some(entries) => Menu::build(entries, &resources, |path| settings.url(path))?,
            None => Menu::from_resources(&resources, |path| settings.url(path)),
        };

        let locale_strategy = self.locale_strategy.unwrap_or_else(|| {
            settings
                .fixed_locale
                .clone()
                .map_or(LocaleStrategy::FromRequest, LocaleStrategy::Const)
        });

        tracing::info!(
            admin_path = %settings.admin_path,
            backend = self.backend.name(),
            resources = resources.len(),
            providers = self.providers.len(),
            "Admin app built"
        );

        let state = AdminState::new(
            settings,
            templates,
            self.backend,
            resources,
            menu,
            locale_strategy,
        );
        Ok(AdminApp {
            state,
            providers: self.providers,
            routes: self.routes,
        })
    }
}

/// A built admin app.
pub struct AdminApp {
    state: AdminState,
    providers: Vec<Arc<dyn Provider>>,
    routes: Vec<(String, MethodRouter<AdminState>)>,
}

impl fmt::Debug for AdminApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let providers: Vec<&str> = self.providers.iter().map(|p| p.name()).collect();
        f.debug_struct("AdminApp")
            .field("state", &self.state)
            .field("providers", &providers)
            .finish_non_exhaustive()
    }
}

impl AdminApp {
    /// Starts declaring an app over `backend`.
    pub fn builder(settings: AdminSettings, backend: Arc<dyn OrmBackend>) -> AdminAppBuilder {
        AdminAppBuilder {
            settings,
            backend,
            resources: Vec::new(),
            menu: None,
            providers: Vec::new(),
            routes: Vec::new(),
            translator: None,
            template_dirs: Vec::new(),
            locale_strategy: None,
        }
    }

    /// The shared state.
    pub fn state(&self) -> &AdminState {
        &self.state
    }

    /// The admin routes relative to the admin path.
    ///
    /// Middleware order, outermost first: tracing, the body limit, locale
    /// and theme, error pages, then each provider in the order added.
    ///
    /// Request bodies may be as large as `max_upload_size`.
    pub fn router(self) -> Router {
        let state = self.state;
        let body_limit = usize::try_from(state.settings().max_upload_size).unwrap_or(usize::MAX);
        let mut router = routes::router();
        for (path, method_router) in self.routes {
            router = router.route(&path, method_router);
        }
        for provider in &self.providers {
            tracing::debug!(provider = provider.name(), "Mounting provider routes");
            router = router.merge(Arc::clone(provider).routes());
        }
        router = router.fallback(routes::not_found);
        for provider in self.providers.into_iter().rev() {
            router = router.layer(from_fn_with_state(
                (state.clone(), provider),
                provider_middleware,
            ));
        }
        router
            .layer(from_fn_with_state(state.clone(), error_pages))
            .layer(from_fn_with_state(state.clone(), locale_and_theme))
            .layer(DefaultBodyLimit::max(body_limit))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(|req: &Request| request_span(req.method().as_str(), req.uri().path())),
            )
            .with_state(state)
    }

    /// The admin routes nested at the admin path.
    pub fn into_router(self) -> Router {
        let path = self.state.settings().admin_path.trim_end_matches('/').to_string();
        let admin = self.router();
        if path.is_empty() {
            admin
        } else {
            Router::new().nest(&path, admin)
        }
    }
}
