//! Settings for the adminkit admin panel.
//!
//! [`AdminSettings`] holds everything the composition root needs that is not
//! a live handle (database connections and cache clients are passed to the
//! builder directly). Every field has a sensible default so an empty TOML file
//! yields a working configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default maximum upload size: 1 GiB.
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 1024 * 1024 * 1024;

/// Session lifetime without "remember me": one hour.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 3600;

/// Session lifetime with "remember me": thirty days.
pub const DEFAULT_REMEMBER_ME_TTL_SECS: u64 = 3600 * 24 * 30;

/// The complete set of admin settings.
///
/// # Examples
///
/// ```
/// use adminkit_core::settings::AdminSettings;
///
/// let settings = AdminSettings::default();
/// assert_eq!(settings.admin_path, "/admin");
/// assert_eq!(settings.default_locale, "en");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSettings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled (pretty logs instead of JSON).
    pub debug: bool,
    /// The log filter directive (e.g. "info", "adminkit_admin=debug").
    pub log_level: String,
    /// URL prefix the admin is mounted under. Cookies are scoped to it.
    pub admin_path: String,
    /// Title shown in the page header.
    pub title: String,
    /// Logo shown in the navigation bar.
    pub logo_url: Option<String>,
    /// Favicon URL.
    pub favicon_url: Option<String>,
    /// Logo shown on the login page.
    pub login_logo_url: Option<String>,
    /// Extra template folders; templates found here override the built-in ones.
    pub template_dirs: Vec<PathBuf>,
    /// Page size used by list views when the request does not ask for one.
    pub default_page_size: u64,

    // ── Internationalization ─────────────────────────────────────────

    /// The locale used when none can be resolved from the request.
    pub default_locale: String,
    /// Directory of `<locale>/LC_MESSAGES/<domain>.mo` catalogs replacing the built-in ones.
    pub locales_dir: Option<PathBuf>,
    /// Directory of catalogs merged over the default ones.
    pub extra_locales_dir: Option<PathBuf>,
    /// The gettext domain (catalog file stem).
    pub locale_domain: String,
    /// When set, every request uses this locale.
    pub fixed_locale: Option<String>,

    // ── Uploads ──────────────────────────────────────────────────────

    /// Directory uploaded files are written to.
    pub uploads_dir: PathBuf,
    /// URL prefix under which `uploads_dir` is served.
    pub static_uploads_prefix: String,
    /// Allowed file extensions. Empty means any extension.
    pub allow_extensions: Vec<String>,
    /// Maximum upload size in bytes.
    pub max_upload_size: u64,

    // ── Sessions ─────────────────────────────────────────────────────

    /// Session lifetime in seconds.
    pub session_ttl_secs: u64,
    /// Session lifetime in seconds when "remember me" is checked.
    pub remember_me_ttl_secs: u64,
    /// Redis connection URL for the session cache store.
    pub redis_url: Option<String>,

    // ── Database ─────────────────────────────────────────────────────

    /// Database location used by applications wiring a backend from settings.
    pub database_url: String,
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),
            admin_path: "/admin".to_string(),
            title: "Admin".to_string(),
            logo_url: None,
            favicon_url: None,
            login_logo_url: None,
            template_dirs: Vec::new(),
            default_page_size: 10,

            default_locale: "en".to_string(),
            locales_dir: None,
            extra_locales_dir: None,
            locale_domain: "messages".to_string(),
            fixed_locale: None,

            uploads_dir: PathBuf::from("static/uploads"),
            static_uploads_prefix: "/static/uploads".to_string(),
            allow_extensions: Vec::new(),
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,

            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            remember_me_ttl_secs: DEFAULT_REMEMBER_ME_TTL_SECS,
            redis_url: None,

            database_url: "admin.sqlite3".to_string(),
        }
    }
}

impl AdminSettings {
    /// Returns `admin_path` joined with `path`.
    ///
    /// ```
    /// use adminkit_core::settings::AdminSettings;
    ///
    /// let settings = AdminSettings::default();
    /// assert_eq!(settings.url("/login"), "/admin/login");
    /// assert_eq!(settings.url(""), "/admin");
    /// ```
    pub fn url(&self, path: &str) -> String {
        let base = self.admin_path.trim_end_matches('/');
        if path.is_empty() {
            if base.is_empty() {
                return "/".to_string();
            }
            return base.to_string();
        }
        format!("{base}/{}", path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let s = AdminSettings::default();
        assert!(s.debug);
        assert_eq!(s.log_level, "info");
        assert_eq!(s.admin_path, "/admin");
        assert_eq!(s.default_page_size, 10);
        assert_eq!(s.default_locale, "en");
        assert_eq!(s.locale_domain, "messages");
        assert_eq!(s.static_uploads_prefix, "/static/uploads");
        assert_eq!(s.max_upload_size, 1024 * 1024 * 1024);
        assert_eq!(s.session_ttl_secs, 3600);
        assert_eq!(s.remember_me_ttl_secs, 2_592_000);
        assert!(s.redis_url.is_none());
        assert!(s.fixed_locale.is_none());
    }

    #[test]
    fn test_url_joining() {
        let mut s = AdminSettings::default();
        assert_eq!(s.url("user/list"), "/admin/user/list");
        s.admin_path = "/panel/".to_string();
        assert_eq!(s.url("/login"), "/panel/login");
        s.admin_path = String::new();
        assert_eq!(s.url(""), "/");
        assert_eq!(s.url("login"), "/login");
    }
}
