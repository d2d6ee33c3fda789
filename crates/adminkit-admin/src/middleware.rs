//! Admin-wide middleware: locale and theme, and error pages.

use adminkit_http::cookies::cookie_value;
use adminkit_http::locale::LANGUAGE_KEY;
use adminkit_http::response::html;
use adminkit_http::{Cookie, ErrorPage};
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use http::StatusCode;

use crate::state::{AdminState, RequestLocale, Theme};

/// Cookie holding the theme preference.
pub const DARK_MODE_COOKIE: &str = "dark_mode";

/// What the `theme` query parameter asks for.
fn requested_theme(query: Option<&str>) -> Option<bool> {
    let query = query?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "theme")
        .and_then(|(_, value)| match value.as_ref() {
            "dark" => Some(true),
            "light" => Some(false),
            _ => None,
        })
}

/// Resolves the request locale and theme and stores them as extensions.
///
/// Every response gets the `language` cookie. A `?theme=` switch sets or
/// removes the `dark_mode` cookie.
pub async fn locale_and_theme(
    State(state): State<AdminState>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let locale = state
        .locale_strategy()
        .resolve(&parts, state.translator().as_ref());
    let switch = requested_theme(parts.uri.query());
    let dark_mode = switch.unwrap_or_else(|| {
        cookie_value(&parts.headers, DARK_MODE_COOKIE).is_some_and(|v| v == "yes")
    });
    tracing::debug!(locale = %locale, dark_mode, "Resolved request locale");

    parts.extensions.insert(RequestLocale(locale.clone()));
    parts.extensions.insert(Theme { dark_mode });
    let mut response = next.run(Request::from_parts(parts, body)).await;

    let cookie_path = state.url("");
    let headers = response.headers_mut();
    Cookie::new(LANGUAGE_KEY, locale)
        .path(cookie_path.clone())
        .append_to(headers);
    match switch {
        Some(true) => Cookie::new(DARK_MODE_COOKIE, "yes")
            .path(cookie_path)
            .append_to(headers),
        Some(false) => Cookie::removal(DARK_MODE_COOKIE, cookie_path).append_to(headers),
        None => {}
    }
    response
}

/// Renders `errors/{status}.html` for error responses marked with [`ErrorPage`].
///
/// Covers 401, 403, 404 and 500. Other statuses keep their plain-text body.
pub async fn error_pages(State(state): State<AdminState>, request: Request, next: Next) -> Response {
    let locale = request
        .extensions()
        .get::<RequestLocale>()
        .map(|l| l.0.clone())
        .unwrap_or_else(|| state.translator().default_locale().to_string());
    let dark_mode = request
        .extensions()
        .get::<Theme>()
        .is_some_and(|t| t.dark_mode);

    let response = next.run(request).await;
    let Some(page) = response.extensions().get::<ErrorPage>().cloned() else {
        return response;
    };
    if !matches!(
        page.status,
        StatusCode::UNAUTHORIZED
            | StatusCode::FORBIDDEN
            | StatusCode::NOT_FOUND
            | StatusCode::INTERNAL_SERVER_ERROR
    ) {
        return response;
    }

    let settings = state.settings();
    let mut context = adminkit_template::Context::new();
    context.insert("title", &settings.title);
    context.insert("admin_path", &state.url(""));
    context.insert("favicon_url", &settings.favicon_url);
    context.insert("current_locale", &locale);
    context.insert("dark_mode", &dark_mode);
    context.insert("status", &page.status.as_u16());
    context.insert("message", &page.message);

    let name = format!("errors/{}.html", page.status.as_u16());
    match state.templates().render(&name, &context) {
        Ok(body) => {
            let mut rendered = html(page.status, body);
            rendered.extensions_mut().insert(page);
            rendered
        }
        Err(e) => {
            tracing::warn!(template = %name, error = %e, "Cannot render error page");
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requested_theme() {
        assert_eq!(requested_theme(Some("theme=dark")), Some(true));
        assert_eq!(requested_theme(Some("a=1&theme=light")), Some(false));
        assert_eq!(requested_theme(Some("theme=blue")), None);
        assert_eq!(requested_theme(None), None);
    }
}
