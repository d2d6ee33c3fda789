//! HTTP test client for adminkit apps.
//!
//! [`TestClient`] sends requests through an axum [`Router`] without a socket
//! and keeps the cookies the app sets, so a login carries over to the next
//! request. [`TestResponse`] holds the status, headers and collected body.
//!
//! ```rust,no_run
//! use adminkit_test::client::TestClient;
//! use axum::routing::get;
//! use axum::Router;
//!
//! async fn example() {
//!     let app = Router::new().route("/hello", get(|| async { "Hello" }));
//!     let mut client = TestClient::new(app);
//!
//!     let response = client.get("/hello").await;
//!     assert_eq!(response.status_code(), 200);
//!     assert_eq!(response.text(), "Hello");
//! }
//! ```

use std::collections::BTreeMap;

use adminkit_core::AdminError;
use axum::body::Body;
use axum::Router;
use bytes::Bytes;
use http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use http::{HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

const BOUNDARY: &str = "adminkit-test-boundary";

/// A `multipart/form-data` body under construction.
#[derive(Debug, Clone, Default)]
pub struct Multipart {
    body: Vec<u8>,
}

impl Multipart {
    /// An empty body.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a text field.
    #[must_use]
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    /// Appends a file field.
    #[must_use]
    pub fn file(mut self, name: &str, filename: &str, content_type: &str, content: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; \
                 filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(content);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.body
    }
}

/// A test client for one axum app.
///
/// Cookies set by responses are sent with every later request until the app
/// removes them.
#[derive(Debug)]
pub struct TestClient {
    app: Router,
    cookies: BTreeMap<String, String>,
    headers: HeaderMap,
}

impl TestClient {
    /// A client for `app`.
    pub fn new(app: Router) -> Self {
        Self {
            app,
            cookies: BTreeMap::new(),
            headers: HeaderMap::new(),
        }
    }

    /// Sends `value` as header `name` with every request.
    ///
    /// # Panics
    ///
    /// Panics if `name` or `value` is not a valid header.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(
            HeaderName::try_from(name).expect("valid header name"),
            HeaderValue::try_from(value).expect("valid header value"),
        );
        self
    }

    /// Sends a GET request.
    pub async fn get(&mut self, path: &str) -> TestResponse {
        self.send(Method::GET, path, HeaderMap::new(), Vec::new()).await
    }

    /// Sends a GET request with extra headers.
    pub async fn get_with_headers(&mut self, path: &str, headers: &[(&str, &str)]) -> TestResponse {
        self.send(Method::GET, path, header_map(headers), Vec::new())
            .await
    }

    /// Sends a POST request with a URL-encoded form.
    pub async fn post_form(&mut self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        self.form(Method::POST, path, fields).await
    }

    /// Sends a POST request with a multipart form.
    pub async fn post_multipart(&mut self, path: &str, form: Multipart) -> TestResponse {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("multipart/form-data; boundary=adminkit-test-boundary"),
        );
        self.send(Method::POST, path, headers, form.finish()).await
    }

    /// Sends a PUT request with a URL-encoded form.
    pub async fn put_form(&mut self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        self.form(Method::PUT, path, fields).await
    }

    /// Sends a DELETE request.
    pub async fn delete(&mut self, path: &str) -> TestResponse {
        self.send(Method::DELETE, path, HeaderMap::new(), Vec::new())
            .await
    }

    /// Sends a DELETE request with extra headers.
    pub async fn delete_with_headers(
        &mut self,
        path: &str,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        self.send(Method::DELETE, path, header_map(headers), Vec::new())
            .await
    }

    /// Sets a cookie sent with later requests.
    pub fn set_cookie(&mut self, name: &str, value: &str) {
        self.cookies.insert(name.to_string(), value.to_string());
    }

    /// The current value of a cookie.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Forgets every cookie.
    pub fn clear_cookies(&mut self) {
        self.cookies.clear();
    }

    async fn form(&mut self, method: Method, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        self.send(method, path, headers, body.into_bytes()).await
    }

    fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    async fn send(
        &mut self,
        method: Method,
        path: &str,
        headers: HeaderMap,
        body: Vec<u8>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        for (name, value) in self.headers.iter().chain(headers.iter()) {
            builder = builder.header(name, value);
        }
        if let Some(cookie) = self.cookie_header() {
            builder = builder.header(COOKIE, cookie);
        }
        let request = builder
            .body(Body::from(body))
            .expect("request builder should not fail");

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router should not error");

        let status = response.status();
        let headers = response.headers().clone();
        let mut set_cookies = Vec::new();
        for value in headers.get_all(SET_COOKIE) {
            let Ok(raw) = value.to_str() else { continue };
            let Some(cookie) = SetCookie::parse(raw) else {
                continue;
            };
            if cookie.is_removal() {
                self.cookies.remove(&cookie.name);
            } else {
                self.cookies
                    .insert(cookie.name.clone(), cookie.value.clone());
            }
            set_cookies.push(cookie);
        }

        let body = response
            .into_body()
            .collect()
            .await
            .map_or_else(|_| Bytes::new(), http_body_util::Collected::to_bytes);

        TestResponse {
            status,
            headers,
            body: body.to_vec(),
            set_cookies,
        }
    }
}

fn header_map(headers: &[(&str, &str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        map.append(
            HeaderName::try_from(*name).expect("valid header name"),
            HeaderValue::try_from(*value).expect("valid header value"),
        );
    }
    map
}

/// One parsed `Set-Cookie` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    /// The cookie name.
    pub name: String,
    /// The cookie value.
    pub value: String,
    /// Attributes, keyed by lowercase name. Flags map to an empty string.
    pub attributes: BTreeMap<String, String>,
}

impl SetCookie {
    /// Parses `name=value; Attr=x; Flag`.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split(';');
        let (name, value) = parts.next()?.split_once('=')?;
        let attributes = parts
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| match part.split_once('=') {
                Some((k, v)) => (k.trim().to_ascii_lowercase(), v.trim().to_string()),
                None => (part.to_ascii_lowercase(), String::new()),
            })
            .collect();
        Some(Self {
            name: name.trim().to_string(),
            value: value.trim().to_string(),
            attributes,
        })
    }

    /// An attribute value.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Returns `true` for a flag such as `HttpOnly`.
    pub fn has_flag(&self, name: &str) -> bool {
        self.attributes.contains_key(&name.to_ascii_lowercase())
    }

    /// Returns `true` if the header deletes the cookie.
    pub fn is_removal(&self) -> bool {
        self.attribute("max-age") == Some("0")
    }
}

/// The response to a test request.
#[derive(Debug)]
pub struct TestResponse {
    /// The status.
    pub status: StatusCode,
    /// The headers.
    pub headers: HeaderMap,
    /// The collected body.
    pub body: Vec<u8>,
    /// Every `Set-Cookie` header, in order.
    pub set_cookies: Vec<SetCookie>,
}

impl TestResponse {
    /// The body as UTF-8, lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Deserializes the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, AdminError> {
        serde_json::from_slice(&self.body).map_err(|e| AdminError::Serialization(e.to_string()))
    }

    /// The numeric status.
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// A header value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The `Location` header.
    pub fn location(&self) -> Option<&str> {
        self.headers.get(LOCATION).and_then(|v| v.to_str().ok())
    }

    /// The last `Set-Cookie` for `name`.
    pub fn set_cookie(&self, name: &str) -> Option<&SetCookie> {
        self.set_cookies.iter().rev().find(|c| c.name == name)
    }

    /// Returns `true` if the body contains `text`.
    pub fn contains(&self, text: &str) -> bool {
        self.text().contains(text)
    }
}

#[cfg(test)]
mod tests {
    use adminkit_http::FormData;
    use axum::routing::{delete, get, post, put};

    use super::*;

    fn test_app() -> Router {
        Router::new()
            .route("/hello", get(|| async { "Hello" }))
            .route("/echo", post(|body: String| async move { body }))
            .route("/put", put(|body: String| async move { body }))
            .route("/gone", delete(|| async { StatusCode::NO_CONTENT }))
            .route(
                "/cookie",
                get(|headers: HeaderMap| async move {
                    headers
                        .get(COOKIE)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("none")
                        .to_string()
                }),
            )
            .route(
                "/login",
                get(|| async {
                    (
                        [(SET_COOKIE, "access_token=abc; Path=/; Max-Age=60; HttpOnly; SameSite=Lax")],
                        "in",
                    )
                }),
            )
            .route(
                "/logout",
                get(|| async { ([(SET_COOKIE, "access_token=; Path=/; Max-Age=0")], "out") }),
            )
            .route(
                "/upload",
                post(|form: FormData| async move {
                    let username = form.get("username").unwrap_or_default().to_string();
                    let file = form.file("profile_pic").map(|f| (f.filename.clone(), f.content.len()));
                    format!("{username}:{file:?}")
                }),
            )
    }

    // ── Requests ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_get() {
        let mut client = TestClient::new(test_app());
        let response = client.get("/hello").await;
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.text(), "Hello");
        assert_eq!(client.get("/missing").await.status_code(), 404);
    }

    #[tokio::test]
    async fn test_post_form_is_encoded() {
        let mut client = TestClient::new(test_app());
        let response = client
            .post_form("/echo", &[("name", "a b&c"), ("save", "")])
            .await;
        assert_eq!(response.text(), "name=a+b%26c&save=");
    }

    #[tokio::test]
    async fn test_put_and_delete() {
        let mut client = TestClient::new(test_app());
        assert_eq!(client.put_form("/put", &[("x", "1")]).await.text(), "x=1");
        assert_eq!(client.delete("/gone").await.status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_multipart() {
        let mut client = TestClient::new(test_app());
        let form = Multipart::new()
            .text("username", "root")
            .file("profile_pic", "me.png", "image/png", b"png");
        let response = client.post_multipart("/upload", form).await;
        assert_eq!(response.text(), "root:Some((\"me.png\", 3))");
    }

    // ── Cookies ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_cookie_jar() {
        let mut client = TestClient::new(test_app());
        assert_eq!(client.get("/cookie").await.text(), "none");

        let response = client.get("/login").await;
        let cookie = response.set_cookie("access_token").unwrap();
        assert_eq!(cookie.value, "abc");
        assert_eq!(cookie.attribute("Max-Age"), Some("60"));
        assert!(cookie.has_flag("httponly"));
        assert_eq!(client.cookie("access_token"), Some("abc"));
        assert_eq!(client.get("/cookie").await.text(), "access_token=abc");

        let response = client.get("/logout").await;
        assert!(response.set_cookie("access_token").unwrap().is_removal());
        assert_eq!(client.cookie("access_token"), None);
    }

    #[tokio::test]
    async fn test_default_headers() {
        let app = Router::new().route(
            "/lang",
            get(|headers: HeaderMap| async move {
                headers
                    .get("accept-language")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string()
            }),
        );
        let mut client = TestClient::new(app).with_header("accept-language", "fr");
        assert_eq!(client.get("/lang").await.text(), "fr");
    }

    #[test]
    fn test_set_cookie_parse() {
        let cookie = SetCookie::parse("remember_me=on; Path=/admin").unwrap();
        assert_eq!(cookie.name, "remember_me");
        assert_eq!(cookie.attribute("path"), Some("/admin"));
        assert!(!cookie.is_removal());
        assert!(SetCookie::parse("garbage").is_none());
    }
}
