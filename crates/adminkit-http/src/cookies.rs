//! Cookie handling.
//!
//! The admin sets four cookies, all scoped to the admin path: the session
//! token, the `remember_me` flag, the `language` and the `dark_mode` theme.
//! Values are percent-encoded on the way out and decoded on the way in.

use std::collections::HashMap;
use std::fmt;

use http::header::{COOKIE, SET_COOKIE};
use http::{HeaderMap, HeaderValue};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

/// Bytes that may not appear verbatim in a cookie value.
const COOKIE_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b',')
    .add(b';')
    .add(b'\\')
    .add(b'%');

/// The `SameSite` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    /// Only same-site requests.
    Strict,
    /// Same-site requests and top-level navigations.
    Lax,
    /// Every request.
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        })
    }
}

/// A cookie to send in a `Set-Cookie` header.
///
/// ```
/// use adminkit_http::cookies::Cookie;
///
/// let cookie = Cookie::new("language", "uk").path("/admin");
/// assert_eq!(cookie.to_string(), "language=uk; Path=/admin; SameSite=Lax");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    name: String,
    value: String,
    path: String,
    max_age: Option<u64>,
    http_only: bool,
    secure: bool,
    same_site: Option<SameSite>,
}

impl Cookie {
    /// A session cookie on `/` with `SameSite=Lax`.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: "/".to_string(),
            max_age: None,
            http_only: false,
            secure: false,
            same_site: Some(SameSite::Lax),
        }
    }

    /// A cookie that makes the browser drop `name` on `path`.
    pub fn removal(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, "").path(path).max_age(0)
    }

    /// Sets the path.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.path = if path.is_empty() { "/".to_string() } else { path };
        self
    }

    /// Sets `Max-Age` in seconds.
    #[must_use]
    pub const fn max_age(mut self, seconds: u64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    /// Hides the cookie from scripts.
    #[must_use]
    pub const fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// Restricts the cookie to HTTPS.
    #[must_use]
    pub const fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Sets or clears the `SameSite` attribute.
    #[must_use]
    pub const fn same_site(mut self, same_site: Option<SameSite>) -> Self {
        self.same_site = same_site;
        self
    }

    /// The cookie name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The unencoded cookie value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Appends this cookie as a `Set-Cookie` header.
    pub fn append_to(&self, headers: &mut HeaderMap) {
        match HeaderValue::try_from(self.to_string()) {
            Ok(value) => {
                headers.append(SET_COOKIE, value);
            }
            Err(e) => tracing::warn!(cookie = %self.name, error = %e, "Dropping unencodable cookie"),
        }
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={}; Path={}",
            self.name,
            utf8_percent_encode(&self.value, COOKIE_VALUE),
            self.path
        )?;
        if let Some(max_age) = self.max_age {
            write!(f, "; Max-Age={max_age}")?;
        }
        if self.http_only {
            f.write_str("; HttpOnly")?;
        }
        if self.secure {
            f.write_str("; Secure")?;
        }
        if let Some(same_site) = self.same_site {
            write!(f, "; SameSite={same_site}")?;
        }
        Ok(())
    }
}

/// Parses a `Cookie` header into decoded name-value pairs.
///
/// Entries without `=` or with an empty name are skipped. Later duplicates win.
pub fn parse_cookie_header(header: &str) -> HashMap<String, String> {
    header
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .filter_map(|(name, value)| {
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            let value = percent_decode_str(value.trim()).decode_utf8_lossy();
            Some((name.to_string(), value.into_owned()))
        })
        .collect()
}

/// Collects the cookies of every `Cookie` header in `headers`.
pub fn cookies_from_headers(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(parse_cookie_header)
        .collect()
}

/// Returns the value of one request cookie.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    cookies_from_headers(headers).remove(name)
}
