//! Response helpers.
//!
//! Handlers return [`HttpResult`]. Any [`AdminError`] converts into an
//! [`HttpError`], whose response carries the status, a plain-text body, and an
//! [`ErrorPage`] extension the admin's error-page middleware turns into a
//! rendered error template.

use adminkit_core::AdminError;
use axum::response::{Html, IntoResponse, Response};
use http::header::LOCATION;
use http::{HeaderValue, StatusCode};

/// Marks a response as an error that should be shown as an error page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPage {
    /// The response status.
    pub status: StatusCode,
    /// The error message.
    pub message: String,
}

/// An [`AdminError`] on its way to becoming a response.
#[derive(Debug)]
pub struct HttpError(pub AdminError);

/// The result type of admin handlers.
pub type HttpResult<T = Response> = Result<T, HttpError>;

impl From<AdminError> for HttpError {
    fn from(err: AdminError) -> Self {
        Self(err)
    }
}

impl HttpError {
    /// The HTTP status of the wrapped error.
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Admin request failed");
        } else {
            tracing::debug!(status = %status, error = %self.0, "Admin request rejected");
        }
        let message = self.0.to_string();
        let mut response = (status, message.clone()).into_response();
        response
            .extensions_mut()
            .insert(ErrorPage { status, message });
        response
    }
}

/// A `303 See Other` redirect.
pub fn see_other(location: &str) -> Response {
    let mut response = StatusCode::SEE_OTHER.into_response();
    match HeaderValue::try_from(location) {
        Ok(value) => {
            response.headers_mut().insert(LOCATION, value);
        }
        Err(e) => tracing::warn!(location = %location, error = %e, "Invalid redirect location"),
    }
    response
}

/// An HTML response with the given status.
pub fn html(status: StatusCode, body: String) -> Response {
    (status, Html(body)).into_response()
}

/// A `200 OK` HTML response.
pub fn ok_html(body: String) -> Response {
    html(StatusCode::OK, body)
}
