//! Integration tests driving the extractors through an axum router.

use adminkit_http::response::{see_other, HttpResult};
use adminkit_http::{Cookie, ErrorPage, FormData, HttpError};
use adminkit_core::AdminError;
use axum::body::Body;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

async fn echo(form: FormData) -> HttpResult {
    let username = form
        .get("username")
        .ok_or_else(|| AdminError::Validation("username is required".into()))?;
    let size = form.file("avatar").map_or(0, |f| f.content.len());
    Ok(format!("{username}:{size}").into_response())
}

async fn login() -> Response {
    let mut response = see_other("/admin");
    Cookie::new("access_token", "t0k3n")
        .path("/admin")
        .http_only(true)
        .append_to(response.headers_mut());
    response
}

fn app() -> Router {
    Router::new()
        .route("/echo", post(echo))
        .route("/login", post(login))
}

async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_urlencoded_form() {
    let request = Request::post("/echo")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from("username=root"))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "root:0");
}

#[tokio::test]
async fn test_multipart_form() {
    let body = "--XyZ\r\n\
        Content-Disposition: form-data; name=\"username\"\r\n\r\n\
        admin\r\n\
        --XyZ\r\n\
        Content-Disposition: form-data; name=\"avatar\"; filename=\"me.png\"\r\n\
        Content-Type: image/png\r\n\r\n\
        12345\r\n\
        --XyZ--\r\n";
    let request = Request::post("/echo")
        .header("content-type", "multipart/form-data; boundary=XyZ")
        .body(Body::from(body))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(body_text(response).await, "admin:5");
}

#[tokio::test]
async fn test_validation_error_maps_to_400_with_marker() {
    let request = Request::post("/echo")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from("other=1"))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.extensions().get::<ErrorPage>().is_some());
}

#[tokio::test]
async fn test_broken_multipart_is_bad_request() {
    let request = Request::post("/echo")
        .header("content-type", "multipart/form-data")
        .body(Body::from("whatever"))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_redirect_with_cookie() {
    let request = Request::post("/login").body(Body::empty()).unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cookie = response.headers()["set-cookie"].to_str().unwrap();
    assert!(cookie.starts_with("access_token=t0k3n; Path=/admin"));
    assert!(cookie.contains("HttpOnly"));
}

#[test]
fn test_http_error_from_admin_error() {
    let err: HttpError = AdminError::Unauthorized("login required".into()).into();
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
}
