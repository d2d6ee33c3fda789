//! Assertions over [`TestResponse`]s.

use crate::client::TestResponse;

/// Asserts that the body contains `text`.
///
/// # Panics
///
/// Panics if the body does not contain `text`.
pub fn assert_contains(response: &TestResponse, text: &str) {
    let body = response.text();
    assert!(
        body.contains(text),
        "Response body does not contain '{text}'.\nActual body: {body}"
    );
}

/// Asserts that the body does not contain `text`.
///
/// # Panics
///
/// Panics if the body contains `text`.
pub fn assert_not_contains(response: &TestResponse, text: &str) {
    let body = response.text();
    assert!(
        !body.contains(text),
        "Response body unexpectedly contains '{text}'.\nActual body: {body}"
    );
}

/// Asserts a redirect (3xx) to `expected_url`.
///
/// # Panics
///
/// Panics if the response is not a redirect or points elsewhere.
pub fn assert_redirects(response: &TestResponse, expected_url: &str) {
    let status = response.status_code();
    assert!(
        (300..400).contains(&status),
        "Expected a redirect (3xx), got {status}"
    );
    let location = response
        .location()
        .unwrap_or_else(|| panic!("Redirect response missing Location header"));
    assert_eq!(
        location, expected_url,
        "Expected redirect to '{expected_url}', got '{location}'"
    );
}

/// Asserts the status code.
///
/// # Panics
///
/// Panics if the status differs.
pub fn assert_status(response: &TestResponse, expected: u16) {
    assert_eq!(
        response.status_code(),
        expected,
        "Expected status {expected}, got {}.\nBody: {}",
        response.status_code(),
        response.text()
    );
}
