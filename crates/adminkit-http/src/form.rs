//! Submitted form data.
//!
//! [`FormData`] is an axum extractor accepting both
//! `application/x-www-form-urlencoded` and `multipart/form-data` bodies.
//! Fields keep every submitted value so many-to-many selects can be read
//! with [`FormData::get_all`]; uploads land in [`FormData::file`].

use std::collections::HashMap;

use adminkit_core::files::UploadedFile;
use adminkit_core::AdminError;
use axum::extract::{FromRequest, Request};
use bytes::Bytes;
use http::header::CONTENT_TYPE;

use crate::response::HttpError;

/// Fields and files of one submitted form.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    fields: HashMap<String, Vec<String>>,
    files: HashMap<String, Vec<UploadedFile>>,
}

impl FormData {
    /// An empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field value.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.entry(name.into()).or_default().push(value.into());
    }

    /// Adds an uploaded file.
    pub fn push_file(&mut self, name: impl Into<String>, file: UploadedFile) {
        self.files.entry(name.into()).or_default().push(file);
    }

    /// The first value of a field.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Every value of a field, in submission order.
    pub fn get_all(&self, name: &str) -> &[String] {
        self.fields.get(name).map_or(&[], Vec::as_slice)
    }

    /// The first file uploaded under `name`.
    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name).and_then(|files| files.first())
    }

    /// Returns `true` if a field or file named `name` was submitted.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name) || self.files.contains_key(name)
    }

    /// Field names, in no particular order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Parses an urlencoded body.
    pub fn from_urlencoded(body: &[u8]) -> Self {
        let mut form = Self::new();
        for (name, value) in url::form_urlencoded::parse(body) {
            form.push(name, value);
        }
        form
    }

    /// Parses a multipart body delimited by `boundary`.
    ///
    /// File parts keep their bytes untouched. A file input left empty by the
    /// browser arrives as a file with an empty filename.
    pub fn from_multipart(body: &[u8], boundary: &str) -> Result<Self, AdminError> {
        let delimiter = format!("--{boundary}").into_bytes();
        let separator = format!("\r\n--{boundary}").into_bytes();

        let mut form = Self::new();
        let mut cursor = find(body, &delimiter, 0)
            .ok_or_else(|| AdminError::BadRequest("Multipart body has no boundary".into()))?
            + delimiter.len();

        loop {
            let rest = &body[cursor..];
            if rest.starts_with(b"--") {
                break;
            }
            let part_start = if rest.starts_with(b"\r\n") {
                cursor + 2
            } else {
                cursor
            };
            let part_end = find(body, &separator, part_start).ok_or_else(|| {
                AdminError::BadRequest("Multipart body is not terminated".into())
            })?;
            form.add_part(&body[part_start..part_end])?;
            cursor = part_end + separator.len();
        }

        Ok(form)
    }

    fn add_part(&mut self, part: &[u8]) -> Result<(), AdminError> {
        let split = find(part, b"\r\n\r\n", 0)
            .ok_or_else(|| AdminError::BadRequest("Multipart part has no headers".into()))?;
        let headers = String::from_utf8_lossy(&part[..split]);
        let content = &part[split + 4..];

        let mut name = None;
        let mut filename = None;
        let mut content_type = "text/plain".to_string();
        for line in headers.lines() {
            let Some((header, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            if header.trim().eq_ignore_ascii_case("content-disposition") {
                name = header_param(value, "name");
                filename = header_param(value, "filename");
            } else if header.trim().eq_ignore_ascii_case("content-type") {
                content_type = value.to_string();
            }
        }

        let Some(name) = name else {
            return Ok(());
        };
        match filename {
            Some(filename) => {
                let file =
                    UploadedFile::new(filename, content_type, Bytes::copy_from_slice(content));
                self.push_file(name, file);
            }
            None => self.push(name, String::from_utf8_lossy(content)),
        }
        Ok(())
    }
}

impl<S> FromRequest<S> for FormData
where
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| AdminError::BadRequest(format!("Cannot read form body: {e}")))?;

        if content_type.starts_with("multipart/form-data") {
            let boundary = extract_boundary(&content_type).ok_or_else(|| {
                AdminError::BadRequest("Multipart content type has no boundary".into())
            })?;
            Ok(Self::from_multipart(&body, boundary)?)
        } else {
            Ok(Self::from_urlencoded(&body))
        }
    }
}

/// Extracts `boundary=...` from a multipart content type.
pub fn extract_boundary(content_type: &str) -> Option<&str> {
    content_type
        .split(';')
        .filter_map(|param| param.trim().strip_prefix("boundary="))
        .map(|b| b.trim_matches('"'))
        .find(|b| !b.is_empty())
}

/// Reads `param="value"` (or an unquoted value) from a header value.
fn header_param(header_value: &str, param: &str) -> Option<String> {
    header_value.split(';').find_map(|item| {
        let (key, value) = item.trim().split_once('=')?;
        (key.trim() == param).then(|| value.trim().trim_matches('"').to_string())
    })
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}
