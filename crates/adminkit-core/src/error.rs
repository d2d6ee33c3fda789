//! Core error types for adminkit.
//!
//! [`AdminError`] covers every failure the admin panel can surface: missing
//! resources and entities, validation of submitted forms and filter values,
//! rejected uploads, configuration mistakes and infrastructure failures.
//! Each variant maps to an HTTP status code via [`AdminError::status_code`].

use thiserror::Error;

/// The primary error type for adminkit.
#[derive(Error, Debug)]
pub enum AdminError {
    // ── Not found ────────────────────────────────────────────────────

    /// A generic 404.
    #[error("Not found: {0}")]
    NotFound(String),

    /// No registered model resource matches the requested slug.
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// A field referenced in a resource declaration does not exist on the model.
    #[error("Field '{field}' not found on model '{model}'")]
    FieldNotFound {
        /// The model the field was looked up on.
        model: String,
        /// The unknown field name.
        field: String,
    },

    /// A data-access lookup matched no entity.
    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    // ── Auth ─────────────────────────────────────────────────────────

    /// The request requires an authenticated admin.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The admin may not perform this operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    // ── Validation ───────────────────────────────────────────────────

    /// A malformed request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A submitted value failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A filter value could not be validated or coerced.
    #[error("Filter validation error: {0}")]
    FilterValidation(String),

    /// No locale could be extracted from the request.
    #[error("Unable to extract locale from request")]
    UnableToExtractLocale,

    // ── Uploads ──────────────────────────────────────────────────────

    /// An uploaded file exceeds the configured maximum size.
    #[error("File size {size} exceeds max size {max_size}")]
    FileMaxSizeLimit {
        /// Size of the rejected upload in bytes.
        size: u64,
        /// Configured limit in bytes.
        max_size: u64,
    },

    /// An uploaded file has an extension outside the allow-list.
    #[error("File extension of '{filename}' is not allowed, expected one of {allowed:?}")]
    FileExtNotAllowed {
        /// The rejected file name.
        filename: String,
        /// The configured allow-list.
        allowed: Vec<String>,
    },

    // ── Configuration ────────────────────────────────────────────────

    /// A resource kind that cannot be placed in the navigation menu.
    #[error("Invalid resource: {0}")]
    InvalidResource(String),

    /// An optional component was requested without its cargo feature.
    #[error("{component} requires the '{feature}' feature of {krate}")]
    MissingDependency {
        /// What was being constructed.
        component: String,
        /// The cargo feature to enable.
        feature: String,
        /// The crate that exposes the feature.
        krate: String,
    },

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ── Infrastructure ───────────────────────────────────────────────

    /// A database driver error.
    #[error("Database error: {0}")]
    Database(String),

    /// A session cache store error.
    #[error("Cache error: {0}")]
    Cache(String),

    /// A template could not be found or rendered.
    #[error("Template error: {0}")]
    Template(String),

    /// Object storage failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything else.
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AdminError {
    /// Returns the HTTP status code associated with this error.
    ///
    /// - `BadRequest`, `Validation`, `FilterValidation`, `UnableToExtractLocale` -> 400
    /// - `Unauthorized` -> 401
    /// - `Forbidden` -> 403
    /// - `NotFound`, `ResourceNotFound`, `FieldNotFound`, `EntityNotFound` -> 404
    /// - Everything else, uploads included -> 500
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_)
            | Self::Validation(_)
            | Self::FilterValidation(_)
            | Self::UnableToExtractLocale => 400,
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_)
            | Self::ResourceNotFound(_)
            | Self::FieldNotFound { .. }
            | Self::EntityNotFound(_) => 404,
            Self::FileMaxSizeLimit { .. }
            | Self::FileExtNotAllowed { .. }
            | Self::InvalidResource(_)
            | Self::MissingDependency { .. }
            | Self::Configuration(_)
            | Self::Database(_)
            | Self::Cache(_)
            | Self::Template(_)
            | Self::Storage(_)
            | Self::Serialization(_)
            | Self::Io(_)
            | Self::Internal(_) => 500,
        }
    }

    /// Shorthand for [`AdminError::MissingDependency`].
    pub fn missing_dependency(component: &str, feature: &str, krate: &str) -> Self {
        Self::MissingDependency {
            component: component.to_string(),
            feature: feature.to_string(),
            krate: krate.to_string(),
        }
    }
}

impl From<serde_json::Error> for AdminError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// A convenience type alias for `Result<T, AdminError>`.
pub type AdminResult<T> = Result<T, AdminError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AdminError::BadRequest("x".into()).status_code(), 400);
        assert_eq!(AdminError::FilterValidation("x".into()).status_code(), 400);
        assert_eq!(AdminError::UnableToExtractLocale.status_code(), 400);
        assert_eq!(AdminError::Unauthorized("x".into()).status_code(), 401);
        assert_eq!(AdminError::Forbidden("x".into()).status_code(), 403);
        assert_eq!(AdminError::NotFound("x".into()).status_code(), 404);
        assert_eq!(AdminError::ResourceNotFound("x".into()).status_code(), 404);
        assert_eq!(AdminError::EntityNotFound("x".into()).status_code(), 404);
        assert_eq!(
            AdminError::FieldNotFound {
                model: "user".into(),
                field: "nope".into()
            }
            .status_code(),
            404
        );
        assert_eq!(AdminError::InvalidResource("x".into()).status_code(), 500);
        assert_eq!(AdminError::Database("x".into()).status_code(), 500);
    }

    #[test]
    fn test_upload_errors_are_server_errors() {
        let too_big = AdminError::FileMaxSizeLimit {
            size: 10,
            max_size: 5,
        };
        let bad_ext = AdminError::FileExtNotAllowed {
            filename: "a.exe".into(),
            allowed: vec!["png".into()],
        };
        assert_eq!(too_big.status_code(), 500);
        assert_eq!(bad_ext.status_code(), 500);
        assert_eq!(too_big.to_string(), "File size 10 exceeds max size 5");
    }

    #[test]
    fn test_missing_dependency_names_feature() {
        let err = AdminError::missing_dependency("RedisCache", "redis", "adminkit-auth");
        let msg = err.to_string();
        assert!(msg.contains("'redis'"));
        assert!(msg.contains("adminkit-auth"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: AdminError = io_err.into();
        assert_eq!(err.status_code(), 500);
        assert!(err.to_string().contains("file missing"));
    }
}
