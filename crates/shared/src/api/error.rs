use std::fmt;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
#[cfg(feature = "backend")]
use {
    axum::response::{IntoResponse, Response},
    tracing::error,
};

/// Returned to clients for every credential problem, whatever the cause
pub const AUTHENTICATION_FAILED: &str = "Missing or invalid credentials";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    Required,
    Length,
    MaxLength,
    Positive,
    EmailStrict,
    NotInFuture,
    NotEmpty,
    Ordering,
    Format,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Same spelling as the serialized form
        let name = match self {
            ConstraintKind::Required => "required",
            ConstraintKind::Length => "length",
            ConstraintKind::MaxLength => "max_length",
            ConstraintKind::Positive => "positive",
            ConstraintKind::EmailStrict => "email_strict",
            ConstraintKind::NotInFuture => "not_in_future",
            ConstraintKind::NotEmpty => "not_empty",
            ConstraintKind::Ordering => "ordering",
            ConstraintKind::Format => "format",
        };
        f.write_str(name)
    }
}

/// A single rejected field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub constraint: ConstraintKind,
    pub message: String,
}

/// Every violation found while validating one payload
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    pub fn single<F: Into<String>, M: Into<String>>(
        field: F,
        constraint: ConstraintKind,
        message: M,
    ) -> Self {
        Self {
            violations: vec![FieldViolation {
                field: field.into(),
                constraint,
                message: message.into(),
            }],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.violations.iter().map(|v| v.field.as_str())
    }

    pub fn has_violation(&self, field: &str, constraint: ConstraintKind) -> bool {
        self.violations
            .iter()
            .any(|v| v.field == field && v.constraint == constraint)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for v in &self.violations {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{} ({}): {}", v.field, v.constraint, v.message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServerError {
    #[error("Validation failed: {0}")]
    Validation(ValidationError),
    #[error("Authentication failed: {message}")]
    Authentication { message: String },
    #[error("Forbidden: {message}")]
    Authorization { message: String },
    #[error("{entity} not found")]
    NotFound { entity: String },
    #[error("{field} is already in use")]
    Conflict { field: String },
    #[error("Payload too large: {message}")]
    PayloadTooLarge { message: String },
    #[error("Unsupported media type: {message}")]
    UnsupportedMediaType { message: String },
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ServerError {
    pub fn unauthenticated() -> Self {
        Self::Authentication { message: AUTHENTICATION_FAILED.to_owned() }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Validation(_) => StatusCode::BAD_REQUEST,
            ServerError::Authentication { .. } => StatusCode::UNAUTHORIZED,
            ServerError::Authorization { .. } => StatusCode::FORBIDDEN,
            ServerError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServerError::Conflict { .. } => StatusCode::CONFLICT,
            ServerError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ServerError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Prefix internal errors with where they happened. Client facing errors
    /// are left untouched.
    pub fn context<S: Into<String>>(self, context: S) -> Self {
        match self {
            ServerError::Internal { message } => ServerError::Internal {
                message: format!("{}: {message}", context.into()),
            },
            other => other,
        }
    }
}

impl From<ValidationError> for ServerError {
    fn from(inner: ValidationError) -> Self {
        Self::Validation(inner)
    }
}

pub trait ServerErrorContext<T> {
    /// Add helpful context to internal errors
    fn context<S: Into<String>>(self, context: S) -> Result<T, ServerError>;
    /// Add helpful context to internal errors
    ///
    /// `context` is provided as a closure to avoid potential formatting cost if
    /// the result isn't an error
    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, context: F) -> Result<T, ServerError>;
}

impl<T, E: Into<ServerError>> ServerErrorContext<T> for Result<T, E> {
    fn context<S: Into<String>>(self, context: S) -> Result<T, ServerError> {
        self.map_err(|e| e.into().context(context))
    }

    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, context: F) -> Result<T, ServerError> {
        self.map_err(|e| e.into().context(context()))
    }
}

#[macro_export]
macro_rules! internal_error {
    ($($arg:tt)+) => {
        $crate::api::error::ServerError::Internal { message: format!($($arg)+) }
    };
}

#[macro_export]
macro_rules! forbidden_error {
    ($($arg:tt)+) => {
        $crate::api::error::ServerError::Authorization { message: format!($($arg)+) }
    };
}

#[macro_export]
macro_rules! not_found_error {
    ($entity:expr) => {
        $crate::api::error::ServerError::NotFound { entity: ($entity).to_string() }
    };
}

/// Return early with `$err` unless `$cond` holds
#[macro_export]
macro_rules! ensure_server {
    ($cond:expr, $err:expr $(,)?) => {
        if !$cond {
            return Err($err.into());
        }
    };
}

/// `user.firebase_id` -> `firebaseId`, matching the JSON field names
fn column_to_field(column: &str) -> String {
    let column = column.rsplit('.').next().unwrap_or(column).trim();
    let mut field = String::with_capacity(column.len());
    let mut upper = false;
    for c in column.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            field.extend(c.to_uppercase());
            upper = false;
        } else {
            field.push(c);
        }
    }
    field
}

/// Pull the first column out of `UNIQUE constraint failed: user.email`
fn unique_violation_field(message: &str) -> String {
    message
        .rsplit(": ")
        .next()
        .and_then(|columns| columns.split(',').next())
        .map(column_to_field)
        .unwrap_or_else(|| "unknown".to_owned())
}

#[cfg(feature = "backend")]
impl From<rusqlite::Error> for ServerError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::QueryReturnedNoRows => ServerError::NotFound { entity: "record".to_owned() },
            rusqlite::Error::SqliteFailure(e, Some(message))
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                ServerError::Conflict { field: unique_violation_field(message) }
            },
            _ => crate::internal_error!("rusqlite: {err}"),
        }
    }
}

#[cfg(feature = "backend")]
impl From<deadpool_sqlite::InteractError> for ServerError {
    fn from(err: deadpool_sqlite::InteractError) -> Self {
        crate::internal_error!("deadpool interact: {err}")
    }
}

#[cfg(feature = "backend")]
impl From<deadpool_sqlite::PoolError> for ServerError {
    fn from(err: deadpool_sqlite::PoolError) -> Self {
        crate::internal_error!("deadpool pool: {err}")
    }
}

#[cfg(feature = "backend")]
impl From<ServerError> for deadpool_sqlite::HookError {
    fn from(err: ServerError) -> Self {
        Self::Message(err.to_string().into())
    }
}

// Render ServerError into a json response. Internal details are logged and
// replaced before they reach the client.
#[cfg(feature = "backend")]
impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let code = self.status_code();
        let body = match self {
            ServerError::Internal { message } => {
                error!(error = %message, "Internal server error");
                ServerError::Internal { message: "Something went wrong".to_owned() }
            },
            other => other,
        };
        (code, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_unique_violation_field() {
        assert_eq!(unique_violation_field("UNIQUE constraint failed: user.email"), "email");
        assert_eq!(
            unique_violation_field("UNIQUE constraint failed: user.firebase_id"),
            "firebaseId"
        );
    }

    #[test]
    fn test_status_codes_are_distinguishable() {
        assert_eq!(ServerError::unauthenticated().status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ServerError::Authorization { message: "no".into() }.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ServerError::NotFound { entity: "exercise".into() }.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServerError::Conflict { field: "email".into() }.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServerError::PayloadTooLarge { message: "length limit exceeded".into() }.status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ServerError::UnsupportedMediaType { message: "no content type".into() }.status_code(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
    }

    #[test]
    fn test_body_limit_errors_serialize_with_kind_tag() {
        let json = serde_json::to_value(ServerError::PayloadTooLarge {
            message: "length limit exceeded".into(),
        })
        .unwrap();
        assert_eq!(json["kind"], "payload_too_large");
        assert_eq!(json["message"], "length limit exceeded");
    }

    #[test]
    fn test_validation_error_serializes_with_kind_tag() {
        let err = ServerError::from(ValidationError::single(
            "email",
            ConstraintKind::EmailStrict,
            "must be a valid email",
        ));
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "validation");
        assert_eq!(json["violations"][0]["field"], "email");
        assert_eq!(json["violations"][0]["constraint"], "email_strict");

        let back: ServerError = serde_json::from_value(json).unwrap();
        assert_eq!(back, err);
    }

    #[test]
    fn test_context_only_touches_internal_errors() {
        let internal = crate::internal_error!("boom").context("User::create");
        assert_eq!(internal, ServerError::Internal { message: "User::create: boom".into() });

        let conflict = ServerError::Conflict { field: "email".into() }.context("User::create");
        assert_eq!(conflict, ServerError::Conflict { field: "email".into() });
    }

    #[cfg(feature = "backend")]
    #[test]
    fn test_rusqlite_unique_violation_becomes_conflict() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE user (id INTEGER PRIMARY KEY, email TEXT UNIQUE);")
            .unwrap();
        conn.execute("INSERT INTO user (email) VALUES ('a@b')", ()).unwrap();
        let err = conn.execute("INSERT INTO user (email) VALUES ('a@b')", ()).unwrap_err();
        assert_eq!(ServerError::from(err), ServerError::Conflict { field: "email".into() });
    }
}
