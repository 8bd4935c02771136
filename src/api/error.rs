use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::borrow::Cow;

/// Errors rendered to HTTP clients.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Bad Request: {0}")]
    BadRequest(Cow<'static, str>),
    #[error("Unauthorized: {0}")]
    Unauthorized(Cow<'static, str>),
    #[error("Forbidden: {0}")]
    Forbidden(Cow<'static, str>),
    #[error("Not Found: {0}")]
    NotFound(Cow<'static, str>),
    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(Cow<'static, str>),
    #[error("Internal Server Error: {0}")]
    InternalServer(Cow<'static, str>),
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct ErrorBody {
    pub message: Cow<'static, str>,
}

impl Error {
    pub fn bad_request(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn internal_server_error(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::InternalServer(msg.into())
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match *self {
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Error::InternalServer(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            Error::BadRequest(msg)
            | Error::Unauthorized(msg)
            | Error::Forbidden(msg)
            | Error::NotFound(msg)
            | Error::PayloadTooLarge(msg)
            | Error::InternalServer(msg) => msg.clone(),
        };
        HttpResponse::build(self.status_code()).json(ErrorBody { message })
    }
}

/// Failures reported by the metadata store.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("Invalid identifier: {0}")]
    InvalidId(String),
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Database Error : {0}")]
    Database(Cow<'static, str>),
    #[error("Database connection error: {0}")]
    Connection(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("row not found".to_string()),
            sqlx::Error::Database(db_err) => {
                log::error!("Unhandled DB error: {:?}", db_err);
                StoreError::Database(db_err.message().to_string().into())
            }
            other => StoreError::Connection(other),
        }
    }
}

/// Failures of the upload engine and the query operations around it.
#[derive(thiserror::Error, Debug)]
pub enum SystemError {
    #[error("{0}")]
    PolicyViolation(Cow<'static, str>),
    #[error("{context}: {source}")]
    StorageFailure {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to save file metadata: {0}")]
    PersistenceFailure(#[source] StoreError),
    #[error("Not Found: {0}")]
    NotFound(Cow<'static, str>),
    #[error("Metadata store failure: {0}")]
    GatewayFailure(#[from] StoreError),
    #[error("Forbidden: {0}")]
    Forbidden(Cow<'static, str>),
}

impl SystemError {
    pub fn policy(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::PolicyViolation(msg.into())
    }

    pub fn storage(context: &'static str, source: std::io::Error) -> Self {
        Self::StorageFailure { context, source }
    }

    pub fn not_found(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Forbidden(msg.into())
    }
}

impl From<SystemError> for Error {
    fn from(value: SystemError) -> Self {
        match value {
            SystemError::PolicyViolation(msg) => Error::BadRequest(msg),
            SystemError::Forbidden(msg) => Error::Forbidden(msg),
            SystemError::NotFound(msg) => Error::NotFound(msg),
            SystemError::StorageFailure { .. } => {
                log::error!("Internal Server Error: {}", value);
                Error::internal_server_error("Failed to store file")
            }
            SystemError::PersistenceFailure(_) => {
                log::error!("Internal Server Error: {}", value);
                Error::internal_server_error("Failed to save file metadata")
            }
            SystemError::GatewayFailure(_) => {
                log::error!("Internal Server Error: {}", value);
                Error::internal_server_error("Metadata store unavailable")
            }
        }
    }
}
