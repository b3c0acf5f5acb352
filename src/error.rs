use hyper::StatusCode;
use std::error::Error;
use thiserror::Error;
pub use tokio_postgres::Error as DbError;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct ValidationFailed(pub &'static str);

#[derive(Debug, Error)]
pub enum AppError {
    #[error("An unexpected database error occurred")]
    Database(#[from] DbError),
    #[error("Authentication failed")]
    Unauthenticated,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Permission denied")]
    NoPermission,
    #[error("The room is full")]
    CapacityExceeded,
    #[error("Validation failed: {0}")]
    ValidationFail(String),
    #[error("{0} already exists")]
    AlreadyExists(&'static str),
    #[error("Wrong request format: {0}")]
    BadRequest(String),
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("An unexpected error occurred")]
    Unexpected(anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        use AppError::*;
        match self {
            Unauthenticated => StatusCode::UNAUTHORIZED,
            NotFound(_) => StatusCode::NOT_FOUND,
            NoPermission => StatusCode::FORBIDDEN,
            CapacityExceeded | AlreadyExists(_) => StatusCode::CONFLICT,
            ValidationFail(_) | BadRequest(_) => StatusCode::BAD_REQUEST,
            MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        use AppError::*;
        match self {
            Unauthenticated => "UNAUTHENTICATED",
            NotFound(_) => "NOT_FOUND",
            NoPermission => "NO_PERMISSION",
            CapacityExceeded => "CAPACITY_EXCEEDED",
            ValidationFail(_) => "VALIDATION_FAIL",
            AlreadyExists(_) => "ALREADY_EXISTS",
            BadRequest(_) => "BAD_REQUEST",
            MethodNotAllowed => "METHOD_NOT_ALLOWED",
            _ => "UNEXPECTED",
        }
    }

    pub fn missing() -> AppError {
        AppError::BadRequest("The request was sent with the wrong path or method".to_string())
    }

    pub fn unexpected<E: Error + Send + Sync + 'static>(e: E) -> AppError {
        AppError::Unexpected(e.into())
    }
}

impl From<ValidationFailed> for AppError {
    fn from(e: ValidationFailed) -> AppError {
        AppError::ValidationFail(e.0.to_string())
    }
}

macro_rules! unexpected {
    () => {
        |e| {
            ::log::error!("Unexpected error: [{}][{}]{}", file!(), line!(), e);
            crate::error::AppError::Unexpected(e.into())
        }
    };
    ($msg: expr) => {{
        let msg = $msg.to_string();
        ::log::error!("Unexpected error: [{}][{}]{}", file!(), line!(), msg);
        crate::error::AppError::Unexpected(::anyhow::anyhow!(msg))
    }};
}
