use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use derive_more::{Display, From};
use serde_json::{json, Value};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::error;

use crate::{
    api::{self, error::ErrorBody, user::Role},
    db,
};

/// Every way a request can fail.
#[derive(Debug, Display, From)]
pub enum Error {
    #[display("{_0} is already taken!")]
    EmailAlreadyTaken(String),

    #[display("{_0} is not registered!")]
    EmailNotRegistered(String),

    #[display("Password is not correct!")]
    WrongPassword,

    /// Carries the role the caller actually has.
    #[display("Access forbidden!")]
    InsufficientAccess(Role),

    #[display("{_0} is not found!")]
    RecordNotFound(String),

    #[display("{} is already rented!!", _0.name)]
    CarAlreadyRented(Box<api::Car>),

    #[display("Not found!")]
    NotFound { method: Method, url: String },

    #[display("{_0}")]
    InvalidToken(String),

    #[display("Rental must end after it starts!")]
    InvalidRentalInterval {
        started_at: OffsetDateTime,
        ended_at: OffsetDateTime,
    },

    #[display("{_0}")]
    Validation(String),

    #[display("{_0}")]
    #[from]
    Db(db::Error),

    #[display("{_0}")]
    Internal(String),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::WrongPassword
            | Self::InsufficientAccess(_)
            | Self::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            Self::EmailNotRegistered(_)
            | Self::RecordNotFound(_)
            | Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::EmailAlreadyTaken(_)
            | Self::CarAlreadyRented(_)
            | Self::InvalidRentalInterval { .. }
            | Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Db(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::EmailAlreadyTaken(_) => "EmailAlreadyTakenError",
            Self::EmailNotRegistered(_) => "EmailNotRegisteredError",
            Self::WrongPassword => "WrongPasswordError",
            Self::InsufficientAccess(_) => "InsufficientAccessError",
            Self::RecordNotFound(_) => "RecordNotFoundError",
            Self::CarAlreadyRented(_) => "CarAlreadyRentedError",
            Self::NotFound { .. } => "NotFoundError",
            Self::InvalidToken(_) => "InvalidTokenError",
            Self::InvalidRentalInterval { .. } => "InvalidRentalIntervalError",
            Self::Validation(_) => "ValidationError",
            Self::Db(_) | Self::Internal(_) => "InternalServerError",
        }
    }

    /// Structured payload; `{}` for domain errors without one, `null` for
    /// generic failures.
    pub fn details(&self) -> Value {
        match self {
            Self::EmailAlreadyTaken(email)
            | Self::EmailNotRegistered(email) => json!({ "email": email }),
            Self::InsufficientAccess(role) => json!({ "role": role }),
            Self::CarAlreadyRented(car) => json!({ "car": car }),
            Self::NotFound { method, url } => {
                json!({ "method": method.as_str(), "url": url })
            }
            Self::InvalidRentalInterval {
                started_at,
                ended_at,
            } => json!({
                "rentStartedAt": rfc3339(*started_at),
                "rentEndedAt": rfc3339(*ended_at),
            }),
            Self::WrongPassword | Self::RecordNotFound(_) => json!({}),
            Self::InvalidToken(_)
            | Self::Validation(_)
            | Self::Db(_)
            | Self::Internal(_) => Value::Null,
        }
    }

    pub fn to_response_body(&self) -> ErrorBody {
        ErrorBody {
            name: self.name().to_owned(),
            message: self.to_string(),
            details: self.details(),
        }
    }
}

fn rfc3339(at: OffsetDateTime) -> Option<String> {
    at.format(&Rfc3339).ok()
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        if let Self::Db(e) = &self {
            error!(error = %e, "storage failure");
        }
        let body = api::ErrorResponse {
            error: self.to_response_body(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<JsonRejection> for Error {
    fn from(e: JsonRejection) -> Self {
        Self::Validation(e.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(e: QueryRejection) -> Self {
        Self::Validation(e.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(e: PathRejection) -> Self {
        Self::Validation(e.body_text())
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        Self::Internal(format!("failed to sign access token: {e}"))
    }
}

impl From<bcrypt::BcryptError> for Error {
    fn from(e: bcrypt::BcryptError) -> Self {
        Self::Internal(format!("failed to hash password: {e}"))
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Internal(e.to_string())
    }
}
