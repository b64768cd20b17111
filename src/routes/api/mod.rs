//! JSON admin API authenticated with bearer tokens.
mod bearer;
mod login;
mod subscribers;
mod verify;

pub use bearer::*;
pub use login::*;
pub use subscribers::*;
pub use verify::*;

use crate::utils::{error_chain_fmt, TECHNICAL_ISSUE_MESSAGE};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

#[derive(thiserror::Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized(#[source] anyhow::Error),
    #[error("Invalid username or password")]
    InvalidCredentials(#[source] anyhow::Error),
    #[error("Too many login attempts. Please try again later.")]
    RateLimited,
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) | ApiError::InvalidCredentials(_) => StatusCode::UNAUTHORIZED,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::Unauthorized(_) => serde_json::json!({ "error": "Unauthorized" }),
            ApiError::UnexpectedError(_) => serde_json::json!({
                "success": false,
                "message": TECHNICAL_ISSUE_MESSAGE,
            }),
            other => serde_json::json!({
                "success": false,
                "message": other.to_string(),
            }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
