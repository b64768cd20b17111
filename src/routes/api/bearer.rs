use crate::authentication::{AdminClaims, TokenSigner};
use crate::routes::api::ApiError;
use actix_web::dev::Payload;
use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use actix_web::{web, FromRequest, HttpRequest};
use anyhow::Context;
use chrono::Utc;
use std::future::{ready, Ready};

/// Claims of a verified `Authorization: Bearer <token>` header.
#[derive(Debug)]
pub struct AdminBearer(pub AdminClaims);

impl FromRequest for AdminBearer {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AdminBearer, ApiError> {
    let signer = req
        .app_data::<web::Data<TokenSigner>>()
        .context("Token signer is not configured")?;
    let token = bearer_token(req.headers()).map_err(ApiError::Unauthorized)?;
    let claims = signer
        .verify(token, Utc::now())
        .context("Rejected bearer token")
        .map_err(ApiError::Unauthorized)?;
    Ok(AdminBearer(claims))
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, anyhow::Error> {
    let header_value = headers
        .get(AUTHORIZATION)
        .context("Missing authorization header")?
        .to_str()
        .context("Authorization header is not a valid UTF8 string")?;
    header_value
        .strip_prefix("Bearer ")
        .filter(|token| !token.trim().is_empty())
        .context("Authorization scheme is not 'Bearer'")
}
