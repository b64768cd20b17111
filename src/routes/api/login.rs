use crate::authentication::{
    validate_credentials, AuthError, Credentials, LoginRateLimiter, RateLimitError, TokenSigner,
};
use crate::configuration::AdminSettings;
use crate::routes::api::ApiError;
use crate::utils::client_address;
use actix_web::{web, HttpRequest, HttpResponse};
use anyhow::Context;
use chrono::Utc;
use secrecy::Secret;

#[derive(serde::Deserialize)]
pub struct ApiLoginRequest {
    username: String,
    password: Secret<String>,
}

#[tracing::instrument(
    name = "Issue an admin API token",
    skip(request, body, admin, limiter, signer),
    fields(username = %body.username)
)]
pub async fn api_login(
    request: HttpRequest,
    web::Json(body): web::Json<ApiLoginRequest>,
    admin: web::Data<AdminSettings>,
    limiter: web::Data<LoginRateLimiter>,
    signer: web::Data<TokenSigner>,
) -> Result<HttpResponse, ApiError> {
    let address = client_address(&request);
    let now = Utc::now();

    limiter.check(&address, now).await.map_err(|e| match e {
        RateLimitError::TooManyAttempts => ApiError::RateLimited,
        RateLimitError::Unexpected(e) => ApiError::UnexpectedError(e),
    })?;

    let credentials = Credentials {
        username: body.username,
        password: body.password,
    };
    match validate_credentials(&admin, credentials).await {
        Ok(()) => {}
        Err(AuthError::InvalidCredentials(e)) => {
            limiter.record_failure(&address, now).await;
            return Err(ApiError::InvalidCredentials(e));
        }
        Err(AuthError::UnexpectedError(e)) => return Err(e.into()),
    }

    let token = signer.sign(now).context("Failed to sign the admin token")?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "token": token,
    })))
}
