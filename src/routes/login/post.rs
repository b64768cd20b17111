use crate::authentication::{
    validate_credentials, AdminSession, AuthError, Credentials, LoginRateLimiter, RateLimitError,
};
use crate::configuration::AdminSettings;
use crate::utils::{client_address, error_chain_fmt, see_other};
use actix_web::error::InternalError;
use actix_web::http::header::ContentType;
use actix_web::{web, HttpRequest, HttpResponse};
use actix_web_flash_messages::FlashMessage;
use anyhow::Context;
use chrono::Utc;
use secrecy::Secret;
use std::fmt::Debug;

#[derive(thiserror::Error)]
pub enum LoginError {
    #[error("Invalid Username or Password")]
    AuthFailed(#[source] anyhow::Error),
    #[error("Too many login attempts. Please try again later.")]
    RateLimited,
    #[error("Something went wrong")]
    UnexpectedError(#[from] anyhow::Error),
}

impl Debug for LoginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[derive(serde::Deserialize)]
pub struct LoginForm {
    username: String,
    password: Secret<String>,
}

#[tracing::instrument(
    name = "Log in an admin",
    skip(request, form, admin, limiter, session),
    fields(username = %form.username, client = tracing::field::Empty)
)]
pub async fn login(
    request: HttpRequest,
    web::Form(form): web::Form<LoginForm>,
    admin: web::Data<AdminSettings>,
    limiter: web::Data<LoginRateLimiter>,
    session: AdminSession,
) -> Result<HttpResponse, InternalError<LoginError>> {
    let address = client_address(&request);
    tracing::Span::current().record("client", tracing::field::display(&address));
    let now = Utc::now();

    match limiter.check(&address, now).await {
        Ok(()) => {}
        Err(RateLimitError::TooManyAttempts) => {
            let error = LoginError::RateLimited;
            let response = HttpResponse::TooManyRequests()
                .content_type(ContentType::plaintext())
                .body(error.to_string());
            return Err(InternalError::from_response(error, response));
        }
        Err(RateLimitError::Unexpected(e)) => return Err(login_redirect(e.into())),
    }

    let credentials = Credentials {
        username: form.username,
        password: form.password,
    };
    let username = credentials.username.clone();

    match validate_credentials(&admin, credentials).await {
        Ok(()) => {
            session.renew();
            session
                .insert_admin(&username)
                .context("Failed to store the admin in the session")
                .map_err(|e| login_redirect(e.into()))?;
            Ok(see_other("/admin/campaigns"))
        }
        Err(AuthError::InvalidCredentials(e)) => {
            limiter.record_failure(&address, now).await;
            Err(login_redirect(LoginError::AuthFailed(e)))
        }
        Err(AuthError::UnexpectedError(e)) => Err(login_redirect(e.into())),
    }
}

fn login_redirect(error: LoginError) -> InternalError<LoginError> {
    FlashMessage::error(error.to_string()).send();
    InternalError::from_response(error, see_other("/login"))
}
