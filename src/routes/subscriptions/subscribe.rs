use crate::domain::{NewSubscriber, SubscribeForm};
use crate::mailer::Mailer;
use crate::storage::Store;
use crate::subscriptions::registry::RegistryError;
use crate::subscriptions::subscribe::subscribe as register_subscriber;
use crate::utils::{error_chain_fmt, TECHNICAL_ISSUE_MESSAGE};
use actix_web::error::JsonPayloadError;
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use chrono::Utc;

#[derive(thiserror::Error)]
pub enum SubscribeError {
    #[error("{0}")]
    ValidationError(String),
    #[error("This email is already subscribed. Please check your inbox for previous communications.")]
    AlreadySubscribed,
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for SubscribeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for SubscribeError {
    fn status_code(&self) -> StatusCode {
        match self {
            SubscribeError::ValidationError(_) => StatusCode::BAD_REQUEST,
            SubscribeError::AlreadySubscribed => StatusCode::CONFLICT,
            SubscribeError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            SubscribeError::UnexpectedError(_) => TECHNICAL_ISSUE_MESSAGE.to_string(),
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "message": message,
        }))
    }
}

/// Malformed or non-JSON bodies are reported like a form with missing fields.
pub fn subscribe_json_error(error: JsonPayloadError, _: &HttpRequest) -> actix_web::Error {
    tracing::warn!(error.message = %error, "Rejected a malformed subscription payload");
    SubscribeError::ValidationError("All fields are required".into()).into()
}

#[tracing::instrument(
    name = "Add a new subscriber",
    skip(form, store, mailer),
    fields(subscriber_email = %form.email, intention = %form.intention)
)]
pub async fn subscribe(
    web::Json(form): web::Json<SubscribeForm>,
    store: web::Data<dyn Store>,
    mailer: web::Data<Mailer>,
) -> Result<HttpResponse, SubscribeError> {
    let new_subscriber: NewSubscriber = form.try_into().map_err(SubscribeError::ValidationError)?;

    match register_subscriber(store.get_ref(), &mailer, &new_subscriber, Utc::now()).await {
        Ok(_) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Thank you for subscribing! Please check your email to confirm your subscription.",
        }))),
        Err(RegistryError::AlreadySubscribed) => Err(SubscribeError::AlreadySubscribed),
        Err(RegistryError::Store(e)) => Err(anyhow::Error::new(e)
            .context("Failed to register a new subscriber")
            .into()),
    }
}
