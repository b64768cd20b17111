use crate::domain::SubscriptionToken;
use crate::mailer::Mailer;
use crate::routes::pages::message_page;
use crate::storage::Store;
use crate::subscriptions::confirmation::confirm_subscription;
use crate::subscriptions::tokens::ConsumeError;
use crate::utils::{error_chain_fmt, TECHNICAL_ISSUE_MESSAGE};
use actix_web::error::InternalError;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use chrono::Utc;

#[derive(thiserror::Error)]
pub enum ConfirmError {
    #[error("{0}")]
    InvalidLink(String),
    #[error("This confirmation link has expired or already been used.")]
    InvalidOrExpired,
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for ConfirmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ConfirmError {
    fn status_code(&self) -> StatusCode {
        match self {
            ConfirmError::InvalidLink(_) => StatusCode::BAD_REQUEST,
            ConfirmError::InvalidOrExpired => StatusCode::UNAUTHORIZED,
            ConfirmError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn user_message(&self) -> String {
        match self {
            ConfirmError::UnexpectedError(_) => TECHNICAL_ISSUE_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(serde::Deserialize)]
pub struct ConfirmParameters {
    token: Option<String>,
}

#[tracing::instrument(name = "Confirm a pending subscriber", skip(parameters, store, mailer))]
pub async fn confirm(
    web::Query(parameters): web::Query<ConfirmParameters>,
    store: web::Data<dyn Store>,
    mailer: web::Data<Mailer>,
) -> Result<HttpResponse, InternalError<ConfirmError>> {
    let site_url = mailer.links().home().to_string();
    let failure = |e: ConfirmError| {
        let page = message_page(
            e.status_code(),
            "Confirmation Failed",
            "Confirmation Failed",
            &e.user_message(),
            &site_url,
        );
        InternalError::from_response(e, page)
    };

    let token = SubscriptionToken::parse(parameters.token.unwrap_or_default())
        .map_err(|e| failure(ConfirmError::InvalidLink(e)))?;

    match confirm_subscription(store.get_ref(), &mailer, &token, Utc::now()).await {
        Ok(_) => Ok(message_page(
            StatusCode::OK,
            "Subscription Confirmed",
            "Subscription Confirmed!",
            "Thank you! Your subscription has been confirmed.",
            &site_url,
        )),
        Err(ConsumeError::InvalidOrExpired) => Err(failure(ConfirmError::InvalidOrExpired)),
        Err(ConsumeError::Store(e)) => Err(failure(
            anyhow::Error::new(e)
                .context("Failed to confirm the subscription")
                .into(),
        )),
    }
}
