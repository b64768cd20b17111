use crate::domain::SubscriberEmail;
use crate::mailer::Mailer;
use crate::routes::pages::{branded_page, message_page};
use crate::storage::Store;
use crate::subscriptions::unsubscribe::{unsubscribe_email, UnsubscribeError as FlowError};
use crate::utils::{error_chain_fmt, TECHNICAL_ISSUE_MESSAGE};
use actix_web::error::InternalError;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use chrono::Utc;

#[derive(thiserror::Error)]
pub enum UnsubscribeError {
    #[error("Invalid email address.")]
    InvalidEmail(#[source] anyhow::Error),
    #[error("This email is not currently subscribed to our mailing list.")]
    NotCurrentlySubscribed,
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for UnsubscribeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl UnsubscribeError {
    fn into_page(self, site_url: &str) -> InternalError<Self> {
        let (status, message) = match &self {
            UnsubscribeError::InvalidEmail(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            UnsubscribeError::NotCurrentlySubscribed => (StatusCode::NOT_FOUND, self.to_string()),
            UnsubscribeError::UnexpectedError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                TECHNICAL_ISSUE_MESSAGE.to_string(),
            ),
        };
        let page = message_page(status, "Unsubscribe", "Unsubscribe", &message, site_url);
        InternalError::from_response(self, page)
    }
}

#[derive(serde::Deserialize)]
pub struct UnsubscribeParameters {
    email: Option<String>,
}

fn parse_email(email: Option<String>) -> Result<SubscriberEmail, UnsubscribeError> {
    SubscriberEmail::parse(email.unwrap_or_default())
        .map_err(|e| UnsubscribeError::InvalidEmail(anyhow::anyhow!(e)))
}

/// Landing page of the link in every email. Nothing changes until the form is submitted.
pub async fn unsubscribe_prompt(
    web::Query(parameters): web::Query<UnsubscribeParameters>,
    mailer: web::Data<Mailer>,
) -> Result<HttpResponse, InternalError<UnsubscribeError>> {
    let site_url = mailer.links().home();
    let email = parse_email(parameters.email).map_err(|e| e.into_page(site_url))?;
    let email = htmlescape::encode_minimal(email.as_ref());
    let body_html = format!(
        r#"<p>Are you sure you want to unsubscribe from Horizon HUD updates?</p>
        <form action="/unsubscribe" method="POST">
            <input type="hidden" name="email" value="{email}">
            <button type="submit" class="btn">Confirm Unsubscribe</button>
        </form>"#
    );
    Ok(branded_page(
        StatusCode::OK,
        "Unsubscribe",
        "Unsubscribe",
        &body_html,
        site_url,
    ))
}

#[derive(serde::Deserialize)]
pub struct UnsubscribeForm {
    email: Option<String>,
}

#[tracing::instrument(name = "Unsubscribe an email address", skip(form, store, mailer))]
pub async fn unsubscribe(
    web::Form(form): web::Form<UnsubscribeForm>,
    store: web::Data<dyn Store>,
    mailer: web::Data<Mailer>,
) -> Result<HttpResponse, InternalError<UnsubscribeError>> {
    let site_url = mailer.links().home();
    let email = parse_email(form.email).map_err(|e| e.into_page(site_url))?;

    match unsubscribe_email(store.get_ref(), &mailer, &email, Utc::now()).await {
        Ok(_) => Ok(message_page(
            StatusCode::OK,
            "Unsubscribed",
            "Unsubscribed",
            "You have been successfully unsubscribed from our mailing list.",
            site_url,
        )),
        Err(FlowError::NotCurrentlySubscribed) => {
            Err(UnsubscribeError::NotCurrentlySubscribed.into_page(site_url))
        }
        Err(FlowError::Store(e)) => Err(UnsubscribeError::UnexpectedError(
            anyhow::Error::new(e).context("Failed to unsubscribe"),
        )
        .into_page(site_url)),
    }
}
