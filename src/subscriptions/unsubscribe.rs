use crate::domain::{Subscriber, SubscriberEmail};
use crate::mailer::Mailer;
use crate::storage::{Store, StoreError};
use crate::subscriptions::registry;
use crate::utils::error_chain_fmt;
use chrono::{DateTime, Utc};

#[derive(thiserror::Error)]
pub enum UnsubscribeError {
    #[error("This email is not currently subscribed to our mailing list.")]
    NotCurrentlySubscribed,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl std::fmt::Debug for UnsubscribeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[tracing::instrument(
    name = "Unsubscribe",
    skip(store, mailer, email, now),
    fields(subscriber_email = %email)
)]
pub async fn unsubscribe_email(
    store: &dyn Store,
    mailer: &Mailer,
    email: &SubscriberEmail,
    now: DateTime<Utc>,
) -> Result<Subscriber, UnsubscribeError> {
    let mut uow = store.begin().await?;
    let subscriber = registry::unsubscribe(uow.as_mut(), email, now)
        .await?
        .ok_or(UnsubscribeError::NotCurrentlySubscribed)?;
    uow.commit().await?;

    if let Err(e) = mailer.send_unsubscribed(&subscriber).await {
        tracing::error!(error.cause_chain = ?e, "Failed to send the unsubscription email");
    }
    Ok(subscriber)
}
