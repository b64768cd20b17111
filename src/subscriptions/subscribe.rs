use crate::domain::NewSubscriber;
use crate::mailer::Mailer;
use crate::storage::Store;
use crate::subscriptions::registry::{self, RegistryError};
use crate::subscriptions::tokens;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Registers a pending subscriber with a fresh confirmation token, then emails the
/// subscriber and the admin.
#[tracing::instrument(
    name = "Subscribe",
    skip(store, mailer, subscriber, now),
    fields(subscriber_email = %subscriber.email, intention = subscriber.intention.as_ref())
)]
pub async fn subscribe(
    store: &dyn Store,
    mailer: &Mailer,
    subscriber: &NewSubscriber,
    now: DateTime<Utc>,
) -> Result<Uuid, RegistryError> {
    let mut uow = store.begin().await?;
    let subscriber_id = registry::upsert_pending(uow.as_mut(), subscriber, now).await?;
    let token = tokens::issue(uow.as_mut(), subscriber_id, now).await?;
    uow.commit().await?;

    if let Err(e) = mailer.send_confirmation(subscriber, &token).await {
        tracing::error!(error.cause_chain = ?e, "Failed to send the confirmation email");
    }
    if let Err(e) = mailer.notify_admin(subscriber, now).await {
        tracing::error!(error.cause_chain = ?e, "Failed to notify the admin");
    }
    Ok(subscriber_id)
}
