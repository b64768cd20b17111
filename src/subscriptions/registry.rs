use crate::domain::{NewSubscriber, Subscriber, SubscriberEmail, SubscriberStatus};
use crate::storage::{StoreError, UnitOfWork};
use crate::utils::error_chain_fmt;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(thiserror::Error)]
pub enum RegistryError {
    #[error("This email is already subscribed. Please check your inbox for previous communications.")]
    AlreadySubscribed,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl std::fmt::Debug for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Creates a pending subscriber, or reactivates an unsubscribed one with the new details.
///
/// Reactivation deletes every token of the previous subscription cycle.
#[tracing::instrument(
    name = "Upsert a pending subscriber",
    skip(uow, subscriber, now),
    fields(subscriber_email = %subscriber.email)
)]
pub async fn upsert_pending(
    uow: &mut dyn UnitOfWork,
    subscriber: &NewSubscriber,
    now: DateTime<Utc>,
) -> Result<Uuid, RegistryError> {
    match uow.find_subscriber_by_email(subscriber.email.as_ref()).await? {
        Some(existing) if existing.status.is_active() => Err(RegistryError::AlreadySubscribed),
        Some(existing) => {
            uow.reactivate_subscriber(existing.id, subscriber, now).await?;
            let deleted = uow.delete_tokens(existing.id).await?;
            tracing::info!(subscriber_id = %existing.id, deleted, "Reactivated a subscriber");
            Ok(existing.id)
        }
        None => {
            let row = Subscriber {
                id: Uuid::new_v4(),
                name: subscriber.name.as_ref().to_string(),
                email: subscriber.email.as_ref().to_string(),
                phone: subscriber.phone.as_ref().to_string(),
                intention: subscriber.intention,
                linkedin: subscriber.linkedin.as_ref().map(|l| l.as_ref().to_string()),
                status: SubscriberStatus::Pending,
                created_at: now,
                updated_at: now,
                last_email_sent: None,
            };
            match uow.insert_subscriber(&row).await {
                Ok(()) => Ok(row.id),
                // Lost a race against a concurrent subscribe with the same email
                Err(StoreError::UniqueViolation) => Err(RegistryError::AlreadySubscribed),
                Err(e) => Err(e.into()),
            }
        }
    }
}

pub async fn confirm(
    uow: &mut dyn UnitOfWork,
    subscriber_id: Uuid,
    now: DateTime<Utc>,
) -> Result<(), StoreError> {
    uow.set_subscriber_status(subscriber_id, SubscriberStatus::Confirmed, now)
        .await
}

/// Returns `None` when no pending or confirmed subscriber has this email.
pub async fn unsubscribe(
    uow: &mut dyn UnitOfWork,
    email: &SubscriberEmail,
    now: DateTime<Utc>,
) -> Result<Option<Subscriber>, StoreError> {
    let subscriber = match uow.find_subscriber_by_email(email.as_ref()).await? {
        Some(subscriber) if subscriber.status.is_active() => subscriber,
        _ => return Ok(None),
    };
    uow.set_subscriber_status(subscriber.id, SubscriberStatus::Unsubscribed, now)
        .await?;
    Ok(Some(Subscriber {
        status: SubscriberStatus::Unsubscribed,
        updated_at: now,
        ..subscriber
    }))
}

/// Every subscriber, newest first.
pub async fn list(uow: &mut dyn UnitOfWork) -> Result<Vec<Subscriber>, StoreError> {
    uow.list_subscribers().await
}
