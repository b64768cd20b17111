use crate::domain::{Subscriber, SubscriberStatus, SubscriptionToken};
use crate::mailer::Mailer;
use crate::storage::Store;
use crate::subscriptions::registry;
use crate::subscriptions::tokens::{self, ConsumeError};
use chrono::{DateTime, Utc};

/// Consumes the token and confirms its subscriber in one unit of work. The welcome email
/// goes out after the commit.
#[tracing::instrument(name = "Confirm a subscription", skip_all)]
pub async fn confirm_subscription(
    store: &dyn Store,
    mailer: &Mailer,
    token: &SubscriptionToken,
    now: DateTime<Utc>,
) -> Result<Subscriber, ConsumeError> {
    let mut uow = store.begin().await?;
    let (_, subscriber) = tokens::consume(uow.as_mut(), token, now).await?;
    registry::confirm(uow.as_mut(), subscriber.id, now).await?;
    uow.commit().await?;

    let subscriber = Subscriber {
        status: SubscriberStatus::Confirmed,
        updated_at: now,
        ..subscriber
    };
    tracing::info!(subscriber_id = %subscriber.id, "Subscription confirmed");

    if let Err(e) = mailer.send_welcome(&subscriber).await {
        tracing::error!(error.cause_chain = ?e, "Failed to send the welcome email");
    }
    Ok(subscriber)
}
