use crate::domain::{Subscriber, SubscriberStatus, SubscriberToken, SubscriptionToken, TokenType};
use crate::storage::{StoreError, UnitOfWork};
use crate::utils::error_chain_fmt;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(thiserror::Error)]
pub enum ConsumeError {
    // Unknown, used and expired tokens are deliberately indistinguishable
    #[error("This confirmation link has expired or already been used.")]
    InvalidOrExpired,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl std::fmt::Debug for ConsumeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Issues a fresh confirmation token valid for seven days.
#[tracing::instrument(name = "Issue a confirmation token", skip(uow, now))]
pub async fn issue(
    uow: &mut dyn UnitOfWork,
    subscriber_id: Uuid,
    now: DateTime<Utc>,
) -> Result<SubscriptionToken, StoreError> {
    let token = SubscriberToken::new_confirmation(subscriber_id, now);
    uow.insert_token(&token).await?;
    Ok(token.token)
}

/// Marks a live confirmation token as used and returns it with its subscriber, who must
/// still be pending.
#[tracing::instrument(name = "Consume a confirmation token", skip_all)]
pub async fn consume(
    uow: &mut dyn UnitOfWork,
    token: &SubscriptionToken,
    now: DateTime<Utc>,
) -> Result<(SubscriberToken, Subscriber), ConsumeError> {
    let mut stored = uow
        .find_live_token(token, TokenType::Confirm, now)
        .await?
        .ok_or(ConsumeError::InvalidOrExpired)?;
    let subscriber = uow
        .find_subscriber(stored.subscriber_id)
        .await?
        .ok_or_else(|| {
            StoreError::Corrupted(format!("token {} has no subscriber", stored.id))
        })?;
    // Only pending subscribers can be confirmed, the token stays untouched otherwise
    if subscriber.status != SubscriberStatus::Pending {
        return Err(ConsumeError::InvalidOrExpired);
    }

    uow.mark_token_used(stored.id).await?;
    stored.used = true;
    Ok((stored, subscriber))
}
