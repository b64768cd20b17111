//! Persistence behind a unit-of-work boundary.
//!
//! Every multi-statement operation (subscribe + token issue, token consume + confirm,
//! campaign claim) runs inside one [`UnitOfWork`] and becomes visible only on
//! [`UnitOfWork::commit`]. Dropping a unit of work without committing discards it.
mod memory;
mod postgres;

pub use memory::*;
pub use postgres::*;

use crate::domain::{
    Campaign, CampaignStatus, NewSubscriber, Subscriber, SubscriberStatus, SubscriberToken,
    SubscriptionToken, TokenType,
};
use crate::utils::error_chain_fmt;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use uuid::Uuid;

#[derive(thiserror::Error)]
pub enum StoreError {
    #[error("Database query failed")]
    Database(#[from] sqlx::Error),
    #[error("Failed to run database migrations")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("A row with the same unique key already exists")]
    UniqueViolation,
    #[error("Stored value is invalid: {0}")]
    Corrupted(String),
    #[error("Storage backend is unavailable")]
    Unavailable,
}

impl std::fmt::Debug for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[async_trait::async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError>;
}

#[async_trait::async_trait]
pub trait UnitOfWork: Send {
    async fn find_subscriber_by_email(
        &mut self,
        email: &str,
    ) -> Result<Option<Subscriber>, StoreError>;

    async fn find_subscriber(&mut self, id: Uuid) -> Result<Option<Subscriber>, StoreError>;

    /// Fails with [`StoreError::UniqueViolation`] when the email is taken.
    async fn insert_subscriber(&mut self, subscriber: &Subscriber) -> Result<(), StoreError>;

    /// Overwrites the mutable fields and resets the status to pending.
    async fn reactivate_subscriber(
        &mut self,
        id: Uuid,
        details: &NewSubscriber,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn set_subscriber_status(
        &mut self,
        id: Uuid,
        status: SubscriberStatus,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn set_last_email_sent(&mut self, id: Uuid, now: DateTime<Utc>) -> Result<(), StoreError>;

    /// Newest first.
    async fn list_subscribers(&mut self) -> Result<Vec<Subscriber>, StoreError>;

    async fn confirmed_subscribers(&mut self) -> Result<Vec<Subscriber>, StoreError>;

    async fn insert_token(&mut self, token: &SubscriberToken) -> Result<(), StoreError>;

    async fn delete_tokens(&mut self, subscriber_id: Uuid) -> Result<u64, StoreError>;

    /// Unused, unexpired token of the given type.
    async fn find_live_token(
        &mut self,
        token: &SubscriptionToken,
        token_type: TokenType,
        now: DateTime<Utc>,
    ) -> Result<Option<SubscriberToken>, StoreError>;

    async fn mark_token_used(&mut self, token_id: Uuid) -> Result<(), StoreError>;

    async fn insert_campaign(&mut self, campaign: &Campaign) -> Result<(), StoreError>;

    /// Newest first.
    async fn list_campaigns(&mut self) -> Result<Vec<Campaign>, StoreError>;

    /// Scheduled campaign with the earliest `scheduled_for <= now`.
    async fn next_due_campaign(&mut self, now: DateTime<Utc>)
        -> Result<Option<Campaign>, StoreError>;

    async fn set_campaign_status(
        &mut self,
        id: Uuid,
        status: CampaignStatus,
    ) -> Result<(), StoreError>;

    async fn mark_campaign_sending(
        &mut self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn insert_tracking(
        &mut self,
        campaign_id: Uuid,
        subscriber_id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn tracked_subscribers(&mut self, campaign_id: Uuid) -> Result<HashSet<Uuid>, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
