use crate::domain::{
    Campaign, CampaignStatus, CampaignTracking, NewSubscriber, Subscriber, SubscriberStatus,
    SubscriberToken, SubscriptionToken, TokenType,
};
use crate::storage::{Store, StoreError, UnitOfWork};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
#[cfg(any(test, feature = "test-utils"))]
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Debug, Default, Clone)]
struct State {
    subscribers: Vec<Subscriber>,
    tokens: Vec<SubscriberToken>,
    campaigns: Vec<Campaign>,
    tracking: Vec<CampaignTracking>,
}

/// Process-local store. Units of work are serialised by a mutex and apply their staged
/// copy of the state on commit.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
    // 0 = no outage planned, n = the n-th next `begin` fails
    #[cfg(any(test, feature = "test-utils"))]
    outage_countdown: Arc<AtomicUsize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the `n`-th next call to `begin` fail with [`StoreError::Unavailable`]
    /// (`n = 1` fails the very next one).
    #[cfg(any(test, feature = "test-utils"))]
    pub fn simulate_outage_on_begin(&self, n: usize) {
        self.outage_countdown.store(n, Ordering::SeqCst);
    }

    pub async fn subscribers(&self) -> Vec<Subscriber> {
        self.state.lock().await.subscribers.clone()
    }

    pub async fn tokens(&self) -> Vec<SubscriberToken> {
        self.state.lock().await.tokens.clone()
    }

    pub async fn campaigns(&self) -> Vec<Campaign> {
        self.state.lock().await.campaigns.clone()
    }

    pub async fn tracking(&self) -> Vec<CampaignTracking> {
        self.state.lock().await.tracking.clone()
    }

    #[cfg(any(test, feature = "test-utils"))]
    fn outage_due(&self) -> bool {
        let previous = self
            .outage_countdown
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .unwrap_or(0);
        previous == 1
    }

    #[cfg(not(any(test, feature = "test-utils")))]
    fn outage_due(&self) -> bool {
        false
    }
}

#[async_trait::async_trait]
impl Store for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        if self.outage_due() {
            return Err(StoreError::Unavailable);
        }
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(InMemoryUnitOfWork { guard, staged }))
    }
}

pub struct InMemoryUnitOfWork {
    guard: OwnedMutexGuard<State>,
    staged: State,
}

impl InMemoryUnitOfWork {
    fn subscriber_mut(&mut self, id: Uuid) -> Option<&mut Subscriber> {
        self.staged.subscribers.iter_mut().find(|s| s.id == id)
    }

    fn campaign_mut(&mut self, id: Uuid) -> Option<&mut Campaign> {
        self.staged.campaigns.iter_mut().find(|c| c.id == id)
    }
}

fn newest_first<T: Clone>(items: &[T], created_at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    let mut items = items.to_vec();
    items.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
    items
}

#[async_trait::async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn find_subscriber_by_email(
        &mut self,
        email: &str,
    ) -> Result<Option<Subscriber>, StoreError> {
        Ok(self
            .staged
            .subscribers
            .iter()
            .find(|s| s.email == email)
            .cloned())
    }

    async fn find_subscriber(&mut self, id: Uuid) -> Result<Option<Subscriber>, StoreError> {
        Ok(self.staged.subscribers.iter().find(|s| s.id == id).cloned())
    }

    async fn insert_subscriber(&mut self, subscriber: &Subscriber) -> Result<(), StoreError> {
        if self
            .staged
            .subscribers
            .iter()
            .any(|s| s.email == subscriber.email || s.id == subscriber.id)
        {
            return Err(StoreError::UniqueViolation);
        }
        self.staged.subscribers.push(subscriber.clone());
        Ok(())
    }

    async fn reactivate_subscriber(
        &mut self,
        id: Uuid,
        details: &NewSubscriber,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if let Some(subscriber) = self.subscriber_mut(id) {
            subscriber.name = details.name.as_ref().to_string();
            subscriber.phone = details.phone.as_ref().to_string();
            subscriber.intention = details.intention;
            subscriber.linkedin = details.linkedin.as_ref().map(|l| l.as_ref().to_string());
            subscriber.status = SubscriberStatus::Pending;
            subscriber.updated_at = now;
        }
        Ok(())
    }

    async fn set_subscriber_status(
        &mut self,
        id: Uuid,
        status: SubscriberStatus,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if let Some(subscriber) = self.subscriber_mut(id) {
            subscriber.status = status;
            subscriber.updated_at = now;
        }
        Ok(())
    }

    async fn set_last_email_sent(&mut self, id: Uuid, now: DateTime<Utc>) -> Result<(), StoreError> {
        if let Some(subscriber) = self.subscriber_mut(id) {
            subscriber.last_email_sent = Some(now);
        }
        Ok(())
    }

    async fn list_subscribers(&mut self) -> Result<Vec<Subscriber>, StoreError> {
        Ok(newest_first(&self.staged.subscribers, |s| s.created_at))
    }

    async fn confirmed_subscribers(&mut self) -> Result<Vec<Subscriber>, StoreError> {
        Ok(self
            .staged
            .subscribers
            .iter()
            .filter(|s| s.status == SubscriberStatus::Confirmed)
            .cloned()
            .collect())
    }

    async fn insert_token(&mut self, token: &SubscriberToken) -> Result<(), StoreError> {
        if self.staged.tokens.iter().any(|t| t.token == token.token) {
            return Err(StoreError::UniqueViolation);
        }
        self.staged.tokens.push(token.clone());
        Ok(())
    }

    async fn delete_tokens(&mut self, subscriber_id: Uuid) -> Result<u64, StoreError> {
        let before = self.staged.tokens.len();
        self.staged.tokens.retain(|t| t.subscriber_id != subscriber_id);
        Ok((before - self.staged.tokens.len()) as u64)
    }

    async fn find_live_token(
        &mut self,
        token: &SubscriptionToken,
        token_type: TokenType,
        now: DateTime<Utc>,
    ) -> Result<Option<SubscriberToken>, StoreError> {
        Ok(self
            .staged
            .tokens
            .iter()
            .find(|t| &t.token == token && t.token_type == token_type && t.is_live(now))
            .cloned())
    }

    async fn mark_token_used(&mut self, token_id: Uuid) -> Result<(), StoreError> {
        if let Some(token) = self.staged.tokens.iter_mut().find(|t| t.id == token_id) {
            token.used = true;
        }
        Ok(())
    }

    async fn insert_campaign(&mut self, campaign: &Campaign) -> Result<(), StoreError> {
        self.staged.campaigns.push(campaign.clone());
        Ok(())
    }

    async fn list_campaigns(&mut self) -> Result<Vec<Campaign>, StoreError> {
        Ok(newest_first(&self.staged.campaigns, |c| c.created_at))
    }

    async fn next_due_campaign(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<Option<Campaign>, StoreError> {
        Ok(self
            .staged
            .campaigns
            .iter()
            .filter(|c| c.status == CampaignStatus::Scheduled)
            .filter_map(|c| c.scheduled_for.filter(|at| *at <= now).map(|at| (at, c)))
            .min_by_key(|(at, _)| *at)
            .map(|(_, c)| c.clone()))
    }

    async fn set_campaign_status(
        &mut self,
        id: Uuid,
        status: CampaignStatus,
    ) -> Result<(), StoreError> {
        if let Some(campaign) = self.campaign_mut(id) {
            campaign.status = status;
        }
        Ok(())
    }

    async fn mark_campaign_sending(
        &mut self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if let Some(campaign) = self.campaign_mut(id) {
            campaign.status = CampaignStatus::Sending;
            campaign.sent_date = Some(now);
        }
        Ok(())
    }

    async fn insert_tracking(
        &mut self,
        campaign_id: Uuid,
        subscriber_id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.staged.tracking.push(CampaignTracking {
            campaign_id,
            subscriber_id,
            sent_at,
        });
        Ok(())
    }

    async fn tracked_subscribers(&mut self, campaign_id: Uuid) -> Result<HashSet<Uuid>, StoreError> {
        Ok(self
            .staged
            .tracking
            .iter()
            .filter(|t| t.campaign_id == campaign_id)
            .map(|t| t.subscriber_id)
            .collect())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let InMemoryUnitOfWork { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}
