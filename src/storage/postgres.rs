use crate::configuration::DatabaseSettings;
use crate::domain::{
    Campaign, CampaignStatus, Intention, NewSubscriber, Subscriber, SubscriberStatus,
    SubscriberToken, SubscriptionToken, TokenType,
};
use crate::storage::{Store, StoreError, UnitOfWork};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashSet;
use std::str::FromStr;
use uuid::Uuid;

type PgTransaction = Transaction<'static, Postgres>;

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pg_pool: PgPool,
}

impl PostgresStore {
    pub fn new(pg_pool: PgPool) -> Self {
        Self { pg_pool }
    }

    /// Lazily connecting pool, the first query opens the connection.
    pub fn connect_lazy(settings: &DatabaseSettings) -> Self {
        let pg_pool = PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_secs(2))
            .connect_lazy_with(settings.get_pg_options());
        Self::new(pg_pool)
    }

    #[tracing::instrument(name = "Run database migrations", skip_all)]
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pg_pool).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Store for PostgresStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        let transaction = self.pg_pool.begin().await?;
        Ok(Box::new(PostgresUnitOfWork { transaction }))
    }
}

pub struct PostgresUnitOfWork {
    transaction: PgTransaction,
}

#[derive(sqlx::FromRow)]
struct SubscriberRow {
    id: Uuid,
    name: String,
    email: String,
    phone: String,
    intention: String,
    linkedin: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_email_sent: Option<DateTime<Utc>>,
}

impl TryFrom<SubscriberRow> for Subscriber {
    type Error = StoreError;

    fn try_from(row: SubscriberRow) -> Result<Self, Self::Error> {
        Ok(Subscriber {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            intention: Intention::from_str(&row.intention)
                .map_err(|_| StoreError::Corrupted(format!("intention `{}`", row.intention)))?,
            linkedin: row.linkedin,
            status: SubscriberStatus::from_str(&row.status)
                .map_err(|_| StoreError::Corrupted(format!("subscriber status `{}`", row.status)))?,
            created_at: row.created_at,
            updated_at: row.updated_at,
            last_email_sent: row.last_email_sent,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TokenRow {
    id: Uuid,
    subscriber_id: Uuid,
    token: String,
    token_type: String,
    used: bool,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl TryFrom<TokenRow> for SubscriberToken {
    type Error = StoreError;

    fn try_from(row: TokenRow) -> Result<Self, Self::Error> {
        Ok(SubscriberToken {
            id: row.id,
            subscriber_id: row.subscriber_id,
            token: SubscriptionToken::parse(row.token).map_err(StoreError::Corrupted)?,
            token_type: TokenType::from_str(&row.token_type)
                .map_err(|_| StoreError::Corrupted(format!("token type `{}`", row.token_type)))?,
            used: row.used,
            created_at: row.created_at,
            expires_at: row.expires_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CampaignRow {
    id: Uuid,
    name: String,
    subject: String,
    content: String,
    status: String,
    created_at: DateTime<Utc>,
    scheduled_for: Option<DateTime<Utc>>,
    sent_date: Option<DateTime<Utc>>,
}

impl TryFrom<CampaignRow> for Campaign {
    type Error = StoreError;

    fn try_from(row: CampaignRow) -> Result<Self, Self::Error> {
        Ok(Campaign {
            id: row.id,
            name: row.name,
            subject: row.subject,
            content: row.content,
            status: CampaignStatus::from_str(&row.status)
                .map_err(|_| StoreError::Corrupted(format!("campaign status `{}`", row.status)))?,
            created_at: row.created_at,
            scheduled_for: row.scheduled_for,
            sent_date: row.sent_date,
        })
    }
}

const SUBSCRIBER_COLUMNS: &str = "id, name, email, phone, intention, linkedin, status, \
    created_at, updated_at, last_email_sent";

const CAMPAIGN_COLUMNS: &str = "id, name, subject, content, status, created_at, scheduled_for, sent_date";

fn unique_violation(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db_error) if db_error.code().as_deref() == Some("23505") => {
            StoreError::UniqueViolation
        }
        _ => StoreError::Database(e),
    }
}

#[async_trait::async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    #[tracing::instrument(name = "Find subscriber by email", skip(self))]
    async fn find_subscriber_by_email(
        &mut self,
        email: &str,
    ) -> Result<Option<Subscriber>, StoreError> {
        sqlx::query_as::<_, SubscriberRow>(&format!(
            "SELECT {} FROM subscribers WHERE email = $1",
            SUBSCRIBER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&mut *self.transaction)
        .await?
        .map(Subscriber::try_from)
        .transpose()
    }

    #[tracing::instrument(name = "Find subscriber by id", skip(self))]
    async fn find_subscriber(&mut self, id: Uuid) -> Result<Option<Subscriber>, StoreError> {
        sqlx::query_as::<_, SubscriberRow>(&format!(
            "SELECT {} FROM subscribers WHERE id = $1",
            SUBSCRIBER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *self.transaction)
        .await?
        .map(Subscriber::try_from)
        .transpose()
    }

    #[tracing::instrument(name = "Insert a new subscriber into database", skip_all)]
    async fn insert_subscriber(&mut self, subscriber: &Subscriber) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO subscribers
                (id, name, email, phone, intention, linkedin, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(subscriber.id)
        .bind(&subscriber.name)
        .bind(&subscriber.email)
        .bind(&subscriber.phone)
        .bind(subscriber.intention.as_ref())
        .bind(&subscriber.linkedin)
        .bind(subscriber.status.as_ref())
        .bind(subscriber.created_at)
        .bind(subscriber.updated_at)
        .execute(&mut *self.transaction)
        .await
        .map_err(unique_violation)?;
        Ok(())
    }

    #[tracing::instrument(name = "Reactivate an unsubscribed subscriber", skip(self, details))]
    async fn reactivate_subscriber(
        &mut self,
        id: Uuid,
        details: &NewSubscriber,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE subscribers
            SET status = $1, updated_at = $2, name = $3, phone = $4, intention = $5, linkedin = $6
            WHERE id = $7
            "#,
        )
        .bind(SubscriberStatus::Pending.as_ref())
        .bind(now)
        .bind(details.name.as_ref())
        .bind(details.phone.as_ref())
        .bind(details.intention.as_ref())
        .bind(details.linkedin.as_ref().map(|l| l.as_ref()))
        .bind(id)
        .execute(&mut *self.transaction)
        .await?;
        Ok(())
    }

    #[tracing::instrument(name = "Update subscriber status", skip(self), fields(status = %status.as_ref()))]
    async fn set_subscriber_status(
        &mut self,
        id: Uuid,
        status: SubscriberStatus,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE subscribers SET status = $1, updated_at = $2 WHERE id = $3")
            .bind(status.as_ref())
            .bind(now)
            .bind(id)
            .execute(&mut *self.transaction)
            .await?;
        Ok(())
    }

    async fn set_last_email_sent(&mut self, id: Uuid, now: DateTime<Utc>) -> Result<(), StoreError> {
        sqlx::query("UPDATE subscribers SET last_email_sent = $1 WHERE id = $2")
            .bind(now)
            .bind(id)
            .execute(&mut *self.transaction)
            .await?;
        Ok(())
    }

    #[tracing::instrument(name = "List subscribers", skip(self))]
    async fn list_subscribers(&mut self) -> Result<Vec<Subscriber>, StoreError> {
        sqlx::query_as::<_, SubscriberRow>(&format!(
            "SELECT {} FROM subscribers ORDER BY created_at DESC",
            SUBSCRIBER_COLUMNS
        ))
        .fetch_all(&mut *self.transaction)
        .await?
        .into_iter()
        .map(Subscriber::try_from)
        .collect()
    }

    #[tracing::instrument(name = "Get confirmed subscribers", skip(self))]
    async fn confirmed_subscribers(&mut self) -> Result<Vec<Subscriber>, StoreError> {
        sqlx::query_as::<_, SubscriberRow>(&format!(
            "SELECT {} FROM subscribers WHERE status = $1",
            SUBSCRIBER_COLUMNS
        ))
        .bind(SubscriberStatus::Confirmed.as_ref())
        .fetch_all(&mut *self.transaction)
        .await?
        .into_iter()
        .map(Subscriber::try_from)
        .collect()
    }

    #[tracing::instrument(
        name = "Insert subscription token into database",
        skip_all,
        fields(subscriber_id = %token.subscriber_id)
    )]
    async fn insert_token(&mut self, token: &SubscriberToken) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO subscriber_tokens
                (id, subscriber_id, token, token_type, used, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(token.id)
        .bind(token.subscriber_id)
        .bind(token.token.as_ref())
        .bind(token.token_type.as_ref())
        .bind(token.used)
        .bind(token.created_at)
        .bind(token.expires_at)
        .execute(&mut *self.transaction)
        .await
        .map_err(unique_violation)?;
        Ok(())
    }

    #[tracing::instrument(name = "Delete subscription tokens of a subscriber", skip(self))]
    async fn delete_tokens(&mut self, subscriber_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM subscriber_tokens WHERE subscriber_id = $1")
            .bind(subscriber_id)
            .execute(&mut *self.transaction)
            .await?;
        Ok(result.rows_affected())
    }

    #[tracing::instrument(name = "Find a live subscription token", skip(self, token))]
    async fn find_live_token(
        &mut self,
        token: &SubscriptionToken,
        token_type: TokenType,
        now: DateTime<Utc>,
    ) -> Result<Option<SubscriberToken>, StoreError> {
        // Row lock so two concurrent confirmations cannot both consume the token
        sqlx::query_as::<_, TokenRow>(
            r#"
            SELECT id, subscriber_id, token, token_type, used, created_at, expires_at
            FROM subscriber_tokens
            WHERE token = $1 AND token_type = $2 AND used = FALSE AND expires_at > $3
            FOR UPDATE
            "#,
        )
        .bind(token.as_ref())
        .bind(token_type.as_ref())
        .bind(now)
        .fetch_optional(&mut *self.transaction)
        .await?
        .map(SubscriberToken::try_from)
        .transpose()
    }

    async fn mark_token_used(&mut self, token_id: Uuid) -> Result<(), StoreError> {
        sqlx::query("UPDATE subscriber_tokens SET used = TRUE WHERE id = $1")
            .bind(token_id)
            .execute(&mut *self.transaction)
            .await?;
        Ok(())
    }

    #[tracing::instrument(name = "Insert campaign into database", skip_all, fields(campaign_id = %campaign.id))]
    async fn insert_campaign(&mut self, campaign: &Campaign) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO email_campaigns
                (id, name, subject, content, status, created_at, scheduled_for, sent_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(campaign.id)
        .bind(&campaign.name)
        .bind(&campaign.subject)
        .bind(&campaign.content)
        .bind(campaign.status.as_ref())
        .bind(campaign.created_at)
        .bind(campaign.scheduled_for)
        .bind(campaign.sent_date)
        .execute(&mut *self.transaction)
        .await?;
        Ok(())
    }

    async fn list_campaigns(&mut self) -> Result<Vec<Campaign>, StoreError> {
        sqlx::query_as::<_, CampaignRow>(&format!(
            "SELECT {} FROM email_campaigns ORDER BY created_at DESC",
            CAMPAIGN_COLUMNS
        ))
        .fetch_all(&mut *self.transaction)
        .await?
        .into_iter()
        .map(Campaign::try_from)
        .collect()
    }

    #[tracing::instrument(name = "Get the next due campaign", skip(self))]
    async fn next_due_campaign(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<Option<Campaign>, StoreError> {
        // Skip campaigns another dispatcher is claiming right now
        sqlx::query_as::<_, CampaignRow>(&format!(
            r#"
            SELECT {}
            FROM email_campaigns
            WHERE status = $1 AND scheduled_for <= $2
            ORDER BY scheduled_for ASC
            LIMIT 1
            FOR UPDATE
            SKIP LOCKED
            "#,
            CAMPAIGN_COLUMNS
        ))
        .bind(CampaignStatus::Scheduled.as_ref())
        .bind(now)
        .fetch_optional(&mut *self.transaction)
        .await?
        .map(Campaign::try_from)
        .transpose()
    }

    #[tracing::instrument(name = "Update campaign status", skip(self), fields(status = %status.as_ref()))]
    async fn set_campaign_status(
        &mut self,
        id: Uuid,
        status: CampaignStatus,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE email_campaigns SET status = $1 WHERE id = $2")
            .bind(status.as_ref())
            .bind(id)
            .execute(&mut *self.transaction)
            .await?;
        Ok(())
    }

    #[tracing::instrument(name = "Mark campaign as sending", skip(self))]
    async fn mark_campaign_sending(
        &mut self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE email_campaigns SET status = $1, sent_date = $2 WHERE id = $3")
            .bind(CampaignStatus::Sending.as_ref())
            .bind(now)
            .bind(id)
            .execute(&mut *self.transaction)
            .await?;
        Ok(())
    }

    async fn insert_tracking(
        &mut self,
        campaign_id: Uuid,
        subscriber_id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO campaign_tracking (campaign_id, subscriber_id, sent_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(campaign_id)
        .bind(subscriber_id)
        .bind(sent_at)
        .execute(&mut *self.transaction)
        .await?;
        Ok(())
    }

    async fn tracked_subscribers(&mut self, campaign_id: Uuid) -> Result<HashSet<Uuid>, StoreError> {
        let ids: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT DISTINCT subscriber_id FROM campaign_tracking WHERE campaign_id = $1",
        )
        .bind(campaign_id)
        .fetch_all(&mut *self.transaction)
        .await?;
        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.transaction.commit().await?;
        Ok(())
    }
}
