use crate::domain::Intention;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr, strum::EnumString, serde::Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubscriberStatus {
    Pending,
    Confirmed,
    Unsubscribed,
}

impl SubscriberStatus {
    pub fn is_active(&self) -> bool {
        !matches!(self, SubscriberStatus::Unsubscribed)
    }
}

/// A row of the subscriber registry.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Subscriber {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub intention: Intention,
    pub linkedin: Option<String>,
    pub status: SubscriberStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_email_sent: Option<DateTime<Utc>>,
}
