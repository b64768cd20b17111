use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use uuid::Uuid;

/// Lifetime of a confirmation token.
pub const TOKEN_LIFETIME_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum TokenType {
    Confirm,
}

/// Opaque, unguessable token value: 32 random bytes, hex encoded.
#[derive(Clone, PartialEq, Eq)]
pub struct SubscriptionToken(String);

impl SubscriptionToken {
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Wraps a value received from a confirmation link. Only emptiness is checked here,
    /// anything else is decided by the lookup.
    pub fn parse(token: String) -> Result<Self, String> {
        let token = token.trim().to_string();
        if token.is_empty() {
            return Err("Invalid confirmation link. Please try subscribing again.".into());
        }
        Ok(Self(token))
    }
}

impl AsRef<str> for SubscriptionToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Keep token values out of logs.
impl std::fmt::Debug for SubscriptionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SubscriptionToken([REDACTED])")
    }
}

#[derive(Debug, Clone)]
pub struct SubscriberToken {
    pub id: Uuid,
    pub subscriber_id: Uuid,
    pub token: SubscriptionToken,
    pub token_type: TokenType,
    pub used: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SubscriberToken {
    pub fn new_confirmation(subscriber_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            subscriber_id,
            token: SubscriptionToken::generate(),
            token_type: TokenType::Confirm,
            used: false,
            created_at: now,
            expires_at: now + Duration::days(TOKEN_LIFETIME_DAYS),
        }
    }

    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        !self.used && self.expires_at > now
    }
}
