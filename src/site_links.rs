use crate::domain::SubscriptionToken;
use reqwest::Url;

/// Builds the public links embedded in emails from the configured base URL.
#[derive(Debug, Clone)]
pub struct SiteLinks {
    base_url: Url,
}

impl SiteLinks {
    pub fn parse(base_url: &str) -> Result<Self, anyhow::Error> {
        let base_url = Url::parse(base_url)
            .map_err(|e| anyhow::anyhow!("Invalid application base url {}: {}", base_url, e))?;
        Ok(Self { base_url })
    }

    /// Base URL without a trailing slash.
    pub fn home(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    pub fn confirm_url(&self, token: &SubscriptionToken) -> String {
        self.with_query("subscriptions/confirm", "token", token.as_ref())
    }

    pub fn unsubscribe_url(&self, email: &str) -> String {
        self.with_query("unsubscribe", "email", email)
    }

    fn with_query(&self, path: &str, key: &str, value: &str) -> String {
        let mut url = self.base_url.clone();
        let base_path = self.base_url.path().trim_end_matches('/');
        url.set_path(&format!("{}/{}", base_path, path));
        url.query_pairs_mut().clear().append_pair(key, value);
        url.to_string()
    }
}
