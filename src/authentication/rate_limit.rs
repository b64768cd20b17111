//! Per-address sliding window over failed login attempts.
use crate::configuration::{AttemptStoreBackend, RateLimitSettings};
use crate::utils::error_chain_fmt;
use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Failed attempt timestamps (unix seconds) keyed by client address.
#[async_trait::async_trait]
pub trait AttemptStore: Send + Sync {
    /// Drops attempts older than `cutoff` and returns how many remain for `address`.
    async fn prune_and_count(
        &self,
        address: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<usize, anyhow::Error>;

    async fn record(&self, address: &str, at: DateTime<Utc>) -> Result<(), anyhow::Error>;
}

type Attempts = HashMap<String, Vec<i64>>;

fn prune(attempts: &mut Attempts, cutoff: DateTime<Utc>) {
    let cutoff = cutoff.timestamp();
    attempts.retain(|_, timestamps| {
        timestamps.retain(|at| *at > cutoff);
        !timestamps.is_empty()
    });
}

#[derive(Debug, Default)]
pub struct InMemoryAttemptStore {
    attempts: Mutex<Attempts>,
}

impl InMemoryAttemptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl AttemptStore for InMemoryAttemptStore {
    async fn prune_and_count(
        &self,
        address: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<usize, anyhow::Error> {
        let mut attempts = self.attempts.lock().await;
        prune(&mut attempts, cutoff);
        Ok(attempts.get(address).map_or(0, Vec::len))
    }

    async fn record(&self, address: &str, at: DateTime<Utc>) -> Result<(), anyhow::Error> {
        self.attempts
            .lock()
            .await
            .entry(address.to_string())
            .or_default()
            .push(at.timestamp());
        Ok(())
    }
}

/// JSON file shared by every worker of the process and surviving restarts.
#[derive(Debug)]
pub struct FileAttemptStore {
    path: PathBuf,
    // serialises read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl FileAttemptStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<Attempts, anyhow::Error> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Attempts::new()),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("Corrupted attempt file {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Attempts::new()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to read attempt file {}", self.path.display())),
        }
    }

    async fn save(&self, attempts: &Attempts) -> Result<(), anyhow::Error> {
        let bytes = serde_json::to_vec(attempts)?;
        tokio::fs::write(&self.path, bytes)
            .await
            .with_context(|| format!("Failed to write attempt file {}", self.path.display()))
    }
}

#[async_trait::async_trait]
impl AttemptStore for FileAttemptStore {
    async fn prune_and_count(
        &self,
        address: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<usize, anyhow::Error> {
        let _guard = self.lock.lock().await;
        let mut attempts = self.load().await?;
        prune(&mut attempts, cutoff);
        self.save(&attempts).await?;
        Ok(attempts.get(address).map_or(0, Vec::len))
    }

    async fn record(&self, address: &str, at: DateTime<Utc>) -> Result<(), anyhow::Error> {
        let _guard = self.lock.lock().await;
        let mut attempts = self.load().await?;
        attempts
            .entry(address.to_string())
            .or_default()
            .push(at.timestamp());
        self.save(&attempts).await
    }
}

#[derive(thiserror::Error)]
pub enum RateLimitError {
    #[error("Too many login attempts. Please try again later.")]
    TooManyAttempts,
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl std::fmt::Debug for RateLimitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

pub struct LoginRateLimiter {
    store: Arc<dyn AttemptStore>,
    max_attempts: usize,
    window: Duration,
}

impl LoginRateLimiter {
    pub fn new(store: Arc<dyn AttemptStore>, max_attempts: usize, window: Duration) -> Self {
        Self {
            store,
            max_attempts,
            window,
        }
    }

    pub fn from_settings(settings: &RateLimitSettings) -> Result<Self, anyhow::Error> {
        let store: Arc<dyn AttemptStore> = match settings.backend {
            AttemptStoreBackend::Memory => Arc::new(InMemoryAttemptStore::new()),
            AttemptStoreBackend::File => Arc::new(FileAttemptStore::new(settings.file_path.clone())),
        };
        let window = Duration::from_std(settings.window()).context("Rate limit window is too large")?;
        Ok(Self::new(store, settings.max_attempts, window))
    }

    /// Rejects the address once it has `max_attempts` failures inside the window.
    #[tracing::instrument(name = "Check login rate limit", skip(self, now))]
    pub async fn check(&self, address: &str, now: DateTime<Utc>) -> Result<(), RateLimitError> {
        let recent = self
            .store
            .prune_and_count(address, now - self.window)
            .await?;
        if recent >= self.max_attempts {
            tracing::warn!(recent, "Login rate limit reached");
            return Err(RateLimitError::TooManyAttempts);
        }
        Ok(())
    }

    pub async fn record_failure(&self, address: &str, now: DateTime<Utc>) {
        if let Err(e) = self.store.record(address, now).await {
            tracing::error!(error.cause_chain = ?e, "Failed to record a failed login attempt");
        }
    }
}
