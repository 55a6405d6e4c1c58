//! Access link lifecycle: issue, validate, invalidate.
//!
//! `Unissued -> Issued -> Invalidated`, with expiry checked at read time.
//! Reading a link never consumes it; only [`AccessGate::invalidate`] does.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::auth::token;
use crate::config::constants::MAX_ISSUE_ATTEMPTS;
use crate::error::AppError;
use crate::models::AccessLink;
use crate::storage::{AccessLinkStore, Storage, StorageError};

#[derive(Debug, Error)]
pub enum GateError {
    #[error("ttl must be positive")]
    InvalidTtl,

    #[error("could not allocate a unique token after {0} attempts")]
    TokenCollision(usize),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<GateError> for AppError {
    fn from(err: GateError) -> Self {
        match err {
            GateError::InvalidTtl => AppError::validation(err.to_string()),
            GateError::TokenCollision(_) => AppError::internal(err.to_string()),
            GateError::Storage(e) => e.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GateError>;

/// Uncollapsed outcome of a ledger lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkState {
    Valid(String),
    NotFound,
    Expired,
    AlreadyUsed,
}

impl LinkState {
    pub fn into_identity(self) -> Option<String> {
        match self {
            LinkState::Valid(identity) => Some(identity),
            _ => None,
        }
    }
}

/// Issues and checks access links against the ledger.
pub struct AccessGate<S: ?Sized + AccessLinkStore = dyn Storage> {
    store: Arc<S>,
}

impl<S: ?Sized + AccessLinkStore> Clone for AccessGate<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: ?Sized + AccessLinkStore> AccessGate<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn issue(&self, registration_number: &str, ttl: Duration) -> Result<String> {
        self.issue_at(registration_number, ttl, Utc::now()).await
    }

    /// Persist a new unused link for `registration_number` and return its token.
    ///
    /// A token that already exists in the ledger is replaced by a fresh one.
    #[instrument(skip(self, ttl, now))]
    pub async fn issue_at(&self, registration_number: &str, ttl: Duration, now: DateTime<Utc>) -> Result<String> {
        if ttl <= Duration::zero() {
            return Err(GateError::InvalidTtl);
        }

        for attempt in 1..=MAX_ISSUE_ATTEMPTS {
            let token = token::encode_at(registration_number, now);
            let link = AccessLink::issued(token.clone(), registration_number.to_string(), now, ttl);

            match self.store.insert_access_link(&link).await {
                Ok(()) => {
                    info!(
                        "Issued access link {}… expiring {}",
                        token::log_prefix(&token),
                        link.expires_at.to_rfc3339()
                    );
                    return Ok(token);
                }
                Err(StorageError::Duplicate(_)) => {
                    warn!("Token collision on attempt {}/{}", attempt, MAX_ISSUE_ATTEMPTS);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(GateError::TokenCollision(MAX_ISSUE_ATTEMPTS))
    }

    pub async fn inspect(&self, token: &str) -> Result<LinkState> {
        self.inspect_at(token, Utc::now()).await
    }

    /// Look the token up without changing it.
    pub async fn inspect_at(&self, token: &str, now: DateTime<Utc>) -> Result<LinkState> {
        let state = match self.store.find_access_link(token).await? {
            None => LinkState::NotFound,
            Some(link) if link.is_used => LinkState::AlreadyUsed,
            Some(link) if link.is_expired_at(now) => LinkState::Expired,
            Some(link) => LinkState::Valid(link.registration_number),
        };
        debug!("Access link {}… is {:?}", token::log_prefix(token), state);
        Ok(state)
    }

    pub async fn validate(&self, token: &str) -> Result<Option<String>> {
        self.validate_at(token, Utc::now()).await
    }

    /// Registration number for a usable token; `None` when absent, used or expired.
    pub async fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Option<String>> {
        Ok(self.inspect_at(token, now).await?.into_identity())
    }

    pub async fn invalidate(&self, token: &str) -> Result<bool> {
        self.invalidate_at(token, Utc::now()).await
    }

    /// Mark the link used. `false` when the token was never issued.
    pub async fn invalidate_at(&self, token: &str, now: DateTime<Utc>) -> Result<bool> {
        let found = self.store.mark_access_link_used(token, now).await?;
        if found {
            info!("Invalidated access link {}…", token::log_prefix(token));
        } else {
            debug!("Invalidate for unknown token {}…", token::log_prefix(token));
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStorage;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const IDENTITY: &str = "MOH202512345";

    fn gate() -> AccessGate<MemoryStorage> {
        AccessGate::new(Arc::new(MemoryStorage::new()))
    }

    #[tokio::test]
    async fn test_issue_then_validate_returns_identity() {
        let gate = gate();
        let token = gate.issue(IDENTITY, Duration::hours(24)).await.unwrap();
        assert_eq!(gate.validate(&token).await.unwrap().as_deref(), Some(IDENTITY));
    }

    #[tokio::test]
    async fn test_validate_does_not_consume() {
        let gate = gate();
        let token = gate.issue(IDENTITY, Duration::hours(24)).await.unwrap();
        let first = gate.validate(&token).await.unwrap();
        let second = gate.validate(&token).await.unwrap();
        assert_eq!(first, second);
        assert!(first.is_some());
    }

    #[tokio::test]
    async fn test_invalidate_is_permanent() {
        let gate = gate();
        let now = Utc::now();
        let token = gate.issue_at(IDENTITY, Duration::hours(24), now).await.unwrap();

        assert_eq!(gate.validate_at(&token, now).await.unwrap().as_deref(), Some(IDENTITY));
        assert!(gate.invalidate_at(&token, now).await.unwrap());
        assert_eq!(gate.validate_at(&token, now).await.unwrap(), None);
        assert_eq!(gate.inspect_at(&token, now).await.unwrap(), LinkState::AlreadyUsed);

        // still used long after, and a second invalidate reports true
        assert!(gate.invalidate_at(&token, now + Duration::hours(1)).await.unwrap());
        assert_eq!(gate.validate_at(&token, now + Duration::minutes(1)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expiry_at_ttl_boundary() {
        let gate = gate();
        let issued = Utc::now();
        let ttl = Duration::hours(24);
        let token = gate.issue_at(IDENTITY, ttl, issued).await.unwrap();

        let just_before = issued + ttl - Duration::milliseconds(1);
        assert!(gate.validate_at(&token, just_before).await.unwrap().is_some());
        assert_eq!(gate.validate_at(&token, issued + ttl).await.unwrap(), None);
        assert_eq!(gate.inspect_at(&token, issued + ttl).await.unwrap(), LinkState::Expired);
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let gate = gate();
        assert_eq!(gate.inspect("nope").await.unwrap(), LinkState::NotFound);
        assert_eq!(gate.validate("nope").await.unwrap(), None);
        assert!(!gate.invalidate("nope").await.unwrap());
    }

    #[tokio::test]
    async fn test_non_positive_ttl_is_rejected() {
        let gate = gate();
        assert!(matches!(
            gate.issue(IDENTITY, Duration::zero()).await,
            Err(GateError::InvalidTtl)
        ));
    }

    #[tokio::test]
    async fn test_many_tokens_per_identity_stay_valid() {
        let gate = gate();
        let a = gate.issue(IDENTITY, Duration::days(7)).await.unwrap();
        let b = gate.issue(IDENTITY, Duration::hours(24)).await.unwrap();
        assert_ne!(a, b);
        assert!(gate.validate(&a).await.unwrap().is_some());
        assert!(gate.validate(&b).await.unwrap().is_some());
    }

    /// Ledger whose first `collisions` inserts report a duplicate token.
    struct CollidingLedger {
        inner: MemoryStorage,
        collisions: usize,
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl AccessLinkStore for CollidingLedger {
        async fn insert_access_link(&self, link: &AccessLink) -> crate::storage::Result<()> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.collisions {
                return Err(StorageError::Duplicate("access_links.token".into()));
            }
            self.inner.insert_access_link(link).await
        }

        async fn find_access_link(&self, token: &str) -> crate::storage::Result<Option<AccessLink>> {
            self.inner.find_access_link(token).await
        }

        async fn mark_access_link_used(&self, token: &str, used_at: DateTime<Utc>) -> crate::storage::Result<bool> {
            self.inner.mark_access_link_used(token, used_at).await
        }
    }

    fn colliding(collisions: usize) -> Arc<CollidingLedger> {
        Arc::new(CollidingLedger {
            inner: MemoryStorage::new(),
            collisions,
            attempts: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_collision_is_retried_with_fresh_token() {
        let ledger = colliding(2);
        let gate = AccessGate::new(ledger.clone());

        let token = gate.issue(IDENTITY, Duration::hours(1)).await.unwrap();
        assert_eq!(ledger.attempts.load(Ordering::SeqCst), 3);
        assert_eq!(gate.validate(&token).await.unwrap().as_deref(), Some(IDENTITY));
    }

    #[tokio::test]
    async fn test_collision_retries_are_bounded() {
        let ledger = colliding(usize::MAX);
        let gate = AccessGate::new(ledger.clone());

        let err = gate.issue(IDENTITY, Duration::hours(1)).await.unwrap_err();
        assert!(matches!(err, GateError::TokenCollision(MAX_ISSUE_ATTEMPTS)));
        assert_eq!(ledger.attempts.load(Ordering::SeqCst), MAX_ISSUE_ATTEMPTS);
    }

    /// Ledger that is always unreachable.
    struct DownLedger;

    #[async_trait]
    impl AccessLinkStore for DownLedger {
        async fn insert_access_link(&self, _link: &AccessLink) -> crate::storage::Result<()> {
            Err(StorageError::Connection("refused".into()))
        }

        async fn find_access_link(&self, _token: &str) -> crate::storage::Result<Option<AccessLink>> {
            Err(StorageError::Connection("refused".into()))
        }

        async fn mark_access_link_used(&self, _token: &str, _used_at: DateTime<Utc>) -> crate::storage::Result<bool> {
            Err(StorageError::Connection("refused".into()))
        }
    }

    #[tokio::test]
    async fn test_store_failure_is_not_reported_as_invalid_token() {
        let gate = AccessGate::new(Arc::new(DownLedger));
        assert!(matches!(gate.validate("t").await, Err(GateError::Storage(_))));
        assert!(matches!(gate.invalidate("t").await, Err(GateError::Storage(_))));
        assert!(matches!(
            gate.issue(IDENTITY, Duration::hours(1)).await,
            Err(GateError::Storage(_))
        ));

        let app_err: AppError = gate.validate("t").await.unwrap_err().into();
        assert_eq!(app_err.http_status_code(), 503);
    }
}
