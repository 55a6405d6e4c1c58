use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Ledger row granting view access to one registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessLink {
    /// Opaque URL-safe token, unique across the ledger
    pub token: String,

    /// Registration number of the user this link opens
    pub registration_number: String,

    /// Set once by logout, never cleared
    pub is_used: bool,

    /// When the link was issued
    pub created_at: DateTime<Utc>,

    /// The link stops working at this instant
    pub expires_at: DateTime<Utc>,

    /// When the link was invalidated
    pub used_at: Option<DateTime<Utc>>,
}

impl AccessLink {
    /// Fresh, unused link expiring `ttl` after `now`.
    pub fn issued(token: String, registration_number: String, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            token,
            registration_number,
            is_used: false,
            created_at: now,
            expires_at: now + ttl,
            used_at: None,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_used && !self.is_expired_at(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let now = Utc::now();
        let link = AccessLink::issued("t".into(), "MOH202512345".into(), now, Duration::hours(1));

        assert!(link.is_valid_at(now));
        assert!(link.is_valid_at(now + Duration::minutes(59)));
        assert!(!link.is_valid_at(now + Duration::hours(1)));
    }

    #[test]
    fn test_used_link_is_invalid_before_expiry() {
        let now = Utc::now();
        let mut link = AccessLink::issued("t".into(), "MOH202512345".into(), now, Duration::days(7));
        link.is_used = true;
        link.used_at = Some(now);

        assert!(!link.is_valid_at(now));
        assert!(!link.is_expired_at(now));
    }
}
