//! Cookie consent.
//!
//! The choice is stored as `{"value": "accepted", "timestamp": <ms>}` and
//! expires after [`CONSENT_TTL_DAYS`]. Expired, legacy and malformed entries
//! are removed, which shows the banner again.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::{
    self, Rejection, SharedStore, StorageError, Stored, Validated, encode_json, keys,
    validate_json,
};

pub const CONSENT_TTL_DAYS: i64 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsentChoice {
    Accepted,
    Declined,
}

/// A recorded consent decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Consent {
    pub choice: ConsentChoice,
    pub decided_at: DateTime<Utc>,
}

impl Consent {
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now - self.decided_at <= TimeDelta::days(CONSENT_TTL_DAYS)
    }
}

#[derive(Serialize, Deserialize)]
struct StoredConsent {
    value: ConsentChoice,
    #[serde(default)]
    timestamp: i64,
}

impl Stored for Consent {
    fn validate(raw: &str) -> Validated<Self> {
        let stored = match validate_json::<StoredConsent>(raw, "a consent record") {
            Validated::Valid(stored) => stored,
            Validated::UseDefault(rejection) => return Validated::UseDefault(rejection),
        };
        match DateTime::from_timestamp_millis(stored.timestamp) {
            Some(decided_at) if stored.timestamp > 0 => Validated::Valid(Self {
                choice: stored.value,
                decided_at,
            }),
            _ => Validated::UseDefault(Rejection::WrongShape("a positive timestamp")),
        }
    }

    fn encode(&self) -> Result<String, StorageError> {
        encode_json(&StoredConsent {
            value: self.choice,
            timestamp: self.decided_at.timestamp_millis(),
        })
    }
}

/// Reads and records the cookie consent choice.
#[derive(Clone)]
pub struct ConsentStore {
    store: SharedStore,
}

impl std::fmt::Debug for ConsentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsentStore").finish_non_exhaustive()
    }
}

impl ConsentStore {
    #[must_use]
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// The consent still in force at `now`.
    ///
    /// Anything stored that is not a fresh consent is removed.
    pub fn current(&self, now: DateTime<Utc>) -> Option<Consent> {
        let rejection = match storage::load::<Consent>(self.store.as_ref(), keys::COOKIE_CONSENT) {
            Validated::Valid(consent) if consent.is_fresh(now) => return Some(consent),
            Validated::Valid(_) => Rejection::Expired,
            Validated::UseDefault(rejection) => rejection,
        };

        if !matches!(rejection, Rejection::Missing | Rejection::Unreadable(_)) {
            tracing::debug!(%rejection, "Discarding stored cookie consent");
            if let Err(e) = self.store.remove(keys::COOKIE_CONSENT) {
                tracing::warn!(error = %e, "Failed to remove stale cookie consent");
            }
        }
        None
    }

    /// Persist `choice` as decided at `now`.
    pub fn record(&self, choice: ConsentChoice, now: DateTime<Utc>) -> Consent {
        let consent = Consent {
            choice,
            decided_at: now,
        };
        if let Err(e) = storage::save(self.store.as_ref(), keys::COOKIE_CONSENT, &consent) {
            tracing::warn!(error = %e, "Failed to persist cookie consent");
        }
        consent
    }

    /// Whether the consent banner must be shown at `now`.
    pub fn banner_visible(&self, now: DateTime<Utc>) -> bool {
        self.current(now).is_none()
    }
}
