//! User profile records.
//!
//! The auth session does not say whether a user is an admin in a way the
//! storefront trusts. The `profiles` table does, so the projector looks the
//! user up there.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use floa_core::UserId;

use crate::supabase::SupabaseError;

/// Errors from a [`ProfileDirectory`].
#[derive(Debug, Error)]
pub enum ProfileError {
    /// The remote table could not be queried.
    #[error("profile request failed: {0}")]
    Remote(#[from] SupabaseError),

    /// The directory is unavailable for another reason.
    #[error("profile directory unavailable: {0}")]
    Unavailable(String),
}

/// A row of the `profiles` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub id: UserId,
    pub is_admin: bool,
}

impl ProfileRecord {
    /// The profile a freshly registered customer starts with.
    #[must_use]
    pub const fn customer(id: UserId) -> Self {
        Self {
            id,
            is_admin: false,
        }
    }
}

/// Lookup and upsert of profile records.
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    /// The admin flag of `user_id`'s profile, `None` if there is no profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup itself failed.
    async fn fetch_is_admin(&self, user_id: UserId) -> Result<Option<bool>, ProfileError>;

    /// Create or update a profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the write was rejected or failed.
    async fn upsert_profile(&self, profile: &ProfileRecord) -> Result<(), ProfileError>;
}
