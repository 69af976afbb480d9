//! Integration tests for the FLOA storefront core.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p floa-integration-tests
//! ```
//!
//! No network is needed: the Supabase tables are replaced by the in-memory
//! doubles below, and storage goes to a temporary directory.
//!
//! # Test Categories
//!
//! - `cart_persistence` - Cart state across restarts of a file-backed store
//! - `session_projection` - Projector, identity hints and route guard together
//! - `storefront_flow` - The assembled application root

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use floa_core::{ProductId, UserId};
use floa_storefront::catalog::CatalogSource;
use floa_storefront::session::{
    AuthSession, AuthUser, ProfileDirectory, ProfileError, ProfileRecord, UserMetadata,
};
use floa_storefront::supabase::{ColourName, ProductColourRow, ProductRow, SupabaseError};

/// `profiles` table held in memory.
#[derive(Debug, Default)]
pub struct InMemoryProfiles {
    rows: Mutex<HashMap<UserId, bool>>,
    unavailable: Mutex<bool>,
}

impl InMemoryProfiles {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a profile row.
    ///
    /// # Panics
    ///
    /// Panics if the table lock is poisoned.
    #[allow(clippy::unwrap_used)]
    pub fn set_admin(&self, user_id: UserId, is_admin: bool) {
        self.rows.lock().unwrap().insert(user_id, is_admin);
    }

    /// Make every call fail until switched back.
    ///
    /// # Panics
    ///
    /// Panics if the lock is poisoned.
    #[allow(clippy::unwrap_used)]
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock().unwrap() = unavailable;
    }

    /// The stored admin flag of `user_id`, if a row exists.
    ///
    /// # Panics
    ///
    /// Panics if the table lock is poisoned.
    #[allow(clippy::unwrap_used)]
    #[must_use]
    pub fn row(&self, user_id: UserId) -> Option<bool> {
        self.rows.lock().unwrap().get(&user_id).copied()
    }

    fn check_available(&self) -> Result<(), ProfileError> {
        match self.unavailable.lock() {
            Ok(unavailable) if *unavailable => {
                Err(ProfileError::Unavailable("profiles offline".to_string()))
            }
            Ok(_) => Ok(()),
            Err(_) => Err(ProfileError::Unavailable("lock poisoned".to_string())),
        }
    }
}

#[async_trait]
impl ProfileDirectory for InMemoryProfiles {
    async fn fetch_is_admin(&self, user_id: UserId) -> Result<Option<bool>, ProfileError> {
        self.check_available()?;
        Ok(self.row(user_id))
    }

    async fn upsert_profile(&self, profile: &ProfileRecord) -> Result<(), ProfileError> {
        self.check_available()?;
        self.set_admin(profile.id, profile.is_admin);
        Ok(())
    }
}

/// `product` and `product_colour` tables held in memory.
#[derive(Debug, Default, Clone)]
pub struct StaticCatalog {
    pub products: Vec<ProductRow>,
    pub colours: Vec<ProductColourRow>,
}

impl StaticCatalog {
    /// A small catalog covering every audience.
    #[must_use]
    pub fn sample() -> Self {
        let product = |id: i64, name: &str, cents: i64| ProductRow {
            product_id: ProductId::new(id),
            name: name.to_string(),
            price_usd: Decimal::new(cents, 2),
            hero_image: Some(format!("https://cdn.floa.shop/{id}.jpg")),
        };
        let colour = |id: i64, name: &str| ProductColourRow {
            product_id: ProductId::new(id),
            colour: vec![ColourName {
                name: Some(name.to_string()),
            }],
        };

        Self {
            products: vec![
                product(1, "Petal Runner Women", 12_900),
                product(2, "Trail Bloom Men", 14_500),
                product(3, "Sprout Junior", 6_900),
                product(4, "Daisy Classic", 21_000),
            ],
            colours: vec![colour(1, "Rose"), colour(2, "Sage"), colour(4, "Rose")],
        }
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn products(&self) -> Result<Vec<ProductRow>, SupabaseError> {
        Ok(self.products.clone())
    }

    async fn product(&self, id: ProductId) -> Result<ProductRow, SupabaseError> {
        self.products
            .iter()
            .find(|row| row.product_id == id)
            .cloned()
            .ok_or_else(|| SupabaseError::NotFound(format!("product {id}")))
    }

    async fn product_colours(&self) -> Result<Vec<ProductColourRow>, SupabaseError> {
        Ok(self.colours.clone())
    }
}

/// A signed-in session for a fresh user.
#[must_use]
pub fn session_for(email: &str, metadata_admin: Option<bool>) -> AuthSession {
    AuthSession {
        user: AuthUser {
            id: UserId::new(Uuid::new_v4()),
            email: Some(email.to_string()),
            user_metadata: UserMetadata {
                is_admin: metadata_admin,
            },
        },
    }
}

/// Shared handle to a profile table double.
#[must_use]
pub fn profiles() -> Arc<InMemoryProfiles> {
    Arc::new(InMemoryProfiles::new())
}
