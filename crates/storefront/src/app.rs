//! Application root.
//!
//! [`Storefront`] owns every piece of client state and the handles they
//! share: one key-value store, one Supabase client and one session
//! projector. Components never reach for globals; they get what they need
//! from here.

use std::sync::Arc;

use floa_core::UserId;

use crate::cart::CartStore;
use crate::catalog::{Catalog, CatalogSource};
use crate::config::StorefrontConfig;
use crate::consent::ConsentStore;
use crate::error::Result;
use crate::favorites::Favorites;
use crate::session::{
    GuardDecision, ProfileDirectory, ProfileError, RouteGuard, SessionProjector, SessionProvider,
    SessionView, register_profile,
};
use crate::storage::{FileStore, SharedStore};
use crate::supabase::SupabaseClient;

/// Backends a [`Storefront`] is assembled from.
pub struct StorefrontParts {
    pub store: SharedStore,
    pub catalog: Arc<dyn CatalogSource>,
    pub profiles: Arc<dyn ProfileDirectory>,
    pub sessions: Arc<dyn SessionProvider>,
}

/// The storefront's client state.
pub struct Storefront {
    store: SharedStore,
    catalog: Catalog,
    profiles: Arc<dyn ProfileDirectory>,
    cart: CartStore,
    favorites: Favorites,
    consent: ConsentStore,
    session: SessionProjector,
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("cart", &self.cart)
            .field("favorites", &self.favorites)
            .field("session", &self.session.view())
            .finish_non_exhaustive()
    }
}

impl Storefront {
    /// Wire the storefront from configuration.
    ///
    /// Opens the storage file, builds the Supabase client and starts the
    /// session projector over `sessions`. Must be called from within a
    /// tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage file cannot be opened or the
    /// Supabase URL is unusable.
    pub fn start(config: &StorefrontConfig, sessions: Arc<dyn SessionProvider>) -> Result<Self> {
        let store: SharedStore = Arc::new(FileStore::open(&config.storage_path)?);
        let supabase = SupabaseClient::new(&config.supabase)?;
        tracing::info!(
            storage = %config.storage_path.display(),
            supabase = %config.supabase.url,
            "Storefront starting"
        );

        Ok(Self::assemble(StorefrontParts {
            store,
            catalog: Arc::new(supabase.clone()),
            profiles: Arc::new(supabase),
            sessions,
        }))
    }

    /// Wire the storefront from explicit backends.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn assemble(parts: StorefrontParts) -> Self {
        let StorefrontParts {
            store,
            catalog,
            profiles,
            sessions,
        } = parts;

        let session = SessionProjector::spawn(sessions, profiles.clone(), store.clone());
        Self {
            cart: CartStore::hydrate(store.clone()),
            favorites: Favorites::hydrate(store.clone()),
            consent: ConsentStore::new(store.clone()),
            catalog: Catalog::new(catalog),
            profiles,
            session,
            store,
        }
    }

    #[must_use]
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub const fn cart(&self) -> &CartStore {
        &self.cart
    }

    pub const fn cart_mut(&mut self) -> &mut CartStore {
        &mut self.cart
    }

    #[must_use]
    pub const fn favorites(&self) -> &Favorites {
        &self.favorites
    }

    pub const fn favorites_mut(&mut self) -> &mut Favorites {
        &mut self.favorites
    }

    #[must_use]
    pub const fn consent(&self) -> &ConsentStore {
        &self.consent
    }

    #[must_use]
    pub const fn session(&self) -> &SessionProjector {
        &self.session
    }

    /// The current session view.
    #[must_use]
    pub fn session_view(&self) -> SessionView {
        self.session.view()
    }

    /// Decide what to do with a request for a route behind `guard`.
    #[must_use]
    pub fn guard(&self, guard: RouteGuard) -> GuardDecision {
        guard.decide(&self.session.view())
    }

    /// Create the customer profile for a user who just registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile could not be written.
    pub async fn register_profile(&self, user_id: UserId) -> std::result::Result<(), ProfileError> {
        register_profile(self.profiles.as_ref(), user_id).await
    }
}
