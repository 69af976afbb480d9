//! Favorited products.

use floa_core::ProductId;

use crate::storage::{
    self, SharedStore, StorageError, Stored, Validated, encode_json, keys, validate_json,
};

struct FavoriteIds(Vec<ProductId>);

impl Stored for FavoriteIds {
    fn validate(raw: &str) -> Validated<Self> {
        match validate_json::<Vec<ProductId>>(raw, "an array of product ids") {
            Validated::Valid(mut ids) => {
                let mut seen = Vec::with_capacity(ids.len());
                ids.retain(|id| {
                    let first = !seen.contains(id);
                    seen.push(*id);
                    first
                });
                Validated::Valid(Self(ids))
            }
            Validated::UseDefault(rejection) => Validated::UseDefault(rejection),
        }
    }

    fn encode(&self) -> Result<String, StorageError> {
        encode_json(&self.0)
    }
}

/// Products the shopper starred, in the order they were added.
pub struct Favorites {
    ids: Vec<ProductId>,
    store: SharedStore,
}

impl std::fmt::Debug for Favorites {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Favorites")
            .field("ids", &self.ids)
            .finish_non_exhaustive()
    }
}

impl Favorites {
    /// Load favorites from `store`; malformed data gives an empty list.
    #[must_use]
    pub fn hydrate(store: SharedStore) -> Self {
        let ids = storage::load::<FavoriteIds>(store.as_ref(), keys::FAVORITES)
            .into_option()
            .map(|favorites| favorites.0)
            .unwrap_or_default();
        Self { ids, store }
    }

    #[must_use]
    pub fn ids(&self) -> &[ProductId] {
        &self.ids
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.ids.contains(&id)
    }

    /// Star or unstar `id`. Returns whether it is now a favorite.
    pub fn toggle(&mut self, id: ProductId) -> bool {
        let now_favorite = if let Some(index) = self.ids.iter().position(|known| *known == id) {
            self.ids.remove(index);
            false
        } else {
            self.ids.push(id);
            true
        };

        if let Err(e) = storage::save(self.store.as_ref(), keys::FAVORITES, &FavoriteIds(self.ids.clone())) {
            tracing::warn!(error = %e, "Failed to persist favorites");
        }
        now_favorite
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::{KeyValueStore, MemoryStore};

    #[test]
    fn test_toggle_persists() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let mut favorites = Favorites::hydrate(store.clone());

        assert!(favorites.toggle(ProductId::new(4)));
        assert!(favorites.toggle(ProductId::new(2)));
        assert_eq!(store.get(keys::FAVORITES).unwrap().as_deref(), Some("[4,2]"));

        assert!(!favorites.toggle(ProductId::new(4)));
        assert!(!favorites.contains(ProductId::new(4)));
        assert_eq!(store.get(keys::FAVORITES).unwrap().as_deref(), Some("[2]"));

        let reloaded = Favorites::hydrate(store);
        assert_eq!(reloaded.ids(), [ProductId::new(2)]);
    }

    #[test]
    fn test_malformed_is_empty() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        store.set(keys::FAVORITES, r#"{"ids":[1]}"#).unwrap();
        assert!(Favorites::hydrate(store.clone()).ids().is_empty());

        store.set(keys::FAVORITES, "not json").unwrap();
        assert!(Favorites::hydrate(store.clone()).ids().is_empty());

        store.set(keys::FAVORITES, "[3,3,1]").unwrap();
        assert_eq!(
            Favorites::hydrate(store).ids(),
            [ProductId::new(3), ProductId::new(1)]
        );
    }
}
