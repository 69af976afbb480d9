//! Product catalog.
//!
//! Products and their colours are read from Supabase, then filtered and
//! ordered locally for the listing page. Read failures leave the listing
//! empty instead of surfacing an error, so the page still renders.

mod filter;
mod selection;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use rand::seq::IndexedRandom;

use floa_core::{Price, ProductId};

pub use filter::{CatalogQuery, Gender, PriceBand, SortMode};
pub use selection::{Notice, ProductSelection, SelectionError};

use crate::supabase::{ProductColourRow, ProductRow, SupabaseError};

/// Number of products shown in the promo view.
pub const PROMO_PICK_SIZE: usize = 6;

/// Read access to catalog rows.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Every product row.
    ///
    /// # Errors
    ///
    /// Returns an error if the rows cannot be fetched.
    async fn products(&self) -> Result<Vec<ProductRow>, SupabaseError>;

    /// One product row.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::NotFound`] if there is no such product.
    async fn product(&self, id: ProductId) -> Result<ProductRow, SupabaseError>;

    /// The product/colour join.
    ///
    /// # Errors
    ///
    /// Returns an error if the rows cannot be fetched.
    async fn product_colours(&self) -> Result<Vec<ProductColourRow>, SupabaseError>;
}

/// A sneaker model as shown in the storefront.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub hero_image: Option<String>,
}

impl Product {
    #[must_use]
    pub fn gender(&self) -> Gender {
        Gender::of_name(&self.name)
    }
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.product_id,
            name: row.name,
            price: Price::saturating(row.price_usd),
            hero_image: row.hero_image,
        }
    }
}

/// Colour names per product.
///
/// Names are trimmed, blanks dropped, and duplicates removed keeping the
/// first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductColours {
    by_product: HashMap<ProductId, Vec<String>>,
}

impl ProductColours {
    #[must_use]
    pub fn from_rows(rows: impl IntoIterator<Item = ProductColourRow>) -> Self {
        let mut by_product: HashMap<ProductId, Vec<String>> = HashMap::new();
        for row in rows {
            let colours = by_product.entry(row.product_id).or_default();
            for name in row.colour.into_iter().filter_map(|colour| colour.name) {
                let name = name.trim();
                if !name.is_empty() && !colours.iter().any(|known| known == name) {
                    colours.push(name.to_string());
                }
            }
        }
        Self { by_product }
    }

    /// Colours of `product`, empty if it has none.
    #[must_use]
    pub fn for_product(&self, product: ProductId) -> &[String] {
        self.by_product.get(&product).map(Vec::as_slice).unwrap_or_default()
    }

    /// Every colour in the catalog, sorted for the filter panel.
    #[must_use]
    pub fn available_colours(&self) -> Vec<String> {
        let mut colours: Vec<String> = self.by_product.values().flatten().cloned().collect();
        colours.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
        colours.dedup();
        colours
    }
}

/// What the listing page shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogListing {
    pub products: Vec<Product>,
    pub available_colours: Vec<String>,
}

/// Pick up to [`PROMO_PICK_SIZE`] distinct products at random.
#[must_use]
pub fn promo_pick<R: Rng + ?Sized>(products: &[Product], rng: &mut R) -> Vec<Product> {
    products
        .choose_multiple(rng, PROMO_PICK_SIZE)
        .cloned()
        .collect()
}

/// Catalog reads with listing logic on top.
#[derive(Clone)]
pub struct Catalog {
    source: Arc<dyn CatalogSource>,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog").finish_non_exhaustive()
    }
}

impl Catalog {
    #[must_use]
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self { source }
    }

    /// Every product, in catalog order.
    pub async fn products(&self) -> Vec<Product> {
        match self.source.products().await {
            Ok(rows) => rows.into_iter().map(Product::from).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load products");
                Vec::new()
            }
        }
    }

    pub async fn colours(&self) -> ProductColours {
        match self.source.product_colours().await {
            Ok(rows) => ProductColours::from_rows(rows),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load product colours");
                ProductColours::default()
            }
        }
    }

    /// One product, `None` if it does not exist or cannot be loaded.
    pub async fn product(&self, id: ProductId) -> Option<Product> {
        match self.source.product(id).await {
            Ok(row) => Some(row.into()),
            Err(SupabaseError::NotFound(_)) => None,
            Err(e) => {
                tracing::warn!(product_id = %id, error = %e, "Failed to load product");
                None
            }
        }
    }

    /// Products and colour options for the listing page.
    pub async fn listing(&self, query: &CatalogQuery) -> CatalogListing {
        let (products, colours) = tokio::join!(self.products(), self.colours());

        let products = if query.promo {
            promo_pick(&products, &mut rand::rng())
        } else {
            query
                .apply(&products, &colours)
                .into_iter()
                .cloned()
                .collect()
        };

        CatalogListing {
            products,
            available_colours: colours.available_colours(),
        }
    }
}
