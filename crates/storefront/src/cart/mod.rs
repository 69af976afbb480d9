//! Shopping cart state.
//!
//! [`CartStore`] owns the cart lines, writes the whole collection to the
//! key-value store after every change and derives totals on read. It also
//! tracks whether the cart preview panel is open; that flag is transient
//! and never persisted.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use floa_core::{Price, ProductId, ShoeSize};
//! use floa_storefront::cart::{CartStore, NewCartLine};
//! use floa_storefront::storage::MemoryStore;
//! use rust_decimal::Decimal;
//!
//! let mut cart = CartStore::hydrate(Arc::new(MemoryStore::new()));
//! let size = ShoeSize::parse("38").unwrap();
//! let bloom = NewCartLine {
//!     product_id: ProductId::new(1),
//!     name: "FLOA Bloom Women".to_string(),
//!     unit_price: Price::new(Decimal::new(12900, 2)).unwrap(),
//!     image: None,
//!     variant: Some(size.clone()),
//! };
//!
//! cart.add_item_with_quantity(bloom.clone(), 2);
//! cart.add_item(bloom);
//! assert_eq!(cart.lines().len(), 1);
//! assert_eq!(cart.total_quantity(), 3);
//!
//! cart.update_quantity(ProductId::new(1), Some(&size), 0);
//! assert!(cart.is_empty());
//! ```

mod line;
mod persist;

use std::fmt;

use floa_core::{ProductId, ShoeSize};
use rust_decimal::Decimal;

pub use line::{CartLine, NewCartLine};

use crate::storage::{self, SharedStore, StorageError, keys};
use line::merge_into;
use persist::{CartLines, encode_lines};

/// The cart and its preview panel state.
pub struct CartStore {
    lines: Vec<CartLine>,
    is_preview_open: bool,
    store: SharedStore,
}

impl fmt::Debug for CartStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartStore")
            .field("lines", &self.lines)
            .field("is_preview_open", &self.is_preview_open)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Load the cart persisted in `store`.
    ///
    /// Missing or malformed data yields an empty cart; this never fails.
    #[must_use]
    pub fn hydrate(store: SharedStore) -> Self {
        let lines = storage::load::<CartLines>(store.as_ref(), keys::CART)
            .unwrap_or_default()
            .0;
        tracing::debug!(lines = lines.len(), "Hydrated cart");

        Self {
            lines,
            is_preview_open: false,
            store,
        }
    }

    /// Lines in the order they were first added.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line with identity `(product_id, variant)`, if any.
    #[must_use]
    pub fn line(&self, product_id: ProductId, variant: Option<&ShoeSize>) -> Option<&CartLine> {
        self.lines
            .iter()
            .find(|line| line.matches(product_id, variant))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add one unit of `item`.
    pub fn add_item(&mut self, item: NewCartLine) {
        self.add_item_with_quantity(item, 1);
    }

    /// Add `quantity` units of `item` and open the preview.
    ///
    /// Merges into the existing line for the same product and size. A
    /// quantity of 0 adds a single unit.
    pub fn add_item_with_quantity(&mut self, item: NewCartLine, quantity: u32) {
        let quantity = quantity.max(1);
        let product_id = item.product_id.to_string();
        let added = quantity.to_string();
        crate::error::add_breadcrumb(
            "cart",
            "Added item to cart",
            Some(&[("product_id", product_id.as_str()), ("quantity", added.as_str())]),
        );

        merge_into(&mut self.lines, CartLine::new(item, quantity));
        self.is_preview_open = true;
        self.flush();
    }

    /// Set the quantity of a line; `quantity <= 0` removes it.
    ///
    /// Does nothing to the lines when no line matches.
    pub fn update_quantity(&mut self, product_id: ProductId, variant: Option<&ShoeSize>, quantity: i64) {
        if quantity <= 0 {
            self.lines.retain(|line| !line.matches(product_id, variant));
        } else if let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| line.matches(product_id, variant))
        {
            line.set_quantity(u32::try_from(quantity).unwrap_or(u32::MAX));
        }
        self.flush();
    }

    /// Remove the line with identity `(product_id, variant)`, if present.
    pub fn remove_item(&mut self, product_id: ProductId, variant: Option<&ShoeSize>) {
        self.lines.retain(|line| !line.matches(product_id, variant));
        self.flush();
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.flush();
    }

    #[must_use]
    pub const fn is_preview_open(&self) -> bool {
        self.is_preview_open
    }

    pub fn open_preview(&mut self) {
        self.is_preview_open = true;
    }

    pub fn close_preview(&mut self) {
        self.is_preview_open = false;
    }

    /// Sum of line quantities.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity())).sum()
    }

    /// Sum of unit price times quantity over all lines.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Write the current lines to storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the lines cannot be encoded or written.
    pub fn persist(&self) -> Result<(), StorageError> {
        let raw = encode_lines(&self.lines)?;
        self.store.set(keys::CART, &raw)
    }

    fn flush(&self) {
        if let Err(e) = self.persist() {
            tracing::warn!(error = %e, lines = self.lines.len(), "Failed to persist cart");
        }
    }
}
