//! Product page state: size choice before adding to the cart.

use thiserror::Error;

use floa_core::ShoeSize;

use super::Product;
use crate::cart::{CartStore, NewCartLine};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("select a size first")]
    MissingSize,
}

/// A message shown on the product page until dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
}

impl From<SelectionError> for Notice {
    fn from(err: SelectionError) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

/// A product and the size the shopper picked for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSelection {
    product: Product,
    size: Option<ShoeSize>,
    notice: Option<Notice>,
}

impl ProductSelection {
    #[must_use]
    pub const fn new(product: Product) -> Self {
        Self {
            product,
            size: None,
            notice: None,
        }
    }

    #[must_use]
    pub const fn product(&self) -> &Product {
        &self.product
    }

    #[must_use]
    pub const fn size(&self) -> Option<&ShoeSize> {
        self.size.as_ref()
    }

    /// Pick a size. Clears any pending notice.
    pub fn select_size(&mut self, size: ShoeSize) {
        self.size = Some(size);
        self.notice = None;
    }

    #[must_use]
    pub const fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// The cart item for the current choice.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::MissingSize`] and raises a notice if no size
    /// has been picked.
    pub fn cart_item(&mut self) -> Result<NewCartLine, SelectionError> {
        let Some(size) = self.size.clone() else {
            self.notice = Some(SelectionError::MissingSize.into());
            return Err(SelectionError::MissingSize);
        };
        Ok(NewCartLine {
            product_id: self.product.id,
            name: self.product.name.clone(),
            unit_price: self.product.price,
            image: self.product.hero_image.clone(),
            variant: Some(size),
        })
    }

    /// Add one unit of the current choice to `cart`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::cart_item`]; the cart is left untouched.
    pub fn add_to_cart(&mut self, cart: &mut CartStore) -> Result<(), SelectionError> {
        cart.add_item(self.cart_item()?);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use floa_core::{Price, ProductId, SHOE_SIZES};
    use rust_decimal::Decimal;

    use super::*;
    use crate::storage::MemoryStore;

    fn selection() -> ProductSelection {
        ProductSelection::new(Product {
            id: ProductId::new(3),
            name: "Petal Runner Women".to_string(),
            price: Price::new(Decimal::new(12_900, 2)).unwrap(),
            hero_image: Some("https://cdn.floa.shop/3.jpg".to_string()),
        })
    }

    #[test]
    fn test_missing_size_raises_notice() {
        let mut selection = selection();
        let mut cart = CartStore::hydrate(Arc::new(MemoryStore::new()));

        assert_eq!(
            selection.add_to_cart(&mut cart),
            Err(SelectionError::MissingSize)
        );
        assert!(cart.is_empty());
        assert!(selection.notice().is_some());

        selection.dismiss_notice();
        assert_eq!(selection.notice(), None);
    }

    #[test]
    fn test_selected_size_reaches_cart() {
        let mut selection = selection();
        let mut cart = CartStore::hydrate(Arc::new(MemoryStore::new()));
        let size = ShoeSize::parse(SHOE_SIZES[3]).unwrap();

        assert!(selection.cart_item().is_err());
        selection.select_size(size.clone());
        assert_eq!(selection.notice(), None);

        selection.add_to_cart(&mut cart).unwrap();
        let line = cart.line(ProductId::new(3), Some(&size)).unwrap();
        assert_eq!(line.quantity(), 1);
        assert_eq!(line.image(), Some("https://cdn.floa.shop/3.jpg"));
    }
}
