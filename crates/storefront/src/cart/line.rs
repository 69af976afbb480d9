//! Cart line items.

use floa_core::{Price, ProductId, ShoeSize};
use rust_decimal::Decimal;

/// A product the customer wants to add to the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCartLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub image: Option<String>,
    /// Chosen size; `None` when the product has no size distinction.
    pub variant: Option<ShoeSize>,
}

/// One row of the cart: a product and size at a given quantity.
///
/// Two lines are the same line when their product id and variant match
/// (two `None` variants match). The cart never holds two lines with the
/// same identity, and quantities are always at least 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    product_id: ProductId,
    name: String,
    unit_price: Price,
    image: Option<String>,
    variant: Option<ShoeSize>,
    quantity: u32,
}

impl CartLine {
    pub(crate) fn new(item: NewCartLine, quantity: u32) -> Self {
        Self {
            product_id: item.product_id,
            name: item.name,
            unit_price: item.unit_price,
            image: item.image,
            variant: item.variant,
            quantity: quantity.max(1),
        }
    }

    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn unit_price(&self) -> Price {
        self.unit_price
    }

    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    #[must_use]
    pub const fn variant(&self) -> Option<&ShoeSize> {
        self.variant.as_ref()
    }

    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price.times(self.quantity)
    }

    /// Whether this line has the identity `(product_id, variant)`.
    #[must_use]
    pub fn matches(&self, product_id: ProductId, variant: Option<&ShoeSize>) -> bool {
        self.product_id == product_id && self.variant.as_ref() == variant
    }

    pub(crate) fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity.max(1);
    }

    pub(crate) fn increase(&mut self, by: u32) {
        self.quantity = self.quantity.saturating_add(by);
    }
}

/// Add `line` to `lines`, merging quantities into an existing line with the
/// same identity instead of appending a duplicate.
pub(crate) fn merge_into(lines: &mut Vec<CartLine>, line: CartLine) {
    match lines
        .iter_mut()
        .find(|existing| existing.matches(line.product_id, line.variant.as_ref()))
    {
        Some(existing) => existing.increase(line.quantity),
        None => lines.push(line),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: i64, size: Option<&str>) -> NewCartLine {
        NewCartLine {
            product_id: ProductId::new(id),
            name: "FLOA Bloom".to_string(),
            unit_price: Price::new(Decimal::new(12900, 2)).unwrap(),
            image: None,
            variant: size.map(|s| ShoeSize::parse(s).unwrap()),
        }
    }

    #[test]
    fn test_identity_includes_variant() {
        let line = CartLine::new(item(1, Some("38")), 1);
        let size_38 = ShoeSize::parse("38").unwrap();
        let size_39 = ShoeSize::parse("39").unwrap();

        assert!(line.matches(ProductId::new(1), Some(&size_38)));
        assert!(!line.matches(ProductId::new(1), Some(&size_39)));
        assert!(!line.matches(ProductId::new(1), None));
        assert!(!line.matches(ProductId::new(2), Some(&size_38)));
    }

    #[test]
    fn test_no_variant_matches_no_variant() {
        let line = CartLine::new(item(1, None), 1);
        assert!(line.matches(ProductId::new(1), None));
    }

    #[test]
    fn test_quantity_never_below_one() {
        let mut line = CartLine::new(item(1, None), 0);
        assert_eq!(line.quantity(), 1);
        line.set_quantity(0);
        assert_eq!(line.quantity(), 1);
    }

    #[test]
    fn test_merge_into_sums_and_saturates() {
        let mut lines = Vec::new();
        merge_into(&mut lines, CartLine::new(item(1, Some("38")), 2));
        merge_into(&mut lines, CartLine::new(item(1, Some("39")), 1));
        merge_into(&mut lines, CartLine::new(item(1, Some("38")), u32::MAX));

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].quantity(), u32::MAX);
        assert_eq!(lines[1].quantity(), 1);
    }
}
