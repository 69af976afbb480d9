//! Checkout wizard state.
//!
//! The wizard walks through five steps and prices the order from the cart.
//! Nothing is submitted anywhere; the confirmation step only summarizes.

use rust_decimal::Decimal;

use crate::cart::CartStore;

/// Express delivery price, in catalog currency.
pub const EXPRESS_SHIPPING: Decimal = Decimal::from_parts(19, 0, 0, false, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckoutStep {
    Information,
    Delivery,
    Payment,
    Billing,
    Confirmation,
}

impl CheckoutStep {
    pub const ALL: [Self; 5] = [
        Self::Information,
        Self::Delivery,
        Self::Payment,
        Self::Billing,
        Self::Confirmation,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Information => 0,
            Self::Delivery => 1,
            Self::Payment => 2,
            Self::Billing => 3,
            Self::Confirmation => 4,
        }
    }

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeliveryOption {
    /// Free, four to six working days.
    #[default]
    Standard,
    /// Next day.
    Express,
}

impl DeliveryOption {
    #[must_use]
    pub const fn shipping_cost(self) -> Decimal {
        match self {
            Self::Standard => Decimal::ZERO,
            Self::Express => EXPRESS_SHIPPING,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PaymentMethod {
    #[default]
    Card,
    PayPal,
    ApplePay,
}

/// What the shopper typed into the wizard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub delivery: DeliveryOption,
    pub payment: PaymentMethod,
    pub card_name: String,
    pub card_number: String,
    pub billing_address: String,
    pub billing_city: String,
    pub billing_postal_code: String,
    pub notes: String,
}

/// Order amounts shown beside every step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderSummary {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Checkout {
    step: usize,
    pub form: CheckoutForm,
}

impl Checkout {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn step(&self) -> CheckoutStep {
        CheckoutStep::from_index(self.step).unwrap_or(CheckoutStep::Information)
    }

    /// Advance one step, staying on the last.
    pub fn next(&mut self) -> CheckoutStep {
        self.step = (self.step + 1).min(CheckoutStep::ALL.len() - 1);
        self.step()
    }

    /// Go back one step, staying on the first.
    pub fn previous(&mut self) -> CheckoutStep {
        self.step = self.step.saturating_sub(1);
        self.step()
    }

    /// Jump to the step at `index`; out-of-range indexes are ignored.
    pub fn go_to(&mut self, index: usize) -> CheckoutStep {
        if index < CheckoutStep::ALL.len() {
            self.step = index;
        }
        self.step()
    }

    #[must_use]
    pub fn summary(&self, cart: &CartStore) -> OrderSummary {
        let subtotal = cart.total_price();
        let shipping = self.form.delivery.shipping_cost();
        OrderSummary {
            subtotal,
            shipping,
            total: subtotal + shipping,
        }
    }

    /// Checkout needs something to buy.
    #[must_use]
    pub fn can_proceed(cart: &CartStore) -> bool {
        !cart.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use floa_core::{Price, ProductId};

    use super::*;
    use crate::cart::NewCartLine;
    use crate::storage::MemoryStore;

    #[test]
    fn test_step_navigation_clamps() {
        let mut checkout = Checkout::new();
        assert_eq!(checkout.step(), CheckoutStep::Information);
        assert_eq!(checkout.previous(), CheckoutStep::Information);

        assert_eq!(checkout.next(), CheckoutStep::Delivery);
        assert_eq!(checkout.go_to(4), CheckoutStep::Confirmation);
        assert_eq!(checkout.next(), CheckoutStep::Confirmation);

        assert_eq!(checkout.go_to(5), CheckoutStep::Confirmation);
        assert_eq!(checkout.go_to(2), CheckoutStep::Payment);
        assert_eq!(checkout.previous(), CheckoutStep::Delivery);
        assert_eq!(CheckoutStep::Billing.index(), 3);
    }

    #[test]
    fn test_summary_with_shipping() {
        let mut cart = CartStore::hydrate(Arc::new(MemoryStore::new()));
        let mut checkout = Checkout::new();
        assert!(!Checkout::can_proceed(&cart));

        cart.add_item_with_quantity(
            NewCartLine {
                product_id: ProductId::new(1),
                name: "Bloom".to_string(),
                unit_price: Price::new(Decimal::new(4_950, 2)).unwrap(),
                image: None,
                variant: None,
            },
            2,
        );
        assert!(Checkout::can_proceed(&cart));

        let summary = checkout.summary(&cart);
        assert_eq!(summary.subtotal, Decimal::new(99, 0));
        assert_eq!(summary.shipping, Decimal::ZERO);
        assert_eq!(summary.total, Decimal::new(99, 0));

        checkout.form.delivery = DeliveryOption::Express;
        let summary = checkout.summary(&cart);
        assert_eq!(summary.shipping, Decimal::new(19, 0));
        assert_eq!(summary.total, Decimal::new(118, 0));
    }
}
