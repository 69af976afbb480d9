//! Listing filters and sort order.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use super::{Product, ProductColours};

/// Names matching this are kids' models, whatever else they contain.
static KIDS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(kid|junior|child|enfant|youth)").expect("Invalid regex")
});

/// Audience a product is made for, derived from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    Women,
    Men,
    Unisex,
    Kids,
}

impl Gender {
    /// Classify a product name.
    ///
    /// "women" is checked before "men" since it contains it.
    #[must_use]
    pub fn of_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        if KIDS_RE.is_match(&lower) {
            Self::Kids
        } else if lower.contains("women") {
            Self::Women
        } else if lower.contains("men") {
            Self::Men
        } else {
            Self::Unisex
        }
    }

    /// Parse a `category` URL parameter. `None` means all categories.
    #[must_use]
    pub fn from_category(category: &str) -> Option<Self> {
        match category {
            "women" => Some(Self::Women),
            "men" => Some(Self::Men),
            "unisex" => Some(Self::Unisex),
            "kids" => Some(Self::Kids),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Women => "women",
            Self::Men => "men",
            Self::Unisex => "unisex",
            Self::Kids => "kids",
        }
    }
}

/// Price ranges offered in the filter panel. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceBand {
    UpTo100,
    From100To200,
    From200To300,
    From300,
}

impl PriceBand {
    pub const ALL: [Self; 4] = [
        Self::UpTo100,
        Self::From100To200,
        Self::From200To300,
        Self::From300,
    ];

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|band| band.as_str() == value)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UpTo100 => "0-100",
            Self::From100To200 => "100-200",
            Self::From200To300 => "200-300",
            Self::From300 => "300+",
        }
    }

    /// Lower and optional upper bound.
    #[must_use]
    pub fn bounds(self) -> (Decimal, Option<Decimal>) {
        let hundred = Decimal::ONE_HUNDRED;
        match self {
            Self::UpTo100 => (Decimal::ZERO, Some(hundred)),
            Self::From100To200 => (hundred, Some(hundred * Decimal::TWO)),
            Self::From200To300 => (hundred * Decimal::TWO, Some(hundred * Decimal::from(3))),
            Self::From300 => (hundred * Decimal::from(3), None),
        }
    }

    #[must_use]
    pub fn contains(self, amount: Decimal) -> bool {
        let (min, max) = self.bounds();
        amount >= min && max.is_none_or(|max| amount <= max)
    }
}

/// Listing order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortMode {
    /// As returned by the catalog.
    #[default]
    Default,
    /// Highest product id first.
    Newest,
}

impl SortMode {
    /// Parse a `sort` URL parameter.
    #[must_use]
    pub fn from_param(sort: &str) -> Self {
        match sort {
            "new" | "newest" => Self::Newest,
            _ => Self::Default,
        }
    }
}

/// What the shopper asked the listing to show.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    /// `None` shows every audience.
    pub gender: Option<Gender>,
    /// Colour name, compared case-insensitively.
    pub colour: Option<String>,
    pub price: Option<PriceBand>,
    /// Free text matched against product names.
    pub search: String,
    pub sort: SortMode,
    /// Promo view: filters are bypassed and a random pick is shown.
    pub promo: bool,
}

impl CatalogQuery {
    /// Build a query from the listing's URL parameters.
    ///
    /// Unknown categories fall back to all; `promo` must be exactly `true`.
    #[must_use]
    pub fn from_params(category: Option<&str>, promo: Option<&str>, sort: Option<&str>) -> Self {
        Self {
            gender: category.and_then(Gender::from_category),
            promo: promo == Some("true"),
            sort: sort.map(SortMode::from_param).unwrap_or_default(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_colour(mut self, colour: impl Into<String>) -> Self {
        let colour = colour.into();
        self.colour = (!colour.trim().is_empty() && colour != "all").then_some(colour);
        self
    }

    #[must_use]
    pub const fn with_price_band(mut self, band: PriceBand) -> Self {
        self.price = Some(band);
        self
    }

    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// Reset gender, colour and price filters, and leave promo view.
    pub fn clear_filters(&mut self) {
        self.gender = None;
        self.colour = None;
        self.price = None;
        self.promo = false;
        self.sort = SortMode::Default;
    }

    /// Whether `product` passes every filter.
    #[must_use]
    pub fn matches(&self, product: &Product, colours: &ProductColours) -> bool {
        if self
            .gender
            .is_some_and(|gender| Gender::of_name(&product.name) != gender)
        {
            return false;
        }

        if let Some(wanted) = &self.colour {
            let wanted = wanted.to_lowercase();
            if !colours
                .for_product(product.id)
                .iter()
                .any(|colour| colour.to_lowercase() == wanted)
            {
                return false;
            }
        }

        if self
            .price
            .is_some_and(|band| !band.contains(product.price.amount()))
        {
            return false;
        }

        let search = self.search.trim().to_lowercase();
        search.is_empty() || product.name.to_lowercase().contains(&search)
    }

    /// Filter and order `products`.
    #[must_use]
    pub fn apply<'a>(&self, products: &'a [Product], colours: &ProductColours) -> Vec<&'a Product> {
        let mut result: Vec<&Product> = products
            .iter()
            .filter(|product| self.matches(product, colours))
            .collect();
        if self.sort == SortMode::Newest {
            result.sort_by(|a, b| b.id.cmp(&a.id));
        }
        result
    }
}
