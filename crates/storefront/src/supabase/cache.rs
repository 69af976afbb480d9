//! Cache types for catalog reads.

use std::sync::Arc;

use floa_core::ProductId;

use super::types::{ProductColourRow, ProductRow};

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Products,
    Product(ProductId),
    ProductColours,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(Arc<Vec<ProductRow>>),
    Product(Box<ProductRow>),
    ProductColours(Arc<Vec<ProductColourRow>>),
}
