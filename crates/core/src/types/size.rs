//! Shoe sizes, the only variant dimension in the catalog.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Sizes offered on every product page (EU sizing).
pub const SHOE_SIZES: [&str; 12] = [
    "35.5", "36", "37", "37.5", "38", "38.5", "39", "40", "40.5", "41", "42", "42.5",
];

/// Errors that can occur when parsing a [`ShoeSize`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SizeError {
    /// Blank sizes carry no variant information.
    #[error("size cannot be empty")]
    Empty,
}

/// A chosen shoe size.
///
/// Stored as the label the customer picked, so sizes outside
/// [`SHOE_SIZES`] (legacy carts, other ranges) still round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShoeSize(String);

impl ShoeSize {
    /// Parse a size label, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`SizeError::Empty`] for blank input.
    pub fn parse(label: &str) -> Result<Self, SizeError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(SizeError::Empty);
        }
        Ok(Self(label.to_owned()))
    }

    /// The size label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this size is part of the standard range.
    #[must_use]
    pub fn is_standard(&self) -> bool {
        SHOE_SIZES.contains(&self.0.as_str())
    }
}

impl fmt::Display for ShoeSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ShoeSize {
    type Error = SizeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ShoeSize> for String {
    fn from(size: ShoeSize) -> Self {
        size.0
    }
}
