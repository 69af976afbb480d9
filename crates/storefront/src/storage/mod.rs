//! Local key-value storage.
//!
//! Every component that persists client state (cart, identity hints,
//! favorites, cookie consent) writes JSON values under its own key in a
//! shared [`KeyValueStore`]. Reads go through [`Stored::validate`], which
//! turns whatever is on disk into either a validated value or an explicit
//! "use the default" result, so malformed data never reaches callers.

mod file;
mod memory;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Storage keys used by the storefront.
pub mod keys {
    /// Cart line collection.
    pub const CART: &str = "floa-cart";

    /// Last known email of the logged-in user.
    pub const USER_EMAIL: &str = "floa-user-email";

    /// Present (as `true`) while the logged-in user is an admin.
    pub const IS_ADMIN: &str = "floa-is-admin";

    /// Favorited product ids.
    pub const FAVORITES: &str = "favorites";

    /// Cookie consent choice and when it was made.
    pub const COOKIE_CONSENT: &str = "floa-cookie-consent";
}

/// Errors raised by a [`KeyValueStore`].
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be encoded.
    #[error("storage encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    /// A writer panicked while holding the store lock.
    #[error("storage lock poisoned")]
    Poisoned,
}

/// A string-keyed store of JSON-encoded values.
///
/// Implementations are internally synchronized so a single store can be
/// shared between the cart and the session projector.
pub trait KeyValueStore: Send + Sync {
    /// Get the raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Shared handle to the storefront's key-value store.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Why a stored value was not used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Nothing is stored under the key.
    Missing,
    /// The store itself could not be read.
    Unreadable(String),
    /// The value is not valid JSON.
    Unparseable(String),
    /// The value is JSON but not of the expected shape.
    WrongShape(&'static str),
    /// The value is well-formed but no longer fresh.
    Expired,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("missing"),
            Self::Unreadable(e) => write!(f, "unreadable: {e}"),
            Self::Unparseable(e) => write!(f, "unparseable: {e}"),
            Self::WrongShape(expected) => write!(f, "expected {expected}"),
            Self::Expired => f.write_str("expired"),
        }
    }
}

/// Outcome of validating a stored value.
#[derive(Debug, Clone, PartialEq)]
pub enum Validated<T> {
    /// The value passed validation (possibly after coercion).
    Valid(T),
    /// The value must be ignored and the default used instead.
    UseDefault(Rejection),
}

impl<T> Validated<T> {
    /// Convert into an `Option`, dropping the rejection reason.
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Valid(value) => Some(value),
            Self::UseDefault(_) => None,
        }
    }

    /// Return the validated value or `T::default()`.
    pub fn unwrap_or_default(self) -> T
    where
        T: Default,
    {
        self.into_option().unwrap_or_default()
    }
}

/// A value with a defined storage representation.
pub trait Stored: Sized {
    /// Validate a raw stored string.
    fn validate(raw: &str) -> Validated<Self>;

    /// Encode for storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialized.
    fn encode(&self) -> Result<String, StorageError>;
}

/// Validate a value whose stored form is plain serde JSON.
pub fn validate_json<T: DeserializeOwned>(raw: &str, expected: &'static str) -> Validated<T> {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => return Validated::UseDefault(Rejection::Unparseable(e.to_string())),
    };
    serde_json::from_value(value).map_or(
        Validated::UseDefault(Rejection::WrongShape(expected)),
        Validated::Valid,
    )
}

/// Encode a value as JSON.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn encode_json<T: Serialize + ?Sized>(value: &T) -> Result<String, StorageError> {
    Ok(serde_json::to_string(value)?)
}

/// Load and validate the value under `key`.
///
/// Rejections other than [`Rejection::Missing`] are logged; the caller
/// decides what the default is.
pub fn load<T: Stored>(store: &dyn KeyValueStore, key: &str) -> Validated<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Validated::UseDefault(Rejection::Missing),
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to read stored value");
            return Validated::UseDefault(Rejection::Unreadable(e.to_string()));
        }
    };

    let validated = T::validate(&raw);
    if let Validated::UseDefault(rejection) = &validated {
        tracing::warn!(key, %rejection, "Ignoring stored value");
    }
    validated
}

/// Encode `value` and store it under `key`.
///
/// # Errors
///
/// Returns an error if encoding or writing fails.
pub fn save<T: Stored>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<(), StorageError> {
    store.set(key, &value.encode()?)
}
