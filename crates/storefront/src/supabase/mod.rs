//! Supabase PostgREST client.
//!
//! # Architecture
//!
//! - Plain `reqwest` calls against `{SUPABASE_URL}/rest/v1/{table}`
//! - Every request carries the anon key as `apikey` and bearer token
//! - Catalog reads are cached in memory via `moka` (TTL from config)
//! - Profile reads are never cached: the admin flag must be current
//!
//! # Tables
//!
//! - `product` - catalog rows
//! - `product_colour` - product/colour join, embedded `colour:colour_id(name)`
//! - `profiles` - one row per user, `{id, is_admin}`

mod cache;
mod client;
pub mod types;

pub use client::SupabaseClient;
pub use types::{ColourName, ProductColourRow, ProductRow, ProfileRow};

use thiserror::Error;

/// Errors that can occur when talking to Supabase.
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The request URL could not be built.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// PostgREST answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}
