//! FLOA Storefront library.
//!
//! Client-side state for the FLOA sneaker storefront. Persistence goes to a
//! local key-value store; authentication and catalog data live in Supabase.
//!
//! # Architecture
//!
//! - [`storage`] - Key-value store abstraction with schema validation at the boundary
//! - [`cart`] - Cart lines, write-through persistence and derived totals
//! - [`session`] - Auth session projection, profile lookup and route guard
//! - [`catalog`] - Product listing, filters and size selection
//! - [`favorites`], [`consent`], [`checkout`] - Smaller pieces of page state
//! - [`supabase`] - PostgREST client for catalog and profile tables
//! - [`app`] - The owning root that wires everything together
//! - [`config`], [`telemetry`], [`error`] - Environment config, tracing/Sentry setup, error types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod consent;
pub mod error;
pub mod favorites;
pub mod session;
pub mod storage;
pub mod supabase;
pub mod telemetry;

pub use app::Storefront;
pub use error::{Result, StorefrontError};
