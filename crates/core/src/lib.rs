//! FLOA Core - Shared types library.
//!
//! This crate provides the domain types used across the FLOA storefront:
//! - `storefront` - Cart, session and catalog state for the client
//! - `integration-tests` - Cross-component tests
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no storage
//! access, no HTTP clients. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails and shoe sizes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
