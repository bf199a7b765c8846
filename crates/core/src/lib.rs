//! Tangelo Core - Shared types library.
//!
//! This crate provides common types used across all Tangelo Market
//! components:
//! - `storefront` - Public-facing e-commerce site and cart state core
//! - `integration-tests` - Workspace integration tests
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. This keeps it lightweight and allows
//! it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, cart lines and snapshots, pricing rules, and
//!   cart/sync status enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
