//! Core types for Tangelo Market.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod id;
pub mod pricing;
pub mod status;

pub use cart::{CartLine, CartSnapshot, NewCartItem};
pub use id::*;
pub use pricing::PricingRules;
pub use status::{CartMode, SyncStatus};
