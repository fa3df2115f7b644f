//! Destination sizing
//!
//! Quote planning for newly allocated destination volumes.

pub mod quote;

pub use quote::{build_quote_request, capacity_tier, InheritedPerformance, QuoteEngine};
