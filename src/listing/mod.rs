//! Search-result listings: lookup rules, the two-tier strategy, and models.

pub mod models;
pub mod selectors;
pub mod strategy;

pub use models::{CandidateListing, ReferencePriceSet};
pub use selectors::{Field, FieldRules};
pub use strategy::{Located, LocatorStrategy};
