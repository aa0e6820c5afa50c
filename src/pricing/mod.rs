//! Price normalization and the deal threshold.

pub mod parser;
pub mod threshold;

pub use parser::parse_price;
pub use threshold::{compute_threshold, qualifies, PurchaseThreshold, ThresholdTracker};
