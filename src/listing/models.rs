//! Data models for reference prices and evaluated listings.

use crate::error::ShopError;
use crate::pricing::{parse_price, ThresholdTracker};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One row of raw reference prices, in sheet order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferencePriceSet {
    pub cells: Vec<String>,
}

/// Outcome of scanning a reference row.
#[derive(Debug, Clone)]
pub struct ParsedReferences {
    pub tracker: ThresholdTracker,
    pub rejected: Vec<String>,
}

impl ReferencePriceSet {
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Parses every cell, folding successes into a running minimum.
    ///
    /// Unparseable cells are logged and collected in `rejected`; they never
    /// stop the scan.
    pub fn scan(&self) -> ParsedReferences {
        let mut tracker = ThresholdTracker::new();
        let mut rejected = Vec::new();

        for cell in &self.cells {
            match parse_price(cell) {
                Ok(price) => tracker.observe(price),
                Err(e) => {
                    warn!("Skipping reference price: {}", e);
                    rejected.push(cell.clone());
                }
            }
        }

        ParsedReferences { tracker, rejected }
    }
}

/// One search-result position as seen during evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateListing {
    /// 1-based position on the results page
    pub ordinal: usize,
    /// Price text as displayed, if it could be found
    pub raw_price: Option<String>,
    /// Parsed price, if the text was a valid price
    pub price: Option<f64>,
    /// Whether the price is strictly below the threshold
    pub qualifies: bool,
    /// Rule that found the price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_rule: Option<String>,
    /// Why the listing could not be evaluated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
}

impl CandidateListing {
    /// A listing whose price element could not be located.
    pub fn unlocated(ordinal: usize, reason: &ShopError) -> Self {
        Self {
            ordinal,
            raw_price: None,
            price: None,
            qualifies: false,
            matched_rule: None,
            skipped: Some(reason.to_string()),
        }
    }

    /// A listing with price text, parsed and checked against `threshold`.
    pub fn evaluate(ordinal: usize, raw: String, rule: String, threshold: f64) -> Self {
        match parse_price(&raw) {
            Ok(price) => Self {
                ordinal,
                raw_price: Some(raw),
                price: Some(price),
                qualifies: crate::pricing::qualifies(price, threshold),
                matched_rule: Some(rule),
                skipped: None,
            },
            Err(e) => Self {
                ordinal,
                raw_price: Some(raw),
                price: None,
                qualifies: false,
                matched_rule: Some(rule),
                skipped: Some(e.to_string()),
            },
        }
    }

    pub fn was_evaluated(&self) -> bool {
        self.price.is_some()
    }
}
