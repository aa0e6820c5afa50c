//! Purchase threshold derivation and the qualifying-price test.

use crate::error::{ShopError, ShopResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Absorbs binary representation error (2499.99 * 100 = 249998.99999999997)
/// before flooring to whole cents.
const CENT_TOLERANCE: f64 = 1e-6;

/// Floors a value to two decimal places. Never returns more than `value`.
pub fn floor_to_cents(value: f64) -> f64 {
    let corrected = (value * 100.0 + CENT_TOLERANCE).floor() / 100.0;
    if corrected > value {
        (value * 100.0).floor() / 100.0
    } else {
        corrected
    }
}

/// Returns the lowest price floored to cents.
pub fn compute_threshold(prices: &[f64]) -> ShopResult<f64> {
    let mut tracker = ThresholdTracker::new();
    for &price in prices {
        tracker.observe(price);
    }
    tracker.threshold().map(PurchaseThreshold::value)
}

/// True iff `price` is strictly below `threshold`.
pub fn qualifies(price: f64, threshold: f64) -> bool {
    price < threshold
}

/// Running minimum kept while reference cells are scanned one by one.
#[derive(Debug, Clone, Default)]
pub struct ThresholdTracker {
    lowest: Option<f64>,
    observed: usize,
}

impl ThresholdTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one parsed reference price into the running minimum.
    pub fn observe(&mut self, price: f64) {
        self.observed += 1;
        self.lowest = Some(match self.lowest {
            Some(lowest) if lowest <= price => lowest,
            _ => price,
        });
    }

    /// Current lowest value, before flooring.
    pub fn lowest(&self) -> Option<f64> {
        self.lowest
    }

    pub fn observed(&self) -> usize {
        self.observed
    }

    /// Finishes the scan. Fails with [`ShopError::EmptyInput`] if nothing was observed.
    pub fn threshold(&self) -> ShopResult<PurchaseThreshold> {
        self.lowest.map(|lowest| PurchaseThreshold(floor_to_cents(lowest))).ok_or(ShopError::EmptyInput)
    }
}

/// The deal threshold for one run. Computed once, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PurchaseThreshold(f64);

impl PurchaseThreshold {
    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for PurchaseThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}
