//! Session lifecycle for one run.

use crate::browser::Browser;
use crate::pricing::PurchaseThreshold;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// Where a run is in its lifecycle. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Uninitialized,
    Initialized,
    PricesLoaded,
    Searched,
    Evaluated,
    Purchased,
    NoDealFound,
    Closed,
}

impl Stage {
    /// Returns true if moving from `self` to `next` is a legal forward step.
    pub fn can_advance_to(self, next: Stage) -> bool {
        match (self, next) {
            // Terminal outcomes are alternatives, not a sequence
            (Stage::Purchased, Stage::NoDealFound) => false,
            _ => next > self,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Uninitialized => "uninitialized",
            Stage::Initialized => "initialized",
            Stage::PricesLoaded => "prices loaded",
            Stage::Searched => "searched",
            Stage::Evaluated => "evaluated",
            Stage::Purchased => "purchased",
            Stage::NoDealFound => "no deal found",
            Stage::Closed => "closed",
        };
        write!(f, "{}", name)
    }
}

/// Exclusive owner of the browser for one run.
pub struct WorkflowSession<B: Browser> {
    browser: B,
    stage: Stage,
    threshold: Option<PurchaseThreshold>,
}

impl<B: Browser> WorkflowSession<B> {
    /// Takes ownership of a freshly started browser.
    pub fn open(browser: B) -> Self {
        Self { browser, stage: Stage::Uninitialized, threshold: None }
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Threshold derived in step 2, if the run got that far.
    pub fn threshold(&self) -> Option<PurchaseThreshold> {
        self.threshold
    }

    /// Keeps the run's threshold and moves to [`Stage::PricesLoaded`].
    /// The first threshold stays; it is never replaced.
    pub fn prices_loaded(&mut self, threshold: PurchaseThreshold) {
        if self.threshold.is_none() {
            self.threshold = Some(threshold);
        }
        self.advance(Stage::PricesLoaded);
    }

    /// Moves the session forward; backward or repeated moves are ignored.
    pub fn advance(&mut self, next: Stage) {
        if self.stage.can_advance_to(next) {
            debug!("Session: {} -> {}", self.stage, next);
            self.stage = next;
        } else {
            warn!("Ignoring session transition {} -> {}", self.stage, next);
        }
    }

    /// Releases the browser. Consumes the session so it runs exactly once.
    pub async fn close(mut self) -> Stage {
        if let Err(e) = self.browser.close().await {
            warn!("Browser did not shut down cleanly: {}", e);
        }
        self.advance(Stage::Closed);
        info!("Step 5: Closed all open windows and ended the browser session");
        self.stage
    }
}
