//! Two-tier element lookup for result listings.
//!
//! Each field has a primary rule and at most one fallback. A fault from the
//! driver on the primary rule (missing element, stale page, unsupported
//! locator) moves on to the fallback exactly once; if that also fails the
//! listing is reported as [`ShopError::ElementNotFound`] and the caller skips
//! it.

use crate::browser::{Browser, Locator};
use crate::error::{ShopError, ShopResult};
use crate::listing::selectors::{Field, FieldRules};
use std::future::Future;
use tracing::{debug, trace};

/// Text found for a listing, along with the rule that found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located<T> {
    pub value: T,
    pub rule: String,
}

/// Ordered lookup rules for one logical field.
#[derive(Debug, Clone)]
pub struct LocatorStrategy {
    field: Field,
    rules: FieldRules,
}

impl LocatorStrategy {
    pub fn new(field: Field, rules: FieldRules) -> Self {
        Self { field, rules }
    }

    pub fn field(&self) -> Field {
        self.field
    }

    /// Names of the rules, in attempt order.
    pub fn rule_names(&self) -> Vec<String> {
        self.rules.ordered().map(|rule| rule.name.clone()).collect()
    }

    /// Reads the field's text for the listing at `ordinal` (1-based).
    pub async fn locate_text(
        &self,
        browser: &(impl Browser + ?Sized),
        ordinal: usize,
    ) -> ShopResult<Located<String>> {
        self.first_success(ordinal, move |locator| async move { browser.text(&locator).await }).await
    }

    /// Clicks the field's element for the listing at `ordinal`.
    pub async fn click(
        &self,
        browser: &(impl Browser + ?Sized),
        ordinal: usize,
    ) -> ShopResult<Located<()>> {
        self.first_success(ordinal, move |locator| async move { browser.click(&locator).await }).await
    }

    /// Checks that the field's element exists for `ordinal` without touching it.
    pub async fn locate_element(
        &self,
        browser: &(impl Browser + ?Sized),
        ordinal: usize,
    ) -> ShopResult<Located<()>> {
        self.first_success(ordinal, move |locator| async move {
            let found = browser.count(&locator).await?;
            anyhow::ensure!(found > 0, "Element not found: {}", locator);
            Ok::<_, anyhow::Error>(())
        })
        .await
    }

    async fn first_success<T, F, Fut>(&self, ordinal: usize, mut attempt: F) -> ShopResult<Located<T>>
    where
        F: FnMut(Locator) -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let mut tried = Vec::new();

        for rule in self.rules.ordered() {
            let locator = rule.for_ordinal(ordinal);
            trace!("Listing {} {}: trying {} ({})", ordinal, self.field, rule.name, locator);

            match attempt(locator).await {
                Ok(value) => {
                    debug!("Listing {} {} resolved by {}", ordinal, self.field, rule.name);
                    return Ok(Located { value, rule: rule.name.clone() });
                }
                Err(e) => {
                    debug!("Listing {} {}: {} failed: {}", ordinal, self.field, rule.name, e);
                    tried.push(rule.name.clone());
                }
            }
        }

        Err(ShopError::ElementNotFound { field: self.field, ordinal, tried })
    }
}
