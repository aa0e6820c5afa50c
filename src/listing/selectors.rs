//! Lookup rules for the storefront's search and result pages.
//!
//! This file contains every default locator the workflow uses. Update it when
//! the storefront changes its markup.
//!
//! **Update process**: when a listing field stops resolving, save the results
//! page, run `deal-hunter locate <file>` against it, adjust the rules here and
//! add the page as a test fixture.

use crate::browser::{Locator, LocatorRule};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical piece of a search-result listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Price,
    Title,
    Link,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Price => write!(f, "price"),
            Field::Title => write!(f, "title"),
            Field::Link => write!(f, "link"),
        }
    }
}

/// A primary rule and at most one fallback for a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRules {
    pub primary: LocatorRule,
    #[serde(default)]
    pub fallback: Option<LocatorRule>,
}

impl FieldRules {
    pub fn new(primary: LocatorRule, fallback: Option<LocatorRule>) -> Self {
        Self { primary, fallback }
    }

    /// Rules in the order they are attempted.
    pub fn ordered(&self) -> impl Iterator<Item = &LocatorRule> {
        std::iter::once(&self.primary).chain(self.fallback.as_ref())
    }
}

/// Search entry box on the storefront landing page.
pub fn search_box() -> Locator {
    Locator::id("gh-ac")
}

/// Every listing row on the results page.
pub fn result_rows() -> Locator {
    Locator::css("ul.srp-results > li")
}

/// Price text of the listing at position `{n}`.
///
/// Most rows use the classic item layout; some render as cards with the
/// price one container deeper.
pub fn price_strategy() -> FieldRules {
    FieldRules::new(
        LocatorRule::css("item-price", "ul.srp-results > li:nth-child({n}) .s-item__price"),
        Some(LocatorRule::css("card-price", "ul.srp-results > li:nth-child({n}) .s-card__price")),
    )
}

/// Listing title.
pub fn title_strategy() -> FieldRules {
    FieldRules::new(
        LocatorRule::css("item-title", "ul.srp-results > li:nth-child({n}) .s-item__title"),
        Some(LocatorRule::css("card-title", "ul.srp-results > li:nth-child({n}) .s-card__title")),
    )
}

/// Product link clicked through on purchase.
pub fn link_strategy() -> FieldRules {
    FieldRules::new(
        LocatorRule::css("item-link", "ul.srp-results > li:nth-child({n}) a.s-item__link"),
        Some(LocatorRule::css("card-link", "ul.srp-results > li:nth-child({n}) .s-card a")),
    )
}
