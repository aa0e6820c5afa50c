//! Locator check against a saved results page.

use crate::browser::{Browser, SnapshotBrowser};
use crate::config::Config;
use crate::format::Formatter;
use crate::listing::selectors::Field;
use crate::listing::LocatorStrategy;
use crate::pricing::parse_price;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// How one field resolved for one listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FieldMatch {
    Found { rule: String, text: Option<String> },
    Missing { tried: Vec<String> },
}

impl FieldMatch {
    pub fn rule(&self) -> Option<&str> {
        match self {
            FieldMatch::Found { rule, .. } => Some(rule.as_str()),
            FieldMatch::Missing { .. } => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            FieldMatch::Found { text, .. } => text.as_deref(),
            FieldMatch::Missing { .. } => None,
        }
    }
}

/// Lookup results for one listing position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingCheck {
    pub ordinal: usize,
    pub price: FieldMatch,
    /// Price text parsed as an amount, when it is a valid price
    pub parsed_price: Option<f64>,
    pub title: FieldMatch,
    pub link: FieldMatch,
}

/// Runs the configured lookup rules against a page without a live browser.
pub struct LocateCommand {
    config: Config,
}

impl LocateCommand {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Checks the first `max` listings of a saved HTML page.
    pub async fn execute(&self, file: &Path, max: usize) -> Result<String> {
        let url = format!("file://{}", file.display());
        let browser = SnapshotBrowser::new()
            .with_page_file(url.clone(), file)
            .context("Failed to load results page")?
            .showing(url);

        let checks = self.check(&browser, max).await;
        info!("Checked {} listing(s) in {}", checks.len(), file.display());

        let formatter = Formatter::new(self.config.format);
        Ok(formatter.format_locator_checks(&checks))
    }

    /// Resolves price, title and link for ordinals `1..=max`.
    pub async fn check(&self, browser: &(impl Browser + ?Sized), max: usize) -> Vec<ListingCheck> {
        let locators = &self.config.locators;
        let price = LocatorStrategy::new(Field::Price, locators.price.clone());
        let title = LocatorStrategy::new(Field::Title, locators.title.clone());
        let link = LocatorStrategy::new(Field::Link, locators.link.clone());

        let mut checks = Vec::with_capacity(max);
        for ordinal in 1..=max {
            let price_match = text_match(&price, browser, ordinal).await;
            let parsed_price = price_match.text().and_then(|text| parse_price(text).ok());

            let link_match = match link.locate_element(browser, ordinal).await {
                Ok(located) => FieldMatch::Found { rule: located.rule, text: None },
                Err(_) => FieldMatch::Missing { tried: link.rule_names() },
            };

            checks.push(ListingCheck {
                ordinal,
                price: price_match,
                parsed_price,
                title: text_match(&title, browser, ordinal).await,
                link: link_match,
            });
        }
        checks
    }
}

async fn text_match(
    strategy: &LocatorStrategy,
    browser: &(impl Browser + ?Sized),
    ordinal: usize,
) -> FieldMatch {
    match strategy.locate_text(browser, ordinal).await {
        Ok(located) => FieldMatch::Found { rule: located.rule, text: Some(located.value) },
        Err(_) => FieldMatch::Missing { tried: strategy.rule_names() },
    }
}
