//! Offline browser that replays saved HTML pages.
//!
//! Lookups run through scraper CSS selectors against the stored markup, so
//! locator rules can be checked against captured pages without a live
//! WebDriver. XPath locators are reported as driver faults.

use super::{Browser, Locator, LocatorKind};
use anyhow::{Context, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

/// Facts about the first element a locator matched.
struct Matched {
    text: String,
    href: Option<String>,
    opens_new_window: bool,
}

struct Windows {
    urls: Vec<String>,
    active: usize,
}

/// Serves a fixed set of pages keyed by URL.
pub struct SnapshotBrowser {
    pages: HashMap<String, String>,
    search_results_url: Option<String>,
    windows: Mutex<Windows>,
}

impl SnapshotBrowser {
    /// Creates an empty browser with one blank window.
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            search_results_url: None,
            windows: Mutex::new(Windows { urls: vec!["about:blank".to_string()], active: 0 }),
        }
    }

    /// Registers the markup served for `url`.
    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    /// Registers a page read from disk.
    pub fn with_page_file(self, url: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let html = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
        Ok(self.with_page(url, html))
    }

    /// URL loaded when a search box is submitted.
    pub fn with_search_results(mut self, url: impl Into<String>) -> Self {
        self.search_results_url = Some(url.into());
        self
    }

    /// Opens a browser already showing `url`.
    pub fn showing(mut self, url: impl Into<String>) -> Self {
        self.windows = Mutex::new(Windows { urls: vec![url.into()], active: 0 });
        self
    }

    fn current_url(&self) -> Result<String> {
        let windows = self.windows.lock().map_err(|_| anyhow::anyhow!("Window state poisoned"))?;
        Ok(windows.urls[windows.active].clone())
    }

    fn current_html(&self) -> Result<&str> {
        let url = self.current_url()?;
        self.pages
            .get(&url)
            .map(String::as_str)
            .with_context(|| format!("No snapshot loaded for {}", url))
    }

    fn selector_for(locator: &Locator) -> Result<Selector> {
        let css = match locator.by {
            LocatorKind::Css => locator.value.clone(),
            LocatorKind::Id => format!("#{}", locator.value),
            LocatorKind::Xpath => {
                anyhow::bail!("XPath is not supported by the snapshot browser: {}", locator)
            }
        };
        Selector::parse(&css).map_err(|e| anyhow::anyhow!("Invalid selector {}: {:?}", locator, e))
    }

    fn select_all(&self, locator: &Locator) -> Result<Vec<Matched>> {
        let selector = Self::selector_for(locator)?;
        let document = Html::parse_document(self.current_html()?);

        Ok(document
            .select(&selector)
            .map(|element| Matched {
                text: collapse_whitespace(element.text()),
                href: element.value().attr("href").map(String::from),
                opens_new_window: element.value().attr("target") == Some("_blank"),
            })
            .collect())
    }

    fn select_first(&self, locator: &Locator) -> Result<Matched> {
        self.select_all(locator)?
            .into_iter()
            .next()
            .with_context(|| format!("Element not found: {}", locator))
    }

    fn navigate(&self, url: String, new_window: bool) -> Result<()> {
        let mut windows = self.windows.lock().map_err(|_| anyhow::anyhow!("Window state poisoned"))?;
        if new_window {
            windows.urls.push(url);
        } else {
            let active = windows.active;
            windows.urls[active] = url;
        }
        Ok(())
    }
}

/// Joins text nodes and squeezes runs of whitespace the way a rendered page shows them.
fn collapse_whitespace<'a>(fragments: impl Iterator<Item = &'a str>) -> String {
    fragments.flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}

impl Default for SnapshotBrowser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Browser for SnapshotBrowser {
    async fn goto(&self, url: &str) -> Result<()> {
        if !self.pages.contains_key(url) {
            anyhow::bail!("No snapshot loaded for {}", url);
        }
        self.navigate(url.to_string(), false)
    }

    async fn title(&self) -> Result<String> {
        let document = Html::parse_document(self.current_html()?);
        let selector = Selector::parse("title").map_err(|e| anyhow::anyhow!("{:?}", e))?;
        Ok(document
            .select(&selector)
            .next()
            .map(|e| e.text().collect::<String>().trim().to_string())
            .unwrap_or_default())
    }

    async fn text(&self, locator: &Locator) -> Result<String> {
        Ok(self.select_first(locator)?.text)
    }

    async fn count(&self, locator: &Locator) -> Result<usize> {
        Ok(self.select_all(locator)?.len())
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        let matched = self.select_first(locator)?;
        let Some(href) = matched.href else {
            debug!("Clicked {} (no navigation)", locator);
            return Ok(());
        };
        debug!("Clicked {} -> {}", locator, href);
        self.navigate(href, matched.opens_new_window)
    }

    async fn type_text(&self, locator: &Locator, text: &str) -> Result<()> {
        self.select_first(locator)?;
        debug!("Typed {:?} into {}", text, locator);
        Ok(())
    }

    async fn submit(&self, locator: &Locator) -> Result<()> {
        self.select_first(locator)?;
        let url = self
            .search_results_url
            .clone()
            .context("No search results snapshot configured")?;
        self.navigate(url, false)
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        anyhow::bail!("Snapshot pages cannot be rendered to an image")
    }

    async fn switch_to_new_window(&self) -> Result<()> {
        let mut windows = self.windows.lock().map_err(|_| anyhow::anyhow!("Window state poisoned"))?;
        let newest = windows.urls.len() - 1;
        if newest == windows.active {
            anyhow::bail!("No new window was opened");
        }
        windows.active = newest;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let mut windows = self.windows.lock().map_err(|_| anyhow::anyhow!("Window state poisoned"))?;
        windows.urls = vec!["about:blank".to_string()];
        windows.active = 0;
        Ok(())
    }
}
