//! Browser automation seam.
//!
//! The workflow only talks to [`Browser`]; production runs use the WebDriver
//! backend, tests and offline locator checks use the snapshot backend.

pub mod locator;
pub mod snapshot;
pub mod webdriver;

#[cfg(test)]
pub(crate) mod testing;

use anyhow::Result;
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

pub use locator::{Locator, LocatorKind, LocatorRule};
pub use snapshot::SnapshotBrowser;
pub use webdriver::WebDriverBrowser;

/// Driver primitives the shopping workflow needs - enables mocking for tests.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Loads a URL in the active browsing context.
    async fn goto(&self, url: &str) -> Result<()>;

    /// Returns the title of the active page.
    async fn title(&self) -> Result<String>;

    /// Returns the visible text of the first match.
    async fn text(&self, locator: &Locator) -> Result<String>;

    /// Counts the elements matching a locator.
    async fn count(&self, locator: &Locator) -> Result<usize>;

    /// Clicks the first match.
    async fn click(&self, locator: &Locator) -> Result<()>;

    /// Types text into the first match.
    async fn type_text(&self, locator: &Locator, text: &str) -> Result<()>;

    /// Presses Enter in the first match.
    async fn submit(&self, locator: &Locator) -> Result<()>;

    /// Captures the active browsing context as PNG bytes.
    async fn screenshot(&self) -> Result<Vec<u8>>;

    /// Moves focus to the most recently opened window or tab.
    async fn switch_to_new_window(&self) -> Result<()>;

    /// Ends the session and releases the browser.
    async fn close(&self) -> Result<()>;
}

/// Polls until at least `min` elements match or `timeout` elapses.
///
/// Returns the final count on success. Driver faults during polling are
/// treated as "not there yet".
pub async fn wait_for_count(
    browser: &(impl Browser + ?Sized),
    locator: &Locator,
    min: usize,
    timeout: Duration,
    poll: Duration,
) -> Result<usize> {
    let deadline = Instant::now() + timeout;

    loop {
        match browser.count(locator).await {
            Ok(found) if found >= min => {
                debug!("{} matched {} element(s)", locator, found);
                return Ok(found);
            }
            Ok(found) => trace!("{} matched {} of {} element(s)", locator, found, min),
            Err(e) => trace!("Polling {} failed: {}", locator, e),
        }

        if Instant::now() >= deadline {
            anyhow::bail!(
                "Timed out after {}ms waiting for {} element(s) matching {}",
                timeout.as_millis(),
                min,
                locator
            );
        }

        tokio::time::sleep(poll).await;
    }
}
