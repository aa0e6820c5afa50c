//! WebDriver backend built on fantoccini.

use super::{Browser, Locator, LocatorKind};
use crate::config::Config;
use crate::error::ShopError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder};
use serde_json::json;
use tracing::{debug, info, warn};

/// WebDriver code point for the Enter key.
const ENTER_KEY: &str = "\u{E007}";

/// A live browser session behind a WebDriver server.
pub struct WebDriverBrowser {
    client: Client,
}

impl WebDriverBrowser {
    /// Starts a session on the configured WebDriver endpoint.
    pub async fn connect(config: &Config) -> Result<Self, ShopError> {
        info!("Connecting to WebDriver at {}", config.webdriver_url);

        let mut capabilities = serde_json::Map::new();
        if config.headless {
            capabilities.insert(
                "goog:chromeOptions".to_string(),
                json!({ "args": ["--headless=new", "--window-size=1920,1080"] }),
            );
            capabilities.insert("moz:firefoxOptions".to_string(), json!({ "args": ["-headless"] }));
        }

        let mut builder = ClientBuilder::native();
        builder.capabilities(capabilities);

        let client = builder.connect(&config.webdriver_url).await.map_err(|e| {
            ShopError::Environment(format!(
                "could not start a browser session at {}: {}",
                config.webdriver_url, e
            ))
        })?;

        if !config.headless {
            if let Err(e) = client.maximize_window().await {
                debug!("Could not maximize window: {}", e);
            }
        }

        Ok(Self { client })
    }

    fn to_driver(locator: &Locator) -> fantoccini::Locator<'_> {
        match locator.by {
            LocatorKind::Css => fantoccini::Locator::Css(&locator.value),
            LocatorKind::Xpath => fantoccini::Locator::XPath(&locator.value),
            LocatorKind::Id => fantoccini::Locator::Id(&locator.value),
        }
    }

    async fn find(&self, locator: &Locator) -> Result<fantoccini::elements::Element> {
        self.client
            .find(Self::to_driver(locator))
            .await
            .with_context(|| format!("Element not found: {}", locator))
    }
}

#[async_trait]
impl Browser for WebDriverBrowser {
    async fn goto(&self, url: &str) -> Result<()> {
        debug!("GET {}", url);
        self.client.goto(url).await.with_context(|| format!("Failed to navigate to {}", url))
    }

    async fn title(&self) -> Result<String> {
        self.client.title().await.context("Failed to read page title")
    }

    async fn text(&self, locator: &Locator) -> Result<String> {
        let element = self.find(locator).await?;
        element.text().await.with_context(|| format!("Failed to read text of {}", locator))
    }

    async fn count(&self, locator: &Locator) -> Result<usize> {
        let elements = self
            .client
            .find_all(Self::to_driver(locator))
            .await
            .with_context(|| format!("Failed to query {}", locator))?;
        Ok(elements.len())
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        let element = self.find(locator).await?;
        element.click().await.with_context(|| format!("Failed to click {}", locator))
    }

    async fn type_text(&self, locator: &Locator, text: &str) -> Result<()> {
        let element = self.find(locator).await?;
        element.send_keys(text).await.with_context(|| format!("Failed to type into {}", locator))
    }

    async fn submit(&self, locator: &Locator) -> Result<()> {
        let element = self.find(locator).await?;
        element
            .send_keys(ENTER_KEY)
            .await
            .with_context(|| format!("Failed to press Enter in {}", locator))
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.client.screenshot().await.context("Failed to capture screenshot")
    }

    async fn switch_to_new_window(&self) -> Result<()> {
        let current = self.client.window().await.context("Failed to read current window")?;
        let handles = self.client.windows().await.context("Failed to list windows")?;

        let Some(target) = handles.into_iter().rev().find(|handle| *handle != current) else {
            anyhow::bail!("No new window was opened");
        };

        self.client.switch_to_window(target).await.context("Failed to switch window")
    }

    async fn close(&self) -> Result<()> {
        if let Err(e) = self.client.clone().close().await {
            warn!("Error closing WebDriver session: {}", e);
            return Err(e).context("Failed to close WebDriver session");
        }
        Ok(())
    }
}
