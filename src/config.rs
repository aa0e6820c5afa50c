//! Configuration management with TOML, environment variables, and CLI overrides.

use crate::browser::Locator;
use crate::listing::selectors::{self, FieldRules};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Storefront landing page
    #[serde(default = "default_storefront_url")]
    pub storefront_url: String,

    /// Title the landing page must have before the run continues
    #[serde(default = "default_expected_title")]
    pub expected_title: String,

    /// Search query submitted on the storefront
    #[serde(default = "default_query")]
    pub query: String,

    /// Number of result listings inspected
    #[serde(default = "default_max_listings")]
    pub max_listings: usize,

    /// WebDriver server (chromedriver, geckodriver, ...)
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Run the browser without a window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// How long to wait for search results to render
    #[serde(default = "default_results_timeout_ms")]
    pub results_timeout_ms: u64,

    /// Polling interval while waiting for results
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Directory screenshots are written to
    #[serde(default = "default_screenshot_dir")]
    pub screenshot_dir: PathBuf,

    /// Run report format
    #[serde(default)]
    pub format: OutputFormat,

    /// Where reference prices come from
    #[serde(default)]
    pub reference: ReferenceConfig,

    /// Element lookup rules
    #[serde(default)]
    pub locators: LocatorConfig,
}

fn default_storefront_url() -> String {
    "http://www.ebay.com/".to_string()
}

fn default_expected_title() -> String {
    "Electronics, Cars, Fashion, Collectibles & More | eBay".to_string()
}

fn default_query() -> String {
    "Canon camera eos 5d mark iv".to_string()
}

fn default_max_listings() -> usize {
    5
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_headless() -> bool {
    true
}

fn default_results_timeout_ms() -> u64 {
    5000
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_screenshot_dir() -> PathBuf {
    PathBuf::from("screenshots")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storefront_url: default_storefront_url(),
            expected_title: default_expected_title(),
            query: default_query(),
            max_listings: default_max_listings(),
            webdriver_url: default_webdriver_url(),
            headless: default_headless(),
            results_timeout_ms: default_results_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            screenshot_dir: default_screenshot_dir(),
            format: OutputFormat::Text,
            reference: ReferenceConfig::default(),
            locators: LocatorConfig::default(),
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("deal-hunter.toml");
        if local_config.exists() {
            debug!("Found deal-hunter.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("deal-hunter").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(url) = std::env::var("DEAL_WEBDRIVER_URL") {
            self.webdriver_url = url;
        }

        if let Ok(dir) = std::env::var("DEAL_SCREENSHOT_DIR") {
            self.screenshot_dir = PathBuf::from(dir);
        }

        if let Ok(query) = std::env::var("DEAL_QUERY") {
            if !query.trim().is_empty() {
                self.query = query;
            }
        }

        if let Ok(headless) = std::env::var("DEAL_HEADLESS") {
            if let Ok(h) = headless.parse() {
                self.headless = h;
            }
        }

        self
    }

    pub fn results_timeout(&self) -> Duration {
        Duration::from_millis(self.results_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Source of the reference price row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceConfig {
    /// Spreadsheet file (xlsx, xls, ods)
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Worksheet name
    #[serde(default = "default_sheet")]
    pub sheet: String,

    /// Zero-based row within the sheet's used range
    #[serde(default)]
    pub row: usize,

    /// Inline prices; used instead of the spreadsheet when non-empty
    #[serde(default)]
    pub prices: Vec<String>,
}

fn default_sheet() -> String {
    "canon".to_string()
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self { path: None, sheet: default_sheet(), row: 0, prices: Vec::new() }
    }
}

/// Element lookup rules, defaulting to [`crate::listing::selectors`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocatorConfig {
    #[serde(default = "selectors::search_box")]
    pub search_box: Locator,

    #[serde(default = "selectors::result_rows")]
    pub results: Locator,

    #[serde(default = "selectors::price_strategy")]
    pub price: FieldRules,

    #[serde(default = "selectors::title_strategy")]
    pub title: FieldRules,

    #[serde(default = "selectors::link_strategy")]
    pub link: FieldRules,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            search_box: selectors::search_box(),
            results: selectors::result_rows(),
            price: selectors::price_strategy(),
            title: selectors::title_strategy(),
            link: selectors::link_strategy(),
        }
    }
}

/// Output format for the run report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(format!("Unknown format: {}. Use: text, json, markdown", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}
