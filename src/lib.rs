//! deal-hunter - Buys the first search listing priced below a reference price
//!
//! Drives a storefront through WebDriver: loads reference prices, searches,
//! walks the first result listings and opens the first one that is cheaper
//! than every reference price.

pub mod artifacts;
pub mod browser;
pub mod commands;
pub mod config;
pub mod error;
pub mod format;
pub mod listing;
pub mod pricing;
pub mod reference;
pub mod workflow;

pub use browser::{Browser, Locator, SnapshotBrowser, WebDriverBrowser};
pub use config::Config;
pub use error::{ShopError, ShopResult};
pub use pricing::{compute_threshold, parse_price, qualifies};
pub use workflow::{Outcome, RunReport, ShoppingWorkflow};
