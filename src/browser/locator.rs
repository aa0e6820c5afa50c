//! Element locators and named, ordinal-parametrized lookup rules.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder replaced by the 1-based listing position.
pub const ORDINAL_PLACEHOLDER: &str = "{n}";

/// How a locator value is interpreted by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocatorKind {
    Css,
    Xpath,
    Id,
}

impl fmt::Display for LocatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocatorKind::Css => write!(f, "css"),
            LocatorKind::Xpath => write!(f, "xpath"),
            LocatorKind::Id => write!(f, "id"),
        }
    }
}

/// A concrete element query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    pub by: LocatorKind,
    pub value: String,
}

impl Locator {
    pub fn css(value: impl Into<String>) -> Self {
        Self { by: LocatorKind::Css, value: value.into() }
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Self { by: LocatorKind::Xpath, value: value.into() }
    }

    pub fn id(value: impl Into<String>) -> Self {
        Self { by: LocatorKind::Id, value: value.into() }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.by, self.value)
    }
}

/// A named lookup rule whose value may contain `{n}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorRule {
    pub name: String,
    pub by: LocatorKind,
    pub value: String,
}

impl LocatorRule {
    pub fn new(name: impl Into<String>, by: LocatorKind, value: impl Into<String>) -> Self {
        Self { name: name.into(), by, value: value.into() }
    }

    pub fn css(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, LocatorKind::Css, value)
    }

    /// Resolves the rule for one listing position.
    pub fn for_ordinal(&self, ordinal: usize) -> Locator {
        Locator {
            by: self.by,
            value: self.value.replace(ORDINAL_PLACEHOLDER, &ordinal.to_string()),
        }
    }
}
