//! Error taxonomy for the shopping run.
//!
//! Only [`ShopError::Environment`] aborts a run outright. Everything else is
//! caught at the narrowest scope (one cell, one ordinal, one artifact) and
//! logged before the workflow moves on.

use crate::listing::selectors::Field;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the decision engine and its collaborators.
#[derive(Debug, Error)]
pub enum ShopError {
    /// Browser could not be started or the storefront is not what we expect.
    #[error("environment error: {0}")]
    Environment(String),

    /// Text is not a price in the supported `$1,234.56` format.
    #[error("invalid price format: {input:?}")]
    Format { input: String },

    /// Neither lookup rule found the element for this listing.
    #[error("no {field} element for listing {ordinal} (tried: {})", .tried.join(", "))]
    ElementNotFound { field: Field, ordinal: usize, tried: Vec<String> },

    /// A single driver action failed (typing, clicking, capturing).
    #[error("{action} failed: {reason}")]
    Interaction { action: String, reason: String },

    /// Artifact could not be written to disk.
    #[error("failed to write artifact {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No reference price survived parsing.
    #[error("no reference prices could be parsed")]
    EmptyInput,
}

impl ShopError {
    pub fn format(input: impl Into<String>) -> Self {
        Self::Format { input: input.into() }
    }

    pub fn interaction(action: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Interaction { action: action.into(), reason: reason.to_string() }
    }

    /// Returns true if this error ends the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Environment(_) | Self::EmptyInput)
    }
}

pub type ShopResult<T> = std::result::Result<T, ShopError>;
