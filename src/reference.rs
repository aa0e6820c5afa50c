//! Reference price sources.
//!
//! A source yields one row of raw cell strings; parsing and skipping bad cells
//! happens later in [`crate::listing::ReferencePriceSet::scan`].

use crate::config::ReferenceConfig;
use crate::listing::ReferencePriceSet;
use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::PathBuf;
use tracing::debug;

/// Reads one row of reference prices - enables swapping the spreadsheet in tests.
pub trait ReferenceSource: Send + Sync {
    /// Returns the row's cells as displayed text.
    fn read_row(&self) -> Result<ReferencePriceSet>;

    /// Human-readable origin for the run log.
    fn describe(&self) -> String;
}

/// Builds the source described by the configuration.
pub fn from_config(config: &ReferenceConfig) -> Result<Box<dyn ReferenceSource>> {
    if !config.prices.is_empty() {
        return Ok(Box::new(InlinePrices::new(config.prices.clone())));
    }

    let path = config
        .path
        .clone()
        .context("No reference prices configured: set reference.path or reference.prices")?;

    Ok(Box::new(SpreadsheetSource::new(path, config.sheet.clone(), config.row)))
}

/// One row of a worksheet in an xlsx/xls/ods workbook.
#[derive(Debug, Clone)]
pub struct SpreadsheetSource {
    path: PathBuf,
    sheet: String,
    row: usize,
}

impl SpreadsheetSource {
    pub fn new(path: impl Into<PathBuf>, sheet: impl Into<String>, row: usize) -> Self {
        Self { path: path.into(), sheet: sheet.into(), row }
    }
}

impl ReferenceSource for SpreadsheetSource {
    fn read_row(&self) -> Result<ReferencePriceSet> {
        debug!("Opening workbook: {}", self.path.display());

        let mut workbook = open_workbook_auto(&self.path)
            .with_context(|| format!("Failed to open workbook: {}", self.path.display()))?;

        let range = workbook
            .worksheet_range(&self.sheet)
            .with_context(|| format!("Failed to read sheet '{}'", self.sheet))?;

        let row = range
            .rows()
            .nth(self.row)
            .with_context(|| format!("Sheet '{}' has no row {}", self.sheet, self.row))?;

        let cells = row
            .iter()
            .filter(|cell| !matches!(cell, Data::Empty))
            .map(|cell| cell.to_string())
            .collect();

        Ok(ReferencePriceSet::new(cells))
    }

    fn describe(&self) -> String {
        format!("{} [{}] row {}", self.path.display(), self.sheet, self.row)
    }
}

/// Prices given directly in configuration.
#[derive(Debug, Clone)]
pub struct InlinePrices {
    cells: Vec<String>,
}

impl InlinePrices {
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }
}

impl ReferenceSource for InlinePrices {
    fn read_row(&self) -> Result<ReferencePriceSet> {
        Ok(ReferencePriceSet::new(self.cells.clone()))
    }

    fn describe(&self) -> String {
        "inline configuration".to_string()
    }
}
