//! What a run did, step by step.

use crate::artifacts::Artifact;
use crate::listing::CandidateListing;
use crate::workflow::session::Stage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// The five workflow steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    Initialize,
    LoadReferencePrices,
    Search,
    EvaluateAndPurchase,
    Finalize,
}

impl Step {
    /// 1-based position of the step in a run.
    pub fn number(&self) -> usize {
        match self {
            Step::Initialize => 1,
            Step::LoadReferencePrices => 2,
            Step::Search => 3,
            Step::EvaluateAndPurchase => 4,
            Step::Finalize => 5,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Initialize => "Initialize",
            Step::LoadReferencePrices => "Load reference prices",
            Step::Search => "Search",
            Step::EvaluateAndPurchase => "Evaluate and purchase",
            Step::Finalize => "Finalize",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum StepStatus {
    Completed,
    Failed(String),
    Skipped(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: Step,
    #[serde(flatten)]
    pub status: StepStatus,
}

/// How the run ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Outcome {
    /// A listing below the threshold was opened.
    Purchased {
        ordinal: usize,
        price: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        page_title: Option<String>,
    },
    /// Every inspected listing was at or above the threshold.
    NoDealFound,
    /// A fatal error stopped the run before evaluation finished.
    Aborted { reason: String },
}

impl Outcome {
    pub fn is_aborted(&self) -> bool {
        matches!(self, Outcome::Aborted { .. })
    }
}

/// Full account of one run, rendered by [`crate::format::Formatter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub query: String,
    pub storefront: String,
    pub steps: Vec<StepRecord>,
    /// Reference cells as read, before parsing
    pub reference_prices: Vec<String>,
    /// Reference cells that were not valid prices
    pub rejected: Vec<String>,
    pub threshold: Option<f64>,
    /// Title of the page shown after submitting the search
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results_title: Option<String>,
    pub listings: Vec<CandidateListing>,
    pub outcome: Outcome,
    pub artifacts: Vec<Artifact>,
    pub final_stage: Stage,
    pub screenshot_dir: PathBuf,
}

impl RunReport {
    pub fn new(query: impl Into<String>, storefront: impl Into<String>, screenshot_dir: PathBuf) -> Self {
        Self {
            query: query.into(),
            storefront: storefront.into(),
            steps: Vec::new(),
            reference_prices: Vec::new(),
            rejected: Vec::new(),
            threshold: None,
            results_title: None,
            listings: Vec::new(),
            outcome: Outcome::NoDealFound,
            artifacts: Vec::new(),
            final_stage: Stage::Uninitialized,
            screenshot_dir,
        }
    }

    pub fn completed(&mut self, step: Step) {
        self.steps.push(StepRecord { step, status: StepStatus::Completed });
    }

    pub fn failed(&mut self, step: Step, reason: impl Into<String>) {
        self.steps.push(StepRecord { step, status: StepStatus::Failed(reason.into()) });
    }

    pub fn skipped(&mut self, step: Step, reason: impl Into<String>) {
        self.steps.push(StepRecord { step, status: StepStatus::Skipped(reason.into()) });
    }

    /// Ends the run early. The first abort reason wins.
    pub fn abort(&mut self, reason: impl Into<String>) {
        if !self.outcome.is_aborted() {
            self.outcome = Outcome::Aborted { reason: reason.into() };
        }
    }

    pub fn status_of(&self, step: Step) -> Option<&StepStatus> {
        self.steps.iter().find(|record| record.step == step).map(|record| &record.status)
    }

    /// Listing that was bought, if any.
    pub fn purchased(&self) -> Option<&CandidateListing> {
        match &self.outcome {
            Outcome::Purchased { ordinal, .. } => {
                self.listings.iter().find(|listing| listing.ordinal == *ordinal)
            }
            _ => None,
        }
    }
}
