//! Output formatting for run reports and locator checks (text, JSON, markdown).

use crate::commands::locate::{FieldMatch, ListingCheck};
use crate::config::OutputFormat;
use crate::listing::CandidateListing;
use crate::workflow::{Outcome, RunReport, StepStatus};

const TITLE_WIDTH: usize = 50;

/// Formats reports for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the account of one run.
    pub fn format_report(&self, report: &RunReport) -> String {
        match self.format {
            OutputFormat::Json => self.json_report(report),
            OutputFormat::Text => self.text_report(report),
            OutputFormat::Markdown => self.markdown_report(report),
        }
    }

    /// Formats the result of `locate`.
    pub fn format_locator_checks(&self, checks: &[ListingCheck]) -> String {
        if checks.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                _ => "No listings checked.".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => self.json_checks(checks),
            OutputFormat::Text => self.text_checks(checks),
            OutputFormat::Markdown => self.markdown_checks(checks),
        }
    }

    // JSON formatting

    fn json_report(&self, report: &RunReport) -> String {
        serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
    }

    fn json_checks(&self, checks: &[ListingCheck]) -> String {
        serde_json::to_string_pretty(checks).unwrap_or_else(|_| "[]".to_string())
    }

    // Text formatting

    fn text_report(&self, report: &RunReport) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Query:       {}", report.query));
        lines.push(format!("Storefront:  {}", report.storefront));
        lines.push(String::new());

        for record in &report.steps {
            lines.push(format!(
                "Step {}: {:<24} {}",
                record.step.number(),
                record.step.to_string(),
                status_text(&record.status)
            ));
        }
        lines.push(String::new());

        if !report.reference_prices.is_empty() {
            lines.push(format!("Reference prices: {}", report.reference_prices.join(", ")));
        }
        if !report.rejected.is_empty() {
            lines.push(format!("Rejected:         {}", report.rejected.join(", ")));
        }
        if let Some(threshold) = report.threshold {
            lines.push(format!("Lowest Expected Price: ${:.2}", threshold));
        }
        if let Some(title) = &report.results_title {
            lines.push(format!("Results page:     {}", title));
        }

        if !report.listings.is_empty() {
            let rule_width = 12;
            let price_width = 14;

            lines.push(String::new());
            lines.push(format!("{:<7}  {:<price_width$}  {:<rule_width$}  {}", "Listing", "Price", "Rule", "Result"));
            lines.push(format!("{:-<7}  {:-<price_width$}  {:-<rule_width$}  {:-<20}", "", "", "", ""));

            for listing in &report.listings {
                lines.push(format!(
                    "{:<7}  {:<price_width$}  {:<rule_width$}  {}",
                    listing.ordinal,
                    listing.raw_price.as_deref().unwrap_or("N/A"),
                    listing.matched_rule.as_deref().unwrap_or("-"),
                    listing_result(listing)
                ));
            }
        }

        lines.push(String::new());
        lines.push(format!("Outcome: {}", outcome_text(&report.outcome)));
        if let Outcome::Purchased { page_title: Some(page_title), .. } = &report.outcome {
            lines.push(format!("Listing page: {}", page_title));
        }

        if !report.artifacts.is_empty() {
            lines.push(format!("Screenshots ({}):", report.screenshot_dir.display()));
            for artifact in &report.artifacts {
                lines.push(format!("  {:<16} {}", artifact.checkpoint.to_string(), artifact.path.display()));
            }
        }

        lines.push(format!("Session: {}", report.final_stage));

        lines.join("\n")
    }

    fn text_checks(&self, checks: &[ListingCheck]) -> String {
        let title_width = TITLE_WIDTH;
        let mut lines = Vec::new();

        lines.push(format!(
            "{:<7}  {:<14}  {:<12}  {:>10}  {:<12}  {:<10}  {}",
            "Listing", "Price", "Price rule", "Parsed", "Title rule", "Link rule", "Title"
        ));
        lines.push(format!(
            "{:-<7}  {:-<14}  {:-<12}  {:->10}  {:-<12}  {:-<10}  {:-<title_width$}",
            "", "", "", "", "", "", ""
        ));

        for check in checks {
            lines.push(format!(
                "{:<7}  {:<14}  {:<12}  {:>10}  {:<12}  {:<10}  {}",
                check.ordinal,
                check.price.text().unwrap_or("N/A"),
                rule_text(&check.price),
                check.parsed_price.map(|p| format!("{:.2}", p)).unwrap_or_else(|| "-".to_string()),
                rule_text(&check.title),
                rule_text(&check.link),
                truncate(check.title.text().unwrap_or(""), title_width)
            ));
        }

        let resolved = checks.iter().filter(|c| c.parsed_price.is_some()).count();
        lines.push(String::new());
        lines.push(format!("{} of {} listings have a usable price", resolved, checks.len()));

        lines.join("\n")
    }

    // Markdown formatting

    fn markdown_report(&self, report: &RunReport) -> String {
        let mut lines = Vec::new();

        lines.push(format!("## {}", report.query));
        lines.push(String::new());
        lines.push(format!("- **Storefront:** {}", report.storefront));
        if let Some(threshold) = report.threshold {
            lines.push(format!("- **Lowest expected price:** ${:.2}", threshold));
        }
        if !report.rejected.is_empty() {
            lines.push(format!("- **Rejected reference cells:** {}", report.rejected.join(", ")));
        }
        lines.push(format!("- **Outcome:** {}", outcome_text(&report.outcome)));
        lines.push(String::new());

        lines.push("| Step | Status |".to_string());
        lines.push("|------|--------|".to_string());
        for record in &report.steps {
            lines.push(format!(
                "| {}. {} | {} |",
                record.step.number(),
                record.step,
                status_text(&record.status)
            ));
        }

        if !report.listings.is_empty() {
            lines.push(String::new());
            lines.push("| Listing | Price | Rule | Result |".to_string());
            lines.push("|---------|-------|------|--------|".to_string());
            for listing in &report.listings {
                lines.push(format!(
                    "| {} | {} | {} | {} |",
                    listing.ordinal,
                    listing.raw_price.as_deref().unwrap_or("N/A"),
                    listing.matched_rule.as_deref().unwrap_or("-"),
                    listing_result(listing)
                ));
            }
        }

        if !report.artifacts.is_empty() {
            lines.push(String::new());
            for artifact in &report.artifacts {
                lines.push(format!("- ![{}]({})", artifact.checkpoint, artifact.path.display()));
            }
        }

        lines.join("\n")
    }

    fn markdown_checks(&self, checks: &[ListingCheck]) -> String {
        let mut lines = Vec::new();

        lines.push("| Listing | Price | Price rule | Title rule | Link rule | Title |".to_string());
        lines.push("|---------|-------|------------|------------|-----------|-------|".to_string());

        for check in checks {
            lines.push(format!(
                "| {} | {} | {} | {} | {} | {} |",
                check.ordinal,
                check.price.text().unwrap_or("N/A"),
                rule_text(&check.price),
                rule_text(&check.title),
                rule_text(&check.link),
                truncate(check.title.text().unwrap_or(""), 40)
            ));
        }

        lines.join("\n")
    }
}

fn status_text(status: &StepStatus) -> String {
    match status {
        StepStatus::Completed => "completed".to_string(),
        StepStatus::Failed(reason) => format!("failed: {}", reason),
        StepStatus::Skipped(reason) => format!("skipped: {}", reason),
    }
}

fn outcome_text(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Purchased { ordinal, price, title, .. } => match title {
            Some(title) => format!("Bought listing {} at ${:.2} ({})", ordinal, price, title),
            None => format!("Bought listing {} at ${:.2}", ordinal, price),
        },
        Outcome::NoDealFound => "No listing below the lowest expected price".to_string(),
        Outcome::Aborted { reason } => format!("Aborted: {}", reason),
    }
}

fn listing_result(listing: &CandidateListing) -> String {
    match (listing.price, &listing.skipped) {
        (Some(_), _) if listing.qualifies => "below threshold".to_string(),
        (Some(_), _) => "not below threshold".to_string(),
        (None, Some(reason)) => format!("skipped: {}", reason),
        (None, None) => "skipped".to_string(),
    }
}

fn rule_text(field: &FieldMatch) -> &str {
    field.rule().unwrap_or("missing")
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let head: String = text.chars().take(width - 3).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}
