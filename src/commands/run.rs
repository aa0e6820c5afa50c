//! Run command implementation.

use crate::browser::Browser;
use crate::config::Config;
use crate::format::Formatter;
use crate::reference::ReferenceSource;
use crate::workflow::{RunReport, ShoppingWorkflow};
use tracing::info;

/// Executes one shopping run and renders its report.
pub struct RunCommand {
    workflow: ShoppingWorkflow,
}

impl RunCommand {
    pub fn new(config: Config) -> Self {
        Self { workflow: ShoppingWorkflow::new(config) }
    }

    /// Runs against the configured WebDriver server.
    pub async fn execute(&self) -> (RunReport, String) {
        info!("Shopping for: {}", self.workflow.config().query);
        let report = self.workflow.execute().await;
        let output = self.render(&report);
        (report, output)
    }

    /// Runs with a provided browser and reference source (for testing).
    pub async fn execute_with<B: Browser>(
        &self,
        browser: B,
        source: &dyn ReferenceSource,
    ) -> (RunReport, String) {
        let report = self.workflow.execute_with(browser, source).await;
        let output = self.render(&report);
        (report, output)
    }

    fn render(&self, report: &RunReport) -> String {
        Formatter::new(self.workflow.config().format).format_report(report)
    }
}
