//! The five-step shopping run.
//!
//! 1. Initialize: open the storefront and verify its title.
//! 2. Load reference prices and derive the purchase threshold.
//! 3. Search for the configured query.
//! 4. Walk the first listings and open the first one priced below the threshold.
//! 5. Finalize: close the browser, whatever happened before.
//!
//! A fatal error skips straight to step 5. Faults inside steps 3 and 4 are
//! recorded and the run keeps going.

pub mod report;
pub mod session;

pub use report::{Outcome, RunReport, Step, StepRecord, StepStatus};
pub use session::{Stage, WorkflowSession};

use crate::artifacts::{ArtifactRecorder, Checkpoint};
use crate::browser::{wait_for_count, Browser, WebDriverBrowser};
use crate::config::Config;
use crate::error::{ShopError, ShopResult};
use crate::listing::selectors::Field;
use crate::listing::{CandidateListing, LocatorStrategy};
use crate::reference::{self, ReferenceSource};
use tracing::{debug, error, info, warn};

/// Runs the shopping workflow against a browser backend.
pub struct ShoppingWorkflow {
    config: Config,
}

impl ShoppingWorkflow {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Connects to the configured WebDriver server and runs to completion.
    pub async fn execute(&self) -> RunReport {
        let source = match reference::from_config(&self.config.reference) {
            Ok(source) => source,
            Err(e) => return self.aborted_before_start(format!("{:#}", e)),
        };

        let browser = match WebDriverBrowser::connect(&self.config).await {
            Ok(browser) => browser,
            Err(e) => return self.aborted_before_start(e.to_string()),
        };

        self.execute_with(browser, source.as_ref()).await
    }

    /// Runs every step on an already started browser.
    ///
    /// Always closes the browser before returning.
    pub async fn execute_with<B: Browser>(&self, browser: B, source: &dyn ReferenceSource) -> RunReport {
        let mut run = Run {
            config: &self.config,
            session: WorkflowSession::open(browser),
            recorder: ArtifactRecorder::new(&self.config.screenshot_dir),
            report: self.new_report(),
        };

        let initialized = run.initialize().await;
        if run.conclude(Step::Initialize, initialized, &[Step::LoadReferencePrices, Step::Search]) {
            return run.finalize().await;
        }

        let loaded = run.load_reference_prices(source);
        if run.conclude(Step::LoadReferencePrices, loaded, &[Step::Search]) {
            return run.finalize().await;
        }

        let searched = run.search().await;
        if run.conclude(Step::Search, searched, &[]) {
            return run.finalize().await;
        }
        run.session.advance(Stage::Searched);

        run.evaluate_and_purchase().await;
        run.finalize().await
    }

    fn new_report(&self) -> RunReport {
        RunReport::new(
            self.config.query.clone(),
            self.config.storefront_url.clone(),
            self.config.screenshot_dir.clone(),
        )
    }

    /// Report for a run that never got a browser.
    fn aborted_before_start(&self, reason: String) -> RunReport {
        error!("Could not start the run: {}", reason);

        let mut report = self.new_report();
        report.failed(Step::Initialize, reason.clone());
        report.abort(reason);
        for step in [Step::LoadReferencePrices, Step::Search, Step::EvaluateAndPurchase] {
            report.skipped(step, "run aborted");
        }
        report.skipped(Step::Finalize, "no browser session was started");
        report
    }
}

/// State threaded through one execution.
struct Run<'a, B: Browser> {
    config: &'a Config,
    session: WorkflowSession<B>,
    recorder: ArtifactRecorder,
    report: RunReport,
}

impl<B: Browser> Run<'_, B> {
    async fn initialize(&mut self) -> ShopResult<()> {
        let url = &self.config.storefront_url;
        let browser = self.session.browser();

        browser
            .goto(url)
            .await
            .map_err(|e| ShopError::Environment(format!("could not open {}: {}", url, e)))?;

        let title = browser
            .title()
            .await
            .map_err(|e| ShopError::Environment(format!("could not read page title: {}", e)))?;

        if title.trim() != self.config.expected_title {
            return Err(ShopError::Environment(format!(
                "unexpected storefront title {:?} (expected {:?})",
                title, self.config.expected_title
            )));
        }

        self.recorder.record(browser, Checkpoint::InitialLoad).await;
        self.session.advance(Stage::Initialized);
        info!("Step 1: Opened {} ({})", url, title);
        Ok(())
    }

    fn load_reference_prices(&mut self, source: &dyn ReferenceSource) -> ShopResult<()> {
        debug!("Reading reference prices from {}", source.describe());

        let row = source.read_row().map_err(|e| {
            ShopError::Environment(format!("could not read reference prices from {}: {:#}", source.describe(), e))
        })?;

        for cell in &row.cells {
            info!("Reference price: {}", cell);
        }

        let parsed = row.scan();
        self.report.reference_prices = row.cells;
        self.report.rejected = parsed.rejected;

        let threshold = parsed.tracker.threshold()?;
        self.report.threshold = Some(threshold.value());
        self.session.prices_loaded(threshold);

        info!("Lowest Expected Price: {}", threshold);
        info!("Step 2: Loaded {} reference price(s) from {}", parsed.tracker.observed(), source.describe());
        Ok(())
    }

    async fn search(&mut self) -> ShopResult<()> {
        let locators = &self.config.locators;
        let query = &self.config.query;
        let browser = self.session.browser();

        browser
            .type_text(&locators.search_box, query)
            .await
            .map_err(|e| ShopError::interaction("typing the search query", e))?;
        self.recorder.record(browser, Checkpoint::SearchBefore).await;

        browser
            .submit(&locators.search_box)
            .await
            .map_err(|e| ShopError::interaction("submitting the search", e))?;

        let found = wait_for_count(
            browser,
            &locators.results,
            1,
            self.config.results_timeout(),
            self.config.poll_interval(),
        )
        .await
        .map_err(|e| ShopError::interaction("waiting for search results", e))?;

        match browser.title().await {
            Ok(title) => {
                info!("Results page: {}", title);
                self.report.results_title = Some(title);
            }
            Err(e) => debug!("Could not read results page title: {}", e),
        }

        self.recorder.record(browser, Checkpoint::SearchAfter).await;
        info!("Step 3: Searched for '{}' ({} result rows)", query, found);
        Ok(())
    }

    async fn evaluate_and_purchase(&mut self) {
        let Some(threshold) = self.session.threshold() else {
            warn!("Step 4 skipped: no purchase threshold was derived");
            self.report.skipped(Step::EvaluateAndPurchase, "no purchase threshold");
            return;
        };

        let price = LocatorStrategy::new(Field::Price, self.config.locators.price.clone());
        let max = self.config.max_listings;

        for ordinal in 1..=max {
            let listing = match price.locate_text(self.session.browser(), ordinal).await {
                Ok(located) => CandidateListing::evaluate(ordinal, located.value, located.rule, threshold.value()),
                Err(e) => {
                    warn!("Skipping listing {}: {}", ordinal, e);
                    CandidateListing::unlocated(ordinal, &e)
                }
            };

            let candidate = match (listing.price, listing.qualifies) {
                (Some(amount), true) => Some(amount),
                (Some(amount), false) => {
                    info!("${:.2} is not less than lowest expected price {}", amount, threshold);
                    None
                }
                (None, _) => {
                    if let Some(reason) = &listing.skipped {
                        warn!("Listing {} has no usable price: {}", ordinal, reason);
                    }
                    None
                }
            };
            self.report.listings.push(listing);

            let Some(amount) = candidate else { continue };
            info!("${:.2} is less than lowest expected price {}", amount, threshold);

            match self.purchase(ordinal, amount).await {
                Ok(outcome) => {
                    self.report.outcome = outcome;
                    break;
                }
                Err(e) => error!("Could not open listing {}: {}", ordinal, e),
            }
        }

        self.session.advance(Stage::Evaluated);

        if matches!(self.report.outcome, Outcome::Purchased { .. }) {
            self.session.advance(Stage::Purchased);
        } else {
            self.report.outcome = Outcome::NoDealFound;
            self.session.advance(Stage::NoDealFound);
            info!("Step 4: No listing among the first {} is below {}", max, threshold);
        }
        self.report.completed(Step::EvaluateAndPurchase);
    }

    /// Opens the listing at `ordinal`: title lookup, click, window switch, capture.
    ///
    /// Only a failed click is an error. Once the link was clicked the purchase
    /// is committed, and a listing that opened in the current window is
    /// captured there.
    async fn purchase(&mut self, ordinal: usize, price: f64) -> ShopResult<Outcome> {
        let title_strategy = LocatorStrategy::new(Field::Title, self.config.locators.title.clone());
        let link_strategy = LocatorStrategy::new(Field::Link, self.config.locators.link.clone());
        let browser = self.session.browser();

        let title = match title_strategy.locate_text(browser, ordinal).await {
            Ok(located) => Some(located.value),
            Err(e) => {
                debug!("No title for listing {}: {}", ordinal, e);
                None
            }
        };

        let clicked = link_strategy.click(browser, ordinal).await?;
        debug!("Opened listing {} via {}", ordinal, clicked.rule);

        if let Err(e) = browser.switch_to_new_window().await {
            warn!("Listing {} did not open a new window, staying on the current one: {}", ordinal, e);
        }

        self.recorder.record(browser, Checkpoint::Purchase).await;

        let page_title = match browser.title().await {
            Ok(page_title) => Some(page_title),
            Err(e) => {
                debug!("Could not read listing page title: {}", e);
                None
            }
        };

        info!(
            "Step 4: Bought product at listing {} for ${:.2}{}",
            ordinal,
            price,
            title.as_deref().map(|t| format!(" ({})", t)).unwrap_or_default()
        );

        Ok(Outcome::Purchased { ordinal, price, title, page_title })
    }

    /// Records how `step` ended. Returns true if a fatal error aborted the run,
    /// in which case `remaining` and step 4 are marked skipped.
    fn conclude(&mut self, step: Step, result: ShopResult<()>, remaining: &[Step]) -> bool {
        let e = match result {
            Ok(()) => {
                self.report.completed(step);
                return false;
            }
            Err(e) => e,
        };

        self.report.failed(step, e.to_string());
        if !e.is_fatal() {
            warn!("Step {} did not complete: {}", step.number(), e);
            return false;
        }

        error!("Step {} failed: {}", step.number(), e);
        self.report.abort(e.to_string());
        self.skip_remaining(remaining);
        self.skip_remaining(&[Step::EvaluateAndPurchase]);
        true
    }

    fn skip_remaining(&mut self, steps: &[Step]) {
        for step in steps {
            self.report.skipped(*step, "run aborted");
        }
    }

    async fn finalize(self) -> RunReport {
        let Run { session, recorder, mut report, .. } = self;

        report.final_stage = session.close().await;
        report.artifacts = recorder.into_artifacts();
        report.completed(Step::Finalize);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::testing::ScriptedBrowser;
    use crate::listing::selectors;
    use crate::reference::InlinePrices;
    use tempfile::TempDir;

    const HOME_TITLE: &str = "Electronics, Cars, Fashion, Collectibles & More | eBay";
    const LISTING_TITLE: &str = "Canon EOS 5D Mark IV Body | eBay";

    fn workflow(dir: &TempDir) -> ShoppingWorkflow {
        let config = Config {
            screenshot_dir: dir.path().to_path_buf(),
            results_timeout_ms: 50,
            poll_interval_ms: 5,
            ..Config::default()
        };
        ShoppingWorkflow::new(config)
    }

    fn reference_prices() -> InlinePrices {
        InlinePrices::new(vec!["$1,200.00".into(), "$999.99".into()])
    }

    fn storefront() -> ScriptedBrowser {
        ScriptedBrowser::new().with_title(HOME_TITLE)
    }

    fn with_prices(browser: ScriptedBrowser, prices: &[&str]) -> ScriptedBrowser {
        prices.iter().enumerate().fold(browser, |b, (i, price)| b.with_price(i + 1, price))
    }

    fn link(ordinal: usize) -> String {
        selectors::link_strategy().primary.for_ordinal(ordinal).value
    }

    #[tokio::test]
    async fn test_buys_first_listing_below_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let browser = with_prices(
            storefront(),
            &["$1,050.00", "$1,100.00", "$950.00", "$1,200.00", "$999.99"],
        )
        .with_link(3, LISTING_TITLE);
        let observer = browser.clone();

        let report = workflow(&dir).execute_with(browser, &reference_prices()).await;

        assert_eq!(report.threshold, Some(999.99));
        assert_eq!(
            report.outcome,
            Outcome::Purchased {
                ordinal: 3,
                price: 950.0,
                title: None,
                page_title: Some(LISTING_TITLE.into()),
            }
        );
        assert_eq!(report.listings.len(), 3);
        assert_eq!(report.purchased().unwrap().ordinal, 3);
        assert_eq!(report.final_stage, Stage::Closed);

        // Nothing after the purchase is inspected
        assert!(observer.lookups().iter().all(|l| !l.contains("nth-child(4)")));
        assert!(observer.lookups().iter().all(|l| !l.contains("nth-child(5)")));
        assert_eq!(observer.clicks(), vec![link(3)]);
        assert_eq!(observer.typed(), vec!["Canon camera eos 5d mark iv"]);
        assert_eq!(observer.visited(), vec!["http://www.ebay.com/"]);
        assert_eq!(observer.close_count(), 1);
        assert_eq!(observer.screenshot_count(), 4);

        let checkpoints: Vec<_> = report.artifacts.iter().map(|a| a.checkpoint).collect();
        assert_eq!(
            checkpoints,
            vec![
                Checkpoint::InitialLoad,
                Checkpoint::SearchBefore,
                Checkpoint::SearchAfter,
                Checkpoint::Purchase
            ]
        );
        assert!(dir.path().join("04-purchase.png").exists());
        assert!(report.steps.iter().all(|s| s.status == StepStatus::Completed));
    }

    #[tokio::test]
    async fn test_no_deal_when_nothing_is_below_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let browser = with_prices(
            storefront(),
            &["$1,050.00", "$1,100.00", "$999.99", "$1,200.00", "$1,000.00"],
        )
        .with_link(3, LISTING_TITLE);
        let observer = browser.clone();

        let report = workflow(&dir).execute_with(browser, &reference_prices()).await;

        assert_eq!(report.outcome, Outcome::NoDealFound);
        assert_eq!(report.listings.len(), 5);
        assert!(report.listings.iter().all(|l| !l.qualifies));
        assert!(observer.clicks().is_empty());
        assert!(report.artifacts.iter().all(|a| a.checkpoint != Checkpoint::Purchase));
        assert_eq!(report.final_stage, Stage::Closed);
        assert_eq!(observer.close_count(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_reference_row_aborts_before_search() {
        let dir = tempfile::tempdir().unwrap();
        let browser = with_prices(storefront(), &["$1.00"]);
        let observer = browser.clone();
        let source = InlinePrices::new(vec!["call for price".into(), "n/a".into()]);

        let report = workflow(&dir).execute_with(browser, &source).await;

        assert!(report.outcome.is_aborted());
        assert_eq!(report.rejected, vec!["call for price", "n/a"]);
        assert!(report.threshold.is_none());
        assert!(report.listings.is_empty());
        assert!(observer.lookups().is_empty());
        assert!(observer.typed().is_empty());
        assert_eq!(observer.close_count(), 1);
        assert_eq!(report.status_of(Step::Search), Some(&StepStatus::Skipped("run aborted".into())));
        assert_eq!(report.status_of(Step::Finalize), Some(&StepStatus::Completed));
    }

    #[tokio::test]
    async fn test_title_mismatch_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let browser = ScriptedBrowser::new().with_title("Access Denied");
        let observer = browser.clone();

        let report = workflow(&dir).execute_with(browser, &reference_prices()).await;

        match &report.outcome {
            Outcome::Aborted { reason } => assert!(reason.contains("Access Denied")),
            other => panic!("expected abort, got {:?}", other),
        }
        assert!(report.reference_prices.is_empty());
        assert!(matches!(report.status_of(Step::Initialize), Some(StepStatus::Failed(_))));
        assert!(report.artifacts.is_empty());
        assert_eq!(report.final_stage, Stage::Closed);
        assert_eq!(observer.close_count(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_storefront_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let browser = storefront().failing_goto();
        let observer = browser.clone();

        let report = workflow(&dir).execute_with(browser, &reference_prices()).await;

        assert!(report.outcome.is_aborted());
        assert!(observer.visited().is_empty());
        assert_eq!(observer.close_count(), 1);
    }

    #[tokio::test]
    async fn test_search_failure_does_not_stop_evaluation() {
        let dir = tempfile::tempdir().unwrap();
        let browser = with_prices(storefront(), &["$900.00"]).with_link(1, LISTING_TITLE).failing_typing();
        let observer = browser.clone();

        let report = workflow(&dir).execute_with(browser, &reference_prices()).await;

        assert!(matches!(report.status_of(Step::Search), Some(StepStatus::Failed(_))));
        assert_eq!(observer.count_calls(), 0);
        assert!(matches!(report.outcome, Outcome::Purchased { ordinal: 1, .. }));
        assert_eq!(report.final_stage, Stage::Closed);
    }

    #[tokio::test]
    async fn test_failed_click_moves_to_next_listing() {
        let dir = tempfile::tempdir().unwrap();
        let browser = with_prices(storefront(), &["$900.00", "$800.00"]).with_link(2, LISTING_TITLE);
        let observer = browser.clone();

        let report = workflow(&dir).execute_with(browser, &reference_prices()).await;

        assert!(matches!(report.outcome, Outcome::Purchased { ordinal: 2, price, .. } if price == 800.0));
        assert_eq!(observer.clicks(), vec![link(2)]);
        assert_eq!(report.listings.len(), 2);
        assert!(report.listings[0].qualifies);
    }

    #[tokio::test]
    async fn test_same_tab_listing_is_still_purchased() {
        let dir = tempfile::tempdir().unwrap();
        let browser = with_prices(storefront(), &["$1,050.00", "$950.00", "$900.00", "$800.00"])
            .with_same_tab_link(2, LISTING_TITLE)
            .with_link(3, LISTING_TITLE);
        let observer = browser.clone();

        let report = workflow(&dir).execute_with(browser, &reference_prices()).await;

        assert_eq!(
            report.outcome,
            Outcome::Purchased {
                ordinal: 2,
                price: 950.0,
                title: None,
                page_title: Some(LISTING_TITLE.into()),
            }
        );
        assert_eq!(report.listings.len(), 2);
        assert_eq!(observer.clicks(), vec![link(2)]);
        assert!(observer.lookups().iter().all(|l| !l.contains("nth-child(3)")));
        assert!(dir.path().join("04-purchase.png").exists());
        assert_eq!(report.final_stage, Stage::Closed);
    }

    #[tokio::test]
    async fn test_unlocated_listing_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let browser = storefront()
            .with_price(1, "$1,050.00")
            .with_fallback_price(3, "$990.00")
            .with_link(3, LISTING_TITLE);

        let report = workflow(&dir).execute_with(browser, &reference_prices()).await;

        assert_eq!(report.listings.len(), 3);
        assert!(report.listings[1].skipped.as_ref().unwrap().contains("item-price, card-price"));
        assert_eq!(report.listings[2].matched_rule.as_deref(), Some("card-price"));
        assert!(matches!(report.outcome, Outcome::Purchased { ordinal: 3, .. }));
    }

    #[tokio::test]
    async fn test_screenshot_failures_are_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let browser = with_prices(storefront(), &["$500.00"]).with_link(1, LISTING_TITLE).failing_screenshots();

        let report = workflow(&dir).execute_with(browser, &reference_prices()).await;

        assert!(report.artifacts.is_empty());
        assert!(matches!(report.outcome, Outcome::Purchased { ordinal: 1, .. }));
    }

    #[tokio::test]
    async fn test_respects_max_listings() {
        let dir = tempfile::tempdir().unwrap();
        let mut workflow = workflow(&dir);
        workflow.config.max_listings = 2;
        let browser = with_prices(storefront(), &["$1,050.00", "$1,100.00", "$950.00"]);

        let report = workflow.execute_with(browser, &reference_prices()).await;

        assert_eq!(report.listings.len(), 2);
        assert_eq!(report.outcome, Outcome::NoDealFound);
    }

    #[tokio::test]
    async fn test_missing_reference_config_aborts_without_browser() {
        let dir = tempfile::tempdir().unwrap();
        let report = workflow(&dir).execute().await;

        assert!(report.outcome.is_aborted());
        assert_eq!(report.final_stage, Stage::Uninitialized);
        assert!(matches!(report.status_of(Step::Finalize), Some(StepStatus::Skipped(_))));
    }
}
