//! End-to-end runs against saved storefront pages.

use deal_hunter::browser::SnapshotBrowser;
use deal_hunter::commands::{FieldMatch, LocateCommand, RunCommand};
use deal_hunter::config::{Config, OutputFormat};
use deal_hunter::reference::InlinePrices;
use deal_hunter::workflow::{Outcome, ShoppingWorkflow, Stage, Step, StepStatus};
use std::path::{Path, PathBuf};

const STOREFRONT: &str = "http://www.ebay.com/";
const RESULTS: &str = "http://www.ebay.com/sch/results";
const LISTING: &str = "http://www.ebay.com/itm/1003";

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name)
}

fn storefront() -> SnapshotBrowser {
    SnapshotBrowser::new()
        .with_page_file(STOREFRONT, fixture("home.html"))
        .unwrap()
        .with_page_file(RESULTS, fixture("results.html"))
        .unwrap()
        .with_page_file(LISTING, fixture("listing.html"))
        .unwrap()
        .with_search_results(RESULTS)
}

fn config(screenshots: &Path) -> Config {
    Config {
        screenshot_dir: screenshots.to_path_buf(),
        results_timeout_ms: 200,
        poll_interval_ms: 10,
        ..Config::default()
    }
}

fn reference_prices() -> InlinePrices {
    InlinePrices::new(vec!["$1,200.00".into(), "$999.99".into(), "$1,350.00".into()])
}

#[tokio::test]
async fn test_full_run_buys_third_listing() {
    let dir = tempfile::tempdir().unwrap();
    let workflow = ShoppingWorkflow::new(config(dir.path()));

    let report = workflow.execute_with(storefront(), &reference_prices()).await;

    assert_eq!(report.threshold, Some(999.99));
    assert_eq!(
        report.outcome,
        Outcome::Purchased {
            ordinal: 3,
            price: 950.0,
            title: Some("Canon EOS 5D Mark IV Body Only - Excellent".into()),
            page_title: Some("Canon EOS 5D Mark IV Body Only - Excellent | eBay".into()),
        }
    );

    // Listings after the purchase are never evaluated
    let ordinals: Vec<_> = report.listings.iter().map(|l| l.ordinal).collect();
    assert_eq!(ordinals, vec![1, 2, 3]);
    assert_eq!(report.listings[1].matched_rule.as_deref(), Some("card-price"));

    assert!(report.steps.iter().all(|s| s.status == StepStatus::Completed));
    assert_eq!(report.final_stage, Stage::Closed);

    // Saved pages cannot be rendered, so no screenshot is written
    assert!(report.artifacts.is_empty());
}

#[tokio::test]
async fn test_full_run_without_a_deal() {
    let dir = tempfile::tempdir().unwrap();
    let workflow = ShoppingWorkflow::new(config(dir.path()));
    let source = InlinePrices::new(vec!["$900.00".into()]);

    let report = workflow.execute_with(storefront(), &source).await;

    assert_eq!(report.outcome, Outcome::NoDealFound);
    assert_eq!(report.listings.len(), 5);
    assert!(report.listings.iter().all(|l| l.price.is_some() && !l.qualifies));
}

#[tokio::test]
async fn test_listing_opened_in_same_tab_is_purchased() {
    let dir = tempfile::tempdir().unwrap();
    let results = std::fs::read_to_string(fixture("results.html"))
        .unwrap()
        .replace(r#"href="http://www.ebay.com/itm/1003" target="_blank""#, r#"href="http://www.ebay.com/itm/1003""#);
    assert!(!results.contains(r#"itm/1003" target"#));
    let browser = storefront().with_page(RESULTS, results);

    let report = ShoppingWorkflow::new(config(dir.path())).execute_with(browser, &reference_prices()).await;

    assert!(matches!(
        &report.outcome,
        Outcome::Purchased { ordinal: 3, page_title: Some(title), .. }
            if title == "Canon EOS 5D Mark IV Body Only - Excellent | eBay"
    ));
    assert_eq!(report.listings.len(), 3);
    assert_eq!(report.final_stage, Stage::Closed);
}

#[tokio::test]
async fn test_wrong_storefront_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path());
    config.expected_title = "Some Other Shop".into();

    let report = ShoppingWorkflow::new(config).execute_with(storefront(), &reference_prices()).await;

    assert!(report.outcome.is_aborted());
    assert!(matches!(report.status_of(Step::Initialize), Some(StepStatus::Failed(_))));
    assert_eq!(report.status_of(Step::Finalize), Some(&StepStatus::Completed));
    assert!(report.listings.is_empty());
}

#[tokio::test]
async fn test_missing_results_page_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let browser = SnapshotBrowser::new().with_page_file(STOREFRONT, fixture("home.html")).unwrap();

    let report = ShoppingWorkflow::new(config(dir.path())).execute_with(browser, &reference_prices()).await;

    assert!(matches!(report.status_of(Step::Search), Some(StepStatus::Failed(_))));
    assert_eq!(report.outcome, Outcome::NoDealFound);
    assert!(report.listings.iter().all(|l| l.skipped.is_some()));
}

#[tokio::test]
async fn test_run_command_markdown_output() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config { format: OutputFormat::Markdown, ..config(dir.path()) };

    let (_, output) = RunCommand::new(config).execute_with(storefront(), &reference_prices()).await;

    assert!(output.starts_with("## Canon camera eos 5d mark iv"));
    assert!(output.contains("| 3 | $950.00 | item-price | below threshold |"));
}

#[tokio::test]
async fn test_locate_saved_results_page() {
    let command = LocateCommand::new(Config::default());
    let browser = SnapshotBrowser::new()
        .with_page_file(RESULTS, fixture("results.html"))
        .unwrap()
        .showing(RESULTS);

    let checks = command.check(&browser, 6).await;

    assert_eq!(checks.len(), 6);
    assert_eq!(checks[0].parsed_price, Some(1050.0));
    assert_eq!(checks[1].price.rule(), Some("card-price"));
    assert_eq!(checks[1].link.rule(), Some("card-link"));
    assert_eq!(checks[2].title.text(), Some("Canon EOS 5D Mark IV Body Only - Excellent"));
    assert!(matches!(checks[5].price, FieldMatch::Missing { .. }));
}

#[tokio::test]
async fn test_locate_command_text_output() {
    let command = LocateCommand::new(Config::default());
    let output = command.execute(&fixture("results.html"), 5).await.unwrap();

    assert!(output.contains("item-price"));
    assert!(output.contains("5 of 5 listings have a usable price"));
}
