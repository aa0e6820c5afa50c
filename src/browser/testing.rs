//! Scripted [`Browser`] double shared by unit tests.

use super::{Browser, Locator};
use crate::listing::selectors;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct State {
    title: String,
    texts: HashMap<String, String>,
    clickable: HashSet<String>,
    opened_title: Option<String>,
    pending_window: bool,
    same_tab: bool,
    lookups: Vec<String>,
    clicks: Vec<String>,
    typed: Vec<String>,
    visited: Vec<String>,
}

#[derive(Default)]
struct Counters {
    count_calls: AtomicUsize,
    screenshots: AtomicUsize,
    closes: AtomicUsize,
}

/// In-memory browser answering lookups from a script.
///
/// Clones share state, so a test can hand one clone to the workflow and
/// inspect the other afterwards.
#[derive(Clone)]
pub(crate) struct ScriptedBrowser {
    state: Arc<Mutex<State>>,
    counters: Arc<Counters>,
    result_count: usize,
    fail_goto: bool,
    fail_typing: bool,
    fail_screenshots: bool,
}

impl ScriptedBrowser {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            counters: Arc::new(Counters::default()),
            result_count: 50,
            fail_goto: false,
            fail_typing: false,
            fail_screenshots: false,
        }
    }

    pub(crate) fn with_title(self, title: &str) -> Self {
        self.state.lock().unwrap().title = title.to_string();
        self
    }

    pub(crate) fn with_text(self, locator: &Locator, text: &str) -> Self {
        self.state.lock().unwrap().texts.insert(locator.value.clone(), text.to_string());
        self
    }

    /// Registers price text under the default primary price rule.
    pub(crate) fn with_price(self, ordinal: usize, text: &str) -> Self {
        let locator = selectors::price_strategy().primary.for_ordinal(ordinal);
        self.with_text(&locator, text)
    }

    /// Registers price text under the default fallback price rule.
    pub(crate) fn with_fallback_price(self, ordinal: usize, text: &str) -> Self {
        let locator = selectors::price_strategy()
            .fallback
            .map(|rule| rule.for_ordinal(ordinal))
            .unwrap();
        self.with_text(&locator, text)
    }

    /// Makes the default primary link for `ordinal` clickable, opening a page titled `title`.
    pub(crate) fn with_link(self, ordinal: usize, title: &str) -> Self {
        let locator = selectors::link_strategy().primary.for_ordinal(ordinal);
        {
            let mut state = self.state.lock().unwrap();
            state.clickable.insert(locator.value);
            state.opened_title = Some(title.to_string());
        }
        self
    }

    /// Like [`Self::with_link`], but the listing replaces the current page.
    pub(crate) fn with_same_tab_link(self, ordinal: usize, title: &str) -> Self {
        let browser = self.with_link(ordinal, title);
        browser.state.lock().unwrap().same_tab = true;
        browser
    }

    pub(crate) fn with_result_count(mut self, count: usize) -> Self {
        self.result_count = count;
        self
    }

    pub(crate) fn failing_goto(mut self) -> Self {
        self.fail_goto = true;
        self
    }

    pub(crate) fn failing_typing(mut self) -> Self {
        self.fail_typing = true;
        self
    }

    pub(crate) fn failing_screenshots(mut self) -> Self {
        self.fail_screenshots = true;
        self
    }

    pub(crate) fn lookups(&self) -> Vec<String> {
        self.state.lock().unwrap().lookups.clone()
    }

    pub(crate) fn clicks(&self) -> Vec<String> {
        self.state.lock().unwrap().clicks.clone()
    }

    pub(crate) fn typed(&self) -> Vec<String> {
        self.state.lock().unwrap().typed.clone()
    }

    pub(crate) fn visited(&self) -> Vec<String> {
        self.state.lock().unwrap().visited.clone()
    }

    pub(crate) fn count_calls(&self) -> usize {
        self.counters.count_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn screenshot_count(&self) -> usize {
        self.counters.screenshots.load(Ordering::SeqCst)
    }

    pub(crate) fn close_count(&self) -> usize {
        self.counters.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Browser for ScriptedBrowser {
    async fn goto(&self, url: &str) -> Result<()> {
        if self.fail_goto {
            anyhow::bail!("net::ERR_NAME_NOT_RESOLVED");
        }
        self.state.lock().unwrap().visited.push(url.to_string());
        Ok(())
    }

    async fn title(&self) -> Result<String> {
        Ok(self.state.lock().unwrap().title.clone())
    }

    async fn text(&self, locator: &Locator) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.lookups.push(locator.value.clone());
        state
            .texts
            .get(&locator.value)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no such element: {}", locator))
    }

    async fn count(&self, _locator: &Locator) -> Result<usize> {
        self.counters.count_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.result_count)
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if !state.clickable.contains(&locator.value) {
            anyhow::bail!("no such element: {}", locator);
        }
        state.clicks.push(locator.value.clone());
        if state.same_tab {
            if let Some(title) = state.opened_title.clone() {
                state.title = title;
            }
        } else {
            state.pending_window = true;
        }
        Ok(())
    }

    async fn type_text(&self, locator: &Locator, text: &str) -> Result<()> {
        if self.fail_typing {
            anyhow::bail!("element not interactable: {}", locator);
        }
        self.state.lock().unwrap().typed.push(text.to_string());
        Ok(())
    }

    async fn submit(&self, locator: &Locator) -> Result<()> {
        if self.fail_typing {
            anyhow::bail!("element not interactable: {}", locator);
        }
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        if self.fail_screenshots {
            anyhow::bail!("screenshot unavailable");
        }
        self.counters.screenshots.fetch_add(1, Ordering::SeqCst);
        Ok(b"\x89PNG\r\n\x1a\n".to_vec())
    }

    async fn switch_to_new_window(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if !state.pending_window {
            anyhow::bail!("no new window to switch to");
        }
        state.pending_window = false;
        if let Some(title) = state.opened_title.clone() {
            state.title = title;
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
