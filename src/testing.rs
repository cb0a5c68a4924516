//! Scripted in-memory [`StudioDriver`] used by the workflow tests.

use crate::browser::driver::{DriverError, DriverResult, StoredCookie, StudioDriver};
use crate::browser::session::LoginPrompt;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Goto(String),
    Reload,
    Click(String),
    Type(String, String),
    SelectAll(String),
    Key(String, String),
    Hover(String),
    Scroll(String),
    Attach(String, PathBuf),
    Script(String),
    SetCookies(usize),
    Close,
}

#[derive(Debug, Default, Clone)]
struct FakeElement {
    text: String,
    attributes: HashMap<String, String>,
}

#[derive(Debug, Default)]
pub struct FakeStudio {
    elements: HashMap<String, FakeElement>,
    counts: HashMap<String, usize>,
    text_sequences: HashMap<String, VecDeque<String>>,
    intercept_once: HashSet<String>,
    broken_attributes: HashSet<String>,
    hover_reveals: HashMap<String, (String, String)>,
    last_revealed: Option<String>,
    redirects: HashMap<String, String>,
    script_results: Vec<(String, Value)>,
    pages: HashMap<String, FakeStudio>,
    url: String,
    pub browser_cookies: Vec<StoredCookie>,
    pub installed_cookies: Vec<StoredCookie>,
    pub actions: Vec<Action>,
    pub close_calls: usize,
}

impl FakeStudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_element(mut self, xpath: &str, text: &str) -> Self {
        self.elements.insert(
            xpath.to_string(),
            FakeElement {
                text: text.to_string(),
                ..Default::default()
            },
        );
        self
    }

    pub fn with_elements(mut self, xpaths: &[&str]) -> Self {
        for xpath in xpaths {
            self.elements.entry(xpath.to_string()).or_default();
        }
        self
    }

    pub fn with_attribute(mut self, xpath: &str, name: &str, value: &str) -> Self {
        self.elements
            .entry(xpath.to_string())
            .or_default()
            .attributes
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn without_element(mut self, xpath: &str) -> Self {
        self.elements.remove(xpath);
        self
    }

    /// Successive `text` reads return these values; the last one sticks.
    pub fn with_text_sequence(mut self, xpath: &str, texts: &[&str]) -> Self {
        self.elements.entry(xpath.to_string()).or_default();
        self.text_sequences.insert(
            xpath.to_string(),
            texts.iter().map(|t| t.to_string()).collect(),
        );
        self
    }

    pub fn with_count(mut self, xpath: &str, count: usize) -> Self {
        self.counts.insert(xpath.to_string(), count);
        self
    }

    pub fn intercepting_once(mut self, xpath: &str) -> Self {
        self.intercept_once.insert(xpath.to_string());
        self
    }

    /// Attribute reads on `xpath` fail as if the node had been detached.
    pub fn failing_attributes(mut self, xpath: &str) -> Self {
        self.broken_attributes.insert(xpath.to_string());
        self
    }

    /// Hovering `hovered` makes `revealed` appear with `text`.
    pub fn revealing_on_hover(mut self, hovered: &str, revealed: &str, text: &str) -> Self {
        self.hover_reveals.insert(
            hovered.to_string(),
            (revealed.to_string(), text.to_string()),
        );
        self
    }

    /// Navigating to `url` replaces the current elements with `page`'s.
    pub fn with_page(mut self, url: &str, page: FakeStudio) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    pub fn redirecting(mut self, from: &str, to: &str) -> Self {
        self.redirects.insert(from.to_string(), to.to_string());
        self
    }

    /// Scripts containing `needle` evaluate to `value`.
    pub fn with_script_result(mut self, needle: &str, value: Value) -> Self {
        self.script_results.push((needle.to_string(), value));
        self
    }

    pub fn with_browser_cookies(mut self, cookies: Vec<StoredCookie>) -> Self {
        self.browser_cookies = cookies;
        self
    }

    pub fn clicks(&self) -> Vec<&str> {
        self.actions
            .iter()
            .filter_map(|a| match a {
                Action::Click(x) => Some(x.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn typed_into(&self, xpath: &str) -> Vec<&str> {
        self.actions
            .iter()
            .filter_map(|a| match a {
                Action::Type(x, text) if x == xpath => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn visited(&self) -> Vec<&str> {
        self.actions
            .iter()
            .filter_map(|a| match a {
                Action::Goto(url) => Some(url.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn position(&self, action: &Action) -> Option<usize> {
        self.actions.iter().position(|a| a == action)
    }

    fn element(&self, xpath: &str) -> DriverResult<&FakeElement> {
        self.elements
            .get(xpath)
            .ok_or_else(|| DriverError::ElementNotFound(xpath.to_string()))
    }
}

pub fn cookie(name: &str, value: &str) -> StoredCookie {
    StoredCookie {
        name: name.to_string(),
        value: value.to_string(),
        domain: ".youtube.com".to_string(),
        path: "/".to_string(),
        expires: 1_900_000_000.0,
        http_only: true,
        secure: true,
        session: false,
    }
}

#[async_trait]
impl StudioDriver for FakeStudio {
    async fn goto(&mut self, url: &str) -> DriverResult<()> {
        self.actions.push(Action::Goto(url.to_string()));
        self.url = self
            .redirects
            .get(url)
            .cloned()
            .unwrap_or_else(|| url.to_string());
        if let Some(page) = self.pages.remove(&self.url) {
            self.elements = page.elements;
            self.counts = page.counts;
            self.text_sequences = page.text_sequences;
            self.hover_reveals = page.hover_reveals;
            self.last_revealed = None;
        }
        Ok(())
    }

    async fn reload(&mut self) -> DriverResult<()> {
        self.actions.push(Action::Reload);
        Ok(())
    }

    async fn current_url(&mut self) -> DriverResult<String> {
        Ok(self.url.clone())
    }

    async fn count(&mut self, xpath: &str) -> DriverResult<usize> {
        if let Some(count) = self.counts.get(xpath) {
            return Ok(*count);
        }
        Ok(usize::from(self.elements.contains_key(xpath)))
    }

    async fn click(&mut self, xpath: &str) -> DriverResult<()> {
        self.element(xpath)?;
        if self.intercept_once.remove(xpath) {
            return Err(DriverError::ClickIntercepted(xpath.to_string()));
        }
        self.actions.push(Action::Click(xpath.to_string()));
        Ok(())
    }

    async fn type_text(&mut self, xpath: &str, text: &str) -> DriverResult<()> {
        self.element(xpath)?;
        self.actions
            .push(Action::Type(xpath.to_string(), text.to_string()));
        Ok(())
    }

    async fn select_all(&mut self, xpath: &str) -> DriverResult<()> {
        self.element(xpath)?;
        self.actions.push(Action::SelectAll(xpath.to_string()));
        Ok(())
    }

    async fn press_key(&mut self, xpath: &str, key: &str) -> DriverResult<()> {
        self.element(xpath)?;
        self.actions
            .push(Action::Key(xpath.to_string(), key.to_string()));
        Ok(())
    }

    async fn hover(&mut self, xpath: &str) -> DriverResult<()> {
        self.element(xpath)?;
        self.actions.push(Action::Hover(xpath.to_string()));
        if let Some(previous) = self.last_revealed.take() {
            self.elements.remove(&previous);
        }
        if let Some((revealed, text)) = self.hover_reveals.get(xpath).cloned() {
            self.elements.insert(
                revealed.clone(),
                FakeElement {
                    text,
                    ..Default::default()
                },
            );
            self.last_revealed = Some(revealed);
        }
        Ok(())
    }

    async fn scroll_into_view(&mut self, xpath: &str) -> DriverResult<()> {
        self.element(xpath)?;
        self.actions.push(Action::Scroll(xpath.to_string()));
        Ok(())
    }

    async fn attach_file(&mut self, xpath: &str, file: &Path) -> DriverResult<()> {
        self.element(xpath)?;
        self.actions
            .push(Action::Attach(xpath.to_string(), file.to_path_buf()));
        Ok(())
    }

    async fn text(&mut self, xpath: &str) -> DriverResult<String> {
        if let Some(seq) = self.text_sequences.get_mut(xpath) {
            if seq.len() > 1 {
                if let Some(next) = seq.pop_front() {
                    return Ok(next);
                }
            }
            if let Some(last) = seq.front() {
                return Ok(last.clone());
            }
        }
        Ok(self.element(xpath)?.text.clone())
    }

    async fn attribute(&mut self, xpath: &str, name: &str) -> DriverResult<Option<String>> {
        if self.broken_attributes.contains(xpath) {
            return Err(DriverError::Cdp("Node is detached from document".to_string()));
        }
        Ok(self.element(xpath)?.attributes.get(name).cloned())
    }

    async fn run_script(&mut self, script: &str) -> DriverResult<Value> {
        self.actions.push(Action::Script(script.to_string()));
        Ok(self
            .script_results
            .iter()
            .find(|(needle, _)| script.contains(needle.as_str()))
            .map(|(_, value)| value.clone())
            .unwrap_or(Value::Null))
    }

    async fn cookies(&mut self) -> DriverResult<Vec<StoredCookie>> {
        Ok(self.browser_cookies.clone())
    }

    async fn set_cookies(&mut self, cookies: &[StoredCookie]) -> DriverResult<()> {
        self.actions.push(Action::SetCookies(cookies.len()));
        self.installed_cookies = cookies.to_vec();
        Ok(())
    }

    async fn close(&mut self) -> DriverResult<()> {
        self.close_calls += 1;
        self.actions.push(Action::Close);
        Ok(())
    }
}

/// Login prompt for sessions that must never ask.
pub struct NoPrompt;

#[async_trait]
impl LoginPrompt for NoPrompt {
    async fn wait_for_sign_in(&mut self) -> anyhow::Result<()> {
        anyhow::bail!("unexpected interactive sign-in")
    }
}
