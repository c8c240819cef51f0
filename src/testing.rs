//! In-memory fakes for the HTTP and page-session seams.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::browser::{CapturedResponse, Locator, PageSession};
use crate::error::{BrowserError, FetchError};
use crate::html;
use crate::net::{Fetch, Fetched};

enum Canned {
    Body { status: u16, content_type: String, body: String },
    Timeout,
}

/// URL-keyed canned responses. Unknown URLs fail as network errors.
#[derive(Default)]
pub struct FakeFetch {
    responses: HashMap<String, Canned>,
    calls: Mutex<Vec<String>>,
}

impl FakeFetch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, body: &str) -> Self {
        self.with(url, 200, "text/html", body)
    }

    pub fn with_json(self, url: &str, body: &str) -> Self {
        self.with(url, 200, "application/json", body)
    }

    pub fn with_status(self, url: &str, status: u16) -> Self {
        self.with(url, status, "text/html", "")
    }

    pub fn with_timeout(mut self, url: &str) -> Self {
        self.responses.insert(url.to_string(), Canned::Timeout);
        self
    }

    fn with(mut self, url: &str, status: u16, content_type: &str, body: &str) -> Self {
        self.responses.insert(
            url.to_string(),
            Canned::Body {
                status,
                content_type: content_type.to_string(),
                body: body.to_string(),
            },
        );
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetch for FakeFetch {
    async fn get(&self, url: &str, _timeout: Duration) -> Result<Fetched, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.responses.get(url) {
            Some(Canned::Body {
                status,
                content_type,
                body,
            }) => Ok(Fetched {
                url: url.to_string(),
                status: *status,
                content_type: content_type.clone(),
                body: body.clone(),
            }),
            Some(Canned::Timeout) => Err(FetchError::Timeout),
            None => Err(FetchError::Network(format!("no route to {}", url))),
        }
    }
}

/// A scripted page session. Pages are keyed by URL; clicks are scripted per
/// (selector, index) and either navigate somewhere or do nothing. Loading a
/// page appends that page's scripted responses to the network log.
#[derive(Default)]
pub struct FakeSession {
    pages: HashMap<String, String>,
    reloads: HashMap<String, String>,
    redirects: HashMap<String, String>,
    clicks: HashMap<(String, usize), Option<String>>,
    responses: HashMap<String, Vec<CapturedResponse>>,
    loaded: HashSet<String>,
    log: Vec<CapturedResponse>,
    current: Option<String>,
    pub visits: Vec<String>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    /// Serve `html` at `url` from its second load onwards.
    pub fn with_reload(mut self, url: &str, html: &str) -> Self {
        self.reloads.insert(url.to_string(), html.to_string());
        self
    }

    pub fn with_redirect(mut self, from: &str, to: &str) -> Self {
        self.redirects.insert(from.to_string(), to.to_string());
        self
    }

    /// Clicking the `index`-th match of `css` navigates to `to`, or stays put.
    pub fn with_click(mut self, css: &str, index: usize, to: Option<&str>) -> Self {
        self.clicks
            .insert((css.to_string(), index), to.map(str::to_string));
        self
    }

    /// A response captured whenever `page` is loaded.
    pub fn with_response(mut self, page: &str, url: &str, content_type: &str, body: &str) -> Self {
        self.responses
            .entry(page.to_string())
            .or_default()
            .push(CapturedResponse {
                url: url.to_string(),
                content_type: content_type.to_string(),
                body: body.to_string(),
            });
        self
    }

    fn html(&self) -> Result<&str, BrowserError> {
        let url = self.current.as_ref().ok_or(BrowserError::NoPage)?;
        self.pages
            .get(url)
            .map(String::as_str)
            .ok_or(BrowserError::NoPage)
    }
}

#[async_trait]
impl PageSession for FakeSession {
    async fn goto(&mut self, url: &str) -> Result<(), BrowserError> {
        self.visits.push(url.to_string());
        let resolved = self.redirects.get(url).cloned().unwrap_or_else(|| url.to_string());
        if !self.pages.contains_key(&resolved) {
            return Err(BrowserError::Navigation {
                url: url.to_string(),
                reason: "unreachable".into(),
            });
        }
        if !self.loaded.insert(resolved.clone()) {
            if let Some(html) = self.reloads.get(&resolved).cloned() {
                self.pages.insert(resolved.clone(), html);
            }
        }
        if let Some(responses) = self.responses.get(&resolved) {
            self.log.extend(responses.iter().cloned());
        }
        self.current = Some(resolved);
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, BrowserError> {
        self.current.clone().ok_or(BrowserError::NoPage)
    }

    async fn source(&mut self) -> Result<String, BrowserError> {
        self.html().map(str::to_string)
    }

    async fn count(&mut self, locator: &Locator) -> Result<usize, BrowserError> {
        Ok(html::find_elements(self.html()?, locator.css, locator.text).len())
    }

    async fn click(&mut self, locator: &Locator, index: usize) -> Result<(), BrowserError> {
        if self.count(locator).await? <= index {
            return Err(BrowserError::NotFound(format!("{} #{}", locator, index)));
        }
        match self.clicks.get(&(locator.css.to_string(), index)).cloned() {
            Some(Some(to)) => {
                self.current = Some(to);
                Ok(())
            }
            Some(None) => Ok(()),
            None => Err(BrowserError::Unsupported(format!("click {}", locator))),
        }
    }

    async fn network_log(&mut self) -> Result<Vec<CapturedResponse>, BrowserError> {
        Ok(self.log.clone())
    }

    async fn clear_network_log(&mut self) -> Result<(), BrowserError> {
        self.log.clear();
        Ok(())
    }

    async fn wait_for(&mut self, locator: &Locator, _timeout: Duration) -> Result<bool, BrowserError> {
        Ok(self.count(locator).await? > 0)
    }

    async fn wait_for_url(&mut self, needle: &str, _timeout: Duration) -> Result<bool, BrowserError> {
        Ok(self.current_url().await?.contains(needle))
    }
}
