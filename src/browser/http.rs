use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use super::{CapturedResponse, Locator, PageSession};
use crate::error::BrowserError;
use crate::html;
use crate::net::{Fetch, Fetched};

/// Oldest captured documents are dropped past this many.
const LOG_CAPACITY: usize = 64;

/// A page session over plain HTTP. No script runs, so the DOM is whatever the
/// server sent: waits resolve immediately, clicks follow the clicked
/// element's link, and the network log holds the documents loaded since it
/// was last cleared, up to [`LOG_CAPACITY`].
pub struct HttpSession {
    fetch: Arc<dyn Fetch>,
    timeout: Duration,
    page: Option<Fetched>,
    log: Vec<CapturedResponse>,
}

impl HttpSession {
    pub fn new(fetch: Arc<dyn Fetch>, timeout: Duration) -> Self {
        Self {
            fetch,
            timeout,
            page: None,
            log: Vec::new(),
        }
    }

    fn page(&self) -> Result<&Fetched, BrowserError> {
        self.page.as_ref().ok_or(BrowserError::NoPage)
    }
}

#[async_trait]
impl PageSession for HttpSession {
    async fn goto(&mut self, url: &str) -> Result<(), BrowserError> {
        debug!("GET {}", url);
        let fetched = self
            .fetch
            .get(url, self.timeout)
            .await
            .and_then(Fetched::error_for_status)
            .map_err(|e| BrowserError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        self.log.push(CapturedResponse {
            url: fetched.url.clone(),
            content_type: fetched.content_type.clone(),
            body: fetched.body.clone(),
        });
        if self.log.len() > LOG_CAPACITY {
            let excess = self.log.len() - LOG_CAPACITY;
            self.log.drain(..excess);
        }
        self.page = Some(fetched);
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, BrowserError> {
        Ok(self.page()?.url.clone())
    }

    async fn source(&mut self) -> Result<String, BrowserError> {
        Ok(self.page()?.body.clone())
    }

    async fn count(&mut self, locator: &Locator) -> Result<usize, BrowserError> {
        let page = self.page()?;
        Ok(html::find_elements(&page.body, locator.css, locator.text).len())
    }

    async fn click(&mut self, locator: &Locator, index: usize) -> Result<(), BrowserError> {
        let page = self.page()?;
        let element = html::find_elements(&page.body, locator.css, locator.text)
            .into_iter()
            .nth(index)
            .ok_or_else(|| BrowserError::NotFound(format!("{} #{}", locator, index)))?;

        let href = element
            .href
            .ok_or_else(|| BrowserError::Unsupported(format!("click {} without a link", locator)))?;
        let target = Url::parse(&page.url)
            .and_then(|base| base.join(&href))
            .map_err(|e| BrowserError::Navigation {
                url: href.clone(),
                reason: e.to_string(),
            })?;

        self.goto(target.as_str()).await
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
