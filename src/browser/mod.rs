//! The interactive page-session seam. Extractors that need a live page talk
//! to a [`PageSession`]; only one page is current at a time.

pub mod http;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::BrowserError;

pub use http::HttpSession;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// CSS selector, optionally narrowed to elements whose text contains a phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locator {
    pub css: &'static str,
    pub text: Option<&'static str>,
}

impl Locator {
    pub const fn css(css: &'static str) -> Self {
        Self { css, text: None }
    }

    pub const fn containing(self, text: &'static str) -> Self {
        Self {
            css: self.css,
            text: Some(text),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.text {
            Some(t) => write!(f, "{} containing {:?}", self.css, t),
            None => write!(f, "{}", self.css),
        }
    }
}

/// A network response observed by the session while pages were loading.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedResponse {
    pub url: String,
    pub content_type: String,
    pub body: String,
}

#[async_trait]
pub trait PageSession: Send {
    async fn goto(&mut self, url: &str) -> Result<(), BrowserError>;

    async fn current_url(&mut self) -> Result<String, BrowserError>;

    async fn source(&mut self) -> Result<String, BrowserError>;

    async fn count(&mut self, locator: &Locator) -> Result<usize, BrowserError>;

    async fn click(&mut self, locator: &Locator, index: usize) -> Result<(), BrowserError>;

    /// Responses captured since the session started or the log was last cleared.
    async fn network_log(&mut self) -> Result<Vec<CapturedResponse>, BrowserError>;

    async fn clear_network_log(&mut self) -> Result<(), BrowserError>;

    /// Wait until `locator` matches something. `Ok(false)` on timeout.
    async fn wait_for(&mut self, locator: &Locator, timeout: Duration) -> Result<bool, BrowserError> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.count(locator).await? > 0 {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Wait until the current URL contains `needle`. `Ok(false)` on timeout.
    async fn wait_for_url(&mut self, needle: &str, timeout: Duration) -> Result<bool, BrowserError> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.current_url().await?.contains(needle) {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}
