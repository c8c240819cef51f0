//! Greenhouse boards, read through the public board API instead of the DOM.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};
use url::Url;

use super::{HttpExtractor, Listing};
use crate::config::Settings;
use crate::error::FetchError;
use crate::html;
use crate::model::{RawJobRecord, Target};
use crate::net::Fetch;

const API_BASE: &str = "https://boards-api.greenhouse.io/v1/boards";
const EMBED_BASE: &str = "https://boards.greenhouse.io";
const TITLE_NOT_FOUND: &str = "Title Not Found";
const LOCATION_NOT_FOUND: &str = "Location Not Found";

#[derive(Debug, Deserialize)]
struct Board {
    #[serde(default)]
    jobs: Vec<BoardJob>,
}

#[derive(Debug, Deserialize)]
struct BoardJob {
    id: Option<u64>,
    title: Option<String>,
    location: Option<JobLocation>,
    absolute_url: Option<String>,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JobLocation {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JobDetail {
    content: Option<String>,
}

pub struct GreenhouseExtractor {
    fetch: Arc<dyn Fetch>,
    timeout: Duration,
    api_base: String,
}

impl GreenhouseExtractor {
    pub fn new(fetch: Arc<dyn Fetch>, settings: &Settings) -> Self {
        Self {
            fetch,
            timeout: settings.greenhouse_timeout,
            api_base: API_BASE.to_string(),
        }
    }

    async fn fetch_board(&self, token: &str) -> Result<Vec<RawJobRecord>, FetchError> {
        let api_url = format!("{}/{}/jobs?content=true", self.api_base, token);
        info!("Querying Greenhouse API: {}", api_url);

        let board: Board = self
            .fetch
            .get(&api_url, self.timeout)
            .await?
            .error_for_status()?
            .json()?;

        let mut records = Vec::with_capacity(board.jobs.len());
        for job in board.jobs {
            let mut content = job.content.unwrap_or_default();
            if content.trim().is_empty() {
                if let Some(id) = job.id {
                    content = self.fetch_content(token, id).await?;
                }
            }

            records.push(RawJobRecord {
                title: non_blank(job.title).unwrap_or_else(|| TITLE_NOT_FOUND.to_string()),
                location: non_blank(job.location.and_then(|l| l.name))
                    .unwrap_or_else(|| LOCATION_NOT_FOUND.to_string()),
                link: non_blank(job.absolute_url).unwrap_or_else(|| "#".to_string()),
                description: html::html_to_text(&content),
            });
        }
        Ok(records)
    }

    /// Per-job detail lookup. A non-success status leaves the content empty.
    async fn fetch_content(&self, token: &str, id: u64) -> Result<String, FetchError> {
        let detail_url = format!("{}/{}/jobs/{}", self.api_base, token, id);
        let response = self.fetch.get(&detail_url, self.timeout).await?;
        if !response.is_success() {
            warn!("Greenhouse detail {} returned {}", detail_url, response.status);
            return Ok(String::new());
        }
        let detail: JobDetail = response.json()?;
        Ok(detail.content.unwrap_or_default())
    }
}

#[async_trait]
impl HttpExtractor for GreenhouseExtractor {
    async fn extract(&self, listing: &Listing, target: &Target) -> Vec<RawJobRecord> {
        let Some(token) = board_token(&listing.html, &target.company_name) else {
            warn!(
                "Could not derive a Greenhouse board token for {}",
                target.company_name
            );
            return Vec::new();
        };
        info!("Using Greenhouse board token: {}", token);

        match self.fetch_board(&token).await {
            Ok(records) => {
                info!("Fetched {} jobs from the Greenhouse API", records.len());
                records
            }
            Err(FetchError::Status(status)) => {
                warn!("Greenhouse API returned {} for board {}", status, token);
                Vec::new()
            }
            Err(e) => {
                warn!("Greenhouse API failed for board {}: {}", token, e);
                Vec::new()
            }
        }
    }
}

/// The `for=` token of an embedded board script, else the lower-cased
/// alphanumeric company name. `None` if both come up empty.
pub fn board_token(html: &str, company_name: &str) -> Option<String> {
    let from_embed = html::select_attr(html, "script[src]", "src")
        .into_iter()
        .filter(|src| src.contains("greenhouse.io"))
        .find_map(|src| embed_token(&src));
    if from_embed.is_some() {
        return from_embed;
    }

    let guessed: String = company_name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    (!guessed.is_empty()).then_some(guessed)
}

fn embed_token(src: &str) -> Option<String> {
    let url = Url::parse(EMBED_BASE).ok()?.join(src).ok()?;
    url.query_pairs()
        .find(|(k, v)| k == "for" && !v.trim().is_empty())
        .map(|(_, v)| v.trim().to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
