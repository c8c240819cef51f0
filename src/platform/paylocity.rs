//! Paylocity boards: job links come from the listing, detail pages are
//! fetched concurrently over HTTP.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use url::Url;

use super::{HttpExtractor, Listing, PlatformKind};
use crate::boilerplate::Boilerplate;
use crate::config::Settings;
use crate::error::FetchError;
use crate::html;
use crate::model::{RawJobRecord, Target, LOCATION_NOT_FOUND, TITLE_NOT_FOUND};
use crate::net::Fetch;

const JOB_LINKS: &str = r#"div.job-listing-job-item a[href*="/Jobs/Details/"]"#;
const TITLE: &str = "span.job-preview-title span";
const HEADING: &str = "h1";
const LOCATION: &str = "div.preview-location";
const DESCRIPTION: &str = "div.job-preview-details > div:nth-of-type(3)";
const DESCRIPTION_BLOCKS: &str = "p, ul, ol";

pub struct PaylocityExtractor {
    fetch: Arc<dyn Fetch>,
    timeout: Duration,
    concurrency: usize,
    boilerplate: Arc<Boilerplate>,
}

impl PaylocityExtractor {
    pub fn new(fetch: Arc<dyn Fetch>, settings: &Settings, boilerplate: Arc<Boilerplate>) -> Self {
        Self {
            fetch,
            timeout: settings.paylocity_timeout,
            concurrency: settings.paylocity_concurrency.max(1),
            boilerplate,
        }
    }
}

#[async_trait]
impl HttpExtractor for PaylocityExtractor {
    async fn extract(&self, listing: &Listing, target: &Target) -> Vec<RawJobRecord> {
        let links = job_links(&listing.html, &target.careers_url, &listing.url);
        info!("Found {} Paylocity job links for {}", links.len(), target.company_name);
        if links.is_empty() {
            return Vec::new();
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for link in links {
            let fetch = Arc::clone(&self.fetch);
            let boilerplate = Arc::clone(&self.boilerplate);
            let sem = Arc::clone(&semaphore);
            let timeout = self.timeout;

            tasks.spawn(async move {
                let _permit = sem.acquire_owned().await.ok()?;
                match fetch_detail(fetch.as_ref(), &link, timeout).await {
                    Ok(body) => Some(parse_detail(&body, &link, &boilerplate)),
                    Err(e) => {
                        warn!("Failed to fetch {}: {}", link, e);
                        None
                    }
                }
            });
        }

        let mut records = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => warn!("Paylocity detail task aborted: {}", e),
            }
        }
        debug!("Paylocity produced {} records", records.len());
        records
    }
}

async fn fetch_detail(fetch: &dyn Fetch, link: &str, timeout: Duration) -> Result<String, FetchError> {
    Ok(fetch.get(link, timeout).await?.error_for_status()?.body)
}

/// Absolute detail links, resolved against the careers URL (or the loaded
/// page URL when the careers URL does not parse).
pub fn job_links(html: &str, careers_url: &str, page_url: &str) -> Vec<String> {
    let Some(base) = Url::parse(careers_url).or_else(|_| Url::parse(page_url)).ok() else {
        warn!("Cannot resolve Paylocity links against {}", careers_url);
        return Vec::new();
    };

    html::select_attr(html, JOB_LINKS, "href")
        .into_iter()
        .filter_map(|href| match base.join(&href) {
            Ok(url) => Some(url.to_string()),
            Err(e) => {
                warn!("Skipping unresolvable link {}: {}", href, e);
                None
            }
        })
        .collect()
}

/// Scrape one detail page. Missing fields fall back to sentinels.
pub fn parse_detail(body: &str, link: &str, boilerplate: &Boilerplate) -> RawJobRecord {
    let title = html::select_text(body, TITLE)
        .or_else(|| html::select_text(body, HEADING))
        .unwrap_or_else(|| TITLE_NOT_FOUND.to_string());
    let location =
        html::select_text(body, LOCATION).unwrap_or_else(|| LOCATION_NOT_FOUND.to_string());

    let description = html::blocks_within(body, DESCRIPTION, DESCRIPTION_BLOCKS)
        .filter(|blocks| !blocks.is_empty())
        .or_else(|| html::child_blocks(body, DESCRIPTION))
        .map(|blocks| {
            let kept = boilerplate.clean_blocks(PlatformKind::Paylocity, blocks);
            boilerplate.clean_text(PlatformKind::Paylocity, &kept.join("\n"))
        })
        .unwrap_or_default();

    RawJobRecord {
        title,
        location,
        description,
        link: link.to_string(),
    }
}
