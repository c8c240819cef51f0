use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use super::{show_all, LOCATION_SPANS, TITLE};
use crate::boilerplate::Boilerplate;
use crate::browser::{CapturedResponse, Locator, PageSession};
use crate::config::Settings;
use crate::error::BrowserError;
use crate::html;
use crate::model::{RawJobRecord, Target, DESCRIPTION_NOT_FOUND, LOCATION_NOT_FOUND, TITLE_NOT_FOUND};
use crate::platform::{PlatformKind, SessionExtractor};

const SHOW_ALL: Locator = Locator::css("#recruitment_careerCenter_showAllJobs");
const REQUISITIONS: &str = "job-requisitions";
const ID_FIELD: &str = "stringValue";
const DETAIL_BASE: &str = "https://workforcenow.adp.com/mascsr/default/mdf/recruitment/recruitment.html";
const DESCRIPTION: &str = ".job-description-data";

/// Trigger the full listing, read job ids out of the captured requisition
/// JSON, then visit each job's detail URL in turn.
pub struct AdpIntercept {
    boilerplate: Arc<Boilerplate>,
    show_all_wait: Duration,
    show_all_settle: Duration,
    page_settle: Duration,
    cid: Option<String>,
    ccid: Option<String>,
}

impl AdpIntercept {
    pub fn new(settings: &Settings, boilerplate: Arc<Boilerplate>) -> Self {
        Self {
            boilerplate,
            show_all_wait: settings.list_wait,
            show_all_settle: settings.intercept_settle,
            page_settle: settings.page_settle,
            cid: settings.adp_cid.clone(),
            ccid: settings.adp_ccid.clone(),
        }
    }

    /// Career-center instance and client ids: from the careers URL query,
    /// else from settings.
    fn instance_ids(&self, careers_url: &str) -> Option<(String, String)> {
        let query: Vec<(String, String)> = Url::parse(careers_url)
            .map(|u| u.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect())
            .unwrap_or_default();
        let param = |name: &str| {
            query
                .iter()
                .find(|(k, v)| k == name && !v.is_empty())
                .map(|(_, v)| v.clone())
        };

        let cid = param("cid").or_else(|| self.cid.clone())?;
        let ccid = param("ccId").or_else(|| self.ccid.clone())?;
        Some((cid, ccid))
    }

    /// Reload the current listing with an empty network log so only this
    /// listing's requisition responses are captured.
    async fn capture_listing(&self, session: &mut dyn PageSession) -> Result<(), BrowserError> {
        let listing_url = session.current_url().await?;
        session.clear_network_log().await?;
        session.goto(&listing_url).await?;
        show_all(session, &SHOW_ALL, self.show_all_wait, self.show_all_settle).await;
        Ok(())
    }

    async fn scrape_link(&self, session: &mut dyn PageSession, link: &str) -> Result<RawJobRecord, BrowserError> {
        session.goto(link).await?;
        tokio::time::sleep(self.page_settle).await;
        let source = session.source().await?;
        Ok(parse_detail(&source, link, &self.boilerplate))
    }
}

#[async_trait]
impl SessionExtractor for AdpIntercept {
    async fn extract(&self, session: &mut dyn PageSession, target: &Target) -> Vec<RawJobRecord> {
        let Some((cid, ccid)) = self.instance_ids(&target.careers_url) else {
            warn!(
                "No ADP cid/ccId for {}; set them in the careers URL or settings",
                target.company_name
            );
            return Vec::new();
        };

        if let Err(e) = self.capture_listing(session).await {
            warn!("Cannot reload ADP listing for {}: {}", target.company_name, e);
            return Vec::new();
        }

        let responses = match session.network_log().await {
            Ok(responses) => responses,
            Err(e) => {
                warn!("Cannot read ADP network log for {}: {}", target.company_name, e);
                return Vec::new();
            }
        };

        let links: Vec<String> = collect_job_ids(&responses)
            .iter()
            .map(|id| detail_url(&cid, &ccid, id))
            .collect();
        info!("Found {} ADP job ids for {}", links.len(), target.company_name);

        let mut records = Vec::with_capacity(links.len());
        for (i, link) in links.iter().enumerate() {
            info!("({}/{}) Scraping {}", i + 1, links.len(), link);
            match self.scrape_link(session, link).await {
                Ok(record) => records.push(record),
                Err(e) => warn!("Failed to process {}: {}", link, e),
            }
        }
        records
    }
}

/// Every non-blank `stringValue` found anywhere in the JSON bodies of
/// requisition responses, in encounter order.
pub fn collect_job_ids(responses: &[CapturedResponse]) -> Vec<String> {
    let mut ids = Vec::new();
    for response in responses {
        if !response.url.contains(REQUISITIONS) || !response.content_type.contains("application/json") {
            continue;
        }
        match serde_json::from_str::<Value>(&response.body) {
            Ok(body) => walk(&body, &mut ids),
            Err(e) => debug!("Unparseable requisitions body from {}: {}", response.url, e),
        }
    }
    ids
}

fn walk(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if key == ID_FIELD {
                    if let Some(s) = child.as_str().map(str::trim).filter(|s| !s.is_empty()) {
                        out.push(s.to_string());
                    }
                }
                walk(child, out);
            }
        }
        Value::Array(items) => items.iter().for_each(|item| walk(item, out)),
        _ => {}
    }
}

pub fn detail_url(cid: &str, ccid: &str, job_id: &str) -> String {
    let params = [
        ("cid", cid),
        ("ccId", ccid),
        ("lang", "en_US"),
        ("selectedMenuKey", "CareerCenter"),
        ("jobId", job_id),
    ];
    match Url::parse_with_params(DETAIL_BASE, &params) {
        Ok(url) => url.to_string(),
        Err(_) => format!(
            "{}?cid={}&ccId={}&lang=en_US&selectedMenuKey=CareerCenter&jobId={}",
            DETAIL_BASE, cid, ccid, job_id
        ),
    }
}

/// Scrape a detail page: the title, the first location span, and the
/// description text cut at the marker with the intro paragraph stripped.
pub fn parse_detail(source: &str, link: &str, boilerplate: &Boilerplate) -> RawJobRecord {
    let title = html::select_text(source, TITLE).unwrap_or_else(|| TITLE_NOT_FOUND.to_string());
    let location = html::select_all_text(source, LOCATION_SPANS)
        .into_iter()
        .next()
        .unwrap_or_else(|| LOCATION_NOT_FOUND.to_string());
    let description = html::select_lines(source, DESCRIPTION)
        .map(|raw| boilerplate.clean_text(PlatformKind::Adp, &raw))
        .unwrap_or_else(|| DESCRIPTION_NOT_FOUND.to_string());

    RawJobRecord {
        title,
        location,
        description,
        link: link.to_string(),
    }
}
