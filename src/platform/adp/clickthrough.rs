use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use super::{show_all, LOCATION_SPANS, TITLE};
use crate::boilerplate::Boilerplate;
use crate::browser::{Locator, PageSession};
use crate::config::Settings;
use crate::error::BrowserError;
use crate::html;
use crate::model::{
    RawJobRecord, Target, DESCRIPTION_NOT_FOUND, LOCATION_NOT_SPECIFIED, TITLE_NOT_FOUND,
};
use crate::platform::{PlatformKind, SessionExtractor};

const VIEW_ALL: Locator = Locator::css("button, sdf-button").containing("View all");
const JOB_LIST: Locator = Locator::css(".current-openings-list");
const JOB_ITEM: Locator = Locator::css(".current-openings-item");
const DESCRIPTION: &str = "div.job-description-data-item";
const DESCRIPTION_BLOCKS: &str = "p, ul, ol";

/// Click each listing item, scrape the detail page it opens, then reload the
/// listing. Items are re-located by index on every pass, never cached.
pub struct AdpClickthrough {
    boilerplate: Arc<Boilerplate>,
    view_all_wait: Duration,
    view_all_settle: Duration,
    list_wait: Duration,
    detail_wait: Duration,
}

impl AdpClickthrough {
    pub fn new(settings: &Settings, boilerplate: Arc<Boilerplate>) -> Self {
        Self {
            boilerplate,
            view_all_wait: settings.view_all_wait,
            view_all_settle: settings.view_all_settle,
            list_wait: settings.list_wait,
            detail_wait: settings.detail_wait,
        }
    }

    /// `Ok(None)` when the live list no longer has an item at `index`.
    async fn scrape_item(
        &self,
        session: &mut dyn PageSession,
        index: usize,
    ) -> Result<Option<RawJobRecord>, BrowserError> {
        if !session.wait_for(&JOB_LIST, self.list_wait).await? {
            return Err(BrowserError::Timeout(JOB_LIST.to_string()));
        }
        if index >= session.count(&JOB_ITEM).await? {
            return Ok(None);
        }

        session.click(&JOB_ITEM, index).await?;
        if !session.wait_for_url("jobId=", self.detail_wait).await? {
            return Err(BrowserError::Timeout("jobId= in URL".into()));
        }

        let link = session.current_url().await?;
        let source = session.source().await?;
        Ok(Some(parse_detail(&source, &link, &self.boilerplate)))
    }

    async fn restore(&self, session: &mut dyn PageSession, listing_url: &str) -> Result<(), BrowserError> {
        session.goto(listing_url).await?;
        show_all(session, &VIEW_ALL, self.view_all_wait, self.view_all_settle).await;
        Ok(())
    }
}

#[async_trait]
impl SessionExtractor for AdpClickthrough {
    async fn extract(&self, session: &mut dyn PageSession, target: &Target) -> Vec<RawJobRecord> {
        let listing_url = match session.current_url().await {
            Ok(url) => url,
            Err(e) => {
                warn!("ADP session lost for {}: {}", target.company_name, e);
                return Vec::new();
            }
        };

        show_all(session, &VIEW_ALL, self.view_all_wait, self.view_all_settle).await;

        match session.wait_for(&JOB_LIST, self.list_wait).await {
            Ok(true) => {}
            Ok(false) => {
                warn!("ADP job list never appeared for {}", target.company_name);
                return Vec::new();
            }
            Err(e) => {
                warn!("ADP job list unavailable for {}: {}", target.company_name, e);
                return Vec::new();
            }
        }

        let total = session.count(&JOB_ITEM).await.unwrap_or(0);
        info!("Found {} ADP job items for {}", total, target.company_name);

        let mut records = Vec::new();
        for index in 0..total {
            match self.scrape_item(session, index).await {
                Ok(Some(record)) => {
                    info!("({}/{}) {}", index + 1, total, record.title);
                    records.push(record);
                }
                Ok(None) => {
                    info!("ADP list shrank; stopping at item {}", index + 1);
                    break;
                }
                Err(e) => warn!("Skipping ADP item {}: {}", index + 1, e),
            }

            if index + 1 < total {
                if let Err(e) = self.restore(session, &listing_url).await {
                    warn!("Could not reload ADP listing: {}", e);
                }
            }
        }
        records
    }
}

/// Scrape a detail page: the title, all location spans joined, and the
/// description blocks up to the cut marker with boilerplate blocks skipped.
pub fn parse_detail(source: &str, link: &str, boilerplate: &Boilerplate) -> RawJobRecord {
    let title = html::select_text(source, TITLE).unwrap_or_else(|| TITLE_NOT_FOUND.to_string());

    let location = html::select_all_text(source, LOCATION_SPANS).join(", ");
    let location = if location.is_empty() {
        LOCATION_NOT_SPECIFIED.to_string()
    } else {
        location
    };

    let description = html::blocks_within(source, DESCRIPTION, DESCRIPTION_BLOCKS)
        .map(|blocks| boilerplate.clean_blocks(PlatformKind::Adp, blocks))
        .filter(|kept| !kept.is_empty())
        .map(|kept| kept.join("\n"))
        .unwrap_or_else(|| DESCRIPTION_NOT_FOUND.to_string());

    RawJobRecord {
        title,
        location,
        description,
        link: link.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSession;

    const LISTING: &str = include_str!("../../../tests/fixtures/adp_listing.html");
    const DETAIL: &str = include_str!("../../../tests/fixtures/adp_detail.html");
    const LISTING_URL: &str =
        "https://workforcenow.adp.com/mascsr/default/mdf/recruitment/recruitment.html?cid=c1&ccId=cc1";

    fn detail_url(id: u32) -> String {
        format!("{}&jobId={}", LISTING_URL, id)
    }

    fn target() -> Target {
        Target {
            company_name: "IT Strategies".into(),
            careers_url: LISTING_URL.into(),
            keywords: vec!["cloud".into()],
        }
    }

    fn extractor() -> AdpClickthrough {
        AdpClickthrough::new(&Settings::immediate(), Arc::new(Boilerplate::default()))
    }

    #[test]
    fn detail_parsing() {
        let r = parse_detail(DETAIL, "link", &Boilerplate::default());
        assert_eq!(r.title, "Cloud Engineer");
        assert_eq!(r.location, "Washington, DC, Remote");
        assert_eq!(
            r.description,
            "Operate cloud infrastructure for federal programs.\nTerraform AWS"
        );
    }

    #[test]
    fn detail_sentinels() {
        let r = parse_detail("<html></html>", "link", &Boilerplate::default());
        assert_eq!(r.title, TITLE_NOT_FOUND);
        assert_eq!(r.location, LOCATION_NOT_SPECIFIED);
        assert_eq!(r.description, DESCRIPTION_NOT_FOUND);
    }

    #[tokio::test]
    async fn clicks_through_every_item() {
        let mut session = FakeSession::new()
            .with_page(LISTING_URL, LISTING)
            .with_page(&detail_url(1), DETAIL)
            .with_page(&detail_url(2), "<h2 class='job-description-title'>Data Analyst</h2>")
            .with_click("button, sdf-button", 0, None)
            .with_click(".current-openings-item", 0, Some(&detail_url(1)))
            .with_click(".current-openings-item", 1, Some(&detail_url(2)));
        session.goto(LISTING_URL).await.unwrap();

        let records = extractor().extract(&mut session, &target()).await;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "Cloud Engineer");
        assert_eq!(records[0].link, detail_url(1));
        assert_eq!(records[1].title, "Data Analyst");
        // Initial load plus one reload between the two items.
        assert_eq!(session.visits, vec![LISTING_URL.to_string(), LISTING_URL.to_string()]);
    }

    #[tokio::test]
    async fn failed_item_is_skipped() {
        let mut session = FakeSession::new()
            .with_page(LISTING_URL, LISTING)
            .with_page(&detail_url(2), "<h2 class='job-description-title'>Data Analyst</h2>")
            .with_click(".current-openings-item", 1, Some(&detail_url(2)));
        session.goto(LISTING_URL).await.unwrap();

        let records = extractor().extract(&mut session, &target()).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Data Analyst");
    }

    #[tokio::test]
    async fn missing_list_yields_nothing() {
        let mut session = FakeSession::new().with_page(LISTING_URL, "<p>Maintenance</p>");
        session.goto(LISTING_URL).await.unwrap();
        assert!(extractor().extract(&mut session, &target()).await.is_empty());
    }

    #[tokio::test]
    async fn shrinking_list_stops_early() {
        let three = r#"<div class="current-openings-list">
            <div class="current-openings-item"><sdf-link>Cloud Engineer</sdf-link></div>
            <div class="current-openings-item"><sdf-link>Data Analyst</sdf-link></div>
            <div class="current-openings-item"><sdf-link>Network Engineer</sdf-link></div>
        </div>"#;
        let one = r#"<div class="current-openings-list">
            <div class="current-openings-item"><sdf-link>Cloud Engineer</sdf-link></div>
        </div>"#;

        let mut session = FakeSession::new()
            .with_page(LISTING_URL, three)
            .with_reload(LISTING_URL, one)
            .with_page(&detail_url(1), DETAIL)
            .with_click(".current-openings-item", 0, Some(&detail_url(1)));
        session.goto(LISTING_URL).await.unwrap();

        let records = extractor().extract(&mut session, &target()).await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Cloud Engineer");
        assert_eq!(session.visits, vec![LISTING_URL.to_string(), LISTING_URL.to_string()]);
    }
}
