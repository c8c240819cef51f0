//! Platform detection and extractor dispatch.
//!
//! A [`Dispatcher`] holds an ordered list of routes, each pairing a platform
//! signature with the extractor for that platform. The first route whose
//! signature matches the loaded page wins.

pub mod adp;
pub mod greenhouse;
pub mod paylocity;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::boilerplate::Boilerplate;
use crate::browser::{Locator, PageSession};
use crate::config::{AdpMode, Settings};
use crate::error::BrowserError;
use crate::model::{RawJobRecord, Target};
use crate::net::Fetch;

use adp::{AdpClickthrough, AdpIntercept};
use greenhouse::GreenhouseExtractor;
use paylocity::PaylocityExtractor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    Paylocity,
    Adp,
    Greenhouse,
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Paylocity => "Paylocity",
            Self::Adp => "ADP",
            Self::Greenhouse => "Greenhouse",
        })
    }
}

/// How a platform is recognised on the loaded page.
#[derive(Debug, Clone, Copy)]
pub enum Signature {
    /// The current (post-redirect) URL contains this substring.
    UrlContains(&'static str),
    /// An element matching the locator appears within the probe timeout.
    Dom(Locator),
}

/// What an extractor needs to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Reads a snapshot of the listing page, then works over plain HTTP.
    Http,
    /// Drives the live page session; must run serially.
    Session,
}

/// Snapshot of the loaded listing page.
#[derive(Debug, Clone)]
pub struct Listing {
    pub url: String,
    pub html: String,
}

/// Extractors never fail: errors are logged and yield fewer records.
#[async_trait]
pub trait HttpExtractor: Send + Sync {
    async fn extract(&self, listing: &Listing, target: &Target) -> Vec<RawJobRecord>;
}

#[async_trait]
pub trait SessionExtractor: Send + Sync {
    async fn extract(&self, session: &mut dyn PageSession, target: &Target) -> Vec<RawJobRecord>;
}

pub enum Extractor {
    Http(Arc<dyn HttpExtractor>),
    Session(Arc<dyn SessionExtractor>),
}

impl Extractor {
    pub fn capability(&self) -> Capability {
        match self {
            Self::Http(_) => Capability::Http,
            Self::Session(_) => Capability::Session,
        }
    }
}

pub struct Route {
    pub kind: PlatformKind,
    pub signature: Signature,
    pub extractor: Extractor,
}

/// Outcome of dispatching one target.
#[derive(Debug, Default)]
pub struct Dispatch {
    pub platform: Option<PlatformKind>,
    pub records: Vec<RawJobRecord>,
}

pub struct Dispatcher {
    routes: Vec<Route>,
    probe_timeout: Duration,
}

const GREENHOUSE_BOARD: Locator = Locator::css("#grnhse_app, a[class*='board-list__item']");

impl Dispatcher {
    pub fn new(routes: Vec<Route>, probe_timeout: Duration) -> Self {
        Self {
            routes,
            probe_timeout,
        }
    }

    /// Paylocity and ADP by URL, then Greenhouse by DOM probe.
    pub fn standard(settings: &Settings, fetch: Arc<dyn Fetch>, boilerplate: Arc<Boilerplate>) -> Self {
        let adp: Arc<dyn SessionExtractor> = match settings.adp_mode {
            AdpMode::Clickthrough => Arc::new(AdpClickthrough::new(settings, boilerplate.clone())),
            AdpMode::Intercept => Arc::new(AdpIntercept::new(settings, boilerplate.clone())),
        };

        let routes = vec![
            Route {
                kind: PlatformKind::Paylocity,
                signature: Signature::UrlContains("recruiting.paylocity.com"),
                extractor: Extractor::Http(Arc::new(PaylocityExtractor::new(
                    fetch.clone(),
                    settings,
                    boilerplate,
                ))),
            },
            Route {
                kind: PlatformKind::Adp,
                signature: Signature::UrlContains("workforcenow.adp.com"),
                extractor: Extractor::Session(adp),
            },
            Route {
                kind: PlatformKind::Greenhouse,
                signature: Signature::Dom(GREENHOUSE_BOARD),
                extractor: Extractor::Http(Arc::new(GreenhouseExtractor::new(fetch, settings))),
            },
        ];

        Self::new(routes, settings.greenhouse_probe)
    }

    /// Navigate the session to the target's careers page.
    pub async fn load(&self, session: &mut dyn PageSession, target: &Target) -> Result<(), BrowserError> {
        info!("Navigating to {}", target.careers_url);
        session.goto(&target.careers_url).await
    }

    /// Pick the route for the already-loaded page, if any.
    pub async fn resolve(&self, session: &mut dyn PageSession) -> Result<Option<&Route>, BrowserError> {
        let current = session.current_url().await?;
        for route in &self.routes {
            let matched = match route.signature {
                Signature::UrlContains(needle) => current.contains(needle),
                Signature::Dom(locator) => session.wait_for(&locator, self.probe_timeout).await?,
            };
            if matched {
                return Ok(Some(route));
            }
        }
        Ok(None)
    }

    /// Extract records from the already-loaded page.
    pub async fn extract(&self, session: &mut dyn PageSession, target: &Target) -> Result<Dispatch, BrowserError> {
        let Some(route) = self.resolve(session).await? else {
            warn!(
                "No parsing strategy found for {}; no jobs will be processed",
                target.company_name
            );
            return Ok(Dispatch::default());
        };

        info!(
            "{} site detected for {} ({:?} extractor)",
            route.kind,
            target.company_name,
            route.extractor.capability()
        );

        let records = match &route.extractor {
            Extractor::Http(extractor) => {
                let listing = Listing {
                    url: session.current_url().await?,
                    html: session.source().await?,
                };
                extractor.extract(&listing, target).await
            }
            Extractor::Session(extractor) => extractor.extract(session, target).await,
        };

        Ok(Dispatch {
            platform: Some(route.kind),
            records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeFetch, FakeSession};

    struct Canned(&'static str);

    async fn dispatch(d: &Dispatcher, session: &mut FakeSession, target: &Target) -> Result<Dispatch, BrowserError> {
        d.load(session, target).await?;
        d.extract(session, target).await
    }

    #[async_trait]
    impl HttpExtractor for Canned {
        async fn extract(&self, listing: &Listing, _target: &Target) -> Vec<RawJobRecord> {
            vec![RawJobRecord {
                title: self.0.to_string(),
                location: String::new(),
                description: listing.html.clone(),
                link: listing.url.clone(),
            }]
        }
    }

    fn target(url: &str) -> Target {
        Target {
            company_name: "Acme".into(),
            careers_url: url.into(),
            keywords: vec!["Engineer".into()],
        }
    }

    fn routes() -> Vec<Route> {
        vec![
            Route {
                kind: PlatformKind::Paylocity,
                signature: Signature::UrlContains("recruiting.paylocity.com"),
                extractor: Extractor::Http(Arc::new(Canned("paylocity"))),
            },
            Route {
                kind: PlatformKind::Greenhouse,
                signature: Signature::Dom(GREENHOUSE_BOARD),
                extractor: Extractor::Http(Arc::new(Canned("greenhouse"))),
            },
        ]
    }

    #[tokio::test]
    async fn url_signature_follows_redirects() {
        let mut session = FakeSession::new()
            .with_redirect("https://acme.example.com/jobs", "https://recruiting.paylocity.com/x")
            .with_page("https://recruiting.paylocity.com/x", "<p>listing</p>");
        let d = Dispatcher::new(routes(), Duration::ZERO);

        let out = dispatch(&d, &mut session, &target("https://acme.example.com/jobs")).await.unwrap();
        assert_eq!(out.platform, Some(PlatformKind::Paylocity));
        assert_eq!(out.records[0].title, "paylocity");
        assert_eq!(out.records[0].link, "https://recruiting.paylocity.com/x");
    }

    #[tokio::test]
    async fn dom_signature_selects_greenhouse() {
        let mut session = FakeSession::new().with_page(
            "https://acme.example.com/careers",
            r#"<a class="board-list__item" href="/jobs/1">Job</a>"#,
        );
        let d = Dispatcher::new(routes(), Duration::ZERO);

        let out = dispatch(&d, &mut session, &target("https://acme.example.com/careers")).await.unwrap();
        assert_eq!(out.platform, Some(PlatformKind::Greenhouse));
    }

    #[tokio::test]
    async fn no_signature_is_empty_not_error() {
        let mut session =
            FakeSession::new().with_page("https://acme.example.com/careers", "<h1>Careers</h1>");
        let d = Dispatcher::new(routes(), Duration::ZERO);

        let out = dispatch(&d, &mut session, &target("https://acme.example.com/careers")).await.unwrap();
        assert_eq!(out.platform, None);
        assert!(out.records.is_empty());
    }

    #[tokio::test]
    async fn navigation_failure_propagates() {
        let mut session = FakeSession::new();
        let d = Dispatcher::new(routes(), Duration::ZERO);
        let err = dispatch(&d, &mut session, &target("https://down.example.com")).await.unwrap_err();
        assert!(matches!(err, BrowserError::Navigation { .. }));
    }

    #[tokio::test]
    async fn standard_routes_in_order() {
        let d = Dispatcher::standard(
            &Settings::immediate(),
            Arc::new(FakeFetch::new()),
            Arc::new(Boilerplate::default()),
        );
        let kinds: Vec<_> = d.routes.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![PlatformKind::Paylocity, PlatformKind::Adp, PlatformKind::Greenhouse]
        );
        assert_eq!(d.routes[1].extractor.capability(), Capability::Session);
    }
}
