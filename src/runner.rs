use chrono::{DateTime, Utc};
use indicatif::ProgressBar;
use serde::Serialize;
use tracing::{info, warn};

use crate::browser::PageSession;
use crate::matcher;
use crate::model::{JobCard, Target};
use crate::platform::Dispatcher;

/// Counters for one batch, owned by the coordinating loop.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub targets: usize,
    pub failed_targets: usize,
    pub unmatched_targets: usize,
    pub page_loads: usize,
    pub raw_records: usize,
    pub cards: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunReport {
    fn new() -> Self {
        Self {
            targets: 0,
            failed_targets: 0,
            unmatched_targets: 0,
            page_loads: 0,
            raw_records: 0,
            cards: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }
}

/// Process targets one at a time through the single session. A failing
/// target is logged and skipped; the batch always completes.
pub async fn run_targets(
    session: &mut dyn PageSession,
    dispatcher: &Dispatcher,
    targets: &[Target],
    pb: &ProgressBar,
) -> (Vec<JobCard>, RunReport) {
    let mut report = RunReport::new();
    let mut cards = Vec::new();

    for target in targets {
        report.targets += 1;
        pb.set_message(target.company_name.clone());
        info!(
            "Processing {} (keywords: {})",
            target.company_name,
            target.keywords.join(", ")
        );

        if let Err(e) = dispatcher.load(session, target).await {
            warn!("Skipping {}: {}", target.company_name, e);
            report.failed_targets += 1;
            pb.inc(1);
            continue;
        }
        report.page_loads += 1;

        match dispatcher.extract(session, target).await {
            Ok(dispatch) => {
                if dispatch.platform.is_none() {
                    report.unmatched_targets += 1;
                }
                report.raw_records += dispatch.records.len();
                let found = matcher::validate_and_format(&dispatch.records, target);
                info!(
                    "{}: {} of {} jobs matched",
                    target.company_name,
                    found.len(),
                    dispatch.records.len()
                );
                report.cards += found.len();
                cards.extend(found);
            }
            Err(e) => {
                warn!("Skipping {}: {}", target.company_name, e);
                report.failed_targets += 1;
            }
        }
        pb.inc(1);
    }

    report.finished_at = Some(Utc::now());
    (cards, report)
}
