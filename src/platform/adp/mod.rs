//! ADP Workforce Now career centers. Two interchangeable algorithms produce
//! the same records: [`AdpClickthrough`] drives the listing UI item by item,
//! [`AdpIntercept`] reads job ids out of the requisitions JSON the page loads.

mod clickthrough;
mod intercept;

pub use clickthrough::AdpClickthrough;
pub use intercept::AdpIntercept;

use tracing::{debug, info};

use crate::browser::{Locator, PageSession};

const TITLE: &str = "h2.job-description-title";
const LOCATION_SPANS: &str = ".job-description-location-item span";

/// Click a "show all jobs" control if one appears in time, then let the list
/// settle. Absence or a failed click is not an error.
async fn show_all(
    session: &mut dyn PageSession,
    control: &Locator,
    wait: std::time::Duration,
    settle: std::time::Duration,
) {
    match session.wait_for(control, wait).await {
        Ok(true) => match session.click(control, 0).await {
            Ok(()) => {
                info!("Clicked '{}'", control);
                tokio::time::sleep(settle).await;
            }
            Err(e) => debug!("Could not click '{}': {}", control, e),
        },
        Ok(false) => info!("'{}' not found, proceeding", control),
        Err(e) => debug!("Waiting for '{}' failed: {}", control, e),
    }
}
