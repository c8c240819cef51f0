use serde::{Deserialize, Serialize};

pub const TITLE_NOT_FOUND: &str = "Title not found";
pub const LOCATION_NOT_FOUND: &str = "Location not found";
pub const LOCATION_NOT_SPECIFIED: &str = "Location not specified";
pub const DESCRIPTION_NOT_FOUND: &str = "Description not found";
pub const NO_JOB_ID: &str = "N/A";

/// One company's scraping request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub company_name: String,
    pub careers_url: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Job fields as scraped, before keyword filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawJobRecord {
    pub title: String,
    pub location: String,
    pub description: String,
    pub link: String,
}

impl RawJobRecord {
    /// Text the keyword matcher runs against.
    pub fn search_text(&self) -> String {
        format!("{} {} {}", self.title, self.location, self.description)
    }
}

/// A keyword-matched, identifier-tagged job, ready for ticket upsert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobCard {
    pub company: String,
    pub job_title: String,
    pub location: String,
    pub matched_keywords: Vec<String>,
    pub link: String,
    pub unique_job_id: String,
}
