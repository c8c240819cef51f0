use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::model::NO_JOB_ID;

static PAYLOCITY_DETAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/Jobs/Details/(\d+)/?$").unwrap());
static TRAILING_DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/(\d{4,})/?$").unwrap());
static TRAILING_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[=/]([a-zA-Z0-9_-]{6,})/?$").unwrap());

/// Query parameters that carry a job id, highest priority first.
const ID_PARAMS: &[&str] = &["jobId", "gh_jid", "reqid", "id", "jobID", "p_jid"];

/// Upper-cased company name with every non-alphanumeric character removed.
pub fn sanitize_company(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_uppercase()
}

/// Raw id pulled from a job link, or `None` when no heuristic applies.
pub fn extract_id(link: &str) -> Option<String> {
    let parsed = Url::parse(link).ok();

    if let Some(url) = &parsed {
        if let Some(id) = platform_id(url) {
            return Some(id);
        }
        if let Some(id) = query_id(url) {
            return Some(id);
        }
        if let Some(caps) = TRAILING_DIGITS_RE.captures(url.path()) {
            return Some(caps[1].to_string());
        }
    }

    TRAILING_TOKEN_RE
        .captures(link)
        .map(|caps| caps[1].to_string())
}

/// `{COMPANY}-{id}`, or the bare `N/A` sentinel.
pub fn unique_job_id(company_name: &str, link: &str) -> String {
    match extract_id(link) {
        Some(id) => format!("{}-{}", sanitize_company(company_name), id),
        None => NO_JOB_ID.to_string(),
    }
}

fn platform_id(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    if host.ends_with("paylocity.com") {
        return PAYLOCITY_DETAIL_RE
            .captures(url.path())
            .map(|caps| caps[1].to_string());
    }
    None
}

fn query_id(url: &Url) -> Option<String> {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.trim().to_string()))
        .collect();

    ID_PARAMS.iter().find_map(|param| {
        pairs
            .iter()
            .find(|(k, v)| k == param && !v.is_empty())
            .map(|(_, v)| v.clone())
    })
}
