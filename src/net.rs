use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::FetchError;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// A fetched HTTP response. `url` is the final URL after redirects.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub url: String,
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

impl Fetched {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn error_for_status(self) -> Result<Self, FetchError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(FetchError::Status(self.status))
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        serde_json::from_str(&self.body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

/// Outbound HTTP GET with an explicit per-request bound.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn get(&self, url: &str, timeout: Duration) -> Result<Fetched, FetchError>;
}

pub struct ReqwestFetch {
    client: reqwest::Client,
}

impl ReqwestFetch {
    pub fn new(user_agent: Option<&str>) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent.unwrap_or(DEFAULT_USER_AGENT))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetch for ReqwestFetch {
    async fn get(&self, url: &str, timeout: Duration) -> Result<Fetched, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(classify)?;

        let final_url = response.url().to_string();
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = response.text().await.map_err(classify)?;

        Ok(Fetched {
            url: final_url,
            status,
            content_type,
            body,
        })
    }
}

fn classify(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else if e.is_decode() || e.is_body() {
        FetchError::Decode(e.to_string())
    } else {
        FetchError::Network(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetched(status: u16, body: &str) -> Fetched {
        Fetched {
            url: "https://example.com".into(),
            status,
            content_type: "application/json".into(),
            body: body.into(),
        }
    }

    #[test]
    fn status_errors() {
        assert!(fetched(200, "").error_for_status().is_ok());
        assert!(matches!(
            fetched(404, "").error_for_status(),
            Err(FetchError::Status(404))
        ));
    }

    #[test]
    fn json_decode_errors() {
        let ok: serde_json::Value = fetched(200, r#"{"jobs":[]}"#).json().unwrap();
        assert!(ok["jobs"].is_array());
        let bad: Result<serde_json::Value, _> = fetched(200, "<html>").json();
        assert!(matches!(bad, Err(FetchError::Decode(_))));
    }
}
