//! Thin JSON GET client shared by the OpenAQ sources.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::error::{FetchError, truncate_body};

/// Timeout for the primary request of a query.
pub const PRIMARY_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for per-location follow-up requests.
pub const SECONDARY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct JsonClient {
    base_url: String,
    api_key: String,
    http: Client,
}

impl JsonClient {
    pub fn new(base_url: impl Into<String>, api_key: String) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// GET `{base_url}{path}` and decode the body as `T`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        timeout: Duration,
    ) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base_url, path);

        let res = self
            .http
            .get(&url)
            .header("X-API-Key", &self.api_key)
            .query(query)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&url, timeout, e))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(&url, timeout, e))?;

        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|source| FetchError::Decode { url, source })
    }
}
