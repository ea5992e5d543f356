//! Retrieval of raw CSV payloads.
//!
//! This is the only suspending part of the system. The normalizers receive
//! already-retrieved bytes; transport errors are reported here as
//! [`RetrievalError`] and retries, when configured, happen here too.

use std::time::Duration;

use crate::api::logs::{log_info, log_warning};
use crate::catalog::SourceLocator;
use crate::error::{RetrievalError, RetrievalResult};

/// Default number of attempts for transport failures
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Delay between attempts in milliseconds
const RETRY_DELAY_MS: u64 = 1000;

/// Request timeout
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Fetches CSV bytes from URLs or local files
#[derive(Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    max_attempts: u32,
    retry_delay: Duration,
}

impl Fetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            client,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
        }
    }

    /// Set the number of attempts (at least one)
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Set the delay between attempts
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Fetch the payload behind `locator`
    pub async fn fetch(&self, locator: &SourceLocator) -> RetrievalResult<Vec<u8>> {
        match locator {
            SourceLocator::File(path) => {
                tokio::fs::read(path)
                    .await
                    .map_err(|source| RetrievalError::File {
                        path: path.display().to_string(),
                        source,
                    })
            }
            SourceLocator::Url(url) => self.fetch_url(url).await,
        }
    }

    /// Fetch a URL, retrying transport failures only
    async fn fetch_url(&self, url: &str) -> RetrievalResult<Vec<u8>> {
        let mut attempt = 1;
        loop {
            match self.try_fetch_url(url).await {
                Ok(bytes) => return Ok(bytes),
                Err(err @ RetrievalError::Transport { .. }) if attempt < self.max_attempts => {
                    log_warning(format!(
                        "Attempt {}/{} failed: {}",
                        attempt, self.max_attempts, err
                    ));
                    log_info(format!("Retrying in {}ms...", self.retry_delay.as_millis()));
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn try_fetch_url(&self, url: &str) -> RetrievalResult<Vec<u8>> {
        let transport = |e: reqwest::Error| RetrievalError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RetrievalError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(transport)?;
        Ok(body.to_vec())
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_fetch_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.csv");
        std::fs::write(&path, "Months,A\nJan,1\n").unwrap();

        let bytes = Fetcher::new()
            .fetch(&SourceLocator::File(path))
            .await
            .unwrap();
        assert_eq!(bytes, b"Months,A\nJan,1\n");
    }

    #[tokio::test]
    async fn test_missing_file_is_retrieval_error() {
        let locator = SourceLocator::File(PathBuf::from("/nonexistent/usage-sheets/missing.csv"));
        let err = Fetcher::new().fetch(&locator).await.unwrap_err();
        assert!(matches!(err, RetrievalError::File { .. }));
        assert!(err.to_string().contains("missing.csv"));
    }

    #[tokio::test]
    async fn test_unreachable_url_is_transport_error() {
        let fetcher = Fetcher::new()
            .with_max_attempts(2)
            .with_retry_delay(Duration::from_millis(1));
        let locator = SourceLocator::Url("http://127.0.0.1:9/sheet.csv".to_string());

        let err = fetcher.fetch(&locator).await.unwrap_err();
        assert!(matches!(err, RetrievalError::Transport { .. }));
    }
}
