use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::ProbeError;
use crate::http::HttpClient;

pub const REQUIRED_HEADERS: [&str; 4] = [
    "X-Frame-Options",
    "X-XSS-Protection",
    "Content-Security-Policy",
    "Strict-Transport-Security",
];

/// Outcome of the header check. `checked` is false when the page could not
/// be fetched; `missing` is then empty and carries no scoring impact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderReport {
    pub url: String,
    pub missing: Vec<String>,
    pub checked: bool,
}

impl HeaderReport {
    pub fn unchecked(url: &str) -> Self {
        Self {
            url: url.to_string(),
            missing: Vec::new(),
            checked: false,
        }
    }
}

pub struct HeaderProbe {
    timeout: Duration,
}

impl HeaderProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Lists the required headers absent from the response. Lookup is
    /// case-insensitive; header values are not inspected.
    pub async fn scan(&self, client: &HttpClient, url: &str) -> Result<HeaderReport, ProbeError> {
        let response = client.get(url, self.timeout).await?;
        let headers = response.headers();

        let missing: Vec<String> = REQUIRED_HEADERS
            .iter()
            .filter(|name| !headers.contains_key(**name))
            .map(|name| name.to_string())
            .collect();

        debug!("{} missing security header(s) on {}", missing.len(), url);
        Ok(HeaderReport {
            url: url.to_string(),
            missing,
            checked: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScanConfig;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_all_headers_present() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-frame-options", "DENY")
                    .insert_header("X-XSS-Protection", "1; mode=block")
                    .insert_header("content-security-policy", "default-src 'self'")
                    .insert_header("Strict-Transport-Security", "max-age=0"),
            )
            .mount(&server)
            .await;

        let client = HttpClient::new(&ScanConfig::default()).unwrap();
        let report = HeaderProbe::new(Duration::from_secs(5))
            .scan(&client, &server.uri())
            .await
            .unwrap();

        assert!(report.checked);
        assert!(report.missing.is_empty());
    }

    #[tokio::test]
    async fn test_reports_missing_headers_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).insert_header("X-Frame-Options", "SAMEORIGIN"))
            .mount(&server)
            .await;

        let client = HttpClient::new(&ScanConfig::default()).unwrap();
        let report = HeaderProbe::new(Duration::from_secs(5))
            .scan(&client, &server.uri())
            .await
            .unwrap();

        assert_eq!(report.missing, vec![
            "X-XSS-Protection",
            "Content-Security-Policy",
            "Strict-Transport-Security",
        ]);
    }

    #[tokio::test]
    async fn test_unreachable_is_error() {
        let client = HttpClient::new(&ScanConfig::default()).unwrap();
        let result = HeaderProbe::new(Duration::from_secs(1))
            .scan(&client, "http://127.0.0.1:1/")
            .await;

        assert!(matches!(result, Err(ProbeError::Request(_))));
    }

    #[test]
    fn test_unchecked_has_no_missing() {
        let report = HeaderReport::unchecked("http://example.test");
        assert!(!report.checked);
        assert!(report.missing.is_empty());
    }
}
