use std::time::Duration;

use log::debug;

use crate::core::Finding;
use crate::error::ProbeError;
use crate::http::HttpClient;
use crate::utils::detector::VulnerabilityDetector;

pub const SENSITIVE_PATHS: [&str; 8] = [
    ".env",
    "config.php",
    ".git/HEAD",
    "backup.zip",
    "db_backup.sql",
    "phpinfo.php",
    "admin/",
    "dashboard/",
];

/// Requests commonly exposed files and directories relative to the target.
pub struct PathProbe {
    timeout: Duration,
    detector: VulnerabilityDetector,
}

impl PathProbe {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            detector: VulnerabilityDetector::new(),
        }
    }

    /// Every path that answers 200 and survives the false-positive filters
    /// becomes a finding. Redirects, other statuses and connection errors
    /// mean "not exposed".
    pub async fn scan(&self, client: &HttpClient, base_url: &str) -> Vec<Finding> {
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }

        let mut findings = Vec::new();
        for path in SENSITIVE_PATHS {
            let target = format!("{}{}", base, path);
            match self.check(client, &target, path).await {
                Ok(Some(finding)) => findings.push(finding),
                Ok(None) => {}
                Err(e) => debug!("Path probe skipped {}: {}", target, e),
            }
        }
        findings
    }

    async fn check(
        &self,
        client: &HttpClient,
        target: &str,
        path: &str,
    ) -> Result<Option<Finding>, ProbeError> {
        let response = client.get_without_redirects(target, self.timeout).await?;
        if response.status().as_u16() != 200 {
            return Ok(None);
        }

        let body = response.text().await?;
        if let Some(reason) = self.detector.path_false_positive(path, &body) {
            debug!("Discarded {} as false positive: {:?}", target, reason);
            return Ok(None);
        }

        Ok(Some(Finding::sensitive_path(target, path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Severity, VulnerabilityType};
    use crate::ScanConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> HttpClient {
        HttpClient::new(&ScanConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_soft_404_everywhere_yields_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>Page Not Found</html>"))
            .expect(SENSITIVE_PATHS.len() as u64)
            .mount(&server)
            .await;

        let findings = PathProbe::new(Duration::from_secs(3)).scan(&client(), &server.uri()).await;
        assert!(findings.is_empty());
    }

    #[tokio::test]
    async fn test_exposed_paths_and_severity() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/.env"))
            .respond_with(ResponseTemplate::new(200).set_body_string("DB_PASSWORD=hunter2\n"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/admin/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Admin panel"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/dashboard/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Dashboard"))
            .mount(&server)
            .await;

        let findings = PathProbe::new(Duration::from_secs(3))
            .scan(&client(), &format!("{}/", server.uri()))
            .await;

        assert_eq!(findings.len(), 3);
        assert!(findings.iter().all(|f| f.vuln_type == VulnerabilityType::SensitivePathDisclosure));

        assert_eq!(findings[0].url, format!("{}/.env", server.uri()));
        assert_eq!(findings[0].severity, Severity::High);
        assert_eq!(findings[1].url, format!("{}/admin/", server.uri()));
        assert_eq!(findings[1].severity, Severity::Medium);
        assert_eq!(findings[2].payload.as_deref(), Some("GET dashboard/"));
        assert_eq!(findings[2].severity, Severity::High);
    }

    #[tokio::test]
    async fn test_redirects_are_not_followed() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/admin/"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/panel"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/panel"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Admin panel"))
            .expect(0)
            .mount(&server)
            .await;

        let findings = PathProbe::new(Duration::from_secs(3)).scan(&client(), &server.uri()).await;
        assert!(findings.is_empty());
    }

    #[tokio::test]
    async fn test_filtered_candidates() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/backup.zip"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>Coming soon</body></html>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/.env"))
            .respond_with(ResponseTemplate::new(200).set_body_string("just some text"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/config.php"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Please login first"))
            .mount(&server)
            .await;

        let findings = PathProbe::new(Duration::from_secs(3)).scan(&client(), &server.uri()).await;
        assert!(findings.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_silent() {
        let findings = PathProbe::new(Duration::from_secs(1))
            .scan(&client(), "http://127.0.0.1:1")
            .await;
        assert!(findings.is_empty());
    }
}
