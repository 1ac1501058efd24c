use async_trait::async_trait;
use log::{debug, info};

use crate::core::mutator;
use crate::core::Finding;
use crate::error::ProbeError;
use crate::http::HttpClient;
use crate::modules::crawler::FormDescriptor;
use crate::modules::FormProbe;
use crate::utils::detector::VulnerabilityDetector;

pub const XSS_PAYLOAD: &str = "<script>alert('XSS')</script>";

pub struct ReflectedXssProbe {
    detector: VulnerabilityDetector,
}

impl ReflectedXssProbe {
    pub fn new() -> Self {
        Self {
            detector: VulnerabilityDetector::new(),
        }
    }

    async fn submit(&self, client: &HttpClient, form: &FormDescriptor) -> Result<bool, ProbeError> {
        let request = mutator::build_form_request(form, XSS_PAYLOAD)?;
        let body = client.send_request(&request).await?.text().await?;
        Ok(self.detector.is_reflected(&body, XSS_PAYLOAD))
    }
}

impl Default for ReflectedXssProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FormProbe for ReflectedXssProbe {
    fn name(&self) -> &'static str {
        "reflected-xss"
    }

    async fn scan_form(&self, client: &HttpClient, form: &FormDescriptor) -> Vec<Finding> {
        match self.submit(client, form).await {
            Ok(true) => {
                info!("Reflected XSS detected on {}", form.action);
                vec![Finding::reflected_xss(&form.action, XSS_PAYLOAD)]
            }
            Ok(false) => Vec::new(),
            Err(e) => {
                debug!("XSS probe skipped {}: {}", form.action, e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Severity, VulnerabilityType};
    use crate::modules::crawler::{FormInput, FormMethod};
    use crate::ScanConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn search_form(action: String) -> FormDescriptor {
        FormDescriptor {
            action,
            method: FormMethod::Get,
            inputs: vec![FormInput {
                name: Some("q".to_string()),
                input_type: "search".to_string(),
                value: String::new(),
            }],
        }
    }

    #[tokio::test]
    async fn test_unescaped_reflection_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(|req: &Request| {
                let q = req
                    .url
                    .query_pairs()
                    .find(|(k, _)| k == "q")
                    .map(|(_, v)| v.into_owned())
                    .unwrap_or_default();
                ResponseTemplate::new(200).set_body_string(format!("<p>Results for {}</p>", q))
            })
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new(&ScanConfig::default()).unwrap();
        let findings = ReflectedXssProbe::new()
            .scan_form(&client, &search_form(format!("{}/search", server.uri())))
            .await;

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].vuln_type, VulnerabilityType::ReflectedXss);
        assert_eq!(findings[0].payload.as_deref(), Some(XSS_PAYLOAD));
        assert_eq!(findings[0].severity, Severity::High);
    }

    #[tokio::test]
    async fn test_escaped_reflection_is_safe() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<p>Results for &lt;script&gt;alert('XSS')&lt;/script&gt;</p>",
            ))
            .mount(&server)
            .await;

        let client = HttpClient::new(&ScanConfig::default()).unwrap();
        let findings = ReflectedXssProbe::new()
            .scan_form(&client, &search_form(format!("{}/search", server.uri())))
            .await;

        assert!(findings.is_empty());
    }
}
