use async_trait::async_trait;
use log::{debug, info};

use crate::core::mutator;
use crate::core::Finding;
use crate::error::ProbeError;
use crate::http::HttpClient;
use crate::modules::crawler::FormDescriptor;
use crate::modules::FormProbe;
use crate::utils::detector::VulnerabilityDetector;

/// Error-based payloads, tried in this order.
pub const SQLI_PAYLOADS: [&str; 4] = ["'", "\"", "' OR '1'='1", "\" OR \"1\"=\"1"];

pub struct SqlInjectionProbe {
    detector: VulnerabilityDetector,
}

impl SqlInjectionProbe {
    pub fn new() -> Self {
        Self {
            detector: VulnerabilityDetector::new(),
        }
    }

    async fn try_payload(
        &self,
        client: &HttpClient,
        form: &FormDescriptor,
        payload: &str,
    ) -> Result<bool, ProbeError> {
        let request = mutator::build_form_request(form, payload)?;
        let body = client.send_request(&request).await?.text().await?;
        Ok(self.detector.is_sql_error(&body))
    }
}

impl Default for SqlInjectionProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FormProbe for SqlInjectionProbe {
    fn name(&self) -> &'static str {
        "sql-injection"
    }

    /// Stops at the first payload that surfaces a database error, so a
    /// vulnerable form yields exactly one finding.
    async fn scan_form(&self, client: &HttpClient, form: &FormDescriptor) -> Vec<Finding> {
        for payload in SQLI_PAYLOADS {
            match self.try_payload(client, form, payload).await {
                Ok(true) => {
                    info!("SQL injection detected on {} with payload: {}", form.action, payload);
                    return vec![Finding::sql_injection(&form.action, payload)];
                }
                Ok(false) => {}
                Err(e) => debug!("Skipping payload {:?} on {}: {}", payload, form.action, e),
            }
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Severity, VulnerabilityType};
    use crate::modules::crawler::{FormInput, FormMethod};
    use crate::ScanConfig;
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MYSQL_ERROR: &str = "You have an error in your SQL syntax; check the manual that \
                               corresponds to your MySQL server version";

    fn form(action: String, method: FormMethod) -> FormDescriptor {
        let input = |name: &str, input_type: &str| FormInput {
            name: Some(name.to_string()),
            input_type: input_type.to_string(),
            value: String::new(),
        };
        FormDescriptor {
            action,
            method,
            inputs: vec![input("user", "text"), input("pass", "password"), input("login", "submit")],
        }
    }

    #[tokio::test]
    async fn test_first_payload_hit_stops_probe() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/login"))
            .and(query_param("user", "'"))
            .respond_with(ResponseTemplate::new(500).set_body_string(MYSQL_ERROR))
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(0)
            .mount(&server)
            .await;

        let client = HttpClient::new(&ScanConfig::default()).unwrap();
        let findings = SqlInjectionProbe::new()
            .scan_form(&client, &form(format!("{}/login", server.uri()), FormMethod::Get))
            .await;

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].vuln_type, VulnerabilityType::SqlInjection);
        assert_eq!(findings[0].payload.as_deref(), Some("'"));
        assert_eq!(findings[0].severity, Severity::Critical);
        assert_eq!(findings[0].url, format!("{}/login", server.uri()));
    }

    #[tokio::test]
    async fn test_later_payload_detected_over_post() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/login"))
            .and(body_string_contains("user=%22"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "Unclosed quotation mark after the character string",
            ))
            .with_priority(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Invalid credentials"))
            .mount(&server)
            .await;

        let client = HttpClient::new(&ScanConfig::default()).unwrap();
        let findings = SqlInjectionProbe::new()
            .scan_form(&client, &form(format!("{}/login", server.uri()), FormMethod::Post))
            .await;

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].payload.as_deref(), Some("\""));
    }

    #[tokio::test]
    async fn test_no_signature_no_finding() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Invalid credentials"))
            .expect(4)
            .mount(&server)
            .await;

        let client = HttpClient::new(&ScanConfig::default()).unwrap();
        let findings = SqlInjectionProbe::new()
            .scan_form(&client, &form(format!("{}/login", server.uri()), FormMethod::Get))
            .await;

        assert!(findings.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_action_yields_nothing() {
        let client = HttpClient::new(&ScanConfig {
            timeout: 1,
            ..ScanConfig::default()
        })
        .unwrap();
        let findings = SqlInjectionProbe::new()
            .scan_form(&client, &form("http://127.0.0.1:1/login".to_string(), FormMethod::Get))
            .await;

        assert!(findings.is_empty());
    }
}
