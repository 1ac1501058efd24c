use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::redirect::Policy;
use reqwest::{Client, ClientBuilder, Proxy, Response};

use super::HttpRequest;
use crate::ScanConfig;

/// Session-scoped HTTP client. Both inner clients share one cookie jar, so
/// cookies set during the crawl are carried into later probe requests.
/// One instance belongs to exactly one scan.
pub struct HttpClient {
    session: Client,
    no_redirect: Client,
    default_timeout: Duration,
}

impl HttpClient {
    pub fn new(config: &ScanConfig) -> Result<Self, reqwest::Error> {
        let jar = Arc::new(Jar::default());
        let default_timeout = Duration::from_secs(config.timeout);

        let mut default_headers = HeaderMap::new();
        for (key, val) in config.parsed_headers() {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(key.as_bytes()),
                HeaderValue::from_str(&val),
            ) {
                default_headers.insert(name, value);
            }
        }

        let builder = |policy: Policy| -> Result<Client, reqwest::Error> {
            let mut builder = ClientBuilder::new()
                .cookie_provider(Arc::clone(&jar))
                .user_agent(config.user_agent.clone())
                .default_headers(default_headers.clone())
                .timeout(default_timeout)
                .danger_accept_invalid_certs(true)
                .redirect(policy);

            if let Some(proxy) = config.proxy_ref() {
                builder = builder.proxy(Proxy::all(proxy)?);
            }

            builder.build()
        };

        Ok(Self {
            session: builder(Policy::default())?,
            no_redirect: builder(Policy::none())?,
            default_timeout,
        })
    }

    pub async fn send_request(&self, req: &HttpRequest) -> Result<Response, reqwest::Error> {
        let mut builder = self.session
            .request(req.method.clone(), req.url.as_str());

        for (name, value) in req.headers.iter() {
            builder = builder.header(name, value);
        }

        if !req.body.is_empty() {
            builder = builder.body(req.body.clone());
        }

        builder.timeout(self.default_timeout).send().await
    }

    /// GET through the session, following redirects.
    pub async fn get(&self, url: &str, timeout: Duration) -> Result<Response, reqwest::Error> {
        self.session.get(url).timeout(timeout).send().await
    }

    /// GET through the session with redirects disabled.
    pub async fn get_without_redirects(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<Response, reqwest::Error> {
        self.no_redirect.get(url).timeout(timeout).send().await
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mutator::build_form_request;
    use crate::modules::crawler::{FormDescriptor, FormInput, FormMethod};
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_cookies_carry_across_requests() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).insert_header("set-cookie", "session=abc; Path=/"))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/private"))
            .and(header("cookie", "session=abc"))
            .respond_with(ResponseTemplate::new(200).set_body_string("welcome back"))
            .mount(&server)
            .await;

        let client = HttpClient::new(&ScanConfig::default()).unwrap();
        let timeout = client.default_timeout();

        client.get(&format!("{}/login", server.uri()), timeout).await.unwrap();
        let res = client.get(&format!("{}/private", server.uri()), timeout).await.unwrap();

        assert_eq!(res.status().as_u16(), 200);
        assert_eq!(res.text().await.unwrap(), "welcome back");
    }

    #[tokio::test]
    async fn test_custom_headers_and_user_agent() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(header("x-api-key", "secret"))
            .and(header("user-agent", "Mozilla/5.0 (Educational Vulnerability Scanner)"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let config = ScanConfig {
            headers: vec!["X-Api-Key: secret".to_string()],
            ..ScanConfig::default()
        };
        let client = HttpClient::new(&config).unwrap();
        let res = client.get(&server.uri(), client.default_timeout()).await.unwrap();

        assert_eq!(res.status().as_u16(), 200);
    }

    #[tokio::test]
    async fn test_send_request_posts_form_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/login"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string("user=%27&pass=%27"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let form = FormDescriptor {
            action: format!("{}/login", server.uri()),
            method: FormMethod::Post,
            inputs: ["user", "pass"]
                .iter()
                .map(|name| FormInput {
                    name: Some(name.to_string()),
                    input_type: "text".to_string(),
                    value: String::new(),
                })
                .collect(),
        };
        let request = build_form_request(&form, "'").unwrap();

        let client = HttpClient::new(&ScanConfig::default()).unwrap();
        let res = client.send_request(&request).await.unwrap();
        assert_eq!(res.text().await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_no_redirect_client_returns_redirect_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/admin/"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/login"))
            .mount(&server)
            .await;

        let client = HttpClient::new(&ScanConfig::default()).unwrap();
        let res = client
            .get_without_redirects(&format!("{}/admin/", server.uri()), Duration::from_secs(3))
            .await
            .unwrap();

        assert_eq!(res.status().as_u16(), 302);
    }
}
