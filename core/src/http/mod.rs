pub mod client;

pub use client::HttpClient;

use reqwest::header::HeaderMap;
use reqwest::Method;
use url::Url;

/// A fully built request. Headers, including the content type of a
/// non-empty body, are set by whoever builds it.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: String,
}

impl HttpRequest {
    pub fn new(method: Method, url: Url, headers: HeaderMap, body: String) -> Self {
        Self {
            method,
            url,
            headers,
            body,
        }
    }
}
