pub mod crawler;
pub mod headers;
pub mod paths;
pub mod ports;
pub mod sqli;
pub mod xss;

use async_trait::async_trait;

use crate::core::Finding;
use crate::http::HttpClient;
use crate::modules::crawler::FormDescriptor;

/// A probe that submits crafted values through a discovered form.
///
/// Implementations share the scan's session client, so cookies picked up
/// while crawling stay attached to every submission. Failed requests are
/// skipped; they never abort the probe.
#[async_trait]
pub trait FormProbe: Send + Sync {
    fn name(&self) -> &'static str;

    async fn scan_form(&self, client: &HttpClient, form: &FormDescriptor) -> Vec<Finding>;
}
