use std::collections::{HashSet, VecDeque};
use std::net::IpAddr;

use log::debug;
use tokio::net::lookup_host;
use url::{Host, Url};

use crate::error::ScanError;

/// Adds `http://` when the input carries no scheme.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

/// A normalized absolute URL plus the address its host resolved to.
/// Immutable once the scan begins.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub url: Url,
    pub address: IpAddr,
}

impl Target {
    pub async fn resolve(raw: &str) -> Result<Self, ScanError> {
        let normalized = normalize_url(raw);
        let url = Url::parse(&normalized)
            .map_err(|_| ScanError::InvalidTarget(normalized.clone()))?;

        let address = match url.host() {
            Some(Host::Ipv4(ip)) => IpAddr::V4(ip),
            Some(Host::Ipv6(ip)) => IpAddr::V6(ip),
            Some(Host::Domain(domain)) => {
                let port = url.port_or_known_default().unwrap_or(80);
                resolve_domain(domain, port).await?
            }
            None => return Err(ScanError::InvalidTarget(normalized)),
        };

        debug!("Resolved {} to {}", url, address);
        Ok(Self { url, address })
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

/// First IPv4 address for the host, or the first address of any family.
async fn resolve_domain(domain: &str, port: u16) -> Result<IpAddr, ScanError> {
    let failed = || ScanError::Resolution { host: domain.to_string() };

    let addrs: Vec<IpAddr> = lookup_host((domain, port))
        .await
        .map_err(|_| failed())?
        .map(|socket| socket.ip())
        .collect();

    addrs
        .iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(failed)
}

/// Deduplicating queue of normalized target URLs.
pub struct TargetManager {
    queue: VecDeque<String>,
    seen: HashSet<String>,
}

impl TargetManager {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            seen: HashSet::new(),
        }
    }

    /// Queues the normalized target unless it is blank or already seen.
    pub fn add_target(&mut self, raw: &str) {
        if raw.trim().is_empty() {
            return;
        }
        let target = normalize_url(raw);
        if self.seen.insert(target.clone()) {
            self.queue.push_back(target);
        }
    }

    pub fn next(&mut self) -> Option<String> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Default for TargetManager {
    fn default() -> Self {
        Self::new()
    }
}
