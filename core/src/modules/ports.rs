use std::collections::BTreeSet;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use futures::future::join_all;
use log::debug;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// TCP connect probe over a fixed candidate list.
pub struct PortProbe {
    ports: Vec<u16>,
    timeout: Duration,
}

impl PortProbe {
    pub fn new(ports: Vec<u16>, timeout: Duration) -> Self {
        Self { ports, timeout }
    }

    /// Returns the ports that accepted a connection. Refused, timed out and
    /// unreachable are all treated as closed; there are no retries.
    pub async fn scan(&self, address: IpAddr) -> BTreeSet<u16> {
        let attempts = self.ports.iter().map(|&port| async move {
            let open = is_open(SocketAddr::new(address, port), self.timeout).await;
            debug!("{}:{} {}", address, port, if open { "open" } else { "closed" });
            (port, open)
        });

        join_all(attempts)
            .await
            .into_iter()
            .filter(|(_, open)| *open)
            .map(|(port, _)| port)
            .collect()
    }
}

/// The stream is dropped, closing the connection, as soon as it is established.
async fn is_open(addr: SocketAddr, limit: Duration) -> bool {
    matches!(timeout(limit, TcpStream::connect(addr)).await, Ok(Ok(_)))
}
