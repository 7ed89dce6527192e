//! TCP reachability checks behind `/status`.

use futures_util::future::join_all;
use reqwest::Url;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::net::TcpStream;

use crate::models::Target;

pub const PROBE_TIMEOUT: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Up,
    Down,
}

/// `host:port` of a base URL, using the scheme's default port if none is given.
pub fn socket_addr_for(base_url: &str) -> Option<String> {
    let url = Url::parse(base_url).ok()?;
    let host = url.host_str()?;
    let port = url.port_or_known_default()?;
    Some(format!("{host}:{port}"))
}

/// Attempt a TCP connection and close it immediately.
pub async fn probe_tcp(addr: &str, timeout: Duration) -> ProbeStatus {
    match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
        Ok(Ok(_)) => ProbeStatus::Up,
        _ => ProbeStatus::Down,
    }
}

/// Probe every target concurrently, keyed by target name.
pub async fn probe_targets(targets: &[Target], timeout: Duration) -> BTreeMap<String, ProbeStatus> {
    let probes = targets.iter().map(|target| async move {
        let status = match socket_addr_for(&target.base_url) {
            Some(addr) => probe_tcp(&addr, timeout).await,
            None => ProbeStatus::Down,
        };
        (target.name.clone(), status)
    });

    join_all(probes).await.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    fn target(name: &str, base_url: &str) -> Target {
        Target {
            name: name.to_string(),
            prefix: format!("/{name}"),
            base_url: base_url.to_string(),
            headers: Vec::new(),
        }
    }

    #[test]
    fn test_socket_addr_for() {
        assert_eq!(
            socket_addr_for("http://localhost:5000").as_deref(),
            Some("localhost:5000")
        );
        assert_eq!(
            socket_addr_for("https://otp.internal").as_deref(),
            Some("otp.internal:443")
        );
        assert_eq!(
            socket_addr_for("http://127.0.0.1").as_deref(),
            Some("127.0.0.1:80")
        );
        assert_eq!(socket_addr_for("not a url"), None);
    }

    #[tokio::test]
    async fn test_probe_listening_port_is_up() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        assert_eq!(probe_tcp(&addr, PROBE_TIMEOUT).await, ProbeStatus::Up);
    }

    #[tokio::test]
    async fn test_probe_closed_port_is_down() {
        // Bind then drop to find a port nothing listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);
        assert_eq!(probe_tcp(&addr, PROBE_TIMEOUT).await, ProbeStatus::Down);
    }

    #[tokio::test]
    async fn test_probe_targets() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let targets = [
            target("photon", &format!("http://127.0.0.1:{port}")),
            target("broken", "not a url"),
        ];
        let statuses = probe_targets(&targets, PROBE_TIMEOUT).await;

        assert_eq!(statuses["photon"], ProbeStatus::Up);
        assert_eq!(statuses["broken"], ProbeStatus::Down);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ProbeStatus::Up).unwrap(), "\"up\"");
        assert_eq!(serde_json::to_string(&ProbeStatus::Down).unwrap(), "\"down\"");
    }
}
