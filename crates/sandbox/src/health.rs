use std::time::Duration;

use {
    chrono::{DateTime, Utc},
    tracing::debug,
    url::Url,
};

use crate::{
    addressing::{AddressingMode, replace_localhost_for_docker},
    models::SandboxStatus,
};

/// Build the liveness-probe URL for the agent server.
///
/// Proxy addressing: the agent-server URL is already `{base}/{container}`,
/// and the proxy strips that prefix, so the in-container `/alive` endpoint
/// sits directly under it. Host networking: both this server and the
/// sandbox share the host network, so localhost plus the discovered port
/// works directly. Bridge: rewrite localhost to the docker-reachable host
/// name and append the configured health path.
pub fn probe_url(mode: AddressingMode, agent_server_url: &str, health_path: &str) -> String {
    match mode {
        AddressingMode::BridgeProxy => format!("{agent_server_url}/alive"),
        AddressingMode::HostNetwork => match Url::parse(agent_server_url).ok().and_then(|u| u.port()) {
            Some(port) => format!("http://localhost:{port}{health_path}"),
            None => format!(
                "{}{health_path}",
                replace_localhost_for_docker(agent_server_url)
            ),
        },
        AddressingMode::BridgeDirect => format!(
            "{}{health_path}",
            replace_localhost_for_docker(agent_server_url)
        ),
    }
}

/// Status a sandbox gets when its health probe fails: Starting while the
/// startup grace window is open, Error once it has elapsed.
pub fn failure_status(
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
    grace: Duration,
) -> SandboxStatus {
    let grace = chrono::Duration::from_std(grace).unwrap_or_else(|_| chrono::Duration::seconds(0));
    if created_at < now - grace {
        SandboxStatus::Error
    } else {
        SandboxStatus::Starting
    }
}

/// Issue the probe. Connection errors, timeouts, and non-2xx responses
/// are all the same negative outcome. Cancellation propagates by the
/// future being dropped; it is never reported as a probe failure.
pub async fn probe(client: &reqwest::Client, url: &str, timeout: Duration) -> bool {
    match client.get(url).timeout(timeout).send().await {
        Ok(response) => response.status().is_success(),
        Err(e) => {
            debug!(url, error = %e, "health probe failed");
            false
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proxy_probe_appends_alive() {
        assert_eq!(
            probe_url(
                AddressingMode::BridgeProxy,
                "https://sandboxes.example.com/corral-agent-abc",
                "/health"
            ),
            "https://sandboxes.example.com/corral-agent-abc/alive"
        );
    }

    #[test]
    fn host_network_probe_uses_localhost_and_port() {
        assert_eq!(
            probe_url(AddressingMode::HostNetwork, "http://localhost:8000", "/health"),
            "http://localhost:8000/health"
        );
        // Remote pattern still yields a localhost probe: host networking
        // means the port is bound on this machine.
        assert_eq!(
            probe_url(
                AddressingMode::HostNetwork,
                "http://192.168.1.10:8000",
                "/health"
            ),
            "http://localhost:8000/health"
        );
    }

    #[test]
    fn bridge_probe_rewrites_localhost() {
        assert_eq!(
            probe_url(
                AddressingMode::BridgeDirect,
                "http://localhost:32771",
                "/health"
            ),
            "http://host.docker.internal:32771/health"
        );
    }

    #[test]
    fn failure_status_respects_grace_window() {
        let grace = Duration::from_secs(15);
        let created = Utc::now();

        // t = 5s: still starting.
        let now = created + chrono::Duration::seconds(5);
        assert_eq!(failure_status(created, now, grace), SandboxStatus::Starting);

        // t = 20s: grace elapsed, errored.
        let now = created + chrono::Duration::seconds(20);
        assert_eq!(failure_status(created, now, grace), SandboxStatus::Error);
    }

    #[tokio::test]
    async fn probe_distinguishes_2xx_from_failure() {
        let mut server = mockito::Server::new_async().await;
        let ok = server.mock("GET", "/health").with_status(200).create_async().await;
        let client = reqwest::Client::new();

        let url = format!("{}/health", server.url());
        assert!(probe(&client, &url, Duration::from_secs(5)).await);
        ok.assert_async().await;

        let _bad = server
            .mock("GET", "/broken")
            .with_status(503)
            .create_async()
            .await;
        let url = format!("{}/broken", server.url());
        assert!(!probe(&client, &url, Duration::from_secs(5)).await);
    }

    #[tokio::test]
    async fn probe_treats_connection_refused_as_failure() {
        let client = reqwest::Client::new();
        assert!(!probe(&client, "http://127.0.0.1:1/health", Duration::from_secs(1)).await);
    }
}
