use std::time::Duration;

use crate::models::{AGENT_SERVER, VSCODE, WORKER_1, WORKER_2};

/// How a sandbox's ports are reached from outside.
///
/// Decided per sandbox at assembly time from the container's network mode
/// and the deployment base domain. Path-based proxy addressing is never
/// combined with host networking: a host-network container is always
/// addressed as localhost, whatever the base domain says.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    /// Container shares the host network namespace; container ports are
    /// host ports.
    HostNetwork,
    /// Bridge network, plain host:port URLs from the engine's
    /// port-binding table.
    BridgeDirect,
    /// Bridge network behind a shared reverse proxy; URLs are path-scoped
    /// to the container name.
    BridgeProxy,
}

impl AddressingMode {
    pub fn select(is_host_network: bool, base_domain: &str) -> Self {
        if is_host_network {
            Self::HostNetwork
        } else if base_domain != "localhost" {
            Self::BridgeProxy
        } else {
            Self::BridgeDirect
        }
    }

    /// Health-probe timeout. The proxy hop is the slowest path, host
    /// networking the next, plain bridge the fastest.
    pub fn probe_timeout(&self) -> Duration {
        match self {
            Self::BridgeProxy => Duration::from_secs(15),
            Self::HostNetwork => Duration::from_secs(10),
            Self::BridgeDirect => Duration::from_secs(5),
        }
    }
}

/// Base URL for proxy addressing. A base domain with an explicit scheme
/// is used verbatim; a bare domain defaults to https.
pub fn proxy_base_url(base_domain: &str) -> String {
    if base_domain.starts_with("http") {
        base_domain.to_string()
    } else {
        format!("https://{base_domain}")
    }
}

/// Path-scoped proxy URL for one logical port.
///
/// The agent server gets the bare `/{container_name}` base (callers append
/// `/api` themselves); the well-known auxiliary ports get their fixed path
/// segments; anything else falls back to its lowercased name.
pub fn proxy_port_url(base_url: &str, container_name: &str, port_name: &str) -> String {
    match port_name {
        AGENT_SERVER => format!("{base_url}/{container_name}"),
        VSCODE => format!("{base_url}/{container_name}/vscode"),
        WORKER_1 => format!("{base_url}/{container_name}/app1"),
        WORKER_2 => format!("{base_url}/{container_name}/app2"),
        other => format!("{base_url}/{container_name}/{}", other.to_lowercase()),
    }
}

/// Direct URL from the configured pattern, e.g. `http://localhost:{port}`.
pub fn port_url(pattern: &str, host_port: u16) -> String {
    pattern.replace("{port}", &host_port.to_string())
}

/// Query string the VSCode server needs for its auth handshake.
pub fn vscode_query(session_api_key: &str, working_dir: &str) -> String {
    format!("/?tkn={session_api_key}&folder={working_dir}")
}

/// Rewrite localhost references to the hostname containers can reach the
/// host under. Used when probing a bridge-network sandbox from inside a
/// containerized deployment.
pub fn replace_localhost_for_docker(url: &str) -> String {
    url.replace("127.0.0.1", "host.docker.internal")
        .replace("localhost", "host.docker.internal")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_network_never_selects_proxy_paths() {
        assert_eq!(
            AddressingMode::select(true, "sandboxes.example.com"),
            AddressingMode::HostNetwork
        );
        assert_eq!(
            AddressingMode::select(true, "localhost"),
            AddressingMode::HostNetwork
        );
    }

    #[test]
    fn bridge_splits_on_base_domain() {
        assert_eq!(
            AddressingMode::select(false, "localhost"),
            AddressingMode::BridgeDirect
        );
        assert_eq!(
            AddressingMode::select(false, "sandboxes.example.com"),
            AddressingMode::BridgeProxy
        );
    }

    #[test]
    fn probe_timeouts_by_mode() {
        assert_eq!(
            AddressingMode::BridgeProxy.probe_timeout(),
            Duration::from_secs(15)
        );
        assert_eq!(
            AddressingMode::HostNetwork.probe_timeout(),
            Duration::from_secs(10)
        );
        assert_eq!(
            AddressingMode::BridgeDirect.probe_timeout(),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn proxy_base_url_defaults_to_https() {
        assert_eq!(
            proxy_base_url("sandboxes.example.com"),
            "https://sandboxes.example.com"
        );
        assert_eq!(
            proxy_base_url("http://10.0.0.5"),
            "http://10.0.0.5"
        );
    }

    #[test]
    fn proxy_port_urls_use_fixed_path_segments() {
        let base = "https://sandboxes.example.com";
        assert_eq!(
            proxy_port_url(base, "corral-agent-abc", AGENT_SERVER),
            "https://sandboxes.example.com/corral-agent-abc"
        );
        assert_eq!(
            proxy_port_url(base, "corral-agent-abc", VSCODE),
            "https://sandboxes.example.com/corral-agent-abc/vscode"
        );
        assert_eq!(
            proxy_port_url(base, "corral-agent-abc", WORKER_1),
            "https://sandboxes.example.com/corral-agent-abc/app1"
        );
        assert_eq!(
            proxy_port_url(base, "corral-agent-abc", "Jupyter"),
            "https://sandboxes.example.com/corral-agent-abc/jupyter"
        );
    }

    #[test]
    fn port_url_substitutes_placeholder() {
        assert_eq!(
            port_url("http://localhost:{port}", 32771),
            "http://localhost:32771"
        );
        assert_eq!(
            port_url("http://192.168.1.10:{port}", 8000),
            "http://192.168.1.10:8000"
        );
    }

    #[test]
    fn localhost_rewrite_covers_both_spellings() {
        assert_eq!(
            replace_localhost_for_docker("http://localhost:8000"),
            "http://host.docker.internal:8000"
        );
        assert_eq!(
            replace_localhost_for_docker("http://127.0.0.1:8000"),
            "http://host.docker.internal:8000"
        );
    }
}
