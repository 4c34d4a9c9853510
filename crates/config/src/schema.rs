/// Config schema types (gateway, sandbox runtime, sandbox spec catalog).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CorralConfig {
    pub gateway: GatewayConfig,
    pub sandbox: SandboxConfig,
    /// Sandbox spec catalog: templates a sandbox can be created from.
    pub specs: Vec<SandboxSpecEntry>,
    /// Id of the spec used when `start_sandbox` is called without one.
    /// Defaults to the first catalog entry.
    pub default_spec: Option<String>,
}

/// Gateway HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub bind: String,
    /// Port the gateway listens on. Also the port sandbox containers
    /// call back to for webhooks.
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 3000,
        }
    }
}

/// Sandbox runtime settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Prefix for container names. Ids lacking this prefix are treated
    /// as belonging to some other manager sharing the engine.
    pub container_name_prefix: String,
    /// Fleet ceiling. Creation and resumption pause the oldest running
    /// sandboxes down to this count minus one before proceeding.
    pub max_num_sandboxes: usize,
    /// URL pattern for directly exposed ports. `{port}` is the placeholder.
    /// For remote access set this to the server address
    /// (e.g. `http://192.168.1.100:{port}`).
    pub container_url_pattern: String,
    /// Liveness path probed inside the agent server. `None` disables
    /// health verification entirely.
    pub health_check_path: Option<String>,
    /// Seconds after creation during which a failing health probe is
    /// reported as STARTING rather than ERROR.
    pub startup_grace_seconds: u64,
    /// Share the host network namespace with sandbox containers.
    /// Container ports then bind directly on the host.
    pub use_host_network: bool,
    /// Deployment base domain. Anything other than "localhost" switches
    /// exposed URLs to path-based reverse-proxy addressing.
    pub base_domain: String,
    /// Hostname sandbox containers use to reach this server for
    /// webhook callbacks.
    pub api_hostname: String,
    /// Frontend origin allowed to call the agent server from a browser.
    pub web_url: Option<String>,
    /// Extra hostname mappings added to every sandbox container,
    /// e.g. `{"host.docker.internal": "host-gateway"}`.
    pub extra_hosts: HashMap<String, String>,
    /// Volume mounts added to every sandbox container.
    pub mounts: Vec<MountEntry>,
    /// Ports every sandbox exposes. Fixed per deployment, not per sandbox.
    pub exposed_ports: Vec<PortEntry>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            container_name_prefix: "corral-agent-".into(),
            max_num_sandboxes: 5,
            container_url_pattern: "http://localhost:{port}".into(),
            health_check_path: Some("/health".into()),
            startup_grace_seconds: 15,
            use_host_network: false,
            base_domain: "localhost".into(),
            api_hostname: "host.docker.internal".into(),
            web_url: None,
            extra_hosts: HashMap::from([(
                "host.docker.internal".to_string(),
                "host-gateway".to_string(),
            )]),
            mounts: Vec::new(),
            exposed_ports: default_exposed_ports(),
        }
    }
}

/// A single volume mount.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MountEntry {
    pub host_path: String,
    pub container_path: String,
    pub mode: String,
}

impl Default for MountEntry {
    fn default() -> Self {
        Self {
            host_path: String::new(),
            container_path: String::new(),
            mode: "rw".into(),
        }
    }
}

/// A single exposed-port declaration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PortEntry {
    pub name: String,
    pub description: String,
    pub container_port: u16,
}

fn default_exposed_ports() -> Vec<PortEntry> {
    vec![
        PortEntry {
            name: "agent-server".into(),
            description: "Port the agent server listens on inside the container".into(),
            container_port: 8000,
        },
        PortEntry {
            name: "vscode".into(),
            description: "Port the VSCode server listens on inside the container".into(),
            container_port: 8001,
        },
        PortEntry {
            name: "worker-1".into(),
            description: "First port for agent-started application servers".into(),
            container_port: 8011,
        },
        PortEntry {
            name: "worker-2".into(),
            description: "Second port for agent-started application servers".into(),
            container_port: 8012,
        },
    ]
}

/// One sandbox spec: a template a sandbox is instantiated from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxSpecEntry {
    /// Spec id, doubling as the container image reference.
    pub id: String,
    /// Startup command override. `None` uses the image default.
    pub command: Option<Vec<String>>,
    pub working_dir: String,
    pub initial_env: HashMap<String, String>,
}

impl Default for SandboxSpecEntry {
    fn default() -> Self {
        Self {
            id: String::new(),
            command: None,
            working_dir: "/workspace".into(),
            initial_env: HashMap::new(),
        }
    }
}

impl CorralConfig {
    /// Resolve the default spec: explicit `default_spec`, else the first
    /// catalog entry.
    pub fn default_spec_entry(&self) -> Option<&SandboxSpecEntry> {
        if let Some(id) = &self.default_spec {
            return self.specs.iter().find(|s| &s.id == id);
        }
        self.specs.first()
    }

    /// Look up a spec by id.
    pub fn spec_entry(&self, id: &str) -> Option<&SandboxSpecEntry> {
        self.specs.iter().find(|s| s.id == id)
    }
}
