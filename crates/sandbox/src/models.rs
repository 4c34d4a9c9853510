use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
};

// ── Logical port names ───────────────────────────────────────────────────────

/// Port the agent server listens on. Every deployment declares this one;
/// health verification depends on it.
pub const AGENT_SERVER: &str = "agent-server";
/// Port the in-container VSCode server listens on.
pub const VSCODE: &str = "vscode";
/// Ports the agent may start application servers on.
pub const WORKER_1: &str = "worker-1";
pub const WORKER_2: &str = "worker-2";

// ── Well-known container environment variables ───────────────────────────────

/// Session credential as tracked by this server.
pub const SESSION_API_KEY_VAR: &str = "CORRAL_SESSION_API_KEYS_0";
/// Session credential under the name the agent server itself reads.
pub const AGENT_SESSION_API_KEY_VAR: &str = "SESSION_API_KEY";
/// Base URL the agent server posts webhook callbacks to.
pub const WEBHOOK_CALLBACK_VAR: &str = "CORRAL_WEBHOOK_BASE_URL";
/// Origins the agent server allows for browser CORS.
pub const ALLOW_CORS_ORIGINS_VAR: &str = "CORRAL_ALLOW_CORS_ORIGINS";

// ── Sandbox status ───────────────────────────────────────────────────────────

/// Externally visible sandbox state, derived from live container state
/// plus the health-check outcome. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SandboxStatus {
    Starting,
    Running,
    Paused,
    Error,
    Missing,
}

impl std::fmt::Display for SandboxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Starting => f.write_str("starting"),
            Self::Running => f.write_str("running"),
            Self::Paused => f.write_str("paused"),
            Self::Error => f.write_str("error"),
            Self::Missing => f.write_str("missing"),
        }
    }
}

/// A routable URL for one of a sandbox's declared ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposedUrl {
    pub name: String,
    pub url: String,
    pub port: u16,
}

/// The externally visible descriptor of one sandbox.
///
/// This is a view recomputed from the container runtime on demand.
/// `exposed_urls` and `session_api_key` are present only when the sandbox
/// is RUNNING and health-verified (or no health path is configured).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxInfo {
    /// Container name, prefix included.
    pub id: String,
    /// Image/template the sandbox was created from.
    pub sandbox_spec_id: String,
    pub status: SandboxStatus,
    pub session_api_key: Option<String>,
    pub exposed_urls: Option<Vec<ExposedUrl>>,
    pub created_at: DateTime<Utc>,
}

/// One page of sandbox descriptors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SandboxPage {
    pub items: Vec<SandboxInfo>,
    /// Offset token for the next page, when more remain.
    pub next_page_id: Option<String>,
}

/// A volume mount added to every sandbox container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeMount {
    pub host_path: String,
    pub container_path: String,
    pub mode: String,
}

impl From<&corral_config::schema::MountEntry> for VolumeMount {
    fn from(entry: &corral_config::schema::MountEntry) -> Self {
        Self {
            host_path: entry.host_path.clone(),
            container_path: entry.container_path.clone(),
            mode: entry.mode.clone(),
        }
    }
}

/// A declared exposed port. The set is fixed per deployment, not per sandbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExposedPort {
    pub name: String,
    pub description: String,
    pub container_port: u16,
}

impl From<&corral_config::schema::PortEntry> for ExposedPort {
    fn from(entry: &corral_config::schema::PortEntry) -> Self {
        Self {
            name: entry.name.clone(),
            description: entry.description.clone(),
            container_port: entry.container_port,
        }
    }
}
