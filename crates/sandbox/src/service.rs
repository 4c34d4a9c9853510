use {async_trait::async_trait, thiserror::Error};

use crate::models::{SandboxInfo, SandboxPage};

/// Errors a caller of [`SandboxService::start_sandbox`] can see.
///
/// Creation is the only operation that surfaces hard failures; every
/// other operation degrades to an empty page, `None`, or `false`.
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("sandbox spec not found: {0}")]
    SpecNotFound(String),
    #[error("sandbox spec lookup failed: {0}")]
    Spec(String),
    #[error("failed to start container: {0}")]
    Start(String),
}

/// The sandbox lifecycle operations.
#[async_trait]
pub trait SandboxService: Send + Sync {
    /// List sandboxes newest-first. `page_id` is an opaque offset token
    /// from a previous page. Engine errors yield an empty page.
    async fn search_sandboxes(&self, page_id: Option<&str>, limit: usize) -> SandboxPage;

    /// Checked descriptor for one sandbox, or None for unknown ids,
    /// foreign prefixes, and engine errors alike.
    async fn get_sandbox(&self, sandbox_id: &str) -> Option<SandboxInfo>;

    /// Linear scan for the sandbox holding this session credential.
    async fn get_sandbox_by_session_api_key(&self, session_api_key: &str)
    -> Option<SandboxInfo>;

    /// Create and start a new sandbox, evicting the oldest running ones
    /// down to capacity first. Both arguments are optional: the spec
    /// defaults to the deployment default, the id to a random one.
    async fn start_sandbox(
        &self,
        sandbox_spec_id: Option<&str>,
        sandbox_id: Option<&str>,
    ) -> Result<SandboxInfo, SandboxError>;

    /// Unpause a paused sandbox or start an exited one. Best-effort and
    /// idempotent: true for any reachable sandbox, false on not-found.
    async fn resume_sandbox(&self, sandbox_id: &str) -> bool;

    /// Pause a running sandbox. Idempotent no-op for any other status.
    async fn pause_sandbox(&self, sandbox_id: &str) -> bool;

    /// Stop, remove, and clean up the workspace volume. Destructive and
    /// immediate; there is no soft delete.
    async fn delete_sandbox(&self, sandbox_id: &str) -> bool;
}
