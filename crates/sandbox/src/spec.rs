use std::collections::HashMap;

use {anyhow::Result, async_trait::async_trait};

/// A sandbox template: image reference plus startup defaults.
#[derive(Debug, Clone)]
pub struct SandboxSpec {
    /// Spec id, doubling as the container image reference.
    pub id: String,
    /// Startup command override. None uses the image default.
    pub command: Option<Vec<String>>,
    pub working_dir: String,
    pub initial_env: HashMap<String, String>,
}

/// Resolves spec ids to sandbox templates.
#[async_trait]
pub trait SandboxSpecProvider: Send + Sync {
    async fn get_default_sandbox_spec(&self) -> Result<SandboxSpec>;
    async fn get_sandbox_spec(&self, spec_id: &str) -> Result<Option<SandboxSpec>>;
}

/// Spec provider backed by the static catalog in the config file.
pub struct ConfigSpecProvider {
    specs: Vec<SandboxSpec>,
    default_id: Option<String>,
}

impl ConfigSpecProvider {
    pub fn new(specs: Vec<SandboxSpec>, default_id: Option<String>) -> Self {
        Self { specs, default_id }
    }
}

impl From<&corral_config::CorralConfig> for ConfigSpecProvider {
    fn from(config: &corral_config::CorralConfig) -> Self {
        let specs = config
            .specs
            .iter()
            .map(|entry| SandboxSpec {
                id: entry.id.clone(),
                command: entry.command.clone(),
                working_dir: entry.working_dir.clone(),
                initial_env: entry.initial_env.clone(),
            })
            .collect();
        Self::new(specs, config.default_spec.clone())
    }
}

#[async_trait]
impl SandboxSpecProvider for ConfigSpecProvider {
    async fn get_default_sandbox_spec(&self) -> Result<SandboxSpec> {
        if let Some(id) = &self.default_id
            && let Some(spec) = self.specs.iter().find(|s| &s.id == id)
        {
            return Ok(spec.clone());
        }
        self.specs
            .first()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no sandbox specs configured"))
    }

    async fn get_sandbox_spec(&self, spec_id: &str) -> Result<Option<SandboxSpec>> {
        Ok(self.specs.iter().find(|s| s.id == spec_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> ConfigSpecProvider {
        ConfigSpecProvider::new(
            vec![
                SandboxSpec {
                    id: "agent:latest".into(),
                    command: None,
                    working_dir: "/workspace".into(),
                    initial_env: HashMap::new(),
                },
                SandboxSpec {
                    id: "agent:nightly".into(),
                    command: Some(vec!["/start.sh".into()]),
                    working_dir: "/workspace".into(),
                    initial_env: HashMap::new(),
                },
            ],
            Some("agent:nightly".into()),
        )
    }

    #[tokio::test]
    async fn default_spec_honors_explicit_id() {
        let spec = provider().get_default_sandbox_spec().await.unwrap();
        assert_eq!(spec.id, "agent:nightly");
    }

    #[tokio::test]
    async fn lookup_by_id() {
        let p = provider();
        assert!(p.get_sandbox_spec("agent:latest").await.unwrap().is_some());
        assert!(p.get_sandbox_spec("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_catalog_is_an_error() {
        let p = ConfigSpecProvider::new(Vec::new(), None);
        assert!(p.get_default_sandbox_spec().await.is_err());
    }
}
