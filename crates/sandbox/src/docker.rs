use std::{collections::HashMap, net::TcpListener, sync::Arc, time::Duration};

use {
    async_trait::async_trait,
    base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD},
    bollard::{
        Docker,
        container::{
            Config, CreateContainerOptions, InspectContainerOptions, ListContainersOptions,
            RemoveContainerOptions, StartContainerOptions, StopContainerOptions,
        },
        models::{ContainerInspectResponse, ContainerSummary, HostConfig, PortBinding, PortMap},
        network::{InspectNetworkOptions, ListNetworksOptions},
        volume::RemoveVolumeOptions,
    },
    chrono::{DateTime, Utc},
    rand::RngCore,
    tracing::{debug, error, info, warn},
};

use crate::{
    addressing::{AddressingMode, port_url, proxy_base_url, proxy_port_url, vscode_query},
    health,
    labels::{SPEC_ID_LABEL, generate_proxy_labels},
    models::{
        AGENT_SERVER, AGENT_SESSION_API_KEY_VAR, ALLOW_CORS_ORIGINS_VAR, ExposedPort, ExposedUrl,
        SESSION_API_KEY_VAR, SandboxInfo, SandboxPage, SandboxStatus, VSCODE, VolumeMount,
        WEBHOOK_CALLBACK_VAR,
    },
    service::{SandboxError, SandboxService},
    spec::{SandboxSpec, SandboxSpecProvider},
    status::translate_status,
};

/// Connect to the local container engine.
pub fn connect() -> anyhow::Result<Docker> {
    Ok(Docker::connect_with_local_defaults()?)
}

/// Runtime knobs for the lifecycle manager, resolved once at wiring time.
#[derive(Debug, Clone)]
pub struct SandboxRuntimeSettings {
    pub container_name_prefix: String,
    /// Port this server listens on; sandbox containers call back to it.
    pub host_port: u16,
    pub container_url_pattern: String,
    pub max_num_sandboxes: usize,
    pub health_check_path: Option<String>,
    pub startup_grace_seconds: u64,
    pub use_host_network: bool,
    pub base_domain: String,
    pub api_hostname: String,
    pub web_url: Option<String>,
    pub extra_hosts: HashMap<String, String>,
    pub mounts: Vec<VolumeMount>,
    pub exposed_ports: Vec<ExposedPort>,
}

impl SandboxRuntimeSettings {
    pub fn from_config(cfg: &corral_config::schema::SandboxConfig, host_port: u16) -> Self {
        Self {
            container_name_prefix: cfg.container_name_prefix.clone(),
            host_port,
            container_url_pattern: cfg.container_url_pattern.clone(),
            max_num_sandboxes: cfg.max_num_sandboxes,
            health_check_path: cfg.health_check_path.clone(),
            startup_grace_seconds: cfg.startup_grace_seconds,
            use_host_network: cfg.use_host_network,
            base_domain: cfg.base_domain.clone(),
            api_hostname: cfg.api_hostname.clone(),
            web_url: cfg.web_url.clone(),
            extra_hosts: cfg.extra_hosts.clone(),
            mounts: cfg.mounts.iter().map(VolumeMount::from).collect(),
            exposed_ports: cfg.exposed_ports.iter().map(ExposedPort::from).collect(),
        }
    }
}

/// Docker-backed sandbox lifecycle manager.
///
/// Stateless: the engine is the sole source of truth, every descriptor is
/// recomputed from live container metadata. No client-side locking around
/// mutations; concurrent creates can transiently exceed capacity until the
/// next eviction pass, which is an accepted race window.
pub struct DockerSandboxService {
    docker: Docker,
    http: reqwest::Client,
    specs: Arc<dyn SandboxSpecProvider>,
    settings: SandboxRuntimeSettings,
}

// ── Free helpers ─────────────────────────────────────────────────────────────

/// Random URL-safe token. Valid in both container names and URLs.
fn random_token(n_bytes: usize) -> String {
    let mut bytes = vec![0u8; n_bytes];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Bind-to-zero probe for a free host port. Racy under concurrent
/// creation: two creates can pick the same port before either container
/// binds it. Accepted risk for a local engine.
fn find_unused_port() -> anyhow::Result<u16> {
    let listener = TcpListener::bind(("0.0.0.0", 0))?;
    Ok(listener.local_addr()?.port())
}

fn summary_name(summary: &ContainerSummary) -> Option<String> {
    summary
        .names
        .as_ref()
        .and_then(|names| names.first())
        .map(|name| name.trim_start_matches('/').to_string())
}

fn raw_status(inspect: &ContainerInspectResponse) -> String {
    inspect
        .state
        .as_ref()
        .and_then(|state| state.status)
        .map(|status| status.to_string())
        .unwrap_or_default()
}

fn env_lookup(inspect: &ContainerInspectResponse, key: &str) -> Option<String> {
    let vars = inspect.config.as_ref()?.env.as_ref()?;
    vars.iter().find_map(|var| {
        let (k, v) = var.split_once('=')?;
        (k == key).then(|| v.to_string())
    })
}

/// Full container environment for a new sandbox: spec defaults, the
/// session credential under both consumer names, the webhook callback
/// URL, CORS origins when configured, and one variable per declared port
/// telling the agent which host port it is reachable on.
fn build_container_env(
    spec: &SandboxSpec,
    session_api_key: &str,
    webhook_url: &str,
    web_url: Option<&str>,
    port_values: &[(String, u16)],
) -> Vec<String> {
    let mut env: HashMap<String, String> = spec.initial_env.clone();
    env.insert(SESSION_API_KEY_VAR.to_string(), session_api_key.to_string());
    env.insert(
        AGENT_SESSION_API_KEY_VAR.to_string(),
        session_api_key.to_string(),
    );
    env.insert(WEBHOOK_CALLBACK_VAR.to_string(), webhook_url.to_string());
    if let Some(origins) = web_url {
        env.insert(ALLOW_CORS_ORIGINS_VAR.to_string(), origins.to_string());
    }
    for (name, port) in port_values {
        env.insert(name.clone(), port.to_string());
    }
    let mut vars: Vec<String> = env.into_iter().map(|(k, v)| format!("{k}={v}")).collect();
    vars.sort();
    vars
}

/// Which sandboxes to pause to get the live count down to `keep_count`.
///
/// Live means neither paused nor errored. Oldest first, so the fleet
/// behaves as a soft LRU cap.
fn pick_pause_candidates(
    fleet: &[(String, SandboxStatus, DateTime<Utc>)],
    keep_count: usize,
) -> Vec<String> {
    let mut live: Vec<&(String, SandboxStatus, DateTime<Utc>)> = fleet
        .iter()
        .filter(|(_, status, _)| !matches!(status, SandboxStatus::Paused | SandboxStatus::Error))
        .collect();
    live.sort_by_key(|(_, _, created_at)| *created_at);
    let overflow = live.len().saturating_sub(keep_count);
    live.into_iter()
        .take(overflow)
        .map(|(name, _, _)| name.clone())
        .collect()
}

/// Contiguous slice of an already-sorted descriptor list. The page token
/// is a numeric offset; unparsable tokens fall back to the start.
fn paginate(items: Vec<SandboxInfo>, page_id: Option<&str>, limit: usize) -> SandboxPage {
    let start = page_id
        .and_then(|p| p.parse::<usize>().ok())
        .unwrap_or(0)
        .min(items.len());
    let end = start.saturating_add(limit).min(items.len());
    let next_page_id = (end < items.len()).then(|| end.to_string());
    SandboxPage {
        items: items[start..end].to_vec(),
        next_page_id,
    }
}

// ── Service ──────────────────────────────────────────────────────────────────

impl DockerSandboxService {
    pub fn new(
        docker: Docker,
        specs: Arc<dyn SandboxSpecProvider>,
        settings: SandboxRuntimeSettings,
    ) -> Self {
        Self {
            docker,
            http: reqwest::Client::new(),
            specs,
            settings,
        }
    }

    fn has_prefix(&self, sandbox_id: &str) -> bool {
        sandbox_id.starts_with(&self.settings.container_name_prefix)
    }

    fn is_host_network(inspect: &ContainerInspectResponse) -> bool {
        inspect
            .host_config
            .as_ref()
            .and_then(|h| h.network_mode.as_deref())
            == Some("host")
    }

    /// Project live container metadata into a sandbox descriptor.
    ///
    /// URLs and the session credential are populated only for running
    /// containers; the health probe may strip them again afterwards.
    fn assemble_info(&self, name: &str, inspect: &ContainerInspectResponse) -> SandboxInfo {
        let status = translate_status(&raw_status(inspect));

        let created_at = inspect
            .created
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|parsed| parsed.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        let mut session_api_key = None;
        let mut exposed_urls = None;
        if status == SandboxStatus::Running {
            session_api_key = env_lookup(inspect, SESSION_API_KEY_VAR);
            let mode =
                AddressingMode::select(Self::is_host_network(inspect), &self.settings.base_domain);
            let working_dir = inspect
                .config
                .as_ref()
                .and_then(|c| c.working_dir.clone())
                .unwrap_or_default();

            let mut urls = Vec::new();
            match mode {
                AddressingMode::HostNetwork => {
                    // Container ports are host ports; nothing to discover.
                    for port in &self.settings.exposed_ports {
                        let host_port = port.container_port;
                        let mut url =
                            port_url(&self.settings.container_url_pattern, host_port);
                        if port.name == VSCODE
                            && let Some(key) = &session_api_key
                        {
                            url.push_str(&vscode_query(key, &working_dir));
                        }
                        urls.push(ExposedUrl {
                            name: port.name.clone(),
                            url,
                            port: host_port,
                        });
                    }
                },
                AddressingMode::BridgeDirect | AddressingMode::BridgeProxy => {
                    let bindings: Option<&PortMap> = inspect
                        .network_settings
                        .as_ref()
                        .and_then(|settings| settings.ports.as_ref());
                    if let Some(bindings) = bindings {
                        for port in &self.settings.exposed_ports {
                            let key = format!("{}/tcp", port.container_port);
                            let Some(host_port) = bindings
                                .get(&key)
                                .and_then(|b| b.as_ref())
                                .and_then(|b| b.first())
                                .and_then(|b| b.host_port.as_deref())
                                .and_then(|p| p.parse::<u16>().ok())
                            else {
                                continue;
                            };
                            let mut url = if mode == AddressingMode::BridgeProxy {
                                proxy_port_url(
                                    &proxy_base_url(&self.settings.base_domain),
                                    name,
                                    &port.name,
                                )
                            } else {
                                port_url(&self.settings.container_url_pattern, host_port)
                            };
                            if port.name == VSCODE
                                && let Some(key) = &session_api_key
                            {
                                url.push_str(&vscode_query(key, &working_dir));
                            }
                            urls.push(ExposedUrl {
                                name: port.name.clone(),
                                url,
                                port: host_port,
                            });
                        }
                    }
                },
            }
            exposed_urls = Some(urls);
        }

        // Image id read from cached metadata; resolving tags via the
        // engine would cost an extra call per container.
        let sandbox_spec_id = inspect
            .config
            .as_ref()
            .and_then(|c| c.image.clone())
            .filter(|image| !image.is_empty())
            .or_else(|| inspect.image.clone().filter(|image| !image.is_empty()))
            .unwrap_or_else(|| "unknown".to_string());

        SandboxInfo {
            id: name.to_string(),
            sandbox_spec_id,
            status,
            session_api_key,
            exposed_urls,
            created_at,
        }
    }

    /// Apply the health-check policy in place: promote a verified sandbox
    /// to Running, or downgrade a failing one per the grace window and
    /// strip its connection info so stale URLs never leak.
    async fn verify_health(&self, info: &mut SandboxInfo, inspect: &ContainerInspectResponse) {
        let Some(health_path) = self.settings.health_check_path.as_deref() else {
            return;
        };
        let Some(urls) = info.exposed_urls.as_ref().filter(|urls| !urls.is_empty()) else {
            return;
        };
        let Some(app_server_url) = urls
            .iter()
            .find(|u| u.name == AGENT_SERVER)
            .map(|u| u.url.clone())
        else {
            // Every deployment declares the agent-server port.
            unreachable!("agent-server port missing from exposed urls");
        };

        let mode =
            AddressingMode::select(Self::is_host_network(inspect), &self.settings.base_domain);
        let probe_url = health::probe_url(mode, &app_server_url, health_path);
        let timeout = mode.probe_timeout();
        debug!(
            url = %probe_url,
            container = %info.id,
            mode = ?mode,
            timeout_s = timeout.as_secs(),
            "checking sandbox health"
        );

        if health::probe(&self.http, &probe_url, timeout).await {
            if raw_status(inspect) == "running" && info.status != SandboxStatus::Running {
                info!(container = %info.id, "promoting sandbox to running after health check");
                info.status = SandboxStatus::Running;
            }
            return;
        }

        let failed = health::failure_status(
            info.created_at,
            Utc::now(),
            Duration::from_secs(self.settings.startup_grace_seconds),
        );
        match failed {
            SandboxStatus::Error => error!(
                url = %probe_url,
                container = %info.id,
                created_at = %info.created_at,
                "sandbox server not responding past grace period"
            ),
            _ => debug!(
                url = %probe_url,
                container = %info.id,
                "health check failed within grace period"
            ),
        }
        info.status = failed;
        info.exposed_urls = None;
        info.session_api_key = None;
    }

    async fn container_to_info(&self, name: &str) -> Option<SandboxInfo> {
        let inspect = self
            .docker
            .inspect_container(name, None::<InspectContainerOptions>)
            .await
            .ok()?;
        Some(self.assemble_info(name, &inspect))
    }

    async fn checked_info(&self, name: &str) -> Option<SandboxInfo> {
        let inspect = self
            .docker
            .inspect_container(name, None::<InspectContainerOptions>)
            .await
            .ok()?;
        let mut info = self.assemble_info(name, &inspect);
        self.verify_health(&mut info, &inspect).await;
        Some(info)
    }

    async fn list_prefixed(&self) -> Result<Vec<String>, bollard::errors::Error> {
        let summaries = self
            .docker
            .list_containers(Some(ListContainersOptions::<String> {
                all: true,
                ..Default::default()
            }))
            .await?;
        Ok(summaries
            .iter()
            .filter_map(summary_name)
            .filter(|name| name.starts_with(&self.settings.container_name_prefix))
            .collect())
    }

    /// Pause the oldest live sandboxes until at most `keep_count` remain
    /// live. Invoked before creation and resumption; engine errors are
    /// logged and skipped so the triggering operation can still proceed.
    async fn pause_old_sandboxes(&self, keep_count: usize) {
        let summaries = match self
            .docker
            .list_containers(Some(ListContainersOptions::<String> {
                all: true,
                ..Default::default()
            }))
            .await
        {
            Ok(summaries) => summaries,
            Err(e) => {
                warn!(error = %e, "failed to list containers for eviction");
                return;
            },
        };

        let mut fleet = Vec::new();
        for summary in &summaries {
            let Some(name) = summary_name(summary) else {
                continue;
            };
            if !name.starts_with(&self.settings.container_name_prefix) {
                continue;
            }
            let status = translate_status(summary.state.as_deref().unwrap_or_default());
            let created_at = summary
                .created
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
                .unwrap_or_else(Utc::now);
            fleet.push((name, status, created_at));
        }

        for name in pick_pause_candidates(&fleet, keep_count) {
            info!(container = %name, keep_count, "pausing sandbox to stay under capacity");
            if let Err(e) = self.docker.pause_container(&name).await {
                warn!(container = %name, error = %e, "eviction pause failed");
            }
        }
    }

    /// Network the shared reverse proxy lives on, if any: well-known
    /// names first, then a scan for networks holding proxy-labeled
    /// containers. None means the engine default network.
    async fn get_proxy_network_name(&self) -> Option<String> {
        if self.settings.use_host_network {
            return None;
        }
        let networks = match self
            .docker
            .list_networks(None::<ListNetworksOptions<String>>)
            .await
        {
            Ok(networks) => networks,
            Err(e) => {
                debug!(error = %e, "failed to list networks");
                return None;
            },
        };

        const WELL_KNOWN: &[&str] =
            &["traefik", "traefik_default", "traefik-traefik", "corral_default"];
        for candidate in WELL_KNOWN {
            if networks
                .iter()
                .any(|network| network.name.as_deref() == Some(candidate))
            {
                info!(network = candidate, "found proxy network by name");
                return Some((*candidate).to_string());
            }
        }

        for network in &networks {
            let Some(name) = network.name.as_deref() else {
                continue;
            };
            let Ok(inspect) = self
                .docker
                .inspect_network(name, None::<InspectNetworkOptions<String>>)
                .await
            else {
                continue;
            };
            let Some(containers) = inspect.containers else {
                continue;
            };
            for container_id in containers.keys() {
                let Ok(container) = self
                    .docker
                    .inspect_container(container_id, None::<InspectContainerOptions>)
                    .await
                else {
                    continue;
                };
                let proxy_labeled = container
                    .config
                    .as_ref()
                    .and_then(|c| c.labels.as_ref())
                    .is_some_and(|labels| labels.keys().any(|key| key.starts_with("traefik.")));
                if proxy_labeled {
                    info!(network = name, "found proxy network via container labels");
                    return Some(name.to_string());
                }
            }
        }

        warn!("no proxy network found; sandbox will use the default bridge network");
        None
    }
}

#[async_trait]
impl SandboxService for DockerSandboxService {
    async fn search_sandboxes(&self, page_id: Option<&str>, limit: usize) -> SandboxPage {
        let names = match self.list_prefixed().await {
            Ok(names) => names,
            Err(e) => {
                warn!(error = %e, "listing sandboxes failed");
                return SandboxPage::default();
            },
        };

        // Health probes dominate listing latency; run them concurrently.
        let checks = names.iter().map(|name| self.checked_info(name));
        let mut sandboxes: Vec<SandboxInfo> = futures::future::join_all(checks)
            .await
            .into_iter()
            .flatten()
            .collect();
        sandboxes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        paginate(sandboxes, page_id, limit)
    }

    async fn get_sandbox(&self, sandbox_id: &str) -> Option<SandboxInfo> {
        if !self.has_prefix(sandbox_id) {
            return None;
        }
        self.checked_info(sandbox_id).await
    }

    async fn get_sandbox_by_session_api_key(
        &self,
        session_api_key: &str,
    ) -> Option<SandboxInfo> {
        let names = self.list_prefixed().await.ok()?;
        for name in names {
            let Ok(inspect) = self
                .docker
                .inspect_container(&name, None::<InspectContainerOptions>)
                .await
            else {
                continue;
            };
            if env_lookup(&inspect, SESSION_API_KEY_VAR).as_deref() == Some(session_api_key) {
                let mut info = self.assemble_info(&name, &inspect);
                self.verify_health(&mut info, &inspect).await;
                return Some(info);
            }
        }
        None
    }

    async fn start_sandbox(
        &self,
        sandbox_spec_id: Option<&str>,
        sandbox_id: Option<&str>,
    ) -> Result<SandboxInfo, SandboxError> {
        if self.settings.use_host_network && self.settings.max_num_sandboxes > 1 {
            warn!(
                max_num_sandboxes = self.settings.max_num_sandboxes,
                "host network mode with capacity above one: sandboxes will \
                 collide on identical container ports"
            );
        }

        self.pause_old_sandboxes(self.settings.max_num_sandboxes.saturating_sub(1))
            .await;

        let spec = match sandbox_spec_id {
            None => self
                .specs
                .get_default_sandbox_spec()
                .await
                .map_err(|e| SandboxError::Spec(e.to_string()))?,
            Some(spec_id) => self
                .specs
                .get_sandbox_spec(spec_id)
                .await
                .map_err(|e| SandboxError::Spec(e.to_string()))?
                .ok_or_else(|| SandboxError::SpecNotFound(spec_id.to_string()))?,
        };

        let sandbox_id = sandbox_id
            .map(str::to_string)
            .unwrap_or_else(|| random_token(16));
        let container_name = format!("{}{sandbox_id}", self.settings.container_name_prefix);
        let session_api_key = random_token(32);

        // Port wiring. Host network: container ports bind directly on the
        // host, no mapping. Bridge: one scanned free host port per
        // declared port, recorded in both the binding table and the env.
        let mut port_values: Vec<(String, u16)> = Vec::new();
        let mut port_bindings: Option<PortMap> = None;
        let mut exposed_ports: Option<HashMap<String, HashMap<(), ()>>> = None;
        if self.settings.use_host_network {
            for port in &self.settings.exposed_ports {
                port_values.push((port.name.clone(), port.container_port));
            }
        } else {
            let mut bindings: PortMap = HashMap::new();
            let mut exposed = HashMap::new();
            for port in &self.settings.exposed_ports {
                let host_port = find_unused_port()
                    .map_err(|e| SandboxError::Start(format!("no free host port: {e}")))?;
                let key = format!("{}/tcp", port.container_port);
                bindings.insert(
                    key.clone(),
                    Some(vec![PortBinding {
                        host_ip: None,
                        host_port: Some(host_port.to_string()),
                    }]),
                );
                exposed.insert(key, HashMap::new());
                port_values.push((port.name.clone(), host_port));
            }
            port_bindings = Some(bindings);
            exposed_ports = Some(exposed);
        }

        let webhook_url = format!(
            "http://{}:{}/api/v1/webhooks",
            self.settings.api_hostname, self.settings.host_port
        );
        let env = build_container_env(
            &spec,
            &session_api_key,
            &webhook_url,
            self.settings.web_url.as_deref(),
            &port_values,
        );

        let mut labels = generate_proxy_labels(
            &container_name,
            &self.settings.base_domain,
            &self.settings.exposed_ports,
        );
        labels.insert(SPEC_ID_LABEL.to_string(), spec.id.clone());

        let binds: Vec<String> = self
            .settings
            .mounts
            .iter()
            .map(|m| format!("{}:{}:{}", m.host_path, m.container_path, m.mode))
            .collect();

        let network_mode = if self.settings.use_host_network {
            info!(container = %container_name, "starting sandbox with host network mode");
            Some("host".to_string())
        } else {
            let network = self.get_proxy_network_name().await;
            if let Some(network) = &network {
                info!(container = %container_name, network = %network, "creating sandbox in proxy network");
            }
            network
        };

        // extra_hosts is meaningless under host networking.
        let extra_hosts = (!self.settings.use_host_network
            && !self.settings.extra_hosts.is_empty())
        .then(|| {
            self.settings
                .extra_hosts
                .iter()
                .map(|(host, ip)| format!("{host}:{ip}"))
                .collect::<Vec<_>>()
        });

        let host_config = HostConfig {
            binds: (!binds.is_empty()).then_some(binds),
            network_mode,
            port_bindings,
            extra_hosts,
            // Tini-style init so the container reaps zombie children.
            init: Some(true),
            ..Default::default()
        };

        let config = Config {
            image: Some(spec.id.clone()),
            cmd: spec.command.clone(),
            env: Some(env),
            working_dir: Some(spec.working_dir.clone()),
            labels: Some(labels),
            exposed_ports,
            host_config: Some(host_config),
            ..Default::default()
        };

        let options = CreateContainerOptions {
            name: container_name.clone(),
            platform: None,
        };
        if let Err(e) = self.docker.create_container(Some(options), config).await {
            error!(container = %container_name, error = %e, "container create failed");
            return Err(SandboxError::Start(e.to_string()));
        }
        if let Err(e) = self
            .docker
            .start_container(&container_name, None::<StartContainerOptions<String>>)
            .await
        {
            error!(container = %container_name, error = %e, "container start failed");
            return Err(SandboxError::Start(e.to_string()));
        }

        info!(container = %container_name, image = %spec.id, "sandbox container started");

        // Returned optimistically, without a health probe; the first
        // listing pass will apply grace-window policy.
        self.container_to_info(&container_name)
            .await
            .ok_or_else(|| {
                SandboxError::Start("container vanished right after creation".to_string())
            })
    }

    async fn resume_sandbox(&self, sandbox_id: &str) -> bool {
        self.pause_old_sandboxes(self.settings.max_num_sandboxes.saturating_sub(1))
            .await;

        if !self.has_prefix(sandbox_id) {
            return false;
        }
        let Ok(inspect) = self
            .docker
            .inspect_container(sandbox_id, None::<InspectContainerOptions>)
            .await
        else {
            return false;
        };

        let result = match raw_status(&inspect).as_str() {
            "paused" => self.docker.unpause_container(sandbox_id).await,
            "exited" => {
                self.docker
                    .start_container(sandbox_id, None::<StartContainerOptions<String>>)
                    .await
            },
            // Running, starting, whatever: resume is best-effort.
            _ => Ok(()),
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(container = %sandbox_id, error = %e, "resume failed");
                false
            },
        }
    }

    async fn pause_sandbox(&self, sandbox_id: &str) -> bool {
        if !self.has_prefix(sandbox_id) {
            return false;
        }
        let Ok(inspect) = self
            .docker
            .inspect_container(sandbox_id, None::<InspectContainerOptions>)
            .await
        else {
            return false;
        };

        if raw_status(&inspect) != "running" {
            return true;
        }
        match self.docker.pause_container(sandbox_id).await {
            Ok(()) => true,
            Err(e) => {
                warn!(container = %sandbox_id, error = %e, "pause failed");
                false
            },
        }
    }

    async fn delete_sandbox(&self, sandbox_id: &str) -> bool {
        if !self.has_prefix(sandbox_id) {
            return false;
        }
        let Ok(inspect) = self
            .docker
            .inspect_container(sandbox_id, None::<InspectContainerOptions>)
            .await
        else {
            return false;
        };

        let raw = raw_status(&inspect);
        if (raw == "running" || raw == "paused")
            && let Err(e) = self
                .docker
                .stop_container(sandbox_id, Some(StopContainerOptions { t: 10 }))
                .await
        {
            warn!(container = %sandbox_id, error = %e, "stop before delete failed");
            return false;
        }

        if let Err(e) = self
            .docker
            .remove_container(sandbox_id, None::<RemoveContainerOptions>)
            .await
        {
            warn!(container = %sandbox_id, error = %e, "container removal failed");
            return false;
        }

        // Best-effort: the workspace volume may never have existed or may
        // already be gone.
        let volume_name = format!("corral-workspace-{sandbox_id}");
        if let Err(e) = self
            .docker
            .remove_volume(&volume_name, None::<RemoveVolumeOptions>)
            .await
        {
            debug!(volume = %volume_name, error = %e, "workspace volume removal skipped");
        }

        info!(container = %sandbox_id, "sandbox deleted");
        true
    }
}
