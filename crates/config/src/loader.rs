use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use tracing::{debug, warn};

use crate::{env_subst::substitute_env, schema::CorralConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["corral.toml", "corral.yaml", "corral.yml", "corral.json"];

/// Override for the config directory, set via `set_config_dir()`.
static CONFIG_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Set a custom config directory. When set, config discovery only looks in
/// this directory (project-local and user-global paths are skipped).
/// Can be called multiple times (e.g. in tests) — each call replaces the
/// previous override.
pub fn set_config_dir(path: PathBuf) {
    *CONFIG_DIR_OVERRIDE.lock().unwrap() = Some(path);
}

/// Clear the config directory override, restoring default discovery.
pub fn clear_config_dir() {
    *CONFIG_DIR_OVERRIDE.lock().unwrap() = None;
}

fn config_dir_override() -> Option<PathBuf> {
    CONFIG_DIR_OVERRIDE.lock().unwrap().clone()
}

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<CorralConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations, then apply
/// environment overrides for the deployment toggles.
///
/// Search order:
/// 1. `./corral.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/corral/corral.{toml,yaml,yml,json}` (user-global)
///
/// Returns `CorralConfig::default()` if no config file is found.
pub fn discover_and_load() -> CorralConfig {
    let mut config = if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                CorralConfig::default()
            },
        }
    } else {
        debug!("no config file found, writing default config");
        let config = CorralConfig::default();
        if let Err(e) = write_default_config(&config) {
            warn!(error = %e, "failed to write default config file");
        }
        config
    };
    apply_env_overrides(&mut config);
    config
}

/// Apply environment-variable overrides to the loaded config.
///
/// These are deployment toggles the operator commonly sets outside any
/// config file: CORRAL_BASE_DOMAIN, CORRAL_USE_HOST_NETWORK,
/// CORRAL_API_HOSTNAME, CORRAL_WEB_URL.
pub fn apply_env_overrides(config: &mut CorralConfig) {
    if let Ok(domain) = std::env::var("CORRAL_BASE_DOMAIN")
        && !domain.is_empty()
    {
        config.sandbox.base_domain = domain;
    }
    if let Ok(flag) = std::env::var("CORRAL_USE_HOST_NETWORK") {
        config.sandbox.use_host_network = matches!(flag.to_lowercase().as_str(), "true" | "1" | "yes");
    }
    if let Ok(hostname) = std::env::var("CORRAL_API_HOSTNAME")
        && !hostname.is_empty()
    {
        config.sandbox.api_hostname = hostname;
    }
    if let Ok(web_url) = std::env::var("CORRAL_WEB_URL")
        && !web_url.is_empty()
    {
        config.sandbox.web_url = Some(web_url);
    }
}

/// Find the first config file in standard locations.
///
/// When a config dir override is set, only that directory is searched —
/// project-local and user-global paths are skipped for isolation.
fn find_config_file() -> Option<PathBuf> {
    if let Some(dir) = config_dir_override() {
        for name in CONFIG_FILENAMES {
            let p = dir.join(name);
            if p.exists() {
                return Some(p);
            }
        }
        // Override is set — don't fall through to other locations.
        return None;
    }

    // Project-local
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    // User-global: ~/.config/corral/
    if let Some(dir) = home_dir().map(|h| h.join(".config").join("corral")) {
        for name in CONFIG_FILENAMES {
            let p = dir.join(name);
            if p.exists() {
                return Some(p);
            }
        }
    }

    None
}

/// Returns the config directory: override, or `~/.config/corral/` on all platforms.
pub fn config_dir() -> Option<PathBuf> {
    if let Some(dir) = config_dir_override() {
        return Some(dir);
    }
    home_dir().map(|h| h.join(".config").join("corral"))
}

/// Returns the data directory: `~/.corral/` on all platforms.
pub fn data_dir() -> PathBuf {
    home_dir()
        .map(|h| h.join(".corral"))
        .unwrap_or_else(|| PathBuf::from(".corral"))
}

fn home_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}

/// Returns the path of an existing config file, or the default TOML path.
pub fn find_or_default_config_path() -> PathBuf {
    if let Some(path) = find_config_file() {
        return path;
    }
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("corral.toml")
}

/// Write the default config file to the user-global config path.
/// Only called when no config file exists yet.
fn write_default_config(config: &CorralConfig) -> anyhow::Result<()> {
    let path = find_or_default_config_path();
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("serialize config: {e}"))?;
    std::fs::write(&path, &toml_str)?;
    debug!(path = %path.display(), "wrote default config file");
    Ok(())
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<CorralConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(unsafe_code)]
    fn loads_toml_and_applies_env_overrides() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("corral.toml"),
            r#"
[gateway]
port = 4000

[sandbox]
max_num_sandboxes = 2
base_domain = "localhost"
"#,
        )
        .unwrap();
        set_config_dir(dir.path().to_path_buf());

        let config = load_config(&dir.path().join("corral.toml")).unwrap();
        assert_eq!(config.gateway.port, 4000);
        assert_eq!(config.sandbox.max_num_sandboxes, 2);
        assert_eq!(config.sandbox.base_domain, "localhost");

        unsafe {
            std::env::set_var("CORRAL_BASE_DOMAIN", "sandboxes.example.com");
            std::env::set_var("CORRAL_USE_HOST_NETWORK", "yes");
        }
        let mut config = config;
        apply_env_overrides(&mut config);
        assert_eq!(config.sandbox.base_domain, "sandboxes.example.com");
        assert!(config.sandbox.use_host_network);
        unsafe {
            std::env::remove_var("CORRAL_BASE_DOMAIN");
            std::env::remove_var("CORRAL_USE_HOST_NETWORK");
        }

        clear_config_dir();
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corral.ini");
        std::fs::write(&path, "port=1").unwrap();
        assert!(load_config(&path).is_err());
    }
}
