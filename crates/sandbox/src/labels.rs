use std::collections::HashMap;

use crate::models::{AGENT_SERVER, ExposedPort, VSCODE, WORKER_1, WORKER_2};

/// Generate reverse-proxy (Traefik) routing labels for one container.
///
/// Every declared port gets a router scoped to `/{container_name}/...`
/// path prefixes with the prefix stripped before forwarding. The agent
/// server additionally gets a priority-10 route preserving its `/api/`
/// sub-path, and the VSCode port gets forwarding directives for
/// interactive editor sessions. Pure function, never calls the network.
pub fn generate_proxy_labels(
    container_name: &str,
    base_domain: &str,
    exposed_ports: &[ExposedPort],
) -> HashMap<String, String> {
    let port_of = |name: &str, default: u16| {
        exposed_ports
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.container_port)
            .unwrap_or(default)
    };
    let agent_server_port = port_of(AGENT_SERVER, 8000);
    let vscode_port = port_of(VSCODE, 8001);
    let worker_1_port = port_of(WORKER_1, 8011);
    let worker_2_port = port_of(WORKER_2, 8012);

    let mut labels = HashMap::new();
    labels.insert("traefik.enable".to_string(), "true".to_string());

    // Generic middleware stripping only the container prefix.
    labels.insert(
        format!("traefik.http.middlewares.{container_name}-stripprefix.stripprefix.prefixes"),
        format!("/{container_name}"),
    );

    // (port, service name, path prefix, extra preserved route, vscode flag)
    let port_configs: [(u16, String, String, Option<String>, bool); 4] = [
        (
            agent_server_port,
            container_name.to_string(),
            format!("/{container_name}/"),
            Some(format!("/{container_name}/api/")),
            false,
        ),
        (
            vscode_port,
            format!("{container_name}-vscode"),
            format!("/{container_name}/vscode"),
            None,
            true,
        ),
        (
            worker_1_port,
            format!("{container_name}-app1"),
            format!("/{container_name}/app1"),
            None,
            false,
        ),
        (
            worker_2_port,
            format!("{container_name}-app2"),
            format!("/{container_name}/app2"),
            None,
            false,
        ),
    ];

    for (port, service_name, path_prefix, additional_route, is_vscode) in port_configs {
        // Ports routed below the container root need their own
        // strip-prefix middleware covering the full path.
        let middleware_name = if path_prefix == format!("/{container_name}/") {
            format!("{container_name}-stripprefix")
        } else {
            let suffix = service_name.rsplit('-').next().unwrap_or("svc");
            let middleware_name = format!("{container_name}-{suffix}-stripprefix");
            labels.insert(
                format!(
                    "traefik.http.middlewares.{middleware_name}.stripprefix.prefixes"
                ),
                path_prefix.clone(),
            );
            middleware_name
        };

        labels.insert(
            format!("traefik.http.routers.{service_name}.rule"),
            format!("Host(`{base_domain}`) && PathPrefix(`{path_prefix}`)"),
        );
        labels.insert(
            format!("traefik.http.routers.{service_name}.entrypoints"),
            "websecure".to_string(),
        );
        labels.insert(
            format!("traefik.http.routers.{service_name}.tls"),
            "true".to_string(),
        );
        labels.insert(
            format!("traefik.http.routers.{service_name}.tls.certresolver"),
            "tlsresolver".to_string(),
        );
        labels.insert(
            format!("traefik.http.routers.{service_name}.service"),
            service_name.clone(),
        );
        labels.insert(
            format!("traefik.http.routers.{service_name}.middlewares"),
            middleware_name,
        );

        // Agent server only: preserve /api/ and outprioritize the
        // generic strip-prefix route.
        if let Some(route) = additional_route {
            labels.insert(
                format!("traefik.http.routers.{service_name}-api.rule"),
                format!("Host(`{base_domain}`) && PathPrefix(`{route}`)"),
            );
            labels.insert(
                format!("traefik.http.routers.{service_name}-api.entrypoints"),
                "websecure".to_string(),
            );
            labels.insert(
                format!("traefik.http.routers.{service_name}-api.tls"),
                "true".to_string(),
            );
            labels.insert(
                format!("traefik.http.routers.{service_name}-api.tls.certresolver"),
                "tlsresolver".to_string(),
            );
            labels.insert(
                format!("traefik.http.routers.{service_name}-api.service"),
                service_name.clone(),
            );
            labels.insert(
                format!("traefik.http.routers.{service_name}-api.middlewares"),
                format!("{container_name}-stripprefix"),
            );
            labels.insert(
                format!("traefik.http.routers.{service_name}-api.priority"),
                "10".to_string(),
            );
        }

        labels.insert(
            format!("traefik.http.services.{service_name}.loadbalancer.server.port"),
            port.to_string(),
        );
        labels.insert(
            format!("traefik.http.services.{service_name}.loadbalancer.server.scheme"),
            "http".to_string(),
        );

        if is_vscode {
            labels.insert(
                format!("traefik.http.services.{service_name}.loadbalancer.passHostHeader"),
                "true".to_string(),
            );
            labels.insert(
                format!(
                    "traefik.http.services.{service_name}.loadbalancer.responseForwarding.flushInterval"
                ),
                "1ms".to_string(),
            );
        }
    }

    labels
}

/// Label key start_sandbox merges into the proxy labels to tag the spec.
pub const SPEC_ID_LABEL: &str = "sandbox_spec_id";

#[cfg(test)]
mod tests {
    use super::*;

    fn ports() -> Vec<ExposedPort> {
        vec![
            ExposedPort {
                name: AGENT_SERVER.into(),
                description: String::new(),
                container_port: 8000,
            },
            ExposedPort {
                name: VSCODE.into(),
                description: String::new(),
                container_port: 8001,
            },
            ExposedPort {
                name: WORKER_1.into(),
                description: String::new(),
                container_port: 8011,
            },
            ExposedPort {
                name: WORKER_2.into(),
                description: String::new(),
                container_port: 8012,
            },
        ]
    }

    #[test]
    fn generates_strip_prefix_and_routers_per_port() {
        let labels = generate_proxy_labels("corral-agent-abc", "sandboxes.example.com", &ports());

        assert_eq!(labels.get("traefik.enable").map(String::as_str), Some("true"));
        assert_eq!(
            labels
                .get("traefik.http.middlewares.corral-agent-abc-stripprefix.stripprefix.prefixes")
                .map(String::as_str),
            Some("/corral-agent-abc")
        );
        assert_eq!(
            labels
                .get("traefik.http.routers.corral-agent-abc.rule")
                .map(String::as_str),
            Some("Host(`sandboxes.example.com`) && PathPrefix(`/corral-agent-abc/`)")
        );
        assert_eq!(
            labels
                .get("traefik.http.services.corral-agent-abc-vscode.loadbalancer.server.port")
                .map(String::as_str),
            Some("8001")
        );
        assert_eq!(
            labels
                .get("traefik.http.routers.corral-agent-abc-app2.rule")
                .map(String::as_str),
            Some("Host(`sandboxes.example.com`) && PathPrefix(`/corral-agent-abc/app2`)")
        );
    }

    #[test]
    fn agent_server_gets_priority_api_route() {
        let labels = generate_proxy_labels("corral-agent-abc", "sandboxes.example.com", &ports());

        assert_eq!(
            labels
                .get("traefik.http.routers.corral-agent-abc-api.rule")
                .map(String::as_str),
            Some("Host(`sandboxes.example.com`) && PathPrefix(`/corral-agent-abc/api/`)")
        );
        assert_eq!(
            labels
                .get("traefik.http.routers.corral-agent-abc-api.priority")
                .map(String::as_str),
            Some("10")
        );
        // The api route reuses the generic prefix middleware.
        assert_eq!(
            labels
                .get("traefik.http.routers.corral-agent-abc-api.middlewares")
                .map(String::as_str),
            Some("corral-agent-abc-stripprefix")
        );
    }

    #[test]
    fn vscode_gets_forwarding_directives() {
        let labels = generate_proxy_labels("corral-agent-abc", "sandboxes.example.com", &ports());

        assert_eq!(
            labels
                .get("traefik.http.services.corral-agent-abc-vscode.loadbalancer.passHostHeader")
                .map(String::as_str),
            Some("true")
        );
        assert_eq!(
            labels
                .get(
                    "traefik.http.services.corral-agent-abc-vscode.loadbalancer.responseForwarding.flushInterval"
                )
                .map(String::as_str),
            Some("1ms")
        );
        // No such directives for the worker ports.
        assert!(
            !labels.contains_key(
                "traefik.http.services.corral-agent-abc-app1.loadbalancer.passHostHeader"
            )
        );
    }

    #[test]
    fn missing_port_declarations_fall_back_to_defaults() {
        let labels = generate_proxy_labels("corral-agent-abc", "localhost", &[]);
        assert_eq!(
            labels
                .get("traefik.http.services.corral-agent-abc.loadbalancer.server.port")
                .map(String::as_str),
            Some("8000")
        );
    }
}
