use std::{net::SocketAddr, sync::Arc};

use {
    axum::{Json, Router, extract::State, response::IntoResponse, routing::get},
    tower_http::cors::{Any, CorsLayer},
    tracing::info,
};

use {
    corral_config::discover_and_load,
    corral_sandbox::{ConfigSpecProvider, DockerSandboxService, SandboxRuntimeSettings, connect},
};

use crate::{routes, state::GatewayState, webhook::LoggingConversationStarter};

// ── Server startup ───────────────────────────────────────────────────────────

/// Build the gateway router (shared between production startup and tests).
pub fn build_gateway_app(state: Arc<GatewayState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api/v1", routes::api_routes())
        .layer(cors)
        .with_state(state)
}

/// Start the gateway HTTP server, wiring the Docker-backed sandbox
/// service from the discovered config.
pub async fn start_gateway(bind: &str, port: u16) -> anyhow::Result<()> {
    let config = discover_and_load();

    let docker = connect()?;
    let specs = Arc::new(ConfigSpecProvider::from(&config));
    let settings = SandboxRuntimeSettings::from_config(&config.sandbox, port);
    let capacity = settings.max_num_sandboxes;
    let sandboxes = Arc::new(DockerSandboxService::new(docker, specs, settings));
    let state = GatewayState::new(sandboxes, Arc::new(LoggingConversationStarter));

    let app = build_gateway_app(Arc::clone(&state));

    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Startup banner.
    let lines = [
        format!("corral gateway v{}", state.version),
        format!("listening on {addr}"),
        format!("sandbox capacity {capacity}"),
    ];
    let width = lines.iter().map(|l| l.len()).max().unwrap_or(0) + 4;
    info!("┌{}┐", "─".repeat(width));
    for line in &lines {
        info!("│  {:<w$}│", line, w = width - 2);
    }
    info!("└{}┘", "─".repeat(width));

    axum::serve(listener, app).await?;
    Ok(())
}

async fn health_handler(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": state.version,
        "hostname": state.hostname,
    }))
}

#[cfg(test)]
mod tests {
    use {
        async_trait::async_trait,
        axum::{
            body::Body,
            http::{Request, StatusCode, header},
        },
        chrono::Utc,
        tower::ServiceExt,
    };

    use corral_sandbox::{
        SandboxError, SandboxInfo, SandboxPage, SandboxService, SandboxStatus,
    };

    use super::*;

    struct StubService {
        items: Vec<SandboxInfo>,
    }

    #[async_trait]
    impl SandboxService for StubService {
        async fn search_sandboxes(&self, _page_id: Option<&str>, _limit: usize) -> SandboxPage {
            SandboxPage {
                items: self.items.clone(),
                next_page_id: None,
            }
        }

        async fn get_sandbox(&self, sandbox_id: &str) -> Option<SandboxInfo> {
            self.items.iter().find(|i| i.id == sandbox_id).cloned()
        }

        async fn get_sandbox_by_session_api_key(
            &self,
            session_api_key: &str,
        ) -> Option<SandboxInfo> {
            self.items
                .iter()
                .find(|i| i.session_api_key.as_deref() == Some(session_api_key))
                .cloned()
        }

        async fn start_sandbox(
            &self,
            sandbox_spec_id: Option<&str>,
            _sandbox_id: Option<&str>,
        ) -> Result<SandboxInfo, SandboxError> {
            match sandbox_spec_id {
                Some("missing") => Err(SandboxError::SpecNotFound("missing".to_string())),
                _ => Ok(self.items[0].clone()),
            }
        }

        async fn resume_sandbox(&self, sandbox_id: &str) -> bool {
            self.items.iter().any(|i| i.id == sandbox_id)
        }

        async fn pause_sandbox(&self, sandbox_id: &str) -> bool {
            self.items.iter().any(|i| i.id == sandbox_id)
        }

        async fn delete_sandbox(&self, sandbox_id: &str) -> bool {
            self.items.iter().any(|i| i.id == sandbox_id)
        }
    }

    fn app() -> Router {
        let items = vec![SandboxInfo {
            id: "corral-agent-abc".to_string(),
            sandbox_spec_id: "agent:latest".to_string(),
            status: SandboxStatus::Running,
            session_api_key: Some("sekrit".to_string()),
            exposed_urls: Some(Vec::new()),
            created_at: Utc::now(),
        }];
        let state = GatewayState::new(
            Arc::new(StubService { items }),
            Arc::new(LoggingConversationStarter),
        );
        build_gateway_app(state)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_version() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert!(json["version"].is_string());
    }

    #[tokio::test]
    async fn list_and_get_sandboxes() {
        let response = app()
            .oneshot(Request::get("/api/v1/sandboxes").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["items"][0]["id"], "corral-agent-abc");
        assert_eq!(json["items"][0]["status"], "running");

        let response = app()
            .oneshot(
                Request::get("/api/v1/sandboxes/corral-agent-abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app()
            .oneshot(
                Request::get("/api/v1/sandboxes/nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn lookup_by_session_key_route_wins_over_id() {
        let response = app()
            .oneshot(
                Request::get("/api/v1/sandboxes/lookup?session_api_key=sekrit")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["id"], "corral-agent-abc");
    }

    #[tokio::test]
    async fn start_sandbox_maps_errors() {
        let response = app()
            .oneshot(
                Request::post("/api/v1/sandboxes")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"sandbox_spec_id":"agent:latest"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app()
            .oneshot(
                Request::post("/api/v1/sandboxes")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"sandbox_spec_id":"missing"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        // An empty body means "default spec, random id".
        let response = app()
            .oneshot(
                Request::post("/api/v1/sandboxes")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn lifecycle_routes_report_not_found() {
        for action in ["pause", "resume"] {
            let response = app()
                .oneshot(
                    Request::post(format!("/api/v1/sandboxes/corral-agent-abc/{action}"))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);

            let response = app()
                .oneshot(
                    Request::post(format!("/api/v1/sandboxes/nope/{action}"))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }

        let response = app()
            .oneshot(
                Request::delete("/api/v1/sandboxes/corral-agent-abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn webhook_sink_always_accepts() {
        let response = app()
            .oneshot(
                Request::post("/api/v1/webhooks/events")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"title":"hello","body":"world"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["received"], true);
    }
}
