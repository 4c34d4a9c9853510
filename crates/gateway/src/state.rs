use std::sync::Arc;

use corral_sandbox::SandboxService;

use crate::webhook::ConversationStarter;

/// Shared state handed to every gateway handler.
pub struct GatewayState {
    pub sandboxes: Arc<dyn SandboxService>,
    pub conversations: Arc<dyn ConversationStarter>,
    pub version: String,
    pub hostname: String,
}

impl GatewayState {
    pub fn new(
        sandboxes: Arc<dyn SandboxService>,
        conversations: Arc<dyn ConversationStarter>,
    ) -> Arc<Self> {
        Arc::new(Self {
            sandboxes,
            conversations,
            version: env!("CARGO_PKG_VERSION").to_string(),
            hostname: hostname::get()
                .ok()
                .and_then(|h| h.into_string().ok())
                .unwrap_or_else(|| "unknown".to_string()),
        })
    }
}
