use {async_trait::async_trait, serde_json::Value, tracing::info};

/// A conversation kick-off extracted from an inbound webhook event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationRequest {
    pub source: String,
    pub title: String,
    pub body: String,
    /// Credential of the sandbox the event should be routed to, when the
    /// sender knows it.
    pub session_api_key: Option<String>,
}

/// Receives conversation requests distilled from webhook events.
#[async_trait]
pub trait ConversationStarter: Send + Sync {
    async fn start_conversation(&self, request: ConversationRequest);
}

/// Default starter: records the event and nothing else. Deployments that
/// dispatch into an agent replace this at wiring time.
pub struct LoggingConversationStarter;

#[async_trait]
impl ConversationStarter for LoggingConversationStarter {
    async fn start_conversation(&self, request: ConversationRequest) {
        info!(
            source = %request.source,
            title = %request.title,
            has_session_key = request.session_api_key.is_some(),
            "webhook conversation request"
        );
    }
}

/// Distill an arbitrary webhook payload into a conversation request.
///
/// Understands issue-tracker payloads carrying `issue.fields.summary` /
/// `issue.fields.description`, plus flat `title` / `body` payloads. Never
/// fails: unrecognized shapes fall back to a generic untitled event so
/// the endpoint can stay a 200-always sink.
pub(crate) fn extract_event(payload: &Value) -> ConversationRequest {
    let fields = payload.pointer("/issue/fields");
    let title = fields
        .and_then(|f| f.get("summary"))
        .and_then(Value::as_str)
        .or_else(|| payload.get("title").and_then(Value::as_str))
        .unwrap_or("untitled event");
    let body = fields
        .and_then(|f| f.get("description"))
        .and_then(Value::as_str)
        .or_else(|| payload.get("body").and_then(Value::as_str))
        .unwrap_or_default();
    let source = payload
        .get("source")
        .and_then(Value::as_str)
        .unwrap_or("webhook");
    let session_api_key = payload
        .get("session_api_key")
        .and_then(Value::as_str)
        .map(str::to_string);

    ConversationRequest {
        source: source.to_string(),
        title: title.to_string(),
        body: body.to_string(),
        session_api_key,
    }
}
