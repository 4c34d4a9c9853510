//! HTTP gateway in front of the sandbox lifecycle manager.
//!
//! Exposes the sandbox operations under `/api/v1/sandboxes` and receives
//! agent callbacks under `/api/v1/webhooks`.

pub mod server;
pub mod state;
pub mod webhook;

mod routes;

pub use {
    server::{build_gateway_app, start_gateway},
    state::GatewayState,
    webhook::{ConversationRequest, ConversationStarter, LoggingConversationStarter},
};
