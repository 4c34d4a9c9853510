pub mod addressing;
pub mod docker;
pub mod health;
pub mod labels;
pub mod models;
pub mod service;
pub mod spec;
pub mod status;

pub use {
    docker::{DockerSandboxService, SandboxRuntimeSettings, connect},
    models::{ExposedPort, ExposedUrl, SandboxInfo, SandboxPage, SandboxStatus, VolumeMount},
    service::{SandboxError, SandboxService},
    spec::{ConfigSpecProvider, SandboxSpec, SandboxSpecProvider},
};
