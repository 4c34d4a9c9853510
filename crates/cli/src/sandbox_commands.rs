use std::sync::Arc;

use {anyhow::Result, clap::Subcommand};

use {
    corral_config::discover_and_load,
    corral_sandbox::{
        ConfigSpecProvider, DockerSandboxService, SandboxInfo, SandboxRuntimeSettings,
        SandboxService, connect,
    },
};

#[derive(Subcommand)]
pub enum SandboxAction {
    /// List sandboxes, newest first.
    List {
        /// Page token from a previous listing.
        #[arg(long)]
        page_id: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// Print the raw JSON page instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Create and start a new sandbox.
    Start {
        /// Spec id (container image); defaults to the configured default.
        #[arg(long)]
        spec: Option<String>,
        /// Explicit sandbox id instead of a random one.
        #[arg(long)]
        id: Option<String>,
    },
    /// Show one sandbox, including its health-checked status.
    Get {
        id: String,
        /// Print the raw JSON descriptor instead of a summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Pause a running sandbox.
    Pause { id: String },
    /// Resume a paused or exited sandbox.
    Resume { id: String },
    /// Stop and remove a sandbox and its workspace volume.
    Delete { id: String },
}

fn service() -> Result<DockerSandboxService> {
    let config = discover_and_load();
    let docker = connect()?;
    let specs = Arc::new(ConfigSpecProvider::from(&config));
    let settings = SandboxRuntimeSettings::from_config(&config.sandbox, config.gateway.port);
    Ok(DockerSandboxService::new(docker, specs, settings))
}

pub async fn handle_sandbox(action: SandboxAction) -> Result<()> {
    let service = service()?;
    match action {
        SandboxAction::List {
            page_id,
            limit,
            json,
        } => {
            let page = service.search_sandboxes(page_id.as_deref(), limit).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&page)?);
                return Ok(());
            }
            if page.items.is_empty() {
                println!("No sandboxes found.");
                return Ok(());
            }
            println!("{:<40} {:<10} {:<26} IMAGE", "ID", "STATUS", "CREATED");
            for item in &page.items {
                println!(
                    "{:<40} {:<10} {:<26} {}",
                    item.id,
                    item.status.to_string(),
                    item.created_at.to_rfc3339(),
                    item.sandbox_spec_id
                );
            }
            if let Some(next) = &page.next_page_id {
                println!();
                println!("More results: --page-id {next}");
            }
            Ok(())
        },
        SandboxAction::Start { spec, id } => {
            let info = service.start_sandbox(spec.as_deref(), id.as_deref()).await?;
            print_info(&info);
            Ok(())
        },
        SandboxAction::Get { id, json } => match service.get_sandbox(&id).await {
            Some(info) if json => {
                println!("{}", serde_json::to_string_pretty(&info)?);
                Ok(())
            },
            Some(info) => {
                print_info(&info);
                Ok(())
            },
            None => anyhow::bail!("sandbox not found: {id}"),
        },
        SandboxAction::Pause { id } => report(service.pause_sandbox(&id).await, "Paused", &id),
        SandboxAction::Resume { id } => report(service.resume_sandbox(&id).await, "Resumed", &id),
        SandboxAction::Delete { id } => report(service.delete_sandbox(&id).await, "Deleted", &id),
    }
}

fn report(ok: bool, verb: &str, id: &str) -> Result<()> {
    if ok {
        println!("{verb}: {id}");
        Ok(())
    } else {
        anyhow::bail!("sandbox not found: {id}")
    }
}

fn print_info(info: &SandboxInfo) {
    println!("Id:      {}", info.id);
    println!("Spec:    {}", info.sandbox_spec_id);
    println!("Status:  {}", info.status);
    println!("Created: {}", info.created_at.to_rfc3339());
    if let Some(urls) = &info.exposed_urls {
        for url in urls {
            println!("  {:<14} {}", url.name, url.url);
        }
    }
    if let Some(key) = &info.session_api_key {
        println!("Session key: {key}");
    }
}
