mod sandbox_commands;

use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "corral", about = "Corral — sandbox lifecycle manager for agent containers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway server.
    Gateway {
        /// Bind address; defaults to the config file value.
        #[arg(long)]
        bind: Option<String>,
        /// Listen port; defaults to the config file value.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Sandbox management against the local container engine.
    Sandbox {
        #[command(subcommand)]
        action: sandbox_commands::SandboxAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "corral starting");

    match cli.command {
        Commands::Gateway { bind, port } => {
            let config = corral_config::discover_and_load();
            let bind = bind.unwrap_or(config.gateway.bind);
            let port = port.unwrap_or(config.gateway.port);
            corral_gateway::server::start_gateway(&bind, port).await
        },
        Commands::Sandbox { action } => sandbox_commands::handle_sandbox(action).await,
    }
}
