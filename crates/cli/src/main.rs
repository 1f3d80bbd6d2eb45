mod bridge_commands;
mod config_commands;

use std::path::{Path, PathBuf};

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    herald_config::HeraldConfig,
    tracing::{debug, info},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "herald", about = "Herald: forward Gotify notifications to chats")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to use instead of discovering one.
    #[arg(long, global = true, env = "HERALD_CONFIG")]
    config: Option<PathBuf>,

    /// Custom config directory (overrides default ~/.config/herald/).
    #[arg(long, global = true, env = "HERALD_CONFIG_DIR")]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bridge (default when no subcommand is provided).
    Run,
    /// Validate the config and probe the Gotify server.
    Check {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
    /// Print the registered destinations.
    Destinations,
    /// Register a destination without starting the bridge.
    Register {
        /// Destination id (a Telegram chat id).
        destination: String,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Load the config named on the command line, or discover one.
///
/// Returns the config and the file destinations are persisted to. When no
/// file exists this is the default user config path.
pub(crate) fn load_config(explicit: Option<&Path>) -> anyhow::Result<(HeraldConfig, PathBuf)> {
    if let Some(path) = explicit {
        let config = herald_config::load_config(path)
            .with_context(|| format!("failed to load {}", path.display()))?;
        return Ok((config, path.to_path_buf()));
    }

    let (config, path) =
        herald_config::discover_and_load().context("failed to load discovered config")?;
    debug!(path = %path.display(), "using config file");
    Ok((config, path))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    // reqwest and tungstenite both use rustls; pick the provider once.
    let _ = rustls::crypto::ring::default_provider().install_default();

    if let Some(ref dir) = cli.config_dir {
        herald_config::set_config_dir(dir.clone());
    }

    info!(version = env!("CARGO_PKG_VERSION"), "herald starting");

    let config_path = cli.config.as_deref();
    match cli.command {
        None | Some(Commands::Run) => bridge_commands::run(config_path).await,
        Some(Commands::Check { verbose }) => config_commands::check(config_path, verbose).await,
        Some(Commands::Destinations) => config_commands::destinations(config_path),
        Some(Commands::Register { destination }) => {
            bridge_commands::register(config_path, &destination).await
        },
    }
}
