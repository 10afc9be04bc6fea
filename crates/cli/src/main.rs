use analytics_core::{ConfigLoader, DEFAULT_CONFIG_PATH};
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "analytics-service")]
#[command(about = "Computes per-user statistics from MySQL and stores them in MongoDB", long_about = None)]
struct Cli {
    /// Config file path (environment variables override it)
    #[arg(short, long, global = true, env = "ANALYTICS_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Run the sync loop and the health API (default)
    Run,
    /// Run a single sync cycle and print its report
    SyncOnce,
    /// Serve the health API without the sync loop
    Serve,
    /// Print the resolved configuration with credentials masked
    ShowConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ConfigLoader::load_from(&cli.config)?;
    tracing::info!(
        "Loaded config: source {}, sink {}",
        analytics_core::mask_credentials(&config.source.locator()),
        analytics_core::mask_credentials(&config.sink.locator())
    );

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => commands::run_service(config).await?,
        Commands::SyncOnce => commands::run_sync_once(config).await?,
        Commands::Serve => commands::run_serve(config).await?,
        Commands::ShowConfig => commands::run_show_config(&config)?,
    }

    Ok(())
}
